use std::{
    collections::{BTreeMap, HashMap},
    sync::{Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

use reqwest::header::{HeaderMap, RETRY_AFTER};
use tracing::{debug, warn};

use super::endpoint::ApiMethod;

pub const APP_RATE_LIMIT: &str = "x-app-rate-limit";
pub const APP_RATE_LIMIT_COUNT: &str = "x-app-rate-limit-count";
pub const METHOD_RATE_LIMIT: &str = "x-method-rate-limit";
pub const METHOD_RATE_LIMIT_COUNT: &str = "x-method-rate-limit-count";

/// Windows with this many calls left or fewer start adding backoff.
const LOW_HEADROOM: u64 = 5;
/// Fraction of the window length waited per nearly exhausted window.
const BACKOFF_DIVISOR: u32 = 5;

pub const DEFAULT_RETRY_AFTER_UNPARSABLE: Duration = Duration::from_secs(10);
pub const DEFAULT_RETRY_AFTER_MISSING: Duration = Duration::from_secs(2);
/// Upper bound for any single wait, whatever the headers claim.
pub const MAX_WAIT: Duration = Duration::from_secs(24 * 60 * 60);

/// Budget for one scope, keyed by window length in seconds. `allowed` and
/// `used` always share the same keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateLimitScope {
    allowed: BTreeMap<u64, u64>,
    used: BTreeMap<u64, u64>,
}

impl RateLimitScope {
    pub fn from_header_values(limit: &str, count: Option<&str>) -> Self {
        let allowed = parse_rate_windows(limit);
        let counts = count.map(parse_rate_windows).unwrap_or_default();
        let used = allowed
            .keys()
            .map(|period| (*period, counts.get(period).copied().unwrap_or(0)))
            .collect();

        Self { allowed, used }
    }

    pub fn allowed(&self) -> &BTreeMap<u64, u64> {
        &self.allowed
    }

    pub fn used(&self) -> &BTreeMap<u64, u64> {
        &self.used
    }

    pub fn remaining(&self, period: u64) -> Option<u64> {
        let allowed = self.allowed.get(&period)?;
        let used = self.used.get(&period).copied().unwrap_or(0);
        Some(allowed.saturating_sub(used))
    }

    fn additional_wait(&self) -> Duration {
        self.allowed
            .keys()
            .filter(|period| self.remaining(**period).unwrap_or(0) <= LOW_HEADROOM)
            .map(|period| Duration::from_secs(*period) / BACKOFF_DIVISOR)
            .fold(Duration::ZERO, Duration::saturating_add)
            .min(MAX_WAIT)
    }
}

/// Parses `count:period` pairs into a period -> count map. Bad entries are
/// skipped one by one.
pub fn parse_rate_windows(value: &str) -> BTreeMap<u64, u64> {
    let mut windows = BTreeMap::new();

    for entry in value.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let parts = entry.split(':').collect::<Vec<_>>();
        if parts.len() != 2 {
            warn!(entry, "skipping rate limit entry with wrong arity");
            continue;
        }

        match (parts[0].trim().parse::<u64>(), parts[1].trim().parse::<u64>()) {
            (Ok(count), Ok(period)) => {
                windows.insert(period, count);
            }
            _ => warn!(entry, "skipping rate limit entry with non-integer fields"),
        }
    }

    windows
}

#[derive(Debug)]
struct TrackerState {
    application: RateLimitScope,
    methods: HashMap<ApiMethod, RateLimitScope>,
    retry_after: Instant,
}

/// Tracks the application and per-method budgets the Riot API reports, plus
/// the "do not send before" instant set by 429 responses.
#[derive(Debug)]
pub struct RateLimitTracker {
    state: Mutex<TrackerState>,
    retry_after_unparsable: Duration,
    retry_after_missing: Duration,
}

impl RateLimitTracker {
    pub fn new(retry_after_unparsable: Duration, retry_after_missing: Duration) -> Self {
        Self {
            state: Mutex::new(TrackerState {
                application: RateLimitScope::default(),
                methods: HashMap::new(),
                retry_after: Instant::now(),
            }),
            retry_after_unparsable,
            retry_after_missing,
        }
    }

    fn lock(&self) -> MutexGuard<'_, TrackerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn update_from_headers(&self, headers: &HeaderMap, method: ApiMethod) {
        let application = scope_from_headers(headers, APP_RATE_LIMIT, APP_RATE_LIMIT_COUNT);
        let method_scope = scope_from_headers(headers, METHOD_RATE_LIMIT, METHOD_RATE_LIMIT_COUNT);

        let mut state = self.lock();
        if let Some(scope) = application {
            state.application = scope;
        }
        if let Some(scope) = method_scope {
            state.methods.insert(method, scope);
        }
    }

    /// Applies the `Retry-After` header of a 429 response and returns the
    /// wait that was recorded.
    pub fn record_rate_limited(&self, headers: &HeaderMap) -> Duration {
        let wait = match headers.get(RETRY_AFTER) {
            Some(value) => match value.to_str().ok().and_then(|v| v.trim().parse::<u64>().ok()) {
                Some(seconds) if seconds > MAX_WAIT.as_secs() => {
                    warn!(seconds, "Retry-After exceeds the maximum wait, capping");
                    MAX_WAIT
                }
                Some(seconds) => Duration::from_secs(seconds),
                None => {
                    warn!(value = ?value, "unparsable Retry-After header, using fallback");
                    self.retry_after_unparsable
                }
            },
            // Upstream services in front of the API strip the detailed headers
            None => self.retry_after_missing,
        };

        self.lock().retry_after = instant_after(Instant::now(), wait);
        debug!(wait_ms = wait.as_millis() as u64, "retry-after updated");
        wait
    }

    /// Earliest instant at which a request for `method` should be sent.
    pub fn safe_retry_time(&self, method: ApiMethod) -> Instant {
        let now = Instant::now();
        let (retry_after, wait) = {
            let mut state = self.lock();
            if state.retry_after < now {
                state.retry_after = now;
            }

            let mut wait = state.application.additional_wait();
            if let Some(scope) = state.methods.get(&method) {
                wait = wait.saturating_add(scope.additional_wait());
            }
            (state.retry_after, wait.min(MAX_WAIT))
        };

        retry_after.max(instant_after(now, wait))
    }

    pub fn application_scope(&self) -> RateLimitScope {
        self.lock().application.clone()
    }

    pub fn method_scope(&self, method: ApiMethod) -> Option<RateLimitScope> {
        self.lock().methods.get(&method).cloned()
    }
}

impl Default for RateLimitTracker {
    fn default() -> Self {
        Self::new(DEFAULT_RETRY_AFTER_UNPARSABLE, DEFAULT_RETRY_AFTER_MISSING)
    }
}

fn instant_after(start: Instant, wait: Duration) -> Instant {
    start.checked_add(wait.min(MAX_WAIT)).unwrap_or(start)
}

fn scope_from_headers(headers: &HeaderMap, limit_name: &str, count_name: &str) -> Option<RateLimitScope> {
    let limit = header_str(headers, limit_name)?;
    let count = header_str(headers, count_name);
    Some(RateLimitScope::from_header_values(limit, count))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    let value = headers.get(name)?;
    match value.to_str() {
        Ok(s) => Some(s),
        Err(_) => {
            warn!(header = name, "ignoring non-ascii rate limit header");
            None
        }
    }
}
