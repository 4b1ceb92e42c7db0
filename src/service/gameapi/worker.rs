use std::{
    fmt,
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use crossbeam::channel::{Receiver, Sender};
use rand::Rng;
use tracing::{debug, info, warn};

use super::{
    endpoint::ApiMethod,
    rate_limit::RateLimitTracker,
    riot_api_client::RiotApiRequestError,
    transport::{ApiRequest, ApiResponse, HttpTransport},
};

/// One initial attempt plus three retries.
pub const MAX_ATTEMPTS: u32 = 4;

const RATE_LIMIT_TYPE: &str = "x-rate-limit-type";

pub type WorkResponse = Result<ApiResponse, RiotApiRequestError>;

/// A queued request together with the channel its result goes back on.
/// The channel has capacity 1 so answering never blocks the worker, even
/// when the caller already gave up waiting.
pub struct WorkOrder {
    pub request: ApiRequest,
    pub method: ApiMethod,
    pub respond_to: Sender<WorkResponse>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFailure {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    UnsupportedMediaType,
    InternalServerError,
    ServiceUnavailable,
    Unknown(u16),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Success,
    RateLimited,
    Failed(StatusFailure),
}

pub fn classify_status(status: u16) -> StatusClass {
    match status {
        200 => StatusClass::Success,
        429 => StatusClass::RateLimited,
        400 => StatusClass::Failed(StatusFailure::BadRequest),
        401 => StatusClass::Failed(StatusFailure::Unauthorized),
        403 => StatusClass::Failed(StatusFailure::Forbidden),
        404 => StatusClass::Failed(StatusFailure::NotFound),
        415 => StatusClass::Failed(StatusFailure::UnsupportedMediaType),
        500 => StatusClass::Failed(StatusFailure::InternalServerError),
        503 => StatusClass::Failed(StatusFailure::ServiceUnavailable),
        other => StatusClass::Failed(StatusFailure::Unknown(other)),
    }
}

impl StatusFailure {
    pub fn status(&self) -> u16 {
        match self {
            StatusFailure::BadRequest => 400,
            StatusFailure::Unauthorized => 401,
            StatusFailure::Forbidden => 403,
            StatusFailure::NotFound => 404,
            StatusFailure::UnsupportedMediaType => 415,
            StatusFailure::InternalServerError => 500,
            StatusFailure::ServiceUnavailable => 503,
            StatusFailure::Unknown(status) => *status,
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            StatusFailure::BadRequest => "bad request",
            StatusFailure::Unauthorized => "unauthorized, the API key is missing",
            StatusFailure::Forbidden => "forbidden, the API key is invalid or expired",
            StatusFailure::NotFound => "data not found",
            StatusFailure::UnsupportedMediaType => "unsupported media type",
            StatusFailure::InternalServerError => "internal server error",
            StatusFailure::ServiceUnavailable => "service unavailable",
            StatusFailure::Unknown(_) => "unknown status",
        }
    }
}

impl fmt::Display for StatusFailure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({})", self.reason(), self.status())
    }
}

pub struct Worker {
    transport: Arc<dyn HttpTransport>,
    tracker: Arc<RateLimitTracker>,
    max_attempts: u32,
    jitter: f64,
}

impl Worker {
    pub fn new(transport: Arc<dyn HttpTransport>, tracker: Arc<RateLimitTracker>, max_attempts: u32, jitter: f64) -> Self {
        Self {
            transport,
            tracker,
            max_attempts: max_attempts.max(1),
            jitter,
        }
    }

    /// Serves orders until the stop channel is closed or every queue sender
    /// is gone. An order already being handled is always finished first.
    pub fn run(self, queue: Receiver<WorkOrder>, stop: Receiver<()>) {
        info!("api worker started");
        loop {
            crossbeam::select! {
                recv(stop) -> _ => break,
                recv(queue) -> order => match order {
                    Ok(order) => self.handle(order),
                    Err(_) => break,
                },
            }
        }
        info!("api worker stopped");
    }

    fn handle(&self, order: WorkOrder) {
        let WorkOrder {
            request,
            method,
            respond_to,
        } = order;

        let result = self.dispatch(&request, method);
        if respond_to.send(result).is_err() {
            debug!(%method, "caller stopped waiting, dropping response");
        }
    }

    /// Sends `request`, honouring the tracker before every attempt. Network
    /// errors and 429s are retried up to the attempt cap, everything else is
    /// returned right away.
    pub fn dispatch(&self, request: &ApiRequest, method: ApiMethod) -> WorkResponse {
        let mut attempt = 1;
        loop {
            self.wait_for_budget(method);

            let error = match self.transport.execute(request) {
                Err(err) => {
                    warn!(%method, attempt, error = %err, "request failed");
                    RiotApiRequestError::Network(err)
                }
                Ok(response) => {
                    self.tracker.update_from_headers(&response.headers, method);

                    match classify_status(response.status) {
                        StatusClass::Success => {
                            debug!(%method, attempt, "request succeeded");
                            return Ok(response);
                        }
                        StatusClass::Failed(failure) => {
                            debug!(%method, status = response.status, "request rejected");
                            return Err(RiotApiRequestError::Status { method, failure });
                        }
                        StatusClass::RateLimited => {
                            let wait = self.tracker.record_rate_limited(&response.headers);
                            let limit_type = response
                                .headers
                                .get(RATE_LIMIT_TYPE)
                                .and_then(|v| v.to_str().ok())
                                .unwrap_or("unspecified");
                            warn!(%method, attempt, limit_type, wait_ms = wait.as_millis() as u64, "rate limited");
                            RiotApiRequestError::RateLimited { method }
                        }
                    }
                }
            };

            if attempt >= self.max_attempts {
                warn!(%method, attempts = attempt, "giving up");
                return Err(error);
            }
            attempt += 1;
        }
    }

    fn wait_for_budget(&self, method: ApiMethod) {
        let safe = self.tracker.safe_retry_time(method);
        let now = Instant::now();
        if safe > now {
            let wait = apply_jitter(safe - now, self.jitter);
            debug!(%method, wait_ms = wait.as_millis() as u64, "waiting for rate limit budget");
            thread::sleep(wait);
        }
    }
}

/// Spreads `wait` by up to `fraction` in either direction. A fraction of 0
/// leaves the wait untouched.
pub fn apply_jitter(wait: Duration, fraction: f64) -> Duration {
    if fraction <= 0.0 || wait.is_zero() {
        return wait;
    }

    let fraction = fraction.min(1.0);
    let factor = 1.0 + rand::thread_rng().gen_range(-fraction..=fraction);
    wait.mul_f64(factor)
}
