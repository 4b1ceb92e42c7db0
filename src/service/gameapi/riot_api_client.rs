use std::{
    io,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use crossbeam::channel::{self, RecvTimeoutError, SendTimeoutError, Sender};
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE},
    Method,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    config::{ConfigError, RiotClientConfig},
    model::ids::{MatchId, Puuid},
};

use super::{
    endpoint::{ApiMethod, Platform},
    rate_limit::RateLimitTracker,
    transport::{ApiRequest, HttpTransport, ReqwestTransport, TransportError},
    worker::{StatusFailure, WorkOrder, Worker},
};

const RIOT_TOKEN: &str = "x-riot-token";

struct RunningWorker {
    queue: Sender<WorkOrder>,
    stop: Sender<()>,
    handle: JoinHandle<()>,
}

/// Client for the rate limited Riot endpoints. Every call goes through one
/// background worker, which must be started with [`RiotApiClient::start`].
pub struct RiotApiClient {
    platform: Platform,
    api_key: HeaderValue,
    call_timeout: Duration,
    max_attempts: u32,
    jitter: f64,
    transport: Arc<dyn HttpTransport>,
    tracker: Arc<RateLimitTracker>,
    worker: Mutex<Option<RunningWorker>>,
}

impl RiotApiClient {
    pub fn new(config: &RiotClientConfig) -> Result<Self, RiotApiClientInitError> {
        let transport = ReqwestTransport::new(config.http_timeout)?;
        Self::with_transport(config, Arc::new(transport))
    }

    pub fn with_transport(
        config: &RiotClientConfig,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self, RiotApiClientInitError> {
        let platform = config.validate()?;
        let mut api_key = HeaderValue::from_str(config.api_key.trim()).map_err(|_| ConfigError::InvalidApiKey)?;
        api_key.set_sensitive(true);

        Ok(Self {
            platform,
            api_key,
            call_timeout: config.call_timeout,
            max_attempts: config.max_attempts,
            jitter: config.jitter,
            transport,
            tracker: Arc::new(RateLimitTracker::new(
                config.retry_after_unparsable,
                config.retry_after_missing,
            )),
            worker: Mutex::new(None),
        })
    }

    fn lock_worker(&self) -> MutexGuard<'_, Option<RunningWorker>> {
        self.worker.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn start(&self) -> Result<(), RiotApiClientInitError> {
        let mut running = self.lock_worker();
        if running.is_some() {
            info!("riot api client already started");
            return Ok(());
        }

        // Closed channels can't be reopened, so every start gets fresh ones
        let (queue, queue_rx) = channel::bounded(0);
        let (stop, stop_rx) = channel::bounded(0);
        let worker = Worker::new(
            Arc::clone(&self.transport),
            Arc::clone(&self.tracker),
            self.max_attempts,
            self.jitter,
        );
        let handle = thread::Builder::new()
            .name("riot-api-worker".to_string())
            .spawn(move || worker.run(queue_rx, stop_rx))
            .map_err(RiotApiClientInitError::WorkerSpawn)?;

        *running = Some(RunningWorker { queue, stop, handle });
        info!(platform = %self.platform, "riot api client started");
        Ok(())
    }

    /// Stops the worker after its current order and waits for it to exit.
    pub fn stop(&self) {
        let Some(running) = self.lock_worker().take() else {
            debug!("riot api client not running");
            return;
        };

        let RunningWorker { queue, stop, handle } = running;
        drop(queue);
        drop(stop);
        if handle.join().is_err() {
            warn!("riot api worker panicked");
        }
        info!("riot api client stopped");
    }

    pub fn is_started(&self) -> bool {
        self.lock_worker().is_some()
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Queues a request and blocks until the worker answers or the call
    /// timeout runs out. Only the body of a 200 response is ever returned.
    pub fn call(
        &self,
        method: ApiMethod,
        url: &str,
        http_method: Method,
        body: Option<Vec<u8>>,
    ) -> Result<Vec<u8>, RiotApiRequestError> {
        let queue = match self.lock_worker().as_ref() {
            Some(running) => running.queue.clone(),
            None => return Err(RiotApiRequestError::NotStarted),
        };

        let mut headers = HeaderMap::new();
        headers.insert(HeaderName::from_static(RIOT_TOKEN), self.api_key.clone());
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let (respond_to, response) = channel::bounded(1);
        let order = WorkOrder {
            request: ApiRequest {
                method: http_method,
                url: url.to_string(),
                headers,
                body,
            },
            method,
            respond_to,
        };

        // Hand-off and answer share one deadline
        let deadline = Instant::now() + self.call_timeout;
        debug!(%method, url, "queueing request");
        queue.send_deadline(order, deadline).map_err(|err| match err {
            SendTimeoutError::Timeout(_) => RiotApiRequestError::WorkerTimeout(self.call_timeout),
            SendTimeoutError::Disconnected(_) => RiotApiRequestError::WorkerStopped,
        })?;

        match response.recv_deadline(deadline) {
            Ok(result) => result.map(|response| response.body),
            Err(RecvTimeoutError::Timeout) => Err(RiotApiRequestError::WorkerTimeout(self.call_timeout)),
            Err(RecvTimeoutError::Disconnected) => Err(RiotApiRequestError::WorkerStopped),
        }
    }

    fn get(&self, method: ApiMethod, path: &str) -> Result<Vec<u8>, RiotApiRequestError> {
        let url = format!("{}{}", self.platform.base_url(method), path);
        self.call(method, &url, Method::GET, None)
    }

    pub fn get_account_by_riot_id(&self, game_name: &str, tag_line: &str) -> Result<Vec<u8>, RiotApiRequestError> {
        if game_name.is_empty() || tag_line.is_empty() {
            return Err(RiotApiRequestError::InvalidRequest(
                "riot id needs a name and a tagline".to_string(),
            ));
        }

        let path = format!(
            "/riot/account/v1/accounts/by-riot-id/{}/{}",
            urlencoding::encode(game_name),
            urlencoding::encode(tag_line)
        );
        self.get(ApiMethod::AccountByRiotId, &path)
    }

    pub fn get_summoner_by_puuid(&self, puuid: &Puuid) -> Result<Vec<u8>, RiotApiRequestError> {
        let path = format!("/lol/summoner/v4/summoners/by-puuid/{}", urlencoding::encode(&puuid.0));
        self.get(ApiMethod::SummonerByPuuid, &path)
    }

    pub fn get_match_ids_by_puuid(
        &self,
        puuid: &Puuid,
        start: u32,
        count: u32,
    ) -> Result<Vec<u8>, RiotApiRequestError> {
        // match-v5 caps a page at 100 ids
        let path = format!(
            "/lol/match/v5/matches/by-puuid/{}/ids?start={}&count={}",
            urlencoding::encode(&puuid.0),
            start,
            count.clamp(1, 100)
        );
        self.get(ApiMethod::MatchIdsByPuuid, &path)
    }

    pub fn get_match(&self, match_id: &MatchId) -> Result<Vec<u8>, RiotApiRequestError> {
        let path = format!("/lol/match/v5/matches/{}", urlencoding::encode(&match_id.0));
        self.get(ApiMethod::Match, &path)
    }

    pub fn get_league_entries_by_puuid(&self, puuid: &Puuid) -> Result<Vec<u8>, RiotApiRequestError> {
        let path = format!("/lol/league/v4/entries/by-puuid/{}", urlencoding::encode(&puuid.0));
        self.get(ApiMethod::LeagueEntriesByPuuid, &path)
    }

    pub fn get_champion_masteries_by_puuid(&self, puuid: &Puuid) -> Result<Vec<u8>, RiotApiRequestError> {
        let path = format!(
            "/lol/champion-mastery/v4/champion-masteries/by-puuid/{}",
            urlencoding::encode(&puuid.0)
        );
        self.get(ApiMethod::ChampionMasteryByPuuid, &path)
    }

    pub fn get_champion_rotation(&self) -> Result<Vec<u8>, RiotApiRequestError> {
        self.get(ApiMethod::ChampionRotation, "/lol/platform/v3/champion-rotations")
    }

    /// Returns `None` when the player is not in a game, which the spectator
    /// endpoint reports as 404.
    pub fn get_active_game_by_puuid(&self, puuid: &Puuid) -> Result<Option<Vec<u8>>, RiotApiRequestError> {
        let path = format!(
            "/lol/spectator/v5/active-games/by-summoner/{}",
            urlencoding::encode(&puuid.0)
        );
        match self.get(ApiMethod::ActiveGameByPuuid, &path) {
            Ok(body) => Ok(Some(body)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }
}

impl Drop for RiotApiClient {
    fn drop(&mut self) {
        self.stop();
    }
}

#[derive(Debug, Error)]
pub enum RiotApiClientInitError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to create HTTP client: {0}")]
    HttpClientCreation(#[from] reqwest::Error),
    #[error("failed to spawn api worker: {0}")]
    WorkerSpawn(io::Error),
}

#[derive(Debug, Error)]
pub enum RiotApiRequestError {
    #[error("riot api client has not been started")]
    NotStarted,
    #[error("worker did not answer within {0:?}")]
    WorkerTimeout(Duration),
    #[error("worker stopped before answering")]
    WorkerStopped,
    #[error("rate limited on {method}, retries exhausted")]
    RateLimited { method: ApiMethod },
    #[error("network error: {0}")]
    Network(#[from] TransportError),
    #[error("{method} failed: {failure}")]
    Status { method: ApiMethod, failure: StatusFailure },
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl RiotApiRequestError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            RiotApiRequestError::Status {
                failure: StatusFailure::NotFound,
                ..
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::service::gameapi::transport::ApiResponse;

    #[derive(Default)]
    struct RecordingTransport {
        requests: Mutex<Vec<ApiRequest>>,
        delay: Duration,
        status: u16,
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl RecordingTransport {
        fn with_status(status: u16) -> Arc<Self> {
            Arc::new(Self {
                status,
                ..Default::default()
            })
        }

        fn slow(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                status: 200,
                delay,
                ..Default::default()
            })
        }

        fn urls(&self) -> Vec<String> {
            self.requests.lock().unwrap().iter().map(|r| r.url.clone()).collect()
        }
    }

    impl HttpTransport for RecordingTransport {
        fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push(request.clone());
            let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(running, Ordering::SeqCst);
            thread::sleep(self.delay);
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(ApiResponse {
                status: self.status,
                headers: HeaderMap::new(),
                body: b"{}".to_vec(),
            })
        }
    }

    fn config() -> RiotClientConfig {
        let mut config = RiotClientConfig::new("RGAPI-test", "euw1", "latest");
        config.call_timeout = Duration::from_secs(5);
        config
    }

    fn client(transport: Arc<RecordingTransport>) -> RiotApiClient {
        RiotApiClient::with_transport(&config(), transport).unwrap()
    }

    #[test]
    fn construction_requires_configuration() {
        let transport = RecordingTransport::with_status(200);
        let result = RiotApiClient::with_transport(&RiotClientConfig::new("", "euw1", "latest"), transport);
        assert!(matches!(
            result,
            Err(RiotApiClientInitError::Config(ConfigError::MissingApiKey))
        ));
    }

    #[test]
    fn call_before_start_never_reaches_queue() {
        let transport = RecordingTransport::with_status(200);
        let client = client(transport.clone());

        let result = client.get_champion_rotation();
        assert!(matches!(result, Err(RiotApiRequestError::NotStarted)));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn call_attaches_token_and_content_type() {
        let transport = RecordingTransport::with_status(200);
        let client = client(transport.clone());
        client.start().unwrap();

        assert_eq!(client.get_champion_rotation().unwrap(), b"{}".to_vec());

        let requests = transport.requests.lock().unwrap();
        let headers = &requests[0].headers;
        assert_eq!(headers.get("x-riot-token").unwrap(), "RGAPI-test");
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "application/json");
        assert_eq!(requests[0].method, Method::GET);
    }

    #[test]
    fn builds_platform_and_regional_urls() {
        let transport = RecordingTransport::with_status(200);
        let client = client(transport.clone());
        client.start().unwrap();

        let puuid = Puuid::from("abc-123");
        client.get_account_by_riot_id("Hide on bush", "KR1").unwrap();
        client.get_summoner_by_puuid(&puuid).unwrap();
        client.get_match_ids_by_puuid(&puuid, 0, 500).unwrap();
        client.get_match(&MatchId::from("EUW1_123")).unwrap();

        assert_eq!(
            transport.urls(),
            vec![
                "https://europe.api.riotgames.com/riot/account/v1/accounts/by-riot-id/Hide%20on%20bush/KR1",
                "https://euw1.api.riotgames.com/lol/summoner/v4/summoners/by-puuid/abc-123",
                "https://europe.api.riotgames.com/lol/match/v5/matches/by-puuid/abc-123/ids?start=0&count=100",
                "https://europe.api.riotgames.com/lol/match/v5/matches/EUW1_123",
            ]
        );
    }

    #[test]
    fn empty_riot_id_is_rejected() {
        let client = client(RecordingTransport::with_status(200));
        client.start().unwrap();
        assert!(matches!(
            client.get_account_by_riot_id("", "EUW"),
            Err(RiotApiRequestError::InvalidRequest(_))
        ));
    }

    #[test]
    fn not_found_surfaces_as_terminal_error() {
        let transport = RecordingTransport::with_status(404);
        let client = client(transport.clone());
        client.start().unwrap();

        let err = client.get_summoner_by_puuid(&Puuid::from("missing")).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn spectator_not_found_means_not_in_game() {
        let client = client(RecordingTransport::with_status(404));
        client.start().unwrap();
        assert!(client.get_active_game_by_puuid(&Puuid::from("p")).unwrap().is_none());
    }

    #[test]
    fn slow_worker_times_out_distinctly() {
        let transport = RecordingTransport::slow(Duration::from_millis(300));
        let mut config = config();
        config.call_timeout = Duration::from_millis(50);
        let client = RiotApiClient::with_transport(&config, transport).unwrap();
        client.start().unwrap();

        let err = client.get_champion_rotation().unwrap_err();
        assert!(matches!(err, RiotApiRequestError::WorkerTimeout(_)));
    }

    #[test]
    fn start_and_stop_are_idempotent() {
        let transport = RecordingTransport::with_status(200);
        let client = client(transport.clone());

        client.start().unwrap();
        client.start().unwrap();
        assert!(client.is_started());
        assert!(client.get_champion_rotation().is_ok());
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);

        client.stop();
        client.stop();
        assert!(!client.is_started());
        assert!(matches!(
            client.get_champion_rotation(),
            Err(RiotApiRequestError::NotStarted)
        ));
    }

    #[test]
    fn repeated_start_keeps_a_single_worker() {
        let transport = RecordingTransport::slow(Duration::from_millis(50));
        let client = Arc::new(client(transport.clone()));
        client.start().unwrap();
        client.start().unwrap();
        client.start().unwrap();

        let handles = (0..4)
            .map(|_| {
                let client = Arc::clone(&client);
                thread::spawn(move || client.get_champion_rotation().is_ok())
            })
            .collect::<Vec<_>>();
        for handle in handles {
            assert!(handle.join().unwrap());
        }

        assert_eq!(transport.calls.load(Ordering::SeqCst), 4);
        assert_eq!(transport.max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn restart_after_stop_serves_calls() {
        let transport = RecordingTransport::with_status(200);
        let client = client(transport.clone());

        client.start().unwrap();
        client.stop();
        client.start().unwrap();

        assert!(client.get_champion_rotation().is_ok());
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn concurrent_callers_are_all_served() {
        let transport = RecordingTransport::with_status(200);
        let client = Arc::new(client(transport.clone()));
        client.start().unwrap();

        let handles = (0..8)
            .map(|_| {
                let client = Arc::clone(&client);
                thread::spawn(move || client.get_champion_rotation().is_ok())
            })
            .collect::<Vec<_>>();

        for handle in handles {
            assert!(handle.join().unwrap());
        }
        assert_eq!(transport.calls.load(Ordering::SeqCst), 8);
    }
}
