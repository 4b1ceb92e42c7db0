use std::sync::Arc;

use chrono::{Duration, Utc};
use json::JsonValue;
use once_cell::sync::OnceCell;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    config::RiotClientConfig,
    model::{
        champion::{Champion, ChampionRotation},
        ids::{MatchId, Puuid},
        item::Item,
        league::LeagueEntry,
        livegame::ActiveGame,
        mastery::ChampionMastery,
        matches::Match,
        summoner::{Account, Summoner},
    },
};

use super::{
    gameapi::{
        ddragon_client::{DataDragonClient, StaticDataError},
        parsing::{
            champion::{parse_champions, parse_rotation},
            item::parse_items,
            league::parse_league_entries,
            livegame::parse_active_game,
            mastery::parse_masteries,
            matches::{parse_match, parse_match_ids},
            parse_body,
            summoner::{parse_account, parse_summoner},
            ParsingError,
        },
        riot_api_client::{RiotApiClient, RiotApiClientInitError, RiotApiRequestError},
    },
    storage::{EntityKind, FileStorage, Storage, StorageError, StorageKey},
};

/// How long a stored document of the given kind stays fresh. `None` never expires.
pub fn max_age(kind: EntityKind) -> Option<Duration> {
    match kind {
        EntityKind::Match | EntityKind::Champions | EntityKind::Items => None,
        EntityKind::Account
        | EntityKind::Summoner
        | EntityKind::LeagueEntries
        | EntityKind::Masteries
        | EntityKind::Rotation => Some(Duration::hours(1)),
    }
}

/// Reads through storage before asking the Riot API or Data Dragon.
pub struct DataManager {
    client: RiotApiClient,
    static_data: DataDragonClient,
    storage: Arc<dyn Storage>,
    version: String,
    champions_cache: OnceCell<Vec<Champion>>,
    items_cache: OnceCell<Vec<Item>>,
}

impl DataManager {
    pub fn new(config: &RiotClientConfig) -> Result<Self, DataManagerInitError> {
        let client = RiotApiClient::new(config)?;
        let static_data = DataDragonClient::new(config.http_timeout).map_err(RiotApiClientInitError::from)?;
        let storage = Arc::new(FileStorage::new(config.storage_dir.clone()));
        DataManager::with_parts(client, static_data, storage, &config.version)
    }

    /// Assembles a manager and starts the client's worker.
    pub fn with_parts(
        client: RiotApiClient,
        static_data: DataDragonClient,
        storage: Arc<dyn Storage>,
        version: &str,
    ) -> Result<Self, DataManagerInitError> {
        client.start()?;
        Ok(Self {
            client,
            static_data,
            storage,
            version: version.to_string(),
            champions_cache: OnceCell::new(),
            items_cache: OnceCell::new(),
        })
    }

    pub fn client(&self) -> &RiotApiClient {
        &self.client
    }

    pub fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }

    pub fn get_account(&self, game_name: &str, tag_line: &str) -> DataRetrievalResult<Account> {
        // Riot ids are case insensitive
        let id = format!("{}#{}", game_name, tag_line).to_lowercase();
        self.cached(
            StorageKey::new(EntityKind::Account, id),
            || Ok(self.client.get_account_by_riot_id(game_name, tag_line)?),
            parse_account,
        )
    }

    pub fn get_summoner(&self, puuid: &Puuid) -> DataRetrievalResult<Summoner> {
        self.cached(
            StorageKey::new(EntityKind::Summoner, puuid.0.as_str()),
            || Ok(self.client.get_summoner_by_puuid(puuid)?),
            parse_summoner,
        )
    }

    pub fn get_league_entries(&self, puuid: &Puuid) -> DataRetrievalResult<Vec<LeagueEntry>> {
        self.cached(
            StorageKey::new(EntityKind::LeagueEntries, puuid.0.as_str()),
            || Ok(self.client.get_league_entries_by_puuid(puuid)?),
            parse_league_entries,
        )
    }

    pub fn get_masteries(&self, puuid: &Puuid) -> DataRetrievalResult<Vec<ChampionMastery>> {
        self.cached(
            StorageKey::new(EntityKind::Masteries, puuid.0.as_str()),
            || Ok(self.client.get_champion_masteries_by_puuid(puuid)?),
            parse_masteries,
        )
    }

    pub fn get_rotation(&self) -> DataRetrievalResult<ChampionRotation> {
        self.cached(
            StorageKey::new(EntityKind::Rotation, self.client.platform().host()),
            || Ok(self.client.get_champion_rotation()?),
            parse_rotation,
        )
    }

    /// Most recent match ids, always asked fresh.
    pub fn get_match_ids(&self, puuid: &Puuid, count: u32) -> DataRetrievalResult<Vec<MatchId>> {
        let body = self.client.get_match_ids_by_puuid(puuid, 0, count)?;
        Ok(parse_match_ids(&parse_body(&body)?)?)
    }

    pub fn get_match(&self, match_id: &MatchId) -> DataRetrievalResult<Match> {
        self.cached(
            StorageKey::new(EntityKind::Match, match_id.0.as_str()),
            || Ok(self.client.get_match(match_id)?),
            parse_match,
        )
    }

    /// Fetches and stores the player's latest matches. Matches already in
    /// storage are not requested again.
    pub fn fetch_recent_matches(&self, puuid: &Puuid, count: u32) -> DataRetrievalResult<Vec<Match>> {
        let ids = self.get_match_ids(puuid, count)?;
        info!(%puuid, matches = ids.len(), "fetching recent matches");
        ids.iter().map(|id| self.get_match(id)).collect()
    }

    /// Live games change by the second, so they never touch storage.
    pub fn get_active_game(&self, puuid: &Puuid) -> DataRetrievalResult<Option<ActiveGame>> {
        match self.client.get_active_game_by_puuid(puuid)? {
            Some(body) => Ok(Some(parse_active_game(&parse_body(&body)?)?)),
            None => Ok(None),
        }
    }

    pub fn get_champions(&self) -> DataRetrievalResult<&Vec<Champion>> {
        self.champions_cache.get_or_try_init(|| {
            let version = self.static_data.resolve_version(&self.version)?;
            self.cached(
                StorageKey::new(EntityKind::Champions, version.as_str()),
                || Ok(self.static_data.champions_json(&version)?),
                parse_champions,
            )
        })
    }

    pub fn get_items(&self) -> DataRetrievalResult<&Vec<Item>> {
        self.items_cache.get_or_try_init(|| {
            let version = self.static_data.resolve_version(&self.version)?;
            self.cached(
                StorageKey::new(EntityKind::Items, version.as_str()),
                || Ok(self.static_data.items_json(&version)?),
                parse_items,
            )
        })
    }

    /// Every match in storage, skipping documents that no longer parse.
    pub fn stored_matches(&self) -> DataRetrievalResult<Vec<Match>> {
        let documents = self.storage.list(EntityKind::Match)?;
        Ok(documents
            .into_iter()
            .filter_map(|(id, doc)| match parse_match(&doc.data) {
                Ok(parsed) => Some(parsed),
                Err(err) => {
                    warn!(match_id = %id, error = %err, "skipping unreadable stored match");
                    None
                }
            })
            .collect())
    }

    fn cached<T, R, F, P>(&self, key: StorageKey, fetch: F, parse: P) -> DataRetrievalResult<T>
    where
        R: IntoJson,
        F: FnOnce() -> DataRetrievalResult<R>,
        P: Fn(&JsonValue) -> Result<T, ParsingError>,
    {
        let stored = match self.storage.get(&key) {
            Ok(stored) => stored,
            Err(StorageError::Corrupt { reason, .. }) => {
                warn!(%key, reason, "stored document corrupt, refetching");
                None
            }
            Err(err) => return Err(err.into()),
        };

        if let Some(doc) = stored {
            let fresh = match max_age(key.kind) {
                Some(age) => Utc::now() - doc.fetched_at < age,
                None => true,
            };
            if fresh {
                match parse(&doc.data) {
                    Ok(value) => {
                        debug!(%key, "storage hit");
                        return Ok(value);
                    }
                    Err(err) => warn!(%key, error = %err, "stored document unreadable, refetching"),
                }
            } else {
                debug!(%key, fetched_at = %doc.fetched_at, "stored document expired");
            }
        }

        let json = fetch()?.into_json()?;
        let value = parse(&json)?;
        self.storage.store(&key, &json, Utc::now())?;
        debug!(%key, "stored fresh document");
        Ok(value)
    }
}

/// Fetchers either hand back raw response bytes or already decoded JSON.
trait IntoJson {
    fn into_json(self) -> Result<JsonValue, ParsingError>;
}

impl IntoJson for Vec<u8> {
    fn into_json(self) -> Result<JsonValue, ParsingError> {
        parse_body(&self)
    }
}

impl IntoJson for JsonValue {
    fn into_json(self) -> Result<JsonValue, ParsingError> {
        Ok(self)
    }
}

pub type DataRetrievalResult<T> = Result<T, DataRetrievalError>;

#[derive(Debug, Error)]
pub enum DataManagerInitError {
    #[error("riot api client could not be set up: {0}")]
    ClientFailed(#[from] RiotApiClientInitError),
}

#[derive(Debug, Error)]
pub enum DataRetrievalError {
    #[error(transparent)]
    Request(#[from] RiotApiRequestError),
    #[error(transparent)]
    StaticData(#[from] StaticDataError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("response could not be parsed: {0}")]
    Parsing(#[from] ParsingError),
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Mutex,
        },
        time::Duration as StdDuration,
    };

    use reqwest::header::HeaderMap;

    use super::*;
    use crate::service::{
        gameapi::transport::{ApiRequest, ApiResponse, HttpTransport, TransportError},
        storage::InMemoryStorage,
    };

    const ACCOUNT: &str = r#"{"puuid":"p-1","gameName":"Alpha","tagLine":"EUW"}"#;
    const SUMMONER: &str = r#"{"puuid":"p-1","profileIconId":1,"revisionDate":1700000000000,"summonerLevel":30}"#;
    const MATCH_IDS: &str = r#"["EUW1_1","EUW1_2"]"#;

    fn match_json(id: &str) -> String {
        format!(
            r#"{{"metadata":{{"matchId":"{}"}},"info":{{"gameCreation":1700000000000,"gameDuration":1500,
            "gameEndTimestamp":1700001500000,"gameVersion":"14.1","queueId":420,"participants":[
            {{"puuid":"p-1","riotIdGameName":"Alpha","riotIdTagline":"EUW","championId":103,"championName":"Ahri",
            "teamId":100,"teamPosition":"MIDDLE","win":true,"kills":5,"deaths":1,"assists":5}}]}}}}"#,
            id
        )
    }

    /// Answers by URL and counts requests per path prefix.
    #[derive(Default)]
    struct FakeRiot {
        calls: Mutex<HashMap<&'static str, usize>>,
        total: AtomicUsize,
    }

    impl FakeRiot {
        fn count(&self, route: &'static str) -> usize {
            *self.calls.lock().unwrap().get(route).unwrap_or(&0)
        }
    }

    impl HttpTransport for FakeRiot {
        fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
            self.total.fetch_add(1, Ordering::SeqCst);
            let url = request.url.as_str();
            let (route, status, body): (&'static str, u16, String) = if url.contains("/accounts/by-riot-id/") {
                ("account", 200, ACCOUNT.to_string())
            } else if url.contains("/summoners/by-puuid/") {
                ("summoner", 200, SUMMONER.to_string())
            } else if url.contains("/matches/by-puuid/") {
                ("match_ids", 200, MATCH_IDS.to_string())
            } else if let Some(id) = url.split("/lol/match/v5/matches/").nth(1) {
                ("match", 200, match_json(id))
            } else if url.contains("/champion-masteries/by-puuid/") {
                (
                    "masteries",
                    200,
                    r#"[{"championId":103,"championLevel":7,"championPoints":90000,"lastPlayTime":1700000000000}]"#
                        .to_string(),
                )
            } else if url.contains("/spectator/") {
                ("live", 404, String::new())
            } else if url.ends_with("versions.json") {
                ("versions", 200, r#"["14.2.1"]"#.to_string())
            } else if url.ends_with("champion.json") {
                (
                    "champions",
                    200,
                    r#"{"data":{"Ahri":{"key":"103","name":"Ahri","title":"the Nine-Tailed Fox","tags":["Mage"]}}}"#
                        .to_string(),
                )
            } else {
                ("other", 500, String::new())
            };
            *self.calls.lock().unwrap().entry(route).or_default() += 1;
            Ok(ApiResponse {
                status,
                headers: HeaderMap::new(),
                body: body.into_bytes(),
            })
        }
    }

    fn manager(storage: Arc<dyn Storage>) -> (DataManager, Arc<FakeRiot>) {
        let fake = Arc::new(FakeRiot::default());
        let mut config = RiotClientConfig::new("RGAPI-test", "euw1", "latest");
        config.call_timeout = StdDuration::from_secs(5);
        let client = RiotApiClient::with_transport(&config, fake.clone()).unwrap();
        let static_data = DataDragonClient::with_transport("http://ddragon.test", fake.clone());
        let manager = DataManager::with_parts(client, static_data, storage, &config.version).unwrap();
        (manager, fake)
    }

    #[test]
    fn second_read_is_served_from_storage() {
        let (manager, fake) = manager(Arc::new(InMemoryStorage::new()));

        let first = manager.get_account("Alpha", "EUW").unwrap();
        let second = manager.get_account("alpha", "euw").unwrap();
        assert_eq!(first.puuid, second.puuid);
        assert_eq!(fake.count("account"), 1);
    }

    #[test]
    fn expired_document_is_refetched() {
        let storage = Arc::new(InMemoryStorage::new());
        let key = StorageKey::new(EntityKind::Summoner, "p-1");
        let stale = json::parse(SUMMONER).unwrap();
        storage.store(&key, &stale, Utc::now() - Duration::hours(2)).unwrap();

        let (manager, fake) = manager(storage.clone());
        manager.get_summoner(&Puuid::from("p-1")).unwrap();
        assert_eq!(fake.count("summoner"), 1);

        let refreshed = storage.get(&key).unwrap().unwrap();
        assert!(Utc::now() - refreshed.fetched_at < Duration::minutes(1));
    }

    #[test]
    fn matches_never_expire() {
        let storage = Arc::new(InMemoryStorage::new());
        let old = json::parse(&match_json("EUW1_1")).unwrap();
        storage
            .store(&StorageKey::new(EntityKind::Match, "EUW1_1"), &old, Utc::now() - Duration::days(400))
            .unwrap();

        let (manager, fake) = manager(storage);
        let matches = manager.fetch_recent_matches(&Puuid::from("p-1"), 2).unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(fake.count("match_ids"), 1);
        assert_eq!(fake.count("match"), 1);
        assert_eq!(manager.stored_matches().unwrap().len(), 2);
    }

    #[test]
    fn active_games_bypass_storage() {
        let storage = Arc::new(InMemoryStorage::new());
        let (manager, fake) = manager(storage.clone());

        assert!(manager.get_active_game(&Puuid::from("p-1")).unwrap().is_none());
        assert!(manager.get_active_game(&Puuid::from("p-1")).unwrap().is_none());
        assert_eq!(fake.count("live"), 2);
        assert!(storage.is_empty());
    }

    #[test]
    fn static_data_is_stored_under_resolved_version() {
        let storage = Arc::new(InMemoryStorage::new());
        let (manager, fake) = manager(storage.clone());

        assert_eq!(manager.get_champions().unwrap()[0].name, "Ahri");
        assert_eq!(manager.get_champions().unwrap().len(), 1);
        assert_eq!(fake.count("champions"), 1);
        assert!(storage
            .get(&StorageKey::new(EntityKind::Champions, "14.2.1"))
            .unwrap()
            .is_some());
    }

    #[test]
    fn corrupt_file_is_refetched_and_skipped_in_listing() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(FileStorage::new(dir.path()));
        std::fs::create_dir_all(dir.path().join("summoners")).unwrap();
        std::fs::write(dir.path().join("summoners").join("p-1.json"), "{trunc").unwrap();

        let (manager, fake) = manager(storage.clone());
        assert_eq!(manager.get_summoner(&Puuid::from("p-1")).unwrap().level, 30);
        assert_eq!(fake.count("summoner"), 1);
        assert!(storage
            .get(&StorageKey::new(EntityKind::Summoner, "p-1"))
            .unwrap()
            .is_some());

        manager.get_match(&MatchId::from("EUW1_1")).unwrap();
        std::fs::write(dir.path().join("matches").join("EUW1_2.json"), "{trunc").unwrap();
        let matches = manager.stored_matches().unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].match_id, MatchId::from("EUW1_1"));
    }

    #[test]
    fn masteries_are_cached_per_player() {
        let (manager, fake) = manager(Arc::new(InMemoryStorage::new()));
        let puuid = Puuid::from("p-1");

        assert_eq!(manager.get_masteries(&puuid).unwrap()[0].points, 90_000);
        manager.get_masteries(&puuid).unwrap();
        assert_eq!(fake.count("masteries"), 1);
    }

    #[test]
    fn unreadable_document_is_replaced() {
        let storage = Arc::new(InMemoryStorage::new());
        let key = StorageKey::new(EntityKind::Summoner, "p-1");
        storage.store(&key, &json::parse(r#"{"puuid":"p-1"}"#).unwrap(), Utc::now()).unwrap();

        let (manager, fake) = manager(storage);
        assert_eq!(manager.get_summoner(&Puuid::from("p-1")).unwrap().level, 30);
        assert_eq!(fake.count("summoner"), 1);
    }
}
