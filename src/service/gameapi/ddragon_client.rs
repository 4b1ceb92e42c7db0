use std::{sync::Arc, time::Duration};

use json::JsonValue;
use once_cell::sync::OnceCell;
use reqwest::{header::HeaderMap, Method};
use thiserror::Error;
use tracing::debug;

use crate::model::{champion::Champion, item::Item};

use super::{
    parsing::{
        champion::parse_champions, item::parse_items, parse_body, versions::parse_versions, ParsingError,
    },
    transport::{ApiRequest, HttpTransport, ReqwestTransport, TransportError},
};

pub const DDRAGON_BASE_URL: &str = "https://ddragon.leagueoflegends.com";
pub const LATEST_VERSION: &str = "latest";
const LOCALE: &str = "en_US";

/// Fetches static game data from Data Dragon. Data Dragon is a CDN without
/// rate limits, so requests bypass the dispatcher.
pub struct DataDragonClient {
    base_url: String,
    transport: Arc<dyn HttpTransport>,
    latest: OnceCell<String>,
}

impl DataDragonClient {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let transport = ReqwestTransport::new(timeout)?;
        Ok(Self::with_transport(DDRAGON_BASE_URL, Arc::new(transport)))
    }

    pub fn with_transport(base_url: &str, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
            latest: OnceCell::new(),
        }
    }

    pub fn versions(&self) -> Result<Vec<String>, StaticDataError> {
        let json = self.fetch(&format!("{}/api/versions.json", self.base_url))?;
        Ok(parse_versions(&json)?)
    }

    /// Newest published version, looked up once per client.
    pub fn latest_version(&self) -> Result<&str, StaticDataError> {
        self.latest
            .get_or_try_init(|| self.versions()?.into_iter().next().ok_or(StaticDataError::NoVersions))
            .map(String::as_str)
    }

    /// Maps `latest` to a concrete version, anything else is passed through.
    pub fn resolve_version(&self, version: &str) -> Result<String, StaticDataError> {
        if version.eq_ignore_ascii_case(LATEST_VERSION) {
            Ok(self.latest_version()?.to_string())
        } else {
            Ok(version.to_string())
        }
    }

    pub fn champions_json(&self, version: &str) -> Result<JsonValue, StaticDataError> {
        let version = self.resolve_version(version)?;
        self.fetch(&format!("{}/cdn/{}/data/{}/champion.json", self.base_url, version, LOCALE))
    }

    pub fn items_json(&self, version: &str) -> Result<JsonValue, StaticDataError> {
        let version = self.resolve_version(version)?;
        self.fetch(&format!("{}/cdn/{}/data/{}/item.json", self.base_url, version, LOCALE))
    }

    pub fn champions(&self, version: &str) -> Result<Vec<Champion>, StaticDataError> {
        Ok(parse_champions(&self.champions_json(version)?)?)
    }

    pub fn items(&self, version: &str) -> Result<Vec<Item>, StaticDataError> {
        Ok(parse_items(&self.items_json(version)?)?)
    }

    fn fetch(&self, url: &str) -> Result<JsonValue, StaticDataError> {
        debug!(url, "fetching static data");
        let request = ApiRequest {
            method: Method::GET,
            url: url.to_string(),
            headers: HeaderMap::new(),
            body: None,
        };

        let response = self.transport.execute(&request)?;
        if response.status != 200 {
            return Err(StaticDataError::InvalidResponse {
                url: url.to_string(),
                status: response.status,
            });
        }

        Ok(parse_body(&response.body)?)
    }
}

#[derive(Debug, Error)]
pub enum StaticDataError {
    #[error("static data request failed: {0}")]
    Transport(#[from] TransportError),
    #[error("static data request to {url} returned HTTP {status}")]
    InvalidResponse { url: String, status: u16 },
    #[error("static data could not be parsed: {0}")]
    Parsing(#[from] ParsingError),
    #[error("Data Dragon published no versions")]
    NoVersions,
}
