use std::{
    collections::BTreeMap,
    fmt, fs, io,
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};

use chrono::{DateTime, Utc};
use json::JsonValue;
use thiserror::Error;
use tracing::{debug, warn};

/// The kinds of documents that get persisted. Each kind maps to its own
/// directory in file storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Account,
    Summoner,
    LeagueEntries,
    Masteries,
    Match,
    Rotation,
    Champions,
    Items,
}

impl EntityKind {
    pub fn dir_name(self) -> &'static str {
        match self {
            EntityKind::Account => "accounts",
            EntityKind::Summoner => "summoners",
            EntityKind::LeagueEntries => "league_entries",
            EntityKind::Masteries => "masteries",
            EntityKind::Match => "matches",
            EntityKind::Rotation => "rotations",
            EntityKind::Champions => "champions",
            EntityKind::Items => "items",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.dir_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StorageKey {
    pub kind: EntityKind,
    pub id: String,
}

impl StorageKey {
    pub fn new(kind: EntityKind, id: impl Into<String>) -> Self {
        Self { kind, id: id.into() }
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub fetched_at: DateTime<Utc>,
    pub data: JsonValue,
}

pub trait Storage: Send + Sync {
    fn get(&self, key: &StorageKey) -> Result<Option<StoredDocument>, StorageError>;
    fn store(&self, key: &StorageKey, data: &JsonValue, fetched_at: DateTime<Utc>) -> Result<(), StorageError>;
    /// All documents of one kind, ordered by id.
    fn list(&self, kind: EntityKind) -> Result<Vec<(String, StoredDocument)>, StorageError>;
}

#[derive(Default)]
pub struct InMemoryStorage {
    documents: Mutex<BTreeMap<StorageKey, StoredDocument>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.documents.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Storage for InMemoryStorage {
    fn get(&self, key: &StorageKey) -> Result<Option<StoredDocument>, StorageError> {
        let documents = self.documents.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(documents.get(key).cloned())
    }

    fn store(&self, key: &StorageKey, data: &JsonValue, fetched_at: DateTime<Utc>) -> Result<(), StorageError> {
        let mut documents = self.documents.lock().unwrap_or_else(PoisonError::into_inner);
        documents.insert(
            key.clone(),
            StoredDocument {
                fetched_at,
                data: data.clone(),
            },
        );
        Ok(())
    }

    fn list(&self, kind: EntityKind) -> Result<Vec<(String, StoredDocument)>, StorageError> {
        let documents = self.documents.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(documents
            .iter()
            .filter(|(key, _)| key.kind == kind)
            .map(|(key, doc)| (key.id.clone(), doc.clone()))
            .collect())
    }
}

/// One JSON file per document at `<root>/<kind>/<url-encoded id>.json`.
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &StorageKey) -> PathBuf {
        self.root
            .join(key.kind.dir_name())
            .join(format!("{}.json", urlencoding::encode(&key.id)))
    }

    fn read_document(path: &Path) -> Result<StoredDocument, StorageError> {
        let content = fs::read_to_string(path)?;
        let json = json::parse(&content).map_err(|e| StorageError::Corrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let fetched_at = json["fetchedAt"]
            .as_str()
            .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
            .map(|ts| ts.with_timezone(&Utc))
            .ok_or_else(|| StorageError::Corrupt {
                path: path.to_path_buf(),
                reason: "missing or invalid fetchedAt".into(),
            })?;

        Ok(StoredDocument {
            fetched_at,
            data: json["data"].clone(),
        })
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &StorageKey) -> Result<Option<StoredDocument>, StorageError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        FileStorage::read_document(&path).map(Some)
    }

    fn store(&self, key: &StorageKey, data: &JsonValue, fetched_at: DateTime<Utc>) -> Result<(), StorageError> {
        let path = self.path_for(key);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let mut document = JsonValue::new_object();
        document["fetchedAt"] = fetched_at.to_rfc3339().into();
        document["data"] = data.clone();

        // Write next to the target first so readers never see a partial file
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, document.dump())?;
        fs::rename(&tmp_path, &path)?;

        debug!(key = %key, path = %path.display(), "stored document");
        Ok(())
    }

    fn list(&self, kind: EntityKind) -> Result<Vec<(String, StoredDocument)>, StorageError> {
        let dir = self.root.join(kind.dir_name());
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut documents = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            let id = match urlencoding::decode(stem) {
                Ok(id) => id.into_owned(),
                Err(_) => {
                    warn!(path = %path.display(), "skipping file with undecodable name");
                    continue;
                }
            };
            match FileStorage::read_document(&path) {
                Ok(doc) => documents.push((id, doc)),
                Err(StorageError::Corrupt { reason, .. }) => {
                    warn!(path = %path.display(), reason, "skipping corrupt stored document");
                }
                Err(err) => return Err(err),
            }
        }

        documents.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(documents)
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage i/o failed: {0}")]
    Io(#[from] io::Error),
    #[error("stored document {path} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },
}
