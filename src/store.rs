use std::fs;
use std::io;
use std::path::PathBuf;

use chrono::NaiveDateTime;
use derive_more::{Display, From};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::request::{Request, RequestDraft, StatusUpdate};

#[derive(Debug, Display, From)]
pub enum StoreError {
    #[display(fmt = "request file I/O failed: {}", _0)]
    Io(io::Error),
    #[display(fmt = "request file is not valid JSON: {}", _0)]
    Json(serde_json::Error),
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Io(e) => Some(e),
            StoreError::Json(e) => Some(e),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct StoreFile {
    /// High-water mark so ids of deleted records are never handed out again
    #[serde(default)]
    next_id: u64,
    #[serde(default)]
    requests: Vec<Request>,
}

/// Flat-file request store. The whole collection is read on every call and
/// rewritten on every mutation, so it is only meant for small volumes.
/// Callers serialize access; there is no locking here.
#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[cfg(test)]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    fn load(&self) -> Result<StoreFile, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(StoreFile::default()),
            Err(e) => return Err(e.into()),
        };
        if raw.trim().is_empty() {
            return Ok(StoreFile::default());
        }

        // a bare array is the older layout without the id high-water mark
        let mut file = match serde_json::from_str::<Value>(&raw)? {
            Value::Array(items) => StoreFile {
                next_id: 0,
                requests: serde_json::from_value(Value::Array(items))?,
            },
            other => serde_json::from_value::<StoreFile>(other)?,
        };
        for request in &mut file.requests {
            request.refresh_duration_label();
        }
        Ok(file)
    }

    /// Writes a sibling temp file and renames it over the data file.
    fn save(&self, file: &StoreFile) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(file)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    pub fn list(&self) -> Result<Vec<Request>, StoreError> {
        Ok(self.load()?.requests)
    }

    /// Assigns the next id and persists a new pending record.
    pub fn append(
        &self,
        draft: RequestDraft,
        created_at: NaiveDateTime,
    ) -> Result<Request, StoreError> {
        let mut file = self.load()?;
        let max_id = file.requests.iter().map(|r| r.id).max().unwrap_or(0);
        let id = file.next_id.max(max_id + 1);

        let request = Request::from_draft(id, draft, created_at);
        file.requests.push(request.clone());
        file.next_id = id + 1;
        self.save(&file)?;

        tracing::debug!(id, path = %self.path.display(), "request appended");
        Ok(request)
    }

    pub fn get(&self, id: u64) -> Result<Option<Request>, StoreError> {
        Ok(self.load()?.requests.into_iter().find(|r| r.id == id))
    }

    pub fn update_status(
        &self,
        id: u64,
        update: StatusUpdate,
    ) -> Result<Option<Request>, StoreError> {
        let mut file = self.load()?;
        let Some(request) = file.requests.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };
        request.apply(update);
        let updated = request.clone();
        self.save(&file)?;
        Ok(Some(updated))
    }

    /// Returns false when no record has this id.
    pub fn remove(&self, id: u64) -> Result<bool, StoreError> {
        let mut file = self.load()?;
        let before = file.requests.len();
        file.requests.retain(|r| r.id != id);
        if file.requests.len() == before {
            return Ok(false);
        }
        // keep the high-water mark even if the removed record had the top id
        let max_id = file.requests.iter().map(|r| r.id).max().unwrap_or(0);
        file.next_id = file.next_id.max(max_id + 1).max(id + 1);
        self.save(&file)?;
        Ok(true)
    }
}
