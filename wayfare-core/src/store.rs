//! Flag storage port.
//!
//! Usage counts live in per-traveler key/value flags, the way a
//! tabletop host hangs module data off its actors. The port keeps the
//! rest of the crate indifferent to where flags actually live; the
//! file-backed impl gives the standalone binary durable storage.

use crate::party::TravelerId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tokio::sync::Mutex;

/// Namespace under which this module's flags live.
pub const FLAG_NAMESPACE: &str = "wayfare";

/// Current flag file version.
const FLAG_VERSION: u32 = 1;

/// Errors from flag storage.
#[derive(Debug, Error)]
pub enum FlagError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },

    #[error("flag file belongs to namespace {found:?}, expected {expected:?}")]
    ForeignNamespace { expected: String, found: String },
}

/// Per-owner key/value flag storage.
#[async_trait]
pub trait FlagStore: Send + Sync {
    async fn read_flag(&self, owner: TravelerId, key: &str)
        -> Result<Option<Value>, FlagError>;

    async fn write_flag(
        &self,
        owner: TravelerId,
        key: &str,
        value: Value,
    ) -> Result<(), FlagError>;
}

/// In-memory flag store for tests and demos.
#[derive(Default)]
pub struct MemoryFlagStore {
    cells: Mutex<HashMap<(TravelerId, String), Value>>,
}

impl MemoryFlagStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FlagStore for MemoryFlagStore {
    async fn read_flag(
        &self,
        owner: TravelerId,
        key: &str,
    ) -> Result<Option<Value>, FlagError> {
        let cells = self.cells.lock().await;
        Ok(cells.get(&(owner, key.to_string())).cloned())
    }

    async fn write_flag(
        &self,
        owner: TravelerId,
        key: &str,
        value: Value,
    ) -> Result<(), FlagError> {
        let mut cells = self.cells.lock().await;
        cells.insert((owner, key.to_string()), value);
        Ok(())
    }
}

/// On-disk shape of the flag file.
#[derive(Debug, Serialize, Deserialize)]
struct FlagFile {
    version: u32,
    namespace: String,
    owners: HashMap<TravelerId, HashMap<String, Value>>,
}

impl FlagFile {
    fn empty() -> Self {
        Self {
            version: FLAG_VERSION,
            namespace: FLAG_NAMESPACE.to_string(),
            owners: HashMap::new(),
        }
    }
}

/// Flag store backed by a single versioned JSON file.
pub struct JsonFlagStore {
    path: PathBuf,
    // Serializes whole-file read-modify-write cycles
    io: Mutex<()>,
}

impl JsonFlagStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            io: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load_file(&self) -> Result<FlagFile, FlagError> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(FlagFile::empty());
            }
            Err(e) => return Err(e.into()),
        };

        let file: FlagFile = serde_json::from_str(&content)?;
        if file.version != FLAG_VERSION {
            return Err(FlagError::VersionMismatch {
                expected: FLAG_VERSION,
                found: file.version,
            });
        }
        if file.namespace != FLAG_NAMESPACE {
            return Err(FlagError::ForeignNamespace {
                expected: FLAG_NAMESPACE.to_string(),
                found: file.namespace,
            });
        }
        Ok(file)
    }

    async fn store_file(&self, file: &FlagFile) -> Result<(), FlagError> {
        let content = serde_json::to_string_pretty(file)?;
        fs::write(&self.path, content).await?;
        Ok(())
    }
}

#[async_trait]
impl FlagStore for JsonFlagStore {
    async fn read_flag(
        &self,
        owner: TravelerId,
        key: &str,
    ) -> Result<Option<Value>, FlagError> {
        let _io = self.io.lock().await;
        let file = self.load_file().await?;
        Ok(file
            .owners
            .get(&owner)
            .and_then(|flags| flags.get(key))
            .cloned())
    }

    async fn write_flag(
        &self,
        owner: TravelerId,
        key: &str,
        value: Value,
    ) -> Result<(), FlagError> {
        let _io = self.io.lock().await;
        let mut file = self.load_file().await?;
        file.owners
            .entry(owner)
            .or_default()
            .insert(key.to_string(), value);
        self.store_file(&file).await
    }
}
