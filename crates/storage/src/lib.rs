//! Treasury persistence
//!
//! The treasury core never talks to a database directly. Callers inject a
//! [`TreasuryRepository`] and decide when to `load` and `save`.

use bazaar_types::TreasuryState;
use parking_lot::RwLock;
use sled::{Db, Tree};
use std::path::Path;
use std::sync::Arc;

/// Storage errors
#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sled::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Load/save contract for the treasury image.
pub trait TreasuryRepository: Send + Sync {
    /// Last saved state, `None` when nothing was saved yet.
    fn load(&self) -> Result<Option<TreasuryState>>;
    fn save(&self, state: &TreasuryState) -> Result<()>;
}

const STATE_KEY: &[u8] = b"treasury_state";

/// Sled-backed repository. The whole state lives as JSON under one key of
/// the `treasury` tree.
pub struct SledRepository {
    db: Db,
    treasury: Tree,
}

impl SledRepository {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path)?;
        let treasury = db.open_tree("treasury")?;
        Ok(Self { db, treasury })
    }

    pub fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }
}

impl TreasuryRepository for SledRepository {
    fn load(&self) -> Result<Option<TreasuryState>> {
        match self.treasury.get(STATE_KEY)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn save(&self, state: &TreasuryState) -> Result<()> {
        let data = serde_json::to_vec(state)?;
        self.treasury.insert(STATE_KEY, data)?;
        self.flush()?;
        tracing::debug!(
            target: "storage",
            investors = state.ledger.investors.len(),
            "Saved treasury state"
        );
        Ok(())
    }
}

/// In-memory testing backend
#[derive(Default, Clone)]
pub struct MemoryRepository {
    state: Arc<RwLock<Option<TreasuryState>>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository that already holds `state`.
    pub fn with_state(state: TreasuryState) -> Self {
        Self {
            state: Arc::new(RwLock::new(Some(state))),
        }
    }
}

impl TreasuryRepository for MemoryRepository {
    fn load(&self) -> Result<Option<TreasuryState>> {
        Ok(self.state.read().clone())
    }

    fn save(&self, state: &TreasuryState) -> Result<()> {
        *self.state.write() = Some(state.clone());
        Ok(())
    }
}
