//! Collaborators the costing engine talks to.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use super::entities::CostingRecord;

/// Local slot holding the in-progress costing draft.
pub const COSTING_DRAFT_KEY: &str = "surat_otop_costing_draft";
/// Local slot holding the signed-in user, written by the login flow.
pub const SESSION_USER_KEY: &str = "surat_otop_user";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage directory unavailable")]
    Unavailable,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Other(String),
}

/// Synchronous, process-local key/value storage for drafts and session data.
pub trait DraftStore {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn clear(&self, key: &str) -> Result<(), StorageError>;
}

impl<T: DraftStore + ?Sized> DraftStore for Arc<T> {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).read(key)
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).write(key, value)
    }

    fn clear(&self, key: &str) -> Result<(), StorageError> {
        (**self).clear(key)
    }
}

/// Remote home of finalized costings.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn submit_costing(&self, record: &CostingRecord) -> Result<(), Self::Error>;
}

pub trait IdentityProvider {
    fn current_owner_id(&self) -> Option<String>;
}

/// Identity fixed at construction, e.g. from a command-line flag.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StaticIdentity(pub Option<String>);

impl StaticIdentity {
    pub fn new(owner_id: impl Into<String>) -> Self {
        Self(Some(owner_id.into()))
    }

    pub fn anonymous() -> Self {
        Self(None)
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_owner_id(&self) -> Option<String> {
        self.0
            .as_ref()
            .map(|id| id.trim())
            .filter(|id| !id.is_empty())
            .map(str::to_string)
    }
}
