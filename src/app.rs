use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    config::Settings,
    domain::{
        CostingEngine, CostingError, CostingResults, DraftStore, IdentityProvider, SaveReceipt,
        StaticIdentity,
    },
    infra::{FileDraftStore, MemoryDraftStore, SavedCosting, SheetClient, SheetClientError, StoredSession},
    util::format::format_currency,
};

pub type SharedStore = Arc<dyn DraftStore + Send + Sync>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Success,
    Warning,
    Error,
}

/// Outcome of a user action, ready for presentation.
#[derive(Clone, Debug, PartialEq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    pub fn new(kind: NoticeKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.kind, NoticeKind::Success | NoticeKind::Info)
    }
}

impl From<&CostingError> for Notice {
    fn from(err: &CostingError) -> Self {
        let kind = match err {
            CostingError::Validation(_) | CostingError::Precondition => NoticeKind::Warning,
            CostingError::AuthRequired | CostingError::Remote(_) => NoticeKind::Error,
        };
        Notice::new(kind, err.to_string())
    }
}

/// Explicit owner first, then whoever is signed in locally.
pub struct SessionIdentity<S> {
    owner_override: StaticIdentity,
    session: StoredSession<S>,
}

impl<S: DraftStore> SessionIdentity<S> {
    pub fn new(owner_override: Option<String>, store: S) -> Self {
        Self {
            owner_override: StaticIdentity(owner_override),
            session: StoredSession::new(store),
        }
    }
}

impl<S: DraftStore> IdentityProvider for SessionIdentity<S> {
    fn current_owner_id(&self) -> Option<String> {
        self.owner_override
            .current_owner_id()
            .or_else(|| self.session.current_owner_id())
    }
}

/// One user session: the costing engine plus the collaborators it needs.
pub struct CostingSession {
    engine: CostingEngine<SharedStore>,
    identity: SessionIdentity<SharedStore>,
    client: SheetClient,
}

impl CostingSession {
    pub fn open(settings: &Settings) -> Result<Self, SheetClientError> {
        let store = open_store(settings);
        let client = SheetClient::new(&settings.api_url)?;
        Ok(Self::with_parts(store, client, settings.owner_id.clone()))
    }

    pub fn with_parts(store: SharedStore, client: SheetClient, owner: Option<String>) -> Self {
        Self {
            engine: CostingEngine::restore(store.clone()),
            identity: SessionIdentity::new(owner, store),
            client,
        }
    }

    pub fn engine(&self) -> &CostingEngine<SharedStore> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut CostingEngine<SharedStore> {
        &mut self.engine
    }

    pub fn owner_id(&self) -> Option<String> {
        self.identity.current_owner_id()
    }

    pub fn calculate(&mut self) -> (Notice, Option<CostingResults>) {
        match self.engine.calculate() {
            Ok(results) => (
                Notice::new(
                    NoticeKind::Success,
                    format!(
                        "Recommended price {}",
                        format_currency(results.recommended_price)
                    ),
                ),
                Some(results),
            ),
            Err(err) => (Notice::from(&err), None),
        }
    }

    pub async fn save(&mut self) -> Notice {
        match self.engine.save(&self.client, &self.identity).await {
            Ok(SaveReceipt {
                record,
                kept_newer_edits: false,
            }) => Notice::new(
                NoticeKind::Success,
                format!("Saved '{}'", record.product_name),
            ),
            Ok(SaveReceipt { record, .. }) => Notice::new(
                NoticeKind::Info,
                format!(
                    "Saved '{}'; edits made during the save were kept in the draft",
                    record.product_name
                ),
            ),
            Err(err) => Notice::from(&err),
        }
    }

    /// Clears the draft when the caller has confirmed.
    pub fn reset(&mut self, confirmed: bool) -> Notice {
        if !confirmed {
            return Notice::new(NoticeKind::Warning, "Reset cancelled");
        }
        self.engine.reset();
        Notice::new(NoticeKind::Info, "Draft cleared")
    }

    pub async fn history(&self) -> Result<Vec<SavedCosting>, Notice> {
        let owner = self
            .owner_id()
            .ok_or_else(|| Notice::from(&CostingError::AuthRequired))?;
        self.client
            .list_costings(&owner)
            .await
            .map_err(|err| Notice::new(NoticeKind::Error, err.to_string()))
    }

    pub async fn ping(&self) -> Notice {
        match self.client.status().await {
            Ok(_) => Notice::new(
                NoticeKind::Success,
                format!("Backend reachable at {}", self.client.endpoint()),
            ),
            Err(err) => Notice::new(NoticeKind::Error, err.to_string()),
        }
    }
}

/// File-backed store where possible; otherwise drafts live only in memory.
fn open_store(settings: &Settings) -> SharedStore {
    let opened = match settings.data_dir.as_ref() {
        Some(dir) => FileDraftStore::create(dir.clone()),
        None => FileDraftStore::in_data_dir(),
    };
    match opened {
        Ok(store) => {
            info!("[app] drafts stored in {}", store.base_dir().display());
            Arc::new(store)
        }
        Err(err) => {
            warn!("[app] local storage unavailable ({err}); draft will not survive this session");
            Arc::new(MemoryDraftStore::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ValidationError;

    #[test]
    fn validation_errors_are_warnings() {
        let notice = Notice::from(&CostingError::Validation(ValidationError::MissingProductName));
        assert_eq!(notice.kind, NoticeKind::Warning);
        assert_eq!(notice.text, "product name is required");
        assert!(!notice.is_success());
    }

    #[test]
    fn remote_errors_keep_message() {
        let notice = Notice::from(&CostingError::Remote("quota exceeded".into()));
        assert_eq!(notice.kind, NoticeKind::Error);
        assert_eq!(notice.text, "quota exceeded");
    }

    #[test]
    fn override_owner_wins_over_session() {
        let store: SharedStore = Arc::new(MemoryDraftStore::default());
        store
            .write(crate::domain::SESSION_USER_KEY, r#"{"phone": "0811111111"}"#)
            .expect("write");

        let identity = SessionIdentity::new(Some("0822222222".into()), store.clone());
        assert_eq!(identity.current_owner_id().as_deref(), Some("0822222222"));

        let identity = SessionIdentity::new(None, store);
        assert_eq!(identity.current_owner_id().as_deref(), Some("0811111111"));
    }

    #[test]
    fn session_restores_stored_draft() {
        let store: SharedStore = Arc::new(MemoryDraftStore::default());
        {
            let mut engine = CostingEngine::new(store.clone());
            engine.set_product_name("Coconut candy");
        }
        let client = SheetClient::new("http://localhost:9/exec").expect("client");
        let session = CostingSession::with_parts(store, client, None);
        assert_eq!(session.engine().draft().product_name, "Coconut candy");
    }

    #[test]
    fn unconfirmed_reset_keeps_draft() {
        let store: SharedStore = Arc::new(MemoryDraftStore::default());
        let client = SheetClient::new("http://localhost:9/exec").expect("client");
        let mut session = CostingSession::with_parts(store, client, None);
        session.engine_mut().set_product_name("Fish sauce");

        let notice = session.reset(false);
        assert_eq!(notice.kind, NoticeKind::Warning);
        assert_eq!(session.engine().draft().product_name, "Fish sauce");

        session.reset(true);
        assert_eq!(session.engine().draft().product_name, "");
    }
}
