pub mod draft_store;
pub mod session;
pub mod sheet;

pub use draft_store::{FileDraftStore, MemoryDraftStore};
pub use session::StoredSession;
pub use sheet::{SavedCosting, SheetClient, SheetClientError};
