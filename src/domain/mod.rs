//! Costing domain: data model, calculation rules and the draft engine.

pub mod calculation;
pub mod defaults;
pub mod draft_state;
pub mod engine;
pub mod entities;
pub mod errors;
pub mod ports;

pub use calculation::{compute_results, ingredients_subtotal, line_total, validate};
pub use defaults::{
    parse_amount, parse_optional_amount, resolve_yield, sanitize_amount, PercentDefaults,
};
pub use draft_state::{PersistedDraft, PersistedIngredient};
pub use engine::{CostingEngine, PendingSave, SaveReceipt};
pub use entities::{
    Category, CostingDraft, CostingRecord, CostingResults, IngredientInput, IngredientLine,
    LineId, RecordIngredient, Unit,
};
pub use errors::{CostingError, ValidationError};
pub use ports::{
    DraftStore, IdentityProvider, RemoteStore, StaticIdentity, StorageError, COSTING_DRAFT_KEY,
    SESSION_USER_KEY,
};
