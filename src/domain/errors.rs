use thiserror::Error;

/// Input problems detected by `calculate`. Recoverable; the draft is left as is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("product name is required")]
    MissingProductName,
    #[error("add at least one named ingredient")]
    NoNamedIngredients,
    #[error("amounts are too large to calculate")]
    AmountOutOfRange,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CostingError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("must calculate before saving")]
    Precondition,
    #[error("sign in before saving")]
    AuthRequired,
    /// Remote store rejection, carried verbatim.
    #[error("{0}")]
    Remote(String),
}
