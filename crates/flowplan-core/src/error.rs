use crate::id::{ItemId, RecipeId};
use crate::rational::RationalError;

/// Errors surfaced by a planning run.
///
/// Missing catalog entries met while annotating steps are skipped, not
/// raised. Only arithmetic failures and lookups the objective rate depends
/// on reach the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    #[error(transparent)]
    Arithmetic(#[from] RationalError),
    #[error("unknown item: {0}")]
    UnknownItem(ItemId),
    #[error("unknown recipe: {0}")]
    UnknownRecipe(RecipeId),
    #[error("no speed known for belt: {0}")]
    UnknownBelt(ItemId),
}
