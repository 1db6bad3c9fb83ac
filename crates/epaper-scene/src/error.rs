use epaper_ir::PageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SceneError {
    /// The bound stylesheet refused a rule. The class is not recorded, so a
    /// later render retries the insertion.
    #[error("stylesheet rejected rule for class '{class}': {reason}")]
    StyleInsert { class: String, reason: String },
    #[error("malformed page: {0}")]
    Malformed(String),
    #[error(transparent)]
    Page(#[from] PageError),
}
