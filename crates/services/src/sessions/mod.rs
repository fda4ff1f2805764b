mod service;
mod session;
mod summary;

// Public API of the training subsystem.
pub use crate::error::TrainingError;
pub use service::TrainingService;
pub use session::{SessionProgress, TrainingSession};
pub use summary::SessionSummary;
