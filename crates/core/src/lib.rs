#![forbid(unsafe_code)]

pub mod choices;
pub mod error;
pub mod model;
pub mod scheduler;
pub mod time;

pub use choices::ChoiceGenerator;
pub use error::Error;
pub use scheduler::{BoxScheduler, LeitnerConfig};
pub use time::Clock;
