#![forbid(unsafe_code)]

pub mod app_services;
pub mod card_service;
pub mod deck_service;
pub mod error;
pub mod quiz_service;
pub mod sessions;
pub mod user_service;

pub use quiz_core::Clock;

pub use app_services::AppServices;
pub use card_service::{CardService, DeckBoxStats};
pub use deck_service::DeckService;
pub use error::{
    AppServicesError, CardServiceError, DeckServiceError, QuizServiceError, TrainingError,
    UserServiceError,
};
pub use quiz_service::QuizService;
pub use sessions::{SessionProgress, SessionSummary, TrainingService, TrainingSession};
pub use user_service::UserService;
