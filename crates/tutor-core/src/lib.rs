pub use shakmaty;

pub mod classify;
pub mod commentary;
pub mod difficulty;
pub mod engine;
pub mod error;
pub mod notation;
pub mod opponent;
pub mod policy;
pub mod session;
pub mod tutor;

#[cfg(any(test, feature = "scripted"))]
pub mod scripted;

pub use error::TutorError;
pub use tutor::Tutor;
