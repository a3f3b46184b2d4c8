//! Data models for the exercise admin backend.
//!
//! These models match the documents stored in the `exercises`, `users` and
//! `settings` collections field for field.

mod exercise;
mod patch;
mod settings;
mod user;
mod validate;

#[cfg(test)]
pub mod fixtures;

pub use exercise::*;
pub use patch::*;
pub use settings::*;
pub use user::*;
pub use validate::*;
