//! Core types, config, errors, and user-facing messages for MediVoice.

pub mod config;
pub mod error;
pub mod messages;
pub mod prompt;
pub mod types;
