//! HTTP host surface for the MediVoice assistant.

pub mod server;
pub mod state;
