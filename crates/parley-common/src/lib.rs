//! Parley Common - Shared types for the Parley chat client
//!
//! This crate provides the error type, configuration structs,
//! constants and small value types used across all Parley crates.

pub mod config;
pub mod constants;
pub mod error;
pub mod types;

// Re-export commonly used items
pub use config::{
    EndpointConfig, LanguageConfig, ParleyConfig, RecognizerCommand, SpeechConfig,
    SynthesizerCommand,
};
pub use constants::*;
pub use error::{ParleyError, Result};
pub use types::{LanguageTag, Role, TurnId};
