//! Configuration loading, env substitution, and validation.
//!
//! Config files: `onair.toml`, `onair.yaml`, or `onair.json`
//! Searched in `./` then `~/.config/onair/`.
//!
//! Supports `${ENV_VAR}` and `${ENV_VAR:-default}` substitution in the raw text.

pub mod env_subst;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    loader::{config_dir, discover_and_load, load_config},
    schema::{
        DisplayConfig, OnairConfig, ReconcilerConfig, SocialLink, TelegramConfig, TwitchConfig,
    },
    validate::{Diagnostic, Severity, ValidationResult, validate},
};
