//! Twitch Helix snapshot source.
//!
//! Authenticates with an app access token (client-credentials grant) and
//! reads `helix/streams` for one broadcaster per poll.

pub mod auth;
pub mod error;
pub mod helix;

pub use {
    error::{Error, Result},
    helix::HelixClient,
};
