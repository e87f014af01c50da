//! Core types shared by the taskdeck crates
//!
//! This crate holds the credential state and the seams the HTTP client is
//! injected with: a key-value token store and a navigation collaborator.
//! Keeping both behind traits lets the client run against an in-memory
//! store and a recording navigator in tests, and against origin-scoped
//! storage and real navigation in a browser host.

pub mod navigation;
pub mod tokens;

pub use navigation::{Navigator, NullNavigator};
pub use tokens::{MemoryTokenStore, TokenPair, TokenStore, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
