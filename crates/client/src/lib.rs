//! Taskdeck HTTP client
//!
//! Wraps the task-tracker API behind an authenticated client: bearer
//! authorization from a persisted token pair, a single silent
//! refresh-and-retry on 401, and a redirect to the login page when the
//! session cannot be recovered. Typed endpoint methods for the auth and
//! task surfaces sit on top of the generic [`client::ApiClient::request`]
//! contract.

pub mod auth;
pub mod client;
pub mod error;
pub mod tasks;
pub mod types;

pub use client::{handle_empty_response, handle_response, ApiClient, ApiClientBuilder, RequestOptions};
pub use error::ClientError;
