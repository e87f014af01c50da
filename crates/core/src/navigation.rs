//! Browser navigation seam

use tracing::debug;

/// Navigation collaborator injected into the client
///
/// Abstracts the host's location state so the auth-failure redirect can be
/// exercised without a real browser context.
pub trait Navigator: Send + Sync {
    /// Path of the page currently shown
    fn current_path(&self) -> String;

    /// Send the host away to `path`
    fn redirect(&self, path: &str);
}

/// Navigator for headless hosts; reports the root path and drops redirects
#[derive(Debug, Default)]
pub struct NullNavigator;

impl Navigator for NullNavigator {
    fn current_path(&self) -> String {
        "/".to_string()
    }

    fn redirect(&self, path: &str) {
        debug!(path, "redirect requested with no navigator attached");
    }
}
