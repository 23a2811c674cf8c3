use std::time::Duration;

use reqwest::Client;

/// Build the shared HTTP client used by provider implementations.
///
/// Test builds never go through the system proxy.
pub(crate) fn build_http_client(timeout: Option<Duration>) -> Client {
    let mut builder = Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    if cfg!(test) {
        builder = builder.no_proxy();
    }
    builder.build().unwrap_or_else(|err| {
        tracing::warn!(error = %err, "Falling back to default reqwest client");
        Client::new()
    })
}
