//! HTTP Client Factory
//!
//! Provides a factory function for building reqwest clients with proxy support.

use std::time::Duration;

use ran_assistant_core::proxy::ProxyConfig;

/// Build a `reqwest::Client` with the resolved proxy configuration.
///
/// - `Some(proxy)` -> configure proxy on the client, honoring its `no_proxy` list
/// - `None` -> explicitly disable proxy (`no_proxy`), ignoring env vars
///
/// A `timeout` of `None` leaves request duration unbounded; callers that race
/// requests against their own deadline pass `None`.
pub fn build_http_client(
    proxy: Option<&ProxyConfig>,
    timeout: Option<Duration>,
) -> Result<reqwest::Client, reqwest::Error> {
    let mut builder = reqwest::Client::builder();
    match proxy {
        Some(cfg) => {
            let mut p = reqwest::Proxy::all(cfg.url())?;
            if let (Some(u), Some(pw)) = (&cfg.username, &cfg.password) {
                p = p.basic_auth(u, pw);
            }
            if let Some(list) = cfg.no_proxy_list() {
                p = p.no_proxy(reqwest::NoProxy::from_string(&list));
            }
            builder = builder.proxy(p);
        }
        None => {
            builder = builder.no_proxy();
        }
    }
    if let Some(t) = timeout {
        builder = builder.timeout(t);
    }
    builder.build()
}
