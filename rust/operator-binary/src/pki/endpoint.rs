//! Picks the DNS name a node certificate is issued for.

/// A publicly routable domain an API is exposed under.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExternalEndpoint {
    pub subdomain: String,
}

/// Returns the external subdomain if one is configured, and `internal_fqdn` otherwise.
///
/// An endpoint with an empty subdomain counts as not configured.
pub fn select_dns_name(internal_fqdn: &str, external: Option<&ExternalEndpoint>) -> String {
    match external {
        Some(ExternalEndpoint { subdomain }) if !subdomain.is_empty() => subdomain.clone(),
        _ => internal_fqdn.to_string(),
    }
}
