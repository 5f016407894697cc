//! Decides which certificates an API needs.

use redpanda_pki_operator_crd_utils::NamespacedName;

use super::{
    endpoint::{select_dns_name, ExternalEndpoint},
    naming::{CertificateRole, ClusterIdentity, CommonName},
    TlsApi, TlsPolicy,
};
use crate::crd::IssuerRef;

/// Everything a certificate request carries regardless of its kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CertificateRequest {
    pub key: NamespacedName,
    pub common_name: CommonName,
    pub issuer_ref: IssuerRef,
    pub is_ca: bool,
    pub keystore_secret: Option<NamespacedName>,
}

/// A certificate that should exist for a cluster, handed over to [`crate::apply`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CertificateDescription {
    /// Served by every broker of the API, valid for `dns_name`.
    Node {
        request: CertificateRequest,
        dns_name: String,
    },

    /// Presented by callers of the API when mutual TLS is required.
    Client { request: CertificateRequest },
}

impl CertificateDescription {
    pub fn request(&self) -> &CertificateRequest {
        match self {
            CertificateDescription::Node { request, .. } => request,
            CertificateDescription::Client { request } => request,
        }
    }

    pub fn key(&self) -> &NamespacedName {
        &self.request().key
    }
}

/// How an API is currently exposed.
#[derive(Clone, Copy, Debug, Default)]
pub struct ApiExposure<'a> {
    pub tls: Option<&'a TlsPolicy>,
    pub external: Option<&'a ExternalEndpoint>,
}

/// Lists the certificates `api` needs, node certificate first.
///
/// APIs without TLS need no certificates. The client certificate is only requested when the API
/// requires client authentication.
pub fn build_certificate_set(
    api: TlsApi,
    identity: &ClusterIdentity,
    internal_fqdn: &str,
    exposure: ApiExposure<'_>,
    issuer_ref: &IssuerRef,
    keystore_secret: Option<&NamespacedName>,
) -> Vec<CertificateDescription> {
    let Some(tls) = exposure.tls else {
        return Vec::new();
    };
    let request = |role: CertificateRole| CertificateRequest {
        key: identity.certificate_key(role),
        common_name: identity.common_name(role),
        issuer_ref: issuer_ref.clone(),
        is_ca: false,
        keystore_secret: keystore_secret.cloned(),
    };

    let mut certificates = vec![CertificateDescription::Node {
        request: request(api.node_role()),
        dns_name: select_dns_name(internal_fqdn, exposure.external),
    }];
    if tls.require_client_auth {
        certificates.push(CertificateDescription::Client {
            request: request(api.client_role()),
        });
    }
    certificates
}
