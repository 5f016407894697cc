//! Stable names for the certificates requested on behalf of a cluster.

use std::{collections::HashMap, fmt::Display, ops::Deref};

use redpanda_pki_operator_crd_utils::NamespacedName;
use snafu::Snafu;
use strum::{EnumIter, IntoEnumIterator, IntoStaticStr};

use super::TlsApi;

/// What a certificate is used for.
///
/// Certificates of all roles share the cluster's namespace, so every role must map to its own
/// suffix, see [`CertificateRole::check_unique_suffixes`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, IntoStaticStr)]
pub enum CertificateRole {
    #[strum(serialize = "proxy-api-node")]
    PandaproxyApiNode,
    #[strum(serialize = "proxy-api-client")]
    PandaproxyApiClient,
    #[strum(serialize = "admin-api-node")]
    AdminApiNode,
    #[strum(serialize = "admin-api-client")]
    AdminApiClient,
    #[strum(serialize = "schema-registry-node")]
    SchemaRegistryNode,
    #[strum(serialize = "schema-registry-client")]
    SchemaRegistryClient,
}

#[derive(Debug, Snafu, PartialEq, Eq)]
#[snafu(display("certificate roles {first:?} and {second:?} share the name suffix {suffix:?}"))]
pub struct DuplicateSuffix {
    pub suffix: &'static str,
    pub first: CertificateRole,
    pub second: CertificateRole,
}

impl CertificateRole {
    pub fn suffix(self) -> &'static str {
        self.into()
    }

    /// Fails if two roles would produce the same certificate name for the same cluster.
    pub fn check_unique_suffixes() -> Result<(), DuplicateSuffix> {
        check_unique_suffixes(Self::iter())
    }
}

fn check_unique_suffixes(
    roles: impl IntoIterator<Item = CertificateRole>,
) -> Result<(), DuplicateSuffix> {
    let mut seen = HashMap::<&'static str, CertificateRole>::new();
    for role in roles {
        if let Some(&first) = seen.get(role.suffix()) {
            return DuplicateSuffixSnafu {
                suffix: role.suffix(),
                first,
                second: role,
            }
            .fail();
        }
        seen.insert(role.suffix(), role);
    }
    Ok(())
}

/// The subject common name of a certificate, also used as the name of its resources.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CommonName(String);

impl Deref for CommonName {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for CommonName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<CommonName> for String {
    fn from(value: CommonName) -> Self {
        value.0
    }
}

pub fn derive_common_name(cluster_name: &str, role: CertificateRole) -> CommonName {
    CommonName(format!("{cluster_name}-{}", role.suffix()))
}

/// The cluster that certificates are requested for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClusterIdentity {
    pub name: String,
    pub namespace: String,
}

impl ClusterIdentity {
    pub fn common_name(&self, role: CertificateRole) -> CommonName {
        derive_common_name(&self.name, role)
    }

    pub fn certificate_key(&self, role: CertificateRole) -> NamespacedName {
        NamespacedName::new(self.common_name(role), &self.namespace)
    }

    /// The key of the certificate each broker serves `api` with.
    pub fn node_certificate_name(&self, api: TlsApi) -> NamespacedName {
        self.certificate_key(api.node_role())
    }

    /// The key of the certificate callers of `api` authenticate with.
    pub fn client_certificate_name(&self, api: TlsApi) -> NamespacedName {
        self.certificate_key(api.client_role())
    }
}
