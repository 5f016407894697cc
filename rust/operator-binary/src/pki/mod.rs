//! Decides which cert-manager certificates a [`RedpandaCluster`] needs for its HTTP APIs.
//!
//! Everything in here is a pure function of the cluster object, actually requesting the
//! certificates is left to [`crate::apply`].

use redpanda_pki_operator_crd_utils::NamespacedName;
use snafu::{OptionExt, Snafu};
use stackable_operator::kube::ResourceExt;
use strum::{Display, EnumIter, IntoEnumIterator};

use crate::crd::{IssuerRef, RedpandaCluster};

pub mod certificate;
pub mod endpoint;
pub mod naming;

use certificate::{build_certificate_set, ApiExposure, CertificateDescription};
use naming::{CertificateRole, ClusterIdentity};

/// An API served by the brokers that can be secured with TLS.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum TlsApi {
    PandaproxyApi,
    AdminApi,
    SchemaRegistryApi,
}

impl TlsApi {
    pub fn node_role(self) -> CertificateRole {
        match self {
            TlsApi::PandaproxyApi => CertificateRole::PandaproxyApiNode,
            TlsApi::AdminApi => CertificateRole::AdminApiNode,
            TlsApi::SchemaRegistryApi => CertificateRole::SchemaRegistryNode,
        }
    }

    pub fn client_role(self) -> CertificateRole {
        match self {
            TlsApi::PandaproxyApi => CertificateRole::PandaproxyApiClient,
            TlsApi::AdminApi => CertificateRole::AdminApiClient,
            TlsApi::SchemaRegistryApi => CertificateRole::SchemaRegistryClient,
        }
    }
}

/// TLS settings of an API that has TLS enabled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TlsPolicy {
    pub require_client_auth: bool,
}

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("RedpandaCluster has no name"))]
    NoClusterName,

    #[snafu(display("RedpandaCluster has no namespace"))]
    NoClusterNamespace,
}

/// Certificate policy for one cluster during one reconciliation pass.
#[derive(Debug)]
pub struct PkiReconciler<'a> {
    cluster: &'a RedpandaCluster,
    identity: ClusterIdentity,
    internal_fqdn: String,
}

impl<'a> PkiReconciler<'a> {
    pub fn new(cluster: &'a RedpandaCluster, cluster_domain: &str) -> Result<Self, Error> {
        let identity = ClusterIdentity {
            name: cluster.metadata.name.clone().context(NoClusterNameSnafu)?,
            namespace: cluster.namespace().context(NoClusterNamespaceSnafu)?,
        };
        let internal_fqdn = format!(
            "{}.{}.svc.{cluster_domain}",
            identity.name, identity.namespace
        );
        Ok(Self {
            cluster,
            identity,
            internal_fqdn,
        })
    }

    /// The domain of the cluster's headless service, which every broker is reachable under.
    pub fn internal_fqdn(&self) -> &str {
        &self.internal_fqdn
    }

    pub fn issuer_ref(&self) -> &IssuerRef {
        &self.cluster.spec.cert_manager.issuer
    }

    pub fn keystore_secret(&self) -> Option<NamespacedName> {
        self.cluster
            .spec
            .cert_manager
            .keystore_password_secret
            .as_ref()
            .map(|name| NamespacedName::new(name, &self.identity.namespace))
    }

    /// The namespaced name of the Pandaproxy API certificate used by the brokers.
    pub fn pandaproxy_api_node_cert(&self) -> NamespacedName {
        self.identity.node_certificate_name(TlsApi::PandaproxyApi)
    }

    /// The namespaced name of the Pandaproxy API certificate used by clients.
    pub fn pandaproxy_api_client_cert(&self) -> NamespacedName {
        self.identity.client_certificate_name(TlsApi::PandaproxyApi)
    }

    pub fn admin_api_node_cert(&self) -> NamespacedName {
        self.identity.node_certificate_name(TlsApi::AdminApi)
    }

    pub fn admin_api_client_cert(&self) -> NamespacedName {
        self.identity.client_certificate_name(TlsApi::AdminApi)
    }

    pub fn schema_registry_node_cert(&self) -> NamespacedName {
        self.identity.node_certificate_name(TlsApi::SchemaRegistryApi)
    }

    pub fn schema_registry_client_cert(&self) -> NamespacedName {
        self.identity.client_certificate_name(TlsApi::SchemaRegistryApi)
    }

    pub fn prepare_api(
        &self,
        api: TlsApi,
        issuer_ref: &IssuerRef,
        keystore_secret: Option<&NamespacedName>,
    ) -> Vec<CertificateDescription> {
        let tls = self.cluster.api_tls(api);
        let external = self.cluster.api_external_endpoint(api);
        build_certificate_set(
            api,
            &self.identity,
            &self.internal_fqdn,
            ApiExposure {
                tls: tls.as_ref(),
                external: external.as_ref(),
            },
            issuer_ref,
            keystore_secret,
        )
    }

    /// Whether `api` is served with TLS on an enabled external listener that has no subdomain,
    /// so its node certificate only covers the internal FQDN.
    pub fn falls_back_to_internal(&self, api: TlsApi) -> bool {
        self.cluster.api_tls(api).is_some()
            && self
                .cluster
                .api_external_endpoint(api)
                .is_some_and(|external| external.subdomain.is_empty())
    }

    /// Every certificate the cluster needs, grouped by API.
    pub fn prepare(&self) -> Vec<CertificateDescription> {
        let keystore_secret = self.keystore_secret();
        TlsApi::iter()
            .flat_map(|api| self.prepare_api(api, self.issuer_ref(), keystore_secret.as_ref()))
            .collect()
    }
}
