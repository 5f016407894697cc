use serde::{Deserialize, Serialize};
use stackable_operator::{
    kube::CustomResource,
    schemars::{self, JsonSchema},
};
use strum::Display;

use crate::pki::{endpoint::ExternalEndpoint, TlsApi, TlsPolicy};

/// A Redpanda cluster, as far as its certificates are concerned.
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
#[kube(
    group = "redpanda.vectorized.io",
    version = "v1alpha1",
    kind = "RedpandaCluster",
    plural = "redpandaclusters",
    shortname = "rpc",
    namespaced,
    crates(
        kube_core = "stackable_operator::kube::core",
        k8s_openapi = "stackable_operator::k8s_openapi",
        schemars = "stackable_operator::schemars"
    )
)]
#[serde(rename_all = "camelCase")]
pub struct RedpandaClusterSpec {
    pub cert_manager: CertManagerConfig,
    #[serde(default)]
    pub configuration: RedpandaConfig,
}

/// Where the cluster's certificates are issued from.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CertManagerConfig {
    /// The cert-manager issuer that signs every certificate of this cluster.
    pub issuer: IssuerRef,

    /// Name of a Secret in the cluster's namespace holding the PKCS#12 keystore password
    /// (under the `password` key).
    ///
    /// If unset, no keystores are requested.
    pub keystore_password_secret: Option<String>,
}

/// See <https://cert-manager.io/docs/reference/api-docs/#meta.cert-manager.io/v1.ObjectReference>.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct IssuerRef {
    /// The name of the issuer.
    pub name: String,

    /// The kind of the issuer, `Issuer` or `ClusterIssuer`.
    ///
    /// If `Issuer` then it must be in the same namespace as the cluster.
    #[serde(default)]
    pub kind: IssuerKind,
}

#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, JsonSchema, Display,
)]
pub enum IssuerKind {
    /// An [Issuer](https://cert-manager.io/docs/reference/api-docs/#cert-manager.io/v1.Issuer) in the same namespace as the cluster.
    #[default]
    Issuer,

    /// A cluster-scoped [ClusterIssuer](https://cert-manager.io/docs/reference/api-docs/#cert-manager.io/v1.ClusterIssuer).
    ClusterIssuer,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RedpandaConfig {
    #[serde(default)]
    pub pandaproxy_api: Vec<ApiListener>,
    #[serde(default)]
    pub admin_api: Vec<ApiListener>,
    #[serde(default)]
    pub schema_registry: Vec<ApiListener>,
}

impl RedpandaConfig {
    pub fn listeners(&self, api: TlsApi) -> &[ApiListener] {
        match api {
            TlsApi::PandaproxyApi => &self.pandaproxy_api,
            TlsApi::AdminApi => &self.admin_api,
            TlsApi::SchemaRegistryApi => &self.schema_registry,
        }
    }
}

/// One port an API is served on.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiListener {
    pub name: Option<String>,
    pub port: u16,
    pub external: Option<ExternalConnectivity>,
    pub tls: Option<ListenerTls>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExternalConnectivity {
    #[serde(default)]
    pub enabled: bool,

    /// Publicly routable domain the listener is reachable under.
    ///
    /// Replaces the cluster-internal domain in the node certificate when set.
    #[serde(default)]
    pub subdomain: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListenerTls {
    #[serde(default)]
    pub enabled: bool,

    /// Whether callers must present a client certificate (mutual TLS).
    #[serde(default)]
    pub require_client_auth: bool,
}

impl RedpandaCluster {
    /// The TLS policy of `api`, taken from its first TLS-enabled listener.
    pub fn api_tls(&self, api: TlsApi) -> Option<TlsPolicy> {
        self.spec
            .configuration
            .listeners(api)
            .iter()
            .filter_map(|listener| listener.tls.as_ref())
            .find(|tls| tls.enabled)
            .map(|tls| TlsPolicy {
                require_client_auth: tls.require_client_auth,
            })
    }

    /// The external endpoint of `api`, taken from its first externally enabled listener.
    pub fn api_external_endpoint(&self, api: TlsApi) -> Option<ExternalEndpoint> {
        self.spec
            .configuration
            .listeners(api)
            .iter()
            .filter_map(|listener| listener.external.as_ref())
            .find(|external| external.enabled)
            .map(|external| ExternalEndpoint {
                subdomain: external.subdomain.clone(),
            })
    }
}

#[cfg(test)]
mod test {
    use crate::{
        crd::{
            ApiListener, CertManagerConfig, ExternalConnectivity, IssuerKind, IssuerRef,
            ListenerTls, RedpandaCluster, RedpandaClusterSpec, RedpandaConfig,
        },
        pki::{endpoint::ExternalEndpoint, TlsApi, TlsPolicy},
    };

    fn parse(input: &str) -> RedpandaCluster {
        let deserializer = serde_yaml::Deserializer::from_str(input);
        serde_yaml::with::singleton_map_recursive::deserialize(deserializer).unwrap()
    }

    #[test]
    fn test_deserialization() {
        let cluster = parse(
            r#"
        apiVersion: redpanda.vectorized.io/v1alpha1
        kind: RedpandaCluster
        metadata:
          name: redpanda
          namespace: ns1
        spec:
          certManager:
            issuer:
              name: redpanda-ca
        "#,
        );
        assert_eq!(
            cluster.spec,
            RedpandaClusterSpec {
                cert_manager: CertManagerConfig {
                    issuer: IssuerRef {
                        name: "redpanda-ca".to_string(),
                        kind: IssuerKind::Issuer,
                    },
                    keystore_password_secret: None,
                },
                configuration: RedpandaConfig::default(),
            }
        );

        let cluster = parse(
            r#"
        apiVersion: redpanda.vectorized.io/v1alpha1
        kind: RedpandaCluster
        metadata:
          name: redpanda
          namespace: ns1
        spec:
          certManager:
            issuer:
              name: redpanda-ca
              kind: ClusterIssuer
            keystorePasswordSecret: redpanda-keystore
          configuration:
            pandaproxyApi:
              - port: 8082
                tls:
                  enabled: true
                  requireClientAuth: true
              - name: external
                port: 30082
                external:
                  enabled: true
                  subdomain: proxy.example.com
        "#,
        );
        assert_eq!(
            cluster.spec,
            RedpandaClusterSpec {
                cert_manager: CertManagerConfig {
                    issuer: IssuerRef {
                        name: "redpanda-ca".to_string(),
                        kind: IssuerKind::ClusterIssuer,
                    },
                    keystore_password_secret: Some("redpanda-keystore".to_string()),
                },
                configuration: RedpandaConfig {
                    pandaproxy_api: vec![
                        ApiListener {
                            name: None,
                            port: 8082,
                            external: None,
                            tls: Some(ListenerTls {
                                enabled: true,
                                require_client_auth: true,
                            }),
                        },
                        ApiListener {
                            name: Some("external".to_string()),
                            port: 30082,
                            external: Some(ExternalConnectivity {
                                enabled: true,
                                subdomain: "proxy.example.com".to_string(),
                            }),
                            tls: None,
                        },
                    ],
                    admin_api: vec![],
                    schema_registry: vec![],
                },
            }
        );
    }

    #[test]
    fn api_tls_uses_first_enabled_listener() {
        let cluster = parse(
            r#"
        apiVersion: redpanda.vectorized.io/v1alpha1
        kind: RedpandaCluster
        metadata:
          name: redpanda
          namespace: ns1
        spec:
          certManager:
            issuer:
              name: redpanda-ca
          configuration:
            pandaproxyApi:
              - port: 8082
                tls:
                  enabled: false
                  requireClientAuth: true
              - port: 8083
                tls:
                  enabled: true
            adminApi:
              - port: 9644
        "#,
        );
        assert_eq!(
            cluster.api_tls(TlsApi::PandaproxyApi),
            Some(TlsPolicy {
                require_client_auth: false
            })
        );
        assert_eq!(cluster.api_tls(TlsApi::AdminApi), None);
        assert_eq!(cluster.api_tls(TlsApi::SchemaRegistryApi), None);
    }

    #[test]
    fn api_external_endpoint_ignores_disabled_listeners() {
        let cluster = parse(
            r#"
        apiVersion: redpanda.vectorized.io/v1alpha1
        kind: RedpandaCluster
        metadata:
          name: redpanda
          namespace: ns1
        spec:
          certManager:
            issuer:
              name: redpanda-ca
          configuration:
            pandaproxyApi:
              - port: 30082
                external:
                  enabled: false
                  subdomain: stale.example.com
              - port: 30083
                external:
                  enabled: true
            schemaRegistry:
              - port: 30081
                external:
                  enabled: true
                  subdomain: schema.example.com
        "#,
        );
        // Enabled, but without a subdomain: still an endpoint, the selector decides what to do with it
        assert_eq!(
            cluster.api_external_endpoint(TlsApi::PandaproxyApi),
            Some(ExternalEndpoint {
                subdomain: String::new()
            })
        );
        assert_eq!(
            cluster.api_external_endpoint(TlsApi::SchemaRegistryApi),
            Some(ExternalEndpoint {
                subdomain: "schema.example.com".to_string()
            })
        );
        assert_eq!(cluster.api_external_endpoint(TlsApi::AdminApi), None);
    }
}
