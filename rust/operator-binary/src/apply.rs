//! Turns [`CertificateDescription`]s into cert-manager [`Certificate`]s and applies them.

use std::collections::{BTreeMap, BTreeSet};

use redpanda_pki_operator_crd_utils::NamespacedName;
use snafu::{ResultExt, Snafu};
use stackable_operator::{
    builder::meta::ObjectMetaBuilder,
    k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector,
    kube::{runtime::reflector::ObjectRef, ResourceExt},
    kvp::{LabelError, Labels},
};

use crate::{
    crd::RedpandaCluster,
    external_crd::cert_manager::{
        Certificate, CertificateKeystores, CertificateSpec, ObjectReference, Pkcs12Keystore,
        SecretKeySelector,
    },
    pki::certificate::{CertificateDescription, CertificateRequest},
    OPERATOR_NAME,
};

/// Key of the keystore password inside the keystore Secret.
pub const KEYSTORE_PASSWORD_KEY: &str = "password";

const USAGE_SERVER_AUTH: &str = "server auth";
const USAGE_CLIENT_AUTH: &str = "client auth";

const LABEL_NAME: &str = "app.kubernetes.io/name";
const LABEL_INSTANCE: &str = "app.kubernetes.io/instance";
const LABEL_MANAGED_BY: &str = "app.kubernetes.io/managed-by";

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to build owner reference to the RedpandaCluster"))]
    BuildOwnerReference {
        source: stackable_operator::builder::meta::Error,
    },

    #[snafu(display("failed to build label for the Certificate"))]
    BuildLabel { source: LabelError },

    #[snafu(display("failed to apply {certificate}"))]
    ApplyCertificate {
        source: stackable_operator::client::Error,
        certificate: ObjectRef<Certificate>,
    },

    #[snafu(display("failed to list Certificates owned by the RedpandaCluster"))]
    ListCertificates {
        source: stackable_operator::client::Error,
    },

    #[snafu(display("failed to delete stale {certificate}"))]
    DeleteCertificate {
        source: stackable_operator::client::Error,
        certificate: ObjectRef<Certificate>,
    },
}
type Result<T, E = Error> = std::result::Result<T, E>;

/// Builds the cert-manager [`Certificate`] requesting `description`, owned by `owner`.
pub fn build_certificate(
    description: &CertificateDescription,
    owner: &RedpandaCluster,
) -> Result<Certificate> {
    let (request, dns_names, usages) = match description {
        // Brokers are addressed individually as subdomains of the service domain
        CertificateDescription::Node { request, dns_name } => (
            request,
            vec![dns_name.clone(), format!("*.{dns_name}")],
            vec![USAGE_SERVER_AUTH, USAGE_CLIENT_AUTH],
        ),
        CertificateDescription::Client { request } => {
            (request, Vec::new(), vec![USAGE_CLIENT_AUTH])
        }
    };
    let CertificateRequest {
        key,
        common_name,
        issuer_ref,
        is_ca,
        keystore_secret,
    } = request;

    let metadata = ObjectMetaBuilder::new()
        .name(&key.name)
        .namespace(&key.namespace)
        .ownerreference_from_resource(owner, None, Some(true))
        .context(BuildOwnerReferenceSnafu)?
        .with_labels(certificate_labels(owner)?)
        .build();

    Ok(Certificate {
        metadata,
        spec: CertificateSpec {
            secret_name: key.name.clone(),
            common_name: Some(common_name.to_string()),
            dns_names,
            is_ca: *is_ca,
            issuer_ref: ObjectReference {
                name: issuer_ref.name.clone(),
                kind: Some(issuer_ref.kind.to_string()),
            },
            usages: usages.into_iter().map(str::to_string).collect(),
            keystores: keystore_secret.as_ref().map(|secret| CertificateKeystores {
                pkcs12: Some(Pkcs12Keystore {
                    create: true,
                    password_secret_ref: SecretKeySelector {
                        name: secret.name.clone(),
                        key: KEYSTORE_PASSWORD_KEY.to_string(),
                    },
                }),
            }),
        },
    })
}

/// Labels every managed [`Certificate`] carries.
fn recommended_labels(owner: &RedpandaCluster) -> [(&'static str, String); 3] {
    [
        (LABEL_INSTANCE, owner.name_any()),
        (LABEL_MANAGED_BY, OPERATOR_NAME.to_string()),
        (LABEL_NAME, "redpanda".to_string()),
    ]
}

fn certificate_labels(owner: &RedpandaCluster) -> Result<Labels> {
    let mut labels = Labels::new();
    for label in recommended_labels(owner) {
        labels.parse_insert(label).context(BuildLabelSnafu)?;
    }
    Ok(labels)
}

fn owned_certificates_selector(owner: &RedpandaCluster) -> LabelSelector {
    LabelSelector {
        match_expressions: None,
        match_labels: Some(
            recommended_labels(owner)
                .into_iter()
                .filter(|(key, _)| *key != LABEL_NAME)
                .map(|(key, value)| (key.to_string(), value))
                .collect::<BTreeMap<_, _>>(),
        ),
    }
}

/// The `existing` certificates that none of the `desired` descriptions ask for anymore.
pub fn stale_certificates<'a>(
    existing: &'a [Certificate],
    desired: &[CertificateDescription],
) -> Vec<&'a Certificate> {
    let desired = desired
        .iter()
        .map(CertificateDescription::key)
        .collect::<BTreeSet<_>>();
    existing
        .iter()
        .filter(|cert| {
            let key = NamespacedName::new(cert.name_any(), cert.namespace().unwrap_or_default());
            !desired.contains(&key)
        })
        .collect()
}

/// Server-side applies a [`Certificate`] for every description, in order.
pub async fn apply_certificates(
    client: &stackable_operator::client::Client,
    field_manager: &str,
    owner: &RedpandaCluster,
    descriptions: &[CertificateDescription],
) -> Result<()> {
    for description in descriptions {
        let cert = build_certificate(description, owner)?;
        tracing::debug!(certificate = %description.key(), "applying certificate");
        client
            .apply_patch(field_manager, &cert, &cert)
            .await
            .context(ApplyCertificateSnafu {
                certificate: description.key().object_ref::<Certificate>(),
            })?;
    }
    Ok(())
}

/// Deletes the [`Certificate`]s labelled as belonging to `owner` that are not `desired`.
///
/// Runs after every reconcile so that turning off TLS or client authentication for an
/// API removes the certificates it no longer needs.
pub async fn delete_stale_certificates(
    client: &stackable_operator::client::Client,
    owner: &RedpandaCluster,
    desired: &[CertificateDescription],
) -> Result<()> {
    let namespace = owner.namespace().unwrap_or_default();
    let existing = client
        .list_with_label_selector::<Certificate>(&namespace, &owned_certificates_selector(owner))
        .await
        .context(ListCertificatesSnafu)?;
    for cert in stale_certificates(&existing, desired) {
        let certificate = ObjectRef::from_obj(cert);
        tracing::info!(%certificate, "deleting stale certificate");
        client
            .delete(cert)
            .await
            .context(DeleteCertificateSnafu { certificate })?;
    }
    Ok(())
}
