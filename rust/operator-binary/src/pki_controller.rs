use std::{sync::Arc, time::Duration};

use const_format::concatcp;
use futures::StreamExt;
use snafu::{ResultExt as _, Snafu};
use stackable_operator::{
    kube::{
        api::PartialObjectMeta,
        core::{error_boundary, DeserializeGuard},
        runtime::{
            controller,
            events::{Recorder, Reporter},
            reflector::ObjectRef,
            watcher, Controller,
        },
    },
    logging::controller::{report_controller_reconciled, ReconcilerError},
    namespace::WatchNamespace,
};
use strum::{EnumDiscriminants, IntoEnumIterator, IntoStaticStr};

use crate::{
    apply,
    crd::RedpandaCluster,
    external_crd::cert_manager::Certificate,
    pki::{self, PkiReconciler, TlsApi},
    OPERATOR_NAME,
};

const CONTROLLER_NAME: &str = "pki";
const FULL_CONTROLLER_NAME: &str = concatcp!(CONTROLLER_NAME, ".", OPERATOR_NAME);

pub async fn start(
    client: &stackable_operator::client::Client,
    watch_namespace: &WatchNamespace,
) {
    let controller = Controller::new(
        watch_namespace.get_api::<DeserializeGuard<RedpandaCluster>>(client),
        watcher::Config::default(),
    );
    let event_recorder = Arc::new(Recorder::new(
        client.as_kube_client(),
        Reporter {
            controller: FULL_CONTROLLER_NAME.to_string(),
            instance: None,
        },
    ));
    controller
        .owns(
            watch_namespace.get_api::<PartialObjectMeta<Certificate>>(client),
            watcher::Config::default(),
        )
        .run(
            reconcile,
            error_policy,
            Arc::new(Ctx {
                client: client.clone(),
                cluster_domain: client.kubernetes_cluster_info.cluster_domain.to_string(),
            }),
        )
        .for_each_concurrent(16, move |res| {
            let event_recorder = event_recorder.clone();
            async move {
                report_controller_reconciled(&event_recorder, FULL_CONTROLLER_NAME, &res).await
            }
        })
        .await;
}

#[derive(Debug, Snafu, EnumDiscriminants)]
#[strum_discriminants(derive(IntoStaticStr))]
pub enum Error {
    #[snafu(display("RedpandaCluster object is invalid"))]
    InvalidCluster {
        source: error_boundary::InvalidObject,
    },

    #[snafu(display("failed to identify RedpandaCluster"))]
    IdentifyCluster { source: pki::Error },

    #[snafu(display("failed to apply certificates for {api}"))]
    ApplyCertificates { source: apply::Error, api: TlsApi },

    #[snafu(display("failed to delete stale certificates"))]
    DeleteStaleCertificates { source: apply::Error },
}
type Result<T, E = Error> = std::result::Result<T, E>;
impl ReconcilerError for Error {
    fn category(&self) -> &'static str {
        ErrorDiscriminants::from(self).into()
    }

    fn secondary_object(&self) -> Option<ObjectRef<stackable_operator::kube::api::DynamicObject>> {
        match self {
            Error::InvalidCluster { .. } => None,
            Error::IdentifyCluster { .. } => None,
            Error::ApplyCertificates { source, .. } | Error::DeleteStaleCertificates { source } => {
                match source {
                    apply::Error::BuildOwnerReference { .. } => None,
                    apply::Error::BuildLabel { .. } => None,
                    apply::Error::ApplyCertificate { certificate, .. } => {
                        Some(certificate.clone().erase())
                    }
                    apply::Error::ListCertificates { .. } => None,
                    apply::Error::DeleteCertificate { certificate, .. } => {
                        Some(certificate.clone().erase())
                    }
                }
            }
        }
    }
}

struct Ctx {
    client: stackable_operator::client::Client,
    cluster_domain: String,
}

async fn reconcile(
    cluster: Arc<DeserializeGuard<RedpandaCluster>>,
    ctx: Arc<Ctx>,
) -> Result<controller::Action> {
    let cluster = cluster
        .0
        .as_ref()
        .map_err(error_boundary::InvalidObject::clone)
        .context(InvalidClusterSnafu)?;
    let pki = PkiReconciler::new(cluster, &ctx.cluster_domain).context(IdentifyClusterSnafu)?;
    let issuer_ref = pki.issuer_ref();
    let keystore_secret = pki.keystore_secret();
    let mut desired = Vec::new();
    for api in TlsApi::iter() {
        if pki.falls_back_to_internal(api) {
            tracing::warn!(
                %api,
                "external listener has no subdomain, issuing node certificate for {}",
                pki.internal_fqdn()
            );
        }
        let certificates = pki.prepare_api(api, issuer_ref, keystore_secret.as_ref());
        tracing::debug!(%api, count = certificates.len(), "requesting certificates");
        apply::apply_certificates(&ctx.client, CONTROLLER_NAME, cluster, &certificates)
            .await
            .context(ApplyCertificatesSnafu { api })?;
        desired.extend(certificates);
    }
    apply::delete_stale_certificates(&ctx.client, cluster, &desired)
        .await
        .context(DeleteStaleCertificatesSnafu)?;
    Ok(controller::Action::await_change())
}

fn error_policy(
    _obj: Arc<DeserializeGuard<RedpandaCluster>>,
    _error: &Error,
    _ctx: Arc<Ctx>,
) -> controller::Action {
    controller::Action::requeue(Duration::from_secs(5))
}
