use clap::{crate_description, crate_version, Parser};
use redpanda_pki_operator::{crd::RedpandaCluster, pki::naming::CertificateRole, pki_controller};
use stackable_operator::{
    cli::Command, logging::TracingTarget, namespace::WatchNamespace,
    shared::yaml::SerializeOptions, utils::cluster_info::KubernetesClusterInfoOpts,
    CustomResourceExt,
};

pub const APP_NAME: &str = "redpanda-pki-operator";
pub const ENV_VAR_LOGGING: &str = "REDPANDA_PKI_OPERATOR_LOG";

mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

#[derive(clap::Parser)]
#[clap(author, version)]
struct Opts {
    #[clap(subcommand)]
    cmd: Command<PkiOperatorRun>,
}

#[derive(clap::Parser)]
struct PkiOperatorRun {
    /// Only watch RedpandaClusters in this namespace, all namespaces if empty
    #[arg(long, env, default_value = "")]
    watch_namespace: WatchNamespace,
    /// Tracing log collector system
    #[arg(long, env, default_value_t, value_enum)]
    pub tracing_target: TracingTarget,
    #[command(flatten)]
    pub cluster_info_opts: KubernetesClusterInfoOpts,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let opts = Opts::parse();
    match opts.cmd {
        Command::Crd => {
            RedpandaCluster::print_yaml_schema(
                built_info::PKG_VERSION,
                SerializeOptions::default(),
            )?;
        }
        Command::Run(PkiOperatorRun {
            watch_namespace,
            tracing_target,
            cluster_info_opts,
        }) => {
            stackable_operator::logging::initialize_logging(
                ENV_VAR_LOGGING,
                APP_NAME,
                tracing_target,
            );
            stackable_operator::utils::print_startup_string(
                crate_description!(),
                crate_version!(),
                built_info::GIT_VERSION,
                built_info::TARGET,
                built_info::BUILT_TIME_UTC,
                built_info::RUSTC_VERSION,
            );
            CertificateRole::check_unique_suffixes()?;
            let client = stackable_operator::client::initialize_operator(
                Some(redpanda_pki_operator::OPERATOR_NAME.to_string()),
                &cluster_info_opts,
            )
            .await?;
            tracing::info!(namespace = ?watch_namespace, "starting certificate controller");
            pki_controller::start(&client, &watch_namespace).await;
        }
    }
    Ok(())
}
