pub mod bootstrap;
pub mod config;
pub mod environment;
pub mod install;
pub mod oauth_redirect;
pub mod quay_secret;
pub mod repository;
pub mod tools;
pub mod types;
#[cfg(test)]
mod testing;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use kube::Client;
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::{InstallArgs, InstallationConfig};
use install::install_preview_mode;
use oauth_redirect::add_spi_oauth_redirect_proxy_url;
use quay_secret::create_e2e_quay_secret;
use repository::{sync_repository, RepositorySpec};
use types::*;

/// Install AppStudio on a cluster for end-to-end testing
#[derive(Parser, Debug)]
#[command(name = "appstudio-installer")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Clone infra-deployments, bootstrap the cluster in preview mode and apply post-install fixups
    Install(InstallArgs),
    /// Only clone infra-deployments and add the fork remote
    Clone(InstallArgs),
    /// Only create or update the e2e quay pull secret
    QuaySecret(InstallArgs),
    /// Only push the OAuth redirect proxy url to the SPI oauth service
    OauthRedirect(InstallArgs),
}

impl Cli {
    async fn run(self) -> Result<()> {
        match self.command {
            Commands::Install(args) => install_preview_mode(&context(args).await?).await,
            Commands::Clone(args) => {
                sync_repository(&RepositorySpec::from(&InstallationConfig::from_args(args)?))?;
                Ok(())
            }
            Commands::QuaySecret(args) => {
                let ctx = context(args).await?;
                create_e2e_quay_secret(&ctx.config.quay_token, &ctx).await?;
                Ok(())
            }
            Commands::OauthRedirect(args) => {
                let ctx = context(args).await?;
                let redirect_url = ctx.config.oauth_redirect_proxy_url.as_deref();
                add_spi_oauth_redirect_proxy_url(redirect_url, &ctx).await;
                Ok(())
            }
        }
    }
}

async fn context(args: InstallArgs) -> Result<ContextData> {
    let config = InstallationConfig::from_args(args)?;
    Ok(ContextData::new(Client::try_default().await?, config))
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match Cli::parse().run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
