use tracing::info;

use crate::bootstrap::run_preview_install;
use crate::environment::{project_environment, TEST_BRANCH_ID_ENV};
use crate::oauth_redirect::add_spi_oauth_redirect_proxy_url;
use crate::quay_secret::create_e2e_quay_secret;
use crate::repository::{sync_repository, RepositorySpec};
use crate::types::{ContextData, Result};

/// Install AppStudio in preview mode from the configured infra-deployments repository.
pub async fn install_preview_mode(ctx: &ContextData) -> Result<()> {
    info!("using temporary directory {}", ctx.config.tmp_dir.display());
    install_preview_mode_from(&RepositorySpec::from(&ctx.config), ctx).await
}

/// Install AppStudio in preview mode from the checkout described by `repository`.
///
/// Clones the repository, runs its bootstrap script with the projected
/// environment, then applies the post-install fixups. Every step but the
/// OAuth redirect fixup aborts the install on failure; nothing is retried and
/// the clone is left in place when a later step fails.
pub async fn install_preview_mode_from(
    repository: &RepositorySpec,
    ctx: &ContextData,
) -> Result<()> {
    let config = &ctx.config;

    sync_repository(repository)?;

    let env = project_environment(config);
    info!(
        "installing with {}={}",
        TEST_BRANCH_ID_ENV,
        env.get(TEST_BRANCH_ID_ENV).unwrap_or_default()
    );
    run_preview_install(&repository.clone_dir, &env).await?;

    add_spi_oauth_redirect_proxy_url(config.oauth_redirect_proxy_url.as_deref(), ctx).await;

    create_e2e_quay_secret(&config.quay_token, ctx).await?;
    info!("AppStudio installed in preview mode");
    Ok(())
}
