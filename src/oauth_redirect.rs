use chrono::Utc;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::ConfigMap;
use kube::{
    api::{Patch, PatchParams, PostParams},
    Api,
};
use tracing::{error, info};

use crate::tools::format_restarted_at;
use crate::types::ContextData;

pub const SPI_NAMESPACE: &'static str = "spi-system";
pub const SPI_OAUTH_CONFIGMAP: &'static str = "spi-oauth-service-environment-config";
pub const SPI_OAUTH_DEPLOYMENT: &'static str = "spi-oauth-service";
pub const OAUTH_REDIRECT_PROXY_URL_KEY: &'static str = "OAUTH_REDIRECT_PROXY_URL";
pub const RESTARTED_AT_ANNOTATION_KEY: &'static str = "kubectl.kubernetes.io/restartedAt";

/// Point the SPI oauth service at the OAuth redirect proxy.
///
/// Every failure is logged and swallowed: the install goes on regardless.
///
/// ### Arguments
///
/// * `redirect_url` - The proxy url, `None` to skip the step entirely.
/// * `ctx` - The [`ContextData`].
pub async fn add_spi_oauth_redirect_proxy_url(redirect_url: Option<&str>, ctx: &ContextData) {
    let redirect_url = match redirect_url {
        Some(url) if !url.is_empty() => url,
        _ => {
            error!("OAUTH_REDIRECT_PROXY_URL not set: not updating spi configuration");
            return;
        }
    };

    if let Err(e) = patch_oauth_configmap(redirect_url, ctx).await {
        error!(
            "Error patching ConfigMap `{}/{}`: {}",
            SPI_NAMESPACE, SPI_OAUTH_CONFIGMAP, e
        );
        return;
    }

    let deployment = match Api::<Deployment>::namespaced(ctx.client.clone(), SPI_NAMESPACE)
        .get(SPI_OAUTH_DEPLOYMENT)
        .await
    {
        Ok(deployment) => deployment,
        Err(e) => {
            error!(
                "Error getting Deployment `{}/{}`: {}",
                SPI_NAMESPACE, SPI_OAUTH_DEPLOYMENT, e
            );
            return;
        }
    };

    if let Err(e) = scale_down_with_restart_marker(&deployment, ctx).await {
        error!(
            "Error scaling down Deployment `{}/{}`: {}",
            SPI_NAMESPACE, SPI_OAUTH_DEPLOYMENT, e
        );
    }
}

/// Merge `OAUTH_REDIRECT_PROXY_URL` into the oauth service environment [`ConfigMap`].
pub async fn patch_oauth_configmap(
    redirect_url: &str,
    ctx: &ContextData,
) -> Result<ConfigMap, kube::Error> {
    let configmap = Api::<ConfigMap>::namespaced(ctx.client.clone(), SPI_NAMESPACE)
        .patch(
            SPI_OAUTH_CONFIGMAP,
            &PatchParams::default(),
            &Patch::Merge(&serde_json::json!({
                "data": {
                    OAUTH_REDIRECT_PROXY_URL_KEY: redirect_url,
                }
            })),
        )
        .await?;
    info!(
        "Patched ConfigMap `{}/{}` with {}",
        SPI_NAMESPACE, SPI_OAUTH_CONFIGMAP, OAUTH_REDIRECT_PROXY_URL_KEY
    );
    Ok(configmap)
}

/// Build the scaled-down copy of a [`Deployment`].
///
/// The copy carries a fresh `kubectl.kubernetes.io/restartedAt` annotation and
/// zero replicas. Nothing scales it back up; the operator bringing the service
/// back picks up the patched configuration.
pub fn scaled_down_with_restart_marker(
    deployment: &Deployment,
    restarted_at: String,
) -> Deployment {
    let mut scaled = deployment.clone();
    scaled
        .metadata
        .annotations
        .get_or_insert_with(Default::default)
        .insert(RESTARTED_AT_ANNOTATION_KEY.to_owned(), restarted_at);
    scaled.spec.get_or_insert_with(Default::default).replicas = Some(0);
    scaled
}

/// Stamp the restart marker on a [`Deployment`], set its replicas to zero and update it.
pub async fn scale_down_with_restart_marker(
    deployment: &Deployment,
    ctx: &ContextData,
) -> Result<Deployment, kube::Error> {
    let scaled = scaled_down_with_restart_marker(deployment, format_restarted_at(Utc::now()));
    let name = scaled.metadata.name.clone().unwrap_or_default();
    let namespace = scaled
        .metadata
        .namespace
        .clone()
        .unwrap_or_else(|| SPI_NAMESPACE.to_owned());
    let deployment = Api::<Deployment>::namespaced(ctx.client.clone(), &namespace)
        .replace(&name, &PostParams::default(), &scaled)
        .await?;
    info!("Scaled down Deployment `{}/{}` to 0 replicas", namespace, name);
    Ok(deployment)
}
