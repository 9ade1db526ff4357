use std::collections::BTreeMap;

use base64::{engine::general_purpose::STANDARD, Engine};
use k8s_openapi::api::core::v1::{Namespace, Secret};
use k8s_openapi::ByteString;
use kube::{
    api::{ObjectMeta, PostParams},
    Api,
};
use tracing::info;

use crate::tools::is_not_found;
use crate::types::{ContextData, Error, Result};

pub const QUAY_SECRET_NAMESPACE: &'static str = "quay-secret-ns";
pub const QUAY_SECRET_NAME: &'static str = "quay-secret";
pub const DOCKER_CONFIG_JSON_KEY: &'static str = ".dockerconfigjson";
pub const DOCKER_CONFIG_JSON_TYPE: &'static str = "kubernetes.io/dockerconfigjson";

/// Decode the base64 docker config held in `QUAY_TOKEN`.
///
/// Line breaks are skipped, so the wrapped output of `base64 config.json` is
/// accepted as is. Any other byte outside the standard alphabet is rejected.
///
/// ### Returns
///
/// The decoded bytes, [`Error::MissingQuayToken`] for an empty token or
/// [`Error::InvalidQuayToken`] when it is not standard base64.
pub fn decode_quay_token(token: &str) -> Result<Vec<u8>> {
    let token: String = token.chars().filter(|c| !matches!(c, '\r' | '\n')).collect();
    if token.is_empty() {
        return Err(Error::MissingQuayToken);
    }
    STANDARD.decode(token).map_err(Error::InvalidQuayToken)
}

/// Create or refresh the quay pull secret that e2e suites copy into their namespaces.
///
/// The token is validated before any call reaches the cluster.
///
/// ### Arguments
///
/// * `token` - Base64-encoded docker config.json.
/// * `ctx` - The [`ContextData`].
///
/// ### Returns
///
/// A [`Result`] containing the [`Secret`] as stored by the API server.
pub async fn create_e2e_quay_secret(token: &str, ctx: &ContextData) -> Result<Secret> {
    let docker_config = decode_quay_token(token)?;
    ensure_namespace(QUAY_SECRET_NAMESPACE, ctx).await?;
    apply_docker_config_secret(QUAY_SECRET_NAME, QUAY_SECRET_NAMESPACE, docker_config, ctx).await
}

/// Create the [`Namespace`] `name` unless it already exists.
pub async fn ensure_namespace(name: &str, ctx: &ContextData) -> Result<()> {
    let api = Api::<Namespace>::all(ctx.client.clone());
    match api.get(name).await {
        Ok(_) => Ok(()),
        Err(e) if is_not_found(&e) => {
            let namespace = Namespace {
                metadata: ObjectMeta {
                    name: Some(name.to_owned()),
                    ..Default::default()
                },
                ..Default::default()
            };
            api.create(&PostParams::default(), &namespace)
                .await
                .map_err(|source| Error::CreateNamespace {
                    namespace: name.to_owned(),
                    source,
                })?;
            info!("Created Namespace `{}`", name);
            Ok(())
        }
        Err(source) => Err(Error::GetNamespace {
            namespace: name.to_owned(),
            source,
        }),
    }
}

/// Store `docker_config` in a `kubernetes.io/dockerconfigjson` [`Secret`].
///
/// A missing secret is created. An existing one has its data replaced by the
/// single `.dockerconfigjson` entry and is updated in place.
pub async fn apply_docker_config_secret(
    name: &str,
    namespace: &str,
    docker_config: Vec<u8>,
    ctx: &ContextData,
) -> Result<Secret> {
    let api = Api::<Secret>::namespaced(ctx.client.clone(), namespace);
    let data = BTreeMap::from([(DOCKER_CONFIG_JSON_KEY.to_owned(), ByteString(docker_config))]);
    match api.get(name).await {
        Ok(mut secret) => {
            secret.data = Some(data);
            secret.string_data = None;
            let secret = api
                .replace(name, &PostParams::default(), &secret)
                .await
                .map_err(|source| Error::UpdateSecret {
                    name: name.to_owned(),
                    source,
                })?;
            info!("Updated Secret `{}/{}`", namespace, name);
            Ok(secret)
        }
        Err(e) if is_not_found(&e) => {
            let secret = Secret {
                metadata: ObjectMeta {
                    name: Some(name.to_owned()),
                    namespace: Some(namespace.to_owned()),
                    ..Default::default()
                },
                type_: Some(DOCKER_CONFIG_JSON_TYPE.to_owned()),
                data: Some(data),
                ..Default::default()
            };
            let secret = api
                .create(&PostParams::default(), &secret)
                .await
                .map_err(|source| Error::CreateSecret {
                    name: name.to_owned(),
                    source,
                })?;
            info!("Created Secret `{}/{}`", namespace, name);
            Ok(secret)
        }
        Err(source) => Err(Error::GetSecret {
            name: name.to_owned(),
            source,
        }),
    }
}
