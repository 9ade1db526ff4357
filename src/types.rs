use std::path::PathBuf;
use std::process::ExitStatus;

use kube::Client;

use crate::config::InstallationConfig;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("could not determine current working directory: {0}")]
    CurrentDir(#[source] std::io::Error),

    #[error("error removing {} folder: {source}", .path.display())]
    RemoveCloneDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error cloning '{url}' with git ref '{reference}': {source}")]
    Clone {
        url: String,
        reference: String,
        #[source]
        source: git2::Error,
    },

    #[error("error creating remote '{name}' ({url}): {source}")]
    CreateRemote {
        name: String,
        url: String,
        #[source]
        source: git2::Error,
    },

    #[error("failed to run {script}: {source}")]
    Spawn {
        script: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{script} finished with {status}")]
    BootstrapFailed { script: String, status: ExitStatus },

    #[error("failed to obtain quay token from 'QUAY_TOKEN' env; make sure the env exists")]
    MissingQuayToken,

    #[error("failed to decode quay token. Make sure that QUAY_TOKEN env contain a base64 token: {0}")]
    InvalidQuayToken(#[source] base64::DecodeError),

    #[error("error when getting namespace {namespace}: {source}")]
    GetNamespace {
        namespace: String,
        #[source]
        source: kube::Error,
    },

    #[error("error when creating namespace {namespace}: {source}")]
    CreateNamespace {
        namespace: String,
        #[source]
        source: kube::Error,
    },

    #[error("error when getting secret {name}: {source}")]
    GetSecret {
        name: String,
        #[source]
        source: kube::Error,
    },

    #[error("error when creating secret {name}: {source}")]
    CreateSecret {
        name: String,
        #[source]
        source: kube::Error,
    },

    #[error("error when updating secret {name}: {source}")]
    UpdateSecret {
        name: String,
        #[source]
        source: kube::Error,
    },

    #[error(transparent)]
    Kube(#[from] kube::Error),
}
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Everything an installation step needs: the cluster handle and the
/// configuration it was started with.
pub struct ContextData {
    pub client: Client,
    pub config: InstallationConfig,
}

impl ContextData {
    pub fn new(client: Client, config: InstallationConfig) -> Self {
        Self { client, config }
    }
}
