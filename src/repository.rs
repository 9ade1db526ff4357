use std::io::Write;
use std::path::{Path, PathBuf};

use git2::{build::RepoBuilder, FetchOptions, RemoteCallbacks, Repository};
use tracing::{info, warn};

use crate::config::InstallationConfig;
use crate::types::{Error, Result};

/// What to check out and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositorySpec {
    pub url: String,
    pub branch: String,
    pub clone_dir: PathBuf,
    pub fork_remote_name: String,
    pub fork_url: String,
}

impl From<&InstallationConfig> for RepositorySpec {
    fn from(config: &InstallationConfig) -> Self {
        RepositorySpec {
            url: config.infra_deployments_url(),
            branch: config.infra_deployments_branch.clone(),
            clone_dir: config.infra_deployments_clone_dir.clone(),
            fork_remote_name: config.local_fork_name.clone(),
            fork_url: config.fork_url(),
        }
    }
}

/// Produce a fresh checkout of `spec.branch` in `spec.clone_dir` with the fork remote attached.
///
/// Any directory already present at `spec.clone_dir` is deleted first.
///
/// ### Returns
///
/// A [`Result`] containing the cloned [`Repository`].
pub fn sync_repository(spec: &RepositorySpec) -> Result<Repository> {
    remove_stale_clone(&spec.clone_dir)?;
    let repo = clone_branch(&spec.url, &spec.branch, &spec.clone_dir)?;
    add_fork_remote(&repo, &spec.fork_remote_name, &spec.fork_url)?;
    Ok(repo)
}

/// Delete the clone directory if it exists.
pub fn remove_stale_clone(clone_dir: &Path) -> Result<()> {
    if clone_dir.is_dir() {
        warn!("folder {} already exists... removing", clone_dir.display());
        std::fs::remove_dir_all(clone_dir).map_err(|source| Error::RemoveCloneDir {
            path: clone_dir.to_owned(),
            source,
        })?;
    }
    Ok(())
}

/// Clone a single branch of `url` into `path`, echoing server progress to stdout.
pub fn clone_branch(url: &str, branch: &str, path: &Path) -> Result<Repository> {
    let reference = crate::tools::format_branch_ref(branch);
    info!("cloning '{}' with git ref '{}'", url, reference);

    let mut callbacks = RemoteCallbacks::new();
    callbacks.sideband_progress(|data| std::io::stdout().write_all(data).is_ok());

    let mut fetch_options = FetchOptions::new();
    fetch_options.remote_callbacks(callbacks);

    RepoBuilder::new()
        .branch(branch)
        .fetch_options(fetch_options)
        .clone(url, path)
        .map_err(|source| Error::Clone {
            url: url.to_owned(),
            reference,
            source,
        })
}

/// Attach a remote named `name` pointing at `url`. Fails if the name is taken.
pub fn add_fork_remote(repo: &Repository, name: &str, url: &str) -> Result<()> {
    repo.remote(name, url).map_err(|source| Error::CreateRemote {
        name: name.to_owned(),
        url: url.to_owned(),
        source,
    })?;
    info!("added remote '{}' pointing to '{}'", name, url);
    Ok(())
}
