use std::path::Path;

use tokio::process::Command;
use tracing::info;

use crate::environment::InstallationEnv;
use crate::types::{Error, Result};

pub const BOOTSTRAP_SCRIPT: &'static str = "hack/bootstrap-cluster.sh";
pub const PREVIEW_INSTALL_ARGS: [&'static str; 3] = ["preview", "--keycloak", "--toolchain"];

/// Run `script` with `args` from `working_dir`, waiting for it to exit.
///
/// The child inherits stdout, stderr and the process environment, with `env`
/// layered on top. Only the child sees `env`.
///
/// ### Returns
///
/// `Ok(())` when the script exits with status 0, else [`Error::Spawn`] or
/// [`Error::BootstrapFailed`].
pub async fn run_bootstrap_script(
    script: &str,
    args: &[&str],
    working_dir: &Path,
    env: &InstallationEnv,
) -> Result<()> {
    info!(
        "running `{} {}` in {}",
        script,
        args.join(" "),
        working_dir.display()
    );
    let status = Command::new(working_dir.join(script))
        .args(args)
        .current_dir(working_dir)
        .envs(env.iter())
        .status()
        .await
        .map_err(|source| Error::Spawn {
            script: script.to_owned(),
            source,
        })?;
    if !status.success() {
        return Err(Error::BootstrapFailed {
            script: script.to_owned(),
            status,
        });
    }
    info!("{} finished successfully", script);
    Ok(())
}

/// Install in preview mode from a cloned `infra-deployments` checkout.
pub async fn run_preview_install(clone_dir: &Path, env: &InstallationEnv) -> Result<()> {
    run_bootstrap_script(BOOTSTRAP_SCRIPT, &PREVIEW_INSTALL_ARGS, clone_dir, env).await
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::config::InstallationConfig;
    use crate::environment::project_environment;
    use crate::testing::script_lock;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    fn write_script(dir: &Path, body: &str) {
        let path = dir.join(BOOTSTRAP_SCRIPT);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[tokio::test]
    async fn runs_in_clone_dir_with_args_and_projected_env() {
        let _guard = script_lock();
        let tmp = TempDir::new().unwrap();
        write_script(
            tmp.path(),
            r#"echo "$(pwd -P)|$*|$MY_GITHUB_ORG|$TEST_BRANCH_ID" > invocation.txt"#,
        );
        let env = project_environment(&InstallationConfig::new_test());

        run_preview_install(tmp.path(), &env).await.unwrap();

        let invocation = std::fs::read_to_string(tmp.path().join("invocation.txt")).unwrap();
        let cwd = tmp.path().canonicalize().unwrap();
        assert_eq!(
            invocation.trim(),
            format!(
                "{}|preview --keycloak --toolchain|acme-qe|wxyz",
                cwd.display()
            )
        );
        // the projection must not leak into this process
        assert_ne!(std::env::var("TEST_BRANCH_ID").ok().as_deref(), Some("wxyz"));
    }

    #[tokio::test]
    async fn non_zero_exit_is_an_error() {
        let _guard = script_lock();
        let tmp = TempDir::new().unwrap();
        write_script(tmp.path(), "exit 3");

        match run_preview_install(tmp.path(), &InstallationEnv::default()).await {
            Err(Error::BootstrapFailed { script, status }) => {
                assert_eq!(script, BOOTSTRAP_SCRIPT);
                assert_eq!(status.code(), Some(3));
            }
            other => panic!("expected bootstrap failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn missing_script_cannot_be_spawned() {
        let _guard = script_lock();
        let tmp = TempDir::new().unwrap();
        assert!(matches!(
            run_preview_install(tmp.path(), &InstallationEnv::default()).await,
            Err(Error::Spawn { .. })
        ));
    }
}
