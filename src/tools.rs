use chrono::{DateTime, SecondsFormat, Utc};
use rand::Rng;

pub const INFRA_DEPLOYMENTS_REPOSITORY: &'static str = "infra-deployments";
const RANDOM_STRING_CHARSET: &'static [u8] = b"abcdefghijklmnopqrstuvwxyz";

/// Format the HTTPS url of the `infra-deployments` repository of a GitHub organization.
///
/// ### Arguments
///
/// * `organization` - The GitHub organization owning the repository.
///
/// ### Returns
///
/// A [`String`] in the format `https://github.com/organization/infra-deployments`.
///
/// ### Example
///
/// ```rust
/// let url = format_repository_url("redhat-appstudio");
/// println!("{}", url); // https://github.com/redhat-appstudio/infra-deployments
/// ```
pub fn format_repository_url(organization: &str) -> String {
    format!(
        "https://github.com/{}/{}",
        organization, INFRA_DEPLOYMENTS_REPOSITORY
    )
}

#[test]
fn test_format_repository_url() {
    assert_eq!(
        format_repository_url("acme"),
        "https://github.com/acme/infra-deployments"
    );
    assert_ne!(
        format_repository_url("acme"),
        "https://github.com/acme/infra-deployments.git"
    );
}

/// Format the url of a fork of the `infra-deployments` repository.
///
/// Unlike [`format_repository_url()`], the url carries the `.git` suffix.
///
/// ### Arguments
///
/// * `organization` - The GitHub organization owning the fork.
///
/// ### Returns
///
/// A [`String`] in the format `https://github.com/organization/infra-deployments.git`.
pub fn format_fork_url(organization: &str) -> String {
    format!(
        "https://github.com/{}/{}.git",
        organization, INFRA_DEPLOYMENTS_REPOSITORY
    )
}

#[test]
fn test_format_fork_url() {
    assert_eq!(
        format_fork_url("acme-qe"),
        "https://github.com/acme-qe/infra-deployments.git"
    );
}

/// Format a branch name as a fully qualified git reference (`refs/heads/branch`).
pub fn format_branch_ref(branch: &str) -> String {
    format!("refs/heads/{}", branch)
}

#[test]
fn test_format_branch_ref() {
    assert_eq!(format_branch_ref("main"), "refs/heads/main");
    assert_eq!(
        format_branch_ref("release/v1"),
        "refs/heads/release/v1"
    );
}

/// Format the value of a `kubectl.kubernetes.io/restartedAt` annotation.
///
/// The value is an RFC 3339 timestamp in UTC with second precision, the same
/// format `kubectl rollout restart` writes.
///
/// ### Arguments
///
/// * `now` - The instant to stamp.
///
/// ### Example
///
/// ```rust
/// let annotation = format_restarted_at(Utc::now());
/// println!("{}", annotation); // 2023-07-14T09:30:00Z
/// ```
pub fn format_restarted_at(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[test]
fn test_format_restarted_at() {
    use chrono::TimeZone;
    let now = Utc.with_ymd_and_hms(2023, 7, 14, 9, 30, 5).unwrap();
    assert_eq!(format_restarted_at(now), "2023-07-14T09:30:05Z");
}

/// Generate a random string of lowercase ASCII letters.
///
/// Used as the test-run identifier exported to the bootstrap script.
pub fn generate_random_string(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| RANDOM_STRING_CHARSET[rng.gen_range(0..RANDOM_STRING_CHARSET.len())] as char)
        .collect()
}

#[test]
fn test_generate_random_string() {
    let value = generate_random_string(4);
    assert_eq!(value.len(), 4);
    assert!(value.chars().all(|c| c.is_ascii_lowercase()));
    assert!(generate_random_string(0).is_empty());
}

/// Check whether a [`kube::Error`] is the API server reporting a missing object.
pub fn is_not_found(error: &kube::Error) -> bool {
    matches!(error, kube::Error::Api(response) if response.code == 404)
}

#[test]
fn test_is_not_found() {
    let response = |code: u16, reason: &str| kube::error::ErrorResponse {
        status: "Failure".to_owned(),
        message: String::new(),
        reason: reason.to_owned(),
        code,
    };
    assert!(is_not_found(&kube::Error::Api(response(404, "NotFound"))));
    assert!(!is_not_found(&kube::Error::Api(response(403, "Forbidden"))));
    assert!(!is_not_found(&kube::Error::Api(response(500, "InternalError"))));
}
