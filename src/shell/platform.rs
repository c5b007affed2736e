//! Platform detection.

/// Environment variables whose presence marks a CI run.
const CI_VARIABLES: &[&str] = &[
    "CI",
    "GITHUB_ACTIONS",
    "GITLAB_CI",
    "BUILDKITE",
    "CIRCLECI",
    "JENKINS_URL",
];

/// Check if running in a CI environment.
///
/// CI runs get plain line-based output instead of spinners.
pub fn is_ci() -> bool {
    is_ci_with(|name| std::env::var_os(name).is_some())
}

fn is_ci_with(is_set: impl Fn(&str) -> bool) -> bool {
    CI_VARIABLES.iter().any(|name| is_set(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_any_ci_variable() {
        assert!(is_ci_with(|name| name == "GITHUB_ACTIONS"));
        assert!(is_ci_with(|name| name == "BUILDKITE"));
    }

    #[test]
    fn no_variables_means_not_ci() {
        assert!(!is_ci_with(|_| false));
    }
}
