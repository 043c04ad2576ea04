use thiserror::Error;

/// One of the five sequential Git Data API calls that make up a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitStep {
    GetBranchRef,
    CreateBlob,
    CreateTree,
    CreateCommit,
    UpdateRef,
}

impl std::fmt::Display for CommitStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            CommitStep::GetBranchRef => "step 1 (get branch ref)",
            CommitStep::CreateBlob => "step 2 (create blob)",
            CommitStep::CreateTree => "step 3 (create tree)",
            CommitStep::CreateCommit => "step 4 (create commit)",
            CommitStep::UpdateRef => "step 5 (update ref)",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("authentication failed (status {status}): {message}")]
    Auth { status: u16, message: String },
    #[error("not found: {message}")]
    NotFound { message: String },
    #[error("branch not found: {branch}")]
    BranchNotFound { branch: String },
    #[error("validation failed: {message}")]
    Validation { message: String },
    #[error("ref update rejected (non-fast-forward): {message}")]
    Conflict { message: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("GitHub API error (status {status}): {message}")]
    Api { status: u16, message: String },
    #[error("response parse error: {0}")]
    Parse(String),
    #[error("commit failed at {step}: {source}")]
    Commit {
        step: CommitStep,
        #[source]
        source: Box<GitHubError>,
    },
}

impl GitHubError {
    pub(crate) fn at_step(self, step: CommitStep) -> GitHubError {
        GitHubError::Commit {
            step,
            source: Box::new(self),
        }
    }
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("cyclic alias chain: {}", chain.join(" -> "))]
    CyclicAlias { chain: Vec<String> },
    #[error("alias target no longer exists: {id}")]
    UnknownVariable { id: String },
    #[error("variable '{name}' has no value for mode '{mode}'")]
    MissingMode { name: String, mode: String },
}

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("document io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("document parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_error_names_step() {
        let err = GitHubError::BranchNotFound {
            branch: "main".to_string(),
        }
        .at_step(CommitStep::GetBranchRef);
        assert_eq!(
            err.to_string(),
            "commit failed at step 1 (get branch ref): branch not found: main"
        );
    }

    #[test]
    fn resolve_error_display() {
        let err = ResolveError::CyclicAlias {
            chain: vec!["a".to_string(), "b".to_string(), "a".to_string()],
        };
        assert_eq!(err.to_string(), "cyclic alias chain: a -> b -> a");
    }

    #[test]
    fn conflict_error_display() {
        let err = GitHubError::Conflict {
            message: "Update is not a fast forward".to_string(),
        };
        assert!(err.to_string().contains("non-fast-forward"));
    }
}
