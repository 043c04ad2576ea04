//! End-to-end sync flow: variable graph -> export blob -> remote diff.

use crate::diff::{diff, render_diff, DiffChange};
use crate::error::GitHubError;
use crate::export::{export_to_string, export_tokens};
use crate::github::GitHubClient;
use crate::normalize::format_collections;
use crate::variables::{VariableCollection, VariableSource};
use serde_json::Value;

/// A formatted snapshot of the variable graph plus its export serialization.
#[derive(Debug, Clone)]
pub struct ExportSnapshot {
    pub collections: Vec<VariableCollection>,
    pub tokens: Value,
    pub content: String,
}

pub fn build_export<S: VariableSource + ?Sized>(source: &S) -> ExportSnapshot {
    let collections = format_collections(source);
    let tokens = export_tokens(&collections);
    let content = export_to_string(&tokens);
    ExportSnapshot {
        collections,
        tokens,
        content,
    }
}

/// Leaf changes between the committed file and the local export, with the
/// rendered preview text.
#[derive(Debug, Clone)]
pub struct DiffPreview {
    pub changes: Vec<DiffChange>,
    pub text: String,
}

impl DiffPreview {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Diff the local export against what the branch currently holds. A file
/// that does not exist on the branch yet diffs against an empty document.
pub fn preview_against_branch(
    client: &GitHubClient,
    snapshot: &ExportSnapshot,
    path: &str,
    branch: &str,
) -> Result<DiffPreview, GitHubError> {
    let remote = client
        .fetch_file(path, branch)?
        .unwrap_or_else(|| "{}".to_string());

    let changes = diff(&remote, &snapshot.content)
        .map_err(|err| GitHubError::Parse(format!("committed document: {err}")))?;
    let text = render_diff(&changes);
    Ok(DiffPreview { changes, text })
}
