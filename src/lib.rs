pub mod bridge;
pub mod diff;
pub mod error;
pub mod export;
pub mod format;
pub mod github;
pub mod normalize;
pub mod resolve;
pub mod resource;
pub mod settings;
pub mod sync;
pub mod variables;

pub use diff::{diff, render_diff, DiffChange};
pub use error::{CommitStep, DocumentError, GitHubError, ResolveError};
pub use export::export_tokens;
pub use github::{CommitRequest, GitHubClient, GitHubConfig, RefUpdatePolicy};
pub use resource::Resource;
pub use settings::StoredSettings;
pub use variables::{
    RawCollection, RawValue, RawVariable, Variable, VariableCollection, VariableDocument,
    VariableSource, VariableType,
};
