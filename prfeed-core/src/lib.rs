pub mod config;
pub mod error;
pub mod feed;
pub mod github;
pub mod index;
pub mod pipeline;
pub mod record;

pub use config::{AuthorConfig, Config, FeedMeta, GitHubConfig, RepositoryRef};
pub use error::{ConfigError, FetchError, PipelineError, RenderError};
pub use feed::{feed_filename, render_combined_feed, render_repository_feed, RenderMode};
pub use github::{GitHubClient, PullRequest};
pub use index::{render_index, IndexSummary};
pub use pipeline::{run, RunReport};
pub use record::{normalize, parse_merged_at, sort_newest_first, NormalizedRecord};
