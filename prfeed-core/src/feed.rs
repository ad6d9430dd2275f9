use chrono::{DateTime, Utc};
use rss::validation::Validate;
use rss::{ChannelBuilder, GuidBuilder, Item, ItemBuilder};
use tracing::warn;
use url::Url;

use crate::config::{AuthorConfig, FeedMeta, RepositoryRef};
use crate::error::RenderError;
use crate::record::NormalizedRecord;

pub const COMBINED_FEED_FILENAME: &str = "feed.xml";

/// How records are grouped into feed documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// One feed per repository, written to `{owner}-{name}.xml`.
    #[default]
    PerRepository,
    /// A single feed across all repositories, written to `feed.xml`.
    Combined,
}

pub fn feed_filename(repo: &RepositoryRef) -> String {
    format!("{}-{}.xml", repo.owner, repo.name)
}

/// Renders the feed of a single repository. Item titles are left bare.
pub fn render_repository_feed(
    records: &[NormalizedRecord],
    repo: &RepositoryRef,
    meta: &FeedMeta,
    web_base: &str,
    generated_at: DateTime<Utc>,
) -> Result<String, RenderError> {
    let full_name = repo.full_name();
    let header = ChannelHeader {
        title: format!("{} - {} Merged PRs", meta.title, full_name),
        link: format!("{}/{}", web_base.trim_end_matches('/'), full_name),
        description: with_suffix(
            format!("Recent merged pull requests from {full_name}"),
            &repo.description,
        ),
    };
    let items = records.iter().map(|r| record_to_item(r, false)).collect();
    render_channel(header, &meta.author, items, generated_at)
}

/// Renders one feed spanning every repository. Item titles carry a
/// `[owner/name]` prefix.
pub fn render_combined_feed(
    records: &[NormalizedRecord],
    meta: &FeedMeta,
    generated_at: DateTime<Utc>,
) -> Result<String, RenderError> {
    let header = ChannelHeader {
        title: meta.title.clone(),
        link: meta.link.clone(),
        description: meta.description.clone(),
    };
    let items = records.iter().map(|r| record_to_item(r, true)).collect();
    render_channel(header, &meta.author, items, generated_at)
}

struct ChannelHeader {
    title: String,
    link: String,
    description: String,
}

fn render_channel(
    header: ChannelHeader,
    author: &AuthorConfig,
    items: Vec<Item>,
    generated_at: DateTime<Utc>,
) -> Result<String, RenderError> {
    let build_date = generated_at.to_rfc2822();
    let channel = ChannelBuilder::default()
        .title(header.title)
        .link(header.link)
        .description(header.description)
        .managing_editor(managing_editor(author))
        .pub_date(build_date.clone())
        .last_build_date(build_date)
        .generator("prfeed".to_string())
        .items(items)
        .build();

    channel.validate()?;
    Ok(channel.to_string())
}

fn record_to_item(record: &NormalizedRecord, prefix_repository: bool) -> Item {
    let title = if prefix_repository {
        format!("[{}] {}", record.repository, record.title)
    } else {
        record.title.clone()
    };
    let description = with_suffix(
        format!("Merged by {} in {}", record.author, record.repository),
        &record.description,
    );

    // a bad url drops the link, not the item or the channel
    let link = match Url::parse(&record.url) {
        Ok(_) => Some(record.url.clone()),
        Err(err) => {
            warn!(repository = %record.repository, url = %record.url, error = %err, "pull request has no valid url, omitting item link");
            None
        }
    };
    let guid = link
        .as_ref()
        .map(|link| GuidBuilder::default().permalink(true).value(link.clone()).build());

    ItemBuilder::default()
        .title(title)
        .link(link)
        .guid(guid)
        .description(description)
        .author(record.author.clone())
        .pub_date(record.merged_at.to_rfc2822())
        .build()
}

fn managing_editor(author: &AuthorConfig) -> String {
    if author.email.is_empty() {
        author.name.clone()
    } else {
        format!("{} ({})", author.email, author.name)
    }
}

fn with_suffix(text: String, suffix: &str) -> String {
    if suffix.is_empty() {
        text
    } else {
        format!("{text} - {suffix}")
    }
}
