use std::borrow::Cow;

use chrono::{DateTime, Utc};

use crate::config::{FeedMeta, RepositoryRef};
use crate::feed::{RenderMode, COMBINED_FEED_FILENAME};

pub const INDEX_FILENAME: &str = "index.html";

/// One line of the index: a repository whose records made it into a feed.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSummary {
    pub repository: RepositoryRef,
    pub record_count: usize,
    pub filename: String,
    pub generated_at: DateTime<Utc>,
}

const STYLE: &str = r#"        body { font-family: Arial, sans-serif; max-width: 1000px; margin: 0 auto; padding: 20px; }
        .header { text-align: center; margin-bottom: 30px; }
        .repository-list { display: grid; grid-template-columns: repeat(auto-fit, minmax(300px, 1fr)); gap: 20px; margin: 30px 0; }
        .repository-card { background: #f8f9fa; border: 1px solid #e9ecef; border-radius: 8px; padding: 20px; }
        .repository-card h3 { margin: 0 0 10px 0; color: #333; }
        .repository-card .description { color: #666; font-size: 14px; margin: 10px 0; }
        .repository-card .stats { color: #888; font-size: 12px; margin: 10px 0; }
        .rss-link { display: inline-block; background: #ff6600; color: white; padding: 8px 16px; text-decoration: none; border-radius: 4px; font-size: 14px; }
        .rss-link:hover { background: #e55a00; }
        .footer { text-align: center; margin-top: 40px; color: #666; border-top: 1px solid #eee; padding-top: 20px; }
        .summary { background: #e3f2fd; padding: 20px; border-radius: 8px; margin: 20px 0; text-align: center; }
"#;

/// Renders the browsable index page.
///
/// In combined mode the summary shows the total record count and links the
/// aggregate feed; otherwise it shows how many repositories have a feed.
pub fn render_index(
    meta: &FeedMeta,
    summaries: &[IndexSummary],
    mode: RenderMode,
    generated_at: DateTime<Utc>,
) -> String {
    let title = escape(&meta.title);
    let mut html = String::with_capacity(4096);

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("    <meta charset=\"UTF-8\">\n");
    html.push_str(
        "    <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n",
    );
    html.push_str(&format!("    <title>{title}</title>\n"));
    html.push_str("    <style>\n");
    html.push_str(STYLE);
    html.push_str("    </style>\n</head>\n<body>\n");

    html.push_str(&format!(
        "    <div class=\"header\">\n        <h1>{title}</h1>\n        <p>{}</p>\n    </div>\n\n",
        escape(&meta.description)
    ));

    html.push_str("    <div class=\"summary\">\n");
    match mode {
        RenderMode::PerRepository => {
            html.push_str("        <h3>Monitored repositories</h3>\n");
            html.push_str(&format!(
                "        <p>Publishing the latest merged pull requests from <strong>{}</strong> repositories</p>\n",
                summaries.len()
            ));
        }
        RenderMode::Combined => {
            let total: usize = summaries.iter().map(|s| s.record_count).sum();
            html.push_str("        <h3>Combined feed</h3>\n");
            html.push_str(&format!(
                "        <p><strong>{total}</strong> merged pull requests from {} repositories</p>\n",
                summaries.len()
            ));
            html.push_str(&format!(
                "        <p><a href=\"{}\" class=\"rss-link\">RSS Feed</a></p>\n",
                escape(COMBINED_FEED_FILENAME)
            ));
        }
    }
    html.push_str(&format!(
        "        <p>Last updated: {}</p>\n",
        generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    html.push_str("    </div>\n\n    <div class=\"repository-list\">\n");

    for summary in summaries {
        render_card(&mut html, summary);
    }

    html.push_str("    </div>\n\n    <div class=\"footer\">\n");
    html.push_str("        <p>Feeds are regenerated on every scheduled run</p>\n");
    html.push_str("        <p>Each feed lists the most recently merged pull requests</p>\n");
    html.push_str("    </div>\n</body>\n</html>\n");
    html
}

fn render_card(html: &mut String, summary: &IndexSummary) {
    let repo = &summary.repository;
    html.push_str(&format!(
        concat!(
            "        <div class=\"repository-card\">\n",
            "            <h3>{owner}/{name}</h3>\n",
            "            <div class=\"description\">{description}</div>\n",
            "            <div class=\"stats\">PRs: {count} | Updated: {updated}</div>\n",
            "            <a href=\"{href}\" class=\"rss-link\">RSS Feed</a>\n",
            "        </div>\n",
        ),
        owner = escape(&repo.owner),
        name = escape(&repo.name),
        description = escape(&repo.description),
        count = summary.record_count,
        updated = summary.generated_at.format("%m/%d %H:%M"),
        href = escape(&summary.filename),
    ));
}

fn escape(s: &str) -> Cow<'_, str> {
    if !s.contains(['<', '>', '&', '"', '\'']) {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}
