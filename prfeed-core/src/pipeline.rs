use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::config::{Config, RepositoryRef};
use crate::error::{PipelineError, RenderError};
use crate::feed::{
    feed_filename, render_combined_feed, render_repository_feed, RenderMode,
    COMBINED_FEED_FILENAME,
};
use crate::github::GitHubClient;
use crate::index::{render_index, IndexSummary, INDEX_FILENAME};
use crate::record::{normalize, sort_newest_first, NormalizedRecord};

/// What a run produced.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub summaries: Vec<IndexSummary>,
    /// `owner/name` of every repository that was skipped.
    pub failed: Vec<String>,
    pub index_path: PathBuf,
}

/// Runs one full fetch → filter → sort → render pass and writes every
/// document into `output_dir`.
///
/// Repositories that fail to fetch or render are logged and left out. Only
/// failing to create `output_dir` or to write the index aborts the run.
/// `generated_at` stamps the documents and stands in for unparseable merge
/// timestamps.
pub async fn run(
    config: &Config,
    client: &GitHubClient,
    output_dir: &Path,
    mode: RenderMode,
    generated_at: DateTime<Utc>,
) -> Result<RunReport, PipelineError> {
    tokio::fs::create_dir_all(output_dir)
        .await
        .map_err(|source| PipelineError::OutputDir {
            path: output_dir.to_path_buf(),
            source,
        })?;

    let mut report = RunReport::default();
    let mut fetched: Vec<(&RepositoryRef, Vec<NormalizedRecord>)> = Vec::new();

    for repo in &config.repositories {
        match client.fetch_merged(repo, config.github.max_prs).await {
            Ok(pulls) => {
                let mut records = normalize(&pulls, repo, generated_at);
                sort_newest_first(&mut records);
                fetched.push((repo, records));
            }
            Err(err) => {
                warn!(repository = %repo.full_name(), error = %err, "failed to fetch pull requests");
                report.failed.push(repo.full_name());
            }
        }
    }

    match mode {
        RenderMode::PerRepository => {
            for (repo, records) in fetched {
                let filename = feed_filename(repo);
                let written = match render_repository_feed(
                    &records,
                    repo,
                    &config.rss,
                    &config.github.web_url,
                    generated_at,
                ) {
                    Ok(xml) => write_document(output_dir, &filename, &xml).await,
                    Err(err) => Err(err),
                };
                match written {
                    Ok(path) => {
                        info!(
                            repository = %repo.full_name(),
                            records = records.len(),
                            path = %path.display(),
                            "feed generated"
                        );
                        report.summaries.push(IndexSummary {
                            repository: repo.clone(),
                            record_count: records.len(),
                            filename,
                            generated_at,
                        });
                    }
                    Err(err) => {
                        warn!(repository = %repo.full_name(), error = %err, "failed to generate feed");
                        report.failed.push(repo.full_name());
                    }
                }
            }
        }
        RenderMode::Combined => {
            let mut all: Vec<NormalizedRecord> = fetched
                .iter()
                .flat_map(|(_, records)| records.iter().cloned())
                .collect();
            sort_newest_first(&mut all);

            let written = match render_combined_feed(&all, &config.rss, generated_at) {
                Ok(xml) => write_document(output_dir, COMBINED_FEED_FILENAME, &xml).await,
                Err(err) => Err(err),
            };
            match written {
                Ok(path) => {
                    info!(records = all.len(), path = %path.display(), "combined feed generated");
                    report.summaries = fetched
                        .into_iter()
                        .map(|(repo, records)| IndexSummary {
                            repository: repo.clone(),
                            record_count: records.len(),
                            filename: COMBINED_FEED_FILENAME.to_string(),
                            generated_at,
                        })
                        .collect();
                }
                Err(err) => {
                    warn!(error = %err, "failed to generate combined feed");
                    report
                        .failed
                        .extend(fetched.into_iter().map(|(repo, _)| repo.full_name()));
                }
            }
        }
    }

    let html = render_index(&config.rss, &report.summaries, mode, generated_at);
    report.index_path = write_document(output_dir, INDEX_FILENAME, &html)
        .await
        .map_err(PipelineError::Index)?;

    Ok(report)
}

/// Replaces `dir/filename` with `contents`.
pub async fn write_document(
    dir: &Path,
    filename: &str,
    contents: &str,
) -> Result<PathBuf, RenderError> {
    let path = dir.join(filename);
    tokio::fs::write(&path, contents)
        .await
        .map_err(|source| RenderError::Write {
            path: path.clone(),
            source,
        })?;
    Ok(path)
}
