use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use crate::config::RepositoryRef;
use crate::github::PullRequest;

/// A merged pull request in the shape the renderers consume.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NormalizedRecord {
    pub title: String,
    pub url: String,
    pub merged_at: DateTime<Utc>,
    pub author: String,
    /// `owner/name` of the repository the record came from.
    pub repository: String,
    pub description: String,
}

/// Maps merged pull requests of `repo` to records.
///
/// Pull requests without a merge timestamp are skipped. A merge timestamp
/// that is not valid RFC 3339 is replaced by `fallback_now`.
pub fn normalize(
    pulls: &[PullRequest],
    repo: &RepositoryRef,
    fallback_now: DateTime<Utc>,
) -> Vec<NormalizedRecord> {
    let label = repo.full_name();
    pulls
        .iter()
        .filter_map(|pr| {
            let merged_at = pr.merged_at.as_deref()?;
            Some(NormalizedRecord {
                title: pr.title.clone(),
                url: pr.html_url.clone(),
                merged_at: parse_merged_at(merged_at, fallback_now),
                author: pr.user.login.clone(),
                repository: label.clone(),
                description: repo.description.clone(),
            })
        })
        .collect()
}

/// Parses an RFC 3339 merge timestamp, returning `fallback_now` when it is
/// malformed. `run` passes its single `generated_at` instant, not a fresh
/// clock reading, so reruns with the same instant render identically.
pub fn parse_merged_at(raw: &str, fallback_now: DateTime<Utc>) -> DateTime<Utc> {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => dt.with_timezone(&Utc),
        Err(err) => {
            warn!(timestamp = raw, error = %err, "failed to parse merge timestamp, using current time");
            fallback_now
        }
    }
}

/// Most recently merged first. Ties keep no particular order.
pub fn sort_newest_first(records: &mut [NormalizedRecord]) {
    records.sort_unstable_by(|a, b| b.merged_at.cmp(&a.merged_at));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::{Base, BaseRepo, User};
    use chrono::TimeZone;

    fn repo() -> RepositoryRef {
        RepositoryRef {
            owner: "acme".into(),
            name: "widget".into(),
            description: "Widget toolkit".into(),
        }
    }

    fn pull(number: u64, merged_at: Option<&str>) -> PullRequest {
        PullRequest {
            number,
            title: format!("PR {number}"),
            html_url: format!("https://github.com/acme/widget/pull/{number}"),
            merged_at: merged_at.map(str::to_string),
            user: User {
                login: "alice".into(),
            },
            base: Base {
                repo: BaseRepo {
                    name: "widget".into(),
                    owner: User {
                        login: "acme".into(),
                    },
                },
            },
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn normalize_carries_repository_identity() {
        let records = normalize(&[pull(7, Some("2024-10-21T08:00:00Z"))], &repo(), now());
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.repository, "acme/widget");
        assert_eq!(record.description, "Widget toolkit");
        assert_eq!(record.author, "alice");
        assert_eq!(
            record.merged_at,
            Utc.with_ymd_and_hms(2024, 10, 21, 8, 0, 0).unwrap()
        );
    }

    #[test]
    fn offset_timestamps_are_converted_to_utc() {
        let parsed = parse_merged_at("2024-10-21T17:00:00+09:00", now());
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 10, 21, 8, 0, 0).unwrap());
    }

    #[test]
    fn unparseable_timestamp_falls_back_to_now() {
        let records = normalize(&[pull(1, Some("not-a-date"))], &repo(), now());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].merged_at, now());
    }

    #[test]
    fn unmerged_pulls_are_skipped() {
        let records = normalize(&[pull(1, None), pull(2, Some("2024-10-21T08:00:00Z"))], &repo(), now());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "PR 2");
    }

    #[test]
    fn sort_is_non_increasing() {
        let pulls = [
            pull(1, Some("2024-01-03T00:00:00Z")),
            pull(2, Some("2024-03-01T00:00:00Z")),
            pull(3, Some("garbage")),
            pull(4, Some("2023-12-31T23:59:59Z")),
            pull(5, Some("2024-01-03T00:00:00Z")),
        ];
        let mut records = normalize(&pulls, &repo(), now());
        sort_newest_first(&mut records);

        assert!(records
            .windows(2)
            .all(|pair| pair[0].merged_at >= pair[1].merged_at));
        // the fallback timestamp is newer than every real merge
        assert_eq!(records[0].title, "PR 3");
        assert_eq!(records[4].title, "PR 4");
    }
}
