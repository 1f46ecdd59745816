//! GitHub implementation of the release source.
//!
//! Uses octocrab for authentication and transport. Tag dates come from the
//! git data API: the ref under `refs/tags/` tells heavyweight (annotated)
//! and lightweight tags apart, annotated tags carry a tagger date, and
//! lightweight tags inherit the target commit's committer date.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use octocrab::Octocrab;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::retry::with_retry;

use super::error::{RemoteError, Result};
use super::{RateBudget, Release, ReleaseSource, RequestPacer, TagMetadata};

/// Page size for starred-repository listings.
const STAR_PAGE: usize = 100;

/// Tag page size; one page bounds the fallback's view of tag history.
const TAG_PAGE: usize = 30;

/// GitHub-backed release source.
#[derive(Clone)]
pub struct GitHubSource {
    inner: Arc<Octocrab>,
    pacer: Option<RequestPacer>,
}

impl GitHubSource {
    /// Create an authenticated source from a personal access token.
    pub fn new(token: &str) -> Result<Self> {
        let client = Octocrab::builder()
            .personal_token(token.to_string())
            .build()
            .map_err(|e| api_error(&e))?;

        Ok(Self {
            inner: Arc::new(client),
            pacer: Some(RequestPacer::new(super::GITHUB_DEFAULT_RPS)),
        })
    }

    /// Create a source from an existing octocrab instance, without pacing.
    pub fn from_octocrab(client: Octocrab) -> Self {
        Self {
            inner: Arc::new(client),
            pacer: None,
        }
    }

    /// Replace the request pacer.
    #[must_use]
    pub fn with_pacer(mut self, pacer: RequestPacer) -> Self {
        self.pacer = Some(pacer);
        self
    }

    async fn pace(&self) {
        if let Some(ref pacer) = self.pacer {
            pacer.wait().await;
        }
    }

    /// Paced, retrying GET of a JSON endpoint.
    async fn get_json<T: DeserializeOwned>(&self, route: String) -> std::result::Result<T, octocrab::Error> {
        self.pace().await;
        with_retry(
            || self.inner.get(&route, None::<&()>),
            is_rate_limit_error,
            &route,
        )
        .await
    }
}

/// Check if an octocrab error indicates rate limiting (403/429).
fn is_rate_limit_error(e: &octocrab::Error) -> bool {
    match e {
        octocrab::Error::GitHub { source, .. } => {
            let status = source.status_code.as_u16();
            status == 403 || status == 429
        }
        _ => false,
    }
}

/// Check if an octocrab error is a plain 404.
fn is_not_found(e: &octocrab::Error) -> bool {
    matches!(
        e,
        octocrab::Error::GitHub { source, .. } if source.status_code.as_u16() == 404
    )
}

fn api_error(e: &octocrab::Error) -> RemoteError {
    match e {
        octocrab::Error::GitHub { source, .. } if source.status_code.as_u16() == 401 => {
            RemoteError::AuthRequired
        }
        // Reaches here only once the backoff in `get_json` is exhausted.
        // The precise reset time lives in response headers we no longer
        // have, so report "now" and let the next pass re-check the budget.
        octocrab::Error::GitHub { .. } if is_rate_limit_error(e) => RemoteError::RateLimited {
            reset_at: Utc::now(),
        },
        octocrab::Error::GitHub { .. } => RemoteError::api(e.to_string()),
        // Everything else is transport-level: connection, TLS, serialization
        // of a truncated response.
        _ => RemoteError::network(e.to_string()),
    }
}

fn split_full_name(repository: &str) -> Result<(&str, &str)> {
    repository
        .split_once('/')
        .filter(|(owner, name)| !owner.is_empty() && !name.is_empty())
        .ok_or_else(|| RemoteError::api(format!("malformed repository name: {repository}")))
}

#[derive(Debug, Deserialize)]
struct StarredRepo {
    full_name: String,
}

#[derive(Debug, Deserialize)]
struct TagSummary {
    name: String,
}

#[derive(Debug, Deserialize)]
struct GitRef {
    object: GitObject,
}

#[derive(Debug, Deserialize)]
struct GitObject {
    #[serde(rename = "type")]
    kind: String,
    sha: String,
}

#[derive(Debug, Deserialize)]
struct AnnotatedTag {
    tagger: Option<Signature>,
}

#[derive(Debug, Deserialize)]
struct GitCommit {
    committer: Option<Signature>,
}

#[derive(Debug, Deserialize)]
struct Signature {
    date: DateTime<Utc>,
}

#[async_trait]
impl ReleaseSource for GitHubSource {
    async fn starred_repositories(&self, user: &str) -> Result<Vec<String>> {
        let mut all = Vec::new();
        let mut page = 1u32;

        loop {
            let route = format!("/users/{user}/starred?per_page={STAR_PAGE}&page={page}");
            let repos: Vec<StarredRepo> = self.get_json(route).await.map_err(|e| api_error(&e))?;
            let count = repos.len();

            all.extend(repos.into_iter().map(|r| r.full_name));

            // A short page means we've reached the end.
            if count < STAR_PAGE {
                break;
            }
            page += 1;
        }

        tracing::debug!(user, total = all.len(), "fetched starred repositories");
        Ok(all)
    }

    async fn latest_release(&self, repository: &str) -> Result<Option<Release>> {
        let (owner, name) = split_full_name(repository)?;

        self.pace().await;
        let result = with_retry(
            || async move { self.inner.repos(owner, name).releases().get_latest().await },
            is_rate_limit_error,
            repository,
        )
        .await;

        match result {
            Ok(release) => {
                // Draft releases have no publish date; fall back to the
                // creation date, and without either treat the repository as
                // releaseless so the tag fallback can take over.
                let Some(published_at) = release.published_at.or(release.created_at) else {
                    tracing::warn!(repository, tag = %release.tag_name, "release has no usable date");
                    return Ok(None);
                };
                Ok(Some(Release {
                    tag: release.tag_name,
                    published_at,
                    url: Some(release.html_url.to_string()),
                }))
            }
            // 404 here means "no releases", the expected fallback signal.
            Err(e) if is_not_found(&e) => Ok(None),
            Err(e) => Err(api_error(&e)),
        }
    }

    async fn tags(&self, repository: &str) -> Result<Vec<String>> {
        let (owner, name) = split_full_name(repository)?;
        let route = format!("/repos/{owner}/{name}/tags?per_page={TAG_PAGE}");

        match self.get_json::<Vec<TagSummary>>(route).await {
            Ok(tags) => Ok(tags.into_iter().map(|t| t.name).collect()),
            // Unlike the releases endpoint, the tag list only 404s when the
            // repository itself is missing.
            Err(e) if is_not_found(&e) => Err(RemoteError::gone(repository)),
            Err(e) => Err(api_error(&e)),
        }
    }

    async fn tag_metadata(&self, repository: &str, tag: &str) -> Result<TagMetadata> {
        let (owner, name) = split_full_name(repository)?;

        let git_ref: GitRef = self
            .get_json(format!("/repos/{owner}/{name}/git/ref/tags/{tag}"))
            .await
            .map_err(|e| api_error(&e))?;

        match git_ref.object.kind.as_str() {
            "tag" => {
                // Heavyweight: the ref points at a tag object with its own
                // tagger metadata.
                let annotated: AnnotatedTag = self
                    .get_json(format!(
                        "/repos/{owner}/{name}/git/tags/{}",
                        git_ref.object.sha
                    ))
                    .await
                    .map_err(|e| api_error(&e))?;
                Ok(TagMetadata {
                    tagger_date: annotated.tagger.map(|t| t.date),
                    committer_date: None,
                })
            }
            _ => {
                // Lightweight: the ref points straight at the commit.
                let commit: GitCommit = self
                    .get_json(format!(
                        "/repos/{owner}/{name}/git/commits/{}",
                        git_ref.object.sha
                    ))
                    .await
                    .map_err(|e| api_error(&e))?;
                Ok(TagMetadata {
                    tagger_date: None,
                    committer_date: commit.committer.map(|c| c.date),
                })
            }
        }
    }

    async fn rate_budget(&self) -> Result<RateBudget> {
        self.pace().await;
        let limits = self
            .inner
            .ratelimit()
            .get()
            .await
            .map_err(|e| api_error(&e))?;
        let core = &limits.resources.core;

        Ok(RateBudget {
            limit: core.limit as u32,
            remaining: core.remaining as u32,
            reset_at: DateTime::from_timestamp(core.reset as i64, 0).unwrap_or_else(Utc::now),
        })
    }
}
