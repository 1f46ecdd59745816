//! Release/tag reconciliation for one repository.

use crate::remote::ReleaseSource;
use crate::store::{VersionEntry, VersionStore};

use super::types::{ReleaseSyncResult, MAX_TAG_BACKLOG};
use super::SyncError;

/// Record any versions of `repository` that the store has not seen yet.
///
/// The latest-release endpoint is authoritative when the repository uses
/// releases. When it reports none, fall back to the tag list: walk the tags
/// in exactly the order the remote returns them and record up to
/// [`MAX_TAG_BACKLOG`] previously-unseen ones, resolving each tag's date
/// from its tagger metadata first and the target commit's committer date
/// otherwise.
///
/// GitHub returns tags in a useful but not strictly chronological order
/// (flake8_tuple lists a tag named "add" before 0.2.13). The order is kept
/// as-is: sorting by date here would change which tags fall under the cap
/// from one pass to the next.
#[tracing::instrument(skip(source, versions), fields(repository = %repository))]
pub async fn sync_releases<R, V>(
    source: &R,
    versions: &V,
    repository: &str,
) -> Result<ReleaseSyncResult, SyncError>
where
    R: ReleaseSource + ?Sized,
    V: VersionStore + ?Sized,
{
    let known = versions.existing_versions(repository).await?;

    let mut discovered: Vec<VersionEntry> = Vec::new();
    let mut used_tag_fallback = false;
    let mut truncated = false;

    match source.latest_release(repository).await? {
        Some(release) => {
            if !known.contains(&release.tag) {
                discovered.push(VersionEntry {
                    version: release.tag,
                    created_at: release.published_at,
                });
            }
        }
        None => {
            used_tag_fallback = true;
            for tag in source.tags(repository).await? {
                if known.contains(&tag) {
                    continue;
                }
                if discovered.len() == MAX_TAG_BACKLOG {
                    truncated = true;
                    break;
                }

                let metadata = source.tag_metadata(repository, &tag).await?;
                let Some(date) = metadata.resolved_date() else {
                    tracing::warn!(repository, tag = %tag, "tag has no resolvable date, skipping");
                    continue;
                };
                discovered.push(VersionEntry {
                    version: tag,
                    created_at: date,
                });
            }
        }
    }

    let appended = versions.append_versions(repository, &discovered).await?;

    if truncated {
        tracing::debug!(
            repository,
            cap = MAX_TAG_BACKLOG,
            "unseen tag backlog capped, catching up next pass"
        );
    }

    Ok(ReleaseSyncResult {
        repository: repository.to_string(),
        appended,
        used_tag_fallback,
        truncated,
    })
}
