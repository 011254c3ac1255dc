//! File-backed media index.
//!
//! The index is a single `index.json` array of [`MediaClip`] records under
//! the media directory. It is read on every search so clips added between
//! queries are picked up without a restart.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{MediaIndex, matches_any};
use crate::core::{EntityFilters, MediaClip};
use crate::error::ClientError;

const SERVICE: &str = "media_index";

/// Index file name inside the media directory.
pub const INDEX_FILE: &str = "index.json";

/// Media index over a JSON clip catalogue.
#[derive(Debug, Clone)]
pub struct JsonMediaIndex {
    index_path: PathBuf,
}

impl JsonMediaIndex {
    /// Creates an index rooted at `media_dir`.
    pub fn new(media_dir: impl AsRef<Path>) -> Self {
        Self {
            index_path: media_dir.as_ref().join(INDEX_FILE),
        }
    }

    async fn load(&self) -> Result<Vec<MediaClip>, ClientError> {
        let raw = tokio::fs::read_to_string(&self.index_path)
            .await
            .map_err(|source| ClientError::Io {
                path: self.index_path.clone(),
                source,
            })?;
        serde_json::from_str(&raw).map_err(|e| ClientError::Decode {
            service: SERVICE,
            message: format!("{}: {e}", self.index_path.display()),
        })
    }
}

/// Returns `true` if the clip passes every non-empty filter.
///
/// Clips that record no time windows or no team are not excluded by the
/// window or team filters.
fn clip_matches(clip: &MediaClip, filters: &EntityFilters) -> bool {
    let subjects_ok = filters.subjects.is_empty() || matches_any(&clip.owner, &filters.subjects);
    let categories_ok =
        filters.categories.is_empty() || matches_any(&clip.category, &filters.categories);
    let opponents_ok = filters.opponents.is_empty()
        || clip
            .opponent
            .as_deref()
            .is_some_and(|o| matches_any(o, &filters.opponents));
    let window_ok = filters.time_window.as_ref().is_none_or(|w| {
        clip.windows.is_empty() || clip.windows.iter().any(|cw| cw.eq_ignore_ascii_case(w))
    });
    let team_ok = filters.teams.is_empty()
        || clip
            .team
            .as_deref()
            .is_none_or(|t| matches_any(t, &filters.teams));

    subjects_ok && categories_ok && opponents_ok && window_ok && team_ok
}

#[async_trait]
impl MediaIndex for JsonMediaIndex {
    fn name(&self) -> &'static str {
        SERVICE
    }

    async fn search(
        &self,
        filters: &EntityFilters,
        limit: usize,
    ) -> Result<Vec<MediaClip>, ClientError> {
        let catalogue = self.load().await?;
        let total = catalogue.len();

        let mut clips: Vec<MediaClip> = catalogue
            .into_iter()
            .filter(|clip| clip_matches(clip, filters))
            .collect();
        clips.sort_by(|a, b| b.score.total_cmp(&a.score));
        clips.truncate(limit);

        tracing::debug!(total, matched = clips.len(), limit, "media index search");
        Ok(clips)
    }
}
