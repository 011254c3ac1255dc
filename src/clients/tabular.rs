//! File-backed tabular analytics store.
//!
//! Tables are partitioned by analysis routine: every `*.json` file under
//! `<data_dir>/<analysis_kind>/` holds one partition of the form
//! `{"columns": [...], "rows": [[...], ...]}`. Partitions are read in file
//! name order and must share the first partition's columns.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;

use super::{TabularStore, matches_any};
use crate::core::{AnalysisKind, EntityFilters, TableFrame};
use crate::error::ClientError;

pub use crate::core::payload::{OPPONENT_COLUMN, SUBJECT_COLUMN, TEAM_COLUMN, WINDOW_COLUMN};

const SERVICE: &str = "json_tables";

#[derive(Debug, Deserialize)]
struct Partition {
    columns: Vec<String>,
    #[serde(default)]
    rows: Vec<Vec<serde_json::Value>>,
}

/// Analytics store over partitioned JSON table files.
#[derive(Debug, Clone)]
pub struct JsonTableStore {
    root: PathBuf,
}

impl JsonTableStore {
    /// Creates a store rooted at `data_dir`.
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            root: data_dir.as_ref().to_path_buf(),
        }
    }

    async fn partitions(&self, kind: AnalysisKind) -> Result<Vec<PathBuf>, ClientError> {
        let dir = self.root.join(kind.as_str());
        let io_err = |source| ClientError::Io {
            path: dir.clone(),
            source,
        };
        let mut entries = tokio::fs::read_dir(&dir).await.map_err(io_err)?;
        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }

    async fn read_partition(path: &Path) -> Result<Partition, ClientError> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ClientError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        serde_json::from_str(&raw).map_err(|e| ClientError::Decode {
            service: SERVICE,
            message: format!("{}: {e}", path.display()),
        })
    }
}

fn cell_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Returns `true` if the row passes every filter whose column exists.
fn row_matches(frame: &TableFrame, row: &[serde_json::Value], filters: &EntityFilters) -> bool {
    let check = |column: &str, wanted: &[String]| {
        if wanted.is_empty() {
            return true;
        }
        frame
            .column_index(column)
            .and_then(|i| row.get(i))
            .is_none_or(|cell| matches_any(&cell_text(cell), wanted))
    };
    let window: Vec<String> = filters.time_window.iter().cloned().collect();

    check(SUBJECT_COLUMN, &filters.subjects)
        && check(OPPONENT_COLUMN, &filters.opponents)
        && check(WINDOW_COLUMN, &window)
        && check(TEAM_COLUMN, &filters.teams)
}

#[async_trait]
impl TabularStore for JsonTableStore {
    fn name(&self) -> &'static str {
        SERVICE
    }

    async fn query(
        &self,
        filters: &EntityFilters,
        kind: AnalysisKind,
    ) -> Result<TableFrame, ClientError> {
        let paths = self.partitions(kind).await?;
        let Some(first) = paths.first() else {
            return Ok(TableFrame {
                source: kind.as_str().to_string(),
                ..TableFrame::default()
            });
        };

        let mut frame = TableFrame {
            columns: Vec::new(),
            rows: Vec::new(),
            source: first
                .file_stem()
                .map_or_else(|| kind.as_str().to_string(), |s| s.to_string_lossy().into_owned()),
        };

        for path in &paths {
            let partition = Self::read_partition(path).await?;
            if frame.columns.is_empty() {
                frame.columns = partition.columns;
            } else if partition.columns != frame.columns {
                tracing::warn!(path = %path.display(), "skipping partition with mismatched columns");
                continue;
            }
            frame.rows.extend(partition.rows);
        }

        let TableFrame {
            columns,
            rows,
            source,
        } = frame;
        let mut filtered = TableFrame {
            columns,
            rows: Vec::new(),
            source,
        };
        for row in rows {
            if row_matches(&filtered, &row, filters) {
                filtered.rows.push(row);
            }
        }

        tracing::debug!(
            kind = %kind,
            partitions = paths.len(),
            rows = filtered.rows.len(),
            "tabular query"
        );
        Ok(filtered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write_partition(dir: &Path, kind: AnalysisKind, name: &str, body: &serde_json::Value) {
        let part_dir = dir.join(kind.as_str());
        std::fs::create_dir_all(&part_dir).unwrap_or_else(|_| unreachable!());
        std::fs::write(part_dir.join(name), body.to_string()).unwrap_or_else(|_| unreachable!());
    }

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap_or_else(|_| unreachable!());
        write_partition(
            dir.path(),
            AnalysisKind::PlayerPerformance,
            "a_player_stats.json",
            &json!({
                "columns": ["player", "goals", "window"],
                "rows": [
                    ["Nick Suzuki", 12, "this_season"],
                    ["Cole Caufield", 18, "this_season"]
                ]
            }),
        );
        write_partition(
            dir.path(),
            AnalysisKind::PlayerPerformance,
            "b_player_stats.json",
            &json!({
                "columns": ["player", "goals", "window"],
                "rows": [["Nick Suzuki", 3, "last_5_games"]]
            }),
        );
        write_partition(
            dir.path(),
            AnalysisKind::PlayerPerformance,
            "c_other.json",
            &json!({"columns": ["team"], "rows": [["MTL"]]}),
        );
        dir
    }

    #[tokio::test]
    async fn test_query_merges_partitions_and_filters() {
        let dir = fixture();
        let store = JsonTableStore::new(dir.path());
        let filters = EntityFilters {
            subjects: vec!["Suzuki".to_string()],
            ..EntityFilters::default()
        };
        let frame = store
            .query(&filters, AnalysisKind::PlayerPerformance)
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(frame.source, "a_player_stats");
        assert_eq!(frame.columns, vec!["player", "goals", "window"]);
        assert_eq!(frame.rows.len(), 2);
    }

    #[tokio::test]
    async fn test_query_time_window_filter() {
        let dir = fixture();
        let store = JsonTableStore::new(dir.path());
        let filters = EntityFilters {
            time_window: Some("last_5_games".to_string()),
            ..EntityFilters::default()
        };
        let frame = store
            .query(&filters, AnalysisKind::PlayerPerformance)
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(frame.rows.len(), 1);
        assert_eq!(frame.rows[0][1], json!(3));
    }

    #[tokio::test]
    async fn test_team_filter_excludes_other_teams() {
        let dir = tempfile::tempdir().unwrap_or_else(|_| unreachable!());
        write_partition(
            dir.path(),
            AnalysisKind::TeamPerformance,
            "standings.json",
            &json!({
                "columns": ["team", "points"],
                "rows": [["MTL", 91], ["TOR", 108]]
            }),
        );
        let store = JsonTableStore::new(dir.path());

        let mtl = EntityFilters {
            teams: vec!["MTL".to_string()],
            ..EntityFilters::default()
        };
        let frame = store
            .query(&mtl, AnalysisKind::TeamPerformance)
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(frame.rows, vec![vec![json!("MTL"), json!(91)]]);

        let elsewhere = EntityFilters {
            teams: vec!["LAV".to_string()],
            ..EntityFilters::default()
        };
        let frame = store
            .query(&elsewhere, AnalysisKind::TeamPerformance)
            .await
            .unwrap_or_else(|_| unreachable!());
        assert!(frame.is_empty());
    }

    #[tokio::test]
    async fn test_missing_partition_dir_is_io_error() {
        let dir = tempfile::tempdir().unwrap_or_else(|_| unreachable!());
        let store = JsonTableStore::new(dir.path());
        let result = store
            .query(&EntityFilters::default(), AnalysisKind::GameAnalysis)
            .await;
        assert!(matches!(result, Err(ClientError::Io { .. })));
    }

    #[tokio::test]
    async fn test_malformed_partition_is_decode_error() {
        let dir = tempfile::tempdir().unwrap_or_else(|_| unreachable!());
        let part_dir = dir.path().join(AnalysisKind::TeamPerformance.as_str());
        std::fs::create_dir_all(&part_dir).unwrap_or_else(|_| unreachable!());
        std::fs::write(part_dir.join("t.json"), "not json").unwrap_or_else(|_| unreachable!());

        let store = JsonTableStore::new(dir.path());
        let result = store
            .query(&EntityFilters::default(), AnalysisKind::TeamPerformance)
            .await;
        assert!(matches!(result, Err(ClientError::Decode { .. })));
    }
}
