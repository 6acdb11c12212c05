use std::{collections::HashMap, path::PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::Deserialize;

use crate::rate::RateContext;
use crate::time_entry::{BreakInterval, TimeEntry, TimeSpan};

/// time entryを取得するためのリポジトリ。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EntryRepository {
    /// 開始時刻が`[start_at, end_at)`に含まれるtime entryを取得する。
    ///
    /// 各time entryにはtask, project, clientから集めた時給の候補を設定して返す。
    async fn read_time_entries(
        &self,
        start_at: &DateTime<Utc>,
        end_at: &DateTime<Utc>,
    ) -> Result<Vec<TimeEntry>>;

    /// `[start_at, end_at)`と重なるtime entryを取得する。
    ///
    /// 前日から続いているtime entryや計測中のtime entryも含む。
    async fn read_overlapping_entries(
        &self,
        start_at: &DateTime<Utc>,
        end_at: &DateTime<Utc>,
    ) -> Result<Vec<TimeEntry>>;
}

/// 保存されているJSONをデシリアライズするための構造体。
#[derive(Debug, Default, Deserialize)]
struct StoredDocument {
    #[serde(default)]
    clients: Vec<StoredClient>,
    #[serde(default)]
    projects: Vec<StoredProject>,
    #[serde(default)]
    tasks: Vec<StoredTask>,
    #[serde(default)]
    time_entries: Vec<StoredTimeEntry>,
}

#[derive(Debug, Deserialize)]
struct StoredClient {
    id: i64,
    default_rate: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct StoredProject {
    id: i64,
    name: String,
    client_id: Option<i64>,
    rate: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct StoredTask {
    id: i64,
    name: String,
    project_id: Option<i64>,
    rate: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct StoredTimeEntry {
    id: i64,
    #[serde(default)]
    description: String,
    task_id: Option<i64>,
    project_id: Option<i64>,
    start: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
    #[serde(default)]
    breaks: Vec<StoredBreak>,
}

#[derive(Debug, Deserialize)]
struct StoredBreak {
    start: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
}

/// JSONファイルに保存されたtime entryを読み込むリポジトリ。
///
/// # Examples
///
/// ```no_run
/// # async fn run() -> anyhow::Result<()> {
/// use timebill::store::{EntryRepository, JsonEntryStore};
///
/// let store = JsonEntryStore::new("entries.json");
/// let now = chrono::Utc::now();
/// let entries = store.read_time_entries(&(now - chrono::Duration::days(1)), &now).await?;
/// # Ok(())
/// # }
/// ```
pub struct JsonEntryStore {
    path: PathBuf,
}

impl JsonEntryStore {
    /// 新しい`JsonEntryStore`を返す。
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn read_document(&self) -> Result<StoredDocument> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let document: StoredDocument = serde_json::from_str(&content)
            .with_context(|| format!("Failed to deserialize {}", self.path.display()))?;
        info!(
            "length of time entries in {}: {}",
            self.path.display(),
            document.time_entries.len()
        );

        Ok(document)
    }
}

#[async_trait]
impl EntryRepository for JsonEntryStore {
    async fn read_time_entries(
        &self,
        start_at: &DateTime<Utc>,
        end_at: &DateTime<Utc>,
    ) -> Result<Vec<TimeEntry>> {
        let document = self.read_document().await?;

        Ok(join_entries(document, |entry| {
            &entry.start >= start_at && &entry.start < end_at
        }))
    }

    async fn read_overlapping_entries(
        &self,
        start_at: &DateTime<Utc>,
        end_at: &DateTime<Utc>,
    ) -> Result<Vec<TimeEntry>> {
        let document = self.read_document().await?;

        Ok(join_entries(document, |entry| {
            &entry.start < end_at && entry.end.map_or(true, |end| &end > start_at)
        }))
    }
}

/// `keep`を満たすtime entryにtask, project, clientを結びつける。
fn join_entries<F>(document: StoredDocument, keep: F) -> Vec<TimeEntry>
where
    F: Fn(&StoredTimeEntry) -> bool,
{
    let clients: HashMap<i64, StoredClient> = document
        .clients
        .into_iter()
        .map(|client| (client.id, client))
        .collect();
    let projects: HashMap<i64, StoredProject> = document
        .projects
        .into_iter()
        .map(|project| (project.id, project))
        .collect();
    let tasks: HashMap<i64, StoredTask> = document
        .tasks
        .into_iter()
        .map(|task| (task.id, task))
        .collect();

    document
        .time_entries
        .into_iter()
        .filter(|entry| keep(entry))
        .map(|entry| {
            let task = entry.task_id.and_then(|task_id| {
                let task = tasks.get(&task_id);
                if task.is_none() {
                    warn!("time entry {} refers to unknown task {}", entry.id, task_id);
                }
                task
            });
            let project_id = entry
                .project_id
                .or_else(|| task.and_then(|task| task.project_id));
            let project = project_id.and_then(|project_id| {
                let project = projects.get(&project_id);
                if project.is_none() {
                    warn!(
                        "time entry {} refers to unknown project {}",
                        entry.id, project_id
                    );
                }
                project
            });
            let client = project
                .and_then(|project| project.client_id)
                .and_then(|client_id| clients.get(&client_id));
            debug!(
                "time entry {}: task={:?}, project={:?}, client={:?}",
                entry.id,
                task.map(|task| task.id),
                project.map(|project| project.id),
                client.map(|client| client.id)
            );

            TimeEntry {
                id: entry.id,
                description: entry.description,
                project: project.map(|project| project.name.clone()),
                task: task.map(|task| task.name.clone()),
                span: TimeSpan::new(entry.start, entry.end),
                breaks: entry
                    .breaks
                    .into_iter()
                    .map(|pause| BreakInterval::new(pause.start, pause.end))
                    .collect(),
                rates: RateContext {
                    task_rate: task.and_then(|task| task.rate),
                    project_rate: project.and_then(|project| project.rate),
                    client_rate: client.and_then(|client| client.default_rate),
                    fallback_rate: None,
                },
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use chrono::{TimeZone, Utc};
    use tempfile::NamedTempFile;

    use super::{EntryRepository, JsonEntryStore};
    use crate::rate::RateContext;

    const DOCUMENT: &str = r#"{
        "clients": [{"id": 1, "name": "Acme", "default_rate": 30.0}],
        "projects": [
            {"id": 10, "name": "Website", "client_id": 1, "rate": 20.0},
            {"id": 11, "name": "Internal", "client_id": null, "rate": null}
        ],
        "tasks": [{"id": 100, "name": "Design", "project_id": 10, "rate": 10.0}],
        "time_entries": [
            {
                "id": 1,
                "description": "mockups",
                "task_id": 100,
                "project_id": null,
                "start": "2024-01-01T09:00:00Z",
                "end": "2024-01-01T17:00:00Z",
                "breaks": [{"start": "2024-01-01T12:00:00Z", "end": "2024-01-01T13:00:00Z"}]
            },
            {
                "id": 2,
                "description": "meeting",
                "task_id": null,
                "project_id": 11,
                "start": "2024-01-01T18:00:00Z",
                "end": null
            },
            {
                "id": 3,
                "task_id": 999,
                "project_id": null,
                "start": "2024-01-02T09:00:00Z",
                "end": "2024-01-02T10:00:00Z"
            }
        ]
    }"#;

    fn write_document(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_read_time_entries_joins_rates() {
        let file = write_document(DOCUMENT);
        let store = JsonEntryStore::new(file.path());

        let entries = store
            .read_time_entries(
                &Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
                &Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].project.as_deref(), Some("Website"));
        assert_eq!(entries[0].task.as_deref(), Some("Design"));
        assert_eq!(entries[0].breaks.len(), 1);
        assert_eq!(
            entries[0].rates,
            RateContext {
                task_rate: Some(10.0),
                project_rate: Some(20.0),
                client_rate: Some(30.0),
                fallback_rate: None,
            }
        );
        assert_eq!(entries[1].project.as_deref(), Some("Internal"));
        assert!(entries[1].span.is_running());
        assert_eq!(entries[1].rates, RateContext::default());
    }

    /// 存在しないtaskを参照している場合はtaskもprojectも無いものとして扱う。
    #[tokio::test]
    async fn test_read_time_entries_unknown_task() {
        let file = write_document(DOCUMENT);
        let store = JsonEntryStore::new(file.path());

        let entries = store
            .read_time_entries(
                &Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
                &Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].description, "");
        assert_eq!(entries[0].task, None);
        assert_eq!(entries[0].project, None);
    }

    /// 前日から続くtime entryと計測中のtime entryは重なりとして取得できる。
    #[tokio::test]
    async fn test_read_overlapping_entries() {
        let file = write_document(DOCUMENT);
        let store = JsonEntryStore::new(file.path());

        let entries = store
            .read_overlapping_entries(
                &Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap(),
                &Utc.with_ymd_and_hms(2024, 1, 2, 9, 30, 0).unwrap(),
            )
            .await
            .unwrap();

        let ids: Vec<i64> = entries.iter().map(|entry| entry.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    /// 終了済みで範囲より前に終わったtime entryは含まない。
    #[tokio::test]
    async fn test_read_overlapping_entries_excludes_finished() {
        let file = write_document(DOCUMENT);
        let store = JsonEntryStore::new(file.path());

        let entries = store
            .read_overlapping_entries(
                &Utc.with_ymd_and_hms(2024, 1, 1, 17, 0, 0).unwrap(),
                &Utc.with_ymd_and_hms(2024, 1, 1, 18, 30, 0).unwrap(),
            )
            .await
            .unwrap();

        let ids: Vec<i64> = entries.iter().map(|entry| entry.id).collect();
        assert_eq!(ids, vec![2]);
    }

    #[tokio::test]
    async fn test_read_time_entries_empty_document() {
        let file = write_document("{}");
        let store = JsonEntryStore::new(file.path());

        let entries = store
            .read_time_entries(&Utc::now(), &Utc::now())
            .await
            .unwrap();

        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn test_read_time_entries_missing_file() {
        let store = JsonEntryStore::new("/nonexistent/timebill/entries.json");

        let result = store.read_time_entries(&Utc::now(), &Utc::now()).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_read_time_entries_invalid_json() {
        let file = write_document("[not json");
        let store = JsonEntryStore::new(file.path());

        let result = store.read_time_entries(&Utc::now(), &Utc::now()).await;

        assert!(result.is_err());
    }
}
