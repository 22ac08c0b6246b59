//! Keyed record tables for bookshelf.
//!
//! A [`Table`] assigns sequential identifiers to the rows inserted into it and
//! keeps them ordered by id. Tables either live purely in memory or are backed
//! by a JSON snapshot file that is rewritten after every mutation.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Identifier assigned by a [`Table`] on insert. Never reused after deletion.
pub type RecordId = u64;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("snapshot encoding error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("snapshot writer failed: {0}")]
    Writer(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Snapshot<T> {
    next_id: RecordId,
    rows: BTreeMap<RecordId, T>,
}

impl<T> Default for Snapshot<T> {
    fn default() -> Self {
        Self {
            next_id: 1,
            rows: BTreeMap::new(),
        }
    }
}

/// A collection of rows keyed by [`RecordId`].
pub struct Table<T> {
    state: RwLock<Snapshot<T>>,
    path: Option<PathBuf>,
}

impl<T> Table<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync,
{
    /// Create an empty table that is never written to disk.
    pub fn in_memory() -> Self {
        Self {
            state: RwLock::new(Snapshot::default()),
            path: None,
        }
    }

    /// Open a file-backed table, loading the existing snapshot if there is one.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, DbError> {
        let path = path.into();
        let snapshot = if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|source| DbError::Io {
                path: path.clone(),
                source,
            })?;
            serde_json::from_str(&content)?
        } else {
            Snapshot::default()
        };

        tracing::info!(
            target: "bookshelf-db",
            path = %path.display(),
            rows = snapshot.rows.len(),
            "opened table snapshot"
        );

        Ok(Self {
            state: RwLock::new(snapshot),
            path: Some(path),
        })
    }

    /// All rows in ascending id order.
    pub async fn all(&self) -> Vec<(RecordId, T)> {
        let state = self.state.read().await;
        state
            .rows
            .iter()
            .map(|(id, row)| (*id, row.clone()))
            .collect()
    }

    pub async fn get(&self, id: RecordId) -> Option<T> {
        self.state.read().await.rows.get(&id).cloned()
    }

    pub async fn contains(&self, id: RecordId) -> bool {
        self.state.read().await.rows.contains_key(&id)
    }

    /// First row, in id order, matching `predicate`.
    pub async fn find<F>(&self, predicate: F) -> Option<(RecordId, T)>
    where
        F: Fn(&T) -> bool,
    {
        let state = self.state.read().await;
        state
            .rows
            .iter()
            .find(|(_, row)| predicate(row))
            .map(|(id, row)| (*id, row.clone()))
    }

    /// Allocate the next id and store the row built from it.
    pub async fn insert_with<F>(&self, build: F) -> Result<(RecordId, T), DbError>
    where
        F: FnOnce(RecordId) -> T,
    {
        let mut state = self.state.write().await;
        let id = state.next_id;
        let row = build(id);

        state.next_id += 1;
        state.rows.insert(id, row.clone());

        if let Err(err) = self.persist(&state).await {
            state.rows.remove(&id);
            state.next_id = id;
            return Err(err);
        }

        Ok((id, row))
    }

    /// Insert or replace the row stored under `id`.
    pub async fn upsert(&self, id: RecordId, row: T) -> Result<(), DbError> {
        let mut state = self.state.write().await;
        let previous_next_id = state.next_id;
        let previous = state.rows.insert(id, row);
        if id >= state.next_id {
            state.next_id = id + 1;
        }

        if let Err(err) = self.persist(&state).await {
            match previous {
                Some(old) => state.rows.insert(id, old),
                None => state.rows.remove(&id),
            };
            state.next_id = previous_next_id;
            return Err(err);
        }

        Ok(())
    }

    /// Remove the row stored under `id`, returning it if it existed.
    pub async fn remove(&self, id: RecordId) -> Result<Option<T>, DbError> {
        let mut state = self.state.write().await;
        let Some(removed) = state.rows.remove(&id) else {
            return Ok(None);
        };

        if let Err(err) = self.persist(&state).await {
            state.rows.insert(id, removed);
            return Err(err);
        }

        Ok(Some(removed))
    }

    /// Encode the snapshot, then write it on the blocking pool. Callers hold
    /// the write guard across the whole call.
    async fn persist(&self, snapshot: &Snapshot<T>) -> Result<(), DbError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let content = serde_json::to_string_pretty(snapshot)?;
        let path = path.clone();
        tokio::task::spawn_blocking(move || write_snapshot(&path, &content)).await?
    }
}

/// Replace the snapshot at `path` via a sibling temp file and a rename.
fn write_snapshot(path: &Path, content: &str) -> Result<(), DbError> {
    let io_err = |source: std::io::Error| DbError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, content).map_err(io_err)?;
    std::fs::rename(&tmp, path).map_err(io_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Row {
        id: RecordId,
        name: String,
    }

    fn row(id: RecordId, name: &str) -> Row {
        Row {
            id,
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn ids_are_sequential_from_one() {
        let table = Table::in_memory();
        let (first, _) = table.insert_with(|id| row(id, "a")).await.unwrap();
        let (second, stored) = table.insert_with(|id| row(id, "b")).await.unwrap();

        assert_eq!(first, 1);
        assert_eq!(second, 2);
        assert_eq!(stored, row(2, "b"));
    }

    #[tokio::test]
    async fn deleted_ids_are_not_reused() {
        let table = Table::in_memory();
        table.insert_with(|id| row(id, "a")).await.unwrap();
        table.insert_with(|id| row(id, "b")).await.unwrap();
        assert_eq!(table.remove(2).await.unwrap(), Some(row(2, "b")));

        let (id, _) = table.insert_with(|id| row(id, "c")).await.unwrap();
        assert_eq!(id, 3);
    }

    #[tokio::test]
    async fn remove_missing_row_is_none() {
        let table: Table<Row> = Table::in_memory();
        assert_eq!(table.remove(42).await.unwrap(), None);
    }

    #[tokio::test]
    async fn all_is_ordered_by_id() {
        let table = Table::in_memory();
        table.upsert(5, row(5, "e")).await.unwrap();
        table.upsert(2, row(2, "b")).await.unwrap();
        table.insert_with(|id| row(id, "f")).await.unwrap();

        let ids: Vec<_> = table.all().await.into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![2, 5, 6]);
    }

    #[tokio::test]
    async fn find_returns_first_match() {
        let table = Table::in_memory();
        table.insert_with(|id| row(id, "dup")).await.unwrap();
        table.insert_with(|id| row(id, "dup")).await.unwrap();

        let (id, found) = table.find(|r| r.name == "dup").await.unwrap();
        assert_eq!(id, 1);
        assert_eq!(found.name, "dup");
        assert!(table.find(|r| r.name == "missing").await.is_none());
    }

    #[tokio::test]
    async fn snapshot_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("rows.json");

        {
            let table = Table::open(&path).unwrap();
            table.insert_with(|id| row(id, "a")).await.unwrap();
            table.insert_with(|id| row(id, "b")).await.unwrap();
            table.remove(1).await.unwrap();
        }

        let reopened: Table<Row> = Table::open(&path).unwrap();
        assert_eq!(reopened.all().await, vec![(2, row(2, "b"))]);
        assert!(!reopened.contains(1).await);

        let (id, _) = reopened.insert_with(|id| row(id, "c")).await.unwrap();
        assert_eq!(id, 3);
    }

    #[tokio::test]
    async fn failed_write_rolls_back_the_table() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "a file, not a directory").unwrap();

        let table: Table<Row> = Table::open(blocker.join("rows.json")).unwrap();
        let result = table.insert_with(|id| row(id, "a")).await;

        assert!(matches!(result, Err(DbError::Io { .. })));
        assert!(table.all().await.is_empty());

        std::fs::remove_file(&blocker).unwrap();
        let (id, _) = table.insert_with(|id| row(id, "a")).await.unwrap();
        assert_eq!(id, 1);
    }

    #[tokio::test]
    async fn corrupt_snapshot_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.json");
        std::fs::write(&path, "not json").unwrap();

        let result: Result<Table<Row>, _> = Table::open(&path);
        assert!(matches!(result, Err(DbError::Json(_))));
    }
}
