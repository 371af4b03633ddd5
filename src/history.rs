//! Historial de consultas ejecutadas.
//!
//! Lista acotada (las más recientes primero) con expulsión FIFO al superar la
//! capacidad. Cargar una entrada no la "refresca": sólo crear entradas cambia
//! el orden. Además se guarda un puntero a la última consulta ejecutada para
//! precargarla al abrir el constructor de consultas.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{PathQueryError, PathQueryResult};
use crate::models::{QueryConfig, QueryHistoryEntry};

pub const DEFAULT_CAPACITY: usize = 20;

pub trait HistoryStore: Send + Sync {
    fn record(&self, config: &QueryConfig, result_count: usize) -> PathQueryResult<QueryHistoryEntry>;
    /// Entradas de la más reciente a la más antigua.
    fn list(&self) -> PathQueryResult<Vec<QueryHistoryEntry>>;
    fn remove(&self, id: &str) -> PathQueryResult<()>;
    fn load(&self, id: &str) -> PathQueryResult<QueryConfig>;
    /// Última consulta ejecutada, si sigue en el historial.
    fn latest(&self) -> PathQueryResult<Option<QueryHistoryEntry>>;
}

/// Documento persistido del historial.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryLog {
    pub entries: Vec<QueryHistoryEntry>,
    pub last_executed: Option<String>,
}

impl HistoryLog {
    fn push(&mut self, config: &QueryConfig, result_count: usize, capacity: usize) -> QueryHistoryEntry {
        let entry = QueryHistoryEntry {
            id: Uuid::new_v4().to_string(),
            name: config.display_name(),
            config: config.clone(),
            timestamp: Utc::now(),
            result_count,
        };
        self.entries.insert(0, entry.clone());
        self.entries.truncate(capacity);
        self.last_executed = Some(entry.id.clone());
        entry
    }

    fn remove(&mut self, id: &str) -> PathQueryResult<()> {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        if self.entries.len() == before {
            return Err(PathQueryError::HistoryEntryNotFound(id.to_string()));
        }
        if self.last_executed.as_deref() == Some(id) {
            self.last_executed = None;
        }
        Ok(())
    }

    fn find(&self, id: &str) -> PathQueryResult<&QueryHistoryEntry> {
        self.entries
            .iter()
            .find(|e| e.id == id)
            .ok_or_else(|| PathQueryError::HistoryEntryNotFound(id.to_string()))
    }

    fn latest(&self) -> Option<QueryHistoryEntry> {
        let id = self.last_executed.as_deref()?;
        self.entries.iter().find(|e| e.id == id).cloned()
    }
}

fn lock(log: &Mutex<HistoryLog>) -> PathQueryResult<MutexGuard<'_, HistoryLog>> {
    log.lock()
        .map_err(|_| PathQueryError::Storage("el historial quedó envenenado".to_string()))
}

/// Historial persistido en un fichero JSON.
///
/// Cada escritura (añadir, expulsar y guardar) ocurre bajo el mismo mutex,
/// así que dos consultas concurrentes nunca superan la capacidad.
pub struct FileHistoryStore {
    path: PathBuf,
    capacity: usize,
    log: Mutex<HistoryLog>,
}

impl FileHistoryStore {
    pub fn open(path: impl Into<PathBuf>, capacity: usize) -> PathQueryResult<Self> {
        let path = path.into();
        let capacity = capacity.max(1);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut log = read_log(&path);
        log.entries.truncate(capacity);
        info!(
            "Historial cargado desde {} ({} entradas)",
            path.display(),
            log.entries.len()
        );

        Ok(Self {
            path,
            capacity,
            log: Mutex::new(log),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, log: &HistoryLog) -> PathQueryResult<()> {
        let bytes = serde_json::to_vec_pretty(log)
            .map_err(|e| PathQueryError::Storage(e.to_string()))?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

fn read_log(path: &Path) -> HistoryLog {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return HistoryLog::default(),
        Err(e) => {
            warn!(
                "No se pudo leer el historial en {}: {}. Se empieza vacío.",
                path.display(),
                e
            );
            return HistoryLog::default();
        }
    };
    match serde_json::from_str(&contents) {
        Ok(log) => log,
        Err(e) => {
            warn!(
                "Historial ilegible en {}: {}. Se empieza vacío.",
                path.display(),
                e
            );
            HistoryLog::default()
        }
    }
}

impl HistoryStore for FileHistoryStore {
    fn record(&self, config: &QueryConfig, result_count: usize) -> PathQueryResult<QueryHistoryEntry> {
        let mut log = lock(&self.log)?;
        let mut next = log.clone();
        let entry = next.push(config, result_count, self.capacity);
        self.persist(&next)?;
        *log = next;
        Ok(entry)
    }

    fn list(&self) -> PathQueryResult<Vec<QueryHistoryEntry>> {
        Ok(lock(&self.log)?.entries.clone())
    }

    fn remove(&self, id: &str) -> PathQueryResult<()> {
        let mut log = lock(&self.log)?;
        let mut next = log.clone();
        next.remove(id)?;
        self.persist(&next)?;
        *log = next;
        Ok(())
    }

    fn load(&self, id: &str) -> PathQueryResult<QueryConfig> {
        Ok(lock(&self.log)?.find(id)?.config.clone())
    }

    fn latest(&self) -> PathQueryResult<Option<QueryHistoryEntry>> {
        Ok(lock(&self.log)?.latest())
    }
}

/// Historial en memoria para tests.
#[cfg(test)]
pub struct MemoryHistoryStore {
    capacity: usize,
    log: Mutex<HistoryLog>,
}

#[cfg(test)]
impl MemoryHistoryStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            log: Mutex::new(HistoryLog::default()),
        }
    }
}

#[cfg(test)]
impl HistoryStore for MemoryHistoryStore {
    fn record(&self, config: &QueryConfig, result_count: usize) -> PathQueryResult<QueryHistoryEntry> {
        Ok(lock(&self.log)?.push(config, result_count, self.capacity))
    }

    fn list(&self) -> PathQueryResult<Vec<QueryHistoryEntry>> {
        Ok(lock(&self.log)?.entries.clone())
    }

    fn remove(&self, id: &str) -> PathQueryResult<()> {
        lock(&self.log)?.remove(id)
    }

    fn load(&self, id: &str) -> PathQueryResult<QueryConfig> {
        Ok(lock(&self.log)?.find(id)?.config.clone())
    }

    fn latest(&self) -> PathQueryResult<Option<QueryHistoryEntry>> {
        Ok(lock(&self.log)?.latest())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Domain;
    use std::collections::BTreeSet;
    use std::sync::Arc;

    fn config(start: &str, hops: u32) -> QueryConfig {
        QueryConfig {
            start_entity_type: start.to_string(),
            start_entity_id: None,
            end_entity_type: "Approval".to_string(),
            end_entity_id: None,
            max_hops: hops,
            relationship_types: BTreeSet::new(),
            selected_domains: BTreeSet::new(),
        }
    }

    #[test]
    fn capacity_evicts_oldest_entries() {
        let store = MemoryHistoryStore::new(DEFAULT_CAPACITY);
        let ids: Vec<String> = (0..25)
            .map(|i| store.record(&config(&format!("Type{i}"), 3), i).unwrap().id)
            .collect();

        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 20);
        for evicted in &ids[..5] {
            assert!(listed.iter().all(|e| &e.id != evicted));
        }
        assert_eq!(listed[0].id, ids[24]);
        assert_eq!(listed[19].id, ids[5]);
    }

    #[test]
    fn load_returns_recorded_config_with_empty_sets() {
        let store = MemoryHistoryStore::new(DEFAULT_CAPACITY);
        let original = config("Compound", 3);
        let entry = store.record(&original, 3).unwrap();

        assert_eq!(store.load(&entry.id).unwrap(), original);
        assert_eq!(entry.name, "Compound → Approval");
        assert_eq!(entry.result_count, 3);
    }

    #[test]
    fn loading_does_not_reorder() {
        let store = MemoryHistoryStore::new(DEFAULT_CAPACITY);
        let first = store.record(&config("Compound", 1), 0).unwrap();
        let second = store.record(&config("Target", 2), 0).unwrap();

        store.load(&first.id).unwrap();
        let order: Vec<_> = store.list().unwrap().into_iter().map(|e| e.id).collect();
        assert_eq!(order, vec![second.id, first.id]);
    }

    #[test]
    fn remove_and_missing_ids() {
        let store = MemoryHistoryStore::new(DEFAULT_CAPACITY);
        let entry = store.record(&config("Compound", 3), 1).unwrap();

        assert_eq!(store.latest().unwrap().map(|e| e.id), Some(entry.id.clone()));
        store.remove(&entry.id).unwrap();
        assert!(store.list().unwrap().is_empty());
        assert!(store.latest().unwrap().is_none());
        assert!(matches!(
            store.remove(&entry.id),
            Err(PathQueryError::HistoryEntryNotFound(_))
        ));
        assert!(matches!(
            store.load(&entry.id),
            Err(PathQueryError::HistoryEntryNotFound(_))
        ));
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("query_history.json");

        let mut full = config("Compound", 4);
        full.start_entity_id = Some("CHEMBL25".into());
        full.relationship_types = ["SUBMITTED_TO".to_string()].into_iter().collect();
        full.selected_domains = [Domain::Clinical, Domain::Regulatory].into_iter().collect();
        let empty = config("Target", 2);

        let (full_id, empty_id) = {
            let store = FileHistoryStore::open(&path, DEFAULT_CAPACITY).unwrap();
            let a = store.record(&full, 7).unwrap();
            let b = store.record(&empty, 0).unwrap();
            (a.id, b.id)
        };

        let reopened = FileHistoryStore::open(&path, DEFAULT_CAPACITY).unwrap();
        assert_eq!(reopened.load(&full_id).unwrap(), full);
        assert_eq!(reopened.load(&empty_id).unwrap(), empty);
        assert_eq!(reopened.list().unwrap().len(), 2);
        assert_eq!(reopened.latest().unwrap().map(|e| e.id), Some(empty_id));

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"relationshipTypes\": []"));
    }

    #[test]
    fn failed_write_leaves_log_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("query_history.json");
        let store = FileHistoryStore::open(&path, DEFAULT_CAPACITY).unwrap();
        let kept = store.record(&config("Compound", 3), 1).unwrap();

        // Un directorio en la ruta temporal hace fallar la escritura.
        fs::create_dir(path.with_extension("json.tmp")).unwrap();

        assert!(store.record(&config("Target", 2), 4).is_err());
        assert!(store.remove(&kept.id).is_err());

        let entries = store.list().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, kept.id);
        assert_eq!(store.latest().unwrap().unwrap().id, kept.id);

        let on_disk = FileHistoryStore::open(&path, DEFAULT_CAPACITY).unwrap();
        assert_eq!(on_disk.list().unwrap(), entries);
    }

    #[test]
    fn unreadable_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("query_history.json");
        fs::write(&path, [0xff, 0xfe, 0x00, 0x9f]).unwrap();

        let store = FileHistoryStore::open(&path, DEFAULT_CAPACITY).unwrap();
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("query_history.json");
        fs::write(&path, "{ not json").unwrap();

        let store = FileHistoryStore::open(&path, DEFAULT_CAPACITY).unwrap();
        assert!(store.list().unwrap().is_empty());
        store.record(&config("Compound", 3), 0).unwrap();
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn concurrent_records_respect_capacity() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(
            FileHistoryStore::open(dir.path().join("query_history.json"), 5).unwrap(),
        );

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for j in 0..5 {
                        store.record(&config(&format!("T{i}_{j}"), 2), j).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.list().unwrap().len(), 5);
        let reopened = FileHistoryStore::open(store.path(), 5).unwrap();
        assert_eq!(reopened.list().unwrap().len(), 5);
    }
}
