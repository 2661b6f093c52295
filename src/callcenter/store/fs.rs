use super::memory::apply_batch;
use super::{query, Document, DocumentId, DocumentStore, Fields, Query, Write, WriteBatch};
use crate::error::{CallCenterError, Result};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

type Collection = BTreeMap<DocumentId, Fields>;

pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn collection_path(&self, collection: &str) -> PathBuf {
        self.root.join(format!("{}.json", collection))
    }

    fn ensure_dir(&self) -> Result<()> {
        if !self.root.exists() {
            fs::create_dir_all(&self.root).map_err(CallCenterError::Io)?;
        }
        Ok(())
    }

    fn load_collection(&self, collection: &str) -> Result<Collection> {
        let path = self.collection_path(collection);
        if !path.exists() {
            return Ok(Collection::new());
        }
        let content = fs::read_to_string(&path).map_err(CallCenterError::Io)?;
        if content.trim().is_empty() {
            return Ok(Collection::new());
        }
        serde_json::from_str(&content).map_err(|e| {
            CallCenterError::Store(format!("Corrupt collection file {}: {}", path.display(), e))
        })
    }

    /// Write through a temporary file so readers never see a half-written collection.
    fn save_collection(&self, collection: &str, docs: &Collection) -> Result<()> {
        let path = self.collection_path(collection);
        let tmp = self.root.join(format!(".{}.json.tmp", collection));
        let content = serde_json::to_string_pretty(docs).map_err(CallCenterError::Serialization)?;
        fs::write(&tmp, content).map_err(CallCenterError::Io)?;
        fs::rename(&tmp, &path).map_err(CallCenterError::Io)?;
        Ok(())
    }
}

impl DocumentStore for FileStore {
    fn add(&mut self, collection: &str, fields: Fields) -> Result<DocumentId> {
        let id = DocumentId::generate();
        self.commit(WriteBatch::new().set(collection, id.clone(), fields))?;
        Ok(id)
    }

    fn get(&self, collection: &str, id: &DocumentId) -> Result<Option<Document>> {
        let docs = self.load_collection(collection)?;
        Ok(docs
            .get(id)
            .map(|fields| Document::new(id.clone(), fields.clone())))
    }

    fn query(&self, query: &Query) -> Result<Vec<Document>> {
        let docs = self.load_collection(&query.collection)?;
        let matched = query::execute(&docs, query);
        debug!(collection = %query.collection, scanned = docs.len(), matched = matched.len(), "query");
        Ok(matched)
    }

    fn commit(&mut self, batch: WriteBatch) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        self.ensure_dir()?;

        // 1. Load every collection the batch touches
        let mut loaded: HashMap<String, Collection> = HashMap::new();
        for write in batch.writes() {
            let name = match write {
                Write::Set { collection, .. } | Write::Update { collection, .. } => collection,
            };
            if !loaded.contains_key(name) {
                loaded.insert(name.clone(), self.load_collection(name)?);
            }
        }

        // 2. Apply in memory; nothing is written if any update misses
        let staged = apply_batch(&loaded, batch)?;

        // 3. Persist
        debug!(collections = staged.len(), "committing batch");
        for (name, docs) in &staged {
            self.save_collection(name, docs)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::patch;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn documents_persist_across_instances() {
        let dir = tempdir().unwrap();
        let mut store = FileStore::new(dir.path().to_path_buf());
        let id = store
            .add("Tickets", patch([("TicketNumber", json!("X9"))]))
            .unwrap();

        let reopened = FileStore::new(dir.path().to_path_buf());
        let doc = reopened.get("Tickets", &id).unwrap().unwrap();
        assert_eq!(doc.get("TicketNumber"), Some(&json!("X9")));
        assert!(dir.path().join("Tickets.json").exists());
    }

    #[test]
    fn missing_collection_reads_as_empty() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().join("not-yet"));
        assert!(store.query(&Query::collection("Jobs")).unwrap().is_empty());
        assert_eq!(store.count(&Query::collection("Jobs")).unwrap(), 0);
    }

    #[test]
    fn failed_batch_leaves_files_untouched() {
        let dir = tempdir().unwrap();
        let mut store = FileStore::new(dir.path().to_path_buf());
        let id = store
            .add("Tickets", patch([("TicketStatus", json!("Closed"))]))
            .unwrap();

        let batch = WriteBatch::new()
            .update("Tickets", id.clone(), patch([("TicketStatus", json!("Recalled"))]))
            .update("Jobs", DocumentId::from("nope"), patch([("Status", json!("x"))]));
        assert!(store.commit(batch).is_err());

        let doc = store.get("Tickets", &id).unwrap().unwrap();
        assert_eq!(doc.get("TicketStatus"), Some(&json!("Closed")));
        assert!(!dir.path().join("Jobs.json").exists());
    }

    #[test]
    fn corrupt_file_is_a_store_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("Tickets.json"), "{not json").unwrap();
        let store = FileStore::new(dir.path().to_path_buf());
        let err = store.query(&Query::collection("Tickets")).unwrap_err();
        assert!(matches!(err, CallCenterError::Store(_)));
    }
}
