use async_trait::async_trait;
use bson::{Bson, Document as BsonDocument};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};

use super::DocumentStore;
use crate::document::with_id;
use crate::errors::DbError;
use crate::query::{
    DeleteReport, Filter, FindOptions, InsertReport, UpdateDoc, UpdateReport, apply_update,
    eval_filter, select,
};
use crate::types::{CollectionName, DocumentId, ID_FIELD};

/// In-process document store.
///
/// Collections are created on first insert. Documents are kept in insertion
/// sequence, so natural order never depends on ObjectId byte order (the id
/// counter starts at a random value and can wrap). Sorting on `_id` still
/// compares ObjectIds, as MongoDB does. Every operation takes the collection
/// map lock for its own duration only.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<CollectionName, Collection>>,
}

#[derive(Debug, Default)]
struct Collection {
    docs: BTreeMap<u64, BsonDocument>,
    ids: HashMap<DocumentId, u64>,
    next_seq: u64,
}

impl Collection {
    fn first_match(&self, filter: &Filter) -> Option<u64> {
        // Id lookups skip the scan.
        if let Filter::Eq { path, value: Bson::ObjectId(oid) } = filter
            && path == ID_FIELD
        {
            return self.ids.get(&DocumentId(*oid)).copied();
        }
        self.docs.iter().find(|(_, d)| eval_filter(d, filter)).map(|(seq, _)| *seq)
    }

    fn insert(&mut self, id: DocumentId, doc: BsonDocument) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.docs.insert(seq, doc);
        self.ids.insert(id, seq);
    }

    fn remove(&mut self, seq: u64) -> Option<BsonDocument> {
        let doc = self.docs.remove(&seq)?;
        if let Ok(oid) = doc.get_object_id(ID_FIELD) {
            self.ids.remove(&DocumentId(oid));
        }
        Some(doc)
    }
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently stored in `collection`.
    pub fn count(&self, collection: &str) -> usize {
        self.collections.read().get(collection).map_or(0, |c| c.docs.len())
    }

    fn insert_sync(&self, collection: &str, document: BsonDocument) -> InsertReport {
        let id = DocumentId::new();
        let mut cols = self.collections.write();
        cols.entry(collection.to_string()).or_default().insert(id, with_id(id, document));
        InsertReport { inserted_id: id }
    }

    fn find_sync(&self, collection: &str, filter: &Filter, opts: &FindOptions) -> Vec<BsonDocument> {
        let cols = self.collections.read();
        cols.get(collection).map(|c| select(c.docs.values(), filter, opts)).unwrap_or_default()
    }

    fn find_one_sync(&self, collection: &str, filter: &Filter) -> Option<BsonDocument> {
        let cols = self.collections.read();
        let col = cols.get(collection)?;
        col.first_match(filter).and_then(|seq| col.docs.get(&seq).cloned())
    }

    fn update_one_sync(&self, collection: &str, filter: &Filter, update: &UpdateDoc) -> UpdateReport {
        let mut cols = self.collections.write();
        let Some(col) = cols.get_mut(collection) else {
            return UpdateReport::default();
        };
        let Some(seq) = col.first_match(filter) else {
            return UpdateReport::default();
        };
        let Some(doc) = col.docs.get_mut(&seq) else {
            return UpdateReport::default();
        };
        // The id is immutable; never let a set-fields update touch it.
        let update = UpdateDoc {
            set: update.set.iter().filter(|(k, _)| k != ID_FIELD).cloned().collect(),
        };
        let changed = apply_update(doc, &update);
        UpdateReport { matched: 1, modified: u64::from(changed) }
    }

    fn delete_one_sync(&self, collection: &str, filter: &Filter) -> DeleteReport {
        let mut cols = self.collections.write();
        let Some(col) = cols.get_mut(collection) else {
            return DeleteReport::default();
        };
        let deleted = col.first_match(filter).and_then(|seq| col.remove(seq)).is_some();
        DeleteReport { deleted: u64::from(deleted) }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> Result<(), DbError> {
        Ok(())
    }

    async fn insert_one(
        &self,
        collection: &str,
        document: BsonDocument,
    ) -> Result<InsertReport, DbError> {
        Ok(self.insert_sync(collection, document))
    }

    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        opts: &FindOptions,
    ) -> Result<Vec<BsonDocument>, DbError> {
        Ok(self.find_sync(collection, filter, opts))
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> Result<Option<BsonDocument>, DbError> {
        Ok(self.find_one_sync(collection, filter))
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        update: &UpdateDoc,
    ) -> Result<UpdateReport, DbError> {
        Ok(self.update_one_sync(collection, filter, update))
    }

    async fn delete_one(&self, collection: &str, filter: &Filter) -> Result<DeleteReport, DbError> {
        Ok(self.delete_one_sync(collection, filter))
    }
}
