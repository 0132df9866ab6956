//! Document store capability used by the service, with MongoDB and in-memory backends.
mod memory;
mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

use async_trait::async_trait;
use bson::Document as BsonDocument;
use std::sync::Arc;

use crate::config::{Config, StoreKind};
use crate::errors::DbError;
use crate::query::{DeleteReport, Filter, FindOptions, InsertReport, UpdateDoc, UpdateReport};

/// The operations the service needs from a document database.
///
/// Implementations own id assignment: `insert_one` always stores the document
/// under a fresh id and reports it.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Short backend name for logs.
    fn backend(&self) -> &'static str;

    async fn ping(&self) -> Result<(), DbError>;

    async fn insert_one(
        &self,
        collection: &str,
        document: BsonDocument,
    ) -> Result<InsertReport, DbError>;

    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        opts: &FindOptions,
    ) -> Result<Vec<BsonDocument>, DbError>;

    async fn find_one(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> Result<Option<BsonDocument>, DbError>;

    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        update: &UpdateDoc,
    ) -> Result<UpdateReport, DbError>;

    async fn delete_one(&self, collection: &str, filter: &Filter) -> Result<DeleteReport, DbError>;
}

/// Open the store selected by `cfg`.
///
/// # Errors
/// Returns an error if Mongo credentials are missing or the client cannot be built.
pub async fn connect(cfg: &Config) -> Result<Arc<dyn DocumentStore>, Box<dyn std::error::Error>> {
    match cfg.store {
        StoreKind::Memory => Ok(Arc::new(MemoryStore::new())),
        StoreKind::Mongo => {
            let uri = cfg.connection_uri()?;
            let store = MongoStore::connect(&uri, &cfg.db_name).await?;
            Ok(Arc::new(store))
        }
    }
}
