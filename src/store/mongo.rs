use async_trait::async_trait;
use bson::{Document as BsonDocument, doc};
use mongodb::action::Find;
use mongodb::options::{ClientOptions, ServerApi, ServerApiVersion};
use mongodb::{Client, Collection, Database};

use super::DocumentStore;
use crate::errors::DbError;
use crate::query::{DeleteReport, Filter, FindOptions, InsertReport, UpdateDoc, UpdateReport};
use crate::types::DocumentId;

impl From<mongodb::error::Error> for DbError {
    fn from(e: mongodb::error::Error) -> Self {
        Self::StoreUnavailable(e.to_string())
    }
}

/// MongoDB-backed store. One client per process; the driver owns pooling.
pub struct MongoStore {
    client: Client,
    db: Database,
}

impl MongoStore {
    /// Build a client for `uri` using the Stable API (v1, strict) and select `db_name`.
    ///
    /// The driver connects lazily, so this succeeds without a reachable server
    /// as long as the URI parses and (for `mongodb+srv`) resolves.
    ///
    /// # Errors
    /// Returns `DbError::StoreUnavailable` if the URI is invalid or cannot be resolved.
    pub async fn connect(uri: &str, db_name: &str) -> Result<Self, DbError> {
        let mut options = ClientOptions::parse(uri).await?;
        options.server_api = Some(
            ServerApi::builder()
                .version(ServerApiVersion::V1)
                .strict(true)
                .deprecation_errors(true)
                .build(),
        );
        let client = Client::with_options(options)?;
        let db = client.database(db_name);
        Ok(Self { client, db })
    }

    fn collection(&self, name: &str) -> Collection<BsonDocument> {
        self.db.collection::<BsonDocument>(name)
    }
}

fn find_action<'a>(
    coll: &'a Collection<BsonDocument>,
    filter: &Filter,
    opts: &FindOptions,
) -> Find<'a, BsonDocument> {
    let mut action = coll.find(filter.to_document());
    if let Some(sort) = opts.sort_document() {
        action = action.sort(sort);
    }
    if let Some(limit) = opts.limit {
        action = action.limit(i64::try_from(limit).unwrap_or(i64::MAX));
    }
    action
}

#[async_trait]
impl DocumentStore for MongoStore {
    fn backend(&self) -> &'static str {
        "mongodb"
    }

    async fn ping(&self) -> Result<(), DbError> {
        self.client.database("admin").run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }

    async fn insert_one(
        &self,
        collection: &str,
        document: BsonDocument,
    ) -> Result<InsertReport, DbError> {
        let res = self.collection(collection).insert_one(document).await?;
        let oid = res
            .inserted_id
            .as_object_id()
            .ok_or_else(|| DbError::QueryError(format!("non-ObjectId _id: {}", res.inserted_id)))?;
        Ok(InsertReport { inserted_id: DocumentId(oid) })
    }

    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        opts: &FindOptions,
    ) -> Result<Vec<BsonDocument>, DbError> {
        let coll = self.collection(collection);
        let mut cursor = find_action(&coll, filter, opts).await?;
        let mut out = Vec::new();
        while cursor.advance().await? {
            out.push(cursor.deserialize_current()?);
        }
        Ok(out)
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> Result<Option<BsonDocument>, DbError> {
        Ok(self.collection(collection).find_one(filter.to_document()).await?)
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        update: &UpdateDoc,
    ) -> Result<UpdateReport, DbError> {
        let res =
            self.collection(collection).update_one(filter.to_document(), update.to_document()).await?;
        Ok(UpdateReport { matched: res.matched_count, modified: res.modified_count })
    }

    async fn delete_one(&self, collection: &str, filter: &Filter) -> Result<DeleteReport, DbError> {
        let res = self.collection(collection).delete_one(filter.to_document()).await?;
        Ok(DeleteReport { deleted: res.deleted_count })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{Order, SortSpec};

    // A plain mongodb:// URI needs no DNS, and the driver connects lazily.
    async fn local() -> MongoStore {
        MongoStore::connect("mongodb://127.0.0.1:27017", "VisaDB").await.unwrap()
    }

    #[tokio::test]
    async fn connect_builds_a_lazy_client() {
        let store = local().await;
        assert_eq!(store.backend(), "mongodb");
        assert_eq!(store.db.name(), "VisaDB");
    }

    #[tokio::test]
    async fn connect_rejects_malformed_uri() {
        let err = MongoStore::connect("not-a-uri", "VisaDB").await.err().unwrap();
        assert!(matches!(err, DbError::StoreUnavailable(_)));
    }

    #[tokio::test]
    async fn find_action_builds_with_sort_and_limit() {
        let store = local().await;
        let coll = store.collection("Visas");
        let opts = FindOptions {
            sort: Some(vec![SortSpec { field: "_id".into(), order: Order::Desc }]),
            limit: Some(8),
        };
        let _latest = find_action(&coll, &Filter::True, &opts);
        let _all = find_action(&coll, &Filter::True, &FindOptions::default());
        assert_eq!(coll.name(), "Visas");
    }
}
