//! Visa operations over a `DocumentStore`: one method per HTTP endpoint.
use bson::Document as BsonDocument;
use std::sync::Arc;

use crate::document::strip_id;
use crate::errors::DbError;
use crate::logger::log_audit;
use crate::query::{DeleteReport, InsertReport, UpdateReport};
use crate::store::DocumentStore;
use crate::visa::{self, APPLIED_VISA_COLLECTION, VISA_COLLECTION, VisaListQuery};

#[derive(Clone)]
pub struct VisaService {
    store: Arc<dyn DocumentStore>,
}

impl VisaService {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Store a new visa. Any caller-supplied `_id` is discarded.
    ///
    /// # Errors
    /// Propagates store failures.
    pub async fn add_visa(&self, visa: BsonDocument) -> Result<InsertReport, DbError> {
        self.insert(VISA_COLLECTION, visa).await
    }

    /// Visas matching the optional type, country-name search and fee sort.
    ///
    /// # Errors
    /// Propagates store failures.
    pub async fn get_visas(&self, query: &VisaListQuery) -> Result<Vec<BsonDocument>, DbError> {
        let spec = visa::list_visas(query);
        self.store.find(VISA_COLLECTION, &spec.filter, &spec.options).await
    }

    /// # Errors
    /// Propagates store failures.
    pub async fn latest_visas(&self) -> Result<Vec<BsonDocument>, DbError> {
        let spec = visa::latest();
        self.store.find(VISA_COLLECTION, &spec.filter, &spec.options).await
    }

    /// # Errors
    /// `DbError::InvalidDocumentId` for a malformed id, otherwise store failures.
    pub async fn visa_details(&self, id: &str) -> Result<Option<BsonDocument>, DbError> {
        let filter = visa::by_id(id)?;
        self.store.find_one(VISA_COLLECTION, &filter).await
    }

    /// # Errors
    /// Propagates store failures.
    pub async fn my_added_visas(&self, email: Option<&str>) -> Result<Vec<BsonDocument>, DbError> {
        self.store.find(VISA_COLLECTION, &visa::owner(email), &Default::default()).await
    }

    /// Overwrite the ten mutable fields of one visa.
    ///
    /// # Errors
    /// `DbError::InvalidDocumentId` for a malformed id, otherwise store failures.
    pub async fn update_visa(&self, id: &str, payload: &BsonDocument) -> Result<UpdateReport, DbError> {
        let filter = visa::by_id(id)?;
        let update = visa::project_update(payload);
        let report = self.store.update_one(VISA_COLLECTION, &filter, &update).await?;
        let detail = format!("matched={} modified={}", report.matched, report.modified);
        log_audit("update", VISA_COLLECTION, id, Some(&detail));
        Ok(report)
    }

    /// # Errors
    /// `DbError::InvalidDocumentId` for a malformed id, otherwise store failures.
    pub async fn delete_visa(&self, id: &str) -> Result<DeleteReport, DbError> {
        self.delete(VISA_COLLECTION, id).await
    }

    /// Record an application. The body is stored as given, minus any `_id`.
    ///
    /// # Errors
    /// Propagates store failures.
    pub async fn add_applied_visa(&self, application: BsonDocument) -> Result<InsertReport, DbError> {
        self.insert(APPLIED_VISA_COLLECTION, application).await
    }

    /// # Errors
    /// Propagates store failures.
    pub async fn applied_visas(&self, email: Option<&str>) -> Result<Vec<BsonDocument>, DbError> {
        self.store.find(APPLIED_VISA_COLLECTION, &visa::owner(email), &Default::default()).await
    }

    /// # Errors
    /// `DbError::InvalidDocumentId` for a malformed id, otherwise store failures.
    pub async fn delete_applied_visa(&self, id: &str) -> Result<DeleteReport, DbError> {
        self.delete(APPLIED_VISA_COLLECTION, id).await
    }

    async fn insert(&self, collection: &str, document: BsonDocument) -> Result<InsertReport, DbError> {
        let report = self.store.insert_one(collection, strip_id(document)).await?;
        log_audit("insert", collection, &report.inserted_id.to_hex(), None);
        Ok(report)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<DeleteReport, DbError> {
        let filter = visa::by_id(id)?;
        let report = self.store.delete_one(collection, &filter).await?;
        let detail = format!("deleted={}", report.deleted);
        log_audit("delete", collection, id, Some(&detail));
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use bson::{Bson, doc};

    fn service() -> (VisaService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (VisaService::new(store.clone()), store)
    }

    #[tokio::test]
    async fn caller_supplied_id_is_ignored() {
        let (svc, _) = service();
        let fake = bson::oid::ObjectId::new();
        let report = svc.add_visa(doc! { "_id": fake, "countryName": "Peru" }).await.unwrap();
        assert_ne!(report.inserted_id.0, fake);
        let stored = svc.visa_details(&report.inserted_id.to_hex()).await.unwrap().unwrap();
        assert_eq!(stored.get_object_id("_id").unwrap(), report.inserted_id.0);
    }

    #[tokio::test]
    async fn collections_are_separate() {
        let (svc, store) = service();
        svc.add_visa(doc! { "email": "a@x.io" }).await.unwrap();
        svc.add_applied_visa(doc! { "email": "a@x.io", "visaType": "Student" }).await.unwrap();
        assert_eq!(store.count("Visas"), 1);
        assert_eq!(store.count("appliedVisas"), 1);
        let applied = svc.applied_visas(Some("a@x.io")).await.unwrap();
        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0].get_str("visaType").unwrap(), "Student");
    }

    #[tokio::test]
    async fn update_keeps_owner_and_nulls_missing() {
        let (svc, _) = service();
        let id = svc
            .add_visa(doc! { "countryName": "Chile", "fee": 10, "email": "o@x.io" })
            .await
            .unwrap()
            .inserted_id
            .to_hex();
        let report = svc.update_visa(&id, &doc! { "fee": 20, "email": "evil@x.io" }).await.unwrap();
        assert_eq!(report, UpdateReport { matched: 1, modified: 1 });
        let stored = svc.visa_details(&id).await.unwrap().unwrap();
        assert_eq!(stored.get_str("email").unwrap(), "o@x.io");
        assert_eq!(stored.get("fee"), Some(&Bson::Int32(20)));
        assert_eq!(stored.get("countryName"), Some(&Bson::Null));
    }

    #[tokio::test]
    async fn malformed_ids_are_client_errors() {
        let (svc, _) = service();
        let err = svc.visa_details("not-an-id").await.unwrap_err();
        assert!(err.is_client_error());
        assert!(svc.delete_applied_visa("zz").await.unwrap_err().is_client_error());
        assert!(svc.update_visa("", &doc! {}).await.unwrap_err().is_client_error());
    }
}
