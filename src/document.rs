//! Conversions between request/response JSON and stored BSON documents.
use crate::errors::DbError;
use crate::types::{DocumentId, ID_FIELD};
use bson::{Bson, Document as BsonDocument};
use serde_json::{Map, Value};

/// Convert a JSON object into a `bson::Document`, keeping every key and value
/// as given. `$`-prefixed keys are stored literally, not read as extended JSON.
///
/// # Errors
/// Returns `DbError::Bson` if a value cannot be represented in BSON
/// (an unsigned integer above `i64::MAX`).
pub fn from_json(obj: &Map<String, Value>) -> Result<BsonDocument, DbError> {
    Ok(bson::to_document(obj)?)
}

/// Render a stored document as JSON, with ObjectIds as hex strings and dates as RFC 3339.
#[must_use]
pub fn to_json(doc: &BsonDocument) -> Value {
    Value::Object(doc.iter().map(|(k, v)| (k.clone(), bson_to_json(v))).collect())
}

fn bson_to_json(v: &Bson) -> Value {
    match v {
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::DateTime(dt) => dt
            .try_to_rfc3339_string()
            .map_or_else(|_| Value::from(dt.timestamp_millis()), Value::String),
        Bson::Document(d) => to_json(d),
        Bson::Array(items) => Value::Array(items.iter().map(bson_to_json).collect()),
        other => other.clone().into_relaxed_extjson(),
    }
}

/// Drop any caller-supplied `_id`; ids are always assigned by the store.
#[must_use]
pub fn strip_id(mut doc: BsonDocument) -> BsonDocument {
    doc.remove(ID_FIELD);
    doc
}

/// Build the stored form of a new document: `_id` first, then the caller's fields.
#[must_use]
pub fn with_id(id: DocumentId, doc: BsonDocument) -> BsonDocument {
    let mut out = BsonDocument::new();
    out.insert(ID_FIELD, Bson::from(id));
    for (k, v) in doc {
        if k != ID_FIELD {
            out.insert(k, v);
        }
    }
    out
}
