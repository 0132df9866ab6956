//! Rendering of store-neutral queries into MongoDB command documents.
use bson::{Bson, Document as BsonDocument, doc};

use super::types::{Filter, FindOptions, Order, UpdateDoc};

impl Filter {
    /// The MongoDB filter document equivalent to this predicate.
    #[must_use]
    pub fn to_document(&self) -> BsonDocument {
        match self {
            Self::True => BsonDocument::new(),
            Self::And(fs) => match fs.as_slice() {
                [] => BsonDocument::new(),
                [only] => only.to_document(),
                many => {
                    let parts: Vec<Bson> =
                        many.iter().map(|f| Bson::Document(f.to_document())).collect();
                    doc! { "$and": parts }
                }
            },
            Self::Eq { path, value } => {
                let mut d = BsonDocument::new();
                d.insert(path.clone(), value.clone());
                d
            }
            Self::Regex { path, pattern, case_insensitive } => {
                let options = if *case_insensitive { "i" } else { "" };
                let mut d = BsonDocument::new();
                d.insert(path.clone(), doc! { "$regex": pattern.clone(), "$options": options });
                d
            }
        }
    }
}

impl FindOptions {
    /// The MongoDB sort document, or `None` for natural order.
    #[must_use]
    pub fn sort_document(&self) -> Option<BsonDocument> {
        self.sort.as_ref().map(|specs| {
            specs
                .iter()
                .map(|s| (s.field.clone(), Bson::Int32(if s.order == Order::Asc { 1 } else { -1 })))
                .collect()
        })
    }
}

impl UpdateDoc {
    /// The MongoDB `$set` update document.
    #[must_use]
    pub fn to_document(&self) -> BsonDocument {
        let set: BsonDocument = self.set.iter().cloned().collect();
        doc! { "$set": set }
    }
}
