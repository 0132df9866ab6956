use bson::{Bson, Document as BsonDocument};

use super::fields;
use crate::query::UpdateDoc;

/// The fields a patch overwrites. `email` and `_id` are never touched.
pub const MUTABLE_FIELDS: [&str; 10] = [
    fields::COUNTRY_NAME,
    fields::COUNTRY_PHOTO,
    fields::VISA_TYPE,
    fields::PROCESSING_TIME,
    fields::AGE_RESTRICTION,
    fields::FEE,
    fields::VALIDITY,
    fields::APPLICATION_METHOD,
    fields::DESCRIPTION,
    fields::REQUIRED_DOCUMENTS,
];

/// Project a patch payload onto the mutable fields.
///
/// Every mutable field is set; ones missing from the payload become null.
/// Anything else in the payload is ignored.
#[must_use]
pub fn project_update(payload: &BsonDocument) -> UpdateDoc {
    let set = MUTABLE_FIELDS
        .iter()
        .map(|f| ((*f).to_string(), payload.get(*f).cloned().unwrap_or(Bson::Null)))
        .collect();
    UpdateDoc { set }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn full_payload_sets_all_ten_fields() {
        let payload = doc! {
            "countryName": "Japan", "countryPhoto": "p.png", "visaType": "Tourist",
            "processingTime": "5 days", "ageRestriction": 18, "fee": 50,
            "validity": "90 days", "applicationMethod": "Online",
            "description": "d", "requiredDocuments": ["passport", "photo"],
        };
        let up = project_update(&payload);
        assert_eq!(up.set.len(), 10);
        assert!(up.set.iter().all(|(_, v)| *v != Bson::Null));
        assert_eq!(up.set[5], ("fee".to_string(), Bson::Int32(50)));
    }

    #[test]
    fn missing_fields_become_null_and_extras_are_dropped() {
        let payload = doc! { "fee": 75, "email": "x@y.z", "_id": "abc", "unrelated": true };
        let up = project_update(&payload);
        let names: Vec<&str> = up.set.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, MUTABLE_FIELDS.to_vec());
        for (k, v) in &up.set {
            if k == "fee" {
                assert_eq!(*v, Bson::Int32(75));
            } else {
                assert_eq!(*v, Bson::Null, "{k} should be null");
            }
        }
    }
}
