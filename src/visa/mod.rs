//! Visa domain: field names, the list/owner/latest/id filter builders and the
//! update projector used by the patch endpoint.
pub mod filter;
pub mod projection;

pub use filter::{FindSpec, SortDirection, VisaListQuery, by_id, latest, list_visas, owner};
pub use projection::{MUTABLE_FIELDS, project_update};

/// Collection holding visa records.
pub const VISA_COLLECTION: &str = "Visas";
/// Collection holding applications against visas.
pub const APPLIED_VISA_COLLECTION: &str = "appliedVisas";

pub mod fields {
    pub const COUNTRY_NAME: &str = "countryName";
    pub const COUNTRY_PHOTO: &str = "countryPhoto";
    pub const VISA_TYPE: &str = "visaType";
    pub const PROCESSING_TIME: &str = "processingTime";
    pub const AGE_RESTRICTION: &str = "ageRestriction";
    pub const FEE: &str = "fee";
    pub const VALIDITY: &str = "validity";
    pub const APPLICATION_METHOD: &str = "applicationMethod";
    pub const DESCRIPTION: &str = "description";
    pub const REQUIRED_DOCUMENTS: &str = "requiredDocuments";
    pub const EMAIL: &str = "email";
}
