// Submodules for separation of concerns
mod eval;
mod exec;
mod render;
mod types;

pub use eval::{compare_bson, compare_docs, eval_filter};
pub use exec::{apply_update, select};
pub use types::{
    DeleteReport, Filter, FindOptions, InsertReport, Order, SortSpec, UpdateDoc, UpdateReport,
};
