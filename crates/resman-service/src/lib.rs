//! Resman Service: the hierarchy service, listing engine and bulk
//! importer that sit between the HTTP layer and the store.

pub mod hierarchy;
pub mod import;
pub mod listing;

pub use hierarchy::{HierarchyConfig, HierarchyService};
pub use import::{BulkImporter, ImportReport, RowFailure};
pub use listing::{ListParams, ListingEngine};
