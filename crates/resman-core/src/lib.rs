//! resman core: domain model, error taxonomy, validation and
//! repository traits shared by every other crate.

pub mod error;
pub mod models;
pub mod repository;
pub mod validation;

pub use error::{ResmanError, ResmanResult};
