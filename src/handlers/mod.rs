//! HTTP handlers for keyed entity CRUD.

pub mod entity;
pub use entity::GenericController;
