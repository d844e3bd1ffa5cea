//! Concrete entities built on the generic model: a typed row, a descriptor, and any extra routes.

pub mod customer_site;
pub use customer_site::{CustomerNameEnricher, CustomerSite};
