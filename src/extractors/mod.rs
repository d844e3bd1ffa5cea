//! Request extractors.

pub mod context;
pub use context::{AuthenticatedUser, USER_ID_HEADER};
