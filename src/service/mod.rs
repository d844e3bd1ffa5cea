//! GenericModel: keyed CRUD using the safe SQL builder.

mod crud;
mod pagination;
mod row;
mod validation;
pub use crud::{Enricher, GenericModel};
pub use pagination::*;
pub use row::{from_row, json_row_mapper, Entity, RowMapper};
pub use validation::RequestValidator;
