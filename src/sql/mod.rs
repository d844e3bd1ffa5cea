//! Safe SQL building: identifiers from validated config only, values as parameters.

mod builder;
pub mod key;
pub mod params;
pub mod typecheck;
pub use builder::*;
pub use key::{build_where_clause, build_where_clause_from, extract_key_values, extract_path_key, KeyValues, WhereClause};
pub use params::*;
pub use typecheck::{check_body, check_value, ValueClass};
