pub mod error;
pub mod joins;
pub mod naming;
pub mod schema;
pub mod transform;
pub mod where_clause;
