pub mod deadline;
pub mod sql;
pub mod validate;

pub use deadline::with_deadline;
pub use sql::{contains_pattern, escape_like_pattern};
pub use validate::require_non_empty;
