// Structured queries expressed as JSON, for compound searches the plain
// field/weight form cannot express.

mod convert;
mod models;

pub use self::convert::parse_structured_query;
pub use self::models::{BoolClause, Modifier, QueryElement, QueryKind, StructuredQuery};
