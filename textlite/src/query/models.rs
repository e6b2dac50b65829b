//! Wire model for structured queries
//!
//! The envelope carries the query texts and field names once; query nodes
//! reference them by index. This keeps deeply nested boolean trees small
//! on the wire and lets one text be reused across several clauses.

use serde::{Deserialize, Serialize};

fn default_boost() -> f32 {
    1.0
}

/// Occurrence modifier for one clause of a boolean query
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Modifier {
    Must,
    Should,
    MustNot,
}

/// One query node
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    /// Nested boolean combination of subqueries
    BoolQuery {
        subqueries: Vec<QueryElement>,
        #[serde(default = "default_boost")]
        boost: f32,
    },
    /// All extracted terms in order; requires at least two terms
    PhraseQuery {
        field_index: usize,
        text_index: usize,
        #[serde(default = "default_boost")]
        boost: f32,
    },
    /// Phrase whose last term is a prefix
    PhrasePrefixQuery {
        field_index: usize,
        text_index: usize,
        #[serde(default = "default_boost")]
        boost: f32,
    },
    /// First extracted term as a prefix
    SingleTermPrefixQuery {
        field_index: usize,
        text_index: usize,
        #[serde(default = "default_boost")]
        boost: f32,
    },
    /// Exactly one extracted term, matched exactly
    TermQuery {
        field_index: usize,
        text_index: usize,
        #[serde(default = "default_boost")]
        boost: f32,
    },
    /// Every extracted term must match
    EveryTermQuery {
        field_index: usize,
        text_index: usize,
        #[serde(default = "default_boost")]
        boost: f32,
    },
    /// At least one extracted term must match
    OneOfTermQuery {
        field_index: usize,
        text_index: usize,
        #[serde(default = "default_boost")]
        boost: f32,
    },
    /// Matches every document
    AllQuery {
        #[serde(default = "default_boost")]
        boost: f32,
    },
}

/// A query node together with its occurrence modifier
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct QueryElement {
    #[serde(default)]
    pub query: Option<QueryKind>,
    pub modifier: Modifier,
}

/// Top-level boolean clause list
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct BoolClause {
    pub subqueries: Vec<QueryElement>,
}

/// The structured query envelope
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct StructuredQuery {
    pub texts: Vec<String>,
    pub fields: Vec<String>,
    pub query: BoolClause,
}
