//! Document lifecycle: build, validate, serialize
//!
//! A document is a mutable bag of (field, value) pairs built by the host
//! before ingestion. Field names are validated against the schema as they
//! are added; ingestion consumes the document. Documents coming back from
//! a search additionally carry a relevance score and optional highlights.

use serde_json::{json, Map};
use tantivy::schema::Value;
use tantivy::TantivyDocument;

use crate::errors::Result;
use crate::highlight::Highlight;
use crate::schema::Schema;

/// A document, either host-built for ingestion or returned from a search
#[derive(Debug, Clone)]
pub struct Document {
    pub(crate) doc: TantivyDocument,
    pub(crate) score: f32,
    pub(crate) highlights: Vec<Highlight>,
    payload_bytes: u64,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document
    pub fn new() -> Self {
        Self {
            doc: TantivyDocument::new(),
            score: 0.0,
            highlights: Vec::new(),
            payload_bytes: 0,
        }
    }

    pub(crate) fn from_hit(doc: TantivyDocument, score: f32, highlights: Vec<Highlight>) -> Self {
        Self {
            doc,
            score,
            highlights,
            payload_bytes: 0,
        }
    }

    /// Append a (field, value) pair, validated against `schema`.
    ///
    /// Duplicate field names are allowed (multi-valued fields). Fails
    /// without mutating the document if the field is not declared or is
    /// not a text field.
    pub fn add_field(&mut self, schema: &Schema, name: &str, value: &str) -> Result<()> {
        let field = schema.text_field(name)?;
        self.doc.add_text(field, value);
        self.payload_bytes += value.len() as u64;
        Ok(())
    }

    /// Relevance score assigned by the search that produced this document
    pub fn score(&self) -> f32 {
        self.score
    }

    /// Highlights assigned by the search that produced this document
    pub fn highlights(&self) -> &[Highlight] {
        &self.highlights
    }

    /// Cumulative UTF-8 byte length of the values added so far
    pub(crate) fn payload_bytes(&self) -> u64 {
        self.payload_bytes
    }

    /// Serialize the document's stored field values as a JSON object.
    ///
    /// The object carries `score` and `highlights`, then the stored fields
    /// in schema declaration order; multi-valued fields serialize as
    /// arrays. A non-empty `include_fields` restricts the output to those
    /// fields; fields not marked stored are omitted even when requested.
    pub fn to_json(&self, include_fields: &[&str], schema: &Schema) -> Result<String> {
        // Unknown include names are an error, not a silent drop
        for name in include_fields {
            schema.get_field(name)?;
        }

        let mut object = Map::new();
        object.insert("score".to_string(), json!(self.score));
        object.insert("highlights".to_string(), json!(self.highlights));

        for field in schema.fields() {
            let name = schema.field_name(field);
            if !schema.is_stored(field) {
                continue;
            }
            if !include_fields.is_empty() && !include_fields.contains(&name) {
                continue;
            }

            let mut values: Vec<String> = Vec::new();
            for value in self.doc.get_all(field) {
                if let Some(text) = value.as_str() {
                    values.push(text.to_string());
                }
            }

            match values.len() {
                0 => {}
                1 => {
                    object.insert(name.to_string(), json!(values[0]));
                }
                _ => {
                    object.insert(name.to_string(), json!(values));
                }
            }
        }

        Ok(serde_json::Value::Object(object).to_string())
    }
}
