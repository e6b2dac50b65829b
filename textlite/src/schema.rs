//! Schema definition for text indexes
//!
//! A [`SchemaBuilder`] accumulates text field declarations and produces an
//! immutable [`Schema`]. Field flags control storage (`stored`), tokenized
//! versus untokenized indexing (`is_text`), columnar access (`is_fast`),
//! and how much postings detail is kept per term ([`RecordOption`]).

use std::collections::HashSet;

use tantivy::schema::{
    Field, FieldType, IndexRecordOption, TextFieldIndexing, FAST, STORED, STRING, TEXT,
};

use crate::errors::{Error, Result};

/// How much positional/frequency detail is stored per posting
///
/// Higher detail enables better ranking and highlighting at greater
/// storage cost. Highlighting requires positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOption {
    /// Document ids only
    Basic,
    /// Document ids and term frequencies
    WithFreqs,
    /// Document ids, term frequencies, and term positions
    WithFreqsAndPositions,
}

impl RecordOption {
    /// Decode the boundary representation (0, 1, 2)
    pub fn from_code(code: usize) -> Result<Self> {
        match code {
            0 => Ok(RecordOption::Basic),
            1 => Ok(RecordOption::WithFreqs),
            2 => Ok(RecordOption::WithFreqsAndPositions),
            other => Err(Error::InvalidConfig(format!(
                "Invalid index record option: {}",
                other
            ))),
        }
    }
}

impl From<RecordOption> for IndexRecordOption {
    fn from(option: RecordOption) -> IndexRecordOption {
        match option {
            RecordOption::Basic => IndexRecordOption::Basic,
            RecordOption::WithFreqs => IndexRecordOption::WithFreqs,
            RecordOption::WithFreqsAndPositions => IndexRecordOption::WithFreqsAndPositions,
        }
    }
}

/// Accumulates field declarations and produces an immutable [`Schema`]
pub struct SchemaBuilder {
    builder: tantivy::schema::SchemaBuilder,
    names: HashSet<String>,
}

impl SchemaBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self {
            builder: tantivy::schema::Schema::builder(),
            names: HashSet::new(),
        }
    }

    /// Append a text field declaration.
    ///
    /// Returns the field ordinal. Fails if `name` is empty or already
    /// declared, or if `tokenizer_name` is empty. Tokenizer resolution
    /// happens later, at registration against a context.
    pub fn add_text_field(
        &mut self,
        name: &str,
        stored: bool,
        is_text: bool,
        is_fast: bool,
        record_option: RecordOption,
        tokenizer_name: &str,
    ) -> Result<u32> {
        if name.is_empty() {
            return Err(Error::InvalidConfig("Field name must not be empty".into()));
        }
        if tokenizer_name.is_empty() {
            return Err(Error::InvalidConfig(
                "Tokenizer name must not be empty".into(),
            ));
        }
        if !self.names.insert(name.to_string()) {
            return Err(Error::InvalidConfig(format!(
                "Field '{}' is already declared",
                name
            )));
        }

        let mut text_options = if is_text { TEXT } else { STRING };
        if stored {
            text_options = text_options | STORED;
        }
        if is_fast {
            text_options = text_options | FAST;
        }
        text_options = text_options.set_indexing_options(
            TextFieldIndexing::default()
                .set_tokenizer(tokenizer_name)
                .set_index_option(record_option.into()),
        );

        Ok(self.builder.add_text_field(name, text_options).field_id())
    }

    /// Produce the immutable schema, consuming the builder.
    ///
    /// Fails if no fields were declared.
    pub fn build(self) -> Result<Schema> {
        if self.names.is_empty() {
            return Err(Error::InvalidConfig(
                "Schema must declare at least one field".into(),
            ));
        }
        Ok(Schema {
            inner: self.builder.build(),
        })
    }
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable description of a document's fields
#[derive(Clone)]
pub struct Schema {
    inner: tantivy::schema::Schema,
}

impl Schema {
    /// The underlying engine schema
    pub fn inner(&self) -> &tantivy::schema::Schema {
        &self.inner
    }

    /// Resolve a field by name
    pub fn get_field(&self, name: &str) -> Result<Field> {
        self.inner
            .get_field(name)
            .map_err(|_| Error::FieldNotFound(name.to_string()))
    }

    /// Name of a field
    pub fn field_name(&self, field: Field) -> &str {
        self.inner.get_field_name(field)
    }

    /// Whether a field's value is retrievable verbatim
    pub fn is_stored(&self, field: Field) -> bool {
        self.inner.get_field_entry(field).is_stored()
    }

    /// Whether a field is searchable
    pub fn is_indexed(&self, field: Field) -> bool {
        self.inner.get_field_entry(field).is_indexed()
    }

    /// Resolve a field by name, requiring it to be a text field
    pub fn text_field(&self, name: &str) -> Result<Field> {
        let field = self.get_field(name)?;
        match self.inner.get_field_entry(field).field_type() {
            FieldType::Str(_) => Ok(field),
            _ => Err(Error::InvalidField(format!(
                "Field '{}' is not a text field",
                name
            ))),
        }
    }

    /// Fields in declaration order
    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.inner.fields().map(|(field, _)| field)
    }
}

impl From<tantivy::schema::Schema> for Schema {
    fn from(inner: tantivy::schema::Schema) -> Self {
        Self { inner }
    }
}
