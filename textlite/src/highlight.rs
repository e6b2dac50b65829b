//! Snippet extraction for matched documents

use serde::Serialize;
use tantivy::query::Query;
use tantivy::snippet::SnippetGenerator;
use tantivy::{Searcher, TantivyDocument};

use crate::schema::Schema;

/// A highlighted snippet for one field of one matched document
#[derive(Debug, Clone, Serialize)]
pub struct Highlight {
    /// Field the snippet was taken from
    pub field_name: String,
    /// Snippet fragment text
    pub fragment: String,
    /// Matched byte ranges within the fragment
    pub ranges: Vec<(usize, usize)>,
}

/// Collect highlights for every indexed field of a document.
///
/// Fields whose record option lacks positions, or which produce no
/// snippet for this query, yield no highlight rather than an error.
pub fn find_highlights(
    with_highlights: bool,
    searcher: &Searcher,
    query: &dyn Query,
    doc: &TantivyDocument,
    schema: &Schema,
) -> Vec<Highlight> {
    let mut highlights = Vec::new();
    if !with_highlights {
        return highlights;
    }

    for field in schema.fields() {
        if !schema.is_indexed(field) {
            continue;
        }

        // Fails for fields indexed without positions; highlighting is
        // simply unavailable for those.
        let snippet_generator = match SnippetGenerator::create(searcher, query, field) {
            Ok(generator) => generator,
            Err(_) => continue,
        };

        let snippet = snippet_generator.snippet_from_doc(doc);
        let ranges: Vec<(usize, usize)> = snippet
            .highlighted()
            .iter()
            .filter_map(|range| {
                if range.is_empty() {
                    None
                } else {
                    Some((range.start, range.end))
                }
            })
            .collect();

        if ranges.is_empty() {
            continue;
        }

        highlights.push(Highlight {
            field_name: schema.field_name(field).to_string(),
            fragment: snippet.fragment().to_string(),
            ranges,
        });
    }

    highlights
}
