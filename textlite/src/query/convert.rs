//! Conversion of structured queries into engine queries
//!
//! Query texts are tokenized with the analyzer registered for the target
//! field, so term extraction at query time matches what indexing
//! produced.

use tantivy::query::{
    AllQuery, BooleanQuery, BoostQuery, Occur, PhrasePrefixQuery, PhraseQuery, Query, TermQuery,
};
use tantivy::schema::{Field, IndexRecordOption};
use tantivy::tokenizer::{Token, TokenStream};
use tantivy::{Index, Score, Term};

use crate::errors::{Error, Result};
use crate::query::models::{Modifier, QueryElement, QueryKind, StructuredQuery};
use crate::schema::Schema;

/// Parse a JSON structured query into an executable engine query
pub fn parse_structured_query(
    index: &Index,
    schema: &Schema,
    json: &str,
) -> Result<Box<dyn Query>> {
    let parsed: StructuredQuery =
        serde_json::from_str(json).map_err(|e| Error::InvalidQuery(e.to_string()))?;
    convert(index, schema, parsed)
}

fn convert(index: &Index, schema: &Schema, parsed: StructuredQuery) -> Result<Box<dyn Query>> {
    if parsed.fields.is_empty() || parsed.texts.is_empty() {
        return Err(Error::InvalidQuery(
            "Fields and texts must not be empty".into(),
        ));
    }

    let mut subqueries = Vec::new();
    for element in &parsed.query.subqueries {
        subqueries.push(element_to_query(
            index,
            element,
            schema,
            &parsed.texts,
            &parsed.fields,
        )?);
    }

    Ok(Box::new(BooleanQuery::from(subqueries)))
}

/// Tokenize `text` with the analyzer of `field`, producing position/term pairs
fn extract_terms(index: &Index, field: Field, text: &str) -> Result<Vec<(usize, Term)>> {
    let mut tokenizer = index.tokenizer_for_field(field)?;
    let mut token_stream = tokenizer.token_stream(text);
    let mut terms = Vec::new();
    token_stream.process(&mut |token: &Token| {
        terms.push((token.position, Term::from_field_text(field, &token.text)))
    });
    if terms.is_empty() {
        return Err(Error::InvalidQuery("Zero terms were extracted".into()));
    }
    Ok(terms)
}

fn element_to_query(
    index: &Index,
    element: &QueryElement,
    schema: &Schema,
    texts: &[String],
    fields: &[String],
) -> Result<(Occur, Box<dyn Query>)> {
    let occur = modifier_to_occur(element.modifier);

    let resolve = |field_index: usize, text_index: usize| -> Result<(Field, &str)> {
        let field_name = fields
            .get(field_index)
            .ok_or_else(|| Error::InvalidQuery(format!("Invalid field index {}", field_index)))?;
        let text = texts
            .get(text_index)
            .ok_or_else(|| Error::InvalidQuery(format!("Invalid text index {}", text_index)))?;
        let field = schema.get_field(field_name)?;
        Ok((field, text.as_str()))
    };

    let kind = element
        .query
        .as_ref()
        .ok_or_else(|| Error::InvalidQuery("Query element has no query".into()))?;

    match kind {
        QueryKind::PhraseQuery {
            field_index,
            text_index,
            boost,
        } => {
            let (field, text) = resolve(*field_index, *text_index)?;
            let terms = extract_terms(index, field, text)?;
            if terms.len() <= 1 {
                return Err(Error::InvalidQuery(
                    "Phrase must have more than one term".into(),
                ));
            }
            Ok(try_boost(
                occur,
                *boost,
                Box::new(PhraseQuery::new_with_offset(terms)),
            ))
        }

        QueryKind::PhrasePrefixQuery {
            field_index,
            text_index,
            boost,
        } => {
            let (field, text) = resolve(*field_index, *text_index)?;
            let terms = extract_terms(index, field, text)?;
            Ok(try_boost(
                occur,
                *boost,
                Box::new(PhrasePrefixQuery::new_with_offset(terms)),
            ))
        }

        QueryKind::SingleTermPrefixQuery {
            field_index,
            text_index,
            boost,
        } => {
            let (field, text) = resolve(*field_index, *text_index)?;
            let terms = extract_terms(index, field, text)?;
            Ok(try_boost(
                occur,
                *boost,
                Box::new(PhrasePrefixQuery::new_with_offset(vec![terms[0].clone()])),
            ))
        }

        QueryKind::TermQuery {
            field_index,
            text_index,
            boost,
        } => {
            let (field, text) = resolve(*field_index, *text_index)?;
            let mut terms = extract_terms(index, field, text)?.into_iter();
            let term = match (terms.next(), terms.next()) {
                (Some((_, term)), None) => term,
                _ => {
                    return Err(Error::InvalidQuery(
                        "Term query must analyze to a single term".into(),
                    ))
                }
            };
            Ok(try_boost(
                occur,
                *boost,
                Box::new(TermQuery::new(term, IndexRecordOption::WithFreqs)),
            ))
        }

        QueryKind::EveryTermQuery {
            field_index,
            text_index,
            boost,
        } => {
            let (field, text) = resolve(*field_index, *text_index)?;
            let terms = extract_terms(index, field, text)?;
            Ok(try_boost(occur, *boost, terms_query(terms, Occur::Must)))
        }

        QueryKind::OneOfTermQuery {
            field_index,
            text_index,
            boost,
        } => {
            let (field, text) = resolve(*field_index, *text_index)?;
            let terms = extract_terms(index, field, text)?;
            Ok(try_boost(occur, *boost, terms_query(terms, Occur::Should)))
        }

        QueryKind::AllQuery { boost } => Ok(try_boost(occur, *boost, Box::new(AllQuery))),

        QueryKind::BoolQuery { subqueries, boost } => {
            let mut converted = Vec::new();
            for subquery in subqueries {
                converted.push(element_to_query(index, subquery, schema, texts, fields)?);
            }
            Ok(try_boost(
                occur,
                *boost,
                Box::new(BooleanQuery::from(converted)),
            ))
        }
    }
}

fn terms_query(terms: Vec<(usize, Term)>, occur: Occur) -> Box<dyn Query> {
    let subqueries: Vec<(Occur, Box<dyn Query>)> = terms
        .into_iter()
        .map(|(_, term)| {
            (
                occur,
                Box::new(TermQuery::new(term, IndexRecordOption::WithFreqs)) as Box<dyn Query>,
            )
        })
        .collect();
    Box::new(BooleanQuery::from(subqueries))
}

fn try_boost(occur: Occur, boost: f32, query: Box<dyn Query>) -> (Occur, Box<dyn Query>) {
    if boost == 1.0 {
        (occur, query)
    } else {
        (occur, Box::new(BoostQuery::new(query, boost as Score)))
    }
}

fn modifier_to_occur(modifier: Modifier) -> Occur {
    match modifier {
        Modifier::Must => Occur::Must,
        Modifier::Should => Occur::Should,
        Modifier::MustNot => Occur::MustNot,
    }
}
