// Tantivy-backed index context: the top-level owner of schema, analyzer
// registry, and durable index. Reads share snapshot searchers; writes
// serialize on the writer lock.

use std::cmp::Ordering;
use std::fs;
use std::path::Path;
use std::sync::Mutex;

use log::debug;
use tantivy::collector::TopDocs;
use tantivy::directory::MmapDirectory;
use tantivy::query::{Query, QueryParser};
use tantivy::{Index, IndexReader, IndexWriter, Score, TantivyDocument, Term};

use crate::analyzer;
use crate::config;
use crate::document::Document;
use crate::errors::{Error, Result};
use crate::highlight::find_highlights;
use crate::limits::IndexLimits;
use crate::query::parse_structured_query;
use crate::schema::Schema;

/// A durable text index bound to one schema
///
/// Reads (`num_docs`, `search`, `search_json`) take `&self` and may run
/// concurrently; each observes a consistent snapshot. Writes
/// (`add_and_consume_documents`, `delete_documents`) serialize on an
/// internal writer lock and commit before returning, so two concurrent
/// ingestions never interleave and a reader never observes a torn batch.
pub struct TextIndex {
    index: Index,
    schema: Schema,
    writer: Mutex<IndexWriter>,
    reader: IndexReader,
    limits: IndexLimits,
}

impl TextIndex {
    /// Open or create a durable index at `path`, bound to `schema`.
    ///
    /// Fails on I/O errors and when `path` already holds an index whose
    /// schema is incompatible with `schema`.
    pub fn create_with_schema(path: &str, schema: Schema) -> Result<Self> {
        Self::create_with_limits(path, schema, IndexLimits::default())
    }

    /// Open or create a durable index with explicit resource limits
    pub fn create_with_limits(path: &str, schema: Schema, limits: IndexLimits) -> Result<Self> {
        match config::CONFIG.write() {
            Ok(mut cfg) => cfg.update_index_path(path.to_string()),
            Err(e) => debug!("Failed to record index path: {}", e),
        }

        fs::create_dir_all(Path::new(path))?;
        let dir = MmapDirectory::open(path)?;
        let index = Index::open_or_create(dir, schema.inner().clone())?;

        debug!("opened text index at {}", path);
        Self::from_index(index, schema, limits)
    }

    /// Create a volatile in-memory index (used by tests and embedders
    /// that do not need durability)
    pub fn create_in_ram(schema: Schema) -> Result<Self> {
        let index = Index::create_in_ram(schema.inner().clone());
        Self::from_index(index, schema, IndexLimits::default())
    }

    fn from_index(index: Index, schema: Schema, limits: IndexLimits) -> Result<Self> {
        let writer = index.writer(limits.writer_heap_bytes as usize)?;
        let reader = index.reader()?;
        Ok(Self {
            index,
            schema,
            writer: Mutex::new(writer),
            reader,
            limits,
        })
    }

    /// The schema this index was created with
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Register an n-gram analyzer under `name`
    pub fn register_ngram_analyzer(
        &self,
        name: &str,
        min_gram: usize,
        max_gram: usize,
        prefix_only: bool,
    ) -> Result<()> {
        analyzer::register_ngram(&self.index, name, min_gram, max_gram, prefix_only)
    }

    /// Register an edge n-gram analyzer under `name`
    pub fn register_edge_ngram_analyzer(
        &self,
        name: &str,
        min_gram: usize,
        max_gram: usize,
        limit: usize,
    ) -> Result<()> {
        analyzer::register_edge_ngram(&self.index, name, min_gram, max_gram, limit)
    }

    /// Register a simple language-aware analyzer under `name`
    pub fn register_simple_analyzer(&self, name: &str, text_limit: usize, lang: &str) -> Result<()> {
        analyzer::register_simple(&self.index, name, text_limit, lang)
    }

    /// Register a segmenting CJK analyzer under `name`
    pub fn register_segmenting_analyzer(&self, name: &str, text_limit: usize) -> Result<()> {
        analyzer::register_segmenting(&self.index, name, text_limit)
    }

    /// Register a raw analyzer under `name`
    pub fn register_raw_analyzer(&self, name: &str) -> Result<()> {
        analyzer::register_raw(&self.index, name)
    }

    fn reader(&self) -> &IndexReader {
        let _ = self.reader.reload();
        &self.reader
    }

    fn lock_writer(&self) -> Result<std::sync::MutexGuard<'_, IndexWriter>> {
        self.writer
            .lock()
            .map_err(|e| Error::InvalidOperation(format!("Writer lock poisoned: {}", e)))
    }

    /// Count of live committed documents
    pub fn num_docs(&self) -> u64 {
        self.reader().searcher().num_docs()
    }

    /// Ingest a batch of documents atomically, consuming them.
    ///
    /// The cumulative payload must fit the batch byte budget; an
    /// over-budget batch is rejected before anything is added. Any
    /// failure rolls the writer back, so either every document becomes
    /// visible to subsequent searches or none do.
    pub fn add_and_consume_documents(&self, docs: Vec<Document>) -> Result<()> {
        let payload: u64 = docs.iter().map(|doc| doc.payload_bytes()).sum();
        self.limits.check_batch(payload)?;

        let count = docs.len();
        let mut writer = self.lock_writer()?;
        for doc in docs {
            if let Err(err) = writer.add_document(doc.doc) {
                let _ = writer.rollback();
                return Err(Error::Index(err));
            }
        }
        if let Err(err) = writer.commit() {
            let _ = writer.rollback();
            return Err(Error::Index(err));
        }

        debug!("committed batch of {} documents ({} bytes)", count, payload);
        Ok(())
    }

    /// Delete every document whose indexed text field `field_name`
    /// matches one of `ids`. Deletions are committed before returning.
    pub fn delete_documents(&self, field_name: &str, ids: &[&str]) -> Result<()> {
        let field = self.schema.text_field(field_name)?;
        if !self.schema.is_indexed(field) {
            return Err(Error::InvalidField(format!(
                "Field '{}' is not indexed",
                field_name
            )));
        }

        let mut writer = self.lock_writer()?;
        for id in ids {
            let _ = writer.delete_term(Term::from_field_text(field, id));
        }
        if let Err(err) = writer.commit() {
            let _ = writer.rollback();
            return Err(Error::Index(err));
        }

        debug!("committed deletion of {} terms on '{}'", ids.len(), field_name);
        Ok(())
    }

    /// Parse `query` against `field_names` and return up to `docs_limit`
    /// documents by descending relevance.
    ///
    /// `field_weights` must have the same length as `field_names`; each
    /// weight boosts its field's score contribution. A weight of 0.0
    /// keeps the field matching but scoreless. Ties are broken by lowest
    /// internal document address, so repeated searches over an unchanged
    /// index return the same sequence.
    pub fn search(
        &self,
        field_names: &[&str],
        field_weights: &[f32],
        query: &str,
        docs_limit: usize,
        with_highlights: bool,
    ) -> Result<SearchResult> {
        if field_names.is_empty() {
            return Err(Error::InvalidQuery(
                "Search requires at least one field".into(),
            ));
        }
        if field_names.len() != field_weights.len() {
            return Err(Error::InvalidQuery(format!(
                "Got {} fields but {} weights",
                field_names.len(),
                field_weights.len()
            )));
        }

        let mut fields = Vec::with_capacity(field_names.len());
        for name in field_names {
            fields.push(self.schema.get_field(name)?);
        }

        let mut query_parser = QueryParser::for_index(&self.index, fields.clone());
        for (field, weight) in fields.into_iter().zip(field_weights.iter()) {
            query_parser.set_field_boost(field, *weight as Score);
        }
        let parsed = query_parser.parse_query(query)?;

        self.execute(parsed, docs_limit, with_highlights)
    }

    /// Execute a structured JSON query (boolean/compound form) with the
    /// same ranking and highlighting contract as [`TextIndex::search`]
    pub fn search_json(
        &self,
        query_json: &str,
        docs_limit: usize,
        with_highlights: bool,
    ) -> Result<SearchResult> {
        let query = parse_structured_query(&self.index, &self.schema, query_json)?;
        self.execute(query, docs_limit, with_highlights)
    }

    fn execute(
        &self,
        query: Box<dyn Query>,
        docs_limit: usize,
        with_highlights: bool,
    ) -> Result<SearchResult> {
        if docs_limit == 0 {
            return Ok(SearchResult::new(Vec::new()));
        }

        let searcher = self.reader().searcher();
        let mut top_docs = searcher.search(&query, &TopDocs::with_limit(docs_limit))?;

        // Descending score, ascending address on equal scores
        top_docs.sort_by(|left, right| {
            right
                .0
                .partial_cmp(&left.0)
                .unwrap_or(Ordering::Equal)
                .then_with(|| left.1.cmp(&right.1))
        });

        let mut documents = Vec::with_capacity(top_docs.len());
        for (score, doc_address) in top_docs {
            let doc: TantivyDocument = searcher.doc(doc_address)?;
            let highlights =
                find_highlights(with_highlights, &searcher, query.as_ref(), &doc, &self.schema);
            documents.push(Document::from_hit(doc, score, highlights));
        }

        Ok(SearchResult::new(documents))
    }

    /// Release the index after joining background merge threads.
    ///
    /// Dropping the context also releases it; this variant additionally
    /// waits for merges so the directory is quiescent on return.
    pub fn wait_merging_threads(self) -> Result<()> {
        let writer = self
            .writer
            .into_inner()
            .map_err(|e| Error::InvalidOperation(format!("Writer lock poisoned: {}", e)))?;
        writer.wait_merging_threads()?;
        Ok(())
    }
}

/// Ordered, owned result of one query execution
///
/// Owns its documents independently of the index: the result stays valid
/// across later mutations and reflects the index state at search time.
pub struct SearchResult {
    documents: Vec<Document>,
}

impl SearchResult {
    pub(crate) fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }

    /// Number of documents in the result
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// The documents, best first
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Borrow the document at `index`, bounds-checked
    pub fn get(&self, index: usize) -> Result<&Document> {
        self.documents.get(index).ok_or_else(|| {
            Error::InvalidOperation(format!(
                "Result index {} out of range for {} documents",
                index,
                self.documents.len()
            ))
        })
    }

    /// Mutably borrow the document at `index`, bounds-checked
    pub fn get_mut(&mut self, index: usize) -> Result<&mut Document> {
        let len = self.documents.len();
        self.documents.get_mut(index).ok_or_else(|| {
            Error::InvalidOperation(format!(
                "Result index {} out of range for {} documents",
                index, len
            ))
        })
    }
}
