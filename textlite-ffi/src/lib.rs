// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! C-compatible boundary for the TextLite search engine
//!
//! Handles are opaque pointers the host passes back verbatim. Every
//! fallible export takes an `error_buffer` out-parameter: on failure a
//! NUL-terminated message is written there (release it with
//! [`string_free`]) and a sentinel (null pointer or zero) is returned; on
//! success the buffer is untouched. Array arguments are pointer plus
//! explicit length. Each create-style export has exactly one matching
//! free or consume export; using a freed handle is undefined.

mod cstr;

use std::panic::{self, AssertUnwindSafe};
use std::process;
use std::ptr;

use libc::{c_char, c_float, c_uint};
use log::error;

use textlite::config;
use textlite::schema::RecordOption;
use textlite::{Document, Result, Schema, SchemaBuilder, SearchResult, TextIndex};

use crate::cstr::{
    assert_pointer, assert_str, assert_string, box_from, drop_any, set_error, string_vec,
    value_slice,
};

/// Run a fallible boundary operation under the panic policy.
///
/// Errors are reported through `error_buffer` and turn into `sentinel`.
/// A panic is reported the same way when the process was initialized with
/// `clear_on_panic`; otherwise it is fatal, because unwinding must never
/// cross the C boundary.
fn exec<T>(error_buffer: *mut *mut c_char, sentinel: T, f: impl FnOnce() -> Result<T>) -> T {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => value,
        Ok(Err(err)) => {
            set_error(&err.to_string(), error_buffer);
            sentinel
        }
        Err(panic_payload) => {
            let message = panic_payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic_payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "Internal panic".to_string());
            error!("panic at boundary: {}", message);
            if config::recover_on_panic() {
                set_error(&message, error_buffer);
                sentinel
            } else {
                process::abort()
            }
        }
    }
}

/// One-time process-wide initialization: logging verbosity, panic policy,
/// and UTF-8 policy.
#[no_mangle]
pub unsafe extern "C" fn init_lib(
    log_level_ptr: *const c_char,
    error_buffer: *mut *mut c_char,
    clear_on_panic: bool,
    utf8_lenient: bool,
) {
    exec(error_buffer, (), || {
        let log_level = assert_string(log_level_ptr)?;
        config::initialize(log_level.as_str(), clear_on_panic, utf8_lenient);
        Ok(())
    })
}

/// Create an empty schema builder.
#[no_mangle]
pub extern "C" fn schema_builder_new() -> *mut SchemaBuilder {
    Box::into_raw(Box::new(SchemaBuilder::new()))
}

/// Append a text field declaration; returns the field ordinal.
#[no_mangle]
pub extern "C" fn schema_builder_add_text_field(
    builder_ptr: *mut SchemaBuilder,
    field_name_ptr: *const c_char,
    stored: bool,
    is_text: bool,
    is_fast: bool,
    index_record_option: usize,
    tokenizer_name_ptr: *const c_char,
    error_buffer: *mut *mut c_char,
) -> c_uint {
    exec(error_buffer, 0, || {
        let builder = assert_pointer(builder_ptr)?;
        let field_name = assert_string(field_name_ptr)?;
        let tokenizer_name = assert_string(tokenizer_name_ptr)?;
        let record_option = RecordOption::from_code(index_record_option)?;
        builder.add_text_field(
            &field_name,
            stored,
            is_text,
            is_fast,
            record_option,
            &tokenizer_name,
        )
    })
}

/// Build the immutable schema, consuming the builder.
#[no_mangle]
pub extern "C" fn schema_builder_build(
    builder_ptr: *mut SchemaBuilder,
    error_buffer: *mut *mut c_char,
) -> *mut Schema {
    exec(error_buffer, ptr::null_mut(), || {
        assert_pointer(builder_ptr)?;
        let builder = box_from(builder_ptr);
        let schema = builder.build()?;
        Ok(Box::into_raw(Box::new(schema)))
    })
}

/// Release a schema handle.
#[no_mangle]
pub extern "C" fn schema_free(schema_ptr: *mut Schema) {
    drop_any(schema_ptr)
}

/// Open or create a durable index at `path` bound to `schema`.
///
/// The schema handle stays owned by the host (release it with
/// [`schema_free`] once it is no longer needed for serialization).
#[no_mangle]
pub extern "C" fn context_create_with_schema(
    path_ptr: *const c_char,
    schema_ptr: *mut Schema,
    error_buffer: *mut *mut c_char,
) -> *mut TextIndex {
    exec(error_buffer, ptr::null_mut(), || {
        let schema = assert_pointer(schema_ptr)?.clone();
        let path = assert_string(path_ptr)?;
        let context = TextIndex::create_with_schema(&path, schema)?;
        Ok(Box::into_raw(Box::new(context)))
    })
}

/// Register an n-gram analyzer on the context.
#[no_mangle]
pub extern "C" fn context_register_text_analyzer_ngram(
    context_ptr: *mut TextIndex,
    tokenizer_name_ptr: *const c_char,
    min_gram: usize,
    max_gram: usize,
    prefix_only: bool,
    error_buffer: *mut *mut c_char,
) {
    exec(error_buffer, (), || {
        let context = assert_pointer(context_ptr)?;
        let tokenizer_name = assert_string(tokenizer_name_ptr)?;
        context.register_ngram_analyzer(&tokenizer_name, min_gram, max_gram, prefix_only)
    })
}

/// Register an edge n-gram analyzer on the context.
#[no_mangle]
pub extern "C" fn context_register_text_analyzer_edge_ngram(
    context_ptr: *mut TextIndex,
    tokenizer_name_ptr: *const c_char,
    min_gram: usize,
    max_gram: usize,
    limit: usize,
    error_buffer: *mut *mut c_char,
) {
    exec(error_buffer, (), || {
        let context = assert_pointer(context_ptr)?;
        let tokenizer_name = assert_string(tokenizer_name_ptr)?;
        context.register_edge_ngram_analyzer(&tokenizer_name, min_gram, max_gram, limit)
    })
}

/// Register a simple language-aware analyzer on the context.
#[no_mangle]
pub extern "C" fn context_register_text_analyzer_simple(
    context_ptr: *mut TextIndex,
    tokenizer_name_ptr: *const c_char,
    text_limit: usize,
    lang_str_ptr: *const c_char,
    error_buffer: *mut *mut c_char,
) {
    exec(error_buffer, (), || {
        let context = assert_pointer(context_ptr)?;
        let tokenizer_name = assert_string(tokenizer_name_ptr)?;
        let lang = assert_string(lang_str_ptr)?;
        context.register_simple_analyzer(&tokenizer_name, text_limit, &lang)
    })
}

/// Register a segmenting CJK analyzer on the context.
#[no_mangle]
pub extern "C" fn context_register_text_analyzer_jieba(
    context_ptr: *mut TextIndex,
    tokenizer_name_ptr: *const c_char,
    text_limit: usize,
    error_buffer: *mut *mut c_char,
) {
    exec(error_buffer, (), || {
        let context = assert_pointer(context_ptr)?;
        let tokenizer_name = assert_string(tokenizer_name_ptr)?;
        context.register_segmenting_analyzer(&tokenizer_name, text_limit)
    })
}

/// Register a raw analyzer on the context.
#[no_mangle]
pub extern "C" fn context_register_text_analyzer_raw(
    context_ptr: *mut TextIndex,
    tokenizer_name_ptr: *const c_char,
    error_buffer: *mut *mut c_char,
) {
    exec(error_buffer, (), || {
        let context = assert_pointer(context_ptr)?;
        let tokenizer_name = assert_string(tokenizer_name_ptr)?;
        context.register_raw_analyzer(&tokenizer_name)
    })
}

/// Ingest a batch of documents atomically.
///
/// Ownership of every document in the array passes to this call whatever
/// the outcome; the handles must not be used again.
#[no_mangle]
pub extern "C" fn context_add_and_consume_documents(
    context_ptr: *mut TextIndex,
    docs_ptr: *mut *mut Document,
    docs_len: usize,
    error_buffer: *mut *mut c_char,
) {
    exec(error_buffer, (), || {
        let context = assert_pointer(context_ptr)?;
        let handles = value_slice(docs_ptr, docs_len)?;

        // Reclaim every non-null handle before validating, so documents
        // are consumed even when the batch is rejected
        let mut docs = Vec::with_capacity(docs_len);
        let mut saw_null = false;
        for &handle in handles {
            if handle.is_null() {
                saw_null = true;
            } else {
                docs.push(*box_from(handle));
            }
        }
        if saw_null {
            return Err(cstr::POINTER_IS_NULL.into());
        }

        context.add_and_consume_documents(docs)
    })
}

/// Delete every document whose `field` matches one of the ids.
#[no_mangle]
pub extern "C" fn context_delete_documents(
    context_ptr: *mut TextIndex,
    field_name_ptr: *const c_char,
    delete_ids_ptr: *mut *const c_char,
    delete_ids_len: usize,
    error_buffer: *mut *mut c_char,
) {
    exec(error_buffer, (), || {
        let context = assert_pointer(context_ptr)?;
        let field_name = assert_string(field_name_ptr)?;
        let ids = string_vec(delete_ids_ptr, delete_ids_len)?;
        let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        context.delete_documents(&field_name, &id_refs)
    })
}

/// Count of live committed documents.
#[no_mangle]
pub extern "C" fn context_num_docs(
    context_ptr: *mut TextIndex,
    error_buffer: *mut *mut c_char,
) -> u64 {
    exec(error_buffer, 0, || {
        let context = assert_pointer(context_ptr)?;
        Ok(context.num_docs())
    })
}

/// Weighted multi-field search over a parsed query string.
#[no_mangle]
pub extern "C" fn context_search(
    context_ptr: *mut TextIndex,
    field_names_ptr: *mut *const c_char,
    field_weights_ptr: *mut c_float,
    field_names_len: usize,
    query_ptr: *const c_char,
    error_buffer: *mut *mut c_char,
    docs_limit: usize,
    with_highlights: bool,
) -> *mut SearchResult {
    exec(error_buffer, ptr::null_mut(), || {
        let context = assert_pointer(context_ptr)?;
        let field_names = string_vec(field_names_ptr, field_names_len)?;
        let weights = value_slice(field_weights_ptr, field_names_len)?;
        let query = assert_string(query_ptr)?;

        let name_refs: Vec<&str> = field_names.iter().map(String::as_str).collect();
        let result = context.search(&name_refs, weights, &query, docs_limit, with_highlights)?;
        Ok(Box::into_raw(Box::new(result)))
    })
}

/// Structured (JSON) search with the same ranking contract.
#[no_mangle]
pub extern "C" fn context_search_json(
    context_ptr: *mut TextIndex,
    query_ptr: *const c_char,
    error_buffer: *mut *mut c_char,
    docs_limit: usize,
    with_highlights: bool,
) -> *mut SearchResult {
    exec(error_buffer, ptr::null_mut(), || {
        let context = assert_pointer(context_ptr)?;
        let query = assert_string(query_ptr)?;
        let result = context.search_json(&query, docs_limit, with_highlights)?;
        Ok(Box::into_raw(Box::new(result)))
    })
}

/// Release a context immediately.
#[no_mangle]
pub extern "C" fn context_free(context_ptr: *mut TextIndex) {
    drop_any(context_ptr)
}

/// Release a context after joining background merge threads.
#[no_mangle]
pub extern "C" fn context_wait_and_free(
    context_ptr: *mut TextIndex,
    error_buffer: *mut *mut c_char,
) {
    if context_ptr.is_null() {
        return;
    }
    exec(error_buffer, (), || {
        let context = box_from(context_ptr);
        context.wait_merging_threads()
    })
}

/// Number of documents in a search result.
#[no_mangle]
pub extern "C" fn search_result_get_size(
    result_ptr: *mut SearchResult,
    error_buffer: *mut *mut c_char,
) -> usize {
    exec(error_buffer, 0, || {
        let result = assert_pointer(result_ptr)?;
        Ok(result.len())
    })
}

/// Borrow the document at `index`, bounds-checked.
///
/// The returned handle is owned by the search result and is released with
/// it; do not pass it to [`document_free`].
#[no_mangle]
pub extern "C" fn search_result_get_doc(
    result_ptr: *mut SearchResult,
    index: usize,
    error_buffer: *mut *mut c_char,
) -> *mut Document {
    exec(error_buffer, ptr::null_mut(), || {
        let result = assert_pointer(result_ptr)?;
        let doc = result.get_mut(index)?;
        Ok(doc as *mut Document)
    })
}

/// Release a search result and every document it owns.
#[no_mangle]
pub extern "C" fn search_result_free(result_ptr: *mut SearchResult) {
    drop_any(result_ptr)
}

/// Create an empty document.
#[no_mangle]
pub extern "C" fn document_create() -> *mut Document {
    Box::into_raw(Box::new(Document::new()))
}

/// Append a (field, value) pair, validated against the context's schema.
#[no_mangle]
pub extern "C" fn document_add_field(
    doc_ptr: *mut Document,
    field_name_ptr: *const c_char,
    field_value_ptr: *const c_char,
    context_ptr: *mut TextIndex,
    error_buffer: *mut *mut c_char,
) {
    exec(error_buffer, (), || {
        let doc = assert_pointer(doc_ptr)?;
        let context = assert_pointer(context_ptr)?;
        let field_name = assert_string(field_name_ptr)?;
        let field_value = assert_str(field_value_ptr)?;
        doc.add_field(context.schema(), &field_name, &field_value)
    })
}

/// Serialize a document's stored fields as JSON; release the returned
/// string with [`string_free`].
#[no_mangle]
pub extern "C" fn document_as_json(
    doc_ptr: *mut Document,
    include_fields_ptr: *mut *const c_char,
    include_fields_len: usize,
    schema_ptr: *mut Schema,
    error_buffer: *mut *mut c_char,
) -> *mut c_char {
    exec(error_buffer, ptr::null_mut(), || {
        let doc = assert_pointer(doc_ptr)?;
        let schema = assert_pointer(schema_ptr)?;
        let include_fields = string_vec(include_fields_ptr, include_fields_len)?;
        let include_refs: Vec<&str> = include_fields.iter().map(String::as_str).collect();

        let json = doc.to_json(&include_refs, schema)?;
        let cstr = std::ffi::CString::new(json)
            .map_err(|e| textlite::Error::InvalidOperation(e.to_string()))?;
        Ok(cstr.into_raw())
    })
}

/// Release a document that was never ingested.
#[no_mangle]
pub extern "C" fn document_free(doc_ptr: *mut Document) {
    drop_any(doc_ptr)
}

/// Release a string returned by this library.
#[no_mangle]
pub extern "C" fn string_free(s: *mut c_char) {
    if !s.is_null() {
        unsafe {
            drop(std::ffi::CString::from_raw(s));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::ffi::{CStr, CString};
    use tempfile::TempDir;

    fn cstring(s: &str) -> CString {
        CString::new(s).unwrap()
    }

    fn take_error(error_buffer: &mut *mut c_char) -> Option<String> {
        if error_buffer.is_null() {
            return None;
        }
        let message = unsafe { CStr::from_ptr(*error_buffer) }
            .to_string_lossy()
            .into_owned();
        string_free(*error_buffer);
        *error_buffer = ptr::null_mut();
        Some(message)
    }

    fn build_context(path: &str) -> (*mut Schema, *mut TextIndex) {
        let mut err: *mut c_char = ptr::null_mut();

        let builder = schema_builder_new();
        let id_name = cstring("id");
        let body_name = cstring("body");
        let raw = cstring("raw");
        let simple = cstring("simple_en");

        schema_builder_add_text_field(builder, id_name.as_ptr(), true, false, false, 0, raw.as_ptr(), &mut err);
        assert!(err.is_null());
        schema_builder_add_text_field(builder, body_name.as_ptr(), true, true, false, 2, simple.as_ptr(), &mut err);
        assert!(err.is_null());

        let schema = schema_builder_build(builder, &mut err);
        assert!(err.is_null());
        assert!(!schema.is_null());

        let path_c = cstring(path);
        let context = context_create_with_schema(path_c.as_ptr(), schema, &mut err);
        assert!(err.is_null(), "{:?}", take_error(&mut err));
        assert!(!context.is_null());

        context_register_text_analyzer_raw(context, raw.as_ptr(), &mut err);
        assert!(err.is_null());
        let lang = cstring("en");
        context_register_text_analyzer_simple(context, simple.as_ptr(), 40, lang.as_ptr(), &mut err);
        assert!(err.is_null());

        (schema, context)
    }

    fn add_document(context: *mut TextIndex, id: &str, body: &str) {
        let mut err: *mut c_char = ptr::null_mut();
        let doc = document_create();

        let id_name = cstring("id");
        let id_value = cstring(id);
        document_add_field(doc, id_name.as_ptr(), id_value.as_ptr(), context, &mut err);
        assert!(err.is_null());

        let body_name = cstring("body");
        let body_value = cstring(body);
        document_add_field(doc, body_name.as_ptr(), body_value.as_ptr(), context, &mut err);
        assert!(err.is_null());

        let mut docs = [doc];
        context_add_and_consume_documents(context, docs.as_mut_ptr(), 1, &mut err);
        assert!(err.is_null(), "{:?}", take_error(&mut err));
    }

    #[test]
    #[serial]
    fn test_schema_builder_error_paths() {
        let mut err: *mut c_char = ptr::null_mut();

        // Null builder
        let name = cstring("field");
        let raw = cstring("raw");
        let ordinal = schema_builder_add_text_field(
            ptr::null_mut(),
            name.as_ptr(),
            true,
            true,
            false,
            0,
            raw.as_ptr(),
            &mut err,
        );
        assert_eq!(ordinal, 0);
        assert!(take_error(&mut err).unwrap().contains("null"));

        // Invalid record option
        let builder = schema_builder_new();
        schema_builder_add_text_field(builder, name.as_ptr(), true, true, false, 9, raw.as_ptr(), &mut err);
        let message = take_error(&mut err).unwrap();
        assert!(message.contains("record option"));

        // Empty builder cannot build
        let schema = schema_builder_build(builder, &mut err);
        assert!(schema.is_null());
        assert!(take_error(&mut err).is_some());
    }

    #[test]
    #[serial]
    fn test_full_lifecycle_through_boundary() {
        let mut err: *mut c_char = ptr::null_mut();
        let dir = TempDir::new().unwrap();
        let (schema, context) = build_context(dir.path().to_str().unwrap());

        add_document(context, "1", "hello world");
        assert_eq!(context_num_docs(context, &mut err), 1);
        assert!(err.is_null());

        // Search over the body field
        let body_name = cstring("body");
        let mut names = [body_name.as_ptr()];
        let mut weights: [c_float; 1] = [1.0];
        let query = cstring("hello");
        let result = context_search(
            context,
            names.as_mut_ptr(),
            weights.as_mut_ptr(),
            1,
            query.as_ptr(),
            &mut err,
            10,
            false,
        );
        assert!(err.is_null(), "{:?}", take_error(&mut err));
        assert_eq!(search_result_get_size(result, &mut err), 1);

        // Serialize the hit through the boundary
        let doc = search_result_get_doc(result, 0, &mut err);
        assert!(err.is_null());
        let json_ptr = document_as_json(doc, ptr::null_mut(), 0, schema, &mut err);
        assert!(err.is_null());
        let json = unsafe { CStr::from_ptr(json_ptr) }.to_str().unwrap().to_string();
        string_free(json_ptr);
        assert!(json.contains("hello world"));

        // Out-of-range access fails descriptively
        let missing = search_result_get_doc(result, 5, &mut err);
        assert!(missing.is_null());
        assert!(take_error(&mut err).unwrap().contains("out of range"));

        search_result_free(result);

        // Delete through the boundary
        let id_name = cstring("id");
        let id = cstring("1");
        let mut ids = [id.as_ptr()];
        context_delete_documents(context, id_name.as_ptr(), ids.as_mut_ptr(), 1, &mut err);
        assert!(err.is_null(), "{:?}", take_error(&mut err));
        assert_eq!(context_num_docs(context, &mut err), 0);

        context_wait_and_free(context, &mut err);
        assert!(err.is_null());
        schema_free(schema);
    }

    #[test]
    #[serial]
    fn test_search_json_through_boundary() {
        let mut err: *mut c_char = ptr::null_mut();
        let dir = TempDir::new().unwrap();
        let (schema, context) = build_context(dir.path().to_str().unwrap());

        add_document(context, "1", "rust search engine");
        add_document(context, "2", "rust game engine");

        let query = cstring(
            r#"{
                "texts": ["search"],
                "fields": ["body"],
                "query": {
                    "subqueries": [
                        {"query": {"one_of_term_query": {"field_index": 0, "text_index": 0, "boost": 1.0}}, "modifier": "must"}
                    ]
                }
            }"#,
        );
        let result = context_search_json(context, query.as_ptr(), &mut err, 10, false);
        assert!(err.is_null(), "{:?}", take_error(&mut err));
        assert_eq!(search_result_get_size(result, &mut err), 1);
        search_result_free(result);

        context_free(context);
        schema_free(schema);
    }

    #[test]
    #[serial]
    fn test_null_handles_report_errors() {
        let mut err: *mut c_char = ptr::null_mut();

        assert_eq!(context_num_docs(ptr::null_mut(), &mut err), 0);
        assert!(take_error(&mut err).is_some());

        let query = cstring("hello");
        let result = context_search_json(ptr::null_mut(), query.as_ptr(), &mut err, 10, false);
        assert!(result.is_null());
        assert!(take_error(&mut err).is_some());

        // Free exports ignore null
        context_free(ptr::null_mut());
        document_free(ptr::null_mut());
        search_result_free(ptr::null_mut());
        schema_free(ptr::null_mut());
        string_free(ptr::null_mut());
    }

    #[test]
    #[serial]
    fn test_analyzer_registration_errors_through_boundary() {
        let mut err: *mut c_char = ptr::null_mut();
        let dir = TempDir::new().unwrap();
        let (schema, context) = build_context(dir.path().to_str().unwrap());

        let name = cstring("bad_ngram");
        context_register_text_analyzer_ngram(context, name.as_ptr(), 5, 2, false, &mut err);
        let message = take_error(&mut err).unwrap();
        assert!(message.contains("min_gram"));

        let lang = cstring("zz");
        let simple = cstring("bad_lang");
        context_register_text_analyzer_simple(context, simple.as_ptr(), 40, lang.as_ptr(), &mut err);
        assert!(take_error(&mut err).unwrap().contains("Unsupported language"));

        context_free(context);
        schema_free(schema);
    }
}
