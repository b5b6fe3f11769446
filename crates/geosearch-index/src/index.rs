use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::Value as JsonValue;
use tantivy::collector::TopDocs;
use tantivy::query::TermQuery;
use tantivy::schema::IndexRecordOption;
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};

use geosearch_core::mapping::IndexMapping;
use geosearch_core::query::SearchRequest;
use geosearch_core::traits::DocumentIndex;
use geosearch_core::types::SearchResult;
use geosearch_core::{Error, Result};

use crate::search;
use crate::tantivy_utils::{build_schema, engine, register_tokenizer, stored_str, to_tantivy_doc, SchemaFields};

pub const MAPPING_FILE: &str = "mapping.json";
const META_FILE: &str = "meta.json";
const WRITER_HEAP_BYTES: usize = 50_000_000;

/// A Tantivy index on disk together with the mapping it was created with.
///
/// The mapping is persisted next to the Tantivy files so [`GeoIndex::open`]
/// needs nothing but the path. Every write commits before returning.
///
/// The writer, and with it Tantivy's directory lock, is only taken on the
/// first write, so any number of handles can search the same index.
pub struct GeoIndex {
    path: PathBuf,
    index: Index,
    writer: Option<IndexWriter>,
    reader: IndexReader,
    mapping: IndexMapping,
    fields: SchemaFields,
}

impl GeoIndex {
    /// Whether `path` holds an index.
    pub fn exists(path: &Path) -> bool {
        path.join(META_FILE).is_file() && path.join(MAPPING_FILE).is_file()
    }

    /// Creates a new index, failing if one already lives at `path`.
    pub fn create(path: impl AsRef<Path>, mapping: &IndexMapping) -> Result<Self> {
        let path = path.as_ref();
        if Self::exists(path) {
            return Err(Error::AlreadyExists(format!("index at {}", path.display())));
        }
        let schema = build_schema(mapping)?;
        fs::create_dir_all(path)?;
        fs::write(path.join(MAPPING_FILE), serde_json::to_vec_pretty(mapping)?)?;
        let index = Index::create_in_dir(path, schema).map_err(engine)?;
        tracing::info!(path = %path.display(), "created index");
        Self::from_index(path, index, mapping.clone())
    }

    /// Removes whatever is at `path`, then creates a new index there.
    pub fn create_fresh(path: impl AsRef<Path>, mapping: &IndexMapping) -> Result<Self> {
        let path = path.as_ref();
        match fs::symlink_metadata(path) {
            Ok(meta) => {
                tracing::warn!(path = %path.display(), "removing existing index data");
                if meta.is_dir() {
                    fs::remove_dir_all(path)?;
                } else {
                    fs::remove_file(path)?;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        Self::create(path, mapping)
    }

    /// Opens an existing index. The mapping is read back from disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !Self::exists(path) {
            return Err(Error::NotFound(format!("no index at {}", path.display())));
        }
        let mapping: IndexMapping = serde_json::from_slice(&fs::read(path.join(MAPPING_FILE))?)?;
        mapping.validate()?;
        let index = Index::open_in_dir(path).map_err(engine)?;
        tracing::info!(path = %path.display(), "opened index");
        Self::from_index(path, index, mapping)
    }

    pub fn open_or_create(path: impl AsRef<Path>, mapping: &IndexMapping) -> Result<Self> {
        let path = path.as_ref();
        if Self::exists(path) {
            Self::open(path)
        } else {
            Self::create(path, mapping)
        }
    }

    fn from_index(path: &Path, index: Index, mapping: IndexMapping) -> Result<Self> {
        register_tokenizer(&index);
        let fields = SchemaFields::resolve(&index.schema(), &mapping)?;
        let reader: IndexReader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .map_err(engine)?;
        Ok(Self { path: path.to_path_buf(), index, writer: None, reader, mapping, fields })
    }

    fn writer(&mut self) -> Result<&mut IndexWriter> {
        if self.writer.is_none() {
            let writer: IndexWriter = self.index.writer(WRITER_HEAP_BYTES).map_err(engine)?;
            tracing::debug!(path = %self.path.display(), "acquired index writer");
            self.writer = Some(writer);
        }
        self.writer
            .as_mut()
            .ok_or_else(|| Error::Index("index writer unavailable".to_string()))
    }

    /// Commits, waits for background merges and releases the writer lock.
    pub fn close(mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.commit().map_err(engine)?;
            writer.wait_merging_threads().map_err(engine)?;
        }
        tracing::info!(path = %self.path.display(), "closed index");
        Ok(())
    }

    /// Indexes several documents under one commit.
    pub fn put_batch<'a, I>(&mut self, docs: I) -> Result<usize>
    where
        I: IntoIterator<Item = (&'a str, JsonValue)>,
    {
        let mut count = 0;
        for (id, doc) in docs {
            self.stage(id, &doc)?;
            count += 1;
        }
        self.commit()?;
        Ok(count)
    }

    fn stage(&mut self, id: &str, doc: &JsonValue) -> Result<()> {
        if id.is_empty() {
            return Err(Error::Index("document id must not be empty".to_string()));
        }
        let mapping = self.mapping.mapping_for(doc);
        let tantivy_doc = to_tantivy_doc(&self.fields, mapping, id, doc)?;
        let id_term = Term::from_field_text(self.fields.id, id);
        let writer = self.writer()?;
        writer.delete_term(id_term);
        writer.add_document(tantivy_doc).map_err(engine)?;
        tracing::debug!(id, "staged document");
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.writer()?.commit().map_err(engine)?;
        self.reader.reload().map_err(engine)?;
        Ok(())
    }
}

impl DocumentIndex for GeoIndex {
    fn mapping(&self) -> &IndexMapping {
        &self.mapping
    }

    fn put_value(&mut self, id: &str, doc: JsonValue) -> Result<()> {
        self.stage(id, &doc)?;
        self.commit()
    }

    fn delete(&mut self, id: &str) -> Result<()> {
        let id_term = Term::from_field_text(self.fields.id, id);
        self.writer()?.delete_term(id_term);
        self.commit()
    }

    fn document(&self, id: &str) -> Result<Option<JsonValue>> {
        let searcher = self.reader.searcher();
        let query = TermQuery::new(Term::from_field_text(self.fields.id, id), IndexRecordOption::Basic);
        let top_docs = searcher.search(&query, &TopDocs::with_limit(1)).map_err(engine)?;
        let Some((_, addr)) = top_docs.into_iter().next() else { return Ok(None) };
        let doc: TantivyDocument = searcher.doc(addr).map_err(engine)?;
        let source = stored_str(&doc, self.fields.source)
            .ok_or_else(|| Error::Index(format!("document '{id}' has no stored source")))?;
        Ok(Some(serde_json::from_str(&source)?))
    }

    fn doc_count(&self) -> Result<u64> {
        Ok(self.reader.searcher().num_docs())
    }

    fn search(&self, request: &SearchRequest) -> Result<SearchResult> {
        search::execute(&self.index, &self.reader.searcher(), &self.fields, request)
    }
}
