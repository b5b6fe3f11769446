use serde::Serialize;
use serde_json::Value;

use crate::error::Result;
use crate::mapping::IndexMapping;
use crate::query::SearchRequest;
use crate::types::SearchResult;

/// A persistent document index keyed by string ids.
///
/// `put` replaces any document already stored under `id`, and the new
/// document is visible to `search` once the call returns.
pub trait DocumentIndex {
    fn mapping(&self) -> &IndexMapping;
    fn put_value(&mut self, id: &str, doc: Value) -> Result<()>;
    fn delete(&mut self, id: &str) -> Result<()>;
    fn document(&self, id: &str) -> Result<Option<Value>>;
    fn doc_count(&self) -> Result<u64>;
    fn search(&self, request: &SearchRequest) -> Result<SearchResult>;

    fn put<T: Serialize + ?Sized>(&mut self, id: &str, doc: &T) -> Result<()>
    where
        Self: Sized,
    {
        self.put_value(id, serde_json::to_value(doc)?)
    }
}
