//! Query compilation and execution.
//!
//! Text criteria become Tantivy queries joined with `Occur::Must`. Geo
//! distance criteria are evaluated on the `f64` fast columns of every
//! text-matching document, so a conjunction returns exactly the documents
//! that satisfy all parts.

use std::cmp::Ordering;
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};

use tantivy::collector::{Count, TopDocs};
use tantivy::query::{AllQuery, BooleanQuery, EmptyQuery, Occur, Query, QueryParser, TermQuery};
use tantivy::schema::{Field, IndexRecordOption};
use tantivy::tokenizer::TokenStream;
use tantivy::{DocAddress, Index, Score, Searcher, TantivyDocument, Term};

use geosearch_core::geo::{haversine_meters, GeoPoint};
use geosearch_core::query::{SearchQuery, SearchRequest};
use geosearch_core::types::{SearchHit, SearchResult};
use geosearch_core::{Error, Result};

use crate::tantivy_utils::{engine, geo_lat_field, geo_lon_field, stored_str, stored_value, MappedField, SchemaFields};

struct GeoFilter {
    lon_column: String,
    lat_column: String,
    center: GeoPoint,
    meters: f64,
}

#[derive(Default)]
struct QueryPlan {
    text: Vec<Box<dyn Query>>,
    geo: Vec<GeoFilter>,
}

impl QueryPlan {
    fn compile(index: &Index, fields: &SchemaFields, query: &SearchQuery) -> Result<Self> {
        let mut plan = Self::default();
        plan.add(index, fields, query)?;
        Ok(plan)
    }

    fn add(&mut self, index: &Index, fields: &SchemaFields, query: &SearchQuery) -> Result<()> {
        match query {
            SearchQuery::MatchAll => {}
            SearchQuery::QueryString(text) => {
                if text.trim().is_empty() {
                    self.text.push(Box::new(EmptyQuery));
                    return Ok(());
                }
                let default_fields = fields.text_fields();
                if default_fields.is_empty() {
                    return Err(Error::Query("no indexed text fields to search".to_string()));
                }
                let parser = QueryParser::for_index(index, default_fields);
                let parsed = parser.parse_query(text).map_err(|e| Error::Query(e.to_string()))?;
                self.text.push(parsed);
            }
            SearchQuery::Match { text, field } => {
                let targets = match field {
                    Some(name) => vec![text_field(fields, name)?],
                    None => fields.text_fields(),
                };
                if targets.is_empty() {
                    return Err(Error::Query("no indexed text fields to search".to_string()));
                }
                self.text.push(match_query(index, &targets, text)?);
            }
            SearchQuery::GeoDistance { center, distance, field } => {
                let name = fields.geo_field(field.as_deref())?;
                self.geo.push(GeoFilter {
                    lon_column: geo_lon_field(&name),
                    lat_column: geo_lat_field(&name),
                    center: *center,
                    meters: distance.meters(),
                });
            }
            SearchQuery::Conjunction(parts) => {
                for part in parts {
                    self.add(index, fields, part)?;
                }
            }
        }
        Ok(())
    }

    fn into_query(mut self) -> (Box<dyn Query>, Vec<GeoFilter>) {
        let query: Box<dyn Query> = match self.text.len() {
            0 => Box::new(AllQuery),
            1 => self.text.remove(0),
            _ => Box::new(BooleanQuery::new(self.text.into_iter().map(|q| (Occur::Must, q)).collect())),
        };
        (query, self.geo)
    }
}

fn text_field(fields: &SchemaFields, name: &str) -> Result<Field> {
    match fields.mapped.get(name) {
        Some((m, MappedField::Text(field))) if m.index => Ok(*field),
        _ => Err(Error::Query(format!("'{name}' is not an indexed text field"))),
    }
}

/// Analyzes `text` with each field's analyzer; any resulting term matches.
fn match_query(index: &Index, targets: &[Field], text: &str) -> Result<Box<dyn Query>> {
    let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();
    for field in targets {
        let mut analyzer = index.tokenizer_for_field(*field).map_err(engine)?;
        let mut stream = analyzer.token_stream(text);
        while stream.advance() {
            let term = Term::from_field_text(*field, &stream.token().text);
            clauses.push((Occur::Should, Box::new(TermQuery::new(term, IndexRecordOption::WithFreqs))));
        }
    }
    if clauses.is_empty() {
        return Ok(Box::new(EmptyQuery));
    }
    Ok(Box::new(BooleanQuery::new(clauses)))
}

/// Keeps the candidates whose geo point lies within every filter. The
/// coordinate columns are opened once per segment.
fn filter_geo(
    searcher: &Searcher,
    candidates: Vec<(Score, DocAddress)>,
    filters: &[GeoFilter],
) -> Result<Vec<(Score, DocAddress)>> {
    let mut columns = HashMap::new();
    let mut kept = Vec::new();
    for (score, addr) in candidates {
        let segment_columns = match columns.entry(addr.segment_ord) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let fast_fields = searcher.segment_reader(addr.segment_ord).fast_fields();
                let mut per_filter = Vec::with_capacity(filters.len());
                for filter in filters {
                    let lon = fast_fields.f64(&filter.lon_column).map_err(engine)?;
                    let lat = fast_fields.f64(&filter.lat_column).map_err(engine)?;
                    per_filter.push((lon, lat));
                }
                entry.insert(per_filter)
            }
        };
        let inside = filters.iter().zip(segment_columns.iter()).all(|(filter, (lon, lat))| {
            match (lon.first(addr.doc_id), lat.first(addr.doc_id)) {
                (Some(lon), Some(lat)) => haversine_meters(&filter.center, &GeoPoint { lon, lat }) <= filter.meters,
                _ => false,
            }
        });
        if inside {
            kept.push((score, addr));
        }
    }
    Ok(kept)
}

/// Top documents by score, extended past `wanted` until the cut no longer
/// falls inside a run of equal scores.
fn top_docs_through_ties(
    searcher: &Searcher,
    query: &dyn Query,
    wanted: usize,
) -> Result<(Vec<(Score, DocAddress)>, usize)> {
    let mut limit = wanted.max(1);
    loop {
        let (top, count) = searcher
            .search(query, &(TopDocs::with_limit(limit + 1), Count))
            .map_err(engine)?;
        let cut_in_tie = top.len() > limit && top[limit].0 == top[limit - 1].0;
        if !cut_in_tie {
            return Ok((top, count));
        }
        limit *= 2;
    }
}

/// The `from..from + size` window of `ranked` (sorted by descending score),
/// with equal scores ordered by id.
fn page(
    searcher: &Searcher,
    fields: &SchemaFields,
    ranked: &[(Score, DocAddress)],
    from: usize,
    size: usize,
) -> Result<Vec<(Score, String, TantivyDocument)>> {
    let end = from.saturating_add(size).min(ranked.len());
    if from >= end {
        return Ok(Vec::new());
    }
    // widen to whole runs of equal scores so the id order is decided inside
    let mut start = from;
    while start > 0 && ranked[start - 1].0 == ranked[from].0 {
        start -= 1;
    }
    let mut stop = end;
    while stop < ranked.len() && ranked[stop].0 == ranked[end - 1].0 {
        stop += 1;
    }

    let mut loaded = Vec::with_capacity(stop - start);
    for &(score, addr) in &ranked[start..stop] {
        let doc: TantivyDocument = searcher.doc(addr).map_err(engine)?;
        let id = stored_str(&doc, fields.id).unwrap_or_default();
        loaded.push((score, id, doc));
    }
    loaded.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal).then_with(|| a.1.cmp(&b.1)));
    Ok(loaded.into_iter().skip(from - start).take(end - from).collect())
}

/// Runs `request` and returns hits by descending score, ties by id.
pub fn execute(
    index: &Index,
    searcher: &Searcher,
    fields: &SchemaFields,
    request: &SearchRequest,
) -> Result<SearchResult> {
    let (query, geo) = QueryPlan::compile(index, fields, &request.query)?.into_query();

    let (ranked, total_hits) = if geo.is_empty() {
        top_docs_through_ties(searcher, query.as_ref(), request.from.saturating_add(request.size))?
    } else {
        let all = usize::try_from(searcher.num_docs()).unwrap_or(usize::MAX).max(1);
        let candidates = searcher.search(query.as_ref(), &TopDocs::with_limit(all)).map_err(engine)?;
        let kept = filter_geo(searcher, candidates, &geo)?;
        let total = kept.len();
        (kept, total)
    };

    let mut hits = Vec::new();
    for (score, id, doc) in page(searcher, fields, &ranked, request.from, request.size)? {
        let mut values = BTreeMap::new();
        for (name, (field_mapping, handle)) in &fields.mapped {
            if !field_mapping.store || !request.wants_field(name) {
                continue;
            }
            if let Some(value) = stored_value(&doc, handle) {
                values.insert(name.clone(), value);
            }
        }
        hits.push(SearchHit { id, score, fields: values });
    }

    tracing::debug!(total_hits, returned = hits.len(), "search complete");
    Ok(SearchResult { total_hits, hits })
}
