use std::collections::BTreeMap;

use serde_json::Value as JsonValue;
use tantivy::schema::{
    Field, IndexRecordOption, NumericOptions, Schema, TextFieldIndexing, TextOptions, Value, STORED, STRING,
};
use tantivy::tokenizer::{AsciiFoldingFilter, LowerCaser, RemoveLongFilter, SimpleTokenizer, StopWordFilter, TextAnalyzer};
use tantivy::{Index, TantivyDocument};

use geosearch_core::geo::extract_geo_point;
use geosearch_core::mapping::{DocumentMapping, FieldKind, FieldMapping, IndexMapping};
use geosearch_core::{Error, Result};

pub const ID_FIELD: &str = "_id";
pub const SOURCE_FIELD: &str = "_source";
pub const ANALYZER: &str = "standard";

/// Maps any engine error into the crate error.
pub(crate) fn engine<E: std::fmt::Display>(e: E) -> Error {
    Error::Index(e.to_string())
}

pub fn geo_lon_field(name: &str) -> String {
    format!("{name}_lon")
}

pub fn geo_lat_field(name: &str) -> String {
    format!("{name}_lat")
}

/// Tantivy fields behind one mapped document field.
#[derive(Debug, Clone, Copy)]
pub enum MappedField {
    Text(Field),
    GeoPoint { lon: Field, lat: Field },
}

/// Resolved handles for every field of an index.
#[derive(Debug, Clone)]
pub struct SchemaFields {
    pub id: Field,
    pub source: Field,
    pub mapped: BTreeMap<String, (FieldMapping, MappedField)>,
}

impl SchemaFields {
    pub fn resolve(schema: &Schema, mapping: &IndexMapping) -> Result<Self> {
        let id = schema.get_field(ID_FIELD).map_err(engine)?;
        let source = schema.get_field(SOURCE_FIELD).map_err(engine)?;
        let mut mapped = BTreeMap::new();
        for (name, field) in mapping.all_fields() {
            let handle = match field.kind {
                FieldKind::Text => MappedField::Text(schema.get_field(&name).map_err(engine)?),
                FieldKind::GeoPoint => MappedField::GeoPoint {
                    lon: schema.get_field(&geo_lon_field(&name)).map_err(engine)?,
                    lat: schema.get_field(&geo_lat_field(&name)).map_err(engine)?,
                },
            };
            mapped.insert(name, (field, handle));
        }
        Ok(Self { id, source, mapped })
    }

    /// Indexed text fields, in name order.
    pub fn text_fields(&self) -> Vec<Field> {
        self.mapped
            .values()
            .filter_map(|(m, f)| match f {
                MappedField::Text(field) if m.index => Some(*field),
                _ => None,
            })
            .collect()
    }

    /// Name of the geo field called `name`, or of the only geo field when
    /// `name` is `None`.
    pub fn geo_field(&self, name: Option<&str>) -> Result<String> {
        let geo: Vec<&String> = self
            .mapped
            .iter()
            .filter(|(_, (_, f))| matches!(f, MappedField::GeoPoint { .. }))
            .map(|(n, _)| n)
            .collect();
        match name {
            Some(want) if geo.iter().any(|n| **n == want) => Ok(want.to_string()),
            Some(want) => Err(Error::Query(format!("'{want}' is not a geo point field"))),
            None => match geo.as_slice() {
                [only] => Ok((*only).clone()),
                [] => Err(Error::Query("no geo point field is mapped".to_string())),
                _ => Err(Error::Query("several geo point fields are mapped; name one".to_string())),
            },
        }
    }
}

/// Builds the Tantivy schema for a mapping.
///
/// Every document gets a `_id` keyword and its JSON `_source`. Text fields are
/// analyzed with the `standard` analyzer; a geo point becomes a pair of
/// `f64` fast fields, `<name>_lon` and `<name>_lat`.
pub fn build_schema(mapping: &IndexMapping) -> Result<Schema> {
    mapping.validate()?;
    let mut schema_builder = Schema::builder();
    schema_builder.add_text_field(ID_FIELD, STRING | STORED);
    schema_builder.add_text_field(SOURCE_FIELD, TextOptions::default().set_stored());
    for (name, field) in mapping.all_fields() {
        match field.kind {
            FieldKind::Text => {
                let mut options = TextOptions::default();
                if field.index {
                    let indexing = TextFieldIndexing::default()
                        .set_tokenizer(ANALYZER)
                        .set_index_option(IndexRecordOption::WithFreqsAndPositions);
                    options = options.set_indexing_options(indexing);
                }
                if field.store {
                    options = options.set_stored();
                }
                schema_builder.add_text_field(&name, options);
            }
            FieldKind::GeoPoint => {
                for derived in [geo_lon_field(&name), geo_lat_field(&name)] {
                    if mapping.all_fields().contains_key(&derived) {
                        return Err(Error::Mapping(format!(
                            "field '{derived}' collides with geo point '{name}'"
                        )));
                    }
                    let mut options = NumericOptions::default().set_fast();
                    if field.index {
                        options = options.set_indexed();
                    }
                    if field.store {
                        options = options.set_stored();
                    }
                    schema_builder.add_f64_field(&derived, options);
                }
            }
        }
    }
    Ok(schema_builder.build())
}

pub fn register_tokenizer(index: &Index) {
    let stop_words = vec![
        "a","an","and","are","as","at","be","but","by","for","if","in","into","is","it","no","not","of","on","or","such","that","the","their","then","there","these","they","this","to","was","will","with",
    ];
    let tokenizer = TextAnalyzer::builder(SimpleTokenizer::default())
        .filter(RemoveLongFilter::limit(40))
        .filter(LowerCaser)
        .filter(AsciiFoldingFilter)
        .filter(StopWordFilter::remove(stop_words.into_iter().map(|s| s.to_string())))
        .build();
    index.tokenizers().register(ANALYZER, tokenizer);
}

/// Converts a JSON document into a Tantivy document using `mapping`.
///
/// Unmapped keys only live in `_source`. A mapped geo field that cannot be
/// decoded is an error; a missing one is skipped.
pub fn to_tantivy_doc(
    fields: &SchemaFields,
    mapping: &DocumentMapping,
    id: &str,
    source: &JsonValue,
) -> Result<TantivyDocument> {
    let mut doc = TantivyDocument::default();
    doc.add_text(fields.id, id);
    doc.add_text(fields.source, serde_json::to_string(source)?);

    for (name, field_mapping) in &mapping.fields {
        let Some(value) = source.get(name.as_str()) else { continue };
        if value.is_null() {
            continue;
        }
        let Some((_, handle)) = fields.mapped.get(name) else { continue };
        match (field_mapping.kind, handle) {
            (FieldKind::Text, MappedField::Text(field)) => {
                for text in text_values(value) {
                    doc.add_text(*field, text);
                }
            }
            (FieldKind::GeoPoint, MappedField::GeoPoint { lon, lat }) => {
                let point = extract_geo_point(value)
                    .ok_or_else(|| Error::GeoPoint(format!("document '{id}' field '{name}': {value}")))?;
                doc.add_f64(*lon, point.lon);
                doc.add_f64(*lat, point.lat);
            }
            _ => {
                return Err(Error::Mapping(format!("field '{name}' does not match the index schema")));
            }
        }
    }
    Ok(doc)
}

fn text_values(value: &JsonValue) -> Vec<String> {
    match value {
        JsonValue::String(s) => vec![s.clone()],
        JsonValue::Array(items) => items.iter().flat_map(text_values).collect(),
        JsonValue::Number(n) => vec![n.to_string()],
        JsonValue::Bool(b) => vec![b.to_string()],
        JsonValue::Null | JsonValue::Object(_) => vec![],
    }
}

/// The stored value of a mapped field, as JSON.
pub fn stored_value(doc: &TantivyDocument, handle: &MappedField) -> Option<JsonValue> {
    match handle {
        MappedField::Text(field) => {
            let mut texts: Vec<JsonValue> = doc
                .get_all(*field)
                .filter_map(|v| v.as_str().map(|s| JsonValue::String(s.to_string())))
                .collect();
            match texts.len() {
                0 => None,
                1 => texts.pop(),
                _ => Some(JsonValue::Array(texts)),
            }
        }
        MappedField::GeoPoint { lon, lat } => {
            let lon = doc.get_first(*lon).and_then(|v| v.as_f64())?;
            let lat = doc.get_first(*lat).and_then(|v| v.as_f64())?;
            Some(serde_json::json!([lon, lat]))
        }
    }
}

pub fn stored_str(doc: &TantivyDocument, field: Field) -> Option<String> {
    doc.get_first(field).and_then(|v| v.as_str()).map(str::to_string)
}
