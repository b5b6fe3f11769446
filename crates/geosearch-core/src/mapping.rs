//! Declarative document mapping.
//!
//! A mapping says which fields of a JSON document are indexed, how, and
//! whether their values are kept for retrieval. It is plain data so it can be
//! built, validated and serialized without any index backend around.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::{Error, Result};

/// Field names owned by the index itself.
pub const RESERVED_FIELDS: &[&str] = &["_id", "_source"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Analyzed free text.
    Text,
    /// A (longitude, latitude) pair usable in distance queries.
    GeoPoint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    pub kind: FieldKind,
    pub index: bool,
    pub store: bool,
}

impl FieldMapping {
    pub fn text() -> Self {
        Self { kind: FieldKind::Text, index: true, store: false }
    }

    pub fn geo_point() -> Self {
        Self { kind: FieldKind::GeoPoint, index: true, store: false }
    }

    pub fn stored(mut self) -> Self {
        self.store = true;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMapping {
    pub fields: BTreeMap<String, FieldMapping>,
}

impl DocumentMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, name: impl Into<String>, mapping: FieldMapping) -> Self {
        self.fields.insert(name.into(), mapping);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexMapping {
    pub types: BTreeMap<String, DocumentMapping>,
    pub default_mapping: DocumentMapping,
    /// Document key whose string value selects an entry of `types`.
    pub type_field: String,
}

impl Default for IndexMapping {
    fn default() -> Self {
        Self {
            types: BTreeMap::new(),
            default_mapping: DocumentMapping::default(),
            type_field: "type".to_string(),
        }
    }
}

impl IndexMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_document_mapping(&mut self, type_name: impl Into<String>, mapping: DocumentMapping) {
        self.types.insert(type_name.into(), mapping);
    }

    pub fn set_default_mapping(&mut self, mapping: DocumentMapping) {
        self.default_mapping = mapping;
    }

    /// The document mapping that applies to `doc`.
    pub fn mapping_for(&self, doc: &Value) -> &DocumentMapping {
        doc.get(&self.type_field)
            .and_then(Value::as_str)
            .and_then(|t| self.types.get(t))
            .unwrap_or(&self.default_mapping)
    }

    /// Every mapped field across the default and typed mappings.
    ///
    /// Call `validate` first: when two mappings disagree on a field, the
    /// first one seen wins here.
    pub fn all_fields(&self) -> BTreeMap<String, FieldMapping> {
        let mut out = BTreeMap::new();
        for mapping in std::iter::once(&self.default_mapping).chain(self.types.values()) {
            for (name, field) in &mapping.fields {
                out.entry(name.clone()).or_insert(*field);
            }
        }
        out
    }

    pub fn validate(&self) -> Result<()> {
        if self.type_field.is_empty() {
            return Err(Error::Mapping("type field name must not be empty".to_string()));
        }
        let mut seen: BTreeMap<&str, FieldMapping> = BTreeMap::new();
        for mapping in std::iter::once(&self.default_mapping).chain(self.types.values()) {
            for (name, field) in &mapping.fields {
                validate_field_name(name)?;
                if !field.index && !field.store {
                    return Err(Error::Mapping(format!(
                        "field '{name}' is neither indexed nor stored"
                    )));
                }
                match seen.get(name.as_str()) {
                    Some(prev) if prev != field => {
                        return Err(Error::Mapping(format!(
                            "field '{name}' is mapped inconsistently across document types"
                        )));
                    }
                    Some(_) => {}
                    None => {
                        seen.insert(name.as_str(), *field);
                    }
                }
            }
        }
        if seen.is_empty() {
            return Err(Error::Mapping("no fields are mapped".to_string()));
        }
        Ok(())
    }
}

fn validate_field_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::Mapping("field name must not be empty".to_string()));
    }
    if RESERVED_FIELDS.contains(&name) {
        return Err(Error::Mapping(format!("field name '{name}' is reserved")));
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') || name.starts_with('_') {
        return Err(Error::Mapping(format!(
            "field name '{name}' must be ascii alphanumeric or '_' and not start with '_'"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn place() -> DocumentMapping {
        DocumentMapping::new()
            .with_field("name", FieldMapping::text().stored())
            .with_field("location", FieldMapping::geo_point().stored())
    }

    #[test]
    fn default_mapping_applies_to_untyped_documents() {
        let mut mapping = IndexMapping::new();
        mapping.add_document_mapping("place", place());
        mapping.set_default_mapping(place());
        mapping.validate().unwrap();

        let doc = json!({"id": "1", "name": "x"});
        assert_eq!(mapping.mapping_for(&doc), &place());
        assert_eq!(mapping.all_fields().keys().collect::<Vec<_>>(), vec!["location", "name"]);
    }

    #[test]
    fn typed_documents_pick_their_mapping() {
        let mut mapping = IndexMapping::new();
        mapping.add_document_mapping("place", place());
        let road = DocumentMapping::new().with_field("label", FieldMapping::text());
        mapping.add_document_mapping("road", road.clone());
        mapping.set_default_mapping(place());

        assert_eq!(mapping.mapping_for(&json!({"type": "road"})), &road);
        assert_eq!(mapping.mapping_for(&json!({"type": "unknown"})), &place());
        assert_eq!(mapping.all_fields().len(), 3);
    }

    #[test]
    fn rejects_conflicting_kinds() {
        let mut mapping = IndexMapping::new();
        mapping.set_default_mapping(place());
        mapping.add_document_mapping(
            "other",
            DocumentMapping::new().with_field("name", FieldMapping::geo_point()),
        );
        assert!(matches!(mapping.validate(), Err(Error::Mapping(_))));
    }

    #[test]
    fn rejects_bad_field_names() {
        for bad in ["", "_id", "_source", "na me", "_private"] {
            let mut mapping = IndexMapping::new();
            mapping.set_default_mapping(DocumentMapping::new().with_field(bad, FieldMapping::text()));
            assert!(mapping.validate().is_err(), "{bad:?} should be rejected");
        }
        assert!(IndexMapping::new().validate().is_err());
    }

    #[test]
    fn survives_json_round_trip() {
        let mut mapping = IndexMapping::new();
        mapping.add_document_mapping("place", place());
        mapping.set_default_mapping(place());
        let text = serde_json::to_string(&mapping).unwrap();
        let back: IndexMapping = serde_json::from_str(&text).unwrap();
        assert_eq!(back, mapping);
    }
}
