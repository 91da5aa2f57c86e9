//! Read-only view over the host's content-type and component registry.
//!
//! The populate builder only needs to know, per type id, which attributes
//! exist and whether they point at media, relations, components or dynamic
//! zones. Everything else about an attribute is irrelevant and collapses to
//! [`AttributeDescriptor::Primitive`].

use std::collections::HashMap;

use serde_json::Value as JsonValue;
use tracing::trace;

use crate::{Error, Result};

/// Shape of a single schema attribute, as far as population is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeDescriptor {
    /// Scalar field stored inline; never populated.
    Primitive,
    /// Media reference.
    Media,
    /// Relation to another entity.
    Relation,
    /// Embedded component of the given type id.
    Component(String),
    /// Tagged union over the given component type ids, in declared order.
    DynamicZone(Vec<String>),
}

impl AttributeDescriptor {
    /// Interpret a host attribute definition such as
    /// `{"type": "component", "component": "shared.seo"}`.
    ///
    /// Unknown type tags are primitives.
    pub fn from_json(value: &JsonValue) -> Self {
        let tag = value.get("type").and_then(JsonValue::as_str).unwrap_or("");
        match tag {
            "media" => Self::Media,
            "relation" => Self::Relation,
            "component" => Self::Component(
                value
                    .get("component")
                    .and_then(JsonValue::as_str)
                    .unwrap_or_default()
                    .to_string(),
            ),
            "dynamiczone" => Self::DynamicZone(
                value
                    .get("components")
                    .and_then(JsonValue::as_array)
                    .map(|items| {
                        items
                            .iter()
                            .filter_map(JsonValue::as_str)
                            .map(str::to_string)
                            .collect()
                    })
                    .unwrap_or_default(),
            ),
            _ => Self::Primitive,
        }
    }
}

/// Attributes of one type, in schema-declared order.
pub type Attributes = Vec<(String, AttributeDescriptor)>;

/// Read-only accessor over the host schema registry.
pub trait SchemaView: Send + Sync {
    /// Attributes of a content type or component, or `None` if the id does
    /// not resolve.
    fn attributes_of(&self, type_id: &str) -> Option<&[(String, AttributeDescriptor)]>;
}

/// In-memory schema registry.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    types: HashMap<String, Attributes>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a content type or component.
    pub fn with_type<I, S>(mut self, type_id: impl Into<String>, attributes: I) -> Self
    where
        I: IntoIterator<Item = (S, AttributeDescriptor)>,
        S: Into<String>,
    {
        self.insert(type_id, attributes);
        self
    }

    /// Register or replace a content type or component.
    pub fn insert<I, S>(&mut self, type_id: impl Into<String>, attributes: I)
    where
        I: IntoIterator<Item = (S, AttributeDescriptor)>,
        S: Into<String>,
    {
        let attributes = attributes
            .into_iter()
            .map(|(name, attr)| (name.into(), attr))
            .collect();
        self.types.insert(type_id.into(), attributes);
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Load a registry dump of the form
    /// `{"contentTypes": {uid: {"attributes": {..}}}, "components": {uid: {..}}}`.
    ///
    /// Attributes may also sit under `schema.attributes`.
    pub fn from_json(value: &JsonValue) -> Result<Self> {
        let root = value
            .as_object()
            .ok_or_else(|| Error::InvalidInput("schema dump must be a JSON object".into()))?;

        let mut registry = Self::new();
        for section in ["contentTypes", "components"] {
            let Some(entries) = root.get(section).and_then(JsonValue::as_object) else {
                continue;
            };
            for (uid, model) in entries {
                let attributes = model
                    .get("attributes")
                    .or_else(|| model.get("schema").and_then(|s| s.get("attributes")))
                    .and_then(JsonValue::as_object);
                let Some(attributes) = attributes else {
                    trace!(type_id = %uid, "Schema entry without attributes");
                    registry.insert(uid.clone(), Vec::<(String, AttributeDescriptor)>::new());
                    continue;
                };
                registry.insert(
                    uid.clone(),
                    attributes
                        .iter()
                        .filter(|(_, attr)| attr.is_object())
                        .map(|(name, attr)| (name.clone(), AttributeDescriptor::from_json(attr))),
                );
            }
        }

        if registry.is_empty() {
            return Err(Error::InvalidInput(
                "schema dump contains no contentTypes or components".into(),
            ));
        }
        Ok(registry)
    }
}

impl SchemaView for SchemaRegistry {
    fn attributes_of(&self, type_id: &str) -> Option<&[(String, AttributeDescriptor)]> {
        self.types.get(type_id).map(Vec::as_slice)
    }
}
