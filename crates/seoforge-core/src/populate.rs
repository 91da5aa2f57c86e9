//! Populate-tree derivation over a possibly cyclic schema graph.
//!
//! [`PopulateTreeBuilder::build`] walks a content type's attributes and
//! produces a [`PopulateSpec`] telling the host which relations, media,
//! nested components and dynamic-zone variants to materialize.
//!
//! Termination rests on two guards threaded through the recursion:
//! - a depth budget that decreases by one per component level, and
//! - a branch-local `visited` set of component ids; revisiting a component
//!   on the same path collapses it to a leaf.
//!
//! The `visited` set is copied at every divergence, so sibling branches
//! never starve each other.
//!
//! Serialized form (the host's populate syntax):
//!
//! ```text
//! {attr: {}}                              fetch one level
//! {attr: {"populate": {...}}}             nested component
//! {attr: {"on": {variant: {} | {"populate": {...}}}}}   dynamic zone
//! ```

use std::collections::{BTreeMap, BTreeSet};

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value as JsonValue;
use tracing::{debug, trace};

use crate::defaults;
use crate::schema::{AttributeDescriptor, SchemaView};

/// Population instruction for one attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopulateNode {
    /// Fetch with no further nesting.
    Leaf,
    /// Component; nested spec may be empty.
    Nested(PopulateSpec),
    /// Dynamic zone; one spec per variant type id.
    Union(BTreeMap<String, PopulateSpec>),
}

impl PopulateNode {
    /// Number of nesting levels below this attribute.
    pub fn depth(&self) -> usize {
        match self {
            Self::Leaf => 0,
            Self::Nested(spec) => 1 + spec.depth(),
            Self::Union(variants) => {
                1 + variants.values().map(PopulateSpec::depth).max().unwrap_or(0)
            }
        }
    }
}

/// Mapping from attribute name to population instruction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PopulateSpec {
    entries: BTreeMap<String, PopulateNode>,
}

impl PopulateSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, attribute: &str) -> Option<&PopulateNode> {
        self.entries.get(attribute)
    }

    pub fn insert(&mut self, attribute: impl Into<String>, node: PopulateNode) {
        self.entries.insert(attribute.into(), node);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PopulateNode)> {
        self.entries.iter()
    }

    /// Deepest nesting level of any path in the spec.
    pub fn depth(&self) -> usize {
        self.entries.values().map(PopulateNode::depth).max().unwrap_or(0)
    }

    /// Host populate syntax as a JSON value.
    pub fn to_json(&self) -> JsonValue {
        serde_json::to_value(self).unwrap_or_else(|_| JsonValue::Object(Default::default()))
    }
}

/// Serializes a nested spec as `{}` when empty, `{"populate": {...}}` otherwise.
struct NestedEntry<'a>(&'a PopulateSpec);

impl Serialize for NestedEntry<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0.is_empty() {
            return serializer.serialize_map(Some(0))?.end();
        }
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("populate", self.0)?;
        map.end()
    }
}

struct UnionEntry<'a>(&'a BTreeMap<String, PopulateSpec>);

impl Serialize for UnionEntry<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (variant, spec) in self.0 {
            map.serialize_entry(variant, &NestedEntry(spec))?;
        }
        map.end()
    }
}

impl Serialize for PopulateNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Leaf => serializer.serialize_map(Some(0))?.end(),
            Self::Nested(spec) => NestedEntry(spec).serialize(serializer),
            Self::Union(variants) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("on", &UnionEntry(variants))?;
                map.end()
            }
        }
    }
}

impl Serialize for PopulateSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, node) in &self.entries {
            map.serialize_entry(name, node)?;
        }
        map.end()
    }
}

/// Clamp a caller-supplied depth to the supported range.
///
/// Missing or non-positive values fall back to the default depth.
pub fn clamp_depth(requested: Option<i64>) -> i32 {
    let depth = match requested {
        Some(depth) if depth > 0 => depth.min(defaults::POPULATE_DEPTH_MAX as i64) as i32,
        _ => defaults::POPULATE_DEPTH,
    };
    depth.max(defaults::POPULATE_DEPTH_MIN)
}

/// Derives populate specs from a [`SchemaView`].
///
/// Pure and reentrant: holds only a shared reference to the schema.
pub struct PopulateTreeBuilder<'a, S: SchemaView + ?Sized> {
    schema: &'a S,
}

impl<'a, S: SchemaView + ?Sized> PopulateTreeBuilder<'a, S> {
    pub fn new(schema: &'a S) -> Self {
        Self { schema }
    }

    /// Build the populate spec for `type_id` down to `max_depth` component
    /// levels. Unknown type ids yield an empty spec.
    pub fn build(&self, type_id: &str, max_depth: i32) -> PopulateSpec {
        self.build_with_visited(type_id, max_depth, &BTreeSet::new())
    }

    /// Build with an explicit set of component ids already on the path.
    pub fn build_with_visited(
        &self,
        type_id: &str,
        max_depth: i32,
        visited: &BTreeSet<String>,
    ) -> PopulateSpec {
        let Some(attributes) = self.schema.attributes_of(type_id) else {
            debug!(type_id, "Schema resolution miss, populating nothing");
            return PopulateSpec::new();
        };

        let mut spec = PopulateSpec::new();
        for (name, attribute) in attributes {
            trace!(type_id, attribute = %name, depth = max_depth, "Visiting attribute");
            match attribute {
                AttributeDescriptor::Primitive => {}
                AttributeDescriptor::Media | AttributeDescriptor::Relation => {
                    spec.insert(name.clone(), PopulateNode::Leaf);
                }
                AttributeDescriptor::Component(target) => {
                    spec.insert(name.clone(), self.component_node(target, max_depth, visited));
                }
                AttributeDescriptor::DynamicZone(variants) => {
                    if let Some(node) = self.union_node(variants, max_depth, visited) {
                        spec.insert(name.clone(), node);
                    }
                }
            }
        }
        spec
    }

    fn component_node(&self, target: &str, depth: i32, visited: &BTreeSet<String>) -> PopulateNode {
        if depth <= 0 || visited.contains(target) {
            return PopulateNode::Leaf;
        }
        let mut branch = visited.clone();
        branch.insert(target.to_string());
        PopulateNode::Nested(self.build_with_visited(target, depth - 1, &branch))
    }

    /// `None` only for a zone that lists no variants. Variants without
    /// populatable attributes stay in the union as empty specs.
    fn union_node(
        &self,
        variants: &[String],
        depth: i32,
        visited: &BTreeSet<String>,
    ) -> Option<PopulateNode> {
        if variants.is_empty() {
            return None;
        }
        if depth <= 0 {
            return Some(PopulateNode::Leaf);
        }

        let mut on = BTreeMap::new();
        for variant in variants {
            let spec = if visited.contains(variant) {
                PopulateSpec::new()
            } else {
                let mut branch = visited.clone();
                branch.insert(variant.clone());
                self.build_with_visited(variant, depth - 1, &branch)
            };
            on.insert(variant.clone(), spec);
        }

        Some(PopulateNode::Union(on))
    }
}
