//! Resource Model
//!
//! Typed resources and the property addressing scheme shared by every
//! provider. A resource is a bag of string-valued properties grouped by
//! category; a [`PropertyId`] addresses one field inside that bag.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Storage bucket for properties whose id carries no category.
pub const ROOT_CATEGORY: &str = "";

/// Resource kinds known to the query engine.
///
/// The enum is closed: new kinds are added here and nowhere else, so every
/// `match` over a resource type is checked at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Cluster,
    Service,
    Host,
    Component,
    HostComponent,
}

impl ResourceType {
    /// All known resource types, in ancestry order.
    pub const ALL: [ResourceType; 5] = [
        ResourceType::Cluster,
        ResourceType::Service,
        ResourceType::Host,
        ResourceType::Component,
        ResourceType::HostComponent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cluster => "cluster",
            Self::Service => "service",
            Self::Host => "host",
            Self::Component => "component",
            Self::HostComponent => "host_component",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cluster" | "clusters" => Ok(Self::Cluster),
            "service" | "services" => Ok(Self::Service),
            "host" | "hosts" => Ok(Self::Host),
            "component" | "components" => Ok(Self::Component),
            "host_component" | "host-component" | "hostcomponent" | "host_components" => {
                Ok(Self::HostComponent)
            }
            other => Err(format!("unknown resource type: {}", other)),
        }
    }
}

/// Identifies one addressable field on a resource.
///
/// Identity is the (name, category, temporal) triple; two separately
/// constructed ids with the same fields compare equal and hash identically,
/// so ids work as map and set keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PropertyId {
    name: String,
    category: Option<String>,
    temporal: bool,
}

impl PropertyId {
    /// Create a property id under a category.
    ///
    /// An empty category string means the root/uncategorized bucket, same as
    /// [`PropertyId::root`].
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        let category = category.into();
        Self {
            name: name.into(),
            category: if category.is_empty() {
                None
            } else {
                Some(category)
            },
            temporal: false,
        }
    }

    /// Create a property id in the root bucket.
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: None,
            temporal: false,
        }
    }

    /// Parse a `category/name` path; everything before the last `/` is the
    /// category, so nested categories like `metrics/cpu/load` work. A bare
    /// name lands in the root bucket.
    pub fn from_path(path: &str) -> Self {
        match path.rsplit_once('/') {
            Some((category, name)) => Self::new(name, category),
            None => Self::root(path),
        }
    }

    /// Mark this id as temporal (a metric with a time dimension).
    pub fn temporal(mut self) -> Self {
        self.temporal = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn is_temporal(&self) -> bool {
        self.temporal
    }

    /// Same id with the temporal flag cleared. Temporal and point-in-time
    /// requests address the same underlying property.
    pub fn base(&self) -> PropertyId {
        PropertyId {
            name: self.name.clone(),
            category: self.category.clone(),
            temporal: false,
        }
    }

    /// True when both ids address the same (category, name) field,
    /// regardless of the temporal flag.
    pub fn same_property(&self, other: &PropertyId) -> bool {
        self.name == other.name && self.category == other.category
    }

    /// Category bucket key used for storage; the root bucket for ids
    /// without a category.
    pub fn category_key(&self) -> &str {
        self.category.as_deref().unwrap_or(ROOT_CATEGORY)
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.category {
            Some(category) => write!(f, "{}/{}", category, self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// Value accepted by [`Resource::set_property`].
///
/// Every value canonicalizes to a string on store; numeric conversions go
/// through Rust's locale-independent formatting.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Text(String),
    Integer(i64),
    Unsigned(u64),
    Float(f64),
    Bool(bool),
}

impl PropertyValue {
    /// Canonical string form stored on the resource.
    pub fn canonical(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Integer(n) => n.to_string(),
            Self::Unsigned(n) => n.to_string(),
            Self::Float(n) => n.to_string(),
            Self::Bool(b) => b.to_string(),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&String> for PropertyValue {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

impl From<i32> for PropertyValue {
    fn from(value: i32) -> Self {
        Self::Integer(value as i64)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<u64> for PropertyValue {
    fn from(value: u64) -> Self {
        Self::Unsigned(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// One instance of a typed cluster entity.
///
/// Properties live in `category -> (name -> string value)` maps. Resources
/// are created by a resource provider per query, enriched in place by
/// property providers, and treated as read-only once a query returns. Not
/// safe for concurrent mutation; enrichment is sequential by design.
#[derive(Debug, Clone, Serialize)]
pub struct Resource {
    #[serde(rename = "type")]
    resource_type: ResourceType,
    categories: BTreeMap<String, BTreeMap<String, String>>,
}

impl Resource {
    pub fn new(resource_type: ResourceType) -> Self {
        Self {
            resource_type,
            categories: BTreeMap::new(),
        }
    }

    /// The type this resource was created with.
    pub fn resource_type(&self) -> ResourceType {
        self.resource_type
    }

    /// Read-only view of the backing category map.
    pub fn categories(&self) -> &BTreeMap<String, BTreeMap<String, String>> {
        &self.categories
    }

    /// Store a property value; the last write for a (category, name) pair
    /// wins. Numeric values canonicalize to strings (see [`PropertyValue`]).
    pub fn set_property(&mut self, id: &PropertyId, value: impl Into<PropertyValue>) {
        self.categories
            .entry(id.category_key().to_string())
            .or_default()
            .insert(id.name().to_string(), value.into().canonical());
    }

    /// Stored value for the id, or `None` when the category or name is
    /// absent. Never an error.
    pub fn property_value(&self, id: &PropertyId) -> Option<&str> {
        self.categories
            .get(id.category_key())?
            .get(id.name())
            .map(String::as_str)
    }

    /// True when any property exists under the category, directly or in a
    /// nested sub-category.
    pub fn has_category(&self, category: &str) -> bool {
        let prefix = format!("{}/", category);
        self.categories.iter().any(|(key, props)| {
            (key == category || key.starts_with(&prefix)) && !props.is_empty()
        })
    }

    /// Flattened `category/name -> value` view, root properties under their
    /// bare name. Used for rendering and column discovery.
    pub fn flat_properties(&self) -> BTreeMap<String, String> {
        let mut flat = BTreeMap::new();
        for (category, props) in &self.categories {
            for (name, value) in props {
                let key = if category.is_empty() {
                    name.clone()
                } else {
                    format!("{}/{}", category, name)
                };
                flat.insert(key, value.clone());
            }
        }
        flat
    }
}
