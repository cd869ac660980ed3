//! Schema Registry
//!
//! Per-type introspection data: which categories and property names a
//! resource type exposes across its whole provider set, and which property
//! keys link it to ancestor types. Schemas are built once when the
//! controller is assembled and stay stable afterwards; a provider whose
//! declared set changes at runtime is stale until restart.

use crate::provider::{PropertyProvider, ResourceProvider};
use crate::resource::{PropertyId, ResourceType};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Introspection data for one resource type.
#[derive(Debug)]
pub struct Schema {
    resource_type: ResourceType,
    key_property_ids: HashMap<ResourceType, PropertyId>,
    categories: BTreeMap<String, BTreeSet<String>>,
    property_ids: HashSet<PropertyId>,
}

impl Schema {
    /// Union the declared property sets of the primary provider and every
    /// property provider into one category map. Ids are normalized to their
    /// base (non-temporal) form.
    pub(crate) fn new(
        provider: &dyn ResourceProvider,
        property_providers: &[Box<dyn PropertyProvider>],
    ) -> Self {
        let mut property_ids: HashSet<PropertyId> = provider
            .property_ids()
            .iter()
            .map(PropertyId::base)
            .collect();
        for property_provider in property_providers {
            property_ids.extend(property_provider.property_ids().iter().map(PropertyId::base));
        }

        let mut categories: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for id in &property_ids {
            categories
                .entry(id.category_key().to_string())
                .or_default()
                .insert(id.name().to_string());
        }

        Self {
            resource_type: provider.resource_type(),
            key_property_ids: provider.key_property_ids(),
            categories,
            property_ids,
        }
    }

    pub fn resource_type(&self) -> ResourceType {
        self.resource_type
    }

    /// Key property linking this type to the given ancestor, or `None` when
    /// no direct key relationship exists. Callers walk the ancestor chain
    /// for transitive keys.
    pub fn key_property_id(&self, ancestor: ResourceType) -> Option<&PropertyId> {
        self.key_property_ids.get(&ancestor)
    }

    /// `category -> property names` across the whole provider set; root
    /// properties live under the empty category key.
    pub fn categories(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.categories
    }

    /// Flat union of declared ids, base-normalized.
    pub fn property_ids(&self) -> &HashSet<PropertyId> {
        &self.property_ids
    }

    /// True when some provider for this type declares the property.
    /// Temporal flags are ignored; a temporal request addresses the same
    /// underlying property.
    pub fn supports(&self, id: &PropertyId) -> bool {
        self.property_ids.contains(&id.base())
    }
}
