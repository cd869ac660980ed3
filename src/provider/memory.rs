//! In-Memory Providers
//!
//! Snapshot-backed provider implementations. The CLI wires inventory files
//! into these; tests use them as deterministic stand-ins for network
//! backends. Real deployments put JMX/REST/database providers behind the
//! same traits.

use super::{effective_property_ids, PropertyProvider, ResourceProvider};
use crate::error::ProviderError;
use crate::predicate::Predicate;
use crate::request::Request;
use crate::resource::{PropertyId, Resource, ResourceType};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};

/// Pairs of (category key, name) used for projection membership checks.
fn id_pairs<'a>(ids: impl IntoIterator<Item = &'a PropertyId>) -> HashSet<(String, String)> {
    ids.into_iter()
        .map(|id| (id.category_key().to_string(), id.name().to_string()))
        .collect()
}

/// Primary provider serving a fixed set of resources from memory.
pub struct MemoryResourceProvider {
    resource_type: ResourceType,
    templates: Vec<Resource>,
    property_ids: HashSet<PropertyId>,
    key_property_ids: HashMap<ResourceType, PropertyId>,
}

impl MemoryResourceProvider {
    pub fn new(resource_type: ResourceType) -> Self {
        Self {
            resource_type,
            templates: Vec::new(),
            property_ids: HashSet::new(),
            key_property_ids: HashMap::new(),
        }
    }

    /// Register the key property linking this type to an ancestor.
    pub fn with_key_property(mut self, ancestor: ResourceType, id: PropertyId) -> Self {
        self.key_property_ids.insert(ancestor, id);
        self
    }

    /// Add a resource to the served set; its properties join the declared
    /// universe.
    pub fn with_resource(mut self, resource: Resource) -> Self {
        self.add_resource(resource);
        self
    }

    pub fn add_resource(&mut self, resource: Resource) {
        for (category, props) in resource.categories() {
            for name in props.keys() {
                self.property_ids
                    .insert(PropertyId::new(name.clone(), category.clone()));
            }
        }
        self.templates.push(resource);
    }

    /// True when the predicate only references properties this provider
    /// declares, so pre-filtering cannot drop resources that would match
    /// after enrichment.
    fn can_prefilter(&self, predicate: &Predicate) -> bool {
        predicate
            .property_ids()
            .iter()
            .all(|id| self.property_ids.iter().any(|d| d.same_property(id)))
    }
}

#[async_trait]
impl ResourceProvider for MemoryResourceProvider {
    fn resource_type(&self) -> ResourceType {
        self.resource_type
    }

    async fn get_resources(
        &self,
        request: &Request,
        predicate: Option<&Predicate>,
    ) -> Result<Vec<Resource>, ProviderError> {
        if request.temporal_info().is_some() {
            tracing::debug!("memory provider has no history; temporal range ignored");
        }

        let wanted = id_pairs(&effective_property_ids(
            &self.property_ids,
            request,
            predicate,
        ));
        // Identity keys always ride along so enrichment and linking work
        // even under a narrow projection.
        let keys = id_pairs(self.key_property_ids.values());

        let prefilter = predicate.filter(|p| self.can_prefilter(p));

        let mut resources = Vec::new();
        for template in &self.templates {
            if let Some(predicate) = prefilter {
                if !predicate.evaluate(template) {
                    continue;
                }
            }
            let mut resource = Resource::new(self.resource_type);
            for (category, props) in template.categories() {
                for (name, value) in props {
                    let pair = (category.clone(), name.clone());
                    if wanted.contains(&pair) || keys.contains(&pair) {
                        resource
                            .set_property(&PropertyId::new(name.clone(), category.clone()), value);
                    }
                }
            }
            resources.push(resource);
        }
        Ok(resources)
    }

    fn property_ids(&self) -> HashSet<PropertyId> {
        self.property_ids.clone()
    }

    fn key_property_ids(&self) -> HashMap<ResourceType, PropertyId> {
        self.key_property_ids.clone()
    }
}

/// Secondary provider joining extra properties onto resources by a key
/// property, like a metrics store keyed by host name.
///
/// A resource whose key has no row counts as a backend miss: it is left
/// untouched and omitted from the populated set.
pub struct MemoryPropertyProvider {
    key: PropertyId,
    rows: HashMap<String, Vec<(PropertyId, String)>>,
    property_ids: HashSet<PropertyId>,
    failure: Option<String>,
}

impl MemoryPropertyProvider {
    /// `key` is the property used to correlate resources to rows.
    pub fn new(key: PropertyId) -> Self {
        Self {
            key,
            rows: HashMap::new(),
            property_ids: HashSet::new(),
            failure: None,
        }
    }

    /// Add one enrichment value for the resource whose key property equals
    /// `key_value`.
    pub fn with_value(
        mut self,
        key_value: impl Into<String>,
        property: PropertyId,
        value: impl Into<crate::resource::PropertyValue>,
    ) -> Self {
        self.property_ids.insert(property.clone());
        self.rows
            .entry(key_value.into())
            .or_default()
            .push((property, value.into().canonical()));
        self
    }

    /// Make every `populate_resources` call fail, simulating an unreachable
    /// backend.
    pub fn with_failure(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }
}

#[async_trait]
impl PropertyProvider for MemoryPropertyProvider {
    async fn populate_resources(
        &self,
        resources: &mut [Resource],
        request: &Request,
        predicate: Option<&Predicate>,
    ) -> Result<Vec<usize>, ProviderError> {
        if let Some(message) = &self.failure {
            return Err(ProviderError::backend(message.clone()));
        }

        let wanted = effective_property_ids(&self.property_ids, request, predicate);
        if wanted.is_empty() {
            // Nothing to add; every resource counts as populated.
            return Ok((0..resources.len()).collect());
        }
        let wanted = id_pairs(&wanted);

        let mut populated = Vec::new();
        for (index, resource) in resources.iter_mut().enumerate() {
            let Some(key_value) = resource.property_value(&self.key).map(str::to_string) else {
                continue;
            };
            let Some(rows) = self.rows.get(&key_value) else {
                continue;
            };
            for (id, value) in rows {
                if wanted.contains(&(id.category_key().to_string(), id.name().to_string())) {
                    resource.set_property(id, value.as_str());
                }
            }
            populated.push(index);
        }
        Ok(populated)
    }

    fn property_ids(&self) -> HashSet<PropertyId> {
        self.property_ids.clone()
    }
}
