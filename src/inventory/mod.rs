//! Inventory Snapshots
//!
//! JSON-backed cluster state for the CLI: a snapshot file lists resources
//! per type as flat `category/name -> value` maps, wired into in-memory
//! providers behind the regular provider contracts. This is command-line
//! plumbing, not a core wire format; deployments with live backends
//! register their own providers instead.

use crate::controller::ClusterController;
use crate::error::ProviderError;
use crate::provider::{MemoryPropertyProvider, MemoryResourceProvider};
use crate::resource::{PropertyId, Resource, ResourceType};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// One resource as a flat `category/name -> value` map.
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct ResourceEntry(pub BTreeMap<String, Value>);

impl ResourceEntry {
    pub fn to_resource(&self, resource_type: ResourceType) -> Resource {
        let mut resource = Resource::new(resource_type);
        for (path, value) in &self.0 {
            resource.set_property(&PropertyId::from_path(path), canonical_value(value));
        }
        resource
    }
}

/// Enrichment rows for one host, keyed by host name.
#[derive(Debug, Clone, Deserialize)]
pub struct HostMetricsEntry {
    pub host_name: String,
    pub properties: BTreeMap<String, Value>,
}

/// Root structure of an inventory snapshot file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Inventory {
    #[serde(default)]
    pub clusters: Vec<ResourceEntry>,
    #[serde(default)]
    pub services: Vec<ResourceEntry>,
    #[serde(default)]
    pub hosts: Vec<ResourceEntry>,
    #[serde(default)]
    pub components: Vec<ResourceEntry>,
    #[serde(default)]
    pub host_components: Vec<ResourceEntry>,
    /// Optional metrics rows, wired in as a property provider over hosts.
    #[serde(default)]
    pub host_metrics: Vec<HostMetricsEntry>,
}

impl Inventory {
    /// Load a snapshot from disk.
    pub fn load(path: &Path) -> Result<Self, ProviderError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse a snapshot from a JSON string.
    pub fn from_json(content: &str) -> Result<Self, ProviderError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn entries(&self, resource_type: ResourceType) -> &[ResourceEntry] {
        match resource_type {
            ResourceType::Cluster => &self.clusters,
            ResourceType::Service => &self.services,
            ResourceType::Host => &self.hosts,
            ResourceType::Component => &self.components,
            ResourceType::HostComponent => &self.host_components,
        }
    }

    /// Wire the snapshot into a controller: one memory provider per type
    /// with entries, plus a metrics property provider over hosts when the
    /// snapshot carries metrics rows.
    pub fn into_controller(self) -> ClusterController {
        let mut builder = ClusterController::builder();

        for resource_type in ResourceType::ALL {
            let entries = self.entries(resource_type);
            if entries.is_empty() {
                continue;
            }
            let mut provider = MemoryResourceProvider::new(resource_type);
            for (ancestor, id) in key_property_ids(resource_type) {
                provider = provider.with_key_property(ancestor, id);
            }
            for entry in entries {
                provider.add_resource(entry.to_resource(resource_type));
            }
            tracing::debug!(%resource_type, count = entries.len(), "loaded inventory entries");
            builder = builder.provider(provider);
        }

        if !self.host_metrics.is_empty() {
            let mut enricher = MemoryPropertyProvider::new(PropertyId::new("host_name", "Hosts"));
            for row in &self.host_metrics {
                for (path, value) in &row.properties {
                    enricher = enricher.with_value(
                        row.host_name.clone(),
                        PropertyId::from_path(path),
                        canonical_value(value),
                    );
                }
            }
            builder = builder.property_provider(ResourceType::Host, enricher);
        }

        builder.build()
    }
}

/// Well-known identity keys of the snapshot format, per resource type.
pub fn key_property_ids(resource_type: ResourceType) -> Vec<(ResourceType, PropertyId)> {
    use ResourceType::*;
    match resource_type {
        Cluster => vec![(Cluster, PropertyId::new("cluster_name", "Clusters"))],
        Service => vec![
            (Service, PropertyId::new("service_name", "Services")),
            (Cluster, PropertyId::new("cluster_name", "Services")),
        ],
        Host => vec![
            (Host, PropertyId::new("host_name", "Hosts")),
            (Cluster, PropertyId::new("cluster_name", "Hosts")),
        ],
        Component => vec![
            (Component, PropertyId::new("component_name", "Components")),
            (Service, PropertyId::new("service_name", "Components")),
            (Cluster, PropertyId::new("cluster_name", "Components")),
        ],
        HostComponent => vec![
            (
                HostComponent,
                PropertyId::new("component_name", "HostComponents"),
            ),
            (Host, PropertyId::new("host_name", "HostComponents")),
            (Service, PropertyId::new("service_name", "HostComponents")),
            (Cluster, PropertyId::new("cluster_name", "HostComponents")),
        ],
    }
}

fn canonical_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        // Nested structures are rare in snapshots; store them verbatim.
        other => other.to_string(),
    }
}
