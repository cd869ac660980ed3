//! Provider Contracts
//!
//! Pluggable backends behind the query engine. A [`ResourceProvider`] owns
//! enumeration and CRUD for exactly one resource type; a
//! [`PropertyProvider`] enriches already-enumerated resources with
//! properties only it can supply. The engine awaits providers sequentially
//! and never schedules work itself; implementations own their I/O.

mod memory;

pub use memory::{MemoryPropertyProvider, MemoryResourceProvider};

use crate::error::ProviderError;
use crate::predicate::Predicate;
use crate::request::Request;
use crate::resource::{PropertyId, Resource, ResourceType};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};

/// Primary backend for one resource type.
#[async_trait]
pub trait ResourceProvider: Send + Sync {
    /// The one resource type this provider serves.
    fn resource_type(&self) -> ResourceType;

    /// Enumerate resources. The predicate is a hint: returning a superset
    /// is legal (the controller re-applies it), omitting matching resources
    /// is not.
    async fn get_resources(
        &self,
        request: &Request,
        predicate: Option<&Predicate>,
    ) -> Result<Vec<Resource>, ProviderError>;

    /// Create the resources described by the request.
    async fn create_resources(&self, _request: &Request) -> Result<(), ProviderError> {
        Err(ProviderError::Unsupported {
            operation: "create",
        })
    }

    /// Update resources matching the predicate.
    async fn update_resources(
        &self,
        _request: &Request,
        _predicate: Option<&Predicate>,
    ) -> Result<(), ProviderError> {
        Err(ProviderError::Unsupported {
            operation: "update",
        })
    }

    /// Delete resources matching the predicate.
    async fn delete_resources(
        &self,
        _predicate: Option<&Predicate>,
    ) -> Result<(), ProviderError> {
        Err(ProviderError::Unsupported {
            operation: "delete",
        })
    }

    /// The property universe this provider can answer; feeds the schema.
    fn property_ids(&self) -> HashSet<PropertyId>;

    /// Key property per ancestor type, used for schema key lookups and for
    /// correlating enrichment rows to resources.
    fn key_property_ids(&self) -> HashMap<ResourceType, PropertyId> {
        HashMap::new()
    }
}

/// Secondary backend enriching resources with extra properties.
#[async_trait]
pub trait PropertyProvider: Send + Sync {
    /// Enrich resources in place with properties from this provider's
    /// declared set, narrowed to what the request and predicate need (see
    /// [`effective_property_ids`]). Must not write outside the declared set.
    ///
    /// Returns the indices of resources that were successfully populated;
    /// omission signals partial failure and lets the controller decide
    /// whether the affected resources survive.
    async fn populate_resources(
        &self,
        resources: &mut [Resource],
        request: &Request,
        predicate: Option<&Predicate>,
    ) -> Result<Vec<usize>, ProviderError>;

    /// The property universe this provider can supply; feeds the schema.
    fn property_ids(&self) -> HashSet<PropertyId>;
}

/// Property ids a provider should fetch for one call: the request
/// projection (everything when unrestricted) plus any predicate-referenced
/// ids, narrowed to `declared`. Temporal flags are ignored when matching.
pub fn effective_property_ids(
    declared: &HashSet<PropertyId>,
    request: &Request,
    predicate: Option<&Predicate>,
) -> HashSet<PropertyId> {
    let mut wanted = request.requested_of(declared);
    if let Some(predicate) = predicate {
        let referenced = predicate.property_ids();
        wanted.extend(
            declared
                .iter()
                .filter(|d| referenced.iter().any(|r| r.same_property(d)))
                .cloned(),
        );
    }
    wanted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::PredicateBuilder;

    fn declared() -> HashSet<PropertyId> {
        [
            PropertyId::new("host_name", "Hosts"),
            PropertyId::new("state", "Hosts"),
            PropertyId::new("load", "metrics"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_effective_ids_add_predicate_references() {
        let request = Request::new([PropertyId::new("host_name", "Hosts")]);
        let predicate = PredicateBuilder::new()
            .property("load", "metrics")
            .greater_than(0.5)
            .to_predicate();
        let wanted = effective_property_ids(&declared(), &request, Some(&predicate));
        assert_eq!(wanted.len(), 2);
        assert!(wanted.contains(&PropertyId::new("host_name", "Hosts")));
        assert!(wanted.contains(&PropertyId::new("load", "metrics")));
    }

    #[test]
    fn test_effective_ids_ignore_foreign_predicate_references() {
        let request = Request::new([PropertyId::new("state", "Hosts")]);
        let predicate = PredicateBuilder::new()
            .property("elsewhere", "Other")
            .equals("x")
            .to_predicate();
        let wanted = effective_property_ids(&declared(), &request, Some(&predicate));
        assert_eq!(wanted.len(), 1);
    }

    #[test]
    fn test_effective_ids_unrestricted_request_takes_all() {
        let wanted = effective_property_ids(&declared(), &Request::all_properties(), None);
        assert_eq!(wanted, declared());
    }
}
