//! Cluster Controller
//!
//! The query façade. A controller is assembled once at startup from
//! per-type provider sets, then answers `get_resources` / `get_schema`
//! calls read-only: schema lookup, projection validation, primary
//! dispatch, sequential enrichment, and a defensive predicate pass over
//! the merged result.

use crate::error::QueryError;
use crate::predicate::Predicate;
use crate::provider::{effective_property_ids, PropertyProvider, ResourceProvider};
use crate::request::Request;
use crate::resource::{PropertyId, Resource, ResourceType};
use crate::schema::Schema;
use std::collections::{HashMap, HashSet};

struct Registration {
    provider: Box<dyn ResourceProvider>,
    property_providers: Vec<Box<dyn PropertyProvider>>,
    schema: Schema,
}

/// Assembles a [`ClusterController`] from providers. Registration order of
/// property providers is preserved; enrichment runs in that order.
#[derive(Default)]
pub struct ClusterControllerBuilder {
    providers: Vec<Box<dyn ResourceProvider>>,
    property_providers: Vec<(ResourceType, Box<dyn PropertyProvider>)>,
}

impl ClusterControllerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the primary provider for its resource type. Registering a
    /// second provider for the same type replaces the first.
    pub fn provider(mut self, provider: impl ResourceProvider + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    /// Attach a property provider to the given resource type.
    pub fn property_provider(
        mut self,
        resource_type: ResourceType,
        provider: impl PropertyProvider + 'static,
    ) -> Self {
        self.property_providers
            .push((resource_type, Box::new(provider)));
        self
    }

    /// Build the controller and its schemas. Property providers attached to
    /// a type with no primary provider are dropped with a warning.
    pub fn build(self) -> ClusterController {
        let mut primaries: HashMap<ResourceType, Box<dyn ResourceProvider>> = HashMap::new();
        for provider in self.providers {
            let resource_type = provider.resource_type();
            if primaries.insert(resource_type, provider).is_some() {
                tracing::warn!(%resource_type, "replacing previously registered provider");
            }
        }

        let mut secondaries: HashMap<ResourceType, Vec<Box<dyn PropertyProvider>>> =
            HashMap::new();
        for (resource_type, property_provider) in self.property_providers {
            if primaries.contains_key(&resource_type) {
                secondaries
                    .entry(resource_type)
                    .or_default()
                    .push(property_provider);
            } else {
                tracing::warn!(
                    %resource_type,
                    "dropping property provider for unregistered resource type"
                );
            }
        }

        let registrations = primaries
            .into_iter()
            .map(|(resource_type, provider)| {
                let property_providers = secondaries.remove(&resource_type).unwrap_or_default();
                let schema = Schema::new(&*provider, &property_providers);
                (
                    resource_type,
                    Registration {
                        provider,
                        property_providers,
                        schema,
                    },
                )
            })
            .collect();

        ClusterController { registrations }
    }
}

/// Coordinates schema lookup, provider dispatch, and predicate
/// re-application. Read-only after construction; share freely behind an
/// `Arc` across caller tasks.
pub struct ClusterController {
    registrations: HashMap<ResourceType, Registration>,
}

impl ClusterController {
    pub fn builder() -> ClusterControllerBuilder {
        ClusterControllerBuilder::new()
    }

    /// Resource types with a registered provider set, sorted.
    pub fn resource_types(&self) -> Vec<ResourceType> {
        let mut types: Vec<ResourceType> = self.registrations.keys().copied().collect();
        types.sort();
        types
    }

    /// Schema for the type; the same instance is returned across calls.
    pub fn get_schema(&self, resource_type: ResourceType) -> Result<&Schema, QueryError> {
        self.registrations
            .get(&resource_type)
            .map(|registration| &registration.schema)
            .ok_or(QueryError::UnknownResourceType(resource_type))
    }

    /// Run a query: enumerate through the primary provider, enrich through
    /// the property providers in registration order, and return the merged
    /// set with the predicate re-applied lazily at iteration time.
    ///
    /// Unknown types and projections outside the declared property universe
    /// are rejected before any provider runs. Primary failures abort the
    /// call; enrichment failures degrade per the sole-supplier policy (see
    /// module docs and [`PropertyProvider::populate_resources`]).
    pub async fn get_resources(
        &self,
        resource_type: ResourceType,
        request: &Request,
        predicate: Option<&Predicate>,
    ) -> Result<QueryResult, QueryError> {
        let registration = self
            .registrations
            .get(&resource_type)
            .ok_or(QueryError::UnknownResourceType(resource_type))?;
        let schema = &registration.schema;

        // Reject bad projections before any backend call.
        let mut unsupported: Vec<String> = request
            .property_ids()
            .iter()
            .filter(|id| !schema.supports(id))
            .map(ToString::to_string)
            .collect();
        if !unsupported.is_empty() {
            unsupported.sort();
            return Err(QueryError::UnsupportedProperty {
                resource_type,
                properties: unsupported,
            });
        }

        let predicate_ids: HashSet<PropertyId> = predicate
            .map(|p| p.property_ids())
            .unwrap_or_default();
        // Predicate-only references outside the declared universe are not an
        // error; they simply never match. Leave a trace for operators
        // puzzled by empty results.
        for id in &predicate_ids {
            if !schema.supports(id) {
                tracing::debug!(property = %id, %resource_type, "predicate references undeclared property; it will never match");
            }
        }

        tracing::debug!(
            %resource_type,
            requested = request.property_ids().len(),
            filtered = predicate.is_some(),
            "dispatching primary provider"
        );
        let mut resources = registration
            .provider
            .get_resources(request, predicate)
            .await?;
        tracing::debug!(count = resources.len(), "primary provider returned");

        for (position, property_provider) in registration.property_providers.iter().enumerate() {
            let declared = property_provider.property_ids();
            if effective_property_ids(&declared, request, predicate).is_empty() {
                tracing::debug!(position, "skipping property provider; nothing requested of it");
                continue;
            }

            // Properties this provider alone declares among the explicit
            // projection. Missing one of these is grounds to drop the
            // affected resource; optional extras are not.
            let sole: Vec<&PropertyId> = request
                .property_ids()
                .iter()
                .filter(|id| declared.iter().any(|d| d.same_property(id)))
                .filter(|id| {
                    !registration
                        .provider
                        .property_ids()
                        .iter()
                        .any(|d| d.same_property(id))
                        && !registration
                            .property_providers
                            .iter()
                            .enumerate()
                            .filter(|(other, _)| *other != position)
                            .any(|(_, p)| p.property_ids().iter().any(|d| d.same_property(id)))
                })
                .collect();

            match property_provider
                .populate_resources(&mut resources, request, predicate)
                .await
            {
                Ok(populated) => {
                    if !sole.is_empty() && populated.len() < resources.len() {
                        let keep: HashSet<usize> = populated.into_iter().collect();
                        let before = resources.len();
                        let mut index = 0;
                        resources.retain(|_| {
                            let kept = keep.contains(&index);
                            index += 1;
                            kept
                        });
                        tracing::warn!(
                            position,
                            dropped = before - resources.len(),
                            "dropping resources missing required properties"
                        );
                    }
                }
                Err(error) => {
                    if !sole.is_empty() {
                        tracing::warn!(
                            position,
                            %error,
                            "required enrichment failed; dropping affected resources"
                        );
                        resources.clear();
                    } else {
                        tracing::warn!(
                            position,
                            %error,
                            "optional enrichment failed; returning resources without its properties"
                        );
                    }
                }
            }
        }

        Ok(QueryResult {
            resources,
            predicate: predicate.cloned(),
        })
    }
}

/// Merged result of one query.
///
/// Providers may over-return, so the predicate is re-applied while
/// iterating. Finite and single-pass; collect with [`QueryResult::into_vec`]
/// when random access is needed.
#[derive(Debug)]
pub struct QueryResult {
    resources: Vec<Resource>,
    predicate: Option<Predicate>,
}

impl QueryResult {
    /// Iterate matching resources without consuming the result.
    pub fn iter(&self) -> impl Iterator<Item = &Resource> + '_ {
        self.resources
            .iter()
            .filter(move |resource| match &self.predicate {
                Some(predicate) => predicate.evaluate(resource),
                None => true,
            })
    }

    /// Collect the matching resources.
    pub fn into_vec(self) -> Vec<Resource> {
        self.into_iter().collect()
    }
}

impl IntoIterator for QueryResult {
    type Item = Resource;
    type IntoIter = QueryResultIter;

    fn into_iter(self) -> Self::IntoIter {
        QueryResultIter {
            resources: self.resources.into_iter(),
            predicate: self.predicate,
        }
    }
}

/// Owning iterator over a [`QueryResult`].
#[derive(Debug)]
pub struct QueryResultIter {
    resources: std::vec::IntoIter<Resource>,
    predicate: Option<Predicate>,
}

impl Iterator for QueryResultIter {
    type Item = Resource;

    fn next(&mut self) -> Option<Resource> {
        loop {
            let resource = self.resources.next()?;
            match &self.predicate {
                Some(predicate) if !predicate.evaluate(&resource) => continue,
                _ => return Some(resource),
            }
        }
    }
}
