//! clusterq - typed query engine for cluster resources
//!
//! One uniform query interface over heterogeneous cluster backends:
//! strongly-typed resources (clusters, services, hosts, components, host
//! components) with property projection, predicate filtering, and schema
//! introspection. Backends plug in through the [`provider`] contracts; the
//! [`controller`] merges a primary provider's enumeration with secondary
//! property enrichment and re-applies the predicate defensively.
//!
//! # Example
//!
//! ```ignore
//! use clusterq::{ClusterController, PredicateBuilder, Request, ResourceType};
//!
//! async fn unhealthy_hosts(controller: &ClusterController) -> anyhow::Result<usize> {
//!     let predicate = PredicateBuilder::new()
//!         .property("state", "Hosts")
//!         .not_equals("HEALTHY")
//!         .to_predicate();
//!     let result = controller
//!         .get_resources(ResourceType::Host, &Request::all_properties(), Some(&predicate))
//!         .await?;
//!     Ok(result.iter().count())
//! }
//! ```

pub mod controller;
pub mod error;
pub mod inventory;
pub mod predicate;
pub mod provider;
pub mod request;
pub mod resource;
pub mod schema;

pub use controller::{ClusterController, ClusterControllerBuilder, QueryResult};
pub use error::{ProviderError, QueryError};
pub use predicate::{
    ComparisonOp, FilterFormatter, Predicate, PredicateBuilder, PredicateVisitor,
};
pub use request::{Request, TemporalInfo};
pub use resource::{PropertyId, PropertyValue, Resource, ResourceType};
pub use schema::Schema;
