//! Query Request
//!
//! The requested property projection plus an optional temporal range. A
//! request never carries a predicate; filtering travels as a separate
//! argument so providers can treat the two independently.

use crate::resource::PropertyId;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;

/// Time window for temporal (metric) properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemporalInfo {
    start: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
    step: Option<Duration>,
}

impl TemporalInfo {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            start,
            end: None,
            step: None,
        }
    }

    pub fn with_end(mut self, end: DateTime<Utc>) -> Self {
        self.end = Some(end);
        self
    }

    pub fn with_step(mut self, step: Duration) -> Self {
        self.step = Some(step);
        self
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.end
    }

    pub fn step(&self) -> Option<Duration> {
        self.step
    }
}

/// Immutable description of what a query should return.
///
/// An empty projection means "everything the providers declare".
#[derive(Debug, Clone, Default)]
pub struct Request {
    property_ids: HashSet<PropertyId>,
    temporal_info: Option<TemporalInfo>,
}

impl Request {
    /// Request an explicit set of properties.
    pub fn new(property_ids: impl IntoIterator<Item = PropertyId>) -> Self {
        Self {
            property_ids: property_ids.into_iter().collect(),
            temporal_info: None,
        }
    }

    /// Request every property the providers declare.
    pub fn all_properties() -> Self {
        Self::default()
    }

    pub fn with_temporal_info(mut self, temporal_info: TemporalInfo) -> Self {
        self.temporal_info = Some(temporal_info);
        self
    }

    /// The explicit projection; empty means unrestricted.
    pub fn property_ids(&self) -> &HashSet<PropertyId> {
        &self.property_ids
    }

    /// True when no explicit projection was given.
    pub fn is_unrestricted(&self) -> bool {
        self.property_ids.is_empty()
    }

    pub fn temporal_info(&self) -> Option<&TemporalInfo> {
        self.temporal_info.as_ref()
    }

    /// The subset of `declared` this request asks for: everything when the
    /// projection is empty, otherwise the intersection. Temporal flags are
    /// ignored when matching (a temporal request addresses the same
    /// underlying property).
    pub fn requested_of(&self, declared: &HashSet<PropertyId>) -> HashSet<PropertyId> {
        if self.property_ids.is_empty() {
            return declared.clone();
        }
        declared
            .iter()
            .filter(|d| self.property_ids.iter().any(|r| r.same_property(d)))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn test_empty_projection_requests_everything() {
        let request = Request::all_properties();
        assert!(request.is_unrestricted());
        assert_eq!(request.requested_of(&declared()), declared());
    }

    #[test]
    fn test_projection_intersects_declared() {
        let request = Request::new([
            PropertyId::new("state", "Hosts"),
            PropertyId::new("unrelated", "Other"),
        ]);
        let requested = request.requested_of(&declared());
        assert_eq!(requested.len(), 1);
        assert!(requested.contains(&PropertyId::new("state", "Hosts")));
    }

    #[test]
    fn test_temporal_request_matches_plain_declaration() {
        let request = Request::new([PropertyId::new("load", "metrics").temporal()]);
        let requested = request.requested_of(&declared());
        assert_eq!(requested.len(), 1);
        assert!(requested.contains(&PropertyId::new("load", "metrics")));
    }

    #[test]
    fn test_temporal_info_round_trip() {
        let start = Utc::now();
        let info = TemporalInfo::new(start)
            .with_end(start + Duration::seconds(3600))
            .with_step(Duration::seconds(15));
        assert_eq!(info.start(), start);
        assert_eq!(info.end(), Some(start + Duration::seconds(3600)));
        assert_eq!(info.step(), Some(Duration::seconds(15)));
    }
}
