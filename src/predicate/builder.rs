//! Predicate Builder
//!
//! Fluent construction DSL for predicate trees:
//! `PredicateBuilder::new().property("state", "Hosts").equals("HEALTHY")
//! .and().property("load", "metrics").greater_than(0.5).to_predicate()`.
//!
//! Terms fold left to right; switching the connective groups everything
//! built so far as the left operand.

use super::{ComparisonOp, Predicate};
use crate::resource::{PropertyId, PropertyValue};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Connective {
    #[default]
    And,
    Or,
}

/// Builds predicate trees one term at a time.
#[derive(Debug, Default)]
pub struct PredicateBuilder {
    current: Option<Predicate>,
    pending: Connective,
    negate_next: bool,
}

impl PredicateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a term on the given property; an empty category means the root
    /// bucket.
    pub fn property(self, name: impl Into<String>, category: impl Into<String>) -> PropertyStep {
        PropertyStep {
            builder: self,
            property: PropertyId::new(name, category),
        }
    }

    /// Start a term on a `category/name` path (see [`PropertyId::from_path`]).
    pub fn path(self, path: &str) -> PropertyStep {
        PropertyStep {
            builder: self,
            property: PropertyId::from_path(path),
        }
    }

    /// Join the next term with AND.
    pub fn and(mut self) -> Self {
        self.pending = Connective::And;
        self
    }

    /// Join the next term with OR.
    pub fn or(mut self) -> Self {
        self.pending = Connective::Or;
        self
    }

    /// Negate the next term.
    pub fn not(mut self) -> Self {
        self.negate_next = true;
        self
    }

    /// Finish the build. An empty builder yields [`Predicate::Always`].
    pub fn to_predicate(self) -> Predicate {
        self.current.unwrap_or(Predicate::Always)
    }

    fn push(mut self, mut predicate: Predicate) -> Self {
        if self.negate_next {
            predicate = Predicate::Not(Box::new(predicate));
            self.negate_next = false;
        }
        self.current = Some(match (self.current.take(), self.pending) {
            (None, _) => predicate,
            (Some(Predicate::And(mut terms)), Connective::And) => {
                terms.push(predicate);
                Predicate::And(terms)
            }
            (Some(Predicate::Or(mut terms)), Connective::Or) => {
                terms.push(predicate);
                Predicate::Or(terms)
            }
            (Some(existing), Connective::And) => Predicate::And(vec![existing, predicate]),
            (Some(existing), Connective::Or) => Predicate::Or(vec![existing, predicate]),
        });
        self
    }
}

/// A property waiting for its operator; produced by
/// [`PredicateBuilder::property`].
#[derive(Debug)]
pub struct PropertyStep {
    builder: PredicateBuilder,
    property: PropertyId,
}

impl PropertyStep {
    fn comparison(self, op: ComparisonOp, value: impl Into<PropertyValue>) -> PredicateBuilder {
        let predicate = Predicate::Comparison {
            property: self.property,
            op,
            value: value.into().canonical(),
        };
        self.builder.push(predicate)
    }

    pub fn equals(self, value: impl Into<PropertyValue>) -> PredicateBuilder {
        self.comparison(ComparisonOp::Equals, value)
    }

    pub fn not_equals(self, value: impl Into<PropertyValue>) -> PredicateBuilder {
        self.comparison(ComparisonOp::NotEquals, value)
    }

    pub fn greater_than(self, value: impl Into<PropertyValue>) -> PredicateBuilder {
        self.comparison(ComparisonOp::GreaterThan, value)
    }

    pub fn greater_than_or_equals(self, value: impl Into<PropertyValue>) -> PredicateBuilder {
        self.comparison(ComparisonOp::GreaterThanOrEquals, value)
    }

    pub fn less_than(self, value: impl Into<PropertyValue>) -> PredicateBuilder {
        self.comparison(ComparisonOp::LessThan, value)
    }

    pub fn less_than_or_equals(self, value: impl Into<PropertyValue>) -> PredicateBuilder {
        self.comparison(ComparisonOp::LessThanOrEquals, value)
    }

    /// Membership in an explicit value set.
    pub fn is_in<I, V>(self, values: I) -> PredicateBuilder
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let values: BTreeSet<String> = values.into_iter().map(Into::into).collect();
        let predicate = Predicate::In {
            property: self.property,
            values: Some(values),
        };
        self.builder.push(predicate)
    }

    /// Presence check: any property under this id's category.
    pub fn exists(self) -> PredicateBuilder {
        let predicate = Predicate::Category {
            property: self.property,
        };
        self.builder.push(predicate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{Resource, ResourceType};

    fn healthy_host() -> Resource {
        let mut resource = Resource::new(ResourceType::Host);
        resource.set_property(&PropertyId::new("state", "Hosts"), "HEALTHY");
        resource.set_property(&PropertyId::new("load", "metrics"), 0.75);
        resource
    }

    #[test]
    fn test_empty_builder_yields_always() {
        assert_eq!(PredicateBuilder::new().to_predicate(), Predicate::Always);
    }

    #[test]
    fn test_single_term() {
        let predicate = PredicateBuilder::new()
            .property("state", "Hosts")
            .equals("HEALTHY")
            .to_predicate();
        assert!(predicate.evaluate(&healthy_host()));
    }

    #[test]
    fn test_and_chain_flattens() {
        let predicate = PredicateBuilder::new()
            .property("state", "Hosts")
            .equals("HEALTHY")
            .and()
            .property("load", "metrics")
            .greater_than(0.5)
            .and()
            .property("load", "metrics")
            .less_than(1.0)
            .to_predicate();
        match &predicate {
            Predicate::And(terms) => assert_eq!(terms.len(), 3),
            other => panic!("expected And, got {:?}", other),
        }
        assert!(predicate.evaluate(&healthy_host()));
    }

    #[test]
    fn test_or_chain() {
        let predicate = PredicateBuilder::new()
            .property("state", "Hosts")
            .equals("LOST")
            .or()
            .property("state", "Hosts")
            .equals("HEALTHY")
            .to_predicate();
        assert!(predicate.evaluate(&healthy_host()));
    }

    #[test]
    fn test_mixed_connectives_group_left() {
        // a AND b OR c folds to Or([And([a, b]), c])
        let predicate = PredicateBuilder::new()
            .property("state", "Hosts")
            .equals("HEALTHY")
            .and()
            .property("load", "metrics")
            .greater_than(2.0)
            .or()
            .property("state", "Hosts")
            .equals("HEALTHY")
            .to_predicate();
        match &predicate {
            Predicate::Or(terms) => {
                assert_eq!(terms.len(), 2);
                assert!(matches!(terms[0], Predicate::And(_)));
            }
            other => panic!("expected Or, got {:?}", other),
        }
        assert!(predicate.evaluate(&healthy_host()));
    }

    #[test]
    fn test_not_applies_to_next_term() {
        let predicate = PredicateBuilder::new()
            .not()
            .property("state", "Hosts")
            .equals("LOST")
            .to_predicate();
        assert!(matches!(predicate, Predicate::Not(_)));
        assert!(predicate.evaluate(&healthy_host()));
    }

    #[test]
    fn test_is_in_builds_some_set() {
        let predicate = PredicateBuilder::new()
            .property("state", "Hosts")
            .is_in(["HEALTHY", "UNHEALTHY"])
            .to_predicate();
        assert!(predicate.evaluate(&healthy_host()));
    }

    #[test]
    fn test_exists_checks_category() {
        let predicate = PredicateBuilder::new()
            .path("metrics/load")
            .exists()
            .to_predicate();
        assert!(predicate.evaluate(&healthy_host()));
    }

    #[test]
    fn test_numeric_literal_canonicalizes() {
        let predicate = PredicateBuilder::new()
            .property("cnt", "c1")
            .equals(1)
            .to_predicate();
        match predicate {
            Predicate::Comparison { value, .. } => assert_eq!(value, "1"),
            other => panic!("expected Comparison, got {:?}", other),
        }
    }
}
