//! Predicate Algebra
//!
//! Immutable boolean expression trees over resource properties. A predicate
//! evaluates against a [`Resource`] without touching providers; missing or
//! malformed values fail closed (no match) instead of erroring, so partial
//! results stay available.

mod builder;
mod visitor;

pub use builder::{PredicateBuilder, PropertyStep};
pub use visitor::{FilterFormatter, PredicateVisitor};

use crate::resource::{PropertyId, Resource};
use std::collections::{BTreeSet, HashSet};
use std::fmt;

/// Comparison operators for [`Predicate::Comparison`].
///
/// Equality compares stored strings exactly; the ordering operators parse
/// both sides as floats and fail closed when parsing fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOp {
    Equals,
    NotEquals,
    GreaterThan,
    GreaterThanOrEquals,
    LessThan,
    LessThanOrEquals,
}

impl ComparisonOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equals => "=",
            Self::NotEquals => "!=",
            Self::GreaterThan => ">",
            Self::GreaterThanOrEquals => ">=",
            Self::LessThan => "<",
            Self::LessThanOrEquals => "<=",
        }
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Boolean expression tree over named properties.
///
/// Each node is stateless once built; a predicate can be evaluated any
/// number of times against different resources. Providers translate
/// predicates into backend-native filter syntax through
/// [`PredicateVisitor`].
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Compare one property value against a literal.
    Comparison {
        property: PropertyId,
        op: ComparisonOp,
        value: String,
    },
    /// Every child must match; the empty conjunction matches everything.
    And(Vec<Predicate>),
    /// At least one child must match; the empty disjunction matches nothing.
    Or(Vec<Predicate>),
    /// Negates its child.
    Not(Box<Predicate>),
    /// The stored value must be a member of the set. `None` matches nothing
    /// ("no values allowed"), which exclusion-list callers rely on.
    In {
        property: PropertyId,
        values: Option<BTreeSet<String>>,
    },
    /// Any property exists under the id's category, value ignored.
    Category { property: PropertyId },
    /// Matches every resource.
    Always,
}

impl Predicate {
    /// Convenience for an equality comparison.
    pub fn equals(property: PropertyId, value: impl Into<String>) -> Self {
        Self::Comparison {
            property,
            op: ComparisonOp::Equals,
            value: value.into(),
        }
    }

    /// Evaluate against a resource. Pure: no providers, no side effects.
    ///
    /// Properties that were never populated on the resource yield no-match
    /// rather than an error; so do unparseable values under ordering
    /// operators.
    pub fn evaluate(&self, resource: &Resource) -> bool {
        match self {
            Self::Comparison {
                property,
                op,
                value,
            } => match resource.property_value(property) {
                Some(stored) => compare(stored, *op, value),
                None => false,
            },
            Self::And(children) => children.iter().all(|c| c.evaluate(resource)),
            Self::Or(children) => children.iter().any(|c| c.evaluate(resource)),
            Self::Not(child) => !child.evaluate(resource),
            Self::In { property, values } => match (values, resource.property_value(property)) {
                (Some(values), Some(stored)) => values.contains(stored),
                _ => false,
            },
            Self::Category { property } => resource.has_category(property.category_key()),
            Self::Always => true,
        }
    }

    /// Union of every property id referenced anywhere in the tree. The
    /// controller uses this to decide which providers must run before the
    /// predicate can be applied.
    pub fn property_ids(&self) -> HashSet<PropertyId> {
        let mut ids = HashSet::new();
        self.collect_property_ids(&mut ids);
        ids
    }

    fn collect_property_ids(&self, ids: &mut HashSet<PropertyId>) {
        match self {
            Self::Comparison { property, .. }
            | Self::In { property, .. }
            | Self::Category { property } => {
                ids.insert(property.clone());
            }
            Self::And(children) | Self::Or(children) => {
                for child in children {
                    child.collect_property_ids(ids);
                }
            }
            Self::Not(child) => child.collect_property_ids(ids),
            Self::Always => {}
        }
    }
}

fn compare(stored: &str, op: ComparisonOp, expected: &str) -> bool {
    match op {
        ComparisonOp::Equals => stored == expected,
        ComparisonOp::NotEquals => stored != expected,
        ComparisonOp::GreaterThan
        | ComparisonOp::GreaterThanOrEquals
        | ComparisonOp::LessThan
        | ComparisonOp::LessThanOrEquals => {
            let (Ok(lhs), Ok(rhs)) = (stored.parse::<f64>(), expected.parse::<f64>()) else {
                return false;
            };
            match op {
                ComparisonOp::GreaterThan => lhs > rhs,
                ComparisonOp::GreaterThanOrEquals => lhs >= rhs,
                ComparisonOp::LessThan => lhs < rhs,
                ComparisonOp::LessThanOrEquals => lhs <= rhs,
                _ => unreachable!(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ResourceType;

    fn host(props: &[(&str, &str)]) -> Resource {
        let mut resource = Resource::new(ResourceType::Host);
        for (path, value) in props {
            resource.set_property(&PropertyId::from_path(path), *value);
        }
        resource
    }

    #[test]
    fn test_equals_matches_exact_string() {
        let resource = host(&[("Hosts/state", "HEALTHY")]);
        let id = PropertyId::new("state", "Hosts");
        assert!(Predicate::equals(id.clone(), "HEALTHY").evaluate(&resource));
        assert!(!Predicate::equals(id, "LOST").evaluate(&resource));
    }

    #[test]
    fn test_absent_property_fails_closed_for_all_operators() {
        let resource = host(&[]);
        let id = PropertyId::new("state", "Hosts");
        for op in [
            ComparisonOp::Equals,
            ComparisonOp::NotEquals,
            ComparisonOp::GreaterThan,
            ComparisonOp::LessThanOrEquals,
        ] {
            let predicate = Predicate::Comparison {
                property: id.clone(),
                op,
                value: "1".to_string(),
            };
            assert!(!predicate.evaluate(&resource), "op {:?} should not match", op);
        }
    }

    #[test]
    fn test_numeric_comparison_parses_strings() {
        let resource = host(&[("metrics/load", "0.75")]);
        let id = PropertyId::new("load", "metrics");
        let gt = Predicate::Comparison {
            property: id.clone(),
            op: ComparisonOp::GreaterThan,
            value: "0.5".to_string(),
        };
        assert!(gt.evaluate(&resource));

        let lt = Predicate::Comparison {
            property: id,
            op: ComparisonOp::LessThan,
            value: "0.5".to_string(),
        };
        assert!(!lt.evaluate(&resource));
    }

    #[test]
    fn test_numeric_comparison_fails_closed_on_parse_error() {
        let resource = host(&[("metrics/load", "not-a-number")]);
        let predicate = Predicate::Comparison {
            property: PropertyId::new("load", "metrics"),
            op: ComparisonOp::GreaterThan,
            value: "0".to_string(),
        };
        assert!(!predicate.evaluate(&resource));
    }

    #[test]
    fn test_empty_and_is_identity() {
        assert!(Predicate::And(Vec::new()).evaluate(&host(&[])));
    }

    #[test]
    fn test_empty_or_matches_nothing() {
        assert!(!Predicate::Or(Vec::new()).evaluate(&host(&[])));
    }

    #[test]
    fn test_and_requires_every_child() {
        let resource = host(&[
            ("Hosts/state", "HEALTHY"),
            ("Hosts/rack", "r1"),
            ("Hosts/os", "linux"),
        ]);
        let all_match = Predicate::And(vec![
            Predicate::equals(PropertyId::new("state", "Hosts"), "HEALTHY"),
            Predicate::equals(PropertyId::new("rack", "Hosts"), "r1"),
            Predicate::equals(PropertyId::new("os", "Hosts"), "linux"),
        ]);
        assert!(all_match.evaluate(&resource));

        let one_off = Predicate::And(vec![
            Predicate::equals(PropertyId::new("state", "Hosts"), "HEALTHY"),
            Predicate::equals(PropertyId::new("rack", "Hosts"), "r2"),
            Predicate::equals(PropertyId::new("os", "Hosts"), "linux"),
        ]);
        assert!(!one_off.evaluate(&resource));
    }

    #[test]
    fn test_in_with_none_set_matches_nothing() {
        let resource = host(&[("Hosts/state", "HEALTHY")]);
        let predicate = Predicate::In {
            property: PropertyId::new("state", "Hosts"),
            values: None,
        };
        assert!(!predicate.evaluate(&resource));
    }

    #[test]
    fn test_in_membership() {
        let resource = host(&[("Hosts/state", "HEALTHY")]);
        let values: BTreeSet<String> = ["HEALTHY", "UNHEALTHY"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let member = Predicate::In {
            property: PropertyId::new("state", "Hosts"),
            values: Some(values.clone()),
        };
        assert!(member.evaluate(&resource));

        let other = Predicate::In {
            property: PropertyId::new("rack", "Hosts"),
            values: Some(values),
        };
        assert!(!other.evaluate(&resource));
    }

    #[test]
    fn test_category_presence_ignores_value() {
        let resource = host(&[("metrics/cpu/load", "0.1")]);
        let present = Predicate::Category {
            property: PropertyId::new("load", "metrics/cpu"),
        };
        assert!(present.evaluate(&resource));

        let absent = Predicate::Category {
            property: PropertyId::new("anything", "process"),
        };
        assert!(!absent.evaluate(&resource));
    }

    #[test]
    fn test_property_ids_unions_the_tree() {
        let predicate = Predicate::And(vec![
            Predicate::equals(PropertyId::new("state", "Hosts"), "HEALTHY"),
            Predicate::Not(Box::new(Predicate::Or(vec![
                Predicate::equals(PropertyId::new("rack", "Hosts"), "r1"),
                Predicate::In {
                    property: PropertyId::new("os", "Hosts"),
                    values: None,
                },
            ]))),
        ]);
        let ids = predicate.property_ids();
        assert_eq!(ids.len(), 3);
        assert!(ids.contains(&PropertyId::new("state", "Hosts")));
        assert!(ids.contains(&PropertyId::new("rack", "Hosts")));
        assert!(ids.contains(&PropertyId::new("os", "Hosts")));
    }
}
