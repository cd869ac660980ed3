//! Predicate Visitor
//!
//! Double-dispatch over the predicate variants, one visit method per
//! concrete kind. Providers implement this to translate predicates into
//! backend-native filter syntax (SQL WHERE clauses, JMX query strings)
//! without reaching into the tree representation.

use super::{ComparisonOp, Predicate};
use crate::resource::PropertyId;
use std::collections::BTreeSet;

/// One visit method per predicate variant.
pub trait PredicateVisitor {
    type Output;

    fn visit_comparison(
        &mut self,
        property: &PropertyId,
        op: ComparisonOp,
        value: &str,
    ) -> Self::Output;
    fn visit_and(&mut self, children: &[Predicate]) -> Self::Output;
    fn visit_or(&mut self, children: &[Predicate]) -> Self::Output;
    fn visit_not(&mut self, child: &Predicate) -> Self::Output;
    fn visit_in(&mut self, property: &PropertyId, values: Option<&BTreeSet<String>>)
        -> Self::Output;
    fn visit_category(&mut self, property: &PropertyId) -> Self::Output;
    fn visit_always(&mut self) -> Self::Output;
}

impl Predicate {
    /// Dispatch to the visit method matching this node's variant.
    pub fn accept<V: PredicateVisitor>(&self, visitor: &mut V) -> V::Output {
        match self {
            Self::Comparison {
                property,
                op,
                value,
            } => visitor.visit_comparison(property, *op, value),
            Self::And(children) => visitor.visit_and(children),
            Self::Or(children) => visitor.visit_or(children),
            Self::Not(child) => visitor.visit_not(child),
            Self::In { property, values } => visitor.visit_in(property, values.as_ref()),
            Self::Category { property } => visitor.visit_category(property),
            Self::Always => visitor.visit_always(),
        }
    }
}

/// Renders a predicate as a SQL-style filter clause.
///
/// Ships as the reference visitor implementation and backs the CLI's
/// `--explain` output.
#[derive(Debug, Default)]
pub struct FilterFormatter;

impl FilterFormatter {
    pub fn format(predicate: &Predicate) -> String {
        predicate.accept(&mut FilterFormatter)
    }
}

impl PredicateVisitor for FilterFormatter {
    type Output = String;

    fn visit_comparison(
        &mut self,
        property: &PropertyId,
        op: ComparisonOp,
        value: &str,
    ) -> String {
        format!("{} {} '{}'", property, op, value)
    }

    fn visit_and(&mut self, children: &[Predicate]) -> String {
        if children.is_empty() {
            return "TRUE".to_string();
        }
        let rendered: Vec<String> = children.iter().map(|c| c.accept(self)).collect();
        format!("({})", rendered.join(" AND "))
    }

    fn visit_or(&mut self, children: &[Predicate]) -> String {
        if children.is_empty() {
            return "FALSE".to_string();
        }
        let rendered: Vec<String> = children.iter().map(|c| c.accept(self)).collect();
        format!("({})", rendered.join(" OR "))
    }

    fn visit_not(&mut self, child: &Predicate) -> String {
        format!("NOT {}", child.accept(self))
    }

    fn visit_in(&mut self, property: &PropertyId, values: Option<&BTreeSet<String>>) -> String {
        match values {
            Some(values) => {
                let quoted: Vec<String> = values.iter().map(|v| format!("'{}'", v)).collect();
                format!("{} IN ({})", property, quoted.join(", "))
            }
            None => "FALSE".to_string(),
        }
    }

    fn visit_category(&mut self, property: &PropertyId) -> String {
        format!("EXISTS({})", property.category_key())
    }

    fn visit_always(&mut self) -> String {
        "TRUE".to_string()
    }
}
