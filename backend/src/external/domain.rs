//! Search domains for the Odoo object API
//!
//! A domain is a list of terms in Polish notation. Leaves are
//! `[field, operator, value]` triples, consecutive leaves are ANDed and
//! the `"|"` and `"!"` markers apply to the terms that follow them.

use serde::ser::{Serialize, SerializeSeq, Serializer};
use serde_json::Value;

/// Comparison operators understood by the ERP
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    In,
    NotIn,
    ILike,
    ChildOf,
}

impl Op {
    pub fn as_str(&self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Ne => "!=",
            Op::Gt => ">",
            Op::Ge => ">=",
            Op::Lt => "<",
            Op::Le => "<=",
            Op::In => "in",
            Op::NotIn => "not in",
            Op::ILike => "ilike",
            Op::ChildOf => "child_of",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    Or,
    Not,
    Leaf {
        field: String,
        op: Op,
        value: Value,
    },
}

impl Term {
    pub fn leaf(field: &str, op: Op, value: impl Into<Value>) -> Self {
        Term::Leaf {
            field: field.to_string(),
            op,
            value: value.into(),
        }
    }
}

impl Serialize for Term {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Term::Or => serializer.serialize_str("|"),
            Term::Not => serializer.serialize_str("!"),
            Term::Leaf { field, op, value } => {
                let mut seq = serializer.serialize_seq(Some(3))?;
                seq.serialize_element(field)?;
                seq.serialize_element(op.as_str())?;
                seq.serialize_element(value)?;
                seq.end()
            }
        }
    }
}

/// Typed domain builder
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Domain(Vec<Term>);

impl Domain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a leaf, ANDed with what came before
    pub fn and(mut self, field: &str, op: Op, value: impl Into<Value>) -> Self {
        self.0.push(Term::leaf(field, op, value));
        self
    }

    /// Append a leaf only when `value` is present
    pub fn and_some<T: Into<Value>>(self, field: &str, op: Op, value: Option<T>) -> Self {
        match value {
            Some(value) => self.and(field, op, value),
            None => self,
        }
    }

    /// Append `left OR right`
    pub fn or(mut self, left: Term, right: Term) -> Self {
        self.0.push(Term::Or);
        self.0.push(left);
        self.0.push(right);
        self
    }

    /// Append `NOT term`
    pub fn not(mut self, term: Term) -> Self {
        self.0.push(Term::Not);
        self.0.push(term);
        self
    }

    pub fn terms(&self) -> &[Term] {
        &self.0
    }
}

impl Serialize for Domain {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serializes_to_erp_list_form() {
        let domain = Domain::new()
            .and("product_id", Op::In, vec![1, 2])
            .and("state", Op::Eq, "done")
            .or(
                Term::leaf("location_id", Op::Eq, 8),
                Term::leaf("location_dest_id", Op::Eq, 8),
            );

        assert_eq!(
            serde_json::to_value(&domain).unwrap(),
            json!([
                ["product_id", "in", [1, 2]],
                ["state", "=", "done"],
                "|",
                ["location_id", "=", 8],
                ["location_dest_id", "=", 8]
            ])
        );
    }

    #[test]
    fn test_optional_leaf() {
        let domain = Domain::new()
            .and_some("warehouse_id", Op::Eq, None::<i64>)
            .and_some("categ_id", Op::In, Some(vec![3]));
        assert_eq!(domain.terms().len(), 1);
        assert_eq!(Op::NotIn.as_str(), "not in");
    }
}
