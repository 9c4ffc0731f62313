use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::loose;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
	#[serde(rename = "=")]
	Eq,
	#[serde(rename = "null")]
	IsNull,
}

/// Row filter consumed by the structured query layer.
///
/// Siblings inside a group are combined left to right: a child flagged `or` is OR-ed with the
/// accumulated result, every other child is AND-ed. The flag on the first child is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Predicate {
	Condition {
		field: String,
		op: Operator,
		#[serde(default, skip_serializing_if = "Value::is_null")]
		value: Value,
		#[serde(default, skip_serializing_if = "is_false")]
		or: bool,
	},
	Group {
		wheres: Vec<Predicate>,
		#[serde(default, skip_serializing_if = "is_false")]
		or: bool,
	},
}
impl Predicate {
	pub fn eq(field: &str, value: impl Into<Value>) -> Self {
		Self::Condition { field: field.to_string(), op: Operator::Eq, value: value.into(), or: false }
	}

	pub fn is_null(field: &str) -> Self {
		Self::Condition { field: field.to_string(), op: Operator::IsNull, value: Value::Null, or: false }
	}

	pub fn group(wheres: Vec<Predicate>) -> Self {
		Self::Group { wheres, or: false }
	}

	/// Marks this node as OR-ed with its preceding siblings.
	pub fn or(mut self) -> Self {
		match &mut self {
			Self::Condition { or, .. } | Self::Group { or, .. } => *or = true,
		}

		self
	}

	pub fn is_or(&self) -> bool {
		match self {
			Self::Condition { or, .. } | Self::Group { or, .. } => *or,
		}
	}

	pub fn children(&self) -> &[Predicate] {
		match self {
			Self::Condition { .. } => &[],
			Self::Group { wheres, .. } => wheres,
		}
	}

	/// Evaluates the tree against a single row.
	pub fn matches(&self, row: &Map<String, Value>) -> bool {
		match self {
			Self::Condition { field, op: Operator::Eq, value, .. } =>
				row.get(field).map(|actual| value_eq(actual, value)).unwrap_or(false),
			Self::Condition { field, op: Operator::IsNull, .. } =>
				row.get(field).map(Value::is_null).unwrap_or(true),
			Self::Group { wheres, .. } => {
				let mut iter = wheres.iter();
				let Some(first) = iter.next() else {
					return true;
				};
				let mut matched = first.matches(row);

				for child in iter {
					matched =
						if child.is_or() { matched || child.matches(row) } else { matched && child.matches(row) };
				}

				matched
			},
		}
	}
}

fn value_eq(actual: &Value, expected: &Value) -> bool {
	match expected {
		Value::Bool(flag) => loose::truthy(actual) == *flag,
		_ => actual == expected,
	}
}

fn is_false(flag: &bool) -> bool {
	!*flag
}
