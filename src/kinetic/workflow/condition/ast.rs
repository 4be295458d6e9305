// SPDX-License-Identifier: MIT

//! Comparison operators for conditional edges

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::adk::error::FlowError;

/// Comparison operators. Serialized as their symbol (`"<"`, `"=="`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CompareOp {
    /// ==
    Eq,
    /// !=
    NotEq,
    /// >
    Gt,
    /// >=
    Gte,
    /// <
    Lt,
    /// <=
    Lte,
}

impl CompareOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::NotEq => "!=",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
        }
    }
}

impl std::fmt::Display for CompareOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompareOp {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "==" => Ok(CompareOp::Eq),
            "!=" => Ok(CompareOp::NotEq),
            ">" => Ok(CompareOp::Gt),
            ">=" => Ok(CompareOp::Gte),
            "<" => Ok(CompareOp::Lt),
            "<=" => Ok(CompareOp::Lte),
            other => Err(FlowError::UnknownOperator(other.to_string())),
        }
    }
}

impl TryFrom<String> for CompareOp {
    type Error = FlowError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CompareOp> for String {
    fn from(op: CompareOp) -> Self {
        op.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_op_display() {
        assert_eq!(format!("{}", CompareOp::Eq), "==");
        assert_eq!(format!("{}", CompareOp::NotEq), "!=");
        assert_eq!(format!("{}", CompareOp::Gt), ">");
        assert_eq!(format!("{}", CompareOp::Gte), ">=");
        assert_eq!(format!("{}", CompareOp::Lt), "<");
        assert_eq!(format!("{}", CompareOp::Lte), "<=");
    }

    #[test]
    fn test_parse_operators() {
        assert_eq!("<".parse::<CompareOp>().unwrap(), CompareOp::Lt);
        assert_eq!(" >= ".parse::<CompareOp>().unwrap(), CompareOp::Gte);
    }

    #[test]
    fn test_unknown_operator() {
        match "=~".parse::<CompareOp>() {
            Err(FlowError::UnknownOperator(op)) => assert_eq!(op, "=~"),
            other => panic!("Expected UnknownOperator, got {:?}", other),
        }
    }

    #[test]
    fn test_serde_uses_symbols() {
        let op: CompareOp = serde_json::from_str(r#""<=""#).unwrap();
        assert_eq!(op, CompareOp::Lte);
        assert_eq!(serde_json::to_string(&CompareOp::NotEq).unwrap(), r#""!=""#);

        let err = serde_json::from_str::<CompareOp>(r#""contains""#).unwrap_err();
        assert!(err.to_string().contains("Unknown operator: contains"));
    }
}
