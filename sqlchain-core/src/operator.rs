//! SQL comparison operators and conversions

use crate::{Error, Result};
use std::fmt::{self, Display};

/// Comparison operator placed between a column and its operand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operator(&'static str);

impl Operator {
    pub const EQ: Self = Operator("=");
    pub const NEQ: Self = Operator("<>");
    pub const GT: Self = Operator(">");
    pub const LT: Self = Operator("<");
    pub const GTE: Self = Operator(">=");
    pub const LTE: Self = Operator("<=");
    pub const LIKE: Self = Operator("like");
    pub const NOT_LIKE: Self = Operator("not like");
    pub const BETWEEN: Self = Operator("between");
    pub const IN: Self = Operator("in");
    pub const IS: Self = Operator("is");
    pub const IS_NOT: Self = Operator("is not");

    /// Create a custom operator for database-specific comparisons
    ///
    /// # Examples
    /// ```
    /// use sqlchain_core::Operator;
    ///
    /// // MySQL null-safe equality
    /// let spaceship = Operator::custom("<=>");
    /// assert_eq!(spaceship.as_str(), "<=>");
    /// ```
    pub const fn custom(op: &'static str) -> Self {
        Operator(op)
    }

    /// Get the SQL symbol for the operator
    pub fn as_str(&self) -> &str {
        self.0
    }

    /// Whether this is plain equality, the only operator allowed against a null value
    pub fn is_equality(&self) -> bool {
        *self == Operator::EQ
    }
}

impl Default for Operator {
    fn default() -> Self {
        Operator::EQ
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Trait for types that can be converted to SQL operators
pub trait IntoOperator: Sized {
    /// Convert, failing with `InvalidArgument` on an unrecognized symbol
    fn try_into_operator(self) -> Result<Operator>;

    /// Convert, panicking on an unrecognized symbol
    fn into_operator(self) -> Operator {
        match self.try_into_operator() {
            Ok(operator) => operator,
            Err(err) => panic!("{}", err),
        }
    }
}

impl IntoOperator for Operator {
    fn try_into_operator(self) -> Result<Operator> {
        Ok(self)
    }
}

/// Allow string literals for common SQL operators
impl IntoOperator for &str {
    fn try_into_operator(self) -> Result<Operator> {
        match self.to_ascii_lowercase().as_str() {
            "=" => Ok(Operator::EQ),
            "<>" | "!=" => Ok(Operator::NEQ),
            ">" => Ok(Operator::GT),
            "<" => Ok(Operator::LT),
            ">=" => Ok(Operator::GTE),
            "<=" => Ok(Operator::LTE),
            "like" => Ok(Operator::LIKE),
            "not like" => Ok(Operator::NOT_LIKE),
            "between" => Ok(Operator::BETWEEN),
            "in" => Ok(Operator::IN),
            "is" => Ok(Operator::IS),
            "is not" => Ok(Operator::IS_NOT),
            _ => Err(Error::invalid_argument(format!(
                "Unknown operator '{}'. Use the Operator constants or Operator::custom(\"{}\") for custom operators.",
                self, self
            ))),
        }
    }
}

/// Convenience module for operator constants
pub mod op {
    use super::Operator;

    pub const EQ: Operator = Operator::EQ;
    pub const NEQ: Operator = Operator::NEQ;
    pub const GT: Operator = Operator::GT;
    pub const LT: Operator = Operator::LT;
    pub const GTE: Operator = Operator::GTE;
    pub const LTE: Operator = Operator::LTE;
    pub const LIKE: Operator = Operator::LIKE;
    pub const NOT_LIKE: Operator = Operator::NOT_LIKE;
    pub const BETWEEN: Operator = Operator::BETWEEN;
    pub const IN: Operator = Operator::IN;
    pub const IS: Operator = Operator::IS;
    pub const IS_NOT: Operator = Operator::IS_NOT;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_symbols() {
        assert_eq!(Operator::EQ.as_str(), "=");
        assert_eq!(Operator::NEQ.as_str(), "<>");
        assert_eq!(Operator::GTE.as_str(), ">=");
        assert_eq!(Operator::NOT_LIKE.as_str(), "not like");
    }

    #[test]
    fn test_custom_operator() {
        let custom_op = Operator::custom("<=>");
        assert_eq!(custom_op.as_str(), "<=>");
        assert!(!custom_op.is_equality());
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Operator::GT), ">");
        assert_eq!(format!("{}", Operator::LIKE), "like");
    }

    #[test]
    fn test_string_conversion() {
        assert_eq!(">".into_operator(), Operator::GT);
        assert_eq!("LIKE".into_operator(), Operator::LIKE);
        assert_eq!("Not Like".into_operator(), Operator::NOT_LIKE);
        assert_eq!("!=".into_operator(), Operator::NEQ);
        assert_eq!("<>".into_operator(), Operator::NEQ);
    }

    #[test]
    #[should_panic(expected = "Unknown operator 'INVALID'")]
    fn test_invalid_string_conversion() {
        "INVALID".into_operator();
    }

    #[test]
    fn test_try_conversion_reports_unknown_symbol() {
        assert_eq!("IS NOT".try_into_operator().unwrap(), Operator::IS_NOT);
        let err = "===".try_into_operator().unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
        assert!(err.to_string().contains("Unknown operator '==='"));
    }

    #[test]
    fn test_equality_check() {
        assert!(Operator::EQ.is_equality());
        assert!("=".into_operator().is_equality());
        assert!(!Operator::NEQ.is_equality());
        assert_eq!(Operator::default(), op::EQ);
    }
}
