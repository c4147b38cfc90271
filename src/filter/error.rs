//! Rejections from compiling a filter document. Every variant describes
//! caller input, so the API answers them with 400.

use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum FilterError {
    /// Table, column and order names must match `[A-Za-z_][A-Za-z0-9_]*`.
    #[error("'{0}' is not a valid {1} name")]
    BadIdentifier(String, &'static str),

    #[error("Malformed where document: {0}")]
    MalformedWhere(&'static str),

    #[error("Operator '{0}' is not supported")]
    UnknownOperator(String),

    #[error("{0}")]
    BadOperand(String),

    #[error("{0} must not be negative")]
    NegativePaging(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_input() {
        assert_eq!(
            FilterError::BadIdentifier("kindergarten_id;--".to_string(), "column").to_string(),
            "'kindergarten_id;--' is not a valid column name"
        );
        assert_eq!(FilterError::NegativePaging("offset").to_string(), "offset must not be negative");
    }
}
