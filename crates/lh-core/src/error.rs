//! Error types for lanham

use thiserror::Error;

/// lanham error type.
///
/// Every variant is fatal for the run that raised it. Rows that are merely
/// unusable for one computation (missing outcome, unparseable hours) are
/// excluded silently by the caller and never surface here.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A column required by an operation is absent from the table
    #[error("missing required column: {0}")]
    MissingColumn(String),

    /// A column has the wrong kind for an operation (e.g. text where numeric is required)
    #[error("column '{column}' has wrong type: expected {expected}")]
    ColumnType {
        /// Column name.
        column: String,
        /// Expected column kind.
        expected: String,
    },

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// A regressor is perfectly collinear with the fixed effects or with earlier regressors
    #[error("perfect collinearity: regressor '{column}' is {reason}")]
    Collinear {
        /// Regressor name.
        column: String,
        /// Human-readable cause (e.g. "absorbed by the fixed effects").
        reason: String,
    },

    /// Design matrix is singular or the model has no residual degrees of freedom
    #[error("singular design: {0}")]
    Singular(String),

    /// Computation error
    #[error("Computation error: {0}")]
    Computation(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_column() {
        let e = Error::MissingColumn("HRSWORK1".into());
        assert!(e.to_string().contains("HRSWORK1"));

        let e = Error::Collinear {
            column: "spending".into(),
            reason: "absorbed by the fixed effects".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("perfect collinearity"));
        assert!(msg.contains("spending"));
    }
}
