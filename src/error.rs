/// Errors raised while resolving layer parameters into a merged table.
///
/// Every variant aborts the whole call: a failed materialization never
/// returns partially populated columns.
#[derive(thiserror::Error, Debug)]
pub enum MaterializeError {
    /// A per-row sequence does not have one value per row.
    #[error("`{attribute}`: expected {expected} values, got {actual}")]
    ShapeMismatch {
        attribute: String,
        expected: usize,
        actual: usize,
    },

    /// A value has a kind the attribute cannot take.
    #[error("`{attribute}`: expected {expected}, found {found}")]
    TypeMismatch {
        attribute: String,
        expected: String,
        found: String,
    },

    /// A column reference names a column the data does not have.
    #[error("`{attribute}`: column `{column}` not found in data")]
    MissingColumn { attribute: String, column: String },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MaterializeError {
    pub(crate) fn type_mismatch(
        attribute: impl Into<String>,
        expected: impl ToString,
        found: impl Into<String>,
    ) -> Self {
        MaterializeError::TypeMismatch {
            attribute: attribute.into(),
            expected: expected.to_string(),
            found: found.into(),
        }
    }

    pub(crate) fn shape_mismatch(attribute: impl Into<String>, expected: usize, actual: usize) -> Self {
        MaterializeError::ShapeMismatch {
            attribute: attribute.into(),
            expected,
            actual,
        }
    }
}

pub type Result<T, E = MaterializeError> = std::result::Result<T, E>;
