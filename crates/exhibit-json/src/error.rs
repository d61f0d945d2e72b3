use exhibit_core::{ExhibitError, FieldType};

pub type JsonResult<T> = Result<T, JsonError>;

#[derive(Debug, thiserror::Error)]
pub enum JsonError {
    #[error("cannot encode {field_type} value {value} as JSON")]
    UnsupportedValue { field_type: FieldType, value: String },

    #[error(transparent)]
    Exhibit(#[from] ExhibitError),

    #[error(transparent)]
    Serde(#[from] serde_json::Error),
}
