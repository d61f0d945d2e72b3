use crate::types::FieldType;

pub type ExhibitResult<T> = Result<T, ExhibitError>;

/// Errors raised by the exhibit model and by pipeline stages.
///
/// Schema errors are raised when a descriptor, row, or vector is built (or when a stage is
/// initialized); lookup errors are raised when a name is not present. Errors coming from an
/// external collaborator are carried unchanged in [`ExhibitError::External`].
#[derive(Debug, thiserror::Error)]
pub enum ExhibitError {
    #[error("duplicate field name: {name}")]
    DuplicateField { name: String },

    #[error("field index {index} out of range for descriptor of size {size}")]
    FieldIndexOutOfRange { index: usize, size: usize },

    #[error("row arity mismatch: descriptor has {expected} fields, got {actual} values")]
    ArityMismatch { expected: usize, actual: usize },

    #[error("type mismatch for field {field}: expected {expected}, got {value}")]
    TypeMismatch {
        field: String,
        expected: FieldType,
        value: String,
    },

    #[error("invalid element type at index {index}: expected {expected}, got {value}")]
    InvalidElementType {
        index: usize,
        expected: FieldType,
        value: String,
    },

    #[error("cannot cast {value} to {target}")]
    InvalidCast { value: String, target: FieldType },

    #[error("unsupported field type: {0}")]
    UnsupportedFieldType(String),

    #[error("row descriptor does not match frame descriptor: expected [{expected}], got [{actual}]")]
    DescriptorMismatch { expected: String, actual: String },

    #[error("unknown frame: {0}")]
    UnknownFrame(String),

    #[error("unknown vector: {0}")]
    UnknownVector(String),

    #[error("unknown field: {0}")]
    UnknownField(String),

    #[error("no exhibit store registered for entity: {0}")]
    UnknownEntity(String),

    #[error("duplicate frame name in composition: {0}")]
    DuplicateFrame(String),

    #[error("duplicate vector name in composition: {0}")]
    DuplicateVector(String),

    #[error("duplicate attribute name in composition: {0}")]
    DuplicateAttribute(String),

    #[error("composite source {position} produced no rows")]
    MissingObs { position: usize },

    #[error("{stage} used before initialize")]
    NotInitialized { stage: &'static str },

    #[error("{stage} used after cleanup")]
    CleanedUp { stage: &'static str },

    #[error("pivot key combination {combination} matched {matches} rows")]
    AmbiguousPivotMatch { combination: String, matches: usize },

    #[error(transparent)]
    External(#[from] Box<dyn std::error::Error + Send + Sync>),
}
