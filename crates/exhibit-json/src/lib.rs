//! JSON documents for exhibits and frames.

mod document;
mod error;

pub use crate::document::{
    encode_value, frame_to_json_string, id_from_json, id_to_json, to_json_string,
    ExhibitDocument, FrameDocument,
};
pub use crate::error::{JsonError, JsonResult};
