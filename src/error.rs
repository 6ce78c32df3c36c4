use thiserror::Error;

use crate::io::ply::ContainerKind;


#[derive(Error, Debug)]
pub enum IngestError {
    #[error("malformed splat record buffer: {len} bytes is not a multiple of the 32 byte record stride")]
    MalformedRecordBuffer {
        len: usize,
    },

    #[error("transfer of `{locator}` failed with status {status}")]
    TransferFailed {
        locator: String,
        status: u16,
    },

    #[error("transfer of `{locator}` was interrupted: {source}")]
    StreamInterrupted {
        locator: String,
        #[source]
        source: std::io::Error,
    },

    #[error("splat data is missing required fields: {}", fields.join(", "))]
    MissingRequiredFields {
        fields: Vec<String>,
    },

    #[error("`{name}` is not a recognized splat format")]
    UnrecognizedFormat {
        name: String,
    },

    #[error("load request `{name}` has neither contents nor a locator")]
    MissingSource {
        name: String,
    },

    #[error("container decode failed: {0}")]
    ContainerDecode(String),

    #[error("no decoder available for {0:?} containers")]
    UnsupportedContainer(ContainerKind),

    #[error("field `{name}` has {actual} entries, expected {expected}")]
    ColumnLength {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("duplicate field `{0}`")]
    DuplicateField(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
