use thiserror::Error;

/// Conditions that terminate a build. There is no partial recovery: a failed
/// pass invalidates the whole run.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protobuf decode error: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error("malformed blob framing")]
    MalformedFrame,

    #[error("blob exceeds the bounds of the input file")]
    TruncatedBlob,

    #[error("unknown blob type `{0}`")]
    UnknownBlobType(String),

    #[error("blob carries neither raw nor zlib-compressed data")]
    UnsupportedCompression,

    #[error("input requires unsupported feature `{0}`")]
    UnsupportedFeature(String),

    #[error("malformed primitive block")]
    MalformedBlock,

    #[error("changeset blocks are not supported")]
    ChangesetsUnsupported,

    #[error("intersection count exceeds the dense 32-bit id space")]
    TooManyVertices,

    #[error("highway node count exceeds the dense 32-bit id space")]
    TooManyHighwayNodes,

    #[error("edge count exceeds the 32-bit offset space")]
    TooManyEdges,

    #[error("vertex {vertex} exceeds 255 outgoing edges")]
    DegreeOverflow { vertex: u32 },
}

pub type Result<T> = std::result::Result<T, Error>;
