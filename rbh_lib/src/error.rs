use thiserror::Error;

use crate::chunk::SectionId;

/// Errors while reading RBH containers.
///
/// Every variant is fatal for the current file.
/// Recoverable inconsistencies in the data are logged as warnings instead.
#[derive(Error, Debug)]
pub enum RbhError {
    /// A read or seek would move past the end of the input.
    #[error(
        "Unexpected end of input at offset {:#x}. The input is only {:#x} bytes.",
        position,
        len
    )]
    TruncatedInput { position: u64, len: u64 },

    /// The outer framing is not `PIFF <size> RBHF`.
    #[error("Expected a PIFF/RBHF container but found {:?}.", found)]
    UnrecognizedContainer { found: String },

    /// The node tree contains a cycle, a shared node, a missing child, or is too deep.
    #[error("Malformed node tree: {0}")]
    MalformedTree(String),

    /// The RBHH payload does not consist of whole 12 byte records.
    #[error("The RBHH chunk table size {} is not a multiple of 12 bytes.", size)]
    InvalidChunkTable { size: u32 },

    /// An RBHH record declares a negative section size.
    #[error("RBHH record {} has a negative section size {}.", index, size)]
    NegativeChunkSize { index: usize, size: i32 },

    /// A chunk header declares more payload bytes than the input contains.
    #[error(
        "Chunk {:?} at {:#x} with size {:#x} extends past the end of the input ({:#x} bytes).",
        tag,
        payload_start,
        size,
        len
    )]
    ChunkOutOfBounds {
        tag: String,
        payload_start: u64,
        size: u32,
        len: u64,
    },

    /// A section relative offset points past the end of its anchor section.
    #[error(
        "Offset {:#x} is outside of section {:?} with size {:#x}.",
        delta,
        anchor,
        size
    )]
    OffsetOutOfSection {
        anchor: SectionId,
        delta: u32,
        size: u32,
    },

    /// The BODY 5 tables do not match the counts from BODY 4.
    #[error(
        "Offset tables with {} LODs, {} sub-models, and {} wheels do not match the metadata counts.",
        lods,
        sub_models,
        wheels
    )]
    InconsistentOffsetTable {
        lods: usize,
        sub_models: usize,
        wheels: usize,
    },

    /// The metadata counts request more models than [DecodeOptions::max_models](crate::DecodeOptions::max_models).
    #[error(
        "The offset tables contain {} sub-model and wheel entries but at most {} are allowed.",
        count,
        max
    )]
    TooManyModels { count: u64, max: usize },

    /// A section was accessed before it was decoded.
    #[error("Section {0:?} must be decoded before it can be used.")]
    SectionNotDecoded(SectionId),

    /// An error occurred while reading the file.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// An error occurred while parsing a record.
    #[error(transparent)]
    BinRead(#[from] binrw::Error),
}
