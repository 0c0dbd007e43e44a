//! Model name and part counts stored in BODY 4 of vehicle files.
use binrw::BinRead;
use log::{debug, warn};

use crate::{ByteCursor, ChunkHeader, RbhError};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(BinRead, Debug, Clone, Copy, PartialEq)]
pub struct MetadataHeader {
    /// The offset of the name relative to the section payload.
    /// The name immediately follows this header in known files.
    pub offset_name: u32,
    pub num_unknown: u32,
    pub num_lods: u32,
    pub num_sub_models: u32,
    pub num_wheels: u32,
    pub unk1: u32,
    pub unk2: u32,
    pub offset_body1: u32,
    pub offset_body5: [u32; 3],
    pub bounds: [f32; 6],
}

/// The decoded BODY 4 section.
/// The counts determine the dimensions of the tables in BODY 5.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Metadata {
    pub header: MetadataHeader,
    pub name: String,
}

impl Metadata {
    pub fn num_lods(&self) -> usize {
        self.header.num_lods as usize
    }

    pub fn num_sub_models(&self) -> usize {
        self.header.num_sub_models as usize
    }

    pub fn num_wheels(&self) -> usize {
        self.header.num_wheels as usize
    }
}

/// Reads the metadata section starting at the payload of `header`.
pub fn read_metadata(cursor: &mut ByteCursor, header: &ChunkHeader) -> Result<Metadata, RbhError> {
    let metadata_header: MetadataHeader = cursor.read()?;

    let relative_position = cursor.position() - header.payload_start;
    if relative_position != metadata_header.offset_name as u64 {
        warn!(
            "Metadata name offset {:#x} does not match the current offset {:#x}.",
            metadata_header.offset_name, relative_position
        );
    }

    let name = cursor.read_nul_terminated_string()?;

    debug!(
        "Metadata: {:?}, {} unknown, {} LODs, {} sub-models, {} wheels",
        name,
        metadata_header.num_unknown,
        metadata_header.num_lods,
        metadata_header.num_sub_models,
        metadata_header.num_wheels
    );

    Ok(Metadata {
        header: metadata_header,
        name,
    })
}
