//! Tagged chunk headers and section relative offsets.
//!
//! RBH sections store offsets relative to the start of a section's payload rather than the start of the file.
//! The section an offset is relative to is its anchor.
//! [SectionOffset] pairs each offset with its anchor, and [Anchors::resolve] is the only place
//! where offsets are converted to absolute positions.
use crate::{ByteCursor, RbhError};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The tag used by every section following the RBHH record table.
pub const BODY_TAG: &str = "BODY";

/// The size of the tag and size fields preceding each chunk payload.
pub const CHUNK_HEADER_SIZE: u64 = 8;

/// A 4 byte ASCII tag and 4 byte payload size.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkHeader {
    /// The absolute position of the first payload byte just after the tag and size.
    pub payload_start: u64,
    pub tag: String,
    /// The size of the payload in bytes.
    pub size: u32,
}

impl ChunkHeader {
    /// Reads a chunk header at the current position.
    /// The payload must fit within the input.
    pub fn read(cursor: &mut ByteCursor) -> Result<Self, RbhError> {
        let tag = cursor.read_fixed_string(4)?;
        let size = cursor.read_u32()?;
        let payload_start = cursor.position();

        if payload_start + size as u64 > cursor.len() {
            return Err(RbhError::ChunkOutOfBounds {
                tag,
                payload_start,
                size,
                len: cursor.len(),
            });
        }

        Ok(Self {
            payload_start,
            tag,
            size,
        })
    }

    /// The absolute position just past the last payload byte.
    pub fn end(&self) -> u64 {
        self.payload_start + self.size as u64
    }
}

/// The sections of an RBH container in the order they are decoded.
/// Vehicle files use every section except [SectionId::WaterTextures].
/// Map files skip the first five sections and use [SectionId::Models] for their tiles.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionId {
    /// BODY 1
    NodeTree,
    /// BODY 2
    VertexPool,
    /// BODY 3
    NormalPool,
    /// BODY 4
    Metadata,
    /// BODY 5
    OffsetTable,
    /// BODY 6
    Models,
    /// BODY 7
    Normals,
    /// BODY 8
    Vertices,
    /// Only present in some map files.
    WaterTextures,
    /// BODY 9
    TextureOffsets,
    /// BODY 10
    MaterialIds,
}

/// An offset relative to the payload start of the `anchor` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionOffset {
    pub anchor: SectionId,
    pub delta: u32,
}

impl SectionOffset {
    pub fn new(anchor: SectionId, delta: u32) -> Self {
        Self { anchor, delta }
    }
}

/// The headers of all sections decoded so far.
#[derive(Debug, Default)]
pub struct Anchors {
    headers: Vec<(SectionId, ChunkHeader)>,
}

impl Anchors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the header for `id`, replacing any previous header.
    pub fn insert(&mut self, id: SectionId, header: ChunkHeader) {
        self.headers.retain(|(existing, _)| *existing != id);
        self.headers.push((id, header));
    }

    pub fn header(&self, id: SectionId) -> Result<&ChunkHeader, RbhError> {
        self.headers
            .iter()
            .find(|(existing, _)| *existing == id)
            .map(|(_, header)| header)
            .ok_or(RbhError::SectionNotDecoded(id))
    }

    /// Converts a section relative offset to an absolute position.
    /// Offsets may point at most to the end of the anchor's payload.
    pub fn resolve(&self, offset: SectionOffset) -> Result<u64, RbhError> {
        let header = self.header(offset.anchor)?;
        if offset.delta > header.size {
            return Err(RbhError::OffsetOutOfSection {
                anchor: offset.anchor,
                delta: offset.delta,
                size: header.size,
            });
        }
        Ok(header.payload_start + offset.delta as u64)
    }

    /// Moves `cursor` to the absolute position of `offset`.
    pub fn seek(&self, cursor: &mut ByteCursor, offset: SectionOffset) -> Result<(), RbhError> {
        let position = self.resolve(offset)?;
        cursor.seek(position)
    }
}
