//! The outer `PIFF` framing and the `RBHH` table of section sizes.
use binrw::BinRead;
use log::debug;

use crate::{ByteCursor, ChunkHeader, RbhError};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The size in bytes of each [ChunkRecord] in the RBHH table.
pub const CHUNK_RECORD_SIZE: u32 = 12;

#[derive(BinRead, Debug)]
struct PiffHeader {
    magic: [u8; 4],
    total_size: u32,
    form: [u8; 4],
}

/// One entry of the RBHH table describing a single BODY section.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(BinRead, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkRecord {
    pub unk1: i32,
    /// The payload size in bytes of the corresponding BODY section.
    pub body_chunk_size: i32,
    pub unk2: i16,
    pub unk3: i16,
}

/// Whether a container stores a vehicle or a level.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    /// A vehicle with a node tree, LODs, sub-models, and wheels.
    Vehicle,
    /// A level split into sequential map tiles without a node tree.
    Map,
}

/// The decoded framing of an RBH container.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Container {
    pub total_size: u32,
    pub records: Vec<ChunkRecord>,
}

impl Container {
    /// Reads the framing and RBHH table starting at the beginning of the input.
    /// The cursor is left at the first BODY section.
    pub fn read(cursor: &mut ByteCursor) -> Result<Self, RbhError> {
        cursor.seek(0)?;
        let header: PiffHeader = cursor.read()?;
        if &header.magic != b"PIFF" || &header.form != b"RBHF" {
            let mut found = String::from_utf8_lossy(&header.magic).into_owned();
            found.push_str(&String::from_utf8_lossy(&header.form));
            return Err(RbhError::UnrecognizedContainer { found });
        }

        let table = ChunkHeader::read(cursor)?;
        if table.tag != "RBHH" {
            return Err(RbhError::UnrecognizedContainer { found: table.tag });
        }
        if table.size % CHUNK_RECORD_SIZE != 0 {
            return Err(RbhError::InvalidChunkTable { size: table.size });
        }

        let count = table.size / CHUNK_RECORD_SIZE;
        let records = (0..count)
            .map(|_| cursor.read::<ChunkRecord>())
            .collect::<Result<Vec<_>, _>>()?;

        debug!("RBHH:");
        for record in &records {
            debug!(
                "\t{}\t{}\t{}\t{}",
                record.unk1, record.body_chunk_size, record.unk2, record.unk3
            );
        }

        Ok(Self {
            total_size: header.total_size,
            records,
        })
    }

    /// Maps store a size of zero for the first section since they have no node tree.
    pub fn kind(&self) -> ContainerKind {
        match self.records.first() {
            Some(record) if record.body_chunk_size == 0 => ContainerKind::Map,
            _ => ContainerKind::Vehicle,
        }
    }

    /// The payload size of section `index` from the RBHH table.
    pub fn section_size(&self, index: usize) -> Result<Option<u32>, RbhError> {
        self.records
            .get(index)
            .map(|r| {
                u32::try_from(r.body_chunk_size).map_err(|_| RbhError::NegativeChunkSize {
                    index,
                    size: r.body_chunk_size,
                })
            })
            .transpose()
    }
}
