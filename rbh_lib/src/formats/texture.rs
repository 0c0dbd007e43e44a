//! Texture offsets in BODY 9, material ids in BODY 10, and the optional water texture names of map files.
use binrw::BinRead;
use log::{debug, warn};

use crate::{Anchors, ByteCursor, ChunkHeader, RbhError, SectionId, SectionOffset};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(BinRead, Debug)]
struct TextureTableHeader {
    num_textures: u16,
    num_special_textures: u16,
    offset: u32,
    offset_special: u32,
}

/// The decoded BODY 9 section.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextureTable {
    /// Offsets relative to [SectionId::MaterialIds] with one entry per material.
    pub texture_offsets: Vec<u32>,
    /// Decoded for completeness but not used for materials.
    pub special_texture_offsets: Vec<u32>,
}

pub fn read_texture_table(cursor: &mut ByteCursor) -> Result<TextureTable, RbhError> {
    let header: TextureTableHeader = cursor.read()?;

    let texture_offsets = read_u32s(cursor, header.num_textures)?;
    let special_texture_offsets = read_u32s(cursor, header.num_special_textures)?;

    debug!(
        "Textures: {}, {}, {:#x}, {:#x}",
        header.num_textures, header.num_special_textures, header.offset, header.offset_special
    );

    Ok(TextureTable {
        texture_offsets,
        special_texture_offsets,
    })
}

fn read_u32s(cursor: &mut ByteCursor, count: u16) -> Result<Vec<u32>, RbhError> {
    (0..count).map(|_| cursor.read_u32()).collect()
}

/// Reads one material id for each entry in [TextureTable::texture_offsets].
pub fn read_material_ids(
    cursor: &mut ByteCursor,
    anchors: &Anchors,
    textures: &TextureTable,
) -> Result<Vec<u16>, RbhError> {
    textures
        .texture_offsets
        .iter()
        .map(|offset| {
            anchors.seek(cursor, SectionOffset::new(SectionId::MaterialIds, *offset))?;
            cursor.read_u16()
        })
        .collect()
}

/// Reads NUL terminated names until the end of the section described by `header`.
pub fn read_water_texture_names(
    cursor: &mut ByteCursor,
    header: &ChunkHeader,
) -> Result<Vec<String>, RbhError> {
    let mut names = Vec::new();
    while cursor.position() < header.end() {
        let name = cursor.read_nul_terminated_string()?;
        debug!("Water texture: {:?}", name);
        names.push(name);
    }

    if cursor.position() > header.end() {
        warn!(
            "Water texture name {:?} extends past the end of its section.",
            names.last().map(String::as_str).unwrap_or_default()
        );
    }

    Ok(names)
}
