//! Builders for synthetic sections and containers used in tests.
use byteorder::{LittleEndian, WriteBytesExt};

use crate::formats::model::{DEFAULT_CORNER_FLAGS, VEHICLE_MODEL_ID};

pub fn hex_bytes(hex: &str) -> Vec<u8> {
    // Remove any whitespace used to make the tests more readable.
    let no_whitespace: String = hex.chars().filter(|c| !c.is_whitespace()).collect();
    hex::decode(no_whitespace).unwrap()
}

/// The little-endian payload of a single section.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Section(pub Vec<u8>);

impl Section {
    pub fn u8(&mut self, value: u8) -> &mut Self {
        self.0.write_u8(value).unwrap();
        self
    }

    pub fn u16(&mut self, value: u16) -> &mut Self {
        self.0.write_u16::<LittleEndian>(value).unwrap();
        self
    }

    pub fn i16(&mut self, value: i16) -> &mut Self {
        self.0.write_i16::<LittleEndian>(value).unwrap();
        self
    }

    pub fn u32(&mut self, value: u32) -> &mut Self {
        self.0.write_u32::<LittleEndian>(value).unwrap();
        self
    }

    pub fn i32(&mut self, value: i32) -> &mut Self {
        self.0.write_i32::<LittleEndian>(value).unwrap();
        self
    }

    pub fn f32(&mut self, value: f32) -> &mut Self {
        self.0.write_f32::<LittleEndian>(value).unwrap();
        self
    }

    pub fn f32s(&mut self, values: &[f32]) -> &mut Self {
        for value in values {
            self.f32(*value);
        }
        self
    }

    pub fn bytes(&mut self, values: &[u8]) -> &mut Self {
        self.0.extend_from_slice(values);
        self
    }

    /// Overwrites the 4 bytes at `offset`.
    pub fn patch_u32(&mut self, offset: usize, value: u32) -> &mut Self {
        self.0[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
        self
    }

    pub fn len(&self) -> u32 {
        self.0.len() as u32
    }

    /// The payload with a `BODY` tag and size.
    pub fn to_chunk(&self) -> Vec<u8> {
        let mut chunk = b"BODY".to_vec();
        chunk.write_u32::<LittleEndian>(self.len()).unwrap();
        chunk.extend_from_slice(&self.0);
        chunk
    }
}

/// A `PIFF` container with one RBHH record and one `BODY` chunk per section.
/// An empty first section marks the container as a map.
pub fn container(sections: &[Section]) -> Vec<u8> {
    let mut table = Section::default();
    for section in sections {
        table.i32(1).i32(section.len() as i32).i16(0).i16(0);
    }

    let mut body = b"RBHF".to_vec();
    body.extend_from_slice(b"RBHH");
    body.write_u32::<LittleEndian>(table.len()).unwrap();
    body.extend_from_slice(&table.0);
    for section in sections {
        body.extend_from_slice(&section.to_chunk());
    }

    let mut data = b"PIFF".to_vec();
    data.write_u32::<LittleEndian>(body.len() as u32).unwrap();
    data.extend_from_slice(&body);
    data
}

/// A tree with an internal root and two leaves.
///
/// The root at 20 has a sibling leaf at 44 and a child leaf at 84.
pub fn node_tree_section() -> Section {
    let mut section = Section::default();
    section.u32(3).u32(2).u32(20).u32(0).u32(0);
    section.u32(44).u32(84).f32s(&[0.0, 1.0, 2.0, 3.0]);
    section
        .u32(0)
        .u32(0)
        .f32s(&[4.0, 5.0, 6.0, 7.0])
        .u32(2)
        .u32(0)
        .i32(3)
        .u16(0)
        .u16(1);
    section
        .u32(0)
        .u32(0)
        .f32s(&[8.0, 9.0, 10.0, 11.0])
        .u32(1)
        .u32(0)
        .i32(-1)
        .u16(2);
    section
}

/// A count prefixed pool of vectors.
pub fn pool_section(values: &[[f32; 3]]) -> Section {
    let mut section = Section::default();
    section.u32(values.len() as u32);
    for value in values {
        section.f32s(value);
    }
    section
}

pub fn metadata_section(
    name: &str,
    num_lods: u32,
    num_sub_models: u32,
    num_wheels: u32,
    offset_name: u32,
) -> Section {
    let mut section = Section::default();
    section
        .u32(offset_name)
        .u32(0)
        .u32(num_lods)
        .u32(num_sub_models)
        .u32(num_wheels)
        .u32(0)
        .u32(0)
        .u32(0)
        .u32(0)
        .u32(0)
        .u32(0)
        .f32s(&[-1.0, -1.0, -1.0, 1.0, 1.0, 1.0])
        .bytes(name.as_bytes())
        .u8(0);
    section
}

/// A wheel record as stored before any coordinate conversion.
#[derive(Debug, Clone, Copy)]
pub struct WheelSpec {
    pub tag: [u8; 4],
    pub position: [f32; 3],
    pub model_offset: u32,
}

/// Offset tables with one row of model offsets per LOD.
/// Every LOD uses the same `wheels`.
pub fn offset_table_section(model_offsets: &[Vec<u32>], wheels: &[WheelSpec]) -> Section {
    let mut section = Section::default();
    for _ in model_offsets {
        section.u32(0);
    }

    for (lod, offsets) in model_offsets.iter().enumerate() {
        let lod_start = section.len();
        section.patch_u32(lod * 4, lod_start);

        let sub_models_start = lod_start + 8 + 4 * offsets.len() as u32;
        let wheel_table = sub_models_start + 32 * offsets.len() as u32;
        section.u32(0).u32(wheel_table);
        for i in 0..offsets.len() as u32 {
            section.u32(sub_models_start + 32 * i);
        }

        for offset in offsets {
            section
                .u32(1)
                .u32(2)
                .u32(3)
                .f32s(&[0.0, 1.0, 2.0, 3.0])
                .u32(*offset);
        }

        for wheel in wheels {
            section
                .bytes(&wheel.tag)
                .f32s(&wheel.position)
                .f32s(&[0.0; 4])
                .u32(wheel.model_offset);
        }
    }
    section
}

/// A face whose texture coordinates are `(vertex_id, 0.5)` as stored.
#[derive(Debug, Clone)]
pub struct FaceSpec {
    pub vertex_ids: Vec<u16>,
    pub normal_id: u16,
    pub material_id: u16,
    pub flags: u16,
}

impl FaceSpec {
    pub fn new(vertex_ids: &[u16], normal_id: u16, material_id: u16) -> Self {
        Self {
            vertex_ids: vertex_ids.to_vec(),
            normal_id,
            material_id,
            flags: DEFAULT_CORNER_FLAGS,
        }
    }
}

/// Appends a model to `section` and returns its offset.
pub fn write_model(
    section: &mut Section,
    identifier: u32,
    faces: &[FaceSpec],
    sum_num_verts: u32,
    vertex_offset: u32,
    normal_offset: u32,
) -> u32 {
    let start = section.len();
    section
        .u32(identifier)
        .u32(0)
        .u32(faces.len() as u32)
        .u32(sum_num_verts)
        .u32(vertex_offset)
        .u32(normal_offset);
    if identifier != VEHICLE_MODEL_ID {
        section.u32(0);
    }

    for face in faces {
        section
            .u32(0x41)
            .u8(12 + 12 * face.vertex_ids.len() as u8)
            .u8(face.vertex_ids.len() as u8)
            .u16(face.normal_id)
            .u16(face.material_id)
            .u16(0xDEAD);
        for id in &face.vertex_ids {
            section.u16(*id).u16(face.flags).f32(*id as f32).f32(0.5);
        }
    }
    section.u32(0).u32(0);

    let size = section.len() - start;
    section.patch_u32(start as usize + 4, size);
    start
}

/// Count prefixed vertex lists with 28 byte records.
pub fn vertex_section(lists: &[&[[f32; 3]]]) -> Section {
    let mut section = Section::default();
    for list in lists {
        write_vertices(&mut section, list);
    }
    section
}

/// Appends a vertex list to `section` and returns its offset.
pub fn write_vertices(section: &mut Section, positions: &[[f32; 3]]) -> u32 {
    let start = section.len();
    section.u32(positions.len() as u32);
    for position in positions {
        section.f32s(position).f32s(&[0.0; 3]).u32(0);
    }
    start
}

/// A texture table without special textures followed by the material id section it references.
pub fn material_sections(material_ids: &[u16]) -> (Section, Section) {
    let mut textures = Section::default();
    let mut materials = Section::default();

    textures.u16(material_ids.len() as u16).u16(0).u32(0).u32(0);
    for id in material_ids {
        textures.u32(materials.len());
        materials.u16(*id);
    }
    (textures, materials)
}
