//! Face lists stored in BODY 6 of vehicle files and the tile section of map files.
//!
//! Each model references a run of vertices in [SectionId::Vertices](crate::SectionId::Vertices)
//! and one normal per face in [SectionId::Normals](crate::SectionId::Normals).
//! Those are bound later by [bind_normals](crate::formats::geometry::bind_normals)
//! and [bind_vertices](crate::formats::geometry::bind_vertices).
use binrw::BinRead;
use log::{debug, warn};

use crate::{ByteCursor, RbhError, TexCoord, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The identifier of vehicle models.
/// Map models use 1 for special faces and 2 for standard faces.
pub const VEHICLE_MODEL_ID: u32 = 1000;

/// The only corner flag value with known texture mapping behavior.
pub const DEFAULT_CORNER_FLAGS: u16 = 4;

const FACE_HEADER_SIZE: u64 = 12;
const FACE_CORNER_SIZE: u64 = 12;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(BinRead, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelHeader {
    pub identifier: u32,
    pub size: u32,
    pub num_faces: u32,
    pub sum_num_verts: u32,
    /// The offset of the vertex list relative to [SectionId::Vertices](crate::SectionId::Vertices).
    pub vertex_offset: u32,
    /// The offset of the face normals relative to [SectionId::Normals](crate::SectionId::Normals).
    pub normal_offset: u32,
    /// Only present for map models.
    #[br(if(identifier != VEHICLE_MODEL_ID))]
    pub extra_offset: Option<u32>,
}

#[derive(BinRead, Debug)]
struct FaceHeader {
    _tag: u32,
    _num_bytes: u8,
    num_verts: u8,
    normal_id: u16,
    material_id: u16,
    _sentinel: u16,
}

#[derive(BinRead, Debug)]
struct FaceCorner {
    vertex_id: u16,
    flags: u16,
    tex_coord: TexCoord,
}

/// A polygon with one texture coordinate per corner and a single normal.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Face {
    /// Indices into the model's vertices in winding order.
    pub vertex_ids: Vec<u16>,
    /// The index into the model's normals.
    pub normal_id: u16,
    pub material_id: u16,
    /// The index of the first texture coordinate of this face in [Model::tex_coords].
    pub tex_coord_offset: u32,
}

/// The part of a vehicle or level a [Model] represents.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ModelIdentity {
    SubModel { index: usize },
    /// The position has the Y and Z axes already converted.
    Wheel { index: usize, position: Vector3 },
    /// Map models are numbered in the order they are stored.
    MapTile { index: usize },
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    pub identifier: u32,
    pub faces: Vec<Face>,
    pub tex_coords: Vec<TexCoord>,
    /// Empty until bound from [SectionId::Vertices](crate::SectionId::Vertices).
    pub verts: Vec<Vector3>,
    /// Empty until bound from [SectionId::Normals](crate::SectionId::Normals).
    pub normals: Vec<Vector3>,
    pub sum_num_verts: u32,
    pub vertex_offset: u32,
    pub normal_offset: u32,
    /// `None` for map tiles.
    pub lod_index: Option<usize>,
    pub identity: ModelIdentity,
}

impl Model {
    pub fn is_wheel(&self) -> bool {
        matches!(self.identity, ModelIdentity::Wheel { .. })
    }

    /// The wheel's position for wheel models.
    pub fn wheel_position(&self) -> Option<Vector3> {
        match self.identity {
            ModelIdentity::Wheel { position, .. } => Some(position),
            _ => None,
        }
    }
}

/// Reads the model starting at the absolute `position`.
/// The cursor is left just past the model's trailing padding.
pub fn read_model(
    cursor: &mut ByteCursor,
    position: u64,
    lod_index: Option<usize>,
    identity: ModelIdentity,
) -> Result<Model, RbhError> {
    cursor.seek(position)?;
    let header: ModelHeader = cursor.read()?;

    cursor.ensure_remaining(header.num_faces as u64 * FACE_HEADER_SIZE)?;

    let mut faces = Vec::new();
    let mut tex_coords = Vec::new();
    let mut unrecognized_flags = 0usize;

    for _ in 0..header.num_faces {
        let face: FaceHeader = cursor.read()?;
        cursor.ensure_remaining(face.num_verts as u64 * FACE_CORNER_SIZE)?;

        let tex_coord_offset = tex_coords.len() as u32;
        let mut vertex_ids = Vec::with_capacity(face.num_verts as usize);
        for _ in 0..face.num_verts {
            let corner: FaceCorner = cursor.read()?;
            if corner.flags != DEFAULT_CORNER_FLAGS {
                unrecognized_flags += 1;
            }
            vertex_ids.push(corner.vertex_id);
            tex_coords.push(TexCoord::new(corner.tex_coord.u, -corner.tex_coord.v));
        }

        faces.push(Face {
            vertex_ids,
            normal_id: face.normal_id,
            material_id: face.material_id,
            tex_coord_offset,
        });
    }

    // Two zero padding values.
    cursor.skip(8)?;

    if unrecognized_flags > 0 {
        warn!(
            "Model at {:#x} has {} face corners with flags other than {}. Texture coordinates may be incorrect.",
            position, unrecognized_flags, DEFAULT_CORNER_FLAGS
        );
    }

    debug!(
        "Model at {:#x}: identifier {}, {} faces, {} texture coordinates, {} vertices",
        position,
        header.identifier,
        faces.len(),
        tex_coords.len(),
        header.sum_num_verts
    );

    Ok(Model {
        identifier: header.identifier,
        faces,
        tex_coords,
        verts: Vec::new(),
        normals: Vec::new(),
        sum_num_verts: header.sum_num_verts,
        vertex_offset: header.vertex_offset,
        normal_offset: header.normal_offset,
        lod_index,
        identity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_data::{hex_bytes, write_model, FaceSpec, Section};

    fn read(section: &Section) -> Result<Model, RbhError> {
        let mut cursor = ByteCursor::new(&section.0);
        read_model(
            &mut cursor,
            0,
            Some(0),
            ModelIdentity::SubModel { index: 0 },
        )
    }

    #[test]
    fn read_vehicle_triangle() {
        let data = hex_bytes(
            "E8030000 54000000 01000000 03000000 10000000 20000000
             41000000 30 03 0200 0500 ADDE
             0000 0400 0000803F 0000003F
             0100 0400 00000000 00000000
             0200 0400 00000040 000080BF
             00000000 00000000",
        );
        let mut cursor = ByteCursor::new(&data);
        let identity = ModelIdentity::SubModel { index: 2 };
        let model = read_model(&mut cursor, 0, Some(1), identity).unwrap();

        assert_eq!(VEHICLE_MODEL_ID, model.identifier);
        assert_eq!(3, model.sum_num_verts);
        assert_eq!(0x10, model.vertex_offset);
        assert_eq!(0x20, model.normal_offset);
        assert_eq!(Some(1), model.lod_index);
        assert_eq!(ModelIdentity::SubModel { index: 2 }, model.identity);
        assert_eq!(
            vec![Face {
                vertex_ids: vec![0, 1, 2],
                normal_id: 2,
                material_id: 5,
                tex_coord_offset: 0
            }],
            model.faces
        );
        // The v coordinate is negated.
        assert_eq!(
            vec![
                TexCoord::new(1.0, -0.5),
                TexCoord::new(0.0, -0.0),
                TexCoord::new(2.0, 1.0)
            ],
            model.tex_coords
        );
        assert!(model.verts.is_empty());
        assert!(model.normals.is_empty());
        assert_eq!(data.len() as u64, cursor.position());
    }

    #[test]
    fn read_map_model_extra_offset() {
        let mut section = Section::default();
        write_model(&mut section, 2, &[FaceSpec::new(&[0, 1, 2], 0, 1)], 3, 0, 0);
        let model = read(&section).unwrap();

        assert_eq!(2, model.identifier);
        assert_eq!(1, model.faces.len());
        assert_eq!(3, model.tex_coords.len());
    }

    #[test]
    fn tex_coord_offsets_are_running_sums() {
        let mut section = Section::default();
        write_model(
            &mut section,
            VEHICLE_MODEL_ID,
            &[
                FaceSpec::new(&[0, 1, 2], 0, 0),
                FaceSpec::new(&[2, 3, 4, 5], 1, 0),
                FaceSpec::new(&[5, 6, 7, 8, 9], 2, 1),
            ],
            10,
            0,
            0,
        );
        let model = read(&section).unwrap();

        let offsets: Vec<_> = model.faces.iter().map(|f| f.tex_coord_offset).collect();
        assert_eq!(vec![0, 3, 7], offsets);
        for (i, face) in model.faces.iter().enumerate() {
            let expected: usize = model.faces[..i].iter().map(|f| f.vertex_ids.len()).sum();
            assert_eq!(expected as u32, face.tex_coord_offset);
        }
        assert_eq!(12, model.tex_coords.len());
    }

    #[test]
    fn read_model_unrecognized_flags() {
        // Unknown flags are logged but the corners are still read.
        let mut section = Section::default();
        let mut face = FaceSpec::new(&[0, 1, 2], 0, 0);
        face.flags = 6;
        write_model(&mut section, VEHICLE_MODEL_ID, &[face], 3, 0, 0);

        let model = read(&section).unwrap();
        assert_eq!(vec![0, 1, 2], model.faces[0].vertex_ids);
    }

    #[test]
    fn read_model_face_count_too_large() {
        let data = hex_bytes(
            "E8030000 00000000 FFFFFFFF 00000000 00000000 00000000
             00000000 00000000",
        );
        let mut cursor = ByteCursor::new(&data);
        let result = read_model(&mut cursor, 0, None, ModelIdentity::MapTile { index: 0 });
        assert!(matches!(result, Err(RbhError::TruncatedInput { .. })));
    }

    #[test]
    fn read_model_missing_padding() {
        let mut section = Section::default();
        write_model(&mut section, VEHICLE_MODEL_ID, &[], 0, 0, 0);
        section.0.truncate(section.0.len() - 4);
        assert!(matches!(
            read(&section),
            Err(RbhError::TruncatedInput { .. })
        ));
    }

    #[test]
    fn wheel_position() {
        let mut section = Section::default();
        write_model(&mut section, VEHICLE_MODEL_ID, &[], 0, 0, 0);
        let mut cursor = ByteCursor::new(&section.0);
        let position = Vector3::new(1.0, -2.0, 3.0);
        let model = read_model(
            &mut cursor,
            0,
            Some(0),
            ModelIdentity::Wheel { index: 1, position },
        )
        .unwrap();

        assert!(model.is_wheel());
        assert_eq!(Some(position), model.wheel_position());
    }
}
