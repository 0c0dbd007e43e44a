//! Per model normals and vertices stored in BODY 7 and BODY 8.
use binrw::BinRead;
use log::{debug, warn};

use crate::formats::model::Model;
use crate::{Anchors, ByteCursor, RbhError, SectionId, SectionOffset, Vector3};

const NORMAL_SIZE: u64 = 12;
const VERTEX_RECORD_SIZE: u64 = 28;

#[derive(BinRead, Debug)]
struct VertexRecord {
    position: Vector3,
    _unk1: [f32; 3],
    _unk2: u32,
}

/// Reads one normal per face for `model`.
/// Normals are stored without any coordinate conversion.
pub fn read_normals(
    cursor: &mut ByteCursor,
    anchors: &Anchors,
    model: &Model,
) -> Result<Vec<Vector3>, RbhError> {
    anchors.seek(
        cursor,
        SectionOffset::new(SectionId::Normals, model.normal_offset),
    )?;
    cursor.ensure_remaining(model.faces.len() as u64 * NORMAL_SIZE)?;
    model.faces.iter().map(|_| cursor.read::<Vector3>()).collect()
}

/// Reads the count prefixed vertex list for `model`.
/// Positions are converted to `(x, -y, -z)`.
pub fn read_vertices(
    cursor: &mut ByteCursor,
    anchors: &Anchors,
    model: &Model,
) -> Result<Vec<Vector3>, RbhError> {
    anchors.seek(
        cursor,
        SectionOffset::new(SectionId::Vertices, model.vertex_offset),
    )?;

    let count = cursor.read_u32()?;
    if count != model.sum_num_verts {
        warn!(
            "Vertex list at {:#x} has {} vertices but the model expects {}.",
            model.vertex_offset, count, model.sum_num_verts
        );
    }

    cursor.ensure_remaining(count as u64 * VERTEX_RECORD_SIZE)?;
    (0..count)
        .map(|_| {
            cursor
                .read::<VertexRecord>()
                .map(|record| record.position.negate_yz())
        })
        .collect()
}

/// Fills in [Model::normals] for every model.
pub fn bind_normals(
    cursor: &mut ByteCursor,
    anchors: &Anchors,
    models: &mut [Model],
) -> Result<(), RbhError> {
    for model in models.iter_mut() {
        model.normals = read_normals(cursor, anchors, model)?;
    }
    debug!("Bound normals for {} models", models.len());
    Ok(())
}

/// Fills in [Model::verts] for every model.
pub fn bind_vertices(
    cursor: &mut ByteCursor,
    anchors: &Anchors,
    models: &mut [Model],
) -> Result<(), RbhError> {
    for model in models.iter_mut() {
        model.verts = read_vertices(cursor, anchors, model)?;
    }
    debug!("Bound vertices for {} models", models.len());
    Ok(())
}
