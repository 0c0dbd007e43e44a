//! Wavefront OBJ output for decoded models.
//!
//! Faces are written with their corners reversed to match the winding order expected by OBJ viewers.
//! Each face uses one texture coordinate per corner and a single normal.
use std::io::Write;

use log::warn;
use rbh_lib::{Face, Model, ModelIdentity, TexCoord, Vector3};

use crate::mtl::material_file_name;

/// The name of the per model file for `model`.
pub fn single_model_file_name(model_name: &str, model: &Model) -> String {
    let lod = model.lod_index.unwrap_or_default();
    match model.identity {
        ModelIdentity::SubModel { index } => format!("{model_name}_{lod}_{index}.obj"),
        ModelIdentity::Wheel { index, .. } => format!("{model_name}_{lod}_wheel_{index}.obj"),
        ModelIdentity::MapTile { index } => format!("{model_name}_{index}.obj"),
    }
}

/// The name of the file containing every model.
pub fn combined_file_name(model_name: &str) -> String {
    format!("{model_name}.obj")
}

/// Writes a single model using indices local to the model.
/// Wheels are written at the origin.
pub fn write_single_model<W: Write>(
    writer: &mut W,
    model_name: &str,
    model: &Model,
) -> std::io::Result<()> {
    write_mtllib(writer, model_name)?;

    write_vertices(writer, model.verts.iter().copied())?;
    writeln!(writer)?;
    write_tex_coords(writer, &model.tex_coords)?;
    writeln!(writer)?;
    write_normals(writer, &model.normals)?;
    writeln!(writer)?;

    writeln!(writer, "g {model_name}")?;
    check_face_indices(model);
    write_faces(writer, &model.faces, IndexOffsets::default())?;
    writeln!(writer)?;
    Ok(())
}

/// Writes every model to a single file with one group per model.
/// Wheel vertices are translated by the wheel's position.
pub fn write_combined<W: Write>(
    writer: &mut W,
    model_name: &str,
    models: &[Model],
) -> std::io::Result<()> {
    write_mtllib(writer, model_name)?;

    for model in models {
        match model.wheel_position() {
            Some(position) => write_vertices(writer, model.verts.iter().map(|v| *v + position))?,
            None => write_vertices(writer, model.verts.iter().copied())?,
        }
    }
    writeln!(writer)?;

    for model in models {
        write_tex_coords(writer, &model.tex_coords)?;
    }
    writeln!(writer)?;

    for model in models {
        write_normals(writer, &model.normals)?;
    }
    writeln!(writer)?;

    let mut offsets = IndexOffsets::default();
    for (i, model) in models.iter().enumerate() {
        writeln!(writer, "g {model_name}_{}", i + 1)?;
        check_face_indices(model);
        write_faces(writer, &model.faces, offsets)?;

        offsets.vertex += model.verts.len();
        offsets.tex_coord += model.tex_coords.len();
        offsets.normal += model.normals.len();
    }
    Ok(())
}

fn write_mtllib<W: Write>(writer: &mut W, model_name: &str) -> std::io::Result<()> {
    writeln!(writer, "mtllib {}", material_file_name(model_name))?;
    writeln!(writer)
}

fn write_vertices<W: Write, I: Iterator<Item = Vector3>>(
    writer: &mut W,
    vertices: I,
) -> std::io::Result<()> {
    for v in vertices {
        writeln!(writer, "v {:.6} {:.6} {:.6}", v.x, v.y, v.z)?;
    }
    Ok(())
}

fn write_tex_coords<W: Write>(writer: &mut W, tex_coords: &[TexCoord]) -> std::io::Result<()> {
    for vt in tex_coords {
        writeln!(writer, "vt {:.6} {:.6}", vt.u, vt.v)?;
    }
    Ok(())
}

fn write_normals<W: Write>(writer: &mut W, normals: &[Vector3]) -> std::io::Result<()> {
    for vn in normals {
        writeln!(writer, "vn {:.6} {:.6} {:.6}", vn.x, vn.y, vn.z)?;
    }
    Ok(())
}

/// The number of elements written by previous models.
#[derive(Debug, Default, Clone, Copy)]
struct IndexOffsets {
    vertex: usize,
    tex_coord: usize,
    normal: usize,
}

fn write_faces<W: Write>(
    writer: &mut W,
    faces: &[Face],
    offsets: IndexOffsets,
) -> std::io::Result<()> {
    // Material changes are only written when the id changes.
    let mut previous_material = None;
    for face in faces {
        if previous_material != Some(face.material_id) {
            writeln!(writer, "usemtl {}", face.material_id as u32 + 1)?;
            previous_material = Some(face.material_id);
        }

        write!(writer, "f")?;
        for (i, vertex_id) in face.vertex_ids.iter().enumerate().rev() {
            let v = offsets.vertex + *vertex_id as usize + 1;
            let vt = offsets.tex_coord + face.tex_coord_offset as usize + i + 1;
            let vn = offsets.normal + face.normal_id as usize + 1;
            write!(writer, " {v}/{vt}/{vn}")?;
        }
        writeln!(writer)?;
    }
    Ok(())
}

fn check_face_indices(model: &Model) {
    let invalid_vertices = model
        .faces
        .iter()
        .flat_map(|f| f.vertex_ids.iter())
        .filter(|id| **id as usize >= model.verts.len())
        .count();
    if invalid_vertices > 0 {
        warn!(
            "{:?} has {} face corners referencing vertices outside its {} vertices.",
            model.identity,
            invalid_vertices,
            model.verts.len()
        );
    }

    let invalid_normals = model
        .faces
        .iter()
        .filter(|f| f.normal_id as usize >= model.normals.len())
        .count();
    if invalid_normals > 0 {
        warn!(
            "{:?} has {} faces referencing normals outside its {} normals.",
            model.identity,
            invalid_normals,
            model.normals.len()
        );
    }
}
