//! Wavefront MTL output for the material id table.
use std::io::Write;

/// The name of the material library referenced by every OBJ file.
pub fn material_file_name(model_name: &str) -> String {
    format!("{model_name}.mtl")
}

/// The texture file for a material id.
/// Id 0 is untextured and has no texture file.
pub fn texture_file_name(material_id: u16) -> Option<String> {
    (material_id != 0).then(|| format!("{material_id:04}.bmp"))
}

/// Writes one material named `i + 1` for each entry `i` in `material_ids`.
pub fn write_materials<W: Write>(writer: &mut W, material_ids: &[u16]) -> std::io::Result<()> {
    for (i, id) in material_ids.iter().enumerate() {
        writeln!(writer, "newmtl {}", i + 1)?;
        writeln!(writer, "Ka 1.0 1.0 1.0")?;
        writeln!(writer, "Kd 1.0 1.0 1.0")?;
        writeln!(writer, "Ks 0.0 0.0 0.0")?;
        writeln!(writer, "d 1.0")?;
        writeln!(writer, "illum 2")?;
        if let Some(texture) = texture_file_name(*id) {
            writeln!(writer, "map_Kd {texture}")?;
        }
        writeln!(writer)?;
    }
    Ok(())
}
