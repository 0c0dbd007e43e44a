//! # rbh_data
//!
//! rbh_data converts containers decoded by [rbh_lib] to Wavefront OBJ and MTL files.
//!
//! Every OBJ file references a single material library with one material per entry in [Rbh::material_ids].
//! Models can be exported individually with indices local to each model
//! or combined into a single file with one group per model.
//!
//! ```rust,no_run
//! use rbh_data::ObjExporter;
//! use rbh_lib::Rbh;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let rbh = Rbh::from_file("stan.rbh")?;
//! let paths = ObjExporter::default().export(&rbh)?;
//! # Ok(())
//! # }
//! ```
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::info;
use rbh_lib::Rbh;

pub mod mtl;
pub mod obj;

/// Settings for which files to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjExporter {
    /// Write one file per model with local indices.
    pub single_models: bool,
    /// Write all models to `<model_name>.obj`.
    pub combined: bool,
    /// Write the material library `<model_name>.mtl`.
    pub materials: bool,
}

impl Default for ObjExporter {
    fn default() -> Self {
        Self {
            single_models: true,
            combined: true,
            materials: true,
        }
    }
}

impl ObjExporter {
    /// Writes the enabled files to [Rbh::output_dir], creating the directory if needed.
    /// Returns the paths of the files written.
    pub fn export(&self, rbh: &Rbh) -> std::io::Result<Vec<PathBuf>> {
        self.export_to_dir(rbh, &rbh.output_dir)
    }

    /// Writes the enabled files to `dir`, creating the directory if needed.
    pub fn export_to_dir<P: AsRef<Path>>(
        &self,
        rbh: &Rbh,
        dir: P,
    ) -> std::io::Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;

        let name = &rbh.model_name;
        let mut paths = Vec::new();

        if self.materials {
            let path = dir.join(mtl::material_file_name(name));
            write_file(&path, |w| mtl::write_materials(w, &rbh.material_ids))?;
            paths.push(path);
        }

        if self.single_models {
            for model in &rbh.models {
                let path = dir.join(obj::single_model_file_name(name, model));
                write_file(&path, |w| obj::write_single_model(w, name, model))?;
                paths.push(path);
            }
        }

        if self.combined {
            let path = dir.join(obj::combined_file_name(name));
            write_file(&path, |w| obj::write_combined(w, name, &rbh.models))?;
            paths.push(path);
        }

        info!("Wrote {} files to {:?}", paths.len(), dir);
        Ok(paths)
    }
}

fn write_file<F: Fn(&mut BufWriter<File>) -> std::io::Result<()>>(
    path: &Path,
    write_data: F,
) -> std::io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_data(&mut writer)?;
    writer.flush()
}
