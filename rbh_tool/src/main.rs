use clap::Parser;
use rayon::prelude::*;
use rbh_data::ObjExporter;
use rbh_lib::Rbh;
use std::path::{Path, PathBuf};

/// Extract OBJ models from RBH vehicle and map files.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// RBH files or folders to search recursively for RBH files
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Only write the combined OBJ and the material library
    #[arg(long)]
    no_single_models: bool,

    /// Also write the decoded data to <name>.json in the output folder
    #[arg(long)]
    json: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let exporter = ObjExporter {
        single_models: !cli.no_single_models,
        ..Default::default()
    };

    let start = std::time::Instant::now();

    let files: Vec<_> = cli.files.iter().flat_map(|f| expand_path(f)).collect();
    files.par_iter().for_each(|path| {
        let status = match process_file(path, &exporter, cli.json) {
            Ok(()) => "done!".to_string(),
            Err(e) => format!("failed: {e}"),
        };
        println!("Processing {path:?}... {status}");
    });

    println!("Finished {} files in {:?}", files.len(), start.elapsed());
}

fn expand_path(path: &Path) -> Vec<PathBuf> {
    if path.is_dir() {
        match globwalk::GlobWalkerBuilder::from_patterns(path, &["*.{rbh,RBH}"]).build() {
            Ok(walker) => walker
                .filter_map(|p| p.ok())
                .map(|p| p.path().to_path_buf())
                .collect(),
            Err(e) => {
                println!("Processing {path:?}... failed: {e}");
                Vec::new()
            }
        }
    } else {
        vec![path.to_path_buf()]
    }
}

fn process_file(
    path: &Path,
    exporter: &ObjExporter,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let is_rbh = path
        .extension()
        .map(|e| e.eq_ignore_ascii_case("rbh"))
        .unwrap_or(false);
    if !is_rbh {
        let extension = path.extension().unwrap_or_default();
        return Err(format!("unsupported file type {extension:?}").into());
    }

    let rbh = Rbh::from_file(path)?;
    exporter.export(&rbh)?;

    if json {
        let json_path = rbh.output_dir.join(format!("{}.json", rbh.model_name));
        let json = serde_json::to_string_pretty(&rbh)?;
        std::fs::write(json_path, json)?;
    }

    Ok(())
}
