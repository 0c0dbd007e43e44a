//! # rbh_lib
//!
//! rbh_lib is a library for reading the RBH model containers used by South Park Rally.
//!
//! An RBH file is a `PIFF` container with an `RBHH` table of section sizes followed by a series of `BODY` sections.
//! Vehicle files store a spatial node tree, vertex and normal pools, the part counts,
//! per LOD offset tables, the models for each sub-model and wheel, their geometry, and the material ids.
//! Map files skip the first sections and store a sequence of map tiles instead.
//!
//! Offsets in RBH files are relative to the payload of a specific section rather than the start of the file.
//! Sections are decoded in file order, and every offset is paired with its anchor section as a [SectionOffset].
//! Reading past the end of the input or following an offset outside its section returns an [RbhError]
//! instead of panicking.
//!
//! ## Example
//! ```rust,no_run
//! use rbh_lib::Rbh;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let rbh = Rbh::from_file("stan.rbh")?;
//! for model in &rbh.models {
//!     println!("{:?} {} faces", model.identity, model.faces.len());
//! }
//! # Ok(())
//! # }
//! ```
pub mod chunk;
pub mod container;
pub mod cursor;
pub mod formats;
pub mod scene;

mod error;
mod vectors;

#[cfg(test)]
mod test_data;

pub use chunk::{Anchors, ChunkHeader, SectionId, SectionOffset, BODY_TAG, CHUNK_HEADER_SIZE};
pub use container::{Container, ContainerKind};
pub use cursor::ByteCursor;
pub use error::RbhError;
pub use formats::metadata::Metadata;
pub use formats::model::{Face, Model, ModelIdentity};
pub use scene::Rbh;
pub use vectors::{TexCoord, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Settings for decoding a container.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// The maximum number of nodes on any path from the node tree root to a leaf.
    /// Deeper trees fail with [RbhError::MalformedTree].
    ///
    /// Sibling chains count towards the depth, so long lists of siblings produce deep but valid trees.
    /// The decoded tree is dropped, cloned, and serialized recursively,
    /// so the limit should stay well below what the thread's stack can handle.
    pub max_tree_depth: usize,
    /// The maximum number of sub-model and wheel entries across all LODs of a vehicle.
    /// Each entry decodes a model, and entries may share the same records in the file.
    /// Larger offset tables fail with [RbhError::TooManyModels].
    pub max_models: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            max_tree_depth: 1024,
            max_models: 4096,
        }
    }
}
