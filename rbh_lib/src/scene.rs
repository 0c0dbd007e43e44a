//! Decoding complete vehicle and map containers into an [Rbh].
//!
//! Sections are decoded strictly in file order.
//! Each section's header is registered as an anchor before its payload is read,
//! so later sections can resolve offsets into earlier ones.
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::container::{Container, ContainerKind};
use crate::formats::{
    geometry::{bind_normals, bind_vertices},
    metadata::{read_metadata, Metadata},
    model::{read_model, Model, ModelIdentity},
    node_tree::{read_node_tree, NodeTree},
    offsets::{read_offset_tables, OffsetTables},
    pool::read_pool,
    texture::{read_material_ids, read_texture_table, read_water_texture_names, TextureTable},
};
use crate::{
    Anchors, ByteCursor, ChunkHeader, DecodeOptions, RbhError, SectionId, SectionOffset, Vector3,
    BODY_TAG, CHUNK_HEADER_SIZE,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The number of leading map sections that are skipped.
const MAP_SKIPPED_SECTIONS: usize = 5;

/// Map files with this many RBHH records contain water texture names.
const MAP_RECORDS_WITH_WATER: usize = 12;

/// The fully decoded contents of a single RBH container.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Rbh {
    /// The base name used for exported files.
    pub model_name: String,
    /// The directory for exported files.
    pub output_dir: PathBuf,
    pub container: Container,
    /// Only present for vehicles.
    pub node_tree: Option<NodeTree>,
    pub vertex_pool: Vec<Vector3>,
    pub normal_pool: Vec<Vector3>,
    /// Only present for vehicles.
    pub metadata: Option<Metadata>,
    /// Only present for vehicles.
    pub offsets: Option<OffsetTables>,
    /// Models in the order they were decoded.
    /// Vehicles store the wheels and then the sub-models for each LOD.
    pub models: Vec<Model>,
    pub water_texture_names: Vec<String>,
    pub textures: TextureTable,
    /// One id per entry in [TextureTable::texture_offsets].
    pub material_ids: Vec<u16>,
}

impl Rbh {
    /// Reads the container at `path`.
    /// The model name is the file stem, and the output directory is `<stem>.output` next to the file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, RbhError> {
        let path = path.as_ref();
        let data = fs::read(path)?;
        let model_name = model_name(path);
        let output_dir = output_dir(path);
        Self::read(&data, model_name, output_dir)
    }

    /// Reads a container from `data` with the default [DecodeOptions].
    pub fn read<S: Into<String>, P: Into<PathBuf>>(
        data: &[u8],
        model_name: S,
        output_dir: P,
    ) -> Result<Self, RbhError> {
        Self::read_with_options(data, model_name, output_dir, &DecodeOptions::default())
    }

    pub fn read_with_options<S: Into<String>, P: Into<PathBuf>>(
        data: &[u8],
        model_name: S,
        output_dir: P,
        options: &DecodeOptions,
    ) -> Result<Self, RbhError> {
        let mut cursor = ByteCursor::new(data);
        let container = Container::read(&mut cursor)?;
        let kind = container.kind();

        let mut decoder = Decoder {
            cursor,
            anchors: Anchors::new(),
            container: &container,
            options,
            section_index: 0,
        };
        let builder = match kind {
            ContainerKind::Vehicle => decoder.read_vehicle()?,
            ContainerKind::Map => decoder.read_map()?,
        };

        let model_name = model_name.into();
        let rbh = builder.build(model_name, output_dir.into(), container)?;
        info!(
            "Decoded {:?} {:?} with {} models",
            kind,
            rbh.model_name,
            rbh.models.len()
        );
        Ok(rbh)
    }

    pub fn kind(&self) -> ContainerKind {
        self.container.kind()
    }

    pub fn is_map(&self) -> bool {
        self.kind() == ContainerKind::Map
    }
}

/// The file stem of `path`.
pub fn model_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// The `<stem>.output` directory next to `path`.
pub fn output_dir(path: &Path) -> PathBuf {
    let parent = path.parent().unwrap_or_else(|| Path::new(""));
    parent.join(format!("{}.output", model_name(path)))
}

/// Partially decoded state.
/// Accessors fail with [RbhError::SectionNotDecoded] if a section is used before it is read.
#[derive(Debug, Default)]
struct RbhBuilder {
    node_tree: Option<NodeTree>,
    vertex_pool: Vec<Vector3>,
    normal_pool: Vec<Vector3>,
    metadata: Option<Metadata>,
    offsets: Option<OffsetTables>,
    models: Option<Vec<Model>>,
    water_texture_names: Vec<String>,
    textures: Option<TextureTable>,
    material_ids: Option<Vec<u16>>,
}

impl RbhBuilder {
    fn metadata(&self) -> Result<&Metadata, RbhError> {
        self.metadata
            .as_ref()
            .ok_or(RbhError::SectionNotDecoded(SectionId::Metadata))
    }

    fn offsets(&self) -> Result<&OffsetTables, RbhError> {
        self.offsets
            .as_ref()
            .ok_or(RbhError::SectionNotDecoded(SectionId::OffsetTable))
    }

    fn models_mut(&mut self) -> Result<&mut Vec<Model>, RbhError> {
        self.models
            .as_mut()
            .ok_or(RbhError::SectionNotDecoded(SectionId::Models))
    }

    fn textures(&self) -> Result<&TextureTable, RbhError> {
        self.textures
            .as_ref()
            .ok_or(RbhError::SectionNotDecoded(SectionId::TextureOffsets))
    }

    fn check_offset_tables(&self) -> Result<(), RbhError> {
        let metadata = self.metadata()?;
        let offsets = self.offsets()?;

        let model_offsets = &offsets.model_offsets;
        let wheels = &offsets.wheels;
        let lods_match = model_offsets.num_lods() == metadata.num_lods()
            && wheels.num_lods() == metadata.num_lods();
        let rows_match = (0..metadata.num_lods()).all(|lod| {
            model_offsets.row(lod).len() == metadata.num_sub_models()
                && wheels.row(lod).len() == metadata.num_wheels()
        });

        if lods_match && rows_match {
            Ok(())
        } else {
            Err(RbhError::InconsistentOffsetTable {
                lods: model_offsets.num_lods(),
                sub_models: model_offsets.columns(),
                wheels: wheels.columns(),
            })
        }
    }

    fn build(
        self,
        model_name: String,
        output_dir: PathBuf,
        container: Container,
    ) -> Result<Rbh, RbhError> {
        let models = self
            .models
            .ok_or(RbhError::SectionNotDecoded(SectionId::Models))?;
        let textures = self
            .textures
            .ok_or(RbhError::SectionNotDecoded(SectionId::TextureOffsets))?;
        let material_ids = self
            .material_ids
            .ok_or(RbhError::SectionNotDecoded(SectionId::MaterialIds))?;

        Ok(Rbh {
            model_name,
            output_dir,
            container,
            node_tree: self.node_tree,
            vertex_pool: self.vertex_pool,
            normal_pool: self.normal_pool,
            metadata: self.metadata,
            offsets: self.offsets,
            models,
            water_texture_names: self.water_texture_names,
            textures,
            material_ids,
        })
    }
}

struct Decoder<'a> {
    cursor: ByteCursor<'a>,
    anchors: Anchors,
    container: &'a Container,
    options: &'a DecodeOptions,
    section_index: usize,
}

impl<'a> Decoder<'a> {
    /// Reads the next section header and registers it as the anchor for `id`.
    fn begin_section(&mut self, id: SectionId) -> Result<ChunkHeader, RbhError> {
        let header = self.next_header()?;
        debug!(
            "Section {:?} at {:#x} with size {:#x}",
            id, header.payload_start, header.size
        );
        self.anchors.insert(id, header.clone());
        Ok(header)
    }

    fn next_header(&mut self) -> Result<ChunkHeader, RbhError> {
        let header = ChunkHeader::read(&mut self.cursor)?;
        if header.tag != BODY_TAG {
            warn!(
                "Expected a {} chunk at {:#x} but found {:?}.",
                BODY_TAG,
                header.payload_start - CHUNK_HEADER_SIZE,
                header.tag
            );
        }

        if let Some(size) = self.container.section_size(self.section_index)? {
            if size != header.size {
                warn!(
                    "Section {} has size {:#x} but RBHH record {} has size {:#x}.",
                    self.section_index, header.size, self.section_index, size
                );
            }
        }
        self.section_index += 1;
        Ok(header)
    }

    /// Moves past any unread bytes at the end of the section.
    fn end_section(&mut self, header: &ChunkHeader) -> Result<(), RbhError> {
        self.cursor.seek(header.end())
    }

    /// Skips a section using the size from its RBHH record.
    /// The chunk header's size is only used if the section has no record.
    fn skip_section(&mut self) -> Result<(), RbhError> {
        let index = self.section_index;
        let header = self.next_header()?;
        let size = self.container.section_size(index)?.unwrap_or(header.size);
        self.cursor.seek(header.payload_start + size as u64)
    }

    fn read_vehicle(&mut self) -> Result<RbhBuilder, RbhError> {
        let mut builder = RbhBuilder::default();

        let header = self.begin_section(SectionId::NodeTree)?;
        builder.node_tree = Some(read_node_tree(
            &mut self.cursor,
            &self.anchors,
            self.options,
        )?);
        self.end_section(&header)?;

        let header = self.begin_section(SectionId::VertexPool)?;
        builder.vertex_pool = read_pool(&mut self.cursor)?;
        self.end_section(&header)?;

        let header = self.begin_section(SectionId::NormalPool)?;
        builder.normal_pool = read_pool(&mut self.cursor)?;
        self.end_section(&header)?;

        let header = self.begin_section(SectionId::Metadata)?;
        builder.metadata = Some(read_metadata(&mut self.cursor, &header)?);
        self.end_section(&header)?;

        let header = self.begin_section(SectionId::OffsetTable)?;
        builder.offsets = Some(read_offset_tables(
            &mut self.cursor,
            &self.anchors,
            builder.metadata()?,
            self.options,
        )?);
        self.end_section(&header)?;
        builder.check_offset_tables()?;

        let header = self.begin_section(SectionId::Models)?;
        let num_lods = builder.metadata()?.num_lods();
        let models = self.read_vehicle_models(num_lods, builder.offsets()?)?;
        builder.models = Some(models);
        self.end_section(&header)?;

        self.read_geometry(&mut builder)?;
        self.read_materials(&mut builder)?;
        Ok(builder)
    }

    fn read_vehicle_models(
        &mut self,
        num_lods: usize,
        offsets: &OffsetTables,
    ) -> Result<Vec<Model>, RbhError> {
        let mut models = Vec::new();
        for lod in 0..num_lods {
            for (index, wheel) in offsets.wheels(lod).iter().enumerate() {
                if !wheel.is_present() {
                    debug!("LOD {} wheel {} is not present", lod, index);
                    continue;
                }

                let position = self
                    .anchors
                    .resolve(SectionOffset::new(SectionId::Models, wheel.model_offset))?;
                let identity = ModelIdentity::Wheel {
                    index,
                    position: wheel.position,
                };
                models.push(read_model(&mut self.cursor, position, Some(lod), identity)?);
            }

            for (index, offset) in offsets.sub_model_offsets(lod).enumerate() {
                let position = self.anchors.resolve(offset)?;
                let identity = ModelIdentity::SubModel { index };
                models.push(read_model(&mut self.cursor, position, Some(lod), identity)?);
            }
        }
        Ok(models)
    }

    fn read_map(&mut self) -> Result<RbhBuilder, RbhError> {
        let mut builder = RbhBuilder::default();

        for _ in 0..MAP_SKIPPED_SECTIONS {
            self.skip_section()?;
        }

        let header = self.begin_section(SectionId::Models)?;
        let mut models = Vec::new();
        while self.cursor.position() < header.end() {
            let position = self.cursor.position();
            let identity = ModelIdentity::MapTile {
                index: models.len(),
            };
            models.push(read_model(&mut self.cursor, position, None, identity)?);
        }
        if self.cursor.position() > header.end() {
            warn!(
                "The last map model ends at {:#x} past the section end {:#x}.",
                self.cursor.position(),
                header.end()
            );
        }
        builder.models = Some(models);
        self.end_section(&header)?;

        self.read_geometry(&mut builder)?;

        if self.container.records.len() == MAP_RECORDS_WITH_WATER {
            let header = self.begin_section(SectionId::WaterTextures)?;
            builder.water_texture_names = read_water_texture_names(&mut self.cursor, &header)?;
            self.end_section(&header)?;
        }

        self.read_materials(&mut builder)?;
        Ok(builder)
    }

    fn read_geometry(&mut self, builder: &mut RbhBuilder) -> Result<(), RbhError> {
        let header = self.begin_section(SectionId::Normals)?;
        bind_normals(&mut self.cursor, &self.anchors, builder.models_mut()?)?;
        self.end_section(&header)?;

        let header = self.begin_section(SectionId::Vertices)?;
        bind_vertices(&mut self.cursor, &self.anchors, builder.models_mut()?)?;
        self.end_section(&header)
    }

    fn read_materials(&mut self, builder: &mut RbhBuilder) -> Result<(), RbhError> {
        let header = self.begin_section(SectionId::TextureOffsets)?;
        builder.textures = Some(read_texture_table(&mut self.cursor)?);
        self.end_section(&header)?;

        let header = self.begin_section(SectionId::MaterialIds)?;
        builder.material_ids = Some(read_material_ids(
            &mut self.cursor,
            &self.anchors,
            builder.textures()?,
        )?);
        self.end_section(&header)
    }
}
