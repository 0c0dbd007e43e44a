//! Per LOD tables of sub-model offsets and wheel records stored in BODY 5 of vehicle files.
//!
//! BODY 5 begins with one offset per LOD.
//! Each LOD record contains the offset of its wheel table followed by one offset per sub-model record.
//! All of these offsets are relative to the payload start of [SectionId::OffsetTable].
//! The model offsets found in the sub-model and wheel records are relative to [SectionId::Models].
use binrw::BinRead;
use log::debug;

use crate::{
    Anchors, ByteCursor, DecodeOptions, Metadata, RbhError, SectionId, SectionOffset, Vector3,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A dense table indexed by LOD and a sub-model or wheel index.
/// The dimensions are fixed by the counts in [Metadata].
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct LodTable<T> {
    lods: usize,
    columns: usize,
    values: Vec<T>,
}

impl<T> LodTable<T> {
    /// Creates a table from one row per LOD.
    /// Returns `None` if any row does not have exactly `columns` elements.
    pub fn from_rows(rows: Vec<Vec<T>>, columns: usize) -> Option<Self> {
        if rows.iter().any(|r| r.len() != columns) {
            return None;
        }
        Some(Self {
            lods: rows.len(),
            columns,
            values: rows.into_iter().flatten().collect(),
        })
    }

    pub fn num_lods(&self) -> usize {
        self.lods
    }

    /// The number of elements in each LOD row.
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// The elements for a single LOD or an empty slice if `lod` is out of range.
    pub fn row(&self, lod: usize) -> &[T] {
        if lod >= self.lods {
            return &[];
        }
        let start = lod * self.columns;
        &self.values[start..start + self.columns]
    }

    /// The total number of elements across all LODs.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A wheel attached to the vehicle for a single LOD.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelEntry {
    /// The wheel index and flags like `[0, 0, 0, 0x60]`.
    pub tag: [u8; 4],
    /// The wheel's position with the Y and Z axes already converted.
    pub position: Vector3,
    /// The model offset relative to [SectionId::Models].
    pub model_offset: u32,
}

impl WheelEntry {
    /// Unused wheel slots have a zero offset and zero X position.
    /// A wheel at exactly x = 0 with offset 0 is indistinguishable from an unused slot.
    pub fn is_present(&self) -> bool {
        self.position.x != 0.0 || self.model_offset != 0
    }
}

/// The decoded BODY 5 section.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct OffsetTables {
    /// The BODY 5 relative offset of each LOD record.
    pub lod_offsets: Vec<u32>,
    /// `model_offsets[lod][sub_model]` relative to [SectionId::Models].
    pub model_offsets: LodTable<u32>,
    /// `wheels[lod][wheel]`
    pub wheels: LodTable<WheelEntry>,
}

impl OffsetTables {
    /// The model offsets of each sub-model for `lod` in sub-model order.
    pub fn sub_model_offsets(&self, lod: usize) -> impl Iterator<Item = SectionOffset> + '_ {
        self.model_offsets
            .row(lod)
            .iter()
            .map(|o| SectionOffset::new(SectionId::Models, *o))
    }

    /// The wheel slots for `lod` including slots without a wheel.
    pub fn wheels(&self, lod: usize) -> &[WheelEntry] {
        self.wheels.row(lod)
    }
}

#[derive(BinRead, Debug)]
struct LodRecord {
    _unk1: u32,
    wheel_table_offset: u32,
}

#[derive(BinRead, Debug)]
struct SubModelRecord {
    _unk1: [u32; 3],
    bounds: [f32; 4],
    model_offset: u32,
}

const WHEEL_RECORD_SIZE: u64 = 36;

#[derive(BinRead, Debug)]
struct WheelRecord {
    tag: [u8; 4],
    position: Vector3,
    _unk1: [f32; 4],
    model_offset: u32,
}

/// Reads the offset tables with the dimensions from `metadata`.
/// The cursor should be at the start of the section payload.
///
/// LOD records may share sub-model records and wheel tables,
/// so the total number of entries is checked against [DecodeOptions::max_models] before reading.
pub fn read_offset_tables(
    cursor: &mut ByteCursor,
    anchors: &Anchors,
    metadata: &Metadata,
    options: &DecodeOptions,
) -> Result<OffsetTables, RbhError> {
    let num_lods = metadata.num_lods();
    let num_sub_models = metadata.num_sub_models();
    let num_wheels = metadata.num_wheels();

    let count = num_lods as u64 * (num_sub_models as u64 + num_wheels as u64);
    if count > options.max_models as u64 {
        return Err(RbhError::TooManyModels {
            count,
            max: options.max_models,
        });
    }

    cursor.ensure_remaining(num_lods as u64 * 4)?;
    let lod_offsets = (0..num_lods)
        .map(|_| cursor.read_u32())
        .collect::<Result<Vec<_>, _>>()?;

    let mut model_rows = Vec::with_capacity(num_lods);
    let mut wheel_rows = Vec::with_capacity(num_lods);

    for (lod, lod_offset) in lod_offsets.iter().enumerate() {
        anchors.seek(cursor, SectionOffset::new(SectionId::OffsetTable, *lod_offset))?;
        let lod_record: LodRecord = cursor.read()?;

        cursor.ensure_remaining(num_sub_models as u64 * 4)?;
        let sub_model_offsets = (0..num_sub_models)
            .map(|_| cursor.read_u32())
            .collect::<Result<Vec<_>, _>>()?;

        let mut model_offsets = Vec::with_capacity(num_sub_models);
        for (sub_model, sub_model_offset) in sub_model_offsets.into_iter().enumerate() {
            anchors.seek(
                cursor,
                SectionOffset::new(SectionId::OffsetTable, sub_model_offset),
            )?;
            let record: SubModelRecord = cursor.read()?;
            debug!(
                "LOD {} sub-model {}: {:?}, model offset {:#x}",
                lod, sub_model, record.bounds, record.model_offset
            );
            model_offsets.push(record.model_offset);
        }
        model_rows.push(model_offsets);

        anchors.seek(
            cursor,
            SectionOffset::new(SectionId::OffsetTable, lod_record.wheel_table_offset),
        )?;
        cursor.ensure_remaining(num_wheels as u64 * WHEEL_RECORD_SIZE)?;
        let wheels = (0..num_wheels)
            .map(|_| {
                cursor.read::<WheelRecord>().map(|record| WheelEntry {
                    tag: record.tag,
                    position: record.position.negate_yz(),
                    model_offset: record.model_offset,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        wheel_rows.push(wheels);
    }

    let inconsistent = || RbhError::InconsistentOffsetTable {
        lods: num_lods,
        sub_models: num_sub_models,
        wheels: num_wheels,
    };
    Ok(OffsetTables {
        lod_offsets,
        model_offsets: LodTable::from_rows(model_rows, num_sub_models).ok_or_else(inconsistent)?,
        wheels: LodTable::from_rows(wheel_rows, num_wheels).ok_or_else(inconsistent)?,
    })
}
