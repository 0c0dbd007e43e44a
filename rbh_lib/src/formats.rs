//! Decoders for the individual BODY sections.
//!
//! Each decoder reads a single section's payload from a [ByteCursor](crate::ByteCursor).
//! Offsets into other sections are resolved with [Anchors](crate::Anchors).
pub mod geometry;
pub mod metadata;
pub mod model;
pub mod node_tree;
pub mod offsets;
pub mod pool;
pub mod texture;
