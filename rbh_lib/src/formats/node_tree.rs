//! The spatial node tree stored in the first BODY section of vehicle files.
//!
//! Each node is either an internal node with a sibling and a child or a leaf with a list of vertex pool indices.
//! Node offsets are relative to the payload start of [SectionId::NodeTree].
//! The tree is decoded with an explicit work stack instead of recursion,
//! so malformed inputs with cycles or very deep trees produce an error instead of overflowing the stack.
use ahash::{AHashMap, AHashSet};
use binrw::BinRead;
use log::{debug, warn};

use crate::{Anchors, ByteCursor, DecodeOptions, RbhError, SectionId, SectionOffset};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The fixed header at the start of the node tree section.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(BinRead, Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeTreeHeader {
    pub num_nodes: u32,
    pub num_leafs: u32,
    pub offset_root: u32,
    /// Always 0 in known files.
    pub offset_body2: u32,
    /// Always 0 in known files.
    pub offset_body3: u32,
}

#[derive(BinRead, Debug)]
struct NodeRecord {
    offset_sibling: u32,
    offset_child: u32,
    bounds: [f32; 4],
}

#[derive(BinRead, Debug)]
struct LeafRecord {
    num_vertices: u32,
    _unk1: u32,
    material_index: i32,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum SpatialNode {
    Internal {
        sibling: Box<SpatialNode>,
        child: Box<SpatialNode>,
        bounds: [f32; 4],
    },
    Leaf {
        bounds: [f32; 4],
        material_index: i32,
        /// Indices into the vertex pool.
        vertex_indices: Vec<u16>,
    },
}

impl SpatialNode {
    pub fn bounds(&self) -> &[f32; 4] {
        match self {
            SpatialNode::Internal { bounds, .. } => bounds,
            SpatialNode::Leaf { bounds, .. } => bounds,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, SpatialNode::Leaf { .. })
    }

    /// The number of leaves reachable from this node.
    pub fn leaf_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            match node {
                SpatialNode::Internal { sibling, child, .. } => {
                    stack.push(sibling);
                    stack.push(child);
                }
                SpatialNode::Leaf { .. } => count += 1,
            }
        }
        count
    }

    /// The number of nodes on the longest path from this node to a leaf.
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = vec![(self, 1)];
        while let Some((node, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            if let SpatialNode::Internal { sibling, child, .. } = node {
                stack.push((sibling, depth + 1));
                stack.push((child, depth + 1));
            }
        }
        max_depth
    }
}

/// The decoded node tree section.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct NodeTree {
    pub header: NodeTreeHeader,
    pub root: SpatialNode,
}

enum PendingNode {
    Internal {
        bounds: [f32; 4],
        sibling: u32,
        child: u32,
    },
    Leaf(SpatialNode),
}

/// Reads the node tree section whose header has already been registered in `anchors`.
/// The cursor should be at the start of the section payload.
pub fn read_node_tree(
    cursor: &mut ByteCursor,
    anchors: &Anchors,
    options: &DecodeOptions,
) -> Result<NodeTree, RbhError> {
    let header: NodeTreeHeader = cursor.read()?;
    if header.offset_body2 != 0 || header.offset_body3 != 0 {
        warn!(
            "Node tree header offsets {:#x} and {:#x} are expected to be 0.",
            header.offset_body2, header.offset_body3
        );
    }

    let root = read_nodes(cursor, anchors, header.offset_root, options.max_tree_depth)?;

    let leaf_count = root.leaf_count();
    if leaf_count != header.num_leafs as usize {
        warn!(
            "Node tree header declares {} leaves but {} are reachable from the root.",
            header.num_leafs, leaf_count
        );
    }
    debug!(
        "Node tree: {} nodes, {} leaves, depth {}",
        header.num_nodes,
        leaf_count,
        root.depth()
    );

    Ok(NodeTree { header, root })
}

fn read_nodes(
    cursor: &mut ByteCursor,
    anchors: &Anchors,
    offset_root: u32,
    max_depth: usize,
) -> Result<SpatialNode, RbhError> {
    // Visit nodes in preorder, so every node appears after its parent.
    let mut visited = AHashSet::new();
    let mut preorder = Vec::new();
    let mut stack = vec![(offset_root, 1usize)];

    while let Some((offset, depth)) = stack.pop() {
        if depth > max_depth {
            return Err(RbhError::MalformedTree(format!(
                "node at offset {:#x} exceeds the maximum depth of {}",
                offset, max_depth
            )));
        }
        if !visited.insert(offset) {
            return Err(RbhError::MalformedTree(format!(
                "node at offset {:#x} is referenced more than once",
                offset
            )));
        }

        anchors.seek(cursor, SectionOffset::new(SectionId::NodeTree, offset))?;
        let record: NodeRecord = cursor.read()?;

        if record.offset_sibling == 0 {
            if record.offset_child != 0 {
                warn!(
                    "Leaf node at offset {:#x} has a non zero child offset {:#x}.",
                    offset, record.offset_child
                );
            }

            let leaf: LeafRecord = cursor.read()?;
            cursor.ensure_remaining(leaf.num_vertices as u64 * 2)?;
            let vertex_indices = (0..leaf.num_vertices)
                .map(|_| cursor.read_u16())
                .collect::<Result<Vec<_>, _>>()?;

            preorder.push((
                offset,
                PendingNode::Leaf(SpatialNode::Leaf {
                    bounds: record.bounds,
                    material_index: leaf.material_index,
                    vertex_indices,
                }),
            ));
        } else {
            if record.offset_child == 0 {
                return Err(RbhError::MalformedTree(format!(
                    "internal node at offset {:#x} has no child",
                    offset
                )));
            }

            stack.push((record.offset_child, depth + 1));
            stack.push((record.offset_sibling, depth + 1));
            preorder.push((
                offset,
                PendingNode::Internal {
                    bounds: record.bounds,
                    sibling: record.offset_sibling,
                    child: record.offset_child,
                },
            ));
        }
    }

    // Build bottom up so children are always complete before their parents.
    let mut built = AHashMap::new();
    for (offset, pending) in preorder.into_iter().rev() {
        let node = match pending {
            PendingNode::Leaf(leaf) => leaf,
            PendingNode::Internal {
                bounds,
                sibling,
                child,
            } => SpatialNode::Internal {
                sibling: Box::new(take_node(&mut built, sibling)?),
                child: Box::new(take_node(&mut built, child)?),
                bounds,
            },
        };
        built.insert(offset, node);
    }

    take_node(&mut built, offset_root)
}

fn take_node(
    built: &mut AHashMap<u32, SpatialNode>,
    offset: u32,
) -> Result<SpatialNode, RbhError> {
    built.remove(&offset).ok_or_else(|| {
        RbhError::MalformedTree(format!("node at offset {:#x} was not decoded", offset))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_data::{node_tree_section, Section};
    use crate::ChunkHeader;

    fn read_tree(section: &Section, options: &DecodeOptions) -> Result<NodeTree, RbhError> {
        let data = section.to_chunk();
        let mut cursor = ByteCursor::new(&data);
        let header = ChunkHeader::read(&mut cursor).unwrap();
        let mut anchors = Anchors::new();
        anchors.insert(SectionId::NodeTree, header);
        read_node_tree(&mut cursor, &anchors, options)
    }

    #[test]
    fn read_tree_with_two_leaves() {
        let tree = read_tree(&node_tree_section(), &DecodeOptions::default()).unwrap();

        assert_eq!(2, tree.header.num_leafs);
        assert_eq!(tree.header.num_leafs as usize, tree.root.leaf_count());
        assert_eq!(2, tree.root.depth());

        match tree.root {
            SpatialNode::Internal {
                sibling,
                child,
                bounds,
            } => {
                assert_eq!([0.0, 1.0, 2.0, 3.0], bounds);
                assert_eq!(
                    SpatialNode::Leaf {
                        bounds: [4.0, 5.0, 6.0, 7.0],
                        material_index: 3,
                        vertex_indices: vec![0, 1]
                    },
                    *sibling
                );
                assert_eq!(
                    SpatialNode::Leaf {
                        bounds: [8.0, 9.0, 10.0, 11.0],
                        material_index: -1,
                        vertex_indices: vec![2]
                    },
                    *child
                );
            }
            SpatialNode::Leaf { .. } => panic!("expected an internal root"),
        }
    }

    #[test]
    fn read_tree_exceeding_max_depth() {
        let options = DecodeOptions {
            max_tree_depth: 1,
            ..Default::default()
        };
        let result = read_tree(&node_tree_section(), &options);
        assert!(matches!(result, Err(RbhError::MalformedTree(_))));
    }

    #[test]
    fn read_tree_long_sibling_chain() {
        // Each internal node has a leaf child and the next internal node as its sibling.
        let count = 300u32;
        let mut section = Section::default();
        section.u32(2 * count + 1).u32(count + 1).u32(20).u32(0).u32(0);
        for i in 0..count {
            let offset = 20 + i * 60;
            section.u32(offset + 60).u32(offset + 24).f32s(&[0.0; 4]);
            section.u32(0).u32(0).f32s(&[0.0; 4]).u32(0).u32(0).i32(0);
        }
        section.u32(0).u32(0).f32s(&[0.0; 4]).u32(0).u32(0).i32(0);

        let tree = read_tree(&section, &DecodeOptions::default()).unwrap();
        assert_eq!(count as usize + 1, tree.root.depth());
        assert_eq!(count as usize + 1, tree.root.leaf_count());
    }

    #[test]
    fn read_tree_with_cycle() {
        // The root lists itself as its own sibling.
        let mut section = Section::default();
        section.u32(1).u32(0).u32(20).u32(0).u32(0);
        section.u32(20).u32(20).f32s(&[0.0; 4]);

        let result = read_tree(&section, &DecodeOptions::default());
        assert!(matches!(result, Err(RbhError::MalformedTree(_))));
    }

    #[test]
    fn read_tree_with_shared_child() {
        // Both branches of the root point to the same leaf.
        let mut section = Section::default();
        section.u32(2).u32(1).u32(20).u32(0).u32(0);
        section.u32(44).u32(44).f32s(&[0.0; 4]);
        section.u32(0).u32(0).f32s(&[0.0; 4]).u32(0).u32(0).i32(0);

        let result = read_tree(&section, &DecodeOptions::default());
        assert!(matches!(result, Err(RbhError::MalformedTree(_))));
    }

    #[test]
    fn read_tree_internal_node_without_child() {
        let mut section = Section::default();
        section.u32(1).u32(0).u32(20).u32(0).u32(0);
        section.u32(44).u32(0).f32s(&[0.0; 4]);
        section.u32(0).u32(0).f32s(&[0.0; 4]).u32(0).u32(0).i32(0);

        let result = read_tree(&section, &DecodeOptions::default());
        assert!(matches!(result, Err(RbhError::MalformedTree(_))));
    }

    #[test]
    fn read_tree_sibling_outside_section() {
        let mut section = Section::default();
        section.u32(1).u32(0).u32(20).u32(0).u32(0);
        section.u32(0x1000).u32(44).f32s(&[0.0; 4]);

        let result = read_tree(&section, &DecodeOptions::default());
        assert!(matches!(
            result,
            Err(RbhError::OffsetOutOfSection {
                anchor: SectionId::NodeTree,
                delta: 0x1000,
                ..
            })
        ));
    }

    #[test]
    fn read_leaf_with_too_many_indices() {
        let mut section = Section::default();
        section.u32(0).u32(1).u32(20).u32(0).u32(0);
        section
            .u32(0)
            .u32(0)
            .f32s(&[0.0; 4])
            .u32(0xFFFFFFFF)
            .u32(0)
            .i32(0);

        let result = read_tree(&section, &DecodeOptions::default());
        assert!(matches!(result, Err(RbhError::TruncatedInput { .. })));
    }

    #[test]
    fn leaf_count_of_single_leaf() {
        let leaf = SpatialNode::Leaf {
            bounds: [0.0; 4],
            material_index: 0,
            vertex_indices: Vec::new(),
        };
        assert!(leaf.is_leaf());
        assert_eq!(1, leaf.leaf_count());
        assert_eq!(1, leaf.depth());
    }
}
