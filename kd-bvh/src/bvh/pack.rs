// src/bvh/pack.rs
use super::Hierarchy;
use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Wire value for "no primitive" in an internal record and for "no next
/// node" in any record.
pub const NO_INDEX: u32 = 0xffff_ffff;

/// One 16-byte unit of the packed output: three floats and a word.
///
/// Every node takes two records:
///
/// | node     | record 0                           | record 1                 |
/// |----------|------------------------------------|--------------------------|
/// | internal | `(aabb.min, NO_INDEX)`             | `(aabb.max, next)`       |
/// | leaf     | `(v1 - v0, primitive + 2 * nodes)` | `(v2 - v0, next)`        |
///
/// The word of record 0 is a tagged union: `NO_INDEX` marks an internal
/// node, anything else is a leaf whose primitive sits `2 * nodes` records
/// in, i.e. its offset into the trailing `(v0, 0)` table that follows the
/// last node.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct PackedRecord {
    pub vector: [f32; 3],
    pub word: u32,
}

const _: () = assert!(std::mem::size_of::<PackedRecord>() == 16);

impl PackedRecord {
    pub fn new(vector: Vec3, word: u32) -> Self {
        Self {
            vector: vector.to_array(),
            word,
        }
    }

    pub fn vector(&self) -> Vec3 {
        Vec3::from_array(self.vector)
    }
}

/// A decoded node, for inspecting packed output.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PackedNode {
    Internal {
        min: Vec3,
        max: Vec3,
        next: Option<u32>,
    },
    Leaf {
        primitive: u32,
        edge0: Vec3,
        edge1: Vec3,
        next: Option<u32>,
    },
}

impl PackedNode {
    pub fn next(&self) -> Option<u32> {
        match *self {
            PackedNode::Internal { next, .. } | PackedNode::Leaf { next, .. } => next,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct PackedTree {
    records: Vec<PackedRecord>,
    node_count: u32,
    primitive_count: u32,
}

impl PackedTree {
    pub fn records(&self) -> &[PackedRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<PackedRecord> {
        self.records
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.records)
    }

    /// Record count: `2 * node_count + primitive_count`.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn node_count(&self) -> u32 {
        self.node_count
    }

    pub fn primitive_count(&self) -> u32 {
        self.primitive_count
    }

    /// Decodes the node at `visit` (its position in visit order).
    pub fn node(&self, visit: u32) -> Option<PackedNode> {
        if visit >= self.node_count {
            return None;
        }
        let head = self.records[2 * visit as usize];
        let tail = self.records[2 * visit as usize + 1];
        let next = (tail.word != NO_INDEX).then_some(tail.word);

        Some(if head.word == NO_INDEX {
            PackedNode::Internal {
                min: head.vector(),
                max: tail.vector(),
                next,
            }
        } else {
            PackedNode::Leaf {
                primitive: head.word - 2 * self.node_count,
                edge0: head.vector(),
                edge1: tail.vector(),
                next,
            }
        })
    }

    /// First vertex of `primitive`, from the trailing table.
    pub fn anchor(&self, primitive: u32) -> Option<Vec3> {
        if primitive >= self.primitive_count {
            return None;
        }
        let index = 2 * self.node_count as usize + primitive as usize;
        Some(self.records[index].vector())
    }
}

/// Re-emits a linearized hierarchy in visit order, skip pointers
/// translated from arena handles to visit positions.
pub fn pack(hierarchy: &Hierarchy) -> PackedTree {
    let ordered = hierarchy.ordered();
    let triangles = hierarchy.triangles();
    let node_count = ordered.len() as u32;
    let leaf_offset = 2 * node_count;

    let mut records = Vec::with_capacity(2 * ordered.len() + triangles.len());
    for id in ordered {
        let node = hierarchy.node(id);
        let next = node
            .next
            .and_then(|n| hierarchy.node(n).visit_order)
            .unwrap_or(NO_INDEX);

        match node.primitive {
            Some(primitive) => {
                let (edge0, edge1) = triangles[primitive as usize].edges();
                records.push(PackedRecord::new(edge0, primitive + leaf_offset));
                records.push(PackedRecord::new(edge1, next));
            }
            None => {
                records.push(PackedRecord::new(node.aabb.min, NO_INDEX));
                records.push(PackedRecord::new(node.aabb.max, next));
            }
        }
    }

    records.extend(triangles.iter().map(|tri| PackedRecord::new(tri.v0, 0)));

    PackedTree {
        records,
        node_count,
        primitive_count: triangles.len() as u32,
    }
}
