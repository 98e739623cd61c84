// src/lib.rs
use wasm_bindgen::prelude::*;

pub mod bvh;
pub mod config;
pub mod error;
pub mod geometry;
pub mod primitives;
pub mod vertex_buffer;

pub use bvh::{Hierarchy, HierarchyNode, KdTree, NO_INDEX, NodeId, PackedNode, PackedRecord, PackedTree};
pub use config::BuildConfig;
pub use error::BuildError;
pub use geometry::Geometry;
pub use primitives::{AABB, Axis, Triangle};
pub use vertex_buffer::VertexBuffer;

#[wasm_bindgen(start)]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
}

/// Packed records kept alive on the wasm side so the host can copy them
/// straight out of linear memory.
#[wasm_bindgen]
pub struct KdTreeBuffer {
    records: Vec<PackedRecord>,
    node_count: u32,
    primitive_count: u32,
}

#[wasm_bindgen]
impl KdTreeBuffer {
    /// `stride` counts floats per vertex record.
    #[wasm_bindgen(constructor)]
    pub fn new(vertices: &[f32], stride: usize, indices: &[u32]) -> Result<KdTreeBuffer, JsError> {
        let vertex_buffer = VertexBuffer::from_floats(vertices, stride)?;
        let packed = KdTree::default().build(&vertex_buffer, indices)?;
        Ok(Self {
            node_count: packed.node_count(),
            primitive_count: packed.primitive_count(),
            records: packed.into_records(),
        })
    }

    // Pointers
    pub fn ptr(&self) -> *const u8 {
        self.records.as_ptr() as *const u8
    }
    pub fn byte_len(&self) -> usize {
        self.records.len() * std::mem::size_of::<PackedRecord>()
    }
    pub fn record_count(&self) -> usize {
        self.records.len()
    }
    pub fn node_count(&self) -> u32 {
        self.node_count
    }
    pub fn primitive_count(&self) -> u32 {
        self.primitive_count
    }
}
