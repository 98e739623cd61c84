use crate::error::BuildError;
use glam::Vec3;

const POSITION_SIZE: usize = std::mem::size_of::<[f32; 3]>();

/// Borrowed, strided vertex data. Only the leading three floats of each
/// record are read; whatever follows them in the stride is ignored.
#[derive(Clone, Copy, Debug)]
pub struct VertexBuffer<'a> {
    bytes: &'a [u8],
    stride: usize,
}

impl<'a> VertexBuffer<'a> {
    pub fn new(bytes: &'a [u8], stride: usize) -> Result<Self, BuildError> {
        if stride < POSITION_SIZE {
            return Err(BuildError::InvalidStride { stride });
        }
        Ok(Self { bytes, stride })
    }

    /// `stride` counts floats, e.g. 4 for `[x, y, z, pad]` records.
    pub fn from_floats(floats: &'a [f32], stride: usize) -> Result<Self, BuildError> {
        let bytes = stride
            .checked_mul(std::mem::size_of::<f32>())
            .ok_or(BuildError::InvalidStride { stride })?;
        Self::new(bytemuck::cast_slice(floats), bytes)
    }

    /// `[x, y, z, pad]` records, the layout `Geometry` produces.
    pub(crate) fn vec4(floats: &'a [f32]) -> Self {
        Self {
            bytes: bytemuck::cast_slice(floats),
            stride: 4 * std::mem::size_of::<f32>(),
        }
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Number of addressable vertices. The last one only needs a position,
    /// not a whole stride.
    pub fn len(&self) -> usize {
        if self.bytes.len() < POSITION_SIZE {
            0
        } else {
            (self.bytes.len() - POSITION_SIZE) / self.stride + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn position(&self, index: u32) -> Option<Vec3> {
        let start = (index as usize).checked_mul(self.stride)?;
        let raw = self.bytes.get(start..start.checked_add(POSITION_SIZE)?)?;
        let xyz: [f32; 3] = bytemuck::pod_read_unaligned(raw);
        Some(Vec3::from_array(xyz))
    }
}
