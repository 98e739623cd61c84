use crate::vertex_buffer::VertexBuffer;
use glam::{Vec3, vec3};
use log::warn;
use std::f32::consts::PI;

/// Floats per vertex record: `[x, y, z, pad]`.
pub const VERTEX_STRIDE: usize = 4;

#[derive(Default, Clone, Debug)]
pub struct Geometry {
    pub vertices: Vec<f32>, // [x, y, z, pad]
    pub indices: Vec<u32>,  // [i0, i1, i2]
}

impl Geometry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / VERTEX_STRIDE
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn vertex_buffer(&self) -> VertexBuffer<'_> {
        VertexBuffer::vec4(&self.vertices)
    }

    fn push_vertex(&mut self, v: Vec3) -> u32 {
        let index = self.vertex_count() as u32;
        self.vertices.extend_from_slice(&[v.x, v.y, v.z, 0.0]);
        index
    }

    pub fn add_triangle(&mut self, v0: Vec3, v1: Vec3, v2: Vec3) {
        let i0 = self.push_vertex(v0);
        let i1 = self.push_vertex(v1);
        let i2 = self.push_vertex(v2);
        self.indices.extend_from_slice(&[i0, i1, i2]);
    }

    /// Axis-aligned box centred at the origin: 24 vertices, two triangles
    /// per face, faces in front/back/top/bottom/left/right order.
    pub fn add_box(&mut self, size: Vec3) {
        let h = size * 0.5;
        let base = self.vertex_count() as u32;

        let corners = [
            // front
            vec3(-h.x, -h.y, -h.z),
            vec3(-h.x, h.y, -h.z),
            vec3(h.x, h.y, -h.z),
            vec3(h.x, -h.y, -h.z),
            // back
            vec3(-h.x, -h.y, h.z),
            vec3(h.x, -h.y, h.z),
            vec3(h.x, h.y, h.z),
            vec3(-h.x, h.y, h.z),
            // top
            vec3(-h.x, h.y, -h.z),
            vec3(-h.x, h.y, h.z),
            vec3(h.x, h.y, h.z),
            vec3(h.x, h.y, -h.z),
            // bottom
            vec3(-h.x, -h.y, -h.z),
            vec3(h.x, -h.y, -h.z),
            vec3(h.x, -h.y, h.z),
            vec3(-h.x, -h.y, h.z),
            // left
            vec3(-h.x, -h.y, h.z),
            vec3(-h.x, h.y, h.z),
            vec3(-h.x, h.y, -h.z),
            vec3(-h.x, -h.y, -h.z),
            // right
            vec3(h.x, -h.y, -h.z),
            vec3(h.x, h.y, -h.z),
            vec3(h.x, h.y, h.z),
            vec3(h.x, -h.y, h.z),
        ];
        for c in corners {
            self.push_vertex(c);
        }

        for face in 0..6 {
            let f = base + face * 4;
            self.indices
                .extend_from_slice(&[f, f + 1, f + 2, f, f + 2, f + 3]);
        }
    }

    /// UV sphere with a vertex at each pole and `stacks - 1` rings of
    /// `slices + 1` vertices (the seam is duplicated).
    ///
    /// Fewer than 3 slices or 2 stacks adds nothing.
    pub fn add_sphere(&mut self, radius: f32, slices: u32, stacks: u32) {
        if slices < 3 || stacks < 2 {
            warn!("sphere needs at least 3 slices and 2 stacks, got {slices}x{stacks}; skipped");
            return;
        }

        let north = self.push_vertex(vec3(0.0, radius, 0.0));

        let phi_step = PI / stacks as f32;
        let theta_step = 2.0 * PI / slices as f32;
        for i in 1..stacks {
            let phi = i as f32 * phi_step;
            for j in 0..=slices {
                let theta = j as f32 * theta_step;
                self.push_vertex(vec3(
                    radius * phi.sin() * theta.cos(),
                    radius * phi.cos(),
                    radius * phi.sin() * theta.sin(),
                ));
            }
        }

        let south = self.push_vertex(vec3(0.0, -radius, 0.0));

        // north cap
        for i in 1..=slices {
            self.indices
                .extend_from_slice(&[north, north + i + 1, north + i]);
        }

        let first_ring = north + 1;
        let ring = slices + 1;
        for i in 0..stacks - 2 {
            for j in 0..slices {
                let a = first_ring + i * ring + j;
                let b = first_ring + (i + 1) * ring + j;
                self.indices.extend_from_slice(&[a, a + 1, b]);
                self.indices.extend_from_slice(&[b, a + 1, b + 1]);
            }
        }

        // south cap
        let last_ring = south - ring;
        for i in 0..slices {
            self.indices
                .extend_from_slice(&[south, last_ring + i, last_ring + i + 1]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_box_has_twelve_triangles() {
        let mut geom = Geometry::new();
        geom.add_box(Vec3::ONE);
        assert_eq!(geom.vertex_count(), 24);
        assert_eq!(geom.triangle_count(), 12);
        assert!(geom.indices.iter().all(|&i| (i as usize) < geom.vertex_count()));
    }

    #[test]
    fn sphere_topology() {
        let mut geom = Geometry::new();
        geom.add_sphere(1.0, 8, 4);
        // 2 poles + 3 rings of 9
        assert_eq!(geom.vertex_count(), 2 + 3 * 9);
        // 2 caps of 8 + 2 bands of 16
        assert_eq!(geom.triangle_count(), 8 * 2 + 2 * 16);
        assert!(geom.indices.iter().all(|&i| (i as usize) < geom.vertex_count()));
    }

    #[test]
    fn degenerate_sphere_adds_nothing() {
        let mut geom = Geometry::new();
        geom.add_sphere(1.0, 2, 8);
        geom.add_sphere(1.0, 8, 1);
        assert_eq!(geom.vertex_count(), 0);
        assert_eq!(geom.triangle_count(), 0);
    }

    #[test]
    fn vertex_buffer_views_geometry() {
        let mut geom = Geometry::new();
        geom.add_triangle(Vec3::ZERO, Vec3::X, Vec3::Y);
        let vb = geom.vertex_buffer();
        assert_eq!(vb.len(), 3);
        assert_eq!(vb.position(2), Some(Vec3::Y));
    }
}
