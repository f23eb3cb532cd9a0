use std::f32::consts::PI;

/// Floats per vertex: position (3), normal (3), uv (2).
pub const VERTEX_FLOATS: usize = 8;
pub const VERTEX_STRIDE: i32 = (VERTEX_FLOATS * 4) as i32;
pub const NORMAL_OFFSET: i32 = 12;
pub const UV_OFFSET: i32 = 24;

#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<f32>,
    pub indices: Vec<u16>,
}

impl Mesh {
    /// UV sphere. Rows run from the north pole (+Y) to the south pole; the
    /// degenerate triangles touching the poles are skipped.
    pub fn sphere(radius: f32, width_segments: u16, height_segments: u16) -> Self {
        let width_segments = width_segments.max(3);
        let height_segments = height_segments.max(2);

        let mut vertices = Vec::new();
        let mut indices = Vec::new();
        let mut grid = Vec::with_capacity(height_segments as usize + 1);
        let mut index: u16 = 0;

        for iy in 0..=height_segments {
            let v = iy as f32 / height_segments as f32;
            let mut row = Vec::with_capacity(width_segments as usize + 1);

            for ix in 0..=width_segments {
                let u = ix as f32 / width_segments as f32;

                let x = -radius * (u * 2.0 * PI).cos() * (v * PI).sin();
                let y = radius * (v * PI).cos();
                let z = radius * (u * 2.0 * PI).sin() * (v * PI).sin();
                let len = (x * x + y * y + z * z).sqrt().max(f32::EPSILON);

                vertices.extend_from_slice(&[
                    x, y, z,
                    x / len, y / len, z / len,
                    u, 1.0 - v,
                ]);
                row.push(index);
                index += 1;
            }
            grid.push(row);
        }

        for iy in 0..height_segments as usize {
            for ix in 0..width_segments as usize {
                let a = grid[iy][ix + 1];
                let b = grid[iy][ix];
                let c = grid[iy + 1][ix];
                let d = grid[iy + 1][ix + 1];

                if iy != 0 {
                    indices.extend_from_slice(&[a, b, d]);
                }
                if iy != height_segments as usize - 1 {
                    indices.extend_from_slice(&[b, c, d]);
                }
            }
        }

        Mesh { vertices, indices }
    }

    /// Flat annulus in the XY plane facing +Z, with planar UVs spanning the
    /// outer radius.
    pub fn ring(inner_radius: f32, outer_radius: f32, theta_segments: u16) -> Self {
        let theta_segments = theta_segments.max(3);
        let mut vertices = Vec::new();
        let mut indices = Vec::new();

        for radius in [inner_radius, outer_radius] {
            for i in 0..=theta_segments {
                let angle = i as f32 / theta_segments as f32 * 2.0 * PI;
                let x = radius * angle.cos();
                let y = radius * angle.sin();
                vertices.extend_from_slice(&[
                    x, y, 0.0,
                    0.0, 0.0, 1.0,
                    (x / outer_radius + 1.0) / 2.0, (y / outer_radius + 1.0) / 2.0,
                ]);
            }
        }

        let row = theta_segments + 1;
        for i in 0..theta_segments {
            let a = i;
            let b = i + row;
            let c = i + row + 1;
            let d = i + 1;
            indices.extend_from_slice(&[a, b, d, b, c, d]);
        }

        Mesh { vertices, indices }
    }

    /// Unit quad centred on the origin, facing +Z.
    pub fn quad() -> Self {
        Mesh {
            vertices: vec![
                -0.5, -0.5, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0,
                0.5, -0.5, 0.0, 0.0, 0.0, 1.0, 1.0, 0.0,
                0.5, 0.5, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0,
                -0.5, 0.5, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0,
            ],
            indices: vec![0, 1, 2, 0, 2, 3],
        }
    }

    pub fn cube(size: f32) -> Self {
        let s = size / 2.0;
        let mut vertices = Vec::new();
        let mut indices = Vec::new();

        let mut add_face = |corners: [[f32; 3]; 4], normal: [f32; 3]| {
            let base = (vertices.len() / VERTEX_FLOATS) as u16;
            let uvs = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
            for (corner, uv) in corners.iter().zip(uvs.iter()) {
                vertices.extend_from_slice(corner);
                vertices.extend_from_slice(&normal);
                vertices.extend_from_slice(uv);
            }
            indices.extend_from_slice(&[
                base, base + 1, base + 2,
                base, base + 2, base + 3,
            ]);
        };

        add_face([[-s, -s, s], [s, -s, s], [s, s, s], [-s, s, s]], [0.0, 0.0, 1.0]);
        add_face([[s, -s, -s], [-s, -s, -s], [-s, s, -s], [s, s, -s]], [0.0, 0.0, -1.0]);
        add_face([[-s, s, s], [s, s, s], [s, s, -s], [-s, s, -s]], [0.0, 1.0, 0.0]);
        add_face([[-s, -s, -s], [s, -s, -s], [s, -s, s], [-s, -s, s]], [0.0, -1.0, 0.0]);
        add_face([[s, -s, s], [s, -s, -s], [s, s, -s], [s, s, s]], [1.0, 0.0, 0.0]);
        add_face([[-s, -s, -s], [-s, -s, s], [-s, s, s], [-s, s, -s]], [-1.0, 0.0, 0.0]);

        Mesh { vertices, indices }
    }

    /// Line-list indices drawing the three edges of every triangle.
    pub fn wireframe_indices(&self) -> Vec<u16> {
        let mut lines = Vec::with_capacity(self.indices.len() * 2);
        for tri in self.indices.chunks_exact(3) {
            lines.extend_from_slice(&[tri[0], tri[1], tri[1], tri[2], tri[2], tri[0]]);
        }
        lines
    }
}

#[cfg(test)]
impl Mesh {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / VERTEX_FLOATS
    }

    pub fn position(&self, index: usize) -> [f32; 3] {
        let base = index * VERTEX_FLOATS;
        [self.vertices[base], self.vertices[base + 1], self.vertices[base + 2]]
    }

    pub fn uv(&self, index: usize) -> [f32; 2] {
        let base = index * VERTEX_FLOATS + 6;
        [self.vertices[base], self.vertices[base + 1]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn radius_of(mesh: &Mesh, index: usize) -> f32 {
        let [x, y, z] = mesh.position(index);
        (x * x + y * y + z * z).sqrt()
    }

    #[test]
    fn test_sphere_counts() {
        let mesh = Mesh::sphere(16.0, 30, 30);
        assert_eq!(mesh.vertex_count(), 31 * 31);
        // Two triangles per quad, minus one per quad on each pole row.
        assert_eq!(mesh.indices.len(), (30 * 30 * 2 - 30 * 2) * 3);
    }

    #[test]
    fn test_sphere_vertices_on_surface() {
        let mesh = Mesh::sphere(3.2, 30, 30);
        for i in 0..mesh.vertex_count() {
            assert!((radius_of(&mesh, i) - 3.2).abs() < 1e-4);
        }
        assert!((mesh.position(0)[1] - 3.2).abs() < 1e-5);
        assert_eq!(mesh.uv(0), [0.0, 1.0]);
    }

    #[test]
    fn test_ring_radii_and_uvs() {
        let mesh = Mesh::ring(10.0, 20.0, 32);
        assert_eq!(mesh.vertex_count(), 2 * 33);
        assert_eq!(mesh.indices.len(), 32 * 6);
        for i in 0..33 {
            assert!((radius_of(&mesh, i) - 10.0).abs() < 1e-4);
            assert!((radius_of(&mesh, i + 33) - 20.0).abs() < 1e-4);
        }
        // First outer vertex sits at (outer, 0), the right edge of the texture.
        let uv = mesh.uv(33);
        assert!((uv[0] - 1.0).abs() < 1e-6 && (uv[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_indices_in_range() {
        let meshes = [
            Mesh::sphere(1.0, 8, 6),
            Mesh::ring(1.0, 1.01, 64),
            Mesh::quad(),
            Mesh::cube(2.0),
        ];
        for mesh in meshes {
            let count = mesh.vertex_count() as u16;
            assert!(mesh.indices.iter().all(|&i| i < count));
        }
    }

    #[test]
    fn test_wireframe_has_three_edges_per_triangle() {
        let quad = Mesh::quad();
        let lines = quad.wireframe_indices();
        assert_eq!(lines.len(), 12);
        assert_eq!(&lines[..6], &[0, 1, 1, 2, 2, 0]);
    }
}
