use crate::data_structures::mesh::PlaneVertex;

/**
 * A flat, subdivided rectangle in the `z = 0` plane, centred on the origin.
 *
 * Only the description is stored; vertices and indices are generated when the
 * plane is uploaded since a 128×128 plane holds 16641 vertices.
 */
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaneGeometry {
    width: f32,
    height: f32,
    segments: u32,
}

impl PlaneGeometry {
    pub fn new(width: f32, height: f32, segments: u32) -> Self {
        Self {
            width,
            height,
            segments: segments.max(1),
        }
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn segments(&self) -> u32 {
        self.segments
    }

    pub fn vertex_count(&self) -> usize {
        let row = self.segments as usize + 1;
        row * row
    }

    pub fn index_count(&self) -> usize {
        self.segments as usize * self.segments as usize * 6
    }

    /// Rows run from the top edge down, so `uv = (0, 0)` is the top-left
    /// corner like wgpu texture coordinates.
    pub fn vertices(&self) -> Vec<PlaneVertex> {
        let n = self.segments;
        let step_x = self.width / n as f32;
        let step_y = self.height / n as f32;
        let mut vertices = Vec::with_capacity(self.vertex_count());
        for iy in 0..=n {
            let y = self.height / 2.0 - iy as f32 * step_y;
            for ix in 0..=n {
                let x = -self.width / 2.0 + ix as f32 * step_x;
                vertices.push(PlaneVertex {
                    position: [x, y, 0.0],
                    tex_coords: [ix as f32 / n as f32, iy as f32 / n as f32],
                });
            }
        }
        vertices
    }

    /// Two counter-clockwise triangles per cell, facing `+z`.
    pub fn indices(&self) -> Vec<u32> {
        let n = self.segments;
        let row = n + 1;
        let mut indices = Vec::with_capacity(self.index_count());
        for iy in 0..n {
            for ix in 0..n {
                let a = ix + row * iy;
                let b = ix + row * (iy + 1);
                let c = (ix + 1) + row * (iy + 1);
                let d = (ix + 1) + row * iy;
                indices.extend_from_slice(&[a, b, d, b, c, d]);
            }
        }
        indices
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_follow_segments() {
        let plane = PlaneGeometry::new(2.0, 2.0, 128);
        assert_eq!(plane.vertices().len(), 129 * 129);
        assert_eq!(plane.indices().len(), 128 * 128 * 6);
        let max = plane.indices().into_iter().max().unwrap_or_default();
        assert_eq!(max as usize, plane.vertex_count() - 1);
    }

    #[test]
    fn corners_span_the_requested_size() {
        let plane = PlaneGeometry::new(300.0, 200.0, 4);
        let vertices = plane.vertices();
        let first = vertices.first().unwrap();
        let last = vertices.last().unwrap();
        assert_eq!(first.position, [-150.0, 100.0, 0.0]);
        assert_eq!(first.tex_coords, [0.0, 0.0]);
        assert_eq!(last.position, [150.0, -100.0, 0.0]);
        assert_eq!(last.tex_coords, [1.0, 1.0]);
    }

    #[test]
    fn triangles_face_the_camera() {
        let plane = PlaneGeometry::new(1.0, 1.0, 1);
        let vertices = plane.vertices();
        for tri in plane.indices().chunks(3) {
            let p = |i: u32| vertices[i as usize].position;
            let (a, b, c) = (p(tri[0]), p(tri[1]), p(tri[2]));
            let z = (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0]);
            assert!(z > 0.0);
        }
    }
}
