/// Deforming page surface
///
/// A flat `PAGE_W x PAGE_H` grid hinged at the spine (x = 0), subdivided
/// along its width only. Each frame the grid is bent around the spine for
/// the current turn progress: the whole sheet rotates by `p * PI`, the free
/// edge lags behind the spine to give the page its curl, and the sheet
/// lifts off the stacks mid-turn.

use std::f32::consts::PI;

use cgmath::{InnerSpace, Vector3, Zero};

use super::layout::{PAGE_H, PAGE_W};
use crate::gpu::vertex::PageVertex;

/// Extra rotation of the free edge relative to the spine, at mid-turn
const CURL: f32 = 0.3;
/// Height the sheet rises at mid-turn
const LIFT: f32 = 0.25;

/// Which side of the sheet is being drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Faces up at progress 0, shows the front page
    Front,
    /// Faces up at progress 1, shows the mirrored back page
    Back,
}

/// Position of a rest-pose point at the given progress
pub fn deform_point(rest: Vector3<f32>, progress: f32, clearance: f32) -> Vector3<f32> {
    let r = rest.x;
    let nx = r / PAGE_W;
    let bend = (progress * PI).sin();

    let angle = progress * PI + nx * bend * CURL;
    let lift = bend * LIFT;

    Vector3::new(angle.cos() * r, angle.sin() * r + lift + clearance, rest.z)
}

#[derive(Debug, Clone)]
pub struct PageSurface {
    segments: usize,
    rest: Vec<Vector3<f32>>,
    positions: Vec<Vector3<f32>>,
    normals: Vec<Vector3<f32>>,
    uvs: Vec<[f32; 2]>,
    indices: Vec<u32>,
    visible: bool,
}

impl PageSurface {
    pub fn new(segments: usize) -> Self {
        let mut surface = Self {
            segments: 0,
            rest: Vec::new(),
            positions: Vec::new(),
            normals: Vec::new(),
            uvs: Vec::new(),
            indices: Vec::new(),
            visible: false,
        };
        surface.rebuild(segments);
        surface
    }

    pub fn segments(&self) -> usize {
        self.segments
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    /// Regenerate the grid for a new segment count (quality change)
    pub fn rebuild(&mut self, segments: usize) {
        let segments = segments.max(1);
        let columns = segments + 1;

        self.rest.clear();
        self.uvs.clear();
        // Row 0 at z = -H/2 (top edge of the texture), row 1 at z = +H/2
        for row in 0..2 {
            let z = if row == 0 { -PAGE_H / 2.0 } else { PAGE_H / 2.0 };
            for col in 0..columns {
                let u = col as f32 / segments as f32;
                self.rest.push(Vector3::new(u * PAGE_W, 0.0, z));
                self.uvs.push([u, row as f32]);
            }
        }

        // Wound so the front faces +y at rest
        self.indices.clear();
        for col in 0..segments {
            let a = col as u32;
            let b = a + 1;
            let c = a + columns as u32;
            let d = c + 1;
            self.indices.extend_from_slice(&[a, c, b, b, c, d]);
        }

        self.segments = segments;
        self.positions = self.rest.clone();
        self.normals = vec![Vector3::unit_y(); self.rest.len()];
    }

    /// Bend the sheet for `progress` (0 = flat right, 1 = flat left) and
    /// make it visible
    pub fn deform(&mut self, progress: f32, clearance: f32) {
        let progress = progress.clamp(0.0, 1.0);
        for (pos, rest) in self.positions.iter_mut().zip(&self.rest) {
            *pos = deform_point(*rest, progress, clearance);
        }
        self.recompute_normals();
        self.visible = true;
    }

    /// Lay the sheet rigidly at `rotation` about the spine, hinge line at
    /// height `lift`. Used for the cover board.
    pub fn hinge(&mut self, rotation: f32, lift: f32) {
        let (sin, cos) = rotation.sin_cos();
        for (pos, rest) in self.positions.iter_mut().zip(&self.rest) {
            *pos = Vector3::new(cos * rest.x, sin * rest.x + lift, rest.z);
        }
        self.recompute_normals();
        self.visible = true;
    }

    /// Area-weighted vertex normals
    fn recompute_normals(&mut self) {
        for n in self.normals.iter_mut() {
            *n = Vector3::zero();
        }

        for tri in self.indices.chunks_exact(3) {
            let (ia, ib, ic) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
            let (a, b, c) = (self.positions[ia], self.positions[ib], self.positions[ic]);
            // Cross product length is twice the triangle area
            let face = (b - a).cross(c - a);
            self.normals[ia] += face;
            self.normals[ib] += face;
            self.normals[ic] += face;
        }

        for n in self.normals.iter_mut() {
            *n = if n.magnitude2() > f32::EPSILON {
                n.normalize()
            } else {
                Vector3::unit_y()
            };
        }
    }

    pub fn positions(&self) -> &[Vector3<f32>] {
        &self.positions
    }

    /// Interleaved vertices for one side; the back side flips normals
    pub fn vertices(&self, side: Side) -> Vec<PageVertex> {
        let sign = match side {
            Side::Front => 1.0,
            Side::Back => -1.0,
        };

        self.positions
            .iter()
            .zip(&self.normals)
            .zip(&self.uvs)
            .map(|((p, n), uv)| PageVertex {
                position: [p.x, p.y, p.z],
                normal: [n.x * sign, n.y * sign, n.z * sign],
                uv: *uv,
            })
            .collect()
    }

    /// Triangle indices for one side; the back side reverses winding
    pub fn indices(&self, side: Side) -> Vec<u32> {
        match side {
            Side::Front => self.indices.clone(),
            Side::Back => self
                .indices
                .chunks_exact(3)
                .flat_map(|t| [t[0], t[2], t[1]])
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_grid_counts() {
        let surface = PageSurface::new(10);
        assert_eq!(surface.positions().len(), 22);
        assert_eq!(surface.indices(Side::Front).len(), 60);
        assert!(!surface.is_visible());
    }

    #[test]
    fn test_rebuild_changes_density() {
        let mut surface = PageSurface::new(10);
        surface.rebuild(26);
        assert_eq!(surface.segments(), 26);
        assert_eq!(surface.positions().len(), 54);
        assert_eq!(surface.vertices(Side::Front).len(), 54);
    }

    #[test]
    fn test_flat_at_start() {
        let mut surface = PageSurface::new(18);
        surface.deform(0.0, 0.1);

        for (p, v) in surface.positions().iter().zip(surface.vertices(Side::Front)) {
            assert!(p.x >= 0.0 && p.x <= PAGE_W + 1e-6);
            assert!(close(p.y, 0.1));
            assert!(close(v.normal[1], 1.0));
        }
        assert!(surface.is_visible());
    }

    #[test]
    fn test_flat_mirrored_at_end() {
        let mut surface = PageSurface::new(18);
        surface.deform(1.0, 0.1);

        let rest = surface.clone();
        let mut flat = PageSurface::new(18);
        flat.deform(0.0, 0.1);

        let normals = rest.vertices(Side::Front);
        for ((p, q), v) in rest.positions().iter().zip(flat.positions()).zip(&normals) {
            assert!(close(p.x, -q.x));
            assert!(close(p.y, 0.1));
            assert!(close(v.normal[1], -1.0));
        }
    }

    #[test]
    fn test_hinge_is_rigid() {
        let mut cover = PageSurface::new(1);
        cover.hinge(0.0, 0.07);
        for p in cover.positions() {
            assert!(close(p.y, 0.07));
            assert!(p.x >= 0.0);
        }

        cover.hinge(PI, 0.0075);
        let back = cover.vertices(Side::Back);
        for (p, v) in cover.positions().iter().zip(&back) {
            assert!(p.x <= 1e-6);
            assert!(close(p.y, 0.0075));
            // The inside of the cover now faces up
            assert!(close(v.normal[1], 1.0));
        }

        cover.hinge(PI / 2.0, 0.0);
        let edge = cover.positions()[1];
        assert!(close(edge.x, 0.0) && close(edge.y, PAGE_W));
        assert!(cover.is_visible());
    }

    #[test]
    fn test_mid_turn_lifts_and_curls() {
        let spine = deform_point(Vector3::new(0.0, 0.0, 1.0), 0.5, 0.05);
        assert!(close(spine.x, 0.0));
        assert!(close(spine.y, 0.25 + 0.05));
        assert!(close(spine.z, 1.0));

        // Free edge has rotated past vertical
        let edge = deform_point(Vector3::new(PAGE_W, 0.0, 0.0), 0.5, 0.0);
        let angle = PI / 2.0 + 0.3;
        assert!(close(edge.x, angle.cos() * PAGE_W));
        assert!(edge.x < 0.0);
    }

    #[test]
    fn test_back_side_flips_normals_and_winding() {
        let mut surface = PageSurface::new(4);
        surface.deform(0.3, 0.0);

        let front = surface.vertices(Side::Front);
        let back = surface.vertices(Side::Back);
        for (f, b) in front.iter().zip(&back) {
            assert_eq!(f.position, b.position);
            assert_eq!(f.normal[1], -b.normal[1]);
        }

        let fi = surface.indices(Side::Front);
        let bi = surface.indices(Side::Back);
        assert_eq!((fi[1], fi[2]), (bi[2], bi[1]));
    }
}
