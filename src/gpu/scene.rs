/// CPU side of the mesh renderer
///
/// Turns a `RenderState` plus the deformed sheet into a list of textured
/// draws, and builds the top-down camera. The spread `[-PAGE_W, PAGE_W]`
/// fills the target horizontally, the page height fills it vertically;
/// height above the table only decides depth.

use std::sync::Arc;

use cgmath::Matrix4;

use super::vertex::PageVertex;
use crate::book::controller::RenderState;
use crate::book::layout::{PAGE_H, PAGE_W};
use crate::book::surface::{PageSurface, Side};
use crate::page::cache::PageTexture;

/// World heights in `[-DEPTH_RANGE / 2, DEPTH_RANGE / 2]` map onto depth [1, 0]
const DEPTH_RANGE: f32 = 8.0;
/// Share of light every face gets regardless of its normal
const AMBIENT: f32 = 0.6;

/// One textured mesh
#[derive(Debug, Clone)]
pub struct DrawCall {
    pub vertices: Vec<PageVertex>,
    pub indices: Vec<u32>,
    pub texture: Arc<PageTexture>,
}

/// Must match `Camera` in the shader
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub light: [f32; 4],
}

impl CameraUniform {
    pub fn top_down() -> Self {
        Self {
            view_proj: view_projection().into(),
            light: [0.3, 1.0, -0.4, AMBIENT],
        }
    }
}

/// Orthographic projection looking straight down at the open book
///
/// x -> clip x, z -> clip -y (the top edge of a page is at z = -PAGE_H / 2),
/// higher y -> smaller depth.
#[rustfmt::skip]
pub fn view_projection() -> Matrix4<f32> {
    // Column-major: one column per input axis
    Matrix4::new(
        1.0 / PAGE_W, 0.0, 0.0, 0.0,
        0.0, 0.0, -1.0 / DEPTH_RANGE, 0.0,
        0.0, -2.0 / PAGE_H, 0.0, 0.0,
        0.0, 0.0, 0.5, 1.0,
    )
}

/// A page lying flat at `elevation`, its left edge at `x0`
fn flat_page(x0: f32, elevation: f32) -> (Vec<PageVertex>, Vec<u32>) {
    let normal = [0.0, 1.0, 0.0];
    let vertices = [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0)]
        .into_iter()
        .map(|(u, v)| PageVertex {
            position: [x0 + u * PAGE_W, elevation, (v - 0.5) * PAGE_H],
            normal,
            uv: [u, v],
        })
        .collect();
    (vertices, vec![0, 2, 1, 1, 2, 3])
}

fn surface_side(surface: &PageSurface, side: Side, texture: &Arc<PageTexture>) -> DrawCall {
    DrawCall {
        vertices: surface.vertices(side),
        indices: surface.indices(side),
        texture: texture.clone(),
    }
}

/// Everything visible this frame
///
/// The cover is drawn as a rigid sheet: its outside on the front face and
/// the mirrored contents page on the back, so the contents read correctly
/// once the cover lies open. The turning sheet uses the mirrored back page
/// the same way.
pub fn build(frame: &RenderState, sheet: &PageSurface) -> Vec<DrawCall> {
    let mut draws = Vec::new();

    if let Some(page) = &frame.left {
        let (vertices, indices) = flat_page(-PAGE_W, page.elevation);
        draws.push(DrawCall {
            vertices,
            indices,
            texture: page.texture.clone(),
        });
    }
    if let Some(page) = &frame.right {
        let (vertices, indices) = flat_page(0.0, page.elevation);
        draws.push(DrawCall {
            vertices,
            indices,
            texture: page.texture.clone(),
        });
    }

    let mut cover = PageSurface::new(1);
    cover.hinge(frame.cover.rotation, frame.cover.lift);
    draws.push(surface_side(&cover, Side::Front, &frame.cover_texture));
    draws.push(surface_side(&cover, Side::Back, &frame.inside_cover));

    if let (true, Some(state)) = (sheet.is_visible(), &frame.sheet) {
        if let Some(front) = &state.front {
            draws.push(surface_side(sheet, Side::Front, front));
        }
        if let Some(back) = &state.back {
            draws.push(surface_side(sheet, Side::Back, back));
        }
    }

    draws
}
