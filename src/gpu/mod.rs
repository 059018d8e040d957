/// GPU rendering of the book
///
/// Static pages, the cover and the turning sheet are drawn as textured
/// meshes into an offscreen target, then shown as an image.
///
/// Architecture:
/// - `vertex.rs` - `Pod` vertex struct and byte views
/// - `scene.rs` - which meshes to draw this frame, and the camera
/// - `shaders.rs` - WGSL shader source code
/// - `pipeline.rs` - wgpu device, uploads and the render pass

pub mod pipeline;
pub mod scene;
pub mod shaders;
pub mod vertex;

pub use pipeline::MeshRenderer;
