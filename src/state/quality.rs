/// Render quality presets
///
/// A tier controls both the raster resolution of page textures and the
/// number of width segments in the turning page mesh.

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    Low,
    #[default]
    Med,
    High,
}

impl Quality {
    pub const ALL: [Quality; 3] = [Quality::Low, Quality::Med, Quality::High];

    /// Page texture size in pixels (width, height)
    pub fn resolution(&self) -> (u32, u32) {
        match self {
            Quality::Low => (512, 720),
            Quality::Med => (1024, 1440),
            Quality::High => (1536, 2160),
        }
    }

    /// Width subdivisions of the turning page
    pub fn segments(&self) -> usize {
        match self {
            Quality::Low => 10,
            Quality::Med => 18,
            Quality::High => 26,
        }
    }

    /// Paper grain is skipped at the lowest tier
    pub fn has_grain(&self) -> bool {
        *self != Quality::Low
    }

    pub fn label(&self) -> &'static str {
        match self {
            Quality::Low => "LOW",
            Quality::Med => "MED",
            Quality::High => "HIGH",
        }
    }
}
