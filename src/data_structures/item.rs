//! Revealable items: one textured plane per image.

use cgmath::Vector3;

use crate::{
    layout::Placement,
    resources::{loader::TextureAsset, mesh::PlaneGeometry},
};

/// Shader inputs of one item. `progress` is the only value that changes
/// while the page is alive; the rest is fixed at creation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ItemUniforms {
    pub progress: f32,
    pub size: [f32; 2],
    pub texture_size: [f32; 2],
    pub plane_resolution: [f32; 2],
}

#[derive(Debug)]
pub struct Item {
    pub geometry: PlaneGeometry,
    pub uniforms: ItemUniforms,
    pub position: Vector3<f32>,
    pub placement: Placement,
    pub texture: Option<TextureAsset>,
}

impl Item {
    /// Attach the decoded image and report its size to the shader. Zero-sized
    /// images report `1×1` to keep the aspect maths finite.
    pub fn assign_texture(&mut self, texture: TextureAsset) {
        self.uniforms.texture_size = [texture.width.max(1) as f32, texture.height.max(1) as f32];
        self.texture = Some(texture);
    }

    /// Release the pixel data once it lives on the GPU.
    pub fn take_texture(&mut self) -> Option<TextureAsset> {
        self.texture.take()
    }

    pub fn to_raw(&self) -> ItemUniformRaw {
        let model = cgmath::Matrix4::from_translation(self.position);
        ItemUniformRaw {
            model: model.into(),
            size: self.uniforms.size,
            texture_size: self.uniforms.texture_size,
            plane_resolution: self.uniforms.plane_resolution,
            progress: self.uniforms.progress,
            _padding: 0.0,
        }
    }
}

/// Builds items with a subdivided plane so the vertex shader has enough
/// vertices to displace during the transition.
#[derive(Clone, Copy, Debug)]
pub struct ItemMeshFactory {
    segments: u32,
}

impl ItemMeshFactory {
    pub const DEFAULT_SEGMENTS: u32 = 128;

    pub fn new(segments: u32) -> Self {
        Self {
            segments: segments.max(1),
        }
    }

    pub fn build(&self, width: f32, height: f32) -> Item {
        Item {
            geometry: PlaneGeometry::new(width, height, self.segments),
            uniforms: ItemUniforms {
                progress: 0.0,
                size: [width, height],
                texture_size: [1.0, 1.0],
                plane_resolution: [width, height],
            },
            position: Vector3::new(0.0, 0.0, 0.0),
            placement: Placement::Fallback,
            texture: None,
        }
    }
}

impl Default for ItemMeshFactory {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SEGMENTS)
    }
}

/**
 * The uniform block as the reveal shader sees it. Field order matches the
 * WGSL struct; the trailing pad rounds the block to 16 bytes.
 */
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ItemUniformRaw {
    model: [[f32; 4]; 4],
    size: [f32; 2],
    texture_size: [f32; 2],
    plane_resolution: [f32; 2],
    progress: f32,
    _padding: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_starts_hidden_with_matching_sizes() {
        let item = ItemMeshFactory::default().build(320.0, 240.0);
        assert_eq!(item.uniforms.progress, 0.0);
        assert_eq!(item.uniforms.size, [320.0, 240.0]);
        assert_eq!(item.uniforms.plane_resolution, [320.0, 240.0]);
        assert_eq!(item.geometry.segments(), 128);
        assert!(item.texture.is_none());
    }

    #[test]
    fn zero_sized_textures_report_one_pixel() {
        let mut item = ItemMeshFactory::new(1).build(10.0, 10.0);
        item.assign_texture(TextureAsset::placeholder("broken.png", 0, 0));
        assert_eq!(item.uniforms.texture_size, [1.0, 1.0]);
    }

    #[test]
    fn raw_uniform_is_sixteen_byte_aligned() {
        assert_eq!(std::mem::size_of::<ItemUniformRaw>() % 16, 0);
    }
}
