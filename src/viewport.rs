//! Window size bookkeeping shared by the surface and the scene.
//!
//! Layout and placement work in logical (CSS) pixels. The render surface is
//! sized in device pixels, using the device pixel ratio capped at
//! `max_pixel_ratio` so high density screens do not multiply fragment work.

use winit::dpi::PhysicalSize;

use crate::layout::ViewportSize;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    /// Logical width in CSS pixels.
    pub width: f32,
    /// Logical height in CSS pixels.
    pub height: f32,
    /// Device pixel ratio used for the surface, after clamping.
    pub pixel_ratio: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32, device_pixel_ratio: f32, max_pixel_ratio: f32) -> Self {
        let ratio = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
            device_pixel_ratio
        } else {
            1.0
        };
        Self {
            width,
            height,
            pixel_ratio: ratio.min(max_pixel_ratio),
        }
    }

    /// Build from a window's physical size and its scale factor.
    pub fn from_physical(size: PhysicalSize<u32>, scale_factor: f64, max_pixel_ratio: f32) -> Self {
        let scale = if scale_factor > 0.0 { scale_factor } else { 1.0 };
        let logical = size.to_logical::<f32>(scale);
        Self::new(logical.width, logical.height, scale as f32, max_pixel_ratio)
    }

    pub fn size(&self) -> ViewportSize {
        ViewportSize::new(self.width, self.height)
    }

    /// Render surface size in device pixels. Never zero.
    pub fn surface_size(&self) -> (u32, u32) {
        let w = (self.width * self.pixel_ratio).round().max(1.0) as u32;
        let h = (self.height * self.pixel_ratio).round().max(1.0) as u32;
        (w, h)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}
