//! Runtime configuration.
//!
//! A [`Config`] is handed to [`crate::flow::run`] once and is read-only from
//! then on. Every constant the reveal pipeline depends on lives here so that
//! callers can tune it without touching the coordinator.

use instant::Duration;

use crate::{animation::Easing, render::Smoothing};

/// All tunables of a reveal page.
#[derive(Clone, Debug)]
pub struct Config {
    /// Ordered image locations. Item `i` is built from `sources[i]`.
    pub sources: Vec<String>,
    /// CSS selector of the layout containers, one per image.
    pub container_selector: String,
    /// Element id of the render-target canvas (web only).
    pub canvas_id: String,
    /// Fixed distance of the camera from the `z = 0` plane.
    pub camera_distance: f32,
    pub near: f32,
    pub far: f32,
    /// Duration of a full 0 → 1 reveal.
    pub reveal_duration: Duration,
    pub easing: Easing,
    /// How the camera follows the scroll target.
    pub smoothing: Smoothing,
    /// Upper bound for the device pixel ratio used for the render surface.
    pub max_pixel_ratio: f32,
    /// Attempts per source before the loader substitutes a placeholder.
    pub max_load_attempts: u32,
    /// Time after which a pending load attempt counts as failed.
    pub load_timeout: Option<Duration>,
    /// Wait before the first retry; doubles for every further retry.
    pub retry_delay: Duration,
    /// Subdivisions per axis of every item plane.
    pub plane_segments: u32,
    /// Scroll distance of one section. `None` follows the viewport height.
    pub section_height: Option<f32>,
    pub clear_colour: wgpu::Color,
}

impl Config {
    pub fn with_sources<I, S>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sources = sources.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_container_selector(mut self, selector: impl Into<String>) -> Self {
        self.container_selector = selector.into();
        self
    }

    pub fn with_section_height(mut self, height: f32) -> Self {
        self.section_height = Some(height);
        self
    }

    /// Section height for a viewport of the given height.
    pub fn section_height_for(&self, viewport_height: f32) -> f32 {
        self.section_height.unwrap_or(viewport_height)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sources: ["01.webp", "02.webp", "03.webp", "04.webp", "new.jpg"]
                .into_iter()
                .map(String::from)
                .collect(),
            container_selector: ".img".to_string(),
            canvas_id: "canvas".to_string(),
            camera_distance: 5.0,
            near: 0.1,
            far: 100.0,
            reveal_duration: Duration::from_millis(3500),
            easing: Easing::QuadOut,
            smoothing: Smoothing::PerFrame(0.1),
            max_pixel_ratio: 2.0,
            max_load_attempts: 3,
            load_timeout: Some(Duration::from_secs(10)),
            retry_delay: Duration::from_millis(250),
            plane_segments: 128,
            section_height: None,
            clear_colour: wgpu::Color::TRANSPARENT,
        }
    }
}
