//! scroll-reveal
//!
//! Renders a set of images as textured planes laid over a scrolling page. The
//! planes sit exactly where their layout containers are, the camera follows
//! the page scroll, and each image is revealed by a shader transition when its
//! section scrolls into view. Runs natively and in the browser via WASM.
//!
//! High-level modules
//! - `animation`: per-item reveal tweens driven by section events
//! - `camera`: perspective camera whose frustum matches the viewport in pixels
//! - `config`: tunables with the defaults used by [`flow::run`]
//! - `context`: central GPU and window context that owns device/queue/pipeline
//! - `data_structures`: items, GPU meshes and textures
//! - `flow`: the winit event loop wiring everything together
//! - `layout`: container rectangles and their mapping to world space
//! - `pipelines`: the reveal render pipeline and its shader
//! - `render`: frame loop, camera smoothing and the draw call
//! - `resources`: texture loading and plane geometry
//! - `scene`: the coordinator owning all mutable state
//! - `scroll`: scroll offset to section transitions
//! - `viewport`: logical and device pixel sizes
//!

pub mod animation;
pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod flow;
pub mod layout;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod scene;
pub mod scroll;
pub mod viewport;

// Re-exports commonly used types for convenience in downstream code.
pub use config::Config;
pub use flow::{Teardown, run, run_with};
pub use scene::Scene;
pub use winit::dpi::PhysicalSize;
