//! Scene data: items, their GPU meshes and textures.
//!
//! - `item` holds the CPU-side item (geometry, uniforms, position) and the factory
//! - `mesh` holds the vertex type and the per-item GPU buffers
//! - `texture` contains the GPU texture wrapper and creation utilities

pub mod item;
pub mod mesh;
pub mod texture;
