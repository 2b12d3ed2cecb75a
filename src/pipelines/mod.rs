//! Render pipelines.
//!
//! - `reveal` draws item planes with the progress-driven transition

pub mod reveal;
