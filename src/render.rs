//! Frame loop and scene drawing.
//!
//! [`RenderLoop`] owns frame timing and camera smoothing and knows nothing
//! about the GPU. It is started once, after the scene is populated, and keeps
//! producing frames until its [`StopHandle`] is triggered. [`draw_scene`]
//! records and presents one frame for the items currently on the GPU.

use std::{
    iter,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use instant::{Duration, Instant};

use crate::{camera::CameraState, context::Context, data_structures::mesh::ItemMesh};

pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// How far the camera closes the gap to its scroll target on each frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Smoothing {
    /// Fixed fraction per frame. Converges faster on faster displays.
    PerFrame(f32),
    /// The same fraction, but defined per 1/60 s and scaled by the real
    /// frame delta, so every display rate converges equally fast.
    TimeBased { per_frame_at_60hz: f32 },
}

impl Smoothing {
    const REFERENCE_FRAME: f32 = 1.0 / 60.0;

    pub fn factor(&self, delta: Duration) -> f32 {
        match *self {
            Smoothing::PerFrame(t) => t.clamp(0.0, 1.0),
            Smoothing::TimeBased { per_frame_at_60hz } => {
                let keep = 1.0 - per_frame_at_60hz.clamp(0.0, 1.0);
                1.0 - keep.powf(delta.as_secs_f32() / Self::REFERENCE_FRAME)
            }
        }
    }
}

impl Default for Smoothing {
    fn default() -> Self {
        Smoothing::PerFrame(0.1)
    }
}

/// Cloneable handle that ends the render loop.
#[derive(Clone, Debug, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Monotonic time since the page came up.
#[derive(Clone, Copy, Debug)]
pub struct Clock {
    start: Instant,
}

impl Clock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameTiming {
    pub elapsed: Duration,
    pub delta: Duration,
}

#[derive(Debug)]
pub struct RenderLoop {
    smoothing: Smoothing,
    started: bool,
    last: Duration,
    frames: u64,
    stop: StopHandle,
}

impl RenderLoop {
    pub fn new(smoothing: Smoothing) -> Self {
        Self {
            smoothing,
            started: false,
            last: Duration::ZERO,
            frames: 0,
            stop: StopHandle::default(),
        }
    }

    /// Share an externally owned stop flag.
    pub fn with_stop_handle(mut self, stop: StopHandle) -> Self {
        self.stop = stop;
        self
    }

    /// Start producing frames. Only the first call has an effect.
    pub fn start(&mut self, now: Duration) -> bool {
        if self.started {
            log::warn!("Render loop is already running");
            return false;
        }
        self.started = true;
        self.last = now;
        log::info!("Render loop started");
        true
    }

    pub fn is_running(&self) -> bool {
        self.started && !self.stop.is_stopped()
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Advance one frame: move the camera toward `-scroll_offset`. Returns
    /// `None` when the loop is not running, which means no frame should be
    /// drawn or scheduled.
    pub fn tick(&mut self, now: Duration, scroll_offset: f32, camera: &mut CameraState) -> Option<FrameTiming> {
        if !self.is_running() {
            return None;
        }
        let delta = now.saturating_sub(self.last);
        self.last = now;
        self.frames += 1;
        camera.y = lerp(camera.y, -scroll_offset, self.smoothing.factor(delta));
        Some(FrameTiming { elapsed: now, delta })
    }
}

/// Shared state a reveal pass binds before drawing items.
pub struct PassResources<'a> {
    pub pipeline: &'a wgpu::RenderPipeline,
    pub camera: &'a wgpu::BindGroup,
    pub clear_colour: wgpu::Color,
}

/// Record one pass over `meshes` into `target`.
pub fn record_pass(
    encoder: &mut wgpu::CommandEncoder,
    target: &wgpu::TextureView,
    depth: &wgpu::TextureView,
    resources: &PassResources<'_>,
    meshes: &[ItemMesh],
) {
    let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("Render Pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: target,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(resources.clear_colour),
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
            view: depth,
            depth_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(1.0),
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        }),
        occlusion_query_set: None,
        timestamp_writes: None,
    });

    render_pass.set_pipeline(resources.pipeline);
    render_pass.set_bind_group(0, resources.camera, &[]);
    for mesh in meshes {
        render_pass.set_bind_group(1, &mesh.bind_group, &[]);
        render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        render_pass.draw_indexed(0..mesh.num_indices, 0, 0..1);
    }
}

/// Draw all item meshes to the window surface and present.
pub fn draw_scene(ctx: &Context, meshes: &[ItemMesh]) -> Result<(), wgpu::SurfaceError> {
    let output = ctx.surface.get_current_texture()?;
    let view = output
        .texture
        .create_view(&wgpu::TextureViewDescriptor::default());

    let mut encoder = ctx
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });
    let resources = PassResources {
        pipeline: &ctx.pipeline,
        camera: &ctx.camera.bind_group,
        clear_colour: ctx.clear_colour,
    };
    record_pass(&mut encoder, &view, &ctx.depth_texture.view, &resources, meshes);

    ctx.queue.submit(iter::once(encoder.finish()));
    output.present();
    Ok(())
}
