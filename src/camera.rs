//! Scroll-following perspective camera.
//!
//! The camera sits at a fixed distance in front of the `z = 0` plane and looks
//! straight down `-z`. Its vertical field of view is derived from the viewport
//! height so that one world unit at `z = 0` equals one CSS pixel.

use cgmath::{Deg, Matrix4, Point3, Rad, Vector3};
use wgpu::util::DeviceExt;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Vertical field of view (degrees) that makes the visible extent at `z = 0`
/// exactly `height` units tall when viewed from `distance`.
pub fn fov_for_height(height: f32, distance: f32) -> Deg<f32> {
    Rad(2.0 * ((height / 2.0) / distance).atan()).into()
}

#[derive(Clone, Debug, PartialEq)]
pub struct CameraState {
    pub distance: f32,
    pub fovy: Deg<f32>,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    /// Smoothed vertical position, chases `-scrollOffset`.
    pub y: f32,
}

impl CameraState {
    pub fn new(distance: f32, width: f32, height: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            distance,
            fovy: Deg(0.0),
            aspect: 1.0,
            near,
            far,
            y: 0.0,
        };
        camera.resize(width, height);
        camera
    }

    /// Recompute the projection for a new viewport. The fov only depends on
    /// the height; the width only feeds the aspect ratio.
    pub fn resize(&mut self, width: f32, height: f32) {
        let height = height.max(1.0);
        self.fovy = fov_for_height(height, self.distance);
        self.aspect = width.max(1.0) / height;
    }

    pub fn position(&self) -> Point3<f32> {
        Point3::new(0.0, self.y, self.distance)
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_to_rh(self.position(), -Vector3::unit_z(), Vector3::unit_y())
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * cgmath::perspective(self.fovy, self.aspect, self.near, self.far)
    }

    pub fn view_proj(&self) -> Matrix4<f32> {
        self.projection_matrix() * self.view_matrix()
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        use cgmath::SquareMatrix;
        Self {
            view_proj: Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &CameraState) {
        self.view_proj = camera.view_proj().into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// GPU side of the camera: uniform buffer and its bind group.
#[derive(Debug)]
pub struct CameraResources {
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl CameraResources {
    pub fn new(device: &wgpu::Device, camera: &CameraState) -> Self {
        let mut uniform = CameraUniform::new();
        uniform.update_view_proj(camera);

        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
            label: Some("camera_bind_group_layout"),
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        Self {
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    pub fn write(&mut self, queue: &wgpu::Queue, camera: &CameraState) {
        self.uniform.update_view_proj(camera);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}
