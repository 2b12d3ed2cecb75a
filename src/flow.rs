//! Application event loop.
//!
//! This module wires the [`Scene`] coordinator to winit and the GPU. All
//! callbacks (texture batch completion, scroll, resize, frame) arrive on the
//! event loop thread and are handled one at a time.
//!
//! # Lifecycle
//!
//! 1. `resumed` creates the window and the GPU [`Context`], then starts the
//!    texture batch
//! 2. [`AppEvent::Loaded`] populates the scene, uploads the item meshes,
//!    attaches the scroll listener and starts the render loop
//! 3. every `RedrawRequested` advances the scene, writes uniforms, draws and
//!    requests the next frame while the loop is running
//! 4. `Resized` resizes the surface and repositions the items
//! 5. [`Teardown::request`] (or closing the window) stops the loop, detaches
//!    listeners and exits

use std::{fmt::Debug, sync::Arc};

use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    window::Window,
};

use crate::{
    camera::CameraState,
    config::Config,
    context::Context,
    data_structures::{mesh::ItemMesh, texture::Texture},
    layout::LayoutSource,
    render::{Clock, StopHandle, draw_scene},
    resources::loader::{FetchDecoder, TextureAsset, TextureBatch, TextureBatchLoader},
    scene::Scene,
    viewport::Viewport,
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::{JsCast, prelude::*};
#[cfg(not(target_arch = "wasm32"))]
use winit::event::MouseScrollDelta;

/// Pixels scrolled per wheel line on targets without a page scroll bar.
#[cfg(not(target_arch = "wasm32"))]
const LINE_HEIGHT: f32 = 100.0;

pub enum AppEvent {
    #[allow(dead_code)]
    Initialized(Box<Context>),
    Loaded(TextureBatch),
    Scroll(f32),
    Teardown,
}

impl Debug for AppEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initialized(_) => f.write_str("Initialized"),
            Self::Loaded(batch) => f.debug_tuple("Loaded").field(&batch.len()).finish(),
            Self::Scroll(offset) => f.debug_tuple("Scroll").field(offset).finish(),
            Self::Teardown => f.write_str("Teardown"),
        }
    }
}

/// Handle for tearing the page down from outside the event loop.
#[derive(Clone, Debug)]
pub struct Teardown {
    proxy: EventLoopProxy<AppEvent>,
    stop: StopHandle,
}

impl Teardown {
    /// Stop the render loop right away; listeners are detached and the event
    /// loop exits once it processes the request.
    pub fn request(&self) {
        self.stop.stop();
        if let Err(e) = self.proxy.send_event(AppEvent::Teardown) {
            log::warn!("Event loop already closed: {}", e);
        }
    }
}

/// The web page's scroll listener; removed again on teardown.
#[cfg(target_arch = "wasm32")]
struct ScrollListener {
    closure: Closure<dyn FnMut()>,
}

#[cfg(target_arch = "wasm32")]
impl ScrollListener {
    fn attach(proxy: EventLoopProxy<AppEvent>) -> anyhow::Result<Self> {
        let window = web_sys::window().ok_or_else(|| anyhow::anyhow!("no window to listen on"))?;
        let closure = Closure::<dyn FnMut()>::new(move || {
            let offset = web_sys::window()
                .and_then(|w| w.scroll_y().ok())
                .unwrap_or(0.0);
            if proxy.send_event(AppEvent::Scroll(offset as f32)).is_err() {
                log::warn!("Scroll after the event loop closed");
            }
        });
        window
            .add_event_listener_with_callback("scroll", closure.as_ref().unchecked_ref())
            .map_err(|e| anyhow::anyhow!("cannot listen for scroll events: {:?}", e))?;
        Ok(Self { closure })
    }

    fn detach(self) {
        if let Some(window) = web_sys::window() {
            if let Err(e) =
                window.remove_event_listener_with_callback("scroll", self.closure.as_ref().unchecked_ref())
            {
                log::warn!("Could not detach scroll listener: {:?}", e);
            }
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn page_scroll_offset() -> f32 {
    web_sys::window()
        .and_then(|w| w.scroll_y().ok())
        .unwrap_or(0.0) as f32
}

#[cfg(target_arch = "wasm32")]
fn clear_loading_state() {
    let body = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.body());
    if let Some(body) = body {
        if let Err(e) = body.class_list().remove_1("loading") {
            log::warn!("Could not clear the loading class: {:?}", e);
        }
    }
}

pub struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    proxy: EventLoopProxy<AppEvent>,
    settings: Config,
    layout: Box<dyn LayoutSource>,
    scene: Option<Scene>,
    ctx: Option<Context>,
    meshes: Vec<ItemMesh>,
    pending: Option<TextureBatch>,
    stop: StopHandle,
    clock: Clock,
    #[cfg(target_arch = "wasm32")]
    scroll_listener: Option<ScrollListener>,
}

impl App {
    fn new(
        event_loop: &EventLoop<AppEvent>,
        settings: Config,
        layout: Box<dyn LayoutSource>,
    ) -> anyhow::Result<Self> {
        let proxy = event_loop.create_proxy();
        #[cfg(not(target_arch = "wasm32"))]
        let async_runtime = tokio::runtime::Runtime::new()?;
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime,
            proxy,
            settings,
            layout,
            scene: None,
            ctx: None,
            meshes: Vec::new(),
            pending: None,
            stop: StopHandle::default(),
            clock: Clock::new(),
            #[cfg(target_arch = "wasm32")]
            scroll_listener: None,
        })
    }

    fn teardown_handle(&self) -> Teardown {
        Teardown {
            proxy: self.proxy.clone(),
            stop: self.stop.clone(),
        }
    }

    fn current_viewport(&self, window: &Window) -> Viewport {
        Viewport::from_physical(
            window.inner_size(),
            window.scale_factor(),
            self.settings.max_pixel_ratio,
        )
    }

    /// Populate the scene and upload its items. Waits for the GPU context if
    /// the batch finished first.
    fn on_loaded(&mut self, batch: TextureBatch) {
        let (Some(scene), Some(ctx)) = (self.scene.as_mut(), self.ctx.as_ref()) else {
            self.pending = Some(batch);
            return;
        };
        for failure in &batch.failures {
            log::error!("{failure}");
        }

        #[cfg(target_arch = "wasm32")]
        scene.on_scroll(page_scroll_offset(), self.clock.elapsed());

        // refuses when teardown was requested before loading finished
        if !scene.populate(batch.assets, self.layout.as_ref(), self.clock.elapsed()) {
            return;
        }
        self.meshes = scene
            .items_mut()
            .iter_mut()
            .enumerate()
            .map(|(index, item)| {
                let asset = item
                    .take_texture()
                    .unwrap_or_else(|| TextureAsset::placeholder("missing", 1, 1));
                let texture = Texture::from_asset(&ctx.device, &ctx.queue, &asset);
                ItemMesh::new(&ctx.device, item, texture, &ctx.item_layout, &format!("Item {index}"))
            })
            .collect();

        #[cfg(target_arch = "wasm32")]
        {
            clear_loading_state();
            match ScrollListener::attach(self.proxy.clone()) {
                Ok(listener) => self.scroll_listener = Some(listener),
                Err(e) => log::error!("{e}"),
            }
        }

        ctx.window.request_redraw();
    }

    fn start_loading(&mut self) {
        let loader = TextureBatchLoader::new(FetchDecoder, self.settings.max_load_attempts)
            .with_timing(self.settings.load_timeout, self.settings.retry_delay);
        let sources = self.settings.sources.clone();
        let proxy = self.proxy.clone();
        let load = async move {
            let batch = loader.load(&sources).await;
            if proxy.send_event(AppEvent::Loaded(batch)).is_err() {
                log::warn!("Texture batch finished after the event loop closed");
            }
        };

        #[cfg(not(target_arch = "wasm32"))]
        self.async_runtime.block_on(load);

        #[cfg(target_arch = "wasm32")]
        wasm_bindgen_futures::spawn_local(load);
    }

    fn teardown(&mut self, event_loop: &ActiveEventLoop) {
        self.stop.stop();
        if let Some(scene) = self.scene.as_mut() {
            scene.teardown();
        }
        #[cfg(target_arch = "wasm32")]
        if let Some(listener) = self.scroll_listener.take() {
            listener.detach();
        }
        event_loop.exit();
    }

    fn redraw(&mut self) {
        let (Some(scene), Some(ctx)) = (self.scene.as_mut(), self.ctx.as_mut()) else {
            return;
        };
        let Some(_timing) = scene.tick(self.clock.elapsed()) else {
            return;
        };

        ctx.camera.write(&ctx.queue, scene.camera());
        for (mesh, item) in self.meshes.iter().zip(scene.items()) {
            mesh.write(&ctx.queue, item);
        }

        match draw_scene(ctx, &self.meshes) {
            Ok(()) => {}
            // Reconfigure the surface if it's lost or outdated
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let viewport = Viewport::from_physical(
                    ctx.window.inner_size(),
                    ctx.window.scale_factor(),
                    self.settings.max_pixel_ratio,
                );
                ctx.resize(&viewport);
            }
            Err(e) => log::error!("Unable to render {}", e),
        }
        ctx.window.request_redraw();
    }

    fn on_ready(&mut self, ctx: Context) {
        let viewport = self.current_viewport(&ctx.window);
        self.scene = Some(Scene::new(&self.settings, viewport.size()).with_stop_handle(self.stop.clone()));
        self.ctx = Some(ctx);
        if let Some(batch) = self.pending.take() {
            self.on_loaded(batch);
        }
    }
}

impl ApplicationHandler<AppEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.ctx.is_some() {
            return;
        }

        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes().with_title("scroll-reveal");

        #[cfg(target_arch = "wasm32")]
        {
            use winit::platform::web::WindowAttributesExtWebSys;

            let canvas = web_sys::window()
                .and_then(|w| w.document())
                .and_then(|d| d.get_element_by_id(&self.settings.canvas_id))
                .and_then(|e| e.dyn_into::<web_sys::HtmlCanvasElement>().ok());
            match canvas {
                Some(canvas) => window_attributes = window_attributes.with_canvas(Some(canvas)),
                None => log::warn!("No canvas with id '{}', winit will create one", self.settings.canvas_id),
            }
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Cannot create a window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let viewport = self.current_viewport(&window);
        let camera = CameraState::new(
            self.settings.camera_distance,
            viewport.width,
            viewport.height,
            self.settings.near,
            self.settings.far,
        );
        let settings = self.settings.clone();
        let init = async move { Context::new(window, &settings, &viewport, &camera).await };

        #[cfg(not(target_arch = "wasm32"))]
        {
            match self.async_runtime.block_on(init) {
                Ok(ctx) => self.on_ready(ctx),
                Err(e) => {
                    log::error!("App initialization failed. Cannot create the main context: {}", e);
                    event_loop.exit();
                    return;
                }
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match init.await {
                    Ok(ctx) => {
                        if proxy.send_event(AppEvent::Initialized(Box::new(ctx))).is_err() {
                            log::warn!("Context ready after the event loop closed");
                        }
                    }
                    Err(e) => log::error!("App initialization failed. Cannot create the main context: {}", e),
                }
            });
        }

        self.start_loading();
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: AppEvent) {
        match event {
            AppEvent::Initialized(ctx) => self.on_ready(*ctx),
            AppEvent::Loaded(batch) => self.on_loaded(batch),
            AppEvent::Scroll(offset) => {
                if let Some(scene) = self.scene.as_mut() {
                    scene.on_scroll(offset, self.clock.elapsed());
                }
            }
            AppEvent::Teardown => self.teardown(event_loop),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => self.teardown(event_loop),
            WindowEvent::Resized(size) => {
                let Some(ctx) = self.ctx.as_mut() else {
                    return;
                };
                let viewport =
                    Viewport::from_physical(size, ctx.window.scale_factor(), self.settings.max_pixel_ratio);
                if viewport.is_empty() {
                    return;
                }
                ctx.resize(&viewport);
                if let Some(scene) = self.scene.as_mut() {
                    if let Err(e) = scene.on_resize(viewport.size(), self.layout.as_ref()) {
                        log::error!("Resize left an item in place: {}", e);
                    }
                }
            }
            #[cfg(not(target_arch = "wasm32"))]
            WindowEvent::MouseWheel { delta, .. } => {
                let Some(scene) = self.scene.as_mut() else {
                    return;
                };
                let dy = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y * LINE_HEIGHT,
                    MouseScrollDelta::PixelDelta(position) => position.y as f32,
                };
                let offset = (scene.scroll().offset() - dy).clamp(0.0, scene.max_scroll());
                scene.on_scroll(offset, self.clock.elapsed());
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }
}

fn init_logging() {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::log_1(&format!("Could not initialize logger: {}", e).into());
        }
    }
}

/// Run a reveal page with the given layout. `on_ready` receives the
/// [`Teardown`] handle before the event loop starts.
pub fn run_with(
    settings: Config,
    layout: Box<dyn LayoutSource>,
    on_ready: impl FnOnce(Teardown),
) -> anyhow::Result<()> {
    init_logging();

    let event_loop: EventLoop<AppEvent> = EventLoop::with_user_event().build()?;
    let mut app = App::new(&event_loop, settings, layout)?;
    on_ready(app.teardown_handle());

    event_loop.run_app(&mut app)?;

    Ok(())
}

/// Run a reveal page. On the web the layout comes from the containers
/// matching `settings.container_selector`; natively every item is stacked.
pub fn run(settings: Config) -> anyhow::Result<()> {
    #[cfg(target_arch = "wasm32")]
    let layout: Box<dyn LayoutSource> = Box::new(crate::layout::DomLayout::new(settings.container_selector.clone()));
    #[cfg(not(target_arch = "wasm32"))]
    let layout: Box<dyn LayoutSource> = Box::new(crate::layout::FixedLayout::default());

    run_with(settings, layout, |_| ())
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    run(Config::default()).map_err(|e| JsValue::from_str(&e.to_string()))
}
