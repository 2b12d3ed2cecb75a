//! The coordinator that owns every piece of mutable page state.
//!
//! [`Scene`] holds the items, the scroll tracker, the animator, the camera and
//! the render loop. The event loop feeds it scroll offsets, resizes and frame
//! ticks, always with an explicit timestamp, and reads back what to draw.
//! Nothing in here touches the GPU, so the whole scroll-to-frame pipeline can
//! be driven in tests.

use instant::Duration;

use crate::{
    animation::ProgressAnimator,
    camera::CameraState,
    config::Config,
    data_structures::item::{Item, ItemMeshFactory},
    layout::{LayoutError, LayoutSource, Placement, ViewportSize, fallback_position, place},
    render::{FrameTiming, RenderLoop, StopHandle},
    resources::loader::TextureAsset,
    scroll::{ScrollTracker, SectionEnter},
};

#[derive(Debug)]
pub struct Scene {
    factory: ItemMeshFactory,
    items: Vec<Item>,
    scroll: ScrollTracker,
    animator: ProgressAnimator,
    camera: CameraState,
    render_loop: RenderLoop,
    viewport: ViewportSize,
    pinned_section_height: Option<f32>,
    populated: bool,
}

impl Scene {
    pub fn new(config: &Config, viewport: ViewportSize) -> Self {
        Self {
            factory: ItemMeshFactory::new(config.plane_segments),
            items: Vec::new(),
            scroll: ScrollTracker::new(config.section_height_for(viewport.height)),
            animator: ProgressAnimator::new(config.reveal_duration, config.easing),
            camera: CameraState::new(
                config.camera_distance,
                viewport.width,
                viewport.height,
                config.near,
                config.far,
            ),
            render_loop: RenderLoop::new(config.smoothing),
            viewport,
            pinned_section_height: config.section_height,
            populated: false,
        }
    }

    /// Tie the render loop to a stop flag owned elsewhere.
    pub fn with_stop_handle(mut self, stop: StopHandle) -> Self {
        self.render_loop = self.render_loop.with_stop_handle(stop);
        self
    }

    /// Build one item per texture, place it, reveal whatever section is in
    /// view and start the render loop. Only the first call has an effect.
    ///
    /// Items beyond the number of layout containers are stacked one section
    /// apart and keep their image's pixel size. A scene that was torn down
    /// before its textures arrived stays empty.
    pub fn populate(&mut self, textures: Vec<TextureAsset>, layout: &dyn LayoutSource, now: Duration) -> bool {
        if self.populated {
            log::warn!("Scene is already populated, ignoring {} texture(s)", textures.len());
            return false;
        }
        if self.render_loop.stop_handle().is_stopped() {
            log::info!("Scene was torn down while loading, dropping {} texture(s)", textures.len());
            return false;
        }
        let rects = layout.container_rects();
        if rects.len() != textures.len() {
            log::warn!(
                "Number of layout containers ({}) does not match number of textures ({})",
                rects.len(),
                textures.len()
            );
        }

        let section_height = self.scroll.section_height();
        let scroll_offset = self.scroll.offset();
        self.items = textures
            .into_iter()
            .enumerate()
            .map(|(index, texture)| {
                let mut item = match rects.get(index) {
                    Some(rect) => {
                        let mut item = self.factory.build(rect.width, rect.height);
                        item.position = place(&rect.scrolled_by(scroll_offset), self.viewport);
                        item.placement = Placement::Container(index);
                        item
                    }
                    None => {
                        let mut item = self.factory.build(texture.width as f32, texture.height as f32);
                        item.position = fallback_position(index, section_height);
                        item
                    }
                };
                item.assign_texture(texture);
                item
            })
            .collect();
        self.populated = true;
        log::info!("Scene populated with {} item(s)", self.items.len());

        // the page may have been restored mid-scroll
        let offset = self.scroll.offset();
        self.camera.y = -offset;
        if let Some(event) = self.scroll.on_scroll(offset) {
            self.animator.on_section_enter(event, &self.items, now);
        }
        self.render_loop.start(now);
        true
    }

    /// Record a scroll offset. Before population the offset is only stored.
    pub fn on_scroll(&mut self, offset: f32, now: Duration) -> Option<SectionEnter> {
        if !self.populated {
            self.scroll = ScrollTracker::with_offset(self.scroll.section_height(), offset);
            return None;
        }
        let event = self.scroll.on_scroll(offset)?;
        self.animator.on_section_enter(event, &self.items, now);
        Some(event)
    }

    /// Recompute the projection and reposition every item for a new viewport.
    /// Container rects are read relative to the viewport at the current
    /// scroll offset, like the initial placement.
    ///
    /// Repositioning continues past missing containers; the first missing one
    /// is reported. Running reveals are not affected.
    pub fn on_resize(&mut self, viewport: ViewportSize, layout: &dyn LayoutSource) -> Result<(), LayoutError> {
        self.viewport = viewport;
        self.camera.resize(viewport.width, viewport.height);
        let section_height = self.pinned_section_height.unwrap_or(viewport.height);
        self.scroll.set_section_height(section_height);

        let rects = layout.container_rects();
        let scroll_offset = self.scroll.offset();
        let mut first_error = None;
        for (index, item) in self.items.iter_mut().enumerate() {
            match item.placement {
                Placement::Container(container) => match rects.get(container) {
                    Some(rect) => item.position = place(&rect.scrolled_by(scroll_offset), viewport),
                    None => {
                        let error = LayoutError::MissingContainer {
                            index: container,
                            available: rects.len(),
                        };
                        log::error!("Cannot reposition item {index}: {error}");
                        first_error.get_or_insert(error);
                    }
                },
                Placement::Fallback => item.position = fallback_position(index, section_height),
            }
        }
        match first_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// Advance animations and the camera for one frame. `None` means the
    /// loop is not running and nothing should be drawn.
    pub fn tick(&mut self, now: Duration) -> Option<FrameTiming> {
        if !self.render_loop.is_running() {
            return None;
        }
        self.animator.advance(&mut self.items, now);
        self.render_loop.tick(now, self.scroll.offset(), &mut self.camera)
    }

    /// Stop the render loop. Items stay alive until the scene is dropped.
    pub fn teardown(&mut self) {
        self.render_loop.stop_handle().stop();
        log::info!("Scene torn down after {} frame(s)", self.render_loop.frames());
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.render_loop.stop_handle()
    }

    pub fn is_loading(&self) -> bool {
        !self.populated
    }

    pub fn is_running(&self) -> bool {
        self.render_loop.is_running()
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn items_mut(&mut self) -> &mut [Item] {
        &mut self.items
    }

    pub fn camera(&self) -> &CameraState {
        &self.camera
    }

    pub fn scroll(&self) -> &ScrollTracker {
        &self.scroll
    }

    pub fn animator(&self) -> &ProgressAnimator {
        &self.animator
    }

    pub fn viewport(&self) -> ViewportSize {
        self.viewport
    }

    /// Largest meaningful scroll offset: the top of the last section.
    pub fn max_scroll(&self) -> f32 {
        self.items.len().saturating_sub(1) as f32 * self.scroll.section_height()
    }
}
