//! Page layout and the pixel-space to world-space placement policy.
//!
//! Layout containers report their bounding box in viewport pixels (origin top
//! left, y down). Items live in world space (origin at the viewport centre,
//! y up). [`place`] maps between the two so that a plane covers its container
//! exactly when the camera sits at scroll offset zero. Rects read while the
//! page is scrolled go through [`Rect::scrolled_by`] first.

use cgmath::Vector3;

/// A bounding box in viewport pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// The same rect in page coordinates, given a viewport-relative rect read
    /// while the page was scrolled down by `offset`.
    pub fn scrolled_by(&self, offset: f32) -> Self {
        Self {
            top: self.top + offset,
            ..*self
        }
    }
}

/// Logical (CSS pixel) size of the viewport.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportSize {
    pub width: f32,
    pub height: f32,
}

impl ViewportSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// World position of the centre of a plane covering `rect`.
pub fn place(rect: &Rect, viewport: ViewportSize) -> Vector3<f32> {
    Vector3::new(
        rect.left - viewport.width / 2.0 + rect.width / 2.0,
        -rect.top + viewport.height / 2.0 - rect.height / 2.0,
        0.0,
    )
}

/// Position for an item without a layout container: centred horizontally,
/// stacked one section per index.
pub fn fallback_position(index: usize, section_height: f32) -> Vector3<f32> {
    Vector3::new(0.0, -section_height * index as f32, 0.0)
}

/// Where an item takes its position from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    /// Follows the layout container with this index.
    Container(usize),
    /// No container; uses [`fallback_position`].
    Fallback,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("layout container for item {index} is missing ({available} containers on the page)")]
    MissingContainer { index: usize, available: usize },
}

/// Anything that can report the current bounding boxes of the layout
/// containers, in document order.
pub trait LayoutSource {
    fn container_rects(&self) -> Vec<Rect>;

    fn container_rect(&self, index: usize) -> Result<Rect, LayoutError> {
        let rects = self.container_rects();
        rects
            .get(index)
            .copied()
            .ok_or(LayoutError::MissingContainer {
                index,
                available: rects.len(),
            })
    }
}

/// A layout that is not backed by a page. Used on native targets (where it
/// is usually empty, so every item falls back to stacking) and in tests.
#[derive(Clone, Debug, Default)]
pub struct FixedLayout {
    rects: Vec<Rect>,
}

impl FixedLayout {
    pub fn new(rects: Vec<Rect>) -> Self {
        Self { rects }
    }

    pub fn set_rects(&mut self, rects: Vec<Rect>) {
        self.rects = rects;
    }
}

impl LayoutSource for FixedLayout {
    fn container_rects(&self) -> Vec<Rect> {
        self.rects.clone()
    }
}

/// Layout read from the DOM: every element matching `selector`.
#[cfg(target_arch = "wasm32")]
#[derive(Clone, Debug)]
pub struct DomLayout {
    selector: String,
}

#[cfg(target_arch = "wasm32")]
impl DomLayout {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
        }
    }
}

#[cfg(target_arch = "wasm32")]
impl LayoutSource for DomLayout {
    fn container_rects(&self) -> Vec<Rect> {
        use wasm_bindgen::JsCast;

        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            log::error!("No document available to query '{}'", self.selector);
            return Vec::new();
        };
        let nodes = match document.query_selector_all(&self.selector) {
            Ok(nodes) => nodes,
            Err(e) => {
                log::error!("Invalid container selector '{}': {:?}", self.selector, e);
                return Vec::new();
            }
        };
        (0..nodes.length())
            .filter_map(|i| nodes.item(i))
            .filter_map(|node| node.dyn_into::<web_sys::Element>().ok())
            .map(|element| {
                let rect = element.get_bounding_client_rect();
                Rect::new(
                    rect.left() as f32,
                    rect.top() as f32,
                    rect.width() as f32,
                    rect.height() as f32,
                )
            })
            .collect()
    }
}
