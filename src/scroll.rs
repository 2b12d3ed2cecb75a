//! Scroll position tracking and section detection.
//!
//! The page is divided into sections of `section_height` scroll pixels (one
//! viewport height by default). [`ScrollTracker::on_scroll`] turns the raw,
//! rapidly firing scroll offsets into discrete [`SectionEnter`] events that
//! only fire when the rounded section index actually changes.

/// Raised when the scroll position crosses into a different section.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SectionEnter {
    pub section: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScrollDirection {
    Down,
    Up,
    Still,
}

/// Rounds half up, the way browsers round scroll ratios.
pub fn section_for(offset: f32, section_height: f32) -> i32 {
    (offset / section_height + 0.5).floor() as i32
}

#[derive(Clone, Debug)]
pub struct ScrollTracker {
    offset: f32,
    section_height: f32,
    section: i32,
    shift: i32,
    last_delta: i32,
}

impl ScrollTracker {
    /// Section index before the first transition.
    pub const UNSET: i32 = -1;

    pub fn new(section_height: f32) -> Self {
        Self {
            offset: 0.0,
            section_height,
            section: Self::UNSET,
            shift: 0,
            last_delta: 0,
        }
    }

    /// A tracker that already knows the page offset but has not entered any
    /// section yet.
    pub fn with_offset(section_height: f32, offset: f32) -> Self {
        Self {
            offset,
            ..Self::new(section_height)
        }
    }

    /// Record a new scroll offset. Returns an event only if the section index
    /// changed; repeated offsets inside the same section are silent.
    pub fn on_scroll(&mut self, offset: f32) -> Option<SectionEnter> {
        self.offset = offset;
        if !(self.section_height > 0.0) {
            return None;
        }
        let section = section_for(offset, self.section_height);
        if section == self.section {
            return None;
        }
        self.last_delta = section - self.section;
        self.shift += self.last_delta;
        self.section = section;
        log::debug!(
            "Entered section {} (shift {}, offset {:.1})",
            section,
            self.shift,
            offset
        );
        Some(SectionEnter { section })
    }

    /// Changing the section height does not emit; the next scroll event
    /// re-evaluates the section against the new height.
    pub fn set_section_height(&mut self, section_height: f32) {
        self.section_height = section_height;
    }

    pub fn offset(&self) -> f32 {
        self.offset
    }

    pub fn section(&self) -> i32 {
        self.section
    }

    pub fn section_height(&self) -> f32 {
        self.section_height
    }

    /// Cumulative signed section delta since creation.
    pub fn shift(&self) -> i32 {
        self.shift
    }

    /// Direction of the most recent section transition.
    pub fn direction(&self) -> ScrollDirection {
        match self.last_delta.signum() {
            1 => ScrollDirection::Down,
            -1 => ScrollDirection::Up,
            _ => ScrollDirection::Still,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staying_inside_a_section_is_silent() {
        let mut tracker = ScrollTracker::new(1000.0);
        assert_eq!(tracker.on_scroll(0.0), Some(SectionEnter { section: 0 }));
        assert_eq!(tracker.on_scroll(400.0), None);
        assert_eq!(tracker.on_scroll(600.0), Some(SectionEnter { section: 1 }));
        assert_eq!(tracker.on_scroll(650.0), None);
        assert_eq!(tracker.on_scroll(1400.0), None);
    }

    #[test]
    fn rapid_identical_events_fire_once() {
        let mut tracker = ScrollTracker::new(500.0);
        let events: Vec<_> = std::iter::repeat(1000.0)
            .take(20)
            .filter_map(|offset| tracker.on_scroll(offset))
            .collect();
        assert_eq!(events, vec![SectionEnter { section: 2 }]);
    }

    #[test]
    fn shift_accumulates_signed_deltas() {
        let mut tracker = ScrollTracker::new(100.0);
        tracker.on_scroll(0.0);
        assert_eq!(tracker.shift(), 1);
        tracker.on_scroll(300.0);
        assert_eq!(tracker.shift(), 4);
        assert_eq!(tracker.direction(), ScrollDirection::Down);
        tracker.on_scroll(100.0);
        assert_eq!(tracker.shift(), 2);
        assert_eq!(tracker.direction(), ScrollDirection::Up);
        assert_eq!(tracker.section(), 1);
    }

    #[test]
    fn half_way_rounds_up() {
        assert_eq!(section_for(50.0, 100.0), 1);
        assert_eq!(section_for(49.9, 100.0), 0);
        assert_eq!(section_for(-50.0, 100.0), 0);
    }

    #[test]
    fn degenerate_section_height_never_fires() {
        let mut tracker = ScrollTracker::new(0.0);
        assert_eq!(tracker.on_scroll(250.0), None);
        assert_eq!(tracker.offset(), 250.0);
        assert_eq!(tracker.section(), ScrollTracker::UNSET);
    }
}
