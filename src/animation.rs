//! Reveal animation: easing curves, tweens and the per-item animator.
//!
//! A [`Tween`] is a pure function of the clock. Nothing is integrated frame by
//! frame, so a tween evaluated at any time gives the same value regardless of
//! how many frames were rendered in between.

use std::collections::HashMap;

use instant::Duration;

use crate::{data_structures::item::Item, scroll::SectionEnter};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Easing {
    Linear,
    /// Decelerating quadratic, `1 - (1 - t)²`.
    #[default]
    QuadOut,
    CubicInOut,
}

impl Easing {
    /// Map linear time `t ∈ [0, 1]` onto the curve. Input is clamped.
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::QuadOut => 1.0 - (1.0 - t) * (1.0 - t),
            Easing::CubicInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tween {
    pub start: f32,
    pub target: f32,
    pub duration: Duration,
    pub started_at: Duration,
    pub easing: Easing,
}

impl Tween {
    pub fn new(start: f32, target: f32, duration: Duration, started_at: Duration, easing: Easing) -> Self {
        Self {
            start,
            target,
            duration,
            started_at,
            easing,
        }
    }

    fn linear_time(&self, now: Duration) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_sub(self.started_at);
        (elapsed.as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
    }

    pub fn value_at(&self, now: Duration) -> f32 {
        let t = self.linear_time(now);
        if t >= 1.0 {
            return self.target;
        }
        let eased = self.easing.apply(t);
        self.start + (self.target - self.start) * eased
    }

    pub fn is_finished(&self, now: Duration) -> bool {
        self.linear_time(now) >= 1.0
    }
}

/// Drives the `progress` uniform of every item toward 1.0.
///
/// At most one tween exists per item. Entering a section whose item is
/// already animating replaces its tween, starting from the value the old one
/// has reached at that instant, so progress never jumps back or overshoots.
#[derive(Debug)]
pub struct ProgressAnimator {
    duration: Duration,
    easing: Easing,
    tweens: HashMap<usize, Tween>,
}

impl ProgressAnimator {
    pub const TARGET: f32 = 1.0;

    pub fn new(duration: Duration, easing: Easing) -> Self {
        Self {
            duration,
            easing,
            tweens: HashMap::new(),
        }
    }

    /// Start (or restart) the reveal of `items[event.section]`. Sections past
    /// either end of the item list are ignored. Returns whether a tween was
    /// started.
    pub fn on_section_enter(&mut self, event: SectionEnter, items: &[Item], now: Duration) -> bool {
        let item = usize::try_from(event.section)
            .ok()
            .and_then(|index| items.get(index).map(|item| (index, item)));
        match item {
            Some((index, item)) => {
                self.reveal(index, item.uniforms.progress, now);
                true
            }
            None => {
                log::debug!("Section {} has no item, nothing to reveal", event.section);
                false
            }
        }
    }

    /// Replace any tween on `index` with one running from the current value
    /// to [`Self::TARGET`].
    pub fn reveal(&mut self, index: usize, progress: f32, now: Duration) {
        let in_flight = self.tweens.get(&index).map(|tween| tween.value_at(now));
        let start = in_flight.unwrap_or(progress).max(progress).clamp(0.0, Self::TARGET);
        let tween = Tween::new(start, Self::TARGET, self.duration, now, self.easing);
        self.tweens.insert(index, tween);
    }

    /// Write every in-flight tween's value into its item and retire the
    /// finished ones.
    pub fn advance(&mut self, items: &mut [Item], now: Duration) {
        self.tweens.retain(|&index, tween| {
            let Some(item) = items.get_mut(index) else {
                return false;
            };
            item.uniforms.progress = tween.value_at(now).clamp(0.0, Self::TARGET);
            !tween.is_finished(now)
        });
    }

    pub fn is_animating(&self, index: usize) -> bool {
        self.tweens.contains_key(&index)
    }

    pub fn in_flight(&self) -> usize {
        self.tweens.len()
    }
}
