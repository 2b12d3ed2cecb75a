#![allow(dead_code)]

use std::{
    cell::RefCell,
    collections::HashMap,
};

use futures::channel::oneshot;
use instant::Duration;
use scroll_reveal::{
    config::Config,
    layout::{Rect, ViewportSize},
    resources::loader::{DecodeFuture, TextureAsset, TextureDecoder},
    scene::Scene,
};

/// Decoder whose results are handed in by the test, one sender per source.
/// Lets a test choose the order in which individual decodes complete.
pub(crate) struct ChannelDecoder {
    pending: RefCell<HashMap<String, oneshot::Receiver<Result<TextureAsset, String>>>>,
    decode_calls: RefCell<u32>,
}

impl ChannelDecoder {
    pub fn new<S: AsRef<str>>(sources: &[S]) -> (Self, Vec<(String, oneshot::Sender<Result<TextureAsset, String>>)>) {
        let mut pending = HashMap::new();
        let mut senders = Vec::new();
        for source in sources {
            let (tx, rx) = oneshot::channel();
            pending.insert(source.as_ref().to_string(), rx);
            senders.push((source.as_ref().to_string(), tx));
        }
        let decoder = Self {
            pending: RefCell::new(pending),
            decode_calls: RefCell::new(0),
        };
        (decoder, senders)
    }

    pub fn decode_calls(&self) -> u32 {
        *self.decode_calls.borrow()
    }
}

impl TextureDecoder for ChannelDecoder {
    fn decode<'a>(&'a self, source: &'a str) -> DecodeFuture<'a> {
        *self.decode_calls.borrow_mut() += 1;
        let rx = self.pending.borrow_mut().remove(source);
        Box::pin(async move {
            let rx = rx.ok_or_else(|| anyhow::anyhow!("{source} was already decoded"))?;
            match rx.await {
                Ok(Ok(asset)) => Ok(asset),
                Ok(Err(reason)) => Err(anyhow::anyhow!(reason)),
                Err(_) => Err(anyhow::anyhow!("{source} was cancelled")),
            }
        })
    }
}

/// Fails the first `failures` attempts of every source listed, then succeeds.
pub(crate) struct FlakyDecoder {
    failures: HashMap<String, u32>,
    attempts: RefCell<HashMap<String, u32>>,
}

impl FlakyDecoder {
    pub fn new(failures: &[(&str, u32)]) -> Self {
        Self {
            failures: failures.iter().map(|(s, n)| (s.to_string(), *n)).collect(),
            attempts: RefCell::new(HashMap::new()),
        }
    }

    pub fn attempts(&self, source: &str) -> u32 {
        self.attempts.borrow().get(source).copied().unwrap_or(0)
    }
}

impl TextureDecoder for FlakyDecoder {
    fn decode<'a>(&'a self, source: &'a str) -> DecodeFuture<'a> {
        let attempt = {
            let mut attempts = self.attempts.borrow_mut();
            let counter = attempts.entry(source.to_string()).or_insert(0);
            *counter += 1;
            *counter
        };
        let allowed_failures = self.failures.get(source).copied().unwrap_or(0);
        Box::pin(async move {
            if attempt <= allowed_failures {
                Err(anyhow::anyhow!("{source}: attempt {attempt} refused"))
            } else {
                Ok(asset(source, 64, 48))
            }
        })
    }
}

pub(crate) fn asset(source: &str, width: u32, height: u32) -> TextureAsset {
    let mut asset = TextureAsset::placeholder(source, width, height);
    asset.placeholder = false;
    asset
}

pub(crate) fn assets(n: usize) -> Vec<TextureAsset> {
    (0..n)
        .map(|i| asset(&format!("{i:02}.webp"), 320 + i as u32, 240))
        .collect()
}

pub(crate) fn rect(left: f32, top: f32, width: f32, height: f32) -> Rect {
    Rect::new(left, top, width, height)
}

/// Settings with a coarse plane so tests do not build 128×128 grids.
pub(crate) fn test_config() -> Config {
    Config {
        plane_segments: 2,
        ..Default::default()
    }
}

pub(crate) fn scene(width: f32, height: f32) -> Scene {
    Scene::new(&test_config(), ViewportSize::new(width, height))
}

pub(crate) fn secs(s: f32) -> Duration {
    Duration::from_secs_f32(s)
}

/// Sample `progress` of item `index` at several points in `[from, to]`.
pub(crate) fn progress_samples(scene: &mut Scene, index: usize, from: f32, to: f32, steps: u32) -> Vec<f32> {
    (0..=steps)
        .map(|step| {
            let t = from + (to - from) * step as f32 / steps as f32;
            scene.tick(secs(t));
            scene.items()[index].uniforms.progress
        })
        .collect()
}

/// Never resolves for the listed sources; every other source decodes.
pub(crate) struct StalledDecoder {
    stalled: Vec<String>,
    attempts: RefCell<u32>,
}

impl StalledDecoder {
    pub fn new(stalled: &[&str]) -> Self {
        Self {
            stalled: stalled.iter().map(|s| s.to_string()).collect(),
            attempts: RefCell::new(0),
        }
    }

    pub fn attempts(&self) -> u32 {
        *self.attempts.borrow()
    }
}

impl TextureDecoder for StalledDecoder {
    fn decode<'a>(&'a self, source: &'a str) -> DecodeFuture<'a> {
        *self.attempts.borrow_mut() += 1;
        if self.stalled.iter().any(|s| s == source) {
            Box::pin(futures::future::pending())
        } else {
            Box::pin(futures::future::ready(Ok(asset(source, 16, 16))))
        }
    }
}
