//! Batch texture loading.
//!
//! [`TextureBatchLoader::load`] decodes every source concurrently and
//! resolves once, with one asset per source in input order. A source that
//! keeps failing is retried a bounded number of times and then replaced by a
//! placeholder, so a broken image never holds back the rest of the page.
//! With [`TextureBatchLoader::with_timing`] a stalled attempt counts as a
//! failure once its timeout passes.

use std::pin::Pin;

use futures::future::{self, Either};

use image::{DynamicImage, GenericImageView, RgbaImage};
use instant::Duration;

/// A decoded image, ready to be uploaded.
#[derive(Clone, Debug)]
pub struct TextureAsset {
    pub source: String,
    pub width: u32,
    pub height: u32,
    pub pixels: RgbaImage,
    /// Set when the asset stands in for a source that could not be loaded.
    pub placeholder: bool,
}

impl TextureAsset {
    /// Neutral grey shown in place of images that failed to load.
    pub const PLACEHOLDER_COLOUR: [u8; 4] = [128, 128, 128, 255];

    pub fn from_image(source: impl Into<String>, img: &DynamicImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            source: source.into(),
            width,
            height,
            pixels: img.to_rgba8(),
            placeholder: false,
        }
    }

    pub fn decode(source: impl Into<String>, bytes: &[u8]) -> anyhow::Result<Self> {
        let img = image::load_from_memory(bytes)?;
        Ok(Self::from_image(source, &img))
    }

    pub fn placeholder(source: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            source: source.into(),
            width,
            height,
            pixels: RgbaImage::from_pixel(width, height, image::Rgba(Self::PLACEHOLDER_COLOUR)),
            placeholder: true,
        }
    }
}

pub type DecodeFuture<'a> = Pin<Box<dyn Future<Output = anyhow::Result<TextureAsset>> + 'a>>;

/// Turns a source identifier into a decoded texture.
pub trait TextureDecoder {
    fn decode<'a>(&'a self, source: &'a str) -> DecodeFuture<'a>;
}

/// Fetches the bytes with [`super::load_binary`] and decodes them with `image`.
#[derive(Clone, Copy, Debug, Default)]
pub struct FetchDecoder;

impl TextureDecoder for FetchDecoder {
    fn decode<'a>(&'a self, source: &'a str) -> DecodeFuture<'a> {
        Box::pin(async move {
            let bytes = super::load_binary(source).await?;
            TextureAsset::decode(source, &bytes)
        })
    }
}

/// A source that exhausted its attempts and was replaced by a placeholder.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("texture {index} ({location}) failed after {attempts} attempt(s): {reason}")]
pub struct LoadFailure {
    pub index: usize,
    pub location: String,
    pub attempts: u32,
    pub reason: String,
}

/// The result of a batch: always one asset per requested source.
#[derive(Debug)]
pub struct TextureBatch {
    pub assets: Vec<TextureAsset>,
    pub failures: Vec<LoadFailure>,
}

impl TextureBatch {
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn all_loaded(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Wait for `duration` on whichever timer the target has.
pub async fn sleep(duration: Duration) {
    #[cfg(not(target_arch = "wasm32"))]
    tokio::time::sleep(duration).await;

    #[cfg(target_arch = "wasm32")]
    gloo_timers::future::TimeoutFuture::new(duration.as_millis().min(u32::MAX as u128) as u32).await;
}

#[derive(Debug)]
pub struct TextureBatchLoader<D> {
    decoder: D,
    max_attempts: u32,
    attempt_timeout: Option<Duration>,
    retry_delay: Duration,
}

impl<D: TextureDecoder> TextureBatchLoader<D> {
    /// A loader without timers: attempts are not time-bounded and retries
    /// follow each other immediately. See [`Self::with_timing`].
    pub fn new(decoder: D, max_attempts: u32) -> Self {
        Self {
            decoder,
            max_attempts: max_attempts.max(1),
            attempt_timeout: None,
            retry_delay: Duration::ZERO,
        }
    }

    /// Bound every attempt by `attempt_timeout` and wait `retry_delay`
    /// before the first retry, doubling for each further one.
    pub fn with_timing(mut self, attempt_timeout: Option<Duration>, retry_delay: Duration) -> Self {
        self.attempt_timeout = attempt_timeout;
        self.retry_delay = retry_delay;
        self
    }

    fn backoff(&self, attempt: u32) -> Duration {
        self.retry_delay.saturating_mul(1 << (attempt.saturating_sub(2)).min(16))
    }

    async fn attempt(&self, source: &str) -> anyhow::Result<TextureAsset> {
        let decode = self.decoder.decode(source);
        let Some(timeout) = self.attempt_timeout else {
            return decode.await;
        };
        match future::select(decode, Box::pin(sleep(timeout))).await {
            Either::Left((result, _)) => result,
            Either::Right(((), _)) => Err(anyhow::anyhow!("timed out after {} ms", timeout.as_millis())),
        }
    }

    async fn load_one(&self, index: usize, source: &str) -> (TextureAsset, Option<LoadFailure>) {
        let mut reason = String::new();
        for attempt in 1..=self.max_attempts {
            if attempt > 1 && !self.retry_delay.is_zero() {
                sleep(self.backoff(attempt)).await;
            }
            match self.attempt(source).await {
                Ok(asset) => return (asset, None),
                Err(e) => {
                    log::warn!(
                        "Loading texture {source} failed (attempt {attempt}/{}): {e}",
                        self.max_attempts
                    );
                    reason = e.to_string();
                }
            }
        }
        let failure = LoadFailure {
            index,
            location: source.to_string(),
            attempts: self.max_attempts,
            reason,
        };
        log::error!("{failure}; using a placeholder");
        (TextureAsset::placeholder(source, 1, 1), Some(failure))
    }

    /// Load every source. Resolves exactly once, after the last source has
    /// either decoded or been replaced, with assets in the order of `sources`.
    pub async fn load<S: AsRef<str>>(&self, sources: &[S]) -> TextureBatch {
        let loads = sources
            .iter()
            .enumerate()
            .map(|(index, source)| self.load_one(index, source.as_ref()));
        let (assets, failures): (Vec<_>, Vec<_>) = futures::future::join_all(loads).await.into_iter().unzip();
        let failures: Vec<LoadFailure> = failures.into_iter().flatten().collect();
        log::info!(
            "Loaded {} texture(s), {} replaced by placeholders",
            assets.len(),
            failures.len()
        );
        TextureBatch { assets, failures }
    }

    /// Callback flavour of [`Self::load`]; `on_complete` runs once.
    pub async fn load_then<S, F>(&self, sources: &[S], on_complete: F)
    where
        S: AsRef<str>,
        F: FnOnce(TextureBatch),
    {
        on_complete(self.load(sources).await)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 255])));
        let mut bytes = Cursor::new(Vec::new());
        img.write_to(&mut bytes, image::ImageFormat::Png)
            .expect("png encoding");
        bytes.into_inner()
    }

    #[test]
    fn decode_reports_pixel_dimensions() {
        let asset = TextureAsset::decode("pic.png", &png_bytes(3, 2)).expect("decodes");
        assert_eq!((asset.width, asset.height), (3, 2));
        assert_eq!(asset.pixels.get_pixel(0, 0).0, [10, 20, 30, 255]);
        assert!(!asset.placeholder);
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        assert!(TextureAsset::decode("pic.png", b"not an image").is_err());
    }

    struct BytesDecoder(Vec<u8>);
    impl TextureDecoder for BytesDecoder {
        fn decode<'a>(&'a self, source: &'a str) -> DecodeFuture<'a> {
            Box::pin(async move { TextureAsset::decode(source, &self.0) })
        }
    }

    #[test]
    fn broken_sources_become_placeholders() {
        let loader = TextureBatchLoader::new(BytesDecoder(b"broken".to_vec()), 2);
        let batch = futures::executor::block_on(loader.load(&["a.webp", "b.webp"]));
        assert_eq!(batch.len(), 2);
        assert!(batch.assets.iter().all(|asset| asset.placeholder));
        assert_eq!(batch.failures.len(), 2);
        assert_eq!(batch.failures[1].location, "b.webp");
        assert_eq!(batch.failures[1].attempts, 2);
    }

    #[test]
    fn backoff_doubles_per_retry() {
        let loader = TextureBatchLoader::new(BytesDecoder(Vec::new()), 4)
            .with_timing(None, Duration::from_millis(100));
        assert_eq!(loader.backoff(2), Duration::from_millis(100));
        assert_eq!(loader.backoff(3), Duration::from_millis(200));
        assert_eq!(loader.backoff(4), Duration::from_millis(400));
    }
}
