use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use crate::{
    foundation::core::{Affine, MediaTime, Size, TimeRange},
    foundation::error::{LaminaError, LaminaResult},
    render::texture::Texture,
};

/// Error domain reported by [`ImageSource`] load failures.
pub const IMAGE_SOURCE_DOMAIN: &str = "lamina.source.image";
/// Error domain reported by [`TrackSource`] load failures.
pub const TRACK_SOURCE_DOMAIN: &str = "lamina.source.track";

/// Nominal duration of a still image.
pub const DEFAULT_IMAGE_DURATION: MediaTime = MediaTime::from_secs(3600);

/// Callback receiving the outcome of [`Source::load`]. It is invoked exactly once.
pub type LoadCompletion = Box<dyn FnOnce(LaminaResult<()>) + Send>;

/// Kind of media channel carried by a track.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    /// Picture frames.
    Video,
    /// Sound.
    Audio,
}

/// Metadata of one decodable channel inside an asset.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MediaTrack {
    /// Channel kind.
    pub media_type: MediaType,
    /// Span of the track in asset time.
    pub time_range: TimeRange,
    /// Stored frame size; zero for audio.
    pub natural_size: Size,
    /// Orientation to apply to stored frames.
    pub preferred_transform: Affine,
}

impl MediaTrack {
    /// Video track with identity orientation.
    pub fn video(time_range: TimeRange, natural_size: Size) -> Self {
        Self {
            media_type: MediaType::Video,
            time_range,
            natural_size,
            preferred_transform: Affine::IDENTITY,
        }
    }

    /// Audio track.
    pub fn audio(time_range: TimeRange) -> Self {
        Self {
            media_type: MediaType::Audio,
            time_range,
            natural_size: Size::default(),
            preferred_transform: Affine::IDENTITY,
        }
    }

    /// Set the preferred orientation.
    pub fn with_preferred_transform(mut self, transform: Affine) -> Self {
        self.preferred_transform = transform;
        self
    }
}

/// Broad family of a [`Source`], used to pick a render path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Self-contained texture provider.
    Image,
    /// Track-bearing asset whose frames come from the host pipeline.
    Tracks,
}

/// Content provider attached to a layer.
pub trait Source: Send + Sync + fmt::Debug {
    /// Family of this source.
    fn kind(&self) -> SourceKind;

    /// Total playable duration; zero until loaded.
    fn duration(&self) -> MediaTime;

    /// Pixel size of the content; zero until loaded.
    fn size(&self) -> Size;

    /// Portion of the source mapped onto the layer, starting at layer-local zero.
    fn selected_time_range(&self) -> TimeRange;

    /// Whether metadata is available.
    fn is_loaded(&self) -> bool;

    /// Load metadata, then report the outcome once through `completion`.
    fn load(&self, completion: LoadCompletion);

    /// Tracks of the given kind; empty until loaded.
    fn tracks(&self, media_type: MediaType) -> Vec<MediaTrack>;

    /// Pixels at layer-local time `at`, for sources that own their pixels.
    fn texture(&self, _at: MediaTime) -> Option<Arc<Texture>> {
        None
    }

    /// Whether the source can contribute video frames.
    fn provides_video(&self) -> bool {
        match self.kind() {
            SourceKind::Image => true,
            SourceKind::Tracks => !self.is_loaded() || !self.tracks(MediaType::Video).is_empty(),
        }
    }
}

/// Still image source. Encoded bytes are decoded with the `image` crate on [`Source::load`].
pub struct ImageSource {
    encoded: Option<Arc<[u8]>>,
    texture: RwLock<Option<Arc<Texture>>>,
    duration: MediaTime,
}

impl fmt::Debug for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageSource")
            .field("encoded_len", &self.encoded.as_ref().map(|b| b.len()))
            .field("loaded", &self.is_loaded())
            .field("duration", &self.duration)
            .finish()
    }
}

impl ImageSource {
    /// Already-resident premultiplied texture.
    pub fn from_texture(texture: Texture) -> LaminaResult<Self> {
        if !texture.is_drawable() {
            return Err(LaminaError::validation("image source texture must be RGBA"));
        }
        Ok(Self {
            encoded: None,
            texture: RwLock::new(Some(Arc::new(texture))),
            duration: DEFAULT_IMAGE_DURATION,
        })
    }

    /// Straight-alpha image, premultiplied on construction.
    pub fn from_rgba_image(image: &image::RgbaImage) -> LaminaResult<Self> {
        Self::from_texture(Texture::from_rgba_image(image)?)
    }

    /// Encoded image bytes (PNG, JPEG, ...), decoded lazily by [`Source::load`].
    pub fn from_encoded(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            encoded: Some(bytes.into()),
            texture: RwLock::new(None),
            duration: DEFAULT_IMAGE_DURATION,
        }
    }

    /// Override the nominal duration.
    pub fn with_duration(mut self, duration: MediaTime) -> Self {
        self.duration = duration;
        self
    }

    fn current(&self) -> Option<Arc<Texture>> {
        self.texture
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn decode(&self) -> LaminaResult<Texture> {
        let bytes = self
            .encoded
            .as_ref()
            .ok_or_else(|| LaminaError::load(IMAGE_SOURCE_DOMAIN, 0, "image source has no data"))?;
        let decoded = image::load_from_memory(bytes)
            .map_err(|e| LaminaError::load(IMAGE_SOURCE_DOMAIN, 1, format!("decode failed: {e}")))?;
        Texture::from_rgba_image(&decoded.to_rgba8())
            .map_err(|e| LaminaError::load(IMAGE_SOURCE_DOMAIN, 2, e.to_string()))
    }
}

impl Source for ImageSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Image
    }

    fn duration(&self) -> MediaTime {
        self.duration
    }

    fn size(&self) -> Size {
        self.current().map(|t| t.size()).unwrap_or_default()
    }

    fn selected_time_range(&self) -> TimeRange {
        TimeRange {
            start: MediaTime::ZERO,
            duration: self.duration,
        }
    }

    fn is_loaded(&self) -> bool {
        self.current().is_some()
    }

    #[tracing::instrument(level = "debug", skip_all)]
    fn load(&self, completion: LoadCompletion) {
        if self.is_loaded() {
            completion(Ok(()));
            return;
        }
        match self.decode() {
            Ok(texture) => {
                tracing::debug!(w = texture.width(), h = texture.height(), "image decoded");
                *self.texture.write().unwrap_or_else(PoisonError::into_inner) =
                    Some(Arc::new(texture));
                completion(Ok(()));
            }
            Err(err) => {
                tracing::warn!(error = %err, "image source failed to load");
                completion(Err(err));
            }
        }
    }

    fn tracks(&self, _media_type: MediaType) -> Vec<MediaTrack> {
        Vec::new()
    }

    fn texture(&self, _at: MediaTime) -> Option<Arc<Texture>> {
        self.current()
    }
}

/// Result of probing a track-bearing asset.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AssetInfo {
    /// Container duration, used when the asset has no video track.
    pub duration: MediaTime,
    /// All tracks.
    pub tracks: Vec<MediaTrack>,
}

/// Host hook that probes an asset's tracks.
pub trait TrackProvider: Send + Sync + fmt::Debug {
    /// Probe the asset. Errors that are not already [`LaminaError::Load`] are tagged with
    /// [`TRACK_SOURCE_DOMAIN`].
    fn load_tracks(&self) -> LaminaResult<AssetInfo>;
}

#[derive(Debug, Default)]
struct TrackState {
    loaded: bool,
    duration: MediaTime,
    size: Size,
    selected: TimeRange,
    tracks: Vec<MediaTrack>,
}

/// Source whose frames are decoded by the host and delivered per frame through a
/// [`crate::FrameSupply`].
#[derive(Debug)]
pub struct TrackSource {
    provider: Arc<dyn TrackProvider>,
    trim: Option<TimeRange>,
    state: RwLock<TrackState>,
}

impl TrackSource {
    /// Unloaded source backed by `provider`.
    pub fn new(provider: Arc<dyn TrackProvider>) -> Self {
        Self {
            provider,
            trim: None,
            state: RwLock::new(TrackState::default()),
        }
    }

    /// Use only `range` of the asset; clipped to the loaded duration.
    pub fn with_trim(mut self, range: TimeRange) -> Self {
        self.trim = Some(range);
        self
    }

    /// Unloaded copy sharing the same provider and trim.
    pub fn fresh_copy(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            trim: self.trim,
            state: RwLock::new(TrackState::default()),
        }
    }

    fn read_state<R>(&self, f: impl FnOnce(&TrackState) -> R) -> R {
        f(&self.state.read().unwrap_or_else(PoisonError::into_inner))
    }
}

impl Source for TrackSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Tracks
    }

    fn duration(&self) -> MediaTime {
        self.read_state(|s| s.duration)
    }

    fn size(&self) -> Size {
        self.read_state(|s| s.size)
    }

    fn selected_time_range(&self) -> TimeRange {
        self.read_state(|s| s.selected)
    }

    fn is_loaded(&self) -> bool {
        self.read_state(|s| s.loaded)
    }

    #[tracing::instrument(level = "debug", skip_all)]
    fn load(&self, completion: LoadCompletion) {
        if self.is_loaded() {
            completion(Ok(()));
            return;
        }
        let info = match self.provider.load_tracks() {
            Ok(info) => info,
            Err(err) => {
                let err = match err {
                    LaminaError::Load { .. } => err,
                    other => LaminaError::load(TRACK_SOURCE_DOMAIN, 1, other.to_string()),
                };
                tracing::warn!(error = %err, "track source failed to load");
                completion(Err(err));
                return;
            }
        };

        let video = info
            .tracks
            .iter()
            .find(|t| t.media_type == MediaType::Video);
        // Never run past the end of the picture.
        let (duration, size) = match video {
            Some(v) => (v.time_range.duration, v.natural_size),
            None => (info.duration, Size::default()),
        };
        let full = TimeRange {
            start: MediaTime::ZERO,
            duration,
        };
        let selected = match self.trim {
            Some(trim) => trim.intersection(full),
            None => full,
        };

        {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            *state = TrackState {
                loaded: true,
                duration,
                size,
                selected,
                tracks: info.tracks,
            };
        }
        tracing::debug!(duration = duration.as_secs_f64(), "track source loaded");
        completion(Ok(()));
    }

    fn tracks(&self, media_type: MediaType) -> Vec<MediaTrack> {
        self.read_state(|s| {
            s.tracks
                .iter()
                .filter(|t| t.media_type == media_type)
                .cloned()
                .collect()
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/composition/source.rs"]
mod tests;
