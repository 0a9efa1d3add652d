//! Lamina is a layered frame compositing engine.
//!
//! A [`Composition`] is a tree of [`RenderLayer`]s placed on a rational timeline. Compiling it
//! with [`build_video_composition`] assigns source tracks and cuts the timeline into
//! [`Instruction`]s, each listing the layers active over its interval. The render core then
//! composes any instant into a pooled RGBA8 premultiplied [`Texture`]:
//!
//! - [`render_frame`] composes one instruction at one time
//! - [`render_frame_at`] looks the instruction up first
//! - [`render_frames`] renders a frame range, optionally in parallel
//!
//! Decoded source frames come from the caller through [`FrameSupply`].
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

pub(crate) mod animation;
pub(crate) mod compile;
pub(crate) mod composition;
pub(crate) mod effects;
pub(crate) mod render;
pub(crate) mod transform;

pub use crate::foundation::core::{
    Affine, Fps, FrameIndex, FrameRange, MediaTime, Size, TimeRange, Vec2,
};
pub use crate::foundation::error::{LaminaError, LaminaResult};

pub use crate::animation::ease::Ease;
pub use crate::animation::keyframe::{Animations, InterpMode, Keyframe, KeyframeAnimation};

pub use crate::transform::layer::{
    KEY_CENTER_X, KEY_CENTER_Y, KEY_ROTATION, KEY_ROTATION_X, KEY_ROTATION_Y, KEY_SCALE,
    SourceMapping, Transform, TransformMatrices,
};
pub use crate::transform::orientation::{Orientation, normalize_orientation};

pub use crate::effects::blur::{MAX_BLUR_RADIUS, gaussian_blur};
pub use crate::effects::chain::run_effect_chain;
pub use crate::effects::ops::{
    KEY_BRIGHTNESS, KEY_INTENSITY, KEY_RADIUS, KEY_SATURATION, KEY_SIGMA, LOOKUP_TABLE_SIZE,
    Operation, OperationKind, identity_lookup_table,
};

pub use crate::composition::dsl::CompositionBuilder;
pub use crate::composition::model::{
    Composition, KEY_BLEND_OPACITY, LayerContent, LayerState, RenderLayer,
};
pub use crate::composition::source::{
    AssetInfo, DEFAULT_IMAGE_DURATION, IMAGE_SOURCE_DOMAIN, ImageSource, LoadCompletion,
    MediaTrack, MediaType, Source, SourceKind, TRACK_SOURCE_DOMAIN, TrackProvider, TrackSource,
};

pub use crate::compile::instructions::{
    Instruction, InstructionSummary, LayerSummary, VideoComposition, VideoLayerKind,
    VideoRenderLayer, build_instructions, build_video_composition,
};
pub use crate::compile::tracks::{
    LayerId, PlaceholderTrack, TrackAssignment, TrackId, TrackLeaf, TrackTable, allocate_tracks,
};

pub use crate::render::blend::{BlendMode, BlendParams, blend, blend_pixel, over};
pub use crate::render::color::{
    BiPlanarFrame, COLOR_MATRIX_FULL_RANGE, COLOR_MATRIX_VIDEO_RANGE, ColorRange, PixelBuffer,
    convert_to_rgba, ycbcr_to_rgb,
};
pub use crate::render::compositor::{
    FrameOutcome, FrameQuery, FrameRequest, FrameSupply, NoFrames, render_frame,
};
pub use crate::render::context::{RenderContext, RenderSettings};
pub use crate::render::pipeline::{RenderStats, RenderThreading, render_frame_at, render_frames};
pub use crate::render::pool::{PoolOpts, PoolStats, TextureLease, TexturePool};
pub use crate::render::texture::{PixelFormat, SamplingMode, Texture};
