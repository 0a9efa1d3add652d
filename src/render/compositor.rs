use crate::{
    compile::instructions::{Instruction, VideoLayerKind, VideoRenderLayer},
    compile::tracks::TrackId,
    effects::chain::run_effect_chain,
    foundation::core::MediaTime,
    render::blend::{BlendParams, blend},
    render::color::{PixelBuffer, convert_to_rgba},
    render::context::RenderContext,
    render::pool::TextureLease,
    render::texture::Texture,
};

/// What the host is asked for when a track layer needs pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameQuery {
    /// Allocated decode track.
    pub track_id: TrackId,
    /// Timeline time being rendered.
    pub composition_time: MediaTime,
    /// Matching time inside the source asset.
    pub source_time: MediaTime,
}

/// Host hook delivering decoded pixels for track layers.
pub trait FrameSupply: Send + Sync {
    /// Pixels of `query.track_id` at `query.composition_time`, or `None` when the track has no
    /// sample at that instant.
    fn source_frame(&self, query: &FrameQuery) -> Option<PixelBuffer>;
}

/// Supply for timelines without track layers.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoFrames;

impl FrameSupply for NoFrames {
    fn source_frame(&self, _query: &FrameQuery) -> Option<PixelBuffer> {
        None
    }
}

/// One frame to compose.
#[derive(Clone, Copy)]
pub struct FrameRequest<'a> {
    /// Timeline time.
    pub composition_time: MediaTime,
    /// Instruction whose interval contains `composition_time`.
    pub instruction: &'a Instruction,
    /// Pixel supply for track layers.
    pub supply: &'a dyn FrameSupply,
}

/// Result of [`render_frame`]. Rendering never fails with an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    /// At least one layer contributed.
    Composited {
        /// Layers that contributed.
        drawn: usize,
        /// Layers skipped for lack of pixels or resources.
        skipped: usize,
    },
    /// Nothing contributed; the output was cleared.
    Cleared,
    /// The output cannot be drawn into; it was left untouched.
    Aborted,
}

impl FrameOutcome {
    /// Whether the output holds a valid frame (composited or cleared).
    pub fn is_valid(&self) -> bool {
        !matches!(self, Self::Aborted)
    }
}

enum LayerResult {
    Drawn,
    Skipped,
}

struct OutputTarget<'t> {
    texture: &'t mut Texture,
    written: bool,
}

enum SourceTexture<'p> {
    Pooled(TextureLease<'p>),
    Owned(Texture),
}

impl SourceTexture<'_> {
    fn texture(&self) -> &Texture {
        match self {
            Self::Pooled(lease) => &**lease,
            Self::Owned(tex) => tex,
        }
    }

    fn texture_mut(&mut self) -> &mut Texture {
        match self {
            Self::Pooled(lease) => &mut **lease,
            Self::Owned(tex) => tex,
        }
    }
}

/// Compose the active layers of `request` into `output`, back to front.
///
/// Layers without pixels at this instant are skipped. The first contribution overwrites `output`
/// without reading it, so stale pool contents never leak into the frame.
#[tracing::instrument(level = "trace", skip_all, fields(t = request.composition_time.as_secs_f64()))]
pub fn render_frame(ctx: &RenderContext, request: &FrameRequest<'_>, output: &mut Texture) -> FrameOutcome {
    if !output.is_drawable() {
        tracing::warn!(format = ?output.format(), "output texture is not drawable, frame aborted");
        return FrameOutcome::Aborted;
    }

    let t = request.composition_time;
    let mut target = OutputTarget {
        texture: output,
        written: false,
    };
    let (mut drawn, mut skipped) = (0usize, 0usize);
    for layer in &request.instruction.layers {
        if !layer.time_range_in_timeline.contains(t) {
            continue;
        }
        match render_layer(ctx, request, layer, &mut target) {
            LayerResult::Drawn => drawn += 1,
            LayerResult::Skipped => skipped += 1,
        }
    }

    if !target.written {
        target.texture.clear();
        return FrameOutcome::Cleared;
    }
    FrameOutcome::Composited { drawn, skipped }
}

fn render_layer(
    ctx: &RenderContext,
    request: &FrameRequest<'_>,
    layer: &VideoRenderLayer,
    target: &mut OutputTarget<'_>,
) -> LayerResult {
    let t = request.composition_time;
    let local = layer.local_time(t);
    let state = layer.layer.state_at(local);
    let pool = ctx.pool();
    let (w, h) = (target.texture.width(), target.texture.height());

    let mut source = match &layer.kind {
        VideoLayerKind::Effect => {
            if !target.written {
                target.texture.clear();
                target.written = true;
            }
            run_effect_chain(pool, &state.operations, target.texture);
            return LayerResult::Drawn;
        }
        VideoLayerKind::Group(members) => {
            let mut scratch = match pool.request_texture(w, h) {
                Ok(lease) => lease,
                Err(err) => {
                    tracing::warn!(layer = layer.id.0, error = %err, "no scratch texture for group");
                    return LayerResult::Skipped;
                }
            };
            let mut inner = OutputTarget {
                texture: &mut scratch,
                written: false,
            };
            for m in members {
                if m.time_range_in_timeline.contains(t) {
                    render_layer(ctx, request, m, &mut inner);
                }
            }
            if !inner.written {
                tracing::trace!(layer = layer.id.0, "group has no contribution");
                return LayerResult::Skipped;
            }
            SourceTexture::Pooled(scratch)
        }
        VideoLayerKind::Track {
            track_id,
            preferred_transform,
        } => {
            let source_start = layer
                .layer
                .source()
                .map(|s| s.selected_time_range().start)
                .unwrap_or(MediaTime::ZERO);
            let query = FrameQuery {
                track_id: *track_id,
                composition_time: t,
                source_time: source_start + local,
            };
            match request.supply.source_frame(&query) {
                None => {
                    tracing::trace!(layer = layer.id.0, track = track_id.0, "no frame for track");
                    return LayerResult::Skipped;
                }
                Some(PixelBuffer::Packed(tex)) if tex.is_drawable() => SourceTexture::Owned(tex),
                Some(PixelBuffer::Packed(tex)) => {
                    tracing::warn!(layer = layer.id.0, format = ?tex.format(), "packed frame is not RGBA");
                    return LayerResult::Skipped;
                }
                Some(PixelBuffer::BiPlanar(frame)) => {
                    match convert_to_rgba(pool, &frame, *preferred_transform) {
                        Ok(lease) => SourceTexture::Pooled(lease),
                        Err(err) => {
                            tracing::warn!(layer = layer.id.0, error = %err, "frame conversion failed");
                            return LayerResult::Skipped;
                        }
                    }
                }
            }
        }
        VideoLayerKind::Image(image) => {
            let Some(tex) = image.texture(local) else {
                tracing::trace!(layer = layer.id.0, "image source has no texture");
                return LayerResult::Skipped;
            };
            let mut lease = match pool.request_texture(tex.width(), tex.height()) {
                Ok(lease) => lease,
                Err(err) => {
                    tracing::warn!(layer = layer.id.0, error = %err, "no texture for image copy");
                    return LayerResult::Skipped;
                }
            };
            if let Err(err) = lease.copy_from(&tex) {
                tracing::warn!(layer = layer.id.0, error = %err, "image copy failed");
                return LayerResult::Skipped;
            }
            SourceTexture::Pooled(lease)
        }
    };

    run_effect_chain(pool, &state.operations, source.texture_mut());

    let params = BlendParams {
        mode: layer.layer.blend_mode,
        opacity: state.blend_opacity,
        transform: state.transform,
        enable_output_read: target.written,
    };
    match blend(
        target.texture,
        source.texture(),
        &params,
        ctx.settings().sampling,
    ) {
        Ok(()) => {
            target.written = true;
            LayerResult::Drawn
        }
        Err(err) => {
            tracing::warn!(layer = layer.id.0, error = %err, "blend failed");
            LayerResult::Skipped
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
