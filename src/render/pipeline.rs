use rayon::prelude::*;

use crate::{
    compile::instructions::VideoComposition,
    foundation::core::{FrameIndex, FrameRange, MediaTime},
    foundation::error::{LaminaError, LaminaResult},
    render::compositor::{FrameOutcome, FrameRequest, FrameSupply, render_frame},
    render::context::RenderContext,
    render::texture::Texture,
};

/// Look up the instruction for `t` and compose it into `output`.
///
/// Times outside every instruction produce a cleared frame.
pub fn render_frame_at(
    ctx: &RenderContext,
    comp: &VideoComposition,
    t: MediaTime,
    supply: &dyn FrameSupply,
    output: &mut Texture,
) -> FrameOutcome {
    let Some(instruction) = comp.instruction_at(t) else {
        if !output.is_drawable() {
            return FrameOutcome::Aborted;
        }
        output.clear();
        return FrameOutcome::Cleared;
    };
    let request = FrameRequest {
        composition_time: t,
        instruction,
        supply,
    };
    render_frame(ctx, &request, output)
}

#[derive(Clone, Debug)]
/// Threading and chunking controls for multi-frame rendering.
pub struct RenderThreading {
    /// Enable parallel rendering when `true`.
    pub parallel: bool,
    /// Chunk size in frames for batched scheduling.
    pub chunk_size: usize,
    /// Optional explicit worker thread count.
    pub threads: Option<usize>,
}

impl Default for RenderThreading {
    fn default() -> Self {
        Self {
            parallel: false,
            chunk_size: 64,
            threads: None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// Aggregated rendering counters.
pub struct RenderStats {
    /// Total requested frames.
    pub frames_total: u64,
    /// Frames where at least one layer contributed.
    pub frames_composited: u64,
    /// Frames left transparent.
    pub frames_cleared: u64,
    /// Frames whose output could not be drawn into.
    pub frames_aborted: u64,
    /// Layer contributions across all frames.
    pub layers_drawn: u64,
    /// Skipped layers across all frames.
    pub layers_skipped: u64,
}

impl RenderStats {
    fn record(&mut self, outcome: FrameOutcome) {
        self.frames_total += 1;
        match outcome {
            FrameOutcome::Composited { drawn, skipped } => {
                self.frames_composited += 1;
                self.layers_drawn += drawn as u64;
                self.layers_skipped += skipped as u64;
            }
            FrameOutcome::Cleared => self.frames_cleared += 1,
            FrameOutcome::Aborted => self.frames_aborted += 1,
        }
    }
}

/// Render `range` at the composition frame rate into textures detached from the context's pool.
///
/// A frame whose output cannot be leased (for instance when the pool budget is exhausted) is
/// returned as an empty, undrawable texture and counted in [`RenderStats::frames_aborted`]; the
/// remaining frames are unaffected. Only invalid ranges and thread-pool setup failures are errors.
///
/// Hand frames back with [`crate::TexturePool::recycle`] once consumed to reuse their memory.
#[tracing::instrument(level = "debug", skip_all, fields(start = range.start.0, end = range.end.0))]
pub fn render_frames(
    ctx: &RenderContext,
    comp: &VideoComposition,
    range: FrameRange,
    supply: &dyn FrameSupply,
    threading: &RenderThreading,
) -> LaminaResult<(Vec<Texture>, RenderStats)> {
    if range.is_empty() {
        return Err(LaminaError::validation("render range must be non-empty"));
    }
    let len = range.len_frames();
    let mut out = Vec::with_capacity(len.min(4096) as usize);
    let mut stats = RenderStats::default();

    if !threading.parallel {
        for f in range.start.0..range.end.0 {
            let (tex, outcome) = render_one(ctx, comp, FrameIndex(f), supply);
            stats.record(outcome);
            out.push(tex);
        }
        return Ok((out, stats));
    }

    let pool = build_thread_pool(threading.threads)?;
    let chunk_size = normalized_chunk_size(threading.chunk_size);
    let mut chunk_start = range.start.0;
    while chunk_start < range.end.0 {
        let chunk_end = (chunk_start + chunk_size).min(range.end.0);
        let frames: Vec<u64> = (chunk_start..chunk_end).collect();
        let rendered = pool.install(|| {
            frames
                .par_iter()
                .map(|&f| render_one(ctx, comp, FrameIndex(f), supply))
                .collect::<Vec<_>>()
        });
        for (tex, outcome) in rendered {
            stats.record(outcome);
            out.push(tex);
        }
        chunk_start = chunk_end;
    }
    tracing::debug!(
        frames = stats.frames_total,
        aborted = stats.frames_aborted,
        "frame range rendered"
    );
    Ok((out, stats))
}

fn render_one(
    ctx: &RenderContext,
    comp: &VideoComposition,
    frame: FrameIndex,
    supply: &dyn FrameSupply,
) -> (Texture, FrameOutcome) {
    let t = comp.fps.time_of(frame);
    let mut lease = match ctx
        .pool()
        .request_texture(comp.render_size.width, comp.render_size.height)
    {
        Ok(lease) => lease,
        Err(err) => {
            tracing::warn!(frame = frame.0, error = %err, "output lease failed; frame aborted");
            return (Texture::detached_placeholder(), FrameOutcome::Aborted);
        }
    };
    let outcome = render_frame_at(ctx, comp, t, supply, &mut lease);
    (lease.detach(), outcome)
}

fn build_thread_pool(threads: Option<usize>) -> LaminaResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(LaminaError::validation(
            "render threading 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| LaminaError::evaluation(format!("failed to build rayon thread pool: {e}")))
}

fn normalized_chunk_size(chunk_size: usize) -> u64 {
    if chunk_size == 0 {
        1
    } else {
        chunk_size as u64
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/pipeline.rs"]
mod tests;
