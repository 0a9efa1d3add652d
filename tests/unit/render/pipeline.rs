use std::sync::Arc;

use super::*;
use crate::{
    compile::instructions::build_video_composition,
    composition::model::{Composition, RenderLayer},
    composition::source::{ImageSource, Source},
    foundation::core::{Fps, Size, TimeRange},
    render::compositor::NoFrames,
    render::context::RenderSettings,
    render::pool::PoolOpts,
};

fn secs(s: i64) -> MediaTime {
    MediaTime::from_secs(s)
}

fn range(start: i64, end: i64) -> TimeRange {
    TimeRange::from_start_end(secs(start), secs(end)).unwrap()
}

fn solid_image(px: [u8; 4]) -> Arc<dyn Source> {
    Arc::new(ImageSource::from_texture(Texture::solid(4, 4, px).unwrap()).unwrap())
}

// Two frames per second; red on [0, 1), gap on [1, 2), blue on [2, 3).
fn two_clips() -> VideoComposition {
    let mut comp = Composition::new(Size::new(4, 4), Fps::new(2, 1).unwrap());
    comp.layers = vec![
        RenderLayer::from_source(range(0, 1), solid_image([255, 0, 0, 255])).shared(),
        RenderLayer::from_source(range(2, 3), solid_image([0, 0, 255, 255])).shared(),
    ];
    build_video_composition(&comp).unwrap()
}

fn frames(start: u64, end: u64) -> FrameRange {
    FrameRange::new(FrameIndex(start), FrameIndex(end)).unwrap()
}

#[test]
fn render_frame_at_clears_outside_the_timeline() {
    let ctx = RenderContext::default();
    let vc = two_clips();
    let mut out = Texture::solid(4, 4, [1, 2, 3, 255]).unwrap();
    let outcome = render_frame_at(&ctx, &vc, secs(10), &NoFrames, &mut out);
    assert_eq!(outcome, FrameOutcome::Cleared);
    assert!(out.data().iter().all(|&b| b == 0));
}

#[test]
fn render_frame_at_aborts_on_undrawable_output() {
    let ctx = RenderContext::default();
    let vc = two_clips();
    let mut out = Texture::detached_placeholder();
    let outcome = render_frame_at(&ctx, &vc, secs(10), &NoFrames, &mut out);
    assert_eq!(outcome, FrameOutcome::Aborted);
    assert!(!outcome.is_valid());
}

#[test]
fn sequential_render_covers_clips_and_gaps() {
    let ctx = RenderContext::default();
    let vc = two_clips();
    let (out, stats) =
        render_frames(&ctx, &vc, frames(0, 6), &NoFrames, &RenderThreading::default()).unwrap();
    assert_eq!(out.len(), 6);
    assert_eq!(out[0].pixel(1, 1), [255, 0, 0, 255]);
    assert_eq!(out[1].pixel(1, 1), [255, 0, 0, 255]);
    assert_eq!(out[2].pixel(1, 1), [0, 0, 0, 0]);
    assert_eq!(out[4].pixel(1, 1), [0, 0, 255, 255]);
    assert_eq!(stats.frames_total, 6);
    assert_eq!(stats.frames_composited, 4);
    assert_eq!(stats.frames_cleared, 2);
    assert_eq!(stats.frames_aborted, 0);
    assert_eq!(stats.layers_drawn, 4);
}

#[test]
fn parallel_render_matches_sequential() {
    let ctx = RenderContext::default();
    let vc = two_clips();
    let (seq, seq_stats) =
        render_frames(&ctx, &vc, frames(0, 6), &NoFrames, &RenderThreading::default()).unwrap();
    let threading = RenderThreading {
        parallel: true,
        chunk_size: 4,
        threads: Some(2),
    };
    let (par, par_stats) = render_frames(&ctx, &vc, frames(0, 6), &NoFrames, &threading).unwrap();
    assert_eq!(seq_stats, par_stats);
    assert_eq!(seq.len(), par.len());
    for (a, b) in seq.iter().zip(par.iter()) {
        assert_eq!(a.data(), b.data());
    }
}

#[test]
fn rendered_frames_can_be_recycled_into_the_pool() {
    let ctx = RenderContext::default();
    let vc = two_clips();
    let (out, _) =
        render_frames(&ctx, &vc, frames(0, 2), &NoFrames, &RenderThreading::default()).unwrap();
    assert_eq!(ctx.pool().stats().leased_textures, 0);
    for tex in out {
        ctx.pool().recycle(tex);
    }
    let before = ctx.pool().stats().alloc_textures;
    let _ = render_frames(&ctx, &vc, frames(0, 1), &NoFrames, &RenderThreading::default()).unwrap();
    assert_eq!(ctx.pool().stats().alloc_textures, before);
}

fn budgeted_context(frames: usize) -> RenderContext {
    RenderContext::new(RenderSettings {
        pool: PoolOpts {
            max_leased_bytes: Some(frames * 4 * 4 * 4),
            ..PoolOpts::default()
        },
        ..RenderSettings::default()
    })
}

#[test]
fn exhausted_budget_aborts_frames_without_failing_the_range() {
    let ctx = budgeted_context(1);
    let vc = two_clips();
    let held = ctx.pool().request_texture(4, 4).unwrap();
    for threading in [
        RenderThreading::default(),
        RenderThreading {
            parallel: true,
            chunk_size: 2,
            threads: Some(4),
        },
    ] {
        let (out, stats) = render_frames(&ctx, &vc, frames(0, 6), &NoFrames, &threading).unwrap();
        assert_eq!(out.len(), 6);
        assert_eq!(stats.frames_total, 6);
        assert_eq!(stats.frames_aborted, 6);
        assert_eq!(stats.frames_composited, 0);
        assert!(out.iter().all(|t| !t.is_drawable()));
    }
    drop(held);
    assert_eq!(ctx.pool().stats().leased_textures, 0);
}

#[test]
fn parallel_render_under_a_tight_budget_keeps_every_frame_slot() {
    let ctx = budgeted_context(2);
    let vc = two_clips();
    let threading = RenderThreading {
        parallel: true,
        chunk_size: 64,
        threads: Some(8),
    };
    let (out, stats) = render_frames(&ctx, &vc, frames(0, 240), &NoFrames, &threading).unwrap();
    assert_eq!(out.len(), 240);
    assert_eq!(stats.frames_total, 240);
    assert_eq!(
        stats.frames_composited + stats.frames_cleared + stats.frames_aborted,
        240
    );
    let undrawable = out.iter().filter(|t| !t.is_drawable()).count() as u64;
    assert_eq!(undrawable, stats.frames_aborted);
    assert_eq!(ctx.pool().stats().leased_textures, 0);
}

#[test]
fn zero_threads_and_empty_ranges_are_rejected() {
    let ctx = RenderContext::default();
    let vc = two_clips();
    let threading = RenderThreading {
        parallel: true,
        chunk_size: 0,
        threads: Some(0),
    };
    assert!(render_frames(&ctx, &vc, frames(0, 2), &NoFrames, &threading).is_err());
    assert!(
        render_frames(&ctx, &vc, frames(3, 3), &NoFrames, &RenderThreading::default()).is_err()
    );
}

#[test]
fn chunk_size_zero_is_normalized() {
    assert_eq!(normalized_chunk_size(0), 1);
    assert_eq!(normalized_chunk_size(16), 16);
}
