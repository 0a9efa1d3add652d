use std::sync::Arc;

use smallvec::SmallVec;

use crate::{
    compile::tracks::{LayerId, TrackId, TrackLeaf, TrackTable, allocate_tracks},
    composition::model::{Composition, LayerContent, RenderLayer},
    composition::source::{MediaType, Source, SourceKind},
    foundation::core::{Affine, Fps, MediaTime, Size, TimeRange},
    foundation::error::{LaminaError, LaminaResult},
};

/// Render path of a projected layer.
#[derive(Clone, Debug)]
pub enum VideoLayerKind {
    /// Nested members with absolute ranges, sorted by level.
    Group(Vec<VideoRenderLayer>),
    /// Frames delivered by the host for `track_id`.
    Track {
        /// Allocated decode track.
        track_id: TrackId,
        /// Orientation of stored frames.
        preferred_transform: Affine,
    },
    /// Pixels owned by the source.
    Image(Arc<dyn Source>),
    /// Effect chain over the accumulated output.
    Effect,
}

/// A layer placed on the absolute timeline.
#[derive(Clone, Debug)]
pub struct VideoRenderLayer {
    /// Depth-first insertion id.
    pub id: LayerId,
    /// Authoring layer.
    pub layer: Arc<RenderLayer>,
    /// Absolute, non-empty range.
    pub time_range_in_timeline: TimeRange,
    /// Render path.
    pub kind: VideoLayerKind,
}

impl VideoRenderLayer {
    /// Stacking level of the authoring layer.
    pub fn level(&self) -> i32 {
        self.layer.layer_level
    }

    /// Layer-local time of timeline time `t`.
    pub fn local_time(&self, t: MediaTime) -> MediaTime {
        t - self.time_range_in_timeline.start
    }

    fn for_each_leaf_mut(&mut self, f: &mut impl FnMut(&mut VideoRenderLayer)) {
        match &mut self.kind {
            VideoLayerKind::Group(members) => {
                for m in members {
                    m.for_each_leaf_mut(f);
                }
            }
            _ => f(self),
        }
    }

    fn for_each_leaf(&self, f: &mut impl FnMut(&VideoRenderLayer)) {
        match &self.kind {
            VideoLayerKind::Group(members) => {
                for m in members {
                    m.for_each_leaf(f);
                }
            }
            _ => f(self),
        }
    }
}

/// Timeline interval with a fixed, level-sorted set of active layers.
#[derive(Clone, Debug)]
pub struct Instruction {
    /// Interval covered.
    pub time_range: TimeRange,
    /// Active top-level layers, ascending by level, ties by insertion order.
    pub layers: SmallVec<[Arc<VideoRenderLayer>; 4]>,
}

/// Serializable view of one instruction.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct InstructionSummary {
    /// Interval covered.
    pub time_range: TimeRange,
    /// Active layers, in render order.
    pub layers: Vec<LayerSummary>,
}

/// Serializable view of one projected layer.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LayerSummary {
    /// Layer id.
    pub id: LayerId,
    /// Optional label.
    pub name: Option<String>,
    /// Stacking level.
    pub level: i32,
    /// `"group"`, `"track"`, `"image"` or `"effect"`.
    pub kind: String,
    /// Decode track, for track layers.
    pub track_id: Option<TrackId>,
    /// Absolute range.
    pub time_range: TimeRange,
    /// Group members.
    pub members: Vec<LayerSummary>,
}

impl LayerSummary {
    fn of(layer: &VideoRenderLayer) -> Self {
        let (kind, track_id, members) = match &layer.kind {
            VideoLayerKind::Group(m) => ("group", None, m.iter().map(Self::of).collect()),
            VideoLayerKind::Track { track_id, .. } => ("track", Some(*track_id), Vec::new()),
            VideoLayerKind::Image(_) => ("image", None, Vec::new()),
            VideoLayerKind::Effect => ("effect", None, Vec::new()),
        };
        Self {
            id: layer.id,
            name: layer.layer.name.clone(),
            level: layer.level(),
            kind: kind.to_owned(),
            track_id,
            time_range: layer.time_range_in_timeline,
            members,
        }
    }
}

impl Instruction {
    /// Serializable view.
    pub fn summary(&self) -> InstructionSummary {
        InstructionSummary {
            time_range: self.time_range,
            layers: self.layers.iter().map(|l| LayerSummary::of(l)).collect(),
        }
    }
}

/// Compiled timeline.
#[derive(Clone, Debug)]
pub struct VideoComposition {
    /// Output frame size.
    pub render_size: Size,
    /// Output frame rate.
    pub fps: Fps,
    /// End of the last video layer.
    pub duration: MediaTime,
    /// Contiguous instructions covering `[0, duration)`.
    pub instructions: Vec<Instruction>,
    /// Track allocation.
    pub tracks: TrackTable,
    /// Projected top-level layers in insertion order.
    pub layers: Vec<Arc<VideoRenderLayer>>,
}

impl VideoComposition {
    /// Instruction whose interval contains `t`.
    pub fn instruction_at(&self, t: MediaTime) -> Option<&Instruction> {
        if t.is_negative() || t >= self.duration {
            return None;
        }
        let idx = self
            .instructions
            .partition_point(|i| i.time_range.end() <= t);
        self.instructions
            .get(idx)
            .filter(|i| i.time_range.contains(t))
    }

    /// Serializable view of every instruction.
    pub fn summaries(&self) -> Vec<InstructionSummary> {
        self.instructions.iter().map(Instruction::summary).collect()
    }

    /// Instructions and track table as pretty JSON.
    pub fn to_json(&self) -> LaminaResult<String> {
        let doc = serde_json::json!({
            "render_size": self.render_size,
            "fps": self.fps,
            "duration": self.duration,
            "instructions": self.summaries(),
            "tracks": self.tracks,
        });
        serde_json::to_string_pretty(&doc).map_err(|e| LaminaError::Other(e.into()))
    }
}

#[derive(Default)]
struct Projection {
    next_id: u32,
    audio: Vec<(LayerId, TimeRange)>,
}

impl Projection {
    fn next_id(&mut self) -> LayerId {
        let id = LayerId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Project `layer` placed at absolute `range`; `None` when it cannot contribute video.
    fn project(&mut self, layer: &Arc<RenderLayer>, range: TimeRange) -> Option<VideoRenderLayer> {
        let id = self.next_id();
        let kind = match &layer.content {
            LayerContent::Effect => Some(VideoLayerKind::Effect),
            LayerContent::Source(source) => {
                if source.is_loaded() && !source.tracks(MediaType::Audio).is_empty() {
                    self.audio.push((id, range));
                }
                match (source.kind(), source.provides_video()) {
                    (_, false) => None,
                    (SourceKind::Image, true) => Some(VideoLayerKind::Image(Arc::clone(source))),
                    (SourceKind::Tracks, true) => Some(VideoLayerKind::Track {
                        track_id: TrackId(0),
                        preferred_transform: source
                            .tracks(MediaType::Video)
                            .first()
                            .map(|t| t.preferred_transform)
                            .unwrap_or(Affine::IDENTITY),
                    }),
                }
            }
            LayerContent::Group(members) => {
                let mut projected = Vec::with_capacity(members.len());
                for m in members {
                    let member_range = m.time_range.shifted(range.start).intersection(range);
                    if member_range.is_empty() {
                        // Keep ids stable for everything below the dropped member.
                        self.skip_ids(m);
                        continue;
                    }
                    if let Some(p) = self.project(m, member_range) {
                        projected.push(p);
                    }
                }
                projected.sort_by_key(|p| p.level());
                if projected.is_empty() {
                    None
                } else {
                    Some(VideoLayerKind::Group(projected))
                }
            }
        }?;
        Some(VideoRenderLayer {
            id,
            layer: Arc::clone(layer),
            time_range_in_timeline: range,
            kind,
        })
    }

    fn skip_ids(&mut self, layer: &RenderLayer) {
        self.next_id += 1;
        if let LayerContent::Group(members) = &layer.content {
            for m in members {
                self.skip_ids(m);
            }
        }
    }
}

/// Project, allocate tracks and slice the timeline into instructions.
#[tracing::instrument(level = "debug", skip_all, fields(layers = comp.layers.len()))]
pub fn build_video_composition(comp: &Composition) -> LaminaResult<VideoComposition> {
    comp.validate()?;

    let mut projection = Projection::default();
    let mut layers: Vec<VideoRenderLayer> = Vec::with_capacity(comp.layers.len());
    for layer in &comp.layers {
        match projection.project(layer, layer.time_range) {
            Some(p) => layers.push(p),
            None => tracing::debug!(layer = layer.label(), "layer has no video, not projected"),
        }
    }

    let mut leaves = Vec::new();
    for l in &layers {
        l.for_each_leaf(&mut |leaf| {
            leaves.push(TrackLeaf {
                layer: leaf.id,
                time_range: leaf.time_range_in_timeline,
                needs_track: matches!(leaf.kind, VideoLayerKind::Track { .. }),
            });
        });
    }
    let tracks = allocate_tracks(&leaves, &projection.audio);
    for l in &mut layers {
        l.for_each_leaf_mut(&mut |leaf| {
            if let VideoLayerKind::Track { track_id, .. } = &mut leaf.kind
                && let Some(id) = tracks.video_track_of(leaf.id)
            {
                *track_id = id;
            }
        });
    }

    let layers: Vec<Arc<VideoRenderLayer>> = layers.into_iter().map(Arc::new).collect();
    let instructions = build_instructions(&layers)?;
    let duration = layers
        .iter()
        .map(|l| l.time_range_in_timeline.end())
        .max()
        .unwrap_or(MediaTime::ZERO);

    tracing::debug!(
        instructions = instructions.len(),
        tracks = tracks.track_count(),
        "video composition built"
    );
    Ok(VideoComposition {
        render_size: comp.render_size,
        fps: comp.fps,
        duration,
        instructions,
        tracks,
        layers,
    })
}

/// Slice `[0, max end)` at every layer boundary and collect the active set of each interval.
pub fn build_instructions(layers: &[Arc<VideoRenderLayer>]) -> LaminaResult<Vec<Instruction>> {
    let mut bounds: Vec<MediaTime> = Vec::with_capacity(layers.len() * 2 + 1);
    bounds.push(MediaTime::ZERO);
    for l in layers {
        bounds.push(l.time_range_in_timeline.start);
        bounds.push(l.time_range_in_timeline.end());
    }
    bounds.sort();
    bounds.dedup();

    let mut out = Vec::with_capacity(bounds.len().saturating_sub(1));
    for pair in bounds.windows(2) {
        let time_range = TimeRange::from_start_end(pair[0], pair[1])?;
        if time_range.is_empty() {
            continue;
        }
        let mut active: SmallVec<[Arc<VideoRenderLayer>; 4]> = layers
            .iter()
            .filter(|l| l.time_range_in_timeline.intersects(time_range))
            .cloned()
            .collect();
        active.sort_by_key(|l| l.level());
        out.push(Instruction { time_range, layers: active });
    }
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/compile/instructions.rs"]
mod tests;
