use crate::foundation::core::{MediaTime, TimeRange};

/// Identifier of a layer inside one compiled timeline, in depth-first insertion order.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct LayerId(pub u32);

/// Identifier of a decode track in the host's multi-track container. Valid ids start at 1.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct TrackId(pub u32);

/// A layer bound to a track over a timeline range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TrackAssignment {
    /// Layer receiving the track.
    pub layer: LayerId,
    /// Assigned track.
    pub track_id: TrackId,
    /// Timeline range the layer occupies on that track.
    pub time_range: TimeRange,
}

/// Empty video track spanning every video layer, so the container covers the whole timeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PlaceholderTrack {
    /// Track id.
    pub track_id: TrackId,
    /// `[min start, max end)` over all video leaves.
    pub time_range: TimeRange,
}

/// Video leaf considered by the allocator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrackLeaf {
    /// Layer id.
    pub layer: LayerId,
    /// Timeline range.
    pub time_range: TimeRange,
    /// Whether the leaf decodes from a track (image and effect leaves do not).
    pub needs_track: bool,
}

/// Track allocation of one timeline.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TrackTable {
    /// Video assignments in allocation order (ascending start).
    pub video: Vec<TrackAssignment>,
    /// Placeholder track, present when any video leaf exists.
    pub placeholder: Option<PlaceholderTrack>,
    /// Audio assignments in allocation order (ascending start); every layer owns its track.
    pub audio: Vec<TrackAssignment>,
}

impl TrackTable {
    /// Video track assigned to `layer`.
    pub fn video_track_of(&self, layer: LayerId) -> Option<TrackId> {
        self.video
            .iter()
            .find(|a| a.layer == layer)
            .map(|a| a.track_id)
    }

    /// Audio track assigned to `layer`.
    pub fn audio_track_of(&self, layer: LayerId) -> Option<TrackId> {
        self.audio
            .iter()
            .find(|a| a.layer == layer)
            .map(|a| a.track_id)
    }

    /// Distinct video track ids, ascending; excludes the placeholder.
    pub fn video_track_ids(&self) -> Vec<TrackId> {
        let mut ids: Vec<TrackId> = self.video.iter().map(|a| a.track_id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Number of distinct tracks of every kind.
    pub fn track_count(&self) -> usize {
        self.video_track_ids().len() + usize::from(self.placeholder.is_some()) + self.audio.len()
    }
}

/// Assign track ids.
///
/// Video leaves are visited by ascending start (stable). A track-bearing leaf reuses the lowest
/// existing video track whose last range ends at or before its start, otherwise a new id is
/// minted. The placeholder and then one id per audio layer, by ascending start (stable), follow.
/// One counter starting at 1 is shared by all kinds.
pub fn allocate_tracks(video_leaves: &[TrackLeaf], audio_layers: &[(LayerId, TimeRange)]) -> TrackTable {
    let mut next_id = 1u32;
    let mut mint = || {
        let id = TrackId(next_id);
        next_id += 1;
        id
    };

    let mut order: Vec<&TrackLeaf> = video_leaves.iter().collect();
    order.sort_by_key(|l| l.time_range.start);

    // (track, end of the last range placed on it), ascending by id.
    let mut open: Vec<(TrackId, MediaTime)> = Vec::new();
    let mut video = Vec::new();
    for leaf in order.iter().filter(|l| l.needs_track) {
        let start = leaf.time_range.start;
        let end = leaf.time_range.end();
        let track_id = match open.iter_mut().find(|(_, last_end)| *last_end <= start) {
            Some((id, last_end)) => {
                *last_end = end;
                *id
            }
            None => {
                let id = mint();
                open.push((id, end));
                id
            }
        };
        video.push(TrackAssignment {
            layer: leaf.layer,
            track_id,
            time_range: leaf.time_range,
        });
    }

    let placeholder = {
        let min_start = video_leaves.iter().map(|l| l.time_range.start).min();
        let max_end = video_leaves.iter().map(|l| l.time_range.end()).max();
        match (min_start, max_end) {
            (Some(start), Some(end)) if start <= end => Some(PlaceholderTrack {
                track_id: mint(),
                time_range: TimeRange {
                    start,
                    duration: end - start,
                },
            }),
            _ => None,
        }
    };

    let mut audio_order: Vec<&(LayerId, TimeRange)> = audio_layers.iter().collect();
    audio_order.sort_by_key(|(_, r)| r.start);
    let audio = audio_order
        .into_iter()
        .map(|&(layer, time_range)| TrackAssignment {
            layer,
            track_id: mint(),
            time_range,
        })
        .collect();

    TrackTable {
        video,
        placeholder,
        audio,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compile/tracks.rs"]
mod tests;
