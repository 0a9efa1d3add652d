use super::*;
use crate::composition::source::{AssetInfo, ImageSource, MediaTrack, TrackProvider, TrackSource};
use crate::render::texture::Texture;

fn secs(s: i64) -> MediaTime {
    MediaTime::from_secs(s)
}

fn range(start: i64, end: i64) -> TimeRange {
    TimeRange::from_start_end(secs(start), secs(end)).unwrap()
}

fn image() -> Arc<dyn Source> {
    Arc::new(ImageSource::from_texture(Texture::solid(2, 2, [255, 0, 0, 255]).unwrap()).unwrap())
}

#[derive(Debug)]
struct Tracks(Vec<MediaTrack>);

impl TrackProvider for Tracks {
    fn load_tracks(&self) -> LaminaResult<AssetInfo> {
        Ok(AssetInfo {
            duration: secs(10),
            tracks: self.0.clone(),
        })
    }
}

fn loaded_tracks(tracks: Vec<MediaTrack>) -> Arc<dyn Source> {
    let src = TrackSource::new(Arc::new(Tracks(tracks)));
    src.load(Box::new(|r| assert!(r.is_ok())));
    Arc::new(src)
}

fn comp(layers: Vec<RenderLayer>) -> Composition {
    let mut c = Composition::new(Size::new(4, 4), Fps::new(30, 1).unwrap());
    c.layers = layers.into_iter().map(Arc::new).collect();
    c
}

fn ids(instr: &Instruction) -> Vec<u32> {
    instr.layers.iter().map(|l| l.id.0).collect()
}

#[test]
fn single_layer_yields_one_instruction() {
    let vc = build_video_composition(&comp(vec![RenderLayer::from_source(range(0, 5), image())]))
        .unwrap();
    assert_eq!(vc.instructions.len(), 1);
    assert_eq!(vc.instructions[0].time_range, range(0, 5));
    assert_eq!(ids(&vc.instructions[0]), vec![0]);
    assert_eq!(vc.duration, secs(5));
}

#[test]
fn overlapping_layer_splits_timeline_in_three() {
    let vc = build_video_composition(&comp(vec![
        RenderLayer::from_source(range(0, 10), image()).level(0),
        RenderLayer::from_source(range(4, 6), image()).level(1),
    ]))
    .unwrap();
    let got: Vec<_> = vc
        .instructions
        .iter()
        .map(|i| (i.time_range, ids(i)))
        .collect();
    assert_eq!(
        got,
        vec![
            (range(0, 4), vec![0]),
            (range(4, 6), vec![0, 1]),
            (range(6, 10), vec![0]),
        ]
    );
}

#[test]
fn leading_gap_is_covered_by_an_empty_instruction() {
    let vc = build_video_composition(&comp(vec![RenderLayer::effect(range(2, 4))])).unwrap();
    assert_eq!(vc.instructions.len(), 2);
    assert!(vc.instructions[0].layers.is_empty());
    assert_eq!(vc.instructions[0].time_range, range(0, 2));
}

#[test]
fn level_ties_keep_insertion_order() {
    let vc = build_video_composition(&comp(vec![
        RenderLayer::effect(range(0, 2)).level(3),
        RenderLayer::effect(range(0, 2)).level(1),
        RenderLayer::effect(range(0, 2)).level(3),
        RenderLayer::effect(range(0, 2)).level(1),
    ]))
    .unwrap();
    assert_eq!(ids(&vc.instructions[0]), vec![1, 3, 0, 2]);
}

#[test]
fn instruction_lookup_is_half_open() {
    let vc = build_video_composition(&comp(vec![
        RenderLayer::effect(range(0, 10)),
        RenderLayer::effect(range(4, 6)).level(1),
    ]))
    .unwrap();
    assert_eq!(vc.instruction_at(secs(0)).unwrap().time_range, range(0, 4));
    assert_eq!(vc.instruction_at(secs(4)).unwrap().time_range, range(4, 6));
    assert_eq!(
        vc.instruction_at(MediaTime::new(5999, 1000).unwrap())
            .unwrap()
            .time_range,
        range(4, 6)
    );
    assert_eq!(vc.instruction_at(secs(6)).unwrap().time_range, range(6, 10));
    assert!(vc.instruction_at(secs(10)).is_none());
    assert!(vc.instruction_at(secs(-1)).is_none());
}

#[test]
fn empty_timeline_has_no_instructions() {
    let vc = build_video_composition(&comp(Vec::new())).unwrap();
    assert!(vc.instructions.is_empty());
    assert!(vc.instruction_at(MediaTime::ZERO).is_none());
    assert_eq!(vc.tracks, TrackTable::default());
}

#[test]
fn group_members_are_offset_clipped_and_sorted() {
    let members = vec![
        RenderLayer::from_source(range(0, 2), image()).level(5).shared(),
        RenderLayer::from_source(range(1, 9), image()).level(2).shared(),
        RenderLayer::from_source(range(7, 8), image()).shared(),
    ];
    let vc = build_video_composition(&comp(vec![RenderLayer::group(range(3, 8), members)])).unwrap();
    let VideoLayerKind::Group(projected) = &vc.layers[0].kind else {
        panic!("expected group");
    };
    // The third member starts after the group ends and is dropped.
    assert_eq!(projected.len(), 2);
    assert_eq!(projected[0].id, LayerId(2));
    assert_eq!(projected[0].time_range_in_timeline, range(4, 8));
    assert_eq!(projected[1].id, LayerId(1));
    assert_eq!(projected[1].time_range_in_timeline, range(3, 5));
}

#[test]
fn group_without_video_members_is_not_projected() {
    let audio_only = loaded_tracks(vec![MediaTrack::audio(range(0, 10))]);
    let group = RenderLayer::group(
        range(0, 4),
        vec![RenderLayer::from_source(range(0, 4), audio_only).shared()],
    );
    let vc = build_video_composition(&comp(vec![group])).unwrap();
    assert!(vc.layers.is_empty());
    assert_eq!(vc.tracks.audio.len(), 1);
    assert_eq!(vc.tracks.audio[0].layer, LayerId(1));
}

#[test]
fn track_layers_receive_allocated_ids_and_orientation() {
    let rotated = Affine::new([0.0, 1.0, -1.0, 0.0, 4.0, 0.0]);
    let video = loaded_tracks(vec![
        MediaTrack::video(range(0, 10), Size::new(6, 4)).with_preferred_transform(rotated),
        MediaTrack::audio(range(0, 10)),
    ]);
    let vc = build_video_composition(&comp(vec![
        RenderLayer::from_source(range(0, 3), video.clone()),
        RenderLayer::from_source(range(3, 6), video.clone()),
        RenderLayer::from_source(range(2, 5), video),
    ]))
    .unwrap();
    let track_of = |i: usize| match &vc.layers[i].kind {
        VideoLayerKind::Track {
            track_id,
            preferred_transform,
        } => (*track_id, *preferred_transform),
        other => panic!("unexpected {other:?}"),
    };
    assert_eq!(track_of(0).0, TrackId(1));
    assert_eq!(track_of(1).0, TrackId(1));
    assert_eq!(track_of(2).0, TrackId(2));
    assert_eq!(track_of(0).1, rotated);
    assert_eq!(vc.tracks.placeholder.unwrap().track_id, TrackId(3));
    let audio_ids: Vec<_> = vc.tracks.audio.iter().map(|a| a.track_id.0).collect();
    assert_eq!(audio_ids, vec![4, 5, 6]);
}

#[test]
fn unloaded_track_source_is_projected() {
    let unloaded: Arc<dyn Source> = Arc::new(TrackSource::new(Arc::new(Tracks(Vec::new()))));
    let vc = build_video_composition(&comp(vec![RenderLayer::from_source(range(0, 2), unloaded)]))
        .unwrap();
    assert_eq!(vc.layers.len(), 1);
    assert_eq!(vc.tracks.video_track_of(LayerId(0)), Some(TrackId(1)));
}

#[test]
fn invalid_composition_is_rejected() {
    assert!(build_video_composition(&comp(vec![RenderLayer::effect(TimeRange::EMPTY)])).is_err());
}

#[test]
fn json_dump_contains_instructions_and_tracks() {
    let vc = build_video_composition(&comp(vec![
        RenderLayer::from_source(range(0, 2), image()).named("title"),
    ]))
    .unwrap();
    let json: serde_json::Value = serde_json::from_str(&vc.to_json().unwrap()).unwrap();
    assert_eq!(json["instructions"][0]["layers"][0]["name"], "title");
    assert_eq!(json["instructions"][0]["layers"][0]["kind"], "image");
    assert!(json["tracks"]["placeholder"].is_object());
}
