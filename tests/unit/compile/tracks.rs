use super::*;

fn range(start: i64, end: i64) -> TimeRange {
    TimeRange::from_start_end(MediaTime::from_secs(start), MediaTime::from_secs(end)).unwrap()
}

fn leaf(id: u32, start: i64, end: i64) -> TrackLeaf {
    TrackLeaf {
        layer: LayerId(id),
        time_range: range(start, end),
        needs_track: true,
    }
}

#[test]
fn disjoint_layers_share_a_track() {
    let table = allocate_tracks(&[leaf(0, 0, 3), leaf(1, 5, 8), leaf(2, 2, 6)], &[]);
    let a = table.video_track_of(LayerId(0)).unwrap();
    let b = table.video_track_of(LayerId(1)).unwrap();
    let c = table.video_track_of(LayerId(2)).unwrap();
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(table.video_track_ids(), vec![TrackId(1), TrackId(2)]);
}

#[test]
fn touching_ranges_reuse() {
    let table = allocate_tracks(&[leaf(0, 0, 4), leaf(1, 4, 6)], &[]);
    assert_eq!(table.video_track_of(LayerId(0)), Some(TrackId(1)));
    assert_eq!(table.video_track_of(LayerId(1)), Some(TrackId(1)));
}

#[test]
fn mutually_overlapping_layers_get_distinct_tracks() {
    let leaves: Vec<_> = (0..5).map(|i| leaf(i, i64::from(i), 10)).collect();
    let table = allocate_tracks(&leaves, &[]);
    assert_eq!(table.video_track_ids().len(), 5);
}

#[test]
fn reuse_prefers_lowest_free_track() {
    // Tracks 1 and 2 both free up before the third leaf starts.
    let table = allocate_tracks(&[leaf(0, 0, 2), leaf(1, 1, 3), leaf(2, 5, 6)], &[]);
    assert_eq!(table.video_track_of(LayerId(2)), Some(TrackId(1)));
}

#[test]
fn allocation_follows_start_order_not_insertion_order() {
    let table = allocate_tracks(&[leaf(0, 5, 8), leaf(1, 0, 3)], &[]);
    assert_eq!(table.video_track_of(LayerId(1)), Some(TrackId(1)));
    assert_eq!(table.video_track_of(LayerId(0)), Some(TrackId(1)));
    assert_eq!(table.video[0].layer, LayerId(1));
}

#[test]
fn placeholder_spans_all_leaves_and_follows_video_ids() {
    let image = TrackLeaf {
        needs_track: false,
        ..leaf(9, 1, 12)
    };
    let table = allocate_tracks(&[leaf(0, 2, 4), image, leaf(1, 3, 5)], &[]);
    assert_eq!(table.video_track_of(LayerId(9)), None);
    let ph = table.placeholder.unwrap();
    assert_eq!(ph.track_id, TrackId(3));
    assert_eq!(ph.time_range, range(1, 12));
}

#[test]
fn audio_ids_are_never_reused() {
    let audio = [(LayerId(0), range(0, 2)), (LayerId(1), range(5, 6))];
    let table = allocate_tracks(&[leaf(0, 0, 2)], &audio);
    assert_eq!(table.audio_track_of(LayerId(0)), Some(TrackId(3)));
    assert_eq!(table.audio_track_of(LayerId(1)), Some(TrackId(4)));
    assert_eq!(table.track_count(), 4);
}

#[test]
fn audio_ids_follow_start_order_not_insertion_order() {
    let audio = [
        (LayerId(0), range(5, 6)),
        (LayerId(1), range(0, 1)),
        (LayerId(2), range(0, 3)),
    ];
    let table = allocate_tracks(&[], &audio);
    assert_eq!(table.audio_track_of(LayerId(1)), Some(TrackId(1)));
    assert_eq!(table.audio_track_of(LayerId(2)), Some(TrackId(2)));
    assert_eq!(table.audio_track_of(LayerId(0)), Some(TrackId(3)));
    let starts: Vec<_> = table.audio.iter().map(|a| a.time_range.start).collect();
    assert!(starts.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn empty_input_allocates_nothing() {
    let table = allocate_tracks(&[], &[]);
    assert_eq!(table, TrackTable::default());
    let audio_only = allocate_tracks(&[], &[(LayerId(0), range(0, 1))]);
    assert_eq!(audio_only.audio_track_of(LayerId(0)), Some(TrackId(1)));
}

#[test]
fn table_serializes() {
    let table = allocate_tracks(&[leaf(0, 0, 2)], &[]);
    let json = serde_json::to_value(&table).unwrap();
    assert_eq!(json["video"][0]["track_id"], 1);
    assert_eq!(json["placeholder"]["track_id"], 2);
}
