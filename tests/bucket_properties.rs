//! Property-based tests for the concurrency window engine.

use chrono::TimeDelta;
use mysql_trace_studio::aggregator::DurationBuckets;
use mysql_trace_studio::parser::Frame;
use mysql_trace_studio::utils::error::OrderingError;
use proptest::prelude::*;

fn frame(ms: i64, stream: u64, fin: bool) -> Frame {
    Frame {
        number: 0,
        time_relative: TimeDelta::milliseconds(ms),
        tcp_stream: stream,
        mysql_command: None,
        tcp_fin: fin,
        tcp_reset: false,
        query: None,
    }
}

/// Frames with non-decreasing elapsed time: (gap ms, connection, close?)
fn ordered_frames() -> impl Strategy<Value = Vec<Frame>> {
    prop::collection::vec((0i64..250, 0u64..6, prop::bool::weighted(0.15)), 1..60).prop_map(
        |steps| {
            let mut elapsed = 0;
            steps
                .into_iter()
                .map(|(gap, stream, fin)| {
                    elapsed += gap;
                    frame(elapsed, stream, fin)
                })
                .collect()
        },
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_bucket_count_matches_last_frame(frames in ordered_frames(), width in 1i64..500) {
        let mut db = DurationBuckets::new(TimeDelta::milliseconds(width)).unwrap();
        db.add_frames(&frames).unwrap();

        let last = frames.last().unwrap().time_relative.num_milliseconds();
        prop_assert_eq!(db.buckets().len() as i64, last / width + 1);
    }

    #[test]
    fn prop_new_at_most_once_and_not_before_first_frame(
        frames in ordered_frames(),
        width in 1i64..500,
    ) {
        let mut db = DurationBuckets::new(TimeDelta::milliseconds(width)).unwrap();
        db.add_frames(&frames).unwrap();

        for stream in 0u64..6 {
            let new_in: Vec<usize> = db
                .buckets()
                .iter()
                .enumerate()
                .filter(|(_, b)| b.is_new(stream))
                .map(|(i, _)| i)
                .collect();
            prop_assert!(new_in.len() <= 1);

            if let Some(&window) = new_in.first() {
                let first = frames.iter().find(|f| f.tcp_stream == stream).unwrap();
                prop_assert!(db.bucket(first.time_relative) <= window);
            }
        }
    }

    #[test]
    fn prop_closed_at_most_once_and_never_open_after(
        frames in ordered_frames(),
        width in 1i64..500,
    ) {
        let mut db = DurationBuckets::new(TimeDelta::milliseconds(width)).unwrap();
        db.add_frames(&frames).unwrap();

        for stream in 0u64..6 {
            let closed_in: Vec<usize> = db
                .buckets()
                .iter()
                .enumerate()
                .filter(|(_, b)| b.is_closed(stream))
                .map(|(i, _)| i)
                .collect();
            prop_assert!(closed_in.len() <= 1);

            if let Some(&window) = closed_in.first() {
                for later in &db.buckets()[window..] {
                    prop_assert!(!later.is_open(stream));
                }
            }
        }
    }

    #[test]
    fn prop_frame_in_past_is_rejected_without_mutation(
        frames in ordered_frames(),
        width in 1i64..100,
    ) {
        let mut db = DurationBuckets::new(TimeDelta::milliseconds(width)).unwrap();
        db.add_frames(&frames).unwrap();
        let last = frames.last().unwrap().time_relative.num_milliseconds();
        prop_assume!(last >= width);

        let before = db.buckets().to_vec();
        let result = db.add_frame(&frame(0, 99, false));
        let is_frame_in_past = matches!(result, Err(OrderingError::FrameInPast { .. }));
        prop_assert!(is_frame_in_past);
        prop_assert_eq!(db.buckets(), before.as_slice());
    }
}
