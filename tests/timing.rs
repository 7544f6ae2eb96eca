//! Frame timestamp arithmetic tests.
//!
//! These run without fixtures; they exercise the rational frame⇄timestamp
//! mapping across common frame rates and long frame ranges.

use videoframes::{TIMESTAMP_SCALE, Timestamp, timestamp_for_frame};

const COMMON_RATES: [f64; 5] = [24.0, 25.0, 29.97, 30.0, 60.0];

#[test]
fn timestamps_increase_strictly() {
    for fps in COMMON_RATES {
        let mut previous = -1_f64;
        for frame_index in 0..10_000_u64 {
            let seconds = timestamp_for_frame(frame_index, fps).seconds();
            assert!(
                seconds > previous,
                "timestamp not strictly increasing at frame {frame_index} @ {fps} fps"
            );
            previous = seconds;
        }
    }
}

#[test]
fn timestamps_match_ideal_time_without_drift() {
    for fps in COMMON_RATES {
        for frame_index in [0_u64, 1, 100, 9_999, 100_000, 1_000_000] {
            let seconds = timestamp_for_frame(frame_index, fps).seconds();
            let ideal = frame_index as f64 / fps;
            let tolerance = 1e-9 * ideal.max(1.0);
            assert!(
                (seconds - ideal).abs() <= tolerance,
                "frame {frame_index} @ {fps} fps drifted: got {seconds}, ideal {ideal}"
            );
        }
    }
}

#[test]
fn timestamp_value_is_exact_multiple_of_scale() {
    for fps in COMMON_RATES {
        for frame_index in [0_u64, 1, 441, 12_345] {
            let timestamp = timestamp_for_frame(frame_index, fps);
            assert_eq!(timestamp.value, frame_index as i64 * TIMESTAMP_SCALE);
            assert_eq!(timestamp.value % TIMESTAMP_SCALE, 0);
        }
    }
}

#[test]
fn fractional_rates_keep_precision() {
    // 29.97 fps is the classic drift trap: timescale = 29_970_000 represents
    // the rate exactly, so frame 10_000 lands at 10_000/29.97 s.
    let timestamp = timestamp_for_frame(10_000, 29.97);
    assert_eq!(timestamp.timescale, 29_970_000);

    let expected = 10_000.0 / 29.97;
    assert!((timestamp.seconds() - expected).abs() < 1e-9);
}

#[test]
fn frame_zero_is_time_zero() {
    for fps in COMMON_RATES {
        assert_eq!(timestamp_for_frame(0, fps).seconds(), 0.0);
    }
}

#[test]
fn timestamp_seconds_is_value_over_timescale() {
    let timestamp = Timestamp {
        value: 3_000_000,
        timescale: 30_000_000,
    };
    assert!((timestamp.seconds() - 0.1).abs() < 1e-12);
}
