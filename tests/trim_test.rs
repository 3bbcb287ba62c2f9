use xdf_segment_toolbox::trim::{same_instant, trim, trim_bounds, TrimResult};

fn assert_close(actual: &[f64], expected: &[f64]) {
    assert_eq!(actual.len(), expected.len(), "{:?} vs {:?}", actual, expected);
    for (a, e) in actual.iter().zip(expected) {
        assert!((a - e).abs() < 1e-9, "{:?} vs {:?}", actual, expected);
    }
}

fn assert_bounds(result: &TrimResult, start: f64, end: f64) {
    let first = *result.timestamps.first().expect("non-empty");
    let last = *result.timestamps.last().expect("non-empty");
    assert!((first - start).abs() < 1e-9, "first {} != {}", first, start);
    assert!((last - end).abs() < 1e-9, "last {} != {}", last, end);
    assert!(result.timestamps.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(result.timestamps.len(), result.samples.len());
}

#[test]
fn test_interpolates_missing_boundaries() {
    let result = trim(&[0.0, 1.0, 2.0], &[0.0, 10.0, 20.0], 0.5, 1.5);
    assert_close(&result.timestamps, &[0.5, 1.0, 1.5]);
    assert_close(&result.samples, &[5.0, 10.0, 15.0]);
}

#[test]
fn test_clamps_outside_the_recording() {
    let result = trim(&[0.0, 1.0, 2.0], &[0.0, 10.0, 20.0], -1.0, 3.0);
    assert_close(&result.timestamps, &[-1.0, 0.0, 1.0, 2.0, 3.0]);
    assert_close(&result.samples, &[0.0, 0.0, 10.0, 20.0, 20.0]);
}

#[test]
fn test_boundaries_on_samples_are_not_duplicated() {
    let result = trim(&[0.0, 1.0, 2.0, 3.0], &[0.0, 10.0, 20.0, 30.0], 1.0, 2.0);
    assert_close(&result.timestamps, &[1.0, 2.0]);
    assert_close(&result.samples, &[10.0, 20.0]);
}

#[test]
fn test_window_between_two_samples() {
    let result = trim(&[0.0, 1.0, 2.0], &[0.0, 10.0, 20.0], 1.2, 1.4);
    assert_close(&result.timestamps, &[1.2, 1.4]);
    assert_close(&result.samples, &[12.0, 14.0]);
}

#[test]
fn test_window_entirely_before_the_recording() {
    let result = trim(&[10.0, 11.0], &[5.0, 6.0], 1.0, 2.0);
    assert_close(&result.timestamps, &[1.0, 2.0]);
    assert_close(&result.samples, &[5.0, 5.0]);
}

#[test]
fn test_single_sample_series() {
    let result = trim(&[1.0], &[7.0], 0.0, 2.0);
    assert_close(&result.timestamps, &[0.0, 1.0, 2.0]);
    assert_close(&result.samples, &[7.0, 7.0, 7.0]);
}

#[test]
fn test_boundaries_and_ordering_hold_for_irregular_series() {
    let timestamps = [0.0, 0.013, 0.1, 0.31, 0.32, 0.9, 1.7, 2.05];
    let samples = [1.0, -2.0, 3.5, 0.0, 4.0, 8.0, -1.0, 2.0];
    for (start, end) in [(0.0, 2.05), (0.05, 0.95), (0.31, 0.32), (-0.5, 0.2), (1.0, 5.0)] {
        let result = trim(&timestamps, &samples, start, end);
        assert_bounds(&result, start, end);
    }
}

#[test]
fn test_trimming_twice_changes_nothing() {
    let timestamps: Vec<f64> = (0..50).map(|i| i as f64 * 0.37).collect();
    let samples: Vec<f64> = timestamps.iter().map(|t| (t * 1.3).sin()).collect();

    for (start, end) in [(1.0, 7.5), (-2.0, 3.0), (0.37, 0.74), (17.0, 20.0)] {
        let once = trim(&timestamps, &samples, start, end);
        let twice = trim(&once.timestamps, &once.samples, start, end);
        assert_eq!(once, twice, "window [{}, {}]", start, end);
    }
}

#[test]
fn test_duplicate_timestamps_are_kept() {
    let result = trim(&[0.0, 1.0, 1.0, 2.0], &[0.0, 10.0, 99.0, 20.0], 0.5, 1.5);
    assert_close(&result.timestamps, &[0.5, 1.0, 1.0, 1.5]);
    // 1.5 interpolates between (1.0, 99.0) and (2.0, 20.0)
    assert_close(&result.samples, &[5.0, 10.0, 99.0, 59.5]);
}

#[test]
fn test_unparseable_bounds_pass_through() {
    let timestamps = [0.0, 1.0, 2.0];
    let samples = [0.0, 10.0, 20.0];

    let result = trim_bounds(&timestamps, &samples, "start", "2");
    assert_eq!(result.timestamps, timestamps);
    assert_eq!(result.samples, samples);

    let parsed = trim_bounds(&timestamps, &samples, " 0.5 ", "1.5");
    assert_close(&parsed.samples, &[5.0, 10.0, 15.0]);
}

#[test]
fn test_non_finite_bounds_and_empty_series_pass_through() {
    let result = trim(&[0.0, 1.0], &[1.0, 2.0], f64::NAN, 1.0);
    assert_eq!(result.timestamps, vec![0.0, 1.0]);

    let empty = trim(&[], &[], 0.0, 1.0);
    assert!(empty.is_empty());
}

#[test]
fn test_same_instant_is_relative() {
    assert!(same_instant(1.0, 1.0 + 1e-12));
    assert!(!same_instant(1.0, 1.0 + 1e-6));
    assert!(same_instant(1e6, 1e6 + 1e-4));
    assert!(same_instant(0.0, 1e-10));
}
