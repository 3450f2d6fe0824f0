//! Unit tests for the reading progress model: percentage math, debounced
//! saves, the one-way read flag and deferred position restore.

use std::time::{Duration, Instant};

use rstest::rstest;

use readlater::services::progress_tracker::{
    clamp_percentage, offset_for_percentage, percentage_from_scroll, ProgressTracker,
    TrackerConfig,
};
use readlater::types::progress::{ReadingProgress, ScrollMetrics};

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn tracker() -> ProgressTracker {
    ProgressTracker::new("a1", TrackerConfig::default())
}

#[rstest]
#[case(0.0, 0)]
#[case(500.0, 50)]
#[case(1000.0, 100)]
#[case(1500.0, 100)]
#[case(-20.0, 0)]
fn test_percentage_from_scroll(#[case] offset: f64, #[case] expected: u8) {
    // content 1600, viewport 600 -> max scroll 1000
    let metrics = ScrollMetrics::new(offset, 1600.0, 600.0);
    assert_eq!(percentage_from_scroll(&metrics), expected);
}

#[test]
fn test_content_shorter_than_viewport_counts_as_read_through() {
    let metrics = ScrollMetrics::new(0.0, 300.0, 600.0);
    assert_eq!(percentage_from_scroll(&metrics), 100);
}

#[test]
fn test_offset_for_percentage_uses_same_formula() {
    let metrics = ScrollMetrics::new(0.0, 1600.0, 600.0);
    assert_eq!(offset_for_percentage(40.0, &metrics), 400.0);
    assert_eq!(offset_for_percentage(150.0, &metrics), 1000.0);
    assert_eq!(offset_for_percentage(-5.0, &metrics), 0.0);
}

#[rstest]
#[case(-5.0, 0)]
#[case(0.0, 0)]
#[case(42.4, 42)]
#[case(42.6, 43)]
#[case(150.0, 100)]
#[case(f64::NAN, 0)]
fn test_clamp_percentage(#[case] input: f64, #[case] expected: u8) {
    assert_eq!(clamp_percentage(input), expected);
}

#[test]
fn test_update_progress_clamps() {
    let mut t = tracker();
    let now = Instant::now();
    assert_eq!(t.update_progress(-5.0, now).percentage, 0);
    assert_eq!(t.update_progress(150.0, now).percentage, 100);
}

#[test]
fn test_scroll_burst_produces_one_save_after_quiet_period() {
    let mut t = tracker();
    let t0 = Instant::now();

    for (i, offset) in [100.0, 200.0, 300.0, 400.0].iter().enumerate() {
        let now = t0 + ms(100 * i as u64);
        t.on_scroll(&ScrollMetrics::new(*offset, 1600.0, 600.0), now);
        assert!(t.take_due_save(now).is_none());
    }

    // Last event at t0+300; quiet period ends at t0+800.
    assert!(t.take_due_save(t0 + ms(799)).is_none());
    let save = t.take_due_save(t0 + ms(800)).expect("one save due");
    assert_eq!(save.article_id, "a1");
    assert_eq!(save.percentage, 40);
    assert_eq!(save.offset, 400.0);
    assert!(!save.mark_read);

    assert!(t.take_due_save(t0 + ms(5000)).is_none());
}

#[test]
fn test_live_percentage_updates_immediately() {
    let mut t = tracker();
    let update = t.on_scroll(&ScrollMetrics::new(250.0, 1600.0, 600.0), Instant::now());
    assert_eq!(update.percentage, 25);
    assert_eq!(t.percentage(), 25);
}

#[test]
fn test_read_flag_set_once_above_threshold_and_never_cleared() {
    let mut t = tracker();
    let now = Instant::now();

    let at_90 = t.update_progress(90.0, now);
    assert!(!at_90.is_read, "90 is not above the threshold");

    let at_91 = t.update_progress(91.0, now);
    assert!(at_91.is_read);
    assert!(at_91.became_read);

    let back = t.update_progress(10.0, now);
    assert!(back.is_read);
    assert!(!back.became_read);

    let save = t.flush().unwrap();
    assert!(save.mark_read);
    assert_eq!(save.percentage, 10);
}

#[test]
fn test_flush_writes_pending_save_immediately() {
    let mut t = tracker();
    let now = Instant::now();
    t.update_progress(33.0, now);
    let save = t.flush().expect("pending save");
    assert_eq!(save.percentage, 33);
    assert!(t.flush().is_none());
    assert!(t.take_due_save(now + ms(1000)).is_none());
}

#[test]
fn test_teardown_cancels_pending_save() {
    let mut t = tracker();
    let now = Instant::now();
    t.update_progress(33.0, now);
    t.teardown();
    assert!(t.next_deadline().is_none());
    assert!(t.take_due_save(now + ms(1000)).is_none());
}

#[test]
fn test_restore_waits_for_measurable_layout() {
    let saved = ReadingProgress {
        article_id: "a1".into(),
        offset: 400.0,
        percentage: 40,
        updated_at: 0,
    };
    let mut t = tracker().with_saved(Some(&saved), false);
    assert_eq!(t.pending_restore(), Some(40));

    // Layout not done yet: nothing happens, restore stays pending.
    assert_eq!(t.try_restore(&ScrollMetrics::new(0.0, 0.0, 600.0)), None);
    assert_eq!(t.pending_restore(), Some(40));

    // Content measured at a different height than when saved.
    let offset = t.try_restore(&ScrollMetrics::new(0.0, 2600.0, 600.0));
    assert_eq!(offset, Some(800.0));
    assert_eq!(t.pending_restore(), None);
    assert_eq!(t.try_restore(&ScrollMetrics::new(0.0, 2600.0, 600.0)), None);
}

#[test]
fn test_user_scroll_before_layout_cancels_restore() {
    let saved = ReadingProgress {
        article_id: "a1".into(),
        offset: 400.0,
        percentage: 40,
        updated_at: 0,
    };
    let mut t = tracker().with_saved(Some(&saved), false);
    t.on_scroll(&ScrollMetrics::new(0.0, 1600.0, 600.0), Instant::now());
    assert_eq!(t.pending_restore(), None);
}

#[test]
fn test_custom_threshold_and_delay() {
    let config = TrackerConfig {
        mark_read_threshold: 50,
        save_delay: ms(100),
    };
    let mut t = ProgressTracker::new("a1", config);
    let now = Instant::now();
    assert!(t.update_progress(51.0, now).became_read);
    assert!(t.take_due_save(now + ms(100)).is_some());
}
