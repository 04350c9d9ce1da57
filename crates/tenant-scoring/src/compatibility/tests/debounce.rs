use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::compatibility::debounce::{DebounceError, DebounceScheduler};

fn counted(runs: &Arc<AtomicUsize>, value: u32) -> impl FnOnce() -> u32 + Send + 'static {
    let runs = Arc::clone(runs);
    move || {
        runs.fetch_add(1, Ordering::SeqCst);
        value
    }
}

#[tokio::test(start_paused = true)]
async fn joined_callers_share_one_run_of_the_latest_job() {
    let scheduler = DebounceScheduler::<&'static str, u32>::new(Duration::from_millis(100));
    let runs = Arc::new(AtomicUsize::new(0));

    let (first, second, third) = tokio::join!(
        scheduler.schedule("app-1", 0, counted(&runs, 1)),
        scheduler.schedule("app-1", 0, counted(&runs, 2)),
        scheduler.schedule("app-1", 0, counted(&runs, 3)),
    );

    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert_eq!(first.expect("first"), 3);
    assert_eq!(second.expect("second"), 3);
    assert_eq!(third.expect("third"), 3);
    assert_eq!(scheduler.pending(), 0);
}

#[tokio::test(start_paused = true)]
async fn distinct_keys_are_computed_independently() {
    let scheduler = DebounceScheduler::<&'static str, u32>::new(Duration::from_millis(100));
    let runs = Arc::new(AtomicUsize::new(0));

    let (left, right) = tokio::join!(
        scheduler.schedule("app-1", 0, counted(&runs, 10)),
        scheduler.schedule("app-2", 0, counted(&runs, 20)),
    );

    assert_eq!(left.expect("left"), 10);
    assert_eq!(right.expect("right"), 20);
    assert_eq!(runs.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn late_joiners_do_not_extend_the_window() {
    let scheduler = Arc::new(DebounceScheduler::<&'static str, u32>::new(
        Duration::from_millis(100),
    ));
    let runs = Arc::new(AtomicUsize::new(0));
    let started = Instant::now();

    let early = {
        let scheduler = Arc::clone(&scheduler);
        let job = counted(&runs, 1);
        tokio::spawn(async move { scheduler.schedule("app-1", 0, job).await })
    };

    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(scheduler.pending(), 1);
    let late = scheduler
        .schedule("app-1", 0, counted(&runs, 2))
        .await
        .expect("late caller resolves");

    assert_eq!(late, 2);
    assert_eq!(early.await.expect("join").expect("early caller resolves"), 2);
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(100));
    assert!(elapsed < Duration::from_millis(160), "window extended to {elapsed:?}");
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn requests_after_the_timer_open_a_new_window() {
    let scheduler = DebounceScheduler::<&'static str, u32>::new(Duration::from_millis(50));
    let runs = Arc::new(AtomicUsize::new(0));

    let first = scheduler.schedule("app-1", 0, counted(&runs, 1)).await;
    let second = scheduler.schedule("app-1", 0, counted(&runs, 2)).await;

    assert_eq!(first.expect("first"), 1);
    assert_eq!(second.expect("second"), 2);
    assert_eq!(runs.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn panicking_job_releases_waiters_with_an_error() {
    let scheduler = DebounceScheduler::<&'static str, u32>::new(Duration::from_millis(10));

    let outcome = scheduler
        .schedule("app-1", 0, || panic!("calculator blew up"))
        .await;

    assert!(matches!(outcome, Err(DebounceError::Abandoned)));
    assert_eq!(scheduler.pending(), 0);
}

#[tokio::test(start_paused = true)]
async fn older_generation_does_not_replace_a_newer_pending_job() {
    let scheduler = DebounceScheduler::<&'static str, u32>::new(Duration::from_millis(100));
    let runs = Arc::new(AtomicUsize::new(0));

    let (current, outdated) = tokio::join!(
        scheduler.schedule("app-1", 2, counted(&runs, 20)),
        scheduler.schedule("app-1", 1, counted(&runs, 10)),
    );

    assert_eq!(current.expect("current"), 20);
    assert_eq!(outdated.expect("outdated"), 20);
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}
