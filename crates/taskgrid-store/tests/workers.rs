use std::sync::Arc;
use std::time::Duration;

use taskgrid_store::{
    PollState, RESOURCE_WINDOW_CAPACITY, StoreContext, StoreError, WorkerStatus, WorkerStore,
};
use taskgrid_telemetry::Metrics;
use taskgrid_test_support::fixtures::{worker, worker_list};
use taskgrid_test_support::{FakeClock, RecordingNotifier, ScriptedWorkerApi, Step};

fn store_with(api: &Arc<ScriptedWorkerApi>) -> (WorkerStore, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::default());
    let context = StoreContext::new(Arc::new(FakeClock::default()), notifier.clone());
    (WorkerStore::new(api.clone(), context), notifier)
}

fn mixed_fleet() -> Step<taskgrid_api_models::WorkerListResponse> {
    Step::ok(worker_list(vec![
        worker("w-1", 10.0, 10.0, 5),
        worker("w-2", 90.0, 10.0, 5),
        worker("w-3", 10.0, 10.0, 30),
    ]))
}

#[tokio::test(start_paused = true)]
async fn fetch_derives_status_and_counts() -> anyhow::Result<()> {
    let api = Arc::new(ScriptedWorkerApi::default().then(mixed_fleet()));
    let (store, notifier) = store_with(&api);

    store.fetch_workers().await?;

    let state = store.snapshot();
    assert_eq!(state.workers.len(), 3);
    assert_eq!(state.workers[2].status, WorkerStatus::Offline);
    assert!(state.workers[1].busy);
    assert_eq!(
        state.online_count,
        state
            .workers
            .iter()
            .filter(|w| w.status == WorkerStatus::Online)
            .count()
    );
    assert_eq!(state.online_count, 2);
    assert_eq!(state.available_count, 1);
    assert_eq!(state.fleet_history.len(), 1);
    assert!(!state.loading);
    assert!(notifier.notices().is_empty());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn restarting_poll_keeps_a_single_timer() {
    let api = Arc::new(ScriptedWorkerApi::default().then(mixed_fleet()));
    let (store, _) = store_with(&api);

    store.start_polling(Duration::from_millis(1000));
    store.start_polling(Duration::from_millis(1000));
    tokio::time::sleep(Duration::from_millis(3500)).await;

    assert_eq!(api.calls(), 4);
    assert_eq!(store.poll_state(), PollState::Polling);
    store.stop_polling();
    assert_eq!(store.poll_state(), PollState::Stopped);
}

#[tokio::test(start_paused = true)]
async fn scheduled_failures_stay_silent() {
    let api = Arc::new(
        ScriptedWorkerApi::default()
            .then(mixed_fleet())
            .then(Step::server_error()),
    );
    let (store, notifier) = store_with(&api);

    store.start_polling(Duration::from_millis(1000));
    tokio::time::sleep(Duration::from_millis(3500)).await;

    assert_eq!(api.calls(), 4);
    assert!(notifier.errors().is_empty());
    assert_eq!(store.snapshot().workers.len(), 3);
    assert_eq!(store.poll_state(), PollState::Polling);
}

#[tokio::test(start_paused = true)]
async fn first_tick_failure_is_shown_once() {
    let api = Arc::new(ScriptedWorkerApi::default().then(Step::server_error()));
    let (store, notifier) = store_with(&api);

    store.start_polling(Duration::from_millis(1000));
    tokio::time::sleep(Duration::from_millis(2500)).await;

    assert_eq!(api.calls(), 3);
    assert_eq!(notifier.errors(), vec!["Server error, please try again later"]);
}

#[tokio::test(start_paused = true)]
async fn worker_polling_keeps_a_bounded_history() {
    let api = Arc::new(ScriptedWorkerApi::default().then(mixed_fleet()));
    let (store, _) = store_with(&api);

    store.start_worker_polling("client-1", "w-1", Duration::from_millis(1000));
    tokio::time::sleep(Duration::from_millis(25_500)).await;

    let state = store.snapshot();
    assert_eq!(api.calls(), 26);
    assert_eq!(state.resource_history.len(), RESOURCE_WINDOW_CAPACITY);
    assert_eq!(
        state.current_worker.as_ref().map(|w| w.worker_id.as_str()),
        Some("w-1")
    );
    assert!(state.missing_worker.is_none());
}

#[tokio::test(start_paused = true)]
async fn switching_workers_restarts_history() {
    let api = Arc::new(ScriptedWorkerApi::default().then(mixed_fleet()));
    let (store, _) = store_with(&api);

    store.start_worker_polling("client-1", "w-1", Duration::from_millis(1000));
    tokio::time::sleep(Duration::from_millis(4500)).await;
    assert_eq!(store.snapshot().resource_history.len(), 5);

    store.start_worker_polling("client-1", "w-2", Duration::from_millis(1000));
    tokio::time::sleep(Duration::from_millis(500)).await;
    let state = store.snapshot();
    assert_eq!(state.resource_history.len(), 1);
    assert!(state.current_worker.is_some_and(|w| w.worker_id == "w-2"));
}

#[tokio::test(start_paused = true)]
async fn late_sample_from_previous_worker_is_dropped() {
    let api = Arc::new(
        ScriptedWorkerApi::default()
            .then(
                Step::ok(worker_list(vec![
                    worker("w-1", 11.0, 10.0, 5),
                    worker("w-2", 77.0, 10.0, 5),
                ]))
                .after(Duration::from_secs(2)),
            )
            .then(mixed_fleet().after(Duration::from_secs(1)))
            .then(mixed_fleet()),
    );
    let (store, _) = store_with(&api);

    store.start_worker_polling("client-1", "w-1", Duration::from_millis(1000));
    tokio::time::sleep(Duration::from_millis(1500)).await;
    store.start_worker_polling("client-1", "w-2", Duration::from_millis(1000));
    tokio::time::sleep(Duration::from_millis(1500)).await;

    let state = store.snapshot();
    assert!(!state.resource_history.is_empty());
    assert!(
        state
            .resource_history
            .iter()
            .all(|sample| (sample.cpu - 90.0).abs() < f64::EPSILON)
    );
    assert!(state.current_worker.is_some_and(|w| w.worker_id == "w-2"));
}

#[tokio::test(start_paused = true)]
async fn absent_worker_is_reported_not_fatal() {
    let api = Arc::new(ScriptedWorkerApi::default().then(mixed_fleet()));
    let (store, notifier) = store_with(&api);

    store.start_worker_polling("client-1", "w-9", Duration::from_millis(1000));
    tokio::time::sleep(Duration::from_millis(2500)).await;

    let state = store.snapshot();
    assert_eq!(state.missing_worker.as_deref(), Some("w-9"));
    assert!(state.current_worker.is_none());
    assert!(state.resource_history.is_empty());
    assert_eq!(notifier.errors(), vec!["Worker does not exist"]);
    assert_eq!(store.poll_state(), PollState::Polling);
}

#[tokio::test(start_paused = true)]
async fn single_worker_fetch_returns_not_found() {
    let api = Arc::new(ScriptedWorkerApi::default().then(mixed_fleet()));
    let (store, _) = store_with(&api);

    let found = store.fetch_worker_detail("client-1", "w-2").await;
    assert!(found.is_ok_and(|w| w.busy));

    let missing = store.fetch_worker_detail("client-1", "w-404").await;
    assert!(matches!(missing, Err(StoreError::WorkerNotFound { worker_id }) if worker_id == "w-404"));
}

#[tokio::test(start_paused = true)]
async fn late_response_for_older_request_is_discarded() -> anyhow::Result<()> {
    let api = Arc::new(
        ScriptedWorkerApi::default()
            .then(Step::ok(worker_list(vec![worker("old", 10.0, 10.0, 5)])).after(Duration::from_secs(5)))
            .then(Step::ok(worker_list(vec![worker("new", 10.0, 10.0, 5)]))),
    );
    let notifier = Arc::new(RecordingNotifier::default());
    let metrics = Metrics::new()?;
    let context = StoreContext::new(Arc::new(FakeClock::default()), notifier)
        .with_metrics(metrics.clone());
    let store = WorkerStore::new(api.clone(), context);

    let slow = tokio::spawn({
        let store = store.clone();
        async move { store.fetch_workers().await }
    });
    tokio::time::sleep(Duration::from_millis(10)).await;
    store.fetch_workers().await?;
    slow.await??;

    let state = store.snapshot();
    assert_eq!(state.workers.len(), 1);
    assert_eq!(state.workers[0].worker_id, "new");
    assert_eq!(metrics.snapshot().stale_responses_total, 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn stopping_does_not_cancel_an_in_flight_fetch() {
    let api = Arc::new(
        ScriptedWorkerApi::default().then(mixed_fleet().after(Duration::from_secs(5))),
    );
    let (store, _) = store_with(&api);

    store.start_polling(Duration::from_millis(1000));
    tokio::time::sleep(Duration::from_millis(1000)).await;
    store.stop_polling();
    assert!(store.snapshot().workers.is_empty());

    tokio::time::sleep(Duration::from_millis(5000)).await;
    assert_eq!(api.calls(), 1);
    assert_eq!(store.snapshot().workers.len(), 3);
    assert_eq!(store.poll_state(), PollState::Stopped);
}

#[tokio::test(start_paused = true)]
async fn subscribers_see_each_applied_fetch() -> anyhow::Result<()> {
    let api = Arc::new(ScriptedWorkerApi::default().then(mixed_fleet()));
    let (store, _) = store_with(&api);
    let mut updates = store.subscribe();

    store.fetch_workers().await?;
    assert!(updates.has_changed()?);
    assert_eq!(updates.borrow_and_update().online_count, 2);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn loading_holds_until_every_fetch_settles() {
    let api = Arc::new(
        ScriptedWorkerApi::default()
            .then(mixed_fleet().after(Duration::from_secs(2)))
            .then(mixed_fleet().after(Duration::from_secs(5))),
    );
    let (store, _) = store_with(&api);

    let fetches: Vec<_> = (0..2)
        .map(|_| {
            let store = store.clone();
            tokio::spawn(async move { store.fetch_workers().await })
        })
        .collect();

    tokio::time::sleep(Duration::from_millis(3000)).await;
    assert!(store.snapshot().loading);

    for fetch in fetches {
        assert!(matches!(fetch.await, Ok(Ok(()))));
    }
    assert!(!store.snapshot().loading);
}
