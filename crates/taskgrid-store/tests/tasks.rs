use std::sync::Arc;
use std::time::Duration;

use taskgrid_api_models::{CreateTaskRequest, ExecuteTaskResponse, SubtaskStatus, TaskStatus};
use taskgrid_client::StatusCode;
use taskgrid_core::NoticeLevel;
use taskgrid_store::{PollState, StatusBucket, StoreContext, TaskStore, task_progress};
use taskgrid_test_support::fixtures::{subtask, task};
use taskgrid_test_support::{Failure, FakeClock, RecordingNotifier, ScriptedTaskApi, Step};

fn store_with(api: &Arc<ScriptedTaskApi>) -> (TaskStore, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::default());
    let context = StoreContext::new(Arc::new(FakeClock::default()), notifier.clone());
    (TaskStore::new(api.clone(), context), notifier)
}

fn request() -> CreateTaskRequest {
    CreateTaskRequest {
        function_id: "sum".to_string(),
    }
}

#[tokio::test(start_paused = true)]
async fn polling_stops_once_task_succeeds() {
    let api = Arc::new(
        ScriptedTaskApi::default()
            .then_status(Step::ok(task("t-1", TaskStatus::Running)))
            .then_status(Step::ok(task("t-1", TaskStatus::Running)))
            .then_status(Step::ok(task("t-1", TaskStatus::Success))),
    );
    let (store, _) = store_with(&api);

    store.start_polling("t-1", Duration::from_millis(1000));
    tokio::time::sleep(Duration::from_millis(10_000)).await;

    assert_eq!(api.status_calls(), 3);
    assert_eq!(store.poll_state(), PollState::Stopped);
    let current = store.snapshot().current_task;
    assert_eq!(
        current.map(|task| task.task_status),
        Some(TaskStatus::Success)
    );
}

#[tokio::test(start_paused = true)]
async fn terminal_first_fetch_never_schedules() {
    let api = Arc::new(
        ScriptedTaskApi::default().then_status(Step::ok(task("t-1", TaskStatus::Failure))),
    );
    let (store, _) = store_with(&api);

    store.start_polling("t-1", Duration::from_millis(1000));
    tokio::time::sleep(Duration::from_millis(5000)).await;

    assert_eq!(api.status_calls(), 1);
    assert_eq!(store.poll_state(), PollState::Stopped);
}

#[tokio::test(start_paused = true)]
async fn failed_ticks_keep_polling_until_terminal() {
    let api = Arc::new(
        ScriptedTaskApi::default()
            .then_status(Step::ok(task("t-1", TaskStatus::Running)))
            .then_status(Step::server_error())
            .then_status(Step::ok(task("t-1", TaskStatus::Success))),
    );
    let (store, notifier) = store_with(&api);

    store.start_polling("t-1", Duration::from_millis(1000));
    tokio::time::sleep(Duration::from_millis(6000)).await;

    assert_eq!(api.status_calls(), 3);
    assert!(notifier.errors().is_empty());
    assert_eq!(store.poll_state(), PollState::Stopped);
}

#[tokio::test(start_paused = true)]
async fn manual_detail_fetch_is_silent_while_polling() {
    let api = Arc::new(
        ScriptedTaskApi::default()
            .then_status(Step::ok(task("t-1", TaskStatus::Running)))
            .then_status(Step::server_error()),
    );
    let (store, notifier) = store_with(&api);

    store.start_polling("t-1", Duration::from_millis(1000));
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(store.fetch_task_detail("t-1").await.is_err());
    assert!(notifier.errors().is_empty());
    store.stop_polling();

    assert!(store.fetch_task_detail("t-1").await.is_err());
    assert_eq!(notifier.errors().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn switching_tasks_drops_the_previous_detail() {
    let api = Arc::new(
        ScriptedTaskApi::default()
            .then_status(Step::ok(task("t-1", TaskStatus::Running)).after(Duration::from_secs(2)))
            .then_status(Step::ok(task("t-2", TaskStatus::Running)).after(Duration::from_secs(1)))
            .then_status(Step::ok(task("t-2", TaskStatus::Running))),
    );
    let (store, _) = store_with(&api);

    store.start_polling("t-1", Duration::from_millis(1000));
    tokio::time::sleep(Duration::from_millis(1500)).await;
    store.start_polling("t-2", Duration::from_millis(1000));

    tokio::time::sleep(Duration::from_millis(700)).await;
    assert!(store.snapshot().current_task.is_none());

    tokio::time::sleep(Duration::from_millis(800)).await;
    let current = store.snapshot().current_task;
    assert_eq!(current.map(|task| task.task_id), Some("t-2".to_string()));
    store.stop_polling();
}

#[tokio::test(start_paused = true)]
async fn loading_holds_while_list_and_detail_overlap() {
    let api = Arc::new(
        ScriptedTaskApi::default()
            .then_list(Step::ok(vec![task("t-1", TaskStatus::Running)]).after(Duration::from_secs(1)))
            .then_status(Step::ok(task("t-1", TaskStatus::Running)).after(Duration::from_secs(3))),
    );
    let (store, _) = store_with(&api);

    let list = tokio::spawn({
        let store = store.clone();
        async move { store.fetch_tasks(false).await }
    });
    let detail = tokio::spawn({
        let store = store.clone();
        async move { store.fetch_task_detail("t-1").await }
    });

    tokio::time::sleep(Duration::from_millis(2000)).await;
    assert!(store.snapshot().loading);

    assert!(matches!(list.await, Ok(Ok(()))));
    assert!(matches!(detail.await, Ok(Ok(_))));
    assert!(!store.snapshot().loading);
}

#[tokio::test(start_paused = true)]
async fn create_returns_identifier_and_confirms() -> anyhow::Result<()> {
    let api = Arc::new(ScriptedTaskApi::default().then_execute(Step::ok(ExecuteTaskResponse {
        success: true,
        message: String::new(),
        task_id: "t-42".to_string(),
    })));
    let (store, notifier) = store_with(&api);

    let task_id = store.create_task(&request()).await?;

    assert_eq!(task_id, "t-42");
    assert_eq!(api.submitted(), vec!["sum"]);
    assert_eq!(
        notifier.messages(NoticeLevel::Success),
        vec!["Task created successfully"]
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn create_surfaces_backend_message_verbatim() {
    let api = Arc::new(ScriptedTaskApi::default().then_execute(Step::fail(Failure::Rejected(
        StatusCode::BAD_REQUEST,
        Some("unknown function id".to_string()),
    ))));
    let (store, notifier) = store_with(&api);

    assert!(store.create_task(&request()).await.is_err());
    assert_eq!(notifier.errors(), vec!["unknown function id"]);
}

#[tokio::test(start_paused = true)]
async fn create_falls_back_to_generic_message() {
    let api = Arc::new(ScriptedTaskApi::default().then_execute(Step::server_error()));
    let (store, notifier) = store_with(&api);

    assert!(store.create_task(&request()).await.is_err());
    assert_eq!(notifier.errors(), vec!["Task creation failed"]);
}

#[tokio::test(start_paused = true)]
async fn silent_list_fetch_hides_failures() {
    let api = Arc::new(ScriptedTaskApi::default().then_list(Step::server_error()));
    let (store, notifier) = store_with(&api);

    assert!(store.fetch_tasks(true).await.is_err());
    assert!(notifier.notices().is_empty());

    assert!(store.fetch_tasks(false).await.is_err());
    assert_eq!(notifier.errors().len(), 1);
    assert!(!store.snapshot().loading);
}

#[tokio::test(start_paused = true)]
async fn list_polling_outlives_terminal_detail() {
    let api = Arc::new(
        ScriptedTaskApi::default()
            .then_status(Step::ok(task("t-1", TaskStatus::Success)))
            .then_list(Step::ok(vec![task("t-1", TaskStatus::Success)])),
    );
    let (store, _) = store_with(&api);

    store.start_list_polling(Duration::from_millis(1000));
    store.start_polling("t-1", Duration::from_millis(1000));
    tokio::time::sleep(Duration::from_millis(3500)).await;

    assert_eq!(api.status_calls(), 1);
    assert_eq!(api.list_calls(), 4);
    assert_eq!(store.poll_state(), PollState::Stopped);
    assert_eq!(store.list_poll_state(), PollState::Polling);
    assert_eq!(store.snapshot().tasks.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn overview_summarises_the_list() -> anyhow::Result<()> {
    let mut done_today = task("t-1", TaskStatus::Success);
    done_today.completed_at = Some("2026-03-01T10:00:00Z".to_string());
    let mut done_before = task("t-2", TaskStatus::Success);
    done_before.completed_at = Some("2026-02-27T10:00:00Z".to_string());
    let mut running = task("t-3", TaskStatus::Running);
    running.current_round = 2;
    running.max_rounds = 4;
    running.subtask_list = vec![
        subtask("s-1", SubtaskStatus::Computing, "50%"),
        subtask("s-2", SubtaskStatus::Success, "100%"),
    ];

    let api = Arc::new(ScriptedTaskApi::default().then_list(Step::ok(vec![
        done_today,
        done_before,
        running.clone(),
        task("t-4", TaskStatus::Assigned),
    ])));
    let (store, _) = store_with(&api);
    store.fetch_tasks(false).await?;

    let overview = store.overview();
    assert_eq!(overview.running, 1);
    assert_eq!(overview.completed_today, 1);
    assert_eq!(
        overview.distribution,
        vec![
            (StatusBucket::Success, 2),
            (StatusBucket::Running, 1),
            (StatusBucket::Waiting, 1),
        ]
    );
    assert!((task_progress(&running) - 43.75).abs() < 1e-9);
    Ok(())
}
