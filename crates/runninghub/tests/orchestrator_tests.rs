//! End-to-end tests for [`Orchestrator`] against two fake regional servers.

mod common;

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use common::{ok, provider_error, FakeProvider};
use photofx_core::params::RawAssignment;
use photofx_core::submission::JobSpec;
use photofx_core::{RegionRouter, TaskError, TaskId};
use photofx_runninghub::wire::{CANCEL_PATH, OUTPUTS_PATH, RUN_AI_APP_PATH, STATUS_PATH};
use photofx_runninghub::{ClientTimeouts, JobEvent, Orchestrator, PollConfig, PollOverrides};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

const TASK_ID: &str = "1910246754753896450";

struct Harness {
    orchestrator: Orchestrator,
    hongkong: FakeProvider,
    china: FakeProvider,
}

async fn harness() -> Harness {
    let hongkong = FakeProvider::start().await;
    let china = FakeProvider::start().await;
    let router = RegionRouter::new(vec![
        hongkong.region("hongkong", "www.runninghub.ai"),
        china.region("china", "www.runninghub.cn"),
    ])
    .expect("valid region table");

    let poll = PollConfig {
        initial_interval: Duration::from_millis(10),
        max_interval: Duration::from_millis(20),
        jitter: 0.0,
        timeout: Duration::from_secs(5),
        ..PollConfig::default()
    };
    let orchestrator = Orchestrator::new(router, "test-key", ClientTimeouts::default(), poll);

    Harness {
        orchestrator,
        hongkong,
        china,
    }
}

fn script_success(provider: &FakeProvider, outputs: Value) {
    provider
        .reply(RUN_AI_APP_PATH, ok(json!({"taskId": TASK_ID, "taskStatus": "QUEUED"})))
        .reply(STATUS_PATH, ok(json!("QUEUED")))
        .reply(STATUS_PATH, ok(json!("RUNNING")))
        .reply(STATUS_PATH, ok(json!("SUCCESS")))
        .reply(OUTPUTS_PATH, ok(outputs));
}

fn relight_spec() -> JobSpec {
    JobSpec::ai_app(
        "1907581130097192962",
        vec![
            RawAssignment::new("39", "strength", 0.25),
            RawAssignment::new("6", "text", "soft window light"),
        ],
    )
}

// ---------------------------------------------------------------------------
// poll_until_done
// ---------------------------------------------------------------------------

#[tokio::test]
async fn poll_until_done_returns_absolute_urls() {
    let h = harness().await;
    script_success(&h.hongkong, json!(["/out/relit.png"]));
    let mut events = h.orchestrator.subscribe();

    let urls = h
        .orchestrator
        .poll_until_done(
            "hongkong",
            &relight_spec(),
            PollOverrides::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(urls, vec![format!("{}/out/relit.png", h.hongkong.base_url)]);
    assert_eq!(h.hongkong.requests_to(RUN_AI_APP_PATH).len(), 1);
    assert_eq!(h.hongkong.requests_to(STATUS_PATH).len(), 3);
    assert_eq!(h.hongkong.requests_to(OUTPUTS_PATH).len(), 1);
    assert!(h.china.requests().is_empty());

    let first = events.try_recv().expect("submitted event");
    assert_matches!(first, JobEvent::Submitted { target: "ai_app", .. });
    let mut last = first;
    while let Ok(event) = events.try_recv() {
        last = event;
    }
    assert_matches!(last, JobEvent::Completed { .. });
}

#[tokio::test]
async fn china_jobs_go_to_the_china_endpoint() {
    let h = harness().await;
    script_success(&h.china, json!({"image": "out/relit.jpg"}));

    let urls = h
        .orchestrator
        .poll_until_done(
            "china",
            &relight_spec(),
            PollOverrides::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(urls, vec![format!("{}/out/relit.jpg", h.china.base_url)]);
    assert!(h.hongkong.requests().is_empty());
    assert!(h
        .china
        .requests()
        .iter()
        .all(|r| r.host.as_deref() == Some("www.runninghub.cn")));
}

#[tokio::test]
async fn unknown_region_fails_before_any_request() {
    let h = harness().await;

    let err = h
        .orchestrator
        .poll_until_done(
            "mars",
            &relight_spec(),
            PollOverrides::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert_matches!(err, TaskError::UnknownRegion(ref id) if id == "mars");
    assert!(h.hongkong.requests().is_empty());
    assert!(h.china.requests().is_empty());
}

#[tokio::test]
async fn invalid_parameters_fail_before_any_request() {
    let h = harness().await;
    let spec = JobSpec::ai_app(
        "1907581130097192962",
        vec![RawAssignment::new("39", "strength", Value::Null)],
    );

    let err = h.orchestrator.submit_job("hongkong", &spec).await.unwrap_err();

    assert_matches!(err, TaskError::InvalidParameter(_));
    assert!(h.hongkong.requests().is_empty());
}

#[tokio::test]
async fn remote_failure_is_surfaced() {
    let h = harness().await;
    h.hongkong
        .reply(RUN_AI_APP_PATH, ok(json!({"taskId": TASK_ID})))
        .reply(STATUS_PATH, ok(json!("FAILED")))
        .reply(
            OUTPUTS_PATH,
            json!({
                "code": 805,
                "msg": "APIKEY_TASK_STATUS_ERROR",
                "data": {"failedReason": {
                    "node_name": "KSampler",
                    "exception_message": "CUDA out of memory"
                }}
            }),
        );

    let err = h
        .orchestrator
        .poll_until_done(
            "hongkong",
            &relight_spec(),
            PollOverrides::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert_matches!(
        err,
        TaskError::TaskFailed { ref task_id, message: Some(ref m) }
            if task_id.as_str() == TASK_ID && m == "CUDA out of memory (node KSampler)"
    );
    // One outputs call for the failure reason, no result resolution.
    assert_eq!(h.hongkong.requests_to(OUTPUTS_PATH).len(), 1);
}

#[tokio::test]
async fn zero_interval_override_fails_before_submission() {
    let h = harness().await;
    h.hongkong.reply(RUN_AI_APP_PATH, ok(json!({"taskId": TASK_ID})));

    let overrides = PollOverrides {
        initial_interval: Some(Duration::ZERO),
        ..PollOverrides::default()
    };
    let err = h
        .orchestrator
        .poll_until_done("hongkong", &relight_spec(), overrides, &CancellationToken::new())
        .await
        .unwrap_err();

    assert_matches!(err, TaskError::InvalidParameter(_));
    assert!(h.hongkong.requests().is_empty());
}

#[tokio::test]
async fn timeout_override_is_honoured() {
    let h = harness().await;
    h.hongkong
        .reply(RUN_AI_APP_PATH, ok(json!({"taskId": TASK_ID})))
        .reply(STATUS_PATH, ok(json!("RUNNING")));

    let overrides = PollOverrides {
        timeout: Some(Duration::from_millis(60)),
        ..PollOverrides::default()
    };
    let err = h
        .orchestrator
        .poll_until_done("hongkong", &relight_spec(), overrides, &CancellationToken::new())
        .await
        .unwrap_err();

    assert_matches!(err, TaskError::PollingTimeout { .. });
    // The task may still run remotely, so no cancel is sent.
    assert!(h.hongkong.requests_to(CANCEL_PATH).is_empty());
}

// ---------------------------------------------------------------------------
// submit_job / wait_for_task / cancel_job
// ---------------------------------------------------------------------------

#[tokio::test]
async fn submit_then_wait_for_task() {
    let h = harness().await;
    script_success(&h.hongkong, json!([{"fileUrl": "https://cdn.example.com/x.png"}]));

    let submitted = h
        .orchestrator
        .submit_job("hongkong", &relight_spec())
        .await
        .unwrap();
    assert_eq!(submitted.task_id.as_str(), TASK_ID);
    assert_eq!(submitted.region.id(), "hongkong");

    let urls = h
        .orchestrator
        .wait_for_task(
            "hongkong",
            &submitted.task_id,
            PollOverrides::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
    assert_eq!(urls, vec!["https://cdn.example.com/x.png"]);
}

#[tokio::test]
async fn cancel_job_reports_success_and_emits_event() {
    let h = harness().await;
    h.hongkong.reply(CANCEL_PATH, ok(Value::Null));
    let mut events = h.orchestrator.subscribe();

    let cancelled = h
        .orchestrator
        .cancel_job("hongkong", &TaskId::new(TASK_ID))
        .await
        .unwrap();

    assert!(cancelled);
    assert_matches!(
        events.try_recv(),
        Ok(JobEvent::Cancelled { by_caller: true, .. })
    );
}

#[tokio::test]
async fn cancel_job_on_finished_task_is_an_error() {
    let h = harness().await;
    h.hongkong
        .reply(CANCEL_PATH, provider_error(805, "task already finished"));

    let err = h
        .orchestrator
        .cancel_job("hongkong", &TaskId::new(TASK_ID))
        .await
        .unwrap_err();

    assert_matches!(err, TaskError::Provider { code: 805, .. });
}

#[tokio::test]
async fn local_cancellation_cancels_the_remote_task() {
    let h = harness().await;
    h.hongkong
        .reply(RUN_AI_APP_PATH, ok(json!({"taskId": TASK_ID})))
        .reply(STATUS_PATH, ok(json!("RUNNING")))
        .reply(CANCEL_PATH, ok(Value::Null));

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let err = h
        .orchestrator
        .poll_until_done("hongkong", &relight_spec(), PollOverrides::default(), &cancel)
        .await
        .unwrap_err();

    assert_matches!(err, TaskError::OperationCancelled { .. });
    let cancels = h.hongkong.requests_to(CANCEL_PATH);
    assert_eq!(cancels.len(), 1);
    assert_eq!(cancels[0].body["taskId"], json!(TASK_ID));
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[tokio::test]
async fn concurrent_jobs_across_regions() {
    let h = harness().await;
    script_success(&h.hongkong, json!(["/out/hk.png"]));
    script_success(&h.china, json!(["/out/cn.png"]));
    let orchestrator = Arc::new(h.orchestrator);

    let jobs = ["hongkong", "china", "hongkong", "china"].map(|region| {
        let orchestrator = Arc::clone(&orchestrator);
        tokio::spawn(async move {
            orchestrator
                .poll_until_done(
                    region,
                    &relight_spec(),
                    PollOverrides::default(),
                    &CancellationToken::new(),
                )
                .await
        })
    });

    let results = futures::future::join_all(jobs).await;
    for (i, joined) in results.into_iter().enumerate() {
        let urls = joined.expect("task panicked").expect("job failed");
        let expected = if i % 2 == 0 { "/out/hk.png" } else { "/out/cn.png" };
        assert!(urls[0].ends_with(expected), "{urls:?}");
    }
    assert_eq!(h.hongkong.requests_to(RUN_AI_APP_PATH).len(), 2);
    assert_eq!(h.china.requests_to(RUN_AI_APP_PATH).len(), 2);
}
