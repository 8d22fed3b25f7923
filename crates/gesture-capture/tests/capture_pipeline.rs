//! End-to-end tests for the capture pipeline.
//!
//! Taps → dispatcher → drain task → sink, with an in-memory sink standing in
//! for the log/CSV backends and a mock sensor registrar.

use std::sync::Arc;
use std::time::Duration;

use gesture_capture::application::navigation::{NavigationHook, Screen};
use gesture_capture::application::sensor_tap::{CaptureError, SensorRegistrar};
use gesture_capture::application::sink::RecordKind;
use gesture_capture::infrastructure::sinks::RecordingSink;
use gesture_capture::{CapturePipeline, PipelineOptions};
use gesture_core::domain::raw::{action_code, key_action, sensor_type};
use gesture_core::{
    CaptureAction, RawKeyEvent, RawPointerEvent, SensorKind, SessionContext, SessionId,
    SurfaceKind, UserId,
};
use mockall::mock;

mock! {
    Registrar {}
    impl SensorRegistrar for Registrar {
        fn register(&self, kinds: &[SensorKind]) -> Result<(), CaptureError>;
        fn unregister(&self);
    }
}

const WAIT: Duration = Duration::from_secs(2);

fn permissive_registrar() -> Arc<MockRegistrar> {
    let mut registrar = MockRegistrar::new();
    registrar.expect_register().returning(|_| Ok(()));
    registrar.expect_unregister().return_const(());
    Arc::new(registrar)
}

fn pipeline_with(
    session: Arc<SessionContext>,
    options: PipelineOptions,
) -> (CapturePipeline, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::new());
    let pipeline = CapturePipeline::new(session, sink.clone(), options);
    (pipeline, sink)
}

// ── Pointer capture ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_single_down_event_yields_one_matching_record() {
    // Arrange
    let session = Arc::new(SessionContext::new());
    session.adopt_session(UserId::from("u1"), SessionId::from("s1"));
    let (pipeline, sink) = pipeline_with(session, PipelineOptions::default());
    pipeline.start().unwrap();
    let tap = pipeline.pointer_tap(SurfaceKind::Swipe);

    // Act
    tap.on_event(&RawPointerEvent::new(action_code::DOWN, 10.5, 20.0, 0.8, 0.05, 1000));
    assert!(sink.wait_for_len(1, WAIT).await, "record never reached the sink");
    pipeline.shutdown().await;

    // Assert
    let records = sink.records();
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.kind, RecordKind::Pointer);
    assert_eq!(record.event_type, "DOWN");
    assert_eq!(record.x, Some(10.5));
    assert_eq!(record.y, Some(20.0));
    assert_eq!(record.pressure, Some(0.8));
    assert_eq!(record.timestamp, 1000);
    assert_eq!(record.user_id, "u1");
    assert_eq!(record.session_id, "s1");
}

#[tokio::test]
async fn test_records_arrive_in_event_order_per_producer() {
    let session = Arc::new(SessionContext::new());
    let (pipeline, sink) = pipeline_with(session, PipelineOptions::default());
    pipeline.start().unwrap();
    let tap = pipeline.pointer_tap(SurfaceKind::TextEntry);

    for ts in 0..50 {
        tap.on_event(&RawPointerEvent::new(action_code::MOVE, ts as f32, 0.0, 0.5, 0.1, ts));
    }
    assert!(sink.wait_for_len(50, WAIT).await);
    pipeline.shutdown().await;

    let timestamps: Vec<_> = sink.records().iter().map(|r| r.timestamp).collect();
    assert_eq!(timestamps, (0..50).collect::<Vec<i64>>());
}

#[tokio::test]
async fn test_session_change_mid_stream_is_reflected_per_sample() {
    // Arrange
    let session = Arc::new(SessionContext::new());
    let (pipeline, sink) = pipeline_with(Arc::clone(&session), PipelineOptions::default());
    pipeline.start().unwrap();
    let keys = pipeline.key_tap();
    let key = |ts| RawKeyEvent {
        action: Some(key_action::DOWN),
        key_code: Some(30),
        event_time_ms: Some(ts),
    };

    // Act
    let first = session.login(UserId::from("alice"));
    keys.on_key(&key(1));
    session.logout();
    keys.on_key(&key(2));
    assert!(sink.wait_for_len(2, WAIT).await);
    pipeline.shutdown().await;

    // Assert
    let records = sink.records();
    assert_eq!(records[0].user_id, "alice");
    assert_eq!(records[0].session_id, first.as_str());
    assert_eq!(records[1].user_id, "");
    assert_eq!(records[1].session_id, "");
}

#[tokio::test]
async fn test_strict_session_drops_samples_without_session() {
    let session = Arc::new(SessionContext::new());
    let options = PipelineOptions {
        strict_session: true,
        ..PipelineOptions::default()
    };
    let (pipeline, sink) = pipeline_with(Arc::clone(&session), options);
    pipeline.start().unwrap();
    let tap = pipeline.pointer_tap(SurfaceKind::Swipe);

    tap.on_event(&RawPointerEvent::new(action_code::DOWN, 1.0, 1.0, 1.0, 1.0, 1));
    session.login(UserId::from("bob"));
    tap.on_event(&RawPointerEvent::new(action_code::UP, 1.0, 1.0, 1.0, 1.0, 2));
    assert!(sink.wait_for_len(1, WAIT).await);
    pipeline.shutdown().await;

    let records = sink.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].event_type, "UP");
    assert_eq!(pipeline.stats().enqueued, 1);
}

// ── Sensor capture ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_inactive_sensor_tap_yields_no_records() {
    // Arrange
    let session = Arc::new(SessionContext::new());
    let (pipeline, sink) = pipeline_with(session, PipelineOptions::default());
    pipeline.start().unwrap();
    let mut registrar = MockRegistrar::new();
    registrar.expect_register().never();
    registrar.expect_unregister().never();
    let tap = pipeline.sensor_tap(Arc::new(registrar));

    // Act
    for ts in 0..5 {
        tap.on_reading(sensor_type::ACCELEROMETER, &[0.0, 9.8, 0.0], ts);
    }
    tokio::time::sleep(Duration::from_millis(20)).await;
    pipeline.shutdown().await;

    // Assert
    assert!(sink.is_empty());
    assert_eq!(pipeline.stats().enqueued, 0);
}

#[tokio::test]
async fn test_active_sensor_tap_records_only_supported_readings() {
    // Arrange
    let session = Arc::new(SessionContext::new());
    session.adopt_session(UserId::from("u1"), SessionId::from("s1"));
    let (pipeline, sink) = pipeline_with(session, PipelineOptions::default());
    pipeline.start().unwrap();
    let tap = pipeline.sensor_tap(permissive_registrar());
    tap.activate().unwrap();

    // Act – three accelerometer readings and one light reading
    tap.on_reading(sensor_type::ACCELEROMETER, &[0.1, 9.7, 0.2], 1_000_000);
    tap.on_reading(sensor_type::ACCELEROMETER, &[0.2, 9.8, 0.1], 2_000_000);
    tap.on_reading(sensor_type::LIGHT, &[300.0], 2_500_000);
    tap.on_reading(sensor_type::ACCELEROMETER, &[0.3, 9.9, 0.0], 3_000_000);
    assert!(sink.wait_for_len(3, WAIT).await);
    tokio::time::sleep(Duration::from_millis(20)).await;
    pipeline.shutdown().await;

    // Assert
    let records = sink.records();
    assert_eq!(records.len(), 3);
    assert!(records.iter().all(|r| r.event_type == "ACCELEROMETER"));
    assert!(records.iter().all(|r| r.kind == RecordKind::Motion));
    let timestamps: Vec<_> = records.iter().map(|r| r.timestamp).collect();
    assert_eq!(timestamps, vec![1_000_000, 2_000_000, 3_000_000]);
}

#[tokio::test]
async fn test_navigation_gates_sensor_capture_and_tags_action() {
    // Arrange
    let session = Arc::new(SessionContext::new());
    session.login(UserId::from("u1"));
    let (pipeline, sink) = pipeline_with(session, PipelineOptions::default());
    pipeline.start().unwrap();
    let tap = Arc::new(pipeline.sensor_tap(permissive_registrar()));
    let hook = NavigationHook::new(tap.clone());

    // Act
    hook.navigate_to(Screen::Home);
    tap.on_reading(sensor_type::GYROSCOPE, &[1.0, 1.0, 1.0], 1);
    hook.navigate_to(Screen::PixMoney);
    tap.on_reading(sensor_type::GYROSCOPE, &[2.0, 2.0, 2.0], 2);
    hook.navigate_up();
    tap.on_reading(sensor_type::GYROSCOPE, &[3.0, 3.0, 3.0], 3);
    assert!(sink.wait_for_len(1, WAIT).await);
    tokio::time::sleep(Duration::from_millis(20)).await;
    pipeline.shutdown().await;

    // Assert – only the reading taken on the money-entry screen is kept
    let records = sink.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].timestamp, 2);
    assert_eq!(records[0].context, "KEYBOARD_MONEY");
    assert!(!tap.is_active());
}

#[tokio::test]
async fn test_back_navigation_to_capture_screen_resumes_capture() {
    // Arrange
    let session = Arc::new(SessionContext::new());
    session.login(UserId::from("u1"));
    let (pipeline, sink) = pipeline_with(session, PipelineOptions::default());
    pipeline.start().unwrap();
    let tap = Arc::new(pipeline.sensor_tap(permissive_registrar()));
    let hook = NavigationHook::new(tap.clone());

    // Act
    hook.navigate_to(Screen::PixReceiver);
    hook.navigate_to(Screen::Auth);
    tap.on_reading(sensor_type::ACCELEROMETER, &[1.0, 1.0, 1.0], 1);
    hook.navigate_up();
    tap.on_reading(sensor_type::ACCELEROMETER, &[2.0, 2.0, 2.0], 2);
    assert!(sink.wait_for_len(2, WAIT).await);
    pipeline.shutdown().await;

    // Assert
    assert_eq!(hook.current(), Some(Screen::PixReceiver));
    assert!(tap.is_active());
    assert_eq!(tap.action_context(), Some(CaptureAction::KeyboardCpf));
    let contexts: Vec<_> = sink.records().iter().map(|r| r.context).collect();
    assert_eq!(contexts, vec!["KEYBOARD_AUTH", "KEYBOARD_CPF"]);
}
