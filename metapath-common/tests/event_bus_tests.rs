//! Event bus behaviour seen by job queue subscribers
//!
//! Covers fan-out to several subscribers, lagging receivers and the
//! end-of-stream signal when every sender is dropped.

use chrono::Utc;
use metapath_common::events::{EventBus, JobEvent};
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use uuid::Uuid;

fn progress(job_id: Uuid, percent: u8) -> JobEvent {
    JobEvent::StageProgress {
        job_id,
        stage: "merge".to_string(),
        percent,
        timestamp: Utc::now(),
    }
}

#[tokio::test]
async fn test_every_subscriber_sees_every_event() {
    let bus = EventBus::new(16);
    let mut queue = bus.subscribe();
    let mut logger = bus.subscribe();
    let job_id = Uuid::new_v4();

    let receivers = bus.emit(progress(job_id, 75)).unwrap();
    assert_eq!(receivers, 2);

    for rx in [&mut queue, &mut logger] {
        let event = rx.recv().await.unwrap();
        assert_eq!(event.job_id(), job_id);
    }
}

#[test]
fn test_late_subscriber_misses_earlier_events() {
    let bus = EventBus::new(16);
    let _early = bus.subscribe();
    bus.emit(progress(Uuid::new_v4(), 25)).unwrap();

    let mut late = bus.subscribe();
    assert!(matches!(late.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn test_slow_subscriber_lags_instead_of_blocking() {
    let bus = EventBus::new(2);
    let mut rx = bus.subscribe();
    let job_id = Uuid::new_v4();

    for percent in [0, 25, 40, 60] {
        bus.emit(progress(job_id, percent)).unwrap();
    }

    assert!(matches!(rx.recv().await, Err(RecvError::Lagged(2))));
    match rx.recv().await.unwrap() {
        JobEvent::StageProgress { percent, .. } => assert_eq!(percent, 40),
        other => panic!("unexpected event {:?}", other),
    }
}

#[tokio::test]
async fn test_stream_closes_when_bus_dropped() {
    let bus = EventBus::new(4);
    let mut rx = bus.subscribe();
    let job_id = Uuid::new_v4();

    bus.emit(JobEvent::JobFailed {
        job_id,
        stage: "validating".to_string(),
        reason: "No valid sequences in batch".to_string(),
        timestamp: Utc::now(),
    })
    .unwrap();
    drop(bus);

    let last = rx.recv().await.unwrap();
    assert!(last.is_terminal());
    assert!(matches!(rx.recv().await, Err(RecvError::Closed)));
}
