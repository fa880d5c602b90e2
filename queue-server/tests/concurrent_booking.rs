//! 并发预约：同一活动的排队号互不重复且连续

use std::collections::BTreeSet;

use queue_server::db::DbService;
use queue_server::db::repository::event;
use queue_server::{Config, ServerState};
use shared::models::{EventCreate, ReservationCreate};

const CONCURRENT_BOOKINGS: i64 = 12;

async fn file_backed_state(dir: &tempfile::TempDir) -> ServerState {
    let config = Config::for_tests(dir.path().to_string_lossy());
    config.ensure_work_dir_structure().unwrap();
    let db_path = config.database_dir().join("queue.db");
    let db = DbService::new(&db_path.to_string_lossy()).await.unwrap();
    ServerState::for_tests(config, db).await.unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_bookings_get_distinct_numbers() {
    let dir = tempfile::tempdir().unwrap();
    let state = file_backed_state(&dir).await;

    let e = event::create(
        &state.pool,
        &EventCreate {
            name: "Launch".into(),
            description: None,
            start_time: Some(1_900_000_000_000),
            end_time: Some(1_900_000_360_000),
        },
        None,
    )
    .await
    .unwrap();

    let mut handles = Vec::new();
    for i in 0..CONCURRENT_BOOKINGS {
        let flow = state.flow.clone();
        let event_id = e.id;
        handles.push(tokio::spawn(async move {
            flow.book(ReservationCreate {
                event_id: Some(event_id),
                name: format!("Guest {i}"),
                surname: None,
            })
            .await
        }));
    }

    let mut numbers = BTreeSet::new();
    for handle in handles {
        let r = handle.await.unwrap().unwrap();
        assert_eq!(r.event_id, e.id);
        assert!(numbers.insert(r.queue_number), "duplicate {}", r.queue_number);
    }

    let expected: BTreeSet<i64> = (1..=CONCURRENT_BOOKINGS).collect();
    assert_eq!(numbers, expected);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_bookings_across_events_are_independent() {
    let dir = tempfile::tempdir().unwrap();
    let state = file_backed_state(&dir).await;

    let mut event_ids = Vec::new();
    for name in ["A", "B"] {
        let e = event::create(
            &state.pool,
            &EventCreate {
                name: name.into(),
                description: None,
                start_time: Some(1_900_000_000_000),
                end_time: Some(1_900_000_360_000),
            },
            None,
        )
        .await
        .unwrap();
        event_ids.push(e.id);
    }

    let mut handles = Vec::new();
    for i in 0..8 {
        let flow = state.flow.clone();
        let event_id = event_ids[i % 2];
        handles.push(tokio::spawn(async move {
            flow.book(ReservationCreate {
                event_id: Some(event_id),
                name: format!("Guest {i}"),
                surname: None,
            })
            .await
        }));
    }

    let mut per_event: [BTreeSet<i64>; 2] = Default::default();
    for handle in handles {
        let r = handle.await.unwrap().unwrap();
        let slot = event_ids.iter().position(|id| *id == r.event_id).unwrap();
        assert!(per_event[slot].insert(r.queue_number));
    }

    for numbers in per_event {
        assert_eq!(numbers, (1..=4).collect::<BTreeSet<i64>>());
    }
}
