use bytes::Bytes;
use gtfs_rt_mocker::model::{
    Alert, Entity, Feed, FeedHeader, FeedSummary, Position, TimeRange, TranslatedText,
    TripDescriptor, TripUpdate, Vehicle,
};
use gtfs_rt_mocker::script::EditOp;
use gtfs_rt_mocker::store::MockStore;
use gtfs_rt_mocker::{assembler, cluster, codec, script};

fn source_feed() -> Feed {
    let entities = vec![
        Entity {
            id: "vehicle:1".to_string(),
            vehicle: Some(Vehicle {
                trip: Some(TripDescriptor {
                    trip_id: Some("T1".to_string()),
                    route_id: Some("R1".to_string()),
                    ..Default::default()
                }),
                position: Some(Position {
                    latitude: 48.75,
                    longitude: 2.25,
                    speed: Some(6.5),
                    ..Default::default()
                }),
                timestamp: Some(1_700_000_000),
                ..Default::default()
            }),
            ..Default::default()
        },
        Entity {
            id: "trip:1".to_string(),
            trip_update: Some(TripUpdate {
                trip: TripDescriptor {
                    trip_id: Some("T1".to_string()),
                    ..Default::default()
                },
                delay: Some(60),
                ..Default::default()
            }),
            ..Default::default()
        },
        Entity {
            id: "alert:1".to_string(),
            alert: Some(Alert {
                header_text: Some(TranslatedText::plain("Planned works")),
                cause: Some(9),
                ..Default::default()
            }),
            ..Default::default()
        },
    ];

    Feed {
        header: FeedHeader {
            gtfs_version: "2.0".to_string(),
            incrementality: Some(0),
            timestamp: Some(1_700_000_000),
        },
        summary: FeedSummary::from_entities(&entities),
        entities,
    }
}

#[test]
fn test_full_edit_cycle() {
    // Encode a source feed, then run the whole pipeline an operator would:
    // decode, edit the alerts through a script, reassemble, re-encode, and
    // hand the result to a consumer that decodes it again.
    let wire = codec::encode(&source_feed());
    let feed = codec::decode(&wire).expect("source feed should decode");
    assert_eq!(feed, source_feed());

    let alerts: Vec<Entity> = feed
        .entities
        .iter()
        .filter(|e| e.alert.is_some())
        .cloned()
        .collect();

    let ops: Vec<EditOp> = serde_json::from_str(
        r#"[
            { "op": "update_text", "id": "alert:1", "field": "header", "text": "Works extended" },
            { "op": "set_time_window", "id": "alert:1", "edge": "start", "datetime": "2024-01-01T10:00" },
            { "op": "add_scope", "id": "alert:1" },
            { "op": "update_scope", "id": "alert:1", "index": 0, "field": "route_id", "value": "R1" },
            { "op": "create_alert", "id": "alert:2", "header_text": "Strike", "cause": 4, "effect": 1 }
        ]"#,
    )
    .expect("script should parse");

    let edited = script::apply(&alerts, &ops).expect("script should apply");
    let mock = assembler::assemble_at(&feed, edited, 1_800_000_000);
    let consumed = codec::decode(&codec::encode(&mock)).expect("mock feed should decode");

    // Alerts sort last; vehicles and trip updates are untouched.
    let ids: Vec<_> = consumed.entities.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["vehicle:1", "trip:1", "alert:1", "alert:2"]);
    assert_eq!(consumed.entities[0].vehicle, feed.entities[0].vehicle);
    assert_eq!(consumed.entities[1].trip_update, feed.entities[1].trip_update);

    // Header restamped, incrementality carried through.
    assert_eq!(consumed.header.timestamp, Some(1_800_000_000));
    assert_eq!(consumed.header.incrementality, Some(0));

    let alert = consumed.entities[2].alert.as_ref().unwrap();
    assert_eq!(
        alert.header_text.as_ref().unwrap().first_text(),
        Some("Works extended")
    );
    assert_eq!(
        alert.active_periods,
        vec![TimeRange {
            start: Some(1_704_103_200),
            end: None,
        }]
    );
    assert_eq!(alert.informed_entities.len(), 1);
    assert_eq!(alert.informed_entities[0].route_id.as_deref(), Some("R1"));

    let created = consumed.entities[3].alert.as_ref().unwrap();
    assert_eq!(created.cause, Some(4));
    assert_eq!(created.effect, Some(1));

    assert_eq!(consumed.summary.vehicles, 1);
    assert_eq!(consumed.summary.trip_updates, 1);
    assert_eq!(consumed.summary.alerts, 2);
}

#[test]
fn test_center_estimate_from_decoded_feed() {
    let feed = codec::decode(&codec::encode(&source_feed())).unwrap();
    let positions = cluster::extract_positions(&feed.entities);
    assert_eq!(positions.len(), 1);

    let center = cluster::robust_center(&positions).unwrap();
    assert!((center.lat - 48.75).abs() < 1e-9);
    assert!((center.lon - 2.25).abs() < 1e-9);
}

#[test]
fn test_mock_store_holds_encoded_feeds() {
    let store = MockStore::new();
    let wire = codec::encode(&source_feed());

    let id = store.put(None, Bytes::from(wire.clone()));
    let fetched = store.get(&id).expect("stored feed should be readable");
    let feed = codec::decode(&fetched).expect("stored bytes should decode");
    assert_eq!(feed.summary.alerts, 1);

    assert!(store.remove(&id));
    assert_eq!(store.get(&id), None);
}
