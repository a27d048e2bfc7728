//! Unit tests for the office cache.

use super::*;
use chrono::{Duration, TimeZone, Utc};
use std::sync::Arc;

fn desk(id: DeskId, status: DeskStatus) -> Desk {
    Desk::new(id, format!("Desk {}", id), format!("D-{:02}", id), status)
}

fn reservation(id: ReservationId, desk: DeskId, start_offset_hours: i64) -> Reservation {
    let base = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
    let start = base + Duration::hours(start_offset_hours);
    Reservation::new(
        id,
        desk,
        start,
        start + Duration::hours(2),
        ReservationStatus::Active,
    )
}

// ============================================================================
// Desks
// ============================================================================

#[test]
fn test_replace_desks_overwrites_previous_contents() {
    let cache = OfficeCache::new();
    cache.replace_desks(vec![desk(1, DeskStatus::Available), desk(2, DeskStatus::Occupied)]);
    cache.replace_desks(vec![desk(3, DeskStatus::Reserved)]);

    assert_eq!(cache.desk_count(), 1);
    assert!(cache.get_desk(1).is_none());
    assert_eq!(cache.get_desk(3).unwrap().status, DeskStatus::Reserved);
}

#[test]
fn test_replace_desks_never_hides_a_kept_desk() {
    let cache = Arc::new(OfficeCache::new());
    cache.replace_desks((1..=50).map(|id| desk(id, DeskStatus::Available)).collect());

    let writer = {
        let cache = Arc::clone(&cache);
        std::thread::spawn(move || {
            for _ in 0..200 {
                cache.replace_desks((1..=50).map(|id| desk(id, DeskStatus::Occupied)).collect());
            }
        })
    };

    // A status patch racing a refresh must always find the desk
    for _ in 0..2000 {
        assert!(cache.get_desk(25).is_some());
        assert!(cache.update_desk_status(25, DeskStatus::Reserved).is_ok());
    }
    writer.join().unwrap();
    assert_eq!(cache.desk_count(), 50);
}

#[test]
fn test_replace_reservations_prunes_stale_and_keeps_fresh() {
    let cache = OfficeCache::new();
    cache.replace_reservations(vec![reservation(1, 1, 0), reservation(2, 1, 3)]);

    let mut updated = reservation(2, 1, 3);
    updated.status = ReservationStatus::Completed;
    cache.replace_reservations(vec![updated, reservation(3, 2, 5)]);

    assert!(cache.get_reservation(1).is_none());
    assert_eq!(
        cache.get_reservation(2).unwrap().status,
        ReservationStatus::Completed
    );
    assert_eq!(cache.reservation_count(), 2);
}

#[test]
fn test_desks_sorted_by_id() {
    let cache = OfficeCache::new();
    cache.upsert_desk(desk(9, DeskStatus::Available));
    cache.upsert_desk(desk(2, DeskStatus::Available));
    cache.upsert_desk(desk(5, DeskStatus::Available));

    let ids: Vec<_> = cache.desks().iter().map(|d| d.id).collect();
    assert_eq!(ids, vec![2, 5, 9]);
}

#[test]
fn test_update_desk_status_known_desk() {
    let cache = OfficeCache::new();
    cache.upsert_desk(desk(4, DeskStatus::Available));

    cache.update_desk_status(4, DeskStatus::Maintenance).unwrap();
    assert_eq!(cache.get_desk(4).unwrap().status, DeskStatus::Maintenance);
}

#[test]
fn test_update_desk_status_unknown_desk_is_not_created() {
    let cache = OfficeCache::new();
    let result = cache.update_desk_status(42, DeskStatus::Occupied);

    assert_eq!(result, Err(CacheError::DeskNotFound(42)));
    assert_eq!(cache.desk_count(), 0);
}

#[test]
fn test_desks_with_status_filters() {
    let cache = OfficeCache::new();
    cache.replace_desks(vec![
        desk(1, DeskStatus::Available),
        desk(2, DeskStatus::Occupied),
        desk(3, DeskStatus::Available),
    ]);

    let available: Vec<_> = cache
        .desks_with_status(DeskStatus::Available)
        .iter()
        .map(|d| d.id)
        .collect();
    assert_eq!(available, vec![1, 3]);
}

#[test]
fn test_selected_desk_follows_status_updates() {
    let cache = OfficeCache::new();
    cache.upsert_desk(desk(1, DeskStatus::Available));
    cache.select_desk(1).unwrap();

    cache.update_desk_status(1, DeskStatus::Occupied).unwrap();
    assert_eq!(cache.selected_desk().unwrap().status, DeskStatus::Occupied);
}

#[test]
fn test_select_unknown_desk_fails() {
    let cache = OfficeCache::new();
    assert_eq!(cache.select_desk(3), Err(CacheError::DeskNotFound(3)));
    assert!(cache.selected_desk().is_none());
}

#[test]
fn test_replace_desks_drops_stale_selection() {
    let cache = OfficeCache::new();
    cache.upsert_desk(desk(1, DeskStatus::Available));
    cache.select_desk(1).unwrap();

    cache.replace_desks(vec![desk(2, DeskStatus::Available)]);
    assert!(cache.selected_desk().is_none());
}

// ============================================================================
// Reservations
// ============================================================================

#[test]
fn test_update_reservation_status_known() {
    let cache = OfficeCache::new();
    cache.upsert_reservation(reservation(10, 1, 0));

    cache
        .update_reservation_status(10, ReservationStatus::Cancelled)
        .unwrap();
    assert_eq!(
        cache.get_reservation(10).unwrap().status,
        ReservationStatus::Cancelled
    );
}

#[test]
fn test_update_reservation_status_unknown_is_not_created() {
    let cache = OfficeCache::new();
    let result = cache.update_reservation_status(10, ReservationStatus::Completed);

    assert_eq!(result, Err(CacheError::ReservationNotFound(10)));
    assert_eq!(cache.reservation_count(), 0);
}

#[test]
fn test_reservations_latest_first() {
    let cache = OfficeCache::new();
    cache.replace_reservations(vec![
        reservation(1, 1, 0),
        reservation(2, 1, 24),
        reservation(3, 1, 48),
    ]);

    let ids: Vec<_> = cache.reservations().iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![3, 2, 1]);
}

#[test]
fn test_upcoming_and_current_reservations() {
    let cache = OfficeCache::new();
    cache.replace_reservations(vec![
        reservation(1, 1, 0),
        reservation(2, 2, 24),
        reservation(3, 3, 48),
    ]);
    cache
        .update_reservation_status(3, ReservationStatus::Cancelled)
        .unwrap();

    let now = Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap();

    let upcoming: Vec<_> = cache
        .upcoming_reservations(now)
        .iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(upcoming, vec![2]);
    assert_eq!(cache.current_reservation(now).unwrap().id, 1);
}

#[test]
fn test_remove_reservation() {
    let cache = OfficeCache::new();
    cache.upsert_reservation(reservation(5, 1, 0));

    let removed = cache.remove_reservation(5).unwrap();
    assert_eq!(removed.id, 5);
    assert_eq!(
        cache.remove_reservation(5),
        Err(CacheError::ReservationNotFound(5))
    );
}

#[test]
fn test_clear_empties_everything() {
    let cache = OfficeCache::new();
    cache.upsert_desk(desk(1, DeskStatus::Available));
    cache.select_desk(1).unwrap();
    cache.upsert_reservation(reservation(1, 1, 0));

    cache.clear();
    assert_eq!(cache.desk_count(), 0);
    assert_eq!(cache.reservation_count(), 0);
    assert!(cache.selected_desk().is_none());
}

// ============================================================================
// Serde
// ============================================================================

#[test]
fn test_desk_parses_list_payload() {
    let json = r#"{
        "id": 12,
        "name": "Corner",
        "desk_number": "B-12",
        "area": 3,
        "area_name": "Open space",
        "x_coordinate": 120.5,
        "y_coordinate": 40.0,
        "status": "maintenance",
        "desk_type": "standing",
        "features": ["monitor"],
        "notes": ""
    }"#;
    let desk: Desk = serde_json::from_str(json).unwrap();
    assert_eq!(desk.id, 12);
    assert_eq!(desk.status, DeskStatus::Maintenance);
    assert_eq!(desk.desk_type, DeskType::Standing);
    assert_eq!(desk.area.unwrap().id(), 3);
    assert_eq!(desk.x, 120.5);
}

#[test]
fn test_desk_parses_detail_payload_with_nested_area() {
    let json = r#"{
        "id": 1,
        "name": "Window",
        "desk_number": "A-01",
        "area": {"id": 2, "name": "North wing", "description": "", "floor": 3},
        "x_coordinate": 0,
        "y_coordinate": 0,
        "status": "available"
    }"#;
    let desk: Desk = serde_json::from_str(json).unwrap();
    match desk.area {
        Some(AreaRef::Nested(area)) => assert_eq!(area.floor, 3),
        other => panic!("Expected nested area, got {:?}", other),
    }
}

#[test]
fn test_reservation_parses_backend_payload() {
    let json = r#"{
        "id": 77,
        "user": 5,
        "desk": 12,
        "desk_number": "B-12",
        "start_time": "2026-03-02T09:00:00Z",
        "end_time": "2026-03-02T18:00:00Z",
        "status": "no_show",
        "reservation_type": "recurring",
        "recurrence_pattern": "weekdays",
        "recurrence_end_date": "2026-04-01",
        "notes": "",
        "check_in_time": null
    }"#;
    let reservation: Reservation = serde_json::from_str(json).unwrap();
    assert_eq!(reservation.status, ReservationStatus::NoShow);
    assert_eq!(reservation.reservation_type, ReservationType::Recurring);
    assert_eq!(
        reservation.recurrence_pattern,
        Some(RecurrencePattern::Weekdays)
    );
}

#[test]
fn test_status_display_matches_wire() {
    assert_eq!(DeskStatus::Reserved.to_string(), "reserved");
    assert_eq!(ReservationStatus::NoShow.to_string(), "no_show");
    assert_eq!(
        serde_json::to_string(&ReservationStatus::NoShow).unwrap(),
        "\"no_show\""
    );
}

#[test]
fn test_desk_status_from_str() {
    assert_eq!("Occupied".parse::<DeskStatus>(), Ok(DeskStatus::Occupied));
    assert_eq!("maintenance".parse::<DeskStatus>(), Ok(DeskStatus::Maintenance));
    assert!("broken".parse::<DeskStatus>().is_err());
}
