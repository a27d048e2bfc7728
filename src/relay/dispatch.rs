//! Applies inbound events to the cache and notice queue.

use super::protocol::{
    DeskStatusUpdate, InboundEvent, ReservationAction, ReservationUpdate, SYSTEM_ACTOR,
};
use crate::cache::OfficeCache;
use crate::notice::{NewNotice, NoticeQueue};

/// Shared collaborators an event is applied to.
pub struct DispatchContext<'a> {
    pub cache: &'a OfficeCache,
    pub notices: &'a NoticeQueue,
    /// Username of the signed-in user, if known
    pub identity: Option<&'a str>,
    /// Wall-clock milliseconds used for pong latency
    pub now_ms: i64,
}

/// What applying an event did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatched {
    /// Greeting; nothing to apply
    Greeting,
    /// Pong with the measured round trip, if the echo carried a timestamp
    Latency(Option<i64>),
    /// `applied` is false when the desk or reservation is not cached
    DeskStatus { applied: bool, notified: bool },
    ReservationStatus { applied: bool, notified: bool },
    /// Deletions are reconciled by the REST re-fetch
    ReservationDeleted,
    Unrecognized,
}

/// True when an update came from somebody other than this session's user.
///
/// ```
/// use deskrelay::relay::is_foreign_actor;
///
/// assert!(is_foreign_actor(Some("bob"), Some("alice")));
/// assert!(is_foreign_actor(Some("bob"), None));
/// assert!(!is_foreign_actor(Some("alice"), Some("alice")));
/// assert!(!is_foreign_actor(Some("system"), Some("alice")));
/// assert!(!is_foreign_actor(None, Some("alice")));
/// ```
pub fn is_foreign_actor(updated_by: Option<&str>, identity: Option<&str>) -> bool {
    match updated_by {
        Some(actor) if !actor.is_empty() && actor != SYSTEM_ACTOR => identity != Some(actor),
        _ => false,
    }
}

/// Apply one event.
pub fn dispatch(event: &InboundEvent, ctx: &DispatchContext<'_>) -> Dispatched {
    match event {
        InboundEvent::ConnectionEstablished { message } => {
            tracing::info!(
                message = message.as_deref().unwrap_or_default(),
                "Push channel established"
            );
            Dispatched::Greeting
        }
        InboundEvent::Pong { timestamp } => {
            let latency_ms = timestamp.and_then(|ts| pong_latency_ms(ts, ctx.now_ms));
            tracing::debug!(latency_ms = ?latency_ms, "Pong received");
            Dispatched::Latency(latency_ms)
        }
        InboundEvent::DeskStatusUpdate(update) => apply_desk_update(update, ctx),
        InboundEvent::ReservationUpdate(update) => apply_reservation_update(update, ctx),
        InboundEvent::Unrecognized => {
            tracing::debug!("Ignoring push event of unknown type");
            Dispatched::Unrecognized
        }
    }
}

/// Round trip for a pong echoing `timestamp`, or `None` when the echo is not
/// a usable wall-clock time.
fn pong_latency_ms(timestamp: f64, now_ms: i64) -> Option<i64> {
    if !timestamp.is_finite() || timestamp < i64::MIN as f64 || timestamp >= i64::MAX as f64 {
        tracing::debug!(timestamp, "Pong timestamp out of range");
        return None;
    }
    now_ms.checked_sub(timestamp as i64)
}

fn apply_desk_update(update: &DeskStatusUpdate, ctx: &DispatchContext<'_>) -> Dispatched {
    let applied = match update.status.known() {
        Some(status) => match ctx.cache.update_desk_status(update.desk_id, status) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(error = %e, "Desk status update for uncached desk dropped");
                false
            }
        },
        None => {
            tracing::warn!(
                desk_id = update.desk_id,
                status = %update.status,
                "Desk status not recognized, cache left as is"
            );
            false
        }
    };

    let notified = is_foreign_actor(update.updated_by.as_deref(), ctx.identity);
    if notified {
        let actor = update.updated_by.as_deref().unwrap_or_default();
        ctx.notices.push(NewNotice::info(
            "Desk status updated",
            format!(
                "Desk {} status changed to \"{}\" by {}",
                update.desk_id, update.status, actor
            ),
        ));
    }

    tracing::debug!(
        desk_id = update.desk_id,
        status = %update.status,
        applied,
        notified,
        "Desk status update applied"
    );
    Dispatched::DeskStatus { applied, notified }
}

fn apply_reservation_update(update: &ReservationUpdate, ctx: &DispatchContext<'_>) -> Dispatched {
    if update.action == ReservationAction::Deleted {
        tracing::debug!(
            reservation_id = update.reservation_id,
            "Reservation deletion left to REST reconciliation"
        );
        return Dispatched::ReservationDeleted;
    }

    let applied = match update.status {
        Some(status) => match ctx.cache.update_reservation_status(update.reservation_id, status) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(error = %e, "Reservation update for uncached reservation dropped");
                false
            }
        },
        None => false,
    };

    let notified = is_foreign_actor(update.updated_by.as_deref(), ctx.identity);
    if notified {
        let actor = update.updated_by.as_deref().unwrap_or_default();
        let verb = match update.action {
            ReservationAction::Created => "created",
            _ => "updated",
        };
        ctx.notices.push(NewNotice::info(
            "Reservation updated",
            format!("Reservation {} {} by {}", update.reservation_id, verb, actor),
        ));
    }

    tracing::debug!(
        reservation_id = update.reservation_id,
        action = %update.action,
        applied,
        notified,
        "Reservation update applied"
    );
    Dispatched::ReservationStatus { applied, notified }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{Desk, DeskStatus, Reservation, ReservationStatus};
    use crate::notice::NoticeKind;
    use chrono::{Duration, Utc};

    struct Fixture {
        cache: OfficeCache,
        notices: NoticeQueue,
    }

    impl Fixture {
        fn new() -> Self {
            let cache = OfficeCache::new();
            cache.upsert_desk(Desk::new(1, "Window", "A-01", DeskStatus::Available));
            let start = Utc::now() + Duration::hours(1);
            cache.upsert_reservation(Reservation::new(
                10,
                1,
                start,
                start + Duration::hours(8),
                ReservationStatus::Active,
            ));
            Self {
                cache,
                notices: NoticeQueue::new(),
            }
        }

        fn ctx<'a>(&'a self, identity: Option<&'a str>) -> DispatchContext<'a> {
            DispatchContext {
                cache: &self.cache,
                notices: &self.notices,
                identity,
                now_ms: 1_000_500,
            }
        }
    }

    fn desk_event(desk_id: u64, updated_by: Option<&str>) -> InboundEvent {
        InboundEvent::DeskStatusUpdate(DeskStatusUpdate {
            desk_id,
            status: DeskStatus::Occupied.into(),
            updated_by: updated_by.map(str::to_string),
        })
    }

    fn reservation_event(
        action: ReservationAction,
        status: Option<ReservationStatus>,
        updated_by: Option<&str>,
    ) -> InboundEvent {
        InboundEvent::ReservationUpdate(ReservationUpdate {
            reservation_id: 10,
            status,
            action,
            updated_by: updated_by.map(str::to_string),
        })
    }

    #[test]
    fn test_greeting_changes_nothing() {
        let f = Fixture::new();
        let out = dispatch(
            &InboundEvent::ConnectionEstablished { message: None },
            &f.ctx(None),
        );
        assert_eq!(out, Dispatched::Greeting);
        assert!(f.notices.is_empty());
    }

    #[test]
    fn test_pong_latency() {
        let f = Fixture::new();
        let out = dispatch(
            &InboundEvent::Pong {
                timestamp: Some(1_000_000.0),
            },
            &f.ctx(None),
        );
        assert_eq!(out, Dispatched::Latency(Some(500)));

        let out = dispatch(&InboundEvent::Pong { timestamp: None }, &f.ctx(None));
        assert_eq!(out, Dispatched::Latency(None));
    }

    #[test]
    fn test_pong_with_out_of_range_timestamp_has_no_latency() {
        let f = Fixture::new();
        let ctx = DispatchContext {
            now_ms: 1_700_000_000_000,
            ..f.ctx(None)
        };

        let event = InboundEvent::parse(r#"{"type":"pong","timestamp":-1e19}"#).unwrap();
        assert_eq!(dispatch(&event, &ctx), Dispatched::Latency(None));

        let event = InboundEvent::parse(r#"{"type":"pong","timestamp":1e300}"#).unwrap();
        assert_eq!(dispatch(&event, &ctx), Dispatched::Latency(None));
    }

    #[test]
    fn test_pong_latency_does_not_overflow_near_limits() {
        assert_eq!(pong_latency_ms(-9.0e18, i64::MAX), None);
        assert_eq!(pong_latency_ms(f64::NAN, 0), None);
        assert_eq!(pong_latency_ms(1_000.0, 1_250), Some(250));
    }

    #[test]
    fn test_desk_update_with_unlisted_status_still_notifies() {
        let f = Fixture::new();
        let event = InboundEvent::parse(
            r#"{"type":"desk_status_update","desk_id":1,"status":"busy","updated_by":"bob"}"#,
        )
        .unwrap();

        let out = dispatch(&event, &f.ctx(Some("alice")));

        assert_eq!(
            out,
            Dispatched::DeskStatus {
                applied: false,
                notified: true
            }
        );
        assert_eq!(f.cache.get_desk(1).unwrap().status, DeskStatus::Available);
        assert_eq!(
            f.notices.snapshot()[0].message,
            "Desk 1 status changed to \"busy\" by bob"
        );
    }

    #[test]
    fn test_desk_update_from_self_is_silent() {
        let f = Fixture::new();
        let out = dispatch(&desk_event(1, Some("alice")), &f.ctx(Some("alice")));

        assert_eq!(
            out,
            Dispatched::DeskStatus {
                applied: true,
                notified: false
            }
        );
        assert_eq!(f.cache.get_desk(1).unwrap().status, DeskStatus::Occupied);
        assert!(f.notices.is_empty());
    }

    #[test]
    fn test_desk_update_from_other_user_notifies_once() {
        let f = Fixture::new();
        dispatch(&desk_event(1, Some("bob")), &f.ctx(Some("alice")));

        let notices = f.notices.snapshot();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].kind, NoticeKind::Info);
        assert_eq!(notices[0].title, "Desk status updated");
        assert_eq!(
            notices[0].message,
            "Desk 1 status changed to \"occupied\" by bob"
        );
    }

    #[test]
    fn test_desk_update_from_system_is_silent() {
        let f = Fixture::new();
        dispatch(&desk_event(1, Some("system")), &f.ctx(Some("alice")));
        dispatch(&desk_event(1, None), &f.ctx(Some("alice")));
        dispatch(&desk_event(1, Some("")), &f.ctx(Some("alice")));
        assert!(f.notices.is_empty());
    }

    #[test]
    fn test_desk_update_for_unknown_desk_does_not_create_it() {
        let f = Fixture::new();
        let out = dispatch(&desk_event(99, None), &f.ctx(None));

        assert_eq!(
            out,
            Dispatched::DeskStatus {
                applied: false,
                notified: false
            }
        );
        assert!(f.cache.get_desk(99).is_none());
        assert_eq!(f.cache.desk_count(), 1);
    }

    #[test]
    fn test_reservation_deleted_is_noop() {
        let f = Fixture::new();
        let before = f.cache.get_reservation(10).unwrap();

        let out = dispatch(
            &reservation_event(
                ReservationAction::Deleted,
                Some(ReservationStatus::Cancelled),
                Some("bob"),
            ),
            &f.ctx(Some("alice")),
        );

        assert_eq!(out, Dispatched::ReservationDeleted);
        assert_eq!(f.cache.get_reservation(10).unwrap(), before);
        assert!(f.notices.is_empty());
    }

    #[test]
    fn test_reservation_update_applies_status() {
        let f = Fixture::new();
        let out = dispatch(
            &reservation_event(
                ReservationAction::Updated,
                Some(ReservationStatus::Completed),
                Some("alice"),
            ),
            &f.ctx(Some("alice")),
        );

        assert_eq!(
            out,
            Dispatched::ReservationStatus {
                applied: true,
                notified: false
            }
        );
        assert_eq!(
            f.cache.get_reservation(10).unwrap().status,
            ReservationStatus::Completed
        );
    }

    #[test]
    fn test_reservation_notice_distinguishes_created() {
        let f = Fixture::new();
        dispatch(
            &reservation_event(ReservationAction::Created, None, Some("bob")),
            &f.ctx(Some("alice")),
        );
        dispatch(
            &reservation_event(ReservationAction::Updated, None, Some("bob")),
            &f.ctx(Some("alice")),
        );

        let messages: Vec<_> = f
            .notices
            .snapshot()
            .into_iter()
            .map(|n| n.message)
            .collect();
        assert_eq!(
            messages,
            vec!["Reservation 10 created by bob", "Reservation 10 updated by bob"]
        );
    }

    #[test]
    fn test_reservation_update_without_status_leaves_cache() {
        let f = Fixture::new();
        let out = dispatch(
            &reservation_event(ReservationAction::Updated, None, None),
            &f.ctx(None),
        );
        assert_eq!(
            out,
            Dispatched::ReservationStatus {
                applied: false,
                notified: false
            }
        );
        assert_eq!(
            f.cache.get_reservation(10).unwrap().status,
            ReservationStatus::Active
        );
    }

    #[test]
    fn test_unrecognized_is_ignored() {
        let f = Fixture::new();
        assert_eq!(
            dispatch(&InboundEvent::Unrecognized, &f.ctx(None)),
            Dispatched::Unrecognized
        );
        assert!(f.notices.is_empty());
    }
}
