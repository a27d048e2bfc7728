//! Office cache module.
//!
//! Holds the desks and reservations fetched over REST so that views and the
//! realtime relay share one copy. The relay patches records in place by id;
//! it never creates records the REST path has not delivered.

mod desk;
mod error;
mod reservation;
#[cfg(test)]
mod tests;

pub use desk::*;
pub use error::*;
pub use reservation::*;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::RwLock;

/// Client-side store of desks and reservations.
///
/// Uses concurrent maps so the relay task, the sync task and CLI readers can
/// touch it without a shared lock.
///
/// # Examples
///
/// ```
/// use deskrelay::cache::{Desk, DeskStatus, OfficeCache};
///
/// let cache = OfficeCache::new();
/// cache.upsert_desk(Desk::new(7, "Window seat", "A-07", DeskStatus::Available));
///
/// cache.update_desk_status(7, DeskStatus::Occupied).unwrap();
/// assert_eq!(cache.get_desk(7).unwrap().status, DeskStatus::Occupied);
///
/// // Unknown ids are reported, never inserted
/// assert!(cache.update_desk_status(8, DeskStatus::Occupied).is_err());
/// assert_eq!(cache.desk_count(), 1);
/// ```
pub struct OfficeCache {
    desks: DashMap<DeskId, Desk>,
    reservations: DashMap<ReservationId, Reservation>,
    selected_desk: RwLock<Option<DeskId>>,
}

impl OfficeCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            desks: DashMap::new(),
            reservations: DashMap::new(),
            selected_desk: RwLock::new(None),
        }
    }

    // ------------------------------------------------------------------
    // Desks
    // ------------------------------------------------------------------

    /// Replace every cached desk with a freshly fetched list.
    ///
    /// Fresh copies overwrite in place before stale ids are pruned, so a desk
    /// present in both sets is never missing in between. The selection is kept
    /// only if the selected desk is still present.
    pub fn replace_desks(&self, desks: Vec<Desk>) {
        let fresh: HashSet<DeskId> = desks.iter().map(|d| d.id).collect();
        for desk in desks {
            self.desks.insert(desk.id, desk);
        }
        self.desks.retain(|id, _| fresh.contains(id));

        let mut selected = self
            .selected_desk
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(id) = *selected {
            if !self.desks.contains_key(&id) {
                *selected = None;
            }
        }
    }

    /// Insert a desk or overwrite the cached copy.
    pub fn upsert_desk(&self, desk: Desk) {
        self.desks.insert(desk.id, desk);
    }

    /// Get a copy of a desk by id.
    pub fn get_desk(&self, id: DeskId) -> Option<Desk> {
        self.desks.get(&id).map(|entry| entry.value().clone())
    }

    /// All cached desks ordered by id.
    pub fn desks(&self) -> Vec<Desk> {
        let mut desks: Vec<Desk> = self.desks.iter().map(|e| e.value().clone()).collect();
        desks.sort_by_key(|d| d.id);
        desks
    }

    /// Cached desks currently in the given status, ordered by id.
    pub fn desks_with_status(&self, status: DeskStatus) -> Vec<Desk> {
        let mut desks: Vec<Desk> = self
            .desks
            .iter()
            .filter(|e| e.value().status == status)
            .map(|e| e.value().clone())
            .collect();
        desks.sort_by_key(|d| d.id);
        desks
    }

    /// Number of cached desks.
    pub fn desk_count(&self) -> usize {
        self.desks.len()
    }

    /// Set the status of a cached desk.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::DeskNotFound` if the desk is not cached.
    pub fn update_desk_status(&self, id: DeskId, status: DeskStatus) -> Result<(), CacheError> {
        let mut desk = self
            .desks
            .get_mut(&id)
            .ok_or(CacheError::DeskNotFound(id))?;
        desk.status = status;
        Ok(())
    }

    /// Mark a desk as the one the user is looking at.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::DeskNotFound` if the desk is not cached.
    pub fn select_desk(&self, id: DeskId) -> Result<(), CacheError> {
        if !self.desks.contains_key(&id) {
            return Err(CacheError::DeskNotFound(id));
        }
        *self
            .selected_desk
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(id);
        Ok(())
    }

    /// The selected desk, reflecting every status patch applied since selection.
    pub fn selected_desk(&self) -> Option<Desk> {
        let id = *self
            .selected_desk
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        id.and_then(|id| self.get_desk(id))
    }

    pub fn clear_selected_desk(&self) {
        *self
            .selected_desk
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
    }

    // ------------------------------------------------------------------
    // Reservations
    // ------------------------------------------------------------------

    /// Replace every cached reservation with a freshly fetched list.
    ///
    /// Same overwrite-then-prune order as [`OfficeCache::replace_desks`].
    pub fn replace_reservations(&self, reservations: Vec<Reservation>) {
        let fresh: HashSet<ReservationId> = reservations.iter().map(|r| r.id).collect();
        for reservation in reservations {
            self.reservations.insert(reservation.id, reservation);
        }
        self.reservations.retain(|id, _| fresh.contains(id));
    }

    /// Insert a reservation or overwrite the cached copy.
    pub fn upsert_reservation(&self, reservation: Reservation) {
        self.reservations.insert(reservation.id, reservation);
    }

    /// Get a copy of a reservation by id.
    pub fn get_reservation(&self, id: ReservationId) -> Option<Reservation> {
        self.reservations.get(&id).map(|entry| entry.value().clone())
    }

    /// All cached reservations, latest start first.
    pub fn reservations(&self) -> Vec<Reservation> {
        let mut reservations: Vec<Reservation> = self
            .reservations
            .iter()
            .map(|e| e.value().clone())
            .collect();
        reservations.sort_by(|a, b| b.start_time.cmp(&a.start_time).then(a.id.cmp(&b.id)));
        reservations
    }

    /// Active reservations starting after `now`, soonest first.
    pub fn upcoming_reservations(&self, now: DateTime<Utc>) -> Vec<Reservation> {
        let mut upcoming: Vec<Reservation> = self
            .reservations
            .iter()
            .filter(|e| e.value().is_upcoming(now))
            .map(|e| e.value().clone())
            .collect();
        upcoming.sort_by(|a, b| a.start_time.cmp(&b.start_time).then(a.id.cmp(&b.id)));
        upcoming
    }

    /// The active reservation whose slot contains `now`, if any.
    pub fn current_reservation(&self, now: DateTime<Utc>) -> Option<Reservation> {
        self.reservations
            .iter()
            .filter(|e| e.value().is_current(now))
            .map(|e| e.value().clone())
            .min_by_key(|r| r.start_time)
    }

    /// Number of cached reservations.
    pub fn reservation_count(&self) -> usize {
        self.reservations.len()
    }

    /// Set the status of a cached reservation.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::ReservationNotFound` if the reservation is not cached.
    pub fn update_reservation_status(
        &self,
        id: ReservationId,
        status: ReservationStatus,
    ) -> Result<(), CacheError> {
        let mut reservation = self
            .reservations
            .get_mut(&id)
            .ok_or(CacheError::ReservationNotFound(id))?;
        reservation.status = status;
        Ok(())
    }

    /// Remove a reservation from the cache.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::ReservationNotFound` if the reservation is not cached.
    pub fn remove_reservation(&self, id: ReservationId) -> Result<Reservation, CacheError> {
        self.reservations
            .remove(&id)
            .map(|(_, reservation)| reservation)
            .ok_or(CacheError::ReservationNotFound(id))
    }

    /// Drop everything, e.g. on logout.
    pub fn clear(&self) {
        self.desks.clear();
        self.reservations.clear();
        self.clear_selected_desk();
    }
}

impl Default for OfficeCache {
    fn default() -> Self {
        Self::new()
    }
}
