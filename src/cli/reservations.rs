//! Reservations command implementation

use crate::api::ApiClient;
use crate::cache::{OfficeCache, Reservation};
use crate::cli::output::{format_reservations_json, format_reservations_table};
use crate::cli::ReservationsArgs;

/// Latest start first.
pub fn order_reservations(reservations: Vec<Reservation>) -> Vec<Reservation> {
    let cache = OfficeCache::new();
    cache.replace_reservations(reservations);
    cache.reservations()
}

/// Handle reservations command
pub async fn handle_reservations(
    args: &ReservationsArgs,
    api: &ApiClient,
) -> Result<String, Box<dyn std::error::Error>> {
    let reservations = if args.current {
        match api.current_reservation().await? {
            Some(reservation) => vec![reservation],
            None if args.json => Vec::new(),
            None => return Ok("No reservation in progress.".to_string()),
        }
    } else if args.upcoming {
        api.upcoming_reservations().await?
    } else {
        api.reservations().await?
    };

    let reservations = order_reservations(reservations);

    if args.json {
        Ok(format_reservations_json(&reservations))
    } else {
        Ok(format_reservations_table(&reservations))
    }
}
