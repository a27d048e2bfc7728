//! Desks command implementation

use crate::api::ApiClient;
use crate::cache::{Desk, DeskStatus, OfficeCache};
use crate::cli::output::{format_desks_json, format_desks_table};
use crate::cli::DesksArgs;

/// Order by id and keep only `status`, if given.
pub fn select_desks(desks: Vec<Desk>, status: Option<DeskStatus>) -> Vec<Desk> {
    let cache = OfficeCache::new();
    cache.replace_desks(desks);
    match status {
        Some(status) => cache.desks_with_status(status),
        None => cache.desks(),
    }
}

/// Handle desks command
pub async fn handle_desks(
    args: &DesksArgs,
    api: &ApiClient,
) -> Result<String, Box<dyn std::error::Error>> {
    let desks = match args.available_on {
        Some(date) => api.available_desks(date, args.from, args.to).await?,
        None => api.desks().await?,
    };

    let desks = select_desks(desks, args.status);
    tracing::debug!(count = desks.len(), "Desks fetched");

    if args.json {
        Ok(format_desks_json(&desks))
    } else {
        Ok(format_desks_table(&desks))
    }
}
