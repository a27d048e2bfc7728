//! Output formatting helpers for CLI commands

use crate::cache::{Desk, DeskStatus, Reservation, ReservationStatus};
use crate::notice::{Notice, NoticeKind};
use crate::relay::{ConnectionState, RelaySnapshot};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use serde_json::json;

/// Colored label for a desk status
pub fn desk_status_label(status: DeskStatus) -> String {
    match status {
        DeskStatus::Available => "available".green().to_string(),
        DeskStatus::Occupied => "occupied".red().to_string(),
        DeskStatus::Reserved => "reserved".yellow().to_string(),
        DeskStatus::Maintenance => "maintenance".cyan().to_string(),
    }
}

fn reservation_status_label(status: ReservationStatus) -> String {
    match status {
        ReservationStatus::Active => "active".green().to_string(),
        ReservationStatus::Completed => "completed".dimmed().to_string(),
        ReservationStatus::Cancelled => "cancelled".red().to_string(),
        ReservationStatus::NoShow => "no show".yellow().to_string(),
    }
}

/// Format desks as a table
pub fn format_desks_table(desks: &[Desk]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["ID", "Number", "Name", "Area", "Type", "Status"]);

    for d in desks {
        table.add_row(vec![
            Cell::new(d.id),
            Cell::new(&d.desk_number),
            Cell::new(&d.name),
            Cell::new(d.area_name.as_deref().unwrap_or("-")),
            Cell::new(format!("{:?}", d.desk_type).to_lowercase()),
            Cell::new(desk_status_label(d.status)),
        ]);
    }

    table.to_string()
}

/// Format desks as JSON
pub fn format_desks_json(desks: &[Desk]) -> String {
    json!({ "desks": desks }).to_string()
}

/// Format reservations as a table
pub fn format_reservations_table(reservations: &[Reservation]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["ID", "Desk", "Start", "End", "Status", "Checked in"]);

    for r in reservations {
        let desk = r
            .desk_number
            .clone()
            .unwrap_or_else(|| format!("#{}", r.desk));
        table.add_row(vec![
            Cell::new(r.id),
            Cell::new(desk),
            Cell::new(r.start_time.format("%Y-%m-%d %H:%M")),
            Cell::new(r.end_time.format("%H:%M")),
            Cell::new(reservation_status_label(r.status)),
            Cell::new(if r.check_in_time.is_some() { "✓" } else { "" }),
        ]);
    }

    table.to_string()
}

/// Format reservations as JSON
pub fn format_reservations_json(reservations: &[Reservation]) -> String {
    json!({ "reservations": reservations }).to_string()
}

/// One human-readable line per notice
pub fn format_notice_line(notice: &Notice) -> String {
    let icon = match notice.kind {
        NoticeKind::Info => "ℹ".blue(),
        NoticeKind::Success => "✓".green(),
        NoticeKind::Warning => "!".yellow(),
        NoticeKind::Error => "✗".red(),
    };
    let time = notice.created_at.format("%H:%M:%S");

    if notice.title.is_empty() {
        format!("{} {} {}", time, icon, notice.message)
    } else {
        format!(
            "{} {} {}: {}",
            time,
            icon,
            notice.title.bold(),
            notice.message
        )
    }
}

/// One JSON object per notice, for piping
pub fn format_notice_json(notice: &Notice) -> String {
    serde_json::to_string(notice).unwrap_or_else(|_| json!({ "id": notice.id }).to_string())
}

/// Connection state change line
pub fn format_state_line(snapshot: &RelaySnapshot) -> String {
    let state = match snapshot.state {
        ConnectionState::Open => "● connected".green(),
        ConnectionState::Connecting => "○ connecting".yellow(),
        ConnectionState::Closed => "○ reconnecting".yellow(),
        ConnectionState::Idle => "○ offline".red(),
    };

    match snapshot.state {
        ConnectionState::Closed => format!(
            "{} (attempt {})",
            state,
            snapshot.reconnect_attempts + 1
        ),
        _ => state.to_string(),
    }
}
