//! REST client for the office booking server.
//!
//! Authenticated calls carry `Authorization: Token {credential}`. List
//! endpoints accept both bare arrays and paginated `{"results": [...]}`
//! bodies.

mod error;
mod types;

pub use error::*;
pub use types::*;

use crate::cache::{Area, Desk, DeskId, DeskStatus, Reservation, ReservationId};
use chrono::{NaiveDate, NaiveTime};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// HTTP client for `/api/...` endpoints.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    credential: Option<String>,
    client: reqwest::Client,
    timeout: Duration,
}

impl ApiClient {
    /// Create a client with its own connection pool.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Configuration(e.to_string()))?;
        Ok(Self::with_client(base_url, client, timeout))
    }

    /// Create a client around an existing reqwest client (for testing).
    pub fn with_client(
        base_url: impl Into<String>,
        client: reqwest::Client,
        timeout: Duration,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            credential: None,
            client,
            timeout,
        }
    }

    pub fn with_credential(mut self, credential: impl Into<String>) -> Self {
        self.set_credential(Some(credential.into()));
        self
    }

    /// Replace the session credential. Blank credentials clear it.
    pub fn set_credential(&mut self, credential: Option<String>) {
        self.credential = credential.filter(|c| !c.trim().is_empty());
    }

    pub fn has_credential(&self) -> bool {
        self.credential.is_some()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    /// Profile of the signed-in user.
    pub async fn me(&self) -> Result<User, ApiError> {
        self.fetch(self.request(Method::GET, "/api/users/me/")).await
    }

    // ------------------------------------------------------------------
    // Desks
    // ------------------------------------------------------------------

    pub async fn desks(&self) -> Result<Vec<Desk>, ApiError> {
        self.fetch_list(self.request(Method::GET, "/api/desks/"))
            .await
    }

    pub async fn desk(&self, id: DeskId) -> Result<Desk, ApiError> {
        self.fetch(self.request(Method::GET, &format!("/api/desks/{}/", id)))
            .await
    }

    /// Desks free on `date`, optionally narrowed to a time window.
    pub async fn available_desks(
        &self,
        date: NaiveDate,
        time_from: Option<NaiveTime>,
        time_to: Option<NaiveTime>,
    ) -> Result<Vec<Desk>, ApiError> {
        let mut query = vec![("date", date.format("%Y-%m-%d").to_string())];
        if let Some(from) = time_from {
            query.push(("time_from", from.format("%H:%M").to_string()));
        }
        if let Some(to) = time_to {
            query.push(("time_to", to.format("%H:%M").to_string()));
        }

        self.fetch_list(
            self.request(Method::GET, "/api/desks/available/")
                .query(&query),
        )
        .await
    }

    pub async fn areas(&self) -> Result<Vec<Area>, ApiError> {
        self.fetch_list(self.request(Method::GET, "/api/desks/areas/"))
            .await
    }

    /// Patch a desk's status and return the updated desk.
    pub async fn set_desk_status(&self, id: DeskId, status: DeskStatus) -> Result<Desk, ApiError> {
        self.fetch(
            self.request(Method::PATCH, &format!("/api/desks/{}/", id))
                .json(&serde_json::json!({ "status": status })),
        )
        .await
    }

    // ------------------------------------------------------------------
    // Reservations
    // ------------------------------------------------------------------

    pub async fn reservations(&self) -> Result<Vec<Reservation>, ApiError> {
        self.fetch_list(self.request(Method::GET, "/api/reservations/"))
            .await
    }

    pub async fn reservation(&self, id: ReservationId) -> Result<Reservation, ApiError> {
        self.fetch(self.request(Method::GET, &format!("/api/reservations/{}/", id)))
            .await
    }

    /// The user's reservation in progress right now, if any.
    pub async fn current_reservation(&self) -> Result<Option<Reservation>, ApiError> {
        let response = self
            .send(self.request(Method::GET, "/api/reservations/current/"))
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = Self::check_status(response).await?;
        Self::decode(response).await.map(Some)
    }

    pub async fn upcoming_reservations(&self) -> Result<Vec<Reservation>, ApiError> {
        self.fetch_list(self.request(Method::GET, "/api/reservations/upcoming/"))
            .await
    }

    pub async fn create_reservation(
        &self,
        reservation: &NewReservation,
    ) -> Result<Reservation, ApiError> {
        self.fetch(
            self.request(Method::POST, "/api/reservations/")
                .json(reservation),
        )
        .await
    }

    pub async fn check_in(&self, id: ReservationId) -> Result<ActionAck, ApiError> {
        self.fetch(self.request(
            Method::POST,
            &format!("/api/reservations/{}/check_in/", id),
        ))
        .await
    }

    pub async fn cancel_reservation(&self, id: ReservationId) -> Result<ActionAck, ApiError> {
        self.fetch(self.request(Method::POST, &format!("/api/reservations/{}/cancel/", id)))
            .await
    }

    /// Active reservations overlapping `[start, end]`, optionally for one desk.
    pub async fn calendar(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        desk: Option<DeskId>,
    ) -> Result<Vec<Reservation>, ApiError> {
        let mut query = Vec::new();
        if let Some(start) = start {
            query.push(("start", start.format("%Y-%m-%d").to_string()));
        }
        if let Some(end) = end {
            query.push(("end", end.format("%Y-%m-%d").to_string()));
        }
        if let Some(desk) = desk {
            query.push(("desk", desk.to_string()));
        }

        self.fetch_list(
            self.request(Method::GET, "/api/reservations/calendar/")
                .query(&query),
        )
        .await
    }

    // ------------------------------------------------------------------
    // Office layout
    // ------------------------------------------------------------------

    pub async fn layouts(&self) -> Result<Vec<OfficeLayout>, ApiError> {
        self.fetch_list(self.request(Method::GET, "/api/office/layouts/"))
            .await
    }

    pub async fn active_layouts(&self) -> Result<Vec<OfficeLayout>, ApiError> {
        self.fetch_list(self.request(Method::GET, "/api/office/layouts/active/"))
            .await
    }

    /// Layout with its elements and the desks on its floor.
    pub async fn layout(&self, id: u64) -> Result<OfficeLayout, ApiError> {
        self.fetch(self.request(Method::GET, &format!("/api/office/layouts/{}/", id)))
            .await
    }

    pub async fn layout_elements(&self, layout_id: u64) -> Result<Vec<OfficeElement>, ApiError> {
        self.fetch_list(
            self.request(Method::GET, "/api/office/elements/")
                .query(&[("layout", layout_id)]),
        )
        .await
    }

    pub async fn update_desk_positions(
        &self,
        layout_id: u64,
        positions: &[DeskPosition],
    ) -> Result<PositionUpdateResult, ApiError> {
        self.fetch(
            self.request(
                Method::POST,
                &format!("/api/office/layouts/{}/update_desks_positions/", layout_id),
            )
            .json(&serde_json::json!({ "desks": positions })),
        )
        .await
    }

    pub async fn stats(&self) -> Result<OfficeStats, ApiError> {
        self.fetch(self.request(Method::GET, "/api/office/stats/"))
            .await
    }

    // ------------------------------------------------------------------
    // Plumbing
    // ------------------------------------------------------------------

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let builder = self.client.request(method, url).timeout(self.timeout);
        match &self.credential {
            Some(token) => builder.header(reqwest::header::AUTHORIZATION, format!("Token {}", token)),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        let timeout_ms = self.timeout.as_millis() as u64;
        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::from_reqwest(e, timeout_ms))?;

        tracing::debug!(
            url = %response.url().path(),
            status = response.status().as_u16(),
            "API response"
        );
        Ok(response)
    }

    async fn fetch<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let response = Self::check_status(self.send(builder).await?).await?;
        Self::decode(response).await
    }

    async fn fetch_list<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<Vec<T>, ApiError> {
        let body: ListBody<T> = self.fetch(builder).await?;
        Ok(body.into_items())
    }

    async fn check_status(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message(&body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string()
        });

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            tracing::warn!(status = status.as_u16(), "API rejected credential");
            return Err(ApiError::Unauthorized(message));
        }

        Err(ApiError::Upstream {
            status: status.as_u16(),
            message,
        })
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let body = response.text().await.map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to read response body: {}", e))
        })?;
        serde_json::from_str(&body).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse response: {}", e))
        })
    }
}

/// Pull a human-readable message out of an error body.
///
/// The server answers with `{"detail": ...}` or `{"error": ...}`, or with
/// field errors such as `{"desk": ["already booked"]}`.
fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let object = value.as_object()?;

    for key in ["detail", "error"] {
        if let Some(text) = object.get(key).and_then(|v| v.as_str()) {
            return Some(text.to_string());
        }
    }

    let fields: Vec<String> = object
        .iter()
        .map(|(field, errors)| {
            let text = match errors {
                serde_json::Value::Array(items) => items
                    .iter()
                    .filter_map(|i| i.as_str())
                    .collect::<Vec<_>>()
                    .join(" "),
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            format!("{}: {}", field, text)
        })
        .collect();

    if fields.is_empty() {
        None
    } else {
        Some(fields.join("; "))
    }
}
