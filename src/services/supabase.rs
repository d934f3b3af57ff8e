use crate::models::{
    BloodRequest, BloodType, DonorProfile, Message, NewBloodRequest, NewMessage, RequestStatus,
};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when interacting with the Supabase store
#[derive(Debug, Error)]
pub enum SupabaseError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: invalid service key")]
    Unauthorized,

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Table names in the Supabase project
#[derive(Debug, Clone)]
pub struct SupabaseTables {
    pub profiles: String,
    pub blood_requests: String,
    pub messages: String,
}

/// Donor directory read
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DonorQuery {
    pub blood_types: Vec<BloodType>,
    pub active_only: bool,
    pub district_id: Option<String>,
}

impl DonorQuery {
    /// Stable key describing this read, for caching
    pub fn scope_key(&self) -> String {
        let mut types: Vec<&str> = self.blood_types.iter().map(|t| t.as_str()).collect();
        types.sort_unstable();
        format!(
            "{}:{}:{}",
            self.district_id.as_deref().unwrap_or("*"),
            if types.is_empty() { "*".to_string() } else { types.join(",") },
            if self.active_only { "active" } else { "all" },
        )
    }
}

/// Blood request read
#[derive(Debug, Clone, Default)]
pub struct RequestQuery {
    pub requester_id: Option<String>,
    pub statuses: Vec<RequestStatus>,
    pub limit: Option<usize>,
}

/// Quote a value for a PostgREST `in.(...)` list
fn quoted(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

#[derive(Debug, Deserialize)]
struct ProfileName {
    id: String,
    #[serde(default)]
    full_name: Option<String>,
}

/// Supabase REST (PostgREST) client
///
/// Handles all communication with the hosted store including:
/// - Reading donor profiles
/// - Reading and writing blood requests
/// - Reading and writing inbox messages
pub struct SupabaseClient {
    base_url: String,
    service_key: String,
    client: Client,
    tables: SupabaseTables,
}

impl SupabaseClient {
    /// Create a new Supabase client
    pub fn new(base_url: String, service_key: String, tables: SupabaseTables) -> Result<Self, SupabaseError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            base_url,
            service_key,
            client,
            tables,
        })
    }

    fn table_url(&self, table: &str, filters: &[(&str, String)]) -> String {
        let mut url = format!("{}/rest/v1/{}", self.base_url.trim_end_matches('/'), table);
        if !filters.is_empty() {
            let query = filters
                .iter()
                .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
                .collect::<Vec<_>>()
                .join("&");
            url.push('?');
            url.push_str(&query);
        }
        url
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.service_key)
            .header("Authorization", format!("Bearer {}", self.service_key))
    }

    async fn send(&self, builder: RequestBuilder, action: &str) -> Result<Value, SupabaseError> {
        let response = self.authorized(builder).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(SupabaseError::Unauthorized);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "Unable to read body".to_string());
            tracing::error!("Failed to {}: {} - {}", action, status, body);
            return Err(SupabaseError::ApiError(format!("Failed to {}: {}", action, status)));
        }

        Ok(response.json().await?)
    }

    async fn fetch_rows(&self, table: &str, filters: &[(&str, String)], action: &str) -> Result<Vec<Value>, SupabaseError> {
        let url = self.table_url(table, filters);
        tracing::debug!("Fetching rows from: {}", url);

        match self.send(self.client.get(&url), action).await? {
            Value::Array(rows) => Ok(rows),
            _ => Err(SupabaseError::InvalidResponse("Expected an array of rows".into())),
        }
    }

    /// Keep rows that decode, logging the ones that don't
    fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>, kind: &str) -> Vec<T> {
        rows.into_iter()
            .filter_map(|row| match serde_json::from_value(row) {
                Ok(item) => Some(item),
                Err(e) => {
                    tracing::warn!("Skipping malformed {} row: {}", kind, e);
                    None
                }
            })
            .collect()
    }

    fn decode_single<T: DeserializeOwned>(rows: Vec<Value>, kind: &str, id: &str) -> Result<T, SupabaseError> {
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| SupabaseError::NotFound(format!("{} {} not found", kind, id)))?;

        serde_json::from_value(row)
            .map_err(|e| SupabaseError::InvalidResponse(format!("Failed to parse {}: {}", kind, e)))
    }

    /// Cheap reachability check
    pub async fn health_check(&self) -> Result<bool, SupabaseError> {
        let url = self.table_url(&self.tables.profiles, &[("select", "id".to_string()), ("limit", "1".to_string())]);
        let response = self.authorized(self.client.get(&url)).send().await?;
        Ok(response.status().is_success())
    }

    /// Query the donor directory
    pub async fn list_donors(&self, query: &DonorQuery) -> Result<Vec<DonorProfile>, SupabaseError> {
        let mut filters = vec![("select", "*".to_string())];

        if !query.blood_types.is_empty() {
            let types = query
                .blood_types
                .iter()
                .map(|t| quoted(t.as_str()))
                .collect::<Vec<_>>()
                .join(",");
            filters.push(("blood_type", format!("in.({})", types)));
        }
        if query.active_only {
            filters.push(("is_active", "eq.true".to_string()));
        }
        if let Some(district) = &query.district_id {
            filters.push(("district_id", format!("eq.{}", district)));
        }

        let rows = self.fetch_rows(&self.tables.profiles, &filters, "query donors").await?;
        let total = rows.len();
        let donors: Vec<DonorProfile> = Self::decode_rows(rows, "profile");

        tracing::debug!("Queried {} donors ({} rows)", donors.len(), total);

        Ok(donors)
    }

    /// Get a single profile by user ID
    pub async fn get_profile(&self, user_id: &str) -> Result<DonorProfile, SupabaseError> {
        let filters = [
            ("select", "*".to_string()),
            ("id", format!("eq.{}", user_id)),
            ("limit", "1".to_string()),
        ];
        let rows = self.fetch_rows(&self.tables.profiles, &filters, "fetch profile").await?;
        Self::decode_single(rows, "profile", user_id)
    }

    /// Display names for a set of user IDs
    pub async fn profile_names(&self, user_ids: &[String]) -> Result<HashMap<String, String>, SupabaseError> {
        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let filters = [
            ("select", "id,full_name".to_string()),
            (
                "id",
                format!("in.({})", user_ids.iter().map(|id| quoted(id)).collect::<Vec<_>>().join(",")),
            ),
        ];
        let rows = self.fetch_rows(&self.tables.profiles, &filters, "fetch profile names").await?;

        Ok(Self::decode_rows::<ProfileName>(rows, "profile name")
            .into_iter()
            .map(|p| {
                let name = p.full_name.unwrap_or_default();
                (p.id, name)
            })
            .collect())
    }

    /// Get a single blood request
    pub async fn get_request(&self, request_id: &str) -> Result<BloodRequest, SupabaseError> {
        let filters = [
            ("select", "*".to_string()),
            ("id", format!("eq.{}", request_id)),
            ("limit", "1".to_string()),
        ];
        let rows = self.fetch_rows(&self.tables.blood_requests, &filters, "fetch blood request").await?;
        Self::decode_single(rows, "blood request", request_id)
    }

    /// List blood requests, newest first
    pub async fn list_requests(&self, query: &RequestQuery) -> Result<Vec<BloodRequest>, SupabaseError> {
        let mut filters = vec![("select", "*".to_string()), ("order", "created_at.desc".to_string())];

        if let Some(requester) = &query.requester_id {
            filters.push(("requester_id", format!("eq.{}", requester)));
        }
        if !query.statuses.is_empty() {
            let statuses = query
                .statuses
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(",");
            filters.push(("status", format!("in.({})", statuses)));
        }
        if let Some(limit) = query.limit {
            filters.push(("limit", limit.to_string()));
        }

        let rows = self.fetch_rows(&self.tables.blood_requests, &filters, "query blood requests").await?;
        Ok(Self::decode_rows(rows, "blood request"))
    }

    /// Insert a blood request and return the stored row
    pub async fn create_request(&self, request: &NewBloodRequest) -> Result<BloodRequest, SupabaseError> {
        let url = self.table_url(&self.tables.blood_requests, &[]);
        let builder = self
            .client
            .post(&url)
            .header("Prefer", "return=representation")
            .json(request);

        let rows = match self.send(builder, "create blood request").await? {
            Value::Array(rows) => rows,
            other => vec![other],
        };

        let created: BloodRequest = Self::decode_single(rows, "blood request", "(new)")?;
        tracing::debug!("Created blood request {} by {}", created.id, created.requester_id);
        Ok(created)
    }

    /// Move a blood request owned by `requester_id` from `from` to `to`
    ///
    /// The PATCH only matches while the row still has that owner and status,
    /// so a concurrent change surfaces as `Conflict`.
    pub async fn update_request_status(
        &self,
        request_id: &str,
        requester_id: &str,
        from: RequestStatus,
        to: RequestStatus,
    ) -> Result<BloodRequest, SupabaseError> {
        let url = self.table_url(
            &self.tables.blood_requests,
            &[
                ("id", format!("eq.{}", request_id)),
                ("requester_id", format!("eq.{}", requester_id)),
                ("status", format!("eq.{}", from.as_str())),
            ],
        );
        let body = serde_json::json!({
            "status": to,
            "updated_at": chrono::Utc::now(),
        });
        let builder = self
            .client
            .patch(&url)
            .header("Prefer", "return=representation")
            .json(&body);

        let rows = match self.send(builder, "update blood request").await? {
            Value::Array(rows) => rows,
            other => vec![other],
        };
        if rows.is_empty() {
            return Err(SupabaseError::Conflict(format!(
                "blood request {} is no longer {}",
                request_id,
                from.as_str()
            )));
        }
        Self::decode_single(rows, "blood request", request_id)
    }

    /// All messages sent or received by a user, oldest first
    pub async fn list_messages(&self, user_id: &str) -> Result<Vec<Message>, SupabaseError> {
        let filters = [
            ("select", "*".to_string()),
            ("or", format!("(sender_id.eq.{},receiver_id.eq.{})", user_id, user_id)),
            ("order", "timestamp.asc".to_string()),
        ];
        let rows = self.fetch_rows(&self.tables.messages, &filters, "query messages").await?;
        Ok(Self::decode_rows(rows, "message"))
    }

    pub async fn get_message(&self, message_id: &str) -> Result<Message, SupabaseError> {
        let filters = [
            ("select", "*".to_string()),
            ("id", format!("eq.{}", message_id)),
            ("limit", "1".to_string()),
        ];
        let rows = self.fetch_rows(&self.tables.messages, &filters, "fetch message").await?;
        Self::decode_single(rows, "message", message_id)
    }

    /// Insert a message
    pub async fn send_message(&self, message: &NewMessage) -> Result<Message, SupabaseError> {
        let url = self.table_url(&self.tables.messages, &[]);
        let builder = self
            .client
            .post(&url)
            .header("Prefer", "return=representation")
            .json(message);

        let rows = match self.send(builder, "send message").await? {
            Value::Array(rows) => rows,
            other => vec![other],
        };

        tracing::debug!("Sent message: {} -> {}", message.sender_id, message.receiver_id);
        Self::decode_single(rows, "message", &message.id)
    }

    pub async fn mark_message_read(&self, message_id: &str) -> Result<(), SupabaseError> {
        let url = self.table_url(&self.tables.messages, &[("id", format!("eq.{}", message_id))]);
        let builder = self
            .client
            .patch(&url)
            .header("Prefer", "return=minimal")
            .json(&serde_json::json!({ "is_read": true }));

        let response = self.authorized(builder).send().await?;
        if !response.status().is_success() {
            return Err(SupabaseError::ApiError(format!(
                "Failed to mark message read: {}",
                response.status()
            )));
        }

        Ok(())
    }
}
