//! API request and response types

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Standard success envelope used by the API: an optional human-readable
/// message plus the payload under `data`
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub message: Option<String>,
    pub data: T,
}

/// Message-only response (registration, deletions)
#[derive(Debug, Clone, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Task as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_complete: bool,
    pub created_at: NaiveDateTime,
    #[serde(default)]
    pub updated_at: Option<NaiveDateTime>,
}

/// Payload for creating a task
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskCreate {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    pub is_complete: bool,
}

/// Partial update for an existing task; omitted fields are left unchanged
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_complete: Option<bool>,
}

/// Login credentials
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Registration payload
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Token pair issued on a successful login
#[derive(Debug, Clone, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: String,
}

/// Body of a successful token refresh
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshData {
    pub access_token: String,
}
