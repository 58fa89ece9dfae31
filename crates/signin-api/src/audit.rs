//! Security audit logging for authentication events
//!
//! Every sign-in attempt, user mutation and rejected token produces an
//! event logged at INFO level with the "audit" target, so it can be
//! filtered and routed separately from application logs.
//!
//! Events carry usernames, ids and request metadata only. Passwords,
//! hashes and tokens never appear in an event.
//!
//! # Example
//!
//! ```ignore
//! use signin_api::audit::{audit_log, AuditEvent};
//!
//! audit_log(&AuditEvent::SigninFailure {
//!     username: "ghost".to_string(),
//!     reason: "unknown_user".to_string(),
//!     ip_address: None,
//!     user_agent: None,
//! });
//! ```
//!
//! Author: hephaex@gmail.com

use axum::http::HeaderMap;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Security audit events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum AuditEvent {
    /// Credentials verified and token issued
    SigninSuccess {
        username: String,
        roles: Vec<String>,
        ip_address: Option<String>,
        user_agent: Option<String>,
    },

    /// Credentials rejected
    SigninFailure {
        username: String,
        reason: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
    },

    /// User record created
    UserCreated {
        user_id: i64,
        username: String,
        role: String,
        actor: Option<String>,
    },

    /// User record updated
    UserUpdated {
        user_id: i64,
        username: String,
        role: String,
        actor: Option<String>,
    },

    /// User record deleted
    UserDeleted { user_id: i64, actor: Option<String> },

    /// Invalid or expired token presented
    InvalidToken {
        ip_address: Option<String>,
        user_agent: Option<String>,
        reason: String,
    },

    /// Authenticated caller lacks the required role
    AccessDenied {
        username: String,
        resource: String,
        required_role: String,
        ip_address: Option<String>,
    },
}

/// Request metadata attached to audit events
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditContext {
    /// Client IP address (extracted from request headers)
    pub ip_address: Option<String>,
    /// User agent string (extracted from request headers)
    pub user_agent: Option<String>,
}

impl AuditContext {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            ip_address: extract_ip_address(headers),
            user_agent: extract_user_agent(headers),
        }
    }
}

/// Log a security audit event with structured fields
///
/// The event is also serialized to JSON and attached as the `event` field
/// for log aggregators.
pub fn audit_log(event: &AuditEvent) {
    let timestamp = Utc::now();

    let event_json = serde_json::to_string(event)
        .unwrap_or_else(|e| format!("{{\"error\":\"Failed to serialize audit event: {e}\"}}"));

    match event {
        AuditEvent::SigninSuccess {
            username,
            ip_address,
            ..
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                username = %username,
                ip_address = ?ip_address,
                "Sign-in successful"
            );
        }
        AuditEvent::SigninFailure {
            username,
            reason,
            ip_address,
            ..
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                username = %username,
                reason = %reason,
                ip_address = ?ip_address,
                "Sign-in failed"
            );
        }
        AuditEvent::UserCreated {
            user_id,
            username,
            actor,
            ..
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                user_id = %user_id,
                username = %username,
                actor = ?actor,
                "User created"
            );
        }
        AuditEvent::UserUpdated {
            user_id,
            username,
            actor,
            ..
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                user_id = %user_id,
                username = %username,
                actor = ?actor,
                "User updated"
            );
        }
        AuditEvent::UserDeleted { user_id, actor } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                user_id = %user_id,
                actor = ?actor,
                "User deleted"
            );
        }
        AuditEvent::InvalidToken {
            ip_address, reason, ..
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                ip_address = ?ip_address,
                reason = %reason,
                "Invalid token"
            );
        }
        AuditEvent::AccessDenied {
            username,
            resource,
            required_role,
            ip_address,
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                username = %username,
                resource = %resource,
                required_role = %required_role,
                ip_address = ?ip_address,
                "Access denied"
            );
        }
    }
}

/// Extract IP address from request headers
///
/// Checks X-Forwarded-For, then X-Real-IP.
pub fn extract_ip_address(headers: &HeaderMap) -> Option<String> {
    // First entry in the chain is the client
    if let Some(xff) = headers.get("x-forwarded-for") {
        if let Ok(xff_str) = xff.to_str() {
            if let Some(first_ip) = xff_str.split(',').next() {
                return Some(first_ip.trim().to_string());
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip") {
        if let Ok(ip_str) = real_ip.to_str() {
            return Some(ip_str.to_string());
        }
    }

    None
}

/// Extract user agent from request headers
pub fn extract_user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|ua| ua.to_str().ok())
        .map(|s| s.to_string())
}
