use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::booking::CreatedVia;

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub exp: Option<u64>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub app_metadata: Option<serde_json::Value>,
    pub user_metadata: Option<serde_json::Value>,
    pub aud: Option<String>,
    pub iat: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub role: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Marketplace roles carried in the token's `role` claim (or `app_metadata.role`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Client,
    Professional,
    Admin,
}

impl User {
    pub fn marketplace_role(&self) -> Role {
        let from_metadata = self
            .metadata
            .as_ref()
            .and_then(|m| m.get("role"))
            .and_then(|r| r.as_str());

        match self.role.as_deref().or(from_metadata) {
            Some("admin") | Some("service_role") => Role::Admin,
            Some("professional") | Some("vet") | Some("provider") => Role::Professional,
            _ => Role::Client,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.marketplace_role() == Role::Admin
    }
}

impl User {
    /// Origin of a booking this user places with `professional_id`. A
    /// professional booking someone else's calendar is acting as a client.
    pub fn booking_origin(&self, professional_id: Uuid) -> CreatedVia {
        match self.marketplace_role() {
            Role::Admin => CreatedVia::Admin,
            Role::Professional if Uuid::parse_str(&self.id).ok() == Some(professional_id) => {
                CreatedVia::Professional
            }
            _ => CreatedVia::Client,
        }
    }
}
