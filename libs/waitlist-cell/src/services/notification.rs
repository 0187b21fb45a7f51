use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

/// Event emitted when a cancelled booking frees a slot a waitlisted client wanted.
pub const SLOT_AVAILABLE_EVENT: &str = "waitlist.slot_available";

/// Outbound notification hand-off. Callers treat it as fire-and-forget.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, user_id: Uuid, event_type: &str, payload: Value) -> Result<()>;
}

/// Writes notifications into the `notifications` table for downstream delivery.
pub struct SupabaseNotifier {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseNotifier {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
        }
    }

    pub fn with_client(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }
}

#[async_trait]
impl Notifier for SupabaseNotifier {
    async fn notify(&self, user_id: Uuid, event_type: &str, payload: Value) -> Result<()> {
        debug!("Queueing {} notification for user {}", event_type, user_id);

        let body = json!({
            "user_id": user_id,
            "event_type": event_type,
            "payload": payload,
            "created_at": Utc::now(),
        });

        let _: Value = self
            .supabase
            .request(Method::POST, "/rest/v1/notifications", Some(body))
            .await?;
        Ok(())
    }
}

/// Notifier for the in-memory backend and local runs.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, user_id: Uuid, event_type: &str, payload: Value) -> Result<()> {
        info!(%user_id, event_type, %payload, "notification");
        Ok(())
    }
}
