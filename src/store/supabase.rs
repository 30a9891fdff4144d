use anyhow::{Context, Result, bail};
use serde_json::json;

use super::{PrimitiveStore, StoredPrimitive};
use crate::config::SupabaseConfig;

/// Supabase table accessed through its PostgREST endpoint.
pub struct SupabaseStore {
    agent: ureq::Agent,
    config: SupabaseConfig,
}

impl SupabaseStore {
    pub fn new(agent: ureq::Agent, config: SupabaseConfig) -> Self {
        Self { agent, config }
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.config.url, self.config.table)
    }

    fn request(&self, method: &str, url: &str) -> ureq::Request {
        self.agent
            .request(method, url)
            .set("apikey", &self.config.key)
            .set("Authorization", &format!("Bearer {}", self.config.key))
    }
}

fn check_status(result: Result<ureq::Response, ureq::Error>, action: &str) -> Result<ureq::Response> {
    match result {
        Ok(response) => Ok(response),
        Err(ureq::Error::Status(status, response)) => {
            let body = response.into_string().unwrap_or_default();
            bail!("supabase {action} returned HTTP {status}: {}", body.trim())
        }
        Err(ureq::Error::Transport(transport)) => {
            bail!("supabase {action} request failed: {transport}")
        }
    }
}

impl PrimitiveStore for SupabaseStore {
    fn describe(&self) -> String {
        format!("supabase:{}", self.config.table)
    }

    fn insert(&self, primitive: &str) -> Result<()> {
        let result = self
            .request("POST", &self.table_url())
            .set("Prefer", "return=minimal")
            .send_json(json!({ "primitive": primitive }));
        check_status(result, "insert")?;
        Ok(())
    }

    fn list(&self) -> Result<Vec<StoredPrimitive>> {
        let result = self
            .request("GET", &self.table_url())
            .query("select", "id,primitive")
            .query("order", "id.asc")
            .call();

        check_status(result, "select")?
            .into_json::<Vec<StoredPrimitive>>()
            .context("failed to decode supabase rows")
    }

    fn delete(&self, id: i64) -> Result<bool> {
        let result = self
            .request("DELETE", &self.table_url())
            .query("id", &format!("eq.{id}"))
            .set("Prefer", "return=representation")
            .call();

        let removed = check_status(result, "delete")?
            .into_json::<Vec<serde_json::Value>>()
            .context("failed to decode supabase delete response")?;
        Ok(!removed.is_empty())
    }
}
