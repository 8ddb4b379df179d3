use crate::config::{CRM_CONTACTS_URL, CRM_TIMEOUT_SECS};
use crate::error::PipelineError;
use crate::models::StoredName;
use crate::stats::PushStats;
use crate::store::NameStore;
use anyhow::{Context, Result};
use indicatif::ProgressBar;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Body of a create-contact call
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ContactPayload {
    pub properties: ContactProperties,
}

/// `name` goes to the first-name field and the stored sex to the last-name field.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ContactProperties {
    pub firstname: String,
    pub lastname: String,
}

impl From<&StoredName> for ContactPayload {
    fn from(row: &StoredName) -> Self {
        Self {
            properties: ContactProperties {
                firstname: row.name.clone(),
                lastname: row.sex.as_str().to_string(),
            },
        }
    }
}

pub struct CrmClient {
    http: reqwest::Client,
    endpoint: String,
}

impl CrmClient {
    pub fn new(token: &str) -> Result<Self> {
        Self::with_endpoint(token, CRM_CONTACTS_URL)
    }

    pub fn with_endpoint(token: &str, endpoint: impl Into<String>) -> Result<Self> {
        if token.trim().is_empty() {
            return Err(PipelineError::MissingCredential("HUBSPOT_API_KEY").into());
        }
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token.trim()))
            .context("CRM token contains characters not allowed in a header")?;
        auth.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(CRM_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }

    /// Creates one contact. Any transport failure or non-2xx status is a
    /// `DownstreamCall` error.
    pub async fn create_contact(&self, row: &StoredName) -> Result<(), PipelineError> {
        let payload = ContactPayload::from(row);
        let downstream = |message: String| PipelineError::DownstreamCall {
            name: row.name.clone(),
            message,
        };

        let resp = self
            .http
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|e| downstream(e.to_string()))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let body = resp.text().await.unwrap_or_default();
        Err(downstream(error_message(status, &body)))
    }
}

/// Prefers the API's own `message` field over the raw status line.
fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| format!("HTTP {status}"))
}

/// Sends up to `limit` stored rows to the CRM, one call per row. A failed call is
/// logged and counted; it does not stop the remaining rows.
pub async fn push_contacts<S>(
    store: &mut S,
    client: &CrmClient,
    limit: usize,
    pb: &ProgressBar,
) -> Result<PushStats>
where
    S: NameStore + ?Sized,
{
    let rows = store.sample(limit).await?;
    info!(count = rows.len(), "Sending names to CRM contacts");
    pb.set_length(rows.len() as u64);

    let mut stats = PushStats::default();
    for row in &rows {
        stats.attempted += 1;
        match client.create_contact(row).await {
            Ok(()) => {
                stats.created += 1;
                debug!(name = %row.name, "Created contact");
            }
            Err(e) => {
                stats.failed += 1;
                warn!(id = row.id, "{e}");
            }
        }
        pb.inc(1);
    }

    pb.finish_with_message(format!("{} created, {} failed", stats.created, stats.failed));
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Sex;
    use chrono::Utc;

    fn stored(name: &str, sex: Sex) -> StoredName {
        let now = Utc::now().naive_utc();
        StoredName {
            id: 1,
            name: name.to_string(),
            sex,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn payload_maps_name_and_sex() {
        let payload = ContactPayload::from(&stored("Ann", Sex::Female));
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"properties": {"firstname": "Ann", "lastname": "female"}})
        );
    }

    #[test]
    fn empty_token_is_rejected() {
        let err = CrmClient::new("  ").err().unwrap();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::MissingCredential("HUBSPOT_API_KEY"))
        ));
    }

    #[test]
    fn error_message_prefers_api_message() {
        let msg = error_message(
            reqwest::StatusCode::CONFLICT,
            r#"{"status":"error","message":"Contact already exists"}"#,
        );
        assert_eq!(msg, "Contact already exists");
    }

    #[test]
    fn error_message_falls_back_to_status() {
        let msg = error_message(reqwest::StatusCode::BAD_GATEWAY, "<html>oops</html>");
        assert_eq!(msg, "HTTP 502 Bad Gateway");
    }
}
