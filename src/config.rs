use serde::Deserialize;

/// Account-merge behavior when inbound claims carry a known email under a new
/// provider identity. `Overwrite` rebinds the record to the new identity (the
/// reference behavior); `Reject` refuses the login with a conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergePolicy {
    Overwrite,
    Reject,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub ttl_hours: i64,
    pub fallback_header: String,
    pub merge_policy: MergePolicy,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub session: SessionConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let session = SessionConfig {
            ttl_hours: std::env::var("SESSION_TTL_HOURS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(24),
            fallback_header: std::env::var("SESSION_FALLBACK_HEADER")
                .unwrap_or_else(|_| "provider_session_token".into()),
            merge_policy: match std::env::var("ACCOUNT_MERGE_POLICY").as_deref() {
                Ok("reject") => MergePolicy::Reject,
                _ => MergePolicy::Overwrite,
            },
        };
        Ok(Self {
            database_url,
            session,
        })
    }
}
