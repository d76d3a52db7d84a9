//! User census probe.
//!
//! # Responsibilities
//! - Fetch `{backend_base}/users`
//! - Decode either a bare array of user records or `{"users": [...]}`
//! - Reduce the records to online / in-game counts
//!
//! # Design Decisions
//! - Array shape is tried first; the wrapper object only when that fails
//! - When both shapes fail, both serde errors are reported
//! - Non-2xx bodies are read only up to 1 KiB, for the error message

use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::{Map, Value};
use tokio::time::Instant;

use crate::config::ProbeConfig;
use crate::probe::authorized;
use crate::probe::error::{ProbeError, ProbeResult};
use crate::resilience::timeouts::bounded_timeout;

/// Path probed on the backend.
pub const USERS_PATH: &str = "/users";

/// Maximum number of body bytes kept for a status error.
pub const ERROR_BODY_LIMIT: usize = 1024;

/// One user as reported by the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserRecord {
    pub is_online: bool,
    pub is_in_game: bool,
}

/// Online and in-game totals. A user can count toward both.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CensusResult {
    pub online: u64,
    pub in_game: u64,
}

impl CensusResult {
    /// Count the records in one pass.
    pub fn tally<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a UserRecord>,
    {
        records.into_iter().fold(Self::default(), |mut acc, user| {
            if user.is_online {
                acc.online += 1;
            }
            if user.is_in_game {
                acc.in_game += 1;
            }
            acc
        })
    }
}

/// Decode a `/users` body in either accepted shape.
///
/// JSON `null`, a missing `users` field and `"users": null` all decode
/// to an empty list.
pub fn decode_users(body: &[u8]) -> ProbeResult<Vec<UserRecord>> {
    let array = match serde_json::from_slice::<Option<Vec<UserRecord>>>(body) {
        Ok(users) => return Ok(users.unwrap_or_default()),
        Err(e) => e,
    };

    decode_wrapped(body).map_err(|wrapped| ProbeError::Decode { array, wrapped })
}

/// The `{"users": [...]}` shape. Only a JSON object qualifies; serde would
/// otherwise accept a derived struct written as an array.
fn decode_wrapped(body: &[u8]) -> serde_json::Result<Vec<UserRecord>> {
    let mut object: Map<String, Value> = serde_json::from_slice(body)?;
    let users = match object.remove("users") {
        Some(value) => serde_json::from_value::<Option<Vec<UserRecord>>>(value)?,
        None => None,
    };
    Ok(users.unwrap_or_default())
}

/// Probe `{backend_base}/users` and count online / in-game users.
pub async fn collect_users(
    client: &Client,
    config: &ProbeConfig,
    deadline: Option<Instant>,
) -> ProbeResult<CensusResult> {
    let url = config.endpoint(USERS_PATH);
    let timeout = bounded_timeout(Instant::now(), config.timeouts.http, deadline);
    let transport = |source| ProbeError::Transport { probe: "users", source };

    let response = authorized(client.get(&url), config)
        .timeout(timeout)
        .send()
        .await
        .map_err(transport)?;

    let status = response.status();
    if !status.is_success() {
        let body = read_prefix(response, ERROR_BODY_LIMIT).await;
        return Err(ProbeError::Status {
            probe: "users",
            status: status.as_u16(),
            body,
        });
    }

    let body = response.bytes().await.map_err(transport)?;
    let users = decode_users(&body)?;
    let census = CensusResult::tally(&users);

    tracing::debug!(
        url = %url,
        records = users.len(),
        online = census.online,
        in_game = census.in_game,
        "Census probe finished"
    );

    Ok(census)
}

/// Read at most `limit` bytes of the body, lossily decoded.
async fn read_prefix(mut response: Response, limit: usize) -> String {
    let mut buf = Vec::new();
    while buf.len() < limit {
        match response.chunk().await {
            Ok(Some(chunk)) => {
                let take = chunk.len().min(limit - buf.len());
                buf.extend_from_slice(&chunk[..take]);
            }
            Ok(None) => break,
            Err(e) => {
                tracing::debug!(error = %e, "Failed to read error body");
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}
