/*!
share.rs

The view_share command: a single REST GET against the share-fetch
endpoint, no SSE involved. The payload is pushed through the formatter
dispatch table and rendered; a query-level `error` in the payload still
renders its block but exits 1.
*/

use anyhow::{Context, Result, bail};
use serde_json::Value;
use std::time::Duration;

use super::format::{ShareFormat, format_share};
use super::render::render;
use crate::i18n::Messages;
use crate::log_debug;

/// Base URL for shared query results; the UUID is appended as a path segment.
pub const SHARE_ENDPOINT: &str = "https://api.devin.ai/ada/query";

/// Per-request timeout, same budget as the SSE session.
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetch a shared query result by UUID and render it.
pub fn execute_share(params: &serde_json::Map<String, Value>, msgs: &Messages) -> Result<()> {
    // Validation guarantees uuid is present.
    let uuid = params.get("uuid").and_then(Value::as_str).unwrap_or_default();
    let format = ShareFormat::from_token(
        params
            .get("format")
            .and_then(Value::as_str)
            .unwrap_or("full"),
    );

    let rt = tokio::runtime::Runtime::new().context("Failed to create Tokio runtime")?;
    let payload = rt
        .block_on(fetch_share(uuid))
        .map_err(|e| anyhow::anyhow!("{}: {e:#}", msgs.err_request_failed))?;

    let blocks = format_share(&payload, format);
    render(&blocks);

    if query_error_present(&payload) {
        bail!("{}", msgs.err_request_failed);
    }
    Ok(())
}

async fn fetch_share(uuid: &str) -> Result<Value> {
    let url = format!("{SHARE_ENDPOINT}/{uuid}");
    log_debug!("GET {}", url);

    let resp = reqwest::Client::new()
        .get(&url)
        .header(reqwest::header::ACCEPT, "application/json")
        .timeout(FETCH_TIMEOUT)
        .send()
        .await
        .with_context(|| format!("GET {url}"))?;

    let status = resp.status();
    let body = resp.text().await.with_context(|| format!("GET {url}"))?;
    if !status.is_success() {
        bail!("HTTP {status}: {body}");
    }

    serde_json::from_str(&body).context("share payload is not valid JSON")
}

/// True when the first query carries a top-level `error` field.
fn query_error_present(payload: &Value) -> bool {
    payload
        .get("queries")
        .and_then(Value::as_array)
        .and_then(|qs| qs.first())
        .and_then(|q| q.get("error"))
        .is_some_and(|e| !e.is_null())
}

/* --------------------------------- Tests ---------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn detects_query_level_error() {
        let with = json!({"queries": [{"error": {"msg": "x"}}]});
        let without = json!({"queries": [{"response": []}]});
        let null_error = json!({"queries": [{"error": null}]});
        assert!(query_error_present(&with));
        assert!(!query_error_present(&without));
        assert!(!query_error_present(&null_error));
        assert!(!query_error_present(&json!({})));
    }
}
