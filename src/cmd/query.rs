/*!
query.rs

Executes the three MCP tool commands (read_wiki_structure,
read_wiki_contents, ask_question): one SSE session, one tool call,
print the joined text result.

A JSON-RPC level error in the id-2 reply is an application failure and
exits 1, same as transport failures.
*/

use anyhow::{Context, Result, bail};
use serde_json::Value;

use crate::cli::Command;
use crate::i18n::Messages;
use crate::mcp::{self, CallOutcome, McpError};

/// Run one tool invocation and print its textual result to stdout.
pub fn execute_query(
    command: Command,
    params: &serde_json::Map<String, Value>,
    msgs: &Messages,
) -> Result<()> {
    let rt = tokio::runtime::Runtime::new().context("Failed to create Tokio runtime")?;

    let outcome = rt
        .block_on(mcp::call_tool(command.name(), params))
        .map_err(|e| localize(e, msgs))?;

    match outcome {
        CallOutcome::Text(text) => println!("{text}"),
        CallOutcome::ToolError(err) => {
            let detail = serde_json::to_string_pretty(&err).unwrap_or_else(|_| err.to_string());
            bail!("{}: {}", msgs.err_request_failed, detail);
        }
        CallOutcome::Other(msg) => {
            println!(
                "{}",
                serde_json::to_string_pretty(&msg).unwrap_or_else(|_| msg.to_string())
            );
        }
    }
    Ok(())
}

/// Map protocol failures onto the localized error catalog, keeping the
/// underlying detail.
fn localize(err: McpError, msgs: &Messages) -> anyhow::Error {
    match &err {
        McpError::Timeout => anyhow::anyhow!("{}", msgs.err_timeout),
        McpError::Connect(_) | McpError::NoEndpoint | McpError::StreamClosed => {
            anyhow::anyhow!("{}: {}", msgs.err_connection_failed, err)
        }
        McpError::BadEndpoint(_) | McpError::Request { .. } => {
            anyhow::anyhow!("{}: {}", msgs.err_request_failed, err)
        }
    }
}

/* --------------------------------- Tests ---------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::{Lang, catalog};

    #[test]
    fn timeout_maps_to_distinct_message() {
        let msgs = catalog(Lang::En);
        let err = localize(McpError::Timeout, msgs);
        assert_eq!(err.to_string(), msgs.err_timeout);
    }

    #[test]
    fn transport_failures_keep_detail() {
        let msgs = catalog(Lang::En);
        let err = localize(McpError::Connect("dns failure".into()), msgs);
        let text = err.to_string();
        assert!(text.starts_with(msgs.err_connection_failed));
        assert!(text.contains("dns failure"));
    }

    #[test]
    fn post_failures_are_request_errors() {
        let msgs = catalog(Lang::En);
        let err = localize(
            McpError::Request {
                method: "initialize",
                detail: "HTTP 500".into(),
            },
            msgs,
        );
        let text = err.to_string();
        assert!(text.starts_with(msgs.err_request_failed));
        assert!(text.contains("initialize"));
    }
}
