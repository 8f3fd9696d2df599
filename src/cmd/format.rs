/*!
format.rs

Shared-query response formatting: the per-type dispatch table that turns
server response items into display blocks.

Response items arrive as tagged records `{type, data}`. They deserialize
into the closed `ResponseItem` enum so every known server type has a
compile-checked handler; genuinely new types land in `Unknown` and render
as a marker line instead of vanishing.

Skip sets ("noise" types) depend on the output format:
  full : loading_indexes, stats, module_call_id
  brief: the above plus file_path_range and unknown

This module returns `DisplayBlock`s and never prints; rendering lives in
`render.rs`.
*/

use serde::Deserialize;
use serde_json::Value;

/* ---- Output Format ---- */

/// Share-viewer output format selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareFormat {
    Brief,
    Full,
    Json,
}

impl ShareFormat {
    /// Parse a `--format` value; anything unrecognized behaves as `full`.
    pub fn from_token(token: &str) -> ShareFormat {
        match token {
            "brief" => ShareFormat::Brief,
            "json" => ShareFormat::Json,
            _ => ShareFormat::Full,
        }
    }
}

/* ---- Share Payload ---- */

/// Payload of `GET {fetch-base}/{uuid}`.
#[derive(Debug, Deserialize, Default)]
pub struct SharePayload {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub queries: Vec<SharedQuery>,
}

#[derive(Debug, Deserialize, Default)]
pub struct SharedQuery {
    #[serde(default)]
    pub user_query: Option<String>,
    #[serde(default)]
    pub repos: Vec<RepoRef>,
    #[serde(default)]
    pub engine_id: Option<String>,
    #[serde(default)]
    pub response: Vec<RawItem>,
    #[serde(default)]
    pub error: Option<Value>,
}

#[derive(Debug, Deserialize, Default)]
pub struct RepoRef {
    #[serde(default)]
    pub name: String,
}

/// A response item exactly as the server sends it.
#[derive(Debug, Deserialize)]
pub struct RawItem {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Value,
}

/* ---- Response Item Dispatch ---- */

/// Closed set of server response item types.
#[derive(Debug, PartialEq)]
pub enum ResponseItem {
    ModuleCallId {
        id: String,
    },
    LoadingIndexes {
        phase: String,
        duration_seconds: Option<f64>,
    },
    FileContents {
        repo: String,
        file_path: String,
        content: String,
    },
    FilePathRange {
        file_path: String,
        range_start: i64,
        range_end: i64,
    },
    Stats {
        key: String,
        value: Option<f64>,
    },
    Text(String),
    Error(Value),
    Unknown {
        kind: String,
    },
}

impl ResponseItem {
    /// Classify a raw `{type, data}` record.
    pub fn from_raw(raw: &RawItem) -> ResponseItem {
        let data = &raw.data;
        match raw.kind.as_str() {
            "module_call_id" => ResponseItem::ModuleCallId {
                id: field_str(data, "module_call_id"),
            },
            "loading_indexes" => ResponseItem::LoadingIndexes {
                phase: field_str(data, "type"),
                duration_seconds: data.get("durationSeconds").and_then(Value::as_f64),
            },
            "file_contents" => {
                // data is a positional 3-element array: [repo, path, content]
                let at = |i: usize| {
                    data.get(i)
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string()
                };
                ResponseItem::FileContents {
                    repo: at(0),
                    file_path: at(1),
                    content: at(2),
                }
            }
            "file_path_range" => ResponseItem::FilePathRange {
                file_path: field_str(data, "file_path"),
                range_start: data.get("range_start").and_then(Value::as_i64).unwrap_or(0),
                range_end: data.get("range_end").and_then(Value::as_i64).unwrap_or(0),
            },
            "stats" => ResponseItem::Stats {
                key: field_str(data, "key"),
                value: data.get("value").and_then(Value::as_f64),
            },
            "text" => ResponseItem::Text(match data.as_str() {
                Some(s) => s.to_string(),
                None => data.to_string(),
            }),
            "error" => ResponseItem::Error(data.clone()),
            _ => ResponseItem::Unknown {
                kind: raw.kind.clone(),
            },
        }
    }

    /// Whether this item is format-dependent noise.
    pub fn is_noise(&self, format: ShareFormat) -> bool {
        match self {
            ResponseItem::LoadingIndexes { .. }
            | ResponseItem::Stats { .. }
            | ResponseItem::ModuleCallId { .. } => true,
            ResponseItem::FilePathRange { .. } | ResponseItem::Unknown { .. } => {
                format == ShareFormat::Brief
            }
            _ => false,
        }
    }

    /// Apply the per-type rendering rule.
    pub fn to_block(&self) -> DisplayBlock {
        match self {
            ResponseItem::ModuleCallId { id } => {
                DisplayBlock::Info(format!("[Module Call ID: {id}]"))
            }
            ResponseItem::LoadingIndexes {
                phase,
                duration_seconds,
            } => {
                let progress = if phase == "all_indexes" {
                    "Complete"
                } else {
                    "Loading"
                };
                let duration = duration_seconds
                    .map(|d| format!(" ({d:.2}s)"))
                    .unwrap_or_default();
                DisplayBlock::Info(format!("[{progress}: {phase}{duration}]"))
            }
            ResponseItem::FileContents {
                repo,
                file_path,
                content,
            } => DisplayBlock::File {
                repo: repo.clone(),
                file_path: file_path.clone(),
                content: content.clone(),
            },
            ResponseItem::FilePathRange {
                file_path,
                range_start,
                range_end,
            } => DisplayBlock::Info(format!(
                "[File Range: {file_path} ({range_start}-{range_end})]"
            )),
            ResponseItem::Stats { key, value } => {
                let duration = value.map(|v| format!(" {v:.2}ms")).unwrap_or_default();
                DisplayBlock::Info(format!("[Stats: {key}{duration}]"))
            }
            ResponseItem::Text(content) => DisplayBlock::Text(content.clone()),
            ResponseItem::Error(data) => DisplayBlock::Info(format!(
                "[Error: {}]",
                serde_json::to_string(data).unwrap_or_default()
            )),
            ResponseItem::Unknown { kind } => {
                DisplayBlock::Info(format!("[Unknown type: {kind}]"))
            }
        }
    }
}

fn field_str(data: &Value, key: &str) -> String {
    data.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/* ---- Display Blocks ---- */

/// Normalized output unit consumed by the renderer.
#[derive(Debug, PartialEq)]
pub enum DisplayBlock {
    Header(String),
    Text(String),
    Info(String),
    File {
        repo: String,
        file_path: String,
        content: String,
    },
    Error(String),
}

/* ---- Title Cleaning ---- */

/// Strip embedded `<relevant_context>...</relevant_context>` sections.
///
/// Falls back to the raw input when stripping leaves nothing but
/// whitespace, so a tag-only title still displays something.
pub fn clean_title(text: &str) -> String {
    const OPEN: &str = "<relevant_context>";
    const CLOSE: &str = "</relevant_context>";

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find(OPEN) {
        out.push_str(&rest[..start]);
        match rest[start..].find(CLOSE) {
            Some(end) => rest = &rest[start + end + CLOSE.len()..],
            None => {
                // Unclosed tag: drop everything after it, as a lazy match would.
                rest = "";
                break;
            }
        }
    }
    out.push_str(rest);

    let trimmed = out.trim();
    if trimmed.is_empty() {
        text.to_string()
    } else {
        trimmed.to_string()
    }
}

/* ---- Formatter ---- */

/// Turn the raw share payload into ordered display blocks.
pub fn format_share(raw: &Value, format: ShareFormat) -> Vec<DisplayBlock> {
    let pretty = |v: &Value| serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string());

    if format == ShareFormat::Json {
        return vec![DisplayBlock::Text(pretty(raw))];
    }

    let payload: SharePayload = match serde_json::from_value(raw.clone()) {
        Ok(p) => p,
        Err(_) => return vec![DisplayBlock::Text(pretty(raw))],
    };
    let Some(query) = payload.queries.first() else {
        return vec![DisplayBlock::Text(pretty(raw))];
    };

    let mut blocks = Vec::new();

    let title = payload
        .title
        .as_deref()
        .map(clean_title)
        .filter(|t| !t.is_empty())
        .or_else(|| {
            query
                .user_query
                .as_deref()
                .map(clean_title)
                .filter(|t| !t.is_empty())
        })
        .unwrap_or_else(|| "DeepWiki Query Result".to_string());
    blocks.push(DisplayBlock::Header(title));

    if format == ShareFormat::Full && !query.repos.is_empty() {
        let names: Vec<&str> = query.repos.iter().map(|r| r.name.as_str()).collect();
        blocks.push(DisplayBlock::Header(format!("📚 Repos: {}", names.join(", "))));
    }

    if format == ShareFormat::Full
        && let Some(engine) = &query.engine_id
    {
        blocks.push(DisplayBlock::Info(format!("🔍 Engine: {engine}")));
    }

    if query.response.is_empty() {
        match &query.error {
            Some(err) => blocks.push(DisplayBlock::Error(pretty(err))),
            None => blocks.push(DisplayBlock::Info("No response data available".to_string())),
        }
        return blocks;
    }

    for raw_item in &query.response {
        let item = ResponseItem::from_raw(raw_item);
        if item.is_noise(format) {
            continue;
        }
        blocks.push(item.to_block());
    }

    if let Some(err) = &query.error {
        blocks.push(DisplayBlock::Error(format!(
            "Error: {}",
            serde_json::to_string(err).unwrap_or_default()
        )));
    }

    blocks
}

/* --------------------------------- Tests ---------------------------------- */
