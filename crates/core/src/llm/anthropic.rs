use crate::config::Settings;
use crate::domain::contract::{LlmStockPicks, StockPickSet};
use crate::llm::error::LlmDiagnosticsError;
use crate::llm::json;
use crate::llm::{LlmClient, PicksRequest, Provider};
use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_MODEL: &str = "claude-3-5-sonnet-latest";
const DEFAULT_MAX_TOKENS: u32 = 2048;
const DEFAULT_TIMEOUT_SECS: u64 = 60;

const TOOL_NAME_EMIT_PICKS: &str = "emit_stock_picks";

#[derive(Debug, Clone)]
pub struct AnthropicClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
}

impl AnthropicClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let api_key = settings.require_anthropic_api_key()?.to_string();
        let base_url =
            std::env::var("ANTHROPIC_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model = std::env::var("ANTHROPIC_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let max_tokens = std::env::var("ANTHROPIC_MAX_TOKENS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(DEFAULT_MAX_TOKENS);

        let timeout_secs = std::env::var("ANTHROPIC_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self {
            http,
            api_key,
            base_url,
            model,
            max_tokens,
        })
    }

    async fn create_message(
        &self,
        req: CreateMessageRequest,
    ) -> anyhow::Result<(serde_json::Value, CreateMessageResponse)> {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", HeaderValue::from_str(&self.api_key)?);
        headers.insert(
            "anthropic-version",
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );

        let url = format!("{}/v1/messages", self.base_url.trim_end_matches('/'));
        let res = self
            .http
            .post(url)
            .headers(headers)
            .json(&req)
            .send()
            .await
            .context("Anthropic request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read Anthropic response body")?;
        if !status.is_success() {
            let raw_response_json = serde_json::from_str::<serde_json::Value>(&text).ok();
            return Err(LlmDiagnosticsError {
                provider: Provider::Anthropic,
                stage: "http",
                detail: format!("status={status}"),
                raw_output: Some(text),
                raw_response_json,
            }
            .into());
        }

        let raw_json = serde_json::from_str::<serde_json::Value>(&text)
            .with_context(|| format!("failed to parse Anthropic response JSON: {text}"))?;
        let parsed = serde_json::from_value::<CreateMessageResponse>(raw_json.clone())
            .context("failed to decode Anthropic response into CreateMessageResponse")?;
        Ok((raw_json, parsed))
    }

    fn tools() -> Vec<Tool> {
        // Strict schema for the picks contract; explicit keys maximise
        // compliance.
        let schema = serde_json::json!({
            "type": "object",
            "additionalProperties": false,
            "required": ["stocks", "summary", "disclaimer"],
            "properties": {
                "stocks": {
                    "type": "array",
                    "minItems": 6,
                    "maxItems": 8,
                    "items": {
                        "type": "object",
                        "additionalProperties": false,
                        "required": ["symbol", "exchange", "name", "roughRiskBucket", "role", "rationale"],
                        "properties": {
                            "symbol": {"type": "string"},
                            "exchange": {"type": "string", "enum": ["NSE", "BSE"]},
                            "name": {"type": "string"},
                            "roughRiskBucket": {"type": "string", "enum": ["low", "medium", "high"]},
                            "role": {"type": ["string", "null"]},
                            "rationale": {"type": ["string", "null"]}
                        }
                    }
                },
                "summary": {"type": ["string", "null"]},
                "disclaimer": {"type": ["string", "null"]}
            }
        });

        vec![Tool {
            name: TOOL_NAME_EMIT_PICKS,
            description: "Emit the final stock picks as structured JSON",
            input_schema: schema,
        }]
    }

    fn tool_choice() -> ToolChoice {
        ToolChoice::Tool {
            name: TOOL_NAME_EMIT_PICKS,
        }
    }

    fn system_prompt() -> String {
        [
            "You are a professional Indian equity research assistant.",
            "You only operate inside the NSE/BSE stock universe.",
            "Return ONLY valid JSON. Do not wrap in markdown. Do not include any extra keys.",
            "No trailing commas. No comments. Use double quotes for all JSON strings.",
            "Output schema:",
            "{",
            "  \"stocks\": [",
            "    {",
            "      \"symbol\": \"RELIANCE\",",
            "      \"exchange\": \"NSE\",",
            "      \"name\": \"Reliance Industries Ltd\",",
            "      \"roughRiskBucket\": \"medium\",",
            "      \"role\": \"core compounder\",",
            "      \"rationale\": \"...\"",
            "    }",
            "  ],",
            "  \"summary\": \"...\",",
            "  \"disclaimer\": \"...\"",
            "}",
            "Rules:",
            "- stocks must have 6 to 8 entries, each liquid and widely followed",
            "- symbol is bare, WITHOUT the .NS/.BO suffix",
            "- exchange must be NSE or BSE",
            "- roughRiskBucket must be low, medium or high",
            "- role and rationale keys MUST be present (use null if none)",
            "- Do not recommend trades or price targets; this is idea screening only",
        ]
        .join("\n")
    }

    fn user_prompt(request: &PicksRequest) -> String {
        format!(
            "User profile:\n{}\n\nTask: Pick 6-8 liquid, widely followed Indian stocks from NSE \
             or BSE that fit the user's risk profile and investment horizon. For each, return \
             symbol (without .NS/.BO), exchange (NSE/BSE), name, roughRiskBucket \
             (low/medium/high), role and rationale.",
            request.user_context_json()
        )
    }

    fn repair_prompt(previous_output: &str) -> String {
        let schema = [
            "{",
            "  \"stocks\": [",
            "    {",
            "      \"symbol\": \"RELIANCE\",",
            "      \"exchange\": \"NSE\",",
            "      \"name\": \"Reliance Industries Ltd\",",
            "      \"roughRiskBucket\": \"medium\",",
            "      \"role\": null,",
            "      \"rationale\": null",
            "    }",
            "  ],",
            "  \"summary\": null,",
            "  \"disclaimer\": null",
            "}",
        ]
        .join("\n");

        format!(
            "Your previous message was NOT valid JSON.\n\n\
TASK: Output ONLY a single JSON object that exactly matches the schema and rules.\n\
- Do NOT include any markdown, prose, or code fences.\n\
- Do NOT include trailing commas or comments.\n\
- Use double quotes for all JSON strings.\n\
- stocks MUST have 6 to 8 entries with bare symbols and exchange NSE or BSE.\n\
- Each entry MUST include keys: symbol, exchange, name, roughRiskBucket, role, rationale.\n\n\
SCHEMA:\n{schema}\n\n\
INVALID OUTPUT (for reference only; DO NOT copy verbatim):\n{previous_output}"
        )
    }

    fn response_text(res: &CreateMessageResponse) -> String {
        let mut out = String::new();
        for block in &res.content {
            match block {
                ContentBlock::Text { text } => {
                    if !out.is_empty() {
                        out.push('\n');
                    }
                    out.push_str(text);
                }
                ContentBlock::ToolUse { .. } => {
                    // Callers read tool output via `response_tool_picks`.
                    continue;
                }
                ContentBlock::Thinking { .. } | ContentBlock::RedactedThinking { .. } => {}
                ContentBlock::Unknown => {}
            }
        }
        out
    }

    fn response_tool_picks(
        res: &CreateMessageResponse,
    ) -> anyhow::Result<Option<LlmStockPicks>> {
        for block in &res.content {
            if let ContentBlock::ToolUse { name, input, .. } = block {
                if name == TOOL_NAME_EMIT_PICKS {
                    let parsed = serde_json::from_value::<LlmStockPicks>(input.clone())
                        .context("failed to decode tool_use.input into LlmStockPicks")?;
                    return Ok(Some(parsed));
                }
            }
        }
        Ok(None)
    }

    async fn try_parse_with_repairs(
        &self,
        initial_text: String,
        initial_raw_json: serde_json::Value,
    ) -> anyhow::Result<StockPickSet> {
        match json::parse_picks(&initial_text) {
            Ok(picks) => Ok(picks),
            Err(first_err) => {
                let mut last_err = first_err;
                let mut last_text = initial_text;
                let mut last_raw_json = initial_raw_json;

                // Repair attempts: 2
                for attempt in 1..=2u32 {
                    let repair_req = CreateMessageRequest {
                        model: self.model.clone(),
                        max_tokens: self.max_tokens,
                        system: Some(Self::system_prompt()),
                        messages: vec![Message {
                            role: "user",
                            content: Self::repair_prompt(&last_text),
                        }],
                        tools: Some(Self::tools()),
                        tool_choice: Some(Self::tool_choice()),
                    };

                    let (repair_raw_json, repair_res) = self.create_message(repair_req).await?;

                    if let Some(tool_picks) = Self::response_tool_picks(&repair_res)? {
                        return tool_picks.validate_and_into_picks();
                    }

                    let repair_text = Self::response_text(&repair_res);
                    match json::parse_picks(&repair_text) {
                        Ok(picks) => return Ok(picks),
                        Err(err) => {
                            last_err = err;
                            last_text = repair_text;
                            last_raw_json = repair_raw_json;
                            tracing::warn!(
                                attempt,
                                error = %last_err,
                                "LLM output still invalid after repair attempt"
                            );
                        }
                    }
                }

                Err(LlmDiagnosticsError {
                    provider: Provider::Anthropic,
                    stage: "parse_after_repair",
                    detail: format!("final_error={last_err}"),
                    raw_output: Some(last_text),
                    raw_response_json: Some(last_raw_json),
                }
                .into())
            }
        }
    }
}

#[async_trait::async_trait]
impl LlmClient for AnthropicClient {
    fn provider(&self) -> Provider {
        Provider::Anthropic
    }

    async fn generate_stock_picks(
        &self,
        request: &PicksRequest,
    ) -> anyhow::Result<StockPickSet> {
        let make_req = |max_tokens: u32| CreateMessageRequest {
            model: self.model.clone(),
            max_tokens,
            system: Some(Self::system_prompt()),
            messages: vec![Message {
                role: "user",
                content: Self::user_prompt(request),
            }],
            tools: Some(Self::tools()),
            tool_choice: Some(Self::tool_choice()),
        };

        let (mut raw_json, mut res) = self.create_message(make_req(self.max_tokens)).await?;

        // If the model hit max_tokens, retry once with a higher ceiling.
        if matches!(res.stop_reason.as_deref(), Some("max_tokens")) {
            let bumped = self.max_tokens.saturating_mul(2).max(4096);
            tracing::warn!(
                from = self.max_tokens,
                to = bumped,
                "Anthropic stop_reason=max_tokens; retrying once with higher max_tokens"
            );
            let (rj, r) = self.create_message(make_req(bumped)).await?;
            raw_json = rj;
            res = r;
        }

        // Tool output path.
        if let Some(tool_picks) = Self::response_tool_picks(&res)? {
            return tool_picks.validate_and_into_picks();
        }

        // Fallback to text (should be rare).
        let text = Self::response_text(&res);
        self.try_parse_with_repairs(text, raw_json).await
    }
}

#[derive(Debug, Clone, Serialize)]
struct CreateMessageRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<Message>,

    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Tool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<ToolChoice>,
}

#[derive(Debug, Clone, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Clone, Deserialize)]
struct CreateMessageResponse {
    content: Vec<ContentBlock>,

    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
struct Tool {
    name: &'static str,
    description: &'static str,
    input_schema: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
enum ToolChoice {
    #[serde(rename = "tool")]
    Tool { name: &'static str },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },

    #[serde(rename = "tool_use")]
    ToolUse {
        #[serde(default)]
        id: String,
        #[serde(default)]
        name: String,
        #[serde(default)]
        input: serde_json::Value,
    },

    #[serde(rename = "thinking")]
    Thinking {
        #[serde(default)]
        thinking: String,
        #[serde(default)]
        signature: String,
    },

    #[serde(rename = "redacted_thinking")]
    RedactedThinking {
        #[serde(default)]
        data: String,
    },

    #[serde(other)]
    Unknown,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pick_json(i: usize) -> serde_json::Value {
        json!({
            "symbol": format!("STOCK{i}"),
            "exchange": "NSE",
            "name": format!("Stock {i} Ltd"),
            "roughRiskBucket": "medium",
            "role": "tactical growth",
            "rationale": "Sector leadership"
        })
    }

    #[test]
    fn parses_tool_use_picks_input() {
        let tool_input = json!({
            "stocks": (1..=6).map(pick_json).collect::<Vec<_>>(),
            "summary": "Six ideas",
            "disclaimer": "Not advice",
        });

        let res = CreateMessageResponse {
            content: vec![ContentBlock::ToolUse {
                id: "toolu_1".to_string(),
                name: TOOL_NAME_EMIT_PICKS.to_string(),
                input: tool_input,
            }],
            stop_reason: None,
        };

        let parsed = AnthropicClient::response_tool_picks(&res).unwrap().unwrap();
        let picks = parsed.validate_and_into_picks().unwrap();
        assert_eq!(picks.suggestions.len(), 6);
        assert_eq!(picks.suggestions[0].symbol, "STOCK1");
        assert_eq!(picks.summary.as_deref(), Some("Six ideas"));
    }

    #[test]
    fn ignores_unrelated_tool_blocks() {
        let res = CreateMessageResponse {
            content: vec![ContentBlock::ToolUse {
                id: "toolu_1".to_string(),
                name: "something_else".to_string(),
                input: json!({}),
            }],
            stop_reason: None,
        };
        assert!(AnthropicClient::response_tool_picks(&res).unwrap().is_none());
    }

    #[test]
    fn response_text_joins_text_blocks() {
        let res = CreateMessageResponse {
            content: vec![
                ContentBlock::Text {
                    text: "part one".to_string(),
                },
                ContentBlock::Text {
                    text: "part two".to_string(),
                },
            ],
            stop_reason: None,
        };
        assert_eq!(AnthropicClient::response_text(&res), "part one\npart two");
    }
}
