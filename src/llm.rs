//! Rule extraction through an OpenAI-compatible chat completions endpoint.

use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::debug;

use crate::config::OpenAiConfig;

pub const PRIMITIVE_SYSTEM_PROMPT: &str = r#"You are an expert at software and AI agent development, with additional
expertise in the development of primitives for defining rule sets. The rule sets are
required to enforce the actions of a platform or Agent, and are used to eliminate
AI hallucinations. The rule sets can be inherent in simple tools like checklists,
process flowcharts, standard operating procedures, and/or legislation. You must
be able to recognize what the rule sets are in different sources.
Extract every enforceable operational rule, requirement, or prohibition
("primitive") from the provided text block. A primitive is the smallest
enforceable operational truth. It can be a procedural rule, a legal rule, or
any actionable instruction, even if embedded in a paragraph, bullet, or Q&A
format.
Output must be a JSON array of strings, where each string is a single enforceable
rule or statement. Do not include any explanations, reasoning, or text outside the
JSON array.
If the page contains multiple rules, extract each as a separate string in the array.
If no primitives are present, return an empty array [].
Legal context (BC Emergency and Disaster Management Act 2023). These are valid
primitives when relevant to the input text:
- s.52: Local government must have an emergency plan that includes evacuation
support.
- s.95: Local government may declare a state of local emergency.
- s.77: Provincial Minister may order an evacuation if the local government is
unable or unwilling.
- s.107: Authorities may issue evacuation alerts/orders and modify or rescind
them as required for response and public safety; this enables extraordinary
powers under Part 5, Division 4, ss.75-78.
Extraordinary powers (use only if the input text is about these powers):
- Essential goods and services control
- Price regulation to prevent gouging
- Rationing and distribution of scarce supplies
- Requisition of qualified services
- Use of property and equipment
- Entry without warrant for rescue/hazard/utility security
- Removal or demolition of unsafe structures
- Evacuations and removals of people and animals
- Control of travel and access
- Restriction of businesses and events
- Control of dangerous activities
Do NOT generate a primitive for:
-- section headers, introductions, metadata, or references
-- "see page"/"refer to" statements
If no valid primitive exists, output an empty list []."#;

#[derive(Debug, Error)]
pub enum ResponseParseError {
    #[error("response is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("response JSON is a {0}, expected an array of strings")]
    NotAnArray(&'static str),

    #[error("array element {index} is a {kind}, expected a string")]
    NonStringElement { index: usize, kind: &'static str },
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("OPENAI_API_KEY is not set")]
    NotConfigured,

    #[error("request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    #[error("{url} returned HTTP {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("completion response has no message content")]
    MissingContent,

    #[error("malformed completion: {0}")]
    Malformed(#[from] ResponseParseError),
}

/// Turns a block of document text into primitive rule strings.
pub trait RuleExtractor {
    /// `Ok(vec![])` means the block holds no rules.
    fn extract(&self, text_block: &str, context: Option<&str>)
    -> Result<Vec<String>, ExtractionError>;
}

pub struct OpenAiExtractor {
    agent: ureq::Agent,
    config: OpenAiConfig,
}

impl OpenAiExtractor {
    pub fn new(agent: ureq::Agent, config: OpenAiConfig) -> Self {
        Self { agent, config }
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }

    fn request_body(&self, text_block: &str, context: Option<&str>) -> serde_json::Value {
        json!({
            "model": self.config.model,
            "messages": build_messages(text_block, context),
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
        })
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

impl RuleExtractor for OpenAiExtractor {
    fn extract(
        &self,
        text_block: &str,
        context: Option<&str>,
    ) -> Result<Vec<String>, ExtractionError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(ExtractionError::NotConfigured)?;
        let url = self.completions_url();

        let response = self
            .agent
            .post(&url)
            .set("Authorization", &format!("Bearer {api_key}"))
            .send_json(self.request_body(text_block, context))
            .map_err(|error| match error {
                ureq::Error::Status(status, response) => ExtractionError::Status {
                    url: url.clone(),
                    status,
                    body: response.into_string().unwrap_or_default(),
                },
                ureq::Error::Transport(transport) => ExtractionError::Transport {
                    url: url.clone(),
                    reason: transport.to_string(),
                },
            })?;

        let completion: CompletionResponse =
            response
                .into_json()
                .map_err(|error| ExtractionError::Transport {
                    url: url.clone(),
                    reason: format!("unreadable response body: {error}"),
                })?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(ExtractionError::MissingContent)?;

        debug!(model = %self.config.model, chars = content.len(), "completion received");
        Ok(parse_rule_array(&content)?)
    }
}

fn build_messages(text_block: &str, context: Option<&str>) -> Vec<serde_json::Value> {
    let mut messages = vec![
        json!({ "role": "system", "content": PRIMITIVE_SYSTEM_PROMPT }),
        json!({ "role": "user", "content": text_block }),
    ];
    if let Some(context) = context.filter(|context| !context.trim().is_empty()) {
        messages.push(json!({ "role": "user", "content": format!("Context: {context}") }));
    }
    messages
}

/// Drop Markdown code fence lines when the content opens with one.
pub fn strip_code_fences(content: &str) -> String {
    let trimmed = content.trim();
    let opens_with_fence = trimmed
        .lines()
        .next()
        .is_some_and(|line| line.trim_start().starts_with("```"));
    if !opens_with_fence {
        return trimmed.to_string();
    }

    trimmed
        .lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Parse model output into trimmed, non-empty rule strings.
pub fn parse_rule_array(content: &str) -> Result<Vec<String>, ResponseParseError> {
    let value: serde_json::Value =
        serde_json::from_str(&strip_code_fences(content)).map_err(ResponseParseError::InvalidJson)?;

    let items = match value {
        serde_json::Value::Array(items) => items,
        other => return Err(ResponseParseError::NotAnArray(json_kind(&other))),
    };

    let mut rules = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match item {
            serde_json::Value::String(rule) => {
                let rule = rule.trim();
                if !rule.is_empty() {
                    rules.push(rule.to_string());
                }
            }
            other => {
                return Err(ResponseParseError::NonStringElement {
                    index,
                    kind: json_kind(&other),
                });
            }
        }
    }

    Ok(rules)
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{CannedServer, closed_port_url};

    #[test]
    fn parse_rule_array_accepts_fenced_json() {
        let content = "```json\n[\"Residents must evacuate when ordered.\", \"  \", \" Keep exits clear. \"]\n```";
        let rules = parse_rule_array(content).expect("fenced array should parse");
        assert_eq!(
            rules,
            vec!["Residents must evacuate when ordered.", "Keep exits clear."]
        );
    }

    #[test]
    fn parse_rule_array_distinguishes_empty_from_malformed() {
        assert_eq!(
            parse_rule_array("[]").expect("empty array is valid"),
            Vec::<String>::new()
        );

        let error = parse_rule_array("No rules here.").expect_err("prose is malformed");
        assert!(matches!(error, ResponseParseError::InvalidJson(_)));

        let error = parse_rule_array("{\"rules\": []}").expect_err("object is malformed");
        assert!(matches!(error, ResponseParseError::NotAnArray("object")));

        let error = parse_rule_array("[\"ok rule\", 3]").expect_err("number element");
        assert!(matches!(
            error,
            ResponseParseError::NonStringElement {
                index: 1,
                kind: "number"
            }
        ));
    }

    #[test]
    fn strip_code_fences_leaves_unfenced_content_alone() {
        assert_eq!(strip_code_fences("  [\"a\"]  "), "[\"a\"]");
        assert_eq!(strip_code_fences("```\n[]\n```"), "[]");
    }

    #[test]
    fn build_messages_appends_context_only_when_present() {
        let messages = build_messages("block", None);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[1]["content"], "block");

        let messages = build_messages("block", Some("Emergency Act"));
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[2]["content"], "Context: Emergency Act");

        assert_eq!(build_messages("block", Some("  ")).len(), 2);
    }

    fn extractor(base_url: &str, api_key: Option<&str>) -> OpenAiExtractor {
        OpenAiExtractor::new(
            ureq::agent(),
            OpenAiConfig {
                api_key: api_key.map(ToOwned::to_owned),
                base_url: base_url.to_string(),
                model: "test-model".to_string(),
                temperature: 0.2,
                max_tokens: 16,
            },
        )
    }

    fn completion(content: &str) -> String {
        json!({ "choices": [{ "message": { "role": "assistant", "content": content } }] })
            .to_string()
    }

    #[test]
    fn extract_without_api_key_is_not_configured() {
        let error = extractor("http://127.0.0.1:9", None)
            .extract("Residents must evacuate.", None)
            .expect_err("missing key should fail");
        assert!(matches!(error, ExtractionError::NotConfigured));
    }

    #[test]
    fn request_body_carries_exact_sampling_settings() {
        let body = extractor("http://127.0.0.1:9", Some("sk-test"))
            .request_body("Keep exits clear.", Some("Fire code"));

        assert_eq!(body["model"], "test-model");
        assert_eq!(body["max_tokens"], 16);
        assert_eq!(body["messages"].as_array().map(Vec::len), Some(3));
        assert_eq!(body["temperature"].to_string(), "0.2");
    }

    #[test]
    fn extract_decodes_fenced_completion() {
        let content = "```json\n[\"Keep exits clear.\", \"Sign every form.\"]\n```";
        let server = CannedServer::start("200 OK", &completion(content));

        let rules = extractor(&server.base_url(), Some("sk-test"))
            .extract("Exits stay clear. Forms are signed.", Some("Fire code"))
            .expect("completion should parse");

        assert_eq!(rules, vec!["Keep exits clear.", "Sign every form."]);
        let request = server.request();
        assert!(request.starts_with("POST /chat/completions "));
        assert!(request.contains("Bearer sk-test"));
        assert!(request.contains("Context: Fire code"));
    }

    #[test]
    fn extract_maps_http_error_status() {
        let server = CannedServer::start("500 Internal Server Error", r#"{"error":"boom"}"#);

        let error = extractor(&server.base_url(), Some("sk-test"))
            .extract("Keep exits clear.", None)
            .expect_err("server error should fail");

        match error {
            ExtractionError::Status { status, body, .. } => {
                assert_eq!(status, 500);
                assert!(body.contains("boom"));
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[test]
    fn extract_without_choices_is_missing_content() {
        let server = CannedServer::start("200 OK", r#"{"choices":[]}"#);

        let error = extractor(&server.base_url(), Some("sk-test"))
            .extract("Keep exits clear.", None)
            .expect_err("empty choices should fail");
        assert!(matches!(error, ExtractionError::MissingContent));
    }

    #[test]
    fn extract_reports_malformed_completion_content() {
        let server = CannedServer::start("200 OK", &completion("I found no rules."));

        let error = extractor(&server.base_url(), Some("sk-test"))
            .extract("Keep exits clear.", None)
            .expect_err("prose should fail");
        assert!(matches!(
            error,
            ExtractionError::Malformed(ResponseParseError::InvalidJson(_))
        ));
    }

    #[test]
    fn extract_maps_refused_connection_to_transport() {
        let error = extractor(&closed_port_url(), Some("sk-test"))
            .extract("Keep exits clear.", None)
            .expect_err("closed port should fail");
        assert!(matches!(error, ExtractionError::Transport { .. }));
    }
}
