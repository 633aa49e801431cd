//! Role oracle backed by an OpenAI-compatible chat completion endpoint.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use serde_json::json;
use thesisfmt::classify::{OracleAnswer, OracleRequest, RoleOracle, VerifyAnswer};
use thesisfmt::{Error, ParagraphRole, Result};

/// One configured endpoint in the key file.
#[derive(Debug, Clone, Deserialize)]
pub struct Endpoint {
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    pub model_name: String,
}

/// Read `{name: {base_url, api_key, model_name}}`.
pub fn load_endpoints(path: &Path) -> Result<BTreeMap<String, Endpoint>> {
    let data = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    #[serde(default)]
    content: Option<String>,
}

/// Chat completion client used as a [`RoleOracle`].
pub struct ChatOracle {
    client: reqwest::blocking::Client,
    endpoint: Endpoint,
    api_key: String,
    json_mode: bool,
}

impl ChatOracle {
    /// `api_key` overrides the key stored with the endpoint.
    pub fn new(endpoint: Endpoint, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let api_key = api_key
            .or_else(|| endpoint.api_key.clone())
            .ok_or_else(|| Error::Oracle(format!("no API key for model {}", endpoint.model_name)))?;
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Oracle(e.to_string()))?;
        // Doubao endpoints reject response_format.
        let json_mode = !endpoint.model_name.to_lowercase().starts_with("doubao");

        Ok(Self {
            client,
            endpoint,
            api_key,
            json_mode,
        })
    }

    fn complete(&self, system: &str, user: &str) -> Result<String> {
        let mut body = json!({
            "model": self.endpoint.model_name,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user},
            ],
        });
        if self.json_mode {
            body["response_format"] = json!({"type": "json_object"});
        }

        let url = format!("{}/chat/completions", self.endpoint.base_url.trim_end_matches('/'));
        log::debug!("oracle request to {} ({})", url, self.endpoint.model_name);
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| Error::Oracle(e.to_string()))?;
        let parsed: ChatResponse = response.json().map_err(|e| Error::Oracle(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::Oracle("empty completion".to_string()))
    }
}

fn role_list() -> String {
    ParagraphRole::ALL
        .iter()
        .map(|r| format!("{} ({})", r.label(), r.display_name_zh()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn describe(request: &OracleRequest) -> String {
    let context = request
        .context
        .iter()
        .map(|c| match &c.text {
            Some(text) => format!("#{} {}: {}", c.index, c.role, text),
            None => format!("#{} {}", c.index, c.role),
        })
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "已确定的上文段落：\n{}\n\n下一段：{}\n\n段落格式：{}\n\n需分析段落：{}",
        context,
        request.next_text.as_deref().unwrap_or(""),
        request.attributes,
        request.text
    )
}

/// Text between a ```json fence, or the whole content.
pub fn extract_json(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(start) = trimmed.find("```") else {
        return trimmed;
    };
    let after = &trimmed[start + 3..];
    let after = after.strip_prefix("json").unwrap_or(after);
    match after.find("```") {
        Some(end) => after[..end].trim(),
        None => after.trim(),
    }
}

fn parse_reply<T: serde::de::DeserializeOwned>(content: &str) -> Result<T> {
    let json = extract_json(content);
    serde_json::from_str(json).or_else(|_| Ok(serde_json::from_str(&json.replace('\'', "\""))?))
}

impl RoleOracle for ChatOracle {
    fn predict(&self, request: &OracleRequest) -> Result<OracleAnswer> {
        let system = format!(
            "你是一个论文结构分析专家。可用位置类型仅限：{}。\
             必须返回包含 location 和 confidence 字段的 JSON 对象，confidence 为 0-1 之间的数值。",
            role_list()
        );
        let content = self.complete(&system, &describe(request))?;
        parse_reply(&content)
    }

    fn verify(&self, request: &OracleRequest, assigned: ParagraphRole) -> Result<VerifyAnswer> {
        let system = "你是一个论文结构分析专家。请判断给定段落的位置类型是否正确，\
                      返回包含 is_correct（布尔值）和 confidence（0-1）字段的 JSON 对象。";
        let user = format!(
            "{}\n\n当前判定的位置类型：{} ({})",
            describe(request),
            assigned.label(),
            assigned.display_name_zh()
        );
        let content = self.complete(system, &user)?;
        parse_reply(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_fenced_json() {
        let content = "结果如下：\n```json\n{\"location\": \"body\", \"confidence\": 0.9}\n```";
        assert_eq!(extract_json(content), "{\"location\": \"body\", \"confidence\": 0.9}");
        assert_eq!(extract_json("  {\"a\": 1} "), "{\"a\": 1}");
    }

    #[test]
    fn test_parse_reply_tolerates_single_quotes() {
        let answer: OracleAnswer = parse_reply("{'location': 'heading1', 'confidence': 0.8}").unwrap();
        assert_eq!(answer.role, "heading1");
        assert!((answer.confidence - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_doubao_disables_json_mode() {
        let endpoint = Endpoint {
            base_url: "https://example.invalid/v1".into(),
            api_key: Some("key".into()),
            model_name: "doubao-pro-32k".into(),
        };
        let oracle = ChatOracle::new(endpoint, None, Duration::from_secs(5)).unwrap();
        assert!(!oracle.json_mode);
    }

    #[test]
    fn test_missing_api_key() {
        let endpoint = Endpoint {
            base_url: "https://example.invalid/v1".into(),
            api_key: None,
            model_name: "qwen-plus".into(),
        };
        assert!(ChatOracle::new(endpoint, None, Duration::from_secs(5)).is_err());
    }
}
