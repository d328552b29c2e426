//! Request/response mapping between vantage-core types and the Chat
//! Completions API format.

use vantage_core::{ProviderError, ProviderRequest, ProviderResponse, Role, TokenUsage};

/// Convert a [`ProviderRequest`] into the Chat Completions JSON body.
#[must_use]
pub fn to_api_request(req: &ProviderRequest, default_model: &str) -> serde_json::Value {
    let model = req
        .model
        .clone()
        .unwrap_or_else(|| default_model.to_string());

    let messages: Vec<serde_json::Value> = req
        .messages
        .iter()
        .map(|msg| {
            let role = match msg.role {
                Role::System => "system",
                Role::User => "user",
                Role::Assistant => "assistant",
            };
            serde_json::json!({"role": role, "content": msg.content})
        })
        .collect();

    let mut body = serde_json::json!({
        "model": model,
        "messages": messages,
    });

    if let Some(max_tokens) = req.max_tokens {
        body["max_completion_tokens"] = serde_json::Value::from(max_tokens);
    }

    if let Some(temp) = req.temperature {
        body["temperature"] = serde_json::Value::from(temp);
    }

    // Merge extra provider-specific fields last (they can override anything above)
    if let serde_json::Value::Object(extra_map) = &req.extra {
        if let serde_json::Value::Object(body_map) = &mut body {
            for (k, v) in extra_map {
                body_map.insert(k.clone(), v.clone());
            }
        }
    }

    body
}

/// Parse a Chat Completions response into a [`ProviderResponse`].
///
/// The pipeline consumes the first choice's message content as raw text;
/// tool calls are out of scope.
pub fn parse_response(
    json: &serde_json::Value,
    default_model: &str,
) -> Result<ProviderResponse, ProviderError> {
    let content = json["choices"][0]["message"]["content"]
        .as_str()
        .ok_or_else(|| {
            ProviderError::InvalidResponse("missing choices[0].message.content".to_string())
        })?
        .to_owned();

    let model = json["model"].as_str().unwrap_or(default_model).to_owned();

    let usage = &json["usage"];
    let usage = TokenUsage {
        input_tokens: usage["prompt_tokens"].as_u64().unwrap_or(0),
        output_tokens: usage["completion_tokens"].as_u64().unwrap_or(0),
    };

    Ok(ProviderResponse {
        content,
        model,
        usage,
    })
}
