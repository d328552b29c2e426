//! Prompt construction for the validation agents.
//!
//! Pure functions, no state: the instruction string is fully reproducible
//! from `(agent_name, input)` alone. Each template embeds the input
//! payload pretty-printed and mandates strict-JSON output.
//!
//! The known agent identifiers are the five roles of the validation crew:
//! research (evidence discovery), analysis (pattern extraction),
//! validation (evidence verification), synthesis (narrative building),
//! and reporting (deliverable generation). Unknown identifiers get a
//! generic template with the same output contract.

#![deny(missing_docs)]

/// JSON keys a structured agent result may carry. Used both in the output
/// schema mandated by every template and by
/// [`is_structured_output_capable`].
pub const STRUCTURED_KEYS: [&str; 5] = [
    "analysis",
    "recommendations",
    "nextSteps",
    "insights",
    "status",
];

/// The strict-output clause appended to every template.
const OUTPUT_CONTRACT: &str = r#"Respond with a single strict JSON object and nothing else: no prose, no markdown fences. The object must contain exactly these keys:
{
  "analysis": string,
  "recommendations": [string],
  "nextSteps": [string],
  "insights": [string],
  "status": "completed"
}"#;

/// Build the instruction string for `agent_name` over `input`.
///
/// Known agents get a role-specific preamble; anything else falls back to
/// the generic template. All templates serialize the input verbatim
/// (pretty-printed) so the prompt carries no hidden state.
pub fn build_prompt(agent_name: &str, input: &serde_json::Value) -> String {
    let payload = serde_json::to_string_pretty(input)
        .unwrap_or_else(|_| input.to_string());
    let preamble = match agent_name {
        "research" => {
            "You are the research agent of a startup-validation crew. \
             Discover and collect evidence relevant to the venture described below: \
             market signals, comparable companies, demand indicators."
        }
        "analysis" => {
            "You are the analysis agent of a startup-validation crew. \
             Extract patterns and insights from the evidence in the payload below; \
             separate observation from interpretation."
        }
        "validation" => {
            "You are the validation agent of a startup-validation crew. \
             Assess the quality and credibility of each claim in the payload below; \
             flag weak or unsupported evidence explicitly."
        }
        "synthesis" => {
            "You are the synthesis agent of a startup-validation crew. \
             Combine the findings in the payload below into a coherent strategic \
             narrative with a clear recommendation."
        }
        "reporting" => {
            "You are the reporting agent of a startup-validation crew. \
             Turn the findings in the payload below into a concise, professional \
             deliverable for a founder audience."
        }
        _ => {
            "You are a startup-validation agent. Analyze the payload below and \
             produce actionable findings."
        }
    };
    format!("{preamble}\n\nInput payload:\n{payload}\n\n{OUTPUT_CONTRACT}")
}

/// Map an agent identifier to its fixed taxonomy tag.
pub fn framework_type_of(agent_name: &str) -> &'static str {
    match agent_name {
        "research" => "discovery",
        "analysis" => "diagnostic",
        "validation" => "verification",
        "synthesis" => "strategic",
        "reporting" => "narrative",
        _ => "general",
    }
}

/// Whether a result object carries at least one recognized
/// structured-data key. `null` and objects with none of the keys are not
/// capable; neither is anything that is not an object.
pub fn is_structured_output_capable(result: &serde_json::Value) -> bool {
    match result.as_object() {
        Some(map) => STRUCTURED_KEYS.iter().any(|key| map.contains_key(*key)),
        None => false,
    }
}
