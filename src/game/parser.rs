use serde_json::Value;

use super::backend::ModelOutput;

/// Raised when no scoring object can be recovered from the model output.
#[derive(Debug, thiserror::Error)]
pub enum MalformedResponse {
    #[error("model returned no usable text")]
    EmptyText,
    #[error("model text was not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Field-level view of the model's scoring object before clamping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedScore {
    pub change: i64,
    pub comment: String,
    pub tips: Vec<String>,
}

/// Recover `{change, comment, tips}` from whatever the backend produced.
///
/// Extraction is greedy: the slice from the first `{` to the last `}` is
/// parsed, or the whole trimmed text when no braces are present. Missing
/// or mistyped fields fall back to documented defaults; range checking is
/// left to the orchestrator.
pub fn parse_model_output(output: &ModelOutput) -> Result<ParsedScore, MalformedResponse> {
    let text = extract_text(output);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(MalformedResponse::EmptyText);
    }

    let json_slice = locate_json_object(trimmed).unwrap_or(trimmed);
    let value: Value = serde_json::from_str(json_slice)?;

    let change = value
        .get("change")
        .and_then(Value::as_f64)
        .map(|number| number as i64)
        .unwrap_or(0);
    let comment = value
        .get("comment")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();
    let tips = value
        .get("tips")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Ok(ParsedScore {
        change,
        comment,
        tips,
    })
}

fn extract_text(output: &ModelOutput) -> String {
    match output {
        ModelOutput::Text(text) | ModelOutput::Plain(text) => text.clone(),
        ModelOutput::Candidates(candidates) => candidates
            .first()
            .map(|candidate| candidate.parts.concat())
            .unwrap_or_default(),
    }
}

fn locate_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end > start {
        Some(&text[start..=end])
    } else {
        None
    }
}
