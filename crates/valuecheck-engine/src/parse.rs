//! JSON extraction from free-form model text.
//!
//! Strips code fences, slices from the first `{` to the last `}`, rejects
//! unbalanced braces and hands the rest to `serde_json`. Malformed JSON is
//! never repaired; the error is the caller's signal to fall back.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use valuecheck_utils::error::AssessmentError;

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"```json\s?|```").unwrap());

/// Extract the JSON object embedded in `raw`.
///
/// # Errors
///
/// Returns `AssessmentError::Parse` when no `{`..`}` pair exists, the braces
/// are unbalanced (a truncated response) or the slice is not valid JSON.
pub fn parse_json(raw: &str) -> Result<Value, AssessmentError> {
    let cleaned = CODE_FENCE.replace_all(raw, "");
    let cleaned = cleaned.trim();

    let (Some(start), Some(end)) = (cleaned.find('{'), cleaned.rfind('}')) else {
        return Err(AssessmentError::Parse(
            "response did not contain a JSON object".to_string(),
        ));
    };
    if end <= start {
        return Err(AssessmentError::Parse(
            "response did not contain a JSON object".to_string(),
        ));
    }

    let candidate = &cleaned[start..=end];
    check_balanced(candidate)?;

    let value: Value = serde_json::from_str(candidate)
        .map_err(|e| AssessmentError::Parse(format!("invalid JSON: {e}")))?;

    if value.is_object() {
        Ok(value)
    } else {
        Err(AssessmentError::Parse(
            "response JSON is not an object".to_string(),
        ))
    }
}

/// Brace and bracket depth check that ignores string contents.
fn check_balanced(text: &str) -> Result<(), AssessmentError> {
    let mut braces: i64 = 0;
    let mut brackets: i64 = 0;
    let mut in_string = false;
    let mut escaped = false;

    for c in text.chars() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => braces += 1,
            '}' => braces -= 1,
            '[' => brackets += 1,
            ']' => brackets -= 1,
            _ => {}
        }

        if braces < 0 || brackets < 0 {
            break;
        }
    }

    if braces == 0 && brackets == 0 && !in_string {
        Ok(())
    } else {
        Err(AssessmentError::Parse(format!(
            "unbalanced JSON ({braces} unclosed braces, {brackets} unclosed brackets); response looks truncated"
        )))
    }
}
