//! Two-stage parsing of JSON embedded in model output.

use serde_json::Value;

/// The top-level JSON shape a stage expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonShape {
    Array,
    Object,
}

impl JsonShape {
    fn delimiters(self) -> (char, char) {
        match self {
            Self::Array => ('[', ']'),
            Self::Object => ('{', '}'),
        }
    }

    fn matches(self, value: &Value) -> bool {
        match self {
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    /// The whole response was the expected JSON value.
    Strict(Value),
    /// The value was recovered from between the first opening and the last
    /// closing delimiter.
    Salvaged(Value),
    Failed,
}

impl ParseOutcome {
    pub fn into_value(self) -> Option<Value> {
        match self {
            Self::Strict(value) | Self::Salvaged(value) => Some(value),
            Self::Failed => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Strict(_) => "strict",
            Self::Salvaged(_) => "salvaged",
            Self::Failed => "failed",
        }
    }
}

/// Parse `text` as a JSON value of `shape`.
///
/// A strict parse of the trimmed text wins when it yields the right shape.
/// Otherwise the span from the first opening delimiter to the last closing
/// one is parsed.
pub fn parse_llm_json(text: &str, shape: JsonShape) -> ParseOutcome {
    if let Ok(value) = serde_json::from_str::<Value>(text.trim()) {
        if shape.matches(&value) {
            return ParseOutcome::Strict(value);
        }
    }

    let (open, close) = shape.delimiters();
    let (Some(start), Some(end)) = (text.find(open), text.rfind(close)) else {
        return ParseOutcome::Failed;
    };
    if start >= end {
        return ParseOutcome::Failed;
    }

    match serde_json::from_str::<Value>(&text[start..=end]) {
        Ok(value) if shape.matches(&value) => ParseOutcome::Salvaged(value),
        _ => ParseOutcome::Failed,
    }
}
