//! Output grammars for constrained generation.

use serde_json::{json, Value};

/// Restricts a generation to one of a fixed set of literal outputs.
///
/// Backends translate it into whatever constraint language they speak;
/// Ollama takes a JSON schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grammar {
    alternatives: Vec<String>,
}

impl Grammar {
    /// Grammar that accepts exactly one of the given literals.
    pub fn one_of<I, S>(alternatives: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            alternatives: alternatives.into_iter().map(Into::into).collect(),
        }
    }

    /// The accepted literals, in declaration order.
    pub fn alternatives(&self) -> &[String] {
        &self.alternatives
    }

    /// Render as a JSON schema accepting a single string from the set.
    pub fn to_json_schema(&self) -> Value {
        json!({
            "type": "string",
            "enum": self.alternatives,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_schema_enum() {
        let schema = Grammar::one_of(["A", "B"]).to_json_schema();
        assert_eq!(schema["type"], "string");
        assert_eq!(schema["enum"][1], "B");
    }
}
