use serde::{Deserialize, Serialize};

/// A DAX or M expression as TMSL stores it: one string, or one string per line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DaxExpression {
    Single(String),
    Lines(Vec<String>),
}

impl DaxExpression {
    pub fn text(&self) -> String {
        match self {
            DaxExpression::Single(s) => s.clone(),
            DaxExpression::Lines(lines) => lines.join("\n"),
        }
    }
}

impl From<String> for DaxExpression {
    fn from(s: String) -> Self {
        if s.contains('\n') {
            DaxExpression::Lines(s.lines().map(str::to_string).collect())
        } else {
            DaxExpression::Single(s)
        }
    }
}

impl From<&str> for DaxExpression {
    fn from(s: &str) -> Self {
        DaxExpression::from(s.to_string())
    }
}
