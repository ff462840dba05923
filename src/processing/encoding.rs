//! Label encoding of categorical columns

use serde::{Deserialize, Serialize};

/// Code given to nulls and to categories unseen during `fit`
pub const UNKNOWN_CODE: f64 = -1.0;

/// Maps each category to its rank among the sorted training categories
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    pub fn fit<'a>(values: impl IntoIterator<Item = Option<&'a str>>) -> Self {
        let mut classes: Vec<String> = values.into_iter().flatten().map(str::to_string).collect();
        classes.sort_unstable();
        classes.dedup();
        Self { classes }
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn encode(&self, value: Option<&str>) -> f64 {
        value
            .and_then(|v| self.classes.binary_search_by(|c| c.as_str().cmp(v)).ok())
            .map(|code| code as f64)
            .unwrap_or(UNKNOWN_CODE)
    }

    pub fn transform<'a>(&self, values: impl IntoIterator<Item = Option<&'a str>>) -> Vec<f64> {
        values.into_iter().map(|v| self.encode(v)).collect()
    }
}
