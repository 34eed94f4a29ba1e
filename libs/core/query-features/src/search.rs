use serde::{Deserialize, Serialize};

/// Case-insensitive substring match of one keyword over several fields,
/// OR-ed together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchClause {
    keyword: String,
    fields: Vec<String>,
}

impl SearchClause {
    /// `None` when the keyword is blank or there is nothing to search in.
    pub fn new<S: AsRef<str>>(keyword: &str, fields: &[S]) -> Option<Self> {
        let keyword = keyword.trim();
        if keyword.is_empty() || fields.is_empty() {
            return None;
        }
        Some(Self {
            keyword: keyword.to_string(),
            fields: fields.iter().map(|f| f.as_ref().to_string()).collect(),
        })
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Regex matching the keyword literally
    pub fn pattern(&self) -> String {
        regex::escape(&self.keyword)
    }

    /// Whether `text` contains the keyword, ignoring case
    pub fn matches_text(&self, text: &str) -> bool {
        text.to_lowercase().contains(&self.keyword.to_lowercase())
    }
}
