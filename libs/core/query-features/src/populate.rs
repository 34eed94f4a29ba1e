use serde::{Deserialize, Serialize};

/// Replace the reference id stored at `path` with selected fields of the
/// referenced document from the `from` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Populate {
    pub path: String,
    pub from: String,
    pub select: Vec<String>,
}

impl Populate {
    pub fn new(path: impl Into<String>, from: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            from: from.into(),
            select: Vec::new(),
        }
    }

    /// Restrict the populated document to `fields` (plus `_id`)
    pub fn select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select = fields.into_iter().map(Into::into).collect();
        self
    }
}
