use serde::{Deserialize, Serialize};

/// Paginated listing response.
///
/// `total_count` covers every document matching the filter and search,
/// regardless of the page window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultEnvelope<T> {
    /// Number of items in `data`
    pub results: usize,
    pub total_count: u64,
    pub total_pages: u64,
    pub current_page: u64,
    /// Page size; absent when the listing was not paginated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    pub data: Vec<T>,
}

impl<T> ResultEnvelope<T> {
    /// Convert every item, keeping the counters
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> ResultEnvelope<U> {
        let data: Vec<U> = self.data.into_iter().map(f).collect();
        ResultEnvelope {
            results: data.len(),
            total_count: self.total_count,
            total_pages: self.total_pages,
            current_page: self.current_page,
            limit: self.limit,
            data,
        }
    }

    /// Fallible variant of [`ResultEnvelope::map`]
    pub fn try_map<U, E>(self, f: impl FnMut(T) -> Result<U, E>) -> Result<ResultEnvelope<U>, E> {
        let data = self.data.into_iter().map(f).collect::<Result<Vec<U>, E>>()?;
        Ok(ResultEnvelope {
            results: data.len(),
            total_count: self.total_count,
            total_pages: self.total_pages,
            current_page: self.current_page,
            limit: self.limit,
            data,
        })
    }
}
