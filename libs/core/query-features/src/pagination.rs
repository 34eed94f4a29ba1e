use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;
pub const MAX_LIMIT: u64 = 100;

/// Bounds applied when reading `page` / `limit` from a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationConfig {
    pub default_limit: u64,
    pub max_limit: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
            max_limit: MAX_LIMIT,
        }
    }
}

/// Resolved page window: `skip = (page - 1) * limit`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
    pub skip: u64,
}

impl Pagination {
    /// Resolve page and limit from raw request values.
    ///
    /// Values are read like a leading-integer parse (`"3abc"` is 3). Missing,
    /// non-numeric or non-positive values use the defaults; a limit above
    /// `config.max_limit` falls back to the default limit.
    pub fn from_raw(page: Option<&str>, limit: Option<&str>, config: &PaginationConfig) -> Self {
        let page = page
            .and_then(parse_leading_int)
            .filter(|p| *p >= 1)
            .map(|p| p as u64)
            .unwrap_or(DEFAULT_PAGE);

        let limit = limit
            .and_then(parse_leading_int)
            .filter(|l| *l >= 1 && (*l as u64) <= config.max_limit)
            .map(|l| l as u64)
            .unwrap_or(config.default_limit);

        Self::new(page, limit)
    }

    pub fn new(page: u64, limit: u64) -> Self {
        let page = page.max(1);
        let limit = limit.max(1);
        Self {
            page,
            limit,
            skip: (page - 1).saturating_mul(limit),
        }
    }

    /// `ceil(total_count / limit)`
    pub fn total_pages(&self, total_count: u64) -> u64 {
        total_count.div_ceil(self.limit)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE, DEFAULT_LIMIT)
    }
}

/// Optional sign followed by digits, ignoring leading whitespace and any
/// trailing garbage.
fn parse_leading_int(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    let value: i64 = digits[..end].parse().ok()?;
    Some(if negative { -value } else { value })
}
