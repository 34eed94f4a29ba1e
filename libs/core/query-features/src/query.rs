//! The explicit query value handed to persistence adapters.

use serde::{Deserialize, Serialize};

use crate::filter::FilterExpression;
use crate::populate::Populate;
use crate::projection::Projection;
use crate::search::SearchClause;
use crate::sort::SortSpec;

/// Filter expression AND-ed with an optional search clause.
///
/// The data query and the count query of one request always share the same
/// `QueryFilter`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryFilter {
    pub expression: FilterExpression,
    pub search: Option<SearchClause>,
}

impl QueryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, search: Option<SearchClause>) -> Self {
        self.search = search;
        self
    }

    /// Matches every document
    pub fn is_empty(&self) -> bool {
        self.expression.is_empty() && self.search.is_none()
    }
}

impl From<FilterExpression> for QueryFilter {
    fn from(expression: FilterExpression) -> Self {
        Self {
            expression,
            search: None,
        }
    }
}

/// Everything needed to run one data query.
///
/// An unset `limit` returns all matching documents; an empty sort keeps the
/// backend's natural order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FindQuery {
    pub filter: QueryFilter,
    pub sort: SortSpec,
    pub projection: Projection,
    pub skip: u64,
    pub limit: Option<u64>,
    pub populate: Vec<Populate>,
}

impl Default for FindQuery {
    fn default() -> Self {
        Self {
            filter: QueryFilter::default(),
            sort: SortSpec::new(Vec::new()),
            projection: Projection::default(),
            skip: 0,
            limit: None,
            populate: Vec::new(),
        }
    }
}

impl FindQuery {
    pub fn new(filter: impl Into<QueryFilter>) -> Self {
        Self {
            filter: filter.into(),
            ..Self::default()
        }
    }
}
