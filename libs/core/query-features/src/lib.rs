//! Query features
//!
//! Turns flat request parameters (`price[gte]=10&sort=-price&page=2&keyword=red`)
//! into a bounded, backend-agnostic [`FindQuery`] and resolves it through a
//! [`QueryExecutor`] into a [`ResultEnvelope`].
//!
//! ```text
//! RequestParams ─► translate ─► FilterExpression ─┐
//!                  SortSpec / Projection          ├─► FindQuery ─► QueryExecutor
//!                  Pagination / SearchClause ─────┘                 (find + count)
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use query_features::{QueryOptions, QueryPipeline, RequestParams};
//!
//! let params = RequestParams::from_query_string("price[gte]=100&sort=-price&page=2");
//! let envelope = QueryPipeline::new(&params, &QueryOptions::default())
//!     .filter()?
//!     .sort()
//!     .limit_fields()?
//!     .paginate()
//!     .search(&["title", "description"])
//!     .execute(&executor)
//!     .await?;
//! ```

pub mod envelope;
pub mod error;
pub mod eval;
pub mod filter;
pub mod options;
pub mod pagination;
pub mod params;
pub mod pipeline;
pub mod populate;
pub mod projection;
pub mod query;
pub mod schema;
pub mod search;
pub mod sort;

pub use envelope::ResultEnvelope;
pub use error::{QueryError, QueryResult};
pub use filter::{
    Comparison, ComparisonOperator, FilterExpression, OperatorPolicy, translate,
};
pub use options::QueryOptions;
pub use pagination::{Pagination, PaginationConfig};
pub use params::{RESERVED_KEYS, RequestParams};
pub use pipeline::{QueryExecutor, QueryPipeline};
pub use populate::Populate;
pub use projection::{ID_FIELD, Projection, VERSION_FIELD};
pub use query::{FindQuery, QueryFilter};
pub use schema::{FieldKind, Schema};
pub use search::SearchClause;
pub use sort::{DEFAULT_SORT_FIELD, SortDirection, SortKey, SortSpec};
