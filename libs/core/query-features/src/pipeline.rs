//! Query pipeline: request parameters applied to a [`FindQuery`] in stages,
//! resolved by a single [`QueryPipeline::execute`].

use async_trait::async_trait;
use tracing::instrument;

use crate::envelope::ResultEnvelope;
use crate::error::QueryResult;
use crate::filter::{FilterExpression, translate};
use crate::options::QueryOptions;
use crate::pagination::Pagination;
use crate::params::{RESERVED_KEYS, RequestParams};
use crate::populate::Populate;
use crate::projection::Projection;
use crate::query::{FindQuery, QueryFilter};
use crate::schema::Schema;
use crate::search::SearchClause;
use crate::sort::SortSpec;

/// Backend that can run the two queries of a listing.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    type Item: Send;
    type Error: Send;

    async fn find(&self, query: &FindQuery) -> Result<Vec<Self::Item>, Self::Error>;

    async fn count(&self, filter: &QueryFilter) -> Result<u64, Self::Error>;
}

/// Builder over one request's parameters.
///
/// Stages may be applied in any order; filter and search always end up in
/// the same [`QueryFilter`], shared by the data and count queries.
#[derive(Debug, Clone)]
pub struct QueryPipeline {
    params: RequestParams,
    options: QueryOptions,
    schema: Option<Schema>,
    query: FindQuery,
    pagination: Option<Pagination>,
}

impl QueryPipeline {
    pub fn new(params: &RequestParams, options: &QueryOptions) -> Self {
        Self {
            params: params.clone(),
            options: *options,
            schema: None,
            query: FindQuery::default(),
            pagination: None,
        }
    }

    /// Coerce filter values with `schema` during [`QueryPipeline::filter`]
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Fixed conditions AND-ed with the request filter; on the same field
    /// they replace the request's conditions.
    pub fn scope(mut self, scope: FilterExpression) -> Self {
        let current = std::mem::take(&mut self.query.filter.expression);
        self.query.filter.expression = current.merge(scope);
        self
    }

    pub fn filter(mut self) -> QueryResult<Self> {
        let mut translated = translate(&self.params, &RESERVED_KEYS, self.options.operators)?;
        if let Some(schema) = &self.schema {
            translated = translated.coerce(schema)?;
        }
        let scoped = std::mem::take(&mut self.query.filter.expression);
        self.query.filter.expression = translated.merge(scoped);
        Ok(self)
    }

    pub fn sort(mut self) -> Self {
        self.query.sort = SortSpec::parse(self.params.get("sort"));
        self
    }

    pub fn limit_fields(mut self) -> QueryResult<Self> {
        self.query.projection = Projection::parse(self.params.get("fields"))?;
        Ok(self)
    }

    pub fn paginate(mut self) -> Self {
        let pagination = Pagination::from_raw(
            self.params.get("page"),
            self.params.get("limit"),
            &self.options.pagination,
        );
        self.query.skip = pagination.skip;
        self.query.limit = Some(pagination.limit);
        self.pagination = Some(pagination);
        self
    }

    /// Search `fields` for the `keyword` parameter, when present
    pub fn search<S: AsRef<str>>(mut self, fields: &[S]) -> Self {
        self.query.filter.search = self
            .params
            .get("keyword")
            .and_then(|keyword| SearchClause::new(keyword, fields));
        self
    }

    pub fn populate(mut self, expansion: Populate) -> Self {
        self.query.populate.push(expansion);
        self
    }

    pub fn populate_all(mut self, expansions: impl IntoIterator<Item = Populate>) -> Self {
        self.query.populate.extend(expansions);
        self
    }

    pub fn query(&self) -> &FindQuery {
        &self.query
    }

    pub fn pagination(&self) -> Option<Pagination> {
        self.pagination
    }

    /// Run the data and count queries and build the envelope.
    ///
    /// Consumes the pipeline; executor errors are returned unchanged.
    #[instrument(skip_all, fields(skip = self.query.skip, limit = ?self.query.limit))]
    pub async fn execute<E>(self, executor: &E) -> Result<ResultEnvelope<E::Item>, E::Error>
    where
        E: QueryExecutor + ?Sized,
    {
        let (data, total_count) = futures::try_join!(
            executor.find(&self.query),
            executor.count(&self.query.filter)
        )?;
        tracing::debug!(total_count, returned = data.len(), "Query executed");
        Ok(self.format_response(data, total_count))
    }

    /// Envelope for `data`; without pagination everything is one page.
    pub fn format_response<T>(&self, data: Vec<T>, total_count: u64) -> ResultEnvelope<T> {
        let (total_pages, current_page) = match self.pagination {
            Some(pagination) => (pagination.total_pages(total_count), pagination.page),
            None => (u64::from(total_count > 0), 1),
        };
        ResultEnvelope {
            results: data.len(),
            total_count,
            total_pages,
            current_page,
            limit: self.pagination.map(|pagination| pagination.limit),
            data,
        }
    }
}
