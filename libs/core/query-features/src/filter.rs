//! Query translator: flat request parameters to a structured filter expression.
//!
//! `price[gte]=10&price[lte]=100&brand=acme` becomes
//!
//! ```text
//! brand -> [eq "acme"]
//! price -> [gte "10", lte "100"]
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{QueryError, QueryResult};
use crate::params::RequestParams;
use crate::schema::Schema;

/// Comparison operators understood by the persistence adapters.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOperator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    Nin,
    /// Operator forwarded verbatim under [`OperatorPolicy::Passthrough`]
    Other(String),
}

impl ComparisonOperator {
    /// Operators accepted by [`OperatorPolicy::AllowList`]
    pub const ALLOWED: [ComparisonOperator; 8] = [
        ComparisonOperator::Eq,
        ComparisonOperator::Ne,
        ComparisonOperator::Gt,
        ComparisonOperator::Gte,
        ComparisonOperator::Lt,
        ComparisonOperator::Lte,
        ComparisonOperator::In,
        ComparisonOperator::Nin,
    ];

    pub fn name(&self) -> &str {
        match self {
            ComparisonOperator::Eq => "eq",
            ComparisonOperator::Ne => "ne",
            ComparisonOperator::Gt => "gt",
            ComparisonOperator::Gte => "gte",
            ComparisonOperator::Lt => "lt",
            ComparisonOperator::Lte => "lte",
            ComparisonOperator::In => "in",
            ComparisonOperator::Nin => "nin",
            ComparisonOperator::Other(name) => name,
        }
    }

    /// The operator with the engine's comparison marker, e.g. `$gte`
    pub fn engine_name(&self) -> String {
        format!("${}", self.name())
    }

    /// Operators whose value is a comma-separated list
    pub fn takes_list(&self) -> bool {
        matches!(self, ComparisonOperator::In | ComparisonOperator::Nin)
    }
}

impl FromStr for ComparisonOperator {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "eq" => ComparisonOperator::Eq,
            "ne" => ComparisonOperator::Ne,
            "gt" => ComparisonOperator::Gt,
            "gte" => ComparisonOperator::Gte,
            "lt" => ComparisonOperator::Lt,
            "lte" => ComparisonOperator::Lte,
            "in" => ComparisonOperator::In,
            "nin" => ComparisonOperator::Nin,
            other => ComparisonOperator::Other(other.to_string()),
        })
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How bracket operators outside [`ComparisonOperator::ALLOWED`] are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatorPolicy {
    /// Reject unknown operators with [`QueryError::DisallowedOperator`]
    #[default]
    AllowList,
    /// Forward unknown operator names to the engine unchanged
    Passthrough,
}

impl OperatorPolicy {
    fn check(&self, field: &str, operator: ComparisonOperator) -> QueryResult<ComparisonOperator> {
        match (self, &operator) {
            (OperatorPolicy::AllowList, ComparisonOperator::Other(name)) => {
                tracing::warn!(field, operator = %name, "Rejected filter operator");
                Err(QueryError::DisallowedOperator {
                    field: field.to_string(),
                    operator: name.clone(),
                })
            }
            _ => Ok(operator),
        }
    }
}

impl FromStr for OperatorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "allow_list" | "allowlist" => Ok(OperatorPolicy::AllowList),
            "passthrough" => Ok(OperatorPolicy::Passthrough),
            other => Err(format!("unknown operator policy '{}'", other)),
        }
    }
}

/// One `operator value` pair applied to a field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub operator: ComparisonOperator,
    pub value: Value,
}

impl Comparison {
    pub fn new(operator: ComparisonOperator, value: impl Into<Value>) -> Self {
        Self {
            operator,
            value: value.into(),
        }
    }
}

/// Field name to comparisons; all entries are AND-ed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterExpression {
    fields: BTreeMap<String, Vec<Comparison>>,
}

impl FilterExpression {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality condition (builder style)
    pub fn eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(field, ComparisonOperator::Eq, value)
    }

    /// Add a comparison (builder style)
    pub fn with(
        mut self,
        field: impl Into<String>,
        operator: ComparisonOperator,
        value: impl Into<Value>,
    ) -> Self {
        self.push(field.into(), Comparison::new(operator, value));
        self
    }

    /// Add a comparison; the same operator on the same field replaces the
    /// earlier value.
    pub fn push(&mut self, field: String, comparison: Comparison) {
        let comparisons = self.fields.entry(field).or_default();
        match comparisons
            .iter_mut()
            .find(|c| c.operator == comparison.operator)
        {
            Some(existing) => existing.value = comparison.value,
            None => comparisons.push(comparison),
        }
    }

    pub fn get(&self, field: &str) -> Option<&[Comparison]> {
        self.fields.get(field).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Comparison])> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Merge `other` into `self`; fields present in `other` replace ours.
    pub fn merge(mut self, other: FilterExpression) -> Self {
        for (field, comparisons) in other.fields {
            self.fields.insert(field, comparisons);
        }
        self
    }

    /// Convert string values to the kinds declared by `schema`.
    ///
    /// `in`/`nin` values become arrays of coerced elements.
    pub fn coerce(self, schema: &Schema) -> QueryResult<Self> {
        let mut fields = BTreeMap::new();
        for (field, comparisons) in self.fields {
            let mut coerced = Vec::with_capacity(comparisons.len());
            for comparison in comparisons {
                let value = coerce_value(schema, &field, &comparison.operator, comparison.value)?;
                coerced.push(Comparison {
                    operator: comparison.operator,
                    value,
                });
            }
            fields.insert(field, coerced);
        }
        Ok(Self { fields })
    }
}

fn coerce_value(
    schema: &Schema,
    field: &str,
    operator: &ComparisonOperator,
    value: Value,
) -> QueryResult<Value> {
    match value {
        Value::String(raw) if operator.takes_list() => raw
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(|item| schema.coerce(field, item))
            .collect::<QueryResult<Vec<_>>>()
            .map(Value::Array),
        Value::String(raw) => schema.coerce(field, &raw),
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(raw) => schema.coerce(field, &raw),
                other => Ok(other),
            })
            .collect::<QueryResult<Vec<_>>>()
            .map(Value::Array),
        other => Ok(other),
    }
}

/// Split a `name[operator]` key. Plain keys return `None` for the operator.
fn parse_key(key: &str) -> QueryResult<(&str, Option<&str>)> {
    let (field, operator) = match (key.find('['), key.find(']')) {
        (Some(open), Some(_)) => {
            let rest = &key[open + 1..];
            let close = rest
                .find(']')
                .ok_or_else(|| QueryError::MalformedKey(key.to_string()))?;
            (&key[..open], Some(&rest[..close]))
        }
        _ => (key, None),
    };

    if field.is_empty() || field.starts_with('$') {
        return Err(QueryError::MalformedKey(key.to_string()));
    }
    if let Some(op) = operator {
        if op.is_empty() || op.starts_with('$') {
            return Err(QueryError::MalformedKey(key.to_string()));
        }
    }
    Ok((field, operator))
}

/// Translate request parameters into a filter expression.
///
/// `excluded` keys are dropped first. Values are kept as strings; in/nin
/// values are kept raw and split during [`FilterExpression::coerce`] or by
/// the adapters.
pub fn translate(
    params: &RequestParams,
    excluded: &[&str],
    policy: OperatorPolicy,
) -> QueryResult<FilterExpression> {
    let mut expression = FilterExpression::new();

    for (key, value) in params.without(excluded) {
        let (field, operator) = parse_key(key)?;
        let operator = match operator {
            Some(name) => {
                let parsed = name.parse::<ComparisonOperator>().unwrap_or_else(|e| match e {});
                policy.check(field, parsed)?
            }
            None => ComparisonOperator::Eq,
        };

        let value = if operator.takes_list() {
            Value::Array(
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(|item| Value::String(item.to_string()))
                    .collect(),
            )
        } else {
            Value::String(value.to_string())
        };

        expression.push(field.to_string(), Comparison { operator, value });
    }

    Ok(expression)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::RESERVED_KEYS;
    use crate::schema::FieldKind;

    fn params(pairs: &[(&str, &str)]) -> RequestParams {
        pairs.iter().map(|(k, v)| (*k, *v)).collect()
    }

    #[test]
    fn test_translate_plain_key_is_equality() {
        let expr = translate(&params(&[("brand", "acme")]), &RESERVED_KEYS, OperatorPolicy::AllowList)
            .unwrap();
        assert_eq!(
            expr.get("brand").unwrap(),
            &[Comparison::new(ComparisonOperator::Eq, "acme")]
        );
    }

    #[test]
    fn test_translate_accumulates_operators_on_one_field() {
        let expr = translate(
            &params(&[("price[gte]", "10"), ("price[lte]", "100")]),
            &RESERVED_KEYS,
            OperatorPolicy::AllowList,
        )
        .unwrap();

        assert_eq!(expr.len(), 1);
        let price = expr.get("price").unwrap();
        assert_eq!(price.len(), 2);
        assert!(price.contains(&Comparison::new(ComparisonOperator::Gte, "10")));
        assert!(price.contains(&Comparison::new(ComparisonOperator::Lte, "100")));
    }

    #[test]
    fn test_translate_drops_reserved_keys() {
        let expr = translate(
            &params(&[
                ("page", "2"),
                ("limit", "5"),
                ("sort", "-price"),
                ("fields", "name"),
                ("keyword", "red"),
            ]),
            &RESERVED_KEYS,
            OperatorPolicy::AllowList,
        )
        .unwrap();
        assert!(expr.is_empty());
    }

    #[test]
    fn test_translate_rejects_unknown_operator_by_default() {
        let err = translate(
            &params(&[("name[where]", "1")]),
            &RESERVED_KEYS,
            OperatorPolicy::AllowList,
        )
        .unwrap_err();
        assert_eq!(
            err,
            QueryError::DisallowedOperator {
                field: "name".to_string(),
                operator: "where".to_string()
            }
        );
    }

    #[test]
    fn test_translate_passthrough_forwards_unknown_operator() {
        let expr = translate(
            &params(&[("tags[size]", "2")]),
            &RESERVED_KEYS,
            OperatorPolicy::Passthrough,
        )
        .unwrap();
        let tags = expr.get("tags").unwrap();
        assert_eq!(tags[0].operator, ComparisonOperator::Other("size".to_string()));
        assert_eq!(tags[0].operator.engine_name(), "$size");
    }

    #[test]
    fn test_translate_rejects_engine_keys() {
        for key in ["$where", "[gte]", "price[]", "price[$gte]"] {
            let result = translate(&params(&[(key, "1")]), &RESERVED_KEYS, OperatorPolicy::Passthrough);
            assert!(
                matches!(result, Err(QueryError::MalformedKey(_))),
                "key {key} should be rejected"
            );
        }
    }

    #[test]
    fn test_translate_splits_in_lists() {
        let expr = translate(
            &params(&[("colors[in]", "red, blue,")]),
            &RESERVED_KEYS,
            OperatorPolicy::AllowList,
        )
        .unwrap();
        assert_eq!(
            expr.get("colors").unwrap()[0].value,
            serde_json::json!(["red", "blue"])
        );
    }

    #[test]
    fn test_coerce_uses_schema_kinds() {
        let schema = Schema::new().field("price", FieldKind::Number);
        let expr = translate(
            &params(&[("price[gte]", "100"), ("price[in]", "1,2"), ("brand", "7")]),
            &RESERVED_KEYS,
            OperatorPolicy::AllowList,
        )
        .unwrap()
        .coerce(&schema)
        .unwrap();

        let price = expr.get("price").unwrap();
        assert!(price.contains(&Comparison::new(ComparisonOperator::Gte, 100)));
        assert!(price.contains(&Comparison::new(
            ComparisonOperator::In,
            serde_json::json!([1, 2])
        )));
        assert_eq!(expr.get("brand").unwrap()[0].value, serde_json::json!("7"));
    }

    #[test]
    fn test_push_replaces_repeated_operator() {
        let expr = FilterExpression::new()
            .with("price", ComparisonOperator::Gte, 1)
            .with("price", ComparisonOperator::Gte, 5);
        assert_eq!(
            expr.get("price").unwrap(),
            &[Comparison::new(ComparisonOperator::Gte, 5)]
        );
    }

    #[test]
    fn test_merge_prefers_other() {
        let base = FilterExpression::new().eq("category", "a").eq("name", "x");
        let merged = base.merge(FilterExpression::new().eq("category", "b"));
        assert_eq!(merged.get("category").unwrap()[0].value, serde_json::json!("b"));
        assert_eq!(merged.get("name").unwrap()[0].value, serde_json::json!("x"));
    }
}
