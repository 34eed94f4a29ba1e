//! In-process evaluation of queries against JSON documents.
//!
//! Used by backends without a native query engine. Comparison semantics
//! follow the document-store conventions the adapters rely on: array fields
//! match when any element matches, and a string filter value is compared
//! numerically against a numeric field when it parses as a number.

use serde_json::{Map, Value};
use std::cmp::Ordering;

use crate::error::{QueryError, QueryResult};
use crate::filter::{Comparison, ComparisonOperator, FilterExpression};
use crate::query::QueryFilter;
use crate::search::SearchClause;
use crate::sort::{SortDirection, SortSpec};

/// Look up `path` in `document`, following dotted paths into sub-objects.
pub fn lookup<'a>(document: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    if let Some(value) = document.get(path) {
        return Some(value);
    }
    let mut segments = path.split('.');
    let mut current = document.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Ordering between two scalar values, `None` when they are not comparable.
pub fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Number(a), Value::String(b)) => a.as_f64()?.partial_cmp(&b.trim().parse().ok()?),
        (Value::String(a), Value::Number(b)) => a.trim().parse::<f64>().ok()?.partial_cmp(&b.as_f64()?),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::String(b)) => Some(a.cmp(&b.parse().ok()?)),
        (Value::String(a), Value::Bool(b)) => Some(a.parse::<bool>().ok()?.cmp(b)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

fn loosely_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Array(_), _) | (Value::Object(_), _) => left == right,
        _ => compare_values(left, right) == Some(Ordering::Equal),
    }
}

/// Stored value or, for array fields, each element
fn candidates(actual: Option<&Value>) -> Vec<&Value> {
    match actual {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(value) => vec![value],
        None => Vec::new(),
    }
}

fn equals(actual: Option<&Value>, expected: &Value) -> bool {
    match actual {
        None => expected.is_null(),
        Some(Value::Array(items)) if !expected.is_array() => {
            items.iter().any(|item| loosely_equal(item, expected))
        }
        Some(value) => loosely_equal(value, expected),
    }
}

fn list_items(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    }
}

fn ordered(actual: Option<&Value>, expected: &Value, accept: fn(Ordering) -> bool) -> bool {
    candidates(actual)
        .into_iter()
        .any(|value| compare_values(value, expected).is_some_and(accept))
}

fn evaluate(actual: Option<&Value>, comparison: &Comparison) -> QueryResult<bool> {
    let expected = &comparison.value;
    Ok(match &comparison.operator {
        ComparisonOperator::Eq => equals(actual, expected),
        ComparisonOperator::Ne => !equals(actual, expected),
        ComparisonOperator::Gt => ordered(actual, expected, Ordering::is_gt),
        ComparisonOperator::Gte => ordered(actual, expected, Ordering::is_ge),
        ComparisonOperator::Lt => ordered(actual, expected, Ordering::is_lt),
        ComparisonOperator::Lte => ordered(actual, expected, Ordering::is_le),
        ComparisonOperator::In => list_items(expected)
            .into_iter()
            .any(|item| equals(actual, item)),
        ComparisonOperator::Nin => !list_items(expected)
            .into_iter()
            .any(|item| equals(actual, item)),
        ComparisonOperator::Other(name) => {
            return Err(QueryError::UnsupportedOperator(name.clone()));
        }
    })
}

impl FilterExpression {
    /// Whether `document` satisfies every comparison
    pub fn matches(&self, document: &Map<String, Value>) -> QueryResult<bool> {
        for (field, comparisons) in self.iter() {
            let actual = lookup(document, field);
            for comparison in comparisons {
                if !evaluate(actual, comparison)? {
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }
}

impl SearchClause {
    /// Whether any search field of `document` contains the keyword
    pub fn matches(&self, document: &Map<String, Value>) -> bool {
        self.fields().iter().any(|field| {
            candidates(lookup(document, field))
                .into_iter()
                .any(|value| value.as_str().is_some_and(|text| self.matches_text(text)))
        })
    }
}

impl QueryFilter {
    /// Filter expression AND search clause
    pub fn matches(&self, document: &Map<String, Value>) -> QueryResult<bool> {
        if !self.expression.matches(document)? {
            return Ok(false);
        }
        Ok(self
            .search
            .as_ref()
            .is_none_or(|search| search.matches(document)))
    }
}

fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Number(_)) => 1,
        Some(Value::String(_)) => 2,
        Some(Value::Object(_)) => 3,
        Some(Value::Array(_)) => 4,
        Some(Value::Bool(_)) => 5,
    }
}

fn compare_for_sort(left: Option<&Value>, right: Option<&Value>) -> Ordering {
    let by_type = type_rank(left).cmp(&type_rank(right));
    if by_type != Ordering::Equal {
        return by_type;
    }
    match (left, right) {
        (Some(a), Some(b)) => compare_values(a, b).unwrap_or(Ordering::Equal),
        _ => Ordering::Equal,
    }
}

impl SortSpec {
    /// Ordering of two documents under this sort; missing fields sort first
    /// in ascending order.
    pub fn compare(&self, left: &Map<String, Value>, right: &Map<String, Value>) -> Ordering {
        for key in self.keys() {
            let ordering = compare_for_sort(lookup(left, &key.field), lookup(right, &key.field));
            let ordering = match key.direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::OperatorPolicy;
    use crate::params::{RESERVED_KEYS, RequestParams};
    use crate::schema::{FieldKind, Schema};
    use serde_json::json;

    fn doc(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn filter(query: &str) -> FilterExpression {
        let params = RequestParams::from_query_string(query);
        crate::filter::translate(&params, &RESERVED_KEYS, OperatorPolicy::AllowList).unwrap()
    }

    #[test]
    fn test_range_bounds_are_inclusive() {
        let schema = Schema::new().field("price", FieldKind::Number);
        let expr = filter("price[gte]=100&price[lte]=500").coerce(&schema).unwrap();

        assert!(expr.matches(&doc(json!({"price": 100}))).unwrap());
        assert!(expr.matches(&doc(json!({"price": 500}))).unwrap());
        assert!(expr.matches(&doc(json!({"price": 250.5}))).unwrap());
        assert!(!expr.matches(&doc(json!({"price": 99}))).unwrap());
        assert!(!expr.matches(&doc(json!({"price": 501}))).unwrap());
        assert!(!expr.matches(&doc(json!({"title": "no price"}))).unwrap());
    }

    #[test]
    fn test_uncoerced_numbers_still_compare_numerically() {
        let expr = filter("price[gt]=9");
        assert!(expr.matches(&doc(json!({"price": 10}))).unwrap());
        assert!(!expr.matches(&doc(json!({"price": 8}))).unwrap());
    }

    #[test]
    fn test_array_fields_match_any_element() {
        let expr = filter("colors=red");
        assert!(expr.matches(&doc(json!({"colors": ["blue", "red"]}))).unwrap());
        assert!(!expr.matches(&doc(json!({"colors": ["blue"]}))).unwrap());
    }

    #[test]
    fn test_in_and_nin() {
        let expr = filter("brand[in]=a,b");
        assert!(expr.matches(&doc(json!({"brand": "b"}))).unwrap());
        assert!(!expr.matches(&doc(json!({"brand": "c"}))).unwrap());

        let expr = filter("brand[nin]=a,b");
        assert!(expr.matches(&doc(json!({"brand": "c"}))).unwrap());
        assert!(expr.matches(&doc(json!({}))).unwrap());
        assert!(!expr.matches(&doc(json!({"brand": "a"}))).unwrap());
    }

    #[test]
    fn test_ne_matches_missing_field() {
        let expr = filter("brand[ne]=a");
        assert!(expr.matches(&doc(json!({}))).unwrap());
        assert!(!expr.matches(&doc(json!({"brand": "a"}))).unwrap());
    }

    #[test]
    fn test_unknown_operator_is_reported() {
        let expr = FilterExpression::new().with(
            "tags",
            ComparisonOperator::Other("size".to_string()),
            2,
        );
        assert_eq!(
            expr.matches(&doc(json!({"tags": []}))).unwrap_err(),
            QueryError::UnsupportedOperator("size".to_string())
        );
    }

    #[test]
    fn test_search_is_case_insensitive_substring() {
        let filter = QueryFilter::new().with_search(SearchClause::new("red", &["title", "description"]));
        assert!(filter.matches(&doc(json!({"title": "Big RED ball"}))).unwrap());
        assert!(filter.matches(&doc(json!({"title": "ball", "description": "reddish"}))).unwrap());
        assert!(!filter.matches(&doc(json!({"title": "blue ball"}))).unwrap());
    }

    #[test]
    fn test_filter_and_search_are_and_ed() {
        let filter = QueryFilter::from(filter("brand=a"))
            .with_search(SearchClause::new("red", &["title"]));
        assert!(filter.matches(&doc(json!({"brand": "a", "title": "red"}))).unwrap());
        assert!(!filter.matches(&doc(json!({"brand": "b", "title": "red"}))).unwrap());
        assert!(!filter.matches(&doc(json!({"brand": "a", "title": "blue"}))).unwrap());
    }

    #[test]
    fn test_dotted_lookup() {
        let document = doc(json!({"category": {"name": "Phones"}}));
        assert_eq!(lookup(&document, "category.name"), Some(&json!("Phones")));
        assert_eq!(lookup(&document, "category.slug"), None);
    }

    #[test]
    fn test_sort_compare_multiple_keys() {
        let spec = SortSpec::parse(Some("-price,title"));
        let mut docs = vec![
            doc(json!({"price": 1, "title": "b"})),
            doc(json!({"price": 5, "title": "z"})),
            doc(json!({"price": 1, "title": "a"})),
            doc(json!({"title": "none"})),
        ];
        docs.sort_by(|a, b| spec.compare(a, b));
        let titles: Vec<&str> = docs.iter().map(|d| d["title"].as_str().unwrap()).collect();
        assert_eq!(titles, vec!["z", "a", "b", "none"]);
    }
}
