use std::collections::HashMap;

use mongodb::bson::{doc, Bson, Document};

const DEFAULT_LIMIT: i64 = 100;
const RESERVED: [&str; 4] = ["page", "sort", "limit", "fields"];

/// Filter/sort/paginate/project settings parsed from the query string.
///
/// Supported forms: `difficulty=easy`, `price[gte]=500`,
/// `sort=-price,name`, `fields=name,price`, `page=2&limit=10`.
#[derive(Debug)]
pub struct QueryFeatures {
    pub filter: Document,
    pub sort: Option<Document>,
    pub projection: Option<Document>,
    pub skip: u64,
    pub limit: i64,
}

impl QueryFeatures {
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let mut filter = Document::new();

        for (key, value) in params {
            if RESERVED.contains(&key.as_str()) {
                continue;
            }
            match parse_operator_key(key) {
                Some((field, op)) => {
                    // Several operators can target the same field
                    let mut ops = match filter.get_document(field) {
                        Ok(existing) => existing.clone(),
                        Err(_) => Document::new(),
                    };
                    ops.insert(format!("${}", op), parse_value(value));
                    filter.insert(field, ops);
                }
                None => {
                    filter.insert(key.clone(), parse_value(value));
                }
            }
        }

        let sort = params.get("sort").map(|raw| {
            let mut sort = Document::new();
            for field in raw.split(',').filter(|f| !f.is_empty()) {
                match field.strip_prefix('-') {
                    Some(field) => sort.insert(field, -1),
                    None => sort.insert(field, 1),
                };
            }
            sort
        });

        let projection = params.get("fields").map(|raw| {
            let mut projection = Document::new();
            for field in raw.split(',').filter(|f| !f.is_empty()) {
                projection.insert(field, 1);
            }
            projection
        });

        let limit = params
            .get("limit")
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(DEFAULT_LIMIT);
        let page = params
            .get("page")
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(1);

        QueryFeatures {
            filter,
            sort,
            projection,
            skip: (page - 1) * limit as u64,
            limit,
        }
    }
}

// "price[gte]" -> ("price", "gte")
fn parse_operator_key(key: &str) -> Option<(&str, &str)> {
    let open = key.find('[')?;
    let close = key.strip_suffix(']')?;
    let op = &close[open + 1..];
    if matches!(op, "gte" | "gt" | "lte" | "lt") {
        Some((&key[..open], op))
    } else {
        None
    }
}

fn parse_value(value: &str) -> Bson {
    if let Ok(n) = value.parse::<i64>() {
        return Bson::Int64(n);
    }
    if let Ok(n) = value.parse::<f64>() {
        return Bson::Double(n);
    }
    match value {
        "true" => Bson::Boolean(true),
        "false" => Bson::Boolean(false),
        _ => Bson::String(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_plain_equality_filter() {
        let features = QueryFeatures::from_params(&params(&[("difficulty", "easy")]));
        assert_eq!(features.filter, doc! { "difficulty": "easy" });
    }

    #[test]
    fn test_operator_suffix_filter() {
        let features = QueryFeatures::from_params(&params(&[("price[gte]", "500")]));
        assert_eq!(
            features.filter,
            doc! { "price": { "$gte": Bson::Int64(500) } }
        );
    }

    #[test]
    fn test_combined_operators_on_one_field() {
        let features =
            QueryFeatures::from_params(&params(&[("duration[gte]", "5"), ("duration[lt]", "10")]));
        let duration = features.filter.get_document("duration").unwrap();
        assert_eq!(duration.get_i64("$gte").unwrap(), 5);
        assert_eq!(duration.get_i64("$lt").unwrap(), 10);
    }

    #[test]
    fn test_sort_with_descending_prefix() {
        let features = QueryFeatures::from_params(&params(&[("sort", "-price,name")]));
        let sort = features.sort.unwrap();
        assert_eq!(sort.get_i32("price").unwrap(), -1);
        assert_eq!(sort.get_i32("name").unwrap(), 1);
    }

    #[test]
    fn test_fields_projection() {
        let features = QueryFeatures::from_params(&params(&[("fields", "name,price")]));
        let projection = features.projection.unwrap();
        assert_eq!(projection.get_i32("name").unwrap(), 1);
        assert_eq!(projection.get_i32("price").unwrap(), 1);
    }

    #[test]
    fn test_pagination_defaults_and_skip() {
        let features = QueryFeatures::from_params(&params(&[]));
        assert_eq!(features.skip, 0);
        assert_eq!(features.limit, DEFAULT_LIMIT);

        let features = QueryFeatures::from_params(&params(&[("page", "3"), ("limit", "10")]));
        assert_eq!(features.skip, 20);
        assert_eq!(features.limit, 10);
    }

    #[test]
    fn test_reserved_params_not_in_filter() {
        let features = QueryFeatures::from_params(&params(&[
            ("page", "2"),
            ("sort", "price"),
            ("limit", "5"),
            ("fields", "name"),
        ]));
        assert!(features.filter.is_empty());
    }
}
