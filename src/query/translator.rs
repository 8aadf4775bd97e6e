//! Translates flat HTTP query parameters into a structured query
//! descriptor: filter predicates, a sort specification, a text-search
//! term, a field projection, and the raw paging inputs.

use std::collections::HashMap;

/// Parameter names that never become filter predicates.
const RESERVED: &[&str] = &["page", "limit", "sort", "search", "select"];

/// How a filterable field is typed in storage. Drives value parsing
/// and SQL generation in the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Bool,
    Timestamp,
    TextArray,
}

/// Per-resource declaration of what may be filtered, searched, and
/// sorted. `table` and `scope_column` identify the tenant-scoped
/// collection the executor runs against.
#[derive(Debug, Clone, Copy)]
pub struct Manifest {
    pub table: &'static str,
    pub scope_column: &'static str,
    pub filterable: &'static [(&'static str, FieldKind)],
    pub searchable: &'static [&'static str],
    pub sortable: &'static [&'static str],
}

impl Manifest {
    fn field_kind(&self, field: &str) -> Option<(&'static str, FieldKind)> {
        self.filterable
            .iter()
            .find(|(name, _)| *name == field)
            .map(|&(name, kind)| (name, kind))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Eq(String),
    Gt(String),
    Gte(String),
    Lt(String),
    Lte(String),
    In(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: &'static str,
    pub kind: FieldKind,
    pub predicate: Predicate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortKey {
    pub field: &'static str,
    pub descending: bool,
}

#[derive(Debug, Clone, Default)]
pub struct QueryDescriptor {
    pub filters: Vec<Filter>,
    pub sort: Vec<SortKey>,
    pub search: Option<String>,
    pub select: Option<Vec<String>>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Parse query parameters against a manifest.
///
/// Unknown fields and unparseable page/limit values are silently
/// ignored; the tenant scope is never part of the descriptor and is
/// applied unconditionally by the executor.
pub fn translate(params: &HashMap<String, String>, manifest: &Manifest) -> QueryDescriptor {
    let mut descriptor = QueryDescriptor {
        page: params.get("page").and_then(|v| v.parse().ok()),
        limit: params.get("limit").and_then(|v| v.parse().ok()),
        search: params
            .get("search")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
        select: params.get("select").map(|s| {
            s.split(',')
                .map(|f| f.trim().to_string())
                .filter(|f| !f.is_empty())
                .collect()
        }),
        sort: parse_sort(params.get("sort").map(String::as_str), manifest),
        filters: Vec::new(),
    };

    for (key, raw) in params {
        if RESERVED.contains(&key.as_str()) {
            continue;
        }
        let Some((field, kind)) = manifest.field_kind(key) else {
            continue;
        };
        descriptor.filters.push(Filter {
            field,
            kind,
            predicate: parse_predicate(raw),
        });
    }

    // Deterministic filter order regardless of HashMap iteration
    descriptor.filters.sort_by_key(|f| f.field);

    descriptor
}

fn parse_predicate(raw: &str) -> Predicate {
    if let Some(v) = raw.strip_prefix("gte:") {
        Predicate::Gte(v.to_string())
    } else if let Some(v) = raw.strip_prefix("gt:") {
        Predicate::Gt(v.to_string())
    } else if let Some(v) = raw.strip_prefix("lte:") {
        Predicate::Lte(v.to_string())
    } else if let Some(v) = raw.strip_prefix("lt:") {
        Predicate::Lt(v.to_string())
    } else if let Some(v) = raw.strip_prefix("in:") {
        Predicate::In(
            v.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        )
    } else {
        Predicate::Eq(raw.to_string())
    }
}

/// Absent or fully-unrecognized `sort` falls back to creation time
/// descending so pagination is deterministic across requests.
fn parse_sort(raw: Option<&str>, manifest: &Manifest) -> Vec<SortKey> {
    let mut keys = Vec::new();
    if let Some(raw) = raw {
        for item in raw.split(',') {
            let item = item.trim();
            if item.is_empty() {
                continue;
            }
            let (name, descending) = match item.strip_prefix('-') {
                Some(rest) => (rest, true),
                None => (item, false),
            };
            if let Some(field) = manifest.sortable.iter().find(|f| **f == name).copied() {
                keys.push(SortKey { field, descending });
            }
        }
    }
    if keys.is_empty() {
        keys.push(SortKey {
            field: "created_at",
            descending: true,
        });
    }
    keys
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: Manifest = Manifest {
        table: "tokens",
        scope_column: "project_id",
        filterable: &[
            ("category", FieldKind::Text),
            ("deprecated", FieldKind::Bool),
            ("name", FieldKind::Text),
            ("tags", FieldKind::TextArray),
            ("created_at", FieldKind::Timestamp),
        ],
        searchable: &["name", "path", "description", "tags"],
        sortable: &["name", "category", "created_at", "updated_at"],
    };

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn plain_value_becomes_equality_predicate() {
        let q = translate(&params(&[("category", "color")]), &MANIFEST);
        assert_eq!(q.filters.len(), 1);
        assert_eq!(q.filters[0].field, "category");
        assert_eq!(q.filters[0].predicate, Predicate::Eq("color".to_string()));
    }

    #[test]
    fn operator_suffixes_map_to_range_predicates() {
        let q = translate(
            &params(&[("created_at", "gte:2024-01-01T00:00:00Z")]),
            &MANIFEST,
        );
        assert_eq!(
            q.filters[0].predicate,
            Predicate::Gte("2024-01-01T00:00:00Z".to_string())
        );

        let q = translate(&params(&[("created_at", "lt:2024-06-01T00:00:00Z")]), &MANIFEST);
        assert_eq!(
            q.filters[0].predicate,
            Predicate::Lt("2024-06-01T00:00:00Z".to_string())
        );
    }

    #[test]
    fn in_suffix_splits_comma_separated_values() {
        let q = translate(&params(&[("category", "in:color,spacing")]), &MANIFEST);
        assert_eq!(
            q.filters[0].predicate,
            Predicate::In(vec!["color".to_string(), "spacing".to_string()])
        );
    }

    #[test]
    fn reserved_and_unknown_params_are_not_filters() {
        let q = translate(
            &params(&[
                ("page", "2"),
                ("limit", "10"),
                ("search", "primary"),
                ("select", "name,value"),
                ("bogus", "whatever"),
                ("category", "color"),
            ]),
            &MANIFEST,
        );
        assert_eq!(q.filters.len(), 1);
        assert_eq!(q.page, Some(2));
        assert_eq!(q.limit, Some(10));
        assert_eq!(q.search.as_deref(), Some("primary"));
        assert_eq!(
            q.select,
            Some(vec!["name".to_string(), "value".to_string()])
        );
    }

    #[test]
    fn sort_parses_direction_and_ignores_unknown_fields() {
        let q = translate(&params(&[("sort", "-name,nonsense,category")]), &MANIFEST);
        assert_eq!(
            q.sort,
            vec![
                SortKey { field: "name", descending: true },
                SortKey { field: "category", descending: false },
            ]
        );
    }

    #[test]
    fn missing_sort_defaults_to_created_at_descending() {
        let q = translate(&params(&[]), &MANIFEST);
        assert_eq!(
            q.sort,
            vec![SortKey { field: "created_at", descending: true }]
        );
    }

    #[test]
    fn search_composes_with_filters() {
        let q = translate(
            &params(&[("search", "primary"), ("category", "color")]),
            &MANIFEST,
        );
        assert_eq!(q.search.as_deref(), Some("primary"));
        assert_eq!(q.filters.len(), 1);
    }

    #[test]
    fn unparseable_paging_values_fall_back_to_defaults() {
        let q = translate(&params(&[("page", "abc"), ("limit", "-")]), &MANIFEST);
        assert_eq!(q.page, None);
        assert_eq!(q.limit, None);
    }
}
