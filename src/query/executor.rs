//! Runs a translated query descriptor against a tenant-scoped Postgres
//! table and shapes the uniform response page.
//!
//! The tenant scope is the first predicate of every generated statement
//! and cannot be overridden by client input. Column names are only ever
//! taken from the static manifest; client values are always bound.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::error::AppError;
use crate::query::pagination::{PageRequest, Pagination, plan};
use crate::query::translator::{FieldKind, Filter, Manifest, Predicate, QueryDescriptor};

#[derive(Debug, Serialize)]
pub struct QueryPage {
    pub count: usize,
    pub total: i64,
    pub pagination: Pagination,
    pub data: Vec<serde_json::Value>,
}

pub async fn execute<T>(
    pool: &PgPool,
    manifest: &Manifest,
    scope: Uuid,
    query: &QueryDescriptor,
    max_limit: i64,
) -> Result<QueryPage, AppError>
where
    T: for<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> + Serialize + Send + Unpin,
{
    let request = PageRequest::new(query.page, query.limit, max_limit);

    let mut count_qb = QueryBuilder::<Postgres>::new(format!(
        "SELECT COUNT(*) FROM {} WHERE {} = ",
        manifest.table, manifest.scope_column
    ));
    count_qb.push_bind(scope);
    push_conditions(&mut count_qb, manifest, query)?;
    let total: i64 = count_qb.build_query_scalar().fetch_one(pool).await?;

    let mut qb = QueryBuilder::<Postgres>::new(format!(
        "SELECT * FROM {} WHERE {} = ",
        manifest.table, manifest.scope_column
    ));
    qb.push_bind(scope);
    push_conditions(&mut qb, manifest, query)?;

    qb.push(" ORDER BY ");
    for (i, key) in query.sort.iter().enumerate() {
        if i > 0 {
            qb.push(", ");
        }
        qb.push(format!(
            "{} {}",
            key.field,
            if key.descending { "DESC" } else { "ASC" }
        ));
    }
    qb.push(" LIMIT ");
    qb.push_bind(request.take());
    qb.push(" OFFSET ");
    qb.push_bind(request.skip());

    let rows: Vec<T> = qb.build_query_as().fetch_all(pool).await?;
    let data = project_rows(&rows, query.select.as_deref())?;

    Ok(QueryPage {
        count: data.len(),
        total,
        pagination: plan(request, total),
        data,
    })
}

fn push_conditions(
    qb: &mut QueryBuilder<'_, Postgres>,
    manifest: &Manifest,
    query: &QueryDescriptor,
) -> Result<(), AppError> {
    for filter in &query.filters {
        push_filter(qb, filter)?;
    }

    if let Some(term) = &query.search {
        let pattern = format!("%{term}%");
        qb.push(" AND (");
        for (i, column) in manifest.searchable.iter().enumerate() {
            if i > 0 {
                qb.push(" OR ");
            }
            // Array columns are searched as a flattened string
            if *column == "tags" {
                qb.push("array_to_string(tags, ' ') ILIKE ");
            } else {
                qb.push(format!("{column} ILIKE "));
            }
            qb.push_bind(pattern.clone());
        }
        qb.push(")");
    }

    Ok(())
}

fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &Filter) -> Result<(), AppError> {
    match (&filter.predicate, filter.kind) {
        (Predicate::In(values), FieldKind::Text) => {
            qb.push(format!(" AND {} = ANY(", filter.field));
            qb.push_bind(values.clone());
            qb.push(")");
        }
        (Predicate::In(values), FieldKind::TextArray) => {
            // Set membership on an array column means overlap
            qb.push(format!(" AND {} && ", filter.field));
            qb.push_bind(values.clone());
        }
        (Predicate::In(values), FieldKind::Bool) => {
            let parsed = values
                .iter()
                .map(|v| parse_bool(filter.field, v))
                .collect::<Result<Vec<_>, _>>()?;
            qb.push(format!(" AND {} = ANY(", filter.field));
            qb.push_bind(parsed);
            qb.push(")");
        }
        (Predicate::In(values), FieldKind::Timestamp) => {
            let parsed = values
                .iter()
                .map(|v| parse_timestamp(filter.field, v))
                .collect::<Result<Vec<_>, _>>()?;
            qb.push(format!(" AND {} = ANY(", filter.field));
            qb.push_bind(parsed);
            qb.push(")");
        }
        (predicate, kind) => {
            let raw = match predicate {
                Predicate::Eq(v)
                | Predicate::Gt(v)
                | Predicate::Gte(v)
                | Predicate::Lt(v)
                | Predicate::Lte(v) => v,
                // In-predicates are fully handled by the arms above
                Predicate::In(_) => return Ok(()),
            };
            match kind {
                FieldKind::TextArray => {
                    if !matches!(predicate, Predicate::Eq(_)) {
                        return Err(AppError::BadRequest(format!(
                            "Range operators are not supported on '{}'",
                            filter.field
                        )));
                    }
                    // Equality on an array column means containment
                    qb.push(" AND ");
                    qb.push_bind(raw.clone());
                    qb.push(format!(" = ANY({})", filter.field));
                }
                FieldKind::Text => {
                    qb.push(format!(" AND {}{}", filter.field, op_sql(predicate)));
                    qb.push_bind(raw.clone());
                }
                FieldKind::Bool => {
                    qb.push(format!(" AND {}{}", filter.field, op_sql(predicate)));
                    qb.push_bind(parse_bool(filter.field, raw)?);
                }
                FieldKind::Timestamp => {
                    qb.push(format!(" AND {}{}", filter.field, op_sql(predicate)));
                    qb.push_bind(parse_timestamp(filter.field, raw)?);
                }
            }
        }
    }
    Ok(())
}

fn op_sql(predicate: &Predicate) -> &'static str {
    match predicate {
        Predicate::Eq(_) => " = ",
        Predicate::Gt(_) => " > ",
        Predicate::Gte(_) => " >= ",
        Predicate::Lt(_) => " < ",
        Predicate::Lte(_) => " <= ",
        Predicate::In(_) => " = ",
    }
}

fn parse_bool(field: &str, raw: &str) -> Result<bool, AppError> {
    match raw {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(AppError::BadRequest(format!(
            "Invalid boolean value for '{field}'"
        ))),
    }
}

/// Accepts RFC 3339 timestamps or bare `YYYY-MM-DD` dates.
fn parse_timestamp(field: &str, raw: &str) -> Result<DateTime<Utc>, AppError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(date) = raw.parse::<NaiveDate>() {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }
    Err(AppError::BadRequest(format!(
        "Invalid timestamp value for '{field}'"
    )))
}

/// Serialize rows and apply the projection. The id field always
/// survives projection so results stay addressable.
fn project_rows<T: Serialize>(
    rows: &[T],
    select: Option<&[String]>,
) -> Result<Vec<serde_json::Value>, AppError> {
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let mut value = serde_json::to_value(row)
            .map_err(|e| AppError::Internal(format!("Failed to serialize row: {e}")))?;
        if let (Some(fields), Some(obj)) = (select, value.as_object_mut()) {
            obj.retain(|key, _| key == "id" || fields.iter().any(|f| f == key));
        }
        out.push(value);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::translator::SortKey;
    use serde_json::json;

    fn filter(field: &'static str, kind: FieldKind, predicate: Predicate) -> Filter {
        Filter {
            field,
            kind,
            predicate,
        }
    }

    fn sql_for(filters: Vec<Filter>, search: Option<&str>) -> String {
        let manifest = Manifest {
            table: "tokens",
            scope_column: "project_id",
            filterable: &[],
            searchable: &["name", "path", "description", "tags"],
            sortable: &[],
        };
        let query = QueryDescriptor {
            filters,
            search: search.map(String::from),
            sort: vec![SortKey {
                field: "created_at",
                descending: true,
            }],
            ..Default::default()
        };
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM tokens WHERE project_id = ");
        qb.push_bind(Uuid::nil());
        push_conditions(&mut qb, &manifest, &query).unwrap();
        qb.sql().to_string()
    }

    #[test]
    fn equality_filter_is_bound_not_interpolated() {
        let sql = sql_for(
            vec![filter(
                "category",
                FieldKind::Text,
                Predicate::Eq("color".to_string()),
            )],
            None,
        );
        assert_eq!(sql, "SELECT * FROM tokens WHERE project_id = $1 AND category = $2");
    }

    #[test]
    fn in_filter_uses_any() {
        let sql = sql_for(
            vec![filter(
                "category",
                FieldKind::Text,
                Predicate::In(vec!["color".to_string(), "spacing".to_string()]),
            )],
            None,
        );
        assert!(sql.contains("category = ANY($2)"));
    }

    #[test]
    fn array_equality_means_containment() {
        let sql = sql_for(
            vec![filter(
                "tags",
                FieldKind::TextArray,
                Predicate::Eq("brand".to_string()),
            )],
            None,
        );
        assert!(sql.contains("$2 = ANY(tags)"));
    }

    #[test]
    fn search_is_anded_with_filters() {
        let sql = sql_for(
            vec![filter(
                "category",
                FieldKind::Text,
                Predicate::Eq("color".to_string()),
            )],
            Some("primary"),
        );
        assert!(sql.contains("AND category = $2"));
        assert!(sql.contains("AND (name ILIKE $3 OR path ILIKE $4"));
        assert!(sql.contains("array_to_string(tags, ' ') ILIKE $6)"));
    }

    #[test]
    fn range_operator_on_array_field_is_rejected() {
        let manifest = Manifest {
            table: "tokens",
            scope_column: "project_id",
            filterable: &[],
            searchable: &[],
            sortable: &[],
        };
        let query = QueryDescriptor {
            filters: vec![filter(
                "tags",
                FieldKind::TextArray,
                Predicate::Gt("x".to_string()),
            )],
            ..Default::default()
        };
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1 WHERE true");
        let err = push_conditions(&mut qb, &manifest, &query).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn invalid_bool_value_is_a_bad_request() {
        assert!(parse_bool("deprecated", "yes").is_err());
        assert_eq!(parse_bool("deprecated", "true").unwrap(), true);
        assert_eq!(parse_bool("deprecated", "0").unwrap(), false);
    }

    #[test]
    fn timestamps_accept_rfc3339_and_bare_dates() {
        assert!(parse_timestamp("created_at", "2024-03-01T12:00:00Z").is_ok());
        assert!(parse_timestamp("created_at", "2024-03-01").is_ok());
        assert!(parse_timestamp("created_at", "last tuesday").is_err());
    }

    #[test]
    fn projection_keeps_id_and_selected_fields_only() {
        #[derive(Serialize)]
        struct Row {
            id: &'static str,
            name: &'static str,
            value: i32,
            secret: &'static str,
        }
        let rows = vec![Row {
            id: "a",
            name: "primary",
            value: 1,
            secret: "x",
        }];
        let select = vec!["name".to_string(), "value".to_string()];
        let projected = project_rows(&rows, Some(&select)).unwrap();
        assert_eq!(
            projected,
            vec![json!({"id": "a", "name": "primary", "value": 1})]
        );
    }

    #[test]
    fn no_projection_returns_full_rows() {
        #[derive(Serialize)]
        struct Row {
            id: &'static str,
            name: &'static str,
        }
        let projected = project_rows(&[Row { id: "a", name: "n" }], None).unwrap();
        assert_eq!(projected, vec![json!({"id": "a", "name": "n"})]);
    }
}
