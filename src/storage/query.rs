//! Parameterized query helpers.
//!
//! Everything here works on a borrowed `rusqlite::Connection` and returns
//! crate errors. Engine failures are logged with the SQL text and bound
//! parameters before being propagated.

use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OptionalExtension, Row};
use serde::Serialize;
use tracing::{debug, error, warn};

use super::ident::{Column, Table};
use crate::config::DEFAULT_PAGE_SIZE;
use crate::error::{Error, Result};

/// Bind a string slice as a SQL text value.
#[must_use]
pub fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}

// ── Ordering ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// `ORDER BY <column> <direction>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    pub column: Column,
    pub direction: Direction,
}

impl OrderBy {
    #[must_use]
    pub const fn asc(column: Column) -> Self {
        Self {
            column,
            direction: Direction::Asc,
        }
    }

    #[must_use]
    pub const fn desc(column: Column) -> Self {
        Self {
            column,
            direction: Direction::Desc,
        }
    }

    fn to_sql(self) -> String {
        format!(" ORDER BY {} {}", self.column, self.direction.as_str())
    }
}

fn order_sql(order: Option<OrderBy>) -> String {
    order.map(OrderBy::to_sql).unwrap_or_default()
}

// ── Conditions ───────────────────────────────────────────────

/// A WHERE-clause tree over known columns.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Matches every row.
    All,
    Eq(Column, Value),
    /// Not equal, with NULL counting as "not equal".
    NotEq(Column, Value),
    Lt(Column, Value),
    Gte(Column, Value),
    Lte(Column, Value),
    /// Inclusive on both ends.
    Between(Column, Value, Value),
    /// Substring match (`LIKE %term%`) against any of the columns.
    LikeAny(Vec<Column>, String),
    And(Vec<Condition>),
}

impl Condition {
    pub fn eq(column: Column, value: impl Into<Value>) -> Self {
        Self::Eq(column, value.into())
    }

    pub fn not_eq(column: Column, value: impl Into<Value>) -> Self {
        Self::NotEq(column, value.into())
    }

    pub fn lt(column: Column, value: impl Into<Value>) -> Self {
        Self::Lt(column, value.into())
    }

    pub fn gte(column: Column, value: impl Into<Value>) -> Self {
        Self::Gte(column, value.into())
    }

    pub fn lte(column: Column, value: impl Into<Value>) -> Self {
        Self::Lte(column, value.into())
    }

    pub fn between(column: Column, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        Self::Between(column, low.into(), high.into())
    }

    #[must_use]
    pub fn like_any(columns: &[Column], term: &str) -> Self {
        Self::LikeAny(columns.to_vec(), term.to_string())
    }

    /// Conjunction of `self` and `other`.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        match (self, other) {
            (Self::All, c) | (c, Self::All) => c,
            (Self::And(mut left), Self::And(right)) => {
                left.extend(right);
                Self::And(left)
            }
            (Self::And(mut left), c) => {
                left.push(c);
                Self::And(left)
            }
            (c, Self::And(mut right)) => {
                right.insert(0, c);
                Self::And(right)
            }
            (a, b) => Self::And(vec![a, b]),
        }
    }

    fn render(&self, sql: &mut String, params: &mut Vec<Value>) {
        match self {
            Self::All => sql.push_str("1 = 1"),
            Self::Eq(c, v) => {
                sql.push_str(&format!("{c} = ?"));
                params.push(v.clone());
            }
            Self::NotEq(c, v) => {
                sql.push_str(&format!("({c} IS NULL OR {c} != ?)"));
                params.push(v.clone());
            }
            Self::Lt(c, v) => {
                sql.push_str(&format!("{c} < ?"));
                params.push(v.clone());
            }
            Self::Gte(c, v) => {
                sql.push_str(&format!("{c} >= ?"));
                params.push(v.clone());
            }
            Self::Lte(c, v) => {
                sql.push_str(&format!("{c} <= ?"));
                params.push(v.clone());
            }
            Self::Between(c, low, high) => {
                sql.push_str(&format!("{c} BETWEEN ? AND ?"));
                params.push(low.clone());
                params.push(high.clone());
            }
            Self::LikeAny(columns, term) => {
                if columns.is_empty() {
                    sql.push_str("1 = 0");
                    return;
                }
                let pattern = format!("%{term}%");
                let parts: Vec<String> = columns.iter().map(|c| format!("{c} LIKE ?")).collect();
                sql.push('(');
                sql.push_str(&parts.join(" OR "));
                sql.push(')');
                params.extend(columns.iter().map(|_| Value::Text(pattern.clone())));
            }
            Self::And(conditions) => {
                if conditions.is_empty() {
                    sql.push_str("1 = 1");
                    return;
                }
                for (i, c) in conditions.iter().enumerate() {
                    if i > 0 {
                        sql.push_str(" AND ");
                    }
                    sql.push('(');
                    c.render(sql, params);
                    sql.push(')');
                }
            }
        }
    }

    /// Render as ` WHERE ...` plus its parameters; empty for [`Condition::All`].
    #[must_use]
    pub fn where_clause(&self) -> (String, Vec<Value>) {
        let mut params = Vec::new();
        if matches!(self, Self::All) {
            return (String::new(), params);
        }
        let mut sql = String::from(" WHERE ");
        self.render(&mut sql, &mut params);
        (sql, params)
    }
}

// ── Statements ───────────────────────────────────────────────

/// SQL text with its positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Statement {
    pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

/// Build `INSERT INTO <table> (cols...) VALUES (?...)` from a field list.
///
/// # Errors
///
/// Returns `InvalidArgument` for an empty field list.
pub fn build_insert(table: Table, fields: Vec<(Column, Value)>) -> Result<Statement> {
    if fields.is_empty() {
        return Err(Error::InvalidArgument(format!(
            "Cannot insert into {table} without fields"
        )));
    }

    let (columns, params): (Vec<Column>, Vec<Value>) = fields.into_iter().unzip();
    let names: Vec<&str> = columns.iter().map(Column::as_str).collect();
    let placeholders = vec!["?"; names.len()].join(", ");

    Ok(Statement::new(
        format!(
            "INSERT INTO {table} ({}) VALUES ({placeholders})",
            names.join(", ")
        ),
        params,
    ))
}

/// Build `UPDATE <table> SET col = ?, ... WHERE id = ?`.
///
/// `id` and `created_at` are dropped from the field list.
///
/// # Errors
///
/// Returns `InvalidArgument` when nothing is left to set.
pub fn build_update(table: Table, id: &str, fields: Vec<(Column, Value)>) -> Result<Statement> {
    let (columns, mut params): (Vec<Column>, Vec<Value>) = fields
        .into_iter()
        .filter(|(c, _)| !c.is_immutable())
        .unzip();

    if columns.is_empty() {
        return Err(Error::InvalidArgument(format!(
            "Cannot update {table} row {id} without fields"
        )));
    }

    let assignments: Vec<String> = columns.iter().map(|c| format!("{c} = ?")).collect();
    params.push(text(id));

    Ok(Statement::new(
        format!("UPDATE {table} SET {} WHERE id = ?", assignments.join(", ")),
        params,
    ))
}

// ── Execution ────────────────────────────────────────────────

fn failed(sql: &str, params: &[Value], err: rusqlite::Error) -> Error {
    error!(sql = %sql, params = ?params, error = %err, "Query failed");
    Error::Database(err)
}

fn query_rows<T, F>(conn: &Connection, sql: &str, params: &[Value], map: F) -> rusqlite::Result<Vec<T>>
where
    F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
{
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params_from_iter(params.iter()), map)?;
    rows.collect()
}

/// Run a SELECT and map every row.
///
/// # Errors
///
/// Returns an error if the statement fails to prepare or a row fails to map.
pub fn execute_query<T, F>(conn: &Connection, sql: &str, params: &[Value], map: F) -> Result<Vec<T>>
where
    F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
{
    debug!(sql = %sql, "Query");
    query_rows(conn, sql, params, map).map_err(|e| failed(sql, params, e))
}

/// Run a SELECT expected to yield at most one row.
///
/// # Errors
///
/// Returns an error if the statement fails or the row fails to map.
pub fn execute_query_one<T, F>(conn: &Connection, sql: &str, params: &[Value], map: F) -> Result<Option<T>>
where
    F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
{
    debug!(sql = %sql, "Query one");
    conn.query_row(sql, params_from_iter(params.iter()), map)
        .optional()
        .map_err(|e| failed(sql, params, e))
}

fn execute(conn: &Connection, stmt: &Statement) -> Result<usize> {
    debug!(sql = %stmt.sql, "Execute");
    conn.execute(&stmt.sql, params_from_iter(stmt.params.iter()))
        .map_err(|e| failed(&stmt.sql, &stmt.params, e))
}

/// Execute an INSERT and return the last inserted rowid.
///
/// # Errors
///
/// Returns an error if the statement fails.
pub fn execute_insert(conn: &Connection, stmt: &Statement) -> Result<i64> {
    execute(conn, stmt)?;
    Ok(conn.last_insert_rowid())
}

/// Execute an UPDATE and return the number of affected rows.
///
/// # Errors
///
/// Returns an error if the statement fails.
pub fn execute_update(conn: &Connection, stmt: &Statement) -> Result<usize> {
    execute(conn, stmt)
}

/// Execute a DELETE and return the number of affected rows.
///
/// # Errors
///
/// Returns an error if the statement fails.
pub fn execute_delete(conn: &Connection, stmt: &Statement) -> Result<usize> {
    execute(conn, stmt)
}

/// `SELECT * FROM <table> [WHERE] [ORDER BY] [LIMIT]`.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn select_where<T, F>(
    conn: &Connection,
    table: Table,
    condition: &Condition,
    order: Option<OrderBy>,
    limit: Option<u32>,
    map: F,
) -> Result<Vec<T>>
where
    F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
{
    let (where_sql, mut params) = condition.where_clause();
    let mut sql = format!("SELECT * FROM {table}{where_sql}{}", order_sql(order));
    if let Some(limit) = limit {
        sql.push_str(" LIMIT ?");
        params.push(Value::Integer(i64::from(limit)));
    }
    execute_query(conn, &sql, &params, map)
}

/// `SELECT * FROM <table> [ORDER BY]`.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn select_all<T, F>(conn: &Connection, table: Table, order: Option<OrderBy>, map: F) -> Result<Vec<T>>
where
    F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
{
    select_where(conn, table, &Condition::All, order, None, map)
}

/// Select a single row by primary key.
///
/// # Errors
///
/// Returns an error if the query fails; a missing row is `Ok(None)`.
pub fn select_by_id<T, F>(conn: &Connection, table: Table, id: &str, map: F) -> Result<Option<T>>
where
    F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
{
    let sql = format!("SELECT * FROM {table} WHERE id = ?");
    execute_query_one(conn, &sql, &[text(id)], map)
}

/// Whether a row with this id exists.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn exists(conn: &Connection, table: Table, id: &str) -> Result<bool> {
    let sql = format!("SELECT 1 FROM {table} WHERE id = ? LIMIT 1");
    Ok(execute_query_one(conn, &sql, &[text(id)], |_| Ok(()))?.is_some())
}

/// `SELECT COUNT(*)` under a condition.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn count(conn: &Connection, table: Table, condition: &Condition) -> Result<u64> {
    let (where_sql, params) = condition.where_clause();
    let sql = format!("SELECT COUNT(*) FROM {table}{where_sql}");
    let n: i64 = execute_query_one(conn, &sql, &params, |row| row.get(0))?.unwrap_or(0);
    Ok(u64::try_from(n).unwrap_or(0))
}

/// `SELECT SUM(column)` under a condition; `0.0` when nothing matches.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn sum(conn: &Connection, table: Table, column: Column, condition: &Condition) -> Result<f64> {
    let (where_sql, params) = condition.where_clause();
    let sql = format!("SELECT COALESCE(SUM({column}), 0.0) FROM {table}{where_sql}");
    Ok(execute_query_one(conn, &sql, &params, |row| row.get(0))?.unwrap_or(0.0))
}

/// One page of results.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u64,
}

/// Offset/limit pagination with a total count.
///
/// `page` is 1-based; page 0 is treated as page 1. `None` for `page_size`
/// uses [`DEFAULT_PAGE_SIZE`]. A page past the end yields empty `data` with
/// `total` unchanged.
///
/// # Errors
///
/// Returns `InvalidArgument` for a zero page size, or a query error.
pub fn paginate<T, F>(
    conn: &Connection,
    table: Table,
    page: u32,
    page_size: Option<u32>,
    order: Option<OrderBy>,
    condition: &Condition,
    map: F,
) -> Result<Page<T>>
where
    F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
{
    let page_size = page_size.unwrap_or(DEFAULT_PAGE_SIZE);
    if page_size == 0 {
        return Err(Error::InvalidArgument("Page size must be at least 1".to_string()));
    }
    let page = page.max(1);

    let total = count(conn, table, condition)?;
    let offset = u64::from(page - 1) * u64::from(page_size);

    let (where_sql, mut params) = condition.where_clause();
    let sql = format!(
        "SELECT * FROM {table}{where_sql}{} LIMIT ? OFFSET ?",
        order_sql(order)
    );
    params.push(Value::Integer(i64::from(page_size)));
    params.push(Value::Integer(i64::try_from(offset).unwrap_or(i64::MAX)));

    let data = execute_query(conn, &sql, &params, map)?;

    Ok(Page {
        data,
        total,
        page,
        page_size,
        total_pages: total.div_ceil(u64::from(page_size)),
    })
}

/// Run statements inside one transaction.
///
/// The first failing statement rolls the whole batch back and its error is
/// returned.
///
/// # Errors
///
/// Returns the first statement error, or a BEGIN/COMMIT failure.
pub fn execute_transaction(conn: &Connection, statements: &[Statement]) -> Result<()> {
    let tx = conn.unchecked_transaction()?;

    for stmt in statements {
        if let Err(e) = tx.execute(&stmt.sql, params_from_iter(stmt.params.iter())) {
            let err = failed(&stmt.sql, &stmt.params, e);
            if let Err(rollback) = tx.rollback() {
                warn!(error = %rollback, "Rollback failed");
            }
            return Err(err);
        }
    }

    tx.commit()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::schema::apply_schema;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).unwrap();
        for (id, name) in [("1", "Alpha"), ("2", "Beta"), ("3", "Gamma"), ("4", "Delta"), ("5", "Epsilon")] {
            conn.execute(
                "INSERT INTO categories (id, name) VALUES (?1, ?2)",
                rusqlite::params![id, name],
            )
            .unwrap();
        }
        conn
    }

    fn name_of(row: &Row<'_>) -> rusqlite::Result<String> {
        row.get("name")
    }

    #[test]
    fn test_build_insert() {
        let stmt = build_insert(
            Table::Categories,
            vec![(Column::Id, text("9")), (Column::Name, text("Energy"))],
        )
        .unwrap();
        assert_eq!(stmt.sql, "INSERT INTO categories (id, name) VALUES (?, ?)");
        assert_eq!(stmt.params.len(), 2);
        assert!(build_insert(Table::Categories, vec![]).is_err());
    }

    #[test]
    fn test_build_update_skips_immutable_columns() {
        let stmt = build_update(
            Table::Contacts,
            "c1",
            vec![
                (Column::Id, text("c1")),
                (Column::Name, text("Ann")),
                (Column::CreatedAt, Value::Integer(1)),
                (Column::UpdatedAt, Value::Integer(2)),
            ],
        )
        .unwrap();
        assert_eq!(stmt.sql, "UPDATE contacts SET name = ?, updated_at = ? WHERE id = ?");
        assert_eq!(stmt.params.last(), Some(&text("c1")));
    }

    #[test]
    fn test_condition_rendering() {
        let cond = Condition::not_eq(Column::Status, text("completed"))
            .and(Condition::lt(Column::DueAt, 10_i64));
        let (sql, params) = cond.where_clause();
        assert_eq!(
            sql,
            " WHERE ((status IS NULL OR status != ?)) AND (due_at < ?)"
        );
        assert_eq!(params.len(), 2);
        assert_eq!(Condition::All.where_clause().0, "");
    }

    #[test]
    fn test_select_and_count() {
        let conn = setup();
        let names = select_all(&conn, Table::Categories, Some(OrderBy::desc(Column::Name)), name_of).unwrap();
        assert_eq!(names.first().map(String::as_str), Some("Gamma"));

        let found = select_by_id(&conn, Table::Categories, "2", name_of).unwrap();
        assert_eq!(found.as_deref(), Some("Beta"));
        assert!(select_by_id(&conn, Table::Categories, "99", name_of).unwrap().is_none());

        assert!(exists(&conn, Table::Categories, "1").unwrap());
        assert!(!exists(&conn, Table::Categories, "99").unwrap());

        let like = Condition::like_any(&[Column::Name], "ta");
        assert_eq!(count(&conn, Table::Categories, &like).unwrap(), 2);
    }

    #[test]
    fn test_sum_of_nothing_is_zero() {
        let conn = setup();
        let total = sum(&conn, Table::Deals, Column::Amount, &Condition::All).unwrap();
        assert!(total.abs() < f64::EPSILON);
    }

    #[test]
    fn test_paginate() {
        let conn = setup();
        let order = Some(OrderBy::asc(Column::Id));

        let page = paginate(&conn, Table::Categories, 1, Some(2), order, &Condition::All, name_of).unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.data, vec!["Alpha".to_string(), "Beta".to_string()]);

        let last = paginate(&conn, Table::Categories, 3, Some(2), order, &Condition::All, name_of).unwrap();
        assert_eq!(last.data, vec!["Epsilon".to_string()]);

        let beyond = paginate(&conn, Table::Categories, 4, Some(2), order, &Condition::All, name_of).unwrap();
        assert!(beyond.data.is_empty());
        assert_eq!(beyond.total, 5);

        let zero = paginate(&conn, Table::Categories, 0, Some(2), order, &Condition::All, name_of).unwrap();
        assert_eq!(zero.page, 1);

        assert!(paginate(&conn, Table::Categories, 1, Some(0), order, &Condition::All, name_of).is_err());

        let default = paginate(&conn, Table::Categories, 1, None, order, &Condition::All, name_of).unwrap();
        assert_eq!(default.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(default.data.len(), 5);
        assert_eq!(default.total_pages, 1);
    }

    #[test]
    fn test_transaction_rolls_back_on_failure() {
        let conn = setup();
        let statements = vec![
            Statement::new("INSERT INTO categories (id, name) VALUES ('6', 'Zeta')", vec![]),
            Statement::new("INSERT INTO no_such_table VALUES (1)", vec![]),
        ];
        assert!(execute_transaction(&conn, &statements).is_err());
        assert!(!exists(&conn, Table::Categories, "6").unwrap());

        execute_transaction(&conn, &statements[..1]).unwrap();
        assert!(exists(&conn, Table::Categories, "6").unwrap());
    }
}
