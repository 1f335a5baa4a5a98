use std::collections::HashMap;
use std::ops::ControlFlow;

use sqlparser::ast::{
    self, AssignmentTarget, Expr, FromTable, ObjectNamePart, SetExpr, Statement, TableFactor, TableObject, Value,
    ValueWithSpan,
};
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;
use ulid::Ulid;

use crate::model::*;

/// Where a new ad goes.
#[derive(Debug, PartialEq)]
pub enum Placement {
    /// First free slot in raster order.
    Auto { width: i32, height: i32 },
    At(Rect),
}

/// Parsed command from SQL input.
#[derive(Debug, PartialEq)]
pub enum Command {
    InsertAd { placement: Placement, payload: AdPayload },
    UpdateAd { id: Ulid, update: AdUpdate },
    DeleteAd { id: Ulid },
    SelectAds { id: Option<Ulid> },
    SelectAvailability { rect: Rect },
    SelectPosition { width: i32, height: i32 },
    SelectStats,
}

/// Shape of the rows a statement produces, known without binding parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    Ads,
    Availability,
    Position,
    Stats,
    /// Command tag only.
    None,
}

/// Parse `sql`, binding `$n` placeholders to `params[n - 1]` in the syntax
/// tree. Parameter text never passes back through the SQL parser.
pub fn parse_sql(sql: &str, params: &[Option<String>]) -> Result<Command, SqlError> {
    let mut stmt = parse_first(sql)?;
    bind_params(&mut stmt, params)?;

    match &stmt {
        Statement::Insert(insert) => parse_insert(insert),
        Statement::Update {
            table,
            assignments,
            selection,
            ..
        } => parse_update(&table.relation, assignments, selection),
        Statement::Delete(delete) => parse_delete(delete),
        Statement::Query(query) => parse_select(query),
        other => Err(SqlError::Unsupported(format!("{other}"))),
    }
}

/// Row shape for `sql`, for describe messages. Anything unparseable has no rows.
pub fn result_kind(sql: &str) -> ResultKind {
    let Ok(stmt) = parse_first(sql) else {
        return ResultKind::None;
    };
    let table = match &stmt {
        Statement::Insert(insert) => insert_table_name(insert),
        Statement::Update { table, .. } => table_factor_name(&table.relation),
        Statement::Query(query) => select_table_name(query),
        _ => return ResultKind::None,
    };
    match table.as_deref() {
        Ok("ads") => ResultKind::Ads,
        Ok("availability") => ResultKind::Availability,
        Ok("positions") => ResultKind::Position,
        Ok("stats") => ResultKind::Stats,
        _ => ResultKind::None,
    }
}

fn parse_first(sql: &str) -> Result<Statement, SqlError> {
    let dialect = PostgreSqlDialect {};
    let stmts = Parser::parse_sql(&dialect, sql).map_err(|e| SqlError::Parse(e.to_string()))?;
    stmts.into_iter().next().ok_or(SqlError::Empty)
}

fn bind_params(stmt: &mut Statement, params: &[Option<String>]) -> Result<(), SqlError> {
    let flow = ast::visit_expressions_mut(stmt, |expr| {
        let Expr::Value(ValueWithSpan { value: Value::Placeholder(name), .. }) = expr else {
            return ControlFlow::Continue(());
        };
        let bound = name
            .strip_prefix('$')
            .and_then(|n| n.parse::<usize>().ok())
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| params.get(i));
        let value = match bound {
            Some(Some(text)) => Value::SingleQuotedString(text.clone()),
            Some(None) => Value::Null,
            None => return ControlFlow::Break(SqlError::UnboundParameter(name.clone())),
        };
        *expr = Expr::Value(value.with_empty_span());
        ControlFlow::Continue(())
    });
    match flow {
        ControlFlow::Break(e) => Err(e),
        ControlFlow::Continue(()) => Ok(()),
    }
}

// ── INSERT ────────────────────────────────────────────────────

fn parse_insert(insert: &ast::Insert) -> Result<Command, SqlError> {
    let table = insert_table_name(insert)?;
    if table != "ads" {
        return Err(SqlError::UnknownTable(table));
    }
    if insert.columns.is_empty() {
        return Err(SqlError::Parse("INSERT INTO ads needs an explicit column list".into()));
    }
    let values = extract_insert_values(insert)?;
    if values.len() != insert.columns.len() {
        return Err(SqlError::WrongArity("ads", insert.columns.len(), values.len()));
    }

    let mut cols: HashMap<String, &Expr> = HashMap::new();
    for (col, value) in insert.columns.iter().zip(&values) {
        let name = col.value.to_lowercase();
        if !INSERT_COLUMNS.contains(&name.as_str()) {
            return Err(SqlError::UnknownColumn(name));
        }
        cols.insert(name, value);
    }

    let int = |name: &'static str| cols.get(name).map(|e| parse_i32(e)).transpose();
    let width = int("width")?.ok_or(SqlError::MissingColumn("width"))?;
    let height = int("height")?.ok_or(SqlError::MissingColumn("height"))?;
    let placement = match (int("x")?, int("y")?) {
        (Some(x), Some(y)) => Placement::At(Rect::new(x, y, width, height)),
        (None, None) => Placement::Auto { width, height },
        (Some(_), None) => return Err(SqlError::MissingColumn("y")),
        (None, Some(_)) => return Err(SqlError::MissingColumn("x")),
    };

    let text = |name: &'static str| cols.get(name).map(|e| parse_text_or_null(e)).transpose().map(Option::flatten);
    let payload = AdPayload {
        business_name: text("business_name")?.ok_or(SqlError::MissingColumn("business_name"))?,
        description: text("description")?,
        image_url: text("image_url")?.ok_or(SqlError::MissingColumn("image_url"))?,
        target_url: text("target_url")?.ok_or(SqlError::MissingColumn("target_url"))?,
        alt: text("alt")?,
    };
    Ok(Command::InsertAd { placement, payload })
}

const INSERT_COLUMNS: &[&str] = &[
    "x",
    "y",
    "width",
    "height",
    "business_name",
    "description",
    "image_url",
    "target_url",
    "alt",
];

// ── UPDATE / DELETE ───────────────────────────────────────────

fn parse_update(
    relation: &TableFactor,
    assignments: &[ast::Assignment],
    selection: &Option<Expr>,
) -> Result<Command, SqlError> {
    let table = table_factor_name(relation)?;
    if table != "ads" {
        return Err(SqlError::UnknownTable(table));
    }

    let mut update = AdUpdate::default();
    for assignment in assignments {
        let column = match &assignment.target {
            AssignmentTarget::ColumnName(name) => {
                object_name_last(name).ok_or_else(|| SqlError::Parse("empty column name".into()))?
            }
            AssignmentTarget::Tuple(_) => {
                return Err(SqlError::Unsupported("tuple assignment".into()));
            }
        };
        let field = match column.as_str() {
            "business_name" => &mut update.business_name,
            "description" => &mut update.description,
            "image_url" => &mut update.image_url,
            "target_url" => &mut update.target_url,
            "alt" => &mut update.alt,
            "id" | "x" | "y" | "width" | "height" | "price" | "status" | "created_at" | "updated_at" => {
                return Err(SqlError::ReadOnlyColumn(column));
            }
            _ => return Err(SqlError::UnknownColumn(column)),
        };
        *field = Some(parse_text(&assignment.value)?);
    }

    let id = extract_where_id(selection)?;
    Ok(Command::UpdateAd { id, update })
}

fn parse_delete(delete: &ast::Delete) -> Result<Command, SqlError> {
    let table = delete_table_name(delete)?;
    if table != "ads" {
        return Err(SqlError::UnknownTable(table));
    }
    let id = extract_where_id(&delete.selection)?;
    Ok(Command::DeleteAd { id })
}

// ── SELECT ────────────────────────────────────────────────────

fn parse_select(query: &ast::Query) -> Result<Command, SqlError> {
    let table = select_table_name(query)?;
    let select = match query.body.as_ref() {
        SetExpr::Select(s) => s,
        _ => return Err(SqlError::Unsupported("non-SELECT query".into())),
    };

    let mut filters = HashMap::new();
    if let Some(selection) = &select.selection {
        collect_eq_filters(selection, &mut filters)?;
    }
    let allowed: &[&str] = match table.as_str() {
        "ads" => &["id"],
        "availability" => &["x", "y", "width", "height"],
        "positions" => &["width", "height"],
        "stats" => &[],
        _ => return Err(SqlError::UnknownTable(table)),
    };
    if let Some(col) = filters.keys().find(|c| !allowed.contains(&c.as_str())) {
        return Err(SqlError::UnknownColumn(col.clone()));
    }

    let required = |name: &'static str| {
        filters
            .get(name)
            .ok_or(SqlError::MissingFilter(name))
            .and_then(|e| parse_i32(e))
    };
    match table.as_str() {
        "ads" => Ok(Command::SelectAds {
            id: filters.get("id").map(|e| parse_ulid(e)).transpose()?,
        }),
        "availability" => Ok(Command::SelectAvailability {
            rect: Rect::new(required("x")?, required("y")?, required("width")?, required("height")?),
        }),
        "positions" => Ok(Command::SelectPosition {
            width: required("width")?,
            height: required("height")?,
        }),
        _ => Ok(Command::SelectStats),
    }
}

/// Gather `col = value` conditions joined by AND.
fn collect_eq_filters(expr: &Expr, filters: &mut HashMap<String, Expr>) -> Result<(), SqlError> {
    match expr {
        Expr::Nested(inner) => collect_eq_filters(inner, filters),
        Expr::BinaryOp { left, op, right } => match op {
            ast::BinaryOperator::And => {
                collect_eq_filters(left, filters)?;
                collect_eq_filters(right, filters)
            }
            ast::BinaryOperator::Eq => {
                let col = expr_column_name(left)
                    .ok_or_else(|| SqlError::Unsupported(format!("filter on {left}")))?;
                filters.insert(col, right.as_ref().clone());
                Ok(())
            }
            _ => Err(SqlError::Unsupported(format!("operator {op} in WHERE"))),
        },
        other => Err(SqlError::Unsupported(format!("WHERE {other}"))),
    }
}

// ── Helpers ───────────────────────────────────────────────────

fn object_name_last(name: &ast::ObjectName) -> Option<String> {
    name.0.last().and_then(|part| match part {
        ObjectNamePart::Identifier(ident) => Some(ident.value.to_lowercase()),
        _ => None,
    })
}

fn insert_table_name(insert: &ast::Insert) -> Result<String, SqlError> {
    match &insert.table {
        TableObject::TableName(name) => {
            object_name_last(name).ok_or_else(|| SqlError::Parse("empty table name".into()))
        }
        _ => Err(SqlError::Parse("unsupported table object in INSERT".into())),
    }
}

fn delete_table_name(delete: &ast::Delete) -> Result<String, SqlError> {
    let tables_with_joins = match &delete.from {
        FromTable::WithFromKeyword(t) | FromTable::WithoutKeyword(t) => t,
    };
    if let Some(first) = tables_with_joins.first() {
        table_factor_name(&first.relation)
    } else {
        Err(SqlError::Parse("DELETE without table".into()))
    }
}

fn select_table_name(query: &ast::Query) -> Result<String, SqlError> {
    let select = match query.body.as_ref() {
        SetExpr::Select(s) => s,
        _ => return Err(SqlError::Unsupported("non-SELECT query".into())),
    };
    let from = select
        .from
        .first()
        .ok_or_else(|| SqlError::Parse("SELECT without FROM".into()))?;
    table_factor_name(&from.relation)
}

fn table_factor_name(tf: &TableFactor) -> Result<String, SqlError> {
    match tf {
        TableFactor::Table { name, .. } => {
            object_name_last(name).ok_or_else(|| SqlError::Parse("empty table name".into()))
        }
        _ => Err(SqlError::Parse("complex table expression".into())),
    }
}

fn extract_insert_values(insert: &ast::Insert) -> Result<Vec<Expr>, SqlError> {
    let body = insert
        .source
        .as_ref()
        .ok_or(SqlError::Parse("no VALUES".into()))?;
    match body.body.as_ref() {
        SetExpr::Values(values) => match values.rows.as_slice() {
            [] => Err(SqlError::Parse("empty VALUES".into())),
            [row] => Ok(row.clone()),
            _ => Err(SqlError::Unsupported("multi-row INSERT".into())),
        },
        _ => Err(SqlError::Parse("expected VALUES".into())),
    }
}

fn extract_where_id(selection: &Option<Expr>) -> Result<Ulid, SqlError> {
    let sel = selection.as_ref().ok_or(SqlError::MissingFilter("id"))?;
    match sel {
        Expr::BinaryOp {
            left,
            op: ast::BinaryOperator::Eq,
            right,
        } if expr_column_name(left).as_deref() == Some("id") => parse_ulid(right),
        _ => Err(SqlError::MissingFilter("id")),
    }
}

fn expr_column_name(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Identifier(ident) => Some(ident.value.to_lowercase()),
        Expr::CompoundIdentifier(parts) => parts.last().map(|i| i.value.to_lowercase()),
        _ => None,
    }
}

fn extract_value(expr: &Expr) -> Option<&Value> {
    match expr {
        Expr::Value(ValueWithSpan { value, .. }) => Some(value),
        _ => None,
    }
}

fn parse_ulid(expr: &Expr) -> Result<Ulid, SqlError> {
    match extract_value(expr) {
        Some(Value::SingleQuotedString(s)) => {
            Ulid::from_string(s).map_err(|e| SqlError::Parse(format!("bad ULID: {e}")))
        }
        Some(value) => Err(SqlError::Parse(format!("expected ULID string, got {value}"))),
        None => Err(SqlError::Parse(format!("expected value, got {expr}"))),
    }
}

fn parse_i64(expr: &Expr) -> Result<i64, SqlError> {
    if let Some(value) = extract_value(expr) {
        match value {
            Value::Number(s, _) | Value::SingleQuotedString(s) => s
                .trim()
                .parse()
                .map_err(|e| SqlError::Parse(format!("bad integer {s:?}: {e}"))),
            _ => Err(SqlError::Parse(format!("expected number, got {value}"))),
        }
    } else if let Expr::UnaryOp {
        op: ast::UnaryOperator::Minus,
        expr,
    } = expr
    {
        Ok(-parse_i64(expr)?)
    } else {
        Err(SqlError::Parse(format!("expected value, got {expr}")))
    }
}

fn parse_i32(expr: &Expr) -> Result<i32, SqlError> {
    let v = parse_i64(expr)?;
    i32::try_from(v).map_err(|_| SqlError::Parse(format!("{v} out of integer range")))
}

fn parse_text(expr: &Expr) -> Result<String, SqlError> {
    parse_text_or_null(expr)?.ok_or_else(|| SqlError::Parse("NULL not allowed here".into()))
}

fn parse_text_or_null(expr: &Expr) -> Result<Option<String>, SqlError> {
    match extract_value(expr) {
        Some(Value::Null) => Ok(None),
        Some(Value::SingleQuotedString(s)) => Ok(Some(s.clone())),
        Some(value) => Err(SqlError::Parse(format!("expected string, got {value}"))),
        None => Err(SqlError::Parse(format!("expected value, got {expr}"))),
    }
}

// ── Errors ────────────────────────────────────────────────────

#[derive(Debug, PartialEq)]
pub enum SqlError {
    Parse(String),
    Empty,
    Unsupported(String),
    UnknownTable(String),
    UnknownColumn(String),
    ReadOnlyColumn(String),
    WrongArity(&'static str, usize, usize),
    MissingColumn(&'static str),
    MissingFilter(&'static str),
    UnboundParameter(String),
}

impl std::fmt::Display for SqlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SqlError::Parse(s) => write!(f, "parse error: {s}"),
            SqlError::Empty => write!(f, "empty query"),
            SqlError::Unsupported(s) => write!(f, "unsupported: {s}"),
            SqlError::UnknownTable(t) => write!(f, "unknown table: {t}"),
            SqlError::UnknownColumn(c) => write!(f, "unknown column: {c}"),
            SqlError::ReadOnlyColumn(c) => write!(f, "column {c} cannot be changed"),
            SqlError::WrongArity(t, expected, got) => {
                write!(f, "{t}: expected {expected} values, got {got}")
            }
            SqlError::MissingColumn(col) => write!(f, "missing column: {col}"),
            SqlError::MissingFilter(col) => write!(f, "missing filter: {col}"),
            SqlError::UnboundParameter(p) => write!(f, "no value bound for parameter {p}"),
        }
    }
}

impl std::error::Error for SqlError {}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "01ARZ3NDEKTSV4RRFFQ69G5FAV";

    fn parse(sql: &str) -> Result<Command, SqlError> {
        parse_sql(sql, &[])
    }

    #[test]
    fn parse_insert_auto() {
        let sql = "INSERT INTO ads (width, height, business_name, image_url, target_url) \
                   VALUES (50, 40, 'Acme', 'https://acme.test/a.png', 'https://acme.test')";
        match parse(sql).unwrap() {
            Command::InsertAd { placement, payload } => {
                assert_eq!(placement, Placement::Auto { width: 50, height: 40 });
                assert_eq!(payload.business_name, "Acme");
                assert_eq!(payload.description, None);
                assert_eq!(payload.alt, None);
            }
            cmd => panic!("expected InsertAd, got {cmd:?}"),
        }
    }

    #[test]
    fn parse_insert_explicit_with_optional_columns() {
        let sql = "INSERT INTO ads (x, y, width, height, business_name, description, image_url, target_url, alt) \
                   VALUES (100, 200, 10, 20, 'O''Brien', NULL, 'https://a.test/i.png', 'https://a.test', 'logo')";
        match parse(sql).unwrap() {
            Command::InsertAd { placement, payload } => {
                assert_eq!(placement, Placement::At(Rect::new(100, 200, 10, 20)));
                assert_eq!(payload.business_name, "O'Brien");
                assert_eq!(payload.description, None);
                assert_eq!(payload.alt.as_deref(), Some("logo"));
            }
            cmd => panic!("expected InsertAd, got {cmd:?}"),
        }
    }

    #[test]
    fn parse_insert_requires_both_coordinates() {
        let sql = "INSERT INTO ads (x, width, height, business_name, image_url, target_url) \
                   VALUES (0, 10, 10, 'a', 'https://a.test/i.png', 'https://a.test')";
        assert_eq!(parse(sql), Err(SqlError::MissingColumn("y")));
    }

    #[test]
    fn parse_insert_missing_required_column() {
        let sql = "INSERT INTO ads (width, height, business_name, image_url) VALUES (1, 1, 'a', 'https://a.test')";
        assert_eq!(parse(sql), Err(SqlError::MissingColumn("target_url")));
    }

    #[test]
    fn parse_insert_rejects_unknown_column_and_multi_row() {
        let sql = "INSERT INTO ads (width, height, price) VALUES (1, 1, 5)";
        assert_eq!(parse(sql), Err(SqlError::UnknownColumn("price".into())));
        let sql = "INSERT INTO ads (width, height) VALUES (1, 1), (2, 2)";
        assert!(matches!(parse(sql), Err(SqlError::Unsupported(_))));
    }

    #[test]
    fn parse_update() {
        let sql = format!("UPDATE ads SET description = 'fresh', alt = 'new alt' WHERE id = '{ID}'");
        match parse(&sql).unwrap() {
            Command::UpdateAd { id, update } => {
                assert_eq!(id.to_string(), ID);
                assert_eq!(update.description.as_deref(), Some("fresh"));
                assert_eq!(update.alt.as_deref(), Some("new alt"));
                assert_eq!(update.business_name, None);
            }
            cmd => panic!("expected UpdateAd, got {cmd:?}"),
        }
    }

    #[test]
    fn parse_update_geometry_is_read_only() {
        let sql = format!("UPDATE ads SET x = 5 WHERE id = '{ID}'");
        assert_eq!(parse(&sql), Err(SqlError::ReadOnlyColumn("x".into())));
        let sql = format!("UPDATE ads SET alt = 'a', width = 200 WHERE id = '{ID}'");
        assert_eq!(parse(&sql), Err(SqlError::ReadOnlyColumn("width".into())));
        let sql = format!("UPDATE ads SET price = 0 WHERE id = '{ID}'");
        assert_eq!(parse(&sql), Err(SqlError::ReadOnlyColumn("price".into())));
        let sql = format!("UPDATE ads SET colour = 1 WHERE id = '{ID}'");
        assert_eq!(parse(&sql), Err(SqlError::UnknownColumn("colour".into())));
    }

    #[test]
    fn parse_update_requires_id() {
        let sql = "UPDATE ads SET description = 'x'";
        assert_eq!(parse(sql), Err(SqlError::MissingFilter("id")));
    }

    #[test]
    fn parse_delete() {
        let sql = format!("DELETE FROM ads WHERE id = '{ID}'");
        match parse(&sql).unwrap() {
            Command::DeleteAd { id } => assert_eq!(id.to_string(), ID),
            cmd => panic!("expected DeleteAd, got {cmd:?}"),
        }
    }

    #[test]
    fn parse_selects() {
        assert_eq!(parse("SELECT * FROM ads").unwrap(), Command::SelectAds { id: None });
        let sql = format!("SELECT * FROM ads WHERE id = '{ID}'");
        assert!(matches!(parse(&sql).unwrap(), Command::SelectAds { id: Some(_) }));
        assert_eq!(parse("SELECT * FROM stats").unwrap(), Command::SelectStats);
        assert_eq!(
            parse("SELECT * FROM positions WHERE width = 50 AND height = 60").unwrap(),
            Command::SelectPosition { width: 50, height: 60 }
        );
    }

    #[test]
    fn parse_select_availability() {
        let sql = "SELECT * FROM availability WHERE x = 10 AND (y = 20 AND width = 30) AND height = 40";
        assert_eq!(
            parse(sql).unwrap(),
            Command::SelectAvailability { rect: Rect::new(10, 20, 30, 40) }
        );
        let sql = "SELECT * FROM availability WHERE x = -5 AND y = 0 AND width = 10 AND height = 10";
        assert_eq!(
            parse(sql).unwrap(),
            Command::SelectAvailability { rect: Rect::new(-5, 0, 10, 10) }
        );
    }

    #[test]
    fn parse_select_availability_missing_filter() {
        let sql = "SELECT * FROM availability WHERE x = 10 AND y = 20 AND width = 30";
        assert_eq!(parse(sql), Err(SqlError::MissingFilter("height")));
    }

    #[test]
    fn parse_select_rejects_unknown_filter_and_operator() {
        assert_eq!(
            parse("SELECT * FROM stats WHERE x = 1"),
            Err(SqlError::UnknownColumn("x".into()))
        );
        assert!(matches!(
            parse("SELECT * FROM positions WHERE width > 1 AND height = 1"),
            Err(SqlError::Unsupported(_))
        ));
    }

    #[test]
    fn params_are_bound_as_values() {
        let params = vec![
            Some("10".to_string()),
            Some("20".to_string()),
            Some("x'); DROP TABLE ads; --".to_string()),
            Some("https://a.test/i.png".to_string()),
            Some("https://a.test".to_string()),
            None,
        ];
        let sql = "INSERT INTO ads (width, height, business_name, image_url, target_url, description) \
                   VALUES ($1, $2, $3, $4, $5, $6)";
        match parse_sql(sql, &params).unwrap() {
            Command::InsertAd { placement, payload } => {
                assert_eq!(placement, Placement::Auto { width: 10, height: 20 });
                assert_eq!(payload.business_name, "x'); DROP TABLE ads; --");
                assert_eq!(payload.description, None);
            }
            cmd => panic!("expected InsertAd, got {cmd:?}"),
        }
    }

    #[test]
    fn unbound_param_errors() {
        let sql = "SELECT * FROM ads WHERE id = $2";
        assert_eq!(
            parse_sql(sql, &[Some(ID.to_string())]),
            Err(SqlError::UnboundParameter("$2".into()))
        );
    }

    #[test]
    fn result_kinds() {
        assert_eq!(result_kind("SELECT * FROM ads WHERE id = $1"), ResultKind::Ads);
        assert_eq!(result_kind("INSERT INTO ads (width) VALUES ($1)"), ResultKind::Ads);
        assert_eq!(result_kind("UPDATE ads SET alt = $1 WHERE id = $2"), ResultKind::Ads);
        assert_eq!(result_kind("DELETE FROM ads WHERE id = $1"), ResultKind::None);
        assert_eq!(result_kind("SELECT * FROM availability"), ResultKind::Availability);
        assert_eq!(result_kind("SELECT * FROM positions"), ResultKind::Position);
        assert_eq!(result_kind("SELECT * FROM stats"), ResultKind::Stats);
        assert_eq!(result_kind("not sql"), ResultKind::None);
    }

    #[test]
    fn parse_unknown_table_errors() {
        assert_eq!(parse("SELECT * FROM orders"), Err(SqlError::UnknownTable("orders".into())));
        assert!(parse("DELETE FROM rules WHERE id = 'x'").is_err());
    }

    #[test]
    fn parse_empty_errors() {
        assert_eq!(parse(""), Err(SqlError::Empty));
    }
}
