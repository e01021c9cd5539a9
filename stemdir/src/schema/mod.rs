//! Payload-to-row mapping for the persisted engine
//!
//! [`SchemaMapper`] is built once per engine from a payload type's
//! [`FieldDef`] list. It validates every field up front and then renders the
//! SQL fragments the engine splices into its statements: column
//! definitions, column and value lists, equality predicates, and row
//! materialization back into a fresh instance.

pub mod field;
pub mod value;

pub use field::{FieldDef, FieldKind, Record};
pub use value::{quote, SqlValue, DATETIME_FORMAT};

use crate::error::{DirError, Result};
use chrono::NaiveDateTime;
use rusqlite::types::Type;
use rusqlite::Row;

/// Columns every directory table carries ahead of the payload columns.
pub const RESERVED_COLUMNS: [&str; 4] = ["Id", "Name", "ParentDirId", "Index"];

/// Maps a payload type's fields to SQL.
pub struct SchemaMapper<T> {
    fields: Vec<FieldDef<T>>,
}

impl<T: Record> SchemaMapper<T> {
    /// Build a mapper from the type's declared fields.
    pub fn new() -> Result<Self> {
        Self::from_fields(T::fields())
    }
}

impl<T> SchemaMapper<T> {
    /// Build a mapper from an explicit field list.
    ///
    /// # Errors
    ///
    /// - `NoMappedFields` if the list is empty
    /// - `UnsupportedFieldType` if a field's kind has no column type
    /// - `DuplicateField` if a name repeats or collides with a reserved column
    pub fn from_fields(fields: Vec<FieldDef<T>>) -> Result<Self> {
        if fields.is_empty() {
            return Err(DirError::NoMappedFields {
                type_name: std::any::type_name::<T>(),
            });
        }

        for (i, field) in fields.iter().enumerate() {
            if field.kind().sql_type().is_none() {
                return Err(DirError::UnsupportedFieldType {
                    field: field.name().to_string(),
                    kind: field.kind(),
                });
            }

            let clashes_reserved = RESERVED_COLUMNS
                .iter()
                .any(|reserved| reserved.eq_ignore_ascii_case(field.name()));
            let repeated = fields[..i]
                .iter()
                .any(|earlier| earlier.name().eq_ignore_ascii_case(field.name()));
            if clashes_reserved || repeated || !is_plain_identifier(field.name()) {
                return Err(DirError::DuplicateField {
                    field: field.name().to_string(),
                });
            }
        }

        tracing::trace!(
            "Mapped {} fields for {}",
            fields.len(),
            std::any::type_name::<T>()
        );
        Ok(Self { fields })
    }

    pub fn fields(&self) -> &[FieldDef<T>] {
        &self.fields
    }

    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.name())
    }

    /// Column definitions, one `[Name] TYPE[ DEFAULT x],` line per field.
    pub fn column_defs(&self) -> String {
        let mut sql = String::new();
        for field in &self.fields {
            let sql_type = field.kind().sql_type().unwrap_or("TEXT");
            match field.default_value() {
                Some(default) => sql.push_str(&format!(
                    "    [{}] {} DEFAULT {},\n",
                    field.name(),
                    sql_type,
                    default.literal()
                )),
                None => sql.push_str(&format!("    [{}] {},\n", field.name(), sql_type)),
            }
        }
        sql
    }

    /// `[A], [B], [C]`
    pub fn column_names(&self) -> String {
        self.fields
            .iter()
            .map(|f| format!("[{}]", f.name()))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Literal values of an instance, in column order.
    pub fn values(&self, item: &T) -> String {
        self.fields
            .iter()
            .map(|f| f.value_of(item).literal())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Predicate matching rows whose every mapped column equals the instance.
    pub fn where_equals(&self, item: &T) -> String {
        self.fields
            .iter()
            .map(|f| {
                let value = f.value_of(item);
                if value.is_null() {
                    format!("[{}] IS NULL", f.name())
                } else {
                    format!("[{}] = {}", f.name(), value.literal())
                }
            })
            .collect::<Vec<_>>()
            .join(" AND ")
    }

    /// `IS NULL` for `None`, `= n` otherwise.
    pub fn equals_expr(value: Option<i64>) -> String {
        match value {
            None => "IS NULL".to_string(),
            Some(n) => format!("= {}", SqlValue::Integer(n).literal()),
        }
    }

    /// Read the mapped columns of a fetched row into a fresh instance.
    pub fn materialize(&self, row: &Row<'_>) -> rusqlite::Result<T>
    where
        T: Default,
    {
        let mut item = T::default();
        for field in &self.fields {
            let value = read_column(row, field.name(), field.kind())?;
            field.assign(&mut item, value);
        }
        Ok(item)
    }
}

impl<T> std::fmt::Debug for SchemaMapper<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaMapper")
            .field("fields", &self.fields)
            .finish()
    }
}

/// Field names are spliced into bracketed identifiers.
fn is_plain_identifier(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn read_column(row: &Row<'_>, name: &str, kind: FieldKind) -> rusqlite::Result<SqlValue> {
    let value = match kind {
        FieldKind::Integer => row.get::<_, Option<i64>>(name)?.into(),
        FieldKind::Text => row.get::<_, Option<String>>(name)?.into(),
        FieldKind::DateTime => match row.get::<_, Option<String>>(name)? {
            None => SqlValue::Null,
            Some(raw) => {
                let parsed = NaiveDateTime::parse_from_str(&raw, DATETIME_FORMAT).map_err(|e| {
                    let index = row.as_ref().column_index(name).unwrap_or_default();
                    rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(e))
                })?;
                SqlValue::DateTime(parsed)
            }
        },
        FieldKind::Real | FieldKind::Boolean | FieldKind::Blob => SqlValue::Null,
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rusqlite::Connection;

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Task {
        title: String,
        priority: i64,
        due: NaiveDateTime,
    }

    impl Record for Task {
        fn fields() -> Vec<FieldDef<Self>> {
            vec![
                FieldDef::text("Title", |t: &Task| t.title.clone(), |t, v| t.title = v),
                FieldDef::integer("Priority", |t: &Task| t.priority, |t, v| t.priority = v)
                    .with_default(3_i64),
                FieldDef::datetime("Due", |t: &Task| t.due, |t, v| t.due = v),
            ]
        }
    }

    fn due() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 31)
            .unwrap()
            .and_hms_opt(17, 0, 0)
            .unwrap()
    }

    fn task() -> Task {
        Task {
            title: "Write 'report'".into(),
            priority: 1,
            due: due(),
        }
    }

    #[test]
    fn test_column_defs() {
        let mapper = SchemaMapper::<Task>::new().unwrap();
        assert_eq!(
            mapper.column_defs(),
            "    [Title] TEXT,\n    [Priority] INT DEFAULT 3,\n    [Due] DATETIME,\n"
        );
    }

    #[test]
    fn test_column_names_and_values() {
        let mapper = SchemaMapper::<Task>::new().unwrap();
        assert_eq!(mapper.column_names(), "[Title], [Priority], [Due]");
        assert_eq!(
            mapper.values(&task()),
            "'Write ''report''', 1, '2025-01-31 17:00:00'"
        );
        assert_eq!(
            mapper.field_names().collect::<Vec<_>>(),
            vec!["Title", "Priority", "Due"]
        );
    }

    #[test]
    fn test_where_equals() {
        let mapper = SchemaMapper::<Task>::new().unwrap();
        assert_eq!(
            mapper.where_equals(&task()),
            "[Title] = 'Write ''report''' AND [Priority] = 1 AND [Due] = '2025-01-31 17:00:00'"
        );
    }

    #[test]
    fn test_where_equals_null_uses_is_null() {
        #[derive(Default)]
        struct Loose {
            tag: Option<String>,
        }
        let mapper = SchemaMapper::from_fields(vec![FieldDef::new(
            "Tag",
            FieldKind::Text,
            |l: &Loose| l.tag.clone().into(),
            |l: &mut Loose, v| {
                l.tag = match v {
                    SqlValue::Text(s) => Some(s),
                    _ => None,
                }
            },
        )])
        .unwrap();
        assert_eq!(mapper.where_equals(&Loose::default()), "[Tag] IS NULL");
        assert_eq!(
            mapper.where_equals(&Loose {
                tag: Some("x".into())
            }),
            "[Tag] = 'x'"
        );
    }

    #[test]
    fn test_equals_expr() {
        assert_eq!(SchemaMapper::<Task>::equals_expr(None), "IS NULL");
        assert_eq!(SchemaMapper::<Task>::equals_expr(Some(12)), "= 12");
    }

    #[test]
    fn test_unsupported_kind_rejected() {
        #[derive(Default)]
        struct Gauge {
            ratio: f64,
        }
        let err = SchemaMapper::from_fields(vec![FieldDef::new(
            "Ratio",
            FieldKind::Real,
            |g: &Gauge| SqlValue::Text(g.ratio.to_string()),
            |_: &mut Gauge, _| {},
        )])
        .unwrap_err();
        assert!(matches!(
            err,
            DirError::UnsupportedFieldType { ref field, kind: FieldKind::Real } if field == "Ratio"
        ));
    }

    #[test]
    fn test_empty_field_list_rejected() {
        let err = SchemaMapper::<Task>::from_fields(Vec::new()).unwrap_err();
        assert!(matches!(err, DirError::NoMappedFields { .. }));
    }

    #[test]
    fn test_reserved_and_repeated_names_rejected() {
        let err = SchemaMapper::from_fields(vec![FieldDef::text(
            "index",
            |t: &Task| t.title.clone(),
            |t, v| t.title = v,
        )])
        .unwrap_err();
        assert!(matches!(err, DirError::DuplicateField { .. }));

        let err = SchemaMapper::from_fields(vec![
            FieldDef::text("Title", |t: &Task| t.title.clone(), |t, v| t.title = v),
            FieldDef::text("TITLE", |t: &Task| t.title.clone(), |t, v| t.title = v),
        ])
        .unwrap_err();
        assert!(matches!(err, DirError::DuplicateField { ref field } if field == "TITLE"));

        let err = SchemaMapper::from_fields(vec![FieldDef::text(
            "Bad]Name",
            |t: &Task| t.title.clone(),
            |t, v| t.title = v,
        )])
        .unwrap_err();
        assert!(matches!(err, DirError::DuplicateField { .. }));
    }

    #[test]
    fn test_materialize_from_row() {
        let mapper = SchemaMapper::<Task>::new().unwrap();
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(&format!(
            "CREATE TABLE t (\n{}    [Extra] INT\n)",
            mapper.column_defs()
        ))
        .unwrap();
        conn.execute(
            &format!(
                "INSERT INTO t ({}) VALUES ({})",
                mapper.column_names(),
                mapper.values(&task())
            ),
            [],
        )
        .unwrap();

        let fetched = conn
            .query_row("SELECT * FROM t", [], |row| mapper.materialize(row))
            .unwrap();
        assert_eq!(fetched, task());
    }

    #[test]
    fn test_materialize_applies_column_default() {
        let mapper = SchemaMapper::<Task>::new().unwrap();
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(&format!(
            "CREATE TABLE t (\n{}    [Extra] INT\n)",
            mapper.column_defs()
        ))
        .unwrap();
        conn.execute(
            "INSERT INTO t ([Title], [Due]) VALUES ('t', '2025-01-31 17:00:00')",
            [],
        )
        .unwrap();

        let fetched = conn
            .query_row("SELECT * FROM t", [], |row| mapper.materialize(row))
            .unwrap();
        assert_eq!(fetched.priority, 3);
        assert_eq!(fetched.due, due());
    }
}
