//! Field descriptors for payload types
//!
//! A payload type stored by the persisted engine describes its columns with
//! an explicit list of [`FieldDef`]s. Each descriptor carries the column
//! name, the declared [`FieldKind`], a getter and a setter.

use super::value::SqlValue;
use chrono::NaiveDateTime;
use std::fmt;

/// Declared kind of a payload field.
///
/// Only `Integer`, `Text` and `DateTime` have a column mapping; the other
/// kinds can be declared but are refused when a mapper is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    Text,
    DateTime,
    Real,
    Boolean,
    Blob,
}

impl FieldKind {
    /// SQL column type, or `None` if the kind cannot be mapped.
    pub fn sql_type(self) -> Option<&'static str> {
        match self {
            FieldKind::Integer => Some("INT"),
            FieldKind::Text => Some("TEXT"),
            FieldKind::DateTime => Some("DATETIME"),
            FieldKind::Real | FieldKind::Boolean | FieldKind::Blob => None,
        }
    }

    /// True if literals of this kind are single-quoted.
    pub fn is_quoted(self) -> bool {
        matches!(self, FieldKind::Text | FieldKind::DateTime)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKind::Integer => "INTEGER",
            FieldKind::Text => "TEXT",
            FieldKind::DateTime => "DATETIME",
            FieldKind::Real => "REAL",
            FieldKind::Boolean => "BOOLEAN",
            FieldKind::Blob => "BLOB",
        };
        write!(f, "{}", name)
    }
}

type Getter<T> = Box<dyn Fn(&T) -> SqlValue>;
type Setter<T> = Box<dyn Fn(&mut T, SqlValue)>;

/// Descriptor for one public field of a payload type.
///
/// # Examples
///
/// ```
/// use stemdir::schema::{FieldDef, FieldKind};
///
/// #[derive(Default)]
/// struct Note {
///     title: String,
///     rank: i64,
/// }
///
/// let fields = vec![
///     FieldDef::text("Title", |n: &Note| n.title.clone(), |n, v| n.title = v),
///     FieldDef::integer("Rank", |n: &Note| n.rank, |n, v| n.rank = v).with_default(5_i64),
/// ];
/// assert_eq!(fields[1].kind(), FieldKind::Integer);
/// ```
pub struct FieldDef<T> {
    name: &'static str,
    kind: FieldKind,
    default: Option<SqlValue>,
    get: Getter<T>,
    set: Setter<T>,
}

impl<T: 'static> FieldDef<T> {
    /// Describe a field of any kind with raw value accessors.
    ///
    /// The setter receives whatever the column held, including
    /// `SqlValue::Null`.
    pub fn new(
        name: &'static str,
        kind: FieldKind,
        get: impl Fn(&T) -> SqlValue + 'static,
        set: impl Fn(&mut T, SqlValue) + 'static,
    ) -> Self {
        Self {
            name,
            kind,
            default: None,
            get: Box::new(get),
            set: Box::new(set),
        }
    }

    /// Describe an integer field. NULL columns leave the field untouched.
    pub fn integer(name: &'static str, get: fn(&T) -> i64, set: fn(&mut T, i64)) -> Self {
        Self::new(
            name,
            FieldKind::Integer,
            move |t| SqlValue::Integer(get(t)),
            move |t, value| {
                if let SqlValue::Integer(n) = value {
                    set(t, n);
                }
            },
        )
    }

    /// Describe a text field. NULL columns leave the field untouched.
    pub fn text(name: &'static str, get: fn(&T) -> String, set: fn(&mut T, String)) -> Self {
        Self::new(
            name,
            FieldKind::Text,
            move |t| SqlValue::Text(get(t)),
            move |t, value| {
                if let SqlValue::Text(s) = value {
                    set(t, s);
                }
            },
        )
    }

    /// Describe a date-time field. NULL columns leave the field untouched.
    pub fn datetime(
        name: &'static str,
        get: fn(&T) -> NaiveDateTime,
        set: fn(&mut T, NaiveDateTime),
    ) -> Self {
        Self::new(
            name,
            FieldKind::DateTime,
            move |t| SqlValue::DateTime(get(t)),
            move |t, value| {
                if let SqlValue::DateTime(dt) = value {
                    set(t, dt);
                }
            },
        )
    }

    /// Column default used when a row is written without this field.
    pub fn with_default(mut self, value: impl Into<SqlValue>) -> Self {
        self.default = Some(value.into());
        self
    }
}

impl<T> FieldDef<T> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn default_value(&self) -> Option<&SqlValue> {
        self.default.as_ref()
    }

    /// Read this field from an instance.
    pub fn value_of(&self, item: &T) -> SqlValue {
        (self.get)(item)
    }

    /// Write a fetched column value into an instance.
    pub fn assign(&self, item: &mut T, value: SqlValue) {
        (self.set)(item, value)
    }
}

impl<T> fmt::Debug for FieldDef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDef")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("default", &self.default)
            .finish()
    }
}

/// A payload type the persisted engine can store.
///
/// `Default` stands in for constructing a fresh instance before fetched
/// column values are assigned to it.
pub trait Record: Default + 'static {
    /// Field descriptors in column order.
    fn fields() -> Vec<FieldDef<Self>>;
}
