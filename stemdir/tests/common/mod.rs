//! Shared payload types and helpers for the integration tests

#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use stemdir::schema::{FieldDef, Record};
use stemdir::{Database, DbDir, Dir, MemDir};

/// Plain payload compared on every field.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Contents {
    pub s: String,
    pub i: i64,
}

impl Contents {
    pub fn new(s: &str, i: i64) -> Self {
        Self { s: s.to_string(), i }
    }
}

impl Record for Contents {
    fn fields() -> Vec<FieldDef<Self>> {
        vec![
            FieldDef::text("S", |c: &Contents| c.s.clone(), |c, v| c.s = v),
            FieldDef::integer("I", |c: &Contents| c.i, |c, v| c.i = v),
        ]
    }
}

/// Payload with a date column and a column default.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Appointment {
    pub title: String,
    pub at: NaiveDateTime,
    pub slots: i64,
}

impl Record for Appointment {
    fn fields() -> Vec<FieldDef<Self>> {
        vec![
            FieldDef::text("Title", |a: &Appointment| a.title.clone(), |a, v| {
                a.title = v
            }),
            FieldDef::datetime("At", |a: &Appointment| a.at, |a, v| a.at = v),
            FieldDef::integer("Slots", |a: &Appointment| a.slots, |a, v| a.slots = v)
                .with_default(1_i64),
        ]
    }
}

pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, 0)
        .unwrap()
}

/// Payload whose `PartialEq` only looks at the key.
#[derive(Debug, Default, Clone)]
pub struct Keyed {
    pub key: String,
    pub revision: i64,
}

impl PartialEq for Keyed {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Record for Keyed {
    fn fields() -> Vec<FieldDef<Self>> {
        vec![
            FieldDef::text("Key", |k: &Keyed| k.key.clone(), |k, v| k.key = v),
            FieldDef::integer("Revision", |k: &Keyed| k.revision, |k, v| k.revision = v),
        ]
    }
}

/// Which engine a parametrized test runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Mem,
    Db,
}

/// Run `body` against a fresh, empty directory of the given engine.
pub fn with_dir<R>(backend: Backend, body: impl FnOnce(&mut dyn Dir<Contents>) -> R) -> R {
    match backend {
        Backend::Mem => {
            let mut dir = MemDir::new();
            body(&mut dir)
        }
        Backend::Db => {
            let db = Database::open_in_memory().unwrap();
            let mut dir = DbDir::<Contents>::new(&db, "Stem").unwrap();
            body(&mut dir)
        }
    }
}

pub fn items(dir: &dyn Dir<Contents>) -> Vec<Contents> {
    dir.entries().map(|e| e.unwrap().item).collect()
}

pub fn names(dir: &dyn Dir<Contents>) -> Vec<String> {
    dir.entries().map(|e| e.unwrap().name).collect()
}

/// `[Index]` values stored for the root directory, in order.
pub fn root_indices(db: &Database, table: &str) -> Vec<i64> {
    let mut stmt = db
        .connection()
        .prepare(&format!(
            "SELECT [Index] FROM [{}] WHERE [ParentDirId] IS NULL ORDER BY [Index]",
            table
        ))
        .unwrap();
    stmt.query_map([], |row| row.get(0))
        .unwrap()
        .collect::<rusqlite::Result<Vec<i64>>>()
        .unwrap()
}
