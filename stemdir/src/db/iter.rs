//! Lazy enumeration of a persisted directory

use super::database::Database;
use crate::dir::Entry;
use crate::error::Result;
use crate::schema::{Record, SchemaMapper};
use std::iter::FusedIterator;

/// Entries of one persisted directory, fetched one row per step.
///
/// Each call to `next` runs a single-row query for the next index, so no
/// statement stays open between steps and other queries may run while the
/// iterator is alive. The first error ends the iteration.
pub struct DbEntries<'a, T> {
    db: &'a Database,
    mapper: &'a SchemaMapper<T>,
    table: &'a str,
    scope: String,
    next: usize,
    done: bool,
}

impl<'a, T> DbEntries<'a, T> {
    pub(crate) fn new(
        db: &'a Database,
        mapper: &'a SchemaMapper<T>,
        table: &'a str,
        scope: String,
    ) -> Self {
        Self {
            db,
            mapper,
            table,
            scope,
            next: 0,
            done: false,
        }
    }
}

impl<T: Record> DbEntries<'_, T> {
    fn fetch(&self, index: usize) -> Result<Option<Entry<T>>> {
        let sql = format!(
            "SELECT * FROM [{}] WHERE {} AND [Index] = {}",
            self.table, self.scope, index
        );
        self.db.query_row(&sql, |row| {
            Ok(Entry {
                name: row.get::<_, Option<String>>("Name")?.unwrap_or_default(),
                item: self.mapper.materialize(row)?,
            })
        })
    }
}

impl<T: Record> Iterator for DbEntries<'_, T> {
    type Item = Result<Entry<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.fetch(self.next) {
            Ok(Some(entry)) => {
                self.next += 1;
                Some(Ok(entry))
            }
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl<T: Record> FusedIterator for DbEntries<'_, T> {}
