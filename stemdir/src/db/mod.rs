//! Persisted directory engine
//!
//! Every entry of every directory is one row of a single table named
//! `<prefix>Dir`:
//!
//! ```text
//! [Id] INTEGER PRIMARY KEY
//! [Name] VARCHAR(255)
//! [ParentDirId] INTEGER         -- NULL for the root directory
//! [Index] INTEGER NOT NULL      -- 0..count-1 within one parent
//! <one column per payload field>
//! FOREIGN KEY([ParentDirId]) REFERENCES [<prefix>Dir]([Id])
//! ```
//!
//! Any row can act as a directory: its children are the rows whose
//! `ParentDirId` is its `Id`. The cursor is just the parent id of the
//! current directory. Ordering is kept contiguous by shifting the `Index`
//! of every sibling at or after an insertion point up by one (making a gap)
//! and every sibling after a removed row down by one (closing it). A
//! mutation and its gap statements run in one transaction.

mod database;
mod iter;

pub use database::{ColumnInfo, Database, OpenStyle};
pub use iter::DbEntries;

use crate::config::{validate_table_prefix, StoreConfig};
use crate::dir::{check_index, Dir, Entries, Equality};
use crate::error::{DirError, Result};
use crate::schema::{quote, Record, SchemaMapper, SqlValue};
use tracing::{debug, trace, warn};

/// Directory tree stored in one SQLite table.
#[derive(Debug)]
pub struct DbDir<'db, T> {
    db: &'db Database,
    mapper: SchemaMapper<T>,
    table: String,
    cur_parent: Option<i64>,
}

impl<'db, T: Record> DbDir<'db, T> {
    /// Open the directory table `<prefix>Dir`, creating it if needed.
    ///
    /// The cursor starts at the root.
    pub fn new(db: &'db Database, prefix: &str) -> Result<Self> {
        validate_table_prefix(prefix)?;
        let mapper = SchemaMapper::<T>::new()?;
        let table = format!("{}Dir", prefix);

        let defs = format!(
            "    [Id] INTEGER PRIMARY KEY,\n    [Name] VARCHAR(255),\n    [ParentDirId] INTEGER,\n    [Index] INTEGER NOT NULL,\n{}    FOREIGN KEY([ParentDirId]) REFERENCES [{}]([Id])",
            mapper.column_defs(),
            table
        );
        db.create_table_if_not_exists(&table, &defs)?;
        debug!("Directory table {} ready", table);

        Ok(Self {
            db,
            mapper,
            table,
            cur_parent: None,
        })
    }

    /// Open the table named by the configured prefix.
    pub fn from_config(db: &'db Database, config: &StoreConfig) -> Result<Self> {
        Self::new(db, &config.table_prefix)
    }

    /// Open the table and move the cursor along `path`.
    pub fn open_at(db: &'db Database, prefix: &str, path: &str) -> Result<Self> {
        let mut dir = Self::new(db, prefix)?;
        dir.change_dir(path)?;
        Ok(dir)
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Row id of the current directory, `None` at the root.
    pub fn cur_dir_id(&self) -> Option<i64> {
        self.cur_parent
    }

    fn scope(&self) -> String {
        format!(
            "[ParentDirId] {}",
            SchemaMapper::<T>::equals_expr(self.cur_parent)
        )
    }

    fn at_index(&self, index: usize) -> String {
        format!("{} AND [Index] = {}", self.scope(), index)
    }

    fn max_index(&self) -> Result<i64> {
        self.db.query_int(
            &format!("SELECT MAX([Index]) FROM [{}] WHERE {}", self.table, self.scope()),
            -1,
        )
    }

    fn id_at(&self, index: usize) -> Result<Option<i64>> {
        self.db.query_opt_int(&format!(
            "SELECT [Id] FROM [{}] WHERE {}",
            self.table,
            self.at_index(index)
        ))
    }

    fn out_of_range(&self, index: usize) -> Result<DirError> {
        Ok(DirError::IndexOutOfRange {
            index,
            count: self.count()?,
        })
    }

    /// Count rows matching `predicate`, refusing more than one.
    fn count_unique(&self, predicate: &str) -> Result<bool> {
        let rows = self.db.count(&self.table, predicate)?;
        if rows > 1 {
            warn!("{} rows of {} match '{}'", rows, self.table, predicate);
            return Err(DirError::CorruptState {
                predicate: predicate.to_string(),
                rows,
            });
        }
        Ok(rows == 1)
    }

    fn make_index_gap(&self, index: usize) -> Result<()> {
        self.db.execute(&format!(
            "UPDATE [{}] SET [Index] = [Index] + 1 WHERE {} AND [Index] >= {}",
            self.table,
            self.scope(),
            index
        ))?;
        Ok(())
    }

    fn close_index_gap(&self, index: usize) -> Result<()> {
        self.db.execute(&format!(
            "UPDATE [{}] SET [Index] = [Index] - 1 WHERE {} AND [Index] > {}",
            self.table,
            self.scope(),
            index
        ))?;
        Ok(())
    }

    fn ensure_unique(&self, name: &str, item: &T) -> Result<()> {
        if self.item_exists(item)? {
            return Err(DirError::DuplicateItem {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    fn insert_row(&self, index: usize, name: &str, item: &T) -> Result<()> {
        self.db.execute(&format!(
            "INSERT INTO [{}] ([Name], [ParentDirId], [Index], {}) VALUES ({}, {}, {}, {})",
            self.table,
            self.mapper.column_names(),
            quote(name),
            SqlValue::from(self.cur_parent).literal(),
            index,
            self.mapper.values(item)
        ))?;
        Ok(())
    }

    fn delete_row(&self, index: usize) -> Result<()> {
        let id = match self.id_at(index)? {
            Some(id) => id,
            None => return Err(self.out_of_range(index)?),
        };

        let children = self
            .db
            .count(&self.table, &format!("[ParentDirId] = {}", id))?;
        if children > 0 {
            return Err(DirError::invalid_operation(format!(
                "entry at index {} still holds {} entries",
                index, children
            )));
        }

        self.db
            .execute(&format!("DELETE FROM [{}] WHERE [Id] = {}", self.table, id))?;
        self.close_index_gap(index)
    }

    fn path_of(&self, dir_id: Option<i64>) -> Result<String> {
        let Some(id) = dir_id else {
            return Ok("/".to_string());
        };

        let predicate = format!("[Id] = {}", id);
        let row = self.db.query_row(
            &format!(
                "SELECT [Name], [ParentDirId] FROM [{}] WHERE {}",
                self.table, predicate
            ),
            |row| {
                Ok((
                    row.get::<_, Option<String>>(0)?.unwrap_or_default(),
                    row.get::<_, Option<i64>>(1)?,
                ))
            },
        )?;

        match row {
            Some((name, parent)) => Ok(format!("{}{}/", self.path_of(parent)?, name)),
            None => Err(DirError::CorruptState { predicate, rows: 0 }),
        }
    }
}

impl<T: Record> Dir<T> for DbDir<'_, T> {
    fn equality(&self) -> Equality {
        Equality::AllFields
    }

    fn count(&self) -> Result<usize> {
        self.db.count(&self.table, &self.scope())
    }

    fn add(&mut self, name: &str, item: T) -> Result<usize> {
        self.db.transaction(|_| {
            self.ensure_unique(name, &item)?;
            let index = (self.max_index()? + 1) as usize;
            self.insert_row(index, name, &item)?;
            trace!("Added '{}' at {}", name, index);
            Ok(index)
        })
    }

    fn insert(&mut self, index: usize, name: &str, item: T) -> Result<usize> {
        self.db.transaction(|_| {
            self.ensure_unique(name, &item)?;
            let index = index.min(self.count()?);
            self.make_index_gap(index)?;
            self.insert_row(index, name, &item)?;
            trace!("Inserted '{}' at {}", name, index);
            Ok(index)
        })
    }

    fn item_at(&self, index: usize) -> Result<T> {
        let sql = format!("SELECT * FROM [{}] WHERE {}", self.table, self.at_index(index));
        match self.db.query_row(&sql, |row| self.mapper.materialize(row))? {
            Some(item) => Ok(item),
            None => Err(self.out_of_range(index)?),
        }
    }

    fn name_at(&self, index: usize) -> Result<String> {
        let sql = format!(
            "SELECT [Name] FROM [{}] WHERE {}",
            self.table,
            self.at_index(index)
        );
        match self
            .db
            .query_row(&sql, |row| row.get::<_, Option<String>>(0))?
        {
            Some(name) => Ok(name.unwrap_or_default()),
            None => Err(self.out_of_range(index)?),
        }
    }

    fn item_index(&self, item: &T) -> Result<usize> {
        let sql = format!(
            "SELECT [Index] FROM [{}] WHERE {} AND {} ORDER BY [Index] LIMIT 1",
            self.table,
            self.scope(),
            self.mapper.where_equals(item)
        );
        self.db
            .query_opt_int(&sql)?
            .map(|index| index as usize)
            .ok_or(DirError::ItemNotFound)
    }

    fn item_exists(&self, item: &T) -> Result<bool> {
        self.count_unique(&format!(
            "{} AND {}",
            self.scope(),
            self.mapper.where_equals(item)
        ))
    }

    fn item_exists_at(&self, index: usize) -> Result<bool> {
        self.count_unique(&self.at_index(index))
    }

    fn move_item(&mut self, src: usize, dest: usize) -> Result<()> {
        self.db.transaction(|_| {
            let count = self.count()?;
            check_index(src, count)?;
            let dest = dest.min(count - 1);
            if src == dest {
                return Ok(());
            }

            let id = self
                .id_at(src)?
                .ok_or_else(|| DirError::IndexOutOfRange { index: src, count })?;

            // Gap first; a source at or past the slot shifts with it
            let slot = if dest > src { dest + 1 } else { dest };
            self.make_index_gap(slot)?;
            let vacated = if src >= slot { src + 1 } else { src };

            self.db.execute(&format!(
                "UPDATE [{}] SET [Index] = {} WHERE [Id] = {}",
                self.table, slot, id
            ))?;
            self.close_index_gap(vacated)?;
            trace!("Moved {} to {}", src, dest);
            Ok(())
        })
    }

    fn remove(&mut self, item: &T) -> Result<()> {
        self.db.transaction(|_| {
            let index = self.item_index(item)?;
            self.delete_row(index)
        })
    }

    fn remove_at(&mut self, index: usize) -> Result<()> {
        self.db.transaction(|_| self.delete_row(index))
    }

    fn set_name_at(&mut self, index: usize, name: &str) -> Result<()> {
        let changed = self.db.execute(&format!(
            "UPDATE [{}] SET [Name] = {} WHERE {}",
            self.table,
            quote(name),
            self.at_index(index)
        ))?;
        if changed == 0 {
            return Err(self.out_of_range(index)?);
        }
        Ok(())
    }

    fn create_subdir(&mut self, index: usize) -> Result<()> {
        trace!("Row at {} can already hold entries", index);
        Ok(())
    }

    fn has_subdir_at(&self, _index: usize) -> Result<bool> {
        Ok(true)
    }

    fn delete_subdir(&mut self, _index: usize) -> Result<()> {
        Err(DirError::Unsupported {
            operation: "delete_subdir",
        })
    }

    fn down_dir(&mut self, index: usize) -> Result<()> {
        let id = self.id_at(index)?.ok_or_else(|| {
            DirError::invalid_operation(format!("no entry at index {} to descend into", index))
        })?;
        self.cur_parent = Some(id);
        debug!("Cursor now at row {} of {}", id, self.table);
        Ok(())
    }

    fn up_dir(&mut self) -> Result<()> {
        let id = self
            .cur_parent
            .ok_or_else(|| DirError::invalid_operation("already at the root directory"))?;
        self.cur_parent = self.db.query_opt_int(&format!(
            "SELECT [ParentDirId] FROM [{}] WHERE [Id] = {}",
            self.table, id
        ))?;
        debug!("Cursor now at {:?} of {}", self.cur_parent, self.table);
        Ok(())
    }

    fn has_parent(&self) -> bool {
        self.cur_parent.is_some()
    }

    fn cur_path(&self) -> Result<String> {
        self.path_of(self.cur_parent)
    }

    fn entries(&self) -> Entries<'_, T> {
        Box::new(DbEntries::new(
            self.db,
            &self.mapper,
            &self.table,
            self.scope(),
        ))
    }
}
