//! SQLite implementation of [`ItemStore`].
//!
//! [`SqliteStore`] persists budget items in a SQLite database with WAL mode,
//! a transaction around every write, and automatic schema migrations. The
//! self-referencing `parent_id` column cascades deletes to descendants.

use rusqlite::{params, Connection, OptionalExtension, Row};

use anggaran_core::{CategoryId, ItemPayload, ItemRecord, ItemScope, PeriodId};

use crate::error::StorageError;
use crate::traits::{check_parent, check_payload, ItemStore};
use crate::types::{Category, Period};

const ITEM_COLUMNS: &str = "id, kategori_id, periode_id, parent_id, kode, nama, deskripsi, level, \
     urutan, target_frekuensi, satuan_frekuensi, nominal_satuan, total_target";

/// SQLite-backed implementation of [`ItemStore`].
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (or creates) a SQLite database at `path`.
    pub fn new(path: &str) -> Result<Self, StorageError> {
        let conn = crate::schema::open_database(path)?;
        Ok(SqliteStore { conn })
    }

    /// Opens an in-memory SQLite database (for testing).
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = crate::schema::open_in_memory()?;
        Ok(SqliteStore { conn })
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    fn row_to_record(row: &Row<'_>) -> rusqlite::Result<ItemRecord> {
        let level: i64 = row.get(7)?;
        let order: i64 = row.get(8)?;
        Ok(ItemRecord::new(
            row.get(0)?,
            ItemPayload {
                category_id: CategoryId(row.get(1)?),
                period_id: PeriodId(row.get(2)?),
                parent_id: row.get(3)?,
                code: row.get(4)?,
                name: row.get(5)?,
                description: row.get(6)?,
                level: level as u8,
                order: order as u32,
                target_frequency: row.get(9)?,
                frequency_unit: row.get(10)?,
                unit_amount: row.get(11)?,
                total_target: row.get(12)?,
            },
        ))
    }

    fn find_item(&self, id: i64) -> Result<Option<ItemRecord>, StorageError> {
        let sql = format!("SELECT {} FROM item_keuangan WHERE id = ?1", ITEM_COLUMNS);
        let record = self
            .conn
            .query_row(&sql, params![id], Self::row_to_record)
            .optional()?;
        Ok(record)
    }

    fn check_scope(&self, scope: ItemScope) -> Result<(), StorageError> {
        let category: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM kategori_keuangan WHERE id = ?1)",
            params![scope.category.0],
            |row| row.get(0),
        )?;
        if !category {
            return Err(StorageError::CategoryNotFound(scope.category.0));
        }
        let period: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM periode_anggaran WHERE id = ?1)",
            params![scope.period.0],
            |row| row.get(0),
        )?;
        if !period {
            return Err(StorageError::PeriodNotFound(scope.period.0));
        }
        Ok(())
    }

    fn check(&self, payload: &ItemPayload, self_id: Option<i64>) -> Result<(), StorageError> {
        check_payload(payload)?;
        self.check_scope(payload.scope())?;
        if let Some(parent_id) = payload.parent_id {
            let parent = self
                .find_item(parent_id)?
                .ok_or_else(|| StorageError::IntegrityError {
                    reason: format!("parent {} does not exist", parent_id),
                })?;
            check_parent(payload, &parent, self_id)?;
        }
        Ok(())
    }
}

impl ItemStore for SqliteStore {
    // -------------------------------------------------------------------
    // Catalogs
    // -------------------------------------------------------------------

    fn list_categories(&self) -> Result<Vec<Category>, StorageError> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT id, nama FROM kategori_keuangan ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(Category {
                id: CategoryId(row.get(0)?),
                name: row.get(1)?,
            })
        })?;
        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    fn create_category(&mut self, name: &str) -> Result<Category, StorageError> {
        let tx = self.conn.transaction()?;
        let exists: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM kategori_keuangan WHERE nama = ?1)",
            params![name],
            |row| row.get(0),
        )?;
        if exists {
            return Err(StorageError::IntegrityError {
                reason: format!("category '{}' already exists", name),
            });
        }
        tx.execute("INSERT INTO kategori_keuangan (nama) VALUES (?1)", params![name])?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(Category {
            id: CategoryId(id),
            name: name.to_string(),
        })
    }

    fn list_periods(&self) -> Result<Vec<Period>, StorageError> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT id, nama, tahun FROM periode_anggaran ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(Period {
                id: PeriodId(row.get(0)?),
                name: row.get(1)?,
                year: row.get(2)?,
            })
        })?;
        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    fn create_period(&mut self, name: &str, year: i32) -> Result<Period, StorageError> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO periode_anggaran (nama, tahun) VALUES (?1, ?2)",
            params![name, year],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(Period {
            id: PeriodId(id),
            name: name.to_string(),
            year,
        })
    }

    // -------------------------------------------------------------------
    // Budget items
    // -------------------------------------------------------------------

    fn list_items(&self, scope: ItemScope) -> Result<Vec<ItemRecord>, StorageError> {
        self.check_scope(scope)?;
        let sql = format!(
            "SELECT {} FROM item_keuangan WHERE kategori_id = ?1 AND periode_id = ?2 \
             ORDER BY level, urutan, id",
            ITEM_COLUMNS
        );
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let rows = stmt.query_map(
            params![scope.category.0, scope.period.0],
            Self::row_to_record,
        )?;
        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    fn get_item(&self, id: i64) -> Result<ItemRecord, StorageError> {
        self.find_item(id)?.ok_or(StorageError::ItemNotFound(id))
    }

    fn create_item(&mut self, payload: &ItemPayload) -> Result<ItemRecord, StorageError> {
        self.check(payload, None)?;
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO item_keuangan (kategori_id, periode_id, parent_id, kode, nama, deskripsi, \
             level, urutan, target_frekuensi, satuan_frekuensi, nominal_satuan, total_target) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                payload.category_id.0,
                payload.period_id.0,
                payload.parent_id,
                payload.code,
                payload.name,
                payload.description,
                payload.level,
                payload.order,
                payload.target_frequency,
                payload.frequency_unit,
                payload.unit_amount,
                payload.total_target,
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(ItemRecord::new(id, payload.clone()))
    }

    fn update_item(&mut self, id: i64, payload: &ItemPayload) -> Result<ItemRecord, StorageError> {
        if self.find_item(id)?.is_none() {
            return Err(StorageError::ItemNotFound(id));
        }
        self.check(payload, Some(id))?;
        let tx = self.conn.transaction()?;
        tx.execute(
            "UPDATE item_keuangan SET kategori_id = ?2, periode_id = ?3, parent_id = ?4, kode = ?5, \
             nama = ?6, deskripsi = ?7, level = ?8, urutan = ?9, target_frekuensi = ?10, \
             satuan_frekuensi = ?11, nominal_satuan = ?12, total_target = ?13 WHERE id = ?1",
            params![
                id,
                payload.category_id.0,
                payload.period_id.0,
                payload.parent_id,
                payload.code,
                payload.name,
                payload.description,
                payload.level,
                payload.order,
                payload.target_frequency,
                payload.frequency_unit,
                payload.unit_amount,
                payload.total_target,
            ],
        )?;
        tx.commit()?;
        Ok(ItemRecord::new(id, payload.clone()))
    }

    fn delete_item(&mut self, id: i64) -> Result<(), StorageError> {
        let tx = self.conn.transaction()?;
        let rows = tx.execute("DELETE FROM item_keuangan WHERE id = ?1", params![id])?;
        tx.commit()?;
        if rows == 0 {
            return Err(StorageError::ItemNotFound(id));
        }
        Ok(())
    }
}
