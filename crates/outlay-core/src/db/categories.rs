//! Category operations

use rusqlite::{params, OptionalExtension};

use super::{parse_datetime, Database};
use crate::error::Result;
use crate::models::{Category, DEFAULT_CATEGORY_COLOR};

impl Database {
    /// Create a category; color falls back to the default when absent
    pub fn create_category(&self, name: &str, color: Option<&str>) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO categories (name, color) VALUES (?, ?)",
            params![name, color.unwrap_or(DEFAULT_CATEGORY_COLOR)],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// List all categories in name order
    pub fn list_categories(&self) -> Result<Vec<Category>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT id, name, color, created_at FROM categories ORDER BY name")?;

        let categories = stmt
            .query_map([], |row| Self::row_to_category(row))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(categories)
    }

    /// Get a category by ID
    pub fn get_category(&self, id: i64) -> Result<Option<Category>> {
        let conn = self.conn()?;
        let category = conn
            .query_row(
                "SELECT id, name, color, created_at FROM categories WHERE id = ?",
                params![id],
                |row| Self::row_to_category(row),
            )
            .optional()?;

        Ok(category)
    }

    /// Look up a category by exact name
    pub fn get_category_by_name(&self, name: &str) -> Result<Option<Category>> {
        let conn = self.conn()?;
        let category = conn
            .query_row(
                "SELECT id, name, color, created_at FROM categories WHERE name = ?",
                params![name],
                |row| Self::row_to_category(row),
            )
            .optional()?;

        Ok(category)
    }

    pub(crate) fn row_to_category(row: &rusqlite::Row) -> rusqlite::Result<Category> {
        let created_at_str: String = row.get(3)?;
        Ok(Category {
            id: row.get(0)?,
            name: row.get(1)?,
            color: row.get(2)?,
            created_at: parse_datetime(&created_at_str),
        })
    }
}
