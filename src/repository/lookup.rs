//! Read access to the lookup tables.
//!
//! Lookups are seeded by migration and never written through a repository.

use rusqlite::Row;

use crate::error::Result;
use crate::model::{Category, ConnectionStrength, EmployeeRange, EstimatedArr};
use crate::storage::ident::{Column, Table};
use crate::storage::query::{select_all, select_by_id, OrderBy};
use crate::storage::SqliteStorage;

const BY_ID: Option<OrderBy> = Some(OrderBy::asc(Column::Id));

fn category(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get("id")?,
        name: row.get("name")?,
        color: row.get("color")?,
        bullet: row.get("bullet")?,
        description: row.get("description")?,
    })
}

fn connection_strength(row: &Row<'_>) -> rusqlite::Result<ConnectionStrength> {
    Ok(ConnectionStrength {
        id: row.get("id")?,
        name: row.get("name")?,
        color: row.get("color")?,
    })
}

fn employee_range(row: &Row<'_>) -> rusqlite::Result<EmployeeRange> {
    Ok(EmployeeRange {
        id: row.get("id")?,
        label: row.get("label")?,
    })
}

fn estimated_arr(row: &Row<'_>) -> rusqlite::Result<EstimatedArr> {
    Ok(EstimatedArr {
        id: row.get("id")?,
        label: row.get("label")?,
    })
}

#[derive(Debug, Clone, Copy)]
pub struct LookupRepository<'db> {
    db: &'db SqliteStorage,
}

impl<'db> LookupRepository<'db> {
    #[must_use]
    pub const fn new(db: &'db SqliteStorage) -> Self {
        Self { db }
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn categories(&self) -> Result<Vec<Category>> {
        select_all(self.db.conn(), Table::Categories, BY_ID, category)
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn category(&self, id: &str) -> Result<Option<Category>> {
        select_by_id(self.db.conn(), Table::Categories, id, category)
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn connection_strengths(&self) -> Result<Vec<ConnectionStrength>> {
        select_all(self.db.conn(), Table::ConnectionStrengths, BY_ID, connection_strength)
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn connection_strength(&self, id: &str) -> Result<Option<ConnectionStrength>> {
        select_by_id(self.db.conn(), Table::ConnectionStrengths, id, connection_strength)
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn employee_ranges(&self) -> Result<Vec<EmployeeRange>> {
        select_all(self.db.conn(), Table::EmployeeRanges, BY_ID, employee_range)
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn employee_range(&self, id: &str) -> Result<Option<EmployeeRange>> {
        select_by_id(self.db.conn(), Table::EmployeeRanges, id, employee_range)
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn estimated_arrs(&self) -> Result<Vec<EstimatedArr>> {
        select_all(self.db.conn(), Table::EstimatedArrs, BY_ID, estimated_arr)
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn estimated_arr(&self, id: &str) -> Result<Option<EstimatedArr>> {
        select_by_id(self.db.conn(), Table::EstimatedArrs, id, estimated_arr)
    }
}
