//! Generic CRUD service over an inferred table mapping.
//!
//! # Responsibility
//! - Execute the generated and dynamic statements for one entity type.
//! - Keep SQL assembly in `crate::sql` and mapping rules in `crate::meta`.
//!
//! # Invariants
//! - Zero affected rows on targeted update/delete is reported as `NotFound`.
//! - Inserts write the generated rowid back into the entity before returning.

use crate::meta::{Entity, MetaError, TableMeta};
use crate::sql::{
    count_fields_sql, update_fields_sql, where_fields, Clause, FieldValue, NamedParams, SqlSet,
    PAGE_SUFFIX,
};
use log::{debug, warn};
use rusqlite::types::Value;
use rusqlite::{Connection, ToSql};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::marker::PhantomData;

pub type DaoResult<T> = Result<T, DaoError>;

/// Data-access error for generated and dynamic statements.
#[derive(Debug)]
pub enum DaoError {
    Sqlite(rusqlite::Error),
    Meta(MetaError),
    NotFound {
        entity: &'static str,
        key: String,
    },
    /// `update_fields` was called with no fields to set.
    EmptyUpdate {
        entity: &'static str,
    },
}

impl Display for DaoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::Meta(err) => write!(f, "{err}"),
            Self::NotFound { entity, key } => {
                write!(f, "{entity} with key `{key}` not found")
            }
            Self::EmptyUpdate { entity } => {
                write!(f, "refusing to update {entity} with an empty field list")
            }
        }
    }
}

impl Error for DaoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::Meta(err) => Some(err),
            Self::NotFound { .. } => None,
            Self::EmptyUpdate { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DaoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<MetaError> for DaoError {
    fn from(value: MetaError) -> Self {
        Self::Meta(value)
    }
}

/// Window request for paged queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: u32,
    pub offset: u32,
}

impl PageRequest {
    pub fn new(limit: u32, offset: u32) -> Self {
        Self { limit, offset }
    }

    /// First window of the given size.
    pub fn first(limit: u32) -> Self {
        Self { limit, offset: 0 }
    }
}

/// One result window plus the unwindowed total.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<E> {
    pub items: Vec<E>,
    pub total: u64,
    pub limit: u32,
    pub offset: u32,
}

impl<E> Page<E> {
    /// Whether rows exist beyond this window.
    pub fn has_more(&self) -> bool {
        u64::from(self.offset) + (self.items.len() as u64) < self.total
    }
}

/// Generic CRUD service for one entity type over a borrowed connection.
pub struct SqlService<'conn, E: Entity> {
    conn: &'conn Connection,
    meta: TableMeta,
    sql: SqlSet,
    _entity: PhantomData<E>,
}

impl<'conn, E: Entity> SqlService<'conn, E> {
    /// Infers the table mapping and pre-generates the fixed statements.
    pub fn try_new(conn: &'conn Connection) -> DaoResult<Self> {
        let meta = TableMeta::infer::<E>()?;
        let sql = SqlSet::generate(&meta);
        debug!(
            "event=service_init module=service status=ok entity={} table={} id_column={}",
            meta.entity, meta.table, meta.id_column
        );
        Ok(Self {
            conn,
            meta,
            sql,
            _entity: PhantomData,
        })
    }

    /// Inferred mapping, exposed for diagnostics and custom SQL callers.
    pub fn meta(&self) -> &TableMeta {
        &self.meta
    }

    /// Gets one entity by key; absence is `Ok(None)`, errors propagate.
    pub fn get(&self, key: &E::Key) -> DaoResult<Option<E>> {
        let mut stmt = self.conn.prepare(&self.sql.select_by_id)?;
        let mut rows = stmt.query([(":id", key as &dyn ToSql)].as_slice())?;
        match rows.next()? {
            Some(row) => Ok(Some(E::from_row(row)?)),
            None => Ok(None),
        }
    }

    /// Lists every row of the mapped table.
    pub fn get_all(&self) -> DaoResult<Vec<E>> {
        self.query_list(&self.sql.select_all, &[])
    }

    /// Returns one window of the mapped table plus the total row count.
    pub fn get_page(&self, page: &PageRequest) -> DaoResult<Page<E>> {
        self.find_page_by_fields(&[], page)
    }

    /// First entity matching every filter, in table order.
    pub fn find_by_fields(&self, fields: &[FieldValue]) -> DaoResult<Option<E>> {
        let (where_sql, params) = where_fields(fields);
        let sql = format!("{}{}", self.sql.select_all, where_sql);
        self.query_one(&sql, &params)
    }

    /// All entities matching every filter.
    pub fn find_list_by_fields(&self, fields: &[FieldValue]) -> DaoResult<Vec<E>> {
        let (where_sql, params) = where_fields(fields);
        let sql = format!("{}{}", self.sql.select_all, where_sql);
        self.query_list(&sql, &params)
    }

    /// One filtered window plus the filtered total.
    pub fn find_page_by_fields(
        &self,
        fields: &[FieldValue],
        page: &PageRequest,
    ) -> DaoResult<Page<E>> {
        let total = self.count_by_fields(fields)?;

        let (where_sql, mut params) = where_fields(fields);
        let sql = format!("{}{}{}", self.sql.select_all, where_sql, PAGE_SUFFIX);
        params.push((":limit".to_string(), Value::Integer(i64::from(page.limit))));
        params.push((":offset".to_string(), Value::Integer(i64::from(page.offset))));
        let items = self.query_list(&sql, &params)?;

        Ok(Page {
            items,
            total,
            limit: page.limit,
            offset: page.offset,
        })
    }

    /// Counts rows matching every filter.
    pub fn count_by_fields(&self, fields: &[FieldValue]) -> DaoResult<u64> {
        let (sql, params) = count_fields_sql(&self.meta, fields);
        let bound = named_refs(&params);
        let count: i64 = self
            .conn
            .query_row(&sql, bound.as_slice(), |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Partially updates the row with the given key.
    ///
    /// Returns the affected-row count; zero rows is `NotFound`.
    pub fn update_fields(&self, key: &E::Key, fields: &[FieldValue]) -> DaoResult<usize> {
        if fields.is_empty() {
            return Err(DaoError::EmptyUpdate {
                entity: self.meta.entity,
            });
        }

        let (sql, params) = update_fields_sql(&self.meta, fields);
        let mut bound = named_refs(&params);
        bound.push((":id", key as &dyn ToSql));
        let changed = self.conn.execute(&sql, bound.as_slice())?;
        if changed == 0 {
            return Err(self.not_found(key));
        }
        Ok(changed)
    }

    /// Inserts the entity and writes the generated rowid back into it.
    pub fn insert(&self, entity: &mut E) -> DaoResult<i64> {
        let values = entity.insert_values();
        let params: NamedParams = values
            .into_iter()
            .map(|(name, value)| (format!(":{name}"), value))
            .collect();
        let bound = named_refs(&params);
        self.conn.execute(&self.sql.insert, bound.as_slice())?;

        let key = self.conn.last_insert_rowid();
        entity.set_generated_key(key);
        debug!(
            "event=entity_insert module=service status=ok entity={} key={}",
            self.meta.entity, key
        );
        Ok(key)
    }

    /// Deletes the row with the given key; zero rows is `NotFound`.
    pub fn delete(&self, key: &E::Key) -> DaoResult<usize> {
        let changed = self
            .conn
            .execute(&self.sql.delete_by_id, [(":id", key as &dyn ToSql)].as_slice())?;
        if changed == 0 {
            return Err(self.not_found(key));
        }
        Ok(changed)
    }

    /// First entity matching a raw condition fragment.
    pub fn find_by_clause(&self, clause: &Clause) -> DaoResult<Option<E>> {
        let sql = format!("{} WHERE {}", self.sql.select_all, clause.as_sql());
        self.query_one(&sql, clause.params())
    }

    /// All entities matching a raw condition fragment.
    pub fn find_list_by_clause(&self, clause: &Clause) -> DaoResult<Vec<E>> {
        let sql = format!("{} WHERE {}", self.sql.select_all, clause.as_sql());
        self.query_list(&sql, clause.params())
    }

    /// Indexes entities by key; unkeyed entities are skipped with a warning.
    pub fn mapped(&self, list: Vec<E>) -> HashMap<E::Key, E> {
        let mut mapped = HashMap::with_capacity(list.len());
        for entity in list {
            match entity.key() {
                Some(key) => {
                    mapped.insert(key, entity);
                }
                None => warn!(
                    "event=entity_map module=service status=skipped entity={} reason=missing_key",
                    self.meta.entity
                ),
            }
        }
        mapped
    }

    fn query_one(&self, sql: &str, params: &[(String, Value)]) -> DaoResult<Option<E>> {
        let bound = named_refs(params);
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(bound.as_slice())?;
        match rows.next()? {
            Some(row) => Ok(Some(E::from_row(row)?)),
            None => Ok(None),
        }
    }

    fn query_list(&self, sql: &str, params: &[(String, Value)]) -> DaoResult<Vec<E>> {
        let bound = named_refs(params);
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(bound.as_slice())?;
        let mut entities = Vec::new();
        while let Some(row) = rows.next()? {
            entities.push(E::from_row(row)?);
        }
        Ok(entities)
    }

    fn not_found(&self, key: &E::Key) -> DaoError {
        DaoError::NotFound {
            entity: self.meta.entity,
            key: key.to_string(),
        }
    }
}

fn named_refs(params: &[(String, Value)]) -> Vec<(&str, &dyn ToSql)> {
    params
        .iter()
        .map(|(name, value)| (name.as_str(), value as &dyn ToSql))
        .collect()
}
