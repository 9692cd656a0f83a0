//! Entity-to-table metadata inference.
//!
//! # Responsibility
//! - Define the `Entity` contract mapped structs implement by hand.
//! - Derive table name, id column and insertable columns from field
//!   descriptors and naming convention.
//!
//! # Invariants
//! - Inference is deterministic: the same `Entity` impl always yields the
//!   same `TableMeta`.
//! - Every name-to-column mapping goes through `camel_to_snake`, including
//!   the type-name fallback for the table.

use rusqlite::types::{ToSql, Value};
use rusqlite::Row;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::hash::Hash;

pub type MetaResult<T> = Result<T, MetaError>;

/// Inference error for entity field descriptors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaError {
    /// No field is marked as id and no field is literally named `id`.
    NoIdField { entity: &'static str },
    /// More than one field carries the id marker.
    DuplicateIdField { entity: &'static str },
    /// Two fields map onto the same column name.
    DuplicateColumn {
        entity: &'static str,
        column: String,
    },
}

impl Display for MetaError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoIdField { entity } => {
                write!(f, "entity `{entity}` has no id field and no field named `id`")
            }
            Self::DuplicateIdField { entity } => {
                write!(f, "entity `{entity}` declares more than one id field")
            }
            Self::DuplicateColumn { entity, column } => {
                write!(f, "entity `{entity}` maps two fields onto column `{column}`")
            }
        }
    }
}

impl Error for MetaError {}

/// Static descriptor for one mapped struct field.
///
/// Plays the role of the original annotations: the `id` marker, a `column`
/// override, and a `transient` flag excluding the field from inserts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    /// Rust field name; column name is derived from it unless overridden.
    pub name: &'static str,
    /// Explicit column name override.
    pub column: Option<&'static str>,
    /// Marks the primary-key field.
    pub id: bool,
    /// Excluded from generated insert statements.
    pub transient: bool,
}

impl FieldDef {
    /// Plain insertable field.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            column: None,
            id: false,
            transient: false,
        }
    }

    /// Primary-key field.
    pub const fn id(name: &'static str) -> Self {
        Self {
            name,
            column: None,
            id: true,
            transient: false,
        }
    }

    /// Field excluded from inserts.
    pub const fn transient(name: &'static str) -> Self {
        Self {
            name,
            column: None,
            id: false,
            transient: true,
        }
    }

    /// Overrides the derived column name.
    pub const fn with_column(mut self, column: &'static str) -> Self {
        self.column = Some(column);
        self
    }
}

/// Contract for structs mapped to a relational table.
///
/// Implemented by hand per entity; `TableMeta::infer` derives everything the
/// generated SQL needs from these descriptors.
pub trait Entity: Sized {
    /// Key type used by lookups and `mapped`; generated keys are `i64`
    /// rowids written back through `set_generated_key`.
    type Key: ToSql + Eq + Hash + Clone + Display;

    /// Unqualified Rust type name, used for table-name inference.
    fn type_name() -> &'static str;

    /// Explicit table-name override.
    fn table_override() -> Option<&'static str> {
        None
    }

    /// Field descriptors in declaration order.
    fn fields() -> &'static [FieldDef];

    /// Decodes one row selected with `select *`.
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error>;

    /// Bind values for insertable fields, keyed by Rust field name.
    ///
    /// Must cover exactly the non-id, non-transient fields.
    fn insert_values(&self) -> Vec<(&'static str, Value)>;

    /// Writes back the generated rowid after an insert.
    fn set_generated_key(&mut self, key: i64);

    /// Current key value, `None` before the entity was persisted.
    fn key(&self) -> Option<Self::Key>;
}

/// One insertable field with its resolved column name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertColumn {
    pub field: &'static str,
    pub column: String,
}

/// Inferred table mapping for one entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableMeta {
    /// Entity type name, kept for diagnostics.
    pub entity: &'static str,
    /// Mapped table name.
    pub table: String,
    /// Rust field backing the primary key.
    pub id_field: &'static str,
    /// Primary-key column name.
    pub id_column: String,
    /// Insertable columns in declaration order.
    pub insert_columns: Vec<InsertColumn>,
}

impl TableMeta {
    /// Derives the table mapping for `E`.
    ///
    /// Table name comes from the override or the converted type name. The id
    /// column comes from the id-marked field, falling back to a field named
    /// `id`; the fallback mirrors convention-over-configuration in the id
    /// position while still honoring a `column` override on the marked field.
    pub fn infer<E: Entity>() -> MetaResult<Self> {
        let entity = E::type_name();
        let table = match E::table_override() {
            Some(name) => name.to_string(),
            None => camel_to_snake(entity),
        };

        let fields = E::fields();
        let mut id_def: Option<&FieldDef> = None;
        for def in fields {
            if def.id {
                if id_def.is_some() {
                    return Err(MetaError::DuplicateIdField { entity });
                }
                id_def = Some(def);
            }
        }
        let id_def = match id_def {
            Some(def) => def,
            None => fields
                .iter()
                .find(|def| def.name == "id")
                .ok_or(MetaError::NoIdField { entity })?,
        };

        let id_column = resolve_column(id_def);
        let mut insert_columns = Vec::new();
        let mut seen = vec![id_column.clone()];
        for def in fields {
            if def.name == id_def.name {
                continue;
            }
            let column = resolve_column(def);
            if seen.contains(&column) {
                return Err(MetaError::DuplicateColumn { entity, column });
            }
            seen.push(column.clone());
            if def.transient {
                continue;
            }
            insert_columns.push(InsertColumn {
                field: def.name,
                column,
            });
        }

        Ok(Self {
            entity,
            table,
            id_field: id_def.name,
            id_column,
            insert_columns,
        })
    }
}

fn resolve_column(def: &FieldDef) -> String {
    match def.column {
        Some(column) => column.to_string(),
        None => camel_to_snake(def.name),
    }
}

/// Converts UpperCamel or lowerCamel names to lower_snake.
///
/// Idempotent on names that are already snake_case, so every name can be
/// routed through here unconditionally.
pub fn camel_to_snake(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() {
            let prev_lower = i > 0 && {
                let p = chars[i - 1];
                p.is_ascii_lowercase() || p.is_ascii_digit()
            };
            let next_lower = i > 0
                && chars[i - 1].is_ascii_uppercase()
                && chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
            if prev_lower || next_lower {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}
