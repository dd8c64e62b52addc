//! Type definitions for introspected schema objects

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A column as seen in a database catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    /// Full dialect type, e.g. `varchar(255)` or `int unsigned`
    pub data_type: String,
    pub nullable: bool,
    /// Default as a ready-to-render SQL expression
    pub default: Option<String>,
    pub comment: Option<String>,
}

impl ColumnDescriptor {
    /// Create a new non-nullable column with the given name and type
    pub fn new(name: &str, data_type: &str) -> Self {
        Self {
            name: name.to_string(),
            data_type: data_type.to_string(),
            nullable: false,
            default: None,
            comment: None,
        }
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn default(mut self, default: &str) -> Self {
        self.default = Some(default.to_string());
        self
    }

    pub fn comment(mut self, comment: &str) -> Self {
        self.comment = Some(comment.to_string());
        self
    }
}

/// A foreign key constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyDescriptor {
    pub name: String,
    /// Constrained columns, in key order
    pub columns: Vec<String>,
    /// Set only when the referenced table lives in another schema
    #[serde(default)]
    pub ref_schema: Option<String>,
    pub ref_table: String,
    /// Referenced columns, in key order
    pub ref_columns: Vec<String>,
    pub on_delete: Option<String>,
    pub on_update: Option<String>,
}

impl ForeignKeyDescriptor {
    pub fn new(name: &str, ref_table: &str) -> Self {
        Self {
            name: name.to_string(),
            columns: Vec::new(),
            ref_schema: None,
            ref_table: ref_table.to_string(),
            ref_columns: Vec::new(),
            on_delete: None,
            on_update: None,
        }
    }

    /// Add a constrained/referenced column pair
    pub fn column(mut self, column: &str, ref_column: &str) -> Self {
        self.columns.push(column.to_string());
        self.ref_columns.push(ref_column.to_string());
        self
    }

    pub fn ref_schema(mut self, schema: &str) -> Self {
        self.ref_schema = Some(schema.to_string());
        self
    }

    pub fn on_delete(mut self, action: &str) -> Self {
        self.on_delete = Some(action.to_string());
        self
    }

    pub fn on_update(mut self, action: &str) -> Self {
        self.on_update = Some(action.to_string());
        self
    }

    /// Whether this key constrains the given column
    pub fn constrains(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }
}

/// Columns and foreign keys of one table in one database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSnapshot {
    pub name: String,
    /// Columns keyed by name, in catalog order
    pub columns: IndexMap<String, ColumnDescriptor>,
    pub foreign_keys: Vec<ForeignKeyDescriptor>,
}

impl TableSnapshot {
    /// Create a new table with the given name
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            columns: IndexMap::new(),
            foreign_keys: Vec::new(),
        }
    }

    pub fn add_column(&mut self, column: ColumnDescriptor) {
        self.columns.insert(column.name.clone(), column);
    }

    pub fn add_foreign_key(&mut self, fk: ForeignKeyDescriptor) {
        self.foreign_keys.push(fk);
    }

    pub fn with_column(mut self, column: ColumnDescriptor) -> Self {
        self.add_column(column);
        self
    }

    pub fn with_foreign_key(mut self, fk: ForeignKeyDescriptor) -> Self {
        self.add_foreign_key(fk);
        self
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.get(name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Foreign keys that constrain the given column
    pub fn foreign_keys_for<'a>(
        &'a self,
        column: &'a str,
    ) -> impl Iterator<Item = &'a ForeignKeyDescriptor> + 'a {
        self.foreign_keys.iter().filter(move |fk| fk.constrains(column))
    }
}

/// Outcome of looking a table up in a database
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableLookup {
    Found(TableSnapshot),
    NotFound,
}

impl TableLookup {
    pub fn is_found(&self) -> bool {
        matches!(self, TableLookup::Found(_))
    }

    pub fn as_snapshot(&self) -> Option<&TableSnapshot> {
        match self {
            TableLookup::Found(snapshot) => Some(snapshot),
            TableLookup::NotFound => None,
        }
    }

    /// Turn a lookup that must succeed into a result
    pub fn require(self, table: &str) -> crate::Result<TableSnapshot> {
        match self {
            TableLookup::Found(snapshot) => Ok(snapshot),
            TableLookup::NotFound => Err(crate::Error::TableNotFound(table.to_string())),
        }
    }
}
