//! Type descriptor resolver: turns a record's declared fields into the
//! table schema every statement is built from.

use tracing::trace;

use crate::codec::SqlValue;
use crate::errors::{MapperError, MapperResult};

use super::directive::FieldOptions;
use super::kind::Kind;
use super::record::Record;

/// Column name of the primary key.
pub const PRIMARY_KEY_COLUMN: &str = "id";

/// Resolved metadata for one declared field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Field name as declared.
    pub name: &'static str,
    /// Lowercase column name.
    pub column: String,
    pub kind: Kind,
    pub options: FieldOptions,
}

impl FieldDescriptor {
    pub fn is_primary_key(&self) -> bool {
        self.column == PRIMARY_KEY_COLUMN
    }

    pub fn is_excluded(&self) -> bool {
        self.options.exclude && !self.is_primary_key()
    }

    /// Column type: the explicit override, else the kind default.
    pub fn sql_type(&self) -> MapperResult<String> {
        match &self.options.sql_type {
            Some(sql_type) => Ok(sql_type.clone()),
            None => self.kind.default_sql_type().map(str::to_string),
        }
    }
}

/// Where the primary key comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimaryKey {
    /// Declared field at this index of `TableSchema::fields`.
    Declared(usize),
    /// No `id` field; the table gets one anyway.
    Synthesized,
}

/// Ordered field descriptors of one record type plus its table name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub type_name: &'static str,
    pub table: String,
    pub fields: Vec<FieldDescriptor>,
    pub primary_key: PrimaryKey,
}

impl TableSchema {
    /// Fields that map to a column, the primary key included.
    pub fn persisted(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| !f.is_excluded())
    }

    /// Persisted fields other than the primary key, in declaration order.
    pub fn data_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.persisted().filter(|f| !f.is_primary_key())
    }

    /// Persisted field by column name; the lookup is case-insensitive.
    pub fn column(&self, name: &str) -> Option<&FieldDescriptor> {
        let name = name.to_ascii_lowercase();
        self.persisted().find(|f| f.column == name)
    }

    pub fn primary_key_field(&self) -> Option<&FieldDescriptor> {
        match self.primary_key {
            PrimaryKey::Declared(index) => self.fields.get(index),
            PrimaryKey::Synthesized => None,
        }
    }

    /// Current primary key value of `record`.
    ///
    /// Fails `BadParameter` when the type has no `id` field or it is not an `i64`.
    pub fn primary_key_value<R: Record>(&self, record: &R) -> MapperResult<i64> {
        let descriptor = self.primary_key_field().ok_or_else(|| {
            MapperError::bad_parameter(format!("`{}` has no `id` field", self.type_name))
        })?;
        if descriptor.kind != Kind::Int64 {
            return Err(MapperError::bad_parameter(format!(
                "`{}.{}` must be i64, found {}",
                self.type_name, descriptor.name, descriptor.kind
            )));
        }
        let field = record.field(descriptor.name).ok_or_else(|| {
            MapperError::bad_parameter(format!(
                "`{}.{}` is not accessible",
                self.type_name, descriptor.name
            ))
        })?;
        match field.encode()? {
            SqlValue::Integer(id) => Ok(id),
            other => Err(MapperError::bad_parameter(format!(
                "`{}.{}` holds {other:?}, expected an integer",
                self.type_name, descriptor.name
            ))),
        }
    }
}

/// Describe `R`: validate its declared fields and resolve their directives.
///
/// Nothing is cached; every call walks the declaration again.
pub fn describe<R: Record>() -> MapperResult<TableSchema> {
    let type_name = R::type_name();
    if !is_identifier(type_name) {
        return Err(MapperError::unsupported(
            type_name,
            "type name is not a valid table identifier",
        ));
    }

    let defs = R::fields();
    let mut fields: Vec<FieldDescriptor> = Vec::with_capacity(defs.len());
    let mut primary_key = PrimaryKey::Synthesized;

    for def in defs {
        if !is_identifier(def.name) {
            return Err(MapperError::unsupported(
                type_name,
                format!("field name `{}` is not a valid column identifier", def.name),
            ));
        }
        let column = def.name.to_ascii_lowercase();
        if fields.iter().any(|f| f.column == column) {
            return Err(MapperError::unsupported(
                type_name,
                format!("duplicate column `{column}`"),
            ));
        }

        // The key column ignores directives.
        let options = if column == PRIMARY_KEY_COLUMN {
            primary_key = PrimaryKey::Declared(fields.len());
            FieldOptions::default()
        } else {
            def.directives.resolve()?
        };

        fields.push(FieldDescriptor {
            name: def.name,
            column,
            kind: def.kind,
            options,
        });
    }

    let schema = TableSchema {
        type_name,
        table: type_name.to_ascii_lowercase(),
        fields,
        primary_key,
    };
    trace!(
        table = %schema.table,
        fields = schema.fields.len(),
        primary_key = ?schema.primary_key,
        "described record type"
    );
    Ok(schema)
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
