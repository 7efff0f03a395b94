//! SQL statement builder.
//!
//! Pure: turns a `TableSchema` plus a record into SQL text and the ordered
//! bind values for its `?` placeholders. Nothing here touches a connection.

use relmap_core::codec::SqlValue;
use relmap_core::errors::{MapperError, MapperResult};
use relmap_core::schema::{FieldDescriptor, PrimaryKey, Record, TableSchema, PRIMARY_KEY_COLUMN};

use crate::driver::Dialect;

/// SQL text plus its bind values, in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

/// Builds statements for one dialect.
#[derive(Debug, Clone, Copy)]
pub struct StatementBuilder {
    dialect: Dialect,
}

impl StatementBuilder {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// `CREATE TABLE IF NOT EXISTS`, columns in declaration order.
    ///
    /// A declared `id` keeps its position; a synthesized one goes last.
    pub fn create_table(&self, schema: &TableSchema) -> MapperResult<String> {
        let key = format!(
            "{} {}",
            self.dialect.quote(PRIMARY_KEY_COLUMN),
            self.dialect.primary_key_definition()
        );

        let mut columns = Vec::with_capacity(schema.fields.len() + 1);
        for field in schema.persisted() {
            if field.is_primary_key() {
                columns.push(key.clone());
            } else {
                columns.push(format!(
                    "{} {}{}",
                    self.dialect.quote(&field.column),
                    self.dialect.column_type(field)?,
                    field.options.constraint_sql()
                ));
            }
        }

        if columns.is_empty() {
            return Err(MapperError::bad_parameter(format!(
                "`{}` has no persistable fields",
                schema.type_name
            )));
        }
        if schema.primary_key == PrimaryKey::Synthesized {
            columns.push(key);
        }

        Ok(format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    {}\n){}",
            self.dialect.quote(&schema.table),
            columns.join(",\n    "),
            self.dialect.table_options()
        ))
    }

    /// `INSERT` of every persisted field except the key.
    pub fn insert<R: Record>(&self, schema: &TableSchema, record: &R) -> MapperResult<Statement> {
        let mut columns = Vec::new();
        let mut params = Vec::new();
        for field in schema.data_fields() {
            columns.push(self.dialect.quote(&field.column));
            params.push(encode_field(schema, field, record)?);
        }

        if columns.is_empty() {
            return Err(MapperError::bad_parameter(format!(
                "`{}` has no insertable fields",
                schema.type_name
            )));
        }

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.dialect.quote(&schema.table),
            columns.join(", "),
            placeholders(params.len())
        );
        Ok(Statement { sql, params })
    }

    /// `SELECT *` matching the record's current values in `columns`, or
    /// its key when `columns` is empty.
    pub fn select<R: Record>(
        &self,
        schema: &TableSchema,
        record: &R,
        columns: &[&str],
    ) -> MapperResult<Statement> {
        let mut conditions = Vec::with_capacity(columns.len().max(1));
        let mut params = Vec::with_capacity(columns.len().max(1));

        if columns.is_empty() {
            let id = schema.primary_key_value(record)?;
            if id < 0 {
                return Err(MapperError::bad_parameter(format!(
                    "`{}` read by key needs a non-negative id, got {id}",
                    schema.type_name
                )));
            }
            conditions.push(format!("{}=?", self.dialect.quote(PRIMARY_KEY_COLUMN)));
            params.push(SqlValue::Integer(id));
        } else {
            for column in columns {
                let field = schema.column(column).ok_or_else(|| {
                    MapperError::bad_parameter(format!(
                        "`{}` has no column `{column}`",
                        schema.type_name
                    ))
                })?;
                conditions.push(format!("{}=?", self.dialect.quote(&field.column)));
                params.push(encode_field(schema, field, record)?);
            }
        }

        let sql = format!(
            "SELECT * FROM {} WHERE {}",
            self.dialect.quote(&schema.table),
            conditions.join(" AND ")
        );
        Ok(Statement { sql, params })
    }

    /// `UPDATE` of every persisted non-key field, keyed by the record's id.
    pub fn update<R: Record>(&self, schema: &TableSchema, record: &R) -> MapperResult<Statement> {
        let id = schema.primary_key_value(record)?;
        if id < 0 {
            return Err(MapperError::bad_parameter(format!(
                "`{}` update needs a non-negative id, got {id}",
                schema.type_name
            )));
        }

        let mut assignments = Vec::new();
        let mut params = Vec::new();
        for field in schema.data_fields() {
            assignments.push(format!("{}=?", self.dialect.quote(&field.column)));
            params.push(encode_field(schema, field, record)?);
        }

        if assignments.is_empty() {
            return Err(MapperError::bad_parameter(format!(
                "`{}` has no updatable fields",
                schema.type_name
            )));
        }

        let sql = format!(
            "UPDATE {} SET {} WHERE {}={id}",
            self.dialect.quote(&schema.table),
            assignments.join(", "),
            self.dialect.quote(PRIMARY_KEY_COLUMN)
        );
        Ok(Statement { sql, params })
    }

    pub fn delete(&self, table: &str, id: i64) -> MapperResult<Statement> {
        if table.trim().is_empty() {
            return Err(MapperError::bad_parameter("delete needs a table name"));
        }
        let sql = format!(
            "DELETE FROM {} WHERE {}=?",
            self.dialect.quote(table),
            self.dialect.quote(PRIMARY_KEY_COLUMN)
        );
        Ok(Statement {
            sql,
            params: vec![SqlValue::Integer(id)],
        })
    }
}

fn encode_field<R: Record>(
    schema: &TableSchema,
    field: &FieldDescriptor,
    record: &R,
) -> MapperResult<SqlValue> {
    let value = record.field(field.name).ok_or_else(|| {
        MapperError::unsupported(
            schema.type_name,
            format!("field `{}` is declared but not accessible", field.name),
        )
    })?;
    value.encode()
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}
