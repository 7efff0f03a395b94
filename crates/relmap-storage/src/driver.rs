//! Driver selection and the SQL dialect each driver speaks.

use std::fmt;

use relmap_core::errors::{MapperError, MapperResult};
use relmap_core::schema::{FieldDescriptor, Kind};

/// A database driver the pool can open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Driver {
    Sqlite,
}

impl Driver {
    /// Resolve a driver name, case-insensitively.
    pub fn parse(name: &str) -> MapperResult<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "sqlite" | "sqlite3" => Ok(Driver::Sqlite),
            _ => Err(MapperError::UnknownDriver {
                driver: name.to_string(),
            }),
        }
    }

    pub fn dialect(self) -> Dialect {
        match self {
            Driver::Sqlite => Dialect::Sqlite,
        }
    }
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Driver::Sqlite => f.write_str("sqlite"),
        }
    }
}

/// Syntax differences the statement builder has to care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Sqlite,
    MySql,
}

impl Dialect {
    /// Quote an identifier, doubling any embedded quote character.
    pub fn quote(self, ident: &str) -> String {
        let q = match self {
            Dialect::Sqlite => '"',
            Dialect::MySql => '`',
        };
        let mut quoted = String::with_capacity(ident.len() + 2);
        quoted.push(q);
        for c in ident.chars() {
            if c == q {
                quoted.push(q);
            }
            quoted.push(c);
        }
        quoted.push(q);
        quoted
    }

    /// Type and constraints of the auto-incrementing primary key column.
    ///
    /// SQLite only auto-increments `INTEGER PRIMARY KEY`, which is 64-bit.
    pub fn primary_key_definition(self) -> &'static str {
        match self {
            Dialect::Sqlite => "INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT",
            Dialect::MySql => "BIGINT NOT NULL PRIMARY KEY AUTO_INCREMENT",
        }
    }

    /// Column type of a persisted field: its `type=` override, else the
    /// kind default as this dialect needs it.
    ///
    /// SQLite gives `BIGINT UNSIGNED` integer affinity, which turns values
    /// above `i64::MAX` into lossy REALs. A TEXT column keeps every `u64` exact.
    pub fn column_type(self, field: &FieldDescriptor) -> MapperResult<String> {
        match (self, field.kind, &field.options.sql_type) {
            (Dialect::Sqlite, Kind::UInt64, None) => Ok("TEXT".to_string()),
            _ => field.sql_type(),
        }
    }

    /// Trailing table options after the column list.
    pub fn table_options(self) -> &'static str {
        match self {
            Dialect::Sqlite => "",
            Dialect::MySql => " DEFAULT CHARSET utf8",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_driver_names() {
        assert_eq!(Driver::parse("sqlite").unwrap(), Driver::Sqlite);
        assert_eq!(Driver::parse(" SQLite3 ").unwrap(), Driver::Sqlite);
        let err = Driver::parse("mysql").unwrap_err();
        assert!(matches!(err, MapperError::UnknownDriver { ref driver } if driver == "mysql"));
    }

    fn field(kind: Kind, sql_type: Option<&str>) -> FieldDescriptor {
        FieldDescriptor {
            name: "hits",
            column: "hits".to_string(),
            kind,
            options: relmap_core::FieldOptions {
                sql_type: sql_type.map(str::to_string),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_sqlite_stores_u64_as_text() {
        let hits = field(Kind::UInt64, None);
        assert_eq!(Dialect::Sqlite.column_type(&hits).unwrap(), "TEXT");
        assert_eq!(Dialect::MySql.column_type(&hits).unwrap(), "BIGINT UNSIGNED");

        let overridden = field(Kind::UInt64, Some("NUMERIC(20)"));
        assert_eq!(Dialect::Sqlite.column_type(&overridden).unwrap(), "NUMERIC(20)");
        assert_eq!(
            Dialect::Sqlite.column_type(&field(Kind::UInt32, None)).unwrap(),
            "INTEGER UNSIGNED"
        );
    }

    #[test]
    fn test_quote_escapes() {
        assert_eq!(Dialect::Sqlite.quote("task"), "\"task\"");
        assert_eq!(Dialect::Sqlite.quote("we\"ird"), "\"we\"\"ird\"");
        assert_eq!(Dialect::MySql.quote("task"), "`task`");
        assert_eq!(Dialect::MySql.quote("a`b"), "`a``b`");
    }
}
