//! Row scanning: result columns to record fields by lowercase name.

use relmap_core::codec::raw_bytes;
use relmap_core::errors::{MapperError, MapperResult};
use relmap_core::schema::{describe, Record, TableSchema};
use rusqlite::Row;

/// Column-to-field plan for one result set, built once per statement.
#[derive(Debug, Clone)]
pub struct RowScanner {
    type_name: &'static str,
    /// Per result column: the field it feeds, or `None` to ignore it.
    slots: Vec<Option<&'static str>>,
}

impl RowScanner {
    /// Match result column names against the schema's persisted fields.
    /// Unknown and excluded columns are ignored.
    pub fn new<'a>(schema: &TableSchema, columns: impl IntoIterator<Item = &'a str>) -> Self {
        let slots = columns
            .into_iter()
            .map(|column| schema.column(column).map(|field| field.name))
            .collect();
        Self {
            type_name: schema.type_name,
            slots,
        }
    }

    /// Number of result columns that map onto a field.
    pub fn mapped_columns(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    /// Decode `row` into `record`, all or nothing.
    pub fn scan_into<R: Record + Clone>(&self, row: &Row<'_>, record: &mut R) -> MapperResult<()> {
        let mut staged = record.clone();
        for (index, slot) in self.slots.iter().enumerate() {
            let Some(name) = slot else { continue };
            let field = staged.field_mut(name).ok_or_else(|| {
                MapperError::unsupported(
                    self.type_name,
                    format!("field `{name}` is declared but not accessible"),
                )
            })?;
            let value = row.get_ref(index)?;
            field.decode(name, raw_bytes(value).as_deref())?;
        }
        *record = staged;
        Ok(())
    }
}

/// Scan one row into `record`, matching columns to fields by lowercase name.
///
/// Columns with no matching persisted field are skipped. When any column
/// fails to decode the record is left untouched.
pub fn scan<R: Record + Clone>(row: &Row<'_>, record: &mut R) -> MapperResult<()> {
    let schema = describe::<R>()?;
    let stmt: &rusqlite::Statement<'_> = row.as_ref();
    RowScanner::new(&schema, stmt.column_names()).scan_into(row, record)
}

#[cfg(test)]
mod tests {
    use relmap_core::{impl_record, Json};
    use rusqlite::Connection;

    use super::*;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Widget {
        id: i64,
        name: String,
        score: f32,
        tags: Json<Vec<String>>,
        note: Option<String>,
        scratch: u8,
    }

    impl_record!(Widget {
        id,
        name,
        score,
        tags,
        note,
        scratch => skip,
    });

    fn scan_sql(sql: &str, record: &mut Widget) -> MapperResult<()> {
        let conn = Connection::open_in_memory().unwrap();
        let mut stmt = conn.prepare(sql).unwrap();
        let mut rows = stmt.query([]).unwrap();
        let row = rows.next().unwrap().unwrap();
        scan(row, record)
    }

    #[test]
    fn test_scan_matches_columns_by_lowercase_name() {
        let mut widget = Widget::default();
        scan_sql(
            r#"SELECT 7 AS ID, 'alice' AS Name, 9.5 AS score, '["a","b"]' AS tags, NULL AS note"#,
            &mut widget,
        )
        .unwrap();
        assert_eq!(widget.id, 7);
        assert_eq!(widget.name, "alice");
        assert_eq!(widget.score, 9.5);
        assert_eq!(*widget.tags, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(widget.note, None);
    }

    #[test]
    fn test_scan_ignores_unknown_and_excluded_columns() {
        let mut widget = Widget {
            scratch: 3,
            ..Widget::default()
        };
        scan_sql("SELECT 'bob' AS name, 99 AS scratch, 1 AS extra", &mut widget).unwrap();
        assert_eq!(widget.name, "bob");
        assert_eq!(widget.scratch, 3);
    }

    #[test]
    fn test_failed_decode_leaves_record_untouched() {
        let mut widget = Widget {
            name: "keep".to_string(),
            score: 1.5,
            ..Widget::default()
        };
        let before = widget.clone();
        let err = scan_sql("SELECT 'changed' AS name, 'abc' AS score", &mut widget).unwrap_err();
        assert!(matches!(err, MapperError::Decode { ref column, .. } if column == "score"));
        assert_eq!(widget, before);
    }

    #[test]
    fn test_scanner_counts_mapped_columns() {
        let schema = describe::<Widget>().unwrap();
        let scanner = RowScanner::new(&schema, ["id", "NAME", "scratch", "other"]);
        assert_eq!(scanner.mapped_columns(), 2);
    }
}
