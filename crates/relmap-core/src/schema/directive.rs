//! Per-field directives and the compact tag grammar.
//!
//! Tags are comma-separated tokens: `-`, `unique`, `notnull`, `default=<literal>`
//! and `type=<SQL type>`. Commas nested in parentheses or quotes do not split,
//! so `type=DECIMAL(10,2)` and `default='a,b'` are single tokens.
//! Unknown tokens are rejected rather than ignored.

use crate::errors::{MapperError, MapperResult};

/// A single schema directive attached to a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Keep the field out of the table and every statement.
    Exclude,
    Unique,
    NotNull,
    /// Column default, emitted verbatim after `DEFAULT`.
    Default(String),
    /// Column type replacing the kind-based default.
    TypeOverride(String),
}

impl Directive {
    pub fn default_value(literal: impl Into<String>) -> Self {
        Directive::Default(literal.into())
    }

    pub fn sql_type(sql_type: impl Into<String>) -> Self {
        Directive::TypeOverride(sql_type.into())
    }
}

/// How a field declares its directives: a typed list or a tag string
/// parsed when the record is described.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directives {
    List(Vec<Directive>),
    Tag(&'static str),
}

impl Default for Directives {
    fn default() -> Self {
        Directives::List(Vec::new())
    }
}

impl Directives {
    pub fn resolve(&self) -> MapperResult<FieldOptions> {
        match self {
            Directives::List(list) => Ok(FieldOptions::from_directives(list)),
            Directives::Tag(tag) => FieldOptions::parse(tag),
        }
    }
}

/// Resolved option set for one field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldOptions {
    pub exclude: bool,
    pub unique: bool,
    pub not_null: bool,
    pub default: Option<String>,
    pub sql_type: Option<String>,
}

impl FieldOptions {
    /// Options for an excluded field. Nothing else matters once a field is excluded.
    pub fn excluded() -> Self {
        Self {
            exclude: true,
            ..Self::default()
        }
    }

    pub fn from_directives(directives: &[Directive]) -> Self {
        if directives.contains(&Directive::Exclude) {
            return Self::excluded();
        }
        let mut options = Self::default();
        for directive in directives {
            match directive {
                Directive::Exclude => {}
                Directive::Unique => options.unique = true,
                Directive::NotNull => options.not_null = true,
                Directive::Default(value) => options.default = Some(value.clone()),
                Directive::TypeOverride(sql_type) => options.sql_type = Some(sql_type.clone()),
            }
        }
        options
    }

    /// Parse a compact tag string. An empty tag yields the defaults.
    pub fn parse(tag: &str) -> MapperResult<Self> {
        let tokens = split_tokens(tag)?;
        if tokens.iter().any(|token| *token == "-") {
            return Ok(Self::excluded());
        }

        let mut directives = Vec::with_capacity(tokens.len());
        for token in tokens {
            directives.push(parse_token(token)?);
        }
        Ok(Self::from_directives(&directives))
    }

    /// Constraint suffix for a column definition, e.g. ` UNIQUE NOT NULL DEFAULT 0`.
    pub fn constraint_sql(&self) -> String {
        let mut extra = String::new();
        if self.unique {
            extra.push_str(" UNIQUE");
        }
        if self.not_null {
            extra.push_str(" NOT NULL");
        }
        if let Some(default) = &self.default {
            extra.push_str(" DEFAULT ");
            extra.push_str(default);
        }
        extra
    }
}

fn parse_token(token: &str) -> MapperResult<Directive> {
    match token {
        "unique" => return Ok(Directive::Unique),
        "notnull" => return Ok(Directive::NotNull),
        _ => {}
    }
    if let Some(value) = token.strip_prefix("default=") {
        return non_empty("default", value).map(Directive::Default);
    }
    if let Some(value) = token.strip_prefix("type=") {
        return non_empty("type", value).map(Directive::TypeOverride);
    }
    Err(MapperError::bad_parameter(format!(
        "unknown field directive `{token}`"
    )))
}

fn non_empty(key: &str, value: &str) -> MapperResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(MapperError::bad_parameter(format!(
            "directive `{key}=` requires a value"
        )));
    }
    Ok(value.to_string())
}

/// Split on top-level commas, trimming whitespace and dropping empty tokens.
fn split_tokens(tag: &str) -> MapperResult<Vec<&str>> {
    let mut tokens = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, c) in tag.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => {
                depth = depth.checked_sub(1).ok_or_else(|| {
                    MapperError::bad_parameter(format!("unbalanced `)` in tag `{tag}`"))
                })?;
            }
            (None, ',') if depth == 0 => {
                tokens.push(tag[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }

    if quote.is_some() || depth != 0 {
        return Err(MapperError::bad_parameter(format!(
            "unterminated quote or parenthesis in tag `{tag}`"
        )));
    }
    tokens.push(tag[start..].trim());
    tokens.retain(|token| !token.is_empty());
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_tag_yields_defaults() {
        assert_eq!(FieldOptions::parse("").unwrap(), FieldOptions::default());
        assert_eq!(FieldOptions::parse("  ").unwrap(), FieldOptions::default());
    }

    #[test]
    fn test_flags_and_values() {
        let options = FieldOptions::parse("type=VARCHAR(64), unique,notnull,default=NULL").unwrap();
        assert!(options.unique);
        assert!(options.not_null);
        assert!(!options.exclude);
        assert_eq!(options.sql_type.as_deref(), Some("VARCHAR(64)"));
        assert_eq!(options.default.as_deref(), Some("NULL"));
    }

    #[test]
    fn test_dash_short_circuits() {
        assert_eq!(FieldOptions::parse("-").unwrap(), FieldOptions::excluded());
        // Other tokens, even unknown ones, are not inspected once excluded.
        assert_eq!(
            FieldOptions::parse("unique,-,bogus").unwrap(),
            FieldOptions::excluded()
        );
    }

    #[test]
    fn test_nested_commas_stay_in_value() {
        let options = FieldOptions::parse("type=DECIMAL(10,2),default='a,b'").unwrap();
        assert_eq!(options.sql_type.as_deref(), Some("DECIMAL(10,2)"));
        assert_eq!(options.default.as_deref(), Some("'a,b'"));
    }

    #[test]
    fn test_unknown_token_rejected() {
        let err = FieldOptions::parse("unique,not_null").unwrap_err();
        assert!(matches!(err, MapperError::BadParameter { .. }));
    }

    #[test]
    fn test_empty_value_rejected() {
        assert!(FieldOptions::parse("default=").is_err());
        assert!(FieldOptions::parse("type=  ").is_err());
    }

    #[test]
    fn test_unbalanced_rejected() {
        assert!(FieldOptions::parse("type=DECIMAL(10,2").is_err());
        assert!(FieldOptions::parse("type=DECIMAL10,2)").is_err());
        assert!(FieldOptions::parse("default='open").is_err());
    }

    #[test]
    fn test_typed_directives_match_tag() {
        let typed = FieldOptions::from_directives(&[
            Directive::sql_type("VARCHAR(128)"),
            Directive::NotNull,
        ]);
        assert_eq!(typed, FieldOptions::parse("type=VARCHAR(128),notnull").unwrap());
    }

    #[test]
    fn test_constraint_sql() {
        let options = FieldOptions::parse("unique,notnull,default='2000-01-01'").unwrap();
        assert_eq!(options.constraint_sql(), " UNIQUE NOT NULL DEFAULT '2000-01-01'");
        assert_eq!(FieldOptions::default().constraint_sql(), "");
    }
}
