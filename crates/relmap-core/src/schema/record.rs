//! The `Record` trait and the `impl_record!` macro.
//!
//! A record states its own shape: the type name, the ordered field list with
//! kinds and directives, and by-name access to each persisted field.

use crate::codec::{FieldType, FieldValue};

use super::directive::{Directive, Directives};
use super::kind::Kind;

/// One declared field of a record, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    pub name: &'static str,
    pub kind: Kind,
    pub directives: Directives,
}

impl FieldDef {
    pub fn new(name: &'static str, kind: Kind) -> Self {
        Self {
            name,
            kind,
            directives: Directives::default(),
        }
    }

    pub fn with_directives(name: &'static str, kind: Kind, directives: Vec<Directive>) -> Self {
        Self {
            name,
            kind,
            directives: Directives::List(directives),
        }
    }

    pub fn tagged(name: &'static str, kind: Kind, tag: &'static str) -> Self {
        Self {
            name,
            kind,
            directives: Directives::Tag(tag),
        }
    }

    /// A field that never reaches the database. Its type needs no codec.
    pub fn excluded(name: &'static str) -> Self {
        Self {
            name,
            kind: Kind::Opaque("excluded"),
            directives: Directives::List(vec![Directive::Exclude]),
        }
    }
}

/// A type persisted as one table row.
///
/// The table name is the lowercase type name. A field named `id`
/// (case-insensitive) holding an `i64` is the primary key; tables of types
/// without one get a synthesized key column.
pub trait Record {
    fn type_name() -> &'static str;

    /// Declared fields in declaration order, excluded ones included.
    fn fields() -> Vec<FieldDef>;

    /// Persisted field by case-insensitive name. `None` for unknown or excluded fields.
    fn field(&self, name: &str) -> Option<&dyn FieldValue>;

    fn field_mut(&mut self, name: &str) -> Option<&mut dyn FieldValue>;
}

/// Kind of a field, resolved from a projection that is never evaluated.
pub fn kind_of<T: FieldType>(_field: Option<&T>) -> Kind {
    T::KIND
}

/// Implement [`Record`] for a struct from its field list.
///
/// Each entry is a field name, optionally followed by `=>` and one of:
/// a typed directive list `[Directive::Unique, ...]`, a tag string
/// `"unique,notnull"`, or `skip` for fields that are never persisted.
///
/// ```ignore
/// impl_record!(Widget {
///     id,
///     name => [Directive::Unique, Directive::NotNull],
///     score,
///     tags,
///     note => "type=VARCHAR(64),default=''",
///     scratch => skip,
/// });
/// ```
#[macro_export]
macro_rules! impl_record {
    ($ty:ident { $($field:ident $(=> $opt:tt)?),* $(,)? }) => {
        impl $crate::schema::Record for $ty {
            fn type_name() -> &'static str {
                stringify!($ty)
            }

            fn fields() -> ::std::vec::Vec<$crate::schema::FieldDef> {
                ::std::vec![
                    $($crate::impl_record!(@def $ty, $field $(, $opt)?)),*
                ]
            }

            fn field(&self, name: &str) -> ::std::option::Option<&dyn $crate::codec::FieldValue> {
                $(
                    if name.eq_ignore_ascii_case(stringify!($field)) {
                        return $crate::impl_record!(@get self, $field $(, $opt)?);
                    }
                )*
                ::std::option::Option::None
            }

            fn field_mut(
                &mut self,
                name: &str,
            ) -> ::std::option::Option<&mut dyn $crate::codec::FieldValue> {
                $(
                    if name.eq_ignore_ascii_case(stringify!($field)) {
                        return $crate::impl_record!(@get_mut self, $field $(, $opt)?);
                    }
                )*
                ::std::option::Option::None
            }
        }
    };

    (@kind $ty:ident, $field:ident) => {
        $crate::schema::kind_of({
            let slot: ::std::option::Option<&$ty> = ::std::option::Option::None;
            slot.map(|record| &record.$field)
        })
    };

    (@def $ty:ident, $field:ident, skip) => {
        $crate::schema::FieldDef::excluded(stringify!($field))
    };
    (@def $ty:ident, $field:ident, [$($directive:expr),* $(,)?]) => {
        $crate::schema::FieldDef::with_directives(
            stringify!($field),
            $crate::impl_record!(@kind $ty, $field),
            ::std::vec![$($directive),*],
        )
    };
    (@def $ty:ident, $field:ident, $tag:literal) => {
        $crate::schema::FieldDef::tagged(
            stringify!($field),
            $crate::impl_record!(@kind $ty, $field),
            $tag,
        )
    };
    (@def $ty:ident, $field:ident) => {
        $crate::schema::FieldDef::new(stringify!($field), $crate::impl_record!(@kind $ty, $field))
    };

    (@get $self:ident, $field:ident, skip) => {
        ::std::option::Option::None
    };
    (@get $self:ident, $field:ident $(, $opt:tt)?) => {
        ::std::option::Option::Some(&$self.$field as &dyn $crate::codec::FieldValue)
    };

    (@get_mut $self:ident, $field:ident, skip) => {
        ::std::option::Option::None
    };
    (@get_mut $self:ident, $field:ident $(, $opt:tt)?) => {
        ::std::option::Option::Some(&mut $self.$field as &mut dyn $crate::codec::FieldValue)
    };
}
