use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sea_query::Value;

/// Declares a search struct whose fields map to query predicates.
///
/// Each field may carry a tag after `=>` using the
/// `type:<lookup>;column:<name>;table:<name>;on:<a>,<b>;join:<table>` grammar.
/// Untagged fields holding another `search!` struct are resolved recursively;
/// other untagged fields are ignored. The JSON name used by
/// [`sort_column`](crate::sort_column) defaults to the field name and can be
/// overridden with `as "name"`.
///
/// # Examples
///
/// ```ignore
/// search! {
///     #[derive(Debug, Default)]
///     pub struct UserSearch {
///         pub name: String => "type:contains;column:name;table:users",
///         pub created: String => "type:order;column:created_at;table:users" as "createdAt",
///         pub role: RoleSearch => "type:left;table:users;join:roles;on:id,role_id",
///         pub page: Paging,
///     }
/// }
/// ```
#[macro_export]
macro_rules! search {
    (
        $(#[$meta:meta])*
        $vis:vis struct $struct_name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_vis:vis $field_name:ident : $field_type:ty
                    $(=> $tag:literal $(as $json:literal)?)?
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $struct_name {
            $(
                $(#[$field_meta])*
                $field_vis $field_name : $field_type
            ),*
        }

        impl $crate::Search for $struct_name {
            fn fields(&self) -> Vec<$crate::SearchField> {
                vec![
                    $(
                        $crate::SearchField {
                            name: $crate::__search_name!($field_name $($(, $json)?)?),
                            tag: $crate::__search_tag!($($tag)?),
                            value: $crate::ToFieldValue::to_field_value(&self.$field_name),
                        },
                    )*
                ]
            }

            fn tags() -> &'static [(&'static str, Option<&'static str>)] {
                &[
                    $(
                        (
                            $crate::__search_name!($field_name $($(, $json)?)?),
                            $crate::__search_tag!($($tag)?),
                        ),
                    )*
                ]
            }
        }

        impl $crate::ToFieldValue for $struct_name {
            fn to_field_value(&self) -> $crate::FieldValue {
                $crate::FieldValue::Nested($crate::Search::fields(self))
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __search_name {
    ($field_name:ident) => {
        stringify!($field_name)
    };
    ($field_name:ident, $json:literal) => {
        $json
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __search_tag {
    () => {
        None
    };
    ($tag:literal) => {
        Some($tag)
    };
}

/// A struct whose fields describe query predicates.
///
/// Implemented by the [`search!`](crate::search) macro.
pub trait Search {
    /// Field descriptors in declaration order, carrying current values.
    fn fields(&self) -> Vec<SearchField>;

    /// Static `(json_name, tag)` pairs in declaration order.
    fn tags() -> &'static [(&'static str, Option<&'static str>)]
    where
        Self: Sized;
}

/// One field of a [`Search`] struct.
#[derive(Debug, Clone)]
pub struct SearchField {
    /// JSON name of the field.
    pub name: &'static str,
    /// Raw tag, `None` when the field is untagged.
    pub tag: Option<&'static str>,
    /// The field's value lowered for resolution.
    pub value: FieldValue,
}

/// A field value as seen by the resolver.
#[derive(Debug, Clone)]
pub enum FieldValue {
    /// The type's zero value (`""`, `0`, `false`, `None`, empty collection).
    Zero,
    /// A bindable scalar.
    Scalar(Value),
    /// Text, used as-is or wrapped in `%` for pattern lookups.
    Text(String),
    /// A non-empty collection, used by `in`.
    List(Vec<Value>),
    /// A set optional value (`Some`), the only shape `isnull` accepts.
    Present(Box<FieldValue>),
    /// A nested search struct.
    Nested(Vec<SearchField>),
}

impl FieldValue {
    /// Whether the value contributes nothing to a query.
    ///
    /// Nested structs are zero when every one of their fields is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        match self {
            Self::Zero => true,
            Self::Nested(fields) => fields.iter().all(|f| f.value.is_zero()),
            _ => false,
        }
    }

    /// Whether the value is a set reference (`Some` or a non-empty collection).
    #[must_use]
    pub const fn is_reference(&self) -> bool {
        matches!(self, Self::Present(_) | Self::List(_))
    }

    /// Text content, looking through `Some`.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Present(inner) => inner.as_text(),
            _ => None,
        }
    }

    /// Single bindable value, looking through `Some`.
    #[must_use]
    pub fn to_value(&self) -> Option<Value> {
        match self {
            Self::Scalar(value) => Some(value.clone()),
            Self::Text(text) => Some(Value::from(text.clone())),
            Self::Present(inner) => inner.to_value(),
            _ => None,
        }
    }

    /// Collection values, looking through `Some`.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(values) => Some(values),
            Self::Present(inner) => inner.as_list(),
            _ => None,
        }
    }

    /// Nested fields, looking through `Some`.
    #[must_use]
    pub fn into_nested(self) -> Option<Vec<SearchField>> {
        match self {
            Self::Nested(fields) => Some(fields),
            Self::Present(inner) => inner.into_nested(),
            _ => None,
        }
    }
}

/// Conversion of a field into a [`FieldValue`].
pub trait ToFieldValue {
    /// Lower the field for resolution.
    fn to_field_value(&self) -> FieldValue;
}

impl ToFieldValue for String {
    fn to_field_value(&self) -> FieldValue {
        if self.is_empty() { FieldValue::Zero } else { FieldValue::Text(self.clone()) }
    }
}

impl ToFieldValue for bool {
    fn to_field_value(&self) -> FieldValue {
        if *self { FieldValue::Scalar(Value::from(true)) } else { FieldValue::Zero }
    }
}

macro_rules! integer_field_value {
    ($($ty:ty),*) => {
        $(
            impl ToFieldValue for $ty {
                fn to_field_value(&self) -> FieldValue {
                    if *self == 0 { FieldValue::Zero } else { FieldValue::Scalar(Value::from(*self)) }
                }
            }
        )*
    };
}

integer_field_value!(i8, i16, i32, i64, u8, u16, u32, u64);

macro_rules! float_field_value {
    ($($ty:ty),*) => {
        $(
            impl ToFieldValue for $ty {
                #[allow(clippy::float_cmp)]
                fn to_field_value(&self) -> FieldValue {
                    if *self == 0.0 { FieldValue::Zero } else { FieldValue::Scalar(Value::from(*self)) }
                }
            }
        )*
    };
}

float_field_value!(f32, f64);

// chrono values have no zero; wrap them in `Option` to make them optional
macro_rules! chrono_field_value {
    ($($ty:ty),*) => {
        $(
            impl ToFieldValue for $ty {
                fn to_field_value(&self) -> FieldValue {
                    FieldValue::Scalar(Value::from(*self))
                }
            }
        )*
    };
}

chrono_field_value!(NaiveDate, NaiveTime, NaiveDateTime, DateTime<Utc>);

impl<T: ToFieldValue> ToFieldValue for Option<T> {
    fn to_field_value(&self) -> FieldValue {
        self.as_ref()
            .map_or(FieldValue::Zero, |v| FieldValue::Present(Box::new(v.to_field_value())))
    }
}

impl<T: Clone + Into<Value>> ToFieldValue for Vec<T> {
    fn to_field_value(&self) -> FieldValue {
        if self.is_empty() {
            FieldValue::Zero
        } else {
            FieldValue::List(self.iter().cloned().map(Into::into).collect())
        }
    }
}
