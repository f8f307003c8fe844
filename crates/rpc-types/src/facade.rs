//! # Typed Message Facades
//!
//! A facade is a thin typed view over the [`ParamStore`] of one message kind.
//! Every accessor goes through the four engine functions in this module, so
//! the read and write rules below hold for every message alike.
//!
//! ## Reading
//!
//! - An absent (or null) key reads as `None`.
//! - A present key that fails to decode also reads as `None`; the failure is
//!   reported as a `warn` event on this module's target and never returned.
//! - A list must be non-empty, must not mix typed structs with untyped stores,
//!   and every element must decode, or the whole field reads as `None`.
//!
//! ## Writing
//!
//! - `None` removes the key.
//! - A value failing validation removes the key.
//! - A list that is empty, holds a `None` element, or holds an element failing
//!   validation removes the key. Null elements are never filtered out.

use crate::codec::FieldCodec;
use crate::envelope::{CorrelationId, Envelope, MessageCategory};
use crate::errors::ValidationError;
use crate::kind::MessageKind;
use crate::params::ParamStore;
use crate::value::Value;
use tracing::warn;

/// Typed view over the parameters of one message kind.
pub trait Facade: Sized {
    /// Kind this facade reads and writes.
    const KIND: MessageKind;

    const CATEGORY: MessageCategory;

    /// Wrap an existing store; unknown keys are kept untouched.
    fn from_params(params: ParamStore) -> Self;

    fn params(&self) -> &ParamStore;

    fn params_mut(&mut self) -> &mut ParamStore;

    fn into_params(self) -> ParamStore;

    /// View the parameters of a received envelope through this facade.
    fn from_envelope(envelope: Envelope) -> Self {
        Self::from_params(envelope.into_params())
    }

    /// Wrap as an outbound notification.
    fn into_notification(self) -> Envelope {
        Envelope::notification(Self::KIND, self.into_params())
    }

    /// Wrap as an outbound request with the given correlation id.
    fn into_request(self, correlation_id: CorrelationId) -> Envelope {
        Envelope::request(Self::KIND, correlation_id, self.into_params())
    }

    /// Wrap as the response to the request with the given correlation id.
    fn into_response(self, correlation_id: CorrelationId) -> Envelope {
        Envelope::response(Self::KIND, correlation_id, self.into_params())
    }
}

fn report(message: &str, key: &str, error: &ValidationError) {
    warn!(rpc = message, field = key, %error, "Dropping malformed field");
}

/// Read a single typed field.
pub fn get_field<T: FieldCodec>(params: &ParamStore, message: &str, key: &str) -> Option<T> {
    let value = params.get(key).filter(|v| !v.is_null())?;
    match T::decode(value) {
        Ok(decoded) => Some(decoded),
        Err(error) => {
            report(message, key, &error);
            None
        }
    }
}

/// Write a single typed field. Returns whether the key is now present.
pub fn set_field<T: FieldCodec>(
    params: &mut ParamStore,
    message: &str,
    key: &str,
    value: Option<T>,
) -> bool {
    let Some(value) = value else {
        params.remove(key);
        return false;
    };

    match value.validate() {
        Ok(()) => {
            params.insert(key, value.encode());
            true
        }
        Err(error) => {
            report(message, key, &error);
            params.remove(key);
            false
        }
    }
}

/// Read a typed list field.
pub fn get_list<T: FieldCodec>(params: &ParamStore, message: &str, key: &str) -> Option<Vec<T>> {
    let value = params.get(key).filter(|v| !v.is_null())?;
    match decode_list(value) {
        Ok(items) => Some(items),
        Err(error) => {
            report(message, key, &error);
            None
        }
    }
}

/// Write a typed list field. Returns whether the key is now present.
pub fn set_list<T, I, E>(
    params: &mut ParamStore,
    message: &str,
    key: &str,
    items: Option<I>,
) -> bool
where
    T: FieldCodec,
    I: IntoIterator<Item = E>,
    E: Into<Option<T>>,
{
    let Some(items) = items else {
        params.remove(key);
        return false;
    };

    let items: Vec<Option<T>> = items.into_iter().map(Into::into).collect();
    match encode_list(&items) {
        Ok(value) => {
            params.insert(key, value);
            true
        }
        Err(error) => {
            report(message, key, &error);
            params.remove(key);
            false
        }
    }
}

/// Decode every element of a list value.
///
/// # Errors
///
/// - `TypeMismatch` - the value is not a list
/// - `EmptyList` - the list has no elements
/// - `MixedList` - typed structs and untyped stores side by side
/// - `NullElement` / `Element` - an element is null or fails to decode
pub fn decode_list<T: FieldCodec>(value: &Value) -> Result<Vec<T>, ValidationError> {
    let Value::List(items) = value else {
        return Err(ValidationError::TypeMismatch {
            expected: "list",
            found: value.type_name(),
        });
    };
    if items.is_empty() {
        return Err(ValidationError::EmptyList);
    }

    let typed = items.iter().any(|v| matches!(v, Value::Struct(_)));
    let untyped = items.iter().any(|v| matches!(v, Value::Store(_)));
    if typed && untyped {
        return Err(ValidationError::MixedList);
    }

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            if item.is_null() {
                return Err(ValidationError::NullElement { index });
            }
            T::decode(item).map_err(|e| e.at_index(index))
        })
        .collect()
}

/// Validate and encode every element of a list.
///
/// # Errors
///
/// - `EmptyList` - no elements
/// - `NullElement` - an element is `None`
/// - `Element` - an element fails validation
pub fn encode_list<T: FieldCodec>(items: &[Option<T>]) -> Result<Value, ValidationError> {
    if items.is_empty() {
        return Err(ValidationError::EmptyList);
    }

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let item = item.as_ref().ok_or(ValidationError::NullElement { index })?;
            item.validate().map_err(|e| e.at_index(index))?;
            Ok(item.encode())
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Value::List)
}

/// Declare a message facade.
///
/// Each field line names its mode (`field` or `list`), getter, setter, key
/// constant, wire key and element type:
///
/// ```
/// use rpc_types::{rpc_message, MessageKind};
///
/// rpc_message! {
///     /// Place a greeting on screen.
///     pub struct Greeting: Request(MessageKind::new_static("Greeting")) {
///         field text / set_text (KEY_TEXT = "text"): String;
///         list lines / set_lines (KEY_LINES = "lines"): String;
///     }
/// }
///
/// let mut greeting = Greeting::new();
/// greeting.set_text(Some("hello".to_string()));
/// assert_eq!(greeting.text().as_deref(), Some("hello"));
/// ```
#[macro_export]
macro_rules! rpc_message {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident : $category:ident ($kind:expr) {
            $(
                $(#[$fmeta:meta])*
                $mode:ident $getter:ident / $setter:ident ($key:ident = $wire:literal) : $ty:ty;
            )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq)]
        $vis struct $name {
            params: $crate::ParamStore,
        }

        impl $name {
            $(
                #[doc = concat!("Wire key `", $wire, "`.")]
                pub const $key: &'static str = $wire;
            )*

            /// Create with no parameters set.
            #[must_use]
            pub fn new() -> Self {
                Self::default()
            }

            $(
                $crate::__rpc_accessor! {
                    @$mode $name, $(#[$fmeta])* $getter / $setter ($key): $ty
                }
            )*
        }

        impl $crate::facade::Facade for $name {
            const KIND: $crate::MessageKind = $kind;
            const CATEGORY: $crate::MessageCategory = $crate::MessageCategory::$category;

            fn from_params(params: $crate::ParamStore) -> Self {
                Self { params }
            }

            fn params(&self) -> &$crate::ParamStore {
                &self.params
            }

            fn params_mut(&mut self) -> &mut $crate::ParamStore {
                &mut self.params
            }

            fn into_params(self) -> $crate::ParamStore {
                self.params
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __rpc_accessor {
    (@field $name:ident, $(#[$fmeta:meta])* $getter:ident / $setter:ident ($key:ident): $ty:ty) => {
        $(#[$fmeta])*
        #[must_use]
        pub fn $getter(&self) -> ::std::option::Option<$ty> {
            $crate::facade::get_field(&self.params, stringify!($name), Self::$key)
        }

        $(#[$fmeta])*
        pub fn $setter(&mut self, value: ::std::option::Option<$ty>) -> &mut Self {
            $crate::facade::set_field(&mut self.params, stringify!($name), Self::$key, value);
            self
        }
    };
    (@list $name:ident, $(#[$fmeta:meta])* $getter:ident / $setter:ident ($key:ident): $ty:ty) => {
        $(#[$fmeta])*
        #[must_use]
        pub fn $getter(&self) -> ::std::option::Option<::std::vec::Vec<$ty>> {
            $crate::facade::get_list(&self.params, stringify!($name), Self::$key)
        }

        $(#[$fmeta])*
        pub fn $setter<I, E>(&mut self, items: ::std::option::Option<I>) -> &mut Self
        where
            I: ::std::iter::IntoIterator<Item = E>,
            E: ::std::convert::Into<::std::option::Option<$ty>>,
        {
            $crate::facade::set_list::<$ty, I, E>(
                &mut self.params,
                stringify!($name),
                Self::$key,
                items,
            );
            self
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::RpcStruct;
    use crate::enums::{ImageType, TextAlignment};
    use crate::structs::Image;
    use crate::value::StructValue;

    crate::rpc_message! {
        struct Banner: Notification(MessageKind::new_static("Banner")) {
            field title / set_title (KEY_TITLE = "title"): String;
            field alignment / set_alignment (KEY_ALIGNMENT = "alignment"): TextAlignment;
            field count / set_count (KEY_COUNT = "count"): u32;
            list images / set_images (KEY_IMAGES = "images"): Image;
            list tags / set_tags (KEY_TAGS = "tags"): String;
        }
    }

    #[test]
    fn test_set_none_removes_key() {
        let mut banner = Banner::new();
        banner.set_title(Some("Hi".to_string()));
        assert!(banner.params().contains_key("title"));

        banner.set_title(None);
        assert!(!banner.params().contains_key("title"));
        assert_eq!(banner.title(), None);
    }

    #[test]
    fn test_invalid_value_removes_key() {
        let mut banner = Banner::new();
        banner.set_images(Some(vec![Image::dynamic("a.png")]));
        assert!(banner.images().is_some());

        banner.set_images(Some(vec![Image::dynamic("")]));
        assert!(!banner.params().contains_key("images"));
    }

    #[test]
    fn test_list_with_none_element_is_absent() {
        let mut banner = Banner::new();
        banner.set_tags(Some(vec![Some("a".to_string()), None]));
        assert!(!banner.params().contains_key("tags"));

        banner.set_tags(Some(Vec::<String>::new()));
        assert!(!banner.params().contains_key("tags"));
    }

    #[test]
    fn test_malformed_field_reads_as_none() {
        let mut params = ParamStore::new();
        params.insert("alignment", Value::from("DIAGONAL"));
        params.insert("count", Value::from("three"));
        params.insert("title", Value::Null);
        let banner = Banner::from_params(params);

        assert_eq!(banner.alignment(), None);
        assert_eq!(banner.count(), None);
        assert_eq!(banner.title(), None);
        assert_eq!(banner.params().len(), 3);
    }

    #[test]
    fn test_mixed_list_reads_as_none() {
        let typed = Image::dynamic("a.png").encode();
        let untyped = Value::Store(Image::new("b.png", ImageType::Static).to_store());

        let mut params = ParamStore::new();
        params.insert("images", Value::List(vec![typed.clone(), untyped.clone()]));
        assert_eq!(Banner::from_params(params).images(), None);

        let mut params = ParamStore::new();
        params.insert("images", Value::List(vec![untyped.clone(), untyped]));
        assert_eq!(Banner::from_params(params).images().map(|v| v.len()), Some(2));

        let mut params = ParamStore::new();
        params.insert("images", Value::List(vec![typed.clone(), typed]));
        assert_eq!(Banner::from_params(params).images().map(|v| v.len()), Some(2));
    }

    #[test]
    fn test_decode_list_errors() {
        assert_eq!(
            decode_list::<String>(&Value::List(vec![])),
            Err(ValidationError::EmptyList)
        );
        assert_eq!(
            decode_list::<String>(&Value::List(vec![Value::from("a"), Value::Null])),
            Err(ValidationError::NullElement { index: 1 })
        );
        assert!(matches!(
            decode_list::<String>(&Value::from("a")),
            Err(ValidationError::TypeMismatch { expected: "list", .. })
        ));
    }

    #[test]
    fn test_struct_of_wrong_type_in_list() {
        let foreign = Value::Struct(StructValue::new("MenuParams", ParamStore::new()));
        assert!(matches!(
            decode_list::<Image>(&Value::List(vec![foreign])),
            Err(ValidationError::Element { index: 0, .. })
        ));
    }

    #[test]
    fn test_facade_wraps_envelope() {
        let mut banner = Banner::new();
        banner.set_count(Some(3));
        let envelope = banner.clone().into_notification();

        assert_eq!(envelope.kind().as_str(), "Banner");
        assert!(envelope.is_notification());
        assert_eq!(Banner::from_envelope(envelope), banner);
    }
}
