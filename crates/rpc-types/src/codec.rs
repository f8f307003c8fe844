//! # Field Codecs
//!
//! Conversions between [`Value`] and the typed values facades expose.
//!
//! - Primitives decode from their matching variant; integers widen to floats.
//! - Enums decode from their wire name (see [`rpc_enum!`](crate::rpc_enum)).
//! - Structs implement [`RpcStruct`] and decode from either a nested store or a
//!   typed struct value of the same type.

use crate::errors::ValidationError;
use crate::params::ParamStore;
use crate::value::{StructValue, Value};

/// A type that can be stored in and read back from a parameter value.
pub trait FieldCodec: Sized {
    /// Name used in validation errors.
    const TYPE_NAME: &'static str;

    /// Decode from a raw value, coercing where the wire allows it.
    fn decode(value: &Value) -> Result<Self, ValidationError>;

    /// Encode into a raw value.
    fn encode(&self) -> Value;

    /// Check shape constraints before the value is stored.
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

fn mismatch(expected: &'static str, found: &Value) -> ValidationError {
    ValidationError::TypeMismatch {
        expected,
        found: found.type_name(),
    }
}

impl FieldCodec for String {
    const TYPE_NAME: &'static str = "string";

    fn decode(value: &Value) -> Result<Self, ValidationError> {
        match value {
            Value::String(s) => Ok(s.clone()),
            other => Err(mismatch(Self::TYPE_NAME, other)),
        }
    }

    fn encode(&self) -> Value {
        Value::String(self.clone())
    }
}

impl FieldCodec for bool {
    const TYPE_NAME: &'static str = "bool";

    fn decode(value: &Value) -> Result<Self, ValidationError> {
        match value {
            Value::Bool(b) => Ok(*b),
            other => Err(mismatch(Self::TYPE_NAME, other)),
        }
    }

    fn encode(&self) -> Value {
        Value::Bool(*self)
    }
}

impl FieldCodec for f64 {
    const TYPE_NAME: &'static str = "float";

    fn decode(value: &Value) -> Result<Self, ValidationError> {
        match value {
            Value::Float(f) => Ok(*f),
            Value::Integer(n) => Ok(*n as f64),
            other => Err(mismatch(Self::TYPE_NAME, other)),
        }
    }

    fn encode(&self) -> Value {
        Value::Float(*self)
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.is_finite() {
            Ok(())
        } else {
            Err(ValidationError::OutOfRange {
                type_name: Self::TYPE_NAME,
                value: self.to_string(),
            })
        }
    }
}

macro_rules! integer_codec {
    ($($ty:ty),+) => {
        $(
            impl FieldCodec for $ty {
                const TYPE_NAME: &'static str = stringify!($ty);

                fn decode(value: &Value) -> Result<Self, ValidationError> {
                    match value {
                        Value::Integer(n) => <$ty>::try_from(*n).map_err(|_| {
                            ValidationError::OutOfRange {
                                type_name: Self::TYPE_NAME,
                                value: n.to_string(),
                            }
                        }),
                        other => Err(mismatch(Self::TYPE_NAME, other)),
                    }
                }

                fn encode(&self) -> Value {
                    Value::Integer(i64::from(*self))
                }
            }
        )+
    };
}

integer_codec!(i64, i32, u32, u16, u8);

/// A fixed-shape struct carried as a nested store.
pub trait RpcStruct: Sized {
    /// Tag stored on typed struct values.
    const STRUCT_NAME: &'static str;

    /// Build from a nested store; missing required fields are errors.
    fn from_store(store: &ParamStore) -> Result<Self, ValidationError>;

    fn to_store(&self) -> ParamStore;

    /// Cross-field shape constraints.
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

impl<T: RpcStruct> FieldCodec for T {
    const TYPE_NAME: &'static str = T::STRUCT_NAME;

    fn decode(value: &Value) -> Result<Self, ValidationError> {
        match value {
            Value::Store(store) => T::from_store(store),
            Value::Struct(s) if s.type_name() == T::STRUCT_NAME => {
                T::from_store(s.fields())
            }
            other => Err(mismatch(T::STRUCT_NAME, other)),
        }
    }

    fn encode(&self) -> Value {
        Value::Struct(StructValue::new(T::STRUCT_NAME, self.to_store()))
    }

    fn validate(&self) -> Result<(), ValidationError> {
        RpcStruct::validate(self)
    }
}

/// Declare an enum carried on the wire by name.
///
/// Generates `as_str`, `value_for_name`, `Display` and a [`FieldCodec`]
/// implementation that rejects unknown names.
#[macro_export]
macro_rules! rpc_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident = $wire:literal
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $(
                $(#[$vmeta])*
                $variant,
            )+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Wire name of this variant.
            #[must_use]
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                }
            }

            /// Look up a variant by its wire name.
            #[must_use]
            pub fn value_for_name(name: &str) -> ::std::option::Option<Self> {
                match name {
                    $($wire => ::std::option::Option::Some($name::$variant),)+
                    _ => ::std::option::Option::None,
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $crate::codec::FieldCodec for $name {
            const TYPE_NAME: &'static str = stringify!($name);

            fn decode(
                value: &$crate::Value,
            ) -> ::std::result::Result<Self, $crate::ValidationError> {
                match value {
                    $crate::Value::String(name) => Self::value_for_name(name).ok_or_else(|| {
                        $crate::ValidationError::UnknownVariant {
                            type_name: stringify!($name),
                            name: name.clone(),
                        }
                    }),
                    other => ::std::result::Result::Err($crate::ValidationError::TypeMismatch {
                        expected: stringify!($name),
                        found: other.type_name(),
                    }),
                }
            }

            fn encode(&self) -> $crate::Value {
                $crate::Value::String(self.as_str().to_owned())
            }
        }
    };
}
