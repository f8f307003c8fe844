//! # RPC Types Crate
//!
//! The message model shared by every message definition and by the session
//! bus: an ordered parameter store, message kinds, the envelope wrapping each
//! message, field codecs and the generic engine behind typed facades.
//!
//! ## Design Principles
//!
//! - **Untyped storage, typed access**: every message is a [`ParamStore`];
//!   facades validate and coerce on the way in and out.
//! - **Forward compatible**: unknown keys and unknown kinds pass through
//!   untouched.
//! - **Field-scoped failure**: a malformed field reads as absent without
//!   discarding the rest of the message.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod codec;
pub mod enums;
pub mod envelope;
pub mod errors;
pub mod facade;
pub mod kind;
pub mod params;
pub mod structs;
pub mod value;

pub use codec::{FieldCodec, RpcStruct};
pub use enums::*;
pub use envelope::{CorrelationId, Envelope, MessageCategory};
pub use errors::{DecodeError, EncodeError, ValidationError};
pub use facade::Facade;
pub use kind::MessageKind;
pub use params::ParamStore;
pub use structs::{Image, MenuParams, SoftButton, TtsChunk};
pub use value::{StructValue, Value};
