//! # RPC Messages Crate
//!
//! Typed facades for the message kinds this workspace knows about. Each facade
//! is declared with [`rpc_types::rpc_message!`] and owns a plain
//! [`ParamStore`](rpc_types::ParamStore), so unknown keys received from a
//! newer head unit survive a read-modify-write cycle.
//!
//! | Facade | Category |
//! |---|---|
//! | [`Show`], [`AddCommand`], [`Speak`] | request |
//! | [`SubscribeVehicleData`], [`UnsubscribeVehicleData`], [`GetVehicleData`] | request |
//! | [`GenericResponse`], [`GetVehicleDataResponse`] | response |
//! | [`OnHmiStatus`], [`OnCommand`], [`OnVehicleData`] | notification |

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod notifications;
pub mod requests;
pub mod responses;

pub use notifications::{OnCommand, OnHmiStatus, OnVehicleData};
pub use requests::{
    AddCommand, GetVehicleData, Show, Speak, SubscribeVehicleData, UnsubscribeVehicleData,
};
pub use responses::{GenericResponse, GetVehicleDataResponse};
