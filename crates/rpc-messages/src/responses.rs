//! # Responses
//!
//! Every response carries `success`, `resultCode` and an optional `info`.
//! [`GenericResponse`] reads those three from any response envelope,
//! whatever its kind.

use rpc_types::{rpc_message, MessageKind, ResultCode};

rpc_message! {
    /// Outcome fields common to every response.
    pub struct GenericResponse: Response(MessageKind::GENERIC_RESPONSE) {
        field success / set_success (KEY_SUCCESS = "success"): bool;
        field result_code / set_result_code (KEY_RESULT_CODE = "resultCode"): ResultCode;
        /// Free-form detail from the head unit.
        field info / set_info (KEY_INFO = "info"): String;
    }
}

impl GenericResponse {
    /// A response reporting `result_code`, with `success` derived from it.
    #[must_use]
    pub fn with_result(result_code: ResultCode) -> Self {
        let mut response = Self::new();
        response
            .set_success(Some(result_code.is_success()))
            .set_result_code(Some(result_code));
        response
    }

    /// Whether the peer carried out the request. A missing `success` counts as failure.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.success().unwrap_or(false)
    }
}

rpc_message! {
    /// Answer to `GetVehicleData`.
    pub struct GetVehicleDataResponse: Response(MessageKind::GET_VEHICLE_DATA) {
        field success / set_success (KEY_SUCCESS = "success"): bool;
        field result_code / set_result_code (KEY_RESULT_CODE = "resultCode"): ResultCode;
        field info / set_info (KEY_INFO = "info"): String;
        field speed / set_speed (KEY_SPEED = "speed"): f64;
        field cloud_app_vehicle_id / set_cloud_app_vehicle_id (KEY_CLOUD_APP_VEHICLE_ID = "cloudAppVehicleID"): String;
    }
}
