//! # Notifications
//!
//! Uncorrelated messages pushed by the head unit.

use rpc_types::{
    rpc_message, AudioStreamingState, HmiLevel, MessageKind, SystemContext, TriggerSource,
};

rpc_message! {
    /// The application's HMI level, audio state or system context changed.
    pub struct OnHmiStatus: Notification(MessageKind::ON_HMI_STATUS) {
        field hmi_level / set_hmi_level (KEY_HMI_LEVEL = "hmiLevel"): HmiLevel;
        field audio_streaming_state / set_audio_streaming_state (KEY_AUDIO_STREAMING_STATE = "audioStreamingState"): AudioStreamingState;
        field system_context / set_system_context (KEY_SYSTEM_CONTEXT = "systemContext"): SystemContext;
        /// Set on the first status after registration.
        field first_run / set_first_run (KEY_FIRST_RUN = "firstRun"): bool;
    }
}

impl OnHmiStatus {
    /// First time the application reaches `FULL`.
    #[must_use]
    pub fn is_first_full(&self) -> bool {
        self.hmi_level() == Some(HmiLevel::Full) && self.first_run().unwrap_or(false)
    }
}

rpc_message! {
    /// The user selected a command added with `AddCommand`.
    pub struct OnCommand: Notification(MessageKind::ON_COMMAND) {
        field cmd_id / set_cmd_id (KEY_CMD_ID = "cmdID"): u32;
        field trigger_source / set_trigger_source (KEY_TRIGGER_SOURCE = "triggerSource"): TriggerSource;
    }
}

rpc_message! {
    /// Subscribed vehicle data changed.
    pub struct OnVehicleData: Notification(MessageKind::ON_VEHICLE_DATA) {
        /// km/h
        field speed / set_speed (KEY_SPEED = "speed"): f64;
        field cloud_app_vehicle_id / set_cloud_app_vehicle_id (KEY_CLOUD_APP_VEHICLE_ID = "cloudAppVehicleID"): String;
    }
}
