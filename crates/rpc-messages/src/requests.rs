//! # Requests
//!
//! Outbound requests. Each one is answered by a response of the same kind
//! carrying the request's correlation id.

use rpc_types::{
    rpc_message, Image, MenuParams, MessageKind, SoftButton, TextAlignment, TtsChunk,
};

rpc_message! {
    /// Update the text, graphics and soft buttons on the main template.
    pub struct Show: Request(MessageKind::SHOW) {
        field main_field_1 / set_main_field_1 (KEY_MAIN_FIELD_1 = "mainField1"): String;
        field main_field_2 / set_main_field_2 (KEY_MAIN_FIELD_2 = "mainField2"): String;
        field main_field_3 / set_main_field_3 (KEY_MAIN_FIELD_3 = "mainField3"): String;
        field main_field_4 / set_main_field_4 (KEY_MAIN_FIELD_4 = "mainField4"): String;
        field status_bar / set_status_bar (KEY_STATUS_BAR = "statusBar"): String;
        /// Superseded on newer head units; still sent for older ones.
        field media_clock / set_media_clock (KEY_MEDIA_CLOCK = "mediaClock"): String;
        field media_track / set_media_track (KEY_MEDIA_TRACK = "mediaTrack"): String;
        field alignment / set_alignment (KEY_ALIGNMENT = "alignment"): TextAlignment;
        field graphic / set_graphic (KEY_GRAPHIC = "graphic"): Image;
        field secondary_graphic / set_secondary_graphic (KEY_SECONDARY_GRAPHIC = "secondaryGraphic"): Image;
        list soft_buttons / set_soft_buttons (KEY_SOFT_BUTTONS = "softButtons"): SoftButton;
        list custom_presets / set_custom_presets (KEY_CUSTOM_PRESETS = "customPresets"): String;
    }
}

rpc_message! {
    /// Add a command to the application menu and voice grammar.
    pub struct AddCommand: Request(MessageKind::ADD_COMMAND) {
        /// Id echoed back in `OnCommand` when the user selects the command.
        field cmd_id / set_cmd_id (KEY_CMD_ID = "cmdID"): u32;
        field menu_params / set_menu_params (KEY_MENU_PARAMS = "menuParams"): MenuParams;
        list vr_commands / set_vr_commands (KEY_VR_COMMANDS = "vrCommands"): String;
        field cmd_icon / set_cmd_icon (KEY_CMD_ICON = "cmdIcon"): Image;
    }
}

impl AddCommand {
    /// A menu command with the given id and label.
    #[must_use]
    pub fn menu_item(cmd_id: u32, menu_name: impl Into<String>) -> Self {
        let mut command = Self::new();
        command
            .set_cmd_id(Some(cmd_id))
            .set_menu_params(Some(MenuParams::new(menu_name)));
        command
    }
}

rpc_message! {
    /// Speak text through the head unit's speech engine.
    pub struct Speak: Request(MessageKind::SPEAK) {
        list tts_chunks / set_tts_chunks (KEY_TTS_CHUNKS = "ttsChunks"): TtsChunk;
    }
}

impl Speak {
    /// Speak a single plain-text utterance.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        let mut speak = Self::new();
        speak.set_tts_chunks(Some(TtsChunk::simple(text)));
        speak
    }
}

rpc_message! {
    /// Start receiving `OnVehicleData` for the flagged items.
    pub struct SubscribeVehicleData: Request(MessageKind::SUBSCRIBE_VEHICLE_DATA) {
        field speed / set_speed (KEY_SPEED = "speed"): bool;
        field cloud_app_vehicle_id / set_cloud_app_vehicle_id (KEY_CLOUD_APP_VEHICLE_ID = "cloudAppVehicleID"): bool;
    }
}

rpc_message! {
    pub struct UnsubscribeVehicleData: Request(MessageKind::UNSUBSCRIBE_VEHICLE_DATA) {
        field speed / set_speed (KEY_SPEED = "speed"): bool;
        field cloud_app_vehicle_id / set_cloud_app_vehicle_id (KEY_CLOUD_APP_VEHICLE_ID = "cloudAppVehicleID"): bool;
    }
}

rpc_message! {
    /// One-shot read of the flagged vehicle data items.
    pub struct GetVehicleData: Request(MessageKind::GET_VEHICLE_DATA) {
        field speed / set_speed (KEY_SPEED = "speed"): bool;
        field cloud_app_vehicle_id / set_cloud_app_vehicle_id (KEY_CLOUD_APP_VEHICLE_ID = "cloudAppVehicleID"): bool;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpc_types::{CorrelationId, Facade, SoftButtonType, Value};

    #[test]
    fn test_show_keeps_field_order() {
        let mut show = Show::new();
        show.set_main_field_1(Some("Now playing".to_string()))
            .set_alignment(Some(TextAlignment::Centered))
            .set_main_field_2(Some("Artist".to_string()));

        assert_eq!(
            show.params().keys().collect::<Vec<_>>(),
            vec!["mainField1", "alignment", "mainField2"]
        );
        assert_eq!(show.params().get("alignment"), Some(&Value::from("CENTERED")));
    }

    #[test]
    fn test_soft_buttons_round_trip() {
        let buttons = vec![
            SoftButton::text(1, "Like"),
            SoftButton::image(2, Image::dynamic("thumbs_down.png")),
        ];
        let mut show = Show::new();
        show.set_soft_buttons(Some(buttons.clone()));

        assert_eq!(show.soft_buttons(), Some(buttons));
    }

    #[test]
    fn test_invalid_soft_button_drops_whole_list() {
        let mut broken = SoftButton::text(2, "Skip");
        broken.button_type = SoftButtonType::Both;

        let mut show = Show::new();
        show.set_soft_buttons(Some(vec![SoftButton::text(1, "Ok"), broken]));

        assert!(!show.params().contains_key(Show::KEY_SOFT_BUTTONS));
    }

    #[test]
    fn test_add_command_menu_item() {
        let command = AddCommand::menu_item(42, "Favourites");
        assert_eq!(command.cmd_id(), Some(42));
        assert_eq!(
            command.menu_params().map(|m| m.menu_name),
            Some("Favourites".to_string())
        );

        let request = command.into_request(CorrelationId::new(1));
        assert_eq!(request.kind(), &MessageKind::ADD_COMMAND);
    }

    #[test]
    fn test_empty_menu_name_is_rejected() {
        let command = AddCommand::menu_item(1, "");
        assert_eq!(command.menu_params(), None);
        assert_eq!(command.cmd_id(), Some(1));
    }

    #[test]
    fn test_speak_text() {
        let speak = Speak::text("Turn left");
        assert_eq!(speak.tts_chunks(), Some(TtsChunk::simple("Turn left")));
    }
}
