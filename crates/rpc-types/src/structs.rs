//! # Parameter Structs
//!
//! Fixed-shape structs nested inside message parameters.
//!
//! Required fields must be present and well-formed for the struct to decode.
//! A malformed optional field is dropped (and reported) without failing the
//! struct, the same way a facade getter treats a top-level field.

use crate::codec::{FieldCodec, RpcStruct};
use crate::enums::{ImageType, SoftButtonType, SpeechCapabilities, SystemAction};
use crate::errors::ValidationError;
use crate::facade::{get_field, set_field};
use crate::params::ParamStore;

fn required<T: FieldCodec>(store: &ParamStore, key: &'static str) -> Result<T, ValidationError> {
    store
        .get_typed::<T>(key)?
        .ok_or(ValidationError::MissingField(key))
}

fn shape_error(type_name: &'static str, reason: &str) -> ValidationError {
    ValidationError::InvalidShape {
        type_name,
        reason: reason.to_owned(),
    }
}

/// Reference to an image on the head unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    /// File name or static icon id.
    pub value: String,
    pub image_type: ImageType,
}

impl Image {
    pub const KEY_VALUE: &'static str = "value";
    pub const KEY_IMAGE_TYPE: &'static str = "imageType";

    pub fn new(value: impl Into<String>, image_type: ImageType) -> Self {
        Self {
            value: value.into(),
            image_type,
        }
    }

    /// An image previously uploaded by the application.
    pub fn dynamic(file_name: impl Into<String>) -> Self {
        Self::new(file_name, ImageType::Dynamic)
    }
}

impl RpcStruct for Image {
    const STRUCT_NAME: &'static str = "Image";

    fn from_store(store: &ParamStore) -> Result<Self, ValidationError> {
        Ok(Self {
            value: required(store, Self::KEY_VALUE)?,
            image_type: required(store, Self::KEY_IMAGE_TYPE)?,
        })
    }

    fn to_store(&self) -> ParamStore {
        let mut store = ParamStore::with_capacity(2);
        set_field(&mut store, Self::STRUCT_NAME, Self::KEY_VALUE, Some(self.value.clone()));
        set_field(&mut store, Self::STRUCT_NAME, Self::KEY_IMAGE_TYPE, Some(self.image_type));
        store
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.value.is_empty() {
            return Err(shape_error(Self::STRUCT_NAME, "value is empty"));
        }
        Ok(())
    }
}

/// A button rendered by the head unit on the application's behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoftButton {
    pub button_type: SoftButtonType,
    pub text: Option<String>,
    pub image: Option<Image>,
    pub is_highlighted: Option<bool>,
    pub soft_button_id: u16,
    pub system_action: Option<SystemAction>,
}

impl SoftButton {
    pub const KEY_TYPE: &'static str = "type";
    pub const KEY_TEXT: &'static str = "text";
    pub const KEY_IMAGE: &'static str = "image";
    pub const KEY_IS_HIGHLIGHTED: &'static str = "isHighlighted";
    pub const KEY_SOFT_BUTTON_ID: &'static str = "softButtonID";
    pub const KEY_SYSTEM_ACTION: &'static str = "systemAction";

    /// A text-only button.
    pub fn text(soft_button_id: u16, text: impl Into<String>) -> Self {
        Self {
            button_type: SoftButtonType::Text,
            text: Some(text.into()),
            image: None,
            is_highlighted: None,
            soft_button_id,
            system_action: None,
        }
    }

    /// An image-only button.
    pub fn image(soft_button_id: u16, image: Image) -> Self {
        Self {
            button_type: SoftButtonType::Image,
            text: None,
            image: Some(image),
            is_highlighted: None,
            soft_button_id,
            system_action: None,
        }
    }
}

impl RpcStruct for SoftButton {
    const STRUCT_NAME: &'static str = "SoftButton";

    fn from_store(store: &ParamStore) -> Result<Self, ValidationError> {
        Ok(Self {
            button_type: required(store, Self::KEY_TYPE)?,
            text: get_field(store, Self::STRUCT_NAME, Self::KEY_TEXT),
            image: get_field(store, Self::STRUCT_NAME, Self::KEY_IMAGE),
            is_highlighted: get_field(store, Self::STRUCT_NAME, Self::KEY_IS_HIGHLIGHTED),
            soft_button_id: required(store, Self::KEY_SOFT_BUTTON_ID)?,
            system_action: get_field(store, Self::STRUCT_NAME, Self::KEY_SYSTEM_ACTION),
        })
    }

    fn to_store(&self) -> ParamStore {
        let mut store = ParamStore::with_capacity(6);
        set_field(&mut store, Self::STRUCT_NAME, Self::KEY_TYPE, Some(self.button_type));
        set_field(&mut store, Self::STRUCT_NAME, Self::KEY_TEXT, self.text.clone());
        set_field(&mut store, Self::STRUCT_NAME, Self::KEY_IMAGE, self.image.clone());
        set_field(&mut store, Self::STRUCT_NAME, Self::KEY_IS_HIGHLIGHTED, self.is_highlighted);
        set_field(
            &mut store,
            Self::STRUCT_NAME,
            Self::KEY_SOFT_BUTTON_ID,
            Some(self.soft_button_id),
        );
        set_field(&mut store, Self::STRUCT_NAME, Self::KEY_SYSTEM_ACTION, self.system_action);
        store
    }

    fn validate(&self) -> Result<(), ValidationError> {
        let needs_text = matches!(self.button_type, SoftButtonType::Text | SoftButtonType::Both);
        let needs_image = matches!(self.button_type, SoftButtonType::Image | SoftButtonType::Both);

        if needs_text && self.text.as_deref().map_or(true, str::is_empty) {
            return Err(shape_error(Self::STRUCT_NAME, "text button without text"));
        }
        match &self.image {
            Some(image) => RpcStruct::validate(image),
            None if needs_image => {
                Err(shape_error(Self::STRUCT_NAME, "image button without image"))
            }
            None => Ok(()),
        }
    }
}

/// Where a command appears in the application menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuParams {
    pub menu_name: String,
    /// Sub-menu holding the command; top level when absent.
    pub parent_id: Option<u32>,
    pub position: Option<u32>,
}

impl MenuParams {
    pub const KEY_MENU_NAME: &'static str = "menuName";
    pub const KEY_PARENT_ID: &'static str = "parentID";
    pub const KEY_POSITION: &'static str = "position";

    pub fn new(menu_name: impl Into<String>) -> Self {
        Self {
            menu_name: menu_name.into(),
            parent_id: None,
            position: None,
        }
    }
}

impl RpcStruct for MenuParams {
    const STRUCT_NAME: &'static str = "MenuParams";

    fn from_store(store: &ParamStore) -> Result<Self, ValidationError> {
        Ok(Self {
            menu_name: required(store, Self::KEY_MENU_NAME)?,
            parent_id: get_field(store, Self::STRUCT_NAME, Self::KEY_PARENT_ID),
            position: get_field(store, Self::STRUCT_NAME, Self::KEY_POSITION),
        })
    }

    fn to_store(&self) -> ParamStore {
        let mut store = ParamStore::with_capacity(3);
        set_field(&mut store, Self::STRUCT_NAME, Self::KEY_MENU_NAME, Some(self.menu_name.clone()));
        set_field(&mut store, Self::STRUCT_NAME, Self::KEY_PARENT_ID, self.parent_id);
        set_field(&mut store, Self::STRUCT_NAME, Self::KEY_POSITION, self.position);
        store
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.menu_name.is_empty() {
            return Err(shape_error(Self::STRUCT_NAME, "menu name is empty"));
        }
        Ok(())
    }
}

/// One piece of text-to-speech output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TtsChunk {
    pub text: String,
    pub chunk_type: SpeechCapabilities,
}

impl TtsChunk {
    pub const KEY_TEXT: &'static str = "text";
    pub const KEY_TYPE: &'static str = "type";

    pub fn new(text: impl Into<String>, chunk_type: SpeechCapabilities) -> Self {
        Self {
            text: text.into(),
            chunk_type,
        }
    }

    /// Plain text chunks for a single utterance.
    pub fn simple(text: impl Into<String>) -> Vec<TtsChunk> {
        vec![Self::new(text, SpeechCapabilities::Text)]
    }
}

impl RpcStruct for TtsChunk {
    const STRUCT_NAME: &'static str = "TTSChunk";

    fn from_store(store: &ParamStore) -> Result<Self, ValidationError> {
        Ok(Self {
            text: required(store, Self::KEY_TEXT)?,
            chunk_type: required(store, Self::KEY_TYPE)?,
        })
    }

    fn to_store(&self) -> ParamStore {
        let mut store = ParamStore::with_capacity(2);
        set_field(&mut store, Self::STRUCT_NAME, Self::KEY_TEXT, Some(self.text.clone()));
        set_field(&mut store, Self::STRUCT_NAME, Self::KEY_TYPE, Some(self.chunk_type));
        store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn test_soft_button_from_wire_store() {
        let store: ParamStore = serde_json::from_str(
            r#"{"type":"BOTH","text":"Play","image":{"value":"play.png","imageType":"DYNAMIC"},"softButtonID":4}"#,
        )
        .unwrap();

        let button = SoftButton::from_store(&store).unwrap();
        assert_eq!(button.button_type, SoftButtonType::Both);
        assert_eq!(button.image, Some(Image::dynamic("play.png")));
        assert_eq!(button.soft_button_id, 4);
        assert!(RpcStruct::validate(&button).is_ok());
    }

    #[test]
    fn test_malformed_optional_subfield_is_dropped() {
        let store: ParamStore = serde_json::from_str(
            r#"{"type":"TEXT","text":"Ok","isHighlighted":"yes","softButtonID":1}"#,
        )
        .unwrap();

        let button = SoftButton::from_store(&store).unwrap();
        assert_eq!(button.is_highlighted, None);
        assert_eq!(button.text.as_deref(), Some("Ok"));
    }

    #[test]
    fn test_missing_required_field() {
        let store: ParamStore = serde_json::from_str(r#"{"text":"Ok","softButtonID":1}"#).unwrap();
        assert_eq!(
            SoftButton::from_store(&store),
            Err(ValidationError::MissingField("type"))
        );
    }

    #[test]
    fn test_soft_button_shape() {
        let mut button = SoftButton::text(1, "Next");
        assert!(RpcStruct::validate(&button).is_ok());

        button.button_type = SoftButtonType::Image;
        assert!(RpcStruct::validate(&button).is_err());

        button.image = Some(Image::dynamic(""));
        assert!(RpcStruct::validate(&button).is_err());
    }

    #[test]
    fn test_typed_struct_decodes_only_as_own_type() {
        let chunk = TtsChunk::simple("Hello").remove(0);
        let encoded = chunk.encode();

        assert_eq!(TtsChunk::decode(&encoded), Ok(chunk));
        assert!(matches!(
            Image::decode(&encoded),
            Err(ValidationError::TypeMismatch { expected: "Image", found: "TTSChunk" })
        ));
        assert!(matches!(encoded, Value::Struct(_)));
    }

    #[test]
    fn test_struct_tags_match_codec_names() {
        assert_eq!(Image::STRUCT_NAME, <Image as FieldCodec>::TYPE_NAME);
        assert_eq!(<TtsChunk as FieldCodec>::TYPE_NAME, "TTSChunk");

        let encoded = SoftButton::text(3, "Back").encode();
        assert_eq!(encoded.type_name(), SoftButton::STRUCT_NAME);
    }

    #[test]
    fn test_menu_params_to_store_omits_absent() {
        let params = MenuParams::new("Subscribe").to_store();
        assert_eq!(params.keys().collect::<Vec<_>>(), vec!["menuName"]);
    }
}
