//! # Wire Enumerations
//!
//! Enumerated parameter values, carried on the wire by name.

use crate::rpc_enum;

rpc_enum! {
    /// Alignment of the main text fields of a `Show`.
    pub enum TextAlignment {
        LeftAligned = "LEFT_ALIGNED",
        RightAligned = "RIGHT_ALIGNED",
        Centered = "CENTERED",
    }
}

rpc_enum! {
    /// How much of the head unit the application currently owns.
    pub enum HmiLevel {
        Full = "FULL",
        Limited = "LIMITED",
        Background = "BACKGROUND",
        None = "NONE",
    }
}

rpc_enum! {
    pub enum AudioStreamingState {
        Audible = "AUDIBLE",
        Attenuated = "ATTENUATED",
        NotAudible = "NOT_AUDIBLE",
    }
}

rpc_enum! {
    pub enum SystemContext {
        Main = "MAIN",
        VoiceSession = "VRSESSION",
        Menu = "MENU",
        HmiObscured = "HMI_OBSCURED",
        Alert = "ALERT",
    }
}

rpc_enum! {
    /// What the user used to select a command.
    pub enum TriggerSource {
        Menu = "MENU",
        Voice = "VR",
        Keyboard = "KEYBOARD",
    }
}

rpc_enum! {
    pub enum ImageType {
        Static = "STATIC",
        Dynamic = "DYNAMIC",
    }
}

rpc_enum! {
    pub enum SoftButtonType {
        Text = "TEXT",
        Image = "IMAGE",
        Both = "BOTH",
    }
}

rpc_enum! {
    pub enum SystemAction {
        DefaultAction = "DEFAULT_ACTION",
        StealFocus = "STEAL_FOCUS",
        KeepContext = "KEEP_CONTEXT",
    }
}

rpc_enum! {
    /// Kind of content in a text-to-speech chunk.
    pub enum SpeechCapabilities {
        Text = "TEXT",
        SapiPhonemes = "SAPI_PHONEMES",
        LhplusPhonemes = "LHPLUS_PHONEMES",
        PreRecorded = "PRE_RECORDED",
        Silence = "SILENCE",
    }
}

rpc_enum! {
    /// Outcome reported by the peer in a response.
    pub enum ResultCode {
        Success = "SUCCESS",
        UnsupportedRequest = "UNSUPPORTED_REQUEST",
        UnsupportedResource = "UNSUPPORTED_RESOURCE",
        Disallowed = "DISALLOWED",
        Rejected = "REJECTED",
        Aborted = "ABORTED",
        Ignored = "IGNORED",
        InvalidData = "INVALID_DATA",
        OutOfMemory = "OUT_OF_MEMORY",
        TooManyPendingRequests = "TOO_MANY_PENDING_REQUESTS",
        InvalidId = "INVALID_ID",
        DuplicateName = "DUPLICATE_NAME",
        ApplicationNotRegistered = "APPLICATION_NOT_REGISTERED",
        GenericError = "GENERIC_ERROR",
        UserDisallowed = "USER_DISALLOWED",
        Warnings = "WARNINGS",
        TimedOut = "TIMED_OUT",
    }
}

impl ResultCode {
    /// Codes that still mean the request was carried out.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, ResultCode::Success | ResultCode::Warnings)
    }
}
