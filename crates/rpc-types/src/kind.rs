//! # Message Kinds
//!
//! Identifier naming an RPC message type.
//!
//! Kinds are open: names this crate does not know about decode as opaque
//! pass-through kinds and compare by name like any other.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Name of an RPC message type, e.g. `Show` or `OnHMIStatus`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageKind(Cow<'static, str>);

/// Known kinds and their numeric function ids.
const FUNCTION_IDS: &[(&str, u32)] = &[
    ("AddCommand", 5),
    ("Show", 13),
    ("Speak", 14),
    ("SubscribeVehicleData", 20),
    ("UnsubscribeVehicleData", 21),
    ("GetVehicleData", 22),
    ("GenericResponse", 31),
    ("OnHMIStatus", 32768),
    ("OnVehicleData", 32772),
    ("OnCommand", 32773),
];

impl MessageKind {
    pub const ADD_COMMAND: Self = Self::new_static("AddCommand");
    pub const SHOW: Self = Self::new_static("Show");
    pub const SPEAK: Self = Self::new_static("Speak");
    pub const SUBSCRIBE_VEHICLE_DATA: Self = Self::new_static("SubscribeVehicleData");
    pub const UNSUBSCRIBE_VEHICLE_DATA: Self = Self::new_static("UnsubscribeVehicleData");
    pub const GET_VEHICLE_DATA: Self = Self::new_static("GetVehicleData");
    pub const GENERIC_RESPONSE: Self = Self::new_static("GenericResponse");
    pub const ON_HMI_STATUS: Self = Self::new_static("OnHMIStatus");
    pub const ON_VEHICLE_DATA: Self = Self::new_static("OnVehicleData");
    pub const ON_COMMAND: Self = Self::new_static("OnCommand");

    /// Create a kind from a static name without allocating.
    #[must_use]
    pub const fn new_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// Create a kind from any name, known or not.
    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    /// Look up a known kind by its numeric function id.
    #[must_use]
    pub fn from_function_id(id: u32) -> Option<Self> {
        FUNCTION_IDS
            .iter()
            .find(|(_, fid)| *fid == id)
            .map(|(name, _)| Self::new_static(name))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric function id, `None` for kinds unknown to this crate.
    #[must_use]
    pub fn function_id(&self) -> Option<u32> {
        FUNCTION_IDS
            .iter()
            .find(|(name, _)| *name == self.as_str())
            .map(|(_, id)| *id)
    }

    #[must_use]
    pub fn is_known(&self) -> bool {
        self.function_id().is_some()
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MessageKind {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for MessageKind {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owned_and_borrowed_compare_equal() {
        assert_eq!(MessageKind::new("Show"), MessageKind::SHOW);
        assert_eq!(MessageKind::from("OnCommand").function_id(), Some(32773));
    }

    #[test]
    fn test_unknown_kind_passes_through() {
        let kind: MessageKind = serde_json::from_str(r#""OnWayPointChange""#).unwrap();

        assert_eq!(kind.as_str(), "OnWayPointChange");
        assert!(!kind.is_known());
        assert_eq!(kind.function_id(), None);
        assert_eq!(serde_json::to_string(&kind).unwrap(), r#""OnWayPointChange""#);
    }

    #[test]
    fn test_function_id_lookup() {
        assert_eq!(MessageKind::from_function_id(13), Some(MessageKind::SHOW));
        assert_eq!(MessageKind::from_function_id(9999), None);
    }
}
