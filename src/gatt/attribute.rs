//! Pieces shared by every node of the exported attribute tree: object paths,
//! introspection properties and the errors a peer can observe.

use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

pub const GATT_SERVICE_IFACE: &str = "org.bluez.GattService1";
pub const GATT_CHRC_IFACE: &str = "org.bluez.GattCharacteristic1";
pub const GATT_DESC_IFACE: &str = "org.bluez.GattDescriptor1";

/// Errors surfaced back to the calling peer as protocol error replies.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttributeError {
    #[error("org.bluez.Error.NotPermitted")]
    NotPermitted,
    #[error("org.freedesktop.DBus.Error.InvalidArgs: {0}")]
    InvalidArgs(String),
    #[error("no attribute at {0}")]
    UnknownAttribute(AttributePath),
    #[error("org.bluez.Error.Failed: {0}")]
    Failed(String),
}

/// Object path of an attribute. Assigned once when the attribute is attached
/// to its parent.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AttributePath(String);

impl AttributePath {
    pub fn new(path: impl Into<String>) -> Self {
        AttributePath(path.into())
    }

    pub fn child(&self, segment: &str, index: u16) -> Self {
        AttributePath(format!("{}/{}{}", self.0.trim_end_matches('/'), segment, index))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_ancestor_of(&self, other: &AttributePath) -> bool {
        other.0.len() > self.0.len()
            && other.0.starts_with(&self.0)
            && other.0.as_bytes()[self.0.len()] == b'/'
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    Str(String),
    Bool(bool),
    Path(AttributePath),
    Strings(Vec<String>),
    Paths(Vec<AttributePath>),
}

pub type PropertyMap = BTreeMap<String, PropertyValue>;

/// Interface name → properties, one entry per object in `GetManagedObjects`.
pub type InterfaceMap = BTreeMap<String, PropertyMap>;

/// Options BlueZ passes along with `ReadValue`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadOptions {
    pub offset: u16,
    pub mtu: Option<u16>,
    pub device: Option<String>,
}

/// Options BlueZ passes along with `WriteValue`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteOptions {
    pub offset: u16,
    pub mtu: Option<u16>,
    pub device: Option<String>,
    pub prepare_authorize: bool,
}

pub(crate) fn check_interface(requested: &str, expected: &str) -> Result<(), AttributeError> {
    if requested != expected {
        return Err(AttributeError::InvalidArgs(format!(
            "unknown interface {}",
            requested
        )));
    }
    Ok(())
}
