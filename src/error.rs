use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorType {
    /// No adapter exposing a GATT manager could be located.
    AdapterUnavailable,
    /// The adapter rejected an advertisement or application registration.
    RegistrationFailure,
    /// Two siblings were attached with the same index.
    PathConflict,
    NotPermitted,
    Bluez,
    Config,
    Io,
    ChannelClosed,
    Unknown,
}

#[derive(Debug, Error)]
#[error("{message}: {description}")]
pub struct Error {
    pub message: String,
    pub description: String,
    pub kind: ErrorType,
}

impl Error {
    pub fn new(
        message: impl Into<String>,
        description: impl Into<String>,
        kind: ErrorType,
    ) -> Self {
        Error {
            message: message.into(),
            description: description.into(),
            kind,
        }
    }

    pub fn from_type(kind: ErrorType) -> Self {
        let message = match kind {
            ErrorType::AdapterUnavailable => "GattManager1 interface not found",
            ErrorType::RegistrationFailure => "Registration rejected by adapter",
            ErrorType::PathConflict => "Attribute path already in use",
            ErrorType::NotPermitted => "Operation not permitted",
            ErrorType::Bluez => "BlueZ error",
            ErrorType::Config => "Invalid configuration",
            ErrorType::Io => "I/O error",
            ErrorType::ChannelClosed => "Dispatcher channel closed",
            ErrorType::Unknown => "Unknown error",
        };
        Error::new(message, "", kind)
    }

    pub fn registration(what: &str, cause: impl std::fmt::Display) -> Self {
        Error::new(
            format!("Failed to register {}", what),
            cause.to_string(),
            ErrorType::RegistrationFailure,
        )
    }

    pub fn is_fatal(&self) -> bool {
        matches!(
            self.kind,
            ErrorType::AdapterUnavailable | ErrorType::RegistrationFailure
        )
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Error::new("std::io::Error", value.to_string(), ErrorType::Io)
    }
}

impl From<toml::de::Error> for Error {
    fn from(value: toml::de::Error) -> Self {
        Error::new("toml::de::Error", value.to_string(), ErrorType::Config)
    }
}

#[cfg(target_os = "linux")]
impl From<bluer::Error> for Error {
    fn from(value: bluer::Error) -> Self {
        let kind = match value.kind {
            bluer::ErrorKind::NotFound | bluer::ErrorKind::NotAvailable => {
                ErrorType::AdapterUnavailable
            }
            _ => ErrorType::Bluez,
        };
        Error::new(
            format!("bluer::Error: {:?}", value.kind),
            value.message.clone(),
            kind,
        )
    }
}
