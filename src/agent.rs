/// Pairing agent description. The agent has no state of its own; the stack
/// answers every authorization request on its behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Agent {
    pub path: String,
    pub capability: Capability,
}

/// IO capability announced to BlueZ. Only the prompt-free one is served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    NoInputNoOutput,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::NoInputNoOutput => "NoInputNoOutput",
        }
    }
}

impl Agent {
    pub fn new(path: impl Into<String>, capability: Capability) -> Self {
        Agent {
            path: path.into(),
            capability,
        }
    }

    /// Accepts pairing without prompting.
    pub fn no_input_no_output(path: impl Into<String>) -> Self {
        Agent::new(path, Capability::NoInputNoOutput)
    }

    /// Policy for `RequestAuthorization` and `AuthorizeService`: always granted.
    pub fn authorize(&self, device: &str, service: Option<&str>) -> bool {
        match service {
            Some(service) => log::debug!("Authorizing service {} for {}", service, device),
            None => log::debug!("Authorizing {}", device),
        }
        true
    }
}
