use std::fmt;

/// Operation tags BlueZ accepts in the `Flags` property of characteristics
/// and descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AttributeFlag {
    Broadcast,
    Read,
    WriteWithoutResponse,
    Write,
    Notify,
    Indicate,
    AuthenticatedSignedWrites,
    ReliableWrite,
    WritableAuxiliaries,
    EncryptRead,
    EncryptWrite,
    EncryptAuthenticatedRead,
    EncryptAuthenticatedWrite,
    SecureRead,
    SecureWrite,
}

impl AttributeFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeFlag::Broadcast => "broadcast",
            AttributeFlag::Read => "read",
            AttributeFlag::WriteWithoutResponse => "write-without-response",
            AttributeFlag::Write => "write",
            AttributeFlag::Notify => "notify",
            AttributeFlag::Indicate => "indicate",
            AttributeFlag::AuthenticatedSignedWrites => "authenticated-signed-writes",
            AttributeFlag::ReliableWrite => "reliable-write",
            AttributeFlag::WritableAuxiliaries => "writable-auxiliaries",
            AttributeFlag::EncryptRead => "encrypt-read",
            AttributeFlag::EncryptWrite => "encrypt-write",
            AttributeFlag::EncryptAuthenticatedRead => "encrypt-authenticated-read",
            AttributeFlag::EncryptAuthenticatedWrite => "encrypt-authenticated-write",
            AttributeFlag::SecureRead => "secure-read",
            AttributeFlag::SecureWrite => "secure-write",
        }
    }

    pub fn is_read(&self) -> bool {
        matches!(
            self,
            AttributeFlag::Read
                | AttributeFlag::EncryptRead
                | AttributeFlag::EncryptAuthenticatedRead
                | AttributeFlag::SecureRead
        )
    }

    pub fn is_write(&self) -> bool {
        matches!(
            self,
            AttributeFlag::Write
                | AttributeFlag::WriteWithoutResponse
                | AttributeFlag::AuthenticatedSignedWrites
                | AttributeFlag::ReliableWrite
                | AttributeFlag::EncryptWrite
                | AttributeFlag::EncryptAuthenticatedWrite
                | AttributeFlag::SecureWrite
        )
    }
}

impl fmt::Display for AttributeFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered set of flags as exported in the `Flags` property.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Flags(Vec<AttributeFlag>);

impl Flags {
    pub fn new(flags: &[AttributeFlag]) -> Self {
        let mut set = Flags::default();
        for flag in flags {
            set.insert(*flag);
        }
        set
    }

    pub fn insert(&mut self, flag: AttributeFlag) {
        if !self.0.contains(&flag) {
            self.0.push(flag);
        }
    }

    pub fn contains(&self, flag: AttributeFlag) -> bool {
        self.0.contains(&flag)
    }

    pub fn readable(&self) -> bool {
        self.0.iter().any(AttributeFlag::is_read)
    }

    pub fn writable(&self) -> bool {
        self.0.iter().any(AttributeFlag::is_write)
    }

    pub fn to_strings(&self) -> Vec<String> {
        self.0.iter().map(|flag| flag.as_str().to_string()).collect()
    }
}
