use crate::gatt::descriptor::Descriptor;
use crate::gatt::properties::AttributeFlag;
use crate::uuid_ext::SdpShortUuid;
use uuid::Uuid;

/// Characteristic User Description.
pub const CUD_UUID: u16 = 0x2901;

/// Read-only CUD carrying a fixed label; every write is refused.
pub fn descriptor(index: u16, description: &[u8]) -> Descriptor {
    Descriptor::new(
        index,
        Uuid::from_sdp_short_uuid(CUD_UUID),
        &[AttributeFlag::Read],
        description.to_vec(),
    )
}
