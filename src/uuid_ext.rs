use uuid::Uuid;

/// Bluetooth SIG base UUID, `0000xxxx-0000-1000-8000-00805f9b34fb`.
const BASE_UUID: u128 = 0x0000_0000_0000_1000_8000_0080_5f9b_34fb;

pub trait SdpShortUuid<T> {
    fn from_sdp_short_uuid(uuid: T) -> Self;
}

impl SdpShortUuid<u16> for Uuid {
    fn from_sdp_short_uuid(uuid: u16) -> Self {
        Uuid::from_u128(BASE_UUID | ((uuid as u128) << 96))
    }
}

impl SdpShortUuid<u32> for Uuid {
    fn from_sdp_short_uuid(uuid: u32) -> Self {
        Uuid::from_u128(BASE_UUID | ((uuid as u128) << 96))
    }
}
