//! The Gardener peripheral: one primary service with the WaterPlants switch,
//! advertised under the name "Gardener".

pub mod user_description;
pub mod water_plants;

use crate::advertisement::{Advertisement, AdvertisementKind};
use crate::agent::Agent;
use crate::gatt::application::Application;
use crate::gatt::service::Service;
use crate::Error;
use uuid::Uuid;
use water_plants::WaterPlants;

pub const GARDENER_SERVICE_UUID: Uuid = Uuid::from_u128(0xa0445a21_158f_4ca8_840d_6ec56ca58962);
pub const GARDENER_SERVICE_INDEX: u16 = 2;
pub const MANUFACTURER_ID: u16 = 0xFFFF;
pub const MANUFACTURER_DATA: [u8; 4] = [0x64, 0x61, 0x76, 0x65];
pub const LOCAL_NAME: &str = "Gardener";
pub const AGENT_PATH: &str = "/dave/agent";

pub fn service(index: u16, strict_commands: bool) -> Result<Service, Error> {
    let mut service = Service::new(index, GARDENER_SERVICE_UUID, true);
    service.add_characteristic(WaterPlants::characteristic(
        0,
        WaterPlants::new(strict_commands),
    )?)?;
    Ok(service)
}

pub fn application(strict_commands: bool) -> Result<Application, Error> {
    let mut application = Application::default();
    application.add_service(service(GARDENER_SERVICE_INDEX, strict_commands)?)?;
    Ok(application)
}

pub fn advertisement(local_name: &str) -> Advertisement {
    let mut advertisement = Advertisement::new(0, AdvertisementKind::Peripheral);
    advertisement.add_manufacturer_data(MANUFACTURER_ID, MANUFACTURER_DATA.to_vec());
    advertisement.add_service_uuid(GARDENER_SERVICE_UUID);
    advertisement.add_local_name(local_name);
    advertisement.include_tx_power = true;
    advertisement
}

pub fn agent() -> Agent {
    Agent::no_input_no_output(AGENT_PATH)
}
