use crate::gatt::attribute::{AttributeError, ReadOptions, WriteOptions};
use crate::gatt::characteristic::{Characteristic, CharacteristicBehavior};
use crate::gatt::properties::AttributeFlag;
use crate::Error;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use super::user_description;

pub const WATER_PLANTS_UUID: Uuid = Uuid::from_u128(0x7e709c77_1844_46e7_8fd0_27b0b2382ee8);
pub const WATER_PLANTS_DESCRIPTION: &[u8] = b"Get/set machine power state {'ON', 'OFF', 'UNKNOWN'}";
pub const WATER_PLANTS_FLAGS: &[AttributeFlag] =
    &[AttributeFlag::EncryptRead, AttributeFlag::EncryptWrite];

/// Power state of the watering machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    On,
    Off,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized machine state '{0}'")]
pub struct StateParseError(pub String);

impl State {
    pub fn as_str(&self) -> &'static str {
        match self {
            State::On => "ON",
            State::Off => "OFF",
            State::Unknown => "UNKNOWN",
        }
    }

    pub fn has_value(candidate: &str) -> bool {
        candidate.parse::<State>().is_ok()
    }

    pub fn encode(&self) -> Vec<u8> {
        self.as_str().as_bytes().to_vec()
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for State {
    type Err = StateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ON" => Ok(State::On),
            "OFF" => Ok(State::Off),
            "UNKNOWN" => Ok(State::Unknown),
            other => Err(StateParseError(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("machine status unavailable: {0}")]
pub struct StatusError(pub String);

/// Where a read gets the machine state from.
pub trait MachineStatus: fmt::Debug + Send {
    fn status(&self) -> Result<State, StatusError>;
}

/// Actuation is not wired up; the machine always reports off.
#[derive(Debug, Default)]
pub struct StubMachine;

impl MachineStatus for StubMachine {
    fn status(&self) -> Result<State, StatusError> {
        Ok(State::Off)
    }
}

#[derive(Debug)]
pub struct WaterPlants {
    strict_commands: bool,
    machine: Box<dyn MachineStatus>,
}

impl WaterPlants {
    pub fn new(strict_commands: bool) -> Self {
        WaterPlants::with_machine(strict_commands, Box::new(StubMachine))
    }

    pub fn with_machine(strict_commands: bool, machine: Box<dyn MachineStatus>) -> Self {
        WaterPlants {
            strict_commands,
            machine,
        }
    }

    /// The characteristic with its user description descriptor attached.
    pub fn characteristic(index: u16, behavior: WaterPlants) -> Result<Characteristic, Error> {
        let mut chrc = Characteristic::new(
            index,
            WATER_PLANTS_UUID,
            WATER_PLANTS_FLAGS,
            vec![0xFF],
            Box::new(behavior),
        );
        chrc.add_descriptor(user_description::descriptor(1, WATER_PLANTS_DESCRIPTION))?;
        Ok(chrc)
    }

    fn decode(incoming: &[u8]) -> Result<&str, AttributeError> {
        std::str::from_utf8(incoming).map_err(|err| {
            log::info!("invalid state written {:?}", incoming);
            AttributeError::Failed(err.to_string())
        })
    }
}

impl CharacteristicBehavior for WaterPlants {
    fn read_value(
        &mut self,
        value: &mut Vec<u8>,
        _options: &ReadOptions,
    ) -> Result<Vec<u8>, AttributeError> {
        log::debug!("WaterPlants read: {:?}", value);
        *value = match self.machine.status() {
            Ok(state) => state.encode(),
            Err(err) => {
                log::error!("Error getting status {}", err);
                State::Unknown.encode()
            }
        };
        Ok(value.clone())
    }

    fn write_value(
        &mut self,
        value: &mut Vec<u8>,
        incoming: Vec<u8>,
        _options: &WriteOptions,
    ) -> Result<(), AttributeError> {
        log::debug!("WaterPlants write: {:?}", incoming);
        let cmd = WaterPlants::decode(&incoming)?;
        if self.strict_commands {
            let state = cmd.parse::<State>().map_err(|err| {
                log::info!("{}", err);
                AttributeError::NotPermitted
            })?;
            log::info!("writing {} to machine", state);
        }
        log::debug!("Watering the plants: {}", cmd);
        *value = incoming;
        Ok(())
    }
}
