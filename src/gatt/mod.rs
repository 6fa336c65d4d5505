pub mod application;
pub mod attribute;
pub mod characteristic;
pub mod descriptor;
pub mod dispatcher;
pub mod peripheral_event;
pub mod properties;
pub mod service;
