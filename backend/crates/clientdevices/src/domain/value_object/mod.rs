//! Value Object Module

pub mod certificate;
pub mod device_attribute;
pub mod permission;
pub mod thing;
