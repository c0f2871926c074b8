//! Device registration and lookup

mod registrar;

pub use registrar::{
    DeviceRegistrar, DuplicatePolicy, LookupError, ParseDuplicatePolicyError, RegisterDevice,
    RegistrationAck, RegistrationError,
};
