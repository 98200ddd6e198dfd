//! Simulated BACnet/IP field devices.
//!
//! A [`SimulatedDevice`] is built from a [`DeviceConfig`] and serves its
//! objects over a [`DataLink`](bacsim_datalink::DataLink). Each object is a
//! [`PropertyStore`] whose writes run through a chain of middlewares:
//! priority arbitration for commandable objects, value rules, and derived
//! status flags. Changes to present value or status flags are pushed to COV
//! subscribers by the [`SubscriptionManager`].

pub mod config;
pub mod error;
pub mod middleware;
pub mod object;
pub mod property;
pub mod simulator;
pub mod store;
pub mod subscription;

pub use config::{DeviceConfig, ObjectConfig, ObjectCounts};
pub use error::{ConfigError, DeviceError, StoreError};
pub use property::{FlowKind, Property};
pub use simulator::SimulatedDevice;
pub use store::{FlowHandler, PropertyStore};
pub use subscription::{
    CancelHandle, CovDelivery, SharedObject, Subscriber, SubscriptionKey, SubscriptionManager,
};
