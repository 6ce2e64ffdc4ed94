//! # airnode-core
//!
//! Configuration core of the airnode environmental sensor node.
//!
//! This crate provides:
//! - The configuration record and its factory defaults
//! - Versioned, checksummed persistence on a 1024-byte non-volatile store
//! - Merging of web form submissions into the record
//! - Sensor and Wi-Fi scan data types consumed by the renderers
//!
//! This crate is intentionally runtime-agnostic and contains no async code,
//! making it usable on both Linux hosts and the microcontroller target.

pub mod config;
pub mod form;
pub mod model;
pub mod persist;
pub mod service;
pub mod store;

pub use config::{bounded, defaults, Channel, ConfigurationRecord, PublishingPolicy, Text};
pub use form::{apply_form, FieldError, FormReport};
pub use model::{Measurement, NetworkScanner, ScannedNetwork, SensorReading, SensorSource};
pub use persist::{FactoryResetReason, LoadSource, Loaded, PersistError, PersistenceStore};
pub use service::ConfigService;
pub use store::{MemoryStore, NonVolatileStore, StoreError, STORE_CAPACITY};
