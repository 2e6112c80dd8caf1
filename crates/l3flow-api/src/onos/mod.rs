// ONOS REST client modules
//
// Hand-written client for the controller's northbound REST endpoints.
// Covers device and host inventory, packet-in polling, and flow
// installation/teardown. Every list endpoint wraps its payload in a
// single-key envelope such as `{ "devices": [...] }`.

pub mod client;
pub mod devices;
pub mod flows;
pub mod hosts;
pub mod models;
pub mod packets;

pub use client::{BasicAuth, OnosClient};
