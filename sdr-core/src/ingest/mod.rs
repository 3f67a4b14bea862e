//! Network ingest: UDP/TCP burst accumulation (spec §4.1).

pub mod burst;
pub mod socket;

pub use burst::{Burst, BurstReader};
pub use socket::BurstSocket;
