// Camera domain: discovery, stream negotiation, and frame capture.

pub mod backend;
pub mod capture;
pub mod dummy;
pub mod error;
pub mod selection;
pub mod types;
