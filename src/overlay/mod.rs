// Overlay: box mapping, rendering, and the display-owning thread.

pub mod error;
pub mod renderer;
pub mod surface;
pub mod thread;
pub mod types;
