// Session lifecycle: wiring capture, detector, overlay and scheduler.

pub mod error;
pub mod live;
