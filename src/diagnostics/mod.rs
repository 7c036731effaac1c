// Diagnostics: sampling counters and snapshots.

pub mod stats;
