// Sampling: periodic timer, single-flight gate and the per-tick cycle.

pub mod cycle;
pub mod gate;
pub mod scheduler;

#[cfg(test)]
pub(crate) mod test_support;
