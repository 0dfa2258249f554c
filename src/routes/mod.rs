//! Route handlers — thin parameter parsing over the `game` state modules,
//! one module per API area.

pub mod certificate;
pub mod games;
pub mod progress;
pub mod util;
