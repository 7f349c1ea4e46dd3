//! Time effect handlers

mod simulated;
mod system;

pub use simulated::SimulatedTimeHandler;
pub use system::SystemClockHandler;
