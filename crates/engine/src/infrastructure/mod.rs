//! External dependency boundaries: port traits and in-process adapters.

pub mod ports;

mod dice;
mod notify;

pub use dice::RngDiceRoller;
pub use notify::TracingNotifier;
