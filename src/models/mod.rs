//! Core data models for the delivery tracker.

mod account;
mod calendar;
mod delivery;
mod order;
mod spend;

pub use account::*;
pub use calendar::*;
pub use delivery::*;
pub use order::*;
pub use spend::*;
