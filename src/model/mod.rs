pub mod events;
pub mod listener;
pub mod snapshot;
pub mod state;
