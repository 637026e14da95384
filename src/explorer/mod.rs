pub mod config;
pub mod context;
pub mod equivalence;
pub mod explorer;
pub mod gate;
pub mod registry;
