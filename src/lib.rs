pub mod browser;
pub mod cli;
pub mod explorer;
pub mod model;
pub mod statechart;
pub mod trace;
