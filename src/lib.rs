// Library exports for dualplot

pub mod csv_reader;
pub mod dataset;
pub mod error;
pub mod logging;
pub mod provider;
pub mod selection;

// Chart configuration
pub mod compiler;
pub mod config;
pub mod ir;
pub mod palette;
pub mod scale;
pub mod tooltip;

// Interaction
pub mod crosshair;
pub mod registry;
pub mod session;

// Rendering
pub mod graph;
