// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod csv_source;
pub mod svg_surface;
