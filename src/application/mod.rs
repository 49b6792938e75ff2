// Application layer - Use cases and the ports they drive
pub mod chart_renderer;
pub mod dataset_service;
pub mod dataset_source;
pub mod drawing_surface;
pub mod selection_controller;
