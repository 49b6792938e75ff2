// Presentation layer - Selection events from the outside world
pub mod selection_input;
