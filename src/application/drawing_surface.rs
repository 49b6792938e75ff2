// Drawing surface trait - the graphics primitives the renderer drives
use crate::domain::scene::{AxisElement, FrameElement, LegendEntry, LineElement};

/// Retained drawing surface. Lines are keyed by category so the renderer can
/// add, update and remove them individually.
pub trait DrawingSurface {
    /// Draw title, axis labels and outer frame. Called once.
    fn draw_frame(&mut self, frame: &FrameElement);

    /// Replace the axis of the same kind.
    fn draw_axis(&mut self, axis: &AxisElement);

    /// Add a new line and return the id of its visual element.
    fn insert_line(&mut self, key: &str, line: &LineElement) -> u64;

    /// Update an existing line in place, keeping its element id.
    fn update_line(&mut self, key: &str, line: &LineElement);

    fn remove_line(&mut self, key: &str);

    /// Reorder lines to follow `keys`. Every drawn line appears in `keys`.
    fn arrange_lines(&mut self, keys: &[&str]);

    fn clear_legend(&mut self);

    fn push_legend_entry(&mut self, entry: &LegendEntry);
}
