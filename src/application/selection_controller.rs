// Selection controller - forwards selection changes to the renderer
use crate::application::chart_renderer::{ChartRenderer, RenderStats};
use crate::application::drawing_surface::DrawingSurface;
use serde::Deserialize;
use std::collections::HashSet;

/// Full set of chosen category labels carried by one change notification.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct SelectionEvent {
    pub labels: Vec<String>,
}

impl SelectionEvent {
    pub fn new(labels: Vec<String>) -> Self {
        Self { labels }
    }
}

pub struct SelectionController<S: DrawingSurface> {
    renderer: ChartRenderer<S>,
}

impl<S: DrawingSurface> SelectionController<S> {
    pub fn new(renderer: ChartRenderer<S>) -> Self {
        Self { renderer }
    }

    /// Values the selection control may offer.
    pub fn options(&self) -> &[String] {
        self.renderer.categories()
    }

    pub fn renderer(&self) -> &ChartRenderer<S> {
        &self.renderer
    }

    /// Render the complete new selection once. First occurrence of a
    /// repeated label wins.
    pub fn handle(&mut self, event: SelectionEvent) -> RenderStats {
        let mut seen = HashSet::new();
        let selected: Vec<String> = event
            .labels
            .into_iter()
            .filter(|label| seen.insert(label.clone()))
            .collect();

        self.renderer.render(&selected)
    }
}
