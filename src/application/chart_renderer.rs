// Chart renderer - keyed reconciliation of lines, axes and legend
use crate::application::drawing_surface::DrawingSurface;
use crate::domain::scale::ScaleSet;
use crate::domain::scene::{
    AxisElement, AxisKind, FrameElement, Interpolation, LegendEntry, LineElement, Tick, line_path,
};
use crate::domain::series::Dataset;
use std::collections::{HashMap, HashSet};

/// Rendering options that stay fixed for the chart's lifetime.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub time_tick_count: usize,
    pub date_format: String,
    pub legend_right_inset: f64,
    pub legend_spacing: f64,
    pub legend_base_offset: f64,
    pub interpolation: Interpolation,
    pub max_points_per_line: Option<usize>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            time_tick_count: 5,
            date_format: "%b %d".to_string(),
            legend_right_inset: 150.0,
            legend_spacing: 20.0,
            legend_base_offset: -30.0,
            interpolation: Interpolation::Linear,
            max_points_per_line: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct RenderedSeries {
    element_id: u64,
    color: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub entered: usize,
    pub updated: usize,
    pub exited: usize,
}

pub struct ChartRenderer<S: DrawingSurface> {
    surface: S,
    dataset: Dataset,
    scales: ScaleSet,
    options: RenderOptions,
    inner_width: f64,
    inner_height: f64,
    rendered: HashMap<String, RenderedSeries>,
    order: Vec<String>,
}

impl<S: DrawingSurface> ChartRenderer<S> {
    /// Take ownership of the surface and draw the static frame. Only a
    /// successfully built scale set can reach this point, so every later
    /// `render` works against valid domains.
    pub fn new(
        mut surface: S,
        dataset: Dataset,
        scales: ScaleSet,
        frame: FrameElement,
        options: RenderOptions,
    ) -> Self {
        surface.draw_frame(&frame);
        Self {
            surface,
            dataset,
            scales,
            options,
            inner_width: frame.inner_width(),
            inner_height: frame.inner_height(),
            rendered: HashMap::new(),
            order: Vec::new(),
        }
    }

    pub fn categories(&self) -> &[String] {
        self.dataset.categories()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Keys currently drawn, in draw order.
    pub fn rendered_keys(&self) -> &[String] {
        &self.order
    }

    /// Make the chart show exactly `selected`, in that order.
    ///
    /// Unknown keys and repeated keys are ignored. Calling this twice with
    /// the same selection leaves the surface unchanged.
    pub fn render(&mut self, selected: &[String]) -> RenderStats {
        let mut stats = RenderStats::default();
        let mut seen = HashSet::new();
        let mut visible: Vec<&str> = Vec::with_capacity(selected.len());

        for key in selected {
            if self.dataset.series(key).is_none() {
                tracing::debug!("Ignoring unknown category {:?}", key);
                continue;
            }
            if seen.insert(key.as_str()) {
                visible.push(key.as_str());
            }
        }

        // exit
        let stale: Vec<String> = self
            .rendered
            .keys()
            .filter(|k| !seen.contains(k.as_str()))
            .cloned()
            .collect();
        for key in stale {
            self.surface.remove_line(&key);
            self.rendered.remove(&key);
            stats.exited += 1;
        }

        // enter + update
        for key in &visible {
            let line = self.line_for(key);
            match self.rendered.get_mut(*key) {
                Some(existing) => {
                    self.surface.update_line(key, &line);
                    existing.color = line.color;
                    stats.updated += 1;
                }
                None => {
                    let element_id = self.surface.insert_line(key, &line);
                    let color = line.color;
                    self.rendered
                        .insert(key.to_string(), RenderedSeries { element_id, color });
                    stats.entered += 1;
                }
            }
        }
        self.surface.arrange_lines(&visible);
        self.order = visible.iter().map(|k| k.to_string()).collect();

        self.draw_axes();
        self.draw_legend(&visible);

        tracing::debug!(
            "Rendered {} series (entered {}, updated {}, exited {})",
            visible.len(),
            stats.entered,
            stats.updated,
            stats.exited
        );
        stats
    }

    /// Element id of a drawn line, stable for as long as it stays selected.
    #[cfg(test)]
    pub fn element_id(&self, key: &str) -> Option<u64> {
        self.rendered.get(key).map(|r| r.element_id)
    }

    fn color(&self, key: &str) -> String {
        self.scales.color.color(key).unwrap_or("currentColor").to_string()
    }

    fn line_for(&self, key: &str) -> LineElement {
        let points = match (self.dataset.series(key), self.options.max_points_per_line) {
            (Some(series), Some(max)) => series.downsampled(max),
            (Some(series), None) => series.points.clone(),
            (None, _) => Vec::new(),
        };
        let pixels: Vec<(f64, f64)> = points
            .iter()
            .map(|p| (self.scales.time.map(p.timestamp), self.scales.value.map(p.value)))
            .collect();

        LineElement {
            color: self.color(key),
            path: line_path(&pixels, self.options.interpolation),
        }
    }

    fn draw_axes(&mut self) {
        let time_ticks = self
            .scales
            .time
            .ticks(self.options.time_tick_count)
            .into_iter()
            .map(|t| Tick {
                position: self.scales.time.map(t),
                label: t.format(&self.options.date_format).to_string(),
            })
            .collect();
        self.surface.draw_axis(&AxisElement {
            kind: AxisKind::Bottom,
            offset: self.inner_height,
            extent: self.scales.time.range(),
            ticks: time_ticks,
        });

        let value_ticks = self
            .scales
            .value_ticks()
            .into_iter()
            .map(|v| Tick {
                position: self.scales.value.map(v),
                label: format_value(v),
            })
            .collect();
        self.surface.draw_axis(&AxisElement {
            kind: AxisKind::Left,
            offset: 0.0,
            extent: self.scales.value.range(),
            ticks: value_ticks,
        });
    }

    fn draw_legend(&mut self, visible: &[&str]) {
        self.surface.clear_legend();
        for (i, key) in visible.iter().enumerate() {
            let color = match self.rendered.get(*key) {
                Some(r) => r.color.clone(),
                None => self.color(key),
            };
            let entry = LegendEntry {
                label: key.to_string(),
                color,
                x: self.inner_width - self.options.legend_right_inset,
                y: i as f64 * self.options.legend_spacing + self.options.legend_base_offset,
            };
            self.surface.push_legend_entry(&entry);
        }
    }
}

fn format_value(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{:.0}", v)
    } else {
        let s = format!("{:.6}", v);
        s.trim_end_matches('0').to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::Record;
    use crate::domain::scale::ScaleBuilder;
    use crate::domain::scene::Margin;
    use crate::domain::series::SeriesGrouper;
    use chrono::{TimeZone, Utc};

    /// Surface that keeps a log of every call on top of its visible state.
    #[derive(Default)]
    pub(super) struct RecordingSurface {
        pub(super) frames: usize,
        next_id: u64,
        pub(super) lines: Vec<(String, u64, LineElement)>,
        axes: HashMap<AxisKind, AxisElement>,
        pub(super) legend: Vec<LegendEntry>,
        calls: Vec<String>,
    }

    impl DrawingSurface for RecordingSurface {
        fn draw_frame(&mut self, _frame: &FrameElement) {
            self.frames += 1;
        }

        fn draw_axis(&mut self, axis: &AxisElement) {
            self.axes.insert(axis.kind, axis.clone());
        }

        fn insert_line(&mut self, key: &str, line: &LineElement) -> u64 {
            self.next_id += 1;
            self.lines.push((key.to_string(), self.next_id, line.clone()));
            self.calls.push(format!("insert {key}"));
            self.next_id
        }

        fn update_line(&mut self, key: &str, line: &LineElement) {
            if let Some(entry) = self.lines.iter_mut().find(|(k, _, _)| k == key) {
                entry.2 = line.clone();
            }
            self.calls.push(format!("update {key}"));
        }

        fn remove_line(&mut self, key: &str) {
            self.lines.retain(|(k, _, _)| k != key);
            self.calls.push(format!("remove {key}"));
        }

        fn arrange_lines(&mut self, keys: &[&str]) {
            self.lines
                .sort_by_key(|(k, _, _)| keys.iter().position(|key| *key == k.as_str()));
        }

        fn clear_legend(&mut self) {
            self.legend.clear();
        }

        fn push_legend_entry(&mut self, entry: &LegendEntry) {
            self.legend.push(entry.clone());
        }
    }

    pub(super) const CITIES: [&str; 4] = ["Charlotte, NC", "Indianapolis, IN", "Philadelphia, PA", "Phoenix, AZ"];

    pub(super) fn renderer() -> ChartRenderer<RecordingSurface> {
        let mut records = Vec::new();
        for (i, city) in CITIES.iter().enumerate() {
            for day in 1..=3 {
                records.push(Record {
                    category: city.to_string(),
                    timestamp: Utc.with_ymd_and_hms(2014, 7, day, 0, 0, 0).unwrap(),
                    value: (i * 10 + day as usize) as f64,
                });
            }
        }
        let dataset = SeriesGrouper::group(records);
        let scales = ScaleBuilder::build(&dataset, 600.0, 330.0, &[]).unwrap();
        let frame = FrameElement {
            width: 700.0,
            height: 500.0,
            margin: Margin::default(),
            title: vec!["Title".to_string()],
            x_label: "x".to_string(),
            y_label: "y".to_string(),
        };
        ChartRenderer::new(
            RecordingSurface::default(),
            dataset,
            scales,
            frame,
            RenderOptions::default(),
        )
    }

    fn sel(keys: &[&str]) -> Vec<String> {
        keys.iter().map(|k| k.to_string()).collect()
    }

    pub(super) fn line_keys(r: &ChartRenderer<RecordingSurface>) -> Vec<String> {
        r.surface().lines.iter().map(|(k, _, _)| k.clone()).collect()
    }

    pub(super) fn legend_labels(r: &ChartRenderer<RecordingSurface>) -> Vec<String> {
        r.surface().legend.iter().map(|e| e.label.clone()).collect()
    }

    #[test]
    fn test_render_follows_a_selection_session() {
        let mut r = renderer();
        let sequence: Vec<Vec<&str>> = vec![
            vec!["Phoenix, AZ", "Philadelphia, PA"],
            vec!["Philadelphia, PA"],
            vec![],
            vec!["Charlotte, NC", "Phoenix, AZ", "Indianapolis, IN"],
            vec!["Charlotte, NC", "Phoenix, AZ", "Indianapolis, IN"],
            vec!["Indianapolis, IN", "Charlotte, NC"],
            CITIES.to_vec(),
            vec![],
            vec![],
        ];

        for selection in sequence {
            r.render(&sel(&selection));
            let expected = sel(&selection);
            assert_eq!(line_keys(&r), expected);
            assert_eq!(legend_labels(&r), expected);
            assert_eq!(r.rendered_keys(), expected.as_slice());
        }
        assert_eq!(r.surface().frames, 1);
    }

    #[test]
    fn test_deselect_keeps_color_and_element() {
        let mut r = renderer();
        r.render(&sel(&["Phoenix, AZ", "Philadelphia, PA"]));
        let id_before = r.element_id("Philadelphia, PA").unwrap();
        let color_before = r.surface().legend[1].color.clone();

        let stats = r.render(&sel(&["Philadelphia, PA"]));

        assert_eq!(stats, RenderStats { entered: 0, updated: 1, exited: 1 });
        assert_eq!(r.surface().lines.len(), 1);
        assert_eq!(r.surface().legend.len(), 1);
        assert_eq!(r.surface().lines[0].2.color, color_before);
        assert_eq!(r.surface().legend[0].color, color_before);
        assert_eq!(r.element_id("Philadelphia, PA"), Some(id_before));
        assert_eq!(r.element_id("Phoenix, AZ"), None);
    }

    #[test]
    fn test_render_is_idempotent() {
        let mut r = renderer();
        let selection = sel(&["Phoenix, AZ", "Charlotte, NC"]);
        r.render(&selection);
        let lines = r.surface().lines.clone();
        let legend = r.surface().legend.clone();
        let axes = r.surface().axes.clone();

        let stats = r.render(&selection);

        assert_eq!(stats, RenderStats { entered: 0, updated: 2, exited: 0 });
        assert_eq!(r.surface().lines, lines);
        assert_eq!(r.surface().legend, legend);
        assert_eq!(r.surface().axes, axes);
    }

    #[test]
    fn test_unknown_and_duplicate_keys_are_ignored() {
        let mut r = renderer();
        let stats = r.render(&sel(&["Atlantis", "Phoenix, AZ", "Phoenix, AZ"]));

        assert_eq!(stats.entered, 1);
        assert_eq!(line_keys(&r), sel(&["Phoenix, AZ"]));
        assert_eq!(legend_labels(&r), sel(&["Phoenix, AZ"]));
    }

    #[test]
    fn test_empty_selection_draws_axes_only() {
        let mut r = renderer();
        r.render(&[]);

        assert!(r.surface().lines.is_empty());
        assert!(r.surface().legend.is_empty());
        assert_eq!(r.surface().axes.len(), 2);
    }

    #[test]
    fn test_axes_do_not_rescale_with_selection() {
        let mut r = renderer();
        r.render(&sel(&["Charlotte, NC"]));
        let axes = r.surface().axes.clone();

        r.render(&sel(&["Phoenix, AZ"]));

        assert_eq!(r.surface().axes, axes);
        let bottom = &axes[&AxisKind::Bottom];
        assert_eq!(bottom.offset, 330.0);
        assert_eq!(bottom.ticks[0].label, "Jul 01");
    }

    #[test]
    fn test_legend_positions_follow_selection_order() {
        let mut r = renderer();
        r.render(&sel(&["Phoenix, AZ", "Charlotte, NC", "Indianapolis, IN"]));

        let legend = &r.surface().legend;
        let offsets: Vec<f64> = legend.iter().map(|e| e.y).collect();
        assert_eq!(offsets, vec![-30.0, -10.0, 10.0]);
        assert!(legend.iter().all(|e| e.x == 450.0));
        assert_eq!(legend[0].color, "#e78ac3");
    }

    #[test]
    fn test_only_changed_keys_are_inserted_or_removed() {
        let mut r = renderer();
        r.render(&sel(&["Phoenix, AZ", "Charlotte, NC"]));
        r.surface.calls.clear();

        r.render(&sel(&["Charlotte, NC", "Indianapolis, IN"]));

        let calls = &r.surface().calls;
        assert!(calls.contains(&"remove Phoenix, AZ".to_string()));
        assert!(calls.contains(&"insert Indianapolis, IN".to_string()));
        assert!(calls.contains(&"update Charlotte, NC".to_string()));
        assert!(!calls.contains(&"insert Charlotte, NC".to_string()));
    }

    #[test]
    fn test_line_geometry_uses_full_dataset_scales() {
        let mut r = renderer();
        r.render(&sel(&["Charlotte, NC"]));

        // values 1..=3 sit near the bottom of the [-2.2, 36.2] domain
        let path = &r.surface().lines[0].2.path;
        assert!(path.starts_with("M0.00,"));
        assert_eq!(path.matches('L').count(), 2);
        assert!(path.contains("L600.00,"));
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(20.0), "20");
        assert_eq!(format_value(-5.0), "-5");
        assert_eq!(format_value(0.5), "0.5");
    }
}

#[cfg(test)]
mod proptest_render {
    use super::tests::{CITIES, legend_labels, line_keys, renderer};
    use proptest::prelude::*;

    /// Indices past the known cities stand for labels missing from the data.
    fn label(i: usize) -> String {
        match CITIES.get(i) {
            Some(city) => city.to_string(),
            None => format!("Nowhere {i}"),
        }
    }

    proptest! {
        #[test]
        fn test_render_matches_selection_for_any_sequence(
            sequence in prop::collection::vec(prop::collection::vec(0usize..6, 0..8), 1..12)
        ) {
            let mut r = renderer();
            for picks in sequence {
                let selection: Vec<String> = picks.iter().map(|i| label(*i)).collect();
                let mut expected: Vec<String> = Vec::new();
                for key in &selection {
                    if CITIES.contains(&key.as_str()) && !expected.contains(key) {
                        expected.push(key.clone());
                    }
                }

                r.render(&selection);

                prop_assert_eq!(line_keys(&r), expected.clone());
                prop_assert_eq!(legend_labels(&r), expected.clone());
                prop_assert_eq!(r.rendered_keys(), expected.as_slice());
                for ((key, _, line), entry) in r.surface().lines.iter().zip(&r.surface().legend) {
                    let color = r.scales.color.color(key).unwrap();
                    prop_assert_eq!(line.color.as_str(), color);
                    prop_assert_eq!(entry.color.as_str(), color);
                }
            }
            prop_assert_eq!(r.surface().frames, 1);
        }
    }
}
