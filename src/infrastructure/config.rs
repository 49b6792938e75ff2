use crate::application::chart_renderer::RenderOptions;
use crate::application::dataset_service::MalformedPolicy;
use crate::domain::record::RecordNormalizer;
use crate::domain::scene::{FrameElement, Interpolation, Margin};
use anyhow::bail;
use chrono::format::{Item, StrftimeItems};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ChartConfig {
    #[serde(default)]
    pub dataset: DatasetSettings,
    #[serde(default)]
    pub layout: LayoutSettings,
    #[serde(default)]
    pub axes: AxesSettings,
    #[serde(default)]
    pub legend: LegendSettings,
    #[serde(default)]
    pub style: StyleSettings,
    #[serde(default)]
    pub chart: ChartSettings,
    #[serde(default)]
    pub output: OutputSettings,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DatasetSettings {
    pub path: PathBuf,
    pub date_column: String,
    pub value_column: String,
    pub category_column: String,
    /// chrono patterns tried after RFC 3339
    pub date_formats: Vec<String>,
    pub on_malformed: MalformedPolicy,
}

impl Default for DatasetSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/weather.csv"),
            date_column: "date".to_string(),
            value_column: "actual_mean_temp(C)".to_string(),
            category_column: "city_full".to_string(),
            date_formats: vec!["%Y-%m-%d".to_string(), "%m/%d/%Y".to_string()],
            on_malformed: MalformedPolicy::Skip,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LayoutSettings {
    pub width: f64,
    pub height: f64,
    pub margin: Margin,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            width: 700.0,
            height: 500.0,
            margin: Margin::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AxesSettings {
    pub tick_count: usize,
    pub date_format: String,
}

impl Default for AxesSettings {
    fn default() -> Self {
        Self {
            tick_count: 5,
            date_format: "%b %d".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LegendSettings {
    pub right_inset: f64,
    pub spacing: f64,
    pub base_offset: f64,
}

impl Default for LegendSettings {
    fn default() -> Self {
        Self {
            right_inset: 150.0,
            spacing: 20.0,
            base_offset: -30.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct StyleSettings {
    pub interpolation: Interpolation,
    /// Empty means ColorBrewer Set2
    pub palette: Vec<String>,
    pub max_points_per_line: Option<usize>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ChartSettings {
    pub title: Vec<String>,
    pub x_label: String,
    pub y_label: String,
    /// Format for `${start}` / `${end}` in titles and labels
    pub label_date_format: String,
    pub initial_selection: Vec<String>,
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            title: vec![
                "How U.S. Cities Warm and Cool:".to_string(),
                "A Year of Daily Temperatures (2014–2015)".to_string(),
            ],
            x_label: "Date (${start} - ${end})".to_string(),
            y_label: "Daily Mean Temperature (C)".to_string(),
            label_date_format: "%b %Y".to_string(),
            initial_selection: vec!["Phoenix, AZ".to_string(), "Philadelphia, PA".to_string()],
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OutputSettings {
    pub path: PathBuf,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("chart.svg"),
        }
    }
}

impl ChartConfig {
    pub fn normalizer(&self) -> RecordNormalizer {
        RecordNormalizer::new(
            self.dataset.date_column.clone(),
            self.dataset.value_column.clone(),
            self.dataset.category_column.clone(),
            self.dataset.date_formats.clone(),
        )
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            time_tick_count: self.axes.tick_count,
            date_format: self.axes.date_format.clone(),
            legend_right_inset: self.legend.right_inset,
            legend_spacing: self.legend.spacing,
            legend_base_offset: self.legend.base_offset,
            interpolation: self.style.interpolation,
            max_points_per_line: self.style.max_points_per_line,
        }
    }

    /// Reject chrono patterns that would fail to format at render time.
    pub fn validate(&self) -> anyhow::Result<()> {
        check_date_format("axes.date_format", &self.axes.date_format)?;
        check_date_format("chart.label_date_format", &self.chart.label_date_format)?;
        for fmt in &self.dataset.date_formats {
            check_date_format("dataset.date_formats", fmt)?;
        }
        Ok(())
    }

    /// Frame with every `${var}` in the title and labels filled from `vars`
    pub fn frame(&self, vars: &HashMap<String, String>) -> FrameElement {
        FrameElement {
            width: self.layout.width,
            height: self.layout.height,
            margin: self.layout.margin,
            title: self
                .chart
                .title
                .iter()
                .map(|line| fill_template(line, vars))
                .collect(),
            x_label: fill_template(&self.chart.x_label, vars),
            y_label: fill_template(&self.chart.y_label, vars),
        }
    }

    /// Frame for a chart with no data: there is no time domain to fill the
    /// placeholders from, so they are dropped.
    pub fn empty_frame(&self) -> FrameElement {
        let mut frame = self.frame(&HashMap::new());
        frame.title = frame.title.iter().map(|line| strip_placeholders(line)).collect();
        frame.x_label = strip_placeholders(&frame.x_label);
        frame.y_label = strip_placeholders(&frame.y_label);
        frame
    }
}

/// Layer `<name>.*` (optional) under `CHART_*` environment overrides, e.g.
/// `CHART_DATASET__PATH=other.csv`
pub fn load_chart_config(name: &str) -> anyhow::Result<ChartConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name(name).required(false))
        .add_source(
            config::Environment::with_prefix("CHART")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    let chart: ChartConfig = settings.try_deserialize()?;
    chart.validate()?;
    Ok(chart)
}

fn check_date_format(key: &str, fmt: &str) -> anyhow::Result<()> {
    if StrftimeItems::new(fmt).any(|item| matches!(item, Item::Error)) {
        bail!("Invalid date format {:?} for {}", fmt, key);
    }
    Ok(())
}

/// Replace template variables in a label
pub fn fill_template(template: &str, vars: &HashMap<String, String>) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        let placeholder = format!("${{{}}}", key);
        result = result.replace(&placeholder, value);
    }
    result
}

/// Remove every `${var}` left in a label, then any bracket pair with nothing
/// but punctuation inside.
pub fn strip_placeholders(label: &str) -> String {
    let mut stripped = String::with_capacity(label.len());
    let mut rest = label;
    while let Some(start) = rest.find("${") {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        stripped.push_str(&rest[..start]);
        rest = &rest[start + len + 1..];
    }
    stripped.push_str(rest);

    let mut result = String::with_capacity(stripped.len());
    let mut rest = stripped.as_str();
    while let Some(open) = rest.find('(') {
        let Some(len) = rest[open..].find(')') else {
            break;
        };
        result.push_str(&rest[..open]);
        let group = &rest[open..=open + len];
        if group.chars().any(char::is_alphanumeric) {
            result.push_str(group);
        }
        rest = &rest[open + len + 1..];
    }
    result.push_str(rest);

    result.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_template() {
        let mut vars = HashMap::new();
        vars.insert("start".to_string(), "Jul 2014".to_string());
        vars.insert("end".to_string(), "Jun 2015".to_string());

        let result = fill_template("Date (${start} - ${end}) ${missing}", &vars);

        assert_eq!(result, "Date (Jul 2014 - Jun 2015) ${missing}");
    }

    #[test]
    fn test_defaults_cover_every_section() {
        let config: ChartConfig = toml::from_str("").unwrap();

        assert_eq!(config.layout.width, 700.0);
        assert_eq!(config.layout.margin.top, 110.0);
        assert_eq!(config.dataset.category_column, "city_full");
        assert_eq!(config.dataset.on_malformed, MalformedPolicy::Skip);
        assert_eq!(config.style.interpolation, Interpolation::Linear);
        assert_eq!(config.chart.title.len(), 2);
        assert_eq!(config.output.path, PathBuf::from("chart.svg"));
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let config: ChartConfig = toml::from_str(
            r#"
            [dataset]
            value_column = "max_temp"
            on_malformed = "abort"

            [axes]
            tick_count = 8

            [style]
            interpolation = "smooth"
            palette = ["red", "blue"]
            "#,
        )
        .unwrap();

        assert_eq!(config.dataset.value_column, "max_temp");
        assert_eq!(config.dataset.date_column, "date");
        assert_eq!(config.dataset.on_malformed, MalformedPolicy::Abort);

        let options = config.render_options();
        assert_eq!(options.time_tick_count, 8);
        assert_eq!(options.date_format, "%b %d");
        assert_eq!(options.interpolation, Interpolation::Smooth);
        assert_eq!(config.style.palette, vec!["red", "blue"]);
    }

    #[test]
    fn test_frame_fills_labels() {
        let config = ChartConfig::default();
        let mut vars = HashMap::new();
        vars.insert("start".to_string(), "Jul 2014".to_string());
        vars.insert("end".to_string(), "Jun 2015".to_string());

        let frame = config.frame(&vars);

        assert_eq!(frame.x_label, "Date (Jul 2014 - Jun 2015)");
        assert_eq!(frame.inner_width(), 600.0);
        assert_eq!(frame.inner_height(), 330.0);
    }

    #[test]
    fn test_strip_placeholders() {
        assert_eq!(strip_placeholders("Date (${start} - ${end})"), "Date");
        assert_eq!(strip_placeholders("From ${start} on"), "From on");
        assert_eq!(
            strip_placeholders("A Year of Daily Temperatures (2014–2015)"),
            "A Year of Daily Temperatures (2014–2015)"
        );
        assert_eq!(strip_placeholders("Broken ${start"), "Broken ${start");
    }

    #[test]
    fn test_empty_frame_has_no_raw_placeholders() {
        let frame = ChartConfig::default().empty_frame();

        assert_eq!(frame.x_label, "Date");
        assert_eq!(frame.y_label, "Daily Mean Temperature (C)");
        assert!(frame.title.iter().all(|line| !line.contains("${")));
        assert_eq!(frame.inner_width(), 600.0);
    }

    #[test]
    fn test_bad_date_format_is_rejected() {
        assert!(ChartConfig::default().validate().is_ok());

        let mut config = ChartConfig::default();
        config.axes.date_format = "%Q".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("axes.date_format"));

        let mut config = ChartConfig::default();
        config.chart.label_date_format = "%b %".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_fails_on_bad_date_format() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("chart.toml"), "[axes]\ndate_format = \"%Q\"\n").unwrap();

        let name = dir.path().join("chart");
        let err = load_chart_config(name.to_str().unwrap()).unwrap_err();

        assert!(err.to_string().contains("%Q"));
    }

    #[test]
    fn test_missing_config_file_uses_defaults() {
        let config = load_chart_config("config/does-not-exist").unwrap();
        assert_eq!(config.axes.tick_count, 5);
    }
}
