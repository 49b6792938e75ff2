// Scene domain model - backend-independent visual elements
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interpolation {
    #[default]
    Linear,
    /// Catmull-Rom spline through every point.
    Smooth,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineElement {
    pub color: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub label: String,
    pub color: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AxisKind {
    Bottom,
    Left,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub position: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AxisElement {
    pub kind: AxisKind,
    /// Offset of the axis line from the plot origin, perpendicular to it.
    pub offset: f64,
    pub extent: (f64, f64),
    pub ticks: Vec<Tick>,
}

/// Static chart furniture: outer size, margins, title and axis labels.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameElement {
    pub width: f64,
    pub height: f64,
    pub margin: Margin,
    pub title: Vec<String>,
    pub x_label: String,
    pub y_label: String,
}

impl FrameElement {
    pub fn inner_width(&self) -> f64 {
        self.width - self.margin.left - self.margin.right
    }

    pub fn inner_height(&self) -> f64 {
        self.height - self.margin.top - self.margin.bottom
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct Margin {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Default for Margin {
    fn default() -> Self {
        Self {
            top: 110.0,
            right: 30.0,
            bottom: 60.0,
            left: 70.0,
        }
    }
}

/// Build SVG path data through `points`, already in pixel space.
pub fn line_path(points: &[(f64, f64)], interpolation: Interpolation) -> String {
    let Some((first, rest)) = points.split_first() else {
        return String::new();
    };

    let mut d = format!("M{:.2},{:.2}", first.0, first.1);
    match interpolation {
        Interpolation::Linear => {
            for (x, y) in rest {
                d.push_str(&format!("L{:.2},{:.2}", x, y));
            }
        }
        Interpolation::Smooth => {
            for i in 0..rest.len() {
                let p0 = points[i.saturating_sub(1)];
                let p1 = points[i];
                let p2 = points[i + 1];
                let p3 = points[(i + 2).min(points.len() - 1)];

                let c1 = (p1.0 + (p2.0 - p0.0) / 6.0, p1.1 + (p2.1 - p0.1) / 6.0);
                let c2 = (p2.0 - (p3.0 - p1.0) / 6.0, p2.1 - (p3.1 - p1.1) / 6.0);
                d.push_str(&format!(
                    "C{:.2},{:.2},{:.2},{:.2},{:.2},{:.2}",
                    c1.0, c1.1, c2.0, c2.1, p2.0, p2.1
                ));
            }
        }
    }
    d
}
