// SVG drawing surface - retained elements serialized to an SVG document
use crate::application::drawing_surface::DrawingSurface;
use crate::domain::scene::{AxisElement, AxisKind, FrameElement, LegendEntry, LineElement};
use anyhow::Context;
use std::fmt::Write as _;
use std::path::Path;

const TICK_SIZE: f64 = 6.0;
const TICK_FONT_SIZE: u32 = 13;

#[derive(Debug, Clone, PartialEq)]
pub struct SvgLine {
    pub key: String,
    pub id: u64,
    pub line: LineElement,
}

#[derive(Debug, Default)]
pub struct SvgSurface {
    frame: Option<FrameElement>,
    bottom_axis: Option<AxisElement>,
    left_axis: Option<AxisElement>,
    lines: Vec<SvgLine>,
    legend: Vec<LegendEntry>,
    next_id: u64,
}

impl SvgSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[SvgLine] {
        &self.lines
    }

    pub fn legend(&self) -> &[LegendEntry] {
        &self.legend
    }

    #[cfg(test)]
    pub fn line(&self, key: &str) -> Option<&SvgLine> {
        self.lines.iter().find(|l| l.key == key)
    }

    /// Serialize the current scene.
    pub fn document(&self) -> String {
        let Some(frame) = &self.frame else {
            return String::from("<svg xmlns=\"http://www.w3.org/2000/svg\"></svg>\n");
        };

        let mut out = open_document(frame);
        for l in &self.lines {
            let _ = writeln!(
                out,
                r#"    <path id="line-{}" class="line" data-category="{}" d="{}" style="stroke: {}; fill: none; stroke-width: 2"/>"#,
                l.id,
                escape(&l.key),
                l.line.path,
                escape(&l.line.color)
            );
        }
        for axis in [&self.bottom_axis, &self.left_axis].into_iter().flatten() {
            write_axis(&mut out, axis);
        }
        write_labels(&mut out, frame);
        for entry in &self.legend {
            let _ = writeln!(
                out,
                r#"    <g class="legend" transform="translate({},{})"><rect x="10" width="10" height="10" style="fill: {}"/><text class="legend" x="30" y="10" text-anchor="start" style="font-size: {}px">{}</text></g>"#,
                fmt_num(entry.x),
                fmt_num(entry.y),
                escape(&entry.color),
                TICK_FONT_SIZE,
                escape(&entry.label)
            );
        }
        close_document(out)
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.lines.iter().position(|l| l.key == key)
    }
}

impl DrawingSurface for SvgSurface {
    fn draw_frame(&mut self, frame: &FrameElement) {
        self.frame = Some(frame.clone());
    }

    fn draw_axis(&mut self, axis: &AxisElement) {
        match axis.kind {
            AxisKind::Bottom => self.bottom_axis = Some(axis.clone()),
            AxisKind::Left => self.left_axis = Some(axis.clone()),
        }
    }

    fn insert_line(&mut self, key: &str, line: &LineElement) -> u64 {
        self.next_id += 1;
        let id = self.next_id;
        match self.position(key) {
            Some(i) => self.lines[i] = SvgLine { key: key.to_string(), id, line: line.clone() },
            None => self.lines.push(SvgLine { key: key.to_string(), id, line: line.clone() }),
        }
        id
    }

    fn update_line(&mut self, key: &str, line: &LineElement) {
        match self.position(key) {
            Some(i) => self.lines[i].line = line.clone(),
            None => {
                tracing::warn!("Update for undrawn line {:?}, inserting", key);
                self.insert_line(key, line);
            }
        }
    }

    fn remove_line(&mut self, key: &str) {
        self.lines.retain(|l| l.key != key);
    }

    fn arrange_lines(&mut self, keys: &[&str]) {
        self.lines
            .sort_by_key(|l| keys.iter().position(|k| *k == l.key).unwrap_or(usize::MAX));
    }

    fn clear_legend(&mut self) {
        self.legend.clear();
    }

    fn push_legend_entry(&mut self, entry: &LegendEntry) {
        self.legend.push(entry.clone());
    }
}

/// Frame plus a centered message, for when no chart can be drawn.
pub fn empty_state_document(frame: &FrameElement, message: &str) -> String {
    let mut out = open_document(frame);
    write_labels(&mut out, frame);
    let _ = writeln!(
        out,
        r#"    <text class="empty-state" x="{}" y="{}" text-anchor="middle" style="font-size: 16px">{}</text>"#,
        fmt_num(frame.inner_width() / 2.0),
        fmt_num(frame.inner_height() / 2.0),
        escape(message)
    );
    close_document(out)
}

pub async fn write_document(path: &Path, document: &str) -> anyhow::Result<()> {
    tokio::fs::write(path, document)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

fn open_document(frame: &FrameElement) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}">"#,
        fmt_num(frame.width),
        fmt_num(frame.height)
    );
    let _ = writeln!(
        out,
        r#"  <g transform="translate({},{})">"#,
        fmt_num(frame.margin.left),
        fmt_num(frame.margin.top)
    );
    out
}

fn close_document(mut out: String) -> String {
    out.push_str("  </g>\n</svg>\n");
    out
}

fn write_axis(out: &mut String, axis: &AxisElement) {
    let (r0, r1) = axis.extent;
    match axis.kind {
        AxisKind::Bottom => {
            let _ = writeln!(
                out,
                r#"    <g class="x-axis" transform="translate(0,{})" fill="none" font-size="10" text-anchor="middle">"#,
                fmt_num(axis.offset)
            );
            let _ = writeln!(
                out,
                r#"      <path class="domain" stroke="currentColor" d="M{},{}V0H{}V{}"/>"#,
                fmt_num(r0),
                TICK_SIZE,
                fmt_num(r1),
                TICK_SIZE
            );
            for tick in &axis.ticks {
                let _ = writeln!(
                    out,
                    r#"      <g class="tick" transform="translate({},0)"><line stroke="currentColor" y2="{}"/><text fill="currentColor" y="{}" dy="0.71em" style="font-size: {}px">{}</text></g>"#,
                    fmt_num(tick.position),
                    TICK_SIZE,
                    TICK_SIZE + 3.0,
                    TICK_FONT_SIZE,
                    escape(&tick.label)
                );
            }
        }
        AxisKind::Left => {
            let _ = writeln!(
                out,
                r#"    <g class="y-axis" transform="translate({},0)" fill="none" font-size="10" text-anchor="end">"#,
                fmt_num(axis.offset)
            );
            let _ = writeln!(
                out,
                r#"      <path class="domain" stroke="currentColor" d="M-{},{}H0V{}H-{}"/>"#,
                TICK_SIZE,
                fmt_num(r0),
                fmt_num(r1),
                TICK_SIZE
            );
            for tick in &axis.ticks {
                let _ = writeln!(
                    out,
                    r#"      <g class="tick" transform="translate(0,{})"><line stroke="currentColor" x2="-{}"/><text fill="currentColor" x="-{}" dy="0.32em" style="font-size: {}px">{}</text></g>"#,
                    fmt_num(tick.position),
                    TICK_SIZE,
                    TICK_SIZE + 3.0,
                    TICK_FONT_SIZE,
                    escape(&tick.label)
                );
            }
        }
    }
    out.push_str("    </g>\n");
}

fn write_labels(out: &mut String, frame: &FrameElement) {
    let (w, h, m) = (frame.inner_width(), frame.inner_height(), frame.margin);

    let _ = write!(
        out,
        r#"    <text class="title" x="{}" y="{}" text-anchor="middle" style="font-size: 20px; font-weight: bold">"#,
        fmt_num(w / 2.0),
        fmt_num(-m.top / 2.0 - 30.0)
    );
    for (i, line) in frame.title.iter().enumerate() {
        let dy = if i == 0 { "0" } else { "1.2em" };
        let _ = write!(
            out,
            r#"<tspan x="{}" dy="{}">{}</tspan>"#,
            fmt_num(w / 2.0),
            dy,
            escape(line)
        );
    }
    out.push_str("</text>\n");

    let _ = writeln!(
        out,
        r#"    <text class="axis-label" x="{}" y="{}" text-anchor="middle">{}</text>"#,
        fmt_num(w / 2.0),
        fmt_num(h + m.bottom - 10.0),
        escape(&frame.x_label)
    );
    let _ = writeln!(
        out,
        r#"    <text class="axis-label" transform="rotate(-90)" x="{}" y="{}" text-anchor="middle">{}</text>"#,
        fmt_num(-h / 2.0),
        fmt_num(-m.left / 2.0 - 10.0),
        escape(&frame.y_label)
    );
}

fn fmt_num(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{:.0}", v)
    } else {
        format!("{:.2}", v)
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
