//! Stateless rendering of a play diagram.
//!
//! `project` turns markers and paths into a `DiagramScene`; the scene is then
//! drawn either into a terminal buffer (`PlayDiagram`) or into an SVG
//! document (`render_svg`). Nothing here mutates play data.

use std::fmt::Write as _;

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::Span;
use ratatui::widgets::canvas::{Canvas, Circle, Context, Line as CanvasLine};
use ratatui::widgets::{Block, Widget};

use crate::play::{FIELD_MAX, FieldPoint, MarkerKind, PlayerMarker, PlayerPath};

pub const YARD_LINES: [f64; 9] = [10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0];

// Terminal canvas dash pattern, in field units.
const CANVAS_DASH: f64 = 3.0;
const CANVAS_GAP: f64 = 2.0;
const CANVAS_TOKEN_RADIUS: f64 = 2.5;

// SVG styling, in pixels.
const SVG_TOKEN_RADIUS: f64 = 16.0;
const SVG_DASH: &str = "4 4";
const SVG_FIELD_FILL: &str = "#1f4d2b";
const SVG_YARD_LINE: &str = "rgba(255,255,255,0.2)";
const SVG_PATH_STROKE: &str = "yellow";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrokeStyle {
    /// Committed route.
    Dashed,
    /// Route still being drawn.
    Solid,
}

impl StrokeStyle {
    pub fn width(self) -> f64 {
        match self {
            StrokeStyle::Dashed => 2.0,
            StrokeStyle::Solid => 2.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub marker_id: String,
    pub label: String,
    pub kind: MarkerKind,
    pub at: FieldPoint,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    pub marker_id: String,
    pub points: Vec<FieldPoint>,
    pub stroke: StrokeStyle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiagramScene {
    pub yard_lines: Vec<f64>,
    pub polylines: Vec<Polyline>,
    pub tokens: Vec<Token>,
}

pub fn project(
    markers: &[PlayerMarker],
    paths: &[PlayerPath],
    active_path: Option<&PlayerPath>,
) -> DiagramScene {
    let mut polylines: Vec<Polyline> = paths
        .iter()
        .map(|path| Polyline {
            marker_id: path.marker_id.clone(),
            points: path.points.clone(),
            stroke: StrokeStyle::Dashed,
        })
        .collect();
    if let Some(active) = active_path {
        polylines.push(Polyline {
            marker_id: active.marker_id.clone(),
            points: active.points.clone(),
            stroke: StrokeStyle::Solid,
        });
    }

    let tokens = markers
        .iter()
        .map(|marker| Token {
            marker_id: marker.id.clone(),
            label: marker.label.clone(),
            kind: marker.kind,
            at: marker.position(),
        })
        .collect();

    DiagramScene {
        yard_lines: YARD_LINES.to_vec(),
        polylines,
        tokens,
    }
}

/// Splits a polyline into the visible pieces of a dash pattern. The pattern
/// phase carries across vertices so corners do not restart the dash.
pub fn dash_segments(points: &[FieldPoint], dash: f64, gap: f64) -> Vec<(FieldPoint, FieldPoint)> {
    let mut segments = Vec::new();
    if dash <= 0.0 {
        return segments;
    }
    if gap <= 0.0 {
        for pair in points.windows(2) {
            segments.push((pair[0], pair[1]));
        }
        return segments;
    }

    let period = dash + gap;
    let mut phase = 0.0;
    for pair in points.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let len = (b.x - a.x).hypot(b.y - a.y);
        if len <= f64::EPSILON {
            continue;
        }
        let mut t = 0.0;
        while t < len {
            let in_dash = phase < dash;
            let left_in_state = if in_dash { dash - phase } else { period - phase };
            let step = left_in_state.min(len - t);
            if in_dash {
                segments.push((lerp(a, b, t / len), lerp(a, b, (t + step) / len)));
            }
            t += step;
            phase += step;
            if phase >= period - 1e-9 {
                phase = 0.0;
            }
        }
    }
    segments
}

fn lerp(a: FieldPoint, b: FieldPoint, t: f64) -> FieldPoint {
    FieldPoint::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
}

pub fn marker_color(kind: MarkerKind) -> Color {
    match kind {
        MarkerKind::Offense => Color::Blue,
        MarkerKind::Defense => Color::Red,
    }
}

/// Where a press landed inside the field, in cells relative to the field's
/// top-left corner, together with the field size in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldPress {
    pub column: u16,
    pub row: u16,
    pub width: u16,
    pub height: u16,
}

/// Terminal widget for a play diagram.
pub struct PlayDiagram<'a> {
    markers: &'a [PlayerMarker],
    paths: &'a [PlayerPath],
    active_path: Option<&'a PlayerPath>,
    block: Option<Block<'a>>,
    on_pointer_down: Option<&'a dyn Fn(FieldPress)>,
}

impl<'a> PlayDiagram<'a> {
    pub fn new(markers: &'a [PlayerMarker], paths: &'a [PlayerPath]) -> Self {
        Self {
            markers,
            paths,
            active_path: None,
            block: None,
            on_pointer_down: None,
        }
    }

    pub fn active_path(mut self, path: Option<&'a PlayerPath>) -> Self {
        self.active_path = path;
        self
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    pub fn on_pointer_down(mut self, handler: &'a dyn Fn(FieldPress)) -> Self {
        self.on_pointer_down = Some(handler);
        self
    }

    pub fn scene(&self) -> DiagramScene {
        project(self.markers, self.paths, self.active_path)
    }

    /// The area the field occupies once the optional block is drawn.
    pub fn field_area(&self, area: Rect) -> Rect {
        match &self.block {
            Some(block) => block.inner(area),
            None => area,
        }
    }

    /// Reports a raw press at terminal `(column, row)`. Presses outside the
    /// field are dropped. The press is not interpreted in any way.
    pub fn pointer_down(&self, area: Rect, column: u16, row: u16) -> Option<FieldPress> {
        let press = self.locate(area, column, row)?;
        if let Some(handler) = self.on_pointer_down {
            handler(press);
        }
        Some(press)
    }

    /// Maps a terminal cell to field-relative cells without reporting it.
    pub fn locate(&self, area: Rect, column: u16, row: u16) -> Option<FieldPress> {
        let field = self.field_area(area);
        if field.width == 0 || field.height == 0 {
            return None;
        }
        let inside = column >= field.x
            && column < field.x + field.width
            && row >= field.y
            && row < field.y + field.height;
        if !inside {
            return None;
        }
        Some(FieldPress {
            column: column - field.x,
            row: row - field.y,
            width: field.width,
            height: field.height,
        })
    }
}

impl Widget for PlayDiagram<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let scene = self.scene();
        let mut canvas = Canvas::default()
            .marker(Marker::Braille)
            .background_color(Color::Rgb(20, 60, 32))
            .x_bounds([0.0, FIELD_MAX])
            .y_bounds([0.0, FIELD_MAX])
            .paint(|ctx| paint_scene(ctx, &scene));
        if let Some(block) = self.block {
            canvas = canvas.block(block);
        }
        canvas.render(area, buf);
    }
}

// Canvas y grows upwards, field y grows downwards.
fn canvas_y(y: f64) -> f64 {
    FIELD_MAX - y
}

fn paint_scene(ctx: &mut Context, scene: &DiagramScene) {
    for x in &scene.yard_lines {
        ctx.draw(&CanvasLine {
            x1: *x,
            y1: 0.0,
            x2: *x,
            y2: FIELD_MAX,
            color: Color::DarkGray,
        });
    }
    ctx.layer();

    for line in &scene.polylines {
        let segments = match line.stroke {
            StrokeStyle::Dashed => dash_segments(&line.points, CANVAS_DASH, CANVAS_GAP),
            StrokeStyle::Solid => dash_segments(&line.points, f64::MAX, 0.0),
        };
        let color = match line.stroke {
            StrokeStyle::Dashed => Color::Yellow,
            StrokeStyle::Solid => Color::LightYellow,
        };
        for (a, b) in segments {
            ctx.draw(&CanvasLine {
                x1: a.x,
                y1: canvas_y(a.y),
                x2: b.x,
                y2: canvas_y(b.y),
                color,
            });
        }
    }
    ctx.layer();

    for token in &scene.tokens {
        let color = marker_color(token.kind);
        ctx.draw(&Circle {
            x: token.at.x,
            y: canvas_y(token.at.y),
            radius: CANVAS_TOKEN_RADIUS,
            color,
        });
        let style = Style::default()
            .fg(Color::White)
            .bg(color)
            .add_modifier(Modifier::BOLD);
        ctx.print(token.at.x, canvas_y(token.at.y), Span::styled(token.label.clone(), style));
    }
}

/// Renders the scene as a standalone SVG document of `width` x `height` px.
pub fn render_svg(scene: &DiagramScene, width: u32, height: u32) -> String {
    let w = f64::from(width);
    let h = f64::from(height);
    let px = |p: FieldPoint| (p.x * w / FIELD_MAX, p.y * h / FIELD_MAX);

    let mut out = String::new();
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"#
    );
    let _ = writeln!(
        out,
        r#"  <rect x="0" y="0" width="{width}" height="{height}" fill="{SVG_FIELD_FILL}"/>"#
    );
    for x in &scene.yard_lines {
        let lx = x * w / FIELD_MAX;
        let _ = writeln!(
            out,
            r#"  <line x1="{lx:.1}" y1="0" x2="{lx:.1}" y2="{height}" stroke="{SVG_YARD_LINE}" stroke-width="1"/>"#
        );
    }

    for line in &scene.polylines {
        let points = line
            .points
            .iter()
            .map(|p| {
                let (x, y) = px(*p);
                format!("{x:.1},{y:.1}")
            })
            .collect::<Vec<_>>()
            .join(" ");
        let dash = match line.stroke {
            StrokeStyle::Dashed => format!(r#" stroke-dasharray="{SVG_DASH}""#),
            StrokeStyle::Solid => String::new(),
        };
        let _ = writeln!(
            out,
            r#"  <polyline data-marker="{}" points="{points}" stroke="{SVG_PATH_STROKE}" stroke-width="{}" fill="none"{dash}/>"#,
            escape_xml(&line.marker_id),
            line.stroke.width()
        );
    }

    for token in &scene.tokens {
        let (cx, cy) = px(token.at);
        let (fill, stroke) = match token.kind {
            MarkerKind::Offense => ("#3b82f6", "#93c5fd"),
            MarkerKind::Defense => ("#dc2626", "#fca5a5"),
        };
        let _ = writeln!(
            out,
            r#"  <circle data-marker="{}" class="{}" cx="{cx:.1}" cy="{cy:.1}" r="{SVG_TOKEN_RADIUS}" fill="{fill}" stroke="{stroke}" stroke-width="2"/>"#,
            escape_xml(&token.marker_id),
            token.kind.as_str()
        );
        let _ = writeln!(
            out,
            r#"  <text x="{cx:.1}" y="{cy:.1}" fill="white" font-size="12" font-weight="bold" text-anchor="middle" dominant-baseline="central">{}</text>"#,
            escape_xml(&token.label)
        );
    }

    out.push_str("</svg>\n");
    out
}

fn escape_xml(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dash_segments_alternate_along_a_straight_line() {
        let points = [FieldPoint::new(0.0, 0.0), FieldPoint::new(10.0, 0.0)];
        let segments = dash_segments(&points, 3.0, 2.0);
        // 0-3, 5-8, then a final partial dash from 10.
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].0, FieldPoint::new(0.0, 0.0));
        assert_eq!(segments[0].1, FieldPoint::new(3.0, 0.0));
        assert_eq!(segments[1].0, FieldPoint::new(5.0, 0.0));
        assert_eq!(segments[1].1, FieldPoint::new(8.0, 0.0));
    }

    #[test]
    fn dash_phase_carries_over_corners() {
        let points = [
            FieldPoint::new(0.0, 0.0),
            FieldPoint::new(2.0, 0.0),
            FieldPoint::new(2.0, 4.0),
        ];
        let segments = dash_segments(&points, 3.0, 2.0);
        // First dash is split by the corner: 2 units on x, 1 unit on y.
        assert_eq!(segments[0].1, FieldPoint::new(2.0, 0.0));
        assert_eq!(segments[1].0, FieldPoint::new(2.0, 0.0));
        assert_eq!(segments[1].1, FieldPoint::new(2.0, 1.0));
    }

    #[test]
    fn zero_gap_yields_solid_segments() {
        let points = [
            FieldPoint::new(0.0, 0.0),
            FieldPoint::new(5.0, 5.0),
            FieldPoint::new(9.0, 5.0),
        ];
        assert_eq!(dash_segments(&points, f64::MAX, 0.0).len(), 2);
    }

    #[test]
    fn escape_xml_handles_markup() {
        assert_eq!(escape_xml("<QB & \"WR\">"), "&lt;QB &amp; &quot;WR&quot;&gt;");
    }

    #[test]
    fn pointer_down_translates_relative_to_block_inner_area() {
        use std::cell::Cell;
        use ratatui::widgets::Borders;

        let seen = Cell::new(None);
        let handler = |press: FieldPress| seen.set(Some(press));
        let diagram = PlayDiagram::new(&[], &[])
            .block(Block::default().borders(Borders::ALL))
            .on_pointer_down(&handler);
        let area = Rect::new(10, 5, 22, 12);

        assert_eq!(diagram.pointer_down(area, 10, 5), None);
        let press = diagram.pointer_down(area, 11, 6).expect("inside");
        assert_eq!(
            press,
            FieldPress {
                column: 0,
                row: 0,
                width: 20,
                height: 10
            }
        );
        assert_eq!(seen.get(), Some(press));
    }
}
