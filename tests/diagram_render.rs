use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::widgets::{Block, Borders, Widget};

use playbook_terminal::diagram::{PlayDiagram, StrokeStyle, YARD_LINES, project, render_svg};
use playbook_terminal::play::{FieldPoint, MarkerKind, PlayerMarker, PlayerPath};
use playbook_terminal::playbook::sample_plays;

fn buffer_text(buf: &Buffer) -> String {
    let area = buf.area;
    let mut out = String::new();
    for y in area.top()..area.bottom() {
        for x in area.left()..area.right() {
            out.push_str(buf.get(x, y).symbol());
        }
        out.push('\n');
    }
    out
}

#[test]
fn empty_input_projects_only_the_field() {
    let scene = project(&[], &[], None);
    assert_eq!(scene.yard_lines, YARD_LINES.to_vec());
    assert!(scene.polylines.is_empty());
    assert!(scene.tokens.is_empty());

    let svg = render_svg(&scene, 400, 400);
    assert_eq!(svg.matches("<line ").count(), 9);
    assert!(!svg.contains("<circle"));
    assert!(!svg.contains("<polyline"));
}

#[test]
fn committed_paths_are_dashed_and_the_active_path_is_solid() {
    let markers = vec![PlayerMarker::new(
        "wr1",
        MarkerKind::Offense,
        "WR",
        FieldPoint::new(15.0, 60.0),
    )];
    let committed = vec![PlayerPath::new(
        "wr1",
        vec![FieldPoint::new(15.0, 60.0), FieldPoint::new(15.0, 40.0)],
    )];
    let active = PlayerPath::new(
        "wr1",
        vec![FieldPoint::new(15.0, 60.0), FieldPoint::new(35.0, 20.0)],
    );

    let scene = project(&markers, &committed, Some(&active));
    assert_eq!(scene.polylines.len(), 2);
    assert_eq!(scene.polylines[0].stroke, StrokeStyle::Dashed);
    assert_eq!(scene.polylines[1].stroke, StrokeStyle::Solid);
    assert_eq!(StrokeStyle::Dashed.width(), 2.0);
    assert_eq!(StrokeStyle::Solid.width(), 2.5);

    let svg = render_svg(&scene, 500, 500);
    assert_eq!(svg.matches("stroke-dasharray=\"4 4\"").count(), 1);
    assert!(svg.contains("points=\"75.0,300.0 75.0,200.0\""));
    assert!(svg.contains("stroke-width=\"2.5\""));
}

#[test]
fn svg_colors_tokens_by_side() {
    let plays = sample_plays();
    let flood = project(&plays[0].formation_markers, &plays[0].paths, None);
    let svg = render_svg(&flood, 500, 500);
    assert_eq!(svg.matches("class=\"offense\"").count(), 4);
    assert!(svg.contains("cx=\"250.0\" cy=\"425.0\""));
    assert!(svg.contains(">QB</text>"));

    let buzz = project(&plays[2].formation_markers, &plays[2].paths, None);
    let svg = render_svg(&buzz, 500, 500);
    assert_eq!(svg.matches("class=\"defense\"").count(), 4);
    assert!(!svg.contains("class=\"offense\""));
}

#[test]
fn widget_draws_labels_inside_the_block() {
    let plays = sample_plays();
    let dive = &plays[1];
    let area = Rect::new(0, 0, 60, 30);
    let mut buf = Buffer::empty(area);
    PlayDiagram::new(&dive.formation_markers, &dive.paths)
        .block(Block::default().title("HB Dive").borders(Borders::ALL))
        .render(area, &mut buf);

    let text = buffer_text(&buf);
    assert!(text.contains("HB Dive"));
    assert!(text.contains("QB"));
    assert!(text.contains("RB"));
}

#[test]
fn locate_ignores_presses_on_the_border() {
    let diagram = PlayDiagram::new(&[], &[]).block(Block::default().borders(Borders::ALL));
    let area = Rect::new(0, 0, 10, 6);
    assert!(diagram.locate(area, 0, 0).is_none());
    assert!(diagram.locate(area, 9, 5).is_none());
    let press = diagram.locate(area, 8, 4).expect("inner corner");
    assert_eq!((press.column, press.row), (7, 3));
    assert_eq!((press.width, press.height), (8, 4));
}
