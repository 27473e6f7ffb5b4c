//! Turning drawing calls back into shape objects.

mod common;

use drawstream::backends::import::GroupShape;
use drawstream::backends::{ImportRenderer, Shape, ShapeKind};
use drawstream::{Alignment, Color, CommandBuffer, Font, Rect, Renderer};
use glam::dvec2;

fn import(draw: impl FnOnce(&mut dyn Renderer)) -> Option<Shape> {
    let mut r = ImportRenderer::new();
    r.begin_render(None).unwrap();
    draw(&mut r);
    r.end_render().unwrap();
    r.into_object()
}

#[test]
fn labelled_box_becomes_group_of_box_and_text() {
    common::init_tracing();
    let shape = import(|r| {
        r.set_linewidth(0.1);
        r.draw_rect(dvec2(1.0, 1.0), dvec2(5.0, 3.0), Some(&Color::WHITE), Some(&Color::BLACK));
        r.set_font(&Font::new("sans"), 0.8);
        r.draw_string("Server", dvec2(3.0, 2.2), Alignment::Center, &Color::BLACK);
    })
    .unwrap();

    let Shape::Group(GroupShape { children }) = &shape else {
        panic!("expected a group, got {shape:?}");
    };
    assert_eq!(children.len(), 2);
    let Shape::Box(frame) = &children[0] else {
        panic!("box must come first");
    };
    assert_eq!(frame.corner, dvec2(1.0, 1.0));
    assert_eq!((frame.width, frame.height), (4.0, 2.0));
    assert_eq!(frame.style.line_color, Color::BLACK);
    assert!(frame.style.show_background);

    let Shape::Text(label) = &children[1] else {
        panic!("text must come second");
    };
    assert_eq!(label.text, "Server");
    assert_eq!(label.font, Font::new("sans"));
    assert_eq!(shape.bounds(), Some(Rect::new(1.0, 1.0, 5.0, 3.0)));
}

#[test]
fn replaying_a_recording_moves_the_shapes() {
    let mut buf = CommandBuffer::new();
    buf.draw_ellipse(dvec2(0.0, 0.0), 2.0, 2.0, None, Some(&Color::BLACK));

    let shape = import(|r| {
        let errors = buf.replay(r, dvec2(10.0, 10.0), 0.5);
        assert!(errors.is_empty());
    })
    .unwrap();
    let Shape::Ellipse(ellipse) = shape else {
        panic!("expected an ellipse");
    };
    assert_eq!(ellipse.corner, dvec2(9.5, 9.5));
    assert_eq!(ellipse.width, 1.0);
}

#[test]
fn whole_scene_imports_one_shape_per_primitive() {
    let shape = import(|r| common::scene(r)).unwrap();
    let Shape::Group(group) = shape else {
        panic!("expected a group");
    };
    let names: Vec<&str> = group.children.iter().map(|c| c.type_name()).collect();
    let arrowed = group
        .children
        .iter()
        .filter(|c| match c {
            Shape::Polyline(p) => p.start_arrow.is_some() || p.end_arrow.is_some(),
            Shape::Arc(a) => a.end_arrow.is_some(),
            Shape::Bezierline(b) => b.start_arrow.is_some(),
            _ => false,
        })
        .count();
    assert_eq!(arrowed, 5);
    assert_eq!(
        names,
        [
            "Standard - PolyLine",
            "Standard - PolyLine",
            "Standard - Polygon",
            "Standard - Box",
            "Standard - Box",
            "Standard - Arc",
            "Standard - Beziergon",
            "Standard - Ellipse",
            "Standard - BezierLine",
            "Standard - Beziergon",
            "Standard - Text",
            "Standard - Image",
            "Standard - PolyLine",
            "Standard - PolyLine",
            "Standard - Arc",
            "Standard - BezierLine",
            "Standard - PolyLine",
        ]
    );
}
