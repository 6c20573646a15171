//! The render pass expressed as data.
//!
//! `build` turns a snapshot into an ordered list of shapes: background first,
//! then tiles (with their number tokens), roads, and finally settlement
//! markers on top. Any backend that can fill polygons and circles can draw it;
//! `to_svg` is the one shipped here.

use crate::{token_radius, HexagonView, LineView, StateSnapshot, VertexView};
use std::fmt::Write;

pub const BACKGROUND: &str = "gray";
pub const OUTLINE: &str = "black";
pub const TOKEN_FILL: &str = "#FFDAB9";
pub const TOKEN_FONT: &str = "20px Arial";

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Background {
        fill: String,
    },
    Polygon {
        points: Vec<(f64, f64)>,
        fill: String,
        stroke: Option<String>,
    },
    Circle {
        x: f64,
        y: f64,
        radius: f64,
        fill: String,
        outline: bool,
    },
    Quad {
        points: [(f64, f64); 4],
        fill: String,
    },
    Text {
        text: String,
        x: f64,
        y: f64,
        font: String,
        color: String,
    },
}

pub fn build(state: &StateSnapshot) -> Vec<Shape> {
    let mut shapes = Vec::with_capacity(
        1 + state.hexagons.len() * 3 + state.lines.len() + state.vertices.len(),
    );
    shapes.push(Shape::Background {
        fill: BACKGROUND.to_string(),
    });
    for hexagon in &state.hexagons {
        shapes.extend(hexagon_shapes(hexagon));
    }
    shapes.extend(state.lines.iter().map(line_shape));
    shapes.extend(state.vertices.iter().map(vertex_shape));
    shapes
}

/// Tile polygon, plus the number token unless the tile carries the 7.
pub fn hexagon_shapes(hexagon: &HexagonView) -> Vec<Shape> {
    let mut out = vec![Shape::Polygon {
        points: hexagon.vertices.clone(),
        fill: hexagon.color.clone(),
        stroke: Some(OUTLINE.to_string()),
    }];
    if hexagon.number != 7 {
        let (x, y) = hexagon.center;
        out.push(Shape::Circle {
            x,
            y,
            radius: token_radius(hexagon.number),
            fill: TOKEN_FILL.to_string(),
            outline: true,
        });
        out.push(Shape::Text {
            text: hexagon.number.to_string(),
            x,
            y,
            font: TOKEN_FONT.to_string(),
            color: OUTLINE.to_string(),
        });
    }
    out
}

pub fn vertex_shape(vertex: &VertexView) -> Shape {
    Shape::Circle {
        x: vertex.x,
        y: vertex.y,
        radius: vertex.radius,
        fill: vertex.color.clone(),
        outline: false,
    }
}

pub fn line_shape(line: &LineView) -> Shape {
    Shape::Quad {
        points: line.corners(),
        fill: line.color.clone(),
    }
}

pub fn to_svg(shapes: &[Shape], width: f64, height: f64) -> String {
    let mut out = String::with_capacity(64 * shapes.len() + 128);
    let _ = write!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"#
    );
    for shape in shapes {
        match shape {
            Shape::Background { fill } => {
                let _ = write!(
                    out,
                    r#"<rect x="0" y="0" width="{width}" height="{height}" fill="{}"/>"#,
                    escape(fill)
                );
            }
            Shape::Polygon {
                points,
                fill,
                stroke,
            } => {
                let _ = write!(
                    out,
                    r#"<polygon points="{}" fill="{}""#,
                    points_attr(points),
                    escape(fill)
                );
                if let Some(stroke) = stroke {
                    let _ = write!(out, r#" stroke="{}" stroke-width="1""#, escape(stroke));
                }
                out.push_str("/>");
            }
            Shape::Circle {
                x,
                y,
                radius,
                fill,
                outline,
            } => {
                let _ = write!(
                    out,
                    r#"<circle cx="{x:.2}" cy="{y:.2}" r="{radius:.2}" fill="{}""#,
                    escape(fill)
                );
                if *outline {
                    let _ = write!(out, r#" stroke="{OUTLINE}" stroke-width="1""#);
                }
                out.push_str("/>");
            }
            Shape::Quad { points, fill } => {
                let _ = write!(
                    out,
                    r#"<polygon points="{}" fill="{}"/>"#,
                    points_attr(points),
                    escape(fill)
                );
            }
            Shape::Text {
                text,
                x,
                y,
                font,
                color,
            } => {
                let (size, family) = split_font(font);
                let _ = write!(
                    out,
                    r#"<text x="{x:.2}" y="{y:.2}" font-size="{}" font-family="{}" fill="{}" text-anchor="middle" dominant-baseline="middle">{}</text>"#,
                    escape(size),
                    escape(family),
                    escape(color),
                    escape(text)
                );
            }
        }
    }
    out.push_str("</svg>");
    out
}

fn points_attr(points: &[(f64, f64)]) -> String {
    points
        .iter()
        .map(|(x, y)| format!("{x:.2},{y:.2}"))
        .collect::<Vec<_>>()
        .join(" ")
}

// "20px Arial" -> ("20px", "Arial")
fn split_font(font: &str) -> (&str, &str) {
    match font.split_once(' ') {
        Some((size, family)) => (size, family),
        None => ("16px", font),
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
