//! Retained SVG scene for one rendered graph.
//!
//! The surface holds one element per drawn edge and node and serializes to
//! standalone SVG markup. It is rebuilt from scratch on every render, so the
//! markup never contains elements from an earlier render.

use std::fmt::Write;

use quick_xml::escape::escape;

use crate::model::{ConflictKind, NodeId};
use crate::palette;

pub const NODE_RADIUS: f64 = 30.0;
pub const NODE_RADIUS_HOVER: f64 = 35.0;
pub const NODE_STROKE: f64 = 3.0;
pub const NODE_STROKE_HOVER: f64 = 4.0;
const EDGE_STROKE: f64 = 3.0;
const EDGE_OPACITY: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> (f64, f64) {
        (self.width / 2.0, self.height / 2.0)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1000.0, 700.0)
    }
}

/// Pan/zoom applied to the inner group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomTransform {
    pub x: f64,
    pub y: f64,
    pub k: f64,
}

impl ZoomTransform {
    pub const IDENTITY: ZoomTransform = ZoomTransform {
        x: 0.0,
        y: 0.0,
        k: 1.0,
    };
    pub const MIN_SCALE: f64 = 0.2;
    pub const MAX_SCALE: f64 = 5.0;

    /// Transform with the scale clamped to the zoom extent.
    pub fn new(x: f64, y: f64, k: f64) -> Self {
        Self {
            x,
            y,
            k: k.clamp(Self::MIN_SCALE, Self::MAX_SCALE),
        }
    }

    pub fn to_attr(&self) -> String {
        format!("translate({},{}) scale({})", fmt_num(self.x), fmt_num(self.y), fmt_num(self.k))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeElement {
    pub source: usize,
    pub target: usize,
    pub tipo: ConflictKind,
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeElement {
    pub id: NodeId,
    pub initials: String,
    pub grupo: Option<String>,
    pub color: &'static str,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub stroke_width: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SvgSurface {
    pub viewport: Viewport,
    pub transform: ZoomTransform,
    pub edges: Vec<EdgeElement>,
    pub nodes: Vec<NodeElement>,
}

impl SvgSurface {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            transform: ZoomTransform::IDENTITY,
            edges: Vec::new(),
            nodes: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Move every element to the given body coordinates.
    pub fn sync(&mut self, positions: &[(f64, f64)]) {
        for (node, &(x, y)) in self.nodes.iter_mut().zip(positions) {
            node.x = x;
            node.y = y;
        }
        for edge in self.edges.iter_mut() {
            if let (Some(&(x1, y1)), Some(&(x2, y2))) =
                (positions.get(edge.source), positions.get(edge.target))
            {
                edge.x1 = x1;
                edge.y1 = y1;
                edge.x2 = x2;
                edge.y2 = y2;
            }
        }
    }

    pub fn to_markup(&self) -> String {
        let Viewport { width, height } = self.viewport;
        let mut out = String::new();

        let _ = write!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" id="grafoSvg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = fmt_num(width),
            h = fmt_num(height),
        );

        // Arrow markers are only defined when something points at them.
        if !self.edges.is_empty() {
            out.push_str("<defs>");
            for kind in ConflictKind::ALL {
                let _ = write!(
                    out,
                    r#"<marker id="arrow-{k}" viewBox="0 -5 10 10" refX="35" refY="0" markerWidth="6" markerHeight="6" orient="auto"><path d="M0,-5L10,0L0,5" fill="{c}"/></marker>"#,
                    k = kind.as_str(),
                    c = palette::edge_color(kind),
                );
            }
            out.push_str("</defs>");
        }

        let _ = write!(out, r#"<g transform="{}">"#, self.transform.to_attr());

        out.push_str(r#"<g class="enlaces">"#);
        for edge in &self.edges {
            let k = edge.tipo.as_str();
            let _ = write!(
                out,
                r#"<line class="enlace enlace-{k}" x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-width="{}" stroke-opacity="{}" marker-end="url(#arrow-{k})"/>"#,
                fmt_num(edge.x1),
                fmt_num(edge.y1),
                fmt_num(edge.x2),
                fmt_num(edge.y2),
                palette::edge_color(edge.tipo),
                fmt_num(EDGE_STROKE),
                fmt_num(EDGE_OPACITY),
            );
        }
        out.push_str("</g>");

        out.push_str(r#"<g class="nodos">"#);
        for node in &self.nodes {
            let _ = write!(
                out,
                r#"<g class="nodo" data-id="{}" transform="translate({},{})">"#,
                escape(&node.id.to_string()),
                fmt_num(node.x),
                fmt_num(node.y),
            );
            let _ = write!(
                out,
                r##"<circle r="{}" fill="{}" stroke="#fff" stroke-width="{}" filter="drop-shadow(0px 2px 4px rgba(0,0,0,0.3))"/>"##,
                fmt_num(node.radius),
                node.color,
                fmt_num(node.stroke_width),
            );
            let _ = write!(
                out,
                r##"<text text-anchor="middle" dy=".35em" fill="#fff" font-weight="bold" font-size="14px">{}</text>"##,
                escape(&node.initials),
            );
            let _ = write!(
                out,
                r##"<text text-anchor="middle" dy="3.5em" fill="#333" font-size="10px" font-weight="500">{}</text>"##,
                escape(node.grupo.as_deref().unwrap_or("")),
            );
            out.push_str("</g>");
        }
        out.push_str("</g></g></svg>");

        out
    }
}

/// Two decimals, trailing zeros stripped.
fn fmt_num(value: f64) -> String {
    let s = format!("{:.2}", value);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" { "0".to_string() } else { s.to_string() }
}
