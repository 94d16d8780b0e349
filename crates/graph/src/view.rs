use std::collections::HashMap;

use serde::Serialize;

use crate::error::{GraphError, Result};
use crate::forces::{CenterForce, CollideForce, LinkForce, ManyBodyForce, PositionForce};
use crate::model::{ConflictKind, GraphInput, GraphNode, NodeId};
use crate::palette;
use crate::simulation::{Simulation, SimulationConfig};
use crate::surface::{
    EdgeElement, NodeElement, SvgSurface, Viewport, ZoomTransform, NODE_RADIUS,
    NODE_RADIUS_HOVER, NODE_STROKE, NODE_STROKE_HOVER,
};

/// Alpha target while at least one node is being dragged.
const DRAG_ALPHA_TARGET: f64 = 0.3;
const TOOLTIP_OFFSET: (f64, f64) = (15.0, -15.0);

#[derive(Debug, Clone)]
pub struct ViewConfig {
    pub viewport: Viewport,
    /// Upper bound of simulation steps per render or drag release.
    pub max_ticks: usize,
    /// Steps advanced for each drag move.
    pub drag_ticks: usize,
    pub seed: Option<u64>,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            max_ticks: 300,
            drag_ticks: 30,
            seed: None,
        }
    }
}

/// Zoom applied right after a render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InitialZoom {
    pub transform: ZoomTransform,
    pub duration_ms: u64,
}

impl Default for InitialZoom {
    fn default() -> Self {
        Self {
            transform: ZoomTransform::new(0.0, 0.0, 0.8),
            duration_ms: 750,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderSummary {
    pub nodes: usize,
    pub edges: usize,
    /// Edges whose endpoints did not resolve to a node.
    pub dropped_edges: usize,
    pub ticks: usize,
    pub zoom: InitialZoom,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tooltip {
    pub nombre: String,
    pub grupo: Option<String>,
    pub profesor: Option<String>,
    pub horas: Option<f64>,
    /// Page position, set by the first pointer move.
    pub position: Option<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConflictEntry {
    pub tipo: ConflictKind,
    pub other_id: NodeId,
    pub other_nombre: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailPanel {
    pub id: NodeId,
    pub nombre: String,
    pub grupo: Option<String>,
    pub profesor: Option<String>,
    pub horas: Option<f64>,
    pub conflictos: Vec<ConflictEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SvgExport {
    pub file_name: String,
    pub markup: String,
}

impl SvgExport {
    pub const MIME_TYPE: &'static str = "image/svg+xml";
}

struct ResolvedEdge {
    source: usize,
    target: usize,
    tipo: ConflictKind,
}

struct Rendered {
    nodes: Vec<GraphNode>,
    edges: Vec<ResolvedEdge>,
    index: HashMap<NodeId, usize>,
    simulation: Simulation,
    surface: SvgSurface,
    active_drags: usize,
    tooltip: Option<Tooltip>,
}

/// Interactive force-directed view of a conflict graph.
///
/// Holds at most one rendered graph. Every [`GraphView::render`] discards
/// the previous simulation and surface.
pub struct GraphView {
    config: ViewConfig,
    rendered: Option<Rendered>,
}

impl GraphView {
    pub fn new(config: ViewConfig) -> Self {
        Self {
            config,
            rendered: None,
        }
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    /// Resize the viewport used by the next render.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.config.viewport = viewport;
    }

    /// Lay out `input` and rebuild the surface.
    pub fn render(&mut self, input: &GraphInput) -> RenderSummary {
        self.rendered = None;

        let viewport = self.config.viewport;
        let nodes = input.nodes.clone();

        let mut index = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            index.entry(node.id.clone()).or_insert(i);
        }

        let mut edges = Vec::with_capacity(input.edges.len());
        let mut dropped_edges = 0;
        for edge in &input.edges {
            match (index.get(&edge.source), index.get(&edge.target)) {
                (Some(&source), Some(&target)) => edges.push(ResolvedEdge {
                    source,
                    target,
                    tipo: edge.tipo,
                }),
                _ => {
                    dropped_edges += 1;
                    tracing::warn!(
                        source = %edge.source,
                        target = %edge.target,
                        tipo = edge.tipo.as_str(),
                        "dropping edge with unknown endpoint"
                    );
                }
            }
        }

        let (cx, cy) = viewport.center();
        let links = edges.iter().map(|e| (e.source, e.target)).collect();
        let sim_config = SimulationConfig {
            seed: self.config.seed,
            ..Default::default()
        };
        let mut simulation = Simulation::new(nodes.len(), &sim_config)
            .with_force("link", LinkForce::new(links).distance(150.0).strength(0.5))
            .with_force("charge", ManyBodyForce::new().strength(-500.0).distance_max(400.0))
            .with_force("center", CenterForce::new(cx, cy))
            .with_force("collision", CollideForce::new(50.0).strength(0.8))
            .with_force("x", PositionForce::x(cx).strength(0.1))
            .with_force("y", PositionForce::y(cy).strength(0.1));

        let ticks = simulation.run(self.config.max_ticks);

        let zoom = InitialZoom::default();
        let mut surface = SvgSurface::new(viewport);
        surface.transform = zoom.transform;
        surface.edges = edges
            .iter()
            .map(|e| EdgeElement {
                source: e.source,
                target: e.target,
                tipo: e.tipo,
                x1: 0.0,
                y1: 0.0,
                x2: 0.0,
                y2: 0.0,
            })
            .collect();
        surface.nodes = nodes
            .iter()
            .map(|n| NodeElement {
                id: n.id.clone(),
                initials: palette::initials(&n.nombre),
                grupo: n.grupo.clone(),
                color: palette::group_color(n.grupo.as_deref()),
                x: 0.0,
                y: 0.0,
                radius: NODE_RADIUS,
                stroke_width: NODE_STROKE,
            })
            .collect();

        let mut rendered = Rendered {
            nodes,
            edges,
            index,
            simulation,
            surface,
            active_drags: 0,
            tooltip: None,
        };
        rendered.sync();

        let summary = RenderSummary {
            nodes: rendered.surface.nodes.len(),
            edges: rendered.surface.edges.len(),
            dropped_edges,
            ticks,
            zoom,
        };
        tracing::info!(
            nodes = summary.nodes,
            edges = summary.edges,
            dropped = summary.dropped_edges,
            ticks = summary.ticks,
            "graph rendered"
        );

        self.rendered = Some(rendered);
        summary
    }

    /// Drop the rendered graph.
    pub fn clear(&mut self) {
        self.rendered = None;
    }

    pub fn is_rendered(&self) -> bool {
        self.rendered.is_some()
    }

    pub fn rendered_node_count(&self) -> usize {
        self.rendered.as_ref().map_or(0, |r| r.surface.nodes.len())
    }

    pub fn rendered_edge_count(&self) -> usize {
        self.rendered.as_ref().map_or(0, |r| r.surface.edges.len())
    }

    pub fn surface(&self) -> Option<&SvgSurface> {
        self.rendered.as_ref().map(|r| &r.surface)
    }

    /// Current position of a node.
    pub fn position(&self, id: &NodeId) -> Result<(f64, f64)> {
        let rendered = self.rendered_ref()?;
        let i = rendered.lookup(id)?;
        let body = &rendered.simulation.bodies()[i];
        Ok((body.x, body.y))
    }

    /// Every node with its current position, in input order.
    pub fn positions(&self) -> Vec<(NodeId, f64, f64)> {
        let Some(rendered) = self.rendered.as_ref() else {
            return Vec::new();
        };
        rendered
            .nodes
            .iter()
            .zip(rendered.simulation.bodies())
            .map(|(node, body)| (node.id.clone(), body.x, body.y))
            .collect()
    }

    /// Map a raw id from a URL or form back to the rendered node's id. A
    /// string id made of digits (`"007"`) matches as text before the raw
    /// value is tried as an integer.
    pub fn resolve_id(&self, raw: &str) -> Result<NodeId> {
        let rendered = self.rendered_ref()?;
        let text = NodeId::Text(raw.to_string());
        if rendered.index.contains_key(&text) {
            return Ok(text);
        }
        let parsed = NodeId::parse(raw);
        if rendered.index.contains_key(&parsed) {
            return Ok(parsed);
        }
        Err(GraphError::UnknownNode(parsed))
    }

    // ========== Interactions ==========

    /// Pin a node where it is and warm the simulation.
    pub fn drag_start(&mut self, id: &NodeId) -> Result<()> {
        let rendered = self.rendered_mut()?;
        let i = rendered.lookup(id)?;
        if rendered.active_drags == 0 {
            rendered.simulation.set_alpha_target(DRAG_ALPHA_TARGET);
        }
        rendered.active_drags += 1;

        if let Some(body) = rendered.simulation.body_mut(i) {
            body.fx = Some(body.x);
            body.fy = Some(body.y);
        }
        Ok(())
    }

    /// Move a pinned node and advance the simulation around it.
    pub fn drag_to(&mut self, id: &NodeId, x: f64, y: f64) -> Result<()> {
        let drag_ticks = self.config.drag_ticks;
        let rendered = self.rendered_mut()?;
        let i = rendered.lookup(id)?;
        if let Some(body) = rendered.simulation.body_mut(i) {
            body.fx = Some(x);
            body.fy = Some(y);
        }
        for _ in 0..drag_ticks {
            rendered.simulation.tick();
        }
        rendered.sync();
        Ok(())
    }

    /// Release a node and let the layout cool again.
    pub fn drag_end(&mut self, id: &NodeId) -> Result<()> {
        let max_ticks = self.config.max_ticks;
        let rendered = self.rendered_mut()?;
        let i = rendered.lookup(id)?;
        rendered.active_drags = rendered.active_drags.saturating_sub(1);
        if rendered.active_drags == 0 {
            rendered.simulation.set_alpha_target(0.0);
        }
        if let Some(body) = rendered.simulation.body_mut(i) {
            body.fx = None;
            body.fy = None;
        }
        rendered.simulation.run(max_ticks);
        rendered.sync();
        tracing::debug!(node = %id, alpha = rendered.simulation.alpha(), "drag released");
        Ok(())
    }

    pub fn active_drags(&self) -> usize {
        self.rendered.as_ref().map_or(0, |r| r.active_drags)
    }

    pub fn alpha_target(&self) -> f64 {
        self.rendered
            .as_ref()
            .map_or(0.0, |r| r.simulation.alpha_target())
    }

    /// Highlight a node and show its tooltip.
    pub fn hover_enter(&mut self, id: &NodeId) -> Result<Tooltip> {
        let rendered = self.rendered_mut()?;
        let i = rendered.lookup(id)?;
        let element = &mut rendered.surface.nodes[i];
        element.radius = NODE_RADIUS_HOVER;
        element.stroke_width = NODE_STROKE_HOVER;

        let node = &rendered.nodes[i];
        let tooltip = Tooltip {
            nombre: node.nombre.clone(),
            grupo: node.grupo.clone(),
            profesor: node.profesor.clone(),
            horas: node.horas,
            position: None,
        };
        rendered.tooltip = Some(tooltip.clone());
        Ok(tooltip)
    }

    /// Follow the pointer; the tooltip sits just above and right of it.
    pub fn hover_move(&mut self, page_x: f64, page_y: f64) -> Option<Tooltip> {
        let tooltip = self.rendered.as_mut()?.tooltip.as_mut()?;
        tooltip.position = Some((page_x + TOOLTIP_OFFSET.0, page_y + TOOLTIP_OFFSET.1));
        Some(tooltip.clone())
    }

    pub fn hover_leave(&mut self, id: &NodeId) -> Result<()> {
        let rendered = self.rendered_mut()?;
        let i = rendered.lookup(id)?;
        let element = &mut rendered.surface.nodes[i];
        element.radius = NODE_RADIUS;
        element.stroke_width = NODE_STROKE;
        rendered.tooltip = None;
        Ok(())
    }

    pub fn tooltip(&self) -> Option<&Tooltip> {
        self.rendered.as_ref()?.tooltip.as_ref()
    }

    /// Detail panel for a node, listing the conflicts currently drawn.
    pub fn click(&self, id: &NodeId) -> Result<DetailPanel> {
        let rendered = self.rendered_ref()?;
        let i = rendered.lookup(id)?;
        let node = &rendered.nodes[i];

        let conflictos = rendered
            .edges
            .iter()
            .filter(|e| e.source == i || e.target == i)
            .map(|e| {
                let other = &rendered.nodes[if e.source == i { e.target } else { e.source }];
                ConflictEntry {
                    tipo: e.tipo,
                    other_id: other.id.clone(),
                    other_nombre: other.nombre.clone(),
                }
            })
            .collect();

        Ok(DetailPanel {
            id: node.id.clone(),
            nombre: node.nombre.clone(),
            grupo: node.grupo.clone(),
            profesor: node.profesor.clone(),
            horas: node.horas,
            conflictos,
        })
    }

    /// Apply a pan/zoom; the scale is clamped to the zoom extent.
    pub fn zoom(&mut self, x: f64, y: f64, k: f64) -> Result<ZoomTransform> {
        let rendered = self.rendered_mut()?;
        rendered.surface.transform = ZoomTransform::new(x, y, k);
        Ok(rendered.surface.transform)
    }

    /// Serialize the surface exactly as it is drawn now.
    pub fn export_svg(&self) -> Result<SvgExport> {
        let rendered = self.rendered_ref()?;
        let file_name = format!(
            "grafo_horarios_{}.svg",
            chrono::Utc::now().timestamp_millis()
        );
        Ok(SvgExport {
            file_name,
            markup: rendered.surface.to_markup(),
        })
    }

    fn rendered_ref(&self) -> Result<&Rendered> {
        self.rendered.as_ref().ok_or(GraphError::NothingRendered)
    }

    fn rendered_mut(&mut self) -> Result<&mut Rendered> {
        self.rendered.as_mut().ok_or(GraphError::NothingRendered)
    }
}

impl Default for GraphView {
    fn default() -> Self {
        Self::new(ViewConfig::default())
    }
}

impl Rendered {
    fn lookup(&self, id: &NodeId) -> Result<usize> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| GraphError::UnknownNode(id.clone()))
    }

    fn sync(&mut self) {
        let positions: Vec<(f64, f64)> = self
            .simulation
            .bodies()
            .iter()
            .map(|b| (b.x, b.y))
            .collect();
        self.surface.sync(&positions);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GraphEdge, GraphNode};

    fn node(id: i64, nombre: &str) -> GraphNode {
        GraphNode {
            id: NodeId::Int(id),
            nombre: nombre.to_string(),
            grupo: Some("ITI-1V".to_string()),
            profesor: None,
            horas: Some(4.0),
        }
    }

    fn view() -> GraphView {
        GraphView::new(ViewConfig {
            seed: Some(42),
            ..Default::default()
        })
    }

    fn pair() -> GraphInput {
        GraphInput {
            nodes: vec![node(1, "A"), node(2, "B")],
            edges: vec![GraphEdge {
                source: NodeId::Int(1),
                target: NodeId::Int(2),
                tipo: ConflictKind::Profesor,
            }],
        }
    }

    #[test]
    fn test_resolve_id_handles_digit_strings() {
        let input = GraphInput {
            nodes: vec![
                GraphNode {
                    id: NodeId::from("101"),
                    ..node(0, "A")
                },
                GraphNode {
                    id: NodeId::from("007"),
                    ..node(0, "B")
                },
                node(7, "C"),
            ],
            edges: vec![GraphEdge {
                source: NodeId::from("101"),
                target: NodeId::from("007"),
                tipo: ConflictKind::Profesor,
            }],
        };
        let mut view = view();
        assert_eq!(view.resolve_id("101"), Err(GraphError::NothingRendered));
        view.render(&input);

        let id = view.resolve_id("101").unwrap();
        assert_eq!(id, NodeId::from("101"));
        let panel = view.click(&id).unwrap();
        assert_eq!(panel.conflictos[0].other_nombre, "B");

        assert_eq!(view.resolve_id("007").unwrap(), NodeId::from("007"));
        assert_eq!(view.resolve_id("7").unwrap(), NodeId::Int(7));
        assert_eq!(
            view.resolve_id("8"),
            Err(GraphError::UnknownNode(NodeId::Int(8)))
        );
    }

    #[test]
    fn test_drag_pins_and_warms() {
        let mut view = view();
        view.render(&pair());
        let id = NodeId::Int(1);

        view.drag_start(&id).unwrap();
        view.drag_start(&NodeId::Int(2)).unwrap();
        assert_eq!(view.active_drags(), 2);
        assert_eq!(view.alpha_target(), 0.3);

        view.drag_to(&id, 123.0, 456.0).unwrap();
        assert_eq!(view.position(&id).unwrap(), (123.0, 456.0));

        view.drag_end(&NodeId::Int(2)).unwrap();
        assert_eq!(view.alpha_target(), 0.3);
        view.drag_end(&id).unwrap();
        assert_eq!(view.active_drags(), 0);
        assert_eq!(view.alpha_target(), 0.0);
        assert_ne!(view.position(&id).unwrap(), (123.0, 456.0));
    }

    #[test]
    fn test_hover_highlights_and_positions_tooltip() {
        let mut view = view();
        view.render(&pair());
        let id = NodeId::Int(2);

        let tooltip = view.hover_enter(&id).unwrap();
        assert_eq!(tooltip.nombre, "B");
        assert_eq!(view.surface().unwrap().nodes[1].radius, 35.0);
        assert_eq!(view.surface().unwrap().nodes[1].stroke_width, 4.0);

        let moved = view.hover_move(100.0, 200.0).unwrap();
        assert_eq!(moved.position, Some((115.0, 185.0)));

        view.hover_leave(&id).unwrap();
        assert!(view.tooltip().is_none());
        assert_eq!(view.surface().unwrap().nodes[1].radius, 30.0);
        assert!(view.hover_move(1.0, 1.0).is_none());
    }

    #[test]
    fn test_unknown_node_and_empty_view() {
        let mut view = view();
        assert_eq!(view.click(&NodeId::Int(1)), Err(GraphError::NothingRendered));
        assert_eq!(view.export_svg(), Err(GraphError::NothingRendered));

        view.render(&pair());
        assert_eq!(
            view.click(&NodeId::Int(9)),
            Err(GraphError::UnknownNode(NodeId::Int(9)))
        );
    }

    #[test]
    fn test_initial_zoom_and_clamp() {
        let mut view = view();
        let summary = view.render(&pair());
        assert_eq!(summary.zoom.transform.k, 0.8);
        assert_eq!(summary.zoom.duration_ms, 750);
        assert_eq!(view.zoom(0.0, 0.0, 9.0).unwrap().k, 5.0);
    }

    #[test]
    fn test_layout_settles_near_center() {
        let mut view = view();
        view.render(&pair());
        let (a, b) = (
            view.position(&NodeId::Int(1)).unwrap(),
            view.position(&NodeId::Int(2)).unwrap(),
        );
        let mid = ((a.0 + b.0) / 2.0, (a.1 + b.1) / 2.0);
        assert!((mid.0 - 500.0).abs() < 1.0);
        assert!((mid.1 - 350.0).abs() < 1.0);
    }
}
