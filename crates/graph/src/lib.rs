//! Force-directed conflict graph layout rendered to SVG.

pub mod error;
pub mod forces;
pub mod model;
pub mod palette;
pub mod simulation;
pub mod surface;
pub mod view;

pub use error::GraphError;
pub use model::{ConflictKind, EdgeFilter, GraphEdge, GraphInput, GraphNode, NodeId};
pub use simulation::{Body, Simulation, SimulationConfig};
pub use surface::{SvgSurface, Viewport, ZoomTransform};
pub use view::{
    ConflictEntry, DetailPanel, GraphView, InitialZoom, RenderSummary, SvgExport, Tooltip,
    ViewConfig,
};
