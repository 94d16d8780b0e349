use std::fmt;

use serde::{Deserialize, Serialize};

/// Node identifier as sent by the backend: course ids are integers in some
/// datasets and codes like `"MAT-101"` in others.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeId {
    Int(i64),
    Text(String),
}

impl NodeId {
    /// Parse a path segment back into an id; numeric strings become `Int`.
    pub fn parse(raw: &str) -> Self {
        raw.parse::<i64>()
            .map(NodeId::Int)
            .unwrap_or_else(|_| NodeId::Text(raw.to_string()))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeId::Int(n) => write!(f, "{}", n),
            NodeId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for NodeId {
    fn from(value: i64) -> Self {
        NodeId::Int(value)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        NodeId::Text(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictKind {
    /// Both sessions share a teacher.
    Profesor,
    /// Both sessions overlap in time for the same group.
    Horario,
}

impl ConflictKind {
    pub const ALL: [ConflictKind; 2] = [ConflictKind::Profesor, ConflictKind::Horario];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictKind::Profesor => "profesor",
            ConflictKind::Horario => "horario",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConflictKind::Profesor => "Profesor",
            ConflictKind::Horario => "Horario",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "profesor" => Some(ConflictKind::Profesor),
            "horario" => Some(ConflictKind::Horario),
            _ => None,
        }
    }
}

/// A course session of one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: NodeId,
    pub nombre: String,
    #[serde(default)]
    pub grupo: Option<String>,
    #[serde(default)]
    pub profesor: Option<String>,
    #[serde(default)]
    pub horas: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: NodeId,
    pub target: NodeId,
    pub tipo: ConflictKind,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphInput {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

/// Which edges a render should show. Nodes are always kept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EdgeFilter {
    #[default]
    Todos,
    Only(ConflictKind),
}

impl EdgeFilter {
    pub fn parse(value: &str) -> Self {
        ConflictKind::parse(value)
            .map(EdgeFilter::Only)
            .unwrap_or(EdgeFilter::Todos)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeFilter::Todos => "todos",
            EdgeFilter::Only(kind) => kind.as_str(),
        }
    }

    pub fn accepts(&self, edge: &GraphEdge) -> bool {
        match self {
            EdgeFilter::Todos => true,
            EdgeFilter::Only(kind) => edge.tipo == *kind,
        }
    }
}

impl GraphInput {
    /// Copy of the graph keeping every node and only the matching edges.
    pub fn filtered(&self, filter: EdgeFilter) -> GraphInput {
        GraphInput {
            nodes: self.nodes.clone(),
            edges: self
                .edges
                .iter()
                .filter(|e| filter.accepts(e))
                .cloned()
                .collect(),
        }
    }

    pub fn count_edges(&self, kind: ConflictKind) -> usize {
        self.edges.iter().filter(|e| e.tipo == kind).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_node_ids_accept_numbers_and_strings() {
        let nodes: Vec<GraphNode> = serde_json::from_value(json!([
            {"id": 7, "nombre": "Redes"},
            {"id": "MAT-101", "nombre": "Cálculo", "grupo": "ITI-1V", "profesor": "Ana", "horas": 4.5}
        ]))
        .unwrap();

        assert_eq!(nodes[0].id, NodeId::Int(7));
        assert_eq!(nodes[1].id, NodeId::from("MAT-101"));
        assert_eq!(nodes[1].horas, Some(4.5));
        assert_eq!(nodes[0].grupo, None);
        assert_eq!(NodeId::parse("7"), NodeId::Int(7));
        assert_eq!(NodeId::parse("MAT-101").to_string(), "MAT-101");
    }

    #[test]
    fn test_filter_keeps_nodes() {
        let input: GraphInput = serde_json::from_value(json!({
            "nodes": [{"id": 1, "nombre": "A"}, {"id": 2, "nombre": "B"}, {"id": 3, "nombre": "C"}],
            "edges": [
                {"source": 1, "target": 2, "tipo": "profesor"},
                {"source": 2, "target": 3, "tipo": "horario"},
                {"source": 1, "target": 3, "tipo": "horario"}
            ]
        }))
        .unwrap();

        let only_horario = input.filtered(EdgeFilter::Only(ConflictKind::Horario));
        assert_eq!(only_horario.nodes.len(), 3);
        assert_eq!(only_horario.edges.len(), input.count_edges(ConflictKind::Horario));
        assert_eq!(input.filtered(EdgeFilter::Todos), input);
        assert_eq!(input.edges.len(), 3);
    }

    #[test]
    fn test_filter_parse() {
        assert_eq!(EdgeFilter::parse("profesor"), EdgeFilter::Only(ConflictKind::Profesor));
        assert_eq!(EdgeFilter::parse("todos"), EdgeFilter::Todos);
        assert_eq!(EdgeFilter::parse("otro"), EdgeFilter::Todos);
    }
}
