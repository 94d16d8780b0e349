use graph::{
    ConflictKind, EdgeFilter, GraphEdge, GraphError, GraphInput, GraphNode, GraphView, NodeId,
    ViewConfig,
};

fn node(id: i64, nombre: &str, grupo: &str) -> GraphNode {
    GraphNode {
        id: NodeId::Int(id),
        nombre: nombre.to_string(),
        grupo: Some(grupo.to_string()),
        profesor: Some("Dra. López".to_string()),
        horas: Some(4.0),
    }
}

fn edge(source: i64, target: i64, tipo: ConflictKind) -> GraphEdge {
    GraphEdge {
        source: NodeId::Int(source),
        target: NodeId::Int(target),
        tipo,
    }
}

fn seeded_view() -> GraphView {
    GraphView::new(ViewConfig {
        seed: Some(3),
        ..Default::default()
    })
}

fn sample() -> GraphInput {
    GraphInput {
        nodes: vec![
            node(1, "Bases de Datos", "ITI-1V"),
            node(2, "Redes", "ITI-2V"),
            node(3, "Programación Web", "ITI-5V"),
            node(4, "Ética", "ITI-9Z"),
        ],
        edges: vec![
            edge(1, 2, ConflictKind::Profesor),
            edge(2, 3, ConflictKind::Horario),
            edge(1, 3, ConflictKind::Horario),
            edge(3, 4, ConflictKind::Profesor),
            edge(4, 1, ConflictKind::Horario),
        ],
    }
}

fn count(markup: &str, needle: &str) -> usize {
    markup.matches(needle).count()
}

#[test]
fn test_node_groups_match_input() {
    let mut view = seeded_view();
    let summary = view.render(&sample());

    assert_eq!(summary.nodes, 4);
    assert_eq!(summary.edges, 5);
    assert_eq!(view.rendered_node_count(), 4);
    assert_eq!(view.rendered_edge_count(), 5);
}

#[test]
fn test_filter_by_kind() {
    let input = sample();
    let mut view = seeded_view();

    for kind in ConflictKind::ALL {
        view.render(&input.filtered(EdgeFilter::Only(kind)));
        assert_eq!(view.rendered_edge_count(), input.count_edges(kind));
        assert_eq!(view.rendered_node_count(), input.nodes.len());
    }

    view.render(&input.filtered(EdgeFilter::Todos));
    assert_eq!(view.rendered_edge_count(), input.edges.len());
}

#[test]
fn test_rerender_is_idempotent() {
    let input = sample();
    let mut view = seeded_view();

    let first = view.render(&input);
    let second = view.render(&input);

    assert_eq!(first.nodes, second.nodes);
    assert_eq!(first.edges, second.edges);
    assert_eq!(view.rendered_node_count(), 4);
}

#[test]
fn test_render_does_not_mutate_input() {
    let input = sample();
    let before = input.clone();
    let mut view = seeded_view();
    view.render(&input);
    view.drag_start(&NodeId::Int(1)).unwrap();
    view.drag_to(&NodeId::Int(1), 10.0, 10.0).unwrap();
    view.drag_end(&NodeId::Int(1)).unwrap();

    assert_eq!(input, before);
}

#[test]
fn test_export_has_no_stale_elements() {
    let input = sample();
    let mut view = seeded_view();
    view.render(&input);
    view.render(&input.filtered(EdgeFilter::Only(ConflictKind::Profesor)));

    let export = view.export_svg().unwrap();
    assert!(export.file_name.starts_with("grafo_horarios_"));
    assert!(export.file_name.ends_with(".svg"));

    let markup = &export.markup;
    assert_eq!(count(markup, r#"<g class="nodo""#), 4);
    assert_eq!(count(markup, "<line "), 2);
    assert_eq!(count(markup, "enlace-horario"), 0);
    assert_eq!(count(markup, "<svg"), 1);
    assert!(markup.contains("scale(0.8)"));
}

#[test]
fn test_two_node_scenario() {
    let input = GraphInput {
        nodes: vec![node(1, "A", "ITI-1V"), node(2, "B", "ITI-1V")],
        edges: vec![edge(1, 2, ConflictKind::Profesor)],
    };
    let mut view = seeded_view();
    view.render(&input);

    assert_eq!(view.rendered_node_count(), 2);
    assert_eq!(view.rendered_edge_count(), 1);
    let markup = view.export_svg().unwrap().markup;
    assert_eq!(count(&markup, "enlace-profesor"), 1);

    let panel = view.click(&NodeId::Int(1)).unwrap();
    assert_eq!(panel.nombre, "A");
    assert_eq!(panel.conflictos.len(), 1);
    assert_eq!(panel.conflictos[0].tipo, ConflictKind::Profesor);
    assert_eq!(panel.conflictos[0].other_nombre, "B");
}

#[test]
fn test_click_uses_rendered_edges_only() {
    let input = sample();
    let mut view = seeded_view();
    view.render(&input.filtered(EdgeFilter::Only(ConflictKind::Horario)));

    let panel = view.click(&NodeId::Int(1)).unwrap();
    let others: Vec<&str> = panel
        .conflictos
        .iter()
        .map(|c| c.other_nombre.as_str())
        .collect();
    assert_eq!(others, vec!["Programación Web", "Ética"]);
    assert!(panel.conflictos.iter().all(|c| c.tipo == ConflictKind::Horario));
}

#[test]
fn test_empty_input() {
    let mut view = seeded_view();
    let summary = view.render(&GraphInput::default());

    assert_eq!(summary.nodes, 0);
    assert_eq!(summary.edges, 0);
    assert_eq!(view.rendered_node_count(), 0);
    assert_eq!(view.rendered_edge_count(), 0);

    let markup = view.export_svg().unwrap().markup;
    assert!(!markup.contains("<marker"));
    assert_eq!(count(&markup, r#"<g class="nodo""#), 0);
}

#[test]
fn test_dangling_edges_are_dropped() {
    let mut input = sample();
    input.edges.push(edge(1, 99, ConflictKind::Profesor));
    let mut view = seeded_view();
    let summary = view.render(&input);

    assert_eq!(summary.dropped_edges, 1);
    assert_eq!(view.rendered_edge_count(), 5);
}

#[test]
fn test_nodes_stay_apart() {
    let mut view = seeded_view();
    view.render(&sample());

    let ids: Vec<NodeId> = (1..=4).map(NodeId::Int).collect();
    let positions: Vec<(f64, f64)> = ids.iter().map(|id| view.position(id).unwrap()).collect();
    for i in 0..positions.len() {
        for j in (i + 1)..positions.len() {
            let (a, b) = (positions[i], positions[j]);
            let d = ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt();
            assert!(d > 60.0, "nodes {} and {} are {} apart", i, j, d);
        }
    }
}

#[test]
fn test_clear_forgets_render() {
    let mut view = seeded_view();
    view.render(&sample());
    view.clear();

    assert!(!view.is_rendered());
    assert_eq!(view.export_svg().unwrap_err(), GraphError::NothingRendered);
}
