//! Fusión de las rutas en un único grafo de visualización.

use std::collections::HashSet;

use crate::models::{GraphData, PathResult};

/// Une los nodos y relaciones de todas las rutas, deduplicando por `id`.
///
/// Gana la primera aparición: se asume que todas las copias de un mismo id
/// traen propiedades idénticas o compatibles. El orden de salida es el de
/// inserción, pero no forma parte del contrato.
pub fn aggregate(paths: &[PathResult]) -> GraphData {
    let mut seen_nodes = HashSet::new();
    let mut seen_edges = HashSet::new();
    let mut graph = GraphData::default();

    for path in paths {
        for node in &path.nodes {
            if seen_nodes.insert(node.id.as_str()) {
                graph.nodes.push(node.clone());
            }
        }
        for edge in &path.edges {
            if seen_edges.insert(edge.id.as_str()) {
                graph.edges.push(edge.clone());
            }
        }
    }

    graph
}
