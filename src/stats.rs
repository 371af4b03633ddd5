//! Filtros a posteriori sobre las rutas y estadísticas de resumen.
//!
//! Todo aquí es cálculo puro sobre resultados ya obtenidos: los filtros
//! devuelven colecciones nuevas y nunca modifican las rutas originales.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::Serialize;

use crate::aggregate::aggregate;
use crate::domain::Domain;
use crate::error::{PathQueryError, PathQueryResult};
use crate::models::{GraphData, PathResult};

/// Conserva las rutas cuya longitud está en `allowed`. Vacío = sin filtro.
pub fn filter_by_length(paths: &[PathResult], allowed: &BTreeSet<usize>) -> Vec<PathResult> {
    paths
        .iter()
        .filter(|p| allowed.is_empty() || allowed.contains(&p.length))
        .cloned()
        .collect()
}

/// Conserva una ruta si alguno de sus nodos pertenece a `allowed`. Vacío = sin filtro.
pub fn filter_by_domain(paths: &[PathResult], allowed: &BTreeSet<Domain>) -> Vec<PathResult> {
    paths
        .iter()
        .filter(|p| allowed.is_empty() || p.nodes.iter().any(|n| allowed.contains(&n.domain())))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_paths: usize,
    pub filtered_paths: usize,
    pub avg_length: f64,
    pub unique_node_count: usize,
    pub unique_edge_count: usize,
    /// Apariciones de nodos por dominio (no entidades distintas).
    pub domain_participation_counts: BTreeMap<Domain, usize>,
}

/// Estadísticas de `paths`; de `filtered` sólo se toma el tamaño.
///
/// Longitud media, nodos/relaciones únicos y participación por dominio se
/// calculan sobre `paths` completo. Para las estadísticas de la vista filtrada
/// basta con pasar la colección filtrada en ambos argumentos.
pub fn compute_statistics(paths: &[PathResult], filtered: &[PathResult]) -> Statistics {
    let total_paths = paths.len();
    let avg_length = if total_paths == 0 {
        0.0
    } else {
        paths.iter().map(|p| p.length as f64).sum::<f64>() / total_paths as f64
    };

    let mut node_ids = HashSet::new();
    let mut edge_ids = HashSet::new();
    let mut domain_participation_counts: BTreeMap<Domain, usize> =
        Domain::ALL.into_iter().map(|d| (d, 0)).collect();

    for path in paths {
        for node in &path.nodes {
            node_ids.insert(node.id.as_str());
            *domain_participation_counts.entry(node.domain()).or_insert(0) += 1;
        }
        for edge in &path.edges {
            edge_ids.insert(edge.id.as_str());
        }
    }

    Statistics {
        total_paths,
        filtered_paths: filtered.len(),
        avg_length,
        unique_node_count: node_ids.len(),
        unique_edge_count: edge_ids.len(),
        domain_participation_counts,
    }
}

/// Valida longitudes recibidas desde fuera (pueden venir negativas).
pub fn parse_lengths(raw: &[i64]) -> PathQueryResult<BTreeSet<usize>> {
    raw.iter()
        .map(|&len| {
            usize::try_from(len).map_err(|_| {
                PathQueryError::Validation(format!("longitud de ruta negativa: {len}"))
            })
        })
        .collect()
}

pub fn parse_domains(raw: &[String]) -> PathQueryResult<BTreeSet<Domain>> {
    raw.iter().map(|d| d.parse::<Domain>()).collect()
}

/// Vista filtrada de un resultado, con estadísticas global y filtrada.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultView {
    pub paths: Vec<PathResult>,
    pub graph_data: GraphData,
    pub overall: Statistics,
    pub filtered: Statistics,
}

pub fn build_view(
    paths: &[PathResult],
    lengths: &BTreeSet<usize>,
    domains: &BTreeSet<Domain>,
) -> ResultView {
    let filtered = filter_by_domain(&filter_by_length(paths, lengths), domains);
    ResultView {
        graph_data: aggregate(&filtered),
        overall: compute_statistics(paths, &filtered),
        filtered: compute_statistics(&filtered, &filtered),
        paths: filtered,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GraphEdge, GraphNode};
    use std::collections::HashMap;

    fn node(id: &str, entity_type: &str) -> GraphNode {
        GraphNode {
            id: id.into(),
            label: id.into(),
            entity_type: entity_type.into(),
            properties: HashMap::new(),
        }
    }

    /// Ruta lineal sobre los nodos dados, con ids de relación derivados.
    fn chain(nodes: &[(&str, &str)]) -> PathResult {
        let nodes: Vec<GraphNode> = nodes.iter().map(|(id, t)| node(id, t)).collect();
        let edges: Vec<GraphEdge> = nodes
            .windows(2)
            .map(|w| GraphEdge {
                id: format!("{}-{}", w[0].id, w[1].id),
                source: w[0].id.clone(),
                target: w[1].id.clone(),
                rel_type: "RELATED_TO".into(),
                label: "RELATED_TO".into(),
                properties: HashMap::new(),
            })
            .collect();
        PathResult {
            length: edges.len(),
            path: edges.iter().map(|e| e.rel_type.clone()).collect(),
            nodes,
            edges,
            weight: None,
            confidence: None,
        }
    }

    fn sample() -> Vec<PathResult> {
        vec![
            // longitud 2: research -> clinical
            chain(&[("c1", "Compound"), ("t1", "Target"), ("ct1", "ClinicalTrial")]),
            // longitud 1: regulatory
            chain(&[("s1", "Submission"), ("a1", "Approval")]),
            // longitud 3: supply con un tipo desconocido
            chain(&[
                ("m1", "Manufacturer"),
                ("f1", "Facility"),
                ("x1", "Warehouse"),
                ("b1", "Batch"),
            ]),
        ]
    }

    fn lengths(values: &[usize]) -> BTreeSet<usize> {
        values.iter().copied().collect()
    }

    fn domains(values: &[Domain]) -> BTreeSet<Domain> {
        values.iter().copied().collect()
    }

    #[test]
    fn empty_length_filter_passes_through() {
        let paths = sample();
        assert_eq!(filter_by_length(&paths, &BTreeSet::new()), paths);
    }

    #[test]
    fn length_filter_keeps_matching_paths() {
        let kept = filter_by_length(&sample(), &lengths(&[1, 3]));
        assert_eq!(kept.iter().map(|p| p.length).collect::<Vec<_>>(), vec![1, 3]);
    }

    #[test]
    fn domain_filter_is_inclusive_or() {
        let kept = filter_by_domain(&sample(), &domains(&[Domain::Clinical]));
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].nodes[0].id, "c1");
    }

    #[test]
    fn unknown_types_count_as_default_domain() {
        let kept = filter_by_domain(&sample(), &domains(&[Domain::Research]));
        let starts: Vec<_> = kept.iter().map(|p| p.nodes[0].id.as_str()).collect();
        assert_eq!(starts, vec!["c1", "m1"]);
    }

    #[test]
    fn filters_commute() {
        let paths = sample();
        let length_sets = [lengths(&[]), lengths(&[1]), lengths(&[2, 3]), lengths(&[5])];
        let domain_sets = [
            domains(&[]),
            domains(&[Domain::Supply]),
            domains(&[Domain::Clinical, Domain::Regulatory]),
        ];
        for l in &length_sets {
            for d in &domain_sets {
                let a = filter_by_domain(&filter_by_length(&paths, l), d);
                let b = filter_by_length(&filter_by_domain(&paths, d), l);
                assert_eq!(a, b);
            }
        }
    }

    #[test]
    fn average_length_of_two_and_four_is_three() {
        let paths = vec![
            chain(&[("a", "Compound"), ("b", "Target"), ("c", "Gene")]),
            chain(&[
                ("a", "Compound"),
                ("d", "Target"),
                ("e", "Gene"),
                ("f", "Pathway"),
                ("g", "Disease"),
            ]),
        ];
        let stats = compute_statistics(&paths, &paths);
        assert_eq!(stats.avg_length, 3.0);
        assert_eq!(stats.total_paths, 2);
        assert_eq!(stats.unique_node_count, 7);
        assert_eq!(stats.unique_edge_count, 6);
    }

    #[test]
    fn summarises_full_set_and_counts_filtered_size() {
        let paths = sample();
        let filtered = filter_by_length(&paths, &lengths(&[1]));
        let stats = compute_statistics(&paths, &filtered);

        assert_eq!(stats.total_paths, 3);
        assert_eq!(stats.filtered_paths, 1);
        assert_eq!(stats.avg_length, 2.0);
        assert_eq!(stats.unique_node_count, 9);
    }

    #[test]
    fn participation_counts_occurrences_not_entities() {
        let paths = vec![
            chain(&[("c1", "Compound"), ("t1", "ClinicalTrial")]),
            chain(&[("c1", "Compound"), ("t2", "ClinicalTrial")]),
            chain(&[("c1", "Compound"), ("a1", "Approval")]),
        ];
        let stats = compute_statistics(&paths, &paths);
        assert_eq!(stats.domain_participation_counts[&Domain::Research], 3);
        assert_eq!(stats.domain_participation_counts[&Domain::Clinical], 2);
        assert_eq!(stats.domain_participation_counts[&Domain::Regulatory], 1);
        assert_eq!(stats.domain_participation_counts[&Domain::Supply], 0);
        assert_eq!(stats.unique_node_count, 4);
    }

    #[test]
    fn empty_collection_has_zero_average() {
        let stats = compute_statistics(&[], &[]);
        assert_eq!(stats.total_paths, 0);
        assert_eq!(stats.avg_length, 0.0);
    }

    #[test]
    fn rejects_negative_lengths_and_unknown_domains() {
        assert_eq!(parse_lengths(&[1, 3]).unwrap(), lengths(&[1, 3]));
        assert!(matches!(
            parse_lengths(&[2, -1]),
            Err(PathQueryError::Validation(_))
        ));
        assert_eq!(
            parse_domains(&["clinical".into()]).unwrap(),
            domains(&[Domain::Clinical])
        );
        assert!(matches!(
            parse_domains(&["marketing".into()]),
            Err(PathQueryError::UnknownDomain(_))
        ));
    }

    #[test]
    fn view_exposes_both_statistics() {
        let paths = sample();
        let view = build_view(&paths, &lengths(&[2, 3]), &domains(&[Domain::Supply]));

        assert_eq!(view.paths.len(), 1);
        assert_eq!(view.graph_data.nodes.len(), 4);
        assert_eq!(view.overall.total_paths, 3);
        assert_eq!(view.overall.filtered_paths, 1);
        assert_eq!(view.filtered.total_paths, 1);
        assert_eq!(view.filtered.avg_length, 3.0);
    }
}
