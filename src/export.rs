//! Exportación de un resultado a CSV, JSON y Graphviz DOT.

use std::fmt::Write as _;
use std::str::FromStr;

use crate::error::{PathQueryError, PathQueryResult};
use crate::models::QueryResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
    Dot,
}

impl ExportFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Json => "application/json",
            ExportFormat::Dot => "text/vnd.graphviz; charset=utf-8",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Dot => "dot",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = PathQueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "dot" | "graphviz" => Ok(Self::Dot),
            other => Err(PathQueryError::Validation(format!(
                "formato de exportación no soportado: {other}"
            ))),
        }
    }
}

pub fn export(result: &QueryResult, format: ExportFormat) -> PathQueryResult<String> {
    match format {
        ExportFormat::Csv => to_csv(result),
        ExportFormat::Json => to_json(result),
        ExportFormat::Dot => Ok(to_dot(result)),
    }
}

/// Una fila por ruta: id, longitud, cadena de nodos y cadena de relaciones.
pub fn to_csv(result: &QueryResult) -> PathQueryResult<String> {
    let storage = |e: csv::Error| PathQueryError::Storage(e.to_string());

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(["path_id", "length", "nodes", "relationships"])
        .map_err(storage)?;

    for (index, path) in result.paths.iter().enumerate() {
        let nodes = path
            .nodes
            .iter()
            .map(|n| n.label.as_str())
            .collect::<Vec<_>>()
            .join(" -> ");
        let relationships = path.path.join(" -> ");
        writer
            .write_record([
                format!("path_{}", index + 1),
                path.length.to_string(),
                nodes,
                relationships,
            ])
            .map_err(storage)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| PathQueryError::Storage(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| PathQueryError::Storage(e.to_string()))
}

pub fn to_json(result: &QueryResult) -> PathQueryResult<String> {
    serde_json::to_string_pretty(result).map_err(|e| PathQueryError::Storage(e.to_string()))
}

fn dot_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Grafo agregado en DOT, con los nodos coloreados por dominio.
pub fn to_dot(result: &QueryResult) -> String {
    let mut out = String::from("digraph paths {\n  rankdir=LR;\n  node [shape=box, style=\"rounded,filled\", fontcolor=white];\n");

    for node in &result.graph_data.nodes {
        let _ = writeln!(
            out,
            "  \"{}\" [label=\"{}\\n({})\", fillcolor=\"{}\"];",
            dot_escape(&node.id),
            dot_escape(&node.label),
            dot_escape(&node.entity_type),
            node.domain().color()
        );
    }
    for edge in &result.graph_data.edges {
        let _ = writeln!(
            out,
            "  \"{}\" -> \"{}\" [label=\"{}\"];",
            dot_escape(&edge.source),
            dot_escape(&edge.target),
            dot_escape(&edge.label)
        );
    }

    out.push_str("}\n");
    out
}
