//! Carga y gestión de configuración de la aplicación (backend de grafo,
//! servidor e historial).

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

use crate::history::DEFAULT_CAPACITY;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GraphBackendKind {
    Http,
    Neo4j,
}

impl FromStr for GraphBackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "neo4j" => Ok(Self::Neo4j),
            other => Err(anyhow!("Backend de grafo no soportado: {other}")),
        }
    }
}

/// Configuración completa de la aplicación.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub backend: GraphBackendKind,
    pub graph_api_url: String,
    pub neo4j_uri: String,
    pub neo4j_user: String,
    pub neo4j_password: String,
    pub neo4j_path_limit: i64,

    pub server_addr: String,
    pub open_browser: bool,

    pub max_hops_ceiling: u32,
    /// `None` desactiva el timeout de consulta.
    pub query_timeout: Option<Duration>,

    pub history_path: PathBuf,
    pub history_capacity: usize,
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("Valor no válido para {name} ('{raw}'): {e}")),
        Err(_) => Ok(default),
    }
}

fn default_history_path() -> Result<PathBuf> {
    let base = dirs::data_dir()
        .or_else(dirs::home_dir)
        .context("No se pudo determinar el directorio de datos del usuario")?;
    Ok(base.join("pharma-paths").join("query_history.json"))
}

impl AppConfig {
    /// Carga la configuración desde variables de entorno (usando .env si existe).
    pub fn from_env() -> Result<Self> {
        let backend: GraphBackendKind = var_or("GRAPH_BACKEND", "http").parse()?;

        let (neo4j_uri, neo4j_user, neo4j_password) = if backend == GraphBackendKind::Neo4j {
            (
                env::var("NEO4J_URI").map_err(|_| anyhow!("Falta NEO4J_URI en el entorno"))?,
                env::var("NEO4J_USER").map_err(|_| anyhow!("Falta NEO4J_USER en el entorno"))?,
                env::var("NEO4J_PASSWORD")
                    .map_err(|_| anyhow!("Falta NEO4J_PASSWORD en el entorno"))?,
            )
        } else {
            (
                var_or("NEO4J_URI", "bolt://localhost:7687"),
                var_or("NEO4J_USER", "neo4j"),
                var_or("NEO4J_PASSWORD", ""),
            )
        };

        let max_hops_ceiling: u32 = parse_var("MAX_HOPS_CEILING", 5)?;
        if !(1..=10).contains(&max_hops_ceiling) {
            return Err(anyhow!(
                "MAX_HOPS_CEILING debe estar entre 1 y 10 (recibido {max_hops_ceiling})"
            ));
        }

        let timeout_secs: u64 = parse_var("QUERY_TIMEOUT_SECS", 30)?;
        let query_timeout = (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs));

        let history_path = match env::var("HISTORY_PATH") {
            Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
            _ => default_history_path()?,
        };

        Ok(Self {
            backend,
            graph_api_url: var_or("GRAPH_API_URL", "http://127.0.0.1:8000"),
            neo4j_uri,
            neo4j_user,
            neo4j_password,
            neo4j_path_limit: parse_var("NEO4J_PATH_LIMIT", 100)?,
            server_addr: var_or("SERVER_ADDR", "127.0.0.1:3322"),
            open_browser: parse_var("OPEN_BROWSER", true)?,
            max_hops_ceiling,
            query_timeout,
            history_path,
            history_capacity: parse_var("HISTORY_CAPACITY", DEFAULT_CAPACITY)?,
        })
    }
}
