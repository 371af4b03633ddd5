//! Registro de dominios: clasifica cada tipo de entidad del grafo en uno de
//! los cuatro grupos (investigación, clínico, suministro, regulatorio) y
//! expone el color con el que el frontend los pinta.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PathQueryError, PathQueryResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Research,
    Clinical,
    Supply,
    Regulatory,
}

/// Dominio asignado a los tipos que el registro no conoce.
pub const DEFAULT_DOMAIN: Domain = Domain::Research;

impl Domain {
    pub const ALL: [Domain; 4] = [
        Domain::Research,
        Domain::Clinical,
        Domain::Supply,
        Domain::Regulatory,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Research => "research",
            Domain::Clinical => "clinical",
            Domain::Supply => "supply",
            Domain::Regulatory => "regulatory",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Domain::Research => "Research",
            Domain::Clinical => "Clinical",
            Domain::Supply => "Supply Chain",
            Domain::Regulatory => "Regulatory",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Domain::Research => "#1890ff",
            Domain::Clinical => "#52c41a",
            Domain::Supply => "#fa8c16",
            Domain::Regulatory => "#722ed1",
        }
    }

    pub fn entity_types(&self) -> &'static [&'static str] {
        match self {
            Domain::Research => &[
                "Compound",
                "Target",
                "Gene",
                "Pathway",
                "Disease",
                "Assay",
                "Publication",
                "Biomarker",
            ],
            Domain::Clinical => &[
                "ClinicalTrial",
                "Intervention",
                "Patient",
                "Site",
                "Investigator",
                "Outcome",
                "AdverseEvent",
                "Sponsor",
            ],
            Domain::Supply => &[
                "Manufacturer",
                "Supplier",
                "Facility",
                "Batch",
                "Product",
                "Shipment",
            ],
            Domain::Regulatory => &[
                "Submission",
                "RegulatoryAgency",
                "Approval",
                "Label",
                "Inspection",
                "Patent",
            ],
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = PathQueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "research" => Ok(Domain::Research),
            "clinical" => Ok(Domain::Clinical),
            "supply" => Ok(Domain::Supply),
            "regulatory" => Ok(Domain::Regulatory),
            other => Err(PathQueryError::UnknownDomain(other.to_string())),
        }
    }
}

/// Dominio de un tipo de entidad. Falla si el tipo no está registrado.
pub fn domain_of(entity_type: &str) -> PathQueryResult<Domain> {
    Domain::ALL
        .into_iter()
        .find(|domain| domain.entity_types().contains(&entity_type))
        .ok_or_else(|| PathQueryError::UnknownEntityType(entity_type.to_string()))
}

/// Igual que [`domain_of`] pero total: los tipos desconocidos caen en
/// [`DEFAULT_DOMAIN`], de modo que un esquema nuevo en el backend no rompe
/// los filtros ni las estadísticas.
pub fn classify(entity_type: &str) -> Domain {
    domain_of(entity_type).unwrap_or(DEFAULT_DOMAIN)
}

/// Descripción serializable de un dominio para `GET /api/domains`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainInfo {
    pub id: Domain,
    pub name: &'static str,
    pub color: &'static str,
    pub entity_types: Vec<&'static str>,
}

pub fn list_domains() -> Vec<DomainInfo> {
    Domain::ALL
        .into_iter()
        .map(|domain| DomainInfo {
            id: domain,
            name: domain.display_name(),
            color: domain.color(),
            entity_types: domain.entity_types().to_vec(),
        })
        .collect()
}
