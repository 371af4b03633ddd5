//! Catálogo de consultas predefinidas para las preguntas entre dominios más
//! habituales.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::domain::Domain;
use crate::error::{PathQueryError, PathQueryResult};
use crate::models::QueryConfig;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub domains: BTreeSet<Domain>,
    pub default_config: QueryConfig,
}

pub struct TemplateCatalog {
    templates: Vec<Template>,
}

fn template(
    id: &'static str,
    name: &'static str,
    description: &'static str,
    domains: &[Domain],
    (start, end): (&str, &str),
    max_hops: u32,
    relationship_types: &[&str],
) -> Template {
    Template {
        id,
        name,
        description,
        domains: domains.iter().copied().collect(),
        default_config: QueryConfig {
            start_entity_type: start.to_string(),
            start_entity_id: None,
            end_entity_type: end.to_string(),
            end_entity_id: None,
            max_hops,
            relationship_types: relationship_types.iter().map(|r| r.to_string()).collect(),
            selected_domains: domains.iter().copied().collect(),
        },
    }
}

impl TemplateCatalog {
    pub fn builtin() -> Self {
        use Domain::*;

        let templates = vec![
            template(
                "drug-to-approval",
                "Drug to Approval",
                "Del compuesto a su aprobación pasando por ensayos y solicitudes regulatorias",
                &[Research, Clinical, Regulatory],
                ("Compound", "Approval"),
                4,
                &["TESTED_IN_CLINICAL_TRIAL", "SUBMITTED_TO", "APPROVED_BY"],
            ),
            template(
                "target-to-trial",
                "Target to Clinical Trial",
                "Dianas terapéuticas que acaban evaluándose en un ensayo clínico",
                &[Research, Clinical],
                ("Target", "ClinicalTrial"),
                3,
                &["TARGETS", "TESTED_IN_CLINICAL_TRIAL"],
            ),
            template(
                "trial-safety-signals",
                "Trial Safety Signals",
                "Eventos adversos notificados en ensayos clínicos",
                &[Clinical],
                ("ClinicalTrial", "AdverseEvent"),
                2,
                &["REPORTED_IN", "EVALUATES"],
            ),
            template(
                "compound-supply-chain",
                "Compound Supply Chain",
                "Instalaciones donde se fabrica un compuesto",
                &[Research, Supply],
                ("Compound", "Facility"),
                3,
                &["MANUFACTURED_BY", "PRODUCED_AT"],
            ),
            template(
                "submission-to-inspection",
                "Submission to Inspection",
                "Inspecciones de planta vinculadas a una solicitud regulatoria",
                &[Regulatory, Supply],
                ("Submission", "Inspection"),
                3,
                &[],
            ),
        ];

        Self { templates }
    }

    pub fn list_templates(&self) -> &[Template] {
        &self.templates
    }

    /// Configuración por defecto de la plantilla, lista para ejecutar o editar.
    pub fn apply_template(&self, id: &str) -> PathQueryResult<QueryConfig> {
        self.templates
            .iter()
            .find(|t| t.id == id)
            .map(|t| t.default_config.clone())
            .ok_or_else(|| PathQueryError::TemplateNotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain;

    #[test]
    fn drug_to_approval_template() {
        let config = TemplateCatalog::builtin()
            .apply_template("drug-to-approval")
            .unwrap();

        assert_eq!(config.max_hops, 4);
        let expected: BTreeSet<String> = ["TESTED_IN_CLINICAL_TRIAL", "SUBMITTED_TO", "APPROVED_BY"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(config.relationship_types, expected);
        assert_eq!(config.start_entity_type, "Compound");
        assert_eq!(config.end_entity_type, "Approval");
    }

    #[test]
    fn unknown_template_is_not_found() {
        let err = TemplateCatalog::builtin()
            .apply_template("nope")
            .unwrap_err();
        assert!(matches!(err, PathQueryError::TemplateNotFound(ref id) if id == "nope"));
    }

    #[test]
    fn templates_use_registered_entity_types_and_unique_ids() {
        let catalog = TemplateCatalog::builtin();
        let mut ids = BTreeSet::new();
        for t in catalog.list_templates() {
            assert!(ids.insert(t.id), "id duplicado: {}", t.id);
            assert!(domain::domain_of(&t.default_config.start_entity_type).is_ok());
            assert!(domain::domain_of(&t.default_config.end_entity_type).is_ok());
            assert!((1..=5).contains(&t.default_config.max_hops));
        }
        assert_eq!(ids.len(), 5);
    }
}
