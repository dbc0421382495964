//! SQL Synthesis Templates
//!
//! One template per route. The primary and secondary stores of a capability
//! are not schema-identical, so each template carries its own table name,
//! column vocabulary and dialect notes.

use std::collections::HashMap;

use serde::Serialize;

use ran_assistant_core::{BackendKind, Capability, CapabilityFamily, CapabilityId, CapabilityRegistry, Route};

/// Everything the synthesizer needs to write one query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SqlTemplate {
    pub id: String,
    pub capability: CapabilityId,
    pub backend: BackendKind,
    pub table: String,
    pub columns: Vec<&'static str>,
    pub notes: &'static str,
}

impl SqlTemplate {
    fn for_route(capability: &Capability, route: &Route) -> Self {
        Self {
            id: route.template_id.clone(),
            capability: capability.id,
            backend: route.backend,
            table: route.table.clone(),
            columns: columns_for(capability, route.backend).to_vec(),
            notes: dialect_notes(route.backend),
        }
    }

    /// System prompt for the synthesis call.
    pub fn system_prompt(&self) -> String {
        format!(
            "You write a single read-only {dialect} query.\n\
             Table: {table}\n\
             Columns: {columns}\n\
             {notes}\n\
             Rules:\n\
             - Only SELECT (or WITH ... SELECT). Never modify data.\n\
             - Use only the table and columns listed above.\n\
             - Prefer COUNT(*) for \"how many\" questions and name the count column after the subject.\n\
             - Return the query in a ```sql fenced block with no explanation.",
            dialect = self.backend.dialect(),
            table = self.table,
            columns = self.columns.join(", "),
            notes = self.notes,
        )
    }

    /// User turn for the synthesis call.
    pub fn user_message(&self, question: &str) -> String {
        format!("Question: {}", question.trim())
    }
}

/// All templates, keyed by template id.
#[derive(Debug, Clone, Default)]
pub struct TemplateCatalog {
    templates: HashMap<String, SqlTemplate>,
}

impl TemplateCatalog {
    /// Build one template for each route of each capability.
    pub fn from_registry(registry: &CapabilityRegistry) -> Self {
        let mut templates = HashMap::new();
        for capability in registry.entries() {
            for route in [&capability.primary, &capability.secondary] {
                let template = SqlTemplate::for_route(capability, route);
                templates.insert(template.id.clone(), template);
            }
        }
        Self { templates }
    }

    pub fn get(&self, template_id: &str) -> Option<&SqlTemplate> {
        self.templates.get(template_id)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

fn dialect_notes(backend: BackendKind) -> &'static str {
    match backend {
        BackendKind::Trino => {
            "Dialect notes: compare text with lower(col) = lower('value'); no trailing semicolon; \
             timestamps are TIMESTAMP, use current_timestamp - INTERVAL '1' DAY style arithmetic."
        }
        BackendKind::Postgres => {
            "Dialect notes: use ILIKE for case-insensitive matching; dates are DATE, use \
             CURRENT_DATE - INTERVAL '1 day' style arithmetic."
        }
        BackendKind::Sqlite => {
            "Dialect notes: LIKE is case-insensitive for ASCII; no ILIKE; dates are ISO-8601 TEXT, \
             use date('now', '-1 day') style arithmetic."
        }
    }
}

fn columns_for(capability: &Capability, backend: BackendKind) -> &'static [&'static str] {
    match (capability.id, backend) {
        (CapabilityId::RetState12hr, BackendKind::Trino) => &[
            "aoi", "site_id", "cell_id", "antenna_id", "tilt_deg", "ret_state", "sampled_at",
        ],
        (CapabilityId::RetState12hr, _) => &[
            "aoi_name", "site", "cell", "antenna", "tilt", "state", "snapshot_date",
        ],
        (CapabilityId::Topology, BackendKind::Trino) => &[
            "aoi", "vendor", "site_id", "cell_id", "du_id", "cucp_id", "rru_id", "band",
        ],
        (CapabilityId::Topology, _) => &[
            "aoi_name", "vendor", "site", "cell", "du", "cucp", "rru", "band", "snapshot_date",
        ],
        _ => match (capability.family, backend) {
            (CapabilityFamily::NetworkConfig, BackendKind::Trino) => &[
                "aoi", "site_id", "cell_id", "ne_id", "mo_class", "parameter_name",
                "parameter_value", "collected_at",
            ],
            (CapabilityFamily::NetworkConfig, _) => &[
                "aoi_name", "site", "cell", "ne", "mo", "param_name", "param_value",
                "snapshot_date",
            ],
            (CapabilityFamily::RecommendedConfig, BackendKind::Sqlite) => &[
                "mo", "param", "gpl_value", "band", "version",
            ],
            (CapabilityFamily::RecommendedConfig, _) => &[
                "mo_class", "parameter_name", "recommended_value", "band", "gpl_version",
            ],
            (CapabilityFamily::Misalignment, BackendKind::Sqlite) => &[
                "aoi", "site", "cell", "mo", "param", "network_value", "recommended_value",
                "run_date",
            ],
            (CapabilityFamily::Misalignment, _) => &[
                "aoi", "site_id", "cell_id", "mo_class", "parameter_name", "live_value",
                "gpl_value", "audit_date",
            ],
        },
    }
}
