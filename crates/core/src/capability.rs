//! Capability Registry
//!
//! A capability is one routable unit of functionality: a vendor x
//! configuration-domain x table combination that a top-level tool can answer
//! questions about. The registry is built once at startup, never mutated, and
//! passed into the orchestrator explicitly.
//!
//! Resolution from a classifier identifier to a capability uses bidirectional,
//! case-insensitive substring containment against the capability keys of one
//! family, in declaration order. The first match wins.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

// ============================================================================
// Backends, vendors, families
// ============================================================================

/// The three heterogeneous data stores a capability can be answered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Data lake holding live CM dumps, queried over the Trino REST protocol.
    Trino,
    /// GPL baselines, misalignment audit, and a snapshot replica of CM tables.
    Postgres,
    /// Local snapshot store of GPL and audit exports.
    Sqlite,
}

impl BackendKind {
    pub const ALL: [BackendKind; 3] = [BackendKind::Trino, BackendKind::Postgres, BackendKind::Sqlite];

    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Trino => "trino",
            BackendKind::Postgres => "postgres",
            BackendKind::Sqlite => "sqlite",
        }
    }

    /// SQL dialect name handed to the synthesizer.
    pub fn dialect(&self) -> &'static str {
        match self {
            BackendKind::Trino => "Trino SQL",
            BackendKind::Postgres => "PostgreSQL",
            BackendKind::Sqlite => "SQLite",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// RAN equipment vendors the assistant knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Vendor {
    Mavenir,
    Samsung,
}

impl Vendor {
    /// Detection vocabulary, in the order it is tested.
    pub const ALL: [Vendor; 2] = [Vendor::Mavenir, Vendor::Samsung];

    /// Lower-case keyword searched for in question text.
    pub fn keyword(&self) -> &'static str {
        match self {
            Vendor::Mavenir => "mavenir",
            Vendor::Samsung => "samsung",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Vendor::Mavenir => "Mavenir",
            Vendor::Samsung => "Samsung",
        }
    }

    /// Detect a vendor by case-insensitive substring match.
    ///
    /// Returns `None` when no keyword occurs; a vendor is never guessed.
    pub fn detect(text: &str) -> Option<Vendor> {
        let lower = text.to_lowercase();
        Self::ALL.into_iter().find(|v| lower.contains(v.keyword()))
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A capability family. Each family is one top-level tool, and the family is
/// fixed by which tool was invoked rather than re-derived per sub-question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityFamily {
    /// Live network configuration pulled from the network.
    NetworkConfig,
    /// GPL recommended values.
    RecommendedConfig,
    /// Misalignment audit between live values and the GPL baseline.
    Misalignment,
}

impl CapabilityFamily {
    pub const ALL: [CapabilityFamily; 3] = [
        CapabilityFamily::NetworkConfig,
        CapabilityFamily::RecommendedConfig,
        CapabilityFamily::Misalignment,
    ];

    /// Name of the top-level tool that serves this family.
    pub fn tool_name(&self) -> &'static str {
        match self {
            CapabilityFamily::NetworkConfig => "network_config_tool",
            CapabilityFamily::RecommendedConfig => "recommended_config_tool",
            CapabilityFamily::Misalignment => "misalignment_tool",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            CapabilityFamily::NetworkConfig => {
                "network configuration (live parameter values, RET state, topology)"
            }
            CapabilityFamily::RecommendedConfig => {
                "recommended configuration (GPL recommended parameter values)"
            }
            CapabilityFamily::Misalignment => {
                "misalignment audits (live values that differ from the GPL baseline)"
            }
        }
    }
}

impl fmt::Display for CapabilityFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CapabilityFamily::NetworkConfig => "network_config",
            CapabilityFamily::RecommendedConfig => "recommended_config",
            CapabilityFamily::Misalignment => "misalignment",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for CapabilityFamily {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "network" | "network_config" | "network_config_tool" | "live" => {
                Ok(CapabilityFamily::NetworkConfig)
            }
            "gpl" | "recommended" | "recommended_config" | "recommended_config_tool" => {
                Ok(CapabilityFamily::RecommendedConfig)
            }
            "misalignment" | "audit" | "misalignment_tool" => Ok(CapabilityFamily::Misalignment),
            other => Err(CoreError::parse(format!("unknown capability family: {}", other))),
        }
    }
}

// ============================================================================
// Capabilities
// ============================================================================

/// Closed set of capabilities the assistant can route to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityId {
    RetState12hr,
    Topology,
    MavenirCucpConfig,
    MavenirCuupConfig,
    MavenirDuConfig,
    MavenirRruConfig,
    SamsungCucpConfig,
    SamsungDuConfig,
    SamsungRruConfig,
    MavenirGplCucp,
    MavenirGplCuup,
    MavenirGplDu,
    MavenirGplRru,
    SamsungGplCucp,
    SamsungGplDu,
    SamsungGplRru,
    MavenirMisalignment,
    SamsungMisalignment,
}

/// One executable path for a capability: which backend, which table, and
/// which tool/template produce the query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub backend: BackendKind,
    /// Table the synthesized query reads from, as the backend names it.
    pub table: String,
    pub tool_name: String,
    /// Template handed to the SQL synthesizer.
    pub template_id: String,
}

/// A routable capability with its primary route and its single fallback hop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capability {
    pub id: CapabilityId,
    /// Identifier matched against classifier output (a table-like token).
    pub key: String,
    pub family: CapabilityFamily,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor: Option<Vendor>,
    pub description: String,
    pub primary: Route,
    pub secondary: Route,
}

impl Capability {
    /// Backend kind that owns this capability by default.
    pub fn backend(&self) -> BackendKind {
        self.primary.backend
    }

    /// Tool that answers questions for this capability by default.
    pub fn tool_name(&self) -> &str {
        &self.primary.tool_name
    }

    /// Order the two routes for one request.
    ///
    /// `owner` is the backend that owns the namespace the classifier named.
    /// When it is the secondary route's backend, that route is tried first and
    /// the default primary becomes the fallback hop.
    pub fn routes_for(&self, owner: Option<BackendKind>) -> (&Route, &Route) {
        match owner {
            Some(kind) if kind == self.secondary.backend && kind != self.primary.backend => {
                (&self.secondary, &self.primary)
            }
            _ => (&self.primary, &self.secondary),
        }
    }
}

// ============================================================================
// Classification failure
// ============================================================================

/// Why classification did not produce a capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    NoIdentifier,
    NoToolMatch,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::NoIdentifier => write!(f, "no identifier extracted"),
            FailureKind::NoToolMatch => write!(f, "no tool match"),
        }
    }
}

/// A normal, non-fatal classification outcome. Callers turn it into a
/// guidance message; it never propagates as an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationFailure {
    pub reason: FailureKind,
    /// The identifier or reply text that could not be resolved.
    pub detail: String,
}

impl ClassificationFailure {
    pub fn no_identifier(detail: impl Into<String>) -> Self {
        Self {
            reason: FailureKind::NoIdentifier,
            detail: detail.into(),
        }
    }

    pub fn no_tool_match(detail: impl Into<String>) -> Self {
        Self {
            reason: FailureKind::NoToolMatch,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for ClassificationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.reason, self.detail)
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Immutable, ordered catalog of capabilities.
#[derive(Debug, Clone)]
pub struct CapabilityRegistry {
    entries: Vec<Capability>,
}

impl CapabilityRegistry {
    /// Build a registry from explicit entries.
    ///
    /// Keys must be unique and non-empty, and each capability's two routes
    /// must target different backends.
    pub fn from_entries(entries: Vec<Capability>) -> CoreResult<Self> {
        for (i, entry) in entries.iter().enumerate() {
            if entry.key.trim().is_empty() {
                return Err(CoreError::config(format!("capability {:?} has an empty key", entry.id)));
            }
            if entry.primary.backend == entry.secondary.backend {
                return Err(CoreError::config(format!(
                    "capability {} routes primary and secondary to the same backend ({})",
                    entry.key, entry.primary.backend
                )));
            }
            if entries[..i].iter().any(|e| e.key.eq_ignore_ascii_case(&entry.key)) {
                return Err(CoreError::config(format!("duplicate capability key: {}", entry.key)));
            }
        }
        Ok(Self { entries })
    }

    /// The built-in capability catalog.
    pub fn builtin() -> Self {
        use CapabilityFamily::*;
        use CapabilityId::*;

        let entries = vec![
            live(RetState12hr, "ran_ret_state_12hr", None, "Remote electrical tilt (RET) state per antenna, refreshed every 12 hours"),
            live(Topology, "ran_topology", None, "Site, cell, DU, CUCP and RRU topology with bands and AOI membership"),
            live(MavenirCucpConfig, "mavenir_cucp_config", Some(Vendor::Mavenir), "Live Mavenir CUCP parameter values"),
            live(MavenirCuupConfig, "mavenir_cuup_config", Some(Vendor::Mavenir), "Live Mavenir CUUP parameter values"),
            live(MavenirDuConfig, "mavenir_du_config", Some(Vendor::Mavenir), "Live Mavenir DU parameter values"),
            live(MavenirRruConfig, "mavenir_rru_config", Some(Vendor::Mavenir), "Live Mavenir RRU parameter values"),
            live(SamsungCucpConfig, "samsung_cucp_config", Some(Vendor::Samsung), "Live Samsung CUCP parameter values"),
            live(SamsungDuConfig, "samsung_du_config", Some(Vendor::Samsung), "Live Samsung DU parameter values"),
            live(SamsungRruConfig, "samsung_rru_config", Some(Vendor::Samsung), "Live Samsung RRU parameter values"),
            baseline(RecommendedConfig, MavenirGplCucp, "mavenir_gpl_cucp", Vendor::Mavenir, "gpl", "GPL recommended values for Mavenir CUCP parameters"),
            baseline(RecommendedConfig, MavenirGplCuup, "mavenir_gpl_cuup", Vendor::Mavenir, "gpl", "GPL recommended values for Mavenir CUUP parameters"),
            baseline(RecommendedConfig, MavenirGplDu, "mavenir_gpl_du", Vendor::Mavenir, "gpl", "GPL recommended values for Mavenir DU parameters"),
            baseline(RecommendedConfig, MavenirGplRru, "mavenir_gpl_rru", Vendor::Mavenir, "gpl", "GPL recommended values for Mavenir RRU parameters"),
            baseline(RecommendedConfig, SamsungGplCucp, "samsung_gpl_cucp", Vendor::Samsung, "gpl", "GPL recommended values for Samsung CUCP parameters"),
            baseline(RecommendedConfig, SamsungGplDu, "samsung_gpl_du", Vendor::Samsung, "gpl", "GPL recommended values for Samsung DU parameters"),
            baseline(RecommendedConfig, SamsungGplRru, "samsung_gpl_rru", Vendor::Samsung, "gpl", "GPL recommended values for Samsung RRU parameters"),
            baseline(Misalignment, MavenirMisalignment, "mavenir_misalignment", Vendor::Mavenir, "audit", "Mavenir parameters whose live value differs from the GPL value"),
            baseline(Misalignment, SamsungMisalignment, "samsung_misalignment", Vendor::Samsung, "audit", "Samsung parameters whose live value differs from the GPL value"),
        ];

        Self { entries }
    }

    /// All capabilities in declaration order.
    pub fn entries(&self) -> &[Capability] {
        &self.entries
    }

    /// Capabilities of one family, in declaration order.
    pub fn in_family(&self, family: CapabilityFamily) -> impl Iterator<Item = &Capability> {
        self.entries.iter().filter(move |c| c.family == family)
    }

    pub fn get(&self, id: CapabilityId) -> Option<&Capability> {
        self.entries.iter().find(|c| c.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve a normalized identifier to a capability within one family.
    ///
    /// Matches when the identifier contains the key or the key contains the
    /// identifier, ignoring case. Declaration order breaks ties.
    pub fn resolve(
        &self,
        family: CapabilityFamily,
        identifier: &str,
    ) -> Result<&Capability, ClassificationFailure> {
        let needle = identifier.trim().to_lowercase();
        if needle.is_empty() {
            return Err(ClassificationFailure::no_identifier(identifier));
        }

        self.in_family(family)
            .find(|c| {
                let key = c.key.to_lowercase();
                needle.contains(&key) || key.contains(&needle)
            })
            .ok_or_else(|| ClassificationFailure::no_tool_match(needle))
    }
}

impl Default for CapabilityRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Live configuration: Trino data lake first, Postgres snapshot replica second.
fn live(id: CapabilityId, key: &str, vendor: Option<Vendor>, description: &str) -> Capability {
    Capability {
        id,
        key: key.to_string(),
        family: CapabilityFamily::NetworkConfig,
        vendor,
        description: description.to_string(),
        primary: Route {
            backend: BackendKind::Trino,
            table: format!("hive.ran_cm.{}", key),
            tool_name: format!("{}_tool", key),
            template_id: format!("trino.{}", key),
        },
        secondary: Route {
            backend: BackendKind::Postgres,
            table: format!("cm_snapshot.{}", key),
            tool_name: format!("{}_snapshot_tool", key),
            template_id: format!("postgres.{}", key),
        },
    }
}

/// GPL and audit tables: Postgres schema first, local SQLite snapshot second.
fn baseline(
    family: CapabilityFamily,
    id: CapabilityId,
    key: &str,
    vendor: Vendor,
    schema: &str,
    description: &str,
) -> Capability {
    Capability {
        id,
        key: key.to_string(),
        family,
        vendor: Some(vendor),
        description: description.to_string(),
        primary: Route {
            backend: BackendKind::Postgres,
            table: format!("{}.{}", schema, key),
            tool_name: format!("{}_tool", key),
            template_id: format!("postgres.{}", key),
        },
        secondary: Route {
            backend: BackendKind::Sqlite,
            table: key.to_string(),
            tool_name: format!("{}_snapshot_tool", key),
            template_id: format!("sqlite.{}", key),
        },
    }
}
