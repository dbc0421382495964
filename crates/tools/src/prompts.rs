//! Classification Prompts
//!
//! One system prompt per capability family: the candidate tables, a decision
//! rubric and worked examples. The model is asked to answer with a single
//! table name, which `identifier::extract_identifier` then parses.

use ran_assistant_core::{CapabilityFamily, CapabilityRegistry, ClassificationFailure, Vendor};

/// A question and the table the classifier should answer with.
#[derive(Debug, Clone, Copy)]
pub struct WorkedExample {
    pub question: &'static str,
    pub answer: &'static str,
}

const NETWORK_RUBRIC: &str = "\
- Mentions RET, remote electrical tilt, antenna tilt or tilt state -> hive.ran_cm.ran_ret_state_12hr
- Mentions topology, sites, cells, bands, AOI membership or counts of network elements -> hive.ran_cm.ran_topology
- Asks for the current, live or configured value of a parameter -> the vendor's config table for the \
network function named (CUCP, CUUP, DU or RRU)
- No network function named -> use the DU table of the named vendor
- Samsung has no CUUP table; CUUP questions for Samsung use samsung_cucp_config";

const NETWORK_EXAMPLES: &[WorkedExample] = &[
    WorkedExample {
        question: "What is the current tilt of the antennas at site NY123?",
        answer: "hive.ran_cm.ran_ret_state_12hr",
    },
    WorkedExample {
        question: "Which cells in MCA AOI are on band n71?",
        answer: "hive.ran_cm.ran_topology",
    },
    WorkedExample {
        question: "Show the configured value of gapOffset on mavenir DUs in MCA AOI",
        answer: "hive.ran_cm.mavenir_du_config",
    },
    WorkedExample {
        question: "What is maxNrofUEs set to on mavenir CUUP?",
        answer: "hive.ran_cm.mavenir_cuup_config",
    },
    WorkedExample {
        question: "List samsung RRU tx power values for site DAL001",
        answer: "hive.ran_cm.samsung_rru_config",
    },
    WorkedExample {
        question: "Current value of t310 on samsung CUCP",
        answer: "hive.ran_cm.samsung_cucp_config",
    },
];

const RECOMMENDED_RUBRIC: &str = "\
- Asks what a parameter should be, its recommended, golden, GPL or baseline value -> the vendor's \
GPL table for the network function named
- Network function words: CUCP (control plane, RRC, mobility), CUUP (user plane, PDCP), DU \
(scheduler, MAC, gapOffset, SSB), RRU (radio, power, antenna ports)
- No network function named -> use the DU table of the named vendor
- Samsung has no CUUP GPL table; use samsung_gpl_cucp";

const RECOMMENDED_EXAMPLES: &[WorkedExample] = &[
    WorkedExample {
        question: "What is the recommended gapOffset for mavenir?",
        answer: "gpl.mavenir_gpl_du",
    },
    WorkedExample {
        question: "GPL value of t304 on mavenir CUCP",
        answer: "gpl.mavenir_gpl_cucp",
    },
    WorkedExample {
        question: "What should pdcp discard timer be on mavenir CUUP?",
        answer: "gpl.mavenir_gpl_cuup",
    },
    WorkedExample {
        question: "Golden value for samsung RRU max tx power",
        answer: "gpl.samsung_gpl_rru",
    },
    WorkedExample {
        question: "Baseline ssbPeriodicity for samsung",
        answer: "gpl.samsung_gpl_du",
    },
];

const MISALIGNMENT_RUBRIC: &str = "\
- Asks about misalignments, mismatches, deviations, discrepancies or audit results -> the vendor's \
misalignment table
- Asks which cells, sites or parameters are not aligned with GPL -> the vendor's misalignment table
- Vendor decides the table: mavenir -> audit.mavenir_misalignment, samsung -> audit.samsung_misalignment";

const MISALIGNMENT_EXAMPLES: &[WorkedExample] = &[
    WorkedExample {
        question: "What misalignments do we have for gapOffset parameter in MCA AOI for mavenir?",
        answer: "audit.mavenir_misalignment",
    },
    WorkedExample {
        question: "Which samsung cells deviate from GPL on t310?",
        answer: "audit.samsung_misalignment",
    },
    WorkedExample {
        question: "How many mavenir parameters are misaligned at site NY123?",
        answer: "audit.mavenir_misalignment",
    },
    WorkedExample {
        question: "Audit results for samsung DUs in DAL AOI",
        answer: "audit.samsung_misalignment",
    },
];

/// Decision rubric for a family.
pub fn rubric(family: CapabilityFamily) -> &'static str {
    match family {
        CapabilityFamily::NetworkConfig => NETWORK_RUBRIC,
        CapabilityFamily::RecommendedConfig => RECOMMENDED_RUBRIC,
        CapabilityFamily::Misalignment => MISALIGNMENT_RUBRIC,
    }
}

/// Worked examples for a family.
pub fn worked_examples(family: CapabilityFamily) -> &'static [WorkedExample] {
    match family {
        CapabilityFamily::NetworkConfig => NETWORK_EXAMPLES,
        CapabilityFamily::RecommendedConfig => RECOMMENDED_EXAMPLES,
        CapabilityFamily::Misalignment => MISALIGNMENT_EXAMPLES,
    }
}

/// System prompt for classifying a sub-question within `family`.
pub fn classification_system_prompt(
    family: CapabilityFamily,
    registry: &CapabilityRegistry,
) -> String {
    let mut prompt = format!(
        "You route questions about {} to exactly one table.\n\n## Tables\n",
        family.description()
    );

    for capability in registry.in_family(family) {
        prompt.push_str(&format!(
            "- {}: {}\n",
            capability.primary.table, capability.description
        ));
    }

    prompt.push_str("\n## Rubric\n");
    prompt.push_str(rubric(family));
    prompt.push_str("\n\n## Examples\n");
    for example in worked_examples(family) {
        prompt.push_str(&format!("Q: {}\nA: {}\n", example.question, example.answer));
    }

    prompt.push_str(
        "\nAnswer with the fully qualified table name only. If no table fits, answer NONE.",
    );
    prompt
}

/// User turn for one classification call.
pub fn classification_user_message(question: &str, vendor_hint: Option<Vendor>) -> String {
    match vendor_hint {
        Some(vendor) => format!("Vendor: {}\nQ: {}", vendor.label(), question),
        None => format!("Q: {}", question),
    }
}

/// User-facing text for a classification failure. Always lists what the
/// assistant can answer.
pub fn guidance_message(family: CapabilityFamily, failure: &ClassificationFailure) -> String {
    tracing::debug!(family = %family, reason = %failure.reason, detail = %failure.detail, "building guidance");
    let mut msg = String::from(
        "I couldn't match this question to the data I have. I can answer questions about:\n",
    );
    for f in CapabilityFamily::ALL {
        msg.push_str(&format!("- {}\n", f.description()));
    }
    msg.push_str("Try naming the vendor (Mavenir or Samsung), the network function and the parameter.");
    msg
}
