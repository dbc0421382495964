//! RAN Assistant Tools
//!
//! Everything between the model's free text and the orchestrator's closed
//! types. Nothing here performs I/O; the application crate owns the model and
//! backend calls and uses these helpers to build prompts and read replies.
//!
//! - `identifier` - qualified-identifier extraction and namespace ownership
//! - `prompts` - classification rubric, worked examples and guidance text
//! - `templates` - per-route SQL synthesis templates
//! - `sql` - pulling a read-only query out of generated text
//! - `decompose` - decomposer prompt and reply parsing
//! - `guards` - whole-question pre-checks

pub mod decompose;
pub mod guards;
pub mod identifier;
pub mod prompts;
pub mod sql;
pub mod templates;

pub use decompose::{decomposition_user_message, parse_sub_questions, DECOMPOSER_SYSTEM_PROMPT};
pub use guards::{requests_ratio, RATIO_UNSUPPORTED_MESSAGE};
pub use identifier::{extract_identifier, namespace_owner, normalize_identifier, ExtractedIdentifier};
pub use prompts::{classification_system_prompt, classification_user_message, guidance_message};
pub use sql::{extract_sql, SqlRejection};
pub use templates::{SqlTemplate, TemplateCatalog};
