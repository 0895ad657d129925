//! Schema versions, detection, validation and per-version handlers.

mod detector;
mod handler;
mod registry;
mod validation;
mod version;

pub use detector::{
    declared_version, detect_version, detect_version_in, detect_version_with_validation,
    DetectionConfig,
};
pub use handler::{DraftHandler, Feature, SchemaHandler, V2025_10Handler};
pub use registry::{default_registry, Registry};
pub use validation::{
    validate_document, validate_schema_consistency, validate_schema_consistency_with_path,
};
pub use version::{SchemaVersion, DRAFT_SCHEMA_URL, V2025_10_SCHEMA_URL};
