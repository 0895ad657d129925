//! Group-level default tokens.
//!
//! A group can carry a value of its own through a reserved child key. Draft
//! files use a configurable set of legacy markers (`_`, `@`, `DEFAULT` by
//! default); 2025.10 files use `$root`. Either way the token takes the group's
//! own path, so switching conventions never changes a derived name:
//!
//! ```rust
//! use dtls_core::root::{root_token_path, DEFAULT_GROUP_MARKERS};
//! use dtls_core::SchemaVersion;
//!
//! let group = vec!["color".to_string(), "primary".to_string()];
//! assert_eq!(
//!     root_token_path(&group, "$root", SchemaVersion::V2025_10),
//!     root_token_path(&group, "_", SchemaVersion::Draft),
//! );
//! ```

use crate::schema::SchemaVersion;

/// Reserved root key of the 2025.10 schema.
pub const ROOT_KEY: &str = "$root";

/// Legacy markers used by Draft files when none are configured.
pub const DEFAULT_GROUP_MARKERS: &[&str] = &["_", "@", "DEFAULT"];

/// Returns the default marker set as owned strings.
pub fn default_group_markers() -> Vec<String> {
    DEFAULT_GROUP_MARKERS.iter().map(|m| m.to_string()).collect()
}

/// Reports whether `name` introduces the group's own token.
///
/// Under 2025.10 only `$root` qualifies and `group_markers` is ignored. Under
/// Draft only an exact member of `group_markers` qualifies; `$root` is not
/// special there.
pub fn is_root_token<S: AsRef<str>>(name: &str, version: SchemaVersion, group_markers: &[S]) -> bool {
    match version {
        SchemaVersion::V2025_10 => name == ROOT_KEY,
        SchemaVersion::Draft => group_markers.iter().any(|m| m.as_ref() == name),
        SchemaVersion::Unknown => false,
    }
}

/// Path of a root token: always the group's own path.
pub fn root_token_path(group_path: &[String], _root_name: &str, _version: SchemaVersion) -> Vec<String> {
    group_path.to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_2025_only_root_key() {
        assert!(is_root_token("$root", SchemaVersion::V2025_10, DEFAULT_GROUP_MARKERS));
        assert!(!is_root_token("_", SchemaVersion::V2025_10, DEFAULT_GROUP_MARKERS));
        assert!(!is_root_token("DEFAULT", SchemaVersion::V2025_10, &["DEFAULT"]));
    }

    #[test]
    fn test_draft_uses_markers() {
        assert!(is_root_token("_", SchemaVersion::Draft, DEFAULT_GROUP_MARKERS));
        assert!(is_root_token("DEFAULT", SchemaVersion::Draft, DEFAULT_GROUP_MARKERS));
        assert!(!is_root_token("default", SchemaVersion::Draft, DEFAULT_GROUP_MARKERS));
        assert!(!is_root_token("$root", SchemaVersion::Draft, DEFAULT_GROUP_MARKERS));
    }

    #[test]
    fn test_draft_with_custom_markers() {
        let markers = vec!["base".to_string()];
        assert!(is_root_token("base", SchemaVersion::Draft, &markers));
        assert!(!is_root_token("_", SchemaVersion::Draft, &markers));
    }

    #[test]
    fn test_root_path_is_group_path() {
        let group = vec!["a".to_string(), "b".to_string()];
        assert_eq!(root_token_path(&group, "$root", SchemaVersion::V2025_10), group);
        assert_eq!(root_token_path(&[], "_", SchemaVersion::Draft), Vec::<String>::new());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn root_path_independent_of_convention(
                group in prop::collection::vec("[a-z0-9-]{1,8}", 0..6),
                marker in prop::sample::select(DEFAULT_GROUP_MARKERS.to_vec()),
            ) {
                prop_assert_eq!(
                    root_token_path(&group, ROOT_KEY, SchemaVersion::V2025_10),
                    root_token_path(&group, marker, SchemaVersion::Draft)
                );
            }
        }
    }
}
