//! Field directives — per-field naming and inclusion rules.
//!
//! A directive is parsed from a field's annotation text: `name[,option]*`.
//!
//! - `""` or no annotation → the declared identifier, included, no options
//! - `"desc"` → renamed to `desc`
//! - `"Long,vip"` → named `Long`, with the force-include option
//! - `"-"` (or `"-,anything"`) → excluded from encode and decode
//!
//! With serde, the annotation is the field's serde name, so options are
//! attached with `#[serde(rename = "Long,vip")]`. Parsed directives are
//! cached for the life of the process in [`DirectiveCache::global`].

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use tracing::trace;

/// Name segment that excludes a field entirely.
pub const EXCLUDE: &str = "-";

/// Option that keeps a field in the output even when it holds its zero value.
pub const FORCE_INCLUDE: &str = "vip";

const SEPARATOR: char = ',';

/// The resolved configuration of one declared field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDirective {
    /// Key segment used for this field on the wire.
    pub name: String,
    /// `false` when the annotation names the [`EXCLUDE`] sentinel.
    pub included: bool,
    /// Every segment after the name, verbatim.
    pub options: BTreeSet<String>,
}

impl FieldDirective {
    /// Parse an annotation attached to the field declared as `identifier`.
    ///
    /// Never fails: absent or malformed annotations degrade to defaults.
    pub fn parse(annotation: Option<&str>, identifier: &str) -> Self {
        let annotation = annotation.unwrap_or_default();
        let mut segments = annotation.split(SEPARATOR);
        let head = segments.next().unwrap_or_default();

        if head == EXCLUDE {
            return Self {
                name: identifier.to_string(),
                included: false,
                options: BTreeSet::new(),
            };
        }

        let name = if head.is_empty() { identifier } else { head };
        Self {
            name: name.to_string(),
            included: true,
            options: segments
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    /// Parse the name serde reports for a field, which doubles as its annotation.
    ///
    /// serde has already replaced the declared identifier with the rename, so
    /// a name with an empty head such as `",vip"` has nothing to fall back to
    /// and resolves to the empty key.
    pub fn from_serde_name(field: &str) -> Self {
        let identifier = field.split(SEPARATOR).next().unwrap_or(field);
        if identifier.is_empty() && !field.is_empty() {
            trace!(field, "field directive has an empty name");
        }
        Self::parse(Some(field), identifier)
    }

    pub fn has_option(&self, option: &str) -> bool {
        self.options.contains(option)
    }

    /// Whether zero values of this field are still encoded.
    pub fn force_include(&self) -> bool {
        self.has_option(FORCE_INCLUDE)
    }
}

/// Populate-once, read-many cache of parsed directives keyed by serde field name.
///
/// A directive depends only on the field's name string, so two types sharing a
/// field name share the entry.
#[derive(Debug, Default)]
pub struct DirectiveCache {
    entries: RwLock<HashMap<&'static str, Arc<FieldDirective>>>,
}

static GLOBAL: LazyLock<DirectiveCache> = LazyLock::new(DirectiveCache::default);

impl DirectiveCache {
    /// The process-wide cache used by the encoder and decoder.
    pub fn global() -> &'static DirectiveCache {
        &GLOBAL
    }

    /// Look up (parsing on first use) the directive for a serde field name.
    pub fn get(&self, field: &'static str) -> Arc<FieldDirective> {
        if let Some(hit) = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(field)
        {
            return Arc::clone(hit);
        }

        let parsed = Arc::new(FieldDirective::from_serde_name(field));
        trace!(field, name = %parsed.name, included = parsed.included, "parsed field directive");
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(entries.entry(field).or_insert(parsed))
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_annotation_uses_identifier() {
        let d = FieldDirective::parse(None, "Id");
        assert_eq!(d.name, "Id");
        assert!(d.included);
        assert!(d.options.is_empty());
    }

    #[test]
    fn name_override() {
        let d = FieldDirective::parse(Some("desc"), "Description");
        assert_eq!(d.name, "desc");
        assert!(!d.force_include());
    }

    #[test]
    fn leading_separator_keeps_identifier() {
        let d = FieldDirective::parse(Some(",vip"), "Long");
        assert_eq!(d.name, "Long");
        assert!(d.force_include());
    }

    #[test]
    fn options_recorded_verbatim() {
        let d = FieldDirective::parse(Some("n,vip,other,"), "N");
        assert_eq!(d.name, "n");
        let opts: Vec<&str> = d.options.iter().map(String::as_str).collect();
        assert_eq!(opts, ["other", "vip"]);
    }

    #[test]
    fn exclusion_stops_parsing() {
        let d = FieldDirective::parse(Some("-,vip"), "Height");
        assert!(!d.included);
        assert!(d.options.is_empty());
    }

    #[test]
    fn serde_name_carries_options() {
        let d = FieldDirective::from_serde_name("Long,vip");
        assert_eq!(d.name, "Long");
        assert!(d.force_include());
    }

    #[test]
    fn serde_name_with_empty_head_is_the_empty_key() {
        let d = FieldDirective::from_serde_name(",vip");
        assert_eq!(d.name, "");
        assert!(d.included);
        assert!(d.force_include());
    }

    #[test]
    fn cache_parses_once() {
        let cache = DirectiveCache::default();
        let a = cache.get("desc,vip");
        let b = cache.get("desc,vip");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }
}
