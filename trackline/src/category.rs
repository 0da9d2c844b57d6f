//! Category declarations and the enabled-category set.
//!
//! Categories are a named, independently enableable instrumentation group.
//! They are declared once, as `&'static` data, and handed to
//! [`SessionBuilder::with_categories`](crate::SessionBuilder::with_categories);
//! the enabled set is owned by the session, not by process globals.

use std::collections::HashSet;

use crate::tl_warn;

/// Tags that leave a category disabled unless it is explicitly enabled.
const OFF_BY_DEFAULT_TAGS: &[&str] = &["debug", "verbose"];

/// A named, independently enableable instrumentation group.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Category {
    /// Name recorder calls use to select this category.
    pub name: &'static str,
    /// Human readable description.
    pub description: &'static str,
    /// Tags consulted by the default enablement policy.
    pub tags: &'static [&'static str],
}

impl Category {
    /// Create a category with no tags.
    pub const fn new(name: &'static str, description: &'static str) -> Self {
        Category {
            name,
            description,
            tags: &[],
        }
    }

    /// Create a category carrying the given tags.
    pub const fn with_tags(
        name: &'static str,
        description: &'static str,
        tags: &'static [&'static str],
    ) -> Self {
        Category {
            name,
            description,
            tags,
        }
    }

    /// True when the default policy leaves this category disabled.
    ///
    /// Categories tagged `debug` or `verbose` are off unless explicitly
    /// enabled.
    pub fn disabled_by_default(&self) -> bool {
        self.tags
            .iter()
            .any(|tag| OFF_BY_DEFAULT_TAGS.contains(tag))
    }
}

/// The set of categories a session records.
///
/// Built once at session configuration time and immutable afterwards, so
/// the membership check on the recording path needs no lock.
#[derive(Clone, Debug, Default)]
pub struct CategorySet {
    enabled: HashSet<String>,
}

impl CategorySet {
    /// Build the enabled set from declarations and explicit overrides.
    ///
    /// Tag policy decides the default; `enable` and `disable` overrides
    /// win over it, with `disable` applied last. Overrides naming an
    /// undeclared category are ignored with a warning.
    pub(crate) fn from_declarations(
        declarations: &[Category],
        enable: &[&str],
        disable: &[&str],
    ) -> Self {
        let mut enabled: HashSet<String> = declarations
            .iter()
            .filter(|category| !category.disabled_by_default())
            .map(|category| category.name.to_owned())
            .collect();

        for &name in enable {
            match declarations.iter().find(|category| category.name == name) {
                Some(category) => {
                    enabled.insert(category.name.to_owned());
                }
                None => {
                    tl_warn!(name: "CategorySet.UnknownEnableOverride", category = name);
                }
            }
        }

        for &name in disable {
            if declarations.iter().any(|category| category.name == name) {
                enabled.remove(name);
            } else {
                tl_warn!(name: "CategorySet.UnknownDisableOverride", category = name);
            }
        }

        CategorySet { enabled }
    }

    /// Membership check on the hot recording path.
    #[inline]
    pub fn is_enabled(&self, category: &str) -> bool {
        self.enabled.contains(category)
    }

    /// Number of enabled categories.
    pub fn len(&self) -> usize {
        self.enabled.len()
    }

    /// True when no category is enabled.
    pub fn is_empty(&self) -> bool {
        self.enabled.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    static DECLARATIONS: &[Category] = &[
        Category::new("rendering", "Events from the graphics subsystem"),
        Category::new("network", "Network upload and download statistics"),
        Category::with_tags("gpu.debug", "debug gpu events", &["debug"]),
        Category::with_tags("audio.latency", "Detailed audio latency metrics", &["verbose"]),
    ];

    #[rstest]
    #[case(&["debug"], true)]
    #[case(&["verbose"], true)]
    #[case(&["debug", "navigation"], true)]
    #[case(&["navigation"], false)]
    #[case(&[], false)]
    fn tag_policy(#[case] tags: &'static [&'static str], #[case] disabled: bool) {
        let category = Category::with_tags("c", "test category", tags);
        assert_eq!(category.disabled_by_default(), disabled);
    }

    #[test]
    fn untagged_categories_enabled_by_default() {
        let set = CategorySet::from_declarations(DECLARATIONS, &[], &[]);
        assert!(set.is_enabled("rendering"));
        assert!(set.is_enabled("network"));
        assert!(!set.is_enabled("gpu.debug"));
        assert!(!set.is_enabled("audio.latency"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn overrides_win_over_tag_policy() {
        let set = CategorySet::from_declarations(DECLARATIONS, &["gpu.debug"], &["network"]);
        assert!(set.is_enabled("gpu.debug"));
        assert!(!set.is_enabled("network"));
    }

    #[test]
    fn undeclared_overrides_are_ignored() {
        let set = CategorySet::from_declarations(DECLARATIONS, &["no.such.category"], &[]);
        assert!(!set.is_enabled("no.such.category"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn undeclared_categories_are_never_enabled() {
        let set = CategorySet::from_declarations(DECLARATIONS, &[], &[]);
        assert!(!set.is_enabled("test.only"));
    }
}
