//! Applying section deltas.

use crate::section::{SectionDelta, SectionMap};
use tracing::debug;

/// Apply `delta` to `base`, returning a new section map.
///
/// Categories are applied in a fixed order: modified, then added, then
/// removed. A name that is both added and removed ends up removed, and
/// removing a name the base does not contain is a no-op.
pub fn apply(base: &SectionMap, delta: &SectionDelta) -> SectionMap {
    let mut sections = base.clone();

    for (name, section) in &delta.modified {
        debug!(section = %name, "Modified section");
        sections.insert(name.clone(), section.clone());
    }

    for (name, section) in &delta.added {
        debug!(section = %name, "Added section");
        sections.insert(name.clone(), section.clone());
    }

    for name in &delta.removed {
        if sections.remove(name).is_some() {
            debug!(section = %name, "Removed section");
        } else {
            debug!(section = %name, "Section to remove not present");
        }
    }

    sections
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::section::SectionData;

    fn base() -> SectionMap {
        let mut sections = SectionMap::new();
        sections.insert("header".to_string(), SectionData::new("// header", 1));
        sections.insert("body".to_string(), SectionData::new("fn main() {}", 3));
        sections
    }

    #[test]
    fn test_apply_does_not_mutate_base() {
        let base = base();
        let before = base.clone();
        let delta = SectionDelta::new()
            .modify("body", SectionData::new("fn main() { run() }", 3))
            .remove("header");

        let patched = apply(&base, &delta);

        assert_eq!(base, before);
        assert_eq!(patched.len(), 1);
        assert_eq!(patched["body"].content, "fn main() { run() }");
    }

    #[test]
    fn test_added_then_removed_ends_removed() {
        let delta = SectionDelta::new()
            .add("footer", SectionData::new("// end", 9))
            .remove("footer");
        let patched = apply(&base(), &delta);
        assert!(!patched.contains_key("footer"));
    }

    #[test]
    fn test_added_overwrites_existing_name() {
        let delta = SectionDelta::new()
            .modify("body", SectionData::new("modified", 3))
            .add("body", SectionData::new("added", 3));
        let patched = apply(&base(), &delta);
        assert_eq!(patched["body"].content, "added");
    }

    #[test]
    fn test_modify_missing_name_inserts() {
        let patched = apply(
            &SectionMap::new(),
            &SectionDelta::new().modify("f", SectionData::new("X", 1)),
        );
        assert_eq!(patched["f"].content, "X");
    }

    #[test]
    fn test_removing_absent_name_is_noop() {
        let with_absent = SectionDelta::new()
            .modify("body", SectionData::new("b", 3))
            .remove("missing");
        let without = SectionDelta::new().modify("body", SectionData::new("b", 3));
        assert_eq!(apply(&base(), &with_absent), apply(&base(), &without));
    }

    #[test]
    fn test_empty_delta_copies_base() {
        assert_eq!(apply(&base(), &SectionDelta::new()), base());
    }
}
