//! Linearizing a section map into flat file text.

use crate::section::{SectionData, SectionMap};

/// Join section contents with newlines, ordered by start line.
///
/// Sections without a start line sort as line 0; ties fall back to the
/// section name so the output never depends on map iteration order.
pub fn reconstruct(sections: &SectionMap) -> String {
    ordered(sections)
        .into_iter()
        .map(|(_, section)| section.content.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Sections in display order.
pub fn ordered(sections: &SectionMap) -> Vec<(&str, &SectionData)> {
    let mut ordered: Vec<(&str, &SectionData)> = sections
        .iter()
        .map(|(name, section)| (name.as_str(), section))
        .collect();
    ordered.sort_by(|(a_name, a), (b_name, b)| {
        a.order_line()
            .cmp(&b.order_line())
            .then_with(|| a_name.cmp(b_name))
    });
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(content: &str, start_line: Option<u32>) -> SectionData {
        SectionData {
            content: content.to_string(),
            start_line,
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_sections() {
        assert_eq!(reconstruct(&SectionMap::new()), "");
    }

    #[test]
    fn test_orders_by_start_line() {
        let mut sections = SectionMap::new();
        sections.insert("a".to_string(), section("third", Some(30)));
        sections.insert("b".to_string(), section("first", Some(1)));
        sections.insert("c".to_string(), section("second", Some(12)));
        assert_eq!(reconstruct(&sections), "first\nsecond\nthird");
    }

    #[test]
    fn test_missing_start_line_sorts_first() {
        let mut sections = SectionMap::new();
        sections.insert("x".to_string(), section("body", Some(2)));
        sections.insert("y".to_string(), section("preamble", None));
        assert_eq!(reconstruct(&sections), "preamble\nbody");
    }

    #[test]
    fn test_ties_break_by_name() {
        let mut sections = SectionMap::new();
        sections.insert("zeta".to_string(), section("Z", Some(5)));
        sections.insert("alpha".to_string(), section("A", Some(5)));
        sections.insert("none".to_string(), section("N", None));
        sections.insert("zero".to_string(), section("0", Some(0)));
        assert_eq!(reconstruct(&sections), "N\n0\nA\nZ");
    }

    #[test]
    fn test_idempotent() {
        let mut sections = SectionMap::new();
        sections.insert("f".to_string(), section("X2", Some(1)));
        sections.insert("g".to_string(), section("Y", Some(5)));
        assert_eq!(reconstruct(&sections), reconstruct(&sections));
        assert_eq!(reconstruct(&sections), "X2\nY");
    }
}
