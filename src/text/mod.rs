//! Text repair applied after recognition.
//!
//! Composition is fixed: `raw -> correct_errors -> join_broken_lines`. Word
//! corrections run first so `\b` anchors still see the original line breaks.

pub mod corrections;
pub mod join;

pub use corrections::{CorrectionRule, CorrectionTable};
pub use join::join_broken_lines;

#[derive(Debug, Clone, Default)]
pub struct TextNormalizer {
    table: CorrectionTable,
}

impl TextNormalizer {
    pub fn new(table: CorrectionTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &CorrectionTable {
        &self.table
    }

    /// Apply the correction table, in order, to the whole text
    pub fn correct_errors(&self, text: &str) -> String {
        self.table.apply(text)
    }

    pub fn join_broken_lines(&self, text: &str) -> String {
        join_broken_lines(text)
    }

    /// Both passes in their fixed order
    pub fn normalize(&self, raw: &str) -> String {
        self.join_broken_lines(&self.correct_errors(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split_word_table() -> CorrectionTable {
        CorrectionTable::from_rules([
            CorrectionRule::new(r"un\nc", "unc"),
            CorrectionRule::new(r"\bunc\b", "une"),
        ])
        .unwrap()
    }

    #[test]
    fn test_normalize_corrects_then_joins() {
        let normalizer = TextNormalizer::default();
        assert_eq!(
            normalizer.normalize("Il y a cu ct\nlc chat.\nFin"),
            "Il y a cu et le chat.\nFin"
        );
    }

    #[test]
    fn test_composition_order_matters() {
        let normalizer = TextNormalizer::new(split_word_table());
        let input = "d'un\nc livre";

        let documented = normalizer.normalize(input);
        let reversed = normalizer.correct_errors(&normalizer.join_broken_lines(input));

        assert_eq!(documented, "d'une livre");
        assert_eq!(reversed, "d'un c livre");
        assert_ne!(documented, reversed);
    }

    #[test]
    fn test_hyphenated_break_rejoined_only_before_joining() {
        let normalizer = TextNormalizer::new(
            CorrectionTable::from_rules([CorrectionRule::new(r"(\w)-\n(\w)", "$1$2")]).unwrap(),
        );
        assert_eq!(normalizer.normalize("exem-\nple"), "exemple");
        assert_eq!(
            normalizer.correct_errors(&normalizer.join_broken_lines("exem-\nple")),
            "exem- ple"
        );
    }

    #[test]
    fn test_empty_text_never_fails() {
        assert_eq!(TextNormalizer::default().normalize(""), "");
    }
}
