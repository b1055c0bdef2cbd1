use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One literal fix for a recurring recognition mistake.
///
/// `pattern` is a regular expression matched case-insensitively; `replacement`
/// may refer to capture groups as `$1` or `${name}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectionRule {
    pub pattern: String,
    pub replacement: String,
}

impl CorrectionRule {
    pub fn new(pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            replacement: replacement.into(),
        }
    }
}

/// Common misreads of French book text
const DEFAULT_RULES: &[(&str, &str)] = &[
    (r"\bct\b", "et"),
    (r"\bcn\b", "en"),
    (r"\bfn\b", "en"),
    (r"cffet", "effet"),
    (r"\bunc\b", "une"),
    (r"\blc\b", "le"),
    (r"d'unc", "d'une"),
    (r"\bFn\b", "En"),
];

#[derive(Debug, Clone)]
struct CompiledRule {
    rule: CorrectionRule,
    regex: Regex,
}

/// Ordered correction rules, compiled once.
///
/// Rules run in table order over the whole text, each seeing the previous
/// rule's output.
#[derive(Debug, Clone)]
pub struct CorrectionTable {
    rules: Vec<CompiledRule>,
}

impl CorrectionTable {
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Compile `rules`, failing on the first invalid pattern
    pub fn from_rules(rules: impl IntoIterator<Item = CorrectionRule>) -> Result<Self> {
        let rules = rules
            .into_iter()
            .map(|rule| {
                let regex = RegexBuilder::new(&rule.pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|source| Error::Pattern {
                        pattern: rule.pattern.clone(),
                        source,
                    })?;
                Ok(CompiledRule { rule, regex })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    pub fn default_rules() -> Vec<CorrectionRule> {
        DEFAULT_RULES
            .iter()
            .map(|(p, r)| CorrectionRule::new(*p, *r))
            .collect()
    }

    /// Append more rules after the existing ones
    pub fn extend(&mut self, rules: impl IntoIterator<Item = CorrectionRule>) -> Result<()> {
        let extra = Self::from_rules(rules)?;
        self.rules.extend(extra.rules);
        Ok(())
    }

    pub fn rules(&self) -> impl Iterator<Item = &CorrectionRule> {
        self.rules.iter().map(|c| &c.rule)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Apply every rule, in order, to the whole text
    pub fn apply(&self, text: &str) -> String {
        let mut text = text.to_string();
        for compiled in &self.rules {
            let replaced = compiled
                .regex
                .replace_all(&text, compiled.rule.replacement.as_str());
            // Cow::Borrowed means nothing matched
            if let std::borrow::Cow::Owned(s) = replaced {
                text = s;
            }
        }
        text
    }
}

impl Default for CorrectionTable {
    fn default() -> Self {
        Self::from_rules(Self::default_rules()).expect("built-in corrections are valid regexes")
    }
}
