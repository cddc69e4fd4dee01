//! Rule classification
//!
//! Selector rules arrive as plain strings. They are classified and compiled
//! once into a [`RuleSet`], so extraction never re-inspects pattern text.

use crate::config::SelectorRule;
use crate::extract::shortcode::ShortcodePattern;
use scraper::Selector;

/// How a compiled rule finds links
#[derive(Debug, Clone)]
pub enum RuleKind {
    /// CSS selector applied to the parsed document
    Structural(Selector),
    /// `[name ... url="..."]` pattern scanned over the raw HTML text
    Shortcode(ShortcodePattern),
}

/// An enabled rule ready for extraction
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub id: String,
    pub name: String,
    pub kind: RuleKind,
}

/// The enabled rules of one analysis run
///
/// Built once from the configured [`SelectorRule`]s. Disabled rules are left
/// out. Enabled rules the HTML matcher cannot use are skipped with a warning
/// but still count as enabled, so an invalid selector never silently turns
/// on the "every anchor" fallback.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<CompiledRule>,
    enabled: usize,
}

impl RuleSet {
    /// Classifies and compiles a list of rules
    pub fn compile(rules: &[SelectorRule]) -> Self {
        let mut compiled = Vec::new();
        let mut enabled = 0;

        for rule in rules.iter().filter(|r| r.enabled) {
            enabled += 1;

            match classify(&rule.pattern) {
                Ok(kind) => compiled.push(CompiledRule {
                    id: rule.id.clone(),
                    name: rule.name.clone(),
                    kind,
                }),
                Err(reason) => {
                    tracing::warn!(
                        "Skipping rule '{}' ({}): {}",
                        rule.name,
                        rule.pattern,
                        reason
                    );
                }
            }
        }

        Self {
            rules: compiled,
            enabled,
        }
    }

    /// A rule set with nothing enabled; extraction takes every anchor
    pub fn all_links() -> Self {
        Self::default()
    }

    /// True when no rule is enabled and extraction falls back to every anchor
    pub fn is_fallback(&self) -> bool {
        self.enabled == 0
    }

    /// Number of enabled rules, usable or not
    pub fn enabled_count(&self) -> usize {
        self.enabled
    }

    /// Number of enabled rules that were skipped as invalid
    pub fn skipped_count(&self) -> usize {
        self.enabled - self.rules.len()
    }

    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }
}

impl From<&[SelectorRule]> for RuleSet {
    fn from(rules: &[SelectorRule]) -> Self {
        RuleSet::compile(rules)
    }
}

impl From<&Vec<SelectorRule>> for RuleSet {
    fn from(rules: &Vec<SelectorRule>) -> Self {
        RuleSet::compile(rules)
    }
}

/// Returns true for patterns shaped like `[name ... url="" ...]`
pub fn is_shortcode_pattern(pattern: &str) -> bool {
    pattern.trim().starts_with('[') && pattern.contains("url=")
}

fn classify(pattern: &str) -> Result<RuleKind, String> {
    if is_shortcode_pattern(pattern) {
        return ShortcodePattern::parse(pattern)
            .map(RuleKind::Shortcode)
            .ok_or_else(|| "shortcode pattern has no tag name".to_string());
    }

    Selector::parse(pattern.trim())
        .map(RuleKind::Structural)
        .map_err(|e| format!("invalid selector: {:?}", e))
}
