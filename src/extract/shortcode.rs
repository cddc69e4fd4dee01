//! Shortcode link patterns
//!
//! CMS shortcodes such as `[blogcard url="https://example.com/post"]` are not
//! HTML elements, so they are matched against the raw page text.

use regex::Regex;

/// A compiled shortcode pattern
#[derive(Debug, Clone)]
pub struct ShortcodePattern {
    name: String,
    regex: Regex,
}

impl ShortcodePattern {
    /// Builds a matcher from a pattern such as `[blogcard url=""]`
    ///
    /// The tag name is the first word after `[`. Returns `None` if there is
    /// no such word.
    pub fn parse(pattern: &str) -> Option<Self> {
        let name_re = Regex::new(r"\[(\w+)").ok()?;
        let name = name_re.captures(pattern)?.get(1)?.as_str().to_string();

        let regex = Regex::new(&format!(
            r#"(?i)\[{}[^\]]*url=["']([^"']+)["'][^\]]*\]"#,
            regex::escape(&name)
        ))
        .ok()?;

        Some(Self { name, regex })
    }

    /// The tag name, as written in the pattern
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Anchor text recorded for links found by this pattern
    pub fn anchor_text(&self) -> String {
        format!("[{}]", self.name)
    }

    /// Returns every raw `url` value in document order
    pub fn find_urls<'h>(&self, html: &'h str) -> Vec<&'h str> {
        self.regex
            .captures_iter(html)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
            .collect()
    }
}
