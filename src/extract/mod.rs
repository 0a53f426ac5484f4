// Comment extraction
//
// Splits a source line into the comment delimiter (prefix), the natural
// language body, and whatever trails the body (suffix). Rules come from the
// data-driven `LanguageRegistry`; the matching order lives here only.

pub mod registry;

use serde::Serialize;

pub use registry::{LanguageRegistry, PatternRule, PatternSet, RuleKind};
use crate::error::Result;

/// A comment found on a single line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentMatch {
    pub prefix: String,
    pub comment: String,
    pub suffix: String,
}

impl CommentMatch {
    /// Rebuild the line with `body` in place of the original comment text
    pub fn rebuild(&self, body: &str) -> String {
        format!("{}{}{}", self.prefix, body, self.suffix)
    }
}

pub struct CommentExtractor {
    registry: LanguageRegistry,
}

impl CommentExtractor {
    pub fn new(registry: LanguageRegistry) -> Self {
        Self { registry }
    }

    /// Extractor over the built-in language table
    pub fn builtin() -> Result<Self> {
        Ok(Self::new(LanguageRegistry::builtin()?))
    }

    pub fn registry(&self) -> &LanguageRegistry {
        &self.registry
    }

    /// Extract the comment carried by `line`, if any.
    ///
    /// Rules are tried single-line, inline-block, block-start, block-middle,
    /// then block-end; the first match wins. Block-end rules only run when the
    /// line contains the language's closing token.
    pub fn extract(&self, line: &str, language_id: &str) -> Option<CommentMatch> {
        let patterns = self.registry.patterns(language_id);
        let has_close = patterns
            .block_close()
            .map(|close| line.contains(close))
            .unwrap_or(false);

        patterns
            .rules()
            .iter()
            .filter(|rule| rule.kind != RuleKind::BlockEnd || has_close)
            .find_map(|rule| {
                let caps = rule.regex.captures(line)?;
                let group = |i: usize| caps.get(i).map(|m| m.as_str()).unwrap_or("").to_string();
                Some(CommentMatch {
                    prefix: group(1),
                    comment: group(2),
                    suffix: group(3),
                })
            })
    }

    /// Quick heuristic check, cheaper than `extract` and looser than it
    pub fn is_comment(&self, line: &str, language_id: &str) -> bool {
        let trimmed = line.trim();
        let patterns = self.registry.patterns(language_id);

        self.registry.common_markers().iter().any(|m| trimmed.starts_with(m.as_str()))
            || self.registry.common_contains().iter().any(|m| trimmed.contains(m.as_str()))
            || patterns.line_markers().iter().any(|m| trimmed.starts_with(m.as_str()))
            || patterns.trailing_markers().iter().any(|m| trimmed.ends_with(m.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> CommentExtractor {
        CommentExtractor::builtin().unwrap()
    }

    fn parts(m: &CommentMatch) -> (&str, &str, &str) {
        (m.prefix.as_str(), m.comment.as_str(), m.suffix.as_str())
    }

    #[test]
    fn test_javascript_single_line() {
        let m = extractor().extract("  // hello world", "javascript").unwrap();
        assert_eq!(parts(&m), ("  // ", "hello world", ""));
    }

    #[test]
    fn test_javascript_block_forms() {
        let ex = extractor();

        let inline = ex.extract("/* short note */", "javascript").unwrap();
        assert_eq!(parts(&inline), ("/* ", "short note", " */"));

        let start = ex.extract("  /* opens here", "typescript").unwrap();
        assert_eq!(parts(&start), ("  /* ", "opens here", ""));

        let middle = ex.extract("   * continued text", "javascript").unwrap();
        assert_eq!(parts(&middle), ("   * ", "continued text", ""));

        let end = ex.extract("   closing words */", "javascript").unwrap();
        assert_eq!(parts(&end), ("   ", "closing words", " */"));
    }

    #[test]
    fn test_block_end_needs_closing_token() {
        let ex = extractor();
        assert!(ex.extract("let x = 42;", "javascript").is_none());
        assert!(ex.extract("", "javascript").is_none());
    }

    #[test]
    fn test_python_forms() {
        let ex = extractor();
        let hash = ex.extract("    # Базовый случай", "python").unwrap();
        assert_eq!(parts(&hash), ("    # ", "Базовый случай", ""));

        let doc = ex.extract("    \"\"\" Summary line", "python").unwrap();
        assert_eq!(parts(&doc), ("    \"\"\" ", "Summary line", ""));

        let single = ex.extract("'''quoted", "python").unwrap();
        assert_eq!(parts(&single), ("'''", "quoted", ""));

        // Interior docstring lines are not tracked across lines
        assert!(ex.extract("    Вычисляет факториал", "python").is_none());
        assert!(ex.extract("return n * 2", "python").is_none());
    }

    #[test]
    fn test_html_requires_same_line_close() {
        let ex = extractor();
        let m = ex.extract("  <!-- nav bar -->  ", "html").unwrap();
        assert_eq!(parts(&m), ("  <!-- ", "nav bar", " -->  "));
        assert!(ex.extract("<!-- unterminated", "html").is_none());
        assert!(ex.extract("<div>text</div>", "html").is_none());
    }

    #[test]
    fn test_css_is_block_only() {
        let ex = extractor();
        assert!(ex.extract("// not css", "css").is_none());
        let inline = ex.extract("/* header */", "css").unwrap();
        assert_eq!(parts(&inline), ("/* ", "header", " */"));
    }

    #[test]
    fn test_php_accepts_hash_and_slashes() {
        let ex = extractor();
        assert_eq!(ex.extract("# cfg", "php").unwrap().comment, "cfg");
        assert_eq!(ex.extract("// cfg", "php").unwrap().comment, "cfg");
    }

    #[test]
    fn test_rust_doc_comments() {
        let ex = extractor();
        let m = ex.extract("/// Returns the value", "rust").unwrap();
        assert_eq!(parts(&m), ("/// ", "Returns the value", ""));
        let inner = ex.extract("//! Crate docs", "rust").unwrap();
        assert_eq!(parts(&inner), ("//! ", "Crate docs", ""));
    }

    #[test]
    fn test_unknown_language_falls_back_to_c_like() {
        let m = extractor().extract("// fallback", "brainfuck").unwrap();
        assert_eq!(m.comment, "fallback");
    }

    #[test]
    fn test_rebuild_reconstructs_line() {
        let ex = extractor();
        for (line, lang) in [
            ("  // hello world", "javascript"),
            ("/* short note */", "css"),
            ("  <!-- nav bar -->  ", "html"),
            ("# comment", "ruby"),
        ] {
            let m = ex.extract(line, lang).unwrap();
            assert_eq!(m.rebuild(&m.comment), line);
        }
    }

    #[test]
    fn test_is_comment() {
        let ex = extractor();
        assert!(ex.is_comment("  * continued", "javascript"));
        assert!(ex.is_comment("// x", "python"));
        assert!(ex.is_comment("  # note", "python"));
        assert!(ex.is_comment("\"\"\"doc", "python"));
        assert!(ex.is_comment("  <!-- open", "html"));
        assert!(ex.is_comment("close -->", "html"));
        assert!(ex.is_comment("end */", "css"));
        assert!(!ex.is_comment("# heading", "javascript"));
        assert!(!ex.is_comment("let a = b;", "javascript"));
    }
}
