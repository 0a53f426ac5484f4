use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::error::{Result, TranslatorError};

const BUILTIN_TABLE: &str = include_str!("languages.toml");

/// Rule kinds, declared in the order the extractor tries them
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RuleKind {
    /// Whole line is a comment (`// ...`, `# ...`)
    SingleLine,
    /// Block comment opened and closed on the same line
    InlineBlock,
    /// Line opens a block comment that continues below
    BlockStart,
    /// Interior line of a block comment
    BlockMiddle,
    /// Line carrying the closing token of a block comment
    BlockEnd,
}

#[derive(Debug, Clone)]
pub struct PatternRule {
    pub kind: RuleKind,
    pub regex: Regex,
}

/// Compiled comment rules for one language
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    rules: Vec<PatternRule>,
    block_close: Option<String>,
    line_markers: Vec<String>,
    trailing_markers: Vec<String>,
}

impl PatternSet {
    /// Rules in matching order
    pub fn rules(&self) -> &[PatternRule] {
        &self.rules
    }

    pub fn block_close(&self) -> Option<&str> {
        self.block_close.as_deref()
    }

    pub fn line_markers(&self) -> &[String] {
        &self.line_markers
    }

    pub fn trailing_markers(&self) -> &[String] {
        &self.trailing_markers
    }

    fn rules_of(&self, kind: RuleKind) -> impl Iterator<Item = &PatternRule> {
        self.rules.iter().filter(move |r| r.kind == kind)
    }
}

#[derive(Debug, Default, Deserialize)]
struct PatternTable {
    fallback: Option<String>,
    #[serde(default)]
    common_markers: Vec<String>,
    #[serde(default)]
    common_contains: Vec<String>,
    #[serde(default, rename = "language")]
    languages: Vec<LanguageSpec>,
}

#[derive(Debug, Deserialize)]
struct LanguageSpec {
    ids: Vec<String>,
    extends: Option<String>,
    #[serde(default)]
    extensions: Vec<String>,
    #[serde(default)]
    single_line: Vec<String>,
    inline_block: Option<String>,
    block_start: Option<String>,
    block_middle: Option<String>,
    block_end: Option<String>,
    block_close: Option<String>,
    #[serde(default)]
    line_markers: Vec<String>,
    #[serde(default)]
    trailing_markers: Vec<String>,
}

impl LanguageSpec {
    fn declared(&self) -> Vec<(RuleKind, &str)> {
        let mut declared: Vec<(RuleKind, &str)> = self
            .single_line
            .iter()
            .map(|p| (RuleKind::SingleLine, p.as_str()))
            .collect();
        let blocks = [
            (RuleKind::InlineBlock, &self.inline_block),
            (RuleKind::BlockStart, &self.block_start),
            (RuleKind::BlockMiddle, &self.block_middle),
            (RuleKind::BlockEnd, &self.block_end),
        ];
        for (kind, pattern) in blocks {
            if let Some(pattern) = pattern {
                declared.push((kind, pattern.as_str()));
            }
        }
        declared
    }

    fn compile(&self, parent: Option<&PatternSet>) -> Result<PatternSet> {
        let mut rules = Vec::new();
        for (kind, pattern) in self.declared() {
            rules.push(PatternRule {
                kind,
                regex: compile_rule(pattern)?,
            });
        }

        if let Some(parent) = parent {
            for kind in [
                RuleKind::SingleLine,
                RuleKind::InlineBlock,
                RuleKind::BlockStart,
                RuleKind::BlockMiddle,
                RuleKind::BlockEnd,
            ] {
                if !rules.iter().any(|r| r.kind == kind) {
                    rules.extend(parent.rules_of(kind).cloned());
                }
            }
        }

        // Stable: single-line rules keep their declared order
        rules.sort_by_key(|r| r.kind);

        let inherit = |own: &Vec<String>, from: fn(&PatternSet) -> &[String]| {
            if own.is_empty() {
                parent.map(|p| from(p).to_vec()).unwrap_or_default()
            } else {
                own.clone()
            }
        };

        let block_close = self
            .block_close
            .clone()
            .or_else(|| parent.and_then(|p| p.block_close.clone()));

        if rules.iter().any(|r| r.kind == RuleKind::BlockEnd) && block_close.is_none() {
            return Err(TranslatorError::Pattern(format!(
                "language '{}' declares block_end without block_close",
                self.ids.first().map(String::as_str).unwrap_or("?")
            )));
        }

        Ok(PatternSet {
            rules,
            block_close,
            line_markers: inherit(&self.line_markers, PatternSet::line_markers),
            trailing_markers: inherit(&self.trailing_markers, PatternSet::trailing_markers),
        })
    }
}

fn compile_rule(pattern: &str) -> Result<Regex> {
    let regex = Regex::new(pattern)?;
    // captures_len counts the implicit whole-match group
    if regex.captures_len() < 3 {
        return Err(TranslatorError::Pattern(format!(
            "pattern '{}' must capture at least prefix and comment groups",
            pattern
        )));
    }
    Ok(regex)
}

/// Language id to comment rules, plus file extension lookup
#[derive(Debug, Clone)]
pub struct LanguageRegistry {
    sets: HashMap<String, Arc<PatternSet>>,
    extensions: HashMap<String, String>,
    fallback: String,
    common_markers: Vec<String>,
    common_contains: Vec<String>,
}

impl LanguageRegistry {
    /// Registry loaded from the embedded pattern table
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN_TABLE)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut registry = Self {
            sets: HashMap::new(),
            extensions: HashMap::new(),
            fallback: String::new(),
            common_markers: Vec::new(),
            common_contains: Vec::new(),
        };
        registry.extend_from_toml_str(content)?;

        if registry.fallback.is_empty() {
            return Err(TranslatorError::Pattern(
                "pattern table must name a fallback language".to_string(),
            ));
        }
        Ok(registry)
    }

    /// Merge another table; entries with an existing id replace it.
    ///
    /// The whole table is compiled before anything is merged, so a bad entry
    /// leaves the registry untouched.
    pub fn extend_from_toml_str(&mut self, content: &str) -> Result<()> {
        let table: PatternTable = toml::from_str(content)?;

        let mut staged: HashMap<String, Arc<PatternSet>> = HashMap::new();
        let mut staged_extensions: Vec<(String, String)> = Vec::new();
        for spec in &table.languages {
            if spec.ids.is_empty() {
                return Err(TranslatorError::Pattern(
                    "language entry without ids".to_string(),
                ));
            }

            let parent = match &spec.extends {
                Some(base) => Some(
                    staged
                        .get(base)
                        .or_else(|| self.sets.get(base))
                        .cloned()
                        .ok_or_else(|| {
                            TranslatorError::Pattern(format!(
                                "language '{}' extends unknown language '{}'",
                                spec.ids[0], base
                            ))
                        })?,
                ),
                None => None,
            };

            let set = Arc::new(spec.compile(parent.as_deref())?);
            for id in &spec.ids {
                staged.insert(id.clone(), Arc::clone(&set));
            }
            for ext in &spec.extensions {
                staged_extensions.push((ext.trim_start_matches('.').to_lowercase(), spec.ids[0].clone()));
            }
        }

        let fallback = table.fallback.unwrap_or_else(|| self.fallback.clone());
        if !fallback.is_empty() && !staged.contains_key(&fallback) && !self.sets.contains_key(&fallback) {
            return Err(TranslatorError::Pattern(format!(
                "fallback language '{}' is not defined",
                fallback
            )));
        }

        for (id, set) in staged {
            debug!("Registered comment patterns for {}", id);
            self.sets.insert(id, set);
        }
        self.extensions.extend(staged_extensions);
        self.fallback = fallback;
        self.common_markers.extend(table.common_markers);
        self.common_contains.extend(table.common_contains);
        Ok(())
    }

    pub fn extend_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            TranslatorError::Config(format!(
                "Failed to read languages file {}: {}",
                path.display(),
                e
            ))
        })?;
        self.extend_from_toml_str(&content)
    }

    /// Pattern set for `language_id`, or the fallback set for unknown ids
    pub fn patterns(&self, language_id: &str) -> &PatternSet {
        self.sets
            .get(language_id)
            .or_else(|| self.sets.get(&self.fallback))
            .map(Arc::as_ref)
            .unwrap_or(empty_set())
    }

    pub fn contains(&self, language_id: &str) -> bool {
        self.sets.contains_key(language_id)
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    pub fn common_markers(&self) -> &[String] {
        &self.common_markers
    }

    pub fn common_contains(&self) -> &[String] {
        &self.common_contains
    }

    /// Registered ids, sorted
    pub fn language_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.sets.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Language id for a file, judged by its extension
    pub fn language_for_path<P: AsRef<Path>>(&self, path: P) -> Option<&str> {
        let ext = path.as_ref().extension()?.to_str()?.to_lowercase();
        self.extensions.get(&ext).map(String::as_str)
    }
}

fn empty_set() -> &'static PatternSet {
    static EMPTY: std::sync::OnceLock<PatternSet> = std::sync::OnceLock::new();
    EMPTY.get_or_init(PatternSet::default)
}
