use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::{Result, TranslatorError};
use crate::extract::{CommentExtractor, CommentMatch, LanguageRegistry};
use crate::history::{HistoryEntry, HistoryLog};
use crate::translate::service::Pacer;
use crate::translate::{TranslateOptions, TranslationResult, TranslationService};

/// One rewritten line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineEdit {
    pub line_number: usize,
    pub original: String,
    pub translated: String,
}

/// Outcome of translating every comment of a document
#[derive(Debug, Clone, Default, Serialize)]
pub struct DocumentTranslation {
    pub edits: Vec<LineEdit>,
    pub comments_found: usize,
    pub failed: usize,
    pub cancelled: bool,
}

impl DocumentTranslation {
    pub fn translated(&self) -> usize {
        self.edits.len()
    }

    /// Write the edits into `lines`; edits past the end are ignored
    pub fn apply(&self, lines: &mut [String]) {
        for edit in &self.edits {
            if let Some(line) = lines.get_mut(edit.line_number) {
                *line = edit.translated.clone();
            }
        }
    }
}

/// Translation shown for a hovered line, never recorded in history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoverTranslation {
    pub comment: CommentMatch,
    pub result: TranslationResult,
}

/// Queries the host needs to render its own counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub cache_size: usize,
    pub history_size: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub language: String,
    pub translation: DocumentTranslation,
}

impl FileReport {
    /// Pretty JSON form, for tooling that consumes `--json` output
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Source text split into lines, remembering how to put it back together
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    pub lines: Vec<String>,
    line_ending: &'static str,
    trailing_newline: bool,
    byte_order_mark: bool,
}

impl SourceDocument {
    pub fn parse(content: &str) -> Self {
        // A BOM would hide the first line's comment from the `^\s*` rules
        let byte_order_mark = content.starts_with('\u{feff}');
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);

        let line_ending = if content.contains("\r\n") { "\r\n" } else { "\n" };
        let trailing_newline = content.ends_with('\n');
        let body = content.strip_suffix('\n').unwrap_or(content);
        let body = body.strip_suffix('\r').unwrap_or(body);

        let lines = if content.is_empty() {
            Vec::new()
        } else {
            body.split('\n')
                .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
                .collect()
        };

        Self {
            lines,
            line_ending,
            trailing_newline,
            byte_order_mark,
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        if self.byte_order_mark {
            out.push('\u{feff}');
        }
        out.push_str(&self.lines.join(self.line_ending));
        if self.trailing_newline {
            out.push_str(self.line_ending);
        }
        out
    }
}

/// Comment extraction, translation and undo wired together
pub struct Workflow {
    extractor: CommentExtractor,
    service: TranslationService,
    history: HistoryLog,
    options: TranslateOptions,
}

impl Workflow {
    pub fn new(config: &Config) -> Result<Self> {
        let mut registry = LanguageRegistry::builtin()?;
        if let Some(path) = &config.extract.languages_file {
            info!("Loading extra comment patterns from {}", path.display());
            registry.extend_from_file(path)?;
        }

        Ok(Self::from_parts(
            CommentExtractor::new(registry),
            TranslationService::new(&config.translate)?,
            HistoryLog::new(config.history.capacity),
            TranslateOptions::from_config(&config.translate),
        ))
    }

    pub fn from_parts(
        extractor: CommentExtractor,
        service: TranslationService,
        history: HistoryLog,
        options: TranslateOptions,
    ) -> Self {
        Self {
            extractor,
            service,
            history,
            options,
        }
    }

    pub fn options(&self) -> &TranslateOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: TranslateOptions) {
        self.options = options;
    }

    pub fn extractor(&self) -> &CommentExtractor {
        &self.extractor
    }

    pub fn service_mut(&mut self) -> &mut TranslationService {
        &mut self.service
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut HistoryLog {
        &mut self.history
    }

    pub fn stats(&self) -> Stats {
        Stats {
            cache_size: self.service.cache_size(),
            history_size: self.history.size(),
        }
    }

    pub fn extract_comment(&self, line: &str, language_id: &str) -> Option<CommentMatch> {
        self.extractor.extract(line, language_id)
    }

    pub fn is_comment(&self, line: &str, language_id: &str) -> bool {
        self.extractor.is_comment(line, language_id)
    }

    /// Comment-bearing lines worth translating, in document order.
    /// Bodies without any letter or digit (`*/`, `---`) are left out.
    pub fn find_comments(&self, lines: &[String], language_id: &str) -> Vec<(usize, CommentMatch)> {
        lines
            .iter()
            .enumerate()
            .filter_map(|(idx, line)| {
                self.extractor
                    .extract(line, language_id)
                    .map(|comment| (idx, comment))
            })
            .filter(|(_, comment)| comment.comment.chars().any(char::is_alphanumeric))
            .collect()
    }

    /// Translate every comment of a document, one request at a time.
    ///
    /// Each translated line is recorded in history. Failed comments are
    /// logged and left untouched; cancellation keeps what was done so far.
    /// `on_progress` receives (done, total) after each comment.
    pub async fn translate_document<F>(
        &mut self,
        lines: &[String],
        language_id: &str,
        cancel: &CancellationToken,
        mut on_progress: F,
    ) -> DocumentTranslation
    where
        F: FnMut(usize, usize),
    {
        let comments = self.find_comments(lines, language_id);
        let total = comments.len();
        let mut report = DocumentTranslation {
            comments_found: total,
            ..Default::default()
        };

        if comments.is_empty() {
            info!("No comments found to translate");
            return report;
        }

        let mut pacer = Pacer::new(self.service.request_delay());
        for (done, (line_number, comment)) in comments.into_iter().enumerate() {
            let request = self.options.request(&comment.comment);
            match self.service.translate_paced(&request, &mut pacer, cancel).await {
                Some(Ok(result)) => {
                    let original = lines[line_number].clone();
                    let translated = comment.rebuild(&result.translated_text);
                    debug!("Line {}: {} -> {}", line_number + 1, original, translated);

                    self.history
                        .add(HistoryEntry::new(line_number, original.clone(), translated.clone()));
                    report.edits.push(LineEdit {
                        line_number,
                        original,
                        translated,
                    });
                }
                Some(Err(e)) => {
                    warn!("Failed to translate line {}: {}", line_number + 1, e);
                    report.failed += 1;
                }
                None => {
                    info!("Translation cancelled after {}/{} comments", done, total);
                    report.cancelled = true;
                    break;
                }
            }
            on_progress(done + 1, total);
        }

        report
    }

    /// Translate a free-standing piece of text and record it for undo
    pub async fn translate_selection(
        &mut self,
        text: &str,
        line_number: usize,
    ) -> Result<TranslationResult> {
        let request = self.options.request(text);
        let result = self.service.translate(&request).await?;

        self.history
            .add(HistoryEntry::new(line_number, text, result.translated_text.clone()));
        Ok(result)
    }

    /// Revert the most recent translation in `lines`.
    ///
    /// The entry is consumed even when its line no longer exists.
    pub fn undo_last(&mut self, lines: &mut [String]) -> Result<Option<HistoryEntry>> {
        let Some(entry) = self.history.last() else {
            return Ok(None);
        };

        let len = lines.len();
        let line = lines
            .get_mut(entry.line_number)
            .ok_or(TranslatorError::LineOutOfRange {
                line: entry.line_number,
                len,
            })?;
        *line = entry.original_text.clone();
        info!("Undid translation at line {}", entry.line_number + 1);
        Ok(Some(entry))
    }

    /// Translation preview for one line; failures yield nothing
    pub async fn hover(&mut self, line: &str, language_id: &str) -> Option<HoverTranslation> {
        let comment = self.extractor.extract(line, language_id)?;
        let request = self.options.request(&comment.comment);
        match self.service.translate(&request).await {
            Ok(result) => Some(HoverTranslation { comment, result }),
            Err(e) => {
                debug!("Hover translation failed: {}", e);
                None
            }
        }
    }

    /// Language id for a file: explicit override, else its extension
    pub fn language_for<P: AsRef<Path>>(&self, path: P, language: Option<&str>) -> Result<String> {
        let path = path.as_ref();
        match language {
            Some(id) => Ok(id.to_string()),
            None => self
                .extractor
                .registry()
                .language_for_path(path)
                .map(str::to_string)
                .ok_or_else(|| {
                    TranslatorError::Config(format!(
                        "Cannot infer language for {}; pass --language",
                        path.display()
                    ))
                }),
        }
    }

    /// Translate the comments of one file, writing to `output` or in place
    pub async fn translate_file<P: AsRef<Path>>(
        &mut self,
        input: P,
        output: Option<&Path>,
        language: Option<&str>,
        dry_run: bool,
        cancel: &CancellationToken,
    ) -> Result<FileReport> {
        let input = input.as_ref();
        if !input.exists() {
            return Err(TranslatorError::FileNotFound(input.display().to_string()));
        }

        let language = self.language_for(input, language)?;
        info!("Translating comments in {} ({})", input.display(), language);

        let content = fs::read_to_string(input).await?;
        let mut document = SourceDocument::parse(&content);

        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} comments")
                .map_err(|e| TranslatorError::Config(format!("Invalid progress template: {}", e)))?
                .progress_chars("#>-"),
        );

        let translation = self
            .translate_document(&document.lines, &language, cancel, |done, total| {
                pb.set_length(total as u64);
                pb.set_position(done as u64);
            })
            .await;
        pb.finish_and_clear();

        if !dry_run && !translation.edits.is_empty() {
            translation.apply(&mut document.lines);
            let target = output.unwrap_or(input);
            fs::write(target, document.render()).await?;
            info!(
                "Translated {} of {} comments into {}",
                translation.translated(),
                translation.comments_found,
                target.display()
            );
        }

        Ok(FileReport {
            path: input.to_path_buf(),
            language,
            translation,
        })
    }

    /// Translate, in place, every file under `dir` whose language is known
    pub async fn translate_directory<P: AsRef<Path>>(
        &mut self,
        dir: P,
        dry_run: bool,
        cancel: &CancellationToken,
    ) -> Result<Vec<FileReport>> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(TranslatorError::Config(format!(
                "{} is not a directory",
                dir.display()
            )));
        }

        let registry = self.extractor.registry();
        let files: Vec<PathBuf> = WalkDir::new(dir)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'))
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| registry.language_for_path(e.path()).is_some())
            .map(|e| e.path().to_path_buf())
            .collect();

        info!("Found {} source files to process", files.len());

        let mut reports = Vec::new();
        for path in files {
            if cancel.is_cancelled() {
                info!("Directory translation cancelled");
                break;
            }
            match self.translate_file(&path, None, None, dry_run, cancel).await {
                Ok(report) => reports.push(report),
                Err(e) => warn!("Failed to process {}: {}", path.display(), e),
            }
        }

        Ok(reports)
    }
}
