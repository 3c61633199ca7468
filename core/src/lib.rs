//! Draftguard core enhancement engine.
//! Implements deterministic spelling, grammar, and style analysis for
//! helpdesk reply drafts based on configurable correction tables, plus
//! auto-fixing, professional reformatting, and suffix-triggered completions.

use std::collections::{BTreeMap, HashMap};

use aho_corasick::{AhoCorasick, AhoCorasickBuilder};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub mod composer;

pub use composer::{
    Attachment, AttachmentOutcome, Composer, ComposerError, ComposerState, OutgoingReply,
    ReplySink, Template, TemplateStore, TicketContext,
};

/// Known-misspelling table. Keys are matched against whole lowercased tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpellingTable {
    pub corrections: BTreeMap<String, String>,
}

impl Default for SpellingTable {
    fn default() -> Self {
        let corrections = [
            ("recieve", "receive"),
            ("occured", "occurred"),
            ("occurance", "occurrence"),
            ("seperete", "separate"),
            ("definately", "definitely"),
            ("acommodate", "accommodate"),
            ("occassion", "occasion"),
            ("untill", "until"),
            ("tommorow", "tomorrow"),
            ("begining", "beginning"),
            ("writting", "writing"),
            ("sucessful", "successful"),
            ("necesary", "necessary"),
            ("recomend", "recommend"),
            ("referal", "referral"),
            ("refering", "referring"),
            ("priviledge", "privilege"),
            ("maintainance", "maintenance"),
            ("enviroment", "environment"),
            ("basicly", "basically"),
            ("finaly", "finally"),
            ("generaly", "generally"),
            ("imediately", "immediately"),
            ("kindly", "kindly"),
            ("usefull", "useful"),
            ("greatful", "grateful"),
            ("sincerely", "sincerely"),
        ]
        .into_iter()
        .map(|(bad, good)| (bad.to_string(), good.to_string()))
        .collect();
        Self { corrections }
    }
}

/// Regex-driven grammar rule with an optional prefix predicate.
///
/// `requires` lists literal lowercase prefixes; when non-empty, a match is
/// only reported if the matched text starts with one of them. This is how
/// `your welcome` flags while `you're welcome` passes.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GrammarRule {
    pub pattern: String,
    pub message: String,
    pub replacement: String,
    pub requires: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GrammarConfig {
    pub rules: Vec<GrammarRule>,
}

impl Default for GrammarConfig {
    fn default() -> Self {
        let rule =
            |pattern: &str, message: &str, replacement: &str, requires: &[&str]| GrammarRule {
                pattern: pattern.into(),
                message: message.into(),
                replacement: replacement.into(),
                requires: requires.iter().map(|s| s.to_string()).collect(),
            };
        Self {
            rules: vec![
                rule(
                    r"\b(your|you're)\s+welcome\b",
                    "Did you mean \"you're welcome\" (you are welcome)?",
                    "you're welcome",
                    &["your"],
                ),
                rule(
                    r"\b(its|it's)\s+(a|an|the|going|been)\b",
                    "Did you mean \"it's\" (it is/it has)?",
                    "it's",
                    &["its "],
                ),
                rule(
                    r"\b(their|there|they're)\s+(are|is|was|were)\b",
                    "Consider using \"there\" for location/existence",
                    "there",
                    &["their ", "they're "],
                ),
                rule(
                    r"\bcould\s+of\b",
                    "Did you mean \"could have\" or \"could've\"?",
                    "could have",
                    &[],
                ),
                rule(
                    r"\bshould\s+of\b",
                    "Did you mean \"should have\" or \"should've\"?",
                    "should have",
                    &[],
                ),
                rule(
                    r"\bwould\s+of\b",
                    "Did you mean \"would have\" or \"would've\"?",
                    "would have",
                    &[],
                ),
            ],
        }
    }
}

/// Redundant phrase with its simpler form.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RedundantPhrase {
    pub phrase: String,
    pub simpler: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    pub redundancies: Vec<RedundantPhrase>,
    pub long_sentence_words: usize,
}

impl Default for StyleConfig {
    fn default() -> Self {
        let pair = |phrase: &str, simpler: &str| RedundantPhrase {
            phrase: phrase.into(),
            simpler: simpler.into(),
        };
        Self {
            redundancies: vec![
                pair("absolutely essential", "essential"),
                pair("advance planning", "planning"),
                pair("basic fundamentals", "fundamentals"),
                pair("close proximity", "proximity"),
                pair("end result", "result"),
                pair("free gift", "gift"),
                pair("future plans", "plans"),
                pair("past history", "history"),
                pair("please kindly", "please"),
                pair("repeat again", "repeat"),
                pair("true fact", "fact"),
            ],
            long_sentence_words: 40,
        }
    }
}

/// A fixed text suffix that activates a list of continuation options.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CompletionTrigger {
    pub suffix: String,
    pub options: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    pub triggers: Vec<CompletionTrigger>,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        let trigger = |suffix: &str, options: [&str; 5]| CompletionTrigger {
            suffix: suffix.into(),
            options: options.iter().map(|s| s.to_string()).collect(),
        };
        Self {
            triggers: vec![
                trigger(
                    "thank you for ",
                    [
                        "your patience",
                        "contacting us",
                        "reaching out",
                        "your email",
                        "bringing this to our attention",
                    ],
                ),
                trigger(
                    "i apologize for ",
                    [
                        "any inconvenience",
                        "the delay",
                        "this issue",
                        "the confusion",
                        "any frustration this may have caused",
                    ],
                ),
                trigger(
                    "please ",
                    [
                        "let me know",
                        "feel free to",
                        "don't hesitate to",
                        "contact us if",
                        "reach out if",
                    ],
                ),
                trigger(
                    "i will ",
                    [
                        "look into this",
                        "investigate this issue",
                        "get back to you",
                        "follow up with you",
                        "resolve this as soon as possible",
                    ],
                ),
                trigger(
                    "we ",
                    [
                        "appreciate your patience",
                        "are here to help",
                        "value your feedback",
                        "apologize for the inconvenience",
                        "will resolve this issue",
                    ],
                ),
            ],
        }
    }
}

/// Canned reply phrase offered to the agent while composing.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Suggestion {
    pub text: String,
    pub category: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestionCatalog {
    pub catalog: Vec<Suggestion>,
}

impl Default for SuggestionCatalog {
    fn default() -> Self {
        let entry = |text: &str, category: &str, description: &str| Suggestion {
            text: text.into(),
            category: category.into(),
            description: description.into(),
        };
        Self {
            catalog: vec![
                entry("Thank you for contacting us.", "greeting", "Thank customer"),
                entry(
                    "Thank you for reaching out to us.",
                    "greeting",
                    "Polite opening",
                ),
                entry(
                    "I hope this message finds you well.",
                    "greeting",
                    "Friendly opening",
                ),
                entry(
                    "Thank you for your patience.",
                    "greeting",
                    "Acknowledge waiting",
                ),
                entry(
                    "I understand your concern about this issue.",
                    "acknowledgment",
                    "Show understanding",
                ),
                entry(
                    "I apologize for any inconvenience this may have caused.",
                    "acknowledgment",
                    "Apologize",
                ),
                entry(
                    "We appreciate you bringing this to our attention.",
                    "acknowledgment",
                    "Thank for feedback",
                ),
                entry(
                    "I can see how frustrating this must be.",
                    "acknowledgment",
                    "Show empathy",
                ),
                entry(
                    "I'd be happy to help you with this.",
                    "solution",
                    "Offer help",
                ),
                entry("Let me look into this for you.", "solution", "Take action"),
                entry(
                    "Here's what we can do to resolve this:",
                    "solution",
                    "Provide solution",
                ),
                entry(
                    "I've checked your account and found that",
                    "solution",
                    "Share findings",
                ),
                entry(
                    "Please let me know if you need any further assistance.",
                    "closing",
                    "Offer more help",
                ),
                entry(
                    "Feel free to reach out if you have any questions.",
                    "closing",
                    "Invite follow-up",
                ),
                entry(
                    "We're here to help if you need anything else.",
                    "closing",
                    "Reassure availability",
                ),
                entry(
                    "Thank you for your understanding.",
                    "closing",
                    "Thank customer",
                ),
                entry("Have a great day!", "closing", "Friendly ending"),
                entry(
                    "I'll follow up with you once this is resolved.",
                    "follow-up",
                    "Promise update",
                ),
                entry(
                    "I'll keep you updated on the progress.",
                    "follow-up",
                    "Promise updates",
                ),
                entry(
                    "You should see the changes within 24-48 hours.",
                    "follow-up",
                    "Set timeframe",
                ),
            ],
        }
    }
}

/// Size rule applied to MIME types matching a prefix.
///
/// `max_bytes` rejects files over the ceiling; `warn_below_bytes` accepts the
/// file but attaches a warning when it is smaller than the floor.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CategoryLimit {
    pub prefix: String,
    pub max_bytes: Option<u64>,
    pub warn_below_bytes: Option<u64>,
}

/// Attachment validation policy: MIME allow-list plus size limits keyed by
/// MIME category.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AttachmentPolicy {
    pub allowed_types: Vec<String>,
    pub max_bytes: u64,
    pub categories: Vec<CategoryLimit>,
}

impl Default for AttachmentPolicy {
    fn default() -> Self {
        Self {
            allowed_types: vec![
                "image/jpeg".into(),
                "image/png".into(),
                "application/pdf".into(),
                "text/plain".into(),
                "application/msword".into(),
                "application/vnd.ms-excel".into(),
                "application/zip".into(),
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document".into(),
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet".into(),
                "video/mp4".into(),
                "video/mpeg".into(),
                "video/ogg".into(),
            ],
            max_bytes: 25 * 1024 * 1024,
            categories: vec![CategoryLimit {
                prefix: "video/".into(),
                max_bytes: None,
                warn_below_bytes: Some(5 * 1024 * 1024),
            }],
        }
    }
}

/// Template placeholder syntax policy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum PlaceholderSyntax {
    /// `{ticket_id}`, `{customer_name}`, `{subject}`, `{adviser_name}`.
    CurlyLower,
    /// `[TICKET_ID]`, `[CUSTOMER_NAME]`, `[SUBJECT]`, `[ADVISER_NAME]`.
    BracketUpper,
}

impl Default for PlaceholderSyntax {
    fn default() -> Self {
        PlaceholderSyntax::CurlyLower
    }
}

/// Top-level configuration for the enhancer and composer.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub spelling: SpellingTable,
    pub grammar: GrammarConfig,
    pub style: StyleConfig,
    pub completions: CompletionConfig,
    pub suggestions: SuggestionCatalog,
    pub attachments: AttachmentPolicy,
    pub placeholders: PlaceholderSyntax,
}

/// Diagnostic category identifiers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Ord, PartialOrd)]
#[serde(rename_all = "kebab-case")]
pub enum Kind {
    Spelling,
    Grammar,
    Style,
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Kind::Spelling => "spelling",
            Kind::Grammar => "grammar",
            Kind::Style => "style",
        };
        f.write_str(name)
    }
}

/// Located issue emitted by the analyzers.
///
/// `offset` and `length` are byte positions into the exact text the
/// diagnostic was computed from. A diagnostic is only valid relative to that
/// text snapshot; after any edit it must be recomputed, never reused.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: Kind,
    pub message: String,
    pub offset: usize,
    pub length: usize,
    pub replacements: Vec<String>,
}

/// Summary for one analyzed draft.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftReport {
    pub word_count: usize,
    pub diagnostics: Vec<Diagnostic>,
    pub kind_counts: BTreeMap<Kind, usize>,
}

struct CompiledRule {
    regex: Regex,
    message: String,
    replacement: String,
    requires: Vec<String>,
}

impl CompiledRule {
    fn permits(&self, matched: &str) -> bool {
        if self.requires.is_empty() {
            return true;
        }
        let lower = matched.to_lowercase();
        self.requires
            .iter()
            .any(|prefix| lower.starts_with(prefix.as_str()))
    }
}

/// Enhancer encapsulates compiled rules for reuse across drafts.
pub struct Enhancer {
    config: Config,
    corrections: HashMap<String, String>,
    grammar_rules: Vec<CompiledRule>,
    redundancy_matcher: Option<AhoCorasick>,
    completion_triggers: Vec<(String, Vec<String>)>,
}

impl Enhancer {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let corrections = config
            .spelling
            .corrections
            .iter()
            .map(|(bad, good)| (bad.to_lowercase(), good.clone()))
            .collect();

        let mut grammar_rules = Vec::new();
        for rule in &config.grammar.rules {
            let pattern = rule.pattern.trim();
            if pattern.is_empty() {
                continue;
            }
            let regex = Regex::new(&format!("(?i){pattern}"))
                .map_err(|e| anyhow::anyhow!("invalid grammar pattern `{pattern}`: {e}"))?;
            grammar_rules.push(CompiledRule {
                regex,
                message: rule.message.clone(),
                replacement: rule.replacement.clone(),
                requires: rule.requires.iter().map(|p| p.to_lowercase()).collect(),
            });
        }

        let redundancy_matcher = if config.style.redundancies.is_empty() {
            None
        } else {
            let phrases: Vec<&str> = config
                .style
                .redundancies
                .iter()
                .map(|entry| entry.phrase.as_str())
                .collect();
            Some(
                AhoCorasickBuilder::new()
                    .ascii_case_insensitive(true)
                    .build(&phrases),
            )
        };

        let completion_triggers = config
            .completions
            .triggers
            .iter()
            .map(|trigger| (trigger.suffix.to_lowercase(), trigger.options.clone()))
            .collect();

        Ok(Self {
            config,
            corrections,
            grammar_rules,
            redundancy_matcher,
            completion_triggers,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Canned reply phrases for the suggestion panel.
    pub fn suggestions(&self) -> &[Suggestion] {
        &self.config.suggestions.catalog
    }

    /// Scan whole lowercased tokens against the misspelling table.
    ///
    /// Tokenization is exhaustive: every token including whitespace and
    /// punctuation is consumed, so token offsets sum exactly to the input
    /// length.
    pub fn check_spelling(&self, text: &str) -> Vec<Diagnostic> {
        use unicode_segmentation::UnicodeSegmentation;

        let mut diagnostics = Vec::new();
        let mut offset = 0;
        for token in text.split_word_bounds() {
            let lower = token.to_lowercase();
            if let Some(correction) = self.corrections.get(&lower) {
                diagnostics.push(Diagnostic {
                    kind: Kind::Spelling,
                    message: format!("Possible spelling error: `{token}` -> `{correction}`"),
                    offset,
                    length: token.len(),
                    replacements: vec![correction.clone()],
                });
            }
            offset += token.len();
        }
        diagnostics
    }

    /// Run every grammar rule over the whole text with non-overlapping
    /// scanning, gated by each rule's prefix predicate.
    pub fn check_grammar(&self, text: &str) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for rule in &self.grammar_rules {
            for mat in rule.regex.find_iter(text) {
                if !rule.permits(mat.as_str()) {
                    continue;
                }
                diagnostics.push(Diagnostic {
                    kind: Kind::Grammar,
                    message: rule.message.clone(),
                    offset: mat.start(),
                    length: mat.end() - mat.start(),
                    replacements: vec![rule.replacement.clone()],
                });
            }
        }
        diagnostics
    }

    /// Redundant-phrase findings first (in table order, first occurrence per
    /// entry only), then long-sentence findings in scan order.
    pub fn check_style(&self, text: &str) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        self.find_redundancies(text, &mut diagnostics);
        self.find_long_sentences(text, &mut diagnostics);
        diagnostics
    }

    fn find_redundancies(&self, text: &str, diagnostics: &mut Vec<Diagnostic>) {
        let matcher = match &self.redundancy_matcher {
            Some(matcher) => matcher,
            None => return,
        };
        let mut first_hit: Vec<Option<usize>> = vec![None; self.config.style.redundancies.len()];
        for mat in matcher.find_overlapping_iter(text.as_bytes()) {
            let slot = &mut first_hit[mat.pattern()];
            if slot.is_none() {
                *slot = Some(mat.start());
            }
        }
        for (entry, start) in self.config.style.redundancies.iter().zip(first_hit) {
            let start = match start {
                Some(start) => start,
                None => continue,
            };
            diagnostics.push(Diagnostic {
                kind: Kind::Style,
                message: format!(
                    "Consider simplifying: `{}` -> `{}`",
                    entry.phrase, entry.simpler
                ),
                offset: start,
                length: entry.phrase.len(),
                replacements: vec![entry.simpler.clone()],
            });
        }
    }

    fn find_long_sentences(&self, text: &str, diagnostics: &mut Vec<Diagnostic>) {
        let limit = self.config.style.long_sentence_words;
        let mut offset = 0;
        for segment in split_sentences(text) {
            let words = segment.split_whitespace().count();
            if words > limit {
                diagnostics.push(Diagnostic {
                    kind: Kind::Style,
                    message: "This sentence is quite long. Consider breaking it into shorter \
                              sentences."
                        .into(),
                    offset,
                    length: segment.len(),
                    replacements: Vec::new(),
                });
            }
            // One separator byte is accounted per split even when the
            // punctuation run was longer; bookkept offsets can undershoot
            // the real position but never overshoot the text length.
            offset += segment.len() + 1;
        }
    }

    /// All issues: spelling, then grammar, then style. No dedup, no resort;
    /// order is analyzer-group-then-scan-order.
    pub fn analyze(&self, text: &str) -> Vec<Diagnostic> {
        let mut diagnostics = self.check_spelling(text);
        diagnostics.extend(self.check_grammar(text));
        diagnostics.extend(self.check_style(text));
        diagnostics
    }

    /// Analyze and summarize one draft.
    pub fn report(&self, text: &str) -> DraftReport {
        let diagnostics = self.analyze(text);
        let mut kind_counts: BTreeMap<Kind, usize> = BTreeMap::new();
        for diagnostic in &diagnostics {
            *kind_counts.entry(diagnostic.kind).or_default() += 1;
        }
        DraftReport {
            word_count: count_words(text),
            diagnostics,
            kind_counts,
        }
    }

    /// Fix every known misspelling in one pass.
    ///
    /// Corrections are applied by descending offset so that earlier spans
    /// stay valid while later ones are rewritten.
    pub fn auto_fix(&self, text: &str) -> String {
        let mut errors: Vec<Diagnostic> = self
            .analyze(text)
            .into_iter()
            .filter(|d| d.kind == Kind::Spelling)
            .collect();
        errors.sort_by(|a, b| b.offset.cmp(&a.offset));

        let mut fixed = text.to_string();
        for error in &errors {
            if !error.replacements.is_empty() {
                fixed = apply_correction(&fixed, error, 0);
            }
        }
        fixed
    }

    /// Suffix-triggered continuations for the text before the cursor.
    ///
    /// Triggers are checked independently in fixed order; every matching
    /// trigger appends its options. The cursor is clamped to the text length
    /// and snapped down to a char boundary.
    pub fn complete(&self, text: &str, cursor: usize) -> Vec<String> {
        let cursor = floor_char_boundary(text, cursor.min(text.len()));
        let before = text[..cursor].to_lowercase();
        let mut completions = Vec::new();
        for (suffix, options) in &self.completion_triggers {
            if !suffix.is_empty() && before.ends_with(suffix.as_str()) {
                completions.extend(options.iter().cloned());
            }
        }
        completions
    }
}

/// Splice one replacement into the text over the diagnostic's span.
///
/// Empty replacement lists and out-of-range indices leave the text unchanged.
/// A stale diagnostic (computed against a different text version) produces a
/// best-effort splice: the span is clamped to the text length and snapped to
/// char boundaries, so the result is unspecified but never a panic.
pub fn apply_correction(text: &str, error: &Diagnostic, replacement_index: usize) -> String {
    let replacement = match error.replacements.get(replacement_index) {
        Some(replacement) => replacement,
        None => return text.to_string(),
    };
    let start = floor_char_boundary(text, error.offset.min(text.len()));
    let end = floor_char_boundary(
        text,
        error.offset.saturating_add(error.length).min(text.len()),
    )
    .max(start);
    format!("{}{}{}", &text[..start], replacement, &text[end..])
}

static SENTENCE_START_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(^\w|[.!?]\s+\w)").expect("static regex"));
static WHITESPACE_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));
static EXCESS_NEWLINES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").expect("static regex"));
static GLUED_PUNCTUATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([.!?,;:])(\w)").expect("static regex"));

/// Normalize whitespace, capitalization, and punctuation spacing. Idempotent.
pub fn format_professionally(text: &str) -> String {
    let formatted = text.trim();
    let formatted = SENTENCE_START_RE
        .replace_all(formatted, |caps: &regex::Captures<'_>| {
            caps[0].to_uppercase()
        });
    let formatted = WHITESPACE_RUN_RE.replace_all(&formatted, " ");
    // Paragraph breaks were already flattened by the whitespace collapse
    // above, so this pass only matters for inputs that reach it unflattened.
    let formatted = EXCESS_NEWLINES_RE.replace_all(&formatted, "\n\n");
    let formatted = GLUED_PUNCTUATION_RE.replace_all(&formatted, "${1} ${2}");
    formatted.into_owned()
}

/// Split on runs of `.`, `!`, `?`. Empty segments at the edges are kept so
/// that offset bookkeeping in the caller stays aligned.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut in_run = false;
    for (idx, ch) in text.char_indices() {
        if matches!(ch, '.' | '!' | '?') {
            if !in_run {
                segments.push(&text[start..idx]);
                in_run = true;
            }
        } else if in_run {
            start = idx;
            in_run = false;
        }
    }
    if in_run {
        segments.push("");
    } else {
        segments.push(&text[start..]);
    }
    segments
}

fn count_words(text: &str) -> usize {
    text.split_whitespace()
        .filter(|w| w.chars().any(|c| c.is_alphabetic()))
        .count()
}

fn floor_char_boundary(text: &str, mut idx: usize) -> usize {
    while idx > 0 && !text.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enhancer() -> Enhancer {
        Enhancer::new(Config::default()).unwrap()
    }

    #[test]
    fn flags_known_misspelling() {
        let e = enhancer();
        let diagnostics = e.check_spelling("recieve");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, Kind::Spelling);
        assert_eq!(diagnostics[0].offset, 0);
        assert_eq!(diagnostics[0].length, 7);
        assert_eq!(diagnostics[0].replacements, vec!["receive".to_string()]);
    }

    #[test]
    fn spelling_offsets_track_tokens() {
        let e = enhancer();
        let diagnostics = e.check_spelling("I recieve the occured report");
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics[0].offset, 2);
        assert_eq!(diagnostics[1].offset, 14);
    }

    #[test]
    fn spelling_match_is_case_insensitive_but_exact() {
        let e = enhancer();
        assert_eq!(e.check_spelling("Recieve").len(), 1);
        assert!(e.check_spelling("recieved").is_empty());
    }

    #[test]
    fn flags_could_of() {
        let e = enhancer();
        let diagnostics = e.check_grammar("could of done it");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].offset, 0);
        assert_eq!(diagnostics[0].length, 8);
        assert_eq!(diagnostics[0].replacements, vec!["could have".to_string()]);
    }

    #[test]
    fn your_welcome_flags_but_contraction_passes() {
        let e = enhancer();
        assert_eq!(e.check_grammar("your welcome").len(), 1);
        assert!(e.check_grammar("you're welcome").is_empty());
    }

    #[test]
    fn its_rule_requires_literal_its() {
        let e = enhancer();
        assert_eq!(e.check_grammar("its been a while").len(), 1);
        assert!(e.check_grammar("it's been a while").is_empty());
    }

    #[test]
    fn their_are_suggests_there() {
        let e = enhancer();
        let diagnostics = e.check_grammar("their are two options");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].replacements, vec!["there".to_string()]);
        assert!(e.check_grammar("there are two options").is_empty());
    }

    #[test]
    fn repeated_matches_each_flag() {
        let e = enhancer();
        let diagnostics = e.check_grammar("could of known, could of told you");
        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics[0].offset < diagnostics[1].offset);
    }

    #[test]
    fn flags_first_redundancy_occurrence_only() {
        let e = enhancer();
        let text = "The end result was fine. The end result stayed fine.";
        let diagnostics = e.check_style(text);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].offset, 4);
        assert_eq!(diagnostics[0].replacements, vec!["result".to_string()]);
    }

    #[test]
    fn flags_long_sentence_without_replacement() {
        let e = enhancer();
        let long = (0..45)
            .map(|i| format!("word{i}"))
            .collect::<Vec<_>>()
            .join(" ");
        let text = format!("Short one. {long}.");
        let diagnostics = e.check_style(&text);
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].replacements.is_empty());
        assert!(diagnostics[0].offset + diagnostics[0].length <= text.len());
    }

    #[test]
    fn analyze_concatenates_in_group_order() {
        let e = enhancer();
        let diagnostics = e.analyze("I recieve a free gift, could of sent more.");
        let kinds: Vec<Kind> = diagnostics.iter().map(|d| d.kind).collect();
        assert_eq!(kinds, vec![Kind::Spelling, Kind::Grammar, Kind::Style]);
    }

    #[test]
    fn analyzers_accept_empty_input() {
        let e = enhancer();
        assert!(e.analyze("").is_empty());
        assert!(e.complete("", 0).is_empty());
        assert_eq!(format_professionally(""), "");
        assert_eq!(e.auto_fix(""), "");
    }

    #[test]
    fn auto_fix_repairs_all_misspellings() {
        let e = enhancer();
        let fixed = e.auto_fix("I recieve the occured report");
        assert_eq!(fixed, "I receive the occurred report");
    }

    #[test]
    fn auto_fix_leaves_grammar_and_style_alone() {
        let e = enhancer();
        let text = "could of been a free gift";
        assert_eq!(e.auto_fix(text), text);
    }

    #[test]
    fn apply_correction_with_no_replacements_is_a_noop() {
        let error = Diagnostic {
            kind: Kind::Style,
            message: "too long".into(),
            offset: 0,
            length: 5,
            replacements: Vec::new(),
        };
        assert_eq!(apply_correction("hello", &error, 0), "hello");
    }

    #[test]
    fn apply_correction_survives_stale_spans() {
        let error = Diagnostic {
            kind: Kind::Spelling,
            message: "stale".into(),
            offset: 40,
            length: 10,
            replacements: vec!["x".into()],
        };
        // Result unspecified for stale spans, but it must not panic.
        let _ = apply_correction("short", &error, 0);
    }

    #[test]
    fn apply_correction_snaps_to_char_boundaries() {
        let error = Diagnostic {
            kind: Kind::Spelling,
            message: "stale".into(),
            offset: 2,
            length: 1,
            replacements: vec!["e".into()],
        };
        let _ = apply_correction("héllo", &error, 0);
    }

    #[test]
    fn formats_capitalization_and_spacing() {
        let got = format_professionally("hello.  world,next");
        assert_eq!(got, "Hello. World, next");
    }

    #[test]
    fn format_is_idempotent() {
        let samples = [
            "  hello there.   how are you? done  ",
            "hello.  world,next",
            "one\n\n\n\ntwo",
            "already formatted. Looks fine.",
            "",
        ];
        for sample in samples {
            let once = format_professionally(sample);
            assert_eq!(format_professionally(&once), once, "input: {sample:?}");
        }
    }

    #[test]
    fn glued_sentence_start_capitalizes_on_the_second_pass() {
        // Capitalization runs before punctuation spacing, so a word glued to
        // sentence punctuation only gets its capital once the space inserted
        // by the first pass is visible to the next one.
        let once = format_professionally("hello.world");
        assert_eq!(once, "Hello. world");
        let twice = format_professionally(&once);
        assert_eq!(twice, "Hello. World");
        assert_eq!(format_professionally(&twice), twice);
    }

    #[test]
    fn completes_after_trigger_suffix() {
        let e = enhancer();
        let completions = e.complete("Thank you for ", 14);
        assert_eq!(
            completions,
            vec![
                "your patience",
                "contacting us",
                "reaching out",
                "your email",
                "bringing this to our attention",
            ]
        );
    }

    #[test]
    fn no_completions_without_trigger() {
        let e = enhancer();
        assert!(e.complete("hello", 5).is_empty());
    }

    #[test]
    fn completion_ignores_text_after_cursor() {
        let e = enhancer();
        let completions = e.complete("Please tell me more", 7);
        assert_eq!(completions.len(), 5);
        assert_eq!(completions[0], "let me know");
    }

    #[test]
    fn completion_cursor_is_clamped() {
        let e = enhancer();
        assert_eq!(e.complete("we ", 100).len(), 5);
    }

    #[test]
    fn report_counts_kinds() {
        let e = enhancer();
        let report = e.report("I recieve a free gift");
        assert_eq!(report.kind_counts.get(&Kind::Spelling), Some(&1));
        assert_eq!(report.kind_counts.get(&Kind::Style), Some(&1));
        assert_eq!(report.word_count, 5);
    }

    #[test]
    fn every_span_stays_in_bounds() {
        let e = enhancer();
        let samples = [
            "",
            "recieve",
            "could of. should of! would of?",
            "free gift... end result",
            "their are issues with its going forward",
            "I recieve the occured report untill tommorow",
        ];
        for sample in samples {
            for diagnostic in e.analyze(sample) {
                assert!(
                    diagnostic.offset + diagnostic.length <= sample.len(),
                    "span out of bounds for {sample:?}: {diagnostic:?}"
                );
            }
        }
    }

    #[test]
    fn suggestion_catalog_is_grouped() {
        let e = enhancer();
        let catalog = e.suggestions();
        assert_eq!(catalog.len(), 20);
        for category in ["greeting", "acknowledgment", "solution", "closing", "follow-up"] {
            assert!(catalog.iter().any(|s| s.category == category));
        }
    }

    #[test]
    fn custom_tables_replace_defaults() {
        let mut cfg = Config::default();
        cfg.spelling.corrections = [("teh".to_string(), "the".to_string())]
            .into_iter()
            .collect();
        let e = Enhancer::new(cfg).unwrap();
        assert_eq!(e.check_spelling("teh").len(), 1);
        assert!(e.check_spelling("recieve").is_empty());
    }

    #[test]
    fn invalid_grammar_pattern_is_rejected() {
        let mut cfg = Config::default();
        cfg.grammar.rules.push(GrammarRule {
            pattern: "(unclosed".into(),
            message: "bad".into(),
            replacement: "".into(),
            requires: Vec::new(),
        });
        assert!(Enhancer::new(cfg).is_err());
    }
}
