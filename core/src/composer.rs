//! Reply composition state machine.
//!
//! Owns one draft per ticket: text, an optional linked template, and
//! validated attachments. Template fetching and reply submission are
//! collaborator traits so the composer stays independent of any transport.

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{AttachmentPolicy, PlaceholderSyntax};

/// Email template as returned by the template collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    pub id: i64,
    pub name: String,
    pub subject: String,
    pub body: String,
}

/// Live ticket data used for placeholder substitution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketContext {
    pub id: i64,
    pub customer_name: String,
    pub customer_email: String,
    pub subject: String,
    pub adviser_name: String,
}

/// File selected for upload alongside a reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    #[serde(skip)]
    pub content: Vec<u8>,
}

/// Per-file validation result. Rejected files are never added to the draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentOutcome {
    Accepted { name: String, warning: Option<String> },
    Rejected { name: String, reason: String },
}

/// Finished reply handed to the submission collaborator.
#[derive(Debug, Clone)]
pub struct OutgoingReply {
    pub ticket_id: i64,
    pub text: String,
    pub template_id: Option<i64>,
    pub close_after: bool,
    pub attachments: Vec<Attachment>,
}

/// Fetches full templates by id.
pub trait TemplateStore {
    fn fetch(&self, id: i64) -> anyhow::Result<Template>;
}

/// Delivers a finished reply to the ticket backend.
pub trait ReplySink {
    fn send(&self, reply: &OutgoingReply) -> anyhow::Result<()>;
}

#[derive(Debug, Error)]
pub enum ComposerError {
    #[error("reply text is empty")]
    EmptyReply,
    #[error("a submission is already in flight")]
    SubmitInFlight,
    #[error("template fetch failed: {0}")]
    TemplateFetch(#[source] anyhow::Error),
    #[error("reply submission failed: {0}")]
    Submit(#[source] anyhow::Error),
}

/// Composer lifecycle. Failure during submission drops back to `Editing`
/// with the draft intact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposerState {
    Idle,
    Editing,
    Submitting,
}

#[derive(Debug, Clone, Default)]
struct Draft {
    text: String,
    template_id: Option<i64>,
    // Substituted body captured at selection time; manual edits that diverge
    // from it unlink the template.
    template_baseline: Option<String>,
    attachments: Vec<Attachment>,
}

/// One composer instance per open ticket; it owns its draft exclusively.
pub struct Composer {
    ticket: TicketContext,
    policy: AttachmentPolicy,
    placeholders: PlaceholderSyntax,
    state: ComposerState,
    draft: Draft,
}

impl Composer {
    pub fn new(
        ticket: TicketContext,
        policy: AttachmentPolicy,
        placeholders: PlaceholderSyntax,
    ) -> Self {
        Self {
            ticket,
            policy,
            placeholders,
            state: ComposerState::Idle,
            draft: Draft::default(),
        }
    }

    pub fn state(&self) -> ComposerState {
        self.state
    }

    pub fn text(&self) -> &str {
        &self.draft.text
    }

    pub fn template_id(&self) -> Option<i64> {
        self.draft.template_id
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.draft.attachments
    }

    /// Replace the draft text. Diverging from the linked template's body
    /// unlinks the template while keeping the edited text.
    pub fn edit_text(&mut self, new_text: &str) {
        if let Some(baseline) = &self.draft.template_baseline {
            if new_text != baseline {
                self.draft.template_id = None;
                self.draft.template_baseline = None;
            }
        }
        self.draft.text = new_text.to_string();
        if self.state == ComposerState::Idle {
            self.state = ComposerState::Editing;
        }
    }

    /// Fetch a template, substitute placeholders with live ticket data, and
    /// overwrite the draft text wholesale. A fetch failure leaves the draft
    /// untouched.
    pub fn select_template(
        &mut self,
        store: &dyn TemplateStore,
        id: i64,
    ) -> Result<(), ComposerError> {
        let template = store.fetch(id).map_err(ComposerError::TemplateFetch)?;
        let body = substitute_placeholders(&template.body, &self.ticket, self.placeholders);
        self.draft.text = body.clone();
        self.draft.template_baseline = Some(body);
        self.draft.template_id = Some(template.id);
        if self.state == ComposerState::Idle {
            self.state = ComposerState::Editing;
        }
        Ok(())
    }

    /// Unlink the template and empty the draft text.
    pub fn clear_template(&mut self) {
        self.draft.template_id = None;
        self.draft.template_baseline = None;
        self.draft.text.clear();
    }

    /// Validate each file against the policy; accepted files are appended to
    /// the draft, rejected ones are surfaced per file and dropped.
    pub fn attach(&mut self, files: Vec<Attachment>) -> Vec<AttachmentOutcome> {
        let mut outcomes = Vec::with_capacity(files.len());
        for file in files {
            match validate_attachment(&self.policy, &file) {
                Ok(warning) => {
                    outcomes.push(AttachmentOutcome::Accepted {
                        name: file.name.clone(),
                        warning,
                    });
                    self.draft.attachments.push(file);
                }
                Err(reason) => outcomes.push(AttachmentOutcome::Rejected {
                    name: file.name,
                    reason,
                }),
            }
        }
        outcomes
    }

    /// Start a submission: validate the draft, enter `Submitting`, and hand
    /// back the reply to deliver. While the composer is in `Submitting` every
    /// further `begin_submit` call is refused, which is what disables the
    /// send button until the in-flight request resolves.
    pub fn begin_submit(&mut self, close_after: bool) -> Result<OutgoingReply, ComposerError> {
        if self.state == ComposerState::Submitting {
            return Err(ComposerError::SubmitInFlight);
        }
        let trimmed = self.draft.text.trim();
        if trimmed.is_empty() {
            return Err(ComposerError::EmptyReply);
        }

        self.state = ComposerState::Submitting;
        Ok(OutgoingReply {
            ticket_id: self.ticket.id,
            text: trimmed.to_string(),
            template_id: self.draft.template_id,
            close_after,
            attachments: self.draft.attachments.clone(),
        })
    }

    /// Resolve an in-flight submission. Success resets to an empty idle
    /// draft; failure keeps the draft so the user can retry. Either way the
    /// state leaves `Submitting`.
    pub fn finish_submit(&mut self, outcome: anyhow::Result<()>) -> Result<(), ComposerError> {
        match outcome {
            Ok(()) => {
                self.draft = Draft::default();
                self.state = ComposerState::Idle;
                Ok(())
            }
            Err(err) => {
                self.state = ComposerState::Editing;
                Err(ComposerError::Submit(err))
            }
        }
    }

    /// Send the trimmed draft through the sink in one step.
    pub fn submit(
        &mut self,
        sink: &dyn ReplySink,
        close_after: bool,
    ) -> Result<(), ComposerError> {
        let outgoing = self.begin_submit(close_after)?;
        self.finish_submit(sink.send(&outgoing))
    }
}

/// Pure per-file validation against the policy: MIME allow-list, general
/// ceiling, then category ceilings and warning floors in table order.
pub fn validate_attachment(
    policy: &AttachmentPolicy,
    file: &Attachment,
) -> Result<Option<String>, String> {
    if !policy.allowed_types.iter().any(|t| t == &file.mime_type) {
        return Err(format!("Invalid file type: {}", file.name));
    }
    if file.size_bytes > policy.max_bytes {
        return Err(format!(
            "File too large (>{} MB): {}",
            policy.max_bytes / (1024 * 1024),
            file.name
        ));
    }
    for category in &policy.categories {
        if !file.mime_type.starts_with(category.prefix.as_str()) {
            continue;
        }
        if let Some(max) = category.max_bytes {
            if file.size_bytes > max {
                return Err(format!(
                    "File too large (>{} MB): {}",
                    max / (1024 * 1024),
                    file.name
                ));
            }
        }
        if let Some(floor) = category.warn_below_bytes {
            if file.size_bytes < floor {
                return Ok(Some(format!(
                    "Warning: {} is smaller than {} MB",
                    file.name,
                    floor / (1024 * 1024)
                )));
            }
        }
    }
    Ok(None)
}

/// Replace `ticket_id`, `customer_name`, `subject`, and `adviser_name`
/// markers (case-insensitively, in the configured syntax) with live values.
pub fn substitute_placeholders(
    body: &str,
    ticket: &TicketContext,
    syntax: PlaceholderSyntax,
) -> String {
    let fields: [(&str, String); 4] = [
        ("ticket_id", ticket.id.to_string()),
        ("customer_name", ticket.customer_name.clone()),
        ("subject", ticket.subject.clone()),
        ("adviser_name", ticket.adviser_name.clone()),
    ];
    let mut out = body.to_string();
    for (key, value) in fields {
        let pattern = match syntax {
            PlaceholderSyntax::CurlyLower => format!(r"(?i)\{{{key}\}}"),
            PlaceholderSyntax::BracketUpper => format!(r"(?i)\[{}\]", key.to_uppercase()),
        };
        // Keys are fixed identifiers, so the pattern always compiles.
        let re = Regex::new(&pattern).expect("placeholder regex");
        out = re
            .replace_all(&out, regex::NoExpand(value.as_str()))
            .into_owned();
    }
    out
}
