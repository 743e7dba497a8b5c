//! Organization email template and placeholder substitution

use std::{fs, path::Path};

use askama::{Html, MarkupDisplay};
use css_inline::CSSInliner;
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use tracing::{debug, warn};

use super::{recipients::Recipient, settings::OrganizationSettings};

/// Used when the template file cannot be read
pub const FALLBACK_TEMPLATE: &str = "#message#";

lazy_static! {
    static ref HIDDEN_BLOCKS: Regex =
        Regex::new(r"(?is)<(?:style|script|title|head)\b[^>]*>.*?</\s*(?:style|script|title|head)\s*>")
            .expect("hidden block regex is valid");
    static ref LINE_BREAKS: Regex =
        Regex::new(r"(?i)<br\s*/?>|</(?:p|div|h[1-6]|li|tr|table|blockquote)\s*>")
            .expect("line break regex is valid");
    static ref TAGS: Regex = Regex::new(r"(?s)<[^>]*>").expect("tag regex is valid");
    static ref BLANK_LINES: Regex = Regex::new(r"\n{3,}").expect("blank line regex is valid");
    static ref RECIPIENT_TOKENS: Regex =
        Regex::new(r"#recipient_([a-z0-9_]+)#").expect("recipient token regex is valid");
}

/// Values substituted into the organization template
#[derive(Debug)]
pub struct TemplateContext<'a> {
    /// The sender's display name
    pub sender_name: &'a str,

    /// The sender's address
    pub sender_email: &'a str,

    /// The message subject
    pub subject: &'a str,

    /// The message body as HTML
    pub message: &'a str,

    /// Description of who receives the message
    pub recipients: &'a str,

    /// Organization details
    pub organization: &'a OrganizationSettings,
}

/// HTML and plain text produced from the template
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedBodies {
    /// HTML body with inlined CSS
    pub html: String,

    /// Plain text body
    pub plain: String,
}

/// An organization email template
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmailTemplate {
    source: String,
}

impl EmailTemplate {
    /// Create a template from its source
    pub fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
        }
    }

    /// Load the template file, falling back to the bare message when it
    /// cannot be read
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(source) => {
                debug!("loaded email template {}", path.display());
                Self::new(&source)
            }
            Err(err) => {
                warn!(
                    "could not read email template {}: {}; using fallback",
                    path.display(),
                    err
                );
                Self::new(FALLBACK_TEMPLATE)
            }
        }
    }

    /// Substitute the organization-wide placeholders and derive both bodies.
    ///
    /// The message is inserted last so that placeholders written by the sender,
    /// such as `#recipient_firstname#`, survive until send time.
    pub fn render(&self, context: &TemplateContext<'_>) -> RenderedBodies {
        let substituted = self
            .source
            .replace("#sender#", &escape_html(context.sender_name))
            .replace("#sender_email#", &escape_html(context.sender_email))
            .replace("#subject#", &escape_html(context.subject))
            .replace("#recipients#", &escape_html(context.recipients))
            .replace(
                "#organization_name#",
                &escape_html(&context.organization.name),
            )
            .replace(
                "#organization_shortname#",
                &escape_html(&context.organization.short_name),
            )
            .replace(
                "#organization_website#",
                &escape_html(&context.organization.website),
            )
            .replace("#message#", context.message);

        RenderedBodies {
            plain: html_to_plain(&substituted),
            html: inline_css(&substituted),
        }
    }
}

/// Replace the recipient placeholders in an HTML body.
///
/// Without a recipient every recipient placeholder is blanked.
pub fn personalize_html(html: &str, recipient: Option<&Recipient>) -> String {
    personalize(html, recipient, escape_html)
}

/// Replace the recipient placeholders in a plain text body.
pub fn personalize_plain(plain: &str, recipient: Option<&Recipient>) -> String {
    personalize(plain, recipient, |value| value.to_string())
}

fn personalize(text: &str, recipient: Option<&Recipient>, encode: fn(&str) -> String) -> String {
    RECIPIENT_TOKENS
        .replace_all(text, |caps: &Captures<'_>| {
            let Some(recipient) = recipient else {
                return String::new();
            };

            let value = match &caps[1] {
                "firstname" => recipient.first_name.as_str(),
                "lastname" => recipient.last_name.as_str(),
                "email" => recipient.address.as_str(),
                "name" => recipient.display_name(),
                field => recipient.extra.get(field).map(String::as_str).unwrap_or(""),
            };

            encode(value)
        })
        .into_owned()
}

/// Convert HTML into readable plain text
pub fn html_to_plain(html: &str) -> String {
    let text = HIDDEN_BLOCKS.replace_all(html, "");
    let text = LINE_BREAKS.replace_all(&text, "\n");
    let text = TAGS.replace_all(&text, "");
    let text = decode_entities(&text);

    let text = text
        .lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n");

    BLANK_LINES.replace_all(&text, "\n\n").trim().to_string()
}

/// Inline the CSS of `<style>` blocks while keeping the blocks themselves
fn inline_css(html: &str) -> String {
    let inliner = CSSInliner::options()
        .keep_style_tags(true)
        .load_remote_stylesheets(false)
        .build();

    match inliner.inline(html) {
        Ok(inlined) => inlined,
        Err(err) => {
            warn!("could not inline email CSS: {}", err);
            html.to_string()
        }
    }
}

/// Escape text for insertion into HTML
pub fn escape_html(value: &str) -> String {
    MarkupDisplay::new_unsafe(value, Html).to_string()
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
