//! Structured chat replies and their HTML rendering.
//!
//! A reply keeps plain text and links apart. Rendering escapes every piece of
//! text and builds the anchors itself, so no string coming from a rule, the
//! model or the user is ever trusted as markup.

use serde::Serialize;
use tera::escape_html;

use crate::access::AccessEntry;
use crate::domain::Domain;

pub const REGION_CHOICE_PROMPT: &str = "¿De qué región eres? Elige tu horario:";
pub const QUICK_ACCESS_PROMPT: &str = "Acceso rápido:";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyKind {
    Prompt,
    Menu,
    Rule,
    Model,
    Fallback,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkLayout {
    #[default]
    None,
    QuickAccess,
    RegionChoice,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReplyLink {
    pub slug: String,
    pub label: String,
    pub url: String,
}

impl From<&AccessEntry> for ReplyLink {
    fn from(entry: &AccessEntry) -> Self {
        Self { slug: entry.slug.clone(), label: entry.label.clone(), url: entry.url.clone() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChatReply {
    pub kind: ReplyKind,
    pub domain: Option<Domain>,
    pub segments: Vec<String>,
    pub links: Vec<ReplyLink>,
    pub link_layout: LinkLayout,
}

impl ChatReply {
    pub fn new(kind: ReplyKind, segments: Vec<String>) -> Self {
        Self { kind, domain: None, segments, links: Vec::new(), link_layout: LinkLayout::None }
    }

    pub fn text(kind: ReplyKind, text: impl Into<String>) -> Self {
        Self::new(kind, vec![text.into()])
    }

    pub fn with_domain(mut self, domain: Domain) -> Self {
        self.domain = Some(domain);
        self
    }

    pub fn with_links(mut self, links: Vec<ReplyLink>, layout: LinkLayout) -> Self {
        self.link_layout = if links.is_empty() { LinkLayout::None } else { layout };
        self.links = links;
        self
    }

    /// Plain-text rendering, used by the CLI and the JSON `texto` field.
    pub fn plain_text(&self) -> String {
        let mut blocks = self.segments.clone();
        if let Some(header) = self.link_header() {
            let mut block = vec![header.to_string()];
            block.extend(self.links.iter().map(|link| format!("- {}: {}", link.label, link.url)));
            blocks.push(block.join("\n"));
        }
        blocks.join("\n\n")
    }

    /// HTML fragment for the chat widget. Links point at the slug redirect
    /// endpoint under `redirect_prefix`.
    pub fn to_html(&self, redirect_prefix: &str) -> String {
        let mut blocks = self
            .segments
            .iter()
            .map(|segment| format!("<p>{}</p>", escape_text(segment)))
            .collect::<Vec<_>>();

        if let Some(header) = self.link_header() {
            let anchors = self
                .links
                .iter()
                .map(|link| {
                    format!(
                        "<a href=\"{}{}\" target=\"_blank\" rel=\"noopener\">{}</a>",
                        escape_html(redirect_prefix),
                        escape_html(&link.slug),
                        escape_html(&link.label)
                    )
                })
                .collect::<Vec<_>>();
            let separator = match self.link_layout {
                LinkLayout::RegionChoice => " | ",
                _ => "<br>",
            };
            blocks.push(format!(
                "<p class=\"links\">{}<br>{}</p>",
                escape_html(header),
                anchors.join(separator)
            ));
        }

        blocks.join("")
    }

    fn link_header(&self) -> Option<&'static str> {
        if self.links.is_empty() {
            return None;
        }
        match self.link_layout {
            LinkLayout::RegionChoice => Some(REGION_CHOICE_PROMPT),
            LinkLayout::QuickAccess | LinkLayout::None => Some(QUICK_ACCESS_PROMPT),
        }
    }
}

fn escape_text(text: &str) -> String {
    text.split('\n').map(escape_html).collect::<Vec<_>>().join("<br>")
}
