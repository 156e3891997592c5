use olivia_core::access::AccessEntry;
use olivia_core::domain::Domain;
use olivia_core::reply::{ChatReply, LinkLayout, ReplyKind, ReplyLink};
use olivia_core::text::normalize;

use crate::suggest::AccessSuggester;

pub const CLOSING_PHRASE: &str = "¿Hay algo más en lo que te pueda ayudar?";

pub const FALLBACK_TEXT: &str = "En este momento no puedo responder tu consulta. Escríbele a Recursos Humanos o inténtalo nuevamente en unos minutos.";

pub const DEFAULT_MAX_LINES: usize = 4;

#[derive(Clone, Debug)]
pub struct ResponseComposer {
    max_lines: usize,
}

impl Default for ResponseComposer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LINES)
    }
}

impl ResponseComposer {
    pub fn new(max_lines: usize) -> Self {
        Self { max_lines: max_lines.max(1) }
    }

    pub fn max_lines(&self) -> usize {
        self.max_lines
    }

    /// Keeps the first `max_lines` non-empty lines. The closing phrase is cut
    /// out of any line that carries it; the rest of that line stays.
    pub fn limit_lines(&self, text: &str) -> String {
        text.lines()
            .map(strip_closing)
            .filter(|line| !line.is_empty())
            .take(self.max_lines)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// `None` when nothing usable is left of the model text.
    pub fn compose_model(
        &self,
        text: &str,
        domain: Domain,
        links: &[AccessEntry],
    ) -> Option<ChatReply> {
        let body = self.limit_lines(text);
        if body.is_empty() {
            return None;
        }
        let reply = ChatReply::new(ReplyKind::Model, vec![body, CLOSING_PHRASE.to_string()]);
        Some(attach(reply.with_domain(domain), links))
    }

    pub fn compose_rule(&self, response: &str, domain: Domain, links: &[AccessEntry]) -> ChatReply {
        attach(ChatReply::new(ReplyKind::Rule, with_closing(response)).with_domain(domain), links)
    }

    pub fn compose_fallback(&self, domain: Domain, links: &[AccessEntry]) -> ChatReply {
        attach(ChatReply::new(ReplyKind::Fallback, with_closing(FALLBACK_TEXT)).with_domain(domain), links)
    }
}

fn closing_key() -> String {
    normalize(CLOSING_PHRASE).trim_matches(|ch: char| !ch.is_alphanumeric()).to_string()
}

fn has_closing(text: &str) -> bool {
    normalize(text).contains(&closing_key())
}

/// Removes every case and accent insensitive occurrence of the closing
/// phrase, together with its `¿` and `?` marks.
fn strip_closing(line: &str) -> String {
    let key = closing_key().chars().collect::<Vec<_>>();

    // (folded char, byte range of the source char)
    let mut folded = Vec::new();
    for (start, ch) in line.char_indices() {
        let end = start + ch.len_utf8();
        if ch.is_whitespace() {
            folded.push((' ', start, end));
            continue;
        }
        let mut buf = [0_u8; 4];
        for folded_ch in normalize(ch.encode_utf8(&mut buf)).chars() {
            folded.push((folded_ch, start, end));
        }
    }

    let mut kept = Vec::new();
    let mut cursor = 0;
    let mut index = 0;
    while !key.is_empty() && index + key.len() <= folded.len() {
        let window = &folded[index..index + key.len()];
        if !window.iter().map(|(ch, _, _)| *ch).eq(key.iter().copied()) {
            index += 1;
            continue;
        }

        let start = line[..window[0].1].trim_end_matches(['¿', '¡']).len().max(cursor);
        let end = window[key.len() - 1].2;
        let tail = &line[end..];
        let end = end + (tail.len() - tail.trim_start_matches(['?', '!', '.']).len());

        kept.push(line[cursor..start].trim());
        cursor = end;
        index += key.len();
    }
    kept.push(line[cursor..].trim());
    kept.into_iter().filter(|piece| !piece.is_empty()).collect::<Vec<_>>().join(" ")
}

fn with_closing(text: &str) -> Vec<String> {
    let text = text.trim().to_string();
    if has_closing(&text) {
        vec![text]
    } else {
        vec![text, CLOSING_PHRASE.to_string()]
    }
}

fn attach(reply: ChatReply, links: &[AccessEntry]) -> ChatReply {
    let layout = if AccessSuggester::is_region_choice(links) {
        LinkLayout::RegionChoice
    } else {
        LinkLayout::QuickAccess
    };
    reply.with_links(links.iter().map(ReplyLink::from).collect(), layout)
}
