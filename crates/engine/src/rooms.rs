use roxmltree::{Document, Node, ParsingOptions};
use serde::Deserialize;
use thiserror::Error;

/// A content page shown as an overlay over the world.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Room {
    pub key: String,
    pub title: String,
    /// Site page this room stands in for, e.g. `about.html`.
    pub page: String,
    pub html_body: String,
}

impl Room {
    /// Title reduced to what the bitmap font can draw.
    pub fn plain_title(&self) -> String {
        to_ascii(&self.title).trim().to_string()
    }

    pub fn body_lines(&self) -> Result<Vec<String>, MarkupError> {
        html_to_lines(&self.html_body)
    }
}

/// Room body that is not well-formed XHTML. `line` counts from the first
/// line of the body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("room markup line {line}: {message}")]
pub struct MarkupError {
    pub line: u32,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RoomCatalog {
    rooms: Vec<Room>,
}

impl RoomCatalog {
    pub fn new(rooms: Vec<Room>) -> Self {
        Self { rooms }
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn by_key(&self, key: &str) -> Option<&Room> {
        self.rooms.iter().find(|room| room.key == key)
    }

    pub fn by_page(&self, page: &str) -> Option<&Room> {
        let page = page.trim_start_matches("./");
        self.rooms.iter().find(|room| room.page == page)
    }

    /// Rooms whose body fails to parse, with the parse error.
    pub fn markup_errors(&self) -> Vec<(&str, MarkupError)> {
        self.rooms
            .iter()
            .filter_map(|room| room.body_lines().err().map(|error| (room.key.as_str(), error)))
            .collect()
    }
}

const BLOCK_TAGS: &[&str] = &[
    "p", "br", "div", "h1", "h2", "h3", "h4", "h5", "h6", "ul", "ol", "li", "section", "form",
    "label", "table", "tr",
];

// Named HTML entities the room bodies may use; XML only knows five.
const ROOM_DOCTYPE: &str = "<!DOCTYPE room [\
<!ENTITY nbsp \"&#160;\"><!ENTITY ndash \"&#8211;\"><!ENTITY mdash \"&#8212;\">\
<!ENTITY lsquo \"&#8216;\"><!ENTITY rsquo \"&#8217;\"><!ENTITY ldquo \"&#8220;\">\
<!ENTITY rdquo \"&#8221;\"><!ENTITY bull \"&#8226;\"><!ENTITY hellip \"&#8230;\">]>";

// Lines of wrapper markup ahead of the body.
const WRAPPER_LINES: u32 = 2;

// Marks a blank line before headings; survives the ASCII filter.
const SECTION_BREAK: char = '\u{1}';

fn is_heading(name: &str) -> bool {
    name.len() == 2 && name.starts_with('h') && name.as_bytes()[1].is_ascii_digit()
}

/// Flattens an XHTML fragment into display lines. Block elements break
/// lines, headings open a new section, list items get a bullet, inline
/// elements keep only their text and comments are dropped.
pub(crate) fn html_to_lines(html: &str) -> Result<Vec<String>, MarkupError> {
    let wrapped = format!("{ROOM_DOCTYPE}\n<room>\n{html}</room>");
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let doc = Document::parse_with_options(&wrapped, options).map_err(|error| MarkupError {
        line: error.pos().row.saturating_sub(WRAPPER_LINES),
        message: error.to_string(),
    })?;

    let mut text = String::with_capacity(html.len());
    collect_text(doc.root_element(), &mut text);

    let decoded = to_ascii(&text);
    let mut lines: Vec<String> = Vec::new();
    for raw in decoded.lines() {
        if raw.trim() == SECTION_BREAK.to_string() {
            if lines.last().is_some_and(|last| !last.is_empty()) {
                lines.push(String::new());
            }
            continue;
        }
        let line = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        if !line.is_empty() {
            lines.push(line);
        }
    }
    while lines.last().is_some_and(String::is_empty) {
        lines.pop();
    }
    Ok(lines)
}

fn collect_text(node: Node<'_, '_>, text: &mut String) {
    for child in node.children() {
        if child.is_text() {
            text.push_str(child.text().unwrap_or_default());
            continue;
        }
        if !child.is_element() {
            continue;
        }
        let name = child.tag_name().name().to_ascii_lowercase();
        if is_heading(&name) {
            text.push('\n');
            text.push(SECTION_BREAK);
        }
        let block = BLOCK_TAGS.contains(&name.as_str());
        if block {
            text.push('\n');
            if name == "li" {
                text.push_str("- ");
            }
        }
        collect_text(child, text);
        if block {
            text.push('\n');
        }
    }
}

fn to_ascii(text: &str) -> String {
    text.chars()
        .filter_map(|c| match c {
            '\u{2018}' | '\u{2019}' => Some('\''),
            '\u{201c}' | '\u{201d}' => Some('"'),
            '\u{2013}' | '\u{2014}' => Some('-'),
            '\u{2022}' => Some('*'),
            '\u{2026}' => Some('.'),
            '\u{a0}' => Some(' '),
            c if c.is_ascii() => Some(c),
            _ => None,
        })
        .collect()
}

/// Greedy word wrap to at most `width` characters per line. Words longer
/// than `width` are split.
pub fn wrap_text(line: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut wrapped = Vec::new();
    let mut current = String::new();
    for word in line.split_whitespace() {
        let mut word = word;
        while word.chars().count() > width {
            if !current.is_empty() {
                wrapped.push(std::mem::take(&mut current));
            }
            let split = word
                .char_indices()
                .nth(width)
                .map_or(word.len(), |(index, _)| index);
            wrapped.push(word[..split].to_string());
            word = &word[split..];
        }
        if word.is_empty() {
            continue;
        }
        let needed = if current.is_empty() {
            word.len()
        } else {
            current.len() + 1 + word.len()
        };
        if needed > width && !current.is_empty() {
            wrapped.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() || wrapped.is_empty() {
        wrapped.push(current);
    }
    wrapped
}
