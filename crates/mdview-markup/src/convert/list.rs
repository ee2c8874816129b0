//! Bullet and ordered lists.

use std::sync::LazyLock;

use regex::Regex;

static BULLET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*[-*]\s+(.*)$").unwrap());
static ORDERED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*\d+[.)]\s+(.*)$").unwrap());

#[derive(Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Unordered,
    Ordered,
}

impl ListKind {
    fn tag(self) -> &'static str {
        match self {
            Self::Unordered => "ul",
            Self::Ordered => "ol",
        }
    }
}

/// Convert runs of list item lines into single `<ul>`/`<ol>` elements.
///
/// A non-matching line, or an item of the other kind, closes the current
/// list.
pub(super) fn convert_lists(text: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut current: Option<(ListKind, Vec<String>)> = None;

    for line in text.lines() {
        match list_item(line) {
            Some((kind, item)) => match &mut current {
                Some((open_kind, items)) if *open_kind == kind => items.push(item.to_owned()),
                _ => {
                    flush(&mut out, current.take());
                    current = Some((kind, vec![item.to_owned()]));
                }
            },
            None => {
                flush(&mut out, current.take());
                out.push(line.to_owned());
            }
        }
    }
    flush(&mut out, current);

    out.join("\n")
}

fn list_item(line: &str) -> Option<(ListKind, &str)> {
    if let Some(caps) = BULLET.captures(line) {
        return caps.get(1).map(|m| (ListKind::Unordered, m.as_str().trim()));
    }
    ORDERED
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| (ListKind::Ordered, m.as_str().trim()))
}

fn flush(out: &mut Vec<String>, list: Option<(ListKind, Vec<String>)>) {
    let Some((kind, items)) = list else {
        return;
    };
    let tag = kind.tag();
    let mut html = format!("<{tag}>");
    for item in items {
        html.push_str("<li>");
        html.push_str(&item);
        html.push_str("</li>");
    }
    html.push_str("</");
    html.push_str(tag);
    html.push('>');
    out.push(html);
}
