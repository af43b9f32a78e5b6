//! Text helpers behind the derived display fields of [`Game`](crate::core::Game).

use serde_json::Value;

use crate::core::game::ExternalLink;

const OMISSION: &str = "...";

const COMPLEXITIES: [&str; 5] = ["light", "medium light", "medium", "medium heavy", "heavy"];

const LANGUAGE_DEPENDENCIES: [&str; 5] = [
    "no necessary in-game text",
    "some necessary text",
    "moderate in-game text",
    "extensive use of text",
    "unplayable in another language",
];

/// Shorten `text` to at most `length` chars including the `...` marker,
/// cutting at the last `,? +` separator that fits.
pub fn truncate(text: &str, length: usize) -> String {
    if text.chars().count() <= length {
        return text.to_string();
    }

    let keep = length.saturating_sub(OMISSION.len());
    let cut = text.char_indices().nth(keep).map_or(text.len(), |(i, _)| i);
    let (head, rest) = text.split_at(cut);

    // Already ends on a word boundary
    if separator_at(rest.as_bytes(), 0).is_some() {
        return format!("{head}{OMISSION}");
    }

    let end = last_separator(head).unwrap_or(head.len());
    format!("{}{OMISSION}", &head[..end])
}

/// Length of a `,? +` match starting at `i`
fn separator_at(bytes: &[u8], i: usize) -> Option<usize> {
    let start = if bytes.get(i) == Some(&b',') { i + 1 } else { i };
    let spaces = bytes[start.min(bytes.len())..]
        .iter()
        .take_while(|b| **b == b' ')
        .count();
    (spaces > 0).then_some(start - i + spaces)
}

fn last_separator(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut last = None;
    let mut i = 0;
    while i < bytes.len() {
        match separator_at(bytes, i) {
            Some(len) => {
                last = Some(i);
                i += len;
            }
            None => i += 1,
        }
    }
    last
}

/// `a, b & c`
pub fn join(items: &[String], sep: &str, last_sep: &str) -> String {
    match items {
        [] => String::new(),
        [only] => only.clone(),
        [init @ .., last] => format!("{}{last_sep}{last}", init.join(sep)),
    }
}

/// Paragraphs separated by blank lines, trimmed, empty ones dropped
pub fn paragraphs(text: &str) -> Vec<String> {
    let mut result = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.split('\n') {
        if line.trim().is_empty() {
            push_paragraph(&mut result, &mut current);
        } else {
            current.push(line);
        }
    }
    push_paragraph(&mut result, &mut current);

    result
}

fn push_paragraph(result: &mut Vec<String>, lines: &mut Vec<&str>) {
    let paragraph = lines.join("\n");
    let paragraph = paragraph.trim();
    if !paragraph.is_empty() {
        result.push(paragraph.to_string());
    }
    lines.clear();
}

fn scale_label(value: f64, labels: &[&'static str; 5]) -> Option<&'static str> {
    if !(1.0..=5.0).contains(&value) {
        return None;
    }
    // 1.0..=5.0 rounds to 1..=5
    labels.get(value.round() as usize - 1).copied()
}

pub fn complexity_label(value: f64) -> Option<&'static str> {
    scale_label(value, &COMPLEXITIES)
}

pub fn language_dependency_label(value: f64) -> Option<&'static str> {
    scale_label(value, &LANGUAGE_DEPENDENCIES)
}

/// Five icon classes for a 1-5 star score, half stars from .5
pub fn star_classes(score: Option<f64>) -> Vec<String> {
    let Some(score) = score.filter(|s| (1.0..=5.0).contains(s)) else {
        return Vec::new();
    };

    (1..=5)
        .map(|star| {
            let star = f64::from(star);
            let class = if score >= star {
                "fas fa-star"
            } else if score >= star - 0.5 {
                "fas fa-star-half-alt"
            } else {
                "far fa-star"
            };
            class.to_string()
        })
        .collect()
}

/// External ids come as a scalar or a list of scalars
pub fn link_ids(value: &Value) -> Vec<String> {
    match value {
        Value::Array(values) => values.iter().flat_map(link_ids).collect(),
        Value::String(s) if !s.is_empty() => vec![s.clone()],
        Value::Number(n) if n.as_f64() != Some(0.0) => vec![n.to_string()],
        _ => Vec::new(),
    }
}

pub fn external_link(site: &str, id: &str) -> Option<ExternalLink> {
    if id.is_empty() {
        return None;
    }

    let (url, label, icon_url, icon_class) = match site {
        "bgg" => (
            format!("https://boardgamegeek.com/boardgame/{id}/"),
            "BoardGameGeek",
            Some("/assets/bgg-color.svg"),
            None,
        ),
        "bga" => (
            format!("https://www.boardgameatlas.com/search/game/{id}?amazonTag=ludoj0f-20"),
            "Board Game Atlas",
            Some("/assets/bga.png"),
            None,
        ),
        "wikidata" => (
            format!("https://www.wikidata.org/wiki/{id}"),
            "Wikidata",
            Some("/assets/wikidata.svg"),
            None,
        ),
        "wikipedia" => (
            format!("https://en.wikipedia.org/wiki/{id}"),
            "Wikipedia",
            None,
            Some("fab fa-wikipedia-w"),
        ),
        "luding" => (
            format!("http://www.luding.org/cgi-bin/GameData.py/ENgameid/{id}"),
            "Luding",
            None,
            None,
        ),
        "spielen" => (
            format!("https://gesellschaftsspiele.spielen.de/alle-brettspiele/{id}/"),
            "spielen.de",
            Some("/assets/spielen.png"),
            None,
        ),
        _ => return None,
    };

    Some(ExternalLink {
        site: site.to_string(),
        url,
        label: label.to_string(),
        icon_url: icon_url.map(str::to_string),
        icon_class: icon_class.map(str::to_string),
    })
}
