use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use super::types::{BrandingResult, Field};

/// Extract a branding suggestion from a raw model reply.
///
/// The structured JSON object requested by the prompt is preferred. Any field
/// it does not provide is scraped from labeled lines (`**Slogan:** ...`,
/// `Slogan - ...`), and anything still missing is set to the field's
/// sentinel. This function never fails.
pub fn extract_branding(raw: &str) -> BrandingResult {
    let structured = extract_structured(raw).unwrap_or_default();

    let value = |field: Field| -> String {
        structured
            .get(&field)
            .cloned()
            .or_else(|| extract_labeled(raw, field))
            .unwrap_or_else(|| field.sentinel().to_string())
    };

    BrandingResult {
        name: value(Field::Name),
        slogan: value(Field::Slogan),
        concept: value(Field::Concept),
        logo_mark: value(Field::LogoMark),
        color: value(Field::Color),
    }
}

/// Read the fields of a JSON object embedded in the reply.
///
/// Looks inside a ```json fence first, then at the outermost `{...}` span.
/// Only non-empty string values are kept.
pub fn extract_structured(raw: &str) -> Option<HashMap<Field, String>> {
    let candidate = fenced_json(raw).or_else(|| braced_span(raw))?;
    let object: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(candidate).ok()?;

    let mut fields = HashMap::new();
    for (key, value) in &object {
        let Some(field) = field_for_key(key) else {
            continue;
        };
        let Some(text) = value.as_str().map(str::trim) else {
            continue;
        };
        if !text.is_empty() {
            fields.entry(field).or_insert_with(|| text.to_string());
        }
    }

    Some(fields)
}

/// Scrape one field from labeled lines, strict bold form first.
///
/// Labels may follow list markers (`1.`, `2)`, `-`, `•`). When no line starts
/// with the label, a `Label:` later in a line is used.
pub fn extract_labeled(raw: &str, field: Field) -> Option<String> {
    let patterns = patterns(field);

    if let Some(m) = patterns.strict.find(raw) {
        if let Some(value) = capture_value(raw, m.end(), field) {
            return Some(value);
        }
    }

    let loose = |re: &Regex| {
        let m = re.find(raw)?;
        capture_value(raw, m.end(), field)
            .map(|value| value.trim_matches('*').trim().to_string())
            .filter(|value| !value.is_empty())
    };

    loose(&patterns.loose).or_else(|| loose(&patterns.inline))
}

fn capture_value(raw: &str, start: usize, field: Field) -> Option<String> {
    let value = if field.is_multiline() {
        let end = label_line()
            .find_at(raw, start)
            .map(|m| m.start())
            .unwrap_or(raw.len());
        raw[start..end].trim()
    } else {
        let rest = &raw[start..];
        let trimmed = rest.trim_start();
        let skipped = &rest[..rest.len() - trimmed.len()];

        // A value pushed to the next line must not be another field's label.
        if skipped.contains('\n') && starts_with_label(trimmed) {
            return None;
        }

        trimmed.lines().next().unwrap_or_default().trim()
    };

    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn starts_with_label(text: &str) -> bool {
    label_line().find(text).is_some_and(|m| m.start() == 0)
}

fn field_for_key(key: &str) -> Option<Field> {
    let normalized = key.trim().to_lowercase().replace([' ', '-'], "_");
    if let Some(&field) = Field::ALL.iter().find(|field| field.key() == normalized) {
        return Some(field);
    }
    match normalized.as_str() {
        "brand_name" => Some(Field::Name),
        "tagline" => Some(Field::Slogan),
        "branding_concept" => Some(Field::Concept),
        "logo" => Some(Field::LogoMark),
        "colour" => Some(Field::Color),
        _ => None,
    }
}

fn fenced_json(raw: &str) -> Option<&str> {
    let open = raw.find("```json")?;
    let body = &raw[open + "```json".len()..];
    let close = body.find("```")?;
    Some(body[..close].trim())
}

fn braced_span(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}

/// What may precede a label at the start of a line: indentation, quote and
/// heading markers, bullets, and one list number such as `1.` or `2)`.
const LINE_PREFIX: &str = r"[ \t>#*_•-]*(?:\d+[.)][ \t]*)?[ \t>#*_•-]*";

struct Patterns {
    strict: Regex,
    loose: Regex,
    /// The label anywhere in a line; needs a colon.
    inline: Regex,
}

/// Label words of a field as a case-insensitive alternation body.
fn loose_label(field: Field) -> &'static str {
    match field {
        Field::Name => r"(?:brand[ \t]+name|name)",
        Field::Slogan => r"slogan",
        Field::Concept => r"branding[ \t]+concept",
        Field::LogoMark => r"logo[ \t]+mark",
        Field::Color => r"colou?r",
    }
}

fn patterns(field: Field) -> &'static Patterns {
    static PATTERNS: OnceLock<Vec<Patterns>> = OnceLock::new();
    let all = PATTERNS.get_or_init(|| {
        Field::ALL
            .iter()
            .map(|&field| Patterns {
                strict: Regex::new(&format!(
                    r"(?m)^{LINE_PREFIX}\*\*{}:\*\*",
                    regex::escape(field.label())
                ))
                .unwrap(),
                loose: Regex::new(&format!(
                    r"(?mi)^{LINE_PREFIX}{}\b\**[ \t]*[:\-]?",
                    loose_label(field)
                ))
                .unwrap(),
                inline: Regex::new(&format!(
                    r"(?i)\b{}\b\**[ \t]*:",
                    loose_label(field)
                ))
                .unwrap(),
            })
            .collect()
    });
    &all[field as usize]
}

/// Matches a line that opens any field, bold or not, followed by `:` or `-`.
fn label_line() -> &'static Regex {
    static RE_LABEL: OnceLock<Regex> = OnceLock::new();
    RE_LABEL.get_or_init(|| {
        let labels = Field::ALL
            .iter()
            .map(|&field| loose_label(field))
            .collect::<Vec<_>>()
            .join("|");
        Regex::new(&format!(
            r"(?mi)^{LINE_PREFIX}(?:{labels})\b\**[ \t]*[:\-]"
        ))
        .unwrap()
    })
}
