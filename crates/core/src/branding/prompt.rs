use super::types::Field;

/// Color keywords the palette search understands well.
pub const COLOR_KEYWORDS: &[&str] = &[
    "white", "black", "green", "red", "mint", "bright", "light", "spring", "aqua", "soft",
    "summer", "orange", "coastal", "cream", "warm", "pink", "blue", "neutral", "elegant",
    "pastel", "vibrant",
];

/// Build the branding prompt from a user description and retrieved snippets.
///
/// The model is asked for one JSON object so the reply can be read without
/// scraping; the labeled format is still accepted by the extractor.
pub fn build_prompt(description: &str, context: &str) -> String {
    let keywords = COLOR_KEYWORDS.join(", ");
    let context = if context.trim().is_empty() {
        "(no reference material available)"
    } else {
        context.trim()
    };

    format!(
        "\
You are a branding expert. Based on the description below and the provided references, \
create ONE SINGLE branding suggestion.

Important:
- Return ONLY ONE brand name, ONE slogan, and ONE short branding concept.
- Do NOT generate multiple options.
- Reply with a single JSON object and nothing else, using exactly these keys:

```json
{{
  \"{name}\": \"<creative brand name>\",
  \"{slogan}\": \"<short impactful slogan>\",
  \"{logo_mark}\": \"<basic logo mark>\",
  \"{color}\": \"<one of: {keywords}>\",
  \"{concept}\": \"<short explanation>\"
}}
```

User description:
{description}

Reference keywords or insights:
{context}
",
        description = description.trim(),
        name = Field::Name.key(),
        slogan = Field::Slogan.key(),
        logo_mark = Field::LogoMark.key(),
        color = Field::Color.key(),
        concept = Field::Concept.key(),
    )
}
