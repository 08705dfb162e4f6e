use image::Rgb;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Palette name used when no palette could be fetched.
pub const FALLBACK_PALETTE_NAME: &str = "fallback";

/// Single color used when no palette could be fetched.
pub const FALLBACK_COLOR: &str = "#ffffff";

/// One entry of the palette search response.
///
/// Only `colors` and `text` are read; other fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaletteCandidate {
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub text: String,
}

/// A named, ordered list of colors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    pub name: String,
    pub colors: Vec<String>,
}

impl Palette {
    pub fn fallback() -> Self {
        Self {
            name: FALLBACK_PALETTE_NAME.to_string(),
            colors: vec![FALLBACK_COLOR.to_string()],
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.name == FALLBACK_PALETTE_NAME
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaletteError {
    #[error("No palette found")]
    Empty,
    #[error("Palette has no colors")]
    NoColors,
    #[error("Unrecognized color: {0}")]
    InvalidColor(String),
}

/// Pick the first candidate of a search response.
pub fn select_palette(candidates: Vec<PaletteCandidate>) -> Result<Palette, PaletteError> {
    let first = candidates.into_iter().next().ok_or(PaletteError::Empty)?;

    if first.colors.is_empty() {
        return Err(PaletteError::NoColors);
    }

    Ok(Palette {
        name: first.text,
        colors: first.colors,
    })
}

/// Parse every color of a palette, failing on the first one not understood.
pub fn parse_colors(colors: &[String]) -> Result<Vec<Rgb<u8>>, PaletteError> {
    colors.iter().map(|color| parse_color(color)).collect()
}

/// Parse a hex code (`#rgb`, `#rrggbb`, with or without `#`) or a basic CSS color name.
pub fn parse_color(color: &str) -> Result<Rgb<u8>, PaletteError> {
    let trimmed = color.trim();
    let invalid = || PaletteError::InvalidColor(color.to_string());

    if let Some(rgb) = named_color(&trimmed.to_lowercase()) {
        return Ok(Rgb(rgb));
    }

    let hex = trimmed.strip_prefix('#').unwrap_or(trimmed);
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }

    match hex.len() {
        3 => {
            let mut channels = [0u8; 3];
            for (channel, c) in channels.iter_mut().zip(hex.chars()) {
                let digit = c.to_digit(16).ok_or_else(invalid)? as u8;
                *channel = digit * 17;
            }
            Ok(Rgb(channels))
        }
        6 => {
            let mut channels = [0u8; 3];
            for (i, channel) in channels.iter_mut().enumerate() {
                *channel = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).map_err(|_| invalid())?;
            }
            Ok(Rgb(channels))
        }
        _ => Err(invalid()),
    }
}

fn named_color(name: &str) -> Option<[u8; 3]> {
    let rgb = match name {
        "white" => [255, 255, 255],
        "black" => [0, 0, 0],
        "red" => [255, 0, 0],
        "green" => [0, 128, 0],
        "lime" => [0, 255, 0],
        "blue" => [0, 0, 255],
        "navy" => [0, 0, 128],
        "yellow" => [255, 255, 0],
        "orange" => [255, 165, 0],
        "pink" => [255, 192, 203],
        "purple" => [128, 0, 128],
        "aqua" | "cyan" => [0, 255, 255],
        "teal" => [0, 128, 128],
        "mintcream" => [245, 255, 250],
        "beige" => [245, 245, 220],
        "ivory" => [255, 255, 240],
        "brown" => [165, 42, 42],
        "gray" | "grey" => [128, 128, 128],
        "silver" => [192, 192, 192],
        "gold" => [255, 215, 0],
        "coral" => [255, 127, 80],
        _ => return None,
    };
    Some(rgb)
}

/// Build the image generation URL for a prompt.
///
/// Spaces become underscores before the prompt is percent-encoded as a path segment.
pub fn logo_url(base_url: &str, prompt: &str) -> String {
    let safe_prompt = prompt.trim().replace(' ', "_");
    format!(
        "{}/prompt/{}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(&safe_prompt)
    )
}

/// Build the palette search URL for a color keyword.
pub fn palette_url(base_url: &str, keyword: &str) -> String {
    format!(
        "{}/api/palette/search?q={}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(keyword.trim())
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(colors: &[&str], text: &str) -> PaletteCandidate {
        PaletteCandidate {
            colors: colors.iter().map(|c| c.to_string()).collect(),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_select_first_candidate() {
        let palette = select_palette(vec![
            candidate(&["#112233", "#445566"], "Ocean breeze"),
            candidate(&["#000000"], "Night"),
        ])
        .unwrap();
        assert_eq!(palette.name, "Ocean breeze");
        assert_eq!(palette.colors, vec!["#112233", "#445566"]);
    }

    #[test]
    fn test_select_empty_response() {
        assert_eq!(select_palette(vec![]), Err(PaletteError::Empty));
    }

    #[test]
    fn test_select_candidate_without_colors() {
        assert_eq!(
            select_palette(vec![candidate(&[], "Nothing")]),
            Err(PaletteError::NoColors)
        );
    }

    #[test]
    fn test_candidate_ignores_unknown_fields() {
        let json = r##"[{"colors": ["#fff"], "text": "Snow", "likes": 12, "tags": ["white"]}]"##;
        let candidates: Vec<PaletteCandidate> = serde_json::from_str(json).unwrap();
        assert_eq!(candidates, vec![candidate(&["#fff"], "Snow")]);
    }

    #[test]
    fn test_fallback_palette() {
        let palette = Palette::fallback();
        assert_eq!(palette.name, "fallback");
        assert_eq!(palette.colors, vec!["#ffffff"]);
        assert!(palette.is_fallback());
    }

    #[test]
    fn test_parse_hex_colors() {
        assert_eq!(parse_color("#ff8000"), Ok(Rgb([255, 128, 0])));
        assert_eq!(parse_color("FF8000"), Ok(Rgb([255, 128, 0])));
        assert_eq!(parse_color("#fff"), Ok(Rgb([255, 255, 255])));
        assert_eq!(parse_color(" #0a0B0c "), Ok(Rgb([10, 11, 12])));
    }

    #[test]
    fn test_parse_named_colors() {
        assert_eq!(parse_color("White"), Ok(Rgb([255, 255, 255])));
        assert_eq!(parse_color("grey"), Ok(Rgb([128, 128, 128])));
    }

    #[test]
    fn test_parse_invalid_colors() {
        assert!(parse_color("#12345").is_err());
        assert!(parse_color("#gggggg").is_err());
        assert!(parse_color("sunset").is_err());
        assert!(parse_colors(&["#000".to_string(), "nope".to_string()]).is_err());
    }

    #[test]
    fn test_logo_url_replaces_spaces() {
        assert_eq!(
            logo_url("https://image.pollinations.ai/", "a rising sun"),
            "https://image.pollinations.ai/prompt/a_rising_sun"
        );
    }

    #[test]
    fn test_logo_url_encodes_reserved_characters() {
        assert_eq!(
            logo_url("http://localhost", "cup/mug?"),
            "http://localhost/prompt/cup%2Fmug%3F"
        );
    }

    #[test]
    fn test_palette_url() {
        assert_eq!(
            palette_url("https://colormagic.app", "warm pastel"),
            "https://colormagic.app/api/palette/search?q=warm%20pastel"
        );
    }
}
