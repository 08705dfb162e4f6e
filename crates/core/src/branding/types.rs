use serde::{Deserialize, Serialize};

/// One of the five labeled fields produced by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    Slogan,
    Concept,
    LogoMark,
    Color,
}

impl Field {
    pub const ALL: [Field; 5] = [
        Field::Name,
        Field::Slogan,
        Field::Concept,
        Field::LogoMark,
        Field::Color,
    ];

    /// Label used in the bold `**Label:**` form.
    pub fn label(self) -> &'static str {
        match self {
            Field::Name => "Brand Name",
            Field::Slogan => "Slogan",
            Field::Concept => "Branding Concept",
            Field::LogoMark => "Logo Mark",
            Field::Color => "Color",
        }
    }

    /// Key used by the structured JSON reply.
    pub fn key(self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Slogan => "slogan",
            Field::Concept => "concept",
            Field::LogoMark => "logo_mark",
            Field::Color => "color",
        }
    }

    /// Text used when the field could not be extracted.
    pub fn sentinel(self) -> &'static str {
        match self {
            Field::Name => "Name not generated",
            Field::Slogan => "Slogan not generated",
            Field::Concept => "Concept not generated",
            Field::LogoMark => "Logo Mark not generated",
            Field::Color => "Color not generated",
        }
    }

    /// Whether a captured value may continue on the following lines.
    pub fn is_multiline(self) -> bool {
        matches!(self, Field::Concept | Field::LogoMark | Field::Color)
    }
}

/// Branding suggestion extracted from a single model reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandingResult {
    pub name: String,
    pub slogan: String,
    pub concept: String,
    pub logo_mark: String,
    pub color: String,
}

impl BrandingResult {
    /// A result where every field holds its sentinel.
    pub fn not_generated() -> Self {
        Self {
            name: Field::Name.sentinel().to_string(),
            slogan: Field::Slogan.sentinel().to_string(),
            concept: Field::Concept.sentinel().to_string(),
            logo_mark: Field::LogoMark.sentinel().to_string(),
            color: Field::Color.sentinel().to_string(),
        }
    }

    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Slogan => &self.slogan,
            Field::Concept => &self.concept,
            Field::LogoMark => &self.logo_mark,
            Field::Color => &self.color,
        }
    }

    /// True when the field holds extracted content rather than its sentinel.
    pub fn is_generated(&self, field: Field) -> bool {
        self.get(field) != field.sentinel()
    }
}
