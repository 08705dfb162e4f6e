pub mod extract;
pub mod prompt;
pub mod types;

pub use extract::{extract_branding, extract_labeled, extract_structured};
pub use prompt::{build_prompt, COLOR_KEYWORDS};
pub use types::{BrandingResult, Field};
