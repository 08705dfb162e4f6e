use std::time::Duration;

use brandkit_core::canvas::{palette_canvas, placeholder, TextRenderer};
use brandkit_core::palette::{
    logo_url, palette_url, parse_colors, select_palette, Palette, PaletteCandidate,
};
use image::DynamicImage;

use crate::context::AssetOptions;
use crate::prelude::*;

pub const LOGO_TIMEOUT: Duration = Duration::from_secs(60);
pub const PALETTE_TIMEOUT: Duration = Duration::from_secs(30);

/// Pixel height of the slogan drawn with a TrueType font.
const SLOGAN_PX: f32 = 32.0;
/// Dot size of the built-in font when no TrueType font is available.
const SLOGAN_BUILTIN_SCALE: u32 = 3;
const PLACEHOLDER_BUILTIN_SCALE: u32 = 2;

/// Palette image together with the palette it was drawn from.
#[derive(Debug, Clone)]
pub struct PaletteAsset {
    pub image: DynamicImage,
    pub palette: Palette,
}

/// Fetches the logo and palette images.
///
/// Every public fetch succeeds: failures are logged and replaced with the
/// placeholder canvas (and the fallback palette).
pub struct AssetFetcher {
    logo_client: reqwest::Client,
    palette_client: reqwest::Client,
    logo_base: String,
    palette_base: String,
    slogan_font: TextRenderer,
    placeholder_font: TextRenderer,
}

impl AssetFetcher {
    pub fn new(options: &AssetOptions) -> Result<Self> {
        let logo_client = reqwest::Client::builder()
            .timeout(LOGO_TIMEOUT)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| eyre!("Failed to build HTTP client: {}", e))?;

        let palette_client = reqwest::Client::builder()
            .timeout(PALETTE_TIMEOUT)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| eyre!("Failed to build HTTP client: {}", e))?;

        let font_data = match std::fs::read(&options.font) {
            Ok(data) => Some(data),
            Err(e) => {
                log::debug!("Failed to read font '{}': {}", options.font.display(), e);
                None
            }
        };
        let slogan_font =
            TextRenderer::outline_or_builtin(font_data, SLOGAN_PX, SLOGAN_BUILTIN_SCALE);
        if slogan_font.is_builtin() {
            log::info!(
                "Font '{}' unavailable, using the built-in font",
                options.font.display()
            );
        }

        Ok(Self {
            logo_client,
            palette_client,
            logo_base: options.logo_url.clone(),
            palette_base: options.palette_url.clone(),
            slogan_font,
            placeholder_font: TextRenderer::builtin(PLACEHOLDER_BUILTIN_SCALE),
        })
    }

    /// Generate a logo image for `prompt`.
    pub async fn fetch_logo(&self, prompt: &str) -> DynamicImage {
        match self.try_fetch_logo(prompt).await {
            Ok(image) => image,
            Err(e) => {
                log::warn!("Error generating logo image: {e:#}");
                self.placeholder(prompt)
            }
        }
    }

    /// Look up a palette for `keyword` and draw it with `slogan` on top.
    pub async fn fetch_palette(&self, slogan: &str, keyword: &str) -> PaletteAsset {
        match self.try_fetch_palette(slogan, keyword).await {
            Ok(asset) => asset,
            Err(e) => {
                log::warn!("Error generating palette image: {e:#}");
                PaletteAsset {
                    image: self.placeholder(slogan),
                    palette: Palette::fallback(),
                }
            }
        }
    }

    /// Fetch the logo and the palette concurrently.
    pub async fn fetch_all(
        &self,
        logo_prompt: &str,
        slogan: &str,
        keyword: &str,
    ) -> (DynamicImage, PaletteAsset) {
        tokio::join!(
            self.fetch_logo(logo_prompt),
            self.fetch_palette(slogan, keyword)
        )
    }

    fn placeholder(&self, text: &str) -> DynamicImage {
        DynamicImage::ImageRgb8(placeholder(text, &self.placeholder_font))
    }

    async fn try_fetch_logo(&self, prompt: &str) -> Result<DynamicImage> {
        let url = logo_url(&self.logo_base, prompt);
        log::debug!("Fetching logo from {url}");

        let response = self
            .logo_client
            .get(&url)
            .send()
            .await
            .map_err(Error::Network)?
            .error_for_status()
            .map_err(Error::Network)?;

        let bytes = response
            .bytes()
            .await
            .map_err(Error::Network)?;

        image::load_from_memory(&bytes).wrap_err("Failed to decode logo image")
    }

    async fn try_fetch_palette(&self, slogan: &str, keyword: &str) -> Result<PaletteAsset> {
        let url = palette_url(&self.palette_base, keyword);
        log::debug!("Fetching palette from {url}");

        let candidates: Vec<PaletteCandidate> = self
            .palette_client
            .get(&url)
            .send()
            .await
            .map_err(Error::Network)?
            .error_for_status()
            .map_err(Error::Network)?
            .json()
            .await
            .wrap_err("Failed to parse palette response")?;

        let palette = select_palette(candidates)?;
        let colors = parse_colors(&palette.colors)?;
        let image = palette_canvas(&colors, slogan, &self.slogan_font);

        Ok(PaletteAsset {
            image: DynamicImage::ImageRgb8(image),
            palette,
        })
    }
}
