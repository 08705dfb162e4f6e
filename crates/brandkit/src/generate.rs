use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use brandkit_core::branding::Field;
use colored::Colorize;
use image::DynamicImage;
use indicatif::{ProgressBar, ProgressStyle};

use crate::context::{BrandingContext, BrandingOutcome, ContextOptions};
use crate::prelude::{eprintln, println, *};
use crate::web::BrandingResponse;

#[derive(Debug, clap::Args)]
pub struct GenerateOptions {
    /// Description of the brand or business
    #[clap(env = "BRANDKIT_DESCRIPTION")]
    pub description: String,

    /// Folder where logo.png and palette.png are written
    #[arg(short, long)]
    pub out_dir: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    #[clap(flatten)]
    pub context: ContextOptions,
}

pub async fn run(options: GenerateOptions, global: crate::Global) -> Result<()> {
    let description = options.description.trim();
    if description.is_empty() {
        return Err(eyre!("Please enter a description before generating."));
    }

    let context = BrandingContext::init(options.context.clone(), &global).await?;

    let spinner = std::io::stderr().is_terminal().then(|| {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(100));
        spinner.set_message("Generating...");
        spinner
    });

    let outcome = context.generate(description).await;

    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    let saved = match &options.out_dir {
        Some(dir) => Some(save_images(&outcome, dir)?),
        None => None,
    };

    if options.json {
        let json = serde_json::to_string_pretty(&BrandingResponse::from_outcome(&outcome))?;
        println!("{}", json);
    } else {
        output_formatted(&outcome, saved.as_ref());
    }

    Ok(())
}

fn save_images(outcome: &BrandingOutcome, dir: &Path) -> Result<(PathBuf, PathBuf)> {
    std::fs::create_dir_all(dir)
        .with_context(|| f!("Failed to create output folder '{}'", dir.display()))?;

    let logo = dir.join("logo.png");
    let palette = dir.join("palette.png");
    save_png(&outcome.logo, &logo)?;
    save_png(&outcome.palette.image, &palette)?;

    Ok((logo, palette))
}

fn save_png(image: &DynamicImage, path: &Path) -> Result<()> {
    image
        .save_with_format(path, image::ImageFormat::Png)
        .with_context(|| f!("Failed to write '{}'", path.display()))
}

fn output_formatted(outcome: &BrandingOutcome, saved: Option<&(PathBuf, PathBuf)>) {
    let result = &outcome.result;
    let is_tty = std::io::stdout().is_terminal();

    let fields = [
        ("Suggested name", Field::Name),
        ("Suggested slogan", Field::Slogan),
        ("Branding concept", Field::Concept),
        ("Logo mark", Field::LogoMark),
        ("Color", Field::Color),
    ];

    for (title, field) in fields {
        let value = result.get(field);
        if is_tty {
            println!("\n{}", title.green().bold());
            if result.is_generated(field) {
                println!("{}", value.bright_white());
            } else {
                println!("{}", value.bright_black().italic());
            }
        } else {
            println!("{title}: {value}");
        }
    }

    let palette = &outcome.palette.palette;
    if is_tty {
        println!("\n{}", "Palette".green().bold());
        if palette.is_fallback() {
            println!("{}", "No palette found, using the fallback".bright_black().italic());
        } else {
            println!(
                "{} {}",
                palette.name.bright_white(),
                palette.colors.join(" ").bright_yellow()
            );
        }
        println!("\n{}", "Context used (insights from docs)".green().bold());
        println!("{}", outcome.context.white());
    } else {
        println!("Palette: {} ({})", palette.name, palette.colors.join(", "));
    }

    match saved {
        Some((logo, palette_path)) => {
            eprintln!(
                "\n{}: {}",
                "Logo".green(),
                logo.display().to_string().cyan().underline()
            );
            eprintln!(
                "{}: {}",
                "Palette image".green(),
                palette_path.display().to_string().cyan().underline()
            );
        }
        None if is_tty => {
            eprintln!("\n{}:", "To save the images".bright_white().bold());
            eprintln!("  {}", "brandkit generate \"<description>\" --out-dir out".cyan());
        }
        None => {}
    }
}
