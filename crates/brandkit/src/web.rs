use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::Html,
    routing::{get, post},
    Form, Json, Router,
};
use base64::Engine;
use brandkit_core::canvas::encode_png;
use brandkit_core::palette::Palette;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};

use crate::context::{BrandingContext, BrandingOutcome, ContextOptions};
use crate::prelude::{eprintln, *};

const EMPTY_DESCRIPTION: &str = "Please enter a description before generating.";

#[derive(Debug, clap::Args)]
pub struct ServeOptions {
    /// Port to listen on
    #[arg(short, long, env = "BRANDKIT_PORT", default_value = "8501")]
    pub port: u16,

    /// Host to bind to
    #[arg(long, env = "BRANDKIT_HOST", default_value = "127.0.0.1")]
    pub host: String,

    #[clap(flatten)]
    pub context: ContextOptions,
}

pub async fn run(options: ServeOptions, global: crate::Global) -> Result<()> {
    let context = BrandingContext::init(options.context, &global).await?;
    if global.verbose {
        eprintln!("Index holds {} chunks", context.index().len());
    }

    let addr = f!("{}:{}", options.host, options.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| eyre!("Failed to bind to {}: {}", addr, e))?;

    eprintln!("Branding assistant listening on http://{}", addr);

    axum::serve(listener, router(Arc::new(context)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| eyre!("Server error: {e}"))?;

    log::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::warn!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}

pub fn router(context: Arc<BrandingContext>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/api/branding", post(api_handler))
        .layer(cors);

    Router::new()
        .route("/", get(index_handler).post(form_handler))
        .route("/health", get(|| async { "ok" }))
        .merge(api)
        .with_state(context)
}

#[derive(Debug, Deserialize)]
pub struct GenerateForm {
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub description: String,
}

/// JSON form of a [`BrandingOutcome`]; images are base64-encoded PNGs.
#[derive(Debug, Serialize)]
pub struct BrandingResponse {
    pub name: String,
    pub slogan: String,
    pub concept: String,
    pub logo_mark: String,
    pub color: String,
    pub context: String,
    pub palette: Palette,
    pub logo_png: String,
    pub palette_png: String,
}

impl BrandingResponse {
    pub fn from_outcome(outcome: &BrandingOutcome) -> Self {
        let result = &outcome.result;
        Self {
            name: result.name.clone(),
            slogan: result.slogan.clone(),
            concept: result.concept.clone(),
            logo_mark: result.logo_mark.clone(),
            color: result.color.clone(),
            context: outcome.context.clone(),
            palette: outcome.palette.palette.clone(),
            logo_png: png_base64(&outcome.logo),
            palette_png: png_base64(&outcome.palette.image),
        }
    }
}

fn png_base64(image: &DynamicImage) -> String {
    match encode_png(image) {
        Ok(bytes) => base64::engine::general_purpose::STANDARD.encode(bytes),
        Err(e) => {
            log::warn!("Failed to encode image: {e}");
            String::new()
        }
    }
}

async fn index_handler() -> Html<String> {
    Html(render_page("", &PageBody::Empty))
}

/// The trimmed description, or `None` when there is nothing to generate from.
fn requested_description(raw: &str) -> Option<&str> {
    let description = raw.trim();
    (!description.is_empty()).then_some(description)
}

async fn form_handler(
    State(context): State<Arc<BrandingContext>>,
    Form(form): Form<GenerateForm>,
) -> Html<String> {
    let Some(description) = requested_description(&form.description) else {
        return Html(render_page("", &PageBody::Warning(EMPTY_DESCRIPTION)));
    };

    let outcome = context.generate(description).await;
    let response = BrandingResponse::from_outcome(&outcome);
    Html(render_page(description, &PageBody::Result(&response)))
}

async fn api_handler(
    State(context): State<Arc<BrandingContext>>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<BrandingResponse>, (StatusCode, Json<serde_json::Value>)> {
    let Some(description) = requested_description(&request.description) else {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": EMPTY_DESCRIPTION })),
        ));
    };

    let outcome = context.generate(description).await;
    Ok(Json(BrandingResponse::from_outcome(&outcome)))
}

pub enum PageBody<'a> {
    Empty,
    Warning(&'a str),
    Result(&'a BrandingResponse),
}

fn text(value: &str) -> String {
    html_escape::encode_text(value).into_owned()
}

fn attr(value: &str) -> String {
    html_escape::encode_double_quoted_attribute(value).into_owned()
}

/// Render the single page: the form, then a warning or the generated assets.
pub fn render_page(description: &str, body: &PageBody<'_>) -> String {
    let body = match body {
        PageBody::Empty => String::new(),
        PageBody::Warning(message) => f!("<p class=\"warning\">{}</p>", text(message)),
        PageBody::Result(response) => render_result(response),
    };

    f!(r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Branding AI Assistant</title>
<style>
body {{ font-family: sans-serif; max-width: 760px; margin: 2rem auto; padding: 0 1rem; }}
body {{ color: #222; }}
textarea {{ width: 100%; font: inherit; }}
button {{ margin-top: .5rem; padding: .5rem 1rem; }}
.warning {{ background: #fff4d6; border: 1px solid #e6c200; padding: .75rem; }}
.note {{ color: #777; font-style: italic; }}
.swatches span {{ display: inline-block; width: 2rem; height: 2rem; border: 1px solid #ccc; }}
img {{ max-width: 100%; }}
pre {{ white-space: pre-wrap; background: #f6f6f6; padding: .75rem; }}
</style>
</head>
<body>
<h1>Branding AI Assistant</h1>
<p>Create name, slogan, and brand concept from a description.</p>
<form method="post" action="/">
<label for="description">Describe your brand/business:</label>
<textarea id="description" name="description" rows="7">{description}</textarea>
<button type="submit">Generate Branding</button>
</form>
{body}
</body>
</html>
"#,
        description = text(description),
    )
}

fn render_result(response: &BrandingResponse) -> String {
    let swatches: String = response
        .palette
        .colors
        .iter()
        .map(|color| {
            f!(
                "<span title=\"{}\" style=\"background: {}\"></span>",
                attr(color),
                attr(color)
            )
        })
        .collect();
    let palette_note = if response.palette.is_fallback() {
        "<p class=\"note\">No palette found for this color.</p>"
    } else {
        ""
    };

    f!(r#"<h2>Suggested name</h2>
<p>{name}</p>
<h2>Suggested slogan</h2>
<p>{slogan}</p>
<h2>Branding concept</h2>
<p>{concept}</p>
<h2>Logo mark</h2>
<p>{logo_mark}</p>
<img alt="Logo" src="data:image/png;base64,{logo_png}">
<h2>Color</h2>
<p>{color}</p>
<h3>Palette: {palette_name}</h3>
{palette_note}
<div class="swatches">{swatches}</div>
<img alt="Palette" src="data:image/png;base64,{palette_png}">
<h2>Context used (insights from docs)</h2>
<pre>{context}</pre>
"#,
        name = text(&response.name),
        slogan = text(&response.slogan),
        concept = text(&response.concept),
        logo_mark = text(&response.logo_mark),
        logo_png = response.logo_png,
        color = text(&response.color),
        palette_name = text(&response.palette.name),
        palette_png = response.palette_png,
        context = text(&response.context),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{AssetOptions, CorpusOptions, ModelOptions};
    use crate::index::OllamaEmbedder;
    use axum::body::Body;
    use axum::http::{header, Request};
    use brandkit_core::retrieval::VectorIndex;
    use tower::ServiceExt;

    const UNREACHABLE: &str = "http://127.0.0.1:1";

    fn app() -> Router {
        let options = ContextOptions {
            model: ModelOptions {
                ollama_url: UNREACHABLE.to_string(),
                model: "m".to_string(),
                embedding_model: "m".to_string(),
            },
            corpus: CorpusOptions {
                docs_dir: "docs".into(),
                index_dir: "vectorstore".into(),
            },
            assets: AssetOptions {
                logo_url: UNREACHABLE.to_string(),
                palette_url: UNREACHABLE.to_string(),
                font: "does-not-exist.ttf".into(),
            },
        };
        let embedder = OllamaEmbedder::new(reqwest::Client::new(), UNREACHABLE, "m");
        let context =
            BrandingContext::assemble(options, embedder, VectorIndex::new("m", Vec::new()), false)
                .unwrap();
        router(Arc::new(context))
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn response() -> BrandingResponse {
        BrandingResponse {
            name: "Lumen <Coffee>".to_string(),
            slogan: "Brighten & brew".to_string(),
            concept: "A cozy cafe".to_string(),
            logo_mark: "A rising sun".to_string(),
            color: "warm".to_string(),
            context: "Warm tones sell coffee.".to_string(),
            palette: Palette {
                name: "Sunrise".to_string(),
                colors: vec!["#ff8800".to_string(), "\"bad\"".to_string()],
            },
            logo_png: "AAAA".to_string(),
            palette_png: "BBBB".to_string(),
        }
    }

    #[test]
    fn test_empty_page_has_form() {
        let page = render_page("", &PageBody::Empty);
        assert!(page.contains("<form method=\"post\" action=\"/\">"));
        assert!(page.contains("name=\"description\""));
        assert!(!page.contains("Suggested name"));
    }

    #[test]
    fn test_warning_page() {
        let page = render_page("", &PageBody::Warning(EMPTY_DESCRIPTION));
        assert!(page.contains(
            "<p class=\"warning\">Please enter a description before generating.</p>"
        ));
    }

    #[test]
    fn test_result_page_escapes_fields() {
        let page = render_page("cafe <b>", &PageBody::Result(&response()));
        assert!(page.contains("cafe &lt;b&gt;</textarea>"));
        assert!(page.contains("<p>Lumen &lt;Coffee&gt;</p>"));
        assert!(page.contains("<p>Brighten &amp; brew</p>"));
        assert!(page.contains("<h3>Palette: Sunrise</h3>"));
        assert!(!page.contains("\"bad\""));
    }

    #[test]
    fn test_result_page_embeds_images() {
        let page = render_page("cafe", &PageBody::Result(&response()));
        assert!(page.contains("src=\"data:image/png;base64,AAAA\""));
        assert!(page.contains("src=\"data:image/png;base64,BBBB\""));
        assert!(page.contains("style=\"background: #ff8800\""));
    }

    #[test]
    fn test_png_base64_is_png() {
        let image = DynamicImage::ImageRgb8(image::RgbImage::new(2, 2));
        let encoded = png_base64(&image);
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
    }

    #[test]
    fn test_response_serializes_palette() {
        let json = serde_json::to_value(response()).unwrap();
        assert_eq!(json["palette"]["name"], "Sunrise");
        assert_eq!(json["name"], "Lumen <Coffee>");
    }

    #[test]
    fn test_requested_description() {
        assert_eq!(requested_description("  cafe \n"), Some("cafe"));
        assert_eq!(requested_description(" \t\n "), None);
        assert_eq!(requested_description(""), None);
    }

    #[test]
    fn test_fallback_palette_note() {
        let mut fallback = response();
        fallback.palette = Palette::fallback();
        let page = render_page("cafe", &PageBody::Result(&fallback));
        assert!(page.contains("No palette found for this color."));
    }

    #[tokio::test]
    async fn test_form_blank_description_shows_warning() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from("description=+++%0A"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let page = body_text(response).await;
        assert!(page.contains("<p class=\"warning\">Please enter a description"));
        assert!(!page.contains("Suggested name"));
    }

    #[tokio::test]
    async fn test_form_missing_description_shows_warning() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let page = body_text(response).await;
        assert!(page.contains("class=\"warning\""));
    }

    #[tokio::test]
    async fn test_api_blank_description_is_bad_request() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/branding")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"description": "   "}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json["error"], EMPTY_DESCRIPTION);
    }

    #[tokio::test]
    async fn test_index_and_health() {
        let response = app()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("<form method=\"post\""));

        let response = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_text(response).await, "ok");
    }
}
