//! Command-line front end: uploads an image to a running server and prints the
//! interpreted sections.

use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use console::Style;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::multipart::{Form, Part};

use crate::encoding::ImagePayload;
use crate::handlers::IMAGE_FIELD;
use crate::interpret::{ConfidenceTier, Interpretation, Section, SectionVisibility, ViewState};

pub const DEFAULT_SERVER: &str = "http://localhost:3000";

#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    pub server: String,
    pub open: Vec<Section>,
    pub all: bool,
    pub raw: bool,
}

pub async fn run_analyze(image_path: &Path, options: &AnalyzeOptions) -> Result<()> {
    let bytes = tokio::fs::read(image_path)
        .await
        .with_context(|| format!("failed to read {}", image_path.display()))?;
    let file_name = image_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());

    let mut view = ViewState {
        selected_file: Some(file_name.clone()),
        ..ViewState::default()
    };
    if options.all {
        view.sections.open_all();
    }
    for section in &options.open {
        view.sections.set(*section, true);
    }

    let spinner = ProgressBar::new_spinner();
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    spinner.set_message(format!("Analyzing {file_name}…"));

    view.begin_request();
    let outcome = upload(&options.server, &file_name, bytes).await;
    spinner.finish_and_clear();
    view.finish_request(outcome.map_err(|e| format!("{e:#}")));

    if let Some(error) = &view.error {
        return Err(anyhow!("analysis failed: {error}"));
    }

    if options.raw {
        if let Some(text) = &view.result {
            println!("{text}");
        }
        return Ok(());
    }

    if let Some(interpretation) = view.interpretation() {
        print!("{}", render(&interpretation, &view.sections));
    }
    Ok(())
}

async fn upload(server: &str, file_name: &str, bytes: Vec<u8>) -> Result<String> {
    let payload = ImagePayload::new(bytes, None);
    let part = Part::stream(payload.bytes)
        .file_name(file_name.to_string())
        .mime_str(&payload.media_type)?;
    let form = Form::new().part(IMAGE_FIELD, part);

    let url = format!("{}/api/analyze", server.trim_end_matches('/'));
    let response = reqwest::Client::new()
        .post(&url)
        .multipart(form)
        .send()
        .await
        .with_context(|| format!("could not reach {url}"))?;

    let status = response.status();
    let text = response
        .text()
        .await
        .with_context(|| format!("failed to read response body ({status})"))?;

    if !status.is_success() {
        // Proxies and extractor rejections answer in plain text.
        let message = serde_json::from_str::<serde_json::Value>(&text)
            .ok()
            .and_then(|body| body["error"].as_str().map(str::to_string))
            .unwrap_or_else(|| {
                let snippet: String = text.trim().chars().take(200).collect();
                if snippet.is_empty() {
                    "request failed".to_string()
                } else {
                    snippet
                }
            });
        return Err(anyhow!("{message} ({status})"));
    }

    let body: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("server returned a non-JSON body ({status})"))?;
    body["result"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| anyhow!("response has no `result` field ({status})"))
}

/// Renders every section header; bodies only for open sections.
pub fn render(interpretation: &Interpretation, visibility: &SectionVisibility) -> String {
    let title = Style::new().bold();
    let header = Style::new().cyan().bold();
    let dim = Style::new().dim();

    let mut out = format!("{}\n", title.apply_to("Analysis Result"));

    for section in Section::ALL {
        let open = visibility.is_open(section);
        let caret = if open { "▾" } else { "▸" };
        out.push_str(&format!("\n{} {}\n", caret, header.apply_to(section.label())));

        if !open {
            continue;
        }

        let value = interpretation.fields.get(section);
        if section == Section::Confidence {
            let display = &interpretation.confidence_display;
            out.push_str(&format!("  {}\n", tier_style(display.tier).apply_to(value)));
            out.push_str(&format!("  {}\n", dim.apply_to(&display.blurb)));
        } else {
            for line in value.lines() {
                out.push_str(&format!("  {line}\n"));
            }
        }
    }

    if Section::ALL.iter().any(|s| !visibility.is_open(*s)) {
        out.push_str(&format!(
            "\n{}\n",
            dim.apply_to("Use --open <section> or --all to expand sections.")
        ));
    }
    out
}

fn tier_style(tier: ConfidenceTier) -> Style {
    match tier {
        ConfidenceTier::High => Style::new().green().bold(),
        ConfidenceTier::Medium => Style::new().yellow().bold(),
        ConfidenceTier::Low => Style::new().red().bold(),
        ConfidenceTier::Unknown => Style::new().color256(230),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &str = "Likely Organism:\nParamecium\n\nKey Visual Features:\n- cilia\n- oral groove\n\nConfidence:\n65%\n\nUncertainty Notes:\nNone";

    #[test]
    fn test_closed_sections_show_headers_only() {
        let out = render(&Interpretation::from_text(TEXT), &SectionVisibility::default());
        for section in Section::ALL {
            assert!(out.contains(section.label()));
        }
        assert!(!out.contains("Paramecium"));
        assert!(!out.contains("65%"));
        assert!(out.contains("--open"));
    }

    #[test]
    fn test_open_section_shows_body() {
        let mut visibility = SectionVisibility::default();
        visibility.set(Section::Features, true);
        visibility.set(Section::Confidence, true);

        let out = render(&Interpretation::from_text(TEXT), &visibility);
        assert!(out.contains("  - cilia\n"));
        assert!(out.contains("65%"));
        assert!(out.contains("AI suggests this, but some uncertainty remains."));
        assert!(!out.contains("Paramecium"));
    }

    async fn serve_once(response: wiremock::ResponseTemplate) -> wiremock::MockServer {
        use wiremock::matchers::{method, path};

        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(method("POST"))
            .and(path("/api/analyze"))
            .respond_with(response)
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_upload_returns_result() {
        let server = serve_once(
            wiremock::ResponseTemplate::new(200).set_body_json(serde_json::json!({ "result": TEXT })),
        )
        .await;

        let text = upload(&server.uri(), "slide.png", b"png".to_vec()).await.unwrap();
        assert_eq!(text, TEXT);
    }

    #[tokio::test]
    async fn test_upload_reports_json_error_with_status() {
        let server = serve_once(
            wiremock::ResponseTemplate::new(400)
                .set_body_json(serde_json::json!({ "error": "No image provided" })),
        )
        .await;

        let err = upload(&server.uri(), "slide.png", b"png".to_vec()).await.unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("No image provided"), "{message}");
        assert!(message.contains("400"), "{message}");
    }

    #[tokio::test]
    async fn test_upload_reports_plain_text_error_with_status() {
        let server = serve_once(wiremock::ResponseTemplate::new(502).set_body_string("Bad Gateway")).await;

        let err = upload(&server.uri(), "slide.png", b"png".to_vec()).await.unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("Bad Gateway"), "{message}");
        assert!(message.contains("502"), "{message}");
        assert!(!message.contains("non-JSON"), "{message}");
    }

    #[tokio::test]
    async fn test_upload_non_json_success_keeps_status() {
        let server = serve_once(wiremock::ResponseTemplate::new(200).set_body_string("<html>")).await;

        let err = upload(&server.uri(), "slide.png", b"png".to_vec()).await.unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("non-JSON"), "{message}");
        assert!(message.contains("200"), "{message}");
    }

    #[test]
    fn test_all_open_drops_hint() {
        let mut visibility = SectionVisibility::default();
        visibility.open_all();
        let out = render(&Interpretation::from_text(TEXT), &visibility);
        assert!(out.contains("Paramecium"));
        assert!(!out.contains("--open"));
    }
}
