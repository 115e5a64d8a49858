use pulldown_cmark::{Parser, Event, Tag, TagEnd};
use headless_chrome::{Browser, LaunchOptions, types::PrintToPdfOptions};
use chrono::{DateTime, Local};
use std::fs;

use crate::error::{AppError, AppResult};
use crate::models::{ChatMessage, PdfExport, Sender};

const PLACEHOLDER: char = '?';

/// Clamp text to the Latin-1 repertoire the transcript is laid out in.
/// Anything above U+00FF becomes `?`; this is deliberately lossy.
pub fn to_latin1_lossy(text: &str) -> String {
    text.chars()
        .map(|c| if (c as u32) <= 0xFF { c } else { PLACEHOLDER })
        .collect()
}

/// `chat_{label}_{YYYYMMDD_HHMMSS}.pdf`, with the label made filesystem-safe.
pub fn export_filename(role_label: &str, exported_at: DateTime<Local>) -> String {
    let safe_label: String = role_label
        .replace(' ', "_")
        .chars()
        .filter(|c| !matches!(c, '(' | ')' | '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|'))
        .collect();
    format!("chat_{}_{}.pdf", safe_label, exported_at.format("%Y%m%d_%H%M%S"))
}

/// Render one role's transcript and print it to PDF.
///
/// Returns `None` when there is nothing to export.
pub fn export_chat(role_label: &str, history: &[ChatMessage]) -> AppResult<Option<PdfExport>> {
    if history.is_empty() {
        return Ok(None);
    }

    let exported_at = Local::now();
    let html = render_transcript_html(role_label, history, exported_at);
    let bytes = print_html_to_pdf(&html)?;
    tracing::info!(
        "Exported {} messages for {} ({} bytes)",
        history.len(),
        role_label,
        bytes.len()
    );

    Ok(Some(PdfExport {
        filename: export_filename(role_label, exported_at),
        bytes,
    }))
}

pub fn render_transcript_html(
    role_label: &str,
    history: &[ChatMessage],
    exported_at: DateTime<Local>,
) -> String {
    let label = to_latin1_lossy(role_label);
    let mut messages_html = String::new();

    for msg in history {
        let sender = match msg.role {
            Sender::User if msg.failed => "You (not delivered)".to_string(),
            Sender::User => "You".to_string(),
            Sender::Assistant => label.clone(),
        };
        let class = match msg.role {
            Sender::User => "message user",
            Sender::Assistant => "message assistant",
        };
        messages_html.push_str(&format!(
            r#"<section class="{}"><p class="sender">{}:</p><div class="content">{}</div></section>"#,
            class,
            html_escape(&sender),
            markdown_to_html(&to_latin1_lossy(&msg.content))
        ));
    }

    generate_full_html(
        &format!("Chat with {}", label),
        &format!("Exported: {}", exported_at.format("%Y-%m-%d %H:%M:%S")),
        &messages_html,
    )
}

/// Print a self-contained HTML page to PDF bytes with headless Chrome.
pub fn print_html_to_pdf(html: &str) -> AppResult<Vec<u8>> {
    // Write HTML to a temporary file (data URLs have size limits)
    let temp_html_path =
        std::env::temp_dir().join(format!("case_roleplay_{}.html", uuid::Uuid::new_v4()));
    fs::write(&temp_html_path, html)?;

    let result = print_file_to_pdf(&format!("file://{}", temp_html_path.to_string_lossy()));

    let _ = fs::remove_file(&temp_html_path);
    result
}

fn print_file_to_pdf(file_url: &str) -> AppResult<Vec<u8>> {
    let browser = Browser::new(
        LaunchOptions::default_builder()
            .headless(true)
            .build()
            .map_err(|e| AppError::export(format!("Failed to build launch options: {}", e)))?,
    )
    .map_err(|e| AppError::export(format!("Failed to launch browser: {}", e)))?;

    let tab = browser.new_tab()
        .map_err(|e| AppError::export(format!("Failed to create tab: {}", e)))?;

    tab.navigate_to(file_url)
        .map_err(|e| AppError::export(format!("Failed to navigate: {}", e)))?;

    tab.wait_until_navigated()
        .map_err(|e| AppError::export(format!("Failed to wait for navigation: {}", e)))?;

    // A4, the document paginates itself on overflow
    let pdf_options = PrintToPdfOptions {
        landscape: Some(false),
        display_header_footer: Some(false),
        print_background: Some(true),
        scale: Some(1.0),
        paper_width: Some(8.27),
        paper_height: Some(11.69),
        margin_top: Some(0.6),
        margin_bottom: Some(0.6),
        margin_left: Some(0.5),
        margin_right: Some(0.5),
        page_ranges: None,
        ignore_invalid_page_ranges: None,
        header_template: None,
        footer_template: None,
        prefer_css_page_size: Some(true),
        transfer_mode: None,
        generate_tagged_pdf: None,
        generate_document_outline: None,
    };

    tab.print_to_pdf(Some(pdf_options))
        .map_err(|e| AppError::export(format!("Failed to generate PDF: {}", e)))
}

fn markdown_to_html(markdown: &str) -> String {
    let parser = Parser::new(markdown);
    let mut html = String::new();

    for event in parser {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                html.push_str(&format!("<h{}>", level as u8));
            }
            Event::End(TagEnd::Heading(level)) => {
                html.push_str(&format!("</h{}>", level as u8));
            }
            Event::Start(Tag::Paragraph) => html.push_str("<p>"),
            Event::End(TagEnd::Paragraph) => html.push_str("</p>"),
            Event::Start(Tag::CodeBlock(_)) => html.push_str("<pre><code>"),
            Event::End(TagEnd::CodeBlock) => html.push_str("</code></pre>"),
            Event::Start(Tag::List(None)) => html.push_str("<ul>"),
            Event::End(TagEnd::List(false)) => html.push_str("</ul>"),
            Event::Start(Tag::List(Some(_))) => html.push_str("<ol>"),
            Event::End(TagEnd::List(true)) => html.push_str("</ol>"),
            Event::Start(Tag::Item) => html.push_str("<li>"),
            Event::End(TagEnd::Item) => html.push_str("</li>"),
            Event::Start(Tag::BlockQuote(_)) => html.push_str("<blockquote>"),
            Event::End(TagEnd::BlockQuote(_)) => html.push_str("</blockquote>"),
            Event::Start(Tag::Strong) => html.push_str("<strong>"),
            Event::End(TagEnd::Strong) => html.push_str("</strong>"),
            Event::Start(Tag::Emphasis) => html.push_str("<em>"),
            Event::End(TagEnd::Emphasis) => html.push_str("</em>"),
            Event::Code(text) => {
                html.push_str(&format!("<code>{}</code>", html_escape(&text)));
            }
            // Raw HTML in a message is shown as text, never interpreted
            Event::Text(text) | Event::Html(text) | Event::InlineHtml(text) => {
                html.push_str(&html_escape(&text));
            }
            Event::SoftBreak => html.push('\n'),
            Event::HardBreak => html.push_str("<br>"),
            Event::Rule => html.push_str("<hr>"),
            _ => {}
        }
    }

    html
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn generate_full_html(title: &str, subtitle: &str, content: &str) -> String {
    format!(r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>{title}</title>
    <style>
        {css}
    </style>
</head>
<body>
    <header class="title-block">
        <h1>{title}</h1>
        <p class="exported">{subtitle}</p>
    </header>
    <main>
        {content}
    </main>
</body>
</html>"##,
        title = html_escape(title),
        subtitle = html_escape(subtitle),
        content = content,
        css = PDF_CSS
    )
}

const PDF_CSS: &str = r##"
@page {
    size: A4;
    margin: 2cm 1.5cm;
}

body {
    font-family: Arial, Helvetica, sans-serif;
    font-size: 11pt;
    line-height: 1.5;
    color: #000000;
}

.title-block {
    text-align: center;
    margin-bottom: 1.5em;
}

.title-block h1 {
    font-size: 16pt;
    font-weight: 700;
    color: #0033A0;
    margin: 0 0 0.3em 0;
}

.exported {
    font-size: 10pt;
    margin: 0;
}

.message {
    margin-bottom: 1em;
    page-break-inside: auto;
}

.sender {
    font-weight: 700;
    margin: 0 0 0.2em 0;
}

.content p {
    margin: 0 0 0.5em 0;
}

pre {
    white-space: pre-wrap;
    font-size: 9.5pt;
}
"##;
