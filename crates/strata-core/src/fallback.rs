//! Fallback artifact
//!
//! Used when generation fails. Deterministic for a given task, brief and
//! image, and always a complete, non-empty document once composed.

use strata_artifact::Document;
use strata_constitutional::compose::escape_text;

const FALLBACK_STYLE: &str = "body {
    font-family: Arial, sans-serif;
    max-width: 800px;
    margin: 50px auto;
    padding: 20px;
    background: #f5f5f5;
}
.container {
    background: white;
    padding: 30px;
    border-radius: 8px;
    box-shadow: 0 2px 10px rgba(0,0,0,0.1);
}
h1 { color: #333; }
img { max-width: 100%; height: auto; margin-top: 20px; }";

const FALLBACK_SCRIPT: &str = "console.log('Fallback mode - generation failed');";

/// Placeholder document showing the task and brief
#[must_use]
pub fn fallback_document(task: &str, brief: &str, image: Option<&str>) -> Document {
    let title = if task.trim().is_empty() {
        "Untitled"
    } else {
        task.trim()
    };

    let mut body = String::from("<div class=\"container\" id=\"fallback\">\n");
    body.push_str(&format!("    <h1>{}</h1>\n", escape_text(title)));
    body.push_str(&format!("    <p>{}</p>\n", escape_text(brief.trim())));
    if let Some(src) = image.filter(|s| !s.trim().is_empty()) {
        body.push_str(&format!(
            "    <img src=\"{}\" alt=\"Placeholder\">\n",
            escape_text(src.trim())
        ));
    }
    body.push_str("</div>");

    Document::new()
        .with_title(title)
        .with_style(FALLBACK_STYLE)
        .with_body(body)
        .with_script(FALLBACK_SCRIPT)
}
