//! Minimal HTML rendering helpers.
//!
//! Pages are small enough to be built with `format!`. Every interpolated
//! value goes through [`escape_html`] or, inside `<script>`, [`script_json`].

use crate::backend::i18n::Locale;

/// Escape text for use in HTML content and attribute values
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// JSON literal safe to embed in an inline script
pub fn script_json(value: &str) -> String {
    serde_json::Value::from(value).to_string().replace("</", "<\\/")
}

/// Wrap page content in the site layout
pub fn layout(locale: Locale, site_name: &str, title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="{lang}">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} | {site_name}</title>
<link rel="stylesheet" href="/static/style.css">
</head>
<body>
{body}
</body>
</html>
"#,
        lang = locale.as_str(),
        title = escape_html(title),
        site_name = escape_html(site_name),
        body = body,
    )
}
