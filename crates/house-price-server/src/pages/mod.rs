//! HTML rendering for the form pages and the result page.

use std::fmt::Write;

use house_price::{Estimate, FieldKind, FieldSpec, FormFields, Page};

/// Hidden input naming the server-side session.
pub const SESSION_FIELD: &str = "session_id";

const STYLE: &str = "body{font-family:sans-serif;max-width:32rem;margin:2rem auto;}\
label{display:block;margin-top:.75rem;}input,select{width:100%;padding:.3rem;}\
button{margin-top:1rem;padding:.4rem 1rem;}";

/// Form action for the page that follows `page`.
pub fn action_for(page: Page) -> &'static str {
    match page.next() {
        Some(Page::Condition) => "/page2",
        Some(Page::Location) => "/page3",
        Some(Page::Basics) | None => "/predict",
    }
}

/// Render one step of the form.
///
/// `carried` holds the values from earlier pages; each is echoed back as a
/// hidden input so the browser can resubmit it with this page.
pub fn render_page(page: Page, carried: &FormFields, session_id: Option<&str>) -> String {
    let mut body = String::new();
    let _ = writeln!(
        body,
        "<h2>Step {} of {}: {}</h2>",
        page.number(),
        Page::ALL.len(),
        page.title()
    );
    let _ = writeln!(body, "<form method=\"post\" action=\"{}\">", action_for(page));

    if let Some(id) = session_id {
        push_hidden(&mut body, SESSION_FIELD, id);
    }
    for field in page.carried() {
        if let Some(value) = carried.get(field.key) {
            push_hidden(&mut body, field.key, value);
        }
    }

    for field in page.fields() {
        push_input(&mut body, field);
    }

    let button = if page.next().is_some() { "Next" } else { "Estimate price" };
    let _ = writeln!(body, "<button type=\"submit\">{button}</button>");
    body.push_str("</form>\n");

    document("House price estimate", &body)
}

/// Render the estimate.
pub fn render_result(estimate: &Estimate) -> String {
    let body = format!(
        "<h2>Estimated price</h2>\n<p class=\"price\">{}</p>\n<p><a href=\"/\">Start over</a></p>\n",
        escape_html(&estimate.formatted)
    );
    document("House price estimate", &body)
}

fn push_hidden(out: &mut String, name: &str, value: &str) {
    let _ = writeln!(
        out,
        "<input type=\"hidden\" name=\"{}\" value=\"{}\">",
        escape_html(name),
        escape_html(value)
    );
}

fn push_input(out: &mut String, field: &FieldSpec) {
    let _ = writeln!(out, "<label for=\"{0}\">{1}</label>", field.key, field.label);

    match (field.kind, field.choices()) {
        (FieldKind::Category, Some(choices)) => {
            let _ = writeln!(out, "<select id=\"{0}\" name=\"{0}\" required>", field.key);
            for choice in choices {
                let _ = writeln!(out, "<option value=\"{0}\">{0}</option>", escape_html(choice));
            }
            out.push_str("</select>\n");
        }
        (FieldKind::Category, None) => {
            let _ = writeln!(
                out,
                "<input type=\"text\" id=\"{0}\" name=\"{0}\" required>",
                field.key
            );
        }
        (FieldKind::Int, _) => {
            let _ = writeln!(
                out,
                "<input type=\"number\" step=\"1\" id=\"{0}\" name=\"{0}\" required>",
                field.key
            );
        }
        (FieldKind::Float, _) => {
            let _ = writeln!(
                out,
                "<input type=\"number\" step=\"any\" id=\"{0}\" name=\"{0}\" required>",
                field.key
            );
        }
    }
}

fn document(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n{body}</body>\n</html>\n",
        escape_html(title)
    )
}

/// Escape text for use in element content and quoted attributes.
pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
