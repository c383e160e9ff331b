//! HTML rendering of the gallery view

use crate::gallery::ViewState;

/// Heading above the image list
pub const GALLERY_HEADING: &str = "S3 Image";
/// Text shown while a fetch is in flight
pub const LOADING_TEXT: &str = "Loading images...";
/// Text shown when the bucket holds no images
pub const EMPTY_TEXT: &str = "No images found.";

const IMAGE_MAX_WIDTH: &str = "300px";

/// Renders the content area for `state`
///
/// `Ready` renders one `<img>` per URL in order, labelled `Image {index}`.
/// Every other state renders a single fixed message.
#[must_use]
pub fn render_view(state: &ViewState) -> String {
    match state {
        ViewState::Loading => format!("<div>{LOADING_TEXT}</div>"),
        ViewState::Error(message) => format!("<div>Error: {}</div>", escape_html(message)),
        ViewState::Empty => format!("<div>{EMPTY_TEXT}</div>"),
        ViewState::Ready(urls) => {
            let mut html = format!("<div><h2>{GALLERY_HEADING}</h2><ul>");
            for (index, url) in urls.iter().enumerate() {
                html.push_str(&format!(
                    r#"<li><img src="{}" alt="Image {index}" style="max-width: {IMAGE_MAX_WIDTH}"></li>"#,
                    escape_html(url.as_str())
                ));
            }
            html.push_str("</ul></div>");
            html
        }
    }
}

/// Renders a complete HTML document around [`render_view`]
#[must_use]
pub fn render_page(state: &ViewState) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{GALLERY_HEADING}</title>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        render_view(state)
    )
}

fn escape_html(raw: &str) -> String {
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
