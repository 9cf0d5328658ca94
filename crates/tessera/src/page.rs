//! The front end's index page.

use tessera_protocol::PageModel;

/// Renders the index page for a [`PageModel`].
///
/// User-controlled text (the username) is HTML-escaped.
pub fn render_index(page: &PageModel) -> String {
    let title = escape(&page.title);
    let greeting = match &page.username {
        Some(name) => format!("Welcome back, {}.", escape(name)),
        None => "You are not logged in.".to_string(),
    };

    format!(
        "<!DOCTYPE html>\n\
         <html>\n\
         <head><title>{title}</title></head>\n\
         <body>\n\
         <h1>{title}</h1>\n\
         <p>{greeting}</p>\n\
         <p>Views: <span id=\"views\">{views}</span></p>\n\
         <p>API views: <span id=\"api-views\">{api_views}</span></p>\n\
         </body>\n\
         </html>\n",
        views = page.views,
        api_views = page.api_views,
    )
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
