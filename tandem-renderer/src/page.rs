//! Whole-document output around a server render.

use tandem_dom::html::escape_attr;
use tandem_dom::html::escape_text;

use crate::component::Instance;
use crate::error::RenderError;
use crate::registry::Registry;
use crate::ssr::render_instance;

#[derive(Debug, Clone, PartialEq)]
pub struct PageOptions {
    pub title: String,
    pub lang: String,
    /// Href of the stylesheet to link, if any.
    pub stylesheet: Option<String>,
    /// Id of the element the application is rendered into.
    pub mount_id: String,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            title: String::from("Tandem App"),
            lang: String::from("en"),
            stylesheet: Some(String::from("styles.css")),
            mount_id: String::from("app"),
        }
    }
}

/// Render `root` inside a complete HTML document.
pub fn render_page(
    registry: &Registry,
    root: &Instance,
    options: &PageOptions,
) -> Result<String, RenderError> {
    let body = render_instance(registry, root)?;
    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n");
    out.push_str(&format!("<html lang=\"{}\">\n", escape_attr(&options.lang)));
    out.push_str("<head>\n<meta charset=\"utf-8\">\n");
    out.push_str(&format!("<title>{}</title>\n", escape_text(&options.title)));
    if let Some(href) = &options.stylesheet {
        out.push_str(&format!(
            "<link rel=\"stylesheet\" href=\"{}\">\n",
            escape_attr(href)
        ));
    }
    out.push_str("</head>\n<body>\n");
    out.push_str(&format!(
        "<div id=\"{}\">{}</div>\n",
        escape_attr(&options.mount_id),
        body.html
    ));
    out.push_str("</body>\n</html>\n");
    Ok(out)
}

/// One page per option of every router on `root`, each rendered with that option
/// selected. The router is put back on its original page afterwards.
pub fn render_route_pages(
    registry: &Registry,
    root: &Instance,
    options: &PageOptions,
) -> Result<Vec<(String, String)>, RenderError> {
    let mut pages = Vec::new();
    let routers: Vec<(String, Vec<String>, String)> = root
        .routers()
        .map(|(field, r)| {
            (
                field.to_string(),
                r.options().iter().map(|o| o.name().to_string()).collect(),
                r.current().name().to_string(),
            )
        })
        .collect();
    for (field, pages_of_field, original) in routers {
        for page in pages_of_field {
            root.navigate(&field, &page)?;
            let html = render_page(registry, root, options);
            tracing::debug!(%field, %page, "pre-rendered route");
            match html {
                Ok(html) => pages.push((page, html)),
                Err(err) => {
                    root.navigate(&field, &original)?;
                    return Err(err);
                }
            }
        }
        root.navigate(&field, &original)?;
    }
    Ok(pages)
}
