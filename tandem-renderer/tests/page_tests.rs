use pretty_assertions::assert_eq;
use tandem_renderer::{ComponentDef, PageOptions, Registry, render_page, render_route_pages};

fn app() -> Registry {
    Registry::new()
        .with(ComponentDef::new("App", "<main>{page}</main>").route("page", &["Home", "About"], "About"))
        .with(ComponentDef::new("Home", "<h1>Home</h1>"))
        .with(ComponentDef::new("About", "<h1>About</h1>"))
}

#[test]
fn page_wraps_the_render_in_a_document() {
    let registry = app();
    let root = registry.instantiate("App").unwrap();
    let options = PageOptions {
        title: "A & B".into(),
        ..PageOptions::default()
    };
    let html = render_page(&registry, &root, &options).unwrap();
    assert_eq!(
        html,
        concat!(
            "<!DOCTYPE html>\n",
            "<html lang=\"en\">\n",
            "<head>\n<meta charset=\"utf-8\">\n",
            "<title>A &amp; B</title>\n",
            "<link rel=\"stylesheet\" href=\"styles.css\">\n",
            "</head>\n<body>\n",
            "<div id=\"app\"><main><!--route0s--><h1>About</h1><!--route0--></main></div>\n",
            "</body>\n</html>\n",
        )
    );
}

#[test]
fn stylesheet_link_is_optional() {
    let registry = app();
    let root = registry.instantiate("App").unwrap();
    let options = PageOptions {
        stylesheet: None,
        lang: "de".into(),
        ..PageOptions::default()
    };
    let html = render_page(&registry, &root, &options).unwrap();
    assert!(!html.contains("<link"));
    assert!(html.contains("<html lang=\"de\">"));
}

#[test]
fn one_page_per_route_and_the_router_is_restored() {
    let registry = app();
    let root = registry.instantiate("App").unwrap();
    let pages = render_route_pages(&registry, &root, &PageOptions::default()).unwrap();

    let names: Vec<&str> = pages.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, vec!["Home", "About"]);
    assert!(pages[0].1.contains("<h1>Home</h1>"));
    assert!(pages[1].1.contains("<h1>About</h1>"));
    assert_eq!(root.router("page").unwrap().current().name(), "About");
}

#[test]
fn components_without_routers_have_no_route_pages() {
    let registry = Registry::new().with(ComponentDef::new("Plain", "<p>hi</p>"));
    let root = registry.instantiate("Plain").unwrap();
    assert!(render_route_pages(&registry, &root, &PageOptions::default()).unwrap().is_empty());
}
