//! Tests for the markdown content shipped with the web crate.
//!
//! These run against the real `crates/web/content/` directory, so they
//! catch frontmatter and shortcode regressions in the committed content
//! without needing a server.

use std::path::Path;

use idea_hub_web::content::ContentStore;

fn store() -> ContentStore {
    let content_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../web/content");
    ContentStore::load(&content_dir).expect("Failed to load content directory")
}

#[test]
fn test_all_static_pages_present() {
    let store = store();

    for slug in ["how-it-works", "terms", "privacy"] {
        let page = store
            .get_page(slug)
            .unwrap_or_else(|| panic!("missing page: {slug}"));
        assert!(!page.meta.title.is_empty(), "{slug} has no title");
        assert!(
            page.content_html.contains("<h") || page.content_html.contains("<p"),
            "{slug} rendered to empty HTML"
        );
    }
}

#[test]
fn test_nda_substitutes_the_idea_title() {
    let html = store().nda_html("Solar Backpack");

    assert!(html.contains("Solar Backpack"));
    assert!(
        !html.contains("{{idea_title}}"),
        "NDA shortcode left unsubstituted"
    );
}

#[test]
fn test_unknown_slug_is_absent() {
    assert!(store().get_page("admin").is_none());
}
