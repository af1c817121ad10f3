//! End-to-end checks against a real headless Chrome. Ignored by default;
//! run with `cargo test -- --ignored` on a machine with Chrome installed.

use std::sync::Arc;

use lodestar::browser::BrowserSession;
use lodestar::dom::CdpDocument;
use lodestar::locate::{find_by_text, smart_click, smart_fill, ResolutionOptions};

const FORM_PAGE: &str = "data:text/html,\
<html><head><title>Form</title></head><body>\
<h1>Sign in</h1>\
<input type='email' placeholder='Enter your email address'>\
<button onclick=\"this.textContent='Clicked'\">Login Button</button>\
</body></html>";

async fn open(url: &str) -> (BrowserSession, Arc<CdpDocument>) {
    let session = BrowserSession::launch(true).await.expect("launch Chrome");
    let page = session.new_page(url).await.expect("open page");
    tokio::time::sleep(std::time::Duration::from_millis(300)).await;
    (session, Arc::new(CdpDocument::new(page)))
}

#[tokio::test]
#[ignore = "requires a local Chrome"]
async fn test_resolves_button_on_live_page() {
    let (session, doc) = open(FORM_PAGE).await;

    let result = find_by_text(doc.as_ref(), "Login Button", &ResolutionOptions::default())
        .await
        .expect("button should resolve");
    assert_eq!(result.strategy, "button-text");
    assert_eq!(result.confidence, 1.0);

    session.close().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a local Chrome"]
async fn test_click_and_fill_on_live_page() {
    let (session, doc) = open(FORM_PAGE).await;
    let options = ResolutionOptions::default();

    smart_click(doc.as_ref(), "Login Button", &options)
        .await
        .expect("click should succeed");
    doc.clear_handles();

    let clicked = find_by_text(doc.as_ref(), "Clicked", &options).await;
    assert!(clicked.is_some(), "click handler should have fired");
    doc.clear_handles();

    smart_fill(doc.as_ref(), "email address", "kim@example.test", &options)
        .await
        .expect("fill should succeed");

    session.close().await.unwrap();
}
