//! Browser tests for DOM extraction. Run with `wasm-pack test --headless --chrome`.

#![cfg(target_arch = "wasm32")]

use chrono::{Local, TimeZone};
use wasm_bindgen_test::*;

use tm_core::{extract_thread, PageLayout};
use tm_wasm::dom::{self, DomEntry};

wasm_bindgen_test_configure!(run_in_browser);

fn mount(html: &str) -> web_sys::Element {
    let document = dom::document().expect("document");
    let container = document.create_element("div").expect("div");
    container.set_inner_html(html);
    document.body().expect("body").append_child(&container).expect("append");
    container
}

#[wasm_bindgen_test]
fn reads_latest_threads_entry() {
    mount(
        r#"<div class="latest_threads"><span><span>General</span><a href="/forum/thread/4242?postid=1">Weekly thread</a><span> by </span><span class="time" title="Jan 05 2024, 14:32">2 hours ago</span></span></div>"#,
    );
    let document = dom::document().expect("document");
    let entries = dom::query_entries(&document, PageLayout::LatestThreads.entry_selector()).expect("query");
    assert_eq!(entries.len(), 1);

    let record = extract_thread(&entries[0], &Local).expect("parses");
    assert_eq!(record.id.as_str(), "4242");
    assert_eq!(record.title, "Weekly thread");
    let local = Local.with_ymd_and_hms(2024, 1, 5, 14, 32, 0).unwrap();
    assert_eq!(record.last_activity, local);
}

#[wasm_bindgen_test]
fn reads_forum_row() {
    let container = mount(
        r#"<table class="forum_list"><tbody><tr class="rowb"><td><img></td><td><strong><a href="/forum/thread/31">Site news</a></strong></td><td><span class="time" title="2024-03-01 08:00:00">Mar 1</span></td></tr></tbody></table>"#,
    );
    let row = container.query_selector("tr.rowb").expect("query").expect("row");

    let record = extract_thread(&DomEntry(row), &Local).expect("parses");
    assert_eq!(record.id.as_str(), "31");
    assert_eq!(record.title, "Site news");
}

#[wasm_bindgen_test]
fn hides_and_shows_entries() {
    let container = mount("<span>entry</span>");
    let entry = container.first_element_child().expect("child");

    dom::set_hidden(&entry, true);
    assert!(entry.has_attribute("hidden"));
    dom::set_hidden(&entry, false);
    assert!(!entry.has_attribute("hidden"));
}
