//! DOM access for thread entries

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement};

use tm_core::{EntryNode, ThreadAction};

/// Class added to the entry under the pointer; hotkeys act on it.
pub const HOVER_CLASS: &str = "threadman-thread-target";
/// Row striping classes dropped from entries once they are marked.
const ROW_CLASSES: [&str; 2] = ["rowa", "rowb"];
/// Delay before a faded-out entry is removed, in milliseconds.
pub const REMOVE_DELAY_MS: i32 = 700;

/// A thread entry element.
#[derive(Debug, Clone)]
pub struct DomEntry(pub Element);

impl EntryNode for DomEntry {
    fn tag_name(&self) -> String {
        self.0.tag_name().to_ascii_lowercase()
    }

    fn child_elements(&self) -> Vec<Self> {
        let children = self.0.children();
        (0..children.length())
            .filter_map(|i| children.item(i))
            .map(DomEntry)
            .collect()
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.0.get_attribute(name)
    }

    fn text(&self) -> String {
        self.0.text_content().unwrap_or_default()
    }

    fn select_first(&self, selector: &str) -> Option<Self> {
        self.0.query_selector(selector).ok().flatten().map(DomEntry)
    }
}

pub fn document() -> Result<Document, JsValue> {
    web_sys::window()
        .and_then(|window| window.document())
        .ok_or_else(|| JsValue::from_str("No document"))
}

/// All elements matching `selector`, in document order.
pub fn query_entries(document: &Document, selector: &str) -> Result<Vec<DomEntry>, JsValue> {
    let nodes = document.query_selector_all(selector)?;
    Ok((0..nodes.length())
        .filter_map(|i| nodes.item(i))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .map(DomEntry)
        .collect())
}

pub fn set_hidden(element: &Element, hidden: bool) {
    if let Some(html) = element.dyn_ref::<HtmlElement>() {
        html.set_hidden(hidden);
    }
}

// =============================================================================
// Action Feedback
// =============================================================================

/// Visual feedback for an entry the user just acted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryStyle {
    pub background: &'static str,
    pub transition: &'static str,
    pub fade_out: bool,
}

pub fn entry_style(action: ThreadAction) -> EntryStyle {
    match action {
        ThreadAction::Block => EntryStyle {
            background: "#333",
            transition: "opacity 0.75s",
            fade_out: true,
        },
        ThreadAction::Allow => EntryStyle {
            background: "whitesmoke",
            transition: "opacity 0.75s",
            fade_out: false,
        },
        ThreadAction::MarkViewed => EntryStyle {
            background: "#ACE1AF",
            transition: "opacity 1.2s",
            fade_out: true,
        },
    }
}

/// Restyle an entry after `action`, removing it after a short fade if the
/// action takes it off the page.
pub fn mark_entry(element: &Element, action: ThreadAction) -> Result<(), JsValue> {
    let style = entry_style(action);
    for class in ROW_CLASSES {
        element.class_list().remove_1(class)?;
    }

    if let Some(html) = element.dyn_ref::<HtmlElement>() {
        let css = html.style();
        css.set_property("transition", style.transition)?;
        if style.fade_out {
            css.set_property("opacity", "0")?;
        }
        css.set_property("border", "solid gainsboro 1px")?;
        css.set_property("background-color", style.background)?;
        css.set_property("border-radius", "2px")?;
    }

    if action.removes_entry() {
        schedule_removal(element.clone())?;
    }
    Ok(())
}

fn schedule_removal(element: Element) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("No window"))?;
    let callback = Closure::once_into_js(move || element.remove());
    window.set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref(), REMOVE_DELAY_MS)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_style() {
        assert!(entry_style(ThreadAction::Block).fade_out);
        assert!(entry_style(ThreadAction::MarkViewed).fade_out);
        assert!(!entry_style(ThreadAction::Allow).fade_out);
        assert_eq!(entry_style(ThreadAction::MarkViewed).transition, "opacity 1.2s");
        assert_eq!(entry_style(ThreadAction::Block).background, "#333");
    }
}
