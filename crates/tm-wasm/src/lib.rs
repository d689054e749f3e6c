//! WebAssembly bindings for ThreadMan
//!
//! The userscript loads this module and calls [`start`] with its
//! `GM_getValue` / `GM_setValue` functions. From there the module hides
//! threads on the page, tracks clicks and hover, and handles the hotkeys and
//! the settings dialog.

use std::rc::Rc;

use chrono::{DateTime, Local, Utc};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlTextAreaElement, KeyboardEvent, MouseEvent};

use tm_core::{
    extract_thread, extract_threads, ConfigStore, EvaluationSummary, PageLayout, ThreadAction, Timestamp,
    VisibilityEngine,
};
use tm_settings::SettingsForm;

pub mod dom;
mod logger;
mod storage;

use dom::{DomEntry, HOVER_CLASS};
pub use storage::UserscriptStorage;

const SETTINGS_CONTAINER_ID: &str = "threadman-options-outer-container";
const SETTINGS_LINK_PARENT: &str = "#userinfo_username";

const SETTINGS_TEMPLATE: &str = r##"
  <div class="threadman-options-container">
    <div id="close-threadman-settings"><a href="#">✖️</a></div>
    <h1>ThreadMan Settings</h1>
    <div>
      <div class="options-inner">
        <h3>Blacklist</h3>
        <textarea id="blacklist" rows="15" cols="27" placeholder="Hide all threads in this list (comma-separated thread IDs)"></textarea>
      </div>
      <div class="options-inner">
        <h3>Whitelist</h3>
        <textarea id="whitelist" rows="15" cols="27" placeholder="Only show threads in this list (comma-separated thread IDs, Blacklist ignored)"></textarea>
      </div>
      <div class="options-inner">
        <h3>Thread Click Log</h3>
        <textarea id="userclicks" rows="15" cols="27"></textarea>
      </div>
    </div>
    <div><button id="threadman-save-settings">Save Settings</button></div>
  </div>
"##;

#[wasm_bindgen(start)]
pub fn wasm_init() {
    logger::init(log::LevelFilter::Info);
}

/// Switch console logging between info and debug.
#[wasm_bindgen]
pub fn set_verbose(verbose: bool) {
    let level = if verbose { log::LevelFilter::Debug } else { log::LevelFilter::Info };
    logger::init(level);
}

// =============================================================================
// Content Script
// =============================================================================

#[wasm_bindgen]
pub struct ThreadMan {
    store: ConfigStore<UserscriptStorage>,
}

#[wasm_bindgen]
impl ThreadMan {
    #[wasm_bindgen(constructor)]
    pub fn new(get_value: js_sys::Function, set_value: js_sys::Function) -> ThreadMan {
        Self {
            store: ConfigStore::new(UserscriptStorage::new(get_value, set_value)),
        }
    }

    /// Hide or show every thread entry on the page. Returns a summary object
    /// `{total, hidden, notAllowed, blocked, viewed}`.
    pub fn process_page(&self) -> Result<JsValue, JsValue> {
        let document = dom::document()?;
        let doc = self.store.load();
        let engine = VisibilityEngine::new(&doc);
        let mut decisions = Vec::new();

        for layout in [PageLayout::LatestThreads, PageLayout::ForumTable] {
            let entries = dom::query_entries(&document, layout.entry_selector())?;
            // Page times are browser wall-clock times; chrono's wasmbind
            // `Local` resolves them through `Date.getTimezoneOffset`.
            for thread in extract_threads(&entries, &Local) {
                let decision = engine.decide(&thread.record);
                dom::set_hidden(&thread.node.0, decision.hidden);
                decisions.push(decision);
            }
        }

        let summary = EvaluationSummary::from_decisions(&decisions);
        log::info!("{} of {} threads hidden", summary.hidden, summary.total);
        Ok(summary_to_js(&summary))
    }

    /// Record that the user opened the thread in `entry`.
    pub fn record_click(&self, entry: &Element) -> Result<(), JsValue> {
        let record = match extract_thread(&DomEntry(entry.clone()), &Local) {
            Ok(record) => record,
            Err(e) => {
                log::debug!("Ignoring click on unreadable entry: {}", e);
                return Ok(());
            }
        };
        self.store.mark_viewed(record.id, now()?).map_err(js_error)?;
        Ok(())
    }

    /// Handle a key press. Hotkeys act on the entry under the pointer; returns
    /// true if an action was taken.
    pub fn handle_key(&self, key: &str) -> Result<bool, JsValue> {
        if key == "Escape" {
            close_settings()?;
            return Ok(false);
        }
        let Some(action) = ThreadAction::from_key(key) else {
            return Ok(false);
        };
        let Some(target) = dom::document()?.query_selector(&format!(".{}", HOVER_CLASS))? else {
            return Ok(false);
        };

        let record = match extract_thread(&DomEntry(target.clone()), &Local) {
            Ok(record) => record,
            Err(e) => {
                log::debug!("Ignoring hotkey on unreadable entry: {}", e);
                return Ok(false);
            }
        };
        self.store.perform(action, record.id, now()?).map_err(js_error)?;
        dom::mark_entry(&target, action)?;
        Ok(true)
    }

    /// Current settings as `{blocked, allowed, viewed}` text.
    pub fn settings_form(&self) -> Result<JsValue, JsValue> {
        let form = SettingsForm::load(&self.store).map_err(js_error)?;
        let result = js_sys::Object::new();
        let _ = js_sys::Reflect::set(&result, &"blocked".into(), &JsValue::from_str(&form.blocked));
        let _ = js_sys::Reflect::set(&result, &"allowed".into(), &JsValue::from_str(&form.allowed));
        let _ = js_sys::Reflect::set(&result, &"viewed".into(), &JsValue::from_str(&form.viewed));
        Ok(result.into())
    }

    /// Replace the stored settings with the edited text.
    pub fn save_settings(&self, blocked: &str, allowed: &str, viewed: &str) -> Result<(), JsValue> {
        let form = SettingsForm {
            blocked: blocked.to_string(),
            allowed: allowed.to_string(),
            viewed: viewed.to_string(),
        };
        form.save(&self.store).map_err(js_error)?;
        Ok(())
    }
}

// =============================================================================
// Page Wiring
// =============================================================================

/// Process the page and wire up clicks, hover, hotkeys and the settings link.
#[wasm_bindgen]
pub fn start(get_value: js_sys::Function, set_value: js_sys::Function) -> Result<JsValue, JsValue> {
    let app = Rc::new(ThreadMan::new(get_value, set_value));
    let document = dom::document()?;

    for layout in [PageLayout::LatestThreads, PageLayout::ForumTable] {
        for entry in dom::query_entries(&document, layout.entry_selector())? {
            attach_entry_listeners(&app, entry.0)?;
        }
    }

    let summary = app.process_page()?;

    if let Some(body) = document.body() {
        let key_app = Rc::clone(&app);
        let on_key = Closure::<dyn FnMut(KeyboardEvent)>::new(move |event: KeyboardEvent| {
            if typing_in_field(&event) {
                return;
            }
            if let Err(e) = key_app.handle_key(&event.key()) {
                log::error!("Hotkey failed: {:?}", e);
            }
        });
        body.add_event_listener_with_callback("keydown", on_key.as_ref().unchecked_ref())?;
        on_key.forget();
    }

    add_settings_link(&app)?;
    Ok(summary)
}

fn attach_entry_listeners(app: &Rc<ThreadMan>, entry: Element) -> Result<(), JsValue> {
    let click_app = Rc::clone(app);
    let click_entry = entry.clone();
    let on_click = Closure::<dyn FnMut(MouseEvent)>::new(move |_event: MouseEvent| {
        if let Err(e) = click_app.record_click(&click_entry) {
            log::error!("Recording click failed: {:?}", e);
        }
    });
    entry.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())?;
    on_click.forget();

    let enter_entry = entry.clone();
    let on_enter = Closure::<dyn FnMut(MouseEvent)>::new(move |_event: MouseEvent| {
        let _ = enter_entry.class_list().add_1(HOVER_CLASS);
    });
    entry.add_event_listener_with_callback("mouseenter", on_enter.as_ref().unchecked_ref())?;
    on_enter.forget();

    let leave_entry = entry.clone();
    let on_leave = Closure::<dyn FnMut(MouseEvent)>::new(move |_event: MouseEvent| {
        let _ = leave_entry.class_list().remove_1(HOVER_CLASS);
    });
    entry.add_event_listener_with_callback("mouseleave", on_leave.as_ref().unchecked_ref())?;
    on_leave.forget();

    Ok(())
}

fn typing_in_field(event: &KeyboardEvent) -> bool {
    event
        .target()
        .and_then(|target| target.dyn_into::<Element>().ok())
        .is_some_and(|element| matches!(element.tag_name().as_str(), "TEXTAREA" | "INPUT"))
}

// =============================================================================
// Settings Dialog
// =============================================================================

fn add_settings_link(app: &Rc<ThreadMan>) -> Result<(), JsValue> {
    let document = dom::document()?;
    let Some(container) = document.query_selector(SETTINGS_LINK_PARENT)? else {
        return Ok(());
    };

    let item = document.create_element("li")?;
    let link = document.create_element("a")?;
    link.set_attribute("href", "#")?;
    link.set_text_content(Some("ThreadMan Settings"));

    let open_app = Rc::clone(app);
    let on_open = Closure::<dyn FnMut(MouseEvent)>::new(move |event: MouseEvent| {
        event.prevent_default();
        if let Err(e) = open_settings(&open_app) {
            log::error!("Opening settings failed: {:?}", e);
        }
    });
    link.add_event_listener_with_callback("click", on_open.as_ref().unchecked_ref())?;
    on_open.forget();

    item.append_child(&link)?;
    container.append_child(&item)?;
    Ok(())
}

fn open_settings(app: &Rc<ThreadMan>) -> Result<(), JsValue> {
    let document = dom::document()?;
    if document.get_element_by_id(SETTINGS_CONTAINER_ID).is_some() {
        return Ok(());
    }

    let form = SettingsForm::load(&app.store).map_err(js_error)?;
    let dialog = document.create_element("div")?;
    dialog.set_id(SETTINGS_CONTAINER_ID);
    dialog.set_inner_html(SETTINGS_TEMPLATE);

    textarea(&dialog, "#blacklist")?.set_value(&form.blocked);
    textarea(&dialog, "#whitelist")?.set_value(&form.allowed);
    textarea(&dialog, "#userclicks")?.set_value(&form.viewed);

    let save_app = Rc::clone(app);
    let save_dialog = dialog.clone();
    let on_save = Closure::<dyn FnMut(MouseEvent)>::new(move |_event: MouseEvent| {
        if let Err(e) = save_settings_dialog(&save_app, &save_dialog) {
            log::error!("Saving settings failed: {:?}", e);
        }
    });
    if let Some(button) = dialog.query_selector("#threadman-save-settings")? {
        button.add_event_listener_with_callback("click", on_save.as_ref().unchecked_ref())?;
    }
    on_save.forget();

    let on_close = Closure::<dyn FnMut(MouseEvent)>::new(move |event: MouseEvent| {
        event.prevent_default();
        let _ = close_settings();
    });
    if let Some(close) = dialog.query_selector("#close-threadman-settings a")? {
        close.add_event_listener_with_callback("click", on_close.as_ref().unchecked_ref())?;
    }
    on_close.forget();

    if let Some(body) = document.body() {
        body.append_child(&dialog)?;
    }
    Ok(())
}

fn save_settings_dialog(app: &ThreadMan, dialog: &Element) -> Result<(), JsValue> {
    let blocked = textarea(dialog, "#blacklist")?.value();
    let allowed = textarea(dialog, "#whitelist")?.value();
    let viewed = textarea(dialog, "#userclicks")?.value();
    app.save_settings(&blocked, &allowed, &viewed)?;

    close_settings()?;
    web_sys::window()
        .ok_or_else(|| JsValue::from_str("No window"))?
        .location()
        .reload()
}

fn close_settings() -> Result<(), JsValue> {
    if let Some(dialog) = dom::document()?.get_element_by_id(SETTINGS_CONTAINER_ID) {
        dialog.remove();
    }
    Ok(())
}

fn textarea(dialog: &Element, selector: &str) -> Result<HtmlTextAreaElement, JsValue> {
    dialog
        .query_selector(selector)?
        .and_then(|element| element.dyn_into::<HtmlTextAreaElement>().ok())
        .ok_or_else(|| JsValue::from_str(&format!("Missing settings field {}", selector)))
}

// =============================================================================
// Helpers
// =============================================================================

fn now() -> Result<Timestamp, JsValue> {
    DateTime::<Utc>::from_timestamp_millis(js_sys::Date::now() as i64).ok_or_else(|| JsValue::from_str("Clock out of range"))
}

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn summary_to_js(summary: &EvaluationSummary) -> JsValue {
    let result = js_sys::Object::new();
    let _ = js_sys::Reflect::set(&result, &"total".into(), &JsValue::from(summary.total as u32));
    let _ = js_sys::Reflect::set(&result, &"hidden".into(), &JsValue::from(summary.hidden as u32));
    let _ = js_sys::Reflect::set(&result, &"notAllowed".into(), &JsValue::from(summary.not_allowed as u32));
    let _ = js_sys::Reflect::set(&result, &"blocked".into(), &JsValue::from(summary.blocked as u32));
    let _ = js_sys::Reflect::set(&result, &"viewed".into(), &JsValue::from(summary.viewed as u32));
    result.into()
}
