#![forbid(unsafe_code)]

//! `wasm-bindgen` exports for [`DocViewWeb`].
//!
//! Wraps a [`ViewerSession`] with a JS renderer adapter, a DOM TOC panel,
//! the overlay thumb element, and `fetch`-based classification. Only
//! compiled on `wasm32` targets.

use std::cell::RefCell;
use std::rc::Rc;

use docview_core::annotation::{ClassifyRequest, LinkSpan, RequestId};
use docview_core::caps::PointerKind;
use docview_core::error::ClassifyError;
use docview_core::indicator::ScrollbarMetrics;
use docview_core::overlap::SourceDialect;
use docview_core::range::LineRange;
use docview_core::renderer::{Marker, Renderer, TocPanel};
use docview_core::session::ViewerSession;
use docview_core::toc::TocSlot;
use js_sys::{Array, Function, JSON, Object, Reflect};
use tracing::{debug, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{JsFuture, spawn_local};
use web_sys::{Element, HtmlElement, Request, RequestInit, Response};

use crate::logging;
use crate::viewer_core::{
    ThumbStyle, ViewerOptions, bookmark_json, classify_outcome, duration_from_ms,
    indicator_json, ms_from_duration, parse_toc_entries,
};

// ---------------------------------------------------------------------------
// JS helpers
// ---------------------------------------------------------------------------

fn console_call(method: &str, msg: &str) {
    let global = js_sys::global();
    let Ok(console) = Reflect::get(&global, &"console".into()) else {
        return;
    };
    let Ok(func) = Reflect::get(&console, &JsValue::from_str(method)) else {
        return;
    };
    let Ok(func) = func.dyn_into::<Function>() else {
        return;
    };
    let _ = func.call1(&console, &JsValue::from_str(msg));
}

fn console_error(msg: &str) {
    console_call("error", msg);
}

fn console_log(msg: &str) {
    console_call("log", msg);
}

fn install_panic_hook() {
    use std::sync::Once;

    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        std::panic::set_hook(Box::new(|info| {
            let msg = if let Some(loc) = info.location() {
                format!(
                    "panic at {}:{}:{}: {info}",
                    loc.file(),
                    loc.line(),
                    loc.column()
                )
            } else {
                format!("panic: {info}")
            };
            console_error(&msg);
        }));
    });
}

fn set_js(obj: &Object, key: &str, value: JsValue) {
    let _ = Reflect::set(obj, &JsValue::from_str(key), &value);
}

fn set_style(el: &HtmlElement, prop: &str, value: &str) {
    // Set via reflection to avoid the CssStyleDeclaration feature.
    let Ok(style) = Reflect::get(el.as_ref(), &JsValue::from_str("style")) else {
        return;
    };
    let _ = Reflect::set(&style, &JsValue::from_str(prop), &JsValue::from_str(value));
}

fn stringify(value: &JsValue) -> Result<String, JsValue> {
    if value.is_null() || value.is_undefined() {
        return Ok(String::new());
    }
    JSON::stringify(value)?
        .as_string()
        .ok_or_else(|| JsValue::from_str("value is not JSON-serializable"))
}

fn parse_json(json: &str) -> JsValue {
    JSON::parse(json).unwrap_or(JsValue::NULL)
}

fn to_js_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

fn probe_pointer() -> PointerKind {
    let global = js_sys::global();
    let has_touch_events = Reflect::has(&global, &JsValue::from_str("ontouchstart")).unwrap_or(false);
    let touch_points = Reflect::get(&global, &JsValue::from_str("navigator"))
        .and_then(|nav| Reflect::get(&nav, &JsValue::from_str("maxTouchPoints")))
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(0.0);
    if has_touch_events || touch_points > 0.0 {
        PointerKind::Touch
    } else {
        PointerKind::Fine
    }
}

// ---------------------------------------------------------------------------
// Host adapters
// ---------------------------------------------------------------------------

/// [`Renderer`] over a JS object exposing the renderer contract as methods.
struct JsRenderer {
    obj: JsValue,
}

impl JsRenderer {
    fn method(&self, name: &str) -> Option<Function> {
        Reflect::get(&self.obj, &JsValue::from_str(name))
            .ok()?
            .dyn_into::<Function>()
            .ok()
    }

    fn call(&self, name: &str, args: &[JsValue]) -> Option<JsValue> {
        let Some(func) = self.method(name) else {
            warn!(target: "docview_web::renderer", method = name, "renderer method missing");
            return None;
        };
        let result = match args {
            [] => func.call0(&self.obj),
            [a] => func.call1(&self.obj, a),
            [a, b] => func.call2(&self.obj, a, b),
            _ => func.apply(&self.obj, &args.iter().collect::<Array>()),
        };
        match result {
            Ok(v) => Some(v),
            Err(err) => {
                warn!(
                    target: "docview_web::renderer",
                    method = name,
                    error = ?err,
                    "renderer method threw"
                );
                None
            }
        }
    }

    fn call_line(&self, name: &str) -> Option<usize> {
        let n = self.call(name, &[])?.as_f64()?;
        (n.is_finite() && n >= 0.0).then_some(n as usize)
    }
}

impl Renderer for JsRenderer {
    fn visible_top_line(&self) -> usize {
        self.call_line("visibleTopLine").unwrap_or(1)
    }

    fn visible_bottom_line(&self) -> usize {
        self.call_line("visibleBottomLine").unwrap_or(0)
    }

    fn last_line(&self) -> usize {
        self.call_line("lastLine").unwrap_or(0)
    }

    fn first_line(&self) -> usize {
        if self.method("firstLine").is_some() {
            self.call_line("firstLine").unwrap_or(1)
        } else {
            1
        }
    }

    fn text_for_line_range(&self, range: LineRange) -> String {
        self.call(
            "textForLineRange",
            &[
                JsValue::from(to_js_u32(range.first())),
                JsValue::from(to_js_u32(range.last())),
            ],
        )
        .and_then(|v| v.as_string())
        .unwrap_or_default()
    }

    fn place_marker(&mut self, marker: &Marker) {
        let obj = Object::new();
        set_js(&obj, "line", JsValue::from(to_js_u32(marker.line)));
        set_js(&obj, "start", JsValue::from(to_js_u32(marker.columns.start)));
        set_js(&obj, "end", JsValue::from(to_js_u32(marker.columns.end)));
        set_js(&obj, "className", JsValue::from_str(marker.style_class));
        if let Some(markup) = &marker.replacement {
            set_js(&obj, "replacement", JsValue::from_str(markup));
        }
        if let Some(target) = marker.target_line {
            set_js(&obj, "targetLine", JsValue::from(to_js_u32(target)));
        }
        self.call("placeMarker", &[obj.into()]);
    }

    fn clear_markers(&mut self) {
        self.call("clearMarkers", &[]);
    }

    fn scroll_to_line(&mut self, line: usize) {
        self.call("scrollToLine", &[JsValue::from(to_js_u32(line))]);
    }

    fn line_height(&self) -> f64 {
        self.call("lineHeight", &[])
            .and_then(|v| v.as_f64())
            .unwrap_or(16.0)
    }
}

/// TOC panel backed by DOM elements in panel order.
#[derive(Default)]
struct DomTocPanel {
    entries: Vec<Element>,
    top: Option<Element>,
    class: String,
}

impl TocPanel for DomTocPanel {
    fn set_highlighted(&mut self, slot: TocSlot, on: bool) {
        let el = match slot {
            TocSlot::Top => self.top.as_ref(),
            TocSlot::Entry(i) => self.entries.get(i),
        };
        if let Some(el) = el {
            let _ = el.class_list().toggle_with_force(&self.class, on);
        }
    }
}

/// Text element measured for the indicator and the thumb it drives.
struct Scrollbar {
    text: Element,
    thumb: HtmlElement,
}

impl Scrollbar {
    fn metrics(&self) -> ScrollbarMetrics {
        let rect = self.text.get_bounding_client_rect();
        let client_width = f64::from(self.text.client_width());
        let client_height = f64::from(self.text.client_height());
        ScrollbarMetrics {
            bounding_width: rect.width(),
            bounding_height: rect.height(),
            client_width,
            client_height,
            viewable_height: client_height,
            total_scroll_height: f64::from(self.text.scroll_height()),
            viewport_top: rect.top(),
        }
    }

    fn scroll_offset(&self) -> f64 {
        f64::from(self.text.scroll_top())
    }

    fn apply(&self, style: &ThumbStyle) {
        set_style(&self.thumb, "display", style.display);
        if let Some(top) = &style.top {
            set_style(&self.thumb, "top", top);
        }
        if let Some(height) = &style.height {
            set_style(&self.thumb, "height", height);
        }
    }
}

struct Inner {
    session: ViewerSession,
    renderer: JsRenderer,
    panel: DomTocPanel,
    scrollbar: Option<Scrollbar>,
    endpoint: String,
}

impl Inner {
    fn refresh_thumb(&self, scroll_offset: f64) {
        if let Some(bar) = &self.scrollbar {
            bar.apply(&ThumbStyle::for_offset(
                self.session.indicator_model().as_ref(),
                scroll_offset,
            ));
        }
    }
}

// ---------------------------------------------------------------------------
// Classification transport
// ---------------------------------------------------------------------------

async fn send_classify(endpoint: &str, body: &str) -> Result<Vec<LinkSpan>, ClassifyError> {
    let transport = |err: JsValue| ClassifyError::Transport(format!("{err:?}"));

    let init = RequestInit::new();
    init.set_method("POST");
    init.set_body(&JsValue::from_str(body));
    let request = Request::new_with_str_and_init(endpoint, &init).map_err(transport)?;
    request
        .headers()
        .set("Content-Type", "application/json")
        .map_err(transport)?;

    let window = web_sys::window().ok_or_else(|| ClassifyError::Transport("no window".into()))?;
    let response: Response = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(transport)?
        .dyn_into()
        .map_err(transport)?;
    let status = response.status();
    let text = JsFuture::from(response.text().map_err(transport)?)
        .await
        .map_err(transport)?
        .as_string()
        .unwrap_or_default();
    classify_outcome(status, &text)
}

fn dispatch(inner: &Rc<RefCell<Inner>>, request: ClassifyRequest) {
    let endpoint = inner.borrow().endpoint.clone();
    let body = request.to_json_body();
    let id = request.id;
    let inner = Rc::clone(inner);
    debug!(target: "docview_web::fetch", %id, range = %request.range, "dispatching classification");
    spawn_local(async move {
        let outcome = send_classify(&endpoint, &body).await;
        deliver(inner, id, outcome);
    });
}

/// Hand a fetch outcome to the session. While a re-entrant JS callback holds
/// the viewer, the completion is requeued as a new task so the in-flight
/// entry is always resolved.
fn deliver(
    inner: Rc<RefCell<Inner>>,
    id: RequestId,
    outcome: Result<Vec<LinkSpan>, ClassifyError>,
) {
    if inner.try_borrow_mut().is_err() {
        debug!(target: "docview_web::fetch", %id, "viewer busy; completion requeued");
        spawn_local(async move {
            deliver(inner, id, outcome);
        });
        return;
    }
    let mut guard = inner.borrow_mut();
    let Inner {
        session, renderer, ..
    } = &mut *guard;
    session.complete_annotation(id, outcome, renderer);
}

// ---------------------------------------------------------------------------
// Exports
// ---------------------------------------------------------------------------

/// Install console logging. `level` is a filter directive such as `info` or
/// `docview_core=debug,warn`.
#[wasm_bindgen(js_name = initLogging)]
pub fn init_logging(level: &str) -> Result<(), JsValue> {
    install_panic_hook();
    logging::init(level, console_log).map_err(|e| JsValue::from_str(&e))
}

/// Lazily annotated document viewer bound to one renderer.
#[wasm_bindgen]
pub struct DocViewWeb {
    inner: Rc<RefCell<Inner>>,
}

#[wasm_bindgen]
impl DocViewWeb {
    /// `renderer` implements the renderer contract; `options` carries engine
    /// tuning, capability flags, and the classification endpoint.
    #[wasm_bindgen(constructor)]
    pub fn new(renderer: JsValue, options: Option<JsValue>) -> Result<DocViewWeb, JsValue> {
        install_panic_hook();
        if renderer.is_null() || renderer.is_undefined() {
            return Err(JsValue::from_str("renderer is required"));
        }
        let json = match options.as_ref() {
            Some(opts) => stringify(opts)?,
            None => String::new(),
        };
        let opts = ViewerOptions::from_json(&json).map_err(|e| JsValue::from_str(&e.to_string()))?;
        let caps = opts.capabilities(probe_pointer());
        let session = ViewerSession::new(opts.config, caps);
        Ok(Self {
            inner: Rc::new(RefCell::new(Inner {
                session,
                renderer: JsRenderer { obj: renderer },
                panel: DomTocPanel {
                    class: opts.highlight_class,
                    ..DomTocPanel::default()
                },
                scrollbar: None,
                endpoint: opts.endpoint,
            })),
        })
    }

    /// Install a new document. `toc_entries` is an array of
    /// `{anchorText, targetLine}`; `dialect` is `standard` or `hyphenated`.
    #[wasm_bindgen(js_name = loadDocument)]
    pub fn load_document(
        &self,
        toc_entries: JsValue,
        dialect: Option<String>,
        now_ms: f64,
    ) -> Result<(), JsValue> {
        let entries = parse_toc_entries(&stringify(&toc_entries)?)
            .map_err(|e| JsValue::from_str(&format!("tocEntries: {e}")))?;
        let raw_dialect = dialect.unwrap_or_default();
        let dialect = SourceDialect::parse(&raw_dialect)
            .ok_or_else(|| JsValue::from_str(&format!("unknown dialect {raw_dialect:?}")))?;

        let request = {
            let mut guard = self.inner.borrow_mut();
            let Inner {
                session, renderer, ..
            } = &mut *guard;
            session.load_document(renderer, entries, dialect, duration_from_ms(now_ms))
        };
        if let Some(request) = request {
            dispatch(&self.inner, request);
        }
        Ok(())
    }

    /// Attach the scrolling text element and the overlay thumb it drives.
    #[wasm_bindgen(js_name = attachScrollbar)]
    pub fn attach_scrollbar(&self, text_el: Element, thumb_el: HtmlElement) {
        let mut inner = self.inner.borrow_mut();
        let bar = Scrollbar {
            text: text_el,
            thumb: thumb_el,
        };
        let metrics = bar.metrics();
        let offset = bar.scroll_offset();
        inner.scrollbar = Some(bar);
        inner.session.on_content_height_changed(&metrics);
        inner.refresh_thumb(offset);
    }

    /// Attach TOC entry elements (panel order) and an optional "top" element.
    #[wasm_bindgen(js_name = attachTocPanel)]
    pub fn attach_toc_panel(&self, elements: Array, top: Option<Element>) {
        let entries = elements
            .iter()
            .filter_map(|v| v.dyn_into::<Element>().ok())
            .collect();
        let mut guard = self.inner.borrow_mut();
        let Inner { session, panel, .. } = &mut *guard;
        panel.entries = entries;
        panel.top = top;
        session.rebind_toc_panel(panel);
    }

    #[wasm_bindgen(js_name = onScroll)]
    pub fn on_scroll(&self, scroll_top: f64, now_ms: f64) {
        self.inner
            .borrow_mut()
            .session
            .on_scroll(scroll_top, duration_from_ms(now_ms));
    }

    #[wasm_bindgen(js_name = onEdit)]
    pub fn on_edit(&self, now_ms: f64) {
        let mut guard = self.inner.borrow_mut();
        let Inner {
            session, renderer, ..
        } = &mut *guard;
        session.on_edit(renderer, duration_from_ms(now_ms));
    }

    /// Re-measure after a layout change.
    #[wasm_bindgen(js_name = onResize)]
    pub fn on_resize(&self, now_ms: f64) {
        let mut guard = self.inner.borrow_mut();
        let Inner {
            session,
            renderer,
            scrollbar,
            ..
        } = &mut *guard;
        let metrics = scrollbar.as_ref().map(Scrollbar::metrics).unwrap_or_default();
        session.on_resize(&*renderer, &metrics, duration_from_ms(now_ms));
        if let Some(bar) = scrollbar.as_ref() {
            bar.apply(&ThumbStyle::for_offset(
                session.indicator_model().as_ref(),
                bar.scroll_offset(),
            ));
        }
    }

    /// Content height changed without a resize.
    #[wasm_bindgen(js_name = onContentHeightChanged)]
    pub fn on_content_height_changed(&self) {
        let mut inner = self.inner.borrow_mut();
        let Some(bar) = inner.scrollbar.as_ref() else {
            return;
        };
        let metrics = bar.metrics();
        let offset = bar.scroll_offset();
        inner.session.on_content_height_changed(&metrics);
        inner.refresh_thumb(offset);
    }

    /// Run settled tasks. Returns the next deadline in host milliseconds, or
    /// `undefined` when nothing is pending.
    pub fn tick(&self, now_ms: f64) -> Option<f64> {
        let (request, next) = {
            let mut guard = self.inner.borrow_mut();
            let Inner {
                session,
                renderer,
                panel,
                scrollbar,
                ..
            } = &mut *guard;
            let report = session.tick(&*renderer, panel, duration_from_ms(now_ms));
            if let Some(bar) = scrollbar.as_ref()
                && let Some(style) = ThumbStyle::after_settle(
                    &report,
                    session.indicator_model().as_ref(),
                    bar.scroll_offset(),
                )
            {
                bar.apply(&style);
            }
            (report.request, session.next_deadline())
        };
        if let Some(request) = request {
            dispatch(&self.inner, request);
        }
        next.map(ms_from_duration)
    }

    /// Scroll offset that places the overlay thumb top at `y` (drag support).
    #[wasm_bindgen(js_name = scrollOffsetForThumb)]
    pub fn scroll_offset_for_thumb(&self, y: f64) -> f64 {
        self.inner
            .borrow()
            .session
            .indicator_model()
            .map_or(0.0, |m| m.scroll_offset_for_thumb_top(y))
    }

    /// Highlight the TOC entry governing a clicked line. Returns its panel
    /// index, or `undefined` for the top sentinel.
    #[wasm_bindgen(js_name = onTextClick)]
    pub fn on_text_click(&self, line: u32) -> Option<u32> {
        let mut guard = self.inner.borrow_mut();
        let Inner { session, panel, .. } = &mut *guard;
        match session.on_text_click(line as usize, panel) {
            TocSlot::Entry(i) => Some(to_js_u32(i)),
            TocSlot::Top => None,
        }
    }

    /// Swap bookmark slots; returns the line scrolled to.
    #[wasm_bindgen(js_name = toggleBookmark)]
    pub fn toggle_bookmark(&self) -> u32 {
        let mut guard = self.inner.borrow_mut();
        let Inner {
            session,
            renderer,
            panel,
            ..
        } = &mut *guard;
        to_js_u32(session.toggle_bookmark(renderer, panel))
    }

    /// `callForm` is true when the clicked token is followed by `(`.
    #[wasm_bindgen(js_name = mentionTarget)]
    pub fn mention_target(&self, token: &str, call_form: bool) -> Option<u32> {
        self.inner
            .borrow()
            .session
            .mention_target(token, call_form)
            .map(to_js_u32)
    }

    #[wasm_bindgen(js_name = followMention)]
    pub fn follow_mention(&self, token: &str, call_form: bool) -> Option<u32> {
        let mut guard = self.inner.borrow_mut();
        let Inner {
            session,
            renderer,
            panel,
            ..
        } = &mut *guard;
        session
            .follow_mention(token, call_form, renderer, panel)
            .map(to_js_u32)
    }

    pub fn status(&self) -> Option<String> {
        self.inner.borrow().session.status().map(str::to_owned)
    }

    #[wasm_bindgen(js_name = clearStatus)]
    pub fn clear_status(&self) {
        self.inner.borrow_mut().session.clear_status();
    }

    /// `{proximal, distal, bigMoveThreshold}`.
    #[wasm_bindgen(js_name = bookmarkState)]
    pub fn bookmark_state(&self) -> JsValue {
        parse_json(&bookmark_json(&self.inner.borrow().session.bookmark_state()))
    }

    /// Current indicator geometry, or `null` before the first measurement.
    #[wasm_bindgen(js_name = indicatorModel)]
    pub fn indicator_model(&self) -> JsValue {
        parse_json(&indicator_json(
            self.inner.borrow().session.indicator_model().as_ref(),
        ))
    }
}
