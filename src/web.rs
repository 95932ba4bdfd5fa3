//! Browser binding: canvas 2D surface, input listeners and the frame loop
//!
//! All callbacks share one `Rc<RefCell<WebState>>`; the browser runs them on
//! the page's single thread, so the borrows never overlap.

use std::cell::{Cell, RefCell};
use std::f64::consts::TAU;
use std::rc::Rc;

use tracing::{debug, info, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    CanvasRenderingContext2d, Document, Element, HtmlCanvasElement, MediaQueryList,
    MediaQueryListEvent, MouseEvent, Window,
};

use crate::core::{FieldConfig, FieldError, IntervalStats, ParticleScene, Surface};
use crate::theme::{ColorScheme, Rgba};
use crate::time::{now_seconds, FpsCounter};

/// Canvas the start hook mounts on, when present in the page
const DEFAULT_CANVAS_ID: &str = "particle-canvas";
/// Window global holding an optional JSON config override
const CONFIG_GLOBAL: &str = "__particle_field_config";
const DARK_QUERY: &str = "(prefers-color-scheme: dark)";
/// Seconds between frame stats debug logs
const REPORT_INTERVAL: f64 = 5.0;

thread_local! {
    static AUTO_MOUNTED: RefCell<Option<FieldHandle>> = const { RefCell::new(None) };
}

#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();

    // Initialize tracing for browser console
    tracing_wasm::set_as_global_default();

    let has_canvas = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.get_element_by_id(DEFAULT_CANVAS_ID))
        .is_some();
    if has_canvas {
        let handle = mount(DEFAULT_CANVAS_ID);
        AUTO_MOUNTED.with(|slot| *slot.borrow_mut() = Some(handle));
    }
}

/// Tear down the instance mounted by the start hook, if any.
#[wasm_bindgen]
pub fn unmount() {
    if let Some(mut handle) = AUTO_MOUNTED.with(|slot| slot.borrow_mut().take()) {
        handle.destroy();
    }
}

/// Start the particle network on the canvas with the given id.
///
/// Never throws: if the canvas or its 2D context is missing the returned
/// handle is inert and nothing is drawn.
#[wasm_bindgen]
pub fn mount(canvas_id: &str) -> FieldHandle {
    match Mounted::new(canvas_id) {
        Ok(mounted) => FieldHandle {
            inner: Some(mounted),
        },
        Err(e) => {
            warn!(error = %e, canvas_id, "Particle field disabled");
            FieldHandle { inner: None }
        }
    }
}

/// A running (or inert) particle field. Dropping it tears everything down.
#[wasm_bindgen]
pub struct FieldHandle {
    inner: Option<Mounted>,
}

#[wasm_bindgen]
impl FieldHandle {
    /// Stop the frame loop and remove every listener.
    pub fn destroy(&mut self) {
        self.inner.take();
    }

    #[wasm_bindgen(getter)]
    pub fn active(&self) -> bool {
        self.inner.is_some()
    }

    #[wasm_bindgen(getter)]
    pub fn particles(&self) -> usize {
        self.inner
            .as_ref()
            .map_or(0, |m| m.state.borrow().scene.field().len())
    }
}

// ============================================================================
// Canvas surface
// ============================================================================

struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl CanvasSurface {
    /// Size the backing store to the viewport at device pixel density.
    fn fit(&self, width: f64, height: f64, dpr: f64) {
        self.canvas.set_width((width * dpr) as u32);
        self.canvas.set_height((height * dpr) as u32);
        let style = self.canvas.style();
        let _ = style.set_property("width", &format!("{}px", width));
        let _ = style.set_property("height", &format!("{}px", height));
        // Absolute transform: resizing resets rather than compounds the scale
        if let Err(e) = self.ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0) {
            warn!(?e, "Failed to set canvas transform");
        }
    }
}

impl Surface for CanvasSurface {
    fn clear(&mut self, width: f64, height: f64) {
        self.ctx.clear_rect(0.0, 0.0, width, height);
    }

    fn set_line_width(&mut self, width: f64) {
        self.ctx.set_line_width(width);
    }

    fn stroke_line(&mut self, from: (f64, f64), to: (f64, f64), color: Rgba) {
        self.ctx.begin_path();
        self.ctx.move_to(from.0, from.1);
        self.ctx.line_to(to.0, to.1);
        self.ctx.set_stroke_style_str(&color.css());
        self.ctx.stroke();
    }

    fn fill_circle(&mut self, x: f64, y: f64, radius: f64, color: Rgba) {
        self.ctx.begin_path();
        if self.ctx.arc(x, y, radius, 0.0, TAU).is_ok() {
            self.ctx.set_fill_style_str(&color.css());
            self.ctx.fill();
        }
    }
}

// ============================================================================
// Mounted instance
// ============================================================================

struct WebState {
    scene: ParticleScene,
    surface: CanvasSurface,
    fps: FpsCounter,
    interval: IntervalStats,
    last_report: f64,
}

impl WebState {
    fn frame(&mut self) {
        let stats = self.scene.tick(&mut self.surface);
        self.fps.tick();
        self.interval.record(&stats);

        let now = now_seconds();
        if now - self.last_report >= REPORT_INTERVAL {
            let report = self.interval.take(self.fps.fps());
            debug!(
                fps = format!("{:.1}", report.fps),
                particles = report.particles,
                avg_edges = format!("{:.0}", report.avg_edges),
                max_edges = report.max_edges,
                "Frame stats"
            );
            self.last_report = now;
        }
    }
}

type Listener<E> = Closure<dyn FnMut(E)>;

struct Mounted {
    window: Window,
    document: Document,
    state: Rc<RefCell<WebState>>,
    frame_loop: FrameLoop,
    dark_query: Option<MediaQueryList>,
    on_resize: Listener<web_sys::Event>,
    on_pointer_move: Listener<MouseEvent>,
    on_pointer_leave: Listener<MouseEvent>,
    on_scheme_change: Listener<MediaQueryListEvent>,
}

impl Mounted {
    fn new(canvas_id: &str) -> Result<Self, FieldError> {
        let window = web_sys::window().ok_or_else(|| FieldError::SurfaceUnavailable("no window".into()))?;
        let document = window
            .document()
            .ok_or_else(|| FieldError::SurfaceUnavailable("no document".into()))?;
        let canvas = document
            .get_element_by_id(canvas_id)
            .ok_or_else(|| FieldError::SurfaceUnavailable(format!("no element #{}", canvas_id)))?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| FieldError::SurfaceUnavailable(format!("#{} is not a canvas", canvas_id)))?;
        let ctx = canvas
            .get_context("2d")
            .ok()
            .flatten()
            .ok_or_else(|| FieldError::SurfaceUnavailable("no 2d context".into()))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| FieldError::SurfaceUnavailable("unexpected context type".into()))?;

        let config = read_config(&window);
        let dark_query = window.match_media(DARK_QUERY).ok().flatten();
        let scheme = dark_query
            .as_ref()
            .map_or(ColorScheme::Dark, |q| ColorScheme::from_prefers_dark(q.matches()));

        let (width, height) = viewport(&window);
        let surface = CanvasSurface { canvas, ctx };
        surface.fit(width, height, device_pixel_ratio(&window));

        let state = Rc::new(RefCell::new(WebState {
            scene: ParticleScene::new(config, width, height, scheme),
            surface,
            fps: FpsCounter::new(),
            interval: IntervalStats::default(),
            last_report: now_seconds(),
        }));

        // On resize - refit the canvas and regenerate the field
        let window_clone = window.clone();
        let state_clone = state.clone();
        let on_resize = Closure::wrap(Box::new(move |_: web_sys::Event| {
            let (width, height) = viewport(&window_clone);
            let mut state = state_clone.borrow_mut();
            state.surface.fit(width, height, device_pixel_ratio(&window_clone));
            state.scene.resize(width, height);
        }) as Box<dyn FnMut(web_sys::Event)>);

        let state_clone = state.clone();
        let on_pointer_move = Closure::wrap(Box::new(move |e: MouseEvent| {
            state_clone
                .borrow_mut()
                .scene
                .pointer_moved(e.client_x() as f64, e.client_y() as f64);
        }) as Box<dyn FnMut(MouseEvent)>);

        let state_clone = state.clone();
        let on_pointer_leave = Closure::wrap(Box::new(move |_: MouseEvent| {
            state_clone.borrow_mut().scene.pointer_left();
        }) as Box<dyn FnMut(MouseEvent)>);

        let state_clone = state.clone();
        let on_scheme_change = Closure::wrap(Box::new(move |e: MediaQueryListEvent| {
            let scheme = ColorScheme::from_prefers_dark(e.matches());
            state_clone.borrow_mut().scene.set_color_scheme(scheme);
        }) as Box<dyn FnMut(MediaQueryListEvent)>);

        let frame_loop = FrameLoop::new(window.clone(), state.clone());

        let mounted = Self {
            window,
            document,
            state,
            frame_loop,
            dark_query,
            on_resize,
            on_pointer_move,
            on_pointer_leave,
            on_scheme_change,
        };
        // From here on a failure drops `mounted`, which detaches whatever was attached
        mounted.attach()?;
        mounted.frame_loop.start();

        info!(
            canvas_id,
            width,
            height,
            particles = mounted.state.borrow().scene.field().len(),
            ?scheme,
            "Particle field mounted"
        );
        Ok(mounted)
    }

    fn leave_target(&self) -> Option<Element> {
        self.document.document_element()
    }

    fn attach(&self) -> Result<(), FieldError> {
        let host = |e: JsValue| FieldError::Host(format!("{:?}", e));

        self.window
            .add_event_listener_with_callback("resize", self.on_resize.as_ref().unchecked_ref())
            .map_err(host)?;
        self.window
            .add_event_listener_with_callback(
                "mousemove",
                self.on_pointer_move.as_ref().unchecked_ref(),
            )
            .map_err(host)?;
        if let Some(root) = self.leave_target() {
            root.add_event_listener_with_callback(
                "mouseleave",
                self.on_pointer_leave.as_ref().unchecked_ref(),
            )
            .map_err(host)?;
        }
        if let Some(query) = &self.dark_query {
            query
                .add_event_listener_with_callback(
                    "change",
                    self.on_scheme_change.as_ref().unchecked_ref(),
                )
                .map_err(host)?;
        }
        Ok(())
    }

    fn detach(&self) {
        let _ = self
            .window
            .remove_event_listener_with_callback("resize", self.on_resize.as_ref().unchecked_ref());
        let _ = self.window.remove_event_listener_with_callback(
            "mousemove",
            self.on_pointer_move.as_ref().unchecked_ref(),
        );
        if let Some(root) = self.leave_target() {
            let _ = root.remove_event_listener_with_callback(
                "mouseleave",
                self.on_pointer_leave.as_ref().unchecked_ref(),
            );
        }
        if let Some(query) = &self.dark_query {
            let _ = query.remove_event_listener_with_callback(
                "change",
                self.on_scheme_change.as_ref().unchecked_ref(),
            );
        }
    }
}

impl Drop for Mounted {
    fn drop(&mut self) {
        self.frame_loop.stop();
        self.detach();
        info!(frames = self.state.borrow().scene.frame(), "Particle field torn down");
    }
}

// ============================================================================
// Frame loop
// ============================================================================

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

/// Display-synced loop with an explicit stop flag checked before each tick.
struct FrameLoop {
    window: Window,
    running: Rc<Cell<bool>>,
    request_id: Rc<Cell<Option<i32>>>,
    callback: FrameCallback,
}

impl FrameLoop {
    fn new(window: Window, state: Rc<RefCell<WebState>>) -> Self {
        let running = Rc::new(Cell::new(false));
        let request_id: Rc<Cell<Option<i32>>> = Rc::new(Cell::new(None));
        let callback: FrameCallback = Rc::new(RefCell::new(None));

        let running_clone = running.clone();
        let request_clone = request_id.clone();
        let callback_clone = callback.clone();
        let window_clone = window.clone();
        let tick = Closure::wrap(Box::new(move || {
            request_clone.set(None);
            if !running_clone.get() {
                return;
            }
            state.borrow_mut().frame();
            schedule(&window_clone, &callback_clone, &request_clone);
        }) as Box<dyn FnMut()>);
        *callback.borrow_mut() = Some(tick);

        Self {
            window,
            running,
            request_id,
            callback,
        }
    }

    fn start(&self) {
        if !self.running.replace(true) {
            schedule(&self.window, &self.callback, &self.request_id);
        }
    }

    /// Cancel the pending frame and release the callback.
    ///
    /// Must not be called from inside the frame callback itself.
    fn stop(&mut self) {
        self.running.set(false);
        if let Some(id) = self.request_id.take() {
            let _ = self.window.cancel_animation_frame(id);
        }
        // The closure holds a clone of `callback`; dropping it breaks the cycle
        self.callback.borrow_mut().take();
    }
}

fn schedule(window: &Window, callback: &FrameCallback, request_id: &Cell<Option<i32>>) {
    if let Some(cb) = callback.borrow().as_ref() {
        match window.request_animation_frame(cb.as_ref().unchecked_ref()) {
            Ok(id) => request_id.set(Some(id)),
            Err(e) => warn!(?e, "requestAnimationFrame failed"),
        }
    }
}

// ============================================================================
// Host helpers
// ============================================================================

fn viewport(window: &Window) -> (f64, f64) {
    let width = window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
    let height = window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
    (width, height)
}

fn device_pixel_ratio(window: &Window) -> f64 {
    let dpr = window.device_pixel_ratio();
    if dpr > 0.0 {
        dpr
    } else {
        1.0
    }
}

/// Optional JSON override from `window.__particle_field_config`.
/// A bad override is logged and ignored.
fn read_config(window: &Window) -> FieldConfig {
    let json = js_sys::Reflect::get(window, &JsValue::from_str(CONFIG_GLOBAL))
        .ok()
        .and_then(|v| v.as_string());
    match json {
        Some(json) => FieldConfig::from_json(&json).unwrap_or_else(|e| {
            warn!(error = %e, "Ignoring invalid particle field config");
            FieldConfig::default()
        }),
        None => FieldConfig::default(),
    }
}
