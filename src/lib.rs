mod config;
mod engine;
mod error;
mod solar;

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::convert::FromWasmAbi;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    Document, EventTarget, HtmlCanvasElement, MouseEvent, PointerEvent, Request, RequestInit,
    RequestMode, Response, WebGlRenderingContext, WheelEvent, Window,
};

use crate::config::{ViewerConfig, CONFIG_URL};
use crate::engine::controls::{PointerInput, PointerKind};
use crate::engine::renderer::Renderer;
use crate::error::ViewerError;
use crate::solar::SolarSystem;

type App = Rc<RefCell<SolarSystem<Renderer>>>;

#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
}

/// Builds the scene into the page and starts the animation loop.
#[wasm_bindgen]
pub async fn init_solar_system() -> Result<(), JsValue> {
    let window = web_sys::window().ok_or(ViewerError::NoWindow)?;
    let document = window.document().ok_or(ViewerError::NoDocument)?;

    let config = fetch_config(&window).await;
    log::set_max_level(config.level_filter());
    log::info!("starting with {:?}", config);

    let canvas = mount_canvas(&document, &config)?;
    let (width, height) = viewport_size(&window);
    canvas.set_width(width);
    canvas.set_height(height);

    let gl = canvas
        .get_context("webgl")?
        .ok_or(ViewerError::WebGlUnavailable)?
        .dyn_into::<WebGlRenderingContext>()?;
    let renderer = Renderer::new(gl)?;

    let mut system = SolarSystem::new(renderer, &config)?;
    system.resize(width, height);
    let app: App = Rc::new(RefCell::new(system));

    register_input(&canvas, &app)?;
    register_resize(&window, &app)?;

    app.borrow_mut().start();

    let f = Rc::new(RefCell::new(None));
    let g = f.clone();
    *g.borrow_mut() = Some(Closure::wrap(Box::new(move || {
        app.borrow_mut().frame();
        if let Some(callback) = f.borrow().as_ref() {
            if let Err(err) = request_animation_frame(callback) {
                log::error!("animation loop stopped: {:?}", err);
            }
        }
    }) as Box<dyn FnMut()>));

    if let Some(callback) = g.borrow().as_ref() {
        request_animation_frame(callback)?;
    }

    Ok(())
}

/// Missing or malformed config is not fatal; the defaults describe the
/// standard deployment layout.
async fn fetch_config(window: &Window) -> ViewerConfig {
    match try_fetch_config(window).await {
        Ok(config) => config,
        Err(err) => {
            log::warn!("using default config: {}", err);
            ViewerConfig::default()
        }
    }
}

async fn try_fetch_config(window: &Window) -> Result<ViewerConfig, ViewerError> {
    let opts = RequestInit::new();
    opts.set_method("GET");
    opts.set_mode(RequestMode::Cors);

    let request = Request::new_with_str_and_init(CONFIG_URL, &opts)?;
    let resp: Response = JsFuture::from(window.fetch_with_request(&request)).await?.dyn_into()?;
    if !resp.ok() {
        return Err(ViewerError::Js(format!("{} returned {}", CONFIG_URL, resp.status())));
    }
    let text = JsFuture::from(resp.text()?).await?;
    let text = text
        .as_string()
        .ok_or_else(|| ViewerError::Js("config body is not text".to_string()))?;
    ViewerConfig::from_json(&text)
}

fn mount_canvas(document: &Document, config: &ViewerConfig) -> Result<HtmlCanvasElement, JsValue> {
    let canvas = match &config.canvas_id {
        Some(id) => document
            .get_element_by_id(id)
            .ok_or_else(|| ViewerError::Js(format!("no element with id {}", id)))?
            .dyn_into::<HtmlCanvasElement>()?,
        None => {
            let canvas = document.create_element("canvas")?.dyn_into::<HtmlCanvasElement>()?;
            document.body().ok_or(ViewerError::NoBody)?.append_child(&canvas)?;
            canvas
        }
    };
    let style = canvas.style();
    style.set_property("display", "block")?;
    // Pointer events, not browser scrolling, own touch drags on the canvas.
    style.set_property("touch-action", "none")?;
    Ok(canvas)
}

fn viewport_size(window: &Window) -> (u32, u32) {
    let dimension =
        |value: Result<JsValue, JsValue>| value.ok().and_then(|v| v.as_f64()).unwrap_or(0.0) as u32;
    (dimension(window.inner_width()), dimension(window.inner_height()))
}

fn pointer_input(event: &PointerEvent) -> PointerInput {
    PointerInput {
        id: event.pointer_id(),
        kind: PointerKind::from_dom(&event.pointer_type()),
        button: event.button(),
        x: event.client_x() as f32,
        y: event.client_y() as f32,
        pan_modifier: event.shift_key() || event.ctrl_key() || event.meta_key(),
    }
}

fn listen<E>(
    target: &EventTarget,
    event: &str,
    handler: impl FnMut(E) + 'static,
) -> Result<(), JsValue>
where
    E: FromWasmAbi + 'static,
{
    let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(E)>);
    target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

fn register_input(canvas: &HtmlCanvasElement, app: &App) -> Result<(), JsValue> {
    let down_app = app.clone();
    let down_canvas = canvas.clone();
    listen(canvas, "pointerdown", move |event: PointerEvent| {
        if let Err(err) = down_canvas.set_pointer_capture(event.pointer_id()) {
            log::debug!("pointer capture failed: {:?}", err);
        }
        down_app.borrow_mut().pointer_down(pointer_input(&event));
    })?;

    let move_app = app.clone();
    listen(canvas, "pointermove", move |event: PointerEvent| {
        move_app
            .borrow_mut()
            .pointer_move(event.pointer_id(), event.client_x() as f32, event.client_y() as f32);
    })?;

    for name in ["pointerup", "pointercancel"] {
        let up_app = app.clone();
        let up_canvas = canvas.clone();
        listen(canvas, name, move |event: PointerEvent| {
            up_canvas.release_pointer_capture(event.pointer_id()).ok();
            up_app.borrow_mut().pointer_up(event.pointer_id());
        })?;
    }

    let wheel_app = app.clone();
    listen(canvas, "wheel", move |event: WheelEvent| {
        event.prevent_default();
        wheel_app.borrow_mut().wheel(event.delta_y() as f32);
    })?;

    // Right drag pans, so the context menu has to stay closed.
    listen(canvas, "contextmenu", |event: MouseEvent| event.prevent_default())?;
    Ok(())
}

fn register_resize(window: &Window, app: &App) -> Result<(), JsValue> {
    let resize_app = app.clone();
    let resize_window = window.clone();
    listen(window, "resize", move |_: web_sys::Event| {
        let (width, height) = viewport_size(&resize_window);
        resize_app.borrow_mut().resize(width, height);
    })
}

fn request_animation_frame(f: &Closure<dyn FnMut()>) -> Result<i32, JsValue> {
    let window = web_sys::window().ok_or(ViewerError::NoWindow)?;
    window.request_animation_frame(f.as_ref().unchecked_ref())
}
