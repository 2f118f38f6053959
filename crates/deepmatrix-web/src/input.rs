use std::cell::RefCell;
use std::rc::Rc;

use deepmatrix_core::MatrixError;
use deepmatrix_sim::{InteractionResponse, PointerCapture, PointerSample, Simulation};
use wasm_bindgen::prelude::*;
use web_sys::{EventTarget, HtmlCanvasElement, PointerEvent};

use crate::app::Stage;
use crate::dom;

/// A DOM listener that can be removed again, unlike the fire-and-forget
/// closures a page-lifetime app would leak.
pub struct EventListener {
    target: EventTarget,
    kind: &'static str,
    closure: Closure<dyn FnMut(web_sys::Event)>,
}

impl EventListener {
    pub fn attach(
        target: &EventTarget,
        kind: &'static str,
        passive: bool,
        handler: impl FnMut(web_sys::Event) + 'static,
    ) -> Result<Self, MatrixError> {
        let closure = Closure::<dyn FnMut(web_sys::Event)>::new(handler);
        let options = web_sys::AddEventListenerOptions::new();
        options.set_passive(passive);
        target
            .add_event_listener_with_callback_and_add_event_listener_options(
                kind,
                closure.as_ref().unchecked_ref(),
                &options,
            )
            .map_err(dom::dom_err)?;
        Ok(Self {
            target: target.clone(),
            kind,
            closure,
        })
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn detach(&self) -> Result<(), MatrixError> {
        self.target
            .remove_event_listener_with_callback(self.kind, self.closure.as_ref().unchecked_ref())
            .map_err(dom::dom_err)
    }
}

impl Drop for EventListener {
    fn drop(&mut self) {
        // Never leave the DOM holding a dropped closure.
        let _ = self.detach();
    }
}

/// Calls the page's `onInteractionStart`. The simulation reports the reveal
/// at most once, so this fires at most once per mount.
pub struct InteractionNotifier {
    callback: Option<js_sys::Function>,
}

impl InteractionNotifier {
    pub fn new(callback: Option<js_sys::Function>) -> Self {
        Self { callback }
    }

    fn notify(&self) {
        if let Some(callback) = &self.callback {
            if let Err(e) = callback.call0(&JsValue::NULL) {
                log::warn!("onInteractionStart threw: {e:?}");
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum PointerKind {
    Down,
    Move,
    Up,
    Cancel,
    Leave,
}

impl PointerKind {
    fn event_name(self) -> &'static str {
        match self {
            PointerKind::Down => "pointerdown",
            PointerKind::Move => "pointermove",
            PointerKind::Up => "pointerup",
            PointerKind::Cancel => "pointercancel",
            PointerKind::Leave => "pointerleave",
        }
    }

    fn dispatch(self, sim: &mut Simulation, id: i32, sample: PointerSample) -> InteractionResponse {
        match self {
            PointerKind::Down => sim.pointer_down(id, sample),
            PointerKind::Move => sim.pointer_move(id, sample),
            PointerKind::Up => sim.pointer_up(id),
            PointerKind::Cancel => sim.pointer_cancel(id),
            PointerKind::Leave => sim.pointer_leave(),
        }
    }
}

const POINTER_EVENTS: [PointerKind; 5] = [
    PointerKind::Down,
    PointerKind::Move,
    PointerKind::Up,
    PointerKind::Cancel,
    PointerKind::Leave,
];

/// Register pointer listeners on the canvas and resize/scroll on the window.
pub fn register_listeners(
    stage: &Rc<RefCell<Stage>>,
    canvas: &HtmlCanvasElement,
    notifier: Rc<InteractionNotifier>,
) -> Result<Vec<EventListener>, MatrixError> {
    let mut listeners = Vec::new();
    let canvas_target: &EventTarget = canvas.as_ref();

    for kind in POINTER_EVENTS {
        let stage = stage.clone();
        let canvas = canvas.clone();
        let notifier = notifier.clone();
        listeners.push(EventListener::attach(
            canvas_target,
            kind.event_name(),
            true,
            move |event: web_sys::Event| {
                let Some(event) = event.dyn_ref::<PointerEvent>() else {
                    return;
                };
                let sample = pointer_sample(&canvas, event);
                let response = match stage.try_borrow_mut() {
                    Ok(mut stage) => kind.dispatch(&mut stage.sim, event.pointer_id(), sample),
                    Err(_) => return,
                };
                apply_response(&canvas, &response);
                // Borrow released: the page callback may call back into the handle.
                if response.reveal_triggered {
                    notifier.notify();
                }
            },
        )?);
    }

    let window = dom::window()?;
    let window_target: &EventTarget = window.as_ref();

    for kind in ["resize", "orientationchange"] {
        let stage = stage.clone();
        listeners.push(EventListener::attach(
            window_target,
            kind,
            true,
            move |_event: web_sys::Event| {
                if let Ok(mut stage) = stage.try_borrow_mut() {
                    if let Err(e) = stage.resize() {
                        log::warn!("Resize failed: {e}");
                    }
                }
            },
        )?);
    }

    {
        let stage = stage.clone();
        listeners.push(EventListener::attach(
            window_target,
            "scroll",
            true,
            move |_event: web_sys::Event| {
                let Some(scroll_y) = web_sys::window().and_then(|w| w.scroll_y().ok()) else {
                    return;
                };
                let response = match stage.try_borrow_mut() {
                    Ok(mut stage) => stage.sim.scroll(scroll_y),
                    Err(_) => return,
                };
                if response.reveal_triggered {
                    notifier.notify();
                }
            },
        )?);
    }

    Ok(listeners)
}

/// Pointer position relative to the canvas, in CSS pixels.
fn pointer_sample(canvas: &HtmlCanvasElement, event: &PointerEvent) -> PointerSample {
    let rect = canvas.get_bounding_client_rect();
    PointerSample::new(
        (event.client_x() as f64 - rect.left()) as f32,
        (event.client_y() as f64 - rect.top()) as f32,
        event.time_stamp(),
    )
    .with_primary(event.is_primary() && event.button() == 0)
}

fn apply_response(canvas: &HtmlCanvasElement, response: &InteractionResponse) {
    if let Some(cursor) = response.cursor {
        if let Err(e) = canvas.style().set_property("cursor", cursor.as_css()) {
            log::debug!("cursor update failed: {e:?}");
        }
    }
    let result = match response.capture {
        Some(PointerCapture::Capture(id)) => canvas.set_pointer_capture(id),
        Some(PointerCapture::Release(id)) => canvas.release_pointer_capture(id),
        None => Ok(()),
    };
    if let Err(e) = result {
        log::debug!("pointer capture update failed: {e:?}");
    }
}
