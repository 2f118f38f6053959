use deepmatrix_core::MatrixError;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, HtmlCanvasElement, HtmlElement, Window};

use crate::sizing::SurfaceSize;

const CANVAS_STYLE: &[(&str, &str)] = &[
    ("position", "absolute"),
    ("top", "50%"),
    ("left", "50%"),
    ("transform", "translate(-50%, -50%)"),
    ("width", "100%"),
    ("height", "100%"),
    ("display", "block"),
    ("background", "transparent"),
    ("touch-action", "none"),
];

const OVERLAY_STYLE: &[(&str, &str)] = &[
    ("position", "absolute"),
    ("inset", "0"),
    ("display", "flex"),
    ("align-items", "center"),
    ("justify-content", "center"),
    ("text-align", "center"),
    ("pointer-events", "none"),
];

pub const UNSUPPORTED_MESSAGE: &str = "3D visualization is not supported in this browser.";

pub fn dom_err(e: JsValue) -> MatrixError {
    MatrixError::Dom(format!("{e:?}"))
}

pub fn window() -> Result<Window, MatrixError> {
    web_sys::window().ok_or_else(|| MatrixError::Dom("no global window".into()))
}

fn document() -> Result<Document, MatrixError> {
    window()?
        .document()
        .ok_or_else(|| MatrixError::Dom("no document".into()))
}

fn apply_style(element: &HtmlElement, style: &[(&str, &str)]) -> Result<(), MatrixError> {
    let css = element.style();
    for (property, value) in style {
        css.set_property(property, value).map_err(dom_err)?;
    }
    Ok(())
}

/// Current CSS size of `container` at the window's device pixel ratio.
pub fn container_size(container: &HtmlElement) -> Result<SurfaceSize, MatrixError> {
    let ratio = window()?.device_pixel_ratio() as f32;
    Ok(SurfaceSize::new(
        container.client_width() as f32,
        container.client_height() as f32,
        ratio,
    ))
}

/// Create the transparent lattice canvas and append it to `container`.
pub fn create_canvas(container: &HtmlElement) -> Result<HtmlCanvasElement, MatrixError> {
    let canvas = document()?
        .create_element("canvas")
        .map_err(dom_err)?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| MatrixError::Dom("element is not a canvas".into()))?;
    canvas.set_class_name("deepmatrix-canvas");
    apply_style(&canvas, CANVAS_STYLE)?;
    container.append_child(&canvas).map_err(dom_err)?;
    Ok(canvas)
}

/// Set the canvas backing store to physical pixels.
pub fn size_canvas(canvas: &HtmlCanvasElement, (width, height): (u32, u32)) {
    canvas.set_width(width);
    canvas.set_height(height);
}

/// Show the static "unsupported" message in place of the lattice.
pub fn show_unsupported(container: &HtmlElement) -> Result<HtmlElement, MatrixError> {
    let overlay = document()?
        .create_element("div")
        .map_err(dom_err)?
        .dyn_into::<HtmlElement>()
        .map_err(|_| MatrixError::Dom("element is not an HtmlElement".into()))?;
    overlay.set_class_name("deepmatrix-unsupported");
    overlay.set_text_content(Some(UNSUPPORTED_MESSAGE));
    apply_style(&overlay, OVERLAY_STYLE)?;
    container.append_child(&overlay).map_err(dom_err)?;
    Ok(overlay)
}
