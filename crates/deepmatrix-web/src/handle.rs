use std::cell::{RefCell, RefMut};
use std::rc::Rc;

use deepmatrix_core::{MatrixError, Rgb, VisualizationConfig};
use deepmatrix_render::Renderer;
use deepmatrix_sim::{LiveParams, Simulation};
use wasm_bindgen::prelude::*;
use web_sys::{HtmlCanvasElement, HtmlElement};

use crate::app::{FrameLoop, Stage};
use crate::dom;
use crate::gpu::{self, GpuContext};
use crate::input::{self, EventListener, InteractionNotifier};
use crate::props;
use crate::sizing::SurfaceSize;
use crate::teardown::{release_lattice, LatticeResources};

fn js_err(e: MatrixError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

struct Running {
    stage: Rc<RefCell<Stage>>,
    live: LiveParams,
    frame_loop: FrameLoop,
    listeners: Vec<EventListener>,
}

enum Mounted {
    Running(Running),
    Unsupported(HtmlElement),
}

/// The lattice embedded in a page container.
#[wasm_bindgen]
pub struct DeepMatrixVisualization {
    mounted: Option<Mounted>,
}

#[wasm_bindgen]
impl DeepMatrixVisualization {
    /// Mount into `container`. `props_json` is the props object; fields left
    /// out take their defaults. Invalid props reject; a browser without
    /// WebGPU resolves to a handle showing the unsupported overlay.
    pub async fn mount(
        container: HtmlElement,
        props_json: Option<String>,
        on_interaction_start: Option<js_sys::Function>,
    ) -> Result<DeepMatrixVisualization, JsValue> {
        let config = props::parse_props(props_json.as_deref()).map_err(js_err)?;
        let live = LiveParams::new(
            config.behavior.connection_rgb().map_err(js_err)?,
            config.behavior.scale_multiplier,
        );

        let size = dom::container_size(&container).map_err(js_err)?;
        let canvas = dom::create_canvas(&container).map_err(js_err)?;
        let physical = size.physical();
        dom::size_canvas(&canvas, physical);
        log::info!(
            "Canvas: {}x{} CSS, {}x{} physical (DPI: {:.2})",
            size.css().0,
            size.css().1,
            physical.0,
            physical.1,
            size.pixel_ratio()
        );

        let gpu = match gpu::init_gpu(canvas.clone(), physical.0, physical.1).await {
            Ok(gpu) => gpu,
            Err(e) => {
                if e.is_unsupported() {
                    log::warn!("3D unavailable, showing fallback: {e}");
                } else {
                    log::error!("GPU initialization failed, showing fallback: {e}");
                }
                canvas.remove();
                let overlay = dom::show_unsupported(&container).map_err(js_err)?;
                return Ok(Self {
                    mounted: Some(Mounted::Unsupported(overlay)),
                });
            }
        };

        let notifier = InteractionNotifier::new(on_interaction_start);
        match Running::start(config, live, gpu, canvas.clone(), container, size, notifier) {
            Ok(running) => Ok(Self {
                mounted: Some(Mounted::Running(running)),
            }),
            Err(e) => {
                canvas.remove();
                Err(js_err(e))
            }
        }
    }

    /// False when the unsupported overlay is shown instead of the lattice.
    #[wasm_bindgen(js_name = isSupported)]
    pub fn is_supported(&self) -> bool {
        matches!(self.mounted, Some(Mounted::Running(_)))
    }

    /// Change the glow color of active connections. The lattice eases to it.
    #[wasm_bindgen(js_name = setConnectionColor)]
    pub fn set_connection_color(&self, color: &str) -> Result<(), JsValue> {
        let color = Rgb::parse(color).map_err(js_err)?;
        if let Some(running) = self.running() {
            running.live.set_target_color(color);
        }
        Ok(())
    }

    #[wasm_bindgen(js_name = setScaleMultiplier)]
    pub fn set_scale_multiplier(&self, multiplier: f32) {
        if let Some(running) = self.running() {
            running.live.set_scale_multiplier(multiplier);
        }
    }

    /// Apply new props JSON. Structural changes rebuild the lattice.
    pub fn reconfigure(&self, props_json: &str) -> Result<(), JsValue> {
        let config = props::parse_props(Some(props_json)).map_err(js_err)?;
        let Some(running) = self.running() else {
            return Ok(());
        };
        let mut stage = running
            .stage
            .try_borrow_mut()
            .map_err(|_| JsValue::from_str("lattice is busy"))?;
        stage.reconfigure(config).map_err(js_err)
    }

    /// Tear everything down. Safe to call more than once.
    pub fn unmount(&mut self) {
        match self.mounted.take() {
            Some(Mounted::Running(running)) => running.teardown(),
            Some(Mounted::Unsupported(overlay)) => {
                overlay.remove();
                log::info!("Fallback overlay removed");
            }
            None => {}
        }
    }

    /// Props JSON for a built-in preset ("desktop", "mobile", "dormant").
    pub fn preset(name: &str) -> Result<String, JsValue> {
        props::preset_json(name).map_err(js_err)
    }
}

impl DeepMatrixVisualization {
    fn running(&self) -> Option<&Running> {
        match &self.mounted {
            Some(Mounted::Running(running)) => Some(running),
            _ => None,
        }
    }
}

impl Drop for DeepMatrixVisualization {
    fn drop(&mut self) {
        self.unmount();
    }
}

impl Running {
    fn start(
        config: VisualizationConfig,
        live: LiveParams,
        gpu: GpuContext,
        canvas: HtmlCanvasElement,
        container: HtmlElement,
        size: SurfaceSize,
        notifier: InteractionNotifier,
    ) -> Result<Self, MatrixError> {
        let (css_width, css_height) = size.css();
        let sim = Simulation::new(config, live.clone(), css_width, css_height)?;
        let renderer = Renderer::new(&gpu.device, gpu.surface_format, sim.scene());
        let stage = Rc::new(RefCell::new(Stage {
            sim,
            renderer,
            gpu,
            canvas: canvas.clone(),
            container,
            size,
        }));

        let listeners = input::register_listeners(&stage, &canvas, Rc::new(notifier))?;
        let frame_loop = FrameLoop::start(stage.clone())?;
        Ok(Self {
            stage,
            live,
            frame_loop,
            listeners,
        })
    }

    fn teardown(mut self) {
        release_lattice(&mut self);

        // The listener that triggered this unmount may still be on the stack.
        let listeners = std::mem::take(&mut self.listeners);
        wasm_bindgen_futures::spawn_local(async move {
            drop(listeners);
        });
    }

    fn stage_mut(&self) -> Result<RefMut<'_, Stage>, MatrixError> {
        self.stage
            .try_borrow_mut()
            .map_err(|_| MatrixError::Dom("stage borrowed during unmount".into()))
    }
}

impl LatticeResources for Running {
    fn cancel_frames(&mut self) -> Result<(), MatrixError> {
        self.frame_loop.cancel()
    }

    fn detach_listeners(&mut self) -> Vec<(&'static str, Result<(), MatrixError>)> {
        self.listeners
            .iter()
            .map(|listener| (listener.kind(), listener.detach()))
            .collect()
    }

    fn release_frame_callback(&mut self) -> Result<(), MatrixError> {
        self.frame_loop.release()
    }

    fn dispose_renderer(&mut self) -> Result<(), MatrixError> {
        self.stage_mut()?.renderer.dispose();
        Ok(())
    }

    fn lose_context(&mut self) -> Result<(), MatrixError> {
        self.stage_mut()?.gpu.lose_context();
        Ok(())
    }

    fn remove_canvas(&mut self) -> Result<(), MatrixError> {
        self.stage_mut()?.canvas.remove();
        Ok(())
    }
}
