use std::cell::{Cell, RefCell};
use std::rc::Rc;

use deepmatrix_core::{MatrixError, VisualizationConfig};
use deepmatrix_render::{FrameUniforms, Renderer};
use deepmatrix_sim::Simulation;
use wasm_bindgen::prelude::*;
use web_sys::{HtmlCanvasElement, HtmlElement};

use crate::dom;
use crate::gpu::GpuContext;
use crate::sizing::SurfaceSize;
use crate::teardown::arm_or_clear;

type RafSlot = RefCell<Option<Closure<dyn FnMut(f64)>>>;
type RafClosure = Rc<RafSlot>;

/// Everything one mounted lattice draws with.
pub struct Stage {
    pub sim: Simulation,
    pub renderer: Renderer,
    pub gpu: GpuContext,
    pub canvas: HtmlCanvasElement,
    pub container: HtmlElement,
    pub size: SurfaceSize,
}

impl Stage {
    /// Step the simulation and draw a single frame.
    pub fn render_frame(&mut self, now_ms: f64) {
        let Self {
            sim,
            renderer,
            gpu,
            size,
            ..
        } = self;

        sim.step(now_ms);
        let colors_dirty = sim.take_color_dirty();
        let frame = FrameUniforms::from_simulation(
            sim,
            (gpu.surface_config.width, gpu.surface_config.height),
            size.pixel_ratio(),
        );
        let line_colors = colors_dirty.then(|| sim.scene().line_colors.as_slice());
        renderer.prepare(&gpu.queue, &frame, sim.point_sizes(), line_colors);

        let output = match gpu.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("Surface lost, reconfiguring");
                gpu.reconfigure();
                return;
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("GPU out of memory");
                return;
            }
            Err(e) => {
                log::warn!("Surface error: {e:?}");
                return;
            }
        };

        let view = output.texture.create_view(&Default::default());
        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("lattice-frame"),
            });
        renderer.render(&mut encoder, &view);
        gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
    }

    /// Follow the container's current size.
    pub fn resize(&mut self) -> Result<(), MatrixError> {
        let size = dom::container_size(&self.container)?;
        if size == self.size {
            return Ok(());
        }
        let physical = size.physical_within(self.gpu.max_dimension());
        dom::size_canvas(&self.canvas, physical);
        self.gpu.resize(physical);
        let (css_width, css_height) = size.css();
        self.sim.resize(css_width, css_height);
        self.size = size;
        log::debug!(
            "Canvas: {}x{} CSS, {}x{} physical (DPI: {:.2})",
            css_width,
            css_height,
            physical.0,
            physical.1,
            size.pixel_ratio()
        );
        Ok(())
    }

    /// Apply new props; geometry is re-uploaded only on a structural rebuild.
    pub fn reconfigure(&mut self, config: VisualizationConfig) -> Result<(), MatrixError> {
        if self.sim.reconfigure(config)? {
            self.renderer.upload_scene(&self.gpu.device, self.sim.scene());
            log::debug!(
                "Geometry uploaded: {} points, {} line vertices",
                self.renderer.point_count(),
                self.renderer.line_vertex_count()
            );
        }
        Ok(())
    }
}

/// Self-rescheduling animation callback with a cancellation flag.
pub struct FrameLoop {
    cancelled: Rc<Cell<bool>>,
    raf_id: Rc<Cell<Option<i32>>>,
    closure: RafClosure,
}

impl FrameLoop {
    pub fn start(stage: Rc<RefCell<Stage>>) -> Result<Self, MatrixError> {
        let cancelled = Rc::new(Cell::new(false));
        let raf_id: Rc<Cell<Option<i32>>> = Rc::new(Cell::new(None));
        let closure: RafClosure = Rc::new(RefCell::new(None));

        let flag = cancelled.clone();
        let id = raf_id.clone();
        let closure_clone = closure.clone();
        *closure.borrow_mut() = Some(Closure::wrap(Box::new(move |timestamp: f64| {
            // Frames already queued when the lattice unmounts must do nothing.
            if flag.get() {
                return;
            }
            match stage.try_borrow_mut() {
                Ok(mut stage) => stage.render_frame(timestamp),
                Err(_) => log::debug!("Stage busy, skipping frame"),
            }
            if flag.get() {
                return;
            }
            match schedule(&closure_clone) {
                Ok(next) => id.set(Some(next)),
                Err(e) => log::error!("Frame loop stopped: {e}"),
            }
        }) as Box<dyn FnMut(f64)>));

        raf_id.set(Some(arm_or_clear(&closure, schedule)?));
        Ok(Self {
            cancelled,
            raf_id,
            closure,
        })
    }

    /// Stop the loop. The pending frame is cancelled and any frame that still
    /// runs sees the flag first.
    pub fn cancel(&self) -> Result<(), MatrixError> {
        self.cancelled.set(true);
        match self.raf_id.take() {
            Some(id) => dom::window()?
                .cancel_animation_frame(id)
                .map_err(dom::dom_err),
            None => Ok(()),
        }
    }

    /// Drop the callback, breaking its reference to itself.
    pub fn release(&self) -> Result<(), MatrixError> {
        self.closure
            .try_borrow_mut()
            .map_err(|_| MatrixError::Dom("frame callback is running".into()))?
            .take();
        Ok(())
    }
}

fn schedule(closure: &RafSlot) -> Result<i32, MatrixError> {
    let borrowed = closure.borrow();
    let callback = borrowed
        .as_ref()
        .ok_or_else(|| MatrixError::Dom("rAF closure missing".into()))?;
    dom::window()?
        .request_animation_frame(callback.as_ref().unchecked_ref())
        .map_err(dom::dom_err)
}
