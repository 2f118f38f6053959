use std::cell::RefCell;
use std::fmt::Display;

use deepmatrix_core::MatrixError;

/// Outcome of a teardown run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TeardownReport {
    pub completed: Vec<&'static str>,
    pub failed: Vec<(&'static str, String)>,
}

impl TeardownReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Runs disposal steps in order. A failing step is logged and recorded,
/// and the remaining steps still run.
#[derive(Debug)]
pub struct Teardown {
    label: &'static str,
    report: TeardownReport,
}

impl Teardown {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            report: TeardownReport::default(),
        }
    }

    pub fn step<E: Display>(&mut self, name: &'static str, f: impl FnOnce() -> Result<(), E>) {
        match f() {
            Ok(()) => self.report.completed.push(name),
            Err(e) => {
                log::warn!("{} teardown: {name} failed: {e}", self.label);
                self.report.failed.push((name, e.to_string()));
            }
        }
    }

    pub fn finish(self) -> TeardownReport {
        if self.report.is_clean() {
            log::info!("{} torn down ({} steps)", self.label, self.report.completed.len());
        } else {
            log::info!(
                "{} torn down with {} of {} steps failing",
                self.label,
                self.report.failed.len(),
                self.report.completed.len() + self.report.failed.len()
            );
        }
        self.report
    }
}

/// Call `arm` with a callback slot that was just filled. When it fails the
/// slot is emptied, so a callback that captured its own slot is dropped
/// instead of keeping itself alive.
pub fn arm_or_clear<T, R, E>(
    slot: &RefCell<Option<T>>,
    arm: impl FnOnce(&RefCell<Option<T>>) -> Result<R, E>,
) -> Result<R, E> {
    let result = arm(slot);
    if result.is_err() {
        slot.borrow_mut().take();
    }
    result
}

/// What a mounted lattice holds that must be given back to the page and the GPU.
/// Every method must tolerate being called again after it already ran.
pub trait LatticeResources {
    fn cancel_frames(&mut self) -> Result<(), MatrixError>;
    /// Remove each page listener, one result per listener tagged by event name.
    fn detach_listeners(&mut self) -> Vec<(&'static str, Result<(), MatrixError>)>;
    fn release_frame_callback(&mut self) -> Result<(), MatrixError>;
    fn dispose_renderer(&mut self) -> Result<(), MatrixError>;
    fn lose_context(&mut self) -> Result<(), MatrixError>;
    fn remove_canvas(&mut self) -> Result<(), MatrixError>;
}

/// Release everything in mount-reverse order: stop frames, detach input,
/// free GPU resources, then drop the canvas from the page.
pub fn release_lattice(resources: &mut impl LatticeResources) -> TeardownReport {
    let mut teardown = Teardown::new("Lattice");
    teardown.step("cancel frame loop", || resources.cancel_frames());
    for (kind, result) in resources.detach_listeners() {
        teardown.step(kind, || result);
    }
    teardown.step("release frame callback", || resources.release_frame_callback());
    teardown.step("dispose renderer", || resources.dispose_renderer());
    teardown.step("lose context", || resources.lose_context());
    teardown.step("remove canvas", || resources.remove_canvas());
    teardown.finish()
}
