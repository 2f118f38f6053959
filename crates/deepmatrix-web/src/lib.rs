//! Browser embedding of the token lattice.
//!
//! Props parsing, canvas sizing and teardown sequencing are platform-independent
//! and compiled everywhere. DOM, GPU and the frame loop exist only on wasm32.

pub mod props;
pub mod sizing;
pub mod teardown;

#[cfg(target_arch = "wasm32")]
mod app;
#[cfg(target_arch = "wasm32")]
mod dom;
#[cfg(target_arch = "wasm32")]
mod gpu;
#[cfg(target_arch = "wasm32")]
mod handle;
#[cfg(target_arch = "wasm32")]
mod input;

pub use props::{parse_props, preset_json};
pub use sizing::SurfaceSize;
pub use teardown::{release_lattice, LatticeResources, Teardown, TeardownReport};

#[cfg(target_arch = "wasm32")]
pub use handle::DeepMatrixVisualization;

/// WASM entry point. Sets the panic hook and initializes logging; the page
/// mounts lattices through [`DeepMatrixVisualization::mount`].
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).expect("logger init failed");
    log::info!("Deep Matrix module loaded");
}
