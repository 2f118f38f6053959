pub mod activation;
pub mod camera;
pub mod cells;
pub mod glow;
pub mod interaction;
pub mod motion;
pub mod pulse;
pub mod scene;
pub mod simulation;

#[cfg(test)]
mod test_harness;

pub use camera::{LatticeCamera, ViewportBounds};
pub use cells::LiveParams;
pub use glow::FrameVisuals;
pub use interaction::{Cursor, InteractionResponse, PointerCapture, PointerSample};
pub use scene::{Connection, LatticeScene};
pub use simulation::Simulation;
