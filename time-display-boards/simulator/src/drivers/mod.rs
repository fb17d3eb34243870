mod clock;
mod font_loader;
mod surface;

pub use clock::WallClock;
pub use font_loader::SimulatedFontLoader;
pub use surface::{SimulatedSurface, set_container};
