pub mod font_loader;
pub mod render_target;
pub mod time_source;

pub use font_loader::*;
pub use render_target::*;
pub use time_source::*;
