mod display_manager;
mod settings_manager;

pub use display_manager::*;
pub use settings_manager::SettingsManager;
