pub mod fit_service;
pub mod time_service;

pub use fit_service::*;
pub use time_service::*;
