mod check;
mod config;
mod control;
mod ls;
mod services;

pub use check::check;
pub use config::config;
pub use control::{restart, stop};
pub use ls::ls;
pub use services::{services, ServicesArgs};
