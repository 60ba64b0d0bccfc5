pub mod dump;
pub mod logging;
pub mod screen;
