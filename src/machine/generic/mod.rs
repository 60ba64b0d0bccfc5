pub mod delay;
pub mod driver;
pub mod hal;
pub mod pattern;
pub mod phase;
pub mod timing;
