#[macro_use]
extern crate lazy_static;

#[macro_use]
pub mod log;
pub mod common;
pub mod error;
pub mod device;
pub mod topology;
pub mod exporter;
#[cfg(feature = "interchange")]
pub mod ic_loader;
