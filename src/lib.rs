pub mod demo;
pub mod error;
pub mod net;
pub mod proto;
pub mod trace;
pub mod wire;

pub use error::{Error, Result};

#[cfg(test)]
mod test;
