pub mod convert;
pub mod cursor;
pub mod error;
pub mod iff;
pub mod leveldata;
pub mod protracker;
pub mod sjs;

pub use convert::Converter;
pub use error::{Error, Result};
pub use sjs::SjsModule;
