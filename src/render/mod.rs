//! External document rendering

mod pandoc;

pub use pandoc::PandocRenderer;
