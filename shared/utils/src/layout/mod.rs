//! Layout configuration: loading and resolution.

pub mod registry;
pub mod resolver;

pub use registry::LayoutRegistry;
pub use resolver::LayoutSignal;
