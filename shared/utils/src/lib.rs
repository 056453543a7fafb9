pub mod config;
pub mod logging;
pub mod error;
pub mod validation;
pub mod text;
pub mod sheet;
pub mod grading;
pub mod layout;
pub mod placeholders;

pub use config::*;
pub use logging::*;
pub use error::*;
pub use validation::*;
pub use text::*;
pub use sheet::{SheetGrid, StudentSheetReader};
pub use grading::*;
pub use layout::{LayoutRegistry, LayoutSignal};
pub use placeholders::build_placeholders;
