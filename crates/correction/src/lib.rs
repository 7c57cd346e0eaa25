//! Adapter for the external atmospheric/water correction tool.
//!
//! The correction step is a synchronous call into an opaque external
//! process: this crate packages its settings file, invokes it, waits for
//! completion and loads the multi-band L2W result grid. No correction
//! physics lives here.

pub mod error;
pub mod l2w;
pub mod runner;
pub mod settings;

pub use error::{CorrectionError, CorrectionResult};
pub use l2w::read_l2w;
pub use runner::{AcoliteRunner, CorrectionOutput, CorrectionTool};
pub use settings::CorrectionSettings;
