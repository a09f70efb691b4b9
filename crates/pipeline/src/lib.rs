//! Ordered file verification over a resolved scan target.
//!
//! A scan moves through four stages:
//!
//! 1. **Resolution**: [`InputSet`] turns a directory, single file or zip
//!    archive into a flat list of files, extracting archives into a
//!    temporary directory it owns.
//! 2. **Verification**: the [`Pipeline`] runs each enabled [`Step`] in
//!    order. Steps classify files as valid or invalid through a [`Report`].
//! 3. **Aggregation**: every step's verdicts are folded into a
//!    [`ScanResult`]; the latest verdict per file wins.
//! 4. **Cleanup**: the temporary directory, if any, is removed.
//!
//! ```no_run
//! use verifile_pipeline::{Pipeline, ResponseCode, ScanSession, Step};
//!
//! let mut pipeline = Pipeline::new().with_step(
//!     Step::filtered_fn("no-executables", [".exe"], |path, report| report.invalid(path, "executable"))
//!         .with_error_class(ResponseCode::Extension),
//! );
//! let result = pipeline.scan(&ScanSession::new("/srv/uploads/batch.zip"))?;
//! println!("{}", result.render(verifile_pipeline::Verbosity::Verbose));
//! # Ok::<(), verifile_pipeline::error::Error>(())
//! ```

mod code;
pub mod error;
mod input;
mod pipeline;
mod result;
mod session;
mod step;

pub use crate::code::ResponseCode;
pub use crate::input::{InputKind, InputSet, TEMP_DIR_PREFIX};
pub use crate::pipeline::Pipeline;
pub use crate::result::ScanResult;
pub use crate::session::{ScanContext, ScanSession};
pub use crate::step::{CheckFile, FilteredStep, Phase, Report, Step, StepSummary, Verify};
pub use verifile_config::{Config, Verbosity};
