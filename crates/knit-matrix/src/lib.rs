//! Build matrix derivation for JavaScript and TypeScript packages.
//!
//! Given a package root, [`build_matrix`] reads the entry fields of
//! `package.json` (`main`, `module`, `types`, `exports`, `bin`), maps each
//! output pattern back to the sources under `compilerOptions.rootDir`, and
//! returns one [`BuildTask`] per output file together with a frozen
//! [`ExportRegistry`] of which source produces which output.
//!
//! During bundling, a [`ResolutionPolicy`] built from the same registry decides
//! whether an import stays inside the current task or points at another
//! task's output, and whether a bare package import is external or bundled.
//!
//! ```no_run
//! use knit_config::Project;
//! use knit_matrix::{MatrixOptions, build_matrix};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let project = Project::load(".")?;
//! let matrix = build_matrix(&project, &MatrixOptions::default()).await?;
//! for task in &matrix.tasks {
//!     println!("{}", task.label());
//! }
//! # Ok(())
//! # }
//! ```

pub mod deps;
pub mod error;
pub mod exports;
pub mod matrix;
pub mod policy;
pub mod registry;
pub mod source;
pub mod task;

pub use deps::{Decision, DependencyClassifier, DependencyKind};
pub use error::{MatrixError, Result, UndeclaredDependencyError};
pub use exports::{ExportResolver, ResolvedExports};
pub use matrix::{BuildMatrix, MatrixOptions, build_matrix};
pub use policy::{Resolution, ResolutionPolicy};
pub use registry::{ExportRegistry, RegistrySlot};
pub use task::{BuildTask, EntryTarget, ModuleFormat, Platform, ResolvedEntry};
