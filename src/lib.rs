#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![allow(clippy::module_inception)]

pub mod compiler;
pub mod config;
pub mod extract;
pub mod manifest;
pub mod models;
pub mod module_resolver;
pub mod paths;
pub mod pipeline;
pub mod resources;

pub use compiler::{CompileError, CompileResult, ManifestCompiler};
pub use config::CompilerConfig;
pub use models::{CachePageRule, ManifestState, ResourceBundle, ResourceCategory};
pub use module_resolver::{AmdModuleResolver, ModuleResolver};
pub use pipeline::{FileInfo, ProcessContext, Processor, run_processor};
