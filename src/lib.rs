#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod remappings;
pub use remappings::{Remapping, RemappingError, Remappings};

pub mod transform;
pub use transform::LineTransformer;

mod config;
pub use config::{
    PreprocessConfig, ProjectPathsConfig, ProjectPathsConfigBuilder, DEFAULT_SOLC_VERSION,
    PREPROCESS_CONFIG_FILENAME,
};

mod project;
pub use project::{PreprocessOutput, PreprocessedSource, Preprocessor};

pub mod error;
pub use error::{PreprocessError, PreprocessIoError};

pub mod utils;
