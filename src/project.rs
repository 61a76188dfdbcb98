use crate::{
    config::{PreprocessConfig, ProjectPathsConfig, DEFAULT_SOLC_VERSION},
    error::{PreprocessError, Result},
    remappings::Remappings,
    transform::LineTransformer,
    utils,
};
use rayon::prelude::*;
use semver::Version;
use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

/// Rewrites every solidity source of a project line by line and writes the result into the
/// cache dir.
///
/// # Example
///
/// ```no_run
/// use ethers_preprocess::{Preprocessor, ProjectPathsConfig};
/// let paths = ProjectPathsConfig::hardhat("./").unwrap();
/// let output = Preprocessor::new(paths).unwrap().run().unwrap();
/// println!("{output}");
/// ```
#[derive(Debug)]
pub struct Preprocessor<T: LineTransformer = Remappings> {
    /// The layout of the project
    pub paths: ProjectPathsConfig,
    /// The compiler version the sources are preprocessed for
    pub solc: Version,
    /// Applied to every line of every source
    pub transformer: T,
}

impl Preprocessor {
    /// Loads the remappings file of the project.
    ///
    /// Fails with [`PreprocessError::ResourceNotFound`] if the remappings file does not exist.
    pub fn new(paths: ProjectPathsConfig) -> Result<Self> {
        let remappings = Remappings::read(&paths.remappings)?;
        Ok(Self::with_transformer(paths, remappings))
    }

    /// Resolves the paths of the config and loads the remappings
    pub fn from_config(config: &PreprocessConfig) -> Result<Self> {
        let paths = config.project_paths()?;
        Ok(Self::new(paths)?.solc(config.solc.clone()))
    }

    /// The loaded remappings table
    pub fn remappings(&self) -> &Remappings {
        &self.transformer
    }
}

impl<T: LineTransformer> Preprocessor<T> {
    /// this is a heuristically measured threshold at which we can generally expect a speedup by
    /// using rayon's `par_iter`
    pub const NUM_PAR: usize = 8;

    pub fn with_transformer(paths: ProjectPathsConfig, transformer: T) -> Self {
        Self { paths, solc: DEFAULT_SOLC_VERSION, transformer }
    }

    pub fn solc(mut self, solc: Version) -> Self {
        self.solc = solc;
        self
    }

    /// Transforms every line of the given source.
    ///
    /// Lines are split on `\n` and joined back with `\n`, so `\r\n` endings and a trailing
    /// newline are kept as they are. Returns the new content and the number of rewritten lines.
    pub fn preprocess_source(&self, content: &str) -> (String, usize) {
        let mut out = String::with_capacity(content.len());
        let mut rewritten = 0;
        for (idx, line) in content.split('\n').enumerate() {
            if idx > 0 {
                out.push('\n');
            }
            let transformed = self.transformer.transform(line);
            if transformed != line {
                rewritten += 1;
            }
            out.push_str(&transformed);
        }
        (out, rewritten)
    }

    /// Reads the source file, transforms it and writes it to its location in the cache dir
    pub fn preprocess_file(&self, source: impl AsRef<Path>) -> Result<PreprocessedSource> {
        let source = source.as_ref();
        let content =
            fs::read_to_string(source).map_err(|err| PreprocessError::io(err, source))?;
        let (content, rewritten_lines) = self.preprocess_source(&content);

        let target = self.paths.cache_path(source)?;
        utils::create_parent_dir_all(&target)?;
        fs::write(&target, content).map_err(|err| PreprocessError::io(err, &target))?;
        tracing::debug!(
            "preprocessed {} -> {} ({} rewritten)",
            source.display(),
            target.display(),
            rewritten_lines
        );
        Ok(PreprocessedSource { source: source.to_path_buf(), target, rewritten_lines })
    }

    /// Preprocesses all solidity files under the sources dir, a cache dir nested inside the
    /// sources is skipped.
    ///
    /// Any error aborts the run. Fails before touching any file if the cache dir contains the
    /// sources dir.
    pub fn run(&self) -> Result<PreprocessOutput> {
        self.paths.ensure_cache_outside_sources()?;
        let files = utils::source_files_excluding(&self.paths.sources, &self.paths.cache)?;
        tracing::trace!(
            "preprocessing {} sources in {}",
            files.len(),
            self.paths.sources.display()
        );

        let sources = if files.len() < Self::NUM_PAR {
            files.iter().map(|file| self.preprocess_file(file)).collect::<Result<Vec<_>>>()?
        } else {
            files.par_iter().map(|file| self.preprocess_file(file)).collect::<Result<Vec<_>>>()?
        };
        Ok(PreprocessOutput { solc: self.solc.clone(), sources })
    }
}

/// A single preprocessed file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreprocessedSource {
    pub source: PathBuf,
    /// Where the preprocessed content was written
    pub target: PathBuf,
    pub rewritten_lines: usize,
}

/// The result of [`Preprocessor::run`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreprocessOutput {
    pub solc: Version,
    /// All preprocessed files, ordered by source path
    pub sources: Vec<PreprocessedSource>,
}

impl PreprocessOutput {
    /// Total number of rewritten lines across all sources
    pub fn rewritten_lines(&self) -> usize {
        self.sources.iter().map(|s| s.rewritten_lines).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl fmt::Display for PreprocessOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Preprocessed {} sources for solc {} ({} imports remapped)",
            self.sources.len(),
            self.solc,
            self.rewritten_lines()
        )
    }
}
