use crate::{
    error::{PreprocessError, Result},
    utils,
};
use semver::Version;
use serde::{Deserialize, Serialize};
use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

/// Default name of the json config file in the project root
pub const PREPROCESS_CONFIG_FILENAME: &str = "preprocess.json";

/// Default compiler version
pub const DEFAULT_SOLC_VERSION: Version = Version::new(0, 8, 19);

const SOURCES_DIR: &str = "contracts";
const CACHE_DIR: &str = "cache/hardhat";
const REMAPPINGS_FILE: &str = "remappings.txt";

/// Where to find all files or where to write them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPathsConfig {
    /// Project root
    pub root: PathBuf,
    /// Where to write the preprocessed sources
    pub cache: PathBuf,
    /// Where to find sources
    pub sources: PathBuf,
    /// The remappings file
    pub remappings: PathBuf,
}

impl ProjectPathsConfig {
    pub fn builder() -> ProjectPathsConfigBuilder {
        ProjectPathsConfigBuilder::default()
    }

    /// Creates a new hardhat style config instance which points to the canonicalized root path
    pub fn hardhat(root: impl AsRef<Path>) -> Result<Self> {
        Self::builder().build_with_root(root)
    }

    /// Same as [`Self::hardhat`] but uses the current working directory as root
    pub fn current_hardhat() -> Result<Self> {
        let root = std::env::current_dir().map_err(|err| PreprocessError::io(err, "."))?;
        Self::hardhat(root)
    }

    /// Returns the path of the preprocessed file for the given source file, which keeps its path
    /// relative to the sources dir.
    ///
    /// Fails if the file is not inside the sources dir.
    pub fn cache_path(&self, source: impl AsRef<Path>) -> Result<PathBuf> {
        let source = source.as_ref();
        let relative = source.strip_prefix(&self.sources).map_err(|_| {
            PreprocessError::msg(format!(
                "source \"{}\" is not inside the sources dir \"{}\"",
                source.display(),
                self.sources.display()
            ))
        })?;
        Ok(self.cache.join(relative))
    }

    /// Ensures that preprocessing can't write over the sources.
    ///
    /// The cache dir may be nested inside the sources dir (it is skipped when collecting
    /// sources), but it must not be the sources dir or one of its ancestors.
    pub fn ensure_cache_outside_sources(&self) -> Result<()> {
        if self.sources.starts_with(&self.cache) {
            return Err(PreprocessError::msg(format!(
                "cache dir \"{}\" must not contain the sources dir \"{}\"",
                self.cache.display(),
                self.sources.display()
            )))
        }
        Ok(())
    }
}

impl fmt::Display for ProjectPathsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "root: {}", self.root.display())?;
        writeln!(f, "sources: {}", self.sources.display())?;
        writeln!(f, "cache: {}", self.cache.display())?;
        writeln!(f, "remappings: {}", self.remappings.display())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectPathsConfigBuilder {
    #[serde(skip_serializing_if = "Option::is_none")]
    root: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cache: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sources: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    remappings: Option<PathBuf>,
}

impl ProjectPathsConfigBuilder {
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    pub fn cache(mut self, cache: impl Into<PathBuf>) -> Self {
        self.cache = Some(cache.into());
        self
    }

    pub fn sources(mut self, sources: impl Into<PathBuf>) -> Self {
        self.sources = Some(sources.into());
        self
    }

    pub fn remappings(mut self, remappings: impl Into<PathBuf>) -> Self {
        self.remappings = Some(remappings.into());
        self
    }

    /// Overrides every path that is set in `other`
    pub fn merge(mut self, other: ProjectPathsConfigBuilder) -> Self {
        self.root = other.root.or(self.root);
        self.cache = other.cache.or(self.cache);
        self.sources = other.sources.or(self.sources);
        self.remappings = other.remappings.or(self.remappings);
        self
    }

    /// Builds the config with the given root, relative paths are joined onto the canonicalized
    /// root.
    pub fn build_with_root(self, root: impl AsRef<Path>) -> Result<ProjectPathsConfig> {
        let root = utils::canonicalize(root)?;
        let resolve = |path: Option<PathBuf>, default: &str| {
            let path = path.unwrap_or_else(|| PathBuf::from(default));
            if path.is_absolute() {
                path
            } else {
                root.join(path)
            }
        };
        let paths = ProjectPathsConfig {
            cache: resolve(self.cache, CACHE_DIR),
            sources: resolve(self.sources, SOURCES_DIR),
            remappings: resolve(self.remappings, REMAPPINGS_FILE),
            root,
        };
        paths.ensure_cache_outside_sources()?;
        Ok(paths)
    }

    /// Builds the config, falls back to the current working directory if no root is set
    pub fn build(mut self) -> Result<ProjectPathsConfig> {
        let root = match self.root.take() {
            Some(root) => root,
            None => std::env::current_dir().map_err(|err| PreprocessError::io(err, "."))?,
        };
        self.build_with_root(root)
    }
}

/// The preprocessing configuration as it is stored in `preprocess.json`
///
/// ```json
/// {
///   "solc": "0.8.19",
///   "paths": {
///     "sources": "contracts",
///     "cache": "cache/hardhat",
///     "remappings": "remappings.txt"
///   }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// The compiler version the preprocessed sources are meant for
    pub solc: Version,
    pub paths: ProjectPathsConfigBuilder,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self { solc: DEFAULT_SOLC_VERSION, paths: ProjectPathsConfigBuilder::default() }
    }
}

impl PreprocessConfig {
    /// Reads the json config file at the given path
    ///
    /// If the file sets no root, paths in the file are relative to the directory containing it.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        tracing::trace!("reading config from {}", path.display());
        let content = fs::read_to_string(path).map_err(|err| PreprocessError::io(err, path))?;
        let mut config: Self = serde_json::from_str(&content)?;
        if config.paths.root.is_none() {
            let dir = path.parent().filter(|dir| !dir.as_os_str().is_empty());
            config.paths.root = Some(dir.unwrap_or_else(|| Path::new(".")).to_path_buf());
        }
        Ok(config)
    }

    /// Reads `preprocess.json` from the root if it exists, otherwise returns the default config
    /// with `root` as project root
    pub fn load(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let file = root.join(PREPROCESS_CONFIG_FILENAME);
        if file.is_file() {
            return Self::read(&file)
        }
        tracing::trace!("no config file at {}, using defaults", file.display());
        let mut config = Self::default();
        config.paths.root = Some(root.to_path_buf());
        Ok(config)
    }

    /// Sets the compiler version from a version string like `0.8.19`
    pub fn with_solc_version(mut self, version: &str) -> Result<Self> {
        self.solc = Version::parse(version.trim_start_matches('v'))?;
        Ok(self)
    }

    /// Resolves all paths
    pub fn project_paths(&self) -> Result<ProjectPathsConfig> {
        self.paths.clone().build()
    }

    /// Writes the config as pretty json
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        utils::create_parent_dir_all(path)?;
        let json = serde_json::to_vec_pretty(self)?;
        fs::write(path, json).map_err(|err| PreprocessError::io(err, path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hardhat_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let root = utils::canonicalize(tmp.path()).unwrap();
        let paths = ProjectPathsConfig::hardhat(&root).unwrap();
        assert_eq!(paths.sources, root.join("contracts"));
        assert_eq!(paths.cache, root.join("cache").join("hardhat"));
        assert_eq!(paths.remappings, root.join("remappings.txt"));
        assert_eq!(paths.root, root);
    }

    #[test]
    fn keeps_absolute_paths() {
        let tmp = tempfile::tempdir().unwrap();
        let other = tempfile::tempdir().unwrap();
        let paths = ProjectPathsConfig::builder()
            .sources("src")
            .cache(other.path())
            .build_with_root(tmp.path())
            .unwrap();
        assert_eq!(paths.cache, other.path());
        assert!(paths.sources.ends_with("src"));
    }

    #[test]
    fn maps_sources_into_cache() {
        let paths = ProjectPathsConfig {
            root: "/p".into(),
            cache: "/p/cache".into(),
            sources: "/p/contracts".into(),
            remappings: "/p/remappings.txt".into(),
        };
        assert_eq!(
            paths.cache_path("/p/contracts/token/Token.sol").unwrap(),
            PathBuf::from("/p/cache/token/Token.sol")
        );
        let err = paths.cache_path("/elsewhere/Lib.sol").unwrap_err();
        assert!(matches!(err, PreprocessError::Message(_)));
    }

    #[test]
    fn rejects_cache_containing_sources() {
        let tmp = tempfile::tempdir().unwrap();
        let err = ProjectPathsConfig::builder()
            .sources("contracts")
            .cache("contracts")
            .build_with_root(tmp.path())
            .unwrap_err();
        assert!(matches!(err, PreprocessError::Message(_)));

        let err = ProjectPathsConfig::builder().cache(".").build_with_root(tmp.path()).unwrap_err();
        assert!(matches!(err, PreprocessError::Message(_)));

        // a cache nested inside the sources is fine
        let paths = ProjectPathsConfig::builder().sources(".").build_with_root(tmp.path()).unwrap();
        assert!(paths.cache.starts_with(&paths.sources));
    }

    #[test]
    fn merge_overrides_only_set_paths() {
        let file = ProjectPathsConfigBuilder::default()
            .root("/p")
            .sources("src")
            .cache("out")
            .remappings("remappings.txt");
        let flags = ProjectPathsConfigBuilder::default().sources("contracts");
        let merged = file.merge(flags);
        assert_eq!(
            merged,
            ProjectPathsConfigBuilder::default()
                .root("/p")
                .sources("contracts")
                .cache("out")
                .remappings("remappings.txt")
        );

        let unchanged = merged.clone().merge(ProjectPathsConfigBuilder::default());
        assert_eq!(unchanged, merged);
    }

    #[test]
    fn can_parse_config_with_defaults() {
        let config: PreprocessConfig =
            serde_json::from_str(r#"{"paths":{"sources":"src"}}"#).unwrap();
        assert_eq!(config.solc, DEFAULT_SOLC_VERSION);
        assert_eq!(config.paths, ProjectPathsConfigBuilder::default().sources("src"));

        let config: PreprocessConfig = serde_json::from_str(r#"{"solc":"0.7.6"}"#).unwrap();
        assert_eq!(config.solc, Version::new(0, 7, 6));
        assert_eq!(config.paths, ProjectPathsConfigBuilder::default());
    }

    #[test]
    fn rejects_invalid_version() {
        let err = PreprocessConfig::default().with_solc_version("0.8").unwrap_err();
        assert!(matches!(err, PreprocessError::SemverError(_)));
        let config = PreprocessConfig::default().with_solc_version("v0.8.20").unwrap();
        assert_eq!(config.solc, Version::new(0, 8, 20));
    }

    #[test]
    fn can_load_config_file() {
        let tmp = tempfile::tempdir().unwrap();
        let config = PreprocessConfig::default()
            .with_solc_version("0.8.17")
            .unwrap();
        let config = PreprocessConfig { paths: config.paths.clone().cache("out"), ..config };
        config.write(tmp.path().join(PREPROCESS_CONFIG_FILENAME)).unwrap();

        let loaded = PreprocessConfig::load(tmp.path()).unwrap();
        assert_eq!(loaded.solc, Version::new(0, 8, 17));
        let paths = loaded.project_paths().unwrap();
        let root = utils::canonicalize(tmp.path()).unwrap();
        assert_eq!(paths.cache, root.join("out"));
        assert_eq!(paths.sources, root.join("contracts"));
    }

    #[test]
    fn load_without_file_uses_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let config = PreprocessConfig::load(tmp.path()).unwrap();
        assert_eq!(config.solc, DEFAULT_SOLC_VERSION);
        assert_eq!(config.paths, ProjectPathsConfigBuilder::default().root(tmp.path()));
    }
}
