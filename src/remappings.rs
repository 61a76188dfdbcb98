use crate::error::{PreprocessError, Result};
use serde::{Deserialize, Serialize};
use std::{fmt, fs, path::Path, slice, str::FromStr};

/// Solidity files can only import what the compiler can find on disk, so imports of vendored
/// or relocated libraries have to be redirected before compilation.
///
/// A `Remapping` is a plain textual substitution applied to import lines: the first occurrence
/// of `from` is replaced with `to`.
///
/// The format is `from=to`, for example
///
/// ```text
/// @openzeppelin/=lib/openzeppelin-contracts/
/// ```
///
/// Only the first `=` separates the two parts, everything after it belongs to `to`.
#[derive(Clone, Debug, PartialEq, PartialOrd, Eq, Ord, Hash)]
pub struct Remapping {
    pub from: String,
    pub to: String,
}

impl Remapping {
    /// Creates a remapping without validating it, unlike parsing.
    ///
    /// A remapping with an empty `from` never matches.
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self { from: from.into(), to: to.into() }
    }

    /// Returns true if `from` occurs in the line
    pub fn matches(&self, line: &str) -> bool {
        !self.from.is_empty() && line.contains(self.from.as_str())
    }

    /// Replaces the first occurrence of `from` in the given line, if any
    pub fn apply(&self, line: &str) -> Option<String> {
        self.matches(line).then(|| line.replacen(self.from.as_str(), &self.to, 1))
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum RemappingError {
    #[error("invalid remapping format, found `{0}`, expected `<from>=<to>`")]
    MalformedEntry(String),
    #[error("remapping key can't be empty, found `{0}`, expected `<from>=<to>`")]
    EmptyFrom(String),
    #[error("invalid remapping on line {line}: {source}")]
    InvalidLine { line: usize, source: Box<RemappingError> },
}

impl RemappingError {
    /// Returns the 1-based line number if the error came from a remappings file
    pub fn line(&self) -> Option<usize> {
        match self {
            RemappingError::InvalidLine { line, .. } => Some(*line),
            _ => None,
        }
    }
}

impl FromStr for Remapping {
    type Err = RemappingError;

    fn from_str(remapping: &str) -> std::result::Result<Self, Self::Err> {
        let (from, to) = remapping
            .split_once('=')
            .ok_or_else(|| RemappingError::MalformedEntry(remapping.to_string()))?;
        if from.is_empty() {
            return Err(RemappingError::EmptyFrom(remapping.to_string()))
        }
        Ok(Remapping::new(from, to))
    }
}

impl Serialize for Remapping {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Remapping {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::de::Deserializer<'de>,
    {
        let remapping = String::deserialize(deserializer)?;
        Remapping::from_str(&remapping).map_err(serde::de::Error::custom)
    }
}

// Remappings are printed as `from=to`
impl fmt::Display for Remapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.from, self.to)
    }
}

/// An ordered table of [`Remapping`]s.
///
/// The order is the order of the remappings file and decides which entry wins if more than one
/// `from` occurs in a line. Duplicates are kept.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Remappings(Vec<Remapping>);

impl Remappings {
    /// Reads and parses the remappings file at the given path
    ///
    /// Fails with [`PreprocessError::ResourceNotFound`] if the file does not exist.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use ethers_preprocess::Remappings;
    /// let remappings = Remappings::read("remappings.txt").unwrap();
    /// ```
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        tracing::trace!("reading remappings from {}", path.display());
        let content = fs::read_to_string(path).map_err(|err| PreprocessError::resource(err, path))?;
        let remappings: Remappings = content.parse()?;
        tracing::debug!("loaded {} remappings from {}", remappings.len(), path.display());
        Ok(remappings)
    }

    /// Returns the first remapping whose `from` occurs in the line
    pub fn find(&self, line: &str) -> Option<&Remapping> {
        self.0.iter().find(|r| r.matches(line))
    }

    pub fn iter(&self) -> slice::Iter<'_, Remapping> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<Remapping> {
        self.0
    }
}

impl FromStr for Remappings {
    type Err = RemappingError;

    /// Parses a remappings file: one `from=to` per line, blank lines are skipped, every other
    /// line is trimmed and must contain a `=`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.split('\n')
            .enumerate()
            .map(|(idx, line)| (idx + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty())
            .map(|(line, entry)| {
                entry.parse::<Remapping>().map_err(|err| RemappingError::InvalidLine {
                    line,
                    source: Box::new(err),
                })
            })
            .collect::<std::result::Result<Vec<_>, _>>()
            .map(Remappings)
    }
}

impl fmt::Display for Remappings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for remapping in &self.0 {
            writeln!(f, "{remapping}")?;
        }
        Ok(())
    }
}

impl From<Vec<Remapping>> for Remappings {
    fn from(remappings: Vec<Remapping>) -> Self {
        Remappings(remappings)
    }
}

impl FromIterator<Remapping> for Remappings {
    fn from_iter<I: IntoIterator<Item = Remapping>>(iter: I) -> Self {
        Remappings(iter.into_iter().collect())
    }
}

impl IntoIterator for Remappings {
    type Item = Remapping;
    type IntoIter = std::vec::IntoIter<Remapping>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Remappings {
    type Item = &'a Remapping;
    type IntoIter = slice::Iter<'a, Remapping>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
