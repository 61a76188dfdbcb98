//! Per-line source transformations

use crate::{remappings::Remappings, utils};
use std::borrow::Cow;

/// Transforms a single line of source text.
///
/// Implementers must be pure: the output may only depend on the line and on the transformer
/// itself, so the same transformer can be shared across threads and applied to lines in any
/// order.
pub trait LineTransformer: Send + Sync {
    /// Returns the transformed line, [`Cow::Borrowed`] if the line is unchanged
    fn transform<'a>(&self, line: &'a str) -> Cow<'a, str>;
}

impl LineTransformer for Remappings {
    /// Rewrites the import path of an import line.
    ///
    /// Only lines that start with an `import ` statement (see [`utils::RE_IMPORT_LINE`]) are
    /// considered. The first remapping whose `from` occurs in the line is applied once, no other
    /// remapping is tried afterwards.
    fn transform<'a>(&self, line: &'a str) -> Cow<'a, str> {
        if !utils::is_import_line(line) {
            return Cow::Borrowed(line)
        }
        match self.find(line).and_then(|remapping| remapping.apply(line)) {
            Some(remapped) => {
                tracing::trace!("remapped import `{}` to `{}`", line.trim(), remapped.trim());
                Cow::Owned(remapped)
            }
            None => Cow::Borrowed(line),
        }
    }
}

impl<T: LineTransformer + ?Sized> LineTransformer for &T {
    fn transform<'a>(&self, line: &'a str) -> Cow<'a, str> {
        (**self).transform(line)
    }
}

impl<T: LineTransformer + ?Sized> LineTransformer for Box<T> {
    fn transform<'a>(&self, line: &'a str) -> Cow<'a, str> {
        (**self).transform(line)
    }
}
