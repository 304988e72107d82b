//! Include/exclude glob filtering for names and paths.
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};

use crate::{error::UpdatebotError, result::Result};

/// Include/exclude glob lists. An empty include list matches everything;
/// exclusions always win.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PatternFilter {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl PatternFilter {
    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }

    /// Compile the globs once so they can be applied to many values.
    pub fn compile(&self) -> Result<CompiledFilter> {
        Ok(CompiledFilter {
            include: build_glob_set(&self.include)?,
            exclude: build_glob_set(&self.exclude)?,
        })
    }
}

/// A [`PatternFilter`] with its globs compiled.
#[derive(Debug, Clone)]
pub struct CompiledFilter {
    include: Option<GlobSet>,
    exclude: Option<GlobSet>,
}

impl CompiledFilter {
    pub fn matches(&self, value: &str) -> bool {
        if let Some(exclude) = &self.exclude
            && exclude.is_match(value)
        {
            return false;
        }

        match &self.include {
            Some(include) => include.is_match(value),
            None => true,
        }
    }
}

/// Build a glob set, returning `None` when there are no patterns.
pub fn build_glob_set<S: AsRef<str>>(patterns: &[S]) -> Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }

    let mut builder = GlobSetBuilder::new();

    for pattern in patterns {
        let glob = Glob::new(pattern.as_ref()).map_err(|e| {
            UpdatebotError::invalid_config(format!(
                "invalid glob {}: {e}",
                pattern.as_ref()
            ))
        })?;
        builder.add(glob);
    }

    let set = builder.build().map_err(|e| {
        UpdatebotError::invalid_config(format!("invalid globs: {e}"))
    })?;

    Ok(Some(set))
}
