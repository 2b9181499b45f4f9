//! Fixed-order name tables.
//!
//! States and controls live in plain vectors; a `NameMap` gives model authors
//! named access into them without any runtime symbol binding.

use crate::{DcError, DcResult, Real};

/// Ordered list of component names with index lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NameMap {
    names: Vec<String>,
}

impl NameMap {
    /// Build from names; duplicates are rejected.
    pub fn new<I, S>(names: I) -> DcResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        for (i, name) in names.iter().enumerate() {
            if names[..i].contains(name) {
                return Err(DcError::InvalidArg {
                    what: "duplicate component name",
                });
            }
        }
        Ok(Self { names })
    }

    /// Names known at compile time; they must be distinct.
    pub fn from_static(names: &[&'static str]) -> Self {
        debug_assert!(
            names
                .iter()
                .enumerate()
                .all(|(i, n)| !names[..i].contains(n)),
            "duplicate static component name"
        );
        Self {
            names: names.iter().map(|n| n.to_string()).collect(),
        }
    }

    /// `prefix0, prefix1, ...`
    pub fn generic(prefix: &str, len: usize) -> Self {
        Self {
            names: (0..len).map(|i| format!("{prefix}{i}")).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Read the component called `name` out of a vector laid out in this order.
    pub fn get(&self, values: &[Real], name: &str) -> DcResult<Real> {
        let index = self.index_of(name).ok_or(DcError::InvalidArg {
            what: "unknown component name",
        })?;
        values.get(index).copied().ok_or(DcError::IndexOob {
            what: "named component",
            index,
            len: values.len(),
        })
    }
}
