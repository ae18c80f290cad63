/////////////////////////////////////////////////////////////////////////////////////////////
//
// Saves and loads stencil weight sets as versioned JSON documents.
//
// Created on: 14 Oct 2026     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use crate::weights::WeightSet;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

const JSON_FORMAT_NAME: &str = "ferreus_rbffd.weights.json";
const JSON_VERSION: u32 = 1;

/// Borrowing envelope for SAVE (no clone of the weights).
#[derive(Serialize)]
struct JsonEnvelopeRef<'a, T: ?Sized> {
    format: &'static str,
    version: u32,
    #[serde(flatten)]
    model: &'a T,
}

/// Owning envelope for LOAD.
#[derive(Deserialize)]
struct JsonEnvelopeOwned<T> {
    format: String,
    version: u32,
    #[serde(flatten)]
    model: T,
}

pub type WeightIOResult<T> = std::result::Result<T, WeightIOError>;

/// Errors that can occur when saving or loading a [`WeightSet`].
#[derive(Debug, Error)]
pub enum WeightIOError {
    #[error("failed to create {path:?}: {source}")]
    Create { path: PathBuf, source: io::Error },

    #[error("failed to open {path:?}: {source}")]
    Open { path: PathBuf, source: io::Error },

    #[error("failed to flush {path:?}: {source}")]
    Flush { path: PathBuf, source: io::Error },

    #[error("failed to serialize weights to {path:?}: {source}")]
    Serialize {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to parse weights from {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("{path:?} has format {found:?}, expected {expected:?}")]
    FormatMismatch {
        path: PathBuf,
        found: String,
        expected: &'static str,
    },

    #[error("{path:?} has version {found}, expected {expected}")]
    VersionMismatch {
        path: PathBuf,
        found: u32,
        expected: u32,
    },

    #[error("{path:?} holds an inconsistent weight set: {reason}")]
    Inconsistent { path: PathBuf, reason: String },
}

impl WeightSet {
    /// Save the weights to a JSON envelope `{ format, version, ... }`.
    ///
    /// ### Example
    /// ```no_run
    /// # use ferreus_rbffd::WeightSet;
    /// # let weights: WeightSet = unimplemented!();
    /// weights.save("laplacian.json")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn save<P: AsRef<Path>>(&self, path: P) -> WeightIOResult<()> {
        let path_ref = path.as_ref();
        let file = File::create(path_ref).map_err(|e| WeightIOError::Create {
            path: path_ref.to_path_buf(),
            source: e,
        })?;
        let mut w = BufWriter::new(file);

        let env = JsonEnvelopeRef {
            format: JSON_FORMAT_NAME,
            version: JSON_VERSION,
            model: self,
        };

        serde_json::to_writer_pretty(&mut w, &env).map_err(|e| WeightIOError::Serialize {
            path: path_ref.to_path_buf(),
            source: e,
        })?;
        w.flush().map_err(|e| WeightIOError::Flush {
            path: path_ref.to_path_buf(),
            source: e,
        })?;
        Ok(())
    }

    /// Load weights written by [`WeightSet::save`], validating format, version,
    /// and index bounds.
    pub fn load<P: AsRef<Path>>(path: P) -> WeightIOResult<Self> {
        let path_ref = path.as_ref();

        let file = File::open(path_ref).map_err(|e| WeightIOError::Open {
            path: path_ref.to_path_buf(),
            source: e,
        })?;
        let reader = BufReader::new(file);

        let env: JsonEnvelopeOwned<Self> =
            serde_json::from_reader(reader).map_err(|e| WeightIOError::Parse {
                path: path_ref.to_path_buf(),
                source: e,
            })?;

        if env.format != JSON_FORMAT_NAME {
            return Err(WeightIOError::FormatMismatch {
                path: path_ref.to_path_buf(),
                found: env.format,
                expected: JSON_FORMAT_NAME,
            });
        }

        if env.version != JSON_VERSION {
            return Err(WeightIOError::VersionMismatch {
                path: path_ref.to_path_buf(),
                found: env.version,
                expected: JSON_VERSION,
            });
        }

        let set = env.model;
        let inconsistent = |reason: String| WeightIOError::Inconsistent {
            path: path_ref.to_path_buf(),
            reason,
        };
        if set.stencils.len() != set.weights.len() {
            return Err(inconsistent(format!(
                "{} stencils but {} weight rows",
                set.stencils.len(),
                set.weights.len()
            )));
        }
        for (i, (stencil, weights)) in set.stencils.iter().zip(&set.weights).enumerate() {
            if stencil.len() != weights.len() {
                return Err(inconsistent(format!(
                    "stencil {i} has {} nodes but {} weights",
                    stencil.len(),
                    weights.len()
                )));
            }
            if let Some(j) = stencil.iter().find(|&&j| j >= set.num_nodes) {
                return Err(inconsistent(format!(
                    "stencil {i} references node {j} of {}",
                    set.num_nodes
                )));
            }
        }

        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_file(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("ferreus_rbffd_{}_{name}.json", std::process::id()))
    }

    fn sample_set() -> WeightSet {
        WeightSet {
            num_nodes: 4,
            stencils: vec![vec![0, 1, 2], vec![1, 2, 3]],
            weights: vec![vec![-0.5, 0.0, 0.5], vec![1.0, -2.0, 1.0]],
        }
    }

    #[test]
    fn save_then_load() {
        let path = scratch_file("round_trip");
        let set = sample_set();
        set.save(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains(JSON_FORMAT_NAME));

        let loaded = WeightSet::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded, set);
    }

    #[test]
    fn rejects_foreign_and_malformed_files() {
        let path = scratch_file("foreign");

        std::fs::write(
            &path,
            r#"{"format":"something.else","version":1,"num_nodes":1,"stencils":[],"weights":[]}"#,
        )
        .unwrap();
        assert!(matches!(
            WeightSet::load(&path),
            Err(WeightIOError::FormatMismatch { .. })
        ));

        std::fs::write(
            &path,
            r#"{"format":"ferreus_rbffd.weights.json","version":9,"num_nodes":1,"stencils":[],"weights":[]}"#,
        )
        .unwrap();
        assert!(matches!(
            WeightSet::load(&path),
            Err(WeightIOError::VersionMismatch { found: 9, .. })
        ));

        std::fs::write(
            &path,
            r#"{"format":"ferreus_rbffd.weights.json","version":1,"num_nodes":2,"stencils":[[0,5]],"weights":[[1.0,2.0]]}"#,
        )
        .unwrap();
        assert!(matches!(
            WeightSet::load(&path),
            Err(WeightIOError::Inconsistent { .. })
        ));

        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(WeightSet::load(&path), Err(WeightIOError::Parse { .. })));

        std::fs::remove_file(&path).unwrap();
        assert!(matches!(WeightSet::load(&path), Err(WeightIOError::Open { .. })));
    }
}
