/*
MIT License

Copyright (c) 2026 Raja Lehtihet and Wael El Oraiby

Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the "Software"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE.
*/

//! On-disk cache of rewritten-module artifacts.
//!
//! Artifacts are keyed by the SHA-256 fingerprint of the module source.
//! The fingerprint is embedded in the artifact filename, so validity is a
//! path lookup with no source re-parse. Any corruption, schema drift, or
//! fingerprint mismatch is a cache miss, never an error, and stores are
//! write-then-rename so racing writers can regenerate redundantly without
//! exposing partial artifacts.

use super::CompiledModule;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Bumped whenever the serialized artifact layout changes.
const ARTIFACT_SCHEMA_VERSION: u32 = 1;

/// Computes the canonical hex fingerprint for module source text.
pub(crate) fn source_fingerprint(source: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    let digest = hasher.finalize();
    digest
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect::<String>()
}

/// Serialized cache entry wrapping one compiled module.
#[derive(Debug, Serialize, Deserialize)]
struct CacheArtifact {
    schema: u32,
    fingerprint: String,
    module: CompiledModule,
}

/// Filesystem cache of rewritten modules, rooted at one directory.
#[derive(Debug, Clone)]
pub struct RewriteCache {
    root: PathBuf,
}

impl RewriteCache {
    /// Creates a cache rooted at the given directory.
    ///
    /// The directory is created lazily on first store.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the cache root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the artifact path for a module path and source fingerprint.
    fn artifact_path(&self, module_path: &str, fingerprint: &str) -> PathBuf {
        let stem: String = module_path
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        let short = fingerprint.get(..16).unwrap_or(fingerprint);
        self.root.join(format!("{stem}.{short}.json"))
    }

    /// Loads the cached module for a path/fingerprint pair, if valid.
    pub(crate) fn load(&self, module_path: &str, fingerprint: &str) -> Option<CompiledModule> {
        let path = self.artifact_path(module_path, fingerprint);
        let bytes = fs::read(&path).ok()?;
        let artifact: CacheArtifact = match serde_json::from_slice(&bytes) {
            Ok(artifact) => artifact,
            Err(err) => {
                tracing::warn!(
                    artifact = %path.display(),
                    error = %err,
                    "discarding corrupt rewrite cache artifact"
                );
                return None;
            }
        };
        if artifact.schema != ARTIFACT_SCHEMA_VERSION || artifact.fingerprint != fingerprint {
            tracing::debug!(
                artifact = %path.display(),
                "discarding stale rewrite cache artifact"
            );
            return None;
        }
        Some(artifact.module)
    }

    /// Stores one compiled module; entries are write-once per fingerprint.
    pub(crate) fn store(&self, module: &CompiledModule) -> io::Result<()> {
        fs::create_dir_all(&self.root)?;
        let artifact = CacheArtifact {
            schema: ARTIFACT_SCHEMA_VERSION,
            fingerprint: module.fingerprint.clone(),
            module: module.clone(),
        };
        let json = serde_json::to_vec(&artifact)
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;

        let path = self.artifact_path(&module.path, &module.fingerprint);
        let tmp = path.with_extension(format!("tmp{}", std::process::id()));
        fs::write(&tmp, &json)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}
