//! Filesystem repository for model bundles.
//!
//! The whole bundle is one JSON document. It is written to a sibling temp
//! file, synced, then renamed over `bundle.json`, so readers only ever see a
//! complete old bundle or a complete new one.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::common::error::{PredictError, PredictResult};

use super::domain::{BundleRepo, ModelBundle};

pub const BUNDLE_FILE: &str = "bundle.json";
const TMP_SUFFIX: &str = ".tmp";

/// Bundle storage rooted at a directory.
pub struct FsBundleRepo {
    root: PathBuf,
}

impl FsBundleRepo {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn bundle_path(&self) -> PathBuf {
        self.root.join(BUNDLE_FILE)
    }

    fn tmp_path(&self) -> PathBuf {
        self.root.join(format!("{BUNDLE_FILE}{TMP_SUFFIX}"))
    }

    fn write_tmp(&self, bundle: &ModelBundle, tmp: &Path) -> PredictResult<()> {
        let file = File::create(tmp)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, bundle)?;
        writer.flush()?;
        writer
            .into_inner()
            .map_err(|e| PredictError::Io(e.into_error()))?
            .sync_all()?;
        Ok(())
    }
}

impl BundleRepo for FsBundleRepo {
    fn put_bundle(&self, bundle: &ModelBundle) -> PredictResult<()> {
        bundle.validate()?;
        fs::create_dir_all(&self.root)?;
        let tmp = self.tmp_path();
        if let Err(err) = self.write_tmp(bundle, &tmp) {
            let _ = fs::remove_file(&tmp);
            return Err(err);
        }
        fs::rename(&tmp, self.bundle_path())?;
        // the rename itself is only durable once the directory entry is synced
        File::open(&self.root)?.sync_all()?;
        tracing::info!(path = %self.bundle_path().display(), "model bundle written");
        Ok(())
    }

    fn get_bundle(&self) -> PredictResult<ModelBundle> {
        let path = self.bundle_path();
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(PredictError::BundleMissing(path.display().to_string()))
            }
            Err(err) => return Err(err.into()),
        };
        let bundle: ModelBundle = serde_json::from_reader(BufReader::new(file))?;
        bundle.validate()?;
        Ok(bundle)
    }
}
