//! External correction process invocation.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::{CorrectionError, CorrectionResult};
use crate::settings::CorrectionSettings;

/// Handle to a completed correction run.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrectionOutput {
    /// Path to the multi-band L2W result grid.
    pub l2w_path: PathBuf,
}

/// The correction tool as a black box: one `run` operation, no retry, no
/// timeout — the adapter waits for completion.
#[async_trait]
pub trait CorrectionTool: Send + Sync {
    async fn run(&self, settings: &CorrectionSettings) -> CorrectionResult<CorrectionOutput>;
}

/// Runs the ACOLITE processor as an external Python process.
pub struct AcoliteRunner {
    /// Path to ACOLITE's `launch_acolite.py`.
    launcher: PathBuf,
    /// Python interpreter to launch it with.
    python: PathBuf,
}

impl AcoliteRunner {
    pub fn new(launcher: PathBuf) -> Self {
        Self {
            launcher,
            python: PathBuf::from("python3"),
        }
    }

    pub fn with_python(mut self, python: PathBuf) -> Self {
        self.python = python;
        self
    }
}

#[async_trait]
impl CorrectionTool for AcoliteRunner {
    async fn run(&self, settings: &CorrectionSettings) -> CorrectionResult<CorrectionOutput> {
        let settings_path = settings.write_settings_file(&settings.output_dir)?;

        info!(
            launcher = %self.launcher.display(),
            settings = %settings_path.display(),
            "Starting correction run"
        );

        // Compute-bound synchronous call: wait for completion, no timeout.
        let output = Command::new(&self.python)
            .arg(&self.launcher)
            .arg("--cli")
            .arg(format!("--settings={}", settings_path.display()))
            .output()
            .await
            .map_err(|e| {
                CorrectionError::failed(format!(
                    "could not launch {}: {e}",
                    self.launcher.display()
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail: String = stderr
                .lines()
                .rev()
                .take(5)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect::<Vec<_>>()
                .join("; ");
            return Err(CorrectionError::failed(format!(
                "tool exited with {}: {tail}",
                output.status
            )));
        }

        let l2w_path = find_l2w_output(&settings.output_dir)?.ok_or_else(|| {
            CorrectionError::failed(format!(
                "tool succeeded but wrote no L2W grid under {}",
                settings.output_dir.display()
            ))
        })?;

        info!(path = %l2w_path.display(), "Correction run produced L2W grid");
        Ok(CorrectionOutput { l2w_path })
    }
}

/// Find the L2W result grid under the output directory: the newest file
/// named `*_L2W.nc`.
pub fn find_l2w_output(dir: &Path) -> CorrectionResult<Option<PathBuf>> {
    let mut newest: Option<(std::time::SystemTime, PathBuf)> = None;

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !name.ends_with("_L2W.nc") {
            continue;
        }

        let modified = entry
            .metadata()
            .and_then(|m| m.modified())
            .unwrap_or(std::time::UNIX_EPOCH);
        match &newest {
            Some((t, _)) if *t >= modified => {}
            _ => newest = Some((modified, path.clone())),
        }
        debug!(candidate = %path.display(), "Found L2W output candidate");
    }

    if newest.is_none() {
        warn!(dir = %dir.display(), "No L2W output found");
    }
    Ok(newest.map(|(_, p)| p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_l2w_output_picks_l2w_file() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("S2A_TEST_L1R.nc"), b"").unwrap();
        std::fs::write(tmp.path().join("S2A_TEST_L2W.nc"), b"").unwrap();
        std::fs::write(tmp.path().join("settings.txt"), b"").unwrap();

        let found = find_l2w_output(tmp.path()).unwrap().unwrap();
        assert!(found.to_string_lossy().ends_with("S2A_TEST_L2W.nc"));
    }

    #[test]
    fn test_find_l2w_output_none() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(find_l2w_output(tmp.path()).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_runner_surfaces_tool_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let settings = CorrectionSettings::water_reflectance(
            PathBuf::from("in.SAFE"),
            tmp.path().to_path_buf(),
        );

        // `false` exits non-zero regardless of arguments
        let runner = AcoliteRunner::new(PathBuf::from("/dev/null"))
            .with_python(PathBuf::from("false"));

        let err = runner.run(&settings).await.unwrap_err();
        assert!(matches!(err, CorrectionError::Failed(_)));
    }

    #[tokio::test]
    async fn test_runner_fails_without_l2w_output() {
        let tmp = tempfile::tempdir().unwrap();
        let settings = CorrectionSettings::water_reflectance(
            PathBuf::from("in.SAFE"),
            tmp.path().to_path_buf(),
        );

        // `true` exits zero but writes nothing
        let runner = AcoliteRunner::new(PathBuf::from("/dev/null"))
            .with_python(PathBuf::from("true"));

        let err = runner.run(&settings).await.unwrap_err();
        assert!(err.to_string().contains("no L2W grid"));
    }
}
