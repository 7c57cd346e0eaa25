//! Correction tool settings.
//!
//! The external tool is driven by a flat `key=value` settings file; this
//! module owns the fixed set of options the pipeline uses and their
//! serialization. Nothing here is read from the ambient environment.

use std::path::{Path, PathBuf};

use msi_common::EpsgCode;

use crate::error::CorrectionResult;

/// Processing options for one correction run.
#[derive(Debug, Clone)]
pub struct CorrectionSettings {
    /// Path to the unpacked `.SAFE` input product.
    pub input_file: PathBuf,
    /// Directory the tool writes its outputs into.
    pub output_dir: PathBuf,
    /// GeoJSON polygon mask; processing is clipped to it when set.
    pub polygon: Option<PathBuf>,
    /// Requested output parameters, e.g. `rhow_*` and `kd_*`.
    pub l2w_parameters: Vec<String>,
    /// Target spatial resolution in meters.
    pub target_resolution_m: u32,
    /// Reproject the output onto this CRS before gridding.
    pub output_projection: Option<EpsgCode>,
    /// Apply residual sun-glint correction.
    pub glint_correction: bool,
}

impl CorrectionSettings {
    /// Settings for the direct water-reflectance run.
    pub fn water_reflectance(input_file: PathBuf, output_dir: PathBuf) -> Self {
        Self {
            input_file,
            output_dir,
            polygon: None,
            l2w_parameters: vec!["rhow_*".to_string()],
            target_resolution_m: 10,
            output_projection: None,
            glint_correction: true,
        }
    }

    /// Settings for the bottom-reflectance run: reflectance plus diffuse
    /// attenuation, reprojected onto the surface CRS so the grids can be
    /// fused by coordinate.
    pub fn bottom_reflectance(
        input_file: PathBuf,
        output_dir: PathBuf,
        projection: EpsgCode,
        resolution_m: u32,
    ) -> Self {
        Self {
            input_file,
            output_dir,
            polygon: None,
            l2w_parameters: vec!["rhow_*".to_string(), "kd_*".to_string()],
            target_resolution_m: resolution_m,
            output_projection: Some(projection),
            glint_correction: true,
        }
    }

    pub fn with_polygon(mut self, polygon: PathBuf) -> Self {
        self.polygon = Some(polygon);
        self
    }

    /// Render the tool's `key=value` settings file contents.
    pub fn to_settings_text(&self) -> String {
        let mut lines = vec![
            format!("inputfile={}", self.input_file.display()),
            format!("output={}", self.output_dir.display()),
        ];

        if let Some(polygon) = &self.polygon {
            lines.push(format!("polygon={}", polygon.display()));
            lines.push("polygon_limit=True".to_string());
        }

        lines.push(format!("l2w_parameters={}", self.l2w_parameters.join(",")));
        lines.push(format!("s2_target_res={}", self.target_resolution_m));

        if let Some(epsg) = self.output_projection {
            lines.push("reproject_before_ac=True".to_string());
            lines.push(format!("output_projection_epsg={}", epsg.0));
        }

        if self.glint_correction {
            lines.push("dsf_residual_glint_correction=True".to_string());
        }

        lines.push(String::new());
        lines.join("\n")
    }

    /// Write the settings file next to the tool's output and return its path.
    pub fn write_settings_file(&self, dir: &Path) -> CorrectionResult<PathBuf> {
        let path = dir.join("correction_settings.txt");
        std::fs::write(&path, self.to_settings_text())?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_water_reflectance_settings_text() {
        let settings = CorrectionSettings::water_reflectance(
            PathBuf::from("/work/ac/S2A_TEST.SAFE"),
            PathBuf::from("/work/ac"),
        )
        .with_polygon(PathBuf::from("/work/ac/polygon_limit.geojson"));

        let text = settings.to_settings_text();
        assert!(text.contains("inputfile=/work/ac/S2A_TEST.SAFE"));
        assert!(text.contains("output=/work/ac"));
        assert!(text.contains("polygon=/work/ac/polygon_limit.geojson"));
        assert!(text.contains("polygon_limit=True"));
        assert!(text.contains("l2w_parameters=rhow_*"));
        assert!(text.contains("s2_target_res=10"));
        assert!(text.contains("dsf_residual_glint_correction=True"));
        assert!(!text.contains("output_projection_epsg"));
    }

    #[test]
    fn test_bottom_reflectance_settings_text() {
        let settings = CorrectionSettings::bottom_reflectance(
            PathBuf::from("/work/ac/S2A_TEST.SAFE"),
            PathBuf::from("/work/ac"),
            EpsgCode(2960),
            10,
        );

        let text = settings.to_settings_text();
        assert!(text.contains("l2w_parameters=rhow_*,kd_*"));
        assert!(text.contains("reproject_before_ac=True"));
        assert!(text.contains("output_projection_epsg=2960"));
    }

    #[test]
    fn test_write_settings_file() {
        let tmp = tempfile::tempdir().unwrap();
        let settings = CorrectionSettings::water_reflectance(
            PathBuf::from("in.SAFE"),
            tmp.path().to_path_buf(),
        );

        let path = settings.write_settings_file(tmp.path()).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.ends_with('\n'));
        assert!(content.contains("inputfile=in.SAFE"));
    }
}
