// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Import and export options.
//!
//! Settings are plain structs that round-trip through RON, so a host can
//! keep per-project defaults on disk:
//!
//! ```ron
//! (
//!     swap_handedness: true,
//!     scale_factor: 0.01,
//!     normal_calculation: WhenMissing,
//!     split_unit: 64998,
//! )
//! ```
//!
//! Missing fields take their default values.

use std::path::Path;

use anyhow::Context;
use ron::ser::PrettyConfig;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::StrataError;

/// When per-vertex normals are synthesized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NormalCalculation {
    /// Never generate; missing normals are zero-filled.
    Never,
    /// Generate only when the source has no authored normals.
    #[default]
    WhenMissing,
    /// Always regenerate, ignoring authored normals.
    Always,
}

/// How face normals are weighted when accumulated into vertices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NormalWeighting {
    /// Larger faces contribute proportionally more.
    #[default]
    Area,
    /// Every face contributes a unit normal.
    Uniform,
}

/// When per-vertex tangents are synthesized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TangentCalculation {
    /// Never generate tangents.
    #[default]
    Never,
    /// Generate tangents whenever normals and UVs are available.
    WhenPresentNormalsAndUVs,
}

/// Options applied when reading samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportSettings {
    /// Negate X on every vector and mirror rotations.
    pub swap_handedness: bool,
    /// Uniform scale applied to points and velocities.
    pub scale_factor: f32,
    /// Normal synthesis policy.
    pub normal_calculation: NormalCalculation,
    /// Face weighting used by normal synthesis.
    pub normal_weighting: NormalWeighting,
    /// Tangent synthesis policy.
    pub tangent_calculation: TangentCalculation,
    /// Produce a triangle index stream.
    pub triangulate: bool,
    /// Reverse triangle winding.
    pub swap_faces: bool,
    /// Maximum triangle corners per submesh. Zero disables splitting.
    ///
    /// A multiple of three keeps every triangle inside one submesh.
    pub split_unit: usize,
    /// Requested skin influences per vertex: 0 keeps the authored width.
    pub max_bone_weights: i32,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            swap_handedness: true,
            scale_factor: 1.0,
            normal_calculation: NormalCalculation::default(),
            normal_weighting: NormalWeighting::default(),
            tangent_calculation: TangentCalculation::default(),
            triangulate: true,
            swap_faces: true,
            split_unit: 64998,
            max_bone_weights: 4,
        }
    }
}

impl ImportSettings {
    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), StrataError> {
        validate_scale(self.scale_factor)?;
        if !matches!(self.max_bone_weights, 0 | 4 | 8) {
            return Err(StrataError::UnsupportedBoneWidth(self.max_bone_weights));
        }
        if self.split_unit % 3 != 0 {
            log::warn!(
                "split_unit {} is not a multiple of 3; triangles will straddle submeshes",
                self.split_unit
            );
        }
        Ok(())
    }

    /// Loads settings from a RON file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let settings: Self = load_ron(path.as_ref())?;
        settings
            .validate()
            .with_context(|| format!("invalid import settings in {}", path.as_ref().display()))?;
        Ok(settings)
    }

    /// Writes settings to a RON file.
    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        save_ron(self, path.as_ref())
    }
}

/// Options applied when writing samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// Negate X on every vector and mirror rotations.
    pub swap_handedness: bool,
    /// Uniform scale applied to points and velocities.
    pub scale_factor: f32,
    /// Reverse polygon winding.
    pub swap_faces: bool,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            swap_handedness: true,
            scale_factor: 1.0,
            swap_faces: true,
        }
    }
}

impl ExportSettings {
    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), StrataError> {
        validate_scale(self.scale_factor)
    }

    /// Loads settings from a RON file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let settings: Self = load_ron(path.as_ref())?;
        settings
            .validate()
            .with_context(|| format!("invalid export settings in {}", path.as_ref().display()))?;
        Ok(settings)
    }

    /// Writes settings to a RON file.
    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        save_ron(self, path.as_ref())
    }
}

fn validate_scale(scale: f32) -> Result<(), StrataError> {
    if !scale.is_finite() || scale == 0.0 {
        return Err(StrataError::InvalidSettings(format!(
            "scale_factor must be finite and non-zero, got {scale}"
        )));
    }
    Ok(())
}

fn load_ron<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read settings file {}", path.display()))?;
    ron::from_str(&text)
        .with_context(|| format!("failed to parse settings file {}", path.display()))
}

fn save_ron<T: Serialize>(value: &T, path: &Path) -> anyhow::Result<()> {
    let text = ron::ser::to_string_pretty(value, PrettyConfig::default())
        .context("failed to serialize settings")?;
    std::fs::write(path, text)
        .with_context(|| format!("failed to write settings file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_ron_uses_defaults() {
        let settings: ImportSettings =
            ron::from_str("(scale_factor: 0.01, normal_calculation: Always)").unwrap();
        assert_eq!(settings.scale_factor, 0.01);
        assert_eq!(settings.normal_calculation, NormalCalculation::Always);
        assert!(settings.swap_handedness);
        assert_eq!(settings.split_unit, 64998);
    }

    #[test]
    fn test_roundtrip_through_file() {
        let path = std::env::temp_dir().join(format!("strata-import-{}.ron", std::process::id()));
        let settings = ImportSettings {
            tangent_calculation: TangentCalculation::WhenPresentNormalsAndUVs,
            max_bone_weights: 8,
            ..Default::default()
        };
        settings.save(&path).unwrap();
        let loaded = ImportSettings::load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let zero_scale = ImportSettings {
            scale_factor: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            zero_scale.validate(),
            Err(StrataError::InvalidSettings(_))
        ));

        let six = ImportSettings {
            max_bone_weights: 6,
            ..Default::default()
        };
        assert!(matches!(
            six.validate(),
            Err(StrataError::UnsupportedBoneWidth(6))
        ));

        let nan = ExportSettings {
            scale_factor: f32::NAN,
            ..Default::default()
        };
        assert!(nan.validate().is_err());
    }

    #[test]
    fn test_load_missing_file_reports_path() {
        let err = ExportSettings::load("/nonexistent/strata/export.ron").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/strata/export.ron"));
    }
}
