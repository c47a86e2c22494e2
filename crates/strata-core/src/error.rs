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

//! Error types shared by the resampling pipelines.
//!
//! None of these conditions is fatal: the controllers log them and degrade
//! the affected output (dropped faces, skipped skin data) while every other
//! stream of the sample is still produced.

use std::error::Error;

/// An error raised while resampling or authoring scene data.
#[derive(Debug, thiserror::Error)]
pub enum StrataError {
    /// Polygon counts and indices do not describe a valid polygon mesh.
    #[error("malformed topology: {reason}")]
    MalformedTopology {
        /// What was wrong with the topology.
        reason: String,
    },
    /// Bone weight and bone index arrays do not line up with the points.
    #[error("skin data mismatch: {reason}")]
    SkinDataMismatch {
        /// What was wrong with the skin arrays.
        reason: String,
    },
    /// Only 4 and 8 influences per vertex are supported.
    #[error("unsupported bone weight width {0}, expected 4 or 8")]
    UnsupportedBoneWidth(i32),
    /// A settings value is outside its valid range.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),
    /// The destination provider refused to store a sample.
    #[error("failed to store sample")]
    Sink(#[source] Box<dyn Error + Send + Sync>),
}

impl StrataError {
    /// Shorthand for [`StrataError::MalformedTopology`].
    pub fn malformed_topology(reason: impl Into<String>) -> Self {
        Self::MalformedTopology {
            reason: reason.into(),
        }
    }

    /// Shorthand for [`StrataError::SkinDataMismatch`].
    pub fn skin_mismatch(reason: impl Into<String>) -> Self {
        Self::SkinDataMismatch {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = StrataError::malformed_topology("face 3 has 2 corners");
        assert_eq!(err.to_string(), "malformed topology: face 3 has 2 corners");
        assert_eq!(
            StrataError::UnsupportedBoneWidth(6).to_string(),
            "unsupported bone weight width 6, expected 4 or 8"
        );
    }

    #[test]
    fn test_sink_error_exposes_source() {
        let inner: Box<dyn Error + Send + Sync> = "disk full".into();
        let err = StrataError::Sink(inner);
        assert_eq!(err.source().map(|e| e.to_string()), Some("disk full".into()));
    }
}
