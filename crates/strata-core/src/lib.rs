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

//! # Strata Core
//!
//! Foundational crate for time-sampled scene ingestion: math kernels,
//! import/export settings, update-flag bookkeeping, and the contracts a
//! scene-graph provider implements so the pipelines in `strata-lanes` can
//! pull mesh and transform samples from it.

#![warn(missing_docs)]

pub mod error;
pub mod flags;
pub mod math;
pub mod settings;
pub mod source;
pub mod time;

pub use error::StrataError;
pub use flags::{UpdateFlags, UpdateTracker};
pub use settings::{
    ExportSettings, ImportSettings, NormalCalculation, NormalWeighting, TangentCalculation,
};
pub use time::{Time, TimeRange, DEFAULT_TIME};
