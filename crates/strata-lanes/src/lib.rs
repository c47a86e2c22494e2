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

//! Per-node resampling lanes.
//!
//! Each lane turns one kind of scene node into renderer-ready data at a
//! requested time. The [`mesh`] lane triangulates and repacks polygon
//! meshes; the [`xform`] lane evaluates transform op stacks.

#![warn(missing_docs)]

pub mod mesh;
pub mod xform;
