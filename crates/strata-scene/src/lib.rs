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

//! Scene-level orchestration of the resampling lanes.
//!
//! A [`Scene`] owns every node in an arena addressed by [`NodeId`]. Nodes
//! are created from [`PrimDesc`] descriptions by the first registered
//! [`SchemaHandler`] that accepts them, and the whole scene is resampled in
//! parallel, one node per task.

#![warn(missing_docs)]

mod arena;
mod registry;
mod update;

pub use self::arena::{Node, NodeId, NodeKind, Scene};
pub use self::registry::{handlers, PrimDesc, PrimSource, SchemaHandler};
