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

//! Mesh resampling: triangulation, attribute synthesis, skin repacking
//! and submesh splitting behind the [`MeshNode`] controller.

mod node;
pub mod normals;
mod sample;
pub mod skin;
mod submesh;
pub mod triangulate;

pub use self::node::MeshNode;
pub use self::sample::{MeshData, MeshSample, MeshSummary, MeshView, TopologyVariance};
pub use self::skin::{InfluenceRecord, Weights4, Weights8};
pub use self::submesh::{FlattenedAttributes, Submesh, SubmeshSplitter};
