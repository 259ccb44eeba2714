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

//! Cached query bookkeeping.

use super::entity::EntityId;
use std::collections::BTreeSet;

/// Handle of a query registered with [`EntityStore::register_query`](super::EntityStore::register_query).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueryId(pub(crate) usize);

/// A registered component-name conjunction and its current members.
#[derive(Debug)]
pub(crate) struct CachedQuery {
    pub(crate) names: Vec<String>,
    pub(crate) members: BTreeSet<EntityId>,
}

impl CachedQuery {
    pub(crate) fn new(names: &[&str]) -> Self {
        let mut names: Vec<String> = names.iter().map(|name| name.to_string()).collect();
        names.sort();
        names.dedup();
        Self {
            names,
            members: BTreeSet::new(),
        }
    }

    /// Whether a change to component `name` can affect membership.
    pub(crate) fn watches(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub(crate) fn matches_all(&self) -> bool {
        self.names.is_empty()
    }
}
