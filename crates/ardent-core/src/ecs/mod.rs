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

//! A string-keyed entity-component store.
//!
//! Components and resources are opaque to the store: they are kept as
//! `Arc<dyn Any + Send + Sync>` and downcast on typed reads. The store is
//! shared through [`EngineContext`](crate::EngineContext) and uses interior
//! locking, so every operation takes `&self`.

mod entity;
mod query;
mod store;


pub use self::entity::EntityId;
pub use self::query::QueryId;
pub use self::store::{ComponentData, EntityStore};

/// Errors raised by [`EntityStore`] writes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EcsError {
    /// The entity was never created or has been destroyed.
    #[error("{0} does not exist")]
    EntityNotFound(EntityId),
}
