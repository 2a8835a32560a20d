//! # Entity Component System
//!
//! A statically resolved ECS for a small renderer.
//!
//! ## Design Philosophy
//!
//! - The component type list is fixed at compile time by a component set
//! - Entities are dense `u32` indices; freed indices are reused lowest first
//! - Each entity carries one bit per component type
//! - Queries resolve to a constant bitmask and never touch a type registry

mod bitset;
mod component;
mod entity;
mod manager;
pub mod query;
mod storage;

pub use bitset::{ComponentBitset, Ones, MAX_COMPONENTS};
pub use component::{ComponentSet, Contains, OwnedComponent};
pub use entity::{EntityId, EntityRegistry, MAX_NUM_ENTITIES};
pub use manager::EcsManager;
pub use query::{GetAll, GetAllMut, Query, QueryTerm, ReadOnlyQuery, ReadOnlyTerm};
pub use storage::{BoxedStorage, ComponentStorage, DenseStorage, DisjointStorage};
