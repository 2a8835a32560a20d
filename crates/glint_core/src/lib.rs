//! # GLINT Core
//!
//! Compile-time Entity Component System for the GLINT renderer:
//! - The set of component types is declared once with [`component_set!`]
//! - Every typed operation resolves its storage and bit index statically
//! - Unknown component types are rejected by the compiler, not at runtime
//!
//! ## Example
//!
//! ```
//! use glint_core::{component_set, DenseStorage, EcsManager};
//!
//! component_set! {
//!     struct Physics {
//!         positions: [f32; 3] => DenseStorage<[f32; 3]>,
//!         masses: f32 => DenseStorage<f32>,
//!     }
//! }
//!
//! let mut ecs = EcsManager::<Physics>::new();
//! let id = ecs.new_entity().unwrap();
//! ecs.new_component::<[f32; 3]>(id, [0.0, 1.0, 0.0]).unwrap();
//! ecs.new_component::<f32>(id, 2.5).unwrap();
//!
//! for (id, position, mass) in ecs.get_all::<(&[f32; 3], &f32)>() {
//!     println!("{id}: {position:?} {mass}");
//! }
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod ecs;
pub mod error;

pub use config::EcsConfig;
pub use ecs::{
    BoxedStorage, ComponentBitset, ComponentSet, ComponentStorage, Contains, DenseStorage,
    DisjointStorage, EcsManager, EntityId, GetAll, GetAllMut, OwnedComponent, MAX_COMPONENTS,
    MAX_NUM_ENTITIES,
};
pub use error::{ConfigError, EcsError, EcsResult};
