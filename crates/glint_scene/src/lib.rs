//! # GLINT Scene
//!
//! Renderer-facing component types and the per-frame bridge between the
//! ECS and the draw loop:
//! - [`CameraComponent`], [`TransformComponent`], [`MeshComponent`] and the
//!   polymorphic [`InputHandler`] component
//! - [`SceneEcs`], the ECS instantiated over exactly those types
//! - [`extract_frame`] and [`dispatch_input`], which read and drive the
//!   scene through queries
//!
//! ## Example
//!
//! ```
//! use glint_scene::{extract_frame, spawn_camera, spawn_mesh, CameraComponent,
//!     Mesh, MeshComponent, HostBuffers, SceneEcs, TransformComponent};
//! use glam::Vec3;
//!
//! let mut ecs = SceneEcs::new();
//! let mut buffers = HostBuffers::new();
//! let triangle = Mesh::parse_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\nf 1//1 2//1 3//1\n")?;
//!
//! spawn_camera(&mut ecs, CameraComponent::default(),
//!     TransformComponent::from_translation(Vec3::new(0.0, 0.0, 10.0)))?;
//! spawn_mesh(&mut ecs, MeshComponent::upload(&mut buffers, &triangle),
//!     TransformComponent::IDENTITY)?;
//!
//! let frame = extract_frame(&ecs)?;
//! assert_eq!(frame.draws.len(), 1);
//! assert_eq!(frame.total_vertices(), 3);
//! # Ok::<(), glint_scene::SceneError>(())
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod camera;
pub mod error;
pub mod frame;
pub mod input;
pub mod mesh;
pub mod scene;
pub mod transform;

pub use camera::CameraComponent;
pub use error::{SceneError, SceneResult};
pub use frame::{dispatch_input, extract_frame, extract_frame_from, DrawCommand, FrameData};
pub use input::{FlyController, InputEvent, InputHandler, Key};
pub use mesh::{BufferHandle, HostBuffers, Mesh, MeshComponent, MeshUploader, Vertex};
pub use scene::{attach_input, spawn_camera, spawn_mesh, SceneComponents, SceneEcs};
pub use transform::TransformComponent;
