//! # Scene Component Set
//!
//! The renderer's fixed list of component types and helpers for spawning
//! the common entity shapes.

use glint_core::{component_set, BoxedStorage, DenseStorage, EcsManager, EntityId};

use crate::camera::CameraComponent;
use crate::error::{SceneError, SceneResult};
use crate::input::InputHandler;
use crate::mesh::MeshComponent;
use crate::transform::TransformComponent;

component_set! {
    /// Storages for every scene component type, in slot order.
    pub struct SceneComponents {
        meshes: MeshComponent => DenseStorage<MeshComponent>,
        cameras: CameraComponent => DenseStorage<CameraComponent>,
        transforms: TransformComponent => DenseStorage<TransformComponent>,
        inputs: dyn InputHandler => BoxedStorage<dyn InputHandler>,
    }
}

/// The ECS the renderer is built over.
pub type SceneEcs = EcsManager<SceneComponents>;

fn spawn(ecs: &mut SceneEcs) -> SceneResult<EntityId> {
    ecs.new_entity().ok_or(SceneError::CapacityExhausted)
}

/// Spawns a camera entity.
///
/// # Errors
///
/// Returns [`SceneError::CapacityExhausted`] at the entity ceiling.
pub fn spawn_camera(
    ecs: &mut SceneEcs,
    camera: CameraComponent,
    transform: TransformComponent,
) -> SceneResult<EntityId> {
    let id = spawn(ecs)?;
    ecs.new_component::<CameraComponent>(id, camera)?;
    ecs.new_component::<TransformComponent>(id, transform)?;
    Ok(id)
}

/// Spawns a renderable mesh entity.
///
/// # Errors
///
/// Returns [`SceneError::CapacityExhausted`] at the entity ceiling.
pub fn spawn_mesh(
    ecs: &mut SceneEcs,
    mesh: MeshComponent,
    transform: TransformComponent,
) -> SceneResult<EntityId> {
    let id = spawn(ecs)?;
    ecs.new_component::<MeshComponent>(id, mesh)?;
    ecs.new_component::<TransformComponent>(id, transform)?;
    Ok(id)
}

/// Attaches an input handler to an existing entity.
///
/// # Errors
///
/// Fails if `id` is not live or already has a handler.
pub fn attach_input(
    ecs: &mut SceneEcs,
    id: EntityId,
    handler: Box<dyn InputHandler>,
) -> SceneResult<()> {
    ecs.new_component::<dyn InputHandler>(id, handler)?;
    Ok(())
}
