//! # Frame Extraction
//!
//! Once per frame the renderer reads the ECS through two queries:
//! `(&CameraComponent, &TransformComponent)` to find the active camera, and
//! `(&MeshComponent, &TransformComponent)` for the draw list.

use glam::{Mat4, Vec3};
use glint_core::EntityId;

use crate::camera::CameraComponent;
use crate::error::{SceneError, SceneResult};
use crate::input::{InputEvent, InputHandler};
use crate::mesh::{BufferHandle, MeshComponent};
use crate::scene::SceneEcs;
use crate::transform::TransformComponent;

/// One draw call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCommand {
    /// Entity being drawn.
    pub entity: EntityId,
    /// Vertex buffer to bind.
    pub buffer: BufferHandle,
    /// Vertices to draw.
    pub vertex_count: u32,
    /// Model matrix.
    pub model: Mat4,
    /// Projection * view * model.
    pub mvp: Mat4,
}

/// Everything the renderer needs for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameData {
    /// Camera entity the frame is seen from.
    pub camera: EntityId,
    /// Camera position in world space.
    pub camera_pos: Vec3,
    /// Camera view matrix.
    pub view: Mat4,
    /// Camera projection matrix.
    pub projection: Mat4,
    /// Draw calls in ascending entity order.
    pub draws: Vec<DrawCommand>,
}

impl FrameData {
    /// Sum of vertices over every draw.
    #[must_use]
    pub fn total_vertices(&self) -> u64 {
        self.draws.iter().map(|draw| u64::from(draw.vertex_count)).sum()
    }
}

/// Extracts a frame seen from the lowest-ID entity with a camera and a
/// transform.
///
/// # Errors
///
/// Returns [`SceneError::NoActiveCamera`] if no such entity exists.
pub fn extract_frame(ecs: &SceneEcs) -> SceneResult<FrameData> {
    let (camera, _, _) = ecs
        .get_all::<(&CameraComponent, &TransformComponent)>()
        .next()
        .ok_or(SceneError::NoActiveCamera)?;
    extract_frame_from(ecs, camera)
}

/// Extracts a frame seen from `camera`.
///
/// # Errors
///
/// Fails if `camera` is not live or lacks a camera or transform component.
pub fn extract_frame_from(ecs: &SceneEcs, camera: EntityId) -> SceneResult<FrameData> {
    let lens = ecs.get_component::<CameraComponent>(camera)?;
    let placement = ecs.get_component::<TransformComponent>(camera)?;

    let view = placement.inverse_transform();
    let projection = lens.projection();
    let view_proj = projection * view;

    let draws: Vec<DrawCommand> = ecs
        .get_all::<(&MeshComponent, &TransformComponent)>()
        .map(|(entity, mesh, transform)| {
            let model = transform.transform();
            DrawCommand {
                entity,
                buffer: mesh.buffer,
                vertex_count: mesh.vertex_count,
                model,
                mvp: view_proj * model,
            }
        })
        .collect();

    tracing::trace!(camera = %camera, draws = draws.len(), "extracted frame");
    Ok(FrameData {
        camera,
        camera_pos: placement.translation,
        view,
        projection,
        draws,
    })
}

/// Feeds `events` to every entity with an input handler and a transform,
/// then lets each handler update its transform.
///
/// Returns the number of entities driven.
pub fn dispatch_input(ecs: &mut SceneEcs, events: &[InputEvent], dt: f32) -> usize {
    let mut driven = 0;
    for (_, handler, transform) in ecs.get_all_mut::<(&mut dyn InputHandler, &mut TransformComponent)>() {
        for event in events {
            handler.input_listener(event);
        }
        handler.update(transform, dt);
        driven += 1;
    }
    driven
}
