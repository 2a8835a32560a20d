//! Integration tests for scene population, frame extraction and input
//! dispatch.

use glam::{Mat4, Vec3};
use glint_scene::{
    attach_input, dispatch_input, extract_frame, extract_frame_from, spawn_camera, spawn_mesh,
    CameraComponent, FlyController, HostBuffers, InputEvent, InputHandler, Key, Mesh,
    MeshComponent, SceneComponents, SceneEcs, SceneError, TransformComponent,
};
use glint_core::{ComponentSet, ComponentStorage};

const TRIANGLE: &str = "v -1 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\nf 1//1 2//1 3//1\n";

fn camera_at(z: f32) -> TransformComponent {
    TransformComponent::from_translation(Vec3::new(0.0, 0.0, z))
}

/// Records every event it receives and nudges the transform on update.
#[derive(Default)]
struct Recorder {
    events: usize,
}

impl InputHandler for Recorder {
    fn input_listener(&mut self, _event: &InputEvent) {
        self.events += 1;
    }

    fn update(&mut self, transform: &mut TransformComponent, _dt: f32) {
        #[allow(clippy::cast_precision_loss)]
        let events = self.events as f32;
        transform.translation.x += events;
    }
}

#[test]
fn test_scene_component_order() {
    assert_eq!(SceneComponents::COUNT, 4);
    assert_eq!(SceneEcs::component_index::<MeshComponent>(), 0);
    assert_eq!(SceneEcs::component_index::<CameraComponent>(), 1);
    assert_eq!(SceneEcs::component_index::<TransformComponent>(), 2);
    assert_eq!(SceneEcs::component_index::<dyn InputHandler>(), 3);
}

#[test]
fn test_extract_frame_draw_list() {
    let mut ecs = SceneEcs::new();
    let mut buffers = HostBuffers::new();
    let mesh = MeshComponent::upload(&mut buffers, &Mesh::parse_obj(TRIANGLE).unwrap());

    let first = spawn_mesh(&mut ecs, mesh, TransformComponent::IDENTITY).unwrap();
    let camera = spawn_camera(&mut ecs, CameraComponent::default(), camera_at(10.0)).unwrap();
    let second = spawn_mesh(
        &mut ecs,
        mesh,
        TransformComponent::from_translation(Vec3::new(3.0, 0.0, 0.0)),
    )
    .unwrap();

    // A mesh without a transform is not drawn
    let loose = ecs.new_entity().unwrap();
    ecs.new_component::<MeshComponent>(loose, mesh).unwrap();

    let frame = extract_frame(&ecs).unwrap();
    assert_eq!(frame.camera, camera);
    assert_eq!(frame.camera_pos, Vec3::new(0.0, 0.0, 10.0));

    let drawn: Vec<_> = frame.draws.iter().map(|draw| draw.entity).collect();
    assert_eq!(drawn, vec![first, second]);
    assert_eq!(frame.total_vertices(), 6);

    let expected = CameraComponent::default().projection()
        * camera_at(10.0).inverse_transform()
        * Mat4::from_translation(Vec3::new(3.0, 0.0, 0.0));
    assert!(frame.draws[1].mvp.abs_diff_eq(expected, 1e-5));
}

#[test]
fn test_no_camera() {
    let ecs = SceneEcs::new();
    assert!(matches!(extract_frame(&ecs), Err(SceneError::NoActiveCamera)));

    let mut ecs = SceneEcs::new();
    // Camera without transform does not count
    let lens = ecs.new_entity().unwrap();
    ecs.new_component::<CameraComponent>(lens, CameraComponent::default()).unwrap();
    assert!(matches!(extract_frame(&ecs), Err(SceneError::NoActiveCamera)));
    assert!(matches!(extract_frame_from(&ecs, lens), Err(SceneError::Ecs(_))));
}

#[test]
fn test_lowest_camera_is_active() {
    let mut ecs = SceneEcs::new();
    let first = spawn_camera(&mut ecs, CameraComponent::default(), camera_at(1.0)).unwrap();
    let second = spawn_camera(&mut ecs, CameraComponent::default(), camera_at(2.0)).unwrap();

    assert_eq!(extract_frame(&ecs).unwrap().camera, first);
    assert_eq!(extract_frame_from(&ecs, second).unwrap().camera_pos.z, 2.0);

    ecs.delete_entity(first).unwrap();
    assert_eq!(extract_frame(&ecs).unwrap().camera, second);
}

#[test]
fn test_dispatch_input() {
    let mut ecs = SceneEcs::new();
    let flyer = spawn_camera(&mut ecs, CameraComponent::default(), camera_at(0.0)).unwrap();
    attach_input(&mut ecs, flyer, Box::new(FlyController::new(1.0, 0.0))).unwrap();

    let recorder = spawn_mesh(
        &mut ecs,
        MeshComponent::upload(&mut HostBuffers::new(), &Mesh::default()),
        TransformComponent::IDENTITY,
    )
    .unwrap();
    attach_input(&mut ecs, recorder, Box::<Recorder>::default()).unwrap();

    // Handler without transform is not driven
    let orphan = ecs.new_entity().unwrap();
    attach_input(&mut ecs, orphan, Box::<Recorder>::default()).unwrap();

    let events = [InputEvent::Key {
        key: Key::Forward,
        pressed: true,
    }];
    assert_eq!(dispatch_input(&mut ecs, &events, 2.0), 2);

    let flown = ecs.get_component::<TransformComponent>(flyer).unwrap();
    assert!(flown.translation.abs_diff_eq(Vec3::new(0.0, 0.0, -2.0), 1e-6));
    let nudged = ecs.get_component::<TransformComponent>(recorder).unwrap();
    assert_eq!(nudged.translation.x, 1.0);

    assert!(matches!(
        attach_input(&mut ecs, flyer, Box::<Recorder>::default()),
        Err(SceneError::Ecs(_))
    ));
}

#[test]
fn test_teardown() {
    let mut ecs = SceneEcs::new();
    let camera = spawn_camera(&mut ecs, CameraComponent::default(), camera_at(5.0)).unwrap();
    attach_input(&mut ecs, camera, Box::<FlyController>::default()).unwrap();

    ecs.clear();
    assert_eq!(ecs.live_entities(), 0);
    assert!(ecs.component_manager::<dyn InputHandler>().is_empty());
}
