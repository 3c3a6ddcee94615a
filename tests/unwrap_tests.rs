use autouv_bridge::{
    Report, Scene, Severity, UnwrapConfig, Unwrapper,
    errors::UnwrapError,
    float_types::Real,
    io::to_obj_string,
    mesh::{Material, edge_key},
    transfer::INTERNAL_LAYER,
    unwrap::Phase,
};
use nalgebra::Point2;
use support::{Behavior, FakeTool, Workspace};

mod support;

fn unwrapper(
    config: UnwrapConfig,
    workspace: &Workspace,
    behavior: Behavior,
) -> Unwrapper<FakeTool> {
    Unwrapper::with_tool(config, workspace.settings(), FakeTool::new(behavior))
}

#[test]
fn replace_keeps_materials_and_drops_the_original() {
    let workspace = Workspace::new();
    let mut scene = Scene::new();
    let mut cube = support::cube("Cube");
    cube.materials = vec![Material::new("Paint"), Material::new("Rubber")];
    let object = scene.add_mesh_object(cube);
    let original = scene.object(object).and_then(|o| o.mesh).expect("mesh");

    let config = UnwrapConfig {
        replace_original: true,
        ..Default::default()
    };
    let mut report = Report::new();
    let outcomes = unwrapper(config, &workspace, Behavior::Unwrap)
        .run(&mut scene, &[object], &mut report)
        .expect("batch ran");

    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].is_ok());
    assert!(outcomes[0].replaced);
    assert!(report.is_clean(), "{:?}", report.messages);

    assert!(scene.mesh(original).is_none());
    assert_eq!(scene.mesh_count(), 1);
    let processed = scene.object_mesh(object).expect("processed mesh");
    let names: Vec<&str> = processed.materials.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, ["Paint", "Rubber"]);
    assert_eq!(processed.uv_layers.last().map(|l| l.name.as_str()), Some(INTERNAL_LAYER));

    // +90 degrees about X maps the unit cube onto y in [-1, 0], z in [0, 1]
    let bb = support::bounding_box(processed);
    let expected = [0.0, -1.0, 0.0, 1.0, 0.0, 1.0];
    for (got, want) in bb.iter().zip(expected) {
        assert!(support::approx_eq(*got, want, 1e-5), "{bb:?}");
    }
    assert_eq!(workspace.leftovers(), 0);
}

#[test]
fn replace_leaves_a_shared_mesh_to_its_other_users() {
    let workspace = Workspace::new();
    let mut scene = Scene::new();
    let shared = scene.add_mesh(support::grid("Shared", 2, 1));
    let first = scene.add_object("First", Some(shared));
    let second = scene.add_object("Second", Some(shared));

    let config = UnwrapConfig {
        replace_original: true,
        ..Default::default()
    };
    let mut report = Report::new();
    unwrapper(config, &workspace, Behavior::Unwrap)
        .run(&mut scene, &[first], &mut report)
        .expect("batch ran");

    assert!(scene.mesh(shared).is_some());
    assert_eq!(scene.users(shared), 1);
    assert_eq!(scene.object(second).and_then(|o| o.mesh), Some(shared));
    assert_ne!(scene.object(first).and_then(|o| o.mesh), Some(shared));
}

#[test]
fn keep_copies_the_unwrapped_layer_back() {
    let workspace = Workspace::new();
    let mut scene = Scene::new();
    let object = scene.add_mesh_object(support::cube("Cube"));
    let original = scene.object(object).and_then(|o| o.mesh).expect("mesh");

    let config = UnwrapConfig {
        copy_processed_uvs: true,
        ..Default::default()
    };
    let mut report = Report::new();
    let outcomes = unwrapper(config, &workspace, Behavior::Unwrap)
        .run(&mut scene, &[object], &mut report)
        .expect("batch ran");
    assert!(!outcomes[0].replaced);
    assert!(report.is_clean(), "{:?}", report.messages);

    let mesh = scene.mesh(original).expect("original kept");
    assert_eq!(scene.mesh_count(), 1);
    let layer = mesh.uv_layers.by_name(INTERNAL_LAYER).expect("unwrapped layer");
    assert_eq!(layer.len(), mesh.loop_count());
    for (l, uv) in layer.data.iter().enumerate() {
        let want = support::unwrapped_uv(l);
        assert!(support::approx_eq(uv.x, want.x, 1e-6));
        assert!(support::approx_eq(uv.y, want.y, 1e-6));
    }
}

#[test]
fn exported_original_carries_the_unwrapped_uvs() {
    let workspace = Workspace::new();
    let mut scene = Scene::new();
    let mut cube = support::cube("Cube");
    support::add_uv_layer(&mut cube, "UVMap", |_| Point2::new(0.9, 0.9));
    let object = scene.add_mesh_object(cube);

    let config = UnwrapConfig {
        copy_processed_uvs: true,
        ..Default::default()
    };
    let mut report = Report::new();
    unwrapper(config, &workspace, Behavior::Unwrap)
        .run(&mut scene, &[object], &mut report)
        .expect("batch ran");
    assert!(report.is_clean(), "{:?}", report.messages);

    let mesh = scene.object_mesh(object).expect("original kept");
    let names: Vec<&str> = mesh.uv_layers.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, ["UVMap", INTERNAL_LAYER]);
    assert_eq!(mesh.uv_layers.active().map(|l| l.name.as_str()), Some(INTERNAL_LAYER));

    let text = to_obj_string(mesh);
    assert!(!text.contains("vt 0.900000 0.900000"));
    for l in 0..mesh.loop_count() {
        let uv = support::unwrapped_uv(l);
        assert!(text.contains(&format!("vt {:.6} {:.6}\n", uv.x, uv.y)), "loop {l}");
    }
}

#[test]
fn replace_still_copies_back_to_a_shared_original() {
    let workspace = Workspace::new();
    let mut scene = Scene::new();
    let mut grid = support::grid("Shared", 2, 1);
    let index = grid.edge_index();
    grid.edges[index[&edge_key(0, 1)]].sharp = true;
    let shared = scene.add_mesh(grid);
    let first = scene.add_object("First", Some(shared));
    scene.add_object("Second", Some(shared));

    let config = UnwrapConfig {
        replace_original: true,
        copy_processed_uvs: true,
        copy_processed_sharps: true,
        ..Default::default()
    };
    let mut report = Report::new();
    let outcomes = unwrapper(config, &workspace, Behavior::Unwrap)
        .run(&mut scene, &[first], &mut report)
        .expect("batch ran");
    assert!(outcomes[0].replaced);
    assert!(report.is_clean(), "{:?}", report.messages);
    assert!(outcomes[0].phases.contains(&Phase::TransferSharpToOriginal));
    assert!(outcomes[0].phases.contains(&Phase::TransferUvToOriginal));

    let survivor = scene.mesh(shared).expect("still used by Second");
    let layer = survivor.uv_layers.active().expect("unwrapped layer");
    assert_eq!(layer.name, INTERNAL_LAYER);
    assert_eq!(layer.len(), survivor.loop_count());
    assert!(survivor.edges.iter().all(|e| !e.sharp));
}

#[test]
fn reordered_polygons_fail_the_centroid_check() {
    let workspace = Workspace::new();
    let mut scene = Scene::new();
    let object = scene.add_mesh_object(support::grid("Grid", 2, 1));
    let before = scene.object_mesh(object).cloned().expect("mesh");

    let config = UnwrapConfig {
        copy_processed_uvs: true,
        centroid_tolerance: Some(0.01),
        ..Default::default()
    };
    let mut report = Report::new();
    let outcomes = unwrapper(config.clone(), &workspace, Behavior::ReversePolygons)
        .run(&mut scene, &[object], &mut report)
        .expect("batch ran");

    assert!(outcomes[0].is_ok());
    assert_eq!(report.warnings(), 1);
    let warning = report.with_severity(Severity::Warning).next().expect("warning");
    assert!(warning.text.contains("CentroidMismatch"), "{}", warning.text);
    assert_eq!(scene.object_mesh(object), Some(&before));

    // Counts alone cannot see the reordering
    let unchecked = UnwrapConfig {
        centroid_tolerance: None,
        ..config
    };
    let mut report = Report::new();
    unwrapper(unchecked, &workspace, Behavior::ReversePolygons)
        .run(&mut scene, &[object], &mut report)
        .expect("batch ran");
    assert_eq!(report.warnings(), 0);
    let mesh = scene.object_mesh(object).expect("mesh");
    assert!(mesh.uv_layers.by_name(INTERNAL_LAYER).is_some());
}

#[test]
fn cleanup_failure_is_a_warning() {
    let workspace = Workspace::new();
    let mut scene = Scene::new();
    let a = scene.add_mesh_object(support::grid("A", 1, 1));
    let b = scene.add_mesh_object(support::grid("B", 2, 1));

    let mut report = Report::new();
    let outcomes = unwrapper(UnwrapConfig::default(), &workspace, Behavior::InputAsDirectory)
        .run(&mut scene, &[a, b], &mut report)
        .expect("batch ran");

    assert!(outcomes.iter().all(|o| o.is_ok()));
    assert!(outcomes.iter().all(|o| o.phases.last() == Some(&Phase::Cleanup)));
    assert_eq!(report.errors(), 0);
    assert_eq!(report.warnings(), 2);
    assert!(
        report
            .with_severity(Severity::Warning)
            .all(|m| m.text.contains("could not remove"))
    );
    assert_eq!(report.progress, [(1, 2), (2, 2)]);
    // the outputs are gone, the blocked inputs stay behind
    assert_eq!(workspace.leftovers(), 2);
}

#[test]
fn polygon_count_mismatch_is_one_warning() {
    let workspace = Workspace::new();
    let mut scene = Scene::new();
    let object = scene.add_mesh_object(support::grid("Grid", 2, 2));
    let before = scene.object_mesh(object).cloned().expect("mesh");

    let config = UnwrapConfig {
        copy_processed_uvs: true,
        ..Default::default()
    };
    let mut report = Report::new();
    let outcomes = unwrapper(config, &workspace, Behavior::AddPolygon)
        .run(&mut scene, &[object], &mut report)
        .expect("batch ran");

    assert!(outcomes[0].is_ok());
    assert_eq!(report.warnings(), 1);
    assert_eq!(report.errors(), 0);
    let warning = report.with_severity(Severity::Warning).next().expect("warning");
    assert!(warning.text.contains("PolygonCountMismatch"), "{}", warning.text);
    assert_eq!(scene.object_mesh(object), Some(&before));
}

#[test]
fn processed_sharps_and_source_uvs_are_transferred() {
    let workspace = Workspace::new();
    let mut scene = Scene::new();
    let mut cube = support::cube("Cube");
    support::add_uv_layer(&mut cube, "UVMap", |l| Point2::new(1.0, l as Real));
    let index = cube.edge_index();
    cube.edges[index[&edge_key(0, 1)]].sharp = true;
    let object = scene.add_mesh_object(cube);
    let original = scene.object(object).and_then(|o| o.mesh).expect("mesh");

    // Keep first: the imported mesh carries no sharp edges, so the flag is cleared
    let config = UnwrapConfig {
        copy_processed_sharps: true,
        ..Default::default()
    };
    let mut report = Report::new();
    unwrapper(config, &workspace, Behavior::Unwrap)
        .run(&mut scene, &[object], &mut report)
        .expect("batch ran");
    assert!(report.is_clean(), "{:?}", report.messages);
    let mesh = scene.mesh(original).expect("original kept");
    assert!(mesh.edges.iter().all(|e| !e.sharp));

    // Then replace, bringing the source layer along in front of the unwrapped one
    let config = UnwrapConfig {
        replace_original: true,
        copy_source_uvs: true,
        ..Default::default()
    };
    unwrapper(config, &workspace, Behavior::Unwrap)
        .run(&mut scene, &[object], &mut report)
        .expect("batch ran");
    let processed = scene.object_mesh(object).expect("processed");
    let names: Vec<&str> = processed.uv_layers.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, ["UVMap", INTERNAL_LAYER]);
    let copied = processed.uv_layers.by_name("UVMap").expect("copied layer");
    for (l, uv) in copied.data.iter().enumerate() {
        assert_eq!(*uv, Point2::new(1.0, l as Real));
    }
}

#[test]
fn every_phase_runs_in_order() {
    let workspace = Workspace::new();
    let mut scene = Scene::new();
    let object = scene.add_mesh_object(support::grid("Grid", 3, 2));

    let config = UnwrapConfig {
        sanitize_original: true,
        sanitize_processed: true,
        copy_source_uvs: true,
        copy_processed_uvs: true,
        copy_processed_sharps: true,
        ..Default::default()
    };
    let mut report = Report::new();
    let outcomes = unwrapper(config, &workspace, Behavior::Unwrap)
        .run(&mut scene, &[object], &mut report)
        .expect("batch ran");

    assert_eq!(
        outcomes[0].phases,
        [
            Phase::Validate,
            Phase::SanitizeOriginal,
            Phase::Export,
            Phase::InvokeExternalTool,
            Phase::Import,
            Phase::TransferSharpToOriginal,
            Phase::SanitizeProcessed,
            Phase::TransferUvToOriginal,
            Phase::TransferUvToProcessed,
            Phase::ReplaceOrKeep,
            Phase::Cleanup,
        ]
    );
    assert!(outcomes[0].phases.is_sorted());
}

#[test]
fn tool_receives_paths_and_flags() {
    let workspace = Workspace::new();
    let mut scene = Scene::new();
    let object = scene.add_mesh_object(support::grid("My Grid", 1, 1));
    let config = UnwrapConfig {
        resolution: 512,
        ..Default::default()
    };
    let expected_args = config.tool_arguments();

    let unwrapper = unwrapper(config, &workspace, Behavior::Unwrap);
    let mut report = Report::new();
    unwrapper
        .run(&mut scene, &[object], &mut report)
        .expect("batch ran");

    let calls = unwrapper_calls(&unwrapper);
    assert_eq!(calls.len(), 1);
    let call = &calls[0];
    assert_eq!(call.executable, workspace.settings().executable_path());
    assert_eq!(call.input, workspace.temp_dir.path().join("0_My_Grid.obj"));
    assert_eq!(call.output, workspace.temp_dir.path().join("0_My_Grid_unpacked.obj"));
    assert_eq!(call.args, expected_args);
    assert_eq!(workspace.leftovers(), 0);
}

fn unwrapper_calls(unwrapper: &Unwrapper<FakeTool>) -> Vec<support::Call> {
    unwrapper.tool().calls.borrow().clone()
}

#[test]
fn missing_executable_stops_everything() {
    let workspace = Workspace::new();
    let settings = autouv_bridge::BridgeSettings::new(workspace.temp_dir.path());
    let mut scene = Scene::new();
    let object = scene.add_mesh_object(support::grid("Grid", 1, 1));

    let tool = FakeTool::new(Behavior::Unwrap);
    let unwrapper = Unwrapper::with_tool(UnwrapConfig::default(), settings, tool);
    let mut report = Report::new();
    let err = unwrapper.run(&mut scene, &[object], &mut report).unwrap_err();

    assert!(matches!(err, UnwrapError::ExecutableNotFound(_)));
    assert_eq!(report.errors(), 1);
    assert!(report.progress.is_empty());
    assert!(unwrapper_calls(&unwrapper).is_empty());
}

#[test]
fn nothing_eligible_is_an_error() {
    let workspace = Workspace::new();
    let mut scene = Scene::new();
    let empty = scene.add_object("Empty", None);

    let mut report = Report::new();
    let err = unwrapper(UnwrapConfig::default(), &workspace, Behavior::Unwrap)
        .run(&mut scene, &[empty], &mut report)
        .unwrap_err();
    assert!(matches!(err, UnwrapError::NoEligibleInput));
    assert_eq!(report.errors(), 1);
}

#[test]
fn failing_tool_stops_only_its_mesh_and_cleans_up() {
    let workspace = Workspace::new();
    let mut scene = Scene::new();
    let a = scene.add_mesh_object(support::grid("A", 1, 1));
    let b = scene.add_mesh_object(support::grid("B", 2, 1));

    let mut report = Report::new();
    let outcomes = unwrapper(UnwrapConfig::default(), &workspace, Behavior::Fail(3))
        .run(&mut scene, &[a, b], &mut report)
        .expect("batch ran");

    assert_eq!(outcomes.len(), 2);
    for outcome in &outcomes {
        assert!(matches!(
            outcome.error,
            Some(UnwrapError::ExternalToolFailed { code: Some(3) })
        ));
        assert_eq!(
            outcome.phases,
            [Phase::Validate, Phase::Export, Phase::InvokeExternalTool, Phase::Cleanup]
        );
    }
    assert_eq!(report.errors(), 2);
    assert_eq!(report.progress, [(1, 2), (2, 2)]);
    assert_eq!(workspace.leftovers(), 0);
}

#[test]
fn missing_output_is_an_import_error() {
    let workspace = Workspace::new();
    let mut scene = Scene::new();
    let object = scene.add_mesh_object(support::grid("Grid", 1, 1));

    let mut report = Report::new();
    let outcomes = unwrapper(UnwrapConfig::default(), &workspace, Behavior::NoOutput)
        .run(&mut scene, &[object], &mut report)
        .expect("batch ran");
    assert!(matches!(outcomes[0].error, Some(UnwrapError::Io(_))));
    assert_eq!(workspace.leftovers(), 0);
}

#[test]
fn broken_mesh_does_not_stop_the_batch() {
    let workspace = Workspace::new();
    let mut scene = Scene::new();
    let mut broken = support::grid("Broken", 1, 1);
    broken.polygons[0].loop_total = 9;
    let a = scene.add_mesh_object(broken);
    let b = scene.add_mesh_object(support::grid("Fine", 1, 1));

    let mut report = Report::new();
    let outcomes = unwrapper(UnwrapConfig::default(), &workspace, Behavior::Unwrap)
        .run(&mut scene, &[a, b], &mut report)
        .expect("batch ran");

    assert!(matches!(outcomes[0].error, Some(UnwrapError::InvalidMesh(_))));
    assert_eq!(outcomes[0].phases, [Phase::Validate, Phase::Cleanup]);
    assert!(outcomes[1].is_ok());
    assert_eq!(report.progress, [(1, 2), (2, 2)]);
}
