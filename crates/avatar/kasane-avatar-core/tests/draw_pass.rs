use kasane_avatar_core::{
    Avatar, BlendMode, Config, DrawableDef, MaskCombine, MeshId, ModelData, Renderer, StencilTest,
    Transform2D,
};
use kasane_test_fixtures::{models, RecordingRenderer, RenderEvent};

fn quad(id: &str, order: i32, blend: BlendMode, masks: Vec<usize>) -> DrawableDef {
    DrawableDef {
        id: id.into(),
        part: None,
        texture_slot: 0,
        blend_mode: blend,
        render_order: order,
        positions: vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
        uvs: vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
        indices: vec![0, 1, 2, 2, 3, 0],
        masks,
        deforms: Vec::new(),
        opacity: None,
        visibility: None,
        order_shift: None,
        base_opacity: 1.0,
    }
}

fn mk_model(drawables: Vec<DrawableDef>) -> ModelData {
    ModelData {
        name: "m".into(),
        canvas: [2.0, 2.0],
        parameters: Vec::new(),
        parts: Vec::new(),
        drawables,
    }
}

/// it should issue one stencil pre-pass per referenced mask and restore blend state
#[test]
fn masked_drawable_single_pre_pass_and_blend_restore() {
    let mut renderer = RecordingRenderer::new();
    let mut avatar = Avatar::from_model(
        models::data("mascot").expect("fixture model"),
        &mut renderer,
        Config::default(),
    )
    .expect("avatar should build");

    let before = renderer.blend_mode();
    avatar.update(0.016);
    renderer.clear_events();
    avatar.draw(&mut renderer, &Transform2D::default()).unwrap();

    // DrawEyeL has exactly one mask reference.
    assert_eq!(renderer.mask_passes(), 1);
    assert_eq!(renderer.blend_mode(), before);
    // The mask pass draws the mask mesh (drawable 1), not the eye itself.
    let mask_draws: Vec<MeshId> = renderer
        .events
        .iter()
        .filter_map(|e| match e {
            RenderEvent::DrawMesh {
                mesh,
                in_mask_pass: true,
            } => Some(*mesh),
            _ => None,
        })
        .collect();
    assert_eq!(mask_draws, vec![MeshId(1)]);
}

/// it should draw every drawable in resolved order
#[test]
fn draws_follow_resolved_order() {
    let mut renderer = RecordingRenderer::new();
    let mut avatar = Avatar::from_model(
        models::data("mascot").expect("fixture model"),
        &mut renderer,
        Config::default(),
    )
    .expect("avatar should build");
    avatar.update(0.016);
    renderer.clear_events();
    avatar.draw(&mut renderer, &Transform2D::default()).unwrap();

    let drawn = renderer.drawn_meshes();
    let expected: Vec<MeshId> = avatar.draw_order().iter().map(|&i| MeshId(i as u32)).collect();
    assert_eq!(drawn, expected);
}

/// it should composite nested masks post-order before the real draw
#[test]
fn nested_masks_composite_recursively() {
    // c is masked by b, which is itself masked by a.
    let data = mk_model(vec![
        quad("a", 0, BlendMode::Normal, Vec::new()),
        quad("b", 1, BlendMode::Normal, vec![0]),
        quad("c", 2, BlendMode::Normal, vec![1]),
    ]);
    let mut renderer = RecordingRenderer::new();
    let mut avatar = Avatar::from_model(data, &mut renderer, Config::default()).unwrap();
    avatar.update(0.016);
    renderer.clear_events();
    avatar.draw(&mut renderer, &Transform2D::default()).unwrap();

    // b's own pre-pass: 1 (mask a). c's pre-pass: a then b = 2. Total 3.
    assert_eq!(renderer.mask_passes(), 3);

    // For c, the mask draws must arrive post-order: a before b.
    let mask_draws: Vec<MeshId> = renderer
        .events
        .iter()
        .filter_map(|e| match e {
            RenderEvent::DrawMesh {
                mesh,
                in_mask_pass: true,
            } => Some(*mesh),
            _ => None,
        })
        .collect();
    assert_eq!(mask_draws, vec![MeshId(0), MeshId(0), MeshId(1)]);
}

/// it should require all masks by default and any mask when configured
#[test]
fn mask_combine_all_vs_any() {
    let data = mk_model(vec![
        quad("a", 0, BlendMode::Normal, Vec::new()),
        quad("b", 1, BlendMode::Normal, Vec::new()),
        quad("c", 2, BlendMode::Normal, vec![0, 1]),
    ]);

    let mut renderer = RecordingRenderer::new();
    let mut avatar =
        Avatar::from_model(data.clone(), &mut renderer, Config::default()).unwrap();
    avatar.update(0.016);
    renderer.clear_events();
    avatar.draw(&mut renderer, &Transform2D::default()).unwrap();
    assert!(renderer
        .events
        .contains(&RenderEvent::SetStencilTest(StencilTest::AtLeast(2))));

    let cfg = Config {
        mask_combine: MaskCombine::Any,
        ..Config::default()
    };
    let mut renderer = RecordingRenderer::new();
    let mut avatar = Avatar::from_model(data, &mut renderer, cfg).unwrap();
    avatar.update(0.016);
    renderer.clear_events();
    avatar.draw(&mut renderer, &Transform2D::default()).unwrap();
    assert!(renderer
        .events
        .contains(&RenderEvent::SetStencilTest(StencilTest::AtLeast(1))));
}

/// it should disable the stencil test after each masked drawable
#[test]
fn stencil_test_disabled_between_drawables() {
    let data = mk_model(vec![
        quad("a", 0, BlendMode::Normal, Vec::new()),
        quad("b", 1, BlendMode::Normal, vec![0]),
        quad("c", 2, BlendMode::Normal, Vec::new()),
    ]);
    let mut renderer = RecordingRenderer::new();
    let mut avatar = Avatar::from_model(data, &mut renderer, Config::default()).unwrap();
    avatar.update(0.016);
    renderer.clear_events();
    avatar.draw(&mut renderer, &Transform2D::default()).unwrap();

    // After b's real draw, the stencil test must be off before c draws.
    let b_draw = renderer
        .events
        .iter()
        .position(|e| matches!(e, RenderEvent::DrawMesh { mesh: MeshId(1), in_mask_pass: false }))
        .unwrap();
    let c_draw = renderer
        .events
        .iter()
        .position(|e| matches!(e, RenderEvent::DrawMesh { mesh: MeshId(2), in_mask_pass: false }))
        .unwrap();
    let disabled_between = renderer.events[b_draw..c_draw]
        .iter()
        .any(|e| matches!(e, RenderEvent::SetStencilTest(StencilTest::Disabled)));
    assert!(disabled_between);
}

/// it should only re-issue blend modes when the mode actually changes
#[test]
fn blend_switches_are_minimized() {
    let data = mk_model(vec![
        quad("n0", 0, BlendMode::Normal, Vec::new()),
        quad("a1", 1, BlendMode::Additive, Vec::new()),
        quad("a2", 2, BlendMode::Additive, Vec::new()),
        quad("m3", 3, BlendMode::Multiplicative, Vec::new()),
        quad("n4", 4, BlendMode::Normal, Vec::new()),
    ]);
    let mut renderer = RecordingRenderer::new();
    let mut avatar = Avatar::from_model(data, &mut renderer, Config::default()).unwrap();
    avatar.update(0.016);
    renderer.clear_events();
    avatar.draw(&mut renderer, &Transform2D::default()).unwrap();

    // Normal (already set) -> Additive -> Multiplicative -> Normal: 3 switches,
    // none of them redundant, and no trailing restore since we end on Normal.
    assert_eq!(renderer.blend_switches(), 3);
    assert_eq!(renderer.blend_mode(), BlendMode::Normal);
}

/// it should restore a non-default ambient blend mode after drawing
#[test]
fn ambient_blend_mode_is_restored() {
    let data = mk_model(vec![quad("n0", 0, BlendMode::Normal, Vec::new())]);
    let mut renderer = RecordingRenderer::new();
    let mut avatar = Avatar::from_model(data, &mut renderer, Config::default()).unwrap();
    avatar.update(0.016);
    renderer.set_blend_mode(BlendMode::Additive);
    avatar.draw(&mut renderer, &Transform2D::default()).unwrap();
    assert_eq!(renderer.blend_mode(), BlendMode::Additive);
}

/// it should reject mask cycles at load time
#[test]
fn mask_cycles_rejected_at_load() {
    let data = mk_model(vec![
        quad("a", 0, BlendMode::Normal, vec![1]),
        quad("b", 1, BlendMode::Normal, vec![0]),
    ]);
    let mut renderer = RecordingRenderer::new();
    assert!(Avatar::from_model(data, &mut renderer, Config::default()).is_err());
}

/// it should reject nesting beyond the configured mask depth
#[test]
fn mask_depth_limit_enforced() {
    let data = mk_model(vec![
        quad("a", 0, BlendMode::Normal, Vec::new()),
        quad("b", 1, BlendMode::Normal, vec![0]),
        quad("c", 2, BlendMode::Normal, vec![1]),
        quad("d", 3, BlendMode::Normal, vec![2]),
    ]);
    let cfg = Config {
        max_mask_depth: 2,
        ..Config::default()
    };
    let mut renderer = RecordingRenderer::new();
    assert!(Avatar::from_model(data, &mut renderer, cfg).is_err());
}
