use hue_core::{
    ActiveSolidityView, Cell, CellCoord, CellKind, CellRecord, Color, ColorMask, ColorState,
    CollisionEvent, ContactResponse, GridBounds, GridCollider, InputAction, InputSnapshot,
    LevelDescription, LevelSession, Pawn, SessionConfig, StopOnContact, TileGrid,
    TrajectoryDigest, Vec2, MAX_RESOLUTION_PASSES,
};

const DT: f64 = 1.0 / 60.0;

/// A walled room with a ledge, a jump-through shelf, a spike and a red block.
fn obstacle_course() -> LevelDescription {
    let mut cells = (0..24).map(|x| CellRecord::block(x, 10)).collect::<Vec<_>>();
    cells.extend((6..10).map(|y| CellRecord::block(8, y)));
    cells.extend((12..16).map(|x| CellRecord::block(x, 7).with_kind(CellKind::PassThrough)));
    cells.push(CellRecord::block(17, 9).with_kind(CellKind::Spike));
    cells.push(CellRecord::colored(20, 9, Color::Red));
    cells.push(CellRecord::colored(21, 8, Color::Red));
    LevelDescription {
        bounds: GridBounds::new(24, 12),
        cells,
        entities: Vec::new(),
        spawn: CellCoord::new(2, 8),
    }
}

fn scripted_input(step: usize) -> InputSnapshot {
    let phase = step % 150;
    let mut input = if phase < 90 {
        InputSnapshot::empty().with_action_down(InputAction::MoveRight)
    } else {
        InputSnapshot::empty().with_action_down(InputAction::MoveLeft)
    };
    if phase % 23 == 0 {
        input = input.with_jump_pressed();
    }
    if step % 211 == 105 {
        input = input.with_toggle_pressed(Color::Red);
    }
    input
}

fn run_course(steps: usize, mut on_step: impl FnMut(&LevelSession)) -> TrajectoryDigest {
    let mut session =
        LevelSession::new(&obstacle_course(), SessionConfig::default()).expect("session");
    session.unlock_color(Color::Red);
    let mut digest = TrajectoryDigest::new();
    for step in 0..steps {
        let result = session.step(&scripted_input(step), DT);
        digest.record(&result.outcome);
        on_step(&session);
    }
    digest
}

#[test]
fn pawn_never_ends_a_step_inside_a_solid_cell() {
    run_course(1200, |session| {
        let pawn = session.controller().pawn();
        let overlapping = session.collider().collide_pawn(&pawn);
        assert!(
            overlapping.is_empty(),
            "pawn at {:?} overlaps {:?} after step {}",
            pawn.pos,
            overlapping,
            session.steps()
        );
    });
}

#[test]
fn identical_runs_produce_identical_trajectories() {
    let first = run_course(900, |_| {});
    let second = run_course(900, |_| {});
    assert_eq!(first.steps(), 900);
    assert_eq!(first.finish(), second.finish());

    let shorter = run_course(899, |_| {});
    assert_ne!(first.finish(), shorter.finish());
}

#[test]
fn collide_pawn_is_idempotent() {
    let grid = TileGrid::new(
        GridBounds::new(8, 8),
        [
            (CellCoord::new(2, 2), Cell::block()),
            (CellCoord::new(3, 2), Cell::colored(Color::Green)),
        ],
    )
    .expect("grid");
    let colors = ColorState::default();
    let collider = GridCollider::new(ActiveSolidityView::new(&grid, &colors));
    let pawn = Pawn::new(Vec2::new(2.5, 1.5), Vec2::new(1.0, 1.0));
    let first = collider.collide_pawn(&pawn);
    assert_eq!(first.len(), 2);
    assert_eq!(first, collider.collide_pawn(&pawn));
}

#[test]
fn sweep_stops_clear_of_every_wall_in_a_room() {
    let mut cells = Vec::new();
    for i in 0..10 {
        cells.push((CellCoord::new(i, 0), Cell::block()));
        cells.push((CellCoord::new(i, 9), Cell::block()));
        cells.push((CellCoord::new(0, i), Cell::block()));
        cells.push((CellCoord::new(9, i), Cell::block()));
    }
    let cells = cells
        .into_iter()
        .collect::<std::collections::BTreeMap<_, _>>();
    let grid = TileGrid::new(GridBounds::new(10, 10), cells).expect("grid");
    let colors = ColorState::default();
    let collider = GridCollider::new(ActiveSolidityView::new(&grid, &colors));
    let pawn = Pawn::new(Vec2::new(4.25, 4.5), Vec2::new(1.0, 1.0));

    for delta in [
        Vec2::new(20.0, 0.0),
        Vec2::new(-20.0, 3.0),
        Vec2::new(7.0, 7.0),
        Vec2::new(-3.5, -12.0),
        Vec2::new(0.0, 30.0),
    ] {
        let resolution = collider.resolve_motion(&pawn, delta, &mut StopOnContact);
        assert!(!resolution.cap_hit, "{delta:?}");
        assert!(resolution.passes <= 3, "{delta:?}");
        let end = pawn.at(resolution.position);
        assert!(collider.collide_pawn(&end).is_empty(), "{delta:?} ended inside a wall");
        for event in &resolution.events {
            assert!(event.previous_t < event.t);
        }
    }
}

/// Sends the pawn back the way it came after every contact.
struct Bounce;

impl ContactResponse for Bounce {
    fn respond(&mut self, _event: &CollisionEvent, remaining: Vec2) -> Vec2 {
        Vec2::new(-remaining.x, remaining.y)
    }
}

#[test]
fn resolution_stops_at_the_pass_cap() {
    let grid = TileGrid::new(
        GridBounds::new(4, 1),
        [
            (CellCoord::new(0, 0), Cell::block()),
            (CellCoord::new(3, 0), Cell::block()),
        ],
    )
    .expect("grid");
    let colors = ColorState::default();
    let collider = GridCollider::new(ActiveSolidityView::new(&grid, &colors));
    let pawn = Pawn::new(Vec2::new(1.0, 0.0), Vec2::new(1.0, 1.0));

    let resolution = collider.resolve_motion(&pawn, Vec2::new(10.0, 0.0), &mut Bounce);
    assert!(resolution.cap_hit);
    assert_eq!(resolution.passes, MAX_RESOLUTION_PASSES);
    assert_eq!(resolution.events.len(), MAX_RESOLUTION_PASSES);
    assert!(collider.collide_pawn(&pawn.at(resolution.position)).is_empty());
}

#[test]
fn every_secondary_moves_its_group_together() {
    for secondary in [Color::Orange, Color::Green, Color::Purple] {
        let mut colors = ColorState::default();
        let changed = colors.toggle(secondary);
        let group = secondary.linked_primaries();
        assert_eq!(changed, ColorMask::of(&[secondary, group[0], group[1]]));
        assert!(changed.iter().all(|color| !colors.is_enabled(color)));

        let changed = colors.toggle(secondary);
        assert_eq!(changed.len(), 3);
        assert!(changed.iter().all(|color| colors.is_enabled(color)));
    }
}

#[test]
fn unstable_color_returns_after_revert_time() {
    let mut colors = ColorState::default();
    colors.toggle(Color::Blue);
    let mut reverted = ColorMask::EMPTY;
    let mut elapsed = 0.0;
    while reverted.is_empty() {
        reverted = colors.tick(DT);
        elapsed += DT;
        assert!(elapsed < 2.0, "blue never reverted");
    }
    assert!(elapsed >= 1.8 - 1e-9);
    assert_eq!(reverted, ColorMask::of(&[Color::Blue]));
    assert!(colors.is_enabled(Color::Blue));
}
