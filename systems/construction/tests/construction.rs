use civitas_core::{CellCoord, CitizenTerrain, Command, Event, RoutedBuilding, TerrainFlags};
use civitas_system_construction::{Construction, ConstructionDrag, ConstructionInput};
use civitas_system_routing::Router;
use civitas_world::{apply, layout, query, World};

fn map_configured(world: &World) -> Event {
    let geometry = query::geometry(world);
    Event::MapConfigured {
        width: geometry.width(),
        height: geometry.height(),
    }
}

fn drag(
    kind: RoutedBuilding,
    start: (u32, u32),
    end: (u32, u32),
    confirm: bool,
) -> ConstructionInput {
    ConstructionInput {
        drag: Some(ConstructionDrag::new(
            kind,
            CellCoord::new(start.0, start.1),
            CellCoord::new(end.0, end.1),
        )),
        confirm_action: confirm,
    }
}

#[test]
fn input_is_ignored_until_a_map_is_configured() {
    let world = layout::parse("....\n....").expect("layout");
    let mut construction = Construction::new();
    let mut router = Router::default();
    let mut commands = Vec::new();

    construction.handle(
        &[],
        drag(RoutedBuilding::Road, (0, 0), (3, 0), true),
        &mut router,
        &world,
        &mut commands,
    );

    assert!(commands.is_empty(), "no map, no construction");
    assert!(construction.preview().is_none());
    assert_eq!(router.stats().total_routes_calculated(), 0);
}

#[test]
fn confirmed_road_drag_is_built_around_obstacles() {
    let mut world = layout::parse(
        ".....\n\
         ..^..\n\
         .....",
    )
    .expect("layout");
    let mut construction = Construction::new();
    let mut router = Router::default();
    let mut commands = Vec::new();

    construction.handle(
        &[map_configured(&world)],
        drag(RoutedBuilding::Road, (0, 1), (4, 1), true),
        &mut router,
        &world,
        &mut commands,
    );

    let [Command::Construct { kind, cells }] = commands.as_slice() else {
        panic!("expected a single construct command, got {commands:?}");
    };
    assert_eq!(*kind, RoutedBuilding::Road);
    assert_eq!(cells.len(), 7, "detour around the rock");
    assert_eq!(cells.first(), Some(&CellCoord::new(0, 1)));
    assert_eq!(cells.last(), Some(&CellCoord::new(4, 1)));
    assert!(!cells.contains(&CellCoord::new(2, 1)));

    let mut events = Vec::new();
    for command in commands {
        apply(&mut world, command, &mut events);
    }
    assert_eq!(
        query::citizen_at(&world, CellCoord::new(4, 1)),
        Some(CitizenTerrain::Road)
    );
    assert!(construction.preview().is_none());
}

#[test]
fn unconfirmed_drag_only_previews() {
    let world = layout::parse("......").expect("layout");
    let mut construction = Construction::new();
    let mut router = Router::default();
    let mut commands = Vec::new();

    construction.handle(
        &[map_configured(&world)],
        drag(RoutedBuilding::Wall, (0, 0), (5, 0), false),
        &mut router,
        &world,
        &mut commands,
    );

    assert!(commands.is_empty());
    let preview = construction.preview().expect("preview computed");
    assert!(preview.placeable);
    assert_eq!(preview.cells.len(), 6);

    construction.handle(
        &[],
        ConstructionInput::default(),
        &mut router,
        &world,
        &mut commands,
    );
    assert!(construction.preview().is_none(), "releasing the drag clears the preview");
}

#[test]
fn illegal_start_is_not_placeable() {
    let world = layout::parse("r....").expect("layout");
    let mut construction = Construction::new();
    let mut router = Router::default();
    let mut commands = Vec::new();

    construction.handle(
        &[map_configured(&world)],
        drag(RoutedBuilding::Aqueduct, (0, 0), (4, 0), true),
        &mut router,
        &world,
        &mut commands,
    );

    assert!(commands.is_empty(), "rubble cannot start an aqueduct");
    let preview = construction.preview().expect("preview computed");
    assert!(!preview.placeable);
    assert!(preview.cells.is_empty());
}

#[test]
fn unreachable_end_is_not_placeable() {
    let world = layout::parse("..^..").expect("layout");
    let mut construction = Construction::new();
    let mut router = Router::default();
    let mut commands = Vec::new();

    construction.handle(
        &[map_configured(&world)],
        drag(RoutedBuilding::Road, (0, 0), (4, 0), true),
        &mut router,
        &world,
        &mut commands,
    );

    assert!(commands.is_empty());
    assert_eq!(
        construction.preview().map(|preview| preview.placeable),
        Some(false)
    );
}

#[test]
fn terrain_changes_invalidate_the_preview() {
    let mut world = layout::parse("....").expect("layout");
    let mut construction = Construction::new();
    let mut router = Router::default();
    let mut commands = Vec::new();

    construction.handle(
        &[map_configured(&world)],
        drag(RoutedBuilding::Road, (0, 0), (3, 0), false),
        &mut router,
        &world,
        &mut commands,
    );
    assert!(construction.preview().is_some());

    let mut events = Vec::new();
    apply(
        &mut world,
        Command::AddTerrain {
            region: civitas_core::CellRect::single(CellCoord::new(2, 0)),
            flags: TerrainFlags::ROCK,
        },
        &mut events,
    );
    construction.handle(
        &events,
        drag(RoutedBuilding::Road, (0, 0), (3, 0), false),
        &mut router,
        &world,
        &mut commands,
    );
    assert_eq!(
        construction.preview().map(|preview| preview.placeable),
        Some(false),
        "rock now splits the drag"
    );
}
