//! End-to-end descriptor loading

use std::collections::VecDeque;

use glam::Vec2;
use tilesection::level::{SectionId, StageTables, SwitchState};
use tilesection::sim::{BorderExit, RampDir};
use tilesection::{LoadError, parse_section};

const CELL: f32 = 32.0;

#[test]
fn header_declares_grid_shape() {
    let mut tables = StageTables::default();
    let layout = parse_section("5,5,4,1,song###", SectionId(0), CELL, &mut tables).expect("valid");
    assert_eq!(layout.grid.width(), 5);
    assert_eq!(layout.grid.height(), 5);
    assert_eq!(layout.grid.border_exit, BorderExit::None);
    assert!(!layout.grid.dark);
    assert_eq!(layout.grid.pixel_size(), Vec2::new(160.0, 160.0));
}

#[test]
fn grid_dimensions_match_header_for_many_sizes() {
    for (w, h) in [(1, 1), (7, 3), (40, 19), (120, 60)] {
        let mut tables = StageTables::default();
        let descriptor = format!("{w},{h},0,2,theme#sky#w01*3#");
        let layout = parse_section(&descriptor, SectionId(0), CELL, &mut tables).expect("valid");
        assert_eq!((layout.grid.width(), layout.grid.height()), (w, h));
    }
}

#[test]
fn switch_index_two_resolves_taken() {
    let mut tables = StageTables::default();
    tables.pending.taken = VecDeque::from(vec![2]);
    // Three Key placements (catalog index 56) get switch indices 0, 1, 2
    parse_section("4,1,4,1,song##@56;@56;@56#", SectionId(0), CELL, &mut tables).expect("valid");

    let slot = tables.switches[2].switch.expect("switch slot");
    assert_eq!(slot.index, 2);
    assert_eq!(slot.state, SwitchState::Taken);
    assert_eq!(tables.switches[0].switch.map(|s| s.state), Some(SwitchState::Normal));
}

#[test]
fn every_ramp_end_resolves_to_its_ramp() {
    let mut tables = StageTables::default();
    let layout = parse_section(
        "12,6,4,1,song###l21:0,5;r31:8,5;l'12:4,2;r11:11,0",
        SectionId(0),
        CELL,
        &mut tables,
    )
    .expect("valid");

    assert_eq!(layout.ramps.len(), 4);
    let ends: Vec<_> = layout
        .grid
        .cells()
        .filter(|(_, _, t)| t.ramp_end)
        .map(|(x, y, _)| (x, y))
        .collect();
    assert_eq!(ends.len(), 4);

    for end in &ends {
        let owners: Vec<_> = layout
            .ramps
            .iter()
            .filter(|r| r.end_cell() == Some(*end))
            .collect();
        assert_eq!(owners.len(), 1, "ramp end {end:?} must pair with exactly one ramp");

        // The ramp's far edge touches the ramp-end cell
        let ramp = owners[0];
        let end_x = end.0 as f32 * CELL;
        match ramp.dir {
            RampDir::Left => assert_eq!(ramp.pos.x + ramp.size.x, end_x),
            RampDir::Right => assert_eq!(ramp.pos.x, end_x + CELL),
        }
    }
}

#[test]
fn mixed_section_loads() {
    let mut tables = StageTables::default();
    let descriptor = "6,4,1,3,boss,dark#sky,cave!#_6;w01*6;b02p03;!0!;f05h00@42:1;_1;w02*4#l11:0,1";
    let layout = parse_section(descriptor, SectionId(4), CELL, &mut tables).expect("valid");

    assert!(layout.grid.dark);
    assert_eq!(layout.grid.border_exit, BorderExit::Right);
    assert_eq!(layout.backgrounds.len(), 2);
    assert!(!layout.backgrounds[1].repeat_y);

    // Row 1 is solid floor
    assert!((0..6).all(|x| layout.grid.tile(x, 1).is_some_and(|t| t.wall == Some(1))));
    let packed = layout.grid.tile(0, 2).expect("in grid");
    assert_eq!((packed.back, packed.pass), (Some(2), Some(3)));

    assert_eq!(layout.default_entrance, Some(0));
    assert_eq!(tables.entrances[&0].pos, Vec2::new(32.0, 64.0));

    let goal = &layout.placements[0];
    assert_eq!(goal.cell, (2, 2));
    assert_eq!(goal.args.as_deref(), Some("1"));
    assert_eq!(layout.grid.tile(2, 2).and_then(|t| t.hide), Some(0));

    assert!(layout.grid.tile(1, 1).is_some_and(|t| t.ramp_end));
    // The last run wraps from the end of row 2 onto row 3
    for cell in [(4, 2), (5, 2), (0, 3), (1, 3)] {
        assert_eq!(layout.grid.tile(cell.0, cell.1).and_then(|t| t.wall), Some(2));
    }
    assert_eq!(layout.grid.tile(2, 3).and_then(|t| t.wall), None);
}

#[test]
fn unknown_type_aborts_loading() {
    let mut tables = StageTables::default();
    let result = parse_section("3,3,4,1,song##_2;@500#", SectionId(0), CELL, &mut tables);
    match result {
        Err(LoadError::UnknownElementType { index, token }) => {
            assert_eq!(index, 500);
            assert_eq!(token, "@500");
        }
        other => panic!("expected unknown element type, got {other:?}"),
    }
}
