mod common;

use bigsprite::shape::{Extents, PerDirection};
use bigsprite::{resolve, Direction, Grid, ShapeSpec, Tile};
use common::{load_all_fixtures, tile_set, visualize};
use rstest::rstest;

#[test]
fn test_shape_fixtures() {
    let grid = Grid::new(40, 40).with_loops(false, false);
    let fixtures = load_all_fixtures();
    assert!(fixtures.len() >= 6, "fixtures went missing");

    for fixture in fixtures {
        println!("\n=== Fixture: {} ===", fixture.name);
        let actual = fixture.shape.footprint(fixture.anchor, fixture.facing);
        println!("{}", visualize(&grid, &actual));

        if fixture.ordered {
            assert_eq!(actual, fixture.expected, "fixture {}", fixture.name);
        } else {
            assert_eq!(tile_set(&actual), tile_set(&fixture.expected), "fixture {}", fixture.name);
            assert_eq!(actual.len(), fixture.expected.len(), "fixture {} has duplicates", fixture.name);
        }
    }
}

#[test]
fn test_square_b_end_to_end() {
    let shape = ShapeSpec::rectangle_b(7, 1, 1, 1, 0);
    assert_eq!(shape.shifted_anchor_y(10), 7);
    let tiles = shape.footprint(Tile::new(10, 10), Direction::Down);
    assert_eq!(
        tiles,
        vec![
            Tile::new(9, 6),
            Tile::new(10, 6),
            Tile::new(9, 7),
            Tile::new(10, 7),
            Tile::new(9, 8),
            Tile::new(10, 8),
        ]
    );
}

#[test]
fn test_circle_radius_four_membership() {
    // sprite size 1 keeps the shifted anchor on the logical one
    let tiles = ShapeSpec::circle(1, 4).footprint(Tile::new(0, 0), Direction::Down);
    for t in [(4, 0), (0, 4), (-4, 0), (0, -4), (4, 1), (3, 2), (2, 3), (0, 0)] {
        assert!(tiles.contains(&Tile::from(t)), "missing {:?}", t);
    }
    for t in [(3, 3), (-3, -3), (1, 1), (2, 2), (4, 2)] {
        assert!(!tiles.contains(&Tile::from(t)), "unexpected {:?}", t);
    }
}

#[rstest]
#[case(0, 1)]
#[case(1, 5)]
#[case(2, 13)]
#[case(3, 25)]
#[case(5, 61)]
fn test_diamond_tile_count(#[case] radius: i32, #[case] count: usize) {
    assert_eq!(count as i32, 2 * radius * radius + 2 * radius + 1);
    for facing in Direction::ALL {
        let tiles = ShapeSpec::diamond(3, radius).footprint(Tile::new(8, 8), facing);
        assert_eq!(tiles.len(), count);
        // centred on the shifted anchor
        assert!(tiles.contains(&Tile::new(8, 7)));
    }
}

#[rstest]
#[case(0, 0, 0)]
#[case(1, 0, 0)]
#[case(0, 2, 1)]
#[case(3, 1, 1)]
#[case(2, 4, 0)]
fn test_rectangle_a_tile_count(#[case] back: i32, #[case] left: i32, #[case] right: i32) {
    let anchor = Tile::new(10, 10);
    let tiles = ShapeSpec::rectangle_a(back, left, right).footprint(anchor, Direction::Up);
    assert_eq!(tiles.len() as i32, (back + 1) * (left + right + 1));
    assert!(tiles.contains(&anchor));
    assert!(tiles.iter().all(|t| t.y <= anchor.y));
}

#[test]
fn test_custom_per_direction_includes_anchor_every_facing() {
    let shape = ShapeSpec::custom(PerDirection::new(
        Extents::new(1, 0, 0),
        Extents::new(0, 2, 0),
        Extents::new(0, 0, 2),
        Extents::new(3, 1, 1),
    ));
    let anchor = Tile::new(5, 5);
    let counts = [2, 3, 3, 12];
    for (facing, count) in Direction::ALL.into_iter().zip(counts) {
        let tiles = shape.footprint(anchor, facing);
        assert!(tiles.contains(&anchor), "{:?}", facing);
        assert_eq!(tiles.len(), count, "{:?}", facing);
    }
}

#[test]
fn test_resolve_is_idempotent() {
    let grid = Grid::new(12, 12).with_loops(true, true);
    let shape = ShapeSpec::circle(3, 3);
    let first = resolve(Tile::new(1, 1), Direction::Right, &shape, &grid);
    let second = resolve(Tile::new(1, 1), Direction::Right, &shape, &grid);
    assert_eq!(first, second);
    assert!(first.iter().all(|t| grid_contains(&grid, *t)));
}

#[test]
fn test_wrapped_body_straddles_the_seam() {
    let grid = Grid::new(10, 10).with_loops(true, false);
    let tiles = resolve(Tile::new(0, 5), Direction::Down, &ShapeSpec::rectangle_a(0, 1, 1), &grid);
    assert_eq!(tiles, vec![Tile::new(9, 5), Tile::new(0, 5), Tile::new(1, 5)]);
}

fn grid_contains(grid: &Grid, tile: Tile) -> bool {
    tile.x >= 0 && tile.x < grid.width && tile.y >= 0 && tile.y < grid.height
}
