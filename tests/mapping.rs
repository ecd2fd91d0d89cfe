#![allow(missing_docs)]
//! Host-level tests for the logical-to-physical coordinate transform.

use std::collections::HashSet;

use matrix_envoy::Result;
use matrix_envoy::panel::{Corner, LedAddress, Panel, PanelLayout, Point};

fn locate(layout: &PanelLayout, column: usize, line: usize) -> (usize, usize) {
    let address = layout.locate(Point::new(column, line));
    (address.strip_index, address.led_index)
}

#[test]
fn reference_layout_corners_match_expected() -> Result<()> {
    let layout = PanelLayout::reference()?;
    assert_eq!(locate(&layout, 0, 0), (0, 0));
    assert_eq!(locate(&layout, 1, 0), (0, 1));
    assert_eq!(locate(&layout, 79, 0), (1, 0));
    assert_eq!(locate(&layout, 78, 0), (1, 1));
    assert_eq!(locate(&layout, 79, 1), (1, 79));
    assert_eq!(locate(&layout, 78, 1), (1, 78));
    assert_eq!(locate(&layout, 0, 21), (2, 0));
    assert_eq!(locate(&layout, 1, 21), (2, 1));
    assert_eq!(locate(&layout, 79, 21), (3, 0));
    assert_eq!(locate(&layout, 40, 11), (3, 439));
    Ok(())
}

#[test]
fn mirrored_panel_starts_at_top_right() -> Result<()> {
    let layout = PanelLayout::reference()?;
    assert_eq!(layout.locate(Point::new(79, 0)), LedAddress::new(1, 0));
    Ok(())
}

#[test]
fn reference_layout_dimensions() -> Result<()> {
    let layout = PanelLayout::reference()?;
    assert_eq!(layout.columns(), 80);
    assert_eq!(layout.lines(), 22);
    assert_eq!(layout.panel_columns(), 2);
    assert_eq!(layout.panel_rows(), 2);
    assert_eq!(layout.cells_per_panel(), 440);
    assert_eq!(layout.cells(), 1760);
    Ok(())
}

#[test]
fn panel_corners_are_exclusive_on_east_and_south() -> Result<()> {
    let layout = PanelLayout::reference()?;
    assert_eq!(layout.panel_corner(0, 0, Corner::NorthWest), Point::new(0, 0));
    assert_eq!(layout.panel_corner(0, 0, Corner::NorthEast), Point::new(40, 0));
    assert_eq!(layout.panel_corner(0, 0, Corner::SouthEast), Point::new(40, 11));
    assert_eq!(layout.panel_corner(0, 0, Corner::SouthWest), Point::new(0, 11));
    assert_eq!(layout.panel_corner(1, 1, Corner::NorthWest), Point::new(40, 11));
    Ok(())
}

#[test]
fn find_panel_returns_panel_and_offset() -> Result<()> {
    let layout = PanelLayout::reference()?;

    let (panel, in_panel) = layout.find_panel(Point::new(0, 0));
    assert_eq!((panel.strip_index, panel.start), (0, Corner::NorthWest));
    assert_eq!(in_panel, Point::new(0, 0));

    let (panel, in_panel) = layout.find_panel(Point::new(79, 0));
    assert_eq!((panel.strip_index, panel.start), (1, Corner::NorthEast));
    assert_eq!(in_panel, Point::new(39, 0));

    let (panel, in_panel) = layout.find_panel(Point::new(41, 12));
    assert_eq!((panel.strip_index, panel.start), (3, Corner::SouthEast));
    assert_eq!(in_panel, Point::new(1, 1));
    Ok(())
}

#[test]
fn every_point_lands_on_its_panel_strip_in_range() -> Result<()> {
    let layout = PanelLayout::reference()?;
    let cells = layout.cells_per_panel();
    for line in 0..layout.lines() {
        for column in 0..layout.columns() {
            let point = Point::new(column, line);
            let (panel, _) = layout.find_panel(point);
            let address = layout.locate(point);
            assert_eq!(address.strip_index, panel.strip_index, "{point:?}");
            assert!(
                (panel.skip..panel.skip + cells).contains(&address.led_index),
                "{point:?} -> {address:?}"
            );
        }
    }
    Ok(())
}

#[test]
fn every_point_has_a_distinct_address() -> Result<()> {
    let layout = PanelLayout::reference()?;
    let mut seen = HashSet::new();
    for line in 0..layout.lines() {
        for column in 0..layout.columns() {
            assert!(seen.insert(layout.locate(Point::new(column, line))));
        }
    }
    assert_eq!(seen.len(), layout.cells());
    Ok(())
}

#[test]
fn horizontal_neighbors_are_adjacent_and_alternate_direction() -> Result<()> {
    let layout = PanelLayout::reference()?;
    let columns_per_panel = layout.columns_per_panel();
    let lines_per_panel = layout.lines_per_panel();

    for line in 0..layout.lines() {
        for column in 0..layout.columns() - 1 {
            if column % columns_per_panel == columns_per_panel - 1 {
                continue;
            }
            let here = layout.locate(Point::new(column, line));
            let next = layout.locate(Point::new(column + 1, line));
            assert_eq!(here.strip_index, next.strip_index);
            assert_eq!(here.led_index.abs_diff(next.led_index), 1);

            if line % lines_per_panel != lines_per_panel - 1 {
                let below = layout.locate(Point::new(column, line + 1));
                let below_next = layout.locate(Point::new(column + 1, line + 1));
                let increasing = next.led_index > here.led_index;
                let below_increasing = below_next.led_index > below.led_index;
                assert_ne!(increasing, below_increasing, "({column}, {line})");
            }
        }
    }
    Ok(())
}

#[test]
fn small_panels_follow_wiring_diagrams() -> Result<()> {
    // NorthWest start, 4x3:        SouthEast start, 4x3:
    //   0  1  2  3                   11 10  9  8
    //   7  6  5  4                    4  5  6  7
    //   8  9 10 11                    3  2  1  0
    let north_west = PanelLayout::new(&[Panel::new(Corner::NorthWest, 0)], 1, 4, 3)?;
    let south_east = PanelLayout::new(&[Panel::new(Corner::SouthEast, 0)], 1, 4, 3)?;
    let expected_north_west = [[0, 1, 2, 3], [7, 6, 5, 4], [8, 9, 10, 11]];
    let expected_south_east = [[11, 10, 9, 8], [4, 5, 6, 7], [3, 2, 1, 0]];

    for line in 0..3 {
        for column in 0..4 {
            assert_eq!(
                locate(&north_west, column, line).1,
                expected_north_west[line][column]
            );
            assert_eq!(
                locate(&south_east, column, line).1,
                expected_south_east[line][column]
            );
        }
    }
    Ok(())
}

#[test]
fn north_east_and_south_west_mirror_north_west() -> Result<()> {
    let north_east = PanelLayout::new(&[Panel::new(Corner::NorthEast, 0)], 1, 4, 3)?;
    let south_west = PanelLayout::new(&[Panel::new(Corner::SouthWest, 0)], 1, 4, 3)?;

    assert_eq!(locate(&north_east, 3, 0).1, 0);
    assert_eq!(locate(&north_east, 0, 0).1, 3);
    assert_eq!(locate(&north_east, 0, 1).1, 4);
    assert_eq!(locate(&north_east, 3, 2).1, 8);

    assert_eq!(locate(&south_west, 0, 2).1, 0);
    assert_eq!(locate(&south_west, 3, 2).1, 3);
    assert_eq!(locate(&south_west, 3, 1).1, 4);
    assert_eq!(locate(&south_west, 0, 0).1, 8);
    Ok(())
}

#[test]
fn even_line_count_keeps_serpentine_from_start_corner() -> Result<()> {
    // With an even number of lines the last physical row runs toward the start side.
    let south_west = PanelLayout::new(&[Panel::new(Corner::SouthWest, 0)], 1, 3, 2)?;
    assert_eq!(locate(&south_west, 0, 1).1, 0);
    assert_eq!(locate(&south_west, 2, 1).1, 2);
    assert_eq!(locate(&south_west, 2, 0).1, 3);
    assert_eq!(locate(&south_west, 0, 0).1, 5);
    Ok(())
}

#[test]
fn skip_offsets_panels_sharing_a_strip() -> Result<()> {
    let layout = PanelLayout::new(
        &[
            Panel::new(Corner::NorthWest, 0),
            Panel::with_skip(Corner::NorthEast, 0, 12),
        ],
        1,
        4,
        3,
    )?;
    assert_eq!(layout.columns(), 8);
    assert_eq!(locate(&layout, 0, 0), (0, 0));
    assert_eq!(locate(&layout, 7, 0), (0, 12));
    assert_eq!(locate(&layout, 4, 2), (0, 23));

    let mut offsets: Vec<usize> = (0..layout.lines())
        .flat_map(|line| (0..layout.columns()).map(move |column| (column, line)))
        .map(|(column, line)| locate(&layout, column, line).1)
        .collect();
    offsets.sort_unstable();
    assert_eq!(offsets, (0..24).collect::<Vec<_>>());
    Ok(())
}

#[test]
fn try_locate_rejects_points_off_the_canvas() -> Result<()> {
    let layout = PanelLayout::reference()?;
    assert!(layout.contains(Point::new(79, 21)));
    assert!(!layout.contains(Point::new(80, 0)));
    assert!(!layout.contains(Point::new(0, 22)));
    assert_eq!(
        layout.try_locate(Point::new(79, 21))?,
        LedAddress::new(3, 0)
    );
    assert_eq!(
        layout.try_locate(Point::new(80, 0)),
        Err(matrix_envoy::Error::PointOutOfBounds {
            column: 80,
            line: 0,
            columns: 80,
            lines: 22,
        })
    );
    Ok(())
}

#[test]
fn point_arithmetic_and_linear_index() {
    let point = Point::new(3, 2) + Point::new(1, 1);
    assert_eq!(point, Point::new(4, 3));
    assert_eq!(point - Point::new(4, 0), Point::new(0, 3));
    assert_eq!(Point::new(2, 1).index_in_rectangle(3), 5);
    assert_eq!(Point::new(0, 0).index_in_rectangle(40), 0);
}
