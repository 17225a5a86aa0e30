//! ASCII overlay of terrain, resources, bases and reservations.
//!
//! Legend:
//! - `.` buildable, `,` walkable only, `#` blocked
//! - `m` mineral field, `g` geyser
//! - `r` reserved tile
//! - `0`-`9` depot tile of base N (mod 10), `S` when the base is a start
//!   location
//! - `e` last known enemy structure
//! - `*` placement answer

use basecamp_core::map::{MapService, TerrainCell, GEYSER_FOOTPRINT, MINERAL_FOOTPRINT};
use basecamp_core::tile::{TilePos, TileRect};
use basecamp_core::units::ResourceKind;

use crate::runner::{PlacementOutcome, ScenarioRun};

/// Rendering options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AsciiConfig {
    /// Draw base depot markers.
    pub show_bases: bool,
    /// Draw reserved tiles.
    pub show_reserved: bool,
}

impl Default for AsciiConfig {
    fn default() -> Self {
        Self {
            show_bases: true,
            show_reserved: true,
        }
    }
}

struct Canvas {
    width: i32,
    cells: Vec<char>,
}

impl Canvas {
    fn put(&mut self, tile: TilePos, ch: char) {
        let height = self.cells.len() as i32 / self.width;
        if tile.x >= 0 && tile.y >= 0 && tile.x < self.width && tile.y < height {
            self.cells[(tile.y * self.width + tile.x) as usize] = ch;
        }
    }

    fn fill(&mut self, rect: TileRect, ch: char) {
        for tile in rect.tiles() {
            self.put(tile, ch);
        }
    }

    fn into_string(self) -> String {
        self.cells
            .chunks(self.width as usize)
            .map(|row| row.iter().collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Render the final state of a run, with placement answers marked.
#[must_use]
pub fn render_ascii(run: &ScenarioRun, placements: &[PlacementOutcome], config: AsciiConfig) -> String {
    let map = &run.map;
    let width = map.width();
    let height = map.height();

    let mut canvas = Canvas {
        width,
        cells: Vec::with_capacity((width * height) as usize),
    };
    for y in 0..height {
        for x in 0..width {
            let cell = map.terrain(TilePos::new(x, y)).unwrap_or(TerrainCell::Blocked);
            canvas.cells.push(cell.to_char());
        }
    }

    for node in &run.snapshot.resources {
        let (w, h, ch) = match node.kind {
            ResourceKind::Mineral => (MINERAL_FOOTPRINT.0, MINERAL_FOOTPRINT.1, 'm'),
            ResourceKind::Geyser => (GEYSER_FOOTPRINT.0, GEYSER_FOOTPRINT.1, 'g'),
        };
        canvas.fill(TileRect::footprint(TilePos::from_position(node.position), w, h), ch);
    }

    if config.show_reserved {
        let reservations = run.agent.placer();
        for y in 0..height {
            for x in 0..width {
                let tile = TilePos::new(x, y);
                if reservations.is_reserved(tile) {
                    canvas.put(tile, 'r');
                }
            }
        }
    }

    for unit in &run.snapshot.enemy_units {
        canvas.fill(unit.unit_type.footprint(unit.tile_position()), 'e');
    }

    if config.show_bases {
        for base in run.agent.bases().base_locations() {
            let ch = if base.is_start_location() {
                'S'
            } else {
                char::from_digit(base.id().0 % 10, 10).unwrap_or('?')
            };
            canvas.put(base.depot_tile(), ch);
        }
    }

    for tile in placements.iter().filter_map(|p| p.found) {
        canvas.put(tile, '*');
    }

    canvas.into_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::Scenario;

    fn run() -> ScenarioRun {
        ScenarioRun::run(Scenario::from_ron_str(crate::SAMPLE_SCENARIO).unwrap()).unwrap()
    }

    #[test]
    fn test_render_dimensions() {
        let run = run();
        let text = render_ascii(&run, &[], AsciiConfig::default());
        let rows: Vec<_> = text.lines().collect();

        assert_eq!(rows.len(), 40);
        assert!(rows.iter().all(|r| r.chars().count() == 64));
    }

    #[test]
    fn test_render_marks_bases_and_resources() {
        let run = run();
        let text = render_ascii(&run, &[], AsciiConfig::default());

        assert_eq!(text.matches('S').count(), 2);
        assert_eq!(text.matches('2').count(), 1);
        assert!(text.contains('m'));
        assert!(text.contains('g'));
        assert!(text.contains('r'));
    }

    #[test]
    fn test_render_without_overlays() {
        let run = run();
        let config = AsciiConfig {
            show_bases: false,
            show_reserved: false,
        };
        let text = render_ascii(&run, &[], config);

        assert!(!text.contains('S'));
        assert!(!text.contains('r'));
    }
}
