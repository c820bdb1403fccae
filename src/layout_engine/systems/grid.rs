use serde::{Deserialize, Serialize};

use super::{C_MULTIPLIER, LayoutError, LayoutSystem, check_builtin_inputs, check_work_area, slice};
use crate::common::collections::BTreeMap;
use crate::sys::geometry::Rect;

/// Percentage grid with a cell to zone map. Cells that map to the same zone
/// are merged into one rectangle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct GridLayoutInfo {
    pub rows: usize,
    pub columns: usize,
    #[serde(rename = "rows-percentage")]
    pub rows_percents: Vec<i32>,
    #[serde(rename = "columns-percentage")]
    pub columns_percents: Vec<i32>,
    pub cell_child_map: Vec<Vec<usize>>,
}

impl GridLayoutInfo {
    /// Evenly split grid. Every cell maps to zone 0 until the caller fills the map.
    pub fn even(rows: usize, columns: usize) -> Self {
        Self {
            rows,
            columns,
            rows_percents: (0..rows).map(|k| slice(C_MULTIPLIER, k, rows) as i32).collect(),
            columns_percents: (0..columns).map(|k| slice(C_MULTIPLIER, k, columns) as i32).collect(),
            cell_child_map: vec![vec![0; columns]; rows],
        }
    }

    fn from_table(rows_percents: &[i32], columns_percents: &[i32], map: &[&[usize]]) -> Self {
        Self {
            rows: rows_percents.len(),
            columns: columns_percents.len(),
            rows_percents: rows_percents.to_vec(),
            columns_percents: columns_percents.to_vec(),
            cell_child_map: map.iter().map(|row| row.to_vec()).collect(),
        }
    }

    /// Number of distinct zones the map references.
    pub fn zone_count(&self) -> usize {
        self.cell_child_map.iter().flatten().max().map_or(0, |max| max.saturating_add(1))
    }

    pub fn validate(&self) -> Result<(), LayoutError> {
        let malformed = |msg: String| Err(LayoutError::MalformedGrid(msg));
        if self.rows == 0 || self.columns == 0 {
            return malformed(format!("{}x{} grid", self.rows, self.columns));
        }
        if self.rows_percents.len() != self.rows || self.columns_percents.len() != self.columns {
            return malformed(format!(
                "{} row and {} column percents for a {}x{} grid",
                self.rows_percents.len(),
                self.columns_percents.len(),
                self.rows,
                self.columns
            ));
        }
        if self.rows_percents.iter().chain(&self.columns_percents).any(|p| *p < 0) {
            return malformed("negative percent".to_string());
        }
        if self.cell_child_map.len() != self.rows
            || self.cell_child_map.iter().any(|row| row.len() != self.columns)
        {
            return malformed("cell map does not match grid size".to_string());
        }
        let cells = self.rows * self.columns;
        if let Some(id) = self.cell_child_map.iter().flatten().find(|id| **id >= cells) {
            return malformed(format!("zone id {id} exceeds {cells} cells"));
        }
        let mut seen = vec![false; self.zone_count()];
        for id in self.cell_child_map.iter().flatten() {
            seen[*id] = true;
        }
        if let Some(gap) = seen.iter().position(|s| !s) {
            return malformed(format!("zone {gap} has no cells"));
        }
        Ok(())
    }
}

impl LayoutSystem for GridLayoutInfo {
    fn calculate_zones(&self, work_area: Rect, _zone_count: usize, spacing: i32) -> Result<Vec<Rect>, LayoutError> {
        check_work_area(work_area)?;
        self.validate()?;
        Ok(calculate_grid_zones(work_area, self, spacing))
    }
}

#[derive(Clone, Copy)]
struct Band {
    start: i64,
    end: i64,
}

fn bands(extent: i32, percents: &[i32], spacing: i64) -> Vec<Band> {
    let total = (i64::from(extent) - spacing * (percents.len() as i64 + 1)).max(0);
    let mut before = 0i64;
    percents
        .iter()
        .enumerate()
        .map(|(k, pct)| {
            let gutter = (k as i64 + 1) * spacing;
            let start = (before.saturating_mul(total) / C_MULTIPLIER).saturating_add(gutter);
            before = before.saturating_add(i64::from(*pct));
            let end = (before.saturating_mul(total) / C_MULTIPLIER).saturating_add(gutter);
            Band { start, end: end.max(start) }
        })
        .collect()
}

fn clamp_i32(v: i64) -> i32 { v.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32 }

/// Geometry for a validated grid, one rect per zone id in ascending order.
fn calculate_grid_zones(work_area: Rect, info: &GridLayoutInfo, spacing: i32) -> Vec<Rect> {
    let s = i64::from(spacing);
    let rows = bands(work_area.height(), &info.rows_percents, s);
    let cols = bands(work_area.width(), &info.columns_percents, s);

    let mut zones: BTreeMap<usize, Rect> = BTreeMap::new();
    for (r, row) in info.cell_child_map.iter().enumerate() {
        for (c, id) in row.iter().enumerate() {
            let cell = Rect::new(
                clamp_i32(cols[c].start),
                clamp_i32(rows[r].start),
                clamp_i32(cols[c].end),
                clamp_i32(rows[r].end),
            );
            zones.entry(*id).and_modify(|z| *z = z.union(&cell)).or_insert(cell);
        }
    }
    zones.into_values().collect()
}

/// Near-square grid filled column by column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GridLayout;

impl GridLayout {
    /// `(columns, rows)` for `zone_count` zones.
    pub fn dimensions(zone_count: usize, portrait: bool) -> (usize, usize) {
        match zone_count {
            0 | 1 => (1, 1),
            2 if portrait => (1, 2),
            2 => (2, 1),
            3..=4 => (2, 2),
            5..=9 => (3, 3),
            n => {
                let rows = n.isqrt();
                (n.div_ceil(rows), rows)
            }
        }
    }

    pub fn info(zone_count: usize, portrait: bool) -> GridLayoutInfo {
        let (columns, rows) = Self::dimensions(zone_count, portrait);
        let mut info = GridLayoutInfo::even(rows, columns);

        // Fill from the last cell backwards; spare cells at the front all land
        // in zone 0, which merges them.
        let mut index = zone_count.saturating_sub(1);
        for c in (0..columns).rev() {
            for r in (0..rows).rev() {
                info.cell_child_map[r][c] = index;
                index = index.saturating_sub(1);
            }
        }
        info
    }
}

impl LayoutSystem for GridLayout {
    fn calculate_zones(&self, work_area: Rect, zone_count: usize, spacing: i32) -> Result<Vec<Rect>, LayoutError> {
        check_builtin_inputs(work_area, zone_count)?;
        let info = Self::info(zone_count, work_area.size().is_portrait());
        Ok(calculate_grid_zones(work_area, &info, spacing))
    }
}

/// Grids that keep one large primary zone in the middle. Falls back to
/// [`GridLayout`] when there is no predefined shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PriorityGridLayout;

const FULL: &[i32] = &[10000];
const HALVES: &[i32] = &[5000, 5000];
const THIRDS: &[i32] = &[3333, 3334, 3333];
const PRIMARY_MIDDLE: &[i32] = &[2500, 5000, 2500];
const QUARTERS: &[i32] = &[2500, 2500, 2500, 2500];

impl PriorityGridLayout {
    pub const PREDEFINED: usize = 11;

    pub fn info(zone_count: usize) -> Option<GridLayoutInfo> {
        let info = match zone_count {
            1 => GridLayoutInfo::from_table(FULL, FULL, &[&[0]]),
            2 => GridLayoutInfo::from_table(FULL, &[6667, 3333], &[&[0, 1]]),
            3 => GridLayoutInfo::from_table(FULL, PRIMARY_MIDDLE, &[&[0, 1, 2]]),
            4 => GridLayoutInfo::from_table(HALVES, PRIMARY_MIDDLE, &[&[0, 1, 2], &[0, 1, 3]]),
            5 => GridLayoutInfo::from_table(HALVES, PRIMARY_MIDDLE, &[&[0, 1, 2], &[3, 1, 4]]),
            6 => GridLayoutInfo::from_table(
                THIRDS,
                PRIMARY_MIDDLE,
                &[&[0, 1, 2], &[0, 1, 3], &[4, 1, 5]],
            ),
            7 => GridLayoutInfo::from_table(
                THIRDS,
                PRIMARY_MIDDLE,
                &[&[0, 1, 2], &[3, 1, 4], &[5, 1, 6]],
            ),
            8 => GridLayoutInfo::from_table(
                THIRDS,
                QUARTERS,
                &[&[0, 1, 2, 3], &[4, 1, 2, 5], &[6, 1, 2, 7]],
            ),
            9 => GridLayoutInfo::from_table(
                THIRDS,
                QUARTERS,
                &[&[0, 1, 2, 3], &[4, 1, 2, 5], &[6, 1, 7, 8]],
            ),
            10 => GridLayoutInfo::from_table(
                THIRDS,
                QUARTERS,
                &[&[0, 1, 2, 3], &[4, 1, 5, 6], &[7, 1, 8, 9]],
            ),
            11 => GridLayoutInfo::from_table(
                THIRDS,
                QUARTERS,
                &[&[0, 1, 2, 3], &[4, 1, 5, 6], &[7, 8, 9, 10]],
            ),
            _ => return None,
        };
        Some(info)
    }
}

impl LayoutSystem for PriorityGridLayout {
    fn calculate_zones(&self, work_area: Rect, zone_count: usize, spacing: i32) -> Result<Vec<Rect>, LayoutError> {
        check_builtin_inputs(work_area, zone_count)?;
        match Self::info(zone_count) {
            Some(info) => Ok(calculate_grid_zones(work_area, &info, spacing)),
            None => GridLayout.calculate_zones(work_area, zone_count, spacing),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn dimension_table() {
        assert_eq!(GridLayout::dimensions(1, false), (1, 1));
        assert_eq!(GridLayout::dimensions(2, false), (2, 1));
        assert_eq!(GridLayout::dimensions(2, true), (1, 2));
        assert_eq!(GridLayout::dimensions(3, true), (2, 2));
        assert_eq!(GridLayout::dimensions(4, false), (2, 2));
        assert_eq!(GridLayout::dimensions(7, false), (3, 3));
        assert_eq!(GridLayout::dimensions(10, false), (4, 3));
        assert_eq!(GridLayout::dimensions(16, false), (4, 4));
        assert_eq!(GridLayout::dimensions(17, false), (5, 4));
    }

    #[test]
    fn three_zone_grid_merges_spare_cell_into_first_zone() {
        let info = GridLayout::info(3, false);
        assert_eq!(info.cell_child_map, vec![vec![0, 1], vec![0, 2]]);

        let rects = GridLayout.calculate_zones(Rect::new(0, 0, 1000, 1000), 3, 0).unwrap();
        assert_eq!(
            rects,
            vec![
                Rect::new(0, 0, 500, 1000),
                Rect::new(500, 0, 1000, 500),
                Rect::new(500, 500, 1000, 1000),
            ]
        );
    }

    #[test]
    fn grid_respects_spacing() {
        let rects = GridLayout.calculate_zones(Rect::new(0, 0, 1030, 520), 2, 10).unwrap();
        assert_eq!(rects, vec![Rect::new(10, 10, 510, 510), Rect::new(520, 10, 1020, 510)]);
    }

    #[test]
    fn priority_grid_keeps_primary_in_middle() {
        let rects = PriorityGridLayout.calculate_zones(Rect::new(0, 0, 1000, 600), 5, 0).unwrap();
        assert_eq!(rects.len(), 5);
        assert_eq!(rects[1], Rect::new(250, 0, 750, 600));
        assert_eq!(rects[0], Rect::new(0, 0, 250, 300));
        assert_eq!(rects[4], Rect::new(750, 300, 1000, 600));
    }

    #[test]
    fn priority_grid_table_is_well_formed() {
        for n in 1..=PriorityGridLayout::PREDEFINED {
            let info = PriorityGridLayout::info(n).unwrap();
            info.validate().unwrap();
            assert_eq!(info.zone_count(), n);
            assert_eq!(info.rows_percents.iter().sum::<i32>(), 10000);
            assert_eq!(info.columns_percents.iter().sum::<i32>(), 10000);
        }
        assert_eq!(PriorityGridLayout::info(12), None);
    }

    #[test]
    fn custom_grid_validation() {
        let mut info = GridLayoutInfo::even(2, 2);
        info.cell_child_map = vec![vec![0, 2], vec![0, 2]];
        assert!(matches!(info.validate(), Err(LayoutError::MalformedGrid(_))));

        info.cell_child_map = vec![vec![0, 1]];
        assert!(matches!(info.validate(), Err(LayoutError::MalformedGrid(_))));

        info.cell_child_map = vec![vec![0, 1], vec![0, 1]];
        info.validate().unwrap();
        let rects = info.calculate_zones(Rect::new(0, 0, 100, 100), 0, 0).unwrap();
        assert_eq!(rects, vec![Rect::new(0, 0, 50, 100), Rect::new(50, 0, 100, 100)]);
    }

    #[test]
    fn zone_ids_past_cell_count_are_malformed() {
        let mut info = GridLayoutInfo::even(1, 1);
        info.cell_child_map = vec![vec![usize::MAX]];
        assert_eq!(info.zone_count(), usize::MAX);
        assert_eq!(
            info.validate(),
            Err(LayoutError::MalformedGrid(format!("zone id {} exceeds 1 cells", usize::MAX)))
        );

        info.cell_child_map = vec![vec![1]];
        assert!(matches!(
            info.calculate_zones(Rect::new(0, 0, 100, 100), 0, 0),
            Err(LayoutError::MalformedGrid(_))
        ));
    }

    #[test]
    fn oversized_percents_stay_in_range() {
        let mut info = GridLayoutInfo::even(1, 2);
        info.columns_percents = vec![i32::MAX, i32::MAX];
        let rects = info.calculate_zones(Rect::new(0, 0, i32::MAX, 100), 0, 0).unwrap();
        assert_eq!(rects.len(), 1);
        assert_eq!(rects[0].left, 0);
        assert_eq!(rects[0].right, i32::MAX);
    }

    #[test]
    fn reads_editor_json() {
        let json = r#"{
            "rows": 1,
            "columns": 2,
            "rows-percentage": [10000],
            "columns-percentage": [4000, 6000],
            "cell-child-map": [[0, 1]]
        }"#;
        let info: GridLayoutInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.columns_percents, vec![4000, 6000]);
        assert_eq!(info.zone_count(), 2);
    }
}
