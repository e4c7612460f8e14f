use crate::style::CellStyle;
use crate::types::Pt;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Minimum height of any normalized row.
pub const ROW_HEIGHT_FLOOR: f32 = 30.0;

/// A cell as it arrives from the table configuration (`{content, styles}`).
/// Header cells additionally carry an optional `width`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawCell {
    pub content: Value,
    pub styles: Option<CellStyle>,
    pub width: Option<f32>,
}

impl RawCell {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Value::String(content.into()),
            ..Self::default()
        }
    }

    pub fn styled(content: impl Into<String>, styles: CellStyle) -> Self {
        Self {
            content: Value::String(content.into()),
            styles: Some(styles),
            width: None,
        }
    }

    /// Scalars render as their display form; `null` renders empty.
    pub fn content_text(&self) -> String {
        match &self.content {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub content: String,
    pub style: CellStyle,
}

impl Cell {
    pub fn new(content: impl Into<String>, style: CellStyle) -> Self {
        Self {
            content: content.into(),
            style,
        }
    }

    /// Height the cell needs before the row floor is applied.
    pub fn required_height(&self) -> Pt {
        self.style.min_cell_height() + self.style.padding().vertical()
    }
}

/// A normalized table row. `height` is fixed at normalization time.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub cells: Vec<Cell>,
    pub height: Pt,
}

impl Row {
    /// Builds a row with an explicit height, bypassing the height rule.
    pub fn with_height(cells: Vec<Cell>, height: Pt) -> Self {
        Self { cells, height }
    }

    pub fn cell(&self, column: usize) -> Option<&Cell> {
        self.cells.get(column)
    }
}

pub fn row_height(cells: &[Cell]) -> Pt {
    cells
        .iter()
        .map(Cell::required_height)
        .fold(Pt::from_f32(ROW_HEIGHT_FLOOR), Pt::max)
}

pub fn normalize_row(raw_cells: &[RawCell]) -> Row {
    normalize_row_with(raw_cells, &CellStyle::default())
}

/// Normalizes a raw row, layering each cell's `styles` over the
/// table-level `defaults`.
pub fn normalize_row_with(raw_cells: &[RawCell], defaults: &CellStyle) -> Row {
    let cells: Vec<Cell> = raw_cells
        .iter()
        .map(|raw| {
            let style = match &raw.styles {
                Some(style) => style.merged_over(defaults),
                None => defaults.clone(),
            };
            Cell::new(raw.content_text(), style)
        })
        .collect();
    let height = row_height(&cells);
    Row { cells, height }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell_with(min_height: Option<f32>, padding: Option<f32>) -> RawCell {
        RawCell::styled(
            "x",
            CellStyle {
                min_cell_height: min_height,
                cell_padding: padding.map(crate::style::PaddingSpec::Uniform),
                ..CellStyle::default()
            },
        )
    }

    #[test]
    fn bare_cells_get_the_floor_height() {
        let row = normalize_row(&[RawCell::text("a"), RawCell::text("b")]);
        assert_eq!(row.height, Pt::from_f32(30.0));
        assert_eq!(row.cells.len(), 2);
        assert_eq!(row.cells[1].content, "b");
    }

    #[test]
    fn height_is_max_of_min_height_plus_vertical_padding() {
        let row = normalize_row(&[cell_with(Some(20.0), None), cell_with(Some(35.0), Some(2.0))]);
        // 20 + 5 + 5 = 30, 35 + 2 + 2 = 39
        assert_eq!(row.height, Pt::from_f32(39.0));
        for cell in &row.cells {
            assert!(row.height >= cell.required_height());
        }
    }

    #[test]
    fn empty_row_is_floor_height() {
        let row = normalize_row(&[]);
        assert!(row.cells.is_empty());
        assert_eq!(row.height, Pt::from_f32(ROW_HEIGHT_FLOOR));
    }

    #[test]
    fn content_of_any_scalar_is_rendered() {
        let cells: Vec<RawCell> =
            serde_json::from_str(r#"[{"content": 0}, {"content": null}, {"content": true}, {}]"#)
                .unwrap();
        let row = normalize_row(&cells);
        let texts: Vec<&str> = row.cells.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(texts, vec!["0", "", "true", ""]);
    }

    #[test]
    fn table_defaults_feed_the_height_rule() {
        let defaults = CellStyle {
            min_cell_height: Some(50.0),
            ..CellStyle::default()
        };
        let row = normalize_row_with(&[RawCell::text("a")], &defaults);
        assert_eq!(row.height, Pt::from_f32(60.0));
    }
}
