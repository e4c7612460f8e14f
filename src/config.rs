use crate::column::{ColumnSpec, DEFAULT_COLUMN_WIDTH};
use crate::engine::{PageGeometry, TableLayout};
use crate::error::WideTableError;
use crate::row::{RawCell, Row, normalize_row_with};
use crate::scale::{calculate_scale_factor, scale_value};
use crate::style::{CellStyle, HAlign, null_as_default};
use crate::types::{Margins, Orientation, PageFormat, Pt, Size};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const INCH_IN_PX: f32 = 96.0;

/// Document description as produced upstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DocumentConfig {
    #[serde(deserialize_with = "null_as_default")]
    pub page_config: PageConfig,
    #[serde(deserialize_with = "null_as_default")]
    pub base_config: BaseConfig,
    #[serde(deserialize_with = "null_as_default")]
    pub table_config: Vec<TableConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageConfig {
    /// `p` for portrait, `l` for landscape. `null` or an unknown code
    /// means portrait, and an unknown format means A4.
    #[serde(deserialize_with = "null_as_default")]
    pub orientation: String,
    #[serde(deserialize_with = "null_as_default")]
    pub format: String,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            orientation: "p".to_string(),
            format: "a4".to_string(),
        }
    }
}

impl PageConfig {
    pub fn page_size(&self) -> Size {
        Orientation::parse(&self.orientation).apply(PageFormat::parse(&self.format).size())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BaseConfig {
    pub margin: Option<MarginSpec>,
    pub font_size: Option<f32>,
    pub font_family: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MarginSpec {
    Uniform(f32),
    Preset(String),
    Sides {
        #[serde(default)]
        top: Option<f32>,
        #[serde(default)]
        right: Option<f32>,
        #[serde(default)]
        bottom: Option<f32>,
        #[serde(default)]
        left: Option<f32>,
    },
}

impl MarginSpec {
    /// `lg`, `md` and `sm` are half, three tenths and three twentieths of
    /// an inch at 96 px per inch; any other preset name means `md`. Sides
    /// left out of an object are 0.
    pub fn resolve(&self) -> Margins {
        match self {
            MarginSpec::Uniform(value) => Margins::all(*value),
            MarginSpec::Preset(name) => {
                let inches = match name.trim() {
                    "lg" => 0.5,
                    "sm" => 0.15,
                    _ => 0.3,
                };
                Margins::all(inches * INCH_IN_PX)
            }
            MarginSpec::Sides {
                top,
                right,
                bottom,
                left,
            } => {
                let side = |value: &Option<f32>| Pt::from_f32(value.unwrap_or(0.0));
                Margins {
                    top: side(top),
                    right: side(right),
                    bottom: side(bottom),
                    left: side(left),
                }
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TableConfig {
    #[serde(deserialize_with = "null_as_default")]
    pub head: Vec<Vec<RawCell>>,
    #[serde(deserialize_with = "null_as_default")]
    pub body: Vec<Vec<RawCell>>,
    pub head_styles: Option<CellStyle>,
    pub row_style: Option<CellStyle>,
    #[serde(deserialize_with = "null_as_default")]
    pub resize_to_fit_columns: bool,
    pub scale_factor: Option<f64>,
}

impl TableConfig {
    /// The last head row defines the columns.
    pub fn header_row(&self) -> Option<&[RawCell]> {
        self.head.last().map(Vec::as_slice)
    }

    /// Factor applied to this table before layout.
    pub fn effective_scale(&self, printable_width: f64) -> f64 {
        if self.resize_to_fit_columns {
            let header = self.header_row().unwrap_or_default();
            calculate_scale_factor(header, printable_width)
        } else {
            self.scale_factor
                .filter(|f| f.is_finite() && *f > 0.0)
                .unwrap_or(1.0)
        }
    }

    pub fn column_specs(&self) -> Vec<ColumnSpec> {
        self.header_row()
            .unwrap_or_default()
            .iter()
            .enumerate()
            .map(|(index, cell)| {
                let style = cell.styles.clone().unwrap_or_default();
                let width = cell
                    .width
                    .filter(|w| *w > 0.0)
                    .or(style.cell_width.filter(|w| *w > 0.0))
                    .unwrap_or(DEFAULT_COLUMN_WIDTH);
                ColumnSpec {
                    index,
                    width: Pt::from_f32(width),
                    horizontal_align: style
                        .halign
                        .as_deref()
                        .and_then(HAlign::parse)
                        .unwrap_or(HAlign::Left),
                    style,
                }
            })
            .collect()
    }

    fn defaults(own: &Option<CellStyle>, base: &CellStyle) -> CellStyle {
        match own {
            Some(style) => style.merged_over(base),
            None => base.clone(),
        }
    }

    pub fn layout(
        &self,
        base: &BaseConfig,
        printable_width: Pt,
    ) -> Result<TableLayout, WideTableError> {
        let header = self
            .header_row()
            .filter(|row| !row.is_empty())
            .ok_or_else(|| {
                WideTableError::InvalidConfiguration("tableConfig.head has no columns".to_string())
            })?;
        let base_style = base.cell_defaults();
        let head_defaults = Self::defaults(&self.head_styles, &base_style);
        let header = normalize_row_with(header, &head_defaults);
        let mut layout = TableLayout::new(self.column_specs(), header, printable_width)
            .with_backgrounds(
                self.head_styles.as_ref().and_then(CellStyle::fill_color),
                self.row_style.as_ref().and_then(CellStyle::fill_color),
            );
        if let Some(family) = base.font_family.as_deref().filter(|f| !f.trim().is_empty()) {
            layout = layout.with_font_family(family);
        }
        Ok(layout)
    }

    /// Body rows, normalized one at a time.
    pub fn body_rows<'a>(&'a self, base: &BaseConfig) -> impl Iterator<Item = Row> + 'a {
        let defaults = Self::defaults(&self.row_style, &base.cell_defaults());
        self.body
            .iter()
            .map(move |cells| normalize_row_with(cells, &defaults))
    }
}

impl BaseConfig {
    pub fn margins(&self) -> Margins {
        self.margin
            .as_ref()
            .map(MarginSpec::resolve)
            .unwrap_or_default()
    }

    fn cell_defaults(&self) -> CellStyle {
        CellStyle {
            font_size: self.font_size,
            ..CellStyle::default()
        }
    }
}

impl DocumentConfig {
    /// Parses the JSON document and applies each table's scale factor
    /// before the typed model is built.
    pub fn from_json(text: &str) -> Result<Self, WideTableError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    pub fn from_value(mut value: Value) -> Result<Self, WideTableError> {
        if !value.is_object() {
            return Err(WideTableError::InvalidConfiguration(
                "configuration must be a JSON object".to_string(),
            ));
        }
        let unscaled: DocumentConfig = serde_json::from_value(value.clone())?;
        let printable_width = unscaled.geometry().printable_width.to_f32() as f64;
        let factors: Vec<f64> = unscaled
            .table_config
            .iter()
            .map(|table| table.effective_scale(printable_width))
            .collect();
        if factors.iter().all(|f| *f == 1.0) {
            return Ok(unscaled);
        }

        debug!("applying table scale factors {factors:?}");
        if let Some(tables) = value.get_mut("tableConfig").and_then(Value::as_array_mut) {
            for (table, factor) in tables.iter_mut().zip(&factors) {
                scale_value(table, *factor);
            }
        }
        if let (Some(base), Some(first)) = (value.get_mut("baseConfig"), factors.first()) {
            scale_value(base, *first);
        }
        Ok(serde_json::from_value(value)?)
    }

    pub fn page_size(&self) -> Size {
        self.page_config.page_size()
    }

    pub fn geometry(&self) -> PageGeometry {
        PageGeometry::from_page(self.page_size(), &self.base_config.margins())
    }

    /// The table that gets rendered; further entries are ignored.
    pub fn primary_table(&self) -> Result<&TableConfig, WideTableError> {
        if self.table_config.len() > 1 {
            warn!(
                "{} tables configured, only the first is rendered",
                self.table_config.len()
            );
        }
        self.table_config
            .first()
            .ok_or_else(|| WideTableError::InvalidConfiguration("tableConfig is empty".to_string()))
    }
}
