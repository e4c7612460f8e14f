use crate::types::{Color, Pt};
use serde::{Deserialize, Deserializer, Serialize};

pub const DEFAULT_PADDING: f32 = 5.0;
pub const DEFAULT_FONT_SIZE: f32 = 10.0;
pub const DEFAULT_BORDER_WIDTH: f32 = 0.5;
pub const DEFAULT_BORDER_COLOR: &str = "#000000";
pub const DEFAULT_DOUBLE_LINE_SPACING: f32 = 2.0;

/// Reads `null` as the type's default, the same as an absent key.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HAlign {
    Left,
    Center,
    Right,
}

impl HAlign {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "left" => Some(HAlign::Left),
            "center" | "centre" => Some(HAlign::Center),
            "right" => Some(HAlign::Right),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VAlign {
    Top,
    Middle,
    Bottom,
}

impl VAlign {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "top" => Some(VAlign::Top),
            "middle" | "center" => Some(VAlign::Middle),
            "bottom" => Some(VAlign::Bottom),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSide {
    Top,
    Bottom,
    Left,
    Right,
}

impl LineSide {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "top" => Some(LineSide::Top),
            "bottom" => Some(LineSide::Bottom),
            "left" => Some(LineSide::Left),
            "right" => Some(LineSide::Right),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Solid,
    Dashed,
    Dotted,
}

impl LineStyle {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()) {
            Some(s) if s == "dashed" => LineStyle::Dashed,
            Some(s) if s == "dotted" => LineStyle::Dotted,
            _ => LineStyle::Solid,
        }
    }

    /// Dash pattern as (on, off) lengths; solid lines have none.
    pub fn dash_pattern(self) -> Vec<Pt> {
        match self {
            LineStyle::Solid => Vec::new(),
            LineStyle::Dashed => vec![Pt::from_f32(5.0), Pt::from_f32(3.0)],
            LineStyle::Dotted => vec![Pt::from_f32(1.0), Pt::from_f32(2.0)],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineType {
    Single,
    Double,
}

impl LineType {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()) {
            Some(s) if s == "double" => LineType::Double,
            _ => LineType::Single,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Padding {
    pub top: Pt,
    pub right: Pt,
    pub bottom: Pt,
    pub left: Pt,
}

impl Padding {
    pub fn uniform(value: f32) -> Self {
        let v = Pt::from_f32(value);
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    pub fn vertical(&self) -> Pt {
        self.top + self.bottom
    }

    pub fn horizontal(&self) -> Pt {
        self.left + self.right
    }
}

impl Default for Padding {
    fn default() -> Self {
        Padding::uniform(DEFAULT_PADDING)
    }
}

/// `cellPadding` is either one number for every side or a partial object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PaddingSpec {
    Uniform(f32),
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

impl PaddingSpec {
    pub fn resolve(&self) -> Padding {
        match self {
            PaddingSpec::Uniform(v) => Padding::uniform(*v),
            PaddingSpec::Sides {
                top,
                right,
                bottom,
                left,
            } => {
                let side = |v: &Option<f32>| Pt::from_f32(v.unwrap_or(DEFAULT_PADDING));
                Padding {
                    top: side(top),
                    right: side(right),
                    bottom: side(bottom),
                    left: side(left),
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LineWidths {
    Uniform(f32),
    /// `null` slots fall back to the default width.
    PerSide(Vec<Option<f32>>),
}

impl LineWidths {
    fn get(&self, index: usize) -> Option<f32> {
        match self {
            LineWidths::Uniform(v) => Some(*v),
            LineWidths::PerSide(values) => values.get(index).copied().flatten(),
        }
    }
}

/// One stroked border side after defaults are applied.
#[derive(Debug, Clone, PartialEq)]
pub struct BorderSpec {
    pub side: LineSide,
    pub width: Pt,
    pub color: Color,
    pub style: LineStyle,
    pub line_type: LineType,
}

/// Per-cell style descriptor as it appears in the table configuration.
/// Every field is optional; the accessor methods apply the defaults. The
/// per-side lists accept `null` for the whole list or for any slot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CellStyle {
    pub fill_color: Option<String>,
    pub text_color: Option<String>,
    pub font_size: Option<f32>,
    pub font_style: Option<String>,
    pub halign: Option<String>,
    pub valign: Option<String>,
    pub cell_padding: Option<PaddingSpec>,
    pub cell_width: Option<f32>,
    pub min_cell_height: Option<f32>,
    pub overflow: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub line_side: Vec<Option<String>>,
    pub line_width: Option<LineWidths>,
    #[serde(deserialize_with = "null_as_default")]
    pub line_colors: Vec<Option<String>>,
    #[serde(deserialize_with = "null_as_default")]
    pub line_style: Vec<Option<String>>,
    #[serde(deserialize_with = "null_as_default")]
    pub line_type: Vec<Option<String>>,
    pub double_line_spacing: Option<f32>,
}

impl CellStyle {
    /// Fields set on `self` win; unset fields are taken from `defaults`.
    pub fn merged_over(&self, defaults: &CellStyle) -> CellStyle {
        fn pick<T: Clone>(own: &Option<T>, fallback: &Option<T>) -> Option<T> {
            own.clone().or_else(|| fallback.clone())
        }
        fn pick_vec(own: &[Option<String>], fallback: &[Option<String>]) -> Vec<Option<String>> {
            if own.is_empty() {
                fallback.to_vec()
            } else {
                own.to_vec()
            }
        }
        CellStyle {
            fill_color: pick(&self.fill_color, &defaults.fill_color),
            text_color: pick(&self.text_color, &defaults.text_color),
            font_size: pick(&self.font_size, &defaults.font_size),
            font_style: pick(&self.font_style, &defaults.font_style),
            halign: pick(&self.halign, &defaults.halign),
            valign: pick(&self.valign, &defaults.valign),
            cell_padding: pick(&self.cell_padding, &defaults.cell_padding),
            cell_width: pick(&self.cell_width, &defaults.cell_width),
            min_cell_height: pick(&self.min_cell_height, &defaults.min_cell_height),
            overflow: pick(&self.overflow, &defaults.overflow),
            line_side: pick_vec(&self.line_side, &defaults.line_side),
            line_width: pick(&self.line_width, &defaults.line_width),
            line_colors: pick_vec(&self.line_colors, &defaults.line_colors),
            line_style: pick_vec(&self.line_style, &defaults.line_style),
            line_type: pick_vec(&self.line_type, &defaults.line_type),
            double_line_spacing: pick(&self.double_line_spacing, &defaults.double_line_spacing),
        }
    }

    pub fn padding(&self) -> Padding {
        self.cell_padding
            .as_ref()
            .map(PaddingSpec::resolve)
            .unwrap_or_default()
    }

    pub fn font_size(&self) -> Pt {
        Pt::from_f32(self.font_size.unwrap_or(DEFAULT_FONT_SIZE))
    }

    pub fn min_cell_height(&self) -> Pt {
        Pt::from_f32(self.min_cell_height.unwrap_or(0.0))
    }

    pub fn is_bold(&self) -> bool {
        self.font_style
            .as_deref()
            .is_some_and(|s| s.trim().eq_ignore_ascii_case("bold"))
    }

    /// Wrapping is opt-in through `overflow: "linebreak"`.
    pub fn wraps(&self) -> bool {
        self.overflow
            .as_deref()
            .is_some_and(|s| s.trim().eq_ignore_ascii_case("linebreak"))
    }

    pub fn h_align(&self, column_default: Option<HAlign>) -> HAlign {
        self.halign
            .as_deref()
            .and_then(HAlign::parse)
            .or(column_default)
            .unwrap_or(HAlign::Left)
    }

    pub fn v_align(&self) -> VAlign {
        self.valign
            .as_deref()
            .and_then(VAlign::parse)
            .unwrap_or(VAlign::Middle)
    }

    pub fn fill_color(&self) -> Option<Color> {
        self.fill_color
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(Color::from_hex)
    }

    pub fn text_color(&self) -> Color {
        self.text_color
            .as_deref()
            .map(Color::from_hex)
            .unwrap_or(Color::BLACK)
    }

    pub fn double_line_spacing(&self) -> Pt {
        Pt::from_f32(
            self.double_line_spacing
                .unwrap_or(DEFAULT_DOUBLE_LINE_SPACING),
        )
    }

    /// Requested border sides in declaration order. Attributes are matched
    /// to sides by position; unknown side names are skipped.
    pub fn borders(&self) -> Vec<BorderSpec> {
        fn slot(values: &[Option<String>], index: usize) -> Option<&str> {
            values.get(index).and_then(Option::as_deref)
        }
        self.line_side
            .iter()
            .enumerate()
            .filter_map(|(index, raw_side)| {
                let side = LineSide::parse(raw_side.as_deref()?)?;
                let width = self
                    .line_width
                    .as_ref()
                    .and_then(|w| w.get(index))
                    .filter(|w| *w > 0.0)
                    .unwrap_or(DEFAULT_BORDER_WIDTH);
                let color = slot(&self.line_colors, index)
                    .filter(|c| !c.trim().is_empty())
                    .unwrap_or(DEFAULT_BORDER_COLOR);
                Some(BorderSpec {
                    side,
                    width: Pt::from_f32(width),
                    color: Color::from_hex(color),
                    style: LineStyle::parse(slot(&self.line_style, index)),
                    line_type: LineType::parse(slot(&self.line_type, index)),
                })
            })
            .collect()
    }
}
