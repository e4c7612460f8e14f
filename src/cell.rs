use crate::canvas::{StrokeStyle, Surface, TextOptions};
use crate::error::WideTableError;
use crate::font;
use crate::style::{BorderSpec, CellStyle, HAlign, LineSide, LineType, VAlign};
use crate::types::{Color, Pt};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellBox {
    pub x: Pt,
    pub y: Pt,
    pub width: Pt,
    pub height: Pt,
}

/// Values a cell inherits from its column and row rather than its own style.
#[derive(Debug, Clone, Copy)]
pub struct CellContext<'a> {
    pub column_align: Option<HAlign>,
    pub background: Option<Color>,
    pub font_family: &'a str,
}

/// Draws one cell: fill, borders, then text. Returns the Y just below the
/// cell, which is always `y + height`.
pub fn draw_cell<S: Surface>(
    surface: &mut S,
    cell: CellBox,
    content: &str,
    style: &CellStyle,
    context: &CellContext<'_>,
) -> Result<Pt, WideTableError> {
    if let Some(fill) = style.fill_color().or(context.background) {
        surface.fill_rect(cell.x, cell.y, cell.width, cell.height, fill)?;
    }
    draw_borders(surface, cell, style)?;
    draw_text(surface, cell, content, style, context)?;
    Ok(cell.y + cell.height)
}

pub fn draw_borders<S: Surface>(
    surface: &mut S,
    cell: CellBox,
    style: &CellStyle,
) -> Result<(), WideTableError> {
    let spacing = style.double_line_spacing();
    for border in style.borders() {
        let stroke = StrokeStyle {
            width: border.width,
            color: border.color,
            dash: border.style.dash_pattern(),
        };
        let (from, to) = border_line(cell, &border, Pt::ZERO);
        surface.stroke_line(from, to, &stroke)?;
        if border.line_type == LineType::Double {
            let (from, to) = border_line(cell, &border, spacing);
            surface.stroke_line(from, to, &stroke)?;
        }
    }
    Ok(())
}

// The line for one side, pushed `outset` away from the cell.
fn border_line(cell: CellBox, border: &BorderSpec, outset: Pt) -> ((Pt, Pt), (Pt, Pt)) {
    let right = cell.x + cell.width;
    let bottom = cell.y + cell.height;
    match border.side {
        LineSide::Top => {
            let y = cell.y - outset;
            ((cell.x, y), (right, y))
        }
        LineSide::Bottom => {
            let y = bottom + outset;
            ((cell.x, y), (right, y))
        }
        LineSide::Left => {
            let x = cell.x - outset;
            ((x, cell.y), (x, bottom))
        }
        LineSide::Right => {
            let x = right + outset;
            ((x, cell.y), (x, bottom))
        }
    }
}

fn draw_text<S: Surface>(
    surface: &mut S,
    cell: CellBox,
    content: &str,
    style: &CellStyle,
    context: &CellContext<'_>,
) -> Result<(), WideTableError> {
    let padding = style.padding();
    let font_size = style.font_size();
    surface.set_text_color(style.text_color());
    surface.set_font_size(font_size);
    surface.set_font(&font::font_name_for(context.font_family, style.is_bold()));

    let options = TextOptions {
        width: cell.width - padding.horizontal(),
        align: style.h_align(context.column_align),
        line_break: style.wraps(),
    };
    // Bottom alignment uses the font size as the block height, unlike middle.
    let text_y = match style.v_align() {
        VAlign::Top => cell.y + padding.top,
        VAlign::Middle => {
            let block = surface.measure_text_block_height(content, &options);
            cell.y + (cell.height - block) / 2.0
        }
        VAlign::Bottom => cell.y + cell.height - padding.bottom - font_size,
    };
    surface.draw_text(content, cell.x + padding.left, text_y, &options)
}
