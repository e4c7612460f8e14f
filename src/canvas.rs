use crate::error::WideTableError;
use crate::font;
use crate::style::HAlign;
use crate::types::{Color, Pt, Size};

/// Drawing commands recorded per page. Coordinates are top-left based,
/// in points; `DrawString` carries the baseline position.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    // Non-rendered metadata used for page-aware reporting. Ignored by the PDF writer.
    Meta { key: String, value: String },
    SetFillColor(Color),
    SetStrokeColor(Color),
    SetLineWidth(Pt),
    SetDash { pattern: Vec<Pt>, phase: Pt },
    SetFontName(String),
    SetFontSize(Pt),
    MoveTo { x: Pt, y: Pt },
    LineTo { x: Pt, y: Pt },
    Stroke,
    DrawRect { x: Pt, y: Pt, width: Pt, height: Pt },
    Fill,
    DrawString { x: Pt, y: Pt, text: String },
}

/// Text layout options shared by measurement and drawing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextOptions {
    pub width: Pt,
    pub align: HAlign,
    pub line_break: bool,
}

impl TextOptions {
    fn wrap_width(&self) -> Option<Pt> {
        self.line_break.then_some(self.width)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrokeStyle {
    pub width: Pt,
    pub color: Color,
    /// Empty for solid lines.
    pub dash: Vec<Pt>,
}

/// The drawing collaborator the paginator writes through. Pages are
/// buffered so any earlier page can be made active again.
pub trait Surface {
    type Output;

    fn page_size(&self) -> Size;
    /// Appends a page and makes it the active one.
    fn append_page(&mut self);
    fn switch_to_page(&mut self, index: usize) -> Result<(), WideTableError>;
    fn current_page_index(&self) -> usize;
    fn page_count(&self) -> usize;

    fn fill_rect(
        &mut self,
        x: Pt,
        y: Pt,
        width: Pt,
        height: Pt,
        color: Color,
    ) -> Result<(), WideTableError>;
    fn stroke_line(
        &mut self,
        from: (Pt, Pt),
        to: (Pt, Pt),
        stroke: &StrokeStyle,
    ) -> Result<(), WideTableError>;

    fn set_font(&mut self, name: &str);
    fn set_font_size(&mut self, size: Pt);
    fn set_text_color(&mut self, color: Color);
    /// Height of `text` laid out with the current font and size.
    fn measure_text_block_height(&self, text: &str, options: &TextOptions) -> Pt;
    /// Draws `text` with the top of its first line at `y`.
    fn draw_text(
        &mut self,
        text: &str,
        x: Pt,
        y: Pt,
        options: &TextOptions,
    ) -> Result<(), WideTableError>;

    fn annotate(&mut self, _key: &str, _value: &str) {}

    fn finalize(self) -> Result<Self::Output, WideTableError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub commands: Vec<Command>,
    emitted: GraphicsState,
}

impl Page {
    fn new() -> Self {
        Self {
            commands: Vec::new(),
            emitted: GraphicsState::default(),
        }
    }

    pub fn meta(&self, key: &str) -> Option<&str> {
        self.commands.iter().find_map(|cmd| match cmd {
            Command::Meta { key: k, value } if k == key => Some(value.as_str()),
            _ => None,
        })
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|cmd| match cmd {
            Command::DrawString { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Document {
    pub page_size: Size,
    pub pages: Vec<Page>,
}

// Last state written into a page's command stream. Each page starts from
// the PDF defaults because content streams do not share state.
#[derive(Debug, Clone, PartialEq)]
struct GraphicsState {
    fill_color: Color,
    stroke_color: Color,
    line_width: Pt,
    dash: Vec<Pt>,
    font_size: Option<Pt>,
    font_name: Option<String>,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            fill_color: Color::BLACK,
            stroke_color: Color::BLACK,
            line_width: Pt::from_f32(1.0),
            dash: Vec::new(),
            font_size: None,
            font_name: None,
        }
    }
}

/// In-memory, page-buffered command recorder.
pub struct Canvas {
    page_size: Size,
    pages: Vec<Page>,
    active: usize,
    font_name: String,
    font_size: Pt,
    text_color: Color,
}

impl Canvas {
    /// Opens the canvas with its first page already active.
    pub fn new(page_size: Size) -> Self {
        Self {
            page_size,
            pages: vec![Page::new()],
            active: 0,
            font_name: font::DEFAULT_FONT_FAMILY.to_string(),
            font_size: Pt::from_f32(12.0),
            text_color: Color::BLACK,
        }
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    fn page(&mut self) -> &mut Page {
        &mut self.pages[self.active]
    }

    fn set_fill_color(&mut self, color: Color) {
        let page = self.page();
        if page.emitted.fill_color == color {
            return;
        }
        page.emitted.fill_color = color;
        page.commands.push(Command::SetFillColor(color));
    }

    fn apply_stroke(&mut self, stroke: &StrokeStyle) {
        let page = self.page();
        if page.emitted.stroke_color != stroke.color {
            page.emitted.stroke_color = stroke.color;
            page.commands.push(Command::SetStrokeColor(stroke.color));
        }
        let width = stroke.width.max(Pt::ZERO);
        if page.emitted.line_width != width {
            page.emitted.line_width = width;
            page.commands.push(Command::SetLineWidth(width));
        }
        if page.emitted.dash != stroke.dash {
            page.emitted.dash = stroke.dash.clone();
            page.commands.push(Command::SetDash {
                pattern: stroke.dash.clone(),
                phase: Pt::ZERO,
            });
        }
    }

    fn apply_font(&mut self) {
        let name = self.font_name.clone();
        let size = self.font_size;
        let page = self.page();
        if page.emitted.font_name.as_deref() != Some(name.as_str()) {
            page.emitted.font_name = Some(name.clone());
            page.commands.push(Command::SetFontName(name));
        }
        if page.emitted.font_size != Some(size) {
            page.emitted.font_size = Some(size);
            page.commands.push(Command::SetFontSize(size));
        }
    }
}

impl Surface for Canvas {
    type Output = Document;

    fn page_size(&self) -> Size {
        self.page_size
    }

    fn append_page(&mut self) {
        self.pages.push(Page::new());
        self.active = self.pages.len() - 1;
    }

    fn switch_to_page(&mut self, index: usize) -> Result<(), WideTableError> {
        if index >= self.pages.len() {
            return Err(WideTableError::PageOutOfRange {
                index,
                count: self.pages.len(),
            });
        }
        self.active = index;
        Ok(())
    }

    fn current_page_index(&self) -> usize {
        self.active
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn fill_rect(
        &mut self,
        x: Pt,
        y: Pt,
        width: Pt,
        height: Pt,
        color: Color,
    ) -> Result<(), WideTableError> {
        self.set_fill_color(color);
        let page = self.page();
        page.commands.push(Command::DrawRect {
            x,
            y,
            width,
            height,
        });
        page.commands.push(Command::Fill);
        Ok(())
    }

    fn stroke_line(
        &mut self,
        from: (Pt, Pt),
        to: (Pt, Pt),
        stroke: &StrokeStyle,
    ) -> Result<(), WideTableError> {
        self.apply_stroke(stroke);
        let page = self.page();
        page.commands.push(Command::MoveTo {
            x: from.0,
            y: from.1,
        });
        page.commands.push(Command::LineTo { x: to.0, y: to.1 });
        page.commands.push(Command::Stroke);
        Ok(())
    }

    fn set_font(&mut self, name: &str) {
        self.font_name = name.to_string();
    }

    fn set_font_size(&mut self, size: Pt) {
        self.font_size = size;
    }

    fn set_text_color(&mut self, color: Color) {
        self.text_color = color;
    }

    fn measure_text_block_height(&self, text: &str, options: &TextOptions) -> Pt {
        let lines = font::layout_lines(&self.font_name, self.font_size, text, options.wrap_width());
        font::line_height(&self.font_name, self.font_size) * (lines.len() as f32)
    }

    fn draw_text(
        &mut self,
        text: &str,
        x: Pt,
        y: Pt,
        options: &TextOptions,
    ) -> Result<(), WideTableError> {
        let lines = font::layout_lines(&self.font_name, self.font_size, text, options.wrap_width());
        if lines.iter().all(|line| line.is_empty()) {
            return Ok(());
        }
        self.apply_font();
        self.set_fill_color(self.text_color);
        let line_height = font::line_height(&self.font_name, self.font_size);
        let mut baseline = y + font::ascent(&self.font_name, self.font_size);
        for line in lines {
            if !line.is_empty() {
                let line_width = font::measure_text_width(&self.font_name, self.font_size, &line);
                let offset = match options.align {
                    HAlign::Left => Pt::ZERO,
                    HAlign::Center => (options.width - line_width) / 2.0,
                    HAlign::Right => options.width - line_width,
                };
                self.page().commands.push(Command::DrawString {
                    x: x + offset,
                    y: baseline,
                    text: line,
                });
            }
            baseline += line_height;
        }
        Ok(())
    }

    fn annotate(&mut self, key: &str, value: &str) {
        self.page().commands.push(Command::Meta {
            key: key.to_string(),
            value: value.to_string(),
        });
    }

    fn finalize(self) -> Result<Document, WideTableError> {
        Ok(Document {
            page_size: self.page_size,
            pages: self.pages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(width: f32, align: HAlign, line_break: bool) -> TextOptions {
        TextOptions {
            width: Pt::from_f32(width),
            align,
            line_break,
        }
    }

    fn strings(page: &Page) -> Vec<(Pt, Pt, String)> {
        page.commands
            .iter()
            .filter_map(|cmd| match cmd {
                Command::DrawString { x, y, text } => Some((*x, *y, text.clone())),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn starts_with_one_open_page() {
        let canvas = Canvas::new(Size::a4());
        assert_eq!(canvas.page_count(), 1);
        assert_eq!(canvas.current_page_index(), 0);
    }

    #[test]
    fn append_activates_and_switch_returns() {
        let mut canvas = Canvas::new(Size::a4());
        canvas.append_page();
        canvas.append_page();
        assert_eq!(canvas.current_page_index(), 2);
        canvas.switch_to_page(0).unwrap();
        canvas.fill_rect(
            Pt::ZERO,
            Pt::ZERO,
            Pt::from_f32(10.0),
            Pt::from_f32(10.0),
            Color::rgb(1.0, 0.0, 0.0),
        )
        .unwrap();
        assert_eq!(canvas.pages()[0].commands.len(), 3);
        assert!(canvas.pages()[2].commands.is_empty());

        let err = canvas.switch_to_page(3).unwrap_err();
        assert!(matches!(err, WideTableError::PageOutOfRange { index: 3, count: 3 }));
    }

    #[test]
    fn graphics_state_is_deduplicated_per_page() {
        let mut canvas = Canvas::new(Size::a4());
        let stroke = StrokeStyle {
            width: Pt::from_f32(0.5),
            color: Color::BLACK,
            dash: vec![Pt::from_f32(5.0), Pt::from_f32(3.0)],
        };
        let origin = (Pt::ZERO, Pt::ZERO);
        let end = (Pt::from_f32(10.0), Pt::ZERO);
        canvas.stroke_line(origin, end, &stroke).unwrap();
        canvas.stroke_line(origin, end, &stroke).unwrap();
        let set_width = canvas.pages()[0]
            .commands
            .iter()
            .filter(|c| matches!(c, Command::SetLineWidth(_)))
            .count();
        assert_eq!(set_width, 1);

        canvas.append_page();
        canvas.stroke_line(origin, end, &stroke).unwrap();
        assert!(canvas.pages()[1]
            .commands
            .iter()
            .any(|c| matches!(c, Command::SetDash { .. })));
    }

    #[test]
    fn text_alignment_offsets() {
        let mut canvas = Canvas::new(Size::a4());
        canvas.set_font("Helvetica");
        canvas.set_font_size(Pt::from_f32(10.0));
        let text_width = font::measure_text_width("Helvetica", Pt::from_f32(10.0), "abc");
        let x = Pt::from_f32(100.0);
        for align in [HAlign::Left, HAlign::Right, HAlign::Center] {
            let opts = options(100.0, align, false);
            canvas.draw_text("abc", x, Pt::ZERO, &opts).unwrap();
        }
        let drawn = strings(&canvas.pages()[0]);
        assert_eq!(drawn[0].0, x);
        assert_eq!(drawn[1].0, x + Pt::from_f32(100.0) - text_width);
        assert_eq!(drawn[2].0, x + (Pt::from_f32(100.0) - text_width) / 2.0);
        // baseline sits one ascent below the requested top
        assert_eq!(drawn[0].1, font::ascent("Helvetica", Pt::from_f32(10.0)));
    }

    #[test]
    fn measured_height_depends_on_line_break() {
        let mut canvas = Canvas::new(Size::a4());
        canvas.set_font("Helvetica");
        canvas.set_font_size(Pt::from_f32(10.0));
        let line = font::line_height("Helvetica", Pt::from_f32(10.0));
        let text = "one two three four five six";
        assert_eq!(
            canvas.measure_text_block_height(text, &options(30.0, HAlign::Left, false)),
            line
        );
        let wrapped = canvas.measure_text_block_height(text, &options(30.0, HAlign::Left, true));
        assert!(wrapped > line);
        let empty = canvas.measure_text_block_height("", &options(30.0, HAlign::Left, true));
        assert_eq!(empty, Pt::ZERO);
    }

    #[test]
    fn empty_text_draws_nothing() {
        let mut canvas = Canvas::new(Size::a4());
        let opts = options(50.0, HAlign::Left, false);
        canvas.draw_text("", Pt::ZERO, Pt::ZERO, &opts).unwrap();
        assert!(canvas.pages()[0].commands.is_empty());
    }

    #[test]
    fn finalize_returns_every_buffered_page() {
        let mut canvas = Canvas::new(Size::letter());
        canvas.append_page();
        canvas.annotate("k", "v");
        let document = canvas.finalize().unwrap();
        assert_eq!(document.pages.len(), 2);
        assert_eq!(document.pages[1].meta("k"), Some("v"));
        assert_eq!(document.page_size, Size::letter());
    }
}
