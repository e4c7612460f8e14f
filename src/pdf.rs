use crate::canvas::{Command, Document, Page};
use crate::error::WideTableError;
use crate::font::DEFAULT_FONT_FAMILY;
use crate::types::{Color, Pt};
use log::debug;
use lopdf::{Document as LoDocument, Object as LoObject, Stream as LoStream, dictionary};
use std::collections::BTreeMap;
use std::io::Write;

const BASE14_FONTS: [&str; 14] = [
    "Courier",
    "Courier-Bold",
    "Courier-Oblique",
    "Courier-BoldOblique",
    "Helvetica",
    "Helvetica-Bold",
    "Helvetica-Oblique",
    "Helvetica-BoldOblique",
    "Times-Roman",
    "Times-Bold",
    "Times-Italic",
    "Times-BoldItalic",
    "Symbol",
    "ZapfDingbats",
];

/// Resource name (`F1`, `F2`, ...) and base font for every font the
/// document uses, keyed by the name recorded on the canvas.
struct FontMap {
    fonts: BTreeMap<String, (String, String)>,
}

impl FontMap {
    fn collect(document: &Document) -> Self {
        let mut fonts = BTreeMap::new();
        let names = document.pages.iter().flat_map(|page| {
            page.commands.iter().filter_map(|cmd| match cmd {
                Command::SetFontName(name) => Some(name),
                _ => None,
            })
        });
        for name in names {
            if !fonts.contains_key(name) {
                let resource = format!("F{}", fonts.len() + 1);
                fonts.insert(name.clone(), (resource, base_font(name)));
            }
        }
        Self { fonts }
    }

    fn resource(&self, name: &str) -> &str {
        self.fonts
            .get(name)
            .map(|(resource, _)| resource.as_str())
            .unwrap_or("F1")
    }
}

// Fonts outside the standard 14 fall back to Helvetica of the same weight.
fn base_font(name: &str) -> String {
    let trimmed = name.trim();
    if let Some(found) = BASE14_FONTS
        .iter()
        .find(|base| base.eq_ignore_ascii_case(trimmed))
    {
        return found.to_string();
    }
    if trimmed.to_ascii_lowercase().ends_with("-bold") {
        "Helvetica-Bold".to_string()
    } else {
        DEFAULT_FONT_FAMILY.to_string()
    }
}

/// Serializes the recorded document and returns its bytes.
pub fn document_to_pdf(document: &Document) -> Result<Vec<u8>, WideTableError> {
    let mut out = Vec::new();
    write_pdf(document, &mut out)?;
    Ok(out)
}

/// Writes the document as PDF and returns the number of bytes written.
pub fn write_pdf<W: Write>(document: &Document, writer: &mut W) -> Result<usize, WideTableError> {
    let fonts = FontMap::collect(document);
    let mut pdf = LoDocument::with_version("1.7");
    let pages_id = pdf.new_object_id();

    let mut font_dict = lopdf::Dictionary::new();
    for (resource, base) in fonts.fonts.values() {
        let font_id = pdf.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => base.clone(),
            "Encoding" => "WinAnsiEncoding",
        });
        font_dict.set(resource.as_str(), font_id);
    }
    let resources_id = pdf.add_object(dictionary! {
        "Font" => font_dict,
    });

    let width = document.page_size.width.to_f32();
    let height = document.page_size.height.to_f32();
    let mut kids: Vec<LoObject> = Vec::with_capacity(document.pages.len());
    for page in &document.pages {
        let content = render_page(page, document.page_size.height, &fonts);
        let content_id = pdf.add_object(LoStream::new(dictionary! {}, content));
        let page_id = pdf.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), width.into(), height.into()],
        });
        kids.push(LoObject::Reference(page_id));
    }

    pdf.objects.insert(
        pages_id,
        LoObject::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => document.pages.len() as i64,
        }),
    );
    let catalog_id = pdf.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    pdf.trailer.set("Root", catalog_id);
    pdf.compress();

    let mut bytes = Vec::new();
    pdf.save_to(&mut bytes)?;
    writer.write_all(&bytes)?;
    debug!(
        "wrote {} pages ({} bytes, {} fonts)",
        document.pages.len(),
        bytes.len(),
        fonts.fonts.len()
    );
    Ok(bytes.len())
}

// Canvas coordinates grow downwards from the top-left corner; PDF user
// space grows upwards from the bottom-left.
fn render_page(page: &Page, page_height: Pt, fonts: &FontMap) -> Vec<u8> {
    let mut out: Vec<u8> = Vec::new();
    let mut font_resource = fonts.resource(DEFAULT_FONT_FAMILY).to_string();
    let mut font_size = Pt::from_f32(12.0);
    let flip = |y: Pt| page_height - y;

    for cmd in &page.commands {
        match cmd {
            Command::Meta { .. } => {}
            Command::SetFillColor(color) => {
                out.extend_from_slice(format!("{} rg\n", fmt_color(*color)).as_bytes());
            }
            Command::SetStrokeColor(color) => {
                out.extend_from_slice(format!("{} RG\n", fmt_color(*color)).as_bytes());
            }
            Command::SetLineWidth(width) => {
                out.extend_from_slice(format!("{} w\n", fmt_pt(*width)).as_bytes());
            }
            Command::SetDash { pattern, phase } => {
                let parts: Vec<String> = pattern.iter().map(|p| fmt_pt(*p)).collect();
                out.extend_from_slice(
                    format!("[{}] {} d\n", parts.join(" "), fmt_pt(*phase)).as_bytes(),
                );
            }
            Command::SetFontName(name) => {
                font_resource = fonts.resource(name).to_string();
            }
            Command::SetFontSize(size) => font_size = *size,
            Command::MoveTo { x, y } => {
                let op = format!("{} {} m\n", fmt_pt(*x), fmt_pt(flip(*y)));
                out.extend_from_slice(op.as_bytes());
            }
            Command::LineTo { x, y } => {
                let op = format!("{} {} l\n", fmt_pt(*x), fmt_pt(flip(*y)));
                out.extend_from_slice(op.as_bytes());
            }
            Command::Stroke => out.extend_from_slice(b"S\n"),
            Command::DrawRect {
                x,
                y,
                width,
                height,
            } => {
                out.extend_from_slice(
                    format!(
                        "{} {} {} {} re\n",
                        fmt_pt(*x),
                        fmt_pt(flip(*y + *height)),
                        fmt_pt(*width),
                        fmt_pt(*height)
                    )
                    .as_bytes(),
                );
            }
            Command::Fill => out.extend_from_slice(b"f\n"),
            Command::DrawString { x, y, text } => {
                out.extend_from_slice(
                    format!(
                        "BT /{} {} Tf {} {} Td (",
                        font_resource,
                        fmt_pt(font_size),
                        fmt_pt(*x),
                        fmt_pt(flip(*y))
                    )
                    .as_bytes(),
                );
                out.extend_from_slice(&encode_win_ansi(text));
                out.extend_from_slice(b") Tj ET\n");
            }
        }
    }
    out
}

/// Latin-1 bytes with PDF string escapes; characters outside Latin-1
/// become `?`.
fn encode_win_ansi(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.extend_from_slice(b"\\\\"),
            '(' => out.extend_from_slice(b"\\("),
            ')' => out.extend_from_slice(b"\\)"),
            '\n' => out.extend_from_slice(b"\\n"),
            '\r' => out.extend_from_slice(b"\\r"),
            _ => out.push(u8::try_from(u32::from(ch)).unwrap_or(b'?')),
        }
    }
    out
}

fn fmt_color(color: Color) -> String {
    let channel = |v: f32| format_milli((v.clamp(0.0, 1.0) as f64 * 1000.0).round() as i64);
    format!("{} {} {}", channel(color.r), channel(color.g), channel(color.b))
}

fn format_milli(milli: i64) -> String {
    if milli == 0 {
        return "0".to_string();
    }
    let sign = if milli < 0 { "-" } else { "" };
    let abs = milli.abs();
    let whole = abs / 1000;
    let frac = abs % 1000;
    if frac == 0 {
        return format!("{sign}{whole}");
    }
    let digits = format!("{frac:03}");
    format!("{sign}{whole}.{}", digits.trim_end_matches('0'))
}

fn fmt_pt(value: Pt) -> String {
    format_milli(value.to_milli_i64())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{Canvas, StrokeStyle, Surface, TextOptions};
    use crate::style::HAlign;
    use crate::types::Size;

    fn sample_document() -> Document {
        let mut canvas = Canvas::new(Size::new(200.0, 100.0));
        canvas.fill_rect(
            Pt::from_f32(10.0),
            Pt::from_f32(20.0),
            Pt::from_f32(30.0),
            Pt::from_f32(5.0),
            Color::rgb(1.0, 0.0, 0.0),
        )
        .unwrap();
        canvas.set_font("Helvetica-Bold");
        canvas.set_font_size(Pt::from_f32(10.0));
        let options = TextOptions {
            width: Pt::from_f32(100.0),
            align: HAlign::Left,
            line_break: false,
        };
        canvas
            .draw_text("Total (net)", Pt::from_f32(10.0), Pt::from_f32(40.0), &options)
            .unwrap();
        canvas.append_page();
        canvas.stroke_line(
            (Pt::ZERO, Pt::from_f32(10.0)),
            (Pt::from_f32(50.0), Pt::from_f32(10.0)),
            &StrokeStyle {
                width: Pt::from_f32(0.5),
                color: Color::BLACK,
                dash: vec![Pt::from_f32(1.0), Pt::from_f32(2.0)],
            },
        )
        .unwrap();
        canvas.finalize().unwrap()
    }

    #[test]
    fn number_formatting() {
        assert_eq!(format_milli(0), "0");
        assert_eq!(format_milli(12_500), "12.5");
        assert_eq!(format_milli(-3_000), "-3");
        assert_eq!(fmt_color(Color::rgb(1.0, 0.5, 0.0)), "1 0.5 0");
    }

    #[test]
    fn strings_are_escaped_and_latin1() {
        assert_eq!(encode_win_ansi("a(b)\\"), b"a\\(b\\)\\\\".to_vec());
        assert_eq!(encode_win_ansi("é€"), vec![0xE9, b'?']);
    }

    #[test]
    fn unknown_fonts_map_to_helvetica() {
        assert_eq!(base_font("helvetica-bold"), "Helvetica-Bold");
        assert_eq!(base_font("Comic"), "Helvetica");
        assert_eq!(base_font("Comic-Bold"), "Helvetica-Bold");
    }

    #[test]
    fn coordinates_are_flipped() {
        let document = sample_document();
        let fonts = FontMap::collect(&document);
        let height = document.page_size.height;
        let content = String::from_utf8(render_page(&document.pages[0], height, &fonts)).unwrap();
        // rect top at 20 with height 5 -> bottom edge at 100 - 25
        assert!(content.contains("1 0 0 rg\n10 75 30 5 re\nf\n"), "{content}");
        assert!(content.contains("/F1 10 Tf 10 "), "{content}");
        assert!(content.contains("(Total \\(net\\)) Tj"), "{content}");

        let content = String::from_utf8(render_page(&document.pages[1], height, &fonts)).unwrap();
        assert!(content.contains("[1 2] 0 d\n"));
        assert!(content.contains("0 90 m\n50 90 l\nS\n"));
    }

    #[test]
    fn output_loads_back_with_every_page() {
        let document = sample_document();
        let bytes = document_to_pdf(&document).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.7"));
        let loaded = lopdf::Document::load_mem(&bytes).unwrap();
        let pages = loaded.get_pages();
        assert_eq!(pages.len(), 2);
        let first = pages.get(&1).copied().unwrap();
        let content = loaded.get_page_content(first).unwrap();
        let text = String::from_utf8_lossy(&content);
        assert!(text.contains("Tj"));
    }
}
