use crate::types::Pt;

pub const DEFAULT_FONT_FAMILY: &str = "Helvetica";

/// Advance widths (1/1000 em) for the printable ASCII range, WinAnsi
/// code points 32..=126.
type AsciiWidths = [u16; 95];

#[rustfmt::skip]
const HELVETICA_WIDTHS: AsciiWidths = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    278, 278, 584, 584, 584, 556, 1015,
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    278, 278, 278, 469, 556, 333,
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,
    334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: AsciiWidths = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    333, 333, 584, 584, 584, 611, 975,
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    333, 278, 333, 584, 556, 333,
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
    389, 280, 389, 584,
];

#[rustfmt::skip]
const TIMES_ROMAN_WIDTHS: AsciiWidths = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500,
    278, 278, 564, 564, 564, 444, 921,
    722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889,
    722, 722, 556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611,
    333, 278, 333, 469, 500, 333,
    444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778,
    500, 500, 500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444,
    480, 200, 480, 541,
];

#[derive(Debug)]
pub struct FontMetrics {
    pub name: &'static str,
    widths: Option<&'static AsciiWidths>,
    missing_width: u16,
    ascent: i16,
    descent: i16,
    line_gap: i16,
}

// Times-Bold borrows the roman widths; close enough for cell layout.
static BUILTIN_FONTS: [FontMetrics; 6] = [
    FontMetrics {
        name: "Helvetica",
        widths: Some(&HELVETICA_WIDTHS),
        missing_width: 556,
        ascent: 718,
        descent: -207,
        line_gap: 231,
    },
    FontMetrics {
        name: "Helvetica-Bold",
        widths: Some(&HELVETICA_BOLD_WIDTHS),
        missing_width: 611,
        ascent: 718,
        descent: -207,
        line_gap: 265,
    },
    FontMetrics {
        name: "Times-Roman",
        widths: Some(&TIMES_ROMAN_WIDTHS),
        missing_width: 500,
        ascent: 683,
        descent: -217,
        line_gap: 216,
    },
    FontMetrics {
        name: "Times-Bold",
        widths: Some(&TIMES_ROMAN_WIDTHS),
        missing_width: 500,
        ascent: 683,
        descent: -217,
        line_gap: 253,
    },
    FontMetrics {
        name: "Courier",
        widths: None,
        missing_width: 600,
        ascent: 629,
        descent: -157,
        line_gap: 269,
    },
    FontMetrics {
        name: "Courier-Bold",
        widths: None,
        missing_width: 600,
        ascent: 629,
        descent: -157,
        line_gap: 265,
    },
];

impl FontMetrics {
    fn advance(&self, ch: char) -> u16 {
        let code = ch as u32;
        match self.widths {
            Some(widths) if (32..=126).contains(&code) => widths[(code - 32) as usize],
            _ => self.missing_width,
        }
    }

    pub fn measure(&self, font_size: Pt, text: &str) -> Pt {
        let units: u64 = text.chars().map(|ch| self.advance(ch) as u64).sum();
        font_size * (units as f32 / 1000.0)
    }

    pub fn ascent(&self, font_size: Pt) -> Pt {
        font_size * (self.ascent as f32 / 1000.0)
    }

    pub fn line_height(&self, font_size: Pt) -> Pt {
        let units = self.ascent as i32 - self.descent as i32 + self.line_gap as i32;
        font_size * (units as f32 / 1000.0)
    }
}

fn normalize_name(name: &str) -> String {
    name.trim()
        .chars()
        .filter(|ch| !ch.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase()
}

pub fn resolve(name: &str) -> Option<&'static FontMetrics> {
    let key = normalize_name(name);
    let key = match key.as_str() {
        "times" => "times-roman".to_string(),
        _ => key,
    };
    BUILTIN_FONTS
        .iter()
        .find(|font| font.name.to_ascii_lowercase() == key)
}

/// Concrete font name for a family and weight, e.g. `Helvetica-Bold`.
pub fn font_name_for(family: &str, bold: bool) -> String {
    let family = family.trim();
    let family = if family.is_empty() {
        DEFAULT_FONT_FAMILY
    } else {
        family
    };
    match (normalize_name(family).as_str(), bold) {
        ("times" | "times-roman", false) => "Times-Roman".to_string(),
        ("times" | "times-roman", true) => "Times-Bold".to_string(),
        (_, false) => family.to_string(),
        (_, true) => format!("{family}-Bold"),
    }
}

pub fn measure_text_width(name: &str, font_size: Pt, text: &str) -> Pt {
    match resolve(name) {
        Some(font) => font.measure(font_size, text),
        None => {
            let char_width = (font_size * 0.6).max(Pt::from_f32(1.0));
            char_width * (text.chars().count() as f32)
        }
    }
}

pub fn line_height(name: &str, font_size: Pt) -> Pt {
    match resolve(name) {
        Some(font) => font.line_height(font_size),
        None => font_size * 1.2,
    }
}

pub fn ascent(name: &str, font_size: Pt) -> Pt {
    match resolve(name) {
        Some(font) => font.ascent(font_size),
        None => font_size * 0.8,
    }
}

/// Breaks `text` into lines. Explicit newlines always break; with a wrap
/// width, words are packed greedily and a word wider than the line sits
/// on a line of its own. Empty text has no lines.
pub fn layout_lines(name: &str, font_size: Pt, text: &str, wrap_width: Option<Pt>) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    let Some(max_width) = wrap_width else {
        return text.split('\n').map(str::to_string).collect();
    };
    let space_width = measure_text_width(name, font_size, " ");
    let mut lines = Vec::new();
    for segment in text.split('\n') {
        let mut current = String::new();
        let mut current_width = Pt::ZERO;
        for word in segment.split_whitespace() {
            let word_width = measure_text_width(name, font_size, word);
            if current.is_empty() {
                current.push_str(word);
                current_width = word_width;
                continue;
            }
            let next_width = current_width + space_width + word_width;
            if next_width > max_width {
                lines.push(std::mem::take(&mut current));
                current.push_str(word);
                current_width = word_width;
            } else {
                current.push(' ');
                current.push_str(word);
                current_width = next_width;
            }
        }
        lines.push(current);
    }
    lines
}
