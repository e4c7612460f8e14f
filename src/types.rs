use fixed::types::I32F32;

/// Length in PDF points, stored as fixed-point so cursor arithmetic is
/// reproducible across platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Pt(I32F32);

impl Pt {
    pub const ZERO: Pt = Pt(I32F32::from_bits(0));

    pub fn from_f32(value: f32) -> Pt {
        if !value.is_finite() {
            return Pt::ZERO;
        }
        let milli = (value as f64 * 1000.0).round();
        Pt::from_milli_i64(milli.clamp(i64::MIN as f64, i64::MAX as f64) as i64)
    }

    pub fn from_milli_i64(milli: i64) -> Pt {
        let denom = 1i128 << 32;
        let adj = if milli >= 0 { 500 } else { -500 };
        let bits = (milli as i128 * denom + adj) / 1000;
        Pt(I32F32::from_bits(
            bits.clamp(i64::MIN as i128, i64::MAX as i128) as i64,
        ))
    }

    pub fn to_f32(self) -> f32 {
        self.0.to_num()
    }

    pub fn to_milli_i64(self) -> i64 {
        let scaled = self.0.to_bits() as i128 * 1000;
        let denom = 1i128 << 32;
        let adj = if scaled >= 0 { denom / 2 } else { -denom / 2 };
        ((scaled + adj) / denom) as i64
    }

    pub fn max(self, other: Pt) -> Pt {
        if self >= other { self } else { other }
    }

    pub fn min(self, other: Pt) -> Pt {
        if self <= other { self } else { other }
    }
}

impl std::ops::Add for Pt {
    type Output = Pt;
    fn add(self, rhs: Pt) -> Pt {
        Pt(self.0.saturating_add(rhs.0))
    }
}

impl std::ops::AddAssign for Pt {
    fn add_assign(&mut self, rhs: Pt) {
        *self = *self + rhs;
    }
}

impl std::ops::Sub for Pt {
    type Output = Pt;
    fn sub(self, rhs: Pt) -> Pt {
        Pt(self.0.saturating_sub(rhs.0))
    }
}

impl std::ops::SubAssign for Pt {
    fn sub_assign(&mut self, rhs: Pt) {
        *self = *self - rhs;
    }
}

impl std::ops::Mul<f32> for Pt {
    type Output = Pt;
    fn mul(self, rhs: f32) -> Pt {
        if !rhs.is_finite() {
            return Pt::ZERO;
        }
        Pt::from_f32(self.to_f32() * rhs)
    }
}

impl std::ops::Div<f32> for Pt {
    type Output = Pt;
    fn div(self, rhs: f32) -> Pt {
        if rhs == 0.0 || !rhs.is_finite() {
            Pt::ZERO
        } else {
            Pt::from_f32(self.to_f32() / rhs)
        }
    }
}

impl std::ops::Neg for Pt {
    type Output = Pt;
    fn neg(self) -> Pt {
        Pt(self.0.saturating_neg())
    }
}

impl std::iter::Sum for Pt {
    fn sum<I: Iterator<Item = Pt>>(iter: I) -> Pt {
        iter.fold(Pt::ZERO, |acc, v| acc + v)
    }
}

impl<'a> std::iter::Sum<&'a Pt> for Pt {
    fn sum<I: Iterator<Item = &'a Pt>>(iter: I) -> Pt {
        iter.fold(Pt::ZERO, |acc, v| acc + *v)
    }
}

impl std::fmt::Display for Pt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.3}", self.to_f32())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: Pt,
    pub height: Pt,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: Pt::from_f32(width),
            height: Pt::from_f32(height),
        }
    }

    pub fn a4() -> Self {
        Self::new(595.28, 841.89)
    }

    pub fn letter() -> Self {
        // 8.5in x 11in at 72pt/in.
        Self::new(612.0, 792.0)
    }

    pub fn landscape(self) -> Self {
        Self {
            width: self.height,
            height: self.width,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    pub top: Pt,
    pub right: Pt,
    pub bottom: Pt,
    pub left: Pt,
}

impl Margins {
    pub fn all(value: f32) -> Self {
        let v = Pt::from_f32(value);
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }
}

impl Default for Margins {
    fn default() -> Self {
        // pdfkit's default of one inch.
        Margins::all(72.0)
    }
}

/// Paper sizes accepted by `pageConfig.format`, in portrait orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageFormat {
    A3,
    A4,
    A5,
    Letter,
    Legal,
    Tabloid,
}

impl PageFormat {
    /// Unknown names fall back to A4.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_uppercase().as_str() {
            "A3" => PageFormat::A3,
            "A5" => PageFormat::A5,
            "LETTER" => PageFormat::Letter,
            "LEGAL" => PageFormat::Legal,
            "TABLOID" => PageFormat::Tabloid,
            _ => PageFormat::A4,
        }
    }

    pub fn size(self) -> Size {
        match self {
            PageFormat::A3 => Size::new(841.89, 1190.55),
            PageFormat::A4 => Size::a4(),
            PageFormat::A5 => Size::new(419.53, 595.28),
            PageFormat::Letter => Size::letter(),
            PageFormat::Legal => Size::new(612.0, 1008.0),
            PageFormat::Tabloid => Size::new(792.0, 1224.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

impl Orientation {
    pub fn parse(code: &str) -> Self {
        match code.trim() {
            "l" | "L" | "landscape" => Orientation::Landscape,
            _ => Orientation::Portrait,
        }
    }

    pub fn apply(self, size: Size) -> Size {
        match self {
            Orientation::Portrait => size,
            Orientation::Landscape => size.landscape(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };

    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Parses `#rrggbb`, `rrggbb`, `#rgb` or `rgb`. A missing `#` is
    /// tolerated; anything that still fails to parse renders as black.
    pub fn from_hex(raw: &str) -> Color {
        let normalized = normalize_hex(raw);
        let digits = &normalized[1..];
        if !digits.is_ascii() {
            return Color::BLACK;
        }
        let expanded: String = match digits.len() {
            3 => digits.chars().flat_map(|ch| [ch, ch]).collect(),
            6 => digits.to_string(),
            _ => return Color::BLACK,
        };
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&expanded[range], 16)
                .map(|v| v as f32 / 255.0)
                .ok()
        };
        match (channel(0..2), channel(2..4), channel(4..6)) {
            (Some(r), Some(g), Some(b)) => Color::rgb(r, g, b),
            _ => Color::BLACK,
        }
    }
}

/// Prefixes `#` when the configuration omitted it.
pub fn normalize_hex(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with('#') {
        trimmed.to_string()
    } else {
        format!("#{trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pt_round_trips_through_milli() {
        let v = Pt::from_f32(12.345);
        assert_eq!(v.to_milli_i64(), 12_345);
        assert_eq!((v + Pt::from_f32(0.655)).to_milli_i64(), 13_000);
        assert_eq!((Pt::from_f32(5.0) - Pt::from_f32(7.5)).to_milli_i64(), -2_500);
    }

    #[test]
    fn pt_sums_and_scales() {
        let total: Pt = [100.0, 200.0, 0.5].iter().map(|v| Pt::from_f32(*v)).sum();
        assert_eq!(total.to_milli_i64(), 300_500);
        assert_eq!((Pt::from_f32(10.0) * 0.5).to_milli_i64(), 5_000);
        assert_eq!(Pt::from_f32(10.0) / 0.0, Pt::ZERO);
    }

    #[test]
    fn hex_colors_accept_missing_hash() {
        assert_eq!(normalize_hex("ff0000"), "#ff0000");
        assert_eq!(normalize_hex("#00ff00"), "#00ff00");
        assert_eq!(Color::from_hex("ff0000"), Color::rgb(1.0, 0.0, 0.0));
        assert_eq!(Color::from_hex("#fff"), Color::rgb(1.0, 1.0, 1.0));
        assert_eq!(Color::from_hex("nonsense"), Color::BLACK);
    }

    #[test]
    fn formats_and_orientation() {
        assert_eq!(PageFormat::parse("letter"), PageFormat::Letter);
        assert_eq!(PageFormat::parse("b9"), PageFormat::A4);
        let landscape = Orientation::parse("l").apply(PageFormat::A4.size());
        assert_eq!(landscape.width, Size::a4().height);
        assert_eq!(landscape.height, Size::a4().width);
    }
}
