pub mod payslip;
pub mod report;

use anyhow::anyhow;
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocumentReference, PdfLayerReference, Point,
    Rgb,
};

pub const PAGE_WIDTH_MM: f32 = 210.0;
pub const PAGE_HEIGHT_MM: f32 = 297.0;
pub const MARGIN_MM: f32 = 15.0;
pub const RIGHT_EDGE_MM: f32 = PAGE_WIDTH_MM - MARGIN_MM;

const PT_TO_MM: f32 = 0.352_778;

pub struct Fonts {
    pub regular: IndirectFontRef,
    pub bold: IndirectFontRef,
    /// Monospace, used for amount columns so right alignment is exact.
    pub mono: IndirectFontRef,
    pub mono_bold: IndirectFontRef,
}

impl Fonts {
    pub fn load(doc: &PdfDocumentReference) -> anyhow::Result<Self> {
        let load = |f: BuiltinFont| {
            doc.add_builtin_font(f)
                .map_err(|e| anyhow!("failed to load builtin font: {e}"))
        };
        Ok(Self {
            regular: load(BuiltinFont::Helvetica)?,
            bold: load(BuiltinFont::HelveticaBold)?,
            mono: load(BuiltinFont::Courier)?,
            mono_bold: load(BuiltinFont::CourierBold)?,
        })
    }
}

/// Thin drawing wrapper over one page layer. Coordinates are given in mm
/// from the top-left corner, the way the layout is specified, and converted
/// to PDF bottom-left space here.
pub struct Canvas<'a> {
    layer: PdfLayerReference,
    fonts: &'a Fonts,
}

impl<'a> Canvas<'a> {
    pub fn new(layer: PdfLayerReference, fonts: &'a Fonts) -> Self {
        layer.set_outline_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
        Self { layer, fonts }
    }

    pub fn layer(&self) -> &PdfLayerReference {
        &self.layer
    }

    fn from_top(y: f32) -> Mm {
        Mm(PAGE_HEIGHT_MM - y)
    }

    pub fn text(&self, text: &str, size: f32, x: f32, y: f32) {
        self.layer
            .use_text(text, size, Mm(x), Self::from_top(y), &self.fonts.regular);
    }

    pub fn text_bold(&self, text: &str, size: f32, x: f32, y: f32) {
        self.layer
            .use_text(text, size, Mm(x), Self::from_top(y), &self.fonts.bold);
    }

    /// Centering uses an average glyph width; builtin fonts carry no metrics
    /// printpdf exposes, and the approximation is well within a millimetre
    /// for header-length strings.
    pub fn text_centered_bold(&self, text: &str, size: f32, y: f32) {
        let width = text.chars().count() as f32 * size * 0.5 * PT_TO_MM;
        let x = (PAGE_WIDTH_MM - width) / 2.0;
        self.layer
            .use_text(text, size, Mm(x), Self::from_top(y), &self.fonts.bold);
    }

    /// Right-aligned monospace text. Courier glyphs are exactly 0.6 em wide,
    /// so the alignment is exact.
    pub fn amount(&self, text: &str, size: f32, right_edge: f32, y: f32) {
        let width = text.chars().count() as f32 * size * 0.6 * PT_TO_MM;
        self.layer.use_text(
            text,
            size,
            Mm(right_edge - width),
            Self::from_top(y),
            &self.fonts.mono,
        );
    }

    pub fn amount_bold(&self, text: &str, size: f32, right_edge: f32, y: f32) {
        let width = text.chars().count() as f32 * size * 0.6 * PT_TO_MM;
        self.layer.use_text(
            text,
            size,
            Mm(right_edge - width),
            Self::from_top(y),
            &self.fonts.mono_bold,
        );
    }

    pub fn hline(&self, x1: f32, x2: f32, y: f32, thickness: f32) {
        self.layer.set_outline_thickness(thickness);
        self.layer.add_line(Line {
            points: vec![
                (Point::new(Mm(x1), Self::from_top(y)), false),
                (Point::new(Mm(x2), Self::from_top(y)), false),
            ],
            is_closed: false,
        });
    }

    /// Unfilled rectangle, `y` being the top edge.
    pub fn rect(&self, x: f32, y: f32, width: f32, height: f32, thickness: f32) {
        self.layer.set_outline_thickness(thickness);
        self.layer.add_line(Line {
            points: vec![
                (Point::new(Mm(x), Self::from_top(y)), false),
                (Point::new(Mm(x + width), Self::from_top(y)), false),
                (Point::new(Mm(x + width), Self::from_top(y + height)), false),
                (Point::new(Mm(x), Self::from_top(y + height)), false),
            ],
            is_closed: true,
        });
    }
}

/// Indian-convention digit grouping (last three digits, then pairs), no
/// decimals: 48000 -> "48,000", 1234567 -> "12,34,567".
pub fn format_inr(amount: f64) -> String {
    let rounded = amount.round() as i64;
    let negative = rounded < 0;
    let digits = rounded.abs().to_string();

    let mut grouped = String::new();
    let chars: Vec<char> = digits.chars().rev().collect();
    for (i, ch) in chars.iter().enumerate() {
        if i == 3 || (i > 3 && (i - 3) % 2 == 0) {
            grouped.push(',');
        }
        grouped.push(*ch);
    }
    let grouped: String = grouped.chars().rev().collect();

    if negative {
        format!("-{grouped}")
    } else {
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_in_indian_convention() {
        assert_eq!(format_inr(0.0), "0");
        assert_eq!(format_inr(999.0), "999");
        assert_eq!(format_inr(48000.0), "48,000");
        assert_eq!(format_inr(100000.0), "1,00,000");
        assert_eq!(format_inr(1234567.0), "12,34,567");
        assert_eq!(format_inr(10000000.0), "1,00,00,000");
    }

    #[test]
    fn rounds_to_whole_rupees() {
        assert_eq!(format_inr(48000.4), "48,000");
        assert_eq!(format_inr(47999.6), "48,000");
    }

    #[test]
    fn negative_amounts_keep_the_sign() {
        // never rendered on a payslip, but the formatter should not mangle it
        assert_eq!(format_inr(-1500.0), "-1,500");
    }
}
