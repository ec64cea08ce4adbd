use std::path::Path;

use printpdf::{Image, ImageTransform, Mm, image_crate};
use tracing::debug;

use super::{Canvas, MARGIN_MM, PAGE_HEIGHT_MM, PAGE_WIDTH_MM, RIGHT_EDGE_MM, format_inr};
use crate::model::salary::PayslipData;

const BANNER_TOP_MM: f32 = 12.0;
const BANNER_HEIGHT_MM: f32 = 30.0;
const BANNER_FALLBACK: &str = "COLLEGE ADMINISTRATIVE PORTAL";

const LEDGER_ROW_MM: f32 = 6.5;
/// Short ledgers are padded to this many rows so the box height looks the
/// same on every payslip.
const MIN_LEDGER_ROWS: usize = 6;

// column edges of the two ledger halves
const LEFT_COL_X: f32 = MARGIN_MM;
const LEFT_COL_END: f32 = 102.0;
const RIGHT_COL_X: f32 = 108.0;
const RIGHT_COL_END: f32 = RIGHT_EDGE_MM;

/// Gross, total deductions and net recomputed from the stored line items.
/// For a correctly imported record the net equals the persisted `amount`;
/// recomputing here keeps the payslip honest about its own arithmetic.
pub fn recompute_totals(slip: &PayslipData) -> (f64, f64, f64) {
    let gross =
        slip.basic + slip.hra + slip.da + slip.conveyance + slip.medical + slip.other_earnings;
    let deductions = slip.pf + slip.professional_tax + slip.tax + slip.other_deductions;
    (gross, deductions, gross - deductions)
}

/// Draws the institution banner flush to the top margin, falling back to a
/// centered text header when the asset is missing or unreadable. Returns the
/// y (from top) where content continues.
fn draw_header(canvas: &Canvas<'_>, banner: &Path) -> f32 {
    let drawn = image_crate::open(banner).ok().map(|img| {
        use image_crate::GenericImageView;
        let (px_w, px_h) = img.dimensions();
        let dpi = 300.0_f32;
        // native size at the chosen dpi, then scale to the banner box
        let native_w = px_w as f32 * 25.4 / dpi;
        let native_h = px_h as f32 * 25.4 / dpi;
        let target_w = PAGE_WIDTH_MM - 2.0 * MARGIN_MM;

        Image::from_dynamic_image(&img).add_to_layer(
            canvas.layer().clone(),
            ImageTransform {
                translate_x: Some(Mm(MARGIN_MM)),
                translate_y: Some(Mm(PAGE_HEIGHT_MM - BANNER_TOP_MM - BANNER_HEIGHT_MM)),
                scale_x: Some(target_w / native_w),
                scale_y: Some(BANNER_HEIGHT_MM / native_h),
                dpi: Some(dpi),
                ..Default::default()
            },
        );
    });

    if drawn.is_none() {
        debug!(banner = %banner.display(), "Banner asset missing, using text header");
        canvas.text_centered_bold(BANNER_FALLBACK, 16.0, BANNER_TOP_MM + 18.0);
    }

    let rule_y = BANNER_TOP_MM + BANNER_HEIGHT_MM + 3.0;
    canvas.hline(MARGIN_MM, RIGHT_EDGE_MM, rule_y, 0.5);
    rule_y + 4.0
}

/// Lays out one fixed-format payslip page. Returns the net amount as
/// recomputed from the rendered line items.
pub fn render_payslip(canvas: &Canvas<'_>, slip: &PayslipData, banner: &Path) -> f64 {
    let mut y = draw_header(canvas, banner);

    // title
    y += 5.0;
    canvas.text_centered_bold(&format!("Pay Slip - {} {}", slip.month, slip.year), 16.0, y);
    y += 10.0;

    // identity block, two label/value columns
    let rows: [[(&str, String); 2]; 3] = [
        [
            ("Employee ID:", slip.username.clone()),
            ("Month:", slip.month.clone()),
        ],
        [
            ("Name:", slip.name.clone()),
            ("Year:", slip.year.to_string()),
        ],
        [
            ("Department:", slip.department.clone()),
            ("Faculty ID:", slip.username.clone()),
        ],
    ];
    for row in &rows {
        canvas.text_bold(row[0].0, 10.0, MARGIN_MM, y);
        canvas.text(&row[0].1, 10.0, MARGIN_MM + 35.0, y);
        canvas.text_bold(row[1].0, 10.0, RIGHT_COL_X + 2.0, y);
        canvas.text(&row[1].1, 10.0, RIGHT_COL_X + 37.0, y);
        y += 7.0;
    }
    canvas.text_bold("Designation:", 10.0, MARGIN_MM, y);
    canvas.text(&slip.designation, 10.0, MARGIN_MM + 35.0, y);
    y += 10.0;

    // two-column ledger
    let emoluments: [(&str, f64); 6] = [
        ("Basic and Grade Pay", slip.basic),
        ("House Rent Allowance", slip.hra),
        ("Dearness Allowance", slip.da),
        ("Conveyance Allowance", slip.conveyance),
        ("Medical Allowance", slip.medical),
        ("Other Allowance", slip.other_earnings),
    ];
    let deductions: [(&str, f64); 5] = [
        ("Provident Fund", slip.pf),
        ("Professional Tax", slip.professional_tax),
        ("Income Tax (TDS)", slip.tax),
        ("Others", slip.other_deductions),
        ("LLP", 0.0),
    ];

    canvas.hline(LEFT_COL_X, LEFT_COL_END, y, 0.5);
    canvas.hline(RIGHT_COL_X, RIGHT_COL_END, y, 0.5);
    y += 5.0;
    canvas.text_bold("EMOLUMENTS", 10.0, LEFT_COL_X + 1.0, y);
    canvas.text_bold("AMOUNT (Rs.)", 10.0, LEFT_COL_END - 28.0, y);
    canvas.text_bold("DEDUCTIONS", 10.0, RIGHT_COL_X + 1.0, y);
    canvas.text_bold("AMOUNT (Rs.)", 10.0, RIGHT_COL_END - 28.0, y);
    y += 2.5;
    canvas.hline(LEFT_COL_X, LEFT_COL_END, y, 0.5);
    canvas.hline(RIGHT_COL_X, RIGHT_COL_END, y, 0.5);
    y += 6.0;

    let ledger_rows = emoluments.len().max(deductions.len()).max(MIN_LEDGER_ROWS);
    for i in 0..ledger_rows {
        if let Some((label, value)) = emoluments.get(i) {
            canvas.text(label, 10.0, LEFT_COL_X + 1.0, y);
            canvas.amount(&format_inr(*value), 10.0, LEFT_COL_END - 1.0, y);
        }
        if let Some((label, value)) = deductions.get(i) {
            canvas.text(label, 10.0, RIGHT_COL_X + 1.0, y);
            canvas.amount(&format_inr(*value), 10.0, RIGHT_COL_END - 1.0, y);
        }
        y += LEDGER_ROW_MM;
    }

    let (gross, total_deductions, net) = recompute_totals(slip);

    // subtotals framed by a heavy/light rule pair above and below
    canvas.hline(LEFT_COL_X, LEFT_COL_END, y - 2.0, 0.8);
    canvas.hline(LEFT_COL_X, LEFT_COL_END, y - 1.0, 0.3);
    canvas.hline(RIGHT_COL_X, RIGHT_COL_END, y - 2.0, 0.8);
    canvas.hline(RIGHT_COL_X, RIGHT_COL_END, y - 1.0, 0.3);
    y += 4.0;
    canvas.text_bold("Gross Pay", 12.0, LEFT_COL_X + 1.0, y);
    canvas.amount_bold(&format_inr(gross), 12.0, LEFT_COL_END - 1.0, y);
    canvas.text_bold("Total Deductions", 12.0, RIGHT_COL_X + 1.0, y);
    canvas.amount_bold(&format_inr(total_deductions), 12.0, RIGHT_COL_END - 1.0, y);
    y += 2.0;
    canvas.hline(LEFT_COL_X, LEFT_COL_END, y, 0.3);
    canvas.hline(LEFT_COL_X, LEFT_COL_END, y + 1.0, 0.8);
    canvas.hline(RIGHT_COL_X, RIGHT_COL_END, y, 0.3);
    canvas.hline(RIGHT_COL_X, RIGHT_COL_END, y + 1.0, 0.8);
    y += 8.0;

    // net pay box
    let box_height = 10.0;
    canvas.rect(MARGIN_MM, y, RIGHT_EDGE_MM - MARGIN_MM, box_height, 0.8);
    canvas.text_bold("NET PAY:", 12.0, MARGIN_MM + 3.0, y + 7.0);
    canvas.amount_bold(&format_inr(net), 12.0, RIGHT_EDGE_MM - 3.0, y + 7.0);

    net
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::report::render_single;
    use std::path::Path;

    fn slip() -> PayslipData {
        PayslipData {
            username: "F101".into(),
            month: "January".into(),
            year: 2025,
            amount: 48000.0,
            basic: 40000.0,
            hra: 10000.0,
            da: 2000.0,
            conveyance: 0.0,
            medical: 0.0,
            other_earnings: 0.0,
            pf: 3000.0,
            tax: 1000.0,
            professional_tax: 0.0,
            other_deductions: 0.0,
            name: "A. Ramanathan".into(),
            department: "CSE".into(),
            designation: "Assistant Professor".into(),
        }
    }

    #[test]
    fn recomputed_net_matches_stored_amount() {
        let slip = slip();
        let (gross, deductions, net) = recompute_totals(&slip);
        assert_eq!(gross, 52000.0);
        assert_eq!(deductions, 4000.0);
        assert_eq!(net, slip.amount);
    }

    #[test]
    fn renders_a_wellformed_pdf_without_banner_asset() {
        let bytes = render_single(&slip(), Path::new("does-not-exist.jpg")).expect("render");
        assert!(bytes.starts_with(b"%PDF"));
        assert!(bytes.len() > 500);
    }
}
