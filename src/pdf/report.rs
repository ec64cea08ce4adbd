use std::io::{Cursor, Write};
use std::path::Path;

use anyhow::anyhow;
use printpdf::{Mm, PdfDocument};
use tracing::{debug, warn};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::{Canvas, Fonts, PAGE_HEIGHT_MM, PAGE_WIDTH_MM};
use crate::model::month::month_order;
use crate::model::salary::PayslipData;
use crate::pdf::payslip::render_payslip;

/// Strictly ascending calendar order: year, then month index. Query-level
/// sorting cannot deliver this because months are stored by name.
pub fn sort_chronological(slips: &mut [PayslipData]) {
    slips.sort_by(|a, b| {
        (a.year, month_order(&a.month)).cmp(&(b.year, month_order(&b.month)))
    });
}

/// Admin cross-faculty reports: group by username alphabetically, calendar
/// order within each faculty.
pub fn sort_by_faculty_then_calendar(slips: &mut [PayslipData]) {
    slips.sort_by(|a, b| {
        (a.username.as_str(), a.year, month_order(&a.month))
            .cmp(&(b.username.as_str(), b.year, month_order(&b.month)))
    });
}

/// One payslip as a standalone single-page document.
pub fn render_single(slip: &PayslipData, banner: &Path) -> anyhow::Result<Vec<u8>> {
    let (doc, page, layer) = PdfDocument::new(
        format!("Payslip {} {} {}", slip.username, slip.month, slip.year),
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "Layer 1",
    );
    let fonts = Fonts::load(&doc)?;
    let canvas = Canvas::new(doc.get_page(page).get_layer(layer), &fonts);
    render_payslip(&canvas, slip, banner);

    doc.save_to_bytes()
        .map_err(|e| anyhow!("failed to serialize payslip: {e}"))
}

/// All payslips concatenated into one document, one page per record, in the
/// order given. Callers sort first.
pub fn render_collection(
    slips: &[PayslipData],
    banner: &Path,
    title: &str,
) -> anyhow::Result<Vec<u8>> {
    let (doc, first_page, first_layer) = PdfDocument::new(
        title,
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "Layer 1",
    );
    let fonts = Fonts::load(&doc)?;

    for (i, slip) in slips.iter().enumerate() {
        let layer = if i == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page, layer) = doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
            doc.get_page(page).get_layer(layer)
        };
        let canvas = Canvas::new(layer, &fonts);
        render_payslip(&canvas, slip, banner);
    }
    debug!(pages = slips.len(), "Collection report rendered");

    doc.save_to_bytes()
        .map_err(|e| anyhow!("failed to serialize report: {e}"))
}

/// Entry naming for payslip archives.
#[derive(Debug, Copy, Clone)]
pub enum ArchiveNaming {
    /// `2025-01_Payslip_January.pdf` — all months of one faculty.
    PeriodFirst,
    /// `F101_Payslip_January_2025.pdf` — all faculty of one month.
    FacultyFirst,
}

impl ArchiveNaming {
    pub fn entry_name(self, slip: &PayslipData) -> String {
        match self {
            ArchiveNaming::PeriodFirst => {
                let month_number = month_order(&slip.month) + 1;
                format!(
                    "{}-{:02}_Payslip_{}.pdf",
                    slip.year, month_number, slip.month
                )
            }
            ArchiveNaming::FacultyFirst => {
                format!(
                    "{}_Payslip_{}_{}.pdf",
                    slip.username, slip.month, slip.year
                )
            }
        }
    }
}

pub struct ArchiveOutcome {
    pub bytes: Vec<u8>,
    pub rendered: Vec<String>,
    pub skipped: Vec<String>,
}

/// Renders each payslip into its own document and packs them into one ZIP.
/// Entries are independent: a record that fails to render is skipped and
/// listed in a manifest entry instead of aborting the archive.
pub fn render_archive(
    slips: &[PayslipData],
    naming: ArchiveNaming,
    banner: &Path,
) -> anyhow::Result<ArchiveOutcome> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut rendered = Vec::new();
    let mut skipped = Vec::new();

    for slip in slips {
        let name = naming.entry_name(slip);
        match render_single(slip, banner) {
            Ok(bytes) => {
                writer.start_file(&name, options)?;
                writer.write_all(&bytes)?;
                rendered.push(name);
            }
            Err(e) => {
                warn!(entry = %name, error = %e, "Payslip skipped from archive");
                skipped.push(format!("{name}: {e}"));
            }
        }
    }

    if !skipped.is_empty() {
        let mut manifest = String::from("rendered:\n");
        for name in &rendered {
            manifest.push_str(&format!("  {name}\n"));
        }
        manifest.push_str("skipped:\n");
        for entry in &skipped {
            manifest.push_str(&format!("  {entry}\n"));
        }
        writer.start_file("manifest.txt", options)?;
        writer.write_all(manifest.as_bytes())?;
    }

    let bytes = writer.finish()?.into_inner();
    Ok(ArchiveOutcome {
        bytes,
        rendered,
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slip(username: &str, month: &str, year: i32) -> PayslipData {
        PayslipData {
            username: username.into(),
            month: month.into(),
            year,
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
    fn chronological_sort_ignores_input_order() {
        let mut slips = vec![
            slip("F101", "March", 2024),
            slip("F101", "January", 2024),
            slip("F101", "February", 2024),
            slip("F101", "December", 2023),
        ];
        sort_chronological(&mut slips);
        let order: Vec<(i32, &str)> = slips.iter().map(|s| (s.year, s.month.as_str())).collect();
        assert_eq!(
            order,
            vec![
                (2023, "December"),
                (2024, "January"),
                (2024, "February"),
                (2024, "March"),
            ]
        );
    }

    #[test]
    fn admin_sort_groups_by_faculty_then_calendar() {
        let mut slips = vec![
            slip("F202", "January", 2025),
            slip("F101", "March", 2025),
            slip("F101", "January", 2025),
        ];
        sort_by_faculty_then_calendar(&mut slips);
        let order: Vec<(&str, &str)> = slips
            .iter()
            .map(|s| (s.username.as_str(), s.month.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![("F101", "January"), ("F101", "March"), ("F202", "January")]
        );
    }

    #[test]
    fn entry_names_follow_the_conventions() {
        let record = slip("F101", "January", 2025);
        assert_eq!(
            ArchiveNaming::PeriodFirst.entry_name(&record),
            "2025-01_Payslip_January.pdf"
        );
        assert_eq!(
            ArchiveNaming::FacultyFirst.entry_name(&record),
            "F101_Payslip_January_2025.pdf"
        );
    }

    #[test]
    fn collection_renders_one_page_per_record() {
        let slips = vec![slip("F101", "January", 2025), slip("F101", "February", 2025)];
        let bytes =
            render_collection(&slips, Path::new("does-not-exist.jpg"), "Report").expect("render");
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn archive_contains_all_entries() {
        let slips = vec![slip("F101", "January", 2025), slip("F102", "January", 2025)];
        let outcome = render_archive(
            &slips,
            ArchiveNaming::FacultyFirst,
            Path::new("does-not-exist.jpg"),
        )
        .expect("archive");
        assert!(outcome.bytes.starts_with(b"PK\x03\x04"));
        assert_eq!(outcome.rendered.len(), 2);
        assert!(outcome.skipped.is_empty());

        let mut archive =
            zip::ZipArchive::new(Cursor::new(outcome.bytes)).expect("readable archive");
        assert_eq!(archive.len(), 2);
        assert!(archive.by_name("F101_Payslip_January_2025.pdf").is_ok());
    }
}
