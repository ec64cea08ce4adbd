use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Persisted salary record. `amount` is the net pay computed at import time;
/// the payslip renderer recomputes it from the components as a cross-check.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct SalaryRecord {
    pub id: u64,
    pub faculty_id: u64,
    pub username: String,
    #[schema(example = "January")]
    pub month: String,
    #[schema(example = 2025)]
    pub year: i32,
    #[schema(example = 48000.0)]
    pub amount: f64,

    pub basic: f64,
    pub hra: f64,
    pub da: f64,
    pub conveyance: f64,
    pub medical: f64,
    pub other_earnings: f64,

    pub pf: f64,
    pub tax: f64,
    #[serde(rename = "professionalTax")]
    pub professional_tax: f64,
    pub other_deductions: f64,
}

/// Salary record joined with the owning faculty's profile fields, the shape
/// the payslip renderer works from.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PayslipData {
    pub username: String,
    pub month: String,
    pub year: i32,
    pub amount: f64,

    pub basic: f64,
    pub hra: f64,
    pub da: f64,
    pub conveyance: f64,
    pub medical: f64,
    pub other_earnings: f64,

    pub pf: f64,
    pub tax: f64,
    pub professional_tax: f64,
    pub other_deductions: f64,

    pub name: String,
    pub department: String,
    pub designation: String,
}

pub const SALARY_RECORD_COLUMNS: &str = "id, faculty_id, username, month, year, amount, \
     basic, hra, da, conveyance, medical, other_earnings, \
     pf, tax, professional_tax, other_deductions";

pub const PAYSLIP_COLUMNS: &str = "s.username, s.month, s.year, s.amount, \
     s.basic, s.hra, s.da, s.conveyance, s.medical, s.other_earnings, \
     s.pf, s.tax, s.professional_tax, s.other_deductions, \
     u.name, u.department, u.designation";
