use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use sqlx::MySqlPool;
use tracing::{debug, warn};
use utoipa::ToSchema;

use crate::auth::password::hash_password;
use crate::model::month::Month;

/// How many row errors are echoed back to the caller. Every row error is
/// still written to the log in full.
pub const ERROR_PREVIEW_LIMIT: usize = 3;

// -------------------- CSV row shapes --------------------

/// Faculty import row. All fields optional at parse time; presence rules are
/// applied per row so one bad row never aborts the batch.
#[derive(Debug, Default, Deserialize)]
pub struct FacultyCsvRow {
    pub name: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub department: Option<String>,
    pub designation: Option<String>,
    #[serde(rename = "baseSalary")]
    pub base_salary: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SalaryCsvRow {
    pub username: Option<String>,
    pub basic: Option<String>,
    pub hra: Option<String>,
    pub da: Option<String>,
    pub conveyance: Option<String>,
    pub medical: Option<String>,
    pub other_earnings: Option<String>,
    pub pf: Option<String>,
    pub tax: Option<String>,
    #[serde(rename = "professionalTax")]
    pub professional_tax: Option<String>,
    pub other_deductions: Option<String>,
}

// -------------------- Record parser --------------------

/// Reads every data row of a delimited file, keeping per-row parse failures
/// as failures of that row only. Row numbers in messages are 1-based file
/// lines (header is line 1).
pub fn read_rows<T: DeserializeOwned>(path: &Path) -> anyhow::Result<Vec<Result<T, String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .context("failed to open uploaded CSV")?;

    let mut rows = Vec::new();
    for (i, result) in reader.deserialize::<T>().enumerate() {
        rows.push(result.map_err(|e| format!("Row {}: {}", i + 2, e)));
    }
    Ok(rows)
}

// -------------------- Faculty upserter --------------------

#[derive(Debug, PartialEq)]
pub struct FacultyFields {
    pub username: String,
    pub name: String,
    pub password: Option<String>,
    pub department: String,
    pub designation: String,
    pub base_salary: f64,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Field rules for one faculty row. `require_password` distinguishes the
/// faculty-domain upload (credential mandatory) from the salary-domain one.
pub fn validate_faculty_row(
    row: &FacultyCsvRow,
    require_password: bool,
) -> Result<FacultyFields, String> {
    let username = present(&row.username);
    let name = present(&row.name);
    let password = present(&row.password);

    let (username, name) = match (username, name) {
        (Some(u), Some(n)) => (u, n),
        _ => return Err("Row missing name or username.".to_string()),
    };
    if require_password && password.is_none() {
        return Err("Row missing password.".to_string());
    }

    Ok(FacultyFields {
        username: username.to_string(),
        name: name.to_string(),
        password: password.map(str::to_string),
        department: present(&row.department).unwrap_or("N/A").to_string(),
        designation: present(&row.designation).unwrap_or("N/A").to_string(),
        base_salary: parse_amount(&row.base_salary),
    })
}

#[derive(Debug, PartialEq)]
pub enum UpsertOutcome {
    Added,
    Updated,
}

/// Create-or-update one faculty keyed by username, always forcing the
/// faculty role. A row without a password keeps the stored credential on
/// update and gets an unusable empty credential on insert.
pub async fn upsert_faculty(
    pool: &MySqlPool,
    fields: &FacultyFields,
) -> Result<UpsertOutcome, String> {
    let result = match &fields.password {
        Some(password) => {
            let hashed = hash_password(password);
            sqlx::query(
                r#"
                INSERT INTO users (username, password, name, role, department, designation, base_salary)
                VALUES (?, ?, ?, 'faculty', ?, ?, ?)
                ON DUPLICATE KEY UPDATE
                    password = VALUES(password),
                    name = VALUES(name),
                    role = 'faculty',
                    department = VALUES(department),
                    designation = VALUES(designation),
                    base_salary = VALUES(base_salary)
                "#,
            )
            .bind(&fields.username)
            .bind(hashed)
            .bind(&fields.name)
            .bind(&fields.department)
            .bind(&fields.designation)
            .bind(fields.base_salary)
            .execute(pool)
            .await
        }
        None => {
            sqlx::query(
                r#"
                INSERT INTO users (username, password, name, role, department, designation, base_salary)
                VALUES (?, '', ?, 'faculty', ?, ?, ?)
                ON DUPLICATE KEY UPDATE
                    name = VALUES(name),
                    role = 'faculty',
                    department = VALUES(department),
                    designation = VALUES(designation),
                    base_salary = VALUES(base_salary)
                "#,
            )
            .bind(&fields.username)
            .bind(&fields.name)
            .bind(&fields.department)
            .bind(&fields.designation)
            .bind(fields.base_salary)
            .execute(pool)
            .await
        }
    };

    match result {
        // MySQL reports 1 affected row for a fresh insert, 2 for an
        // ON DUPLICATE KEY update (0 when nothing changed).
        Ok(done) if done.rows_affected() == 1 => Ok(UpsertOutcome::Added),
        Ok(_) => Ok(UpsertOutcome::Updated),
        Err(e) => {
            warn!(error = %e, username = %fields.username, "Faculty upsert failed");
            Err(format!("Error on row {}: database error", fields.username))
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FacultyImportSummary {
    pub added: u32,
    pub updated: u32,
    pub failed: u32,
    pub errors: Vec<String>,
}

pub async fn import_faculty_csv(
    pool: &MySqlPool,
    path: &Path,
    require_password: bool,
) -> anyhow::Result<FacultyImportSummary> {
    let mut added = 0;
    let mut updated = 0;
    let mut errors = Vec::new();

    for row in read_rows::<FacultyCsvRow>(path)? {
        let outcome = match row {
            Ok(row) => match validate_faculty_row(&row, require_password) {
                Ok(fields) => upsert_faculty(pool, &fields).await,
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        };
        match outcome {
            Ok(UpsertOutcome::Added) => added += 1,
            Ok(UpsertOutcome::Updated) => updated += 1,
            Err(e) => errors.push(e),
        }
    }

    for error in &errors {
        warn!(%error, "Faculty CSV row failed");
    }
    debug!(added, updated, failed = errors.len(), "Faculty CSV processed");

    Ok(FacultyImportSummary {
        added,
        updated,
        failed: errors.len() as u32,
        errors: preview_errors(errors),
    })
}

// -------------------- Salary computer --------------------

#[derive(Debug, PartialEq)]
pub struct SalaryComponents {
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
    pub net: f64,
}

impl SalaryComponents {
    pub fn total_earnings(&self) -> f64 {
        self.basic + self.hra + self.da + self.conveyance + self.medical + self.other_earnings
    }

    pub fn total_deductions(&self) -> f64 {
        self.pf + self.tax + self.professional_tax + self.other_deductions
    }
}

fn parse_amount(value: &Option<String>) -> f64 {
    value
        .as_deref()
        .and_then(|v| v.trim().parse::<f64>().ok())
        .unwrap_or(0.0)
}

/// Validates one salary row and computes its totals. Presence, not value,
/// is what the required-field check looks at: an explicit "0" is valid.
pub fn compute_salary_components(row: &SalaryCsvRow) -> Result<(String, SalaryComponents), String> {
    let username = match present(&row.username) {
        Some(u) => u.to_string(),
        None => return Err("Row missing username, basic, PF, or tax amount.".to_string()),
    };
    if present(&row.basic).is_none() || present(&row.pf).is_none() || present(&row.tax).is_none() {
        return Err("Row missing username, basic, PF, or tax amount.".to_string());
    }

    let mut components = SalaryComponents {
        basic: parse_amount(&row.basic),
        hra: parse_amount(&row.hra),
        da: parse_amount(&row.da),
        conveyance: parse_amount(&row.conveyance),
        medical: parse_amount(&row.medical),
        other_earnings: parse_amount(&row.other_earnings),
        pf: parse_amount(&row.pf),
        tax: parse_amount(&row.tax),
        professional_tax: parse_amount(&row.professional_tax),
        other_deductions: parse_amount(&row.other_deductions),
        net: 0.0,
    };
    components.net = components.total_earnings() - components.total_deductions();

    if components.net < 0.0 {
        return Err(format!(
            "Calculated net amount is negative ({:.2}). Check component values.",
            components.net
        ));
    }

    Ok((username, components))
}

/// Persists one computed salary row. The (faculty, year, month) uniqueness
/// lives in a storage-level UNIQUE KEY, so concurrent imports cannot slip a
/// duplicate past a read-then-write check.
pub async fn insert_salary_record(
    pool: &MySqlPool,
    username: &str,
    components: &SalaryComponents,
    month: Month,
    year: i32,
) -> Result<(), String> {
    let faculty_id = sqlx::query_scalar::<_, u64>(
        "SELECT id FROM users WHERE username = ? AND role = 'faculty'",
    )
    .bind(username)
    .fetch_optional(pool)
    .await
    .map_err(|e| {
        warn!(error = %e, username, "Faculty lookup failed");
        format!("Error on row {username}: database error")
    })?;

    let faculty_id = match faculty_id {
        Some(id) => id,
        None => return Err(format!("Faculty '{username}' not found.")),
    };

    let result = sqlx::query(
        r#"
        INSERT INTO salary_records
        (faculty_id, username, month, year, amount,
         basic, hra, da, conveyance, medical, other_earnings,
         pf, tax, professional_tax, other_deductions)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(faculty_id)
    .bind(username)
    .bind(month.to_string())
    .bind(year)
    .bind(components.net)
    .bind(components.basic)
    .bind(components.hra)
    .bind(components.da)
    .bind(components.conveyance)
    .bind(components.medical)
    .bind(components.other_earnings)
    .bind(components.pf)
    .bind(components.tax)
    .bind(components.professional_tax)
    .bind(components.other_deductions)
    .execute(pool)
    .await;

    match result {
        Ok(_) => Ok(()),
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some("23000") {
                    return Err(format!(
                        "Salary for {username} for {month} {year} already exists."
                    ));
                }
            }
            warn!(error = %e, username, "Salary insert failed");
            Err(format!("Error on row {username}: database error"))
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SalaryImportSummary {
    pub created: u32,
    pub failed: u32,
    pub errors: Vec<String>,
}

pub async fn import_salary_csv(
    pool: &MySqlPool,
    path: &Path,
    month: Month,
    year: i32,
) -> anyhow::Result<SalaryImportSummary> {
    let mut created = 0;
    let mut errors = Vec::new();

    for row in read_rows::<SalaryCsvRow>(path)? {
        let outcome = match row {
            Ok(row) => match compute_salary_components(&row) {
                Ok((username, components)) => {
                    insert_salary_record(pool, &username, &components, month, year).await
                }
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        };
        match outcome {
            Ok(()) => created += 1,
            Err(e) => errors.push(e),
        }
    }

    for error in &errors {
        warn!(%error, "Salary CSV row failed");
    }
    debug!(created, failed = errors.len(), %month, year, "Salary CSV processed");

    Ok(SalaryImportSummary {
        created,
        failed: errors.len() as u32,
        errors: preview_errors(errors),
    })
}

/// Caps the echoed error list to the first few rows; the rest stay in the
/// server log only.
fn preview_errors(mut errors: Vec<String>) -> Vec<String> {
    let total = errors.len();
    if total > ERROR_PREVIEW_LIMIT {
        errors.truncate(ERROR_PREVIEW_LIMIT);
        errors.push(format!(
            "({} more rows failed; see server log)",
            total - ERROR_PREVIEW_LIMIT
        ));
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn s(v: &str) -> Option<String> {
        Some(v.to_string())
    }

    #[test]
    fn faculty_row_requires_name_and_username() {
        let row = FacultyCsvRow {
            username: s("F101"),
            ..Default::default()
        };
        let err = validate_faculty_row(&row, false).unwrap_err();
        assert!(err.contains("missing name or username"));
    }

    #[test]
    fn faculty_row_defaults_and_numeric_fallback() {
        let row = FacultyCsvRow {
            username: s("F101"),
            name: s("A. Ramanathan"),
            base_salary: s("not-a-number"),
            ..Default::default()
        };
        let fields = validate_faculty_row(&row, false).unwrap();
        assert_eq!(fields.base_salary, 0.0);
        assert_eq!(fields.department, "N/A");
        assert_eq!(fields.designation, "N/A");
        assert!(fields.password.is_none());
    }

    #[test]
    fn faculty_domain_upload_also_requires_password() {
        let row = FacultyCsvRow {
            username: s("F101"),
            name: s("A. Ramanathan"),
            ..Default::default()
        };
        let err = validate_faculty_row(&row, true).unwrap_err();
        assert_eq!(err, "Row missing password.");
        let row = FacultyCsvRow {
            password: s("pw"),
            ..row
        };
        assert!(validate_faculty_row(&row, true).is_ok());
    }

    #[test]
    fn salary_row_checks_presence_not_value() {
        // zero is a valid value, absence is not
        let row = SalaryCsvRow {
            username: s("F101"),
            basic: s("0"),
            pf: s("0"),
            tax: s("0"),
            ..Default::default()
        };
        assert!(compute_salary_components(&row).is_ok());

        let row = SalaryCsvRow {
            username: s("F101"),
            basic: s("40000"),
            pf: s("3000"),
            ..Default::default()
        };
        let err = compute_salary_components(&row).unwrap_err();
        assert!(err.contains("missing username, basic, PF, or tax amount"));
    }

    #[test]
    fn salary_row_net_matches_worked_example() {
        let row = SalaryCsvRow {
            username: s("F101"),
            basic: s("40000"),
            hra: s("10000"),
            da: s("2000"),
            pf: s("3000"),
            tax: s("1000"),
            ..Default::default()
        };
        let (username, components) = compute_salary_components(&row).unwrap();
        assert_eq!(username, "F101");
        assert_eq!(components.total_earnings(), 52000.0);
        assert_eq!(components.total_deductions(), 4000.0);
        assert_eq!(components.net, 48000.0);
    }

    #[test]
    fn negative_net_is_rejected() {
        let row = SalaryCsvRow {
            username: s("F101"),
            basic: s("1000"),
            pf: s("3000"),
            tax: s("1000"),
            ..Default::default()
        };
        let err = compute_salary_components(&row).unwrap_err();
        assert!(err.contains("negative"));
    }

    #[test]
    fn malformed_row_fails_alone() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "username,basic,pf,tax").unwrap();
        writeln!(file, "F101,40000,3000,1000").unwrap();
        writeln!(file, "F102,1,2").unwrap(); // wrong column count
        writeln!(file, "F103,50000,4000,2000").unwrap();
        file.flush().unwrap();

        let rows = read_rows::<SalaryCsvRow>(file.path()).unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows[0].is_ok());
        assert!(rows[1].is_err());
        assert!(rows[2].is_ok());
        assert!(rows[1].as_ref().unwrap_err().starts_with("Row 3:"));
    }

    #[test]
    fn error_preview_is_capped() {
        let errors: Vec<String> = (0..5).map(|i| format!("row {i}")).collect();
        let preview = preview_errors(errors);
        assert_eq!(preview.len(), ERROR_PREVIEW_LIMIT + 1);
        assert!(preview[ERROR_PREVIEW_LIMIT].contains("2 more rows"));
    }
}
