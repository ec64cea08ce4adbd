use actix_multipart::Multipart;
use actix_web::{HttpResponse, Responder, web};
use chrono::Local;
use serde::Serialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{error, info};
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::imports;
use crate::model::month::{Month, last_n_periods, month_order};
use crate::model::salary::{PAYSLIP_COLUMNS, PayslipData, SALARY_RECORD_COLUMNS, SalaryRecord};
use crate::pdf::report::{
    ArchiveNaming, render_archive, render_collection, render_single, sort_by_faculty_then_calendar,
    sort_chronological,
};
use crate::utils::upload::collect_multipart;

const REPORT_PERIODS: [u32; 7] = [3, 6, 9, 12, 24, 36, 60];

fn pdf_response(bytes: Vec<u8>, filename: &str) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("application/pdf")
        .insert_header((
            "Content-Disposition",
            format!("attachment; filename=\"{filename}\""),
        ))
        .body(bytes)
}

fn zip_response(bytes: Vec<u8>, filename: &str) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("application/zip")
        .insert_header((
            "Content-Disposition",
            format!("attachment; filename=\"{filename}\""),
        ))
        .body(bytes)
}

fn render_error(e: anyhow::Error) -> actix_web::Error {
    error!(error = %e, "Report rendering failed");
    actix_web::error::ErrorInternalServerError("Server error generating report.")
}

fn db_error(e: sqlx::Error, what: &str) -> actix_web::Error {
    error!(error = %e, what, "Database query failed");
    actix_web::error::ErrorInternalServerError("Server error")
}

/// Bulk-create salary records for one period from CSV. Month and year come
/// as form fields, the CSV carries only the per-faculty components.
#[utoipa::path(
    post,
    path = "/api/salary/upload-monthly",
    responses(
        (status = 201, description = "CSV processed", body = imports::SalaryImportSummary),
        (status = 400, description = "Missing month/year or unreadable CSV")
    ),
    security(("bearer_auth" = [])),
    tag = "Salary"
)]
pub async fn upload_monthly(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: Multipart,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let form = collect_multipart(payload).await?;

    let (month, year) = match (form.field("month"), form.field("year")) {
        (Some(m), Some(y)) => (m, y),
        _ => {
            return Ok(HttpResponse::BadRequest().json(json!({
                "message": "Month and Year are required."
            })));
        }
    };
    let month: Month = match month.parse() {
        Ok(m) => m,
        Err(_) => {
            return Ok(HttpResponse::BadRequest().json(json!({
                "message": "Invalid month."
            })));
        }
    };
    let year: i32 = match year.parse() {
        Ok(y) => y,
        Err(_) => {
            return Ok(HttpResponse::BadRequest().json(json!({
                "message": "Invalid year."
            })));
        }
    };

    let summary = imports::import_salary_csv(pool.get_ref(), form.file.path(), month, year)
        .await
        .map_err(|e| {
            error!(error = %e, "Salary CSV import failed");
            actix_web::error::ErrorBadRequest("Could not process uploaded CSV")
        })?;

    info!(%month, year, created = summary.created, failed = summary.failed, "Monthly salary CSV processed");

    Ok(HttpResponse::Created().json(json!({
        "message": "Monthly Salary CSV processing complete",
        "created": summary.created,
        "failed": summary.failed,
        "errors": summary.errors,
    })))
}

/// Faculty bulk upsert through the salary route. Unlike the faculty-domain
/// upload, the password column is optional here.
#[utoipa::path(
    post,
    path = "/api/salary/upload-faculty",
    responses(
        (status = 201, description = "CSV processed", body = imports::FacultyImportSummary),
        (status = 400, description = "No file or unreadable CSV")
    ),
    security(("bearer_auth" = [])),
    tag = "Salary"
)]
pub async fn upload_faculty(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: Multipart,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let form = collect_multipart(payload).await?;

    let summary = imports::import_faculty_csv(pool.get_ref(), form.file.path(), false)
        .await
        .map_err(|e| {
            error!(error = %e, "Faculty CSV import failed");
            actix_web::error::ErrorBadRequest("Could not process uploaded CSV")
        })?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Faculty Data CSV processing complete",
        "successful": summary.added + summary.updated,
        "failed": summary.failed,
        "errors": summary.errors,
    })))
}

/// The caller's own salary history, newest period first
#[utoipa::path(
    get,
    path = "/api/salary/my-history",
    responses(
        (status = 200, description = "Salary history", body = [SalaryRecord])
    ),
    security(("bearer_auth" = [])),
    tag = "Salary"
)]
pub async fn my_history(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let sql = format!("SELECT {SALARY_RECORD_COLUMNS} FROM salary_records WHERE faculty_id = ?");
    let mut records = sqlx::query_as::<_, SalaryRecord>(&sql)
        .bind(auth.user_id)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| db_error(e, "my-history"))?;

    // newest first needs the month-index table, the stored names don't sort
    records.sort_by(|a, b| {
        (b.year, month_order(&b.month)).cmp(&(a.year, month_order(&a.month)))
    });

    Ok(HttpResponse::Ok().json(records))
}

#[derive(sqlx::FromRow)]
struct PeriodCount {
    year: i32,
    month: String,
    count: i64,
}

#[derive(Serialize, ToSchema)]
pub struct PeriodSummary {
    pub year: i32,
    pub month: String,
    #[serde(rename = "monthOrder")]
    pub month_order: i32,
    pub count: i64,
}

/// Admin overview: record counts grouped by (year, month)
#[utoipa::path(
    get,
    path = "/api/salary/history",
    responses(
        (status = 200, description = "Upload history", body = [PeriodSummary])
    ),
    security(("bearer_auth" = [])),
    tag = "Salary"
)]
pub async fn history(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let groups = sqlx::query_as::<_, PeriodCount>(
        "SELECT year, month, COUNT(*) AS count FROM salary_records GROUP BY year, month",
    )
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| db_error(e, "history"))?;

    let mut summaries: Vec<PeriodSummary> = groups
        .into_iter()
        .map(|g| PeriodSummary {
            year: g.year,
            month_order: month_order(&g.month),
            month: g.month,
            count: g.count,
        })
        .collect();
    summaries.sort_by(|a, b| (b.year, b.month_order).cmp(&(a.year, a.month_order)));

    Ok(HttpResponse::Ok().json(summaries))
}

/// Multi-page payslip collection for a trailing window of months. Faculty
/// get their own records in strictly ascending calendar order; admins get
/// everyone's, grouped per faculty.
#[utoipa::path(
    get,
    path = "/api/salary/report/{months}",
    params(("months", description = "Window size: 3, 6, 9, 12, 24, 36 or 60")),
    responses(
        (status = 200, description = "PDF document", content_type = "application/pdf"),
        (status = 400, description = "Invalid report period"),
        (status = 404, description = "No records in the window")
    ),
    security(("bearer_auth" = [])),
    tag = "Salary"
)]
pub async fn report(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u32>,
) -> actix_web::Result<impl Responder> {
    let months = path.into_inner();
    if !REPORT_PERIODS.contains(&months) {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Invalid report period."
        })));
    }

    let periods = last_n_periods(months, Local::now().date_naive());
    let period_clause = periods
        .iter()
        .map(|_| "(s.year = ? AND s.month = ?)")
        .collect::<Vec<_>>()
        .join(" OR ");

    let faculty_only = auth.is_faculty();
    let sql = if faculty_only {
        format!(
            "SELECT {PAYSLIP_COLUMNS} FROM salary_records s \
             JOIN users u ON u.id = s.faculty_id \
             WHERE s.faculty_id = ? AND ({period_clause})"
        )
    } else {
        format!(
            "SELECT {PAYSLIP_COLUMNS} FROM salary_records s \
             JOIN users u ON u.id = s.faculty_id \
             WHERE {period_clause}"
        )
    };

    let mut query = sqlx::query_as::<_, PayslipData>(&sql);
    if faculty_only {
        query = query.bind(auth.user_id);
    }
    for (month, year) in &periods {
        query = query.bind(*year).bind(month.to_string());
    }

    let mut records = query
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| db_error(e, "report window"))?;

    if records.is_empty() {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "No salary records found for this period."
        })));
    }

    if faculty_only {
        sort_chronological(&mut records);
    } else {
        sort_by_faculty_then_calendar(&mut records);
    }

    let bytes = render_collection(
        &records,
        config.banner_path.as_ref(),
        &format!("Payslip Collection - Last {months} Months"),
    )
    .map_err(render_error)?;

    Ok(pdf_response(
        bytes,
        &format!("Detailed_Payslip_Collection_Last_{months}_Months.pdf"),
    ))
}

/// Admin annual report: every faculty's payslips for one year
#[utoipa::path(
    get,
    path = "/api/salary/download/{year}",
    params(("year", description = "Calendar year")),
    responses(
        (status = 200, description = "PDF document", content_type = "application/pdf"),
        (status = 404)
    ),
    security(("bearer_auth" = [])),
    tag = "Salary"
)]
pub async fn download_year(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<i32>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let year = path.into_inner();

    let sql = format!(
        "SELECT {PAYSLIP_COLUMNS} FROM salary_records s \
         JOIN users u ON u.id = s.faculty_id WHERE s.year = ?"
    );
    let mut records = sqlx::query_as::<_, PayslipData>(&sql)
        .bind(year)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| db_error(e, "annual report"))?;

    if records.is_empty() {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "No records found for this year."
        })));
    }

    sort_by_faculty_then_calendar(&mut records);

    let bytes = render_collection(
        &records,
        config.banner_path.as_ref(),
        &format!("Annual Payslip Report {year}"),
    )
    .map_err(render_error)?;

    Ok(pdf_response(
        bytes,
        &format!("Annual_Payslip_Report_{year}.pdf"),
    ))
}

/// Admin monthly report: every faculty's payslip for one period
#[utoipa::path(
    get,
    path = "/api/salary/download/{year}/{month}",
    params(
        ("year", description = "Calendar year"),
        ("month", description = "Month name, e.g. January")
    ),
    responses(
        (status = 200, description = "PDF document", content_type = "application/pdf"),
        (status = 400, description = "Invalid month"),
        (status = 404)
    ),
    security(("bearer_auth" = [])),
    tag = "Salary"
)]
pub async fn download_month(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<(i32, String)>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let (year, month) = path.into_inner();
    let month: Month = match month.parse() {
        Ok(m) => m,
        Err(_) => {
            return Ok(HttpResponse::BadRequest().json(json!({
                "message": "Invalid month."
            })));
        }
    };

    let sql = format!(
        "SELECT {PAYSLIP_COLUMNS} FROM salary_records s \
         JOIN users u ON u.id = s.faculty_id WHERE s.year = ? AND s.month = ?"
    );
    let mut records = sqlx::query_as::<_, PayslipData>(&sql)
        .bind(year)
        .bind(month.to_string())
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| db_error(e, "monthly report"))?;

    if records.is_empty() {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "No records found for this period."
        })));
    }

    sort_by_faculty_then_calendar(&mut records);

    let bytes = render_collection(
        &records,
        config.banner_path.as_ref(),
        &format!("Monthly Payslip Report {month} {year}"),
    )
    .map_err(render_error)?;

    Ok(pdf_response(
        bytes,
        &format!("Monthly_Payslip_Report_{month}_{year}.pdf"),
    ))
}

/// Single payslip download. Non-admins can only fetch their own.
#[utoipa::path(
    get,
    path = "/api/salary/payslip/{username}/{year}/{month}",
    params(
        ("username", description = "Faculty username"),
        ("year", description = "Calendar year"),
        ("month", description = "Month name, e.g. January")
    ),
    responses(
        (status = 200, description = "PDF document", content_type = "application/pdf"),
        (status = 403, description = "Not the caller's own payslip"),
        (status = 404)
    ),
    security(("bearer_auth" = [])),
    tag = "Salary"
)]
pub async fn payslip(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<(String, i32, String)>,
) -> actix_web::Result<impl Responder> {
    let (username, year, month) = path.into_inner();
    let month: Month = match month.parse() {
        Ok(m) => m,
        Err(_) => {
            return Ok(HttpResponse::BadRequest().json(json!({
                "message": "Invalid month."
            })));
        }
    };

    let faculty_id = sqlx::query_scalar::<_, u64>(
        "SELECT id FROM users WHERE username = ? AND role = 'faculty'",
    )
    .bind(&username)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| db_error(e, "payslip faculty lookup"))?;

    if faculty_id.is_none() {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Faculty not found."
        })));
    }
    auth.require_self_or_admin(&username)?;

    let sql = format!(
        "SELECT {PAYSLIP_COLUMNS} FROM salary_records s \
         JOIN users u ON u.id = s.faculty_id \
         WHERE s.username = ? AND s.year = ? AND s.month = ?"
    );
    let record = sqlx::query_as::<_, PayslipData>(&sql)
        .bind(&username)
        .bind(year)
        .bind(month.to_string())
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| db_error(e, "payslip record"))?;

    let record = match record {
        Some(r) => r,
        None => {
            return Ok(HttpResponse::NotFound().json(json!({
                "message": "Payslip record not found for this period."
            })));
        }
    };

    let bytes = render_single(&record, config.banner_path.as_ref()).map_err(render_error)?;

    Ok(pdf_response(
        bytes,
        &format!("Payslip_{username}_{month}_{year}.pdf"),
    ))
}

/// ZIP of every payslip one faculty has, one PDF per period
#[utoipa::path(
    get,
    path = "/api/salary/payslips-all/{username}",
    params(("username", description = "Faculty username")),
    responses(
        (status = 200, description = "ZIP archive", content_type = "application/zip"),
        (status = 403),
        (status = 404)
    ),
    security(("bearer_auth" = [])),
    tag = "Salary"
)]
pub async fn payslips_all(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    let username = path.into_inner();

    let faculty_id = sqlx::query_scalar::<_, u64>(
        "SELECT id FROM users WHERE username = ? AND role = 'faculty'",
    )
    .bind(&username)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| db_error(e, "archive faculty lookup"))?;

    let faculty_id = match faculty_id {
        Some(id) => id,
        None => {
            return Ok(HttpResponse::NotFound().json(json!({
                "message": "Faculty not found."
            })));
        }
    };
    auth.require_self_or_admin(&username)?;

    let sql = format!(
        "SELECT {PAYSLIP_COLUMNS} FROM salary_records s \
         JOIN users u ON u.id = s.faculty_id WHERE s.faculty_id = ?"
    );
    let mut records = sqlx::query_as::<_, PayslipData>(&sql)
        .bind(faculty_id)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| db_error(e, "faculty archive"))?;

    if records.is_empty() {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "No salary records found for this faculty."
        })));
    }

    sort_chronological(&mut records);

    let outcome = render_archive(
        &records,
        ArchiveNaming::PeriodFirst,
        config.banner_path.as_ref(),
    )
    .map_err(render_error)?;

    info!(
        username = %username,
        rendered = outcome.rendered.len(),
        skipped = outcome.skipped.len(),
        "Faculty payslip archive built"
    );

    Ok(zip_response(
        outcome.bytes,
        &format!("Payslips_{username}_All.zip"),
    ))
}

/// Admin ZIP of every faculty's payslip for one period
#[utoipa::path(
    get,
    path = "/api/salary/payslips-monthly-all/{year}/{month}",
    params(
        ("year", description = "Calendar year"),
        ("month", description = "Month name, e.g. January")
    ),
    responses(
        (status = 200, description = "ZIP archive", content_type = "application/zip"),
        (status = 400, description = "Invalid month"),
        (status = 404)
    ),
    security(("bearer_auth" = [])),
    tag = "Salary"
)]
pub async fn payslips_monthly_all(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<(i32, String)>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let (year, month) = path.into_inner();
    let month: Month = match month.parse() {
        Ok(m) => m,
        Err(_) => {
            return Ok(HttpResponse::BadRequest().json(json!({
                "message": "Invalid month."
            })));
        }
    };

    let sql = format!(
        "SELECT {PAYSLIP_COLUMNS} FROM salary_records s \
         JOIN users u ON u.id = s.faculty_id WHERE s.year = ? AND s.month = ?"
    );
    let mut records = sqlx::query_as::<_, PayslipData>(&sql)
        .bind(year)
        .bind(month.to_string())
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| db_error(e, "monthly archive"))?;

    if records.is_empty() {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "No detailed salary records found for this month."
        })));
    }

    sort_by_faculty_then_calendar(&mut records);

    let outcome = render_archive(
        &records,
        ArchiveNaming::FacultyFirst,
        config.banner_path.as_ref(),
    )
    .map_err(render_error)?;

    info!(
        %month,
        year,
        rendered = outcome.rendered.len(),
        skipped = outcome.skipped.len(),
        "Monthly payslip archive built"
    );

    Ok(zip_response(
        outcome.bytes,
        &format!("Payslips_All_{month}_{year}.zip"),
    ))
}

/// Admin bulk delete of one period's records
#[utoipa::path(
    delete,
    path = "/api/salary/history/{year}/{month}",
    params(
        ("year", description = "Calendar year"),
        ("month", description = "Month name, e.g. January")
    ),
    responses(
        (status = 200, description = "Records deleted"),
        (status = 404, description = "Nothing to delete for this period")
    ),
    security(("bearer_auth" = [])),
    tag = "Salary"
)]
pub async fn delete_period(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<(i32, String)>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let (year, month) = path.into_inner();
    let month: Month = match month.parse() {
        Ok(m) => m,
        Err(_) => {
            return Ok(HttpResponse::BadRequest().json(json!({
                "message": "Invalid month."
            })));
        }
    };

    let result = sqlx::query("DELETE FROM salary_records WHERE year = ? AND month = ?")
        .bind(year)
        .bind(month.to_string())
        .execute(pool.get_ref())
        .await
        .map_err(|e| db_error(e, "period delete"))?;

    let deleted = result.rows_affected();
    if deleted == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "No records found to delete for this period."
        })));
    }

    info!(%month, year, deleted, "Period records deleted");

    Ok(HttpResponse::Ok().json(json!({
        "message": format!("Successfully deleted {deleted} records for {month} {year}."),
        "deleted": deleted,
    })))
}
