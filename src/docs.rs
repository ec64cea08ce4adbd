use crate::api::faculty::{CreateFaculty, UpdateFaculty};
use crate::api::salary::PeriodSummary;
use crate::imports::{FacultyImportSummary, SalaryImportSummary};
use crate::model::role::Role;
use crate::model::salary::SalaryRecord;
use crate::model::user::FacultyPublic;
use crate::models::{LoginReqDto, LoginResponse, UserSummary};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "College Administrative Portal API",
        version = "1.0.0",
        description = r#"
## College Administrative Portal

This API powers the administrative portal of a college: faculty records,
monthly salary data and the payslip documents generated from them.

### 🔹 Key Features
- **Faculty Management**
  - Create, update, list and view faculty profiles, individually or by CSV upload
- **Salary Management**
  - Bulk-import monthly salary data from CSV, browse and prune upload history
- **Payslip Generation**
  - Single payslips, multi-month collections, annual/monthly reports and ZIP archives, all as PDF

### 🔐 Security
Most endpoints are protected using **JWT Bearer authentication**.
Faculty members can only access their own payslips; administrative
operations require the **admin** role.

### 📦 Response Format
- JSON for records and summaries
- `application/pdf` / `application/zip` attachments for generated documents

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::auth::handlers::login,

        crate::api::faculty::create_faculty,
        crate::api::faculty::list_faculty,
        crate::api::faculty::get_me,
        crate::api::faculty::get_faculty,
        crate::api::faculty::update_faculty,
        crate::api::faculty::delete_faculty,
        crate::api::faculty::upload_faculty_csv,

        crate::api::salary::upload_monthly,
        crate::api::salary::upload_faculty,
        crate::api::salary::my_history,
        crate::api::salary::history,
        crate::api::salary::report,
        crate::api::salary::download_year,
        crate::api::salary::download_month,
        crate::api::salary::payslip,
        crate::api::salary::payslips_all,
        crate::api::salary::payslips_monthly_all,
        crate::api::salary::delete_period
    ),
    components(
        schemas(
            LoginReqDto,
            LoginResponse,
            UserSummary,
            Role,
            FacultyPublic,
            CreateFaculty,
            UpdateFaculty,
            FacultyImportSummary,
            SalaryImportSummary,
            SalaryRecord,
            PeriodSummary
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Authentication APIs"),
        (name = "Faculty", description = "Faculty management APIs"),
        (name = "Salary", description = "Salary data and payslip APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
