use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Full user row, only loaded where the password hash is actually needed
/// (login verification).
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub password: String,
    pub name: String,
    pub role: String,
    pub department: String,
    pub designation: String,
    pub base_salary: f64,
}

/// Faculty record as exposed over the API. The password hash is never part
/// of this projection.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "username": "F101",
        "name": "A. Ramanathan",
        "department": "CSE",
        "designation": "Assistant Professor",
        "baseSalary": 52000.0
    })
)]
pub struct FacultyPublic {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "F101")]
    pub username: String,

    #[schema(example = "A. Ramanathan")]
    pub name: String,

    #[schema(example = "CSE")]
    pub department: String,

    #[schema(example = "Assistant Professor")]
    pub designation: String,

    #[serde(rename = "baseSalary")]
    #[schema(example = 52000.0)]
    pub base_salary: f64,
}

pub const FACULTY_PUBLIC_COLUMNS: &str =
    "id, username, name, department, designation, base_salary";
