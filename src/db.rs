use sqlx::MySqlPool;

pub async fn init_db(database_url: &str) -> MySqlPool {
    let pool = MySqlPool::connect(database_url)
        .await
        .expect("Failed to connect to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    pool
}

#[cfg(test)]
mod tests {
    const INIT_SQL: &str = include_str!("../migrations/0001_init.sql");

    #[test]
    fn salary_schema_enforces_one_record_per_period() {
        assert!(INIT_SQL.contains("UNIQUE KEY uq_salary_period (faculty_id, year, month)"));
    }

    #[test]
    fn salary_records_carry_no_restricting_foreign_key() {
        // a FK to users would block the orphan-and-report delete policy
        assert!(!INIT_SQL.to_uppercase().contains("FOREIGN KEY"));
    }
}
