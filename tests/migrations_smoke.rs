use sqlx::Row;

fn database_url() -> Option<String> {
    dotenvy::dotenv().ok();

    std::env::var("DATABASE_URL").ok().filter(|url| !url.trim().is_empty())
}

#[tokio::test]
async fn migrations_apply_and_tables_exist() -> anyhow::Result<()> {
    let Some(database_url) = database_url() else {
        eprintln!("DATABASE_URL not set; skipping migration smoke test");
        return Ok(());
    };

    let pool =
        sqlx::postgres::PgPoolOptions::new().max_connections(1).connect(&database_url).await?;

    let migrator = sqlx::migrate::Migrator::new(std::path::Path::new("migrations")).await?;
    migrator.run(&pool).await?;

    for table in ["users", "tasks", "task_submissions"] {
        let row = sqlx::query("SELECT to_regclass($1)::text").bind(table).fetch_one(&pool).await?;
        let regclass: Option<String> = row.try_get(0)?;
        assert!(regclass.is_some(), "expected table {table} to exist after migrations");
    }

    let row = sqlx::query("SELECT count(*) FROM pg_type WHERE typname IN ('userrole', 'taskstatus')")
        .fetch_one(&pool)
        .await?;
    let enum_types: i64 = row.try_get(0)?;
    assert_eq!(enum_types, 2);

    Ok(())
}
