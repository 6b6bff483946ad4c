//! Recompute cached per-serving nutrition for recipes
//! Usage: cargo run --bin recalculate_recipes -- [recipe_id]

use pantry::config;
use pantry::db::{migrations, Database, DbError};
use pantry::models::{recalculate_recipe_nutrition, Recipe};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(config::DEFAULT_LOG_DIRECTIVE.parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let recipe_id = match std::env::args().nth(1) {
        Some(arg) => Some(
            arg.parse::<i64>()
                .map_err(|_| format!("recipe_id must be an integer (got '{}')", arg))?,
        ),
        None => None,
    };

    let db_path = config::database_path();
    println!("Database: {}", db_path.display());

    let database = Database::new(&db_path)?;

    database.with_conn(|conn| {
        migrations::run_migrations(conn)?;

        let ids = match recipe_id {
            Some(id) => vec![id],
            None => Recipe::list_ids(conn)?,
        };
        println!("Recalculating {} recipe(s)", ids.len());

        for id in ids {
            let recipe = Recipe::get_by_id(conn, id)?.ok_or(DbError::NotFound("recipe", id))?;
            let updated = recalculate_recipe_nutrition(conn, id)?;
            println!(
                "  [{}] {}: {:.1} -> {:.1} kcal/serving",
                id, recipe.name, recipe.cached_nutrition.calories, updated.calories
            );
        }

        Ok(())
    })?;

    Ok(())
}
