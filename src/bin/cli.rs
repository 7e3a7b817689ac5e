use std::fs;
use std::path::PathBuf;

use chrono::Utc;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use realmgen::biome::adjacency::AdjacencyRuleSet;
use realmgen::resources::ResourceTables;
use realmgen::{GenerationParams, SeedValue, generate_continent};

/// Генератор миров для Chronicles of Realms
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Путь к конфигурационному файлу в формате TOML
    /// (без него используются значения по умолчанию)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Переопределение сида: целое число или произвольная строка
    #[arg(short, long)]
    seed: Option<String>,

    /// Переопределение количества регионов континента
    #[arg(short, long)]
    regions: Option<usize>,

    /// Путь к JSON-файлу правил смежности биомов
    #[arg(long)]
    rules: Option<PathBuf>,

    /// Путь к JSON-файлу таблиц ресурсов
    #[arg(long)]
    resource_tables: Option<PathBuf>,

    /// Путь для сохранения результата (по умолчанию: ./world.json)
    #[arg(short, long, default_value = "world.json")]
    output: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut params = match &cli.config {
        Some(path) => {
            println!("🔍 Загрузка конфигурации...");
            GenerationParams::from_toml_file(path)?
        }
        None => GenerationParams::default(),
    };

    if let Some(seed) = cli.seed {
        params.seed = seed
            .parse::<u64>()
            .map_or(SeedValue::Text(seed), SeedValue::Int);
    }
    if let Some(regions) = cli.regions {
        params.region_count = regions;
    }

    let rules = cli
        .rules
        .map_or_else(AdjacencyRuleSet::builtin_default, AdjacencyRuleSet::from_json_file);
    let tables = cli
        .resource_tables
        .map_or_else(ResourceTables::builtin_default, ResourceTables::from_json_file);

    println!(
        "Генерация континента (сид: {}, целевых регионов: {})...",
        params.seed.canonical(),
        params.region_count
    );
    let mut world = generate_continent(&params, &rules, &tables)?;
    world.continent.creation_timestamp = Some(Utc::now());

    println!("Сохранение в {:?}", cli.output);
    let file = fs::File::create(&cli.output)?;
    serde_json::to_writer_pretty(file, &world)?;

    println!(
        "\nГотово! Континент из {} регионов сохранён.",
        world.regions.len()
    );
    Ok(())
}
