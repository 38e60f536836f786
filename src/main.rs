use allergy_scan::config::{Cli, Command, LogFormat, ProfileAction, ScanConfig};
use allergy_scan::domain::ports::{ImageSource, ProfileStore};
use allergy_scan::utils::error::ErrorSeverity;
use allergy_scan::utils::{logger, validation::Validate};
use allergy_scan::{
    AllergenTag, AllergyProfile, ConsoleReporter, FileImageSource, HttpTranslator,
    JsonProfileStore, PromptImageSource, RecipeBook, Result, ScanEngine, ScanError, ScanOutcome,
    ScanPipeline, VisionTextExtractor,
};
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match ScanConfig::from_file(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", cli.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    match config.log_format() {
        LogFormat::Compact => logger::init_cli_logger(cli.verbose),
        LogFormat::Json => logger::init_json_logger(cli.verbose),
    }
    tracing::info!("📁 Loaded configuration from: {}", cli.config);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let result = match cli.command {
        Command::Scan { user, image } => match image {
            Some(path) => run_scan(&config, &user, FileImageSource::new(path), cli.verbose).await,
            None => run_scan(&config, &user, PromptImageSource::stdin(), cli.verbose).await,
        },
        Command::Profile { user, action } => run_profile(&config, &user, action).await,
        Command::Recipes { user } => run_recipes(&config, &user).await,
    };

    match result {
        Ok(code) => {
            if code != 0 {
                std::process::exit(code);
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!(
                "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
            Ok(())
        }
    }
}

async fn run_scan<I: ImageSource>(
    config: &ScanConfig,
    user: &str,
    image_source: I,
    verbose: bool,
) -> Result<i32> {
    let extractor = VisionTextExtractor::from_config(&config.ocr)?;
    let translator = HttpTranslator::from_config(&config.translation)?;
    let pipeline = ScanPipeline::new(
        image_source,
        extractor,
        translator,
        ConsoleReporter::new(verbose),
    )
    .with_settings(config.scan_settings());

    let engine = ScanEngine::new(JsonProfileStore::new(&config.profiles.path), pipeline);

    // The reporter has already printed the verdict or the error.
    match engine.run_for_user(user).await? {
        ScanOutcome::Completed { .. } | ScanOutcome::Cancelled => Ok(0),
        ScanOutcome::Failed(_) => Ok(2),
    }
}

fn parse_tags(names: &[String]) -> Result<Vec<AllergenTag>> {
    names.iter().map(|name| name.parse()).collect()
}

fn print_profile(user: &str, profile: &AllergyProfile) {
    println!("Allergy profile for {}:", user);
    for (tag, active) in profile.iter() {
        println!("  [{}] {}", if active { "x" } else { " " }, tag);
    }
}

async fn run_profile(config: &ScanConfig, user: &str, action: ProfileAction) -> Result<i32> {
    let store = JsonProfileStore::new(&config.profiles.path);

    // Some(flag) sets every tag to flag, None flips each one
    let (tags, target) = match action {
        ProfileAction::Show => {
            let profile = store.get_allergy_profile(user).await?;
            print_profile(user, &profile);
            return Ok(0);
        }
        ProfileAction::Enable { allergens } => (parse_tags(&allergens)?, Some(true)),
        ProfileAction::Disable { allergens } => (parse_tags(&allergens)?, Some(false)),
        ProfileAction::Toggle { allergens } => (parse_tags(&allergens)?, None),
    };

    let mut profile = match store.get_allergy_profile(user).await {
        Ok(profile) => profile,
        Err(ScanError::ProfileNotFound { .. }) => AllergyProfile::new(),
        Err(e) => return Err(e),
    };
    for tag in tags {
        match target {
            Some(active) => profile.set(tag, active),
            None => {
                profile.toggle(tag);
            }
        }
    }

    store.update_allergy_profile(user, &profile).await?;
    tracing::info!("✅ Allergy profile for '{}' updated", user);
    print_profile(user, &profile);
    Ok(0)
}

async fn run_recipes(config: &ScanConfig, user: &str) -> Result<i32> {
    let book = match &config.recipes {
        Some(recipes) => RecipeBook::from_file(&recipes.path)?,
        None => RecipeBook::builtin(),
    };

    let profile = JsonProfileStore::new(&config.profiles.path)
        .get_allergy_profile(user)
        .await?;
    let safe = book.safe_for(&profile);
    tracing::info!("{} of {} recipes are safe", safe.len(), book.recipes.len());

    if safe.is_empty() {
        println!("No recipes avoid all of your allergens.");
    }
    for recipe in safe {
        println!("🍽️  {}", recipe.title);
        println!("   Ingredients: {}", recipe.ingredients.join(", "));
        println!("   Instructions: {}", recipe.instructions);
    }
    Ok(0)
}
