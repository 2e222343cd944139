//! Resume ranker: rank PDF resumes against a job description

use clap::Parser;
use log::{error, info, warn};
use resume_ranker::cli::{self, Cli, Commands, ConfigAction, ModelAction};
use resume_ranker::config::OutputFormat;
use resume_ranker::input::manager::InputManager;
use resume_ranker::input::text_extractor::PdfExtractor;
use resume_ranker::output::formatter::{
    resolve_save_path, save_report_to_file, CsvFormatter, OutputFormatter, ReportGenerator,
};
use resume_ranker::output::report::RankingReport;
use resume_ranker::processing::embedding_manager::EmbeddingModelManager;
use resume_ranker::{Config, RankingPipeline, RankingRequest, Result, ResumeRankerError};
use std::path::{Path, PathBuf};
use std::process;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config_path = cli.config.clone().unwrap_or_else(Config::config_path);
    let config = match Config::load_from(&config_path) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = run_command(cli.command, config, &config_path).await {
        error!("Command failed: {}", e);
        process::exit(1);
    }
}

async fn run_command(command: Commands, config: Config, config_path: &Path) -> Result<()> {
    match command {
        Commands::Rank {
            resumes,
            job,
            job_file,
            model,
            output,
            save,
            csv,
            preview,
            preview_chars,
        } => {
            let options = RankOptions {
                model,
                output,
                save,
                csv,
                preview,
                preview_chars,
            };
            run_rank(resumes, job, job_file, options, &config).await
        }

        Commands::Models { action } => run_models(action, &config).await,

        Commands::Config { action } => run_config(action, &config, config_path),
    }
}

struct RankOptions {
    model: Option<String>,
    output: Option<String>,
    save: Option<PathBuf>,
    csv: Option<Option<PathBuf>>,
    preview: Option<String>,
    preview_chars: Option<usize>,
}

async fn run_rank(
    resumes: Vec<PathBuf>,
    job: Option<String>,
    job_file: Option<PathBuf>,
    options: RankOptions,
    config: &Config,
) -> Result<()> {
    info!("Starting resume ranking");

    for resume in &resumes {
        cli::validate_file_extension(resume, &["pdf"])
            .map_err(|e| ResumeRankerError::InvalidInput(format!("Resume file {}: {}", resume.display(), e)))?;
    }

    let csv_path = options
        .csv
        .as_ref()
        .map(|path| path.clone().unwrap_or_else(|| PathBuf::from(&config.output.csv_filename)));
    if let Some(csv_path) = &csv_path {
        cli::validate_csv_path(csv_path, &resumes).map_err(ResumeRankerError::InvalidInput)?;
    }

    let output_format = match &options.output {
        Some(output) => cli::parse_output_format(output).map_err(ResumeRankerError::InvalidInput)?,
        None => config.output.format,
    };

    let input_manager = InputManager::new();
    let job_description = match (job, job_file) {
        (Some(text), _) => text,
        (None, Some(path)) => {
            cli::validate_file_extension(&path, &["txt", "md"])
                .map_err(|e| ResumeRankerError::InvalidInput(format!("Job description file: {}", e)))?;
            println!("💼 Job Description: {}", path.display());
            input_manager.read_job_description(&path).await?
        }
        (None, None) => String::new(),
    };

    let uploads = input_manager.read_uploads(&resumes).await?;
    let request = RankingRequest::new(job_description, uploads);

    // Nothing is loaded until both inputs are present
    request.validate()?;

    println!("🚀 Ranking {} resumes", request.uploads.len());
    println!("🔧 Output Format: {:?}", output_format);

    let model_id = options
        .model
        .clone()
        .unwrap_or_else(|| config.models.default_embedding_model.clone());
    println!("🧠 Embedding Model: {}", model_id);

    let mut model_manager = EmbeddingModelManager::from_config(config).await?;
    let embedder = model_manager.load_embedder(&model_id).await?;

    let extractor = PdfExtractor;
    let pipeline = RankingPipeline::new(&*embedder, &extractor).with_progress(config.processing.show_progress);
    let result = pipeline.run(request)?;

    let mut report = RankingReport::from_result(&result);
    if let Some(selector) = &options.preview {
        let max_chars = options.preview_chars.unwrap_or(config.processing.preview_chars);
        report = report.with_preview(result.preview(selector, max_chars)?);
    }

    let generator = ReportGenerator::with_options(config.output.color_output, true);
    let content = generator.generate_report(&report, &output_format)?;

    match &options.save {
        Some(path) => {
            let path = resolve_save_path(path, &output_format);
            save_report_to_file(&content, &path)?;
            println!("💾 Report saved to {}", path.display());
        }
        None => println!("{}", content),
    }

    if let Some(csv_path) = &csv_path {
        if report.rankings.is_empty() {
            warn!("No resumes were ranked; skipping CSV export");
        } else {
            let csv_content = CsvFormatter.format_report(&report)?;
            save_report_to_file(&csv_content, csv_path)?;
            println!("📄 CSV exported to {}", csv_path.display());
        }
    }

    if !result.failures.is_empty() && output_format != OutputFormat::Console {
        for failure in &result.failures {
            warn!("Skipped {}: {}", failure.name, failure.reason);
        }
    }

    match report.best_match() {
        Some(best) => println!("🎯 Best match: {} ({:.4})", best.name, best.score),
        None => println!("⚠️  No resumes could be ranked"),
    }

    Ok(())
}

async fn run_models(action: ModelAction, config: &Config) -> Result<()> {
    let mut model_manager = EmbeddingModelManager::from_config(config).await?;

    match action {
        ModelAction::List => {
            println!("📚 Available Embedding Models\n");

            for (id, model_info) in model_manager.list_available_models() {
                let status = if model_info.size_mb == 0 {
                    "🔧 Built in"
                } else if model_manager.is_model_downloaded(id) {
                    "✅ Downloaded"
                } else {
                    "⬇️  Available"
                };
                let default_marker = if id == config.models.default_embedding_model { " (default)" } else { "" };

                println!("  • {}{} - {} MB [{}]", id, default_marker, model_info.size_mb, status);
                println!("    {} ({} dimensions)", model_info.description, model_info.dimensions);
            }

            if model_manager.list_downloaded_models().is_empty() {
                println!("\n💡 No models downloaded yet. Get started with:");
                println!("   resume-ranker models download {}", config.models.default_embedding_model);
            }
        }

        ModelAction::Download { model, force } => {
            let model_id = model_manager
                .resolve_model_id(&model)
                .ok_or_else(|| ResumeRankerError::ModelNotFound(model.clone()))?;

            if !force && model_manager.is_model_downloaded(&model_id) {
                println!("✅ Model '{}' is already downloaded!", model_id);
                println!("💡 Use --force to re-download");
                return Ok(());
            }

            match model_manager.download_model(&model_id, force).await {
                Ok(model_path) => {
                    println!("✅ Model '{}' downloaded successfully!", model_id);
                    println!("📁 Location: {}", model_path.display());
                }
                Err(e) => {
                    println!("❌ Failed to download model '{}': {}", model_id, e);
                    return Err(e);
                }
            }
        }

        ModelAction::Remove { model } => {
            let model_id = model_manager.resolve_model_id(&model).unwrap_or(model);
            if model_manager.remove_model(&model_id).await? {
                println!("✅ Model '{}' removed successfully!", model_id);
            } else {
                println!("⚠️  Model '{}' is not downloaded", model_id);
            }
        }

        ModelAction::Info { model } => {
            let model_id = model_manager
                .resolve_model_id(&model)
                .ok_or_else(|| ResumeRankerError::ModelNotFound(model.clone()))?;
            let model_info = model_manager
                .get_model_info(&model_id)
                .ok_or_else(|| ResumeRankerError::ModelNotFound(model.clone()))?;

            println!("📋 Model Information for '{}'\n", model_id);
            println!("Name: {}", model_info.name);
            println!("Repository: {}", model_info.repo_id);
            println!("Type: {:?}", model_info.model_type);
            println!("Dimensions: {}", model_info.dimensions);
            println!("Size: {} MB", model_info.size_mb);
            println!("Description: {}", model_info.description);

            let is_downloaded = model_manager.is_model_downloaded(&model_id);
            println!("Status: {}", if is_downloaded { "✅ Downloaded" } else { "⬇️  Available for download" });
            if let Some(model_path) = model_manager.get_model_path(&model_id) {
                println!("Location: {}", model_path.display());
            }
        }
    }

    Ok(())
}

fn run_config(action: Option<ConfigAction>, config: &Config, config_path: &Path) -> Result<()> {
    match action {
        Some(ConfigAction::Show) | None => {
            println!("⚙️  Current Configuration\n");
            println!("Models Directory: {}", config.models_dir().display());
            println!("Default Embedding Model: {}", config.models.default_embedding_model);
            println!("Hashing Dimensions: {}", config.models.hashing_dimensions);
            println!("\nProcessing:");
            println!("  Max Sequence Length: {}", config.processing.max_sequence_length);
            println!("  Preview Characters: {}", config.processing.preview_chars);
            println!("  Show Progress: {}", config.processing.show_progress);
            println!("\nOutput:");
            println!("  Format: {:?}", config.output.format);
            println!("  Colors: {}", config.output.color_output);
            println!("  CSV File: {}", config.output.csv_filename);
        }

        Some(ConfigAction::Reset) => {
            println!("🔄 Resetting configuration to defaults...");
            Config::default().save_to(config_path)?;
            println!("✅ Configuration written to {}", config_path.display());
        }

        Some(ConfigAction::Path) => {
            println!("{}", config_path.display());
        }
    }

    Ok(())
}
