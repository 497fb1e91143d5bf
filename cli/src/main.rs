//! pdfblocks CLI - PDF section, block and image extraction tool

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::error::ErrorKind;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use pdfblocks::ai::{AzureConfig, AzureVisionClient, LlamaConfig, LlamaParseClient};
use pdfblocks::ocr::{OcrOptions, TesseractOcr};
use pdfblocks::render::{failure_json, outcome_json, Failure};
use pdfblocks::{pipeline, ImageClassifier, ImageFormat, JsonFormat, Result};

#[derive(Parser)]
#[command(name = "pdfblocks")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Extract sections, blocks, images and tables from PDF files as JSON", long_about = None)]
struct Cli {
    /// Print compact JSON
    #[arg(long, global = true)]
    compact: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Azure OpenAI credentials, positional or from the environment.
#[derive(Args)]
struct AzureArgs {
    /// Azure OpenAI endpoint
    #[arg(value_name = "AZURE_ENDPOINT", env = "AZURE_OPENAI_GPT_ENDPOINT")]
    endpoint: String,

    /// Azure OpenAI API key
    #[arg(value_name = "AZURE_KEY", env = "AZURE_OPENAI_GPT_KEY", hide_env_values = true)]
    key: String,

    /// Vision-capable deployment name
    #[arg(value_name = "DEPLOYMENT", env = "AZURE_OPENAI_GPT_DEPLOYMENT")]
    deployment: String,
}

impl AzureArgs {
    fn client(&self) -> Result<AzureVisionClient> {
        AzureVisionClient::new(AzureConfig::new(&self.endpoint, &self.key, &self.deployment))
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Split the text into heading sections and save all page images
    Sections {
        #[arg(value_name = "PDF")]
        pdf: PathBuf,
        #[arg(value_name = "OUTPUT_DIR")]
        output: PathBuf,
    },

    /// Save every embedded image with a per-page summary
    Images {
        #[arg(value_name = "PDF")]
        pdf: PathBuf,
        #[arg(value_name = "OUTPUT_DIR")]
        output: PathBuf,
    },

    /// Sections of text lines, images and rendered tables
    Blocks {
        #[arg(value_name = "PDF")]
        pdf: PathBuf,
        #[arg(value_name = "OUTPUT_DIR")]
        output: PathBuf,
    },

    /// Sections of paragraphs, AI-classified images and tables
    AiBlocks {
        #[arg(value_name = "PDF")]
        pdf: PathBuf,
        #[arg(value_name = "OUTPUT_DIR")]
        output: PathBuf,
        #[command(flatten)]
        azure: AzureArgs,
    },

    /// Save only the images an AI model (or the size filter) keeps
    AiFilter {
        #[arg(value_name = "PDF")]
        pdf: PathBuf,
        #[arg(value_name = "OUTPUT_DIR")]
        output: PathBuf,
        #[command(flatten)]
        azure: AzureArgs,
        /// "true" to ask the model, anything else to filter by size
        #[arg(value_name = "USE_AI", default_value = "true", value_parser = parse_flag)]
        use_ai: bool,
    },

    /// Identify the document's headings with a language model
    Headings {
        #[arg(value_name = "PDF")]
        pdf: PathBuf,
        #[command(flatten)]
        azure: AzureArgs,
        /// Only send the first N pages
        #[arg(value_name = "MAX_PAGES")]
        max_pages: Option<u32>,
    },

    /// Sections from language-model headings with AI-classified images
    LlmSections {
        #[arg(value_name = "PDF")]
        pdf: PathBuf,
        #[arg(value_name = "OUTPUT_DIR")]
        output: PathBuf,
        #[command(flatten)]
        azure: AzureArgs,
    },

    /// Native and OCR text for every page
    Ocr {
        #[arg(value_name = "PDF")]
        pdf: PathBuf,
        #[arg(value_name = "OUTPUT_DIR")]
        output: PathBuf,
    },

    /// Markdown sections from LlamaParse
    Llama {
        #[arg(value_name = "PDF")]
        pdf: PathBuf,
        /// LlamaParse API key
        #[arg(value_name = "API_KEY", env = "LLAMA_CLOUD_API_KEY", hide_env_values = true)]
        api_key: String,
    },

    /// Layout sections from LlamaParse
    Layout {
        #[arg(value_name = "PDF")]
        pdf: PathBuf,
        /// LlamaParse API key
        #[arg(value_name = "API_KEY", env = "LLAMA_CLOUD_API_KEY", hide_env_values = true)]
        api_key: String,
    },

    /// Ask whether an image is worth keeping
    Classify {
        #[arg(value_name = "IMAGE")]
        image: PathBuf,
        #[command(flatten)]
        azure: AzureArgs,
    },

    /// Classify and describe an image
    Describe {
        #[arg(value_name = "IMAGE")]
        image: PathBuf,
        #[command(flatten)]
        azure: AzureArgs,
        /// Section heading the image belongs to
        #[arg(value_name = "CONTEXT", default_value = "")]
        context: String,
    },

    /// Check the Azure OpenAI vision deployment with a sample image
    CheckVision {
        /// Directory holding the sample image
        #[arg(value_name = "DIR", default_value = pipeline::SAMPLE_IMAGE_DIR)]
        dir: PathBuf,
    },
}

fn parse_flag(value: &str) -> std::result::Result<bool, String> {
    Ok(value.eq_ignore_ascii_case("true"))
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            let failure = Failure::new(e.to_string().trim());
            println!("{}", failure_json(&failure, JsonFormat::Pretty));
            return ExitCode::FAILURE;
        }
    };

    let format = if cli.compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    };

    let success = match cli.command {
        Commands::Sections { pdf, output } => emit(pipeline::process_sections(&pdf, &output), format),
        Commands::Images { pdf, output } => emit(pipeline::extract_images(&pdf, &output), format),
        Commands::Blocks { pdf, output } => emit(pipeline::process_blocks(&pdf, &output), format),
        Commands::AiBlocks { pdf, output, azure } => emit(
            azure
                .client()
                .and_then(|client| pipeline::process_blocks_with_ai(&pdf, &output, &client)),
            format,
        ),
        Commands::AiFilter {
            pdf,
            output,
            azure,
            use_ai,
        } => emit(cmd_ai_filter(&pdf, &output, &azure, use_ai), format),
        Commands::Headings {
            pdf,
            azure,
            max_pages,
        } => emit(
            azure
                .client()
                .and_then(|client| pipeline::identify_headings(&pdf, &client, max_pages)),
            format,
        ),
        Commands::LlmSections { pdf, output, azure } => emit(
            azure
                .client()
                .and_then(|client| pipeline::process_llm_sections(&pdf, &output, &client, &client)),
            format,
        ),
        Commands::Ocr { pdf, output } => {
            let ocr = TesseractOcr::new(OcrOptions::default());
            emit(pipeline::process_ocr(&pdf, &output, &ocr), format)
        }
        Commands::Llama { pdf, api_key } => emit(
            LlamaParseClient::new(LlamaConfig::new(api_key))
                .and_then(|client| pipeline::process_llama(&pdf, &client)),
            format,
        ),
        Commands::Layout { pdf, api_key } => emit(
            LlamaParseClient::new(LlamaConfig::new(api_key))
                .and_then(|client| pipeline::process_layout(&pdf, &client)),
            format,
        ),
        Commands::Classify { image, azure } => emit(
            azure
                .client()
                .and_then(|client| pipeline::classify_image(&image, &client)),
            format,
        ),
        Commands::Describe {
            image,
            azure,
            context,
        } => emit(
            azure
                .client()
                .and_then(|client| pipeline::describe_image(&image, &context, &client)),
            format,
        ),
        Commands::CheckVision { dir } => cmd_check_vision(&dir),
    };

    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Print the outcome envelope; true on success.
fn emit<T: Serialize>(outcome: Result<T>, format: JsonFormat) -> bool {
    if let Err(ref e) = outcome {
        log::error!("{}", e);
    }
    println!("{}", outcome_json(&outcome, format));
    outcome.is_ok()
}

fn cmd_ai_filter(
    pdf: &Path,
    output: &Path,
    azure: &AzureArgs,
    use_ai: bool,
) -> Result<pipeline::FilterReport> {
    if !use_ai {
        return pipeline::filter_images(pdf, output, None);
    }
    let client = azure.client()?;
    pipeline::filter_images(pdf, output, Some(&client))
}

fn cmd_check_vision(dir: &Path) -> bool {
    let rule = "=".repeat(60);
    println!("{}", rule);
    println!("{}", "Vision Model Check".cyan().bold());
    println!("{}", rule);

    let passed = match check_vision(dir) {
        Ok(()) => {
            println!("\n{}", rule);
            println!("{}", "Vision model is working correctly!".green().bold());
            true
        }
        Err(message) => {
            println!("   {} {}", "✗".red(), message);
            println!("\n{}", rule);
            println!("{}", "Vision model check failed".red().bold());
            false
        }
    };
    println!("{}", rule);
    passed
}

fn check_vision(dir: &Path) -> std::result::Result<(), String> {
    println!("\n{}", "1. Checking Azure OpenAI configuration...".bold());
    let config = AzureConfig::from_env().ok_or(
        "AZURE_OPENAI_GPT_ENDPOINT, AZURE_OPENAI_GPT_KEY and AZURE_OPENAI_GPT_DEPLOYMENT must be set",
    )?;
    println!("   {} Endpoint: {}", "✓".green(), config.endpoint);
    println!("   {} Deployment: {}", "✓".green(), config.deployment);
    println!("   {} API Key: {}", "✓".green(), config.masked_key());

    println!("\n{}", "2. Finding test image...".bold());
    if !dir.is_dir() {
        return Err(format!("Directory not found: {}", dir.display()));
    }
    let image = pipeline::find_sample_image(dir)
        .map_err(|e| e.to_string())?
        .ok_or_else(|| format!("No test images found in {}", dir.display()))?;
    let name = image.file_name().unwrap_or_default().to_string_lossy();
    println!("   {} Using test image: {}", "✓".green(), name);

    println!("\n{}", "3. Reading image file...".bold());
    let data = std::fs::read(&image).map_err(|e| format!("Error reading image: {}", e))?;
    let format = ImageFormat::from_path(&image, &data)
        .ok_or_else(|| format!("Unsupported image format: {}", name))?;
    println!("   {} Image size: {:.1} KB", "✓".green(), data.len() as f64 / 1024.0);
    println!("   {} Image format: {}", "✓".green(), format);

    println!("\n{}", "4. Calling the vision model...".bold());
    let client = AzureVisionClient::new(config).map_err(|e| e.to_string())?;

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("   {spinner:.green} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message("Waiting for the model (this may take 5-10 seconds)...");
    spinner.enable_steady_tick(Duration::from_millis(100));
    let result = client.classify(&data, format, pipeline::SAMPLE_CONTEXT);
    spinner.finish_and_clear();

    let classification = result.map_err(|e| format!("API call failed: {}", e))?;
    println!("   {} API call successful!", "✓".green());

    println!("\n{}", "5. Classification results:".bold());
    println!("   {}", "-".repeat(56).dimmed());
    let important = if classification.is_important {
        "✓ YES".green()
    } else {
        "✗ NO".red()
    };
    let description: String = classification.description.chars().take(80).collect();
    println!("   {:<18}{}", "Important:", important);
    println!("   {:<18}{}", "Image Type:", classification.image_type);
    println!("   {:<18}{}/10", "Relevance Score:", classification.relevance_score);
    println!("   {:<18}{}...", "Description:", description);
    println!("   {:<18}{}", "Tags:", classification.tags.join(", "));
    println!("   {}", "-".repeat(56).dimmed());

    println!("\n{}", "6. Full JSON response:".bold());
    let json = serde_json::to_string_pretty(&classification).map_err(|e| e.to_string())?;
    println!("{}", json);

    Ok(())
}
