use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use boardlens_core::is_generating;
use boardlens_llm::LlmClient;
use boardlens_pipeline::{ModelConfig, Pipeline, PipelineJob, Supervisor};
use boardlens_storage::Storage;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "boardlens")]
#[command(about = "Capture classroom whiteboards and generate streamed AI explanations", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register photos for a class and run the generation pipeline.
    Ingest {
        /// Course name; a new course is created unless --class is given.
        #[arg(short, long)]
        course: String,
        /// Existing class to append to instead of creating a new one.
        #[arg(long)]
        class: Option<i64>,
        /// Photo files to analyze.
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },
    /// Show a class's generated fields and per-photo progress.
    Status { class_id: i64 },
    /// Print one photo's current (possibly partial) explanation.
    Explain { photo_id: i64 },
}

fn get_db_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("boardlens")
        .join("boardlens.db")
}

fn get_api_key() -> Result<String> {
    std::env::var("BOARDLENS_API_KEY")
        .map_err(|_| anyhow::anyhow!("BOARDLENS_API_KEY environment variable must be set"))
}

fn get_base_url() -> String {
    std::env::var("BOARDLENS_API_URL").unwrap_or_else(|_| "https://oneapi.jyj.cx".to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let cli = Cli::parse();
    let db_path = get_db_path();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let storage = Storage::new(&db_path)?;

    match cli.command {
        Commands::Ingest { course, class, images } => {
            let class_id = match class {
                Some(id) => {
                    storage
                        .get_class(id)?
                        .ok_or_else(|| anyhow::anyhow!("class {id} does not exist"))?;
                    id
                },
                None => {
                    let course_id = storage.create_course(&course)?;
                    storage.create_class(course_id)?
                },
            };

            let mut photos = Vec::new();
            for image in &images {
                let path = std::fs::canonicalize(image)?;
                let path = path
                    .to_str()
                    .ok_or_else(|| anyhow::anyhow!("non-UTF-8 path: {}", image.display()))?;
                let photo_id = storage.add_photo(class_id, path)?;
                if let Some(photo) = storage.get_photo(photo_id)? {
                    photos.push(photo);
                }
            }
            tracing::info!(class_id, photos = photos.len(), "submitting pipeline");

            let llm = LlmClient::new(get_api_key()?, get_base_url())?;
            let pipeline =
                Arc::new(Pipeline::new(Arc::new(storage), Arc::new(llm), ModelConfig::from_env()));
            let supervisor = Supervisor::from_env();

            let handle = supervisor.submit(pipeline, PipelineJob { class_id, photos });
            let report = handle.await??;

            println!("class {class_id}: {} photo(s) analyzed", report.analyzed);
            if !report.failed_photos.is_empty() {
                anyhow::bail!("analysis failed for photos {:?}", report.failed_photos);
            }
            if let Some(summaries) = &report.summaries {
                if !summaries.succeeded() {
                    anyhow::bail!("summary stages failed: {:?}", summaries.failed_stages());
                }
                if let Ok(title) = &summaries.title {
                    println!("title: {title}");
                }
            }
        },
        Commands::Status { class_id } => {
            let class = storage
                .get_class(class_id)?
                .ok_or_else(|| anyhow::anyhow!("class {class_id} does not exist"))?;

            print_field("title", class.title.as_deref());
            print_field("short_description", class.short_description.as_deref());
            print_field("long_description", class.long_description.as_deref());

            for photo in storage.list_class_photos(class_id)? {
                let state = match storage.get_explanation(photo.photo_id)? {
                    Some(text) if is_generating(&text) => "generating",
                    Some(_) => "done",
                    None => "pending",
                };
                println!("photo {} [{}]: {}", photo.photo_id, state, photo.file_path);
            }
        },
        Commands::Explain { photo_id } => match storage.get_explanation(photo_id)? {
            Some(text) => {
                if is_generating(&text) {
                    eprintln!("(still generating)");
                }
                println!("{text}");
            },
            None => println!("No analysis yet for photo {photo_id}"),
        },
    }

    Ok(())
}

fn print_field(name: &str, value: Option<&str>) {
    match value {
        Some(text) if is_generating(text) => println!("{name} (generating): {text}"),
        Some(text) => println!("{name}: {text}"),
        None => println!("{name}: -"),
    }
}
