use anyhow::{Context, Result};
use bytes::Bytes;
use clap::{Parser, Subcommand};
use docket_client::{
    ApiClient, BatchState, HttpTransport, SubmissionClient, SubmissionError, UploadFile,
    UploadOrchestrator,
};
use docket_core::models::{CaseType, SubmissionFields, TribunalType};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "docket-upload")]
#[command(about = "Upload case documents straight to storage and record the submission")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload files and record them as one submission
    Submit {
        /// Files to upload (jpeg, png, webp or pdf)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[arg(long)]
        year: String,

        #[arg(long)]
        code: String,

        #[arg(long)]
        file_number: String,

        /// 1 = civil, 2 = commercial, 3 = social
        #[arg(long)]
        tribunal_type: u8,

        /// 1 = hearings, 2 = notifications, 3 = enforcement, 4 = orders
        #[arg(long)]
        case_type: u8,

        #[arg(long)]
        note: Option<String>,

        /// Drop files the upload policy refuses instead of aborting
        #[arg(long)]
        skip_invalid: bool,
    },
    /// Print a recorded submission
    Show {
        /// Submission ID
        id: String,
    },
}

fn content_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}

async fn read_file(path: &Path) -> Result<UploadFile> {
    if path.components().any(|c| c == Component::ParentDir) {
        return Err(anyhow::anyhow!("Invalid input: {}", path.display()));
    }
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload")
        .to_string();

    Ok(UploadFile::new(name, content_type_for(path), Bytes::from(data)))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let api = ApiClient::from_env()?;

    match args.command {
        Command::Show { id } => {
            let record = api.submission(&id).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Command::Submit {
            files,
            year,
            code,
            file_number,
            tribunal_type,
            case_type,
            note,
            skip_invalid,
        } => {
            let fields = SubmissionFields {
                year,
                code,
                file_number,
                tribunal_type: TribunalType::try_from(tribunal_type)
                    .map_err(|e| anyhow::anyhow!(e))?,
                case_type: CaseType::try_from(case_type).map_err(|e| anyhow::anyhow!(e))?,
                note,
            };

            let mut uploads = Vec::with_capacity(files.len());
            for path in &files {
                uploads.push(read_file(path).await?);
            }

            let client = SubmissionClient::new(
                Arc::new(api),
                UploadOrchestrator::new(Arc::new(HttpTransport::new()?)),
            );

            if skip_invalid {
                let descriptors: Vec<_> = uploads.iter().map(UploadFile::descriptor).collect();
                let (_, refused) = client.preflight().partition(&descriptors);
                for violation in &refused {
                    eprintln!("skipping {}: {}", uploads[violation.index].name, violation);
                }
                let refused: Vec<usize> = refused.iter().map(|v| v.index).collect();
                uploads = uploads
                    .into_iter()
                    .enumerate()
                    .filter(|(i, _)| !refused.contains(i))
                    .map(|(_, f)| f)
                    .collect();
            }

            let mut batch = BatchState::new();
            match client.submit(fields, uploads, &mut batch).await {
                Ok(record) => println!("{}", serde_json::to_string_pretty(&record)?),
                Err(e) => {
                    if let SubmissionError::Upload { failures, .. } = &e {
                        for failure in failures {
                            eprintln!("{}: {}", failure.file, failure.error);
                        }
                    }
                    for key in e.orphaned_keys() {
                        eprintln!("uploaded but not recorded: {}", key);
                    }
                    return Err(anyhow::Error::new(e).context("Submission failed"));
                }
            }
        }
    }

    Ok(())
}
