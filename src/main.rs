use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

use novelsmith::chapter::{ChapterInputs, ChapterPipeline, PromptSource};
use novelsmith::cli::{self, EmbeddingArgs, InputArgs, ModelArgs};
use novelsmith::llm::{EmbeddingParams, ModelParams};
use novelsmith::openai::OpenAiClient;
use novelsmith::vectorstore::{self, VectorStore};

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    novelsmith::logging::init().context("init logging")?;

    let cli = cli::Cli::parse();

    match cli.command {
        cli::Command::Prompt(args) => {
            let generator = generation_client(&args.model)?;
            let embedder = embedding_client(&args.model, &args.embedding)?;
            let pipeline = ChapterPipeline::new(
                &generator,
                &embedder,
                Path::new(&args.project),
                args.embedding.retrieval_k,
            );
            let prompt = pipeline
                .build_chapter_prompt(args.chapter, &chapter_inputs(&args.inputs))
                .await
                .context("build prompt")?;
            println!("{prompt}");
        }
        cli::Command::Draft(args) => {
            let generator = generation_client(&args.model)?;
            let embedder = embedding_client(&args.model, &args.embedding)?;
            let pipeline = ChapterPipeline::new(
                &generator,
                &embedder,
                Path::new(&args.project),
                args.embedding.retrieval_k,
            );

            let source = match args.prompt_file.as_deref() {
                Some(path) => {
                    let prompt = std::fs::read_to_string(path)
                        .with_context(|| format!("read prompt file: {path}"))?;
                    PromptSource::Verbatim(prompt)
                }
                None => PromptSource::Build,
            };

            pipeline
                .generate_chapter_draft(args.chapter, &chapter_inputs(&args.inputs), source)
                .await
                .context("draft")?;
        }
        cli::Command::Batch(args) => {
            let generator = generation_client(&args.model)?;
            let embedder = embedding_client(&args.model, &args.embedding)?;
            let pipeline = ChapterPipeline::new(
                &generator,
                &embedder,
                Path::new(&args.project),
                args.embedding.retrieval_k,
            );
            pipeline
                .run_batch(args.start, args.end, &chapter_inputs(&args.inputs))
                .await
                .context("batch")?;
        }
        cli::Command::Knowledge {
            command: cli::KnowledgeCommand::Import(args),
        } => {
            let embedder = embedding_client(&args.model, &args.embedding)?;
            vectorstore::import_knowledge_file(
                &embedder,
                Path::new(&args.project),
                Path::new(&args.file),
            )
            .await
            .context("knowledge import")?;
        }
        cli::Command::Knowledge {
            command: cli::KnowledgeCommand::Clear(args),
        } => {
            let removed = VectorStore::open(&PathBuf::from(&args.project)).clear()?;
            if removed {
                tracing::info!("vector index removed");
            } else {
                tracing::info!("vector index did not exist");
            }
        }
    }

    Ok(())
}

/// `NOVELSMITH_API_KEY` with an `OPENAI_API_KEY` fallback; an empty key is
/// only rejected once a capability call actually happens.
fn api_key() -> String {
    std::env::var("NOVELSMITH_API_KEY")
        .or_else(|_| std::env::var("OPENAI_API_KEY"))
        .unwrap_or_default()
}

fn generation_client(model: &ModelArgs) -> anyhow::Result<OpenAiClient> {
    OpenAiClient::for_generation(&ModelParams {
        base_url: model.base_url.clone(),
        api_key: api_key(),
        model: model.model.clone(),
        temperature: model.temperature,
        max_tokens: model.max_tokens,
        timeout_secs: model.timeout_secs,
    })
}

fn embedding_client(model: &ModelArgs, embedding: &EmbeddingArgs) -> anyhow::Result<OpenAiClient> {
    OpenAiClient::for_embedding(&EmbeddingParams {
        base_url: embedding
            .embedding_base_url
            .clone()
            .unwrap_or_else(|| model.base_url.clone()),
        api_key: api_key(),
        model: embedding.embedding_model.clone(),
        timeout_secs: model.timeout_secs,
    })
}

fn chapter_inputs(inputs: &InputArgs) -> ChapterInputs {
    ChapterInputs {
        user_guidance: inputs.guidance.clone(),
        characters_involved: inputs.characters.clone(),
        key_items: inputs.key_items.clone(),
        scene_location: inputs.scene_location.clone(),
        time_constraint: inputs.time_constraint.clone(),
        word_target: inputs.word_target,
    }
}
