use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build and print the generation prompt without generating anything.
    Prompt(PromptArgs),
    /// Generate one chapter draft and write it into the project.
    Draft(DraftArgs),
    /// Generate, review, and finalize a contiguous range of chapters.
    Batch(BatchArgs),
    Knowledge {
        #[command(subcommand)]
        command: KnowledgeCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum KnowledgeCommand {
    /// Import a text file into the project's vector index.
    Import(KnowledgeImportArgs),
    /// Delete the project's vector index.
    Clear(KnowledgeClearArgs),
}

#[derive(Debug, Args)]
pub struct ModelArgs {
    /// OpenAI-compatible API base URL.
    #[arg(long, default_value = "https://api.openai.com/v1")]
    pub base_url: String,

    /// Generation model name.
    #[arg(long, default_value = "gpt-4o-mini")]
    pub model: String,

    #[arg(long, default_value_t = 0.7)]
    pub temperature: f32,

    #[arg(long, default_value_t = 2048)]
    pub max_tokens: u32,

    /// Per-request timeout for capability calls.
    #[arg(long, default_value_t = 600)]
    pub timeout_secs: u64,
}

#[derive(Debug, Args)]
pub struct EmbeddingArgs {
    /// OpenAI-compatible API base URL for embeddings (defaults to --base-url).
    #[arg(long)]
    pub embedding_base_url: Option<String>,

    /// Embedding model name.
    #[arg(long, default_value = "text-embedding-3-small")]
    pub embedding_model: String,

    /// Passages fetched per retrieval query.
    #[arg(long, default_value_t = 2)]
    pub retrieval_k: usize,
}

#[derive(Debug, Args)]
pub struct InputArgs {
    /// Free-form authoring guidance for this chapter.
    #[arg(long, default_value = "")]
    pub guidance: String,

    /// Characters that must appear.
    #[arg(long, default_value = "")]
    pub characters: String,

    /// Key items that must appear.
    #[arg(long, default_value = "")]
    pub key_items: String,

    /// Scene location constraint.
    #[arg(long, default_value = "")]
    pub scene_location: String,

    /// Time constraint on the chapter's events.
    #[arg(long, default_value = "")]
    pub time_constraint: String,

    /// Target chapter length in characters.
    #[arg(long, default_value_t = 3000)]
    pub word_target: usize,
}

#[derive(Debug, Args)]
pub struct PromptArgs {
    /// Project directory.
    #[arg(long)]
    pub project: String,

    /// Chapter index (1-based).
    #[arg(long)]
    pub chapter: u32,

    #[command(flatten)]
    pub model: ModelArgs,

    #[command(flatten)]
    pub embedding: EmbeddingArgs,

    #[command(flatten)]
    pub inputs: InputArgs,
}

#[derive(Debug, Args)]
pub struct DraftArgs {
    /// Project directory.
    #[arg(long)]
    pub project: String,

    /// Chapter index (1-based).
    #[arg(long)]
    pub chapter: u32,

    /// Use this file's contents verbatim as the prompt instead of building
    /// one (supports human-edited prompts).
    #[arg(long)]
    pub prompt_file: Option<String>,

    #[command(flatten)]
    pub model: ModelArgs,

    #[command(flatten)]
    pub embedding: EmbeddingArgs,

    #[command(flatten)]
    pub inputs: InputArgs,
}

#[derive(Debug, Args)]
pub struct BatchArgs {
    /// Project directory.
    #[arg(long)]
    pub project: String,

    /// First chapter index (1-based, inclusive).
    #[arg(long)]
    pub start: u32,

    /// Last chapter index (inclusive).
    #[arg(long)]
    pub end: u32,

    #[command(flatten)]
    pub model: ModelArgs,

    #[command(flatten)]
    pub embedding: EmbeddingArgs,

    #[command(flatten)]
    pub inputs: InputArgs,
}

#[derive(Debug, Args)]
pub struct KnowledgeImportArgs {
    /// Project directory.
    #[arg(long)]
    pub project: String,

    /// Text file to import.
    #[arg(long)]
    pub file: String,

    #[command(flatten)]
    pub model: ModelArgs,

    #[command(flatten)]
    pub embedding: EmbeddingArgs,
}

#[derive(Debug, Args)]
pub struct KnowledgeClearArgs {
    /// Project directory.
    #[arg(long)]
    pub project: String,
}
