//! CLI for Garden Designer - edit a photo of a garden with a text prompt.

use clap::{Args, Parser, Subcommand, ValueEnum};
use garden_designer::{
    FileSource, GeminiEditor, GeminiModel, ImageIntake, SessionController, SessionPhase,
    SessionState, PRESET_PROMPTS,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "garden-designer")]
#[command(about = "Visualize garden changes by editing a photo with Gemini")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Edit a photo with a text prompt
    Edit(EditArgs),

    /// List the example prompts
    Presets,
}

#[derive(Args)]
struct EditArgs {
    /// Photo of the space (PNG, JPEG or WebP)
    input: PathBuf,

    /// Description of the change
    #[arg(short, long, required_unless_present = "preset", conflicts_with = "preset")]
    prompt: Option<String>,

    /// Use an example prompt by number (see `presets`)
    #[arg(long)]
    preset: Option<usize>,

    /// Directory the edited image is written to
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Model to use
    #[arg(short, long, value_enum, default_value = "flash")]
    model: ModelArg,

    /// Request timeout in seconds (no timeout by default)
    #[arg(long)]
    timeout: Option<u64>,

    /// Reject files that are not PNG, JPEG or WebP
    #[arg(long)]
    strict: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModelArg {
    Flash,
    Pro,
}

impl From<ModelArg> for GeminiModel {
    fn from(arg: ModelArg) -> Self {
        match arg {
            ModelArg::Flash => GeminiModel::FlashImage,
            ModelArg::Pro => GeminiModel::ProImage,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Edit(args) => edit(args, cli.json).await,
        Commands::Presets => list_presets(cli.json),
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();
}

async fn edit(args: EditArgs, json_output: bool) -> anyhow::Result<()> {
    let mut builder = GeminiEditor::builder().model(args.model.into());
    if let Some(secs) = args.timeout {
        builder = builder.timeout(Duration::from_secs(secs));
    }

    let mut session =
        SessionController::new(builder.build()?).with_intake(ImageIntake::new().strict(args.strict));

    match (args.prompt, args.preset) {
        (Some(prompt), _) => session.set_prompt(prompt),
        (None, Some(index)) => session.use_preset(index)?,
        (None, None) => anyhow::bail!("either --prompt or --preset is required"),
    }

    if session.upload(&FileSource::new(&args.input)).await != SessionPhase::ImageLoaded {
        return report_failure(&session.state(), json_output);
    }

    if session.submit().await != SessionPhase::Succeeded {
        return report_failure(&session.state(), json_output);
    }

    let path = session.save_result(&args.output_dir).await?;
    let state = session.state();
    let metadata = state
        .result
        .as_ref()
        .map(|r| r.metadata.clone())
        .unwrap_or_default();

    if json_output {
        let result = serde_json::json!({
            "success": true,
            "input": args.input.display().to_string(),
            "output": path.display().to_string(),
            "prompt": state.prompt,
            "model": metadata.model,
            "duration_ms": metadata.duration_ms,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("Edited image: {}", path.display());
        if let Some(duration) = metadata.duration_ms {
            println!("Duration: {}ms", duration);
        }
    }

    Ok(())
}

fn report_failure(state: &SessionState, json_output: bool) -> anyhow::Result<()> {
    let message = state
        .error
        .clone()
        .unwrap_or_else(|| "An unexpected error occurred.".to_string());

    if json_output {
        let result = serde_json::json!({
            "success": false,
            "phase": state.phase,
            "error": message,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
        std::process::exit(1);
    }
    anyhow::bail!(message)
}

fn list_presets(json_output: bool) -> anyhow::Result<()> {
    if json_output {
        println!("{}", serde_json::to_string_pretty(&PRESET_PROMPTS)?);
    } else {
        println!("Example prompts:\n");
        for (i, prompt) in PRESET_PROMPTS.iter().enumerate() {
            println!("  {}. {}", i, prompt);
        }
    }
    Ok(())
}
