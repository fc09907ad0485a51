mod console;
mod sources;

use anyhow::{Context, Result};
use batch::{
    block_user, BatchExecutor, BatchQuery, Compose, Controller, MaxRequestGate, Notifier, Pacing,
    ProgressReporter, SharedItems, SurfaceErrors,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use console::ConsoleNotifier;
use entities::parser::{is_tweet_shape, is_user_shape};
use entities::{extract, FilterData, MemoryStore, Signer, StaticSigner, UserRecord};
use pipeline::{ActionDispatcher, ActionWorker, Activity, PipelineConfig, RecentWindow};
use serde_json::Value;
use sources::{parse_user_list, DirectoryPager, DryRunBlockApi, FileSnapshotSource};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// tweetguard - moderation toolkit for captured social network traffic
#[derive(Parser)]
#[command(name = "tweetguard")]
#[command(about = "Recover entities from API payloads, filter them and run bulk jobs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every object of a shape found in a payload
    Extract {
        /// Captured API response (JSON)
        #[arg(long)]
        input: PathBuf,

        #[arg(long, value_enum, default_value = "any")]
        shape: Shape,
    },

    /// Run the moderation rules over every entity in a payload
    Filter {
        /// Captured API response (JSON)
        #[arg(long)]
        input: PathBuf,

        /// Rule configuration (JSON)
        #[arg(long, env = "TWEETGUARD_RULES")]
        rules: PathBuf,

        /// Spam/modlist/trusted lists (JSON)
        #[arg(long)]
        spam_list: Option<PathBuf>,

        /// Queue Block decisions to the (dry-run) block worker
        #[arg(long)]
        auto_block: bool,
    },

    /// Collect users from a directory of captured pages into a JSONL file
    Export {
        /// Directory of captured API responses, read in name order
        #[arg(long)]
        pages: PathBuf,

        #[arg(long)]
        output: PathBuf,

        #[command(flatten)]
        run: RunOptions,
    },

    /// Block a list of accounts (`<id> [screen_name]` per line)
    Block {
        #[arg(long)]
        input: PathBuf,

        /// Token handed to the block transport
        #[arg(long, env = "TWEETGUARD_TOKEN", default_value = "dry-run")]
        token: String,

        #[command(flatten)]
        run: RunOptions,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Shape {
    User,
    Tweet,
    Any,
}

/// Pacing and limits shared by the bulk commands.
#[derive(Args)]
struct RunOptions {
    /// Pause between requests
    #[arg(long, default_value = "1000")]
    delay_ms: u64,

    /// Random extra pause, up to this much
    #[arg(long, default_value = "500")]
    jitter_ms: u64,

    /// Ask for confirmation every N requests (0 = never)
    #[arg(long, default_value = "50")]
    max_requests: usize,

    /// Answer every confirmation with yes
    #[arg(long, short)]
    yes: bool,
}

impl RunOptions {
    /// Standard handler chain: errors, request gate, progress, pacing.
    fn chain<C: batch::BatchContext>(&self, notifier: Arc<dyn Notifier>, label: &str) -> Compose<C> {
        Compose::new()
            .with(SurfaceErrors::new(notifier.clone()))
            .with(MaxRequestGate::new(notifier.clone(), self.max_requests))
            .with(ProgressReporter::new(notifier, label))
            .with(
                Pacing::new(Duration::from_millis(self.delay_ms))
                    .with_jitter(Duration::from_millis(self.jitter_ms)),
            )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Extract { input, shape } => handle_extract(&input, shape)?,
        Commands::Filter {
            input,
            rules,
            spam_list,
            auto_block,
        } => handle_filter(&input, &rules, spam_list.as_deref(), auto_block).await?,
        Commands::Export { pages, output, run } => handle_export(&pages, &output, &run).await?,
        Commands::Block { input, token, run } => handle_block(&input, token, &run).await?,
    }

    Ok(())
}

fn read_payload(path: &Path) -> Result<Value> {
    let body = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&body).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Controller that aborts on Ctrl-C.
fn interruptible_controller() -> Controller {
    let controller = Controller::new();
    let on_signal = controller.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, finishing current request");
            on_signal.abort();
        }
    });
    controller
}

/// Handle the 'extract' command
fn handle_extract(input: &Path, shape: Shape) -> Result<()> {
    let payload = read_payload(input)?;

    let matches = extract(&payload, |value| match shape {
        Shape::User => is_user_shape(value),
        Shape::Tweet => is_tweet_shape(value),
        Shape::Any => is_user_shape(value) || is_tweet_shape(value),
    });

    println!("{}", format!("{} matches in {}", matches.len(), input.display()).bold().blue());
    for m in &matches {
        let kind = if is_tweet_shape(m.value) { "tweet" } else { "user" };
        let id = m.value.get("rest_id").and_then(Value::as_str).unwrap_or("?");
        println!("{} {} {}", kind.green(), id, m.pointer().dimmed());
    }
    Ok(())
}

/// Handle the 'filter' command
async fn handle_filter(
    input: &Path,
    rules: &Path,
    spam_list: Option<&Path>,
    auto_block: bool,
) -> Result<()> {
    let payload = read_payload(input)?;
    let config_text = std::fs::read_to_string(rules)
        .with_context(|| format!("Failed to read {}", rules.display()))?;
    let config = PipelineConfig::from_json(&config_text).context("Failed to load rules")?;

    let context = config.new_context();
    if let Some(path) = spam_list {
        context.refresh(&FileSnapshotSource::new(path)).await?;
    }

    let mut pipeline = config.build(&context)?;
    let mut worker = None;
    if auto_block {
        let (dispatcher, receiver) =
            ActionDispatcher::channel(RecentWindow::new(1000, Duration::from_secs(600)), 256);
        pipeline = pipeline.on_action(dispatcher);
        let action_worker = ActionWorker::new(
            receiver,
            Arc::new(DryRunBlockApi),
            Arc::new(StaticSigner::new("dry-run")),
            Arc::new(MemoryStore::<UserRecord>::new()),
            Arc::new(MemoryStore::<Activity>::new()),
            interruptible_controller(),
        );
        worker = Some(tokio::spawn(action_worker.run()));
    }

    let start = Instant::now();
    let decisions = pipeline.decide_payload(&payload);

    println!("{}", format!("{} entities in {}", decisions.len(), input.display()).bold().blue());
    for (data, decision) in &decisions {
        let verdict = if decision.value { "show".green() } else { "hide".red() };
        let reason = decision.reason.as_deref().unwrap_or("-");
        let label = match data {
            FilterData::Tweet(tweet) => format!("tweet {} by @{}", tweet.id, tweet.author.screen_name),
            FilterData::User(user) => format!("user {} @{}", user.id, user.screen_name),
        };
        println!("{:>4} {} ({})", verdict, label, reason.dimmed());
    }
    let hidden = decisions.iter().filter(|(_, d)| !d.value).count();
    println!("{} {} hidden, {} shown in {:?}", "✓".green(), hidden, decisions.len() - hidden, start.elapsed());

    // The dispatcher lives in the pipeline; dropping it lets the worker drain and stop
    drop(pipeline);
    if let Some(worker) = worker {
        let stats = worker.await.context("Action worker panicked")?;
        println!(
            "{} {} actions processed, {} blocked, {} failed",
            "✓".green(),
            stats.processed,
            stats.blocked,
            stats.failed
        );
    }
    Ok(())
}

/// Handle the 'export' command
async fn handle_export(pages: &Path, output: &Path, run: &RunOptions) -> Result<()> {
    let users = SharedItems::new();
    let mut pager = DirectoryPager::open(pages, users.clone())?;
    println!("Exporting users from {} page files...", pager.page_count());

    let notifier: Arc<dyn Notifier> = Arc::new(ConsoleNotifier::new(run.yes));
    let chain = run.chain(notifier.clone(), "Exporting");
    let result = BatchQuery::new(interruptible_controller())
        .run(&users, &mut pager, &chain)
        .await?;

    let mut file = std::io::BufWriter::new(
        std::fs::File::create(output)
            .with_context(|| format!("Failed to create {}", output.display()))?,
    );
    for user in users.snapshot() {
        serde_json::to_writer(&mut file, &user)?;
        writeln!(file)?;
    }
    file.flush()?;

    notifier.success(&format!(
        "Exported {} users from {} pages ({} failed) to {}",
        result.items,
        result.pages,
        result.failed,
        output.display()
    ));
    Ok(())
}

/// Handle the 'block' command
async fn handle_block(input: &Path, token: String, run: &RunOptions) -> Result<()> {
    let text = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let users = SharedItems::from(parse_user_list(&text)?);
    println!("Blocking {} accounts...", users.len());

    let api = Arc::new(DryRunBlockApi);
    let signer: Arc<dyn Signer> = Arc::new(StaticSigner::new(token));
    let notifier: Arc<dyn Notifier> = Arc::new(ConsoleNotifier::new(run.yes));
    let chain = run.chain(notifier.clone(), "Blocking");

    let result = BatchExecutor::new(interruptible_controller())
        .run(
            &users,
            |user| {
                let api = api.clone();
                let signer = signer.clone();
                async move { block_user(api.as_ref(), signer.as_ref(), &user).await }
            },
            &chain,
        )
        .await?;

    notifier.success(&format!(
        "Blocked {} of {} accounts ({} failed)",
        result.success, result.total, result.failed
    ));
    Ok(())
}
