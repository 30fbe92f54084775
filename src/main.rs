use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use reqwest::Method;
use serde_json::Value;
use tracing::info;

use pcf_outbound::client::{ApiRequest, CallDescriptor, HttpClient, Json, NoContent, provider_from_url};
use pcf_outbound::config::{AppConfig, ConfigArgs, load_config};
use pcf_outbound::logging::{init_subscriber, install_panic_hook};
use pcf_outbound::observability::{ApiType, CallMetadata, MetricsConfig, get_metrics_manager, init_metrics};

#[derive(Parser)]
#[command(name = "pcf-outbound", version, about = "Correlated, redacted calls to external APIs")]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Send one categorized call and print the decoded response
    Call(CallArgs),
    /// Print the effective, validated configuration
    CheckConfig,
}

#[derive(Args)]
struct CallArgs {
    /// Call category, e.g. machine-translation or WEBHOOK
    #[arg(long)]
    category: ApiType,

    #[arg(long)]
    url: String,

    #[arg(long, default_value = "GET")]
    method: Method,

    /// JSON request body
    #[arg(long)]
    data: Option<String>,

    /// Request header as "Name: value", repeatable
    #[arg(long = "header", short = 'H')]
    headers: Vec<String>,

    /// Provider name; derived from the URL host when omitted
    #[arg(long)]
    provider: Option<String>,

    #[arg(long, default_value = "cli_call")]
    operation: String,

    #[arg(long)]
    user_id: Option<i64>,

    #[arg(long)]
    project_id: Option<i64>,

    /// Do not parse the response body
    #[arg(long)]
    no_content: bool,

    /// Print Prometheus metrics after the call
    #[arg(long)]
    print_metrics: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(&cli.config)?;

    if let Err(e) = init_subscriber(&config.logging) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    // After the subscriber, so panics are logged
    install_panic_hook();

    match cli.command {
        Command::CheckConfig => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
        Command::Call(args) => run_call(&config, args).await,
    }
}

async fn run_call(config: &AppConfig, args: CallArgs) -> Result<()> {
    if config.metrics.enabled || args.print_metrics {
        init_metrics(MetricsConfig::from(&config.metrics))?;
    }

    let client = HttpClient::from_config(config)?;

    let mut request: ApiRequest<Value> = ApiRequest::new(args.method, args.url.as_str());
    if let Some(data) = &args.data {
        let body: Value = serde_json::from_str(data).context("--data must be valid JSON")?;
        request = request.with_body(body);
    }
    for header in &args.headers {
        let (name, value) = header
            .split_once(':')
            .with_context(|| format!("Header must be \"Name: value\", got {:?}", header))?;
        request = request.header(name.trim(), value.trim());
    }

    let provider = args.provider.clone().unwrap_or_else(|| provider_from_url(&args.url));
    let metadata = CallMetadata::new(args.category, provider, args.operation.as_str())
        .with_user(args.user_id)
        .with_project(args.project_id);
    let descriptor = CallDescriptor::new(request, metadata);

    info!(category = %args.category, url = %pcf_outbound::logging::sanitize_url(&args.url), "Dispatching call");

    if args.no_content {
        let _: NoContent = client.dispatch_categorized(descriptor).await?;
        println!("{}", serde_json::json!({ "status": "ok" }));
    } else {
        let Json(response): Json<Value> = client.dispatch_categorized(descriptor).await?;
        println!("{}", serde_json::to_string_pretty(&response)?);
    }

    if args.print_metrics {
        let manager = get_metrics_manager()?;
        print!("{}", manager.render());
    }

    Ok(())
}
