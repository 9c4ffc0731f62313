//! Plans, and optionally runs, auto search for one recorded turn.

use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use color_eyre::eyre;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use sift_domain::{message::Message, result::ReferenceContext};
use sift_service::{
	AssistantCache, ExecutionMode, Providers, SearchPlan, SiftService, Turn, inject_references,
};

#[derive(Debug, Parser)]
#[command(
	version = sift_cli::VERSION,
	rename_all = "kebab",
	styles = sift_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	/// JSON-encoded turn: assistant id, messages, options, hook response and authorization.
	#[arg(long, short = 't', value_name = "FILE")]
	pub turn: PathBuf,
	/// Dispatch the planned requests and print the augmented messages.
	#[arg(long)]
	pub execute: bool,
}

#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Report {
	Plan { plan: Option<SearchPlan> },
	Augmented { references: Option<ReferenceContext>, messages: Vec<Message> },
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = sift_config::load(&args.config)?;
	let filter = EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

	let raw = tokio::fs::read_to_string(&args.turn).await?;
	let turn: Turn = serde_json::from_str(&raw)
		.map_err(|err| eyre::eyre!("Failed to parse turn {}: {err}.", args.turn.display()))?;
	let providers = Providers::from_config(&config);
	let assistants = Arc::new(AssistantCache::new(config.cache.assistants_capacity));
	let service = SiftService::new(config, providers, assistants);
	let report = report(&service, &turn, args.execute).await?;

	println!("{}", serde_json::to_string_pretty(&report)?);

	Ok(())
}

/// Headless run of `turn`. Only planning errors surface; execution degrades to no references.
pub async fn report(service: &SiftService, turn: &Turn, execute: bool) -> color_eyre::Result<Report> {
	if !execute {
		let plan = service.plan(turn, ExecutionMode::HEADLESS).await?;

		return Ok(Report::Plan { plan });
	}

	let references = service.run_auto_search(turn, ExecutionMode::HEADLESS).await;
	let mut messages = turn.messages.clone();

	inject_references(&mut messages, references.as_ref());

	tracing::info!(
		assistant_id = %turn.assistant_id,
		references = references.as_ref().map(|context| context.references.len()).unwrap_or(0),
		"Turn augmented."
	);

	Ok(Report::Augmented { references, messages })
}
