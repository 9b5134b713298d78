// Copyright (C) 2025 Adapt ETL contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Pipeline runner: loads a data-ingestion Service config (authorization +
//! client), then a pipeline config, evaluates both against one [`Store`],
//! and runs the resulting [`Pipeline`].

use adapt_core::{CallableRegistry, Config, Evaluator, Item, Pipeline, Service, Store};
use adapt_dsl::{Value, parse_document};
use adapt_serializer::value_literal::literal_value;
use anyhow::{Context, Result, bail};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "adapt", about = "Run an adapt ETL pipeline config against a data-ingestion service")]
struct Args {
    /// Namespace passed to the config locator for both configs.
    #[arg(long)]
    namespace: String,

    /// Config name for the pipeline document (module "pipeline").
    #[arg(long)]
    pipeline_config: String,

    /// Config name for the data-ingestion Service document (module "service").
    #[arg(long)]
    data_ingestion_config: String,

    /// `key=value` pairs written into the authorization config's arguments,
    /// values parsed as literal expressions (so `42`, `true`, `[1,2]` parse
    /// as their typed form, not strings).
    #[arg(long = "auth-data", value_parser = parse_kv)]
    auth_data: Vec<(String, Value)>,

    /// `key=value` pairs written into the Store under `external_input` keys.
    #[arg(long = "external-input", value_parser = parse_kv)]
    external_input: Vec<(String, Value)>,
}

fn parse_kv(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw.split_once('=').ok_or_else(|| format!("expected key=value, got `{raw}`"))?;
    let node = parse_document(value).map_err(|e| format!("invalid literal for `{key}`: {e}"))?;
    Ok((key.to_string(), literal_value(&node)))
}

fn run() -> Result<()> {
    let args = Args::parse();
    let config = Config::from_env().context("loading ADAPT_CONFIGS/ADAPT_LOG")?;
    adapt_core::telemetry::init(&config.log_filter);

    let mut store = Store::from_dict(args.external_input);
    let registry = CallableRegistry::new();
    let evaluator = Evaluator::new(&registry);

    let service_path = adapt_core::locate(&config.configs_dir, "service", &args.namespace, &args.data_ingestion_config)?;
    tracing::info!(path = %service_path.display(), "initializing data-ingestion service");
    let client_result = Service::from_config_path(&service_path, &evaluator, &mut store, &config.configs_dir)
        .context("initializing data-ingestion service")?;
    store.add("client", client_result);

    for (key, value) in args.auth_data {
        store.add(key, value);
    }

    let pipeline_path = adapt_core::locate(&config.configs_dir, "pipeline", &args.namespace, &args.pipeline_config)?;
    let pipeline_node = adapt_core::load(&pipeline_path).context("loading pipeline config")?;

    tracing::info!(path = %pipeline_path.display(), "evaluating pipeline config");
    let descriptors = evaluator.evaluate(&pipeline_node, &mut store)?;

    let mut pipeline = Pipeline::new();
    match &descriptors {
        Value::List(items) => {
            for item in items {
                pipeline.add_item(Item::from_descriptor(item)?)?;
            }
        }
        Value::Map(_) => pipeline.add_item(Item::from_descriptor(&descriptors)?)?,
        other => bail!("pipeline config evaluated to an unexpected shape: {other:?}"),
    }

    let results = pipeline.run(&registry)?;
    for (name, value) in results {
        tracing::info!(step = %name, result = ?value.to_json(), "pipeline step finished");
    }

    Ok(())
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
