//! Certifies the fixture plugins at every conformance level.
//!
//! Each plugin is bound to a fresh in-process transport, the advanced battery
//! runs against it, and the plain-text report is printed. Pass `--json` to
//! print the machine-readable result instead.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example conformance_report
//! cargo run --example conformance_report -- --json
//! ```

use anyhow::Result;
use chrono::Utc;
use costsource_conformance::{ConformanceConfig, ConformanceRunner, PluginEndpoint};
use costsource_core::traits::CostSourcePlugin;
use costsource_examples::fixtures;
use costsource_examples::logging::{LogFormat, init_logging};
use std::process::ExitCode;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let json = std::env::args().any(|arg| arg == "--json");
    init_logging(false, LogFormat::Pretty)?;

    let plugins: Vec<Arc<dyn CostSourcePlugin>> = vec![
        Arc::new(fixtures::billing_export(Utc::now())),
        Arc::new(fixtures::public_pricing()),
    ];

    let runner = ConformanceRunner::new(ConformanceConfig::default());
    let mut all_passed = true;

    for plugin in plugins {
        let result = runner.run_advanced(&PluginEndpoint::in_process(plugin)).await;
        all_passed &= result.is_success();
        tracing::info!(
            plugin = result.plugin_name.as_deref().unwrap_or("<unknown>"),
            level = ?result.level_achieved(),
            "Certification finished"
        );

        if json {
            println!("{}", result.to_json()?);
        } else {
            println!("{}", result.render_report());
        }
    }

    Ok(if all_passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
