// Copyright 2024 RustFS Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use clap::{Parser, Subcommand};
use garage_configurator::config::DEFAULT_CONFIG_PATH;
use garage_configurator::{ExecutionMode, print_config, run};
use shadow_rs::shadow;
use std::path::PathBuf;

shadow!(build);

#[derive(Parser)]
#[command(name = "garage-configurator")]
#[command(version = build::PKG_VERSION)]
#[command(about = "Bootstraps a Garage cluster running on Kubernetes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Wait for Garage, apply the layout and provision buckets and keys
    Run {
        /// Path of the cluster configuration (JSON, or YAML by extension)
        #[arg(short, long, env = "CONFIGURATOR_JSON", default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,

        #[arg(long, env = "EXECUTION_MODE", value_enum, default_value_t = ExecutionMode::Testing)]
        execution_mode: ExecutionMode,

        /// Bearer token of the Garage admin API
        #[arg(long, env = "GARAGE_ADMIN_TOKEN", hide_env_values = true)]
        admin_token: String,
    },

    /// Output the effective configuration in YAML
    Config {
        #[arg(short, long, env = "CONFIGURATOR_JSON", default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,

        /// Optional output path. If not set, the output will be written to stdout.
        #[arg(short, long)]
        file: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            execution_mode,
            admin_token,
        } => run(&config, execution_mode, admin_token).await?,
        Commands::Config { config, file } => print_config(&config, file).await?,
    }

    Ok(())
}
