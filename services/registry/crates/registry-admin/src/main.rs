use std::fmt::Write as _;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use charm_common::{AgentRecord, RegistryServerConfig, VersionRecord};
use clap::{Parser, Subcommand};

use charm_registry::store::{RegistryStore, SupabaseStore};

/// Charm registry operator CLI.
///
/// Reads the registry tables directly with the Supabase service-role key.
/// Used for the recovery procedure after a publish failed between the
/// agent write and the version write.
#[derive(Parser, Debug)]
#[command(name = "charm-admin", version)]
struct Cli {
    /// Supabase project URL
    #[arg(long, env = "CHARM_REGISTRY_SUPABASE_URL")]
    supabase_url: String,

    /// Per-request timeout in seconds
    #[arg(long, default_value = "10")]
    timeout_secs: u64,

    /// Service-role key, read from CHARM_REGISTRY_SUPABASE_SERVICE_KEY only.
    /// Never passed as a CLI argument.
    #[arg(skip)]
    service_key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List agents that have no published versions
    Orphans {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show one agent and its versions
    Show {
        /// Agent slug, e.g. code-helper-3f2504e0
        slug: String,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

fn render_orphans(agents: &[AgentRecord]) -> String {
    if agents.is_empty() {
        return "no orphaned agents\n".to_string();
    }
    let mut out = String::new();
    let _ = writeln!(out, "{} orphaned agent(s):", agents.len());
    for agent in agents {
        let _ = writeln!(out, "  {}  {}  owner={}", agent.id, agent.slug, agent.owner_id);
    }
    out.push_str("republish from the owner, or remove the row, to resolve\n");
    out
}

fn render_detail(agent: &AgentRecord, versions: &[VersionRecord]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", agent.name, agent.slug);
    let _ = writeln!(out, "  id:      {}", agent.id);
    let _ = writeln!(out, "  owner:   {}", agent.owner_id);
    let _ = writeln!(out, "  public:  {}", agent.is_public);
    if !agent.description.is_empty() {
        let _ = writeln!(out, "  about:   {}", agent.description);
    }
    if versions.is_empty() {
        out.push_str("  versions: none (orphaned)\n");
        return out;
    }
    out.push_str("  versions:\n");
    for v in versions {
        let _ = writeln!(
            out,
            "    {}  {}@{}  {}",
            v.version, v.branch, v.commit_hash, v.repo_url
        );
    }
    out
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut cli = Cli::parse();

    cli.service_key = std::env::var("CHARM_REGISTRY_SUPABASE_SERVICE_KEY")
        .context("CHARM_REGISTRY_SUPABASE_SERVICE_KEY env var is required")?;

    // Reuse the server's validation so both binaries accept the same values.
    let config = RegistryServerConfig {
        supabase_url: Some(cli.supabase_url.clone()),
        supabase_service_key: Some(cli.service_key.clone()),
        store_timeout_secs: cli.timeout_secs,
        ..RegistryServerConfig::default()
    };
    config.validate()?;
    let creds = config.supabase_credentials()?;
    let store = SupabaseStore::new(&creds, Duration::from_secs(cli.timeout_secs))
        .context("failed to build store client")?;

    match cli.command {
        Commands::Orphans { json } => {
            let agents = store
                .list_orphaned_agents()
                .await
                .context("failed to list orphaned agents")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&agents)?);
            } else {
                print!("{}", render_orphans(&agents));
            }
        }
        Commands::Show { ref slug, json } => {
            let Some(agent) = store
                .find_agent_by_slug(slug)
                .await
                .context("failed to look up agent")?
            else {
                bail!("no agent found with slug '{slug}'");
            };
            let versions = store
                .list_versions(&agent.id)
                .await
                .context("failed to list versions")?;
            if json {
                let detail = charm_common::AgentDetail { agent, versions };
                println!("{}", serde_json::to_string_pretty(&detail)?);
            } else {
                print!("{}", render_detail(&agent, &versions));
            }
        }
    }
    Ok(())
}
