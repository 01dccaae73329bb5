use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod diagnostics;
mod graph;
mod inventory;
mod proxmox;
mod render;
mod server;
mod store;

pub type Result<T> = anyhow::Result<T>;

#[derive(Parser)]
#[command(name = "pve-topology")]
#[command(about = "Proxmox VE cluster topology discovery", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover the cluster once and write a graph snapshot.
    Sync {
        /// Proxmox host, e.g. https://pve:8006
        #[arg(long, env = "PVE_HOST")]
        host: String,

        #[arg(long, env = "PVE_USER", default_value = "root@pam")]
        user: String,

        #[arg(long, env = "PVE_PASSWORD", hide_env_values = true)]
        pass: String,

        /// Ignore TLS certificate errors.
        #[arg(long)]
        insecure: bool,

        #[arg(short = 'o', long, visible_alias = "file", default_value = "data/graph.json")]
        out: PathBuf,

        /// Entity types to leave out, e.g. `disk,nic`.
        #[arg(long, default_value = "")]
        ignore: String,

        #[arg(short = 'v', long)]
        verbose: bool,
    },

    /// Serve snapshots (/api/graph, /api/files) and a static viewer.
    Serve {
        #[arg(long, default_value = "0.0.0.0:8080")]
        listen: String,

        #[arg(long = "data", default_value = "data")]
        data_dir: PathBuf,

        #[arg(long, default_value = "frontend/public")]
        static_dir: PathBuf,
    },

    /// Render a snapshot as a standalone HTML page.
    Render {
        #[arg(long, default_value = "data/graph.json")]
        graph: PathBuf,

        #[arg(short = 'o', long)]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.cmd {
        Commands::Sync {
            host,
            user,
            pass,
            insecure,
            out,
            ignore,
            verbose,
        } => {
            diagnostics::init_tracing(verbose);

            // 1) Session ticket; nothing can be fetched without it.
            let client = proxmox::ProxmoxClient::login(&proxmox::Credentials {
                host,
                user,
                password: pass,
                insecure,
            })?;

            // 2) One discovery pass. Per-category failures are reported, not fatal.
            let filter = graph::ExclusionFilter::parse(&ignore);
            for tag in filter.unknown_tags() {
                tracing::warn!("--ignore {:?} matches no entity type", tag);
            }
            if !filter.is_empty() {
                tracing::info!("ignoring {}", ignore);
            }
            let reporter = diagnostics::Tracing;
            let graph = graph::Assembler::new(filter)
                .with_reporter(&reporter)
                .run(&client);

            // 3) Persist.
            store::save_graph(&out, &graph)?;
            tracing::info!(
                nodes = graph.nodes.len(),
                links = graph.links.len(),
                "wrote {}",
                out.display()
            );
        }
        Commands::Serve {
            listen,
            data_dir,
            static_dir,
        } => {
            diagnostics::init_tracing(true);
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(server::serve(server::ServerConfig {
                listen,
                data_dir,
                static_dir,
            }))?;
        }
        Commands::Render { graph, out } => {
            let snapshot = store::read_graph(&graph)?;
            let html = render::render_html(&snapshot)?;
            std::fs::write(&out, html)?;
            println!("Wrote {}", out.display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn sync_flags_parse() {
        let cli = Cli::try_parse_from([
            "pve-topology",
            "sync",
            "--host",
            "https://pve:8006",
            "--pass",
            "secret",
            "--file",
            "out/lab.json",
            "--ignore",
            "disk,NIC",
        ])
        .unwrap();
        let Commands::Sync {
            user, out, ignore, ..
        } = cli.cmd
        else {
            panic!("expected sync");
        };
        assert_eq!(user, "root@pam");
        assert_eq!(out, PathBuf::from("out/lab.json"));
        let filter = graph::ExclusionFilter::parse(&ignore);
        assert!(filter.excludes(graph::EntityKind::Nic));
        assert!(filter.excludes(graph::EntityKind::Disk));
    }
}
