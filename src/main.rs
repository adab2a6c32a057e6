use std::env;

use dailyspend::csv::{read_commands, write_budgets};
use dailyspend::{JsonFileStore, Session};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut args = env::args().skip(1);
    let usage = "usage: dailyspend <snapshot.json> <commands.csv>";
    let snapshot_path = args.next().expect(usage);
    let commands_path = args.next().expect(usage);

    let mut session = match Session::open(JsonFileStore::new(&snapshot_path)) {
        Ok(session) => session,
        Err(e) => {
            error!(path = snapshot_path, "failed to load session: {e}");
            std::process::exit(1);
        }
    };
    if session.current_budget().is_none() {
        warn!(path = snapshot_path, "no active daily budget, spends will be ignored");
    }

    let commands = match read_commands(commands_path) {
        Ok(commands) => commands,
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };

    let (cmd_sender, cmd_receiver) = tokio::sync::mpsc::channel(16);

    tokio::spawn(async move {
        for result in commands {
            match result {
                Ok(command) => {
                    if cmd_sender.send(command).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("{e}");
                }
            }
        }
    });

    session.run(ReceiverStream::new(cmd_receiver)).await;

    // oldest first, then the open day
    let budgets = session
        .history()
        .iter()
        .rev()
        .chain(session.current_budget());
    if let Err(e) = write_budgets(budgets, std::io::stdout().lock()) {
        error!("failed to write budgets: {e}");
        std::process::exit(1);
    }
}
