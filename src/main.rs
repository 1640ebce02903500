use std::io::{self, BufRead, Write};

use anyhow::Result;
use log::info;

use datachat_client::config::Config;
use datachat_client::dom::{Document, MountPoint, ScriptElement, ScriptHost};
use datachat_client::models::message::{ChatMessage, MessageBody, Role};
use datachat_client::services::{ChatController, HttpBackendClient};

const CHART_MOUNT: &str = "chart-content";

/// Script host for the terminal: there is no JS engine here, so execution
/// means logging what a browser would have run.
struct LoggingScriptHost;

impl ScriptHost for LoggingScriptHost {
    fn execute(&mut self, script: &ScriptElement, _mount: &MountPoint) -> Result<()> {
        match script.src() {
            Some(src) => info!("📜 Would load external script: {}", src),
            None => info!("📜 Would run inline script ({} bytes)", script.code.len()),
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Load configuration from environment variables
    let config = Config::from_env();
    log::info!("🚀 Starting data chat client against {}", config.backend_url);

    let backend = HttpBackendClient::new(&config)?;
    let mut controller = ChatController::new(backend);

    let mut doc = Document::new();
    doc.create_mount(CHART_MOUNT);
    let mut host = LoggingScriptHost;

    println!("Ask a question about your data. Commands: /chat <msg>, /viz, /clear, /quit");

    let stdin = io::stdin();
    let mut printed = 0;
    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();

        match input {
            "/quit" => break,
            "/clear" => {
                controller.clear_transcript();
                printed = 0;
                println!("(transcript cleared)");
            }
            "/viz" => match controller.last_visualizable_result() {
                Some(id) => {
                    // a failed visualization never ends the session
                    match controller
                        .request_visualization(id, &mut doc, CHART_MOUNT, &mut host)
                        .await
                    {
                        Ok(()) => {
                            if let Some(mount) = doc.mount(CHART_MOUNT) {
                                println!("{}", mount.markup());
                            }
                        }
                        Err(err) => println!("(visualization failed: {})", err),
                    }
                }
                None => println!("(no visualizable result in the transcript)"),
            },
            other => {
                if let Some(message) = other.strip_prefix("/chat ") {
                    controller.stream_chat(message).await;
                } else {
                    controller.submit(other).await;
                }
            }
        }

        for message in &controller.transcript().messages()[printed..] {
            print_message(message);
        }
        printed = controller.transcript().len();
    }

    log::info!("👋 Session ended");
    Ok(())
}

fn print_message(message: &ChatMessage) {
    let tag = match message.role {
        Role::User => "you",
        Role::Bot => "bot",
        Role::Error => "err",
    };
    match &message.body {
        MessageBody::Text(text) | MessageBody::Info(text) => {
            println!("[{}] {}", tag, text);
        }
        MessageBody::GeneratedQuery(sql) => {
            println!("[{}] generated query:\n{}", tag, sql);
        }
        MessageBody::Results { table, .. } => {
            println!("[{}]\n{}", tag, table);
        }
    }
}
