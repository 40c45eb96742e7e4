//! `tribuna ask` — Run one chat turn and print the streamed answer.

use std::io::Write;
use std::path::Path;

use tribuna_agent::StreamEvent;
use tribuna_gateway::AppState;

pub async fn run(config_path: Option<&Path>, message: String) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let state = AppState::from_config(config)?;

    let mut rx = state.streamer.stream(message, Vec::new());
    let mut stdout = std::io::stdout();

    while let Some(event) = rx.recv().await {
        match event {
            StreamEvent::Text { content } => {
                print!("{content}");
                stdout.flush()?;
            }
            StreamEvent::Done => {
                println!();
                break;
            }
            StreamEvent::Error { message } => {
                println!();
                return Err(format!("Chat failed: {message}").into());
            }
        }
    }

    Ok(())
}
