use std::io::Write;
use std::sync::{Arc, RwLock};

use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::core::AppConfig;
use crate::locale::Locale;
use crate::session::{FileStorage, Role, SessionStore, SharedStore, StoreEvent};
use crate::vllm::{ChatClient, ModelResolver};

pub async fn run() -> Result<()> {
    let config = AppConfig::default();
    let locale = Locale::from_tag(&config.locale);

    let mut store = SessionStore::new(
        Box::new(FileStorage::new(&config.storage_path)),
        Box::new(locale),
    );

    // Print assistant output as it arrives: streamed responses come
    // in as appended fragments, while error and warning texts land as
    // complete assistant messages.
    store.subscribe(Box::new(|event| match event {
        StoreEvent::MessageAppended { fragment, .. } => {
            print!("{}", fragment);
            let _ = std::io::stdout().flush();
        }
        StoreEvent::MessageAdded {
            role: Role::Assistant,
            content,
            ..
        } if !content.is_empty() => {
            println!("{}", content);
        }
        _ => {}
    }));
    let store: SharedStore = Arc::new(RwLock::new(store));

    let client = ChatClient::new(&config.vllm_api_url, locale);
    let resolver = ModelResolver::new(&config.vllm_api_url);
    match resolver.resolve().await {
        Ok(model) => println!("Connected to {} ({})", config.vllm_api_url, model),
        Err(e) => eprintln!(
            "Warning: no model resolved yet ({}). Will retry on the next message.",
            e
        ),
    }

    println!("Type a message, or /new /list /switch /rename /clear /delete to manage sessions.");

    let mut rl = DefaultEditor::new().expect("Editor failed");

    loop {
        let readline = rl.readline(">>> ");
        match readline {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if let Some(command) = line.strip_prefix('/') {
                    handle_command(&store, command);
                    continue;
                }

                // The backend may have come up since the last attempt
                if resolver.current().is_none() {
                    let _ = resolver.resolve().await;
                }

                client
                    .send_message(&store, resolver.current().as_deref(), line)
                    .await?;
                println!();
            }
            Err(ReadlineError::Interrupted) => break,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }

    Ok(())
}

fn handle_command(store: &SharedStore, command: &str) {
    let mut store = store.write().expect("Unable to write session store");
    let (name, arg) = command.split_once(' ').unwrap_or((command, ""));

    match name {
        "new" => {
            let id = store.create_session();
            println!("Switched to session {}", id);
        }
        "list" => {
            let current = store.current_session_id().map(str::to_string);
            for session in store.sessions() {
                let marker = if Some(&session.id) == current.as_ref() {
                    "*"
                } else {
                    " "
                };
                println!(
                    "{} {}  {} ({} messages)",
                    marker,
                    session.id,
                    session.title,
                    session.messages.len()
                );
            }
        }
        "switch" => {
            if arg.is_empty() {
                println!("Usage: /switch <session-id>");
            } else {
                store.switch_session(arg);
            }
        }
        "rename" => {
            // The store accepts any title; rejecting empty ones is on us
            let title = arg.trim();
            if title.is_empty() {
                println!("Usage: /rename <title>");
            } else if let Some(id) = store.current_session_id().map(str::to_string) {
                store.rename_session(&id, title);
            } else {
                println!("No session to rename");
            }
        }
        "clear" => store.clear_session(),
        "delete" => {
            if let Some(id) = store.current_session_id().map(str::to_string) {
                store.delete_session(&id);
            } else {
                println!("No session to delete");
            }
        }
        _ => println!("Unknown command: /{}", name),
    }
}
