use futures::StreamExt;
use live_stomp::{ConnError, ConnectionState, StompClient};
use std::io::{self, Write};
use tokio::io::{AsyncBufReadExt, BufReader};

use super::args::Cli;
use super::commands::{CommandResult, execute_command, print_help};
use super::state::{SharedState, new_shared_state};

/// Run the interactive CLI
pub async fn run(cli: &Cli) -> Result<(), (String, u8)> {
    let endpoint = cli.endpoint();
    println!("Connecting to {}...", endpoint);

    let client = StompClient::with_options(endpoint.clone(), cli.connect_options());
    let state = new_shared_state(endpoint.clone());

    // queued until CONNECTED, then flushed by the client
    for dest in &cli.subscribe {
        subscribe_destination(&client, dest, state.clone()).await;
    }

    client
        .connect()
        .await
        .map_err(|e| format_connection_error(&e, &endpoint))?;

    println!("Connected.");
    println!();
    print_help();
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let result = loop {
        print!("> ");
        let _ = io::stdout().flush();

        let line = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!();
                break Ok(());
            }
            line = lines.next_line() => match line {
                Ok(Some(l)) => l,
                Ok(None) | Err(_) => break Ok(()),
            },
        };

        match execute_command(&line, &client, state.clone()).await {
            CommandResult::Ok => {}
            CommandResult::Subscribe(dest) => {
                subscribe_destination(&client, &dest, state.clone()).await;
            }
            CommandResult::Quit => break Ok(()),
            CommandResult::Error(msg) => eprintln!("{}", msg),
        }

        if client.state() == ConnectionState::Closed {
            break Err((
                format!("Connection to {} closed", endpoint),
                super::exit_codes::NETWORK_ERROR,
            ));
        }
    };

    println!("Disconnecting...");
    if cli.summary {
        println!("{}", state.lock().await.generate_summary());
    }
    client.disconnect();
    result
}

/// Subscribe to a destination and spawn a task printing its messages
async fn subscribe_destination(client: &StompClient, dest: &str, state: SharedState) {
    let mut subscription = client.subscribe_stream(dest);
    state.lock().await.register_subscription(dest);
    println!("Subscribed to: {}", dest);

    tokio::spawn(async move {
        while let Some(message) = subscription.next().await {
            println!(
                "\n[{}] [{}] MESSAGE received:",
                chrono::Local::now().format("%H:%M:%S"),
                message.destination
            );
            for (k, v) in message.headers.iter() {
                println!("  {}: {}", k, v);
            }
            if !message.body.is_empty() {
                println!("  Body: {}", message.body);
            }
            print!("> ");
            let _ = io::stdout().flush();

            state
                .lock()
                .await
                .record_message(&message.destination, message.body, message.headers);
        }
    });
}

/// Format a connection error with user-friendly messaging
fn format_connection_error(err: &ConnError, endpoint: &str) -> (String, u8) {
    match err {
        ConnError::TransportOpen(reason) => (
            format!("Connection failed: {} ({})", endpoint, reason),
            super::exit_codes::NETWORK_ERROR,
        ),
        ConnError::ClosedBeforeConnected => (
            format!("Protocol error: {} closed before CONNECTED", endpoint),
            super::exit_codes::PROTOCOL_ERROR,
        ),
    }
}
