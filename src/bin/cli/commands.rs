use live_stomp::StompClient;

use super::state::SharedState;

/// Result of executing a command
pub enum CommandResult {
    /// Command executed successfully
    Ok,
    /// Subscribe to the given destination
    Subscribe(String),
    /// Command requests exit
    Quit,
    /// Error executing command
    Error(String),
}

/// Parse and execute a command
pub async fn execute_command(line: &str, client: &StompClient, state: SharedState) -> CommandResult {
    let parts: Vec<&str> = line.trim().splitn(3, ' ').collect();
    if parts.is_empty() || parts[0].is_empty() {
        return CommandResult::Ok;
    }

    match parts[0] {
        "quit" | "exit" | "q" => CommandResult::Quit,

        "send" => {
            if parts.len() < 3 {
                return CommandResult::Error("Usage: send <destination> <json>".to_string());
            }
            if !client.is_connected() {
                return CommandResult::Error("Not connected; message dropped".to_string());
            }
            client.send(parts[1], parts[2]);
            state.lock().await.record_sent();
            CommandResult::Ok
        }

        "sub" | "subscribe" => {
            if parts.len() < 2 {
                return CommandResult::Error("Usage: sub <destination>".to_string());
            }
            CommandResult::Subscribe(parts[1].to_string())
        }

        "status" => {
            println!("{} ({:?})", client.url(), client.state());
            CommandResult::Ok
        }

        "summary" => {
            println!("{}", state.lock().await.generate_summary());
            CommandResult::Ok
        }

        "help" | "?" => {
            print_help();
            CommandResult::Ok
        }

        _ => CommandResult::Error(format!(
            "Unknown command: {}. Type 'help' for commands.",
            parts[0]
        )),
    }
}

/// Print help text
pub fn print_help() {
    println!("Commands:");
    println!("  send <destination> <json>  - Send a JSON message");
    println!("  sub <destination>          - Subscribe to a destination");
    println!("  status                     - Show connection state");
    println!("  summary                    - Print session summary");
    println!("  quit                       - Disconnect and exit");
}
