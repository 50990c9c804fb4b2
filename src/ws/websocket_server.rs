use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::protocol::Message;

/// Control frames the widget sends, tagged by a `type` field:
/// `{"type":"set_durations","work_minutes":25,"break_minutes":5}` and so on.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlMessage {
    Start,
    Pause,
    Reset,
    SetDurations { work_minutes: u32, break_minutes: u32 },
    ToggleTheme,
    AmbientChanged { prefers_dark: bool },
}

/// Per-frame acknowledgement sent back to the submitting client.
#[derive(Debug, Serialize)]
pub struct WebSocketResponse {
    pub success: bool,
    pub message: Option<String>,
}

/// Full UI snapshot pushed to every connected client. The widget renders
/// this verbatim: clock text, status label, button enabled flags, accent
/// colors and the applied theme are all decided daemon-side.
#[derive(Debug, Serialize, Clone)]
pub struct StateUpdate {
    pub display: String,
    pub phase: String,
    pub status_label: String,
    pub running: bool,
    pub completed_sessions: u32,
    pub start_enabled: bool,
    pub pause_enabled: bool,
    pub reset_enabled: bool,
    pub primary_color: String,
    pub secondary_color: String,
    pub theme: String,
    /// Set on the snapshot a theme toggle produced; the widget animates the
    /// restyle and drops its transition class after 300ms.
    pub theme_transition: bool,
    /// Set on the snapshot an interval completion produced.
    pub chime: bool,
}

pub type ControlSender = mpsc::UnboundedSender<ControlMessage>;
pub type ControlReceiver = mpsc::UnboundedReceiver<ControlMessage>;

pub fn create_control_channel() -> (ControlSender, ControlReceiver) {
    mpsc::unbounded_channel()
}

pub async fn start_websocket_server(
    addr: SocketAddr,
    control_tx: ControlSender,
    updates: watch::Receiver<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let listener = TcpListener::bind(&addr).await?;
    println!("WebSocket server listening on: {}", addr);

    while let Ok((stream, peer_addr)) = listener.accept().await {
        println!("New WebSocket connection from: {}", peer_addr);
        let tx = control_tx.clone();
        let rx = updates.clone();
        tokio::spawn(handle_connection(stream, peer_addr, tx, rx));
    }

    Ok(())
}

async fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    control_tx: ControlSender,
    mut updates: watch::Receiver<String>,
) {
    let ws_stream = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            eprintln!("WebSocket handshake failed with {}: {}", peer_addr, e);
            return;
        }
    };

    println!("WebSocket handshake completed with {}", peer_addr);

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    // Every client starts from the current snapshot, then gets pushed each
    // change; inbound control frames are handled in the same loop.
    let snapshot = updates.borrow_and_update().clone();
    if let Err(e) = ws_sender.send(Message::Text(snapshot)).await {
        eprintln!("Failed to send initial state to {}: {}", peer_addr, e);
        return;
    }

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break; // daemon shut down
                }
                let update = updates.borrow_and_update().clone();
                if let Err(e) = ws_sender.send(Message::Text(update)).await {
                    eprintln!("Failed to push state to {}: {}", peer_addr, e);
                    break;
                }
            }
            incoming = ws_receiver.next() => {
                let Some(msg) = incoming else { break };
                match msg {
                    Ok(Message::Text(text)) => {
                        match serde_json::from_str::<ControlMessage>(&text) {
                            Ok(control) => {
                                if let Err(e) = control_tx.send(control) {
                                    eprintln!("Failed to forward control message: {}", e);
                                }

                                let response = WebSocketResponse {
                                    success: true,
                                    message: Some("Message received".to_string()),
                                };
                                if let Ok(response_json) = serde_json::to_string(&response) {
                                    if let Err(e) =
                                        ws_sender.send(Message::Text(response_json)).await
                                    {
                                        eprintln!("Failed to send WebSocket response: {}", e);
                                        break;
                                    }
                                }
                            }
                            Err(e) => {
                                eprintln!("Failed to parse control message: {}", e);
                                let response = WebSocketResponse {
                                    success: false,
                                    message: Some(format!("Parse error: {}", e)),
                                };
                                if let Ok(response_json) = serde_json::to_string(&response) {
                                    let _ = ws_sender.send(Message::Text(response_json)).await;
                                }
                            }
                        }
                    }
                    Ok(Message::Close(_)) => {
                        println!("WebSocket connection closed by {}", peer_addr);
                        break;
                    }
                    Ok(Message::Ping(data)) => {
                        if let Err(e) = ws_sender.send(Message::Pong(data)).await {
                            eprintln!("Failed to send pong: {}", e);
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        eprintln!("WebSocket error from {}: {}", peer_addr, e);
                        break;
                    }
                }
            }
        }
    }

    println!("WebSocket connection with {} terminated", peer_addr);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_messages_parse() {
        let start: ControlMessage = serde_json::from_str(r#"{"type":"start"}"#).unwrap();
        assert_eq!(start, ControlMessage::Start);

        let pause: ControlMessage = serde_json::from_str(r#"{"type":"pause"}"#).unwrap();
        assert_eq!(pause, ControlMessage::Pause);

        let reset: ControlMessage = serde_json::from_str(r#"{"type":"reset"}"#).unwrap();
        assert_eq!(reset, ControlMessage::Reset);

        let durations: ControlMessage = serde_json::from_str(
            r#"{"type":"set_durations","work_minutes":10,"break_minutes":3}"#,
        )
        .unwrap();
        assert_eq!(
            durations,
            ControlMessage::SetDurations {
                work_minutes: 10,
                break_minutes: 3
            }
        );

        let toggle: ControlMessage = serde_json::from_str(r#"{"type":"toggle_theme"}"#).unwrap();
        assert_eq!(toggle, ControlMessage::ToggleTheme);

        let ambient: ControlMessage =
            serde_json::from_str(r#"{"type":"ambient_changed","prefers_dark":true}"#).unwrap();
        assert_eq!(
            ambient,
            ControlMessage::AmbientChanged { prefers_dark: true }
        );
    }

    #[test]
    fn test_unknown_control_type_is_rejected() {
        assert!(serde_json::from_str::<ControlMessage>(r#"{"type":"explode"}"#).is_err());
        assert!(serde_json::from_str::<ControlMessage>(r#"{"type":"set_durations"}"#).is_err());
    }

    #[test]
    fn test_response_serialization() {
        let response = WebSocketResponse {
            success: true,
            message: Some("Test message".to_string()),
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"success\":true"));
        assert!(json.contains("\"message\":\"Test message\""));
    }

    #[test]
    fn test_state_update_serialization() {
        let update = StateUpdate {
            display: "25:00".to_string(),
            phase: "work".to_string(),
            status_label: "Work time".to_string(),
            running: false,
            completed_sessions: 0,
            start_enabled: true,
            pause_enabled: false,
            reset_enabled: true,
            primary_color: "#6a11cb".to_string(),
            secondary_color: "#2575fc".to_string(),
            theme: "light".to_string(),
            theme_transition: false,
            chime: false,
        };
        let json = serde_json::to_string(&update).unwrap();
        assert!(json.contains("\"display\":\"25:00\""));
        assert!(json.contains("\"phase\":\"work\""));
        assert!(json.contains("\"theme\":\"light\""));
        assert!(json.contains("\"chime\":false"));
    }
}
