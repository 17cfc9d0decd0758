use crate::lobby::LobbyCommand;
use crate::signaling::SignalingService;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use duet_core::{ClientMessage, ConnectionId, ServerMessage};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub const INVALID_MESSAGE: &str = "Invalid message";

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(service): State<SignalingService>,
) -> impl IntoResponse {
    let connection_id = ConnectionId::new();

    ws.on_upgrade(move |socket| handle_socket(socket, connection_id, service))
}

async fn handle_socket(socket: WebSocket, connection_id: ConnectionId, service: SignalingService) {
    info!(%connection_id, "New WebSocket connection");

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    service.connections().add(connection_id, tx);

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let closing = matches!(msg, Message::Close(_));
            if sender.send(msg).await.is_err() || closing {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let service = service.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => {
                        match serde_json::from_str::<ClientMessage>(text.as_str()) {
                            Ok(message) => {
                                let cmd = LobbyCommand::from_client(connection_id, message);
                                if !service.submit(cmd).await {
                                    break;
                                }
                            }
                            Err(e) => {
                                warn!(%connection_id, "Invalid client message: {}", e);
                                service
                                    .connections()
                                    .send_message(connection_id, &ServerMessage::error(INVALID_MESSAGE));
                            }
                        }
                    }
                    Message::Close(_) => break,
                    _ => debug!(%connection_id, "Ignoring non-text frame"),
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    service.connections().remove(&connection_id);
    service.submit(LobbyCommand::Disconnect { connection_id }).await;
    info!(%connection_id, "WebSocket disconnected");
}
