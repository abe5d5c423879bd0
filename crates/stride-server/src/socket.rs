//! WebSocket handler for the realtime channel.
//!
//! Each connection gets an unbounded outbound queue registered with the room
//! registry; a send task drains the queue to the socket while a receive task
//! parses and dispatches client events. Failures while handling an event are
//! acknowledged with an error event on the originating connection only.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use stride_realtime::{Broadcaster, ClientEvent, ConnId, RoomKey, ServerEvent};
use stride_store::StrideResult;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::state::AppState;

/// WebSocket upgrade handler.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Handle an individual WebSocket connection.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let conn_id = ConnId::new();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();
    state.registry.register(&conn_id, tx.clone());
    info!(
        conn = %conn_id,
        connections = state.registry.connection_count(),
        "websocket client connected"
    );

    let (mut sender, mut receiver) = socket.split();

    // Drain the outbound queue to the socket.
    let mut send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(e) => {
                    warn!(error = %e, "failed to encode event, dropping");
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                debug!("websocket send failed, client disconnected");
                break;
            }
        }
    });

    // Parse and dispatch inbound events.
    let recv_state = state.clone();
    let recv_conn = conn_id.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => match serde_json::from_str::<ClientEvent>(&text) {
                    Ok(event) => {
                        if let Err(e) = dispatch(&recv_state, &recv_conn, event).await {
                            warn!(conn = %recv_conn, error = %e, "client event failed");
                            let _ = tx.send(ServerEvent::Error {
                                message: e.to_string(),
                            });
                        }
                    }
                    Err(e) => {
                        debug!(conn = %recv_conn, error = %e, "unparseable client event");
                        let _ = tx.send(ServerEvent::Error {
                            message: format!("unrecognized event: {e}"),
                        });
                    }
                },
                Message::Close(_) => {
                    debug!(conn = %recv_conn, "websocket client sent close frame");
                    break;
                }
                _ => {}
            }
        }
    });

    // Whichever task finishes first takes the other down with it.
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    state.registry.unsubscribe_all(&conn_id);
    info!(conn = %conn_id, "websocket client disconnected");
}

/// Route a client event to the service that owns it.
async fn dispatch(state: &AppState, conn: &ConnId, event: ClientEvent) -> StrideResult<()> {
    match event {
        ClientEvent::JoinUserRoom { id } => {
            state.registry.subscribe(conn, RoomKey::user(&id));
            Ok(())
        }
        ClientEvent::JoinProjectRoom { id } => {
            state.registry.subscribe(conn, RoomKey::project(&id));
            Ok(())
        }
        ClientEvent::JoinTaskRoom { id } => {
            state.registry.subscribe(conn, RoomKey::task(&id));
            Ok(())
        }
        ClientEvent::JoinChatRoom { room_id } => {
            state.chat.join(conn, &room_id);
            Ok(())
        }
        ClientEvent::LeaveChatRoom { room_id } => {
            state.chat.leave(conn, &room_id);
            Ok(())
        }
        ClientEvent::SendMessage(payload) => {
            state.chat.send_message(payload).await.map(|_| ())
        }
        ClientEvent::DeleteMessage {
            room_id,
            message_id,
        } => state
            .chat
            .delete_message(&room_id, &message_id)
            .await
            .map(|_| ()),
        ClientEvent::Typing {
            room_id,
            user_id,
            user_name,
        } => {
            state.chat.typing(conn, &room_id, &user_id, &user_name);
            Ok(())
        }
        ClientEvent::StopTyping { room_id, user_id } => {
            state.chat.stop_typing(conn, &room_id, &user_id);
            Ok(())
        }
        ClientEvent::MarkRead { notification_id } => state
            .notifications
            .mark_read(&notification_id)
            .await
            .map(|_| ()),
        ClientEvent::MarkAllRead { user_id } => state
            .notifications
            .mark_all_read(&user_id)
            .await
            .map(|_| ()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use stride_realtime::SendMessagePayload;
    use stride_store::{FsBlobStore, MemoryStore};
    use tempfile::TempDir;

    async fn test_state() -> (AppState, TempDir) {
        let dir = TempDir::new().unwrap();
        let blobs = FsBlobStore::new(dir.path().to_path_buf(), 1024 * 1024)
            .await
            .unwrap();
        let state = AppState::new(Arc::new(MemoryStore::new()), Arc::new(blobs));
        (state, dir)
    }

    fn text_payload(room_id: &str, body: &str) -> SendMessagePayload {
        SendMessagePayload {
            room_id: room_id.to_string(),
            sender_id: "u1".to_string(),
            sender_name: "Uma".to_string(),
            sender_role: "member".to_string(),
            sender_avatar_url: None,
            message: Some(body.to_string()),
            file: None,
        }
    }

    #[tokio::test]
    async fn join_events_subscribe_the_connection() {
        let (state, _dir) = test_state().await;
        let conn = ConnId::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        state.registry.register(&conn, tx);

        dispatch(&state, &conn, ClientEvent::JoinUserRoom { id: "u1".into() })
            .await
            .unwrap();
        dispatch(
            &state,
            &conn,
            ClientEvent::JoinChatRoom {
                room_id: "r1".into(),
            },
        )
        .await
        .unwrap();

        assert_eq!(state.registry.room_size(&RoomKey::user("u1")), 1);
        assert_eq!(state.registry.room_size(&RoomKey::chat("r1")), 1);

        dispatch(
            &state,
            &conn,
            ClientEvent::LeaveChatRoom {
                room_id: "r1".into(),
            },
        )
        .await
        .unwrap();
        assert_eq!(state.registry.room_size(&RoomKey::chat("r1")), 0);
    }

    #[tokio::test]
    async fn sent_messages_reach_chat_room_subscribers() {
        let (state, _dir) = test_state().await;
        let room = state.chat.room_for_project("p1").await.unwrap();

        let conn = ConnId::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        state.registry.register(&conn, tx);
        dispatch(
            &state,
            &conn,
            ClientEvent::JoinChatRoom {
                room_id: room.id.clone(),
            },
        )
        .await
        .unwrap();

        dispatch(
            &state,
            &conn,
            ClientEvent::SendMessage(text_payload(&room.id, "standup in five")),
        )
        .await
        .unwrap();

        match rx.try_recv().unwrap() {
            ServerEvent::NewMessage(msg) => assert_eq!(msg.message, "standup in five"),
            other => panic!("expected new_message, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn failed_events_surface_as_errors_not_panics() {
        let (state, _dir) = test_state().await;
        let conn = ConnId::new();

        let err = dispatch(
            &state,
            &conn,
            ClientEvent::SendMessage(text_payload("no-such-room", "hello")),
        )
        .await
        .unwrap_err();
        assert!(err.is_not_found());

        let err = dispatch(
            &state,
            &conn,
            ClientEvent::MarkRead {
                notification_id: "ghost".into(),
            },
        )
        .await
        .unwrap_err();
        assert!(err.is_not_found());
    }
}
