use crate::state::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use axum::extract::ws::Utf8Bytes;
use futures::{sink::SinkExt, stream::StreamExt};
use types::ids::ClientId;

/// GET /ws
///
/// No credential check on the real-time channel.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let client_id = ClientId::new();
    let mut outbound = match state.scoring.connect(client_id) {
        Ok(rx) => rx,
        Err(e) => {
            tracing::error!(%client_id, error = %e, "Failed to register websocket client");
            return;
        }
    };

    let (mut sender, mut receiver) = socket.split();

    // Writer: drains this client's bounded queue. The queue closes when the
    // dispatcher detaches the client.
    let mut writer = tokio::spawn(async move {
        while let Some(frame) = outbound.recv().await {
            if sender.send(Message::Text(Utf8Bytes::from(&*frame))).await.is_err() {
                break;
            }
        }
        let _ = sender.close().await;
    });

    loop {
        tokio::select! {
            msg = receiver.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    if let Err(e) = state.scoring.handle_frame(client_id, text.as_str()) {
                        tracing::debug!(%client_id, error = %e, "Rejected client frame");
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!(%client_id, error = %e, "Websocket read error");
                    break;
                }
            },
            _ = &mut writer => break,
        }
    }

    state.scoring.disconnect(client_id);
    writer.abort();
}
