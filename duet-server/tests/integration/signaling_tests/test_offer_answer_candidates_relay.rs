use duet_core::{CandidateRole, ServerMessage};
use duet_server::LobbyCommand;
use duet_server::lobby::RelaySignal;
use serde_json::json;

use crate::integration::{create_test_lobby, init_tracing};
use crate::utils::{MESSAGE_TIMEOUT_MS, join_pair};

#[tokio::test]
async fn test_offer_answer_candidates_relay() {
    init_tracing();

    let lobby = create_test_lobby();
    let (ada, bob, room) = join_pair(&lobby.cmd_tx, &lobby.signaling, "Ada", "Bob")
        .await
        .expect("Pairing failed");

    let offer = json!({ "type": "offer", "sdp": "v=0\r\no=- 1 1 IN IP4 0.0.0.0" });
    let answer = json!({ "type": "answer", "sdp": "v=0\r\no=- 2 2 IN IP4 0.0.0.0" });
    let candidate = json!({ "candidate": "candidate:1 1 UDP 2122252543 192.0.2.7 54321 typ host", "sdpMid": "0" });

    let commands = [
        LobbyCommand::Signal {
            connection_id: ada,
            session_id: room,
            signal: RelaySignal::Offer { sdp: offer.clone() },
        },
        LobbyCommand::Signal {
            connection_id: bob,
            session_id: room,
            signal: RelaySignal::Answer { sdp: answer.clone() },
        },
        LobbyCommand::Signal {
            connection_id: ada,
            session_id: room,
            signal: RelaySignal::IceCandidate {
                candidate: candidate.clone(),
                role: CandidateRole::Initiator,
            },
        },
    ];
    for cmd in commands {
        lobby.cmd_tx.send(cmd).await.expect("Signal failed");
    }

    assert!(
        lobby
            .signaling
            .wait_for_count(&bob, 4, MESSAGE_TIMEOUT_MS)
            .await
    );
    assert!(
        lobby
            .signaling
            .wait_for_count(&ada, 3, MESSAGE_TIMEOUT_MS)
            .await
    );

    let to_bob = lobby.signaling.messages_for(&bob).await;
    assert_eq!(
        to_bob[2..],
        [
            ServerMessage::Offer {
                sdp: offer,
                room_id: room
            },
            ServerMessage::AddIceCandidate {
                candidate,
                room_id: room,
                role: CandidateRole::Initiator,
            },
        ]
    );

    let to_ada = lobby.signaling.messages_for(&ada).await;
    assert_eq!(
        to_ada[2],
        ServerMessage::Answer {
            sdp: answer,
            room_id: room
        }
    );
}
