use super::*;

use std::time::Duration;

use bytes::BytesMut;
use classic_proto::auth::verification_key;
use classic_proto::packets::player::SELF_ID;
use classic_proto::packets::{DespawnPlayer, LevelDataChunk, PROTOCOL_VERSION};
use classic_proto::ServerPacket;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use crate::config::ServerConfig;
use crate::server::tests::{connect, read_packet, small_config, test_state};

fn identification(name: &str, key: &str) -> Bytes {
    ClientPacket::Identification(PlayerIdentification {
        protocol_version: PROTOCOL_VERSION,
        username: name.into(),
        verification_key: key.into(),
        reserved: 0,
    })
    .encode()
}

fn valid_identification(name: &str) -> Bytes {
    identification(name, &verification_key("testsalt", name))
}

fn chat(text: &str) -> Bytes {
    ClientPacket::Message(Message {
        player_id: 0xFF,
        text: text.into(),
    })
    .encode()
}

/// Read packets until one matches, returning everything read.
async fn read_until(
    client: &mut TcpStream,
    pred: impl Fn(&ServerPacket) -> bool,
) -> Vec<ServerPacket> {
    let mut seen = Vec::new();
    loop {
        let packet = read_packet(client).await;
        let done = pred(&packet);
        seen.push(packet);
        if done {
            return seen;
        }
    }
}

fn is_message(packet: &ServerPacket, text: &str) -> bool {
    matches!(packet, ServerPacket::Message(m) if m.text == text)
}

/// Connect, identify, and drain the join sequence.
async fn joined(state: &ServerState, name: &str) -> (Arc<Session>, TcpStream) {
    let (session, mut client) = connect(state).await;
    state
        .handle_batch(&session, valid_identification(name))
        .await;
    let joined = format!("{name} has joined!");
    read_until(&mut client, |p| is_message(p, &joined)).await;
    (session, client)
}

#[tokio::test]
async fn join_sequence() {
    let state = test_state(small_config());
    let (_bob_session, mut bob) = joined(&state, "Bob").await;

    let (session, mut alice) = connect(&state).await;
    state
        .handle_batch(&session, valid_identification("Alice"))
        .await;

    let ServerPacket::Identification(ident) = read_packet(&mut alice).await else {
        panic!("expected server identification");
    };
    assert_eq!(ident.protocol_version, 7);
    assert_eq!(ident.name, state.config.server.name);
    assert_eq!(ident.user_type, 0);
    assert_eq!(
        read_packet(&mut alice).await,
        ServerPacket::LevelInitialize(LevelInitialize)
    );

    let mut chunks: Vec<LevelDataChunk> = Vec::new();
    let finalize = loop {
        match read_packet(&mut alice).await {
            ServerPacket::LevelDataChunk(chunk) => chunks.push(chunk),
            ServerPacket::LevelFinalize(f) => break f,
            other => panic!("unexpected {other:?}"),
        }
    };
    assert!(!chunks.is_empty());
    assert_eq!(chunks.last().unwrap().percent, 100);
    assert_eq!(finalize, LevelFinalize { x: 16, y: 8, z: 16 });

    let mut snapshot = BytesMut::new();
    for chunk in &chunks {
        snapshot.extend_from_slice(chunk.payload());
    }
    let dims = state.config.world.dimensions().unwrap();
    let world = classic_world::World::decode(dims, &snapshot).unwrap();
    assert_eq!(world.blocks().len(), 16 * 8 * 16);
    assert_eq!(&world, &*state.world());

    assert_eq!(
        read_packet(&mut alice).await,
        ServerPacket::Position(PositionAndOrientation::at(SELF_ID, [7.0, 7.0, 7.0], 0, 0))
    );
    let [x, y, z] = state.spawn_point();
    assert!(state.world().in_bounds(x as i32, y as i32, z as i32));
    let ServerPacket::SpawnPlayer(existing) = read_packet(&mut alice).await else {
        panic!("expected Bob's spawn");
    };
    assert_eq!((existing.player_id, existing.name.as_str()), (1, "Bob"));
    assert!(is_message(&read_packet(&mut alice).await, "Alice has joined!"));

    let ServerPacket::SpawnPlayer(spawn) = read_packet(&mut bob).await else {
        panic!("expected Alice's spawn");
    };
    assert_eq!((spawn.player_id, spawn.name.as_str()), (2, "Alice"));
    assert_eq!(spawn, SpawnPlayer::at(2, "Alice", [7.0, 7.0, 7.0], 0, 0));
    assert!(is_message(&read_packet(&mut bob).await, "Alice has joined!"));
    assert_eq!(session.state(), LoginState::Active);
}

#[tokio::test]
async fn bad_key_is_rejected() {
    let state = test_state(small_config());
    let (session, mut client) = connect(&state).await;
    state
        .handle_batch(&session, identification("Alice", "00000000000000000000000000000000"))
        .await;
    assert_eq!(
        read_packet(&mut client).await,
        ServerPacket::Disconnect(classic_proto::packets::Disconnect::new(
            "Unable to verify name"
        ))
    );
    assert_eq!(session.state(), LoginState::Disconnected);
    assert_eq!(state.player_count().await, 0);
    assert_eq!(state.connection_count().await, 0);
}

#[tokio::test]
async fn unverified_names_allowed_when_disabled() {
    let mut config = small_config();
    config.server.verify_names = false;
    let state = test_state(config);
    let (session, mut client) = connect(&state).await;
    state
        .handle_batch(&session, identification("Alice", "whatever"))
        .await;
    read_until(&mut client, |p| is_message(p, "Alice has joined!")).await;
    assert_eq!(state.player_count().await, 1);
}

#[tokio::test]
async fn duplicate_name_is_rejected() {
    let state = test_state(small_config());
    let (_a, _alice) = joined(&state, "Alice").await;
    let (session, mut client) = connect(&state).await;
    state
        .handle_batch(&session, valid_identification("Alice"))
        .await;
    let ServerPacket::Disconnect(d) = read_packet(&mut client).await else {
        panic!("expected disconnect");
    };
    assert_eq!(d.reason, "Name already in use");
    assert_eq!(state.player_count().await, 1);
}

#[tokio::test]
async fn full_server_rejects() {
    let config = ServerConfig {
        server: crate::config::ServerSection {
            max_players: 1,
            ..Default::default()
        },
        ..small_config()
    };
    let state = test_state(config);
    let (_a, _alice) = joined(&state, "Alice").await;
    let (session, mut client) = connect(&state).await;
    state
        .handle_batch(&session, valid_identification("Bob"))
        .await;
    assert_eq!(
        read_packet(&mut client).await,
        ServerPacket::Disconnect(classic_proto::packets::Disconnect::new("Server full"))
    );
    assert_eq!(state.player_count().await, 1);
}

#[tokio::test]
async fn block_edit_is_applied_and_broadcast() {
    let state = test_state(small_config());
    let (session, mut alice) = joined(&state, "Alice").await;
    let place = ClientPacket::SetBlock(SetBlock {
        x: 3,
        y: 6,
        z: 4,
        mode: 1,
        block_type: 20,
    });
    state.handle_batch(&session, place.encode()).await;
    assert_eq!(state.world().get_block(3, 6, 4), 20);
    assert_eq!(
        read_packet(&mut alice).await,
        ServerPacket::BlockUpdate(BlockUpdate {
            x: 3,
            y: 6,
            z: 4,
            block_type: 20
        })
    );

    let destroy = ClientPacket::SetBlock(SetBlock {
        x: 3,
        y: 6,
        z: 4,
        mode: 0,
        block_type: 20,
    });
    state.handle_batch(&session, destroy.encode()).await;
    assert_eq!(state.world().get_block(3, 6, 4), 0);
    assert_eq!(
        read_packet(&mut alice).await,
        ServerPacket::BlockUpdate(BlockUpdate {
            x: 3,
            y: 6,
            z: 4,
            block_type: 0
        })
    );
}

#[tokio::test]
async fn out_of_bounds_block_is_ignored() {
    let state = test_state(ServerConfig::default());
    let (session, mut alice) = joined(&state, "Alice").await;
    let before = state.world().clone();
    for (x, y, z) in [(9999, 0, 0), (0, 64, 0), (0, 0, -1)] {
        let packet = ClientPacket::SetBlock(SetBlock {
            x,
            y,
            z,
            mode: 1,
            block_type: 1,
        });
        state.handle_batch(&session, packet.encode()).await;
    }
    assert_eq!(*state.world(), before);

    state.broadcast_message("marker").await;
    assert!(is_message(&read_packet(&mut alice).await, "marker"));
}

#[tokio::test]
async fn packets_before_identification_are_ignored() {
    let state = test_state(small_config());
    let (session, _client) = connect(&state).await;
    let place = ClientPacket::SetBlock(SetBlock {
        x: 0,
        y: 7,
        z: 0,
        mode: 1,
        block_type: 5,
    });
    state.handle_batch(&session, place.encode()).await;
    assert_eq!(state.world().get_block(0, 7, 0), 0);
    assert_eq!(session.state(), LoginState::Unauthenticated);
}

#[tokio::test]
async fn position_is_stored_and_retagged() {
    let state = test_state(small_config());
    let (_a, mut alice) = joined(&state, "Alice").await;
    let (bob_session, _bob) = joined(&state, "Bob").await;
    read_until(&mut alice, |p| is_message(p, "Bob has joined!")).await;

    let moved = PositionAndOrientation::at(SELF_ID, [5.0, 6.5, 7.0], 64, 32);
    state
        .handle_batch(&bob_session, ClientPacket::Position(moved).encode())
        .await;

    assert_eq!(
        read_packet(&mut alice).await,
        ServerPacket::Position(PositionAndOrientation {
            player_id: 2,
            ..moved
        })
    );
    let players = state.players().await;
    let bob = players.get(2).unwrap();
    assert_eq!(bob.position, [5.0, 6.5, 7.0]);
    assert_eq!((bob.yaw, bob.pitch), (64, 32));
}

#[tokio::test]
async fn chat_is_tagged_with_sender() {
    let state = test_state(small_config());
    let (session, mut alice) = joined(&state, "Alice").await;
    state.handle_batch(&session, chat("hello there")).await;
    assert_eq!(
        read_packet(&mut alice).await,
        ServerPacket::Message(Message {
            player_id: 1,
            text: "<Alice> hello there".into()
        })
    );
}

#[tokio::test]
async fn teleport_command() {
    let state = test_state(small_config());
    let (session, mut alice) = joined(&state, "Alice").await;
    state.handle_batch(&session, chat("/tp 1 2 3")).await;
    assert!(is_message(&read_packet(&mut alice).await, "Teleported to 1 2 3"));
    assert_eq!(
        read_packet(&mut alice).await,
        ServerPacket::Position(PositionAndOrientation::at(SELF_ID, [1.0, 2.0, 3.0], 0, 0))
    );
    assert_eq!(state.players().await.get(1).unwrap().position, [1.0, 2.0, 3.0]);
}

#[tokio::test]
async fn unknown_command_replies_to_sender() {
    let state = test_state(small_config());
    let (session, mut alice) = joined(&state, "Alice").await;
    state.handle_batch(&session, chat("/fly")).await;
    assert!(is_message(&read_packet(&mut alice).await, "Unknown command: fly"));
}

#[tokio::test]
async fn op_command_updates_user_type() {
    let state = test_state(small_config());
    state.set_op("Alice", true);
    let (session, mut alice) = joined(&state, "Alice").await;
    let (_b, mut bob) = joined(&state, "Bob").await;

    state.handle_batch(&session, chat("/op Bob")).await;
    assert!(state.is_op("Bob"));
    assert_eq!(
        read_packet(&mut bob).await,
        ServerPacket::UpdateUserType(UpdateUserType::new(true))
    );
    read_until(&mut alice, |p| is_message(p, "Made Bob an operator")).await;
}

#[tokio::test]
async fn op_with_lowercase_name_grants_commands() {
    let state = test_state(small_config());
    state.set_op("Alice", true);
    let (alice_session, _alice) = joined(&state, "Alice").await;
    let (bob_session, mut bob) = joined(&state, "Bob").await;

    state.handle_batch(&alice_session, chat("/op bob")).await;
    assert!(state.is_op("Bob"));
    assert_eq!(
        read_packet(&mut bob).await,
        ServerPacket::UpdateUserType(UpdateUserType::new(true))
    );

    state.handle_batch(&bob_session, chat("/kick Alice")).await;
    read_until(&mut bob, |p| is_message(p, "Kicked Alice")).await;
    assert_eq!(state.player_count().await, 1);
}

#[tokio::test]
async fn kick_command() {
    let state = test_state(small_config());
    state.set_op("Alice", true);
    let (session, mut alice) = joined(&state, "Alice").await;
    let (_b, mut bob) = joined(&state, "Bob").await;

    state.handle_batch(&session, chat("/kick Bob spamming")).await;
    assert_eq!(
        read_packet(&mut bob).await,
        ServerPacket::Disconnect(classic_proto::packets::Disconnect::new("spamming"))
    );
    read_until(&mut alice, |p| is_message(p, "Player Bob kicked, spamming")).await;
    assert_eq!(state.player_count().await, 1);
}

#[tokio::test]
async fn unknown_packet_discards_batch_but_keeps_connection() {
    let state = test_state(small_config());
    let (session, mut alice) = joined(&state, "Alice").await;
    let mut batch = BytesMut::new();
    batch.extend_from_slice(&[0x42, 0x00, 0x00]);
    batch.extend_from_slice(&chat("lost"));
    state.handle_batch(&session, batch.freeze()).await;
    assert!(state.session(&session.address()).await.is_some());

    state.handle_batch(&session, chat("kept")).await;
    assert!(is_message(&read_packet(&mut alice).await, "<Alice> kept"));
}

#[tokio::test]
async fn packet_split_across_reads_is_reassembled() {
    let state = test_state(small_config());
    let (session, mut alice) = joined(&state, "Alice").await;

    let packet = chat("split");
    let (head, tail) = packet.split_at(10);
    alice.write_all(head).await.unwrap();
    poll_for_a_while(&state, &session).await;
    alice.write_all(tail).await.unwrap();
    poll_for_a_while(&state, &session).await;

    assert!(is_message(&read_packet(&mut alice).await, "<Alice> split"));
}

async fn poll_for_a_while(state: &ServerState, session: &Arc<Session>) {
    for _ in 0..20 {
        state.poll_session(session).await;
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

#[tokio::test]
async fn closed_peer_is_disconnected_by_poll() {
    let state = test_state(small_config());
    let (_a, mut alice) = joined(&state, "Alice").await;
    let (bob_session, bob) = joined(&state, "Bob").await;
    read_until(&mut alice, |p| is_message(p, "Bob has joined!")).await;
    drop(bob);
    for _ in 0..200 {
        state.poll_session(&bob_session).await;
        if state.session(&bob_session.address()).await.is_none() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(state.session(&bob_session.address()).await.is_none());
    assert_eq!(
        read_packet(&mut alice).await,
        ServerPacket::DespawnPlayer(DespawnPlayer { player_id: 2 })
    );
    assert!(is_message(&read_packet(&mut alice).await, "Bob has quit"));
}
