
use room_types::{
    Color, GameOutcome, GameStatus, MessageType, OfferKind, OfferResponse, PlayerStatus,
    RoomError, RoomType, ServerMessage,
};
use std::time::Duration;
use test_helpers::*;

#[tokio::test]
async fn test_room_creation_basic() {
    let setup = TestRoomServerSetup::new();
    let (room_id, alice, bob) = setup.create_full_room().await;

    let room = setup.coordinator.get_room(&room_id).await.unwrap();
    assert_eq!(room.players.len(), 2);
    assert_eq!(room.color_to_player_id.white, Some(alice.id.clone()));
    assert_eq!(room.color_to_player_id.black, Some(bob.id.clone()));
    assert_eq!(room.display_name(&bob.id), Some("Bob"));
}

#[tokio::test]
async fn test_join_requires_registered_player() {
    let setup = TestRoomServerSetup::new();
    let (room_id, _alice, _bob) = setup.create_full_room().await;

    let result = setup.coordinator.join_room(&room_id, "ghost").await;
    assert_eq!(result.unwrap_err(), RoomError::player_not_found("ghost"));
}

#[tokio::test]
async fn test_third_player_is_turned_away() {
    let setup = TestRoomServerSetup::new();
    let (room_id, _alice, _bob) = setup.create_full_room().await;
    let charlie = setup.coordinator.create_player("Charlie").await.unwrap();

    let result = setup.coordinator.join_room(&room_id, &charlie.id).await;
    assert!(matches!(result, Err(RoomError::GameRoomIsFull { .. })));
    assert_eq!(
        setup.coordinator.get_room(&room_id).await.unwrap().players.len(),
        2
    );
}

#[tokio::test]
async fn test_updates_reach_room_subscribers_only() {
    let setup = TestRoomServerSetup::new();
    let (room_id, alice, bob) = setup.create_full_room().await;
    let (_, mut alice_rx) = setup.subscribe(&room_id, &alice.id).await;
    let (_, mut outsider_rx) = setup.subscribe("another-room", "someone").await;

    setup
        .coordinator
        .post_message(&room_id, &bob.id, MessageType::Standard, Some("gg".into()))
        .await
        .unwrap();

    let messages = drain(&mut alice_rx);
    assert_eq!(messages.len(), 1);
    match &messages[0] {
        ServerMessage::MessagePosted { message } => {
            assert_eq!(message.author_id, bob.id);
            assert_eq!(message.content, "gg");
        }
        other => panic!("Expected MessagePosted, got: {:?}", other),
    }
    assert!(drain(&mut outsider_rx).is_empty());
}

#[tokio::test]
async fn test_failed_operation_broadcasts_nothing() {
    let setup = TestRoomServerSetup::new();
    let (room_id, alice, _bob) = setup.create_full_room().await;
    let (_, mut alice_rx) = setup.subscribe(&room_id, &alice.id).await;

    let result = setup
        .coordinator
        .respond_to_offer(&room_id, OfferKind::Draw, OfferResponse::Accept, &alice.id)
        .await;

    assert_eq!(
        result.unwrap_err(),
        RoomError::NoActiveOffer {
            offer: OfferKind::Draw
        }
    );
    assert!(drain(&mut alice_rx).is_empty());
}

#[tokio::test]
async fn test_declined_rematch_keeps_game() {
    let setup = TestRoomServerSetup::new();
    let (room_id, alice, bob) = setup.create_full_room().await;

    setup
        .coordinator
        .post_message(&room_id, &alice.id, MessageType::RematchOffer, None)
        .await
        .unwrap();
    let resolution = setup
        .coordinator
        .respond_to_offer(&room_id, OfferKind::Rematch, OfferResponse::Decline, &bob.id)
        .await
        .unwrap();

    assert_eq!(resolution.message.message_type, MessageType::RematchDecline);
    assert!(resolution.new_game.is_none());

    let room = setup.coordinator.get_room(&room_id).await.unwrap();
    assert_eq!(room.game_count, 0);
    assert_eq!(room.color_to_player_id.white, Some(alice.id));
}

#[tokio::test]
async fn test_accepted_rematch_swaps_and_broadcasts() {
    let setup = TestRoomServerSetup::new();
    let (room_id, alice, bob) = setup.create_full_room().await;
    let (_, mut bob_rx) = setup.subscribe(&room_id, &bob.id).await;

    setup
        .coordinator
        .post_message(&room_id, &alice.id, MessageType::RematchOffer, None)
        .await
        .unwrap();
    let resolution = setup
        .coordinator
        .respond_to_offer(&room_id, OfferKind::Rematch, OfferResponse::Accept, &bob.id)
        .await
        .unwrap();

    let new_game = resolution.new_game.unwrap();
    assert_eq!(new_game.game_count, 1);
    assert_eq!(new_game.color_to_player_id.white, Some(bob.id.clone()));
    assert_eq!(new_game.color_to_player_id.black, Some(alice.id.clone()));

    let messages = drain(&mut bob_rx);
    assert_eq!(messages.len(), 3);
    assert!(matches!(messages[0], ServerMessage::MessagePosted { .. }));
    assert!(matches!(messages[1], ServerMessage::OfferResolved { .. }));
    assert!(matches!(messages[2], ServerMessage::NewGameStarted { .. }));
}

#[tokio::test]
async fn test_scores_across_several_games() {
    let setup = TestRoomServerSetup::new();
    let (room_id, alice, bob) = setup.create_full_room().await;

    let scores = setup
        .coordinator
        .report_result(&room_id, &GameOutcome::checkmate(Color::Black))
        .await
        .unwrap();
    assert_eq!(scores[&alice.id], 0.0);
    assert_eq!(scores[&bob.id], 1.0);

    setup.coordinator.start_new_game(&room_id).await.unwrap();
    let scores = setup
        .coordinator
        .report_result(
            &room_id,
            &GameOutcome::with_status(GameStatus::ThreefoldRepetition),
        )
        .await
        .unwrap();
    assert_eq!(scores[&alice.id], 0.5);
    assert_eq!(scores[&bob.id], 1.5);

    let unchanged = setup
        .coordinator
        .report_result(&room_id, &GameOutcome::with_status(GameStatus::InProgress))
        .await
        .unwrap();
    assert_eq!(unchanged, scores);
}

#[tokio::test]
async fn test_leave_keeps_seat_and_score() {
    let setup = TestRoomServerSetup::new();
    let (room_id, alice, bob) = setup.create_full_room().await;
    setup
        .coordinator
        .report_result(&room_id, &GameOutcome::checkmate(Color::White))
        .await
        .unwrap();

    setup.coordinator.rejoin_room(&room_id, &bob.id).await.unwrap();
    setup.coordinator.leave_room(&room_id, &bob.id).await.unwrap();

    assert_eq!(
        setup.coordinator.get_player(&bob.id).await.unwrap().status,
        PlayerStatus::Offline
    );
    let room = setup.coordinator.get_room(&room_id).await.unwrap();
    assert!(room.has_player(&bob.id));
    assert_eq!(room.color_to_player_id.black, Some(bob.id.clone()));
    assert_eq!(room.score(&alice.id), Some(1.0));

    let charlie = setup.coordinator.create_player("Charlie").await.unwrap();
    let result = setup.coordinator.join_room(&room_id, &charlie.id).await;
    assert!(matches!(result, Err(RoomError::GameRoomIsFull { .. })));
}

#[tokio::test]
async fn test_outsider_cannot_leave() {
    let setup = TestRoomServerSetup::new();
    let (room_id, _alice, _bob) = setup.create_full_room().await;
    let charlie = setup.coordinator.create_player("Charlie").await.unwrap();

    let result = setup.coordinator.leave_room(&room_id, &charlie.id).await;
    assert!(matches!(result, Err(RoomError::PlayerNotInRoom { .. })));
}

#[tokio::test]
async fn test_connect_player_seats_then_brings_back() {
    let setup = TestRoomServerSetup::new();
    let players = setup.create_players(&["Alice", "Bob"]).await;
    let room = setup
        .coordinator
        .create_room(&players[0].id, RoomType::PlayerVsPlayer, None, None)
        .await
        .unwrap();

    let seated = setup
        .coordinator
        .connect_player(&room.id, &players[1].id)
        .await
        .unwrap();
    assert_eq!(seated.players.len(), 2);
    assert!(seated.messages.is_empty());
    assert_eq!(
        setup.coordinator.get_player(&players[1].id).await.unwrap().status,
        PlayerStatus::Online
    );

    setup
        .coordinator
        .leave_room(&room.id, &players[1].id)
        .await
        .unwrap();
    let back = setup
        .coordinator
        .connect_player(&room.id, &players[1].id)
        .await
        .unwrap();
    let last = back.messages.last().unwrap();
    assert_eq!(last.message_type, MessageType::PlayerRejoinedRoom);
    assert_eq!(last.content, "Bob has rejoined the room.");
}

#[tokio::test]
async fn test_cleanup_removes_idle_rooms_and_detaches() {
    let setup = TestRoomServerSetup::with_cleanup_threshold(Duration::from_millis(20));
    let (room_id, alice, _bob) = setup.create_full_room().await;
    let (connection_id, mut alice_rx) = setup.subscribe(&room_id, &alice.id).await;

    assert!(setup.coordinator.run_cleanup().await.is_empty());

    tokio::time::sleep(Duration::from_millis(50)).await;
    let removed = setup.coordinator.run_cleanup().await;

    assert_eq!(removed, vec![room_id.clone()]);
    assert!(setup.coordinator.get_room(&room_id).await.is_none());
    assert!(
        setup
            .connection_manager
            .get_subscription(connection_id)
            .await
            .is_none()
    );
    assert!(matches!(
        drain(&mut alice_rx).last(),
        Some(ServerMessage::Error { .. })
    ));
}

#[tokio::test]
async fn test_cleanup_keeps_rooms_with_connected_players() {
    let setup = TestRoomServerSetup::with_cleanup_threshold(Duration::from_millis(20));
    let (room_id, alice, bob) = setup.create_full_room().await;
    setup.coordinator.connect_player(&room_id, &alice.id).await.unwrap();
    setup.coordinator.connect_player(&room_id, &bob.id).await.unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(setup.coordinator.run_cleanup().await.is_empty());

    setup.coordinator.leave_room(&room_id, &alice.id).await.unwrap();
    setup.coordinator.leave_room(&room_id, &bob.id).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(setup.coordinator.run_cleanup().await, vec![room_id]);
}

#[tokio::test]
async fn test_delete_player_does_not_touch_rooms() {
    let setup = TestRoomServerSetup::new();
    let (room_id, alice, _bob) = setup.create_full_room().await;

    assert!(setup.coordinator.delete_player(&alice.id).await);
    assert!(!setup.coordinator.delete_player(&alice.id).await);
    assert!(setup.coordinator.get_player(&alice.id).await.is_none());

    let room = setup.coordinator.get_room(&room_id).await.unwrap();
    assert!(room.has_player(&alice.id));
}
