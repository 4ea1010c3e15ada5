use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use warp::http::StatusCode;
use warp::{Filter, Reply};

use crate::coordinator::RoomCoordinator;
use crate::websocket::ConnectionManager;
use crate::websocket::rate_limiter::RateLimiter;
use room_types::{
    Color, ErrorKind, GameOutcome, MessageType, OfferKind, OfferResponse, PlayerId, RoomError,
    RoomType, TimeControl,
};

pub mod config;
pub mod coordinator;
pub mod websocket;

#[derive(Deserialize)]
struct CreatePlayerRequest {
    display_name: String,
}

#[derive(Deserialize)]
struct CreateRoomRequest {
    creator_id: PlayerId,
    #[serde(rename = "type")]
    room_type: RoomType,
    time_control: Option<TimeControl>,
    creator_color: Option<Color>,
}

#[derive(Deserialize)]
struct PlayerRequest {
    player_id: PlayerId,
}

#[derive(Deserialize)]
struct PostMessageRequest {
    author_id: PlayerId,
    #[serde(rename = "type", default)]
    message_type: Option<MessageType>,
    content: Option<String>,
}

const MAX_BODY_BYTES: u64 = 16 * 1024;

pub fn create_routes(
    coordinator: Arc<RoomCoordinator>,
    connection_manager: Arc<ConnectionManager>,
    rate_limiter: RateLimiter,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    // Clone for filters
    let coordinator_filter = warp::any().map({
        let coordinator = coordinator.clone();
        move || coordinator.clone()
    });

    let connection_manager_filter = warp::any().map({
        let connection_manager = connection_manager.clone();
        move || connection_manager.clone()
    });

    let rate_limiter_filter = warp::any().map(move || rate_limiter.fresh());

    // WebSocket endpoint
    let websocket = warp::path("ws")
        .and(warp::ws())
        .and(connection_manager_filter.clone())
        .and(coordinator_filter.clone())
        .and(rate_limiter_filter)
        .map(|ws: warp::ws::Ws, conn_mgr, coordinator, limiter| {
            ws.on_upgrade(move |socket| {
                websocket::handle_connection(socket, conn_mgr, coordinator, limiter)
            })
        });

    // Health check endpoint
    let health = warp::path("health")
        .and(warp::get())
        .map(|| warp::reply::with_status("OK", StatusCode::OK));

    let create_player = warp::path!("players")
        .and(warp::post())
        .and(json_body::<CreatePlayerRequest>())
        .and(coordinator_filter.clone())
        .and_then(handle_create_player);

    let get_player = warp::path!("players" / String)
        .and(warp::get())
        .and(coordinator_filter.clone())
        .and_then(handle_get_player);

    let delete_player = warp::path!("players" / String)
        .and(warp::delete())
        .and(coordinator_filter.clone())
        .and_then(handle_delete_player);

    let create_room = warp::path!("rooms")
        .and(warp::post())
        .and(json_body::<CreateRoomRequest>())
        .and(coordinator_filter.clone())
        .and_then(handle_create_room);

    let get_room = warp::path!("rooms" / String)
        .and(warp::get())
        .and(coordinator_filter.clone())
        .and_then(handle_get_room);

    let delete_room = warp::path!("rooms" / String)
        .and(warp::delete())
        .and(coordinator_filter.clone())
        .and_then(handle_delete_room);

    let join_room = warp::path!("rooms" / String / "join")
        .and(warp::post())
        .and(json_body::<PlayerRequest>())
        .and(coordinator_filter.clone())
        .and_then(handle_join_room);

    let post_message = warp::path!("rooms" / String / "messages")
        .and(warp::post())
        .and(json_body::<PostMessageRequest>())
        .and(coordinator_filter.clone())
        .and_then(handle_post_message);

    let respond_to_offer = warp::path!("rooms" / String / "offers" / String / String)
        .and(warp::post())
        .and(json_body::<PlayerRequest>())
        .and(coordinator_filter.clone())
        .and_then(handle_offer_response);

    let report_result = warp::path!("rooms" / String / "result")
        .and(warp::post())
        .and(json_body::<GameOutcome>())
        .and(coordinator_filter.clone())
        .and_then(handle_report_result);

    let new_game = warp::path!("rooms" / String / "new-game")
        .and(warp::post())
        .and(coordinator_filter.clone())
        .and_then(handle_new_game);

    let swap_colors = warp::path!("rooms" / String / "swap-colors")
        .and(warp::post())
        .and(coordinator_filter.clone())
        .and_then(handle_swap_colors);

    // CORS configuration
    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(vec!["content-type"])
        .allow_methods(vec!["GET", "POST", "DELETE"]);

    websocket
        .or(health)
        .or(create_player)
        .or(get_player)
        .or(delete_player)
        .or(create_room)
        .or(get_room)
        .or(delete_room)
        .or(join_room)
        .or(post_message)
        .or(respond_to_offer)
        .or(report_result)
        .or(new_game)
        .or(swap_colors)
        .with(cors)
        .with(warp::log("chess_rooms"))
}

fn json_body<T: DeserializeOwned + Send>()
-> impl Filter<Extract = (T,), Error = warp::Rejection> + Clone {
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Capacity | ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::InvalidOperation => StatusCode::BAD_REQUEST,
        ErrorKind::Unauthorized => StatusCode::FORBIDDEN,
        ErrorKind::Validation => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::ResourceExhaustion => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn json_response<T: serde::Serialize>(value: &T, status: StatusCode) -> warp::reply::Response {
    warp::reply::with_status(warp::reply::json(value), status).into_response()
}

fn error_response(err: &RoomError) -> warp::reply::Response {
    let kind = err.kind();
    if kind == ErrorKind::ResourceExhaustion {
        tracing::error!("Request failed: {}", err);
    }
    json_response(
        &serde_json::json!({
            "error": err.to_string(),
            "kind": kind,
        }),
        status_for(kind),
    )
}

fn reply_with<T: serde::Serialize>(
    result: Result<T, RoomError>,
    status: StatusCode,
) -> Result<warp::reply::Response, warp::Rejection> {
    Ok(match result {
        Ok(value) => json_response(&value, status),
        Err(e) => error_response(&e),
    })
}

fn no_content_or(deleted: bool, not_found: RoomError) -> warp::reply::Response {
    if deleted {
        warp::reply::with_status(warp::reply(), StatusCode::NO_CONTENT).into_response()
    } else {
        error_response(&not_found)
    }
}

async fn handle_create_player(
    request: CreatePlayerRequest,
    coordinator: Arc<RoomCoordinator>,
) -> Result<warp::reply::Response, warp::Rejection> {
    reply_with(
        coordinator.create_player(&request.display_name).await,
        StatusCode::CREATED,
    )
}

async fn handle_get_player(
    player_id: String,
    coordinator: Arc<RoomCoordinator>,
) -> Result<warp::reply::Response, warp::Rejection> {
    let player = coordinator.get_player(&player_id).await;
    reply_with(
        player.ok_or_else(|| RoomError::player_not_found(&player_id)),
        StatusCode::OK,
    )
}

async fn handle_delete_player(
    player_id: String,
    coordinator: Arc<RoomCoordinator>,
) -> Result<warp::reply::Response, warp::Rejection> {
    let deleted = coordinator.delete_player(&player_id).await;
    Ok(no_content_or(deleted, RoomError::player_not_found(&player_id)))
}

async fn handle_create_room(
    request: CreateRoomRequest,
    coordinator: Arc<RoomCoordinator>,
) -> Result<warp::reply::Response, warp::Rejection> {
    let room = coordinator
        .create_room(
            &request.creator_id,
            request.room_type,
            request.time_control,
            request.creator_color,
        )
        .await;
    reply_with(room, StatusCode::CREATED)
}

async fn handle_get_room(
    room_id: String,
    coordinator: Arc<RoomCoordinator>,
) -> Result<warp::reply::Response, warp::Rejection> {
    let room = coordinator.get_room(&room_id).await;
    reply_with(
        room.ok_or_else(|| RoomError::room_not_found(&room_id)),
        StatusCode::OK,
    )
}

async fn handle_delete_room(
    room_id: String,
    coordinator: Arc<RoomCoordinator>,
) -> Result<warp::reply::Response, warp::Rejection> {
    let deleted = coordinator.delete_room(&room_id).await;
    Ok(no_content_or(deleted, RoomError::room_not_found(&room_id)))
}

async fn handle_join_room(
    room_id: String,
    request: PlayerRequest,
    coordinator: Arc<RoomCoordinator>,
) -> Result<warp::reply::Response, warp::Rejection> {
    reply_with(
        coordinator.join_room(&room_id, &request.player_id).await,
        StatusCode::OK,
    )
}

async fn handle_post_message(
    room_id: String,
    request: PostMessageRequest,
    coordinator: Arc<RoomCoordinator>,
) -> Result<warp::reply::Response, warp::Rejection> {
    let message = coordinator
        .post_message(
            &room_id,
            &request.author_id,
            request.message_type.unwrap_or(MessageType::Standard),
            request.content,
        )
        .await;
    reply_with(message, StatusCode::CREATED)
}

async fn handle_offer_response(
    room_id: String,
    kind: String,
    response: String,
    request: PlayerRequest,
    coordinator: Arc<RoomCoordinator>,
) -> Result<warp::reply::Response, warp::Rejection> {
    let kind = match kind.as_str() {
        "draw" => OfferKind::Draw,
        "rematch" => OfferKind::Rematch,
        _ => return Err(warp::reject::not_found()),
    };
    let response = match response.as_str() {
        "accept" => OfferResponse::Accept,
        "decline" => OfferResponse::Decline,
        _ => return Err(warp::reject::not_found()),
    };

    let resolution = coordinator
        .respond_to_offer(&room_id, kind, response, &request.player_id)
        .await;
    reply_with(resolution, StatusCode::OK)
}

async fn handle_report_result(
    room_id: String,
    outcome: GameOutcome,
    coordinator: Arc<RoomCoordinator>,
) -> Result<warp::reply::Response, warp::Rejection> {
    reply_with(
        coordinator.report_result(&room_id, &outcome).await,
        StatusCode::OK,
    )
}

async fn handle_new_game(
    room_id: String,
    coordinator: Arc<RoomCoordinator>,
) -> Result<warp::reply::Response, warp::Rejection> {
    reply_with(coordinator.start_new_game(&room_id).await, StatusCode::OK)
}

async fn handle_swap_colors(
    room_id: String,
    coordinator: Arc<RoomCoordinator>,
) -> Result<warp::reply::Response, warp::Rejection> {
    reply_with(coordinator.swap_colors(&room_id).await, StatusCode::OK)
}
