use room_types::{GameOutcome, GameStatus, PlayerId, RoomError, ScoreMap, SeatAssignments};
use tracing::info;

use crate::room_events::RoomEvent;
use crate::room_store::GameRoomStore;

pub const WIN_POINTS: f64 = 1.0;
pub const DRAW_POINTS: f64 = 0.5;

pub struct ScoreTally;

impl ScoreTally {
    /// Points each seated player earns for a reported game outcome.
    ///
    /// Checkmate gives the winner a point and the loser nothing. Every draw
    /// condition gives each seated player half a point. Anything else, such as
    /// a game still in progress, earns nothing.
    pub fn score_deltas(
        outcome: &GameOutcome,
        seats: &SeatAssignments,
    ) -> Result<Vec<(PlayerId, f64)>, RoomError> {
        match outcome.status {
            GameStatus::Checkmate => {
                let winner_id = outcome
                    .winner
                    .and_then(|color| seats.get(color))
                    .ok_or(RoomError::InvalidWinner {
                        winner: outcome.winner,
                    })?;
                Ok(vec![(winner_id.clone(), WIN_POINTS)])
            }
            status if status.is_draw() => Ok(seats
                .white
                .iter()
                .chain(seats.black.iter())
                .map(|player_id| (player_id.clone(), DRAW_POINTS))
                .collect()),
            _ => Ok(Vec::new()),
        }
    }
}

impl GameRoomStore {
    /// Apply a finished game's outcome and return the room's full score map
    pub fn update_player_scores(
        &mut self,
        room_id: &str,
        outcome: &GameOutcome,
    ) -> Result<ScoreMap, RoomError> {
        let entry = self
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| RoomError::room_not_found(room_id))?;
        let room = &mut entry.room;

        let deltas = ScoreTally::score_deltas(outcome, &room.color_to_player_id)?;
        if deltas.is_empty() {
            return Ok(room.player_id_to_score.clone());
        }

        if let Some((missing, _)) = deltas
            .iter()
            .find(|(player_id, _)| !room.player_id_to_score.contains_key(player_id))
        {
            return Err(RoomError::PlayerNotInRoom {
                room_id: room_id.to_string(),
                player_id: missing.clone(),
            });
        }

        for (player_id, points) in &deltas {
            if let Some(score) = room.player_id_to_score.get_mut(player_id) {
                *score += points;
            }
        }

        let scores = room.player_id_to_score.clone();
        entry.touch();

        info!(
            "Recorded {:?} in room {}: {:?}",
            outcome.status, room_id, scores
        );
        self.event_bus.publish(RoomEvent::ScoresUpdated {
            room_id: room_id.to_string(),
            scores: scores.clone(),
        });

        Ok(scores)
    }

    /// Add a win (1) or a draw (0.5) to one player's score, returning the new total
    pub fn increment_player_score(
        &mut self,
        room_id: &str,
        player_id: &str,
        is_draw: bool,
    ) -> Result<f64, RoomError> {
        let entry = self
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| RoomError::room_not_found(room_id))?;

        let score = entry
            .room
            .player_id_to_score
            .get_mut(player_id)
            .ok_or_else(|| RoomError::PlayerNotInRoom {
                room_id: room_id.to_string(),
                player_id: player_id.to_string(),
            })?;
        *score += if is_draw { DRAW_POINTS } else { WIN_POINTS };
        let new_score = *score;
        entry.touch();

        self.event_bus.publish(RoomEvent::ScoresUpdated {
            room_id: room_id.to_string(),
            scores: entry.room.player_id_to_score.clone(),
        });

        Ok(new_score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use room_types::Color;

    fn seats() -> SeatAssignments {
        SeatAssignments {
            white: Some("p1".to_string()),
            black: Some("p2".to_string()),
        }
    }

    #[test]
    fn test_checkmate_rewards_winner_only() {
        let deltas =
            ScoreTally::score_deltas(&GameOutcome::checkmate(Color::Black), &seats()).unwrap();
        assert_eq!(deltas, vec![("p2".to_string(), WIN_POINTS)]);
    }

    #[test]
    fn test_every_draw_condition_splits_the_point() {
        for status in [
            GameStatus::Stalemate,
            GameStatus::InsufficientMaterial,
            GameStatus::ThreefoldRepetition,
            GameStatus::FiftyMoveDraw,
        ] {
            let deltas =
                ScoreTally::score_deltas(&GameOutcome::with_status(status), &seats()).unwrap();
            assert_eq!(
                deltas,
                vec![
                    ("p1".to_string(), DRAW_POINTS),
                    ("p2".to_string(), DRAW_POINTS)
                ]
            );
        }
    }

    #[test]
    fn test_unscored_statuses_earn_nothing() {
        for status in [GameStatus::InProgress, GameStatus::Other] {
            let deltas =
                ScoreTally::score_deltas(&GameOutcome::with_status(status), &seats()).unwrap();
            assert!(deltas.is_empty());
        }
    }

    #[test]
    fn test_checkmate_winner_must_be_seated() {
        let half_empty = SeatAssignments::with_seat(Color::White, "p1".to_string());
        let result = ScoreTally::score_deltas(&GameOutcome::checkmate(Color::Black), &half_empty);

        assert_eq!(
            result,
            Err(RoomError::InvalidWinner {
                winner: Some(Color::Black)
            })
        );
        assert_eq!(
            result.unwrap_err().to_string(),
            "Expected winner to have a valid player ID"
        );
    }

    #[test]
    fn test_checkmate_without_winner_is_invalid() {
        let outcome = GameOutcome::with_status(GameStatus::Checkmate);
        let result = ScoreTally::score_deltas(&outcome, &seats());
        assert_eq!(result, Err(RoomError::InvalidWinner { winner: None }));
    }
}
