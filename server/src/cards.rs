use chrono::Utc;
use hyper::{Body, Response, StatusCode};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::errors::{empty_response, json_response, ApiError};
use crate::model::{Card, CardKind, CurrentDraw, DrawOpportunity, Lobby, Role, UserID};
use crate::storage::Database;

#[derive(Serialize)]
struct CardActions {
    #[serde(rename = "lobbyID")]
    lobby_id: String,
    draws: Vec<DrawOpportunity>,
}

#[derive(Deserialize)]
struct PickRequest {
    picks: Vec<usize>,
}

/// The deck a lobby refills from when it runs dry: every time bonus three times over, plus one
/// copy of every curse.
pub fn catalog() -> Vec<Card> {
    let mut cards = vec![curse(
        "Bridge curse",
        "Next question must be asked under a bridge",
    )];
    for _ in 0..3 {
        cards.push(bonus("5 Minute Bonus", 5));
        cards.push(bonus("10 Minute Bonus", 10));
        cards.push(bonus("15 Minute Bonus", 15));
        cards.push(bonus("30 Minute Bonus", 30));
    }
    cards
}

fn bonus(title: &str, minutes: u64) -> Card {
    Card {
        title: title.to_string(),
        description: String::new(),
        kind: CardKind::TimeBonus,
        bonus_secs: minutes * 60,
        expiration_secs: 0,
        activated: None,
    }
}

fn curse(title: &str, description: &str) -> Card {
    Card {
        title: title.to_string(),
        description: description.to_string(),
        kind: CardKind::Curse,
        bonus_secs: 0,
        expiration_secs: 0,
        activated: None,
    }
}

/// Answering a question earns the hider a chance to draw.
pub fn offer_draw(draw_id: u64, lobby: &mut Lobby, cards_to_draw: u32, cards_to_pick: u32) {
    lobby.draw_opportunities.push(DrawOpportunity {
        draw_id,
        cards_to_draw,
        cards_to_pick,
    });
}

pub fn card_actions(db: &Database, code: &str) -> Result<Response<Body>, ApiError> {
    let lobby = db.lobby(code)?;
    json_response(
        StatusCode::OK,
        &CardActions {
            lobby_id: lobby.code.clone(),
            draws: lobby.draw_opportunities.clone(),
        },
    )
}

/// Consumes a draw opportunity: `cards_to_draw` cards leave the shuffled deck, uniformly at
/// random without replacement, and sit as the current draw until the hider picks.
pub fn draw_cards(db: &mut Database, code: &str, draw_id: &str) -> Result<Response<Body>, ApiError> {
    let draw_id: u64 = draw_id.parse().map_err(ApiError::bad_request)?;
    let lobby = db.lobby_mut(code)?;
    let idx = lobby
        .draw_opportunities
        .iter()
        .position(|o| o.draw_id == draw_id)
        .ok_or(ApiError::NotFound)?;
    if lobby.current_draw.is_some() {
        return Err(ApiError::Conflict);
    }
    let opportunity = lobby.draw_opportunities.remove(idx);

    if lobby.remaining_cards.is_empty() {
        lobby.remaining_cards = catalog();
    }
    let mut rng = rand::thread_rng();
    let mut cards = Vec::new();
    for _ in 0..opportunity.cards_to_draw {
        if lobby.remaining_cards.is_empty() {
            break;
        }
        let i = rng.gen_range(0..lobby.remaining_cards.len());
        cards.push(lobby.remaining_cards.remove(i));
    }
    lobby.current_draw = Some(CurrentDraw {
        cards,
        to_pick: opportunity.cards_to_pick,
    });
    Ok(empty_response(StatusCode::OK))
}

pub fn current_draw(db: &Database, code: &str) -> Result<Response<Body>, ApiError> {
    let lobby = db.lobby(code)?;
    match &lobby.current_draw {
        Some(draw) => json_response(StatusCode::OK, draw),
        None => json_response(StatusCode::OK, &CurrentDraw::empty()),
    }
}

/// Resolves the current draw: exactly `to_pick` distinct indexes move into the hider's deck
/// (stamped with their activation instant), the rest go back into the remaining pile.
pub fn pick_cards(
    db: &mut Database,
    code: &str,
    user: UserID,
    body: &[u8],
) -> Result<Response<Body>, ApiError> {
    let req: PickRequest = serde_json::from_slice(body).map_err(ApiError::bad_request)?;
    let lobby = db.lobby_mut(code)?;
    if lobby.role_of(user) != Some(Role::Hider) {
        return Err(ApiError::Forbidden);
    }
    let draw = lobby.current_draw.clone().ok_or(ApiError::Conflict)?;
    if req.picks.len() != draw.to_pick as usize {
        return Err(ApiError::bad_request(anyhow!(
            "picked {} cards, expected {}",
            req.picks.len(),
            draw.to_pick
        )));
    }
    let mut picks = req.picks.clone();
    picks.sort_unstable();
    picks.dedup();
    if picks.len() != req.picks.len() || picks.iter().any(|i| *i >= draw.cards.len()) {
        return Err(ApiError::bad_request(anyhow!("bad pick indexes")));
    }

    let now = Utc::now();
    for (i, mut card) in draw.cards.into_iter().enumerate() {
        if picks.contains(&i) {
            card.activated = Some(now);
            lobby.hider_deck.push(card);
        } else {
            lobby.remaining_cards.push(card);
        }
    }
    lobby.current_draw = None;
    Ok(empty_response(StatusCode::OK))
}

pub fn deck(db: &Database, code: &str, user: UserID) -> Result<Response<Body>, ApiError> {
    let lobby = db.lobby(code)?;
    if lobby.role_of(user) != Some(Role::Hider) {
        return Err(ApiError::Forbidden);
    }
    json_response(StatusCode::OK, &lobby.hider_deck)
}
