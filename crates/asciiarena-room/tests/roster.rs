//! Roster scenarios spanning several rounds.

use asciiarena_protocol::{EntityId, LoginStatus};
use asciiarena_room::{Room, RoomConfig};
use asciiarena_transport::Endpoint;

fn three_seat_room() -> Room {
    Room::new(RoomConfig {
        players: 3,
        points_to_win: 2,
    })
}

// =========================================================================
// Logins
// =========================================================================

#[test]
fn test_room_fills_in_login_order() {
    let mut room = three_seat_room();
    for (i, c) in ["C", "A", "B"].into_iter().enumerate() {
        assert_eq!(room.login(c, Endpoint::new(i as u64)), LoginStatus::Logged);
    }
    assert!(room.is_complete());
    assert_eq!(room.characters(), vec!['C', 'A', 'B']);
    assert_eq!(room.login("D", Endpoint::new(9)), LoginStatus::RoomCompleted);
}

#[test]
fn test_reconnection_never_duplicates_an_entry() {
    let mut room = three_seat_room();
    room.login("A", Endpoint::new(1));

    for round in 0..5u64 {
        room.detach(Endpoint::new(1 + round));
        assert_eq!(
            room.login("A", Endpoint::new(2 + round)),
            LoginStatus::Reconnected
        );
    }
    assert_eq!(room.len(), 1);
    assert_eq!(room.endpoints(), vec![Endpoint::new(6)]);
}

#[test]
fn test_two_sockets_cannot_share_a_character() {
    let mut room = three_seat_room();
    assert_eq!(room.login("A", Endpoint::new(1)), LoginStatus::Logged);
    assert_eq!(room.login("A", Endpoint::new(2)), LoginStatus::AlreadyExists);
    assert_eq!(room.player('A').unwrap().endpoint(), Some(Endpoint::new(1)));
}

// =========================================================================
// Rounds
// =========================================================================

#[test]
fn test_points_accumulate_across_arenas() {
    let mut room = three_seat_room();
    room.login("A", Endpoint::new(1));
    room.login("B", Endpoint::new(2));
    room.login("C", Endpoint::new(3));

    // Round one: entities 0..3, 'A' survives.
    for (i, c) in room.characters().into_iter().enumerate() {
        room.attach_entity(c, EntityId(i as u32)).unwrap();
    }
    room.add_point('A').unwrap();
    assert!(room.winners().is_empty());

    // Round two: fresh entity bindings, 'A' survives again.
    room.release_entities();
    assert!(room.players().all(|p| p.entity().is_none()));
    room.add_point('A').unwrap();
    assert_eq!(room.winners(), vec!['A']);

    // Reset after the series.
    room.clear();
    assert!(room.winners().is_empty());
    assert!(room.endpoints().is_empty());
}
