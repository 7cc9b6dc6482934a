//! Relationship derivation exercised through the public service functions,
//! with edges built by hand rather than read from Postgres.

use chrono::Utc;
use uuid::Uuid;

use cinelog::models::{Friendship, FriendshipStatus, RelationshipState};
use cinelog::services::friends::{can_view_friend_data, derive_relationship, relationship_map};

fn edge(requester: Uuid, addressee: Uuid, status: FriendshipStatus) -> Friendship {
    Friendship {
        id: Uuid::new_v4(),
        requester_id: requester,
        addressee_id: addressee,
        status,
        created_at: Utc::now(),
    }
}

#[test]
fn no_edge_means_no_relationship() {
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    assert_eq!(derive_relationship(a, &[], b), RelationshipState::None);
}

#[test]
fn own_account_wins_over_any_edge() {
    let a = Uuid::new_v4();
    let edges = [edge(a, a, FriendshipStatus::Accepted)];
    assert_eq!(derive_relationship(a, &edges, a), RelationshipState::Own);
}

#[test]
fn pending_edge_direction_determines_sent_or_received() {
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    let edges = [edge(a, b, FriendshipStatus::Pending)];

    assert_eq!(
        derive_relationship(a, &edges, b),
        RelationshipState::PendingSent
    );
    assert_eq!(
        derive_relationship(b, &edges, a),
        RelationshipState::PendingReceived
    );
}

#[test]
fn accepted_edge_is_symmetric() {
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    let edges = [edge(a, b, FriendshipStatus::Accepted)];

    assert_eq!(
        derive_relationship(a, &edges, b),
        RelationshipState::Friends
    );
    assert_eq!(
        derive_relationship(b, &edges, a),
        RelationshipState::Friends
    );
}

#[test]
fn only_friends_can_view_friend_data() {
    assert!(can_view_friend_data(RelationshipState::Friends));
    assert!(!can_view_friend_data(RelationshipState::Own));
    assert!(!can_view_friend_data(RelationshipState::PendingSent));
    assert!(!can_view_friend_data(RelationshipState::PendingReceived));
    assert!(!can_view_friend_data(RelationshipState::None));
}

#[test]
fn relationship_map_annotates_a_whole_search_page() {
    let viewer = Uuid::new_v4();
    let friend = Uuid::new_v4();
    let requested = Uuid::new_v4();
    let stranger = Uuid::new_v4();

    let edges = [
        edge(viewer, friend, FriendshipStatus::Accepted),
        edge(requested, viewer, FriendshipStatus::Pending),
    ];
    let candidates = [viewer, friend, requested, stranger];

    let map = relationship_map(viewer, &edges, &candidates);

    assert_eq!(map[&viewer], RelationshipState::Own);
    assert_eq!(map[&friend], RelationshipState::Friends);
    assert_eq!(map[&requested], RelationshipState::PendingReceived);
    assert_eq!(map[&stranger], RelationshipState::None);
}
