use std::{collections::HashMap, sync::Arc};

use lane_defence_core::{CommandRejected, EntityId, Event, Host, Route, Vec3, Waypoint};
use lane_defence_system_follower::{Follower, FollowerError, FollowerState};

#[derive(Debug, Default)]
struct ScriptedHost {
    positions: HashMap<EntityId, Vec3>,
    moves: Vec<(EntityId, Vec3)>,
    halts: Vec<EntityId>,
    reject_moves_after: Option<usize>,
}

impl ScriptedHost {
    fn place(&mut self, entity: EntityId, position: Vec3) {
        let _ = self.positions.insert(entity, position);
    }
}

impl Host for ScriptedHost {
    fn issue_move(&mut self, entity: EntityId, destination: Vec3) -> Result<(), CommandRejected> {
        if let Some(limit) = self.reject_moves_after {
            if self.moves.len() >= limit {
                return Err(CommandRejected::new(entity, "unit is busy"));
            }
        }
        self.moves.push((entity, destination));
        Ok(())
    }

    fn issue_halt(&mut self, entity: EntityId) -> Result<(), CommandRejected> {
        self.halts.push(entity);
        Ok(())
    }

    fn position(&self, entity: EntityId) -> Option<Vec3> {
        self.positions.get(&entity).copied()
    }

    fn create_entity(
        &mut self,
        _kind: &str,
        _position: Vec3,
        _owner: u32,
    ) -> Result<EntityId, CommandRejected> {
        Err(CommandRejected::unbound("scripted host does not spawn"))
    }

    fn release(&mut self, entity: EntityId) {
        let _ = self.positions.remove(&entity);
    }
}

fn corner_route() -> Arc<Route> {
    Arc::new(Route::new(
        "corner",
        vec![
            Waypoint::new(Vec3::new(0.0, 0.0, 0.0), "gate"),
            Waypoint::new(Vec3::new(10.0, 0.0, 0.0), "bend"),
            Waypoint::new(Vec3::new(10.0, 10.0, 0.0), "goal"),
        ],
        false,
    ))
}

#[test]
fn walks_corner_route_and_completes_once() {
    let entity = EntityId::new(1);
    let mut host = ScriptedHost::default();
    host.place(entity, Vec3::ZERO);

    let mut follower = Follower::new(entity, corner_route(), 1.0);
    follower.start(&mut host).expect("start");
    assert_eq!(follower.state(), FollowerState::Moving);
    assert_eq!(follower.current_target(), Some(0));
    assert_eq!(host.moves, vec![(entity, Vec3::ZERO)]);

    let mut events = Vec::new();
    let _ = follower.advance(&mut host, &mut events);
    assert_eq!(events, vec![Event::WaypointReached { entity, index: 0 }]);
    assert_eq!(follower.current_target(), Some(1));
    assert_eq!(follower.current_index(), 0);

    host.place(entity, Vec3::new(9.5, 0.4, 0.0));
    events.clear();
    let _ = follower.advance(&mut host, &mut events);
    assert_eq!(events, vec![Event::WaypointReached { entity, index: 1 }]);
    assert_eq!(follower.current_index(), 1);
    assert_eq!(host.moves.last(), Some(&(entity, Vec3::new(10.0, 10.0, 0.0))));
    assert!((follower.progress() - 0.5).abs() < f32::EPSILON);

    host.place(entity, Vec3::new(10.0, 10.0, 0.0));
    events.clear();
    let state = follower.advance(&mut host, &mut events);
    assert_eq!(state, FollowerState::Completed);
    assert_eq!(
        events,
        vec![
            Event::WaypointReached { entity, index: 2 },
            Event::RouteCompleted { entity },
        ]
    );
    assert_eq!(follower.current_target(), None);
    assert_eq!(follower.progress(), 1.0);
}

#[test]
fn stays_moving_until_within_threshold() {
    let entity = EntityId::new(2);
    let mut host = ScriptedHost::default();
    host.place(entity, Vec3::new(-5.0, 0.0, 0.0));

    let mut follower = Follower::new(entity, corner_route(), 1.0);
    follower.start(&mut host).expect("start");

    let mut events = Vec::new();
    for _ in 0..3 {
        assert_eq!(
            follower.advance(&mut host, &mut events),
            FollowerState::Moving
        );
    }
    assert!(events.is_empty());
    assert_eq!(host.moves.len(), 1, "no re-issue while travelling");
}

#[test]
fn advance_after_completion_is_silent() {
    let entity = EntityId::new(3);
    let route = Arc::new(Route::new(
        "dot",
        vec![Waypoint::new(Vec3::ZERO, "goal")],
        false,
    ));
    let mut host = ScriptedHost::default();
    host.place(entity, Vec3::ZERO);

    let mut follower = Follower::new(entity, route, 0.5);
    follower.start(&mut host).expect("start");
    let mut events = Vec::new();
    assert_eq!(
        follower.advance(&mut host, &mut events),
        FollowerState::Completed
    );

    let moves_before = host.moves.len();
    events.clear();
    for _ in 0..4 {
        let _ = follower.advance(&mut host, &mut events);
    }
    assert!(events.is_empty());
    assert_eq!(host.moves.len(), moves_before);
}

#[test]
fn stopping_completed_follower_issues_no_halt() {
    let entity = EntityId::new(5);
    let route = Arc::new(Route::new(
        "dot",
        vec![Waypoint::new(Vec3::ZERO, "goal")],
        false,
    ));
    let mut host = ScriptedHost::default();
    host.place(entity, Vec3::ZERO);

    let mut follower = Follower::new(entity, route, 0.5);
    follower.start(&mut host).expect("start");
    let mut events = Vec::new();
    assert_eq!(
        follower.advance(&mut host, &mut events),
        FollowerState::Completed
    );

    follower.stop(&mut host);
    assert_eq!(follower.state(), FollowerState::Stopped);
    assert!(host.halts.is_empty());
}

#[test]
fn stop_halts_and_suppresses_notifications() {
    let entity = EntityId::new(4);
    let mut host = ScriptedHost::default();
    host.place(entity, Vec3::ZERO);

    let mut follower = Follower::new(entity, corner_route(), 1.0);
    follower.start(&mut host).expect("start");
    follower.stop(&mut host);
    follower.stop(&mut host);

    assert_eq!(follower.state(), FollowerState::Stopped);
    assert_eq!(host.halts, vec![entity], "second stop is a no-op");

    let mut events = Vec::new();
    assert_eq!(
        follower.advance(&mut host, &mut events),
        FollowerState::Stopped
    );
    assert!(events.is_empty());
    assert_eq!(host.moves.len(), 1);
}

#[test]
fn empty_route_cannot_start() {
    let mut host = ScriptedHost::default();
    let mut follower = Follower::new(
        EntityId::new(5),
        Arc::new(Route::new("void", Vec::new(), false)),
        1.0,
    );

    assert_eq!(
        follower.start(&mut host),
        Err(FollowerError::EmptyRoute {
            route: "void".to_owned()
        })
    );
    assert_eq!(follower.state(), FollowerState::Idle);
    assert!(host.moves.is_empty());
}

#[test]
fn second_start_is_rejected() {
    let entity = EntityId::new(6);
    let mut host = ScriptedHost::default();
    host.place(entity, Vec3::ZERO);
    let mut follower = Follower::new(entity, corner_route(), 1.0);
    follower.start(&mut host).expect("start");

    assert_eq!(
        follower.start(&mut host),
        Err(FollowerError::NotIdle {
            state: FollowerState::Moving
        })
    );
    assert_eq!(host.moves.len(), 1);
}

#[test]
fn rejected_initial_move_stops_follower() {
    let entity = EntityId::new(7);
    let mut host = ScriptedHost {
        reject_moves_after: Some(0),
        ..ScriptedHost::default()
    };
    host.place(entity, Vec3::ZERO);

    let mut follower = Follower::new(entity, corner_route(), 1.0);
    let error = follower.start(&mut host).expect_err("move must be rejected");
    assert!(matches!(error, FollowerError::MoveRejected(_)));
    assert_eq!(follower.state(), FollowerState::Stopped);
}

#[test]
fn rejected_retarget_stops_follower_without_retry() {
    let entity = EntityId::new(8);
    let mut host = ScriptedHost {
        reject_moves_after: Some(1),
        ..ScriptedHost::default()
    };
    host.place(entity, Vec3::ZERO);

    let mut follower = Follower::new(entity, corner_route(), 1.0);
    follower.start(&mut host).expect("start");

    let mut events = Vec::new();
    assert_eq!(
        follower.advance(&mut host, &mut events),
        FollowerState::Stopped
    );
    assert_eq!(events, vec![Event::WaypointReached { entity, index: 0 }]);

    events.clear();
    let _ = follower.advance(&mut host, &mut events);
    assert!(events.is_empty());
    assert_eq!(host.moves.len(), 1);
}

#[test]
fn lost_entity_stops_follower() {
    let entity = EntityId::new(9);
    let mut host = ScriptedHost::default();
    host.place(entity, Vec3::ZERO);

    let mut follower = Follower::new(entity, corner_route(), 1.0);
    follower.start(&mut host).expect("start");
    host.release(entity);

    let mut events = Vec::new();
    assert_eq!(
        follower.advance(&mut host, &mut events),
        FollowerState::Stopped
    );
    assert!(events.is_empty());
}

#[test]
fn looped_route_keeps_cycling() {
    let entity = EntityId::new(10);
    let route = Arc::new(Route::new(
        "patrol",
        vec![
            Waypoint::new(Vec3::new(0.0, 0.0, 0.0), "a"),
            Waypoint::new(Vec3::new(4.0, 0.0, 0.0), "b"),
        ],
        true,
    ));
    let mut host = ScriptedHost::default();
    let mut follower = Follower::new(entity, Arc::clone(&route), 0.1);
    host.place(entity, Vec3::ZERO);
    follower.start(&mut host).expect("start");

    let mut events = Vec::new();
    for lap in 0..6 {
        let index = follower.current_target().expect("looped routes always target");
        host.place(entity, route.waypoints()[index].position());
        assert_eq!(
            follower.advance(&mut host, &mut events),
            FollowerState::Moving,
            "lap {lap}"
        );
    }
    assert_eq!(events.len(), 6);
    assert!(!events
        .iter()
        .any(|event| matches!(event, Event::RouteCompleted { .. })));
}
