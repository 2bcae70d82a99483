use super::*;
use crate::core::{JointRole, SegmentId};
use approx::assert_relative_eq;

/// Kamera, bei der ein Pixel exakt einer Karteneinheit entspricht.
fn one_to_one_camera() -> Camera2D {
    let mut camera = Camera2D::new(DVec2::splat(4096.0));
    camera.look_at(DVec2::splat(2048.0));
    camera
}

fn long_corner() -> PathFeature {
    PathFeature::line_string(
        7,
        vec![
            Vector2::new(0.0, 0.0),
            Vector2::new(90.0, 0.0),
            Vector2::new(90.0, 90.0),
        ],
    )
}

fn session_with_corner() -> (EditSession, ChainId) {
    let mut session = EditSession::new(
        one_to_one_camera(),
        MarkerOverlay::new(),
        EditorOptions::default(),
    );
    let id = session.add_feature(long_corner()).expect("gültiges Feature");
    (session, id)
}

fn click(session: &mut EditSession, pixel: DVec2, modifiers: Modifiers) {
    session.pointer_move(pixel);
    assert!(session.pointer_down(pixel), "Punkt unter dem Zeiger erwartet");
    session
        .pointer_up(pixel, modifiers)
        .expect("Up ohne Fehler");
}

// ── Hover ──

#[test]
fn test_hover_curve_interior() {
    let (mut session, id) = session_with_corner();
    session.pointer_move(DVec2::new(45.0, 1.0));

    let SessionState::Hovering(target) = session.state() else {
        panic!("Hover erwartet, Zustand: {:?}", session.state());
    };
    assert_eq!(target.chain, id);
    assert!(!target.handle.is_snapable());
    assert_eq!(session.overlay().vertex(), Some(Vector2::new(45.0, 0.0)));
}

#[test]
fn test_hover_prefers_joint_within_tolerance() {
    let (mut session, _) = session_with_corner();
    session.pointer_move(DVec2::new(88.0, 3.0));

    let target = session.state().target().expect("Ziel erwartet");
    let Handle::Joint { role, .. } = target.handle else {
        panic!("Gelenk erwartet, erhalten: {:?}", target.handle);
    };
    assert_eq!(role, JointRole::Main);
    assert_eq!(session.overlay().vertex(), Some(Vector2::new(90.0, 0.0)));
}

#[test]
fn test_hover_outside_tolerance_goes_idle() {
    let (mut session, _) = session_with_corner();
    session.pointer_move(DVec2::new(45.0, 1.0));
    assert!(session.overlay().vertex().is_some());

    session.pointer_move(DVec2::new(45.0, 40.0));
    assert_eq!(session.state(), SessionState::Idle);
    assert!(session.overlay().vertex().is_none());
}

#[test]
fn test_pointer_down_without_hover_does_not_drag() {
    let (mut session, id) = session_with_corner();
    assert!(!session.pointer_down(DVec2::new(300.0, 300.0)));
    session
        .pointer_drag(DVec2::new(10.0, 10.0))
        .expect("Drag ohne Ziel ist kein Fehler");
    assert_eq!(session.state(), SessionState::Idle);
    assert_eq!(session.chain(id).expect("Kette").segment_count(), 2);
}

// ── Drag ──

#[test]
fn test_drag_curve_point_splits_and_rebinds() {
    let (mut session, id) = session_with_corner();
    session.pointer_move(DVec2::new(45.0, 1.0));
    assert!(session.pointer_down(DVec2::new(45.0, 1.0)));
    session
        .pointer_drag(DVec2::new(45.0, 20.0))
        .expect("Drag erfolgreich");

    let chain = session.chain(id).expect("Kette");
    assert_eq!(chain.segment_count(), 3);

    let SessionState::Dragging { target, moved } = session.state() else {
        panic!("Drag erwartet");
    };
    assert!(moved);
    let Handle::Joint { role, .. } = target.handle else {
        panic!("Gelenk-Handle erwartet");
    };
    assert_eq!(role, JointRole::Main);
    assert_eq!(
        chain.handle_coordinate(target.handle),
        Some(Vector2::new(45.0, 20.0))
    );
    assert_eq!(session.overlay().vertex(), Some(Vector2::new(45.0, 20.0)));

    // Weitere Drags bewegen denselben Handle, kein weiterer Split
    session
        .pointer_drag(DVec2::new(46.0, 25.0))
        .expect("Drag erfolgreich");
    assert_eq!(session.chain(id).expect("Kette").segment_count(), 3);
    assert_eq!(session.state().target().map(|t| t.handle), Some(target.handle));
}

#[test]
fn test_moves_during_drag_are_ignored() {
    let (mut session, _) = session_with_corner();
    session.pointer_move(DVec2::new(45.0, 1.0));
    session.pointer_down(DVec2::new(45.0, 1.0));
    let before = session.state();

    session.pointer_move(DVec2::new(500.0, 500.0));
    assert_eq!(session.state(), before);
}

#[test]
fn test_pointer_up_reindexes_chain() {
    let (mut session, id) = session_with_corner();
    let initial = session.indexed_extent(id).expect("indexiert");
    assert_eq!(initial.min.y, 0.0);

    session.pointer_move(DVec2::new(45.0, 1.0));
    session.pointer_down(DVec2::new(45.0, 1.0));
    session
        .pointer_drag(DVec2::new(45.0, -20.0))
        .expect("Drag erfolgreich");

    // Der grobe Index wird erst beim Loslassen aktualisiert
    assert_eq!(session.indexed_extent(id), Some(initial));

    session
        .pointer_up(DVec2::new(45.0, -20.0), Modifiers::NONE)
        .expect("Up erfolgreich");
    let refreshed = session.indexed_extent(id).expect("indexiert");
    assert_relative_eq!(refreshed.min.y, -20.0);
    assert_eq!(session.state(), SessionState::Idle);
    assert!(session.overlay().vertex().is_none());
    assert_eq!(session.chain(id).expect("Kette").segment_count(), 3);
}

// ── Klick ──

#[test]
fn test_click_on_interior_main_merges() {
    let (mut session, id) = session_with_corner();
    click(&mut session, DVec2::new(90.0, 1.0), Modifiers::NONE);

    let chain = session.chain(id).expect("Kette");
    assert_eq!(chain.segment_count(), 1);
    assert_eq!(session.state(), SessionState::Idle);
    let merged = chain.segments().next().map(|(_, s)| s.control_points());
    let merged = merged.expect("Segment");
    assert_eq!(merged[0], Vector2::new(0.0, 0.0));
    assert_eq!(merged[3], Vector2::new(90.0, 90.0));
}

#[test]
fn test_click_with_modifier_keeps_joint() {
    let (mut session, id) = session_with_corner();
    click(&mut session, DVec2::new(90.0, 1.0), Modifiers::SHIFT);
    assert_eq!(session.chain(id).expect("Kette").segment_count(), 2);
}

#[test]
fn test_click_on_boundary_main_is_noop() {
    let (mut session, id) = session_with_corner();
    click(&mut session, DVec2::new(1.0, 1.0), Modifiers::NONE);
    assert_eq!(session.chain(id).expect("Kette").segment_count(), 2);
}

#[test]
fn test_click_on_tangent_resets_it() {
    let (mut session, id) = session_with_corner();

    // Tangente (60, 0) von S0 nach oben ziehen
    session.pointer_move(DVec2::new(60.0, 1.0));
    session.pointer_down(DVec2::new(60.0, 1.0));
    session
        .pointer_drag(DVec2::new(60.0, 15.0))
        .expect("Drag erfolgreich");
    session
        .pointer_up(DVec2::new(60.0, 15.0), Modifiers::NONE)
        .expect("Up erfolgreich");

    let first = |session: &EditSession| {
        session
            .chain(id)
            .and_then(|c| c.segments().next().map(|(_, s)| s.control_points()))
            .expect("Segment")
    };
    assert_eq!(first(&session)[2], Vector2::new(60.0, 15.0));

    click(&mut session, DVec2::new(60.0, 15.0), Modifiers::NONE);
    let reset = first(&session)[2];
    assert_relative_eq!(reset.x, 60.0);
    assert_relative_eq!(reset.y, 0.0);
    assert_eq!(session.chain(id).expect("Kette").segment_count(), 2);
}

// ── Registrierung ──

#[test]
fn test_add_feature_rejects_point() {
    let mut session = EditSession::new(
        one_to_one_camera(),
        MarkerOverlay::new(),
        EditorOptions::default(),
    );
    let feature = PathFeature {
        id: 3,
        geometry: crate::core::FeatureGeometry::Point(Vector2::ZERO),
        bezier: None,
    };
    let err = session.add_feature(feature).expect_err("Point ist nicht editierbar");
    assert!(format!("{:#}", err).contains("Feature 3"));
    assert_eq!(session.chains().count(), 0);
}

#[test]
fn test_add_feature_shows_handle_lines() {
    let (session, id) = session_with_corner();
    let Some(Marker::HandleLines(lines)) = session.overlay().get(MarkerKey::HandleLines(id))
    else {
        panic!("Tangenten-Marker erwartet");
    };
    assert_eq!(lines.len(), 4);
}

#[test]
fn test_handle_lines_hidden_by_option() {
    let options = EditorOptions {
        show_tangent_handles: false,
        ..EditorOptions::default()
    };
    let mut session = EditSession::new(one_to_one_camera(), MarkerOverlay::new(), options);
    session.add_feature(long_corner()).expect("gültiges Feature");
    assert!(session.overlay().is_empty());
}

#[test]
fn test_remove_feature_clears_state() {
    let (mut session, id) = session_with_corner();
    session.pointer_move(DVec2::new(45.0, 1.0));
    assert!(session.state().target().is_some());

    let feature = session.remove_feature(id).expect("Feature erwartet");
    assert_eq!(feature.id, 7);
    assert!(feature.bezier.is_some());
    assert_eq!(session.state(), SessionState::Idle);
    assert!(session.overlay().is_empty());
    assert!(session.indexed_extent(id).is_none());
    assert!(session.remove_feature(id).is_none());

    session.pointer_move(DVec2::new(45.0, 1.0));
    assert_eq!(session.state(), SessionState::Idle);
}

#[test]
fn test_nearest_chain_wins() {
    let (mut session, first) = session_with_corner();
    let second = session
        .add_feature(PathFeature::line_string(
            8,
            vec![Vector2::new(0.0, 6.0), Vector2::new(90.0, 6.0)],
        ))
        .expect("gültiges Feature");

    session.pointer_move(DVec2::new(45.0, 4.0));
    let target = session.state().target().expect("Ziel erwartet");
    assert_eq!(target.chain, second);

    session.pointer_move(DVec2::new(45.0, 2.0));
    let target = session.state().target().expect("Ziel erwartet");
    assert_eq!(target.chain, first);
}

#[test]
fn test_many_identical_features_stay_editable() {
    let mut session = EditSession::new(
        one_to_one_camera(),
        MarkerOverlay::new(),
        EditorOptions::default(),
    );
    let ids: Vec<ChainId> = (0..40)
        .map(|i| {
            session
                .add_feature(PathFeature::line_string(
                    i,
                    vec![Vector2::new(0.0, 0.0), Vector2::new(90.0, 0.0)],
                ))
                .expect("gültiges Feature")
        })
        .collect();

    // Gleich weit entfernt: die zuerst registrierte Kette gewinnt
    session.pointer_move(DVec2::new(45.0, 1.0));
    let target = session.state().target().expect("Ziel erwartet");
    assert_eq!(target.chain, ids[0]);

    // Drag + Up aktualisiert den Index (Entfernen + Einfügen)
    session.pointer_down(DVec2::new(45.0, 1.0));
    session
        .pointer_drag(DVec2::new(45.0, 1.0))
        .expect("Drag erfolgreich");
    session
        .pointer_up(DVec2::new(45.0, 1.0), Modifiers::NONE)
        .expect("Up erfolgreich");
    assert_eq!(session.chain(ids[0]).expect("Kette").segment_count(), 2);

    for id in &ids[1..] {
        assert!(session.remove_feature(*id).is_some());
    }
    session.pointer_move(DVec2::new(20.0, 1.0));
    let target = session.state().target().expect("Ziel erwartet");
    assert_eq!(target.chain, ids[0]);
}

// ── Dispatch ──

#[test]
fn test_handle_event_dispatch() {
    let (mut session, id) = session_with_corner();
    let events = [
        PointerEvent::Move {
            pixel: DVec2::new(45.0, 1.0),
        },
        PointerEvent::Down {
            pixel: DVec2::new(45.0, 1.0),
        },
        PointerEvent::Drag {
            pixel: DVec2::new(40.0, 10.0),
        },
        PointerEvent::Up {
            pixel: DVec2::new(40.0, 10.0),
            modifiers: Modifiers::NONE,
        },
    ];
    for event in events {
        session.handle_event(event).expect("Event verarbeitet");
    }
    let chain = session.chain(id).expect("Kette");
    assert_eq!(chain.segment_count(), 3);
    let segment_ids: Vec<SegmentId> = chain.segments().map(|(sid, _)| sid).collect();
    assert_eq!(segment_ids.len(), 3);
    assert_eq!(
        chain.segment(segment_ids[0]).map(|s| s.end()),
        Some(Vector2::new(40.0, 10.0))
    );
}
