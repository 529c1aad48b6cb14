use super::*;

#[test]
fn parses_tagged_events_and_skips_comments() {
    let text = r##"
# draw a rectangle
{"type":"tool","tool":"rect"}
{"type":"down","x":20,"y":20}

{"type":"up","x":80,"y":60}
{"type":"arm_crop"}
{"type":"wheel","x":1,"y":2,"dy":-3}
"##;
    let events = parse(text).unwrap();
    assert_eq!(
        events,
        vec![
            (3, ScriptEvent::Tool { tool: Tool::Rect }),
            (4, ScriptEvent::Down { x: 20.0, y: 20.0 }),
            (6, ScriptEvent::Up { x: 80.0, y: 60.0 }),
            (7, ScriptEvent::ArmCrop),
            (8, ScriptEvent::Wheel { x: 1.0, y: 2.0, dx: 0.0, dy: -3.0 }),
        ]
    );
}

#[test]
fn reports_line_of_bad_event() {
    let err = parse("{\"type\":\"down\",\"x\":1,\"y\":1}\n{\"type\":\"jump\"}").unwrap_err();
    assert!(matches!(err, ScriptError::Parse { line: 2, .. }));
    assert!(err.to_string().starts_with("line 2:"));
}

#[test]
fn pointer_events_become_commands() {
    let step = ScriptEvent::Move { x: 3.0, y: 4.0 }.into_step(1).unwrap();
    assert!(matches!(step, Step::Send(Command::PointerMove(p)) if p == Point::new(3.0, 4.0)));

    let step = ScriptEvent::Key { key: "Escape".into() }.into_step(1).unwrap();
    assert!(matches!(step, Step::Send(Command::KeyDown(Key(k))) if k == "Escape"));
}

#[test]
fn color_is_parsed_as_hex() {
    let step = ScriptEvent::Color { color: "#ff0000".into() }.into_step(1).unwrap();
    assert!(matches!(step, Step::Send(Command::SetColor(c)) if c == Rgb::new(255, 0, 0)));

    let err = ScriptEvent::Color { color: "red".into() }.into_step(9).unwrap_err();
    assert!(matches!(err, ScriptError::Color { line: 9, .. }));
}

#[test]
fn upload_and_predict_are_driver_steps() {
    let step = ScriptEvent::Upload { path: "a.png".into() }.into_step(1).unwrap();
    assert!(matches!(step, Step::Upload(p) if p == std::path::Path::new("a.png")));
    assert!(matches!(ScriptEvent::Predict.into_step(1).unwrap(), Step::Predict));
}
