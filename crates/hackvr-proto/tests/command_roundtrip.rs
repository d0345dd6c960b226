//! Round-trip and binding-rule tests for the command vocabularies.

use hackvr_proto::{
    ClientCommand, CommandError, Frame, Parser, ServerCommand,
    error::ParseError,
    value::{Anchor, Bytes32, Color, Euler, SessionToken, SizeMode, Vec2, Vec3},
};

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(ToString::to_string).collect()
}

fn client_round_trip(command: &ClientCommand) {
    let params = command.params();
    let parsed = ClientCommand::parse(command.name(), &params)
        .unwrap_or_else(|error| panic!("{} did not round-trip: {error}", command.name()));
    assert_eq!(&parsed, command);
}

#[test]
fn client_commands_round_trip() {
    let commands = [
        ClientCommand::Chat { user: "alice".parse().unwrap(), message: "hi".into() },
        ClientCommand::RequestUser { prompt: String::new() },
        ClientCommand::RequestAuthentication {
            user: "alice".parse().unwrap(),
            nonce: "0f".repeat(16).parse().unwrap(),
        },
        ClientCommand::AcceptUser { user: "alice".parse().unwrap() },
        ClientCommand::RejectUser { user: "bob".parse().unwrap(), reason: "nope".into() },
        ClientCommand::AnnounceSession { token: SessionToken([7; 32]), lifetime: Some(3600) },
        ClientCommand::AnnounceSession { token: SessionToken([7; 32]), lifetime: None },
        ClientCommand::RevokeSession { token: SessionToken([9; 32]) },
        ClientCommand::RequestInput { prompt: "name?".into(), default: None },
        ClientCommand::RequestInput { prompt: "name?".into(), default: Some("anon".into()) },
        ClientCommand::CancelInput,
        ClientCommand::SetBanner { text: Some("welcome".into()), duration: Some(2.5) },
        ClientCommand::SetBanner { text: None, duration: None },
        ClientCommand::CreateIntent { intent: "jump".parse().unwrap(), label: "Jump".into() },
        ClientCommand::DestroyIntent { intent: "jump".parse().unwrap() },
        ClientCommand::RaycastRequest,
        ClientCommand::RaycastCancel,
        ClientCommand::CreateGeometry { geom: "walls".into() },
        ClientCommand::DestroyGeometry { geom: "walls".into() },
        ClientCommand::AddTriangleList {
            geom: "walls".into(),
            tag: Some("north".parse().unwrap()),
            triangles: vec![
                (
                    Color([255, 0, 255]),
                    Vec3::new(0.0, 0.0, 0.0),
                    Vec3::new(1.0, 0.0, 0.0),
                    Vec3::new(0.0, 1.0, 0.0),
                ),
                (
                    Color([0, 16, 32]),
                    Vec3::new(0.0, 0.0, 1.0),
                    Vec3::new(1.0, 0.0, 1.0),
                    Vec3::new(0.0, 1.0, 1.0),
                ),
            ],
        },
        ClientCommand::AddTriangleList { geom: "walls".into(), tag: None, triangles: vec![] },
        ClientCommand::AddTriangleStrip {
            geom: "walls".into(),
            tag: None,
            color: Color([1, 2, 3]),
            p0: Vec3::new(0.0, 0.0, 0.0),
            p1: Vec3::new(1.0, 0.0, 0.0),
            p2: Vec3::new(0.0, 1.0, 0.0),
            positions: vec![Vec3::new(1.0, 1.0, 0.0), Vec3::new(2.0, 1.0, 0.0)],
        },
        ClientCommand::AddTriangleFan {
            geom: "disc".into(),
            tag: Some("rim".parse().unwrap()),
            color: Color([9, 9, 9]),
            p0: Vec3::new(0.0, 0.0, 0.0),
            p1: Vec3::new(1.0, 0.0, 0.0),
            p2: Vec3::new(0.5, 1.0, 0.0),
            positions: vec![],
        },
        ClientCommand::RemoveTriangles { geom: "walls".into(), tag: "north".into() },
        ClientCommand::CreateTextGeometry {
            geom: "sign".into(),
            size: Vec2::new(2.0, 0.5),
            uri: "https://assets.example/font.ttf".parse().unwrap(),
            sha256: Bytes32([0xAB; 32]),
            text: "EXIT".into(),
            anchor: Some(Anchor::TopCenter),
        },
        ClientCommand::CreateSpriteGeometry {
            geom: "logo".into(),
            size: Vec2::new(1.0, 1.0),
            uri: "https://assets.example/logo.png".parse().unwrap(),
            sha256: Bytes32([0x01; 32]),
            size_mode: Some(SizeMode::Contain),
            anchor: None,
        },
        ClientCommand::SetTextProperty {
            geom: "sign".into(),
            property: "text".into(),
            value: String::new(),
        },
        ClientCommand::CreateObject { object: "door".into(), geom: Some("walls".parse().unwrap()) },
        ClientCommand::CreateObject { object: "door".into(), geom: None },
        ClientCommand::DestroyObject { object: "door".into() },
        ClientCommand::ReparentObject {
            parent: "$world".parse().unwrap(),
            child: "door".into(),
            transform: None,
        },
        ClientCommand::SetObjectGeometry { object: "door".into(), geom: None },
        ClientCommand::SetObjectProperty {
            object: "door".into(),
            property: "visible".into(),
            value: "true".into(),
        },
        ClientCommand::SetObjectTransform {
            object: "door".into(),
            pos: Some(Vec3::new(1.0, 0.0, -2.5)),
            rot: Some(Euler::new(90.0, 0.0, 0.0)),
            scale: None,
            duration: Some(0.25),
        },
        ClientCommand::TrackObject {
            object: "$camera".into(),
            target: Some("door".parse().unwrap()),
            mode: None,
            duration: None,
        },
        ClientCommand::EnableFreeLook { enabled: true },
        ClientCommand::SetBackgroundColor { color: Color([16, 32, 48]) },
    ];
    for command in &commands {
        client_round_trip(command);
    }
}

#[test]
fn server_commands_round_trip() {
    let commands = [
        ServerCommand::Chat { message: "hello".into() },
        ServerCommand::SetUser { user: "alice".parse().unwrap() },
        ServerCommand::Authenticate {
            user: "alice".parse().unwrap(),
            signature: "7e".repeat(64).parse().unwrap(),
        },
        ServerCommand::ResumeSession { token: SessionToken([3; 32]) },
        ServerCommand::SendInput { text: String::new() },
        ServerCommand::TapObject {
            object: "door".parse().unwrap(),
            kind: "primary".parse().unwrap(),
            tag: "handle".parse().unwrap(),
        },
        ServerCommand::TellObject { object: "door".parse().unwrap(), text: "open".into() },
        ServerCommand::Intent {
            intent: "jump".parse().unwrap(),
            view_dir: Vec3::new(0.0, 0.0, 1.0),
        },
        ServerCommand::Raycast {
            origin: Vec3::new(0.0, 1.5, 0.0),
            direction: Vec3::new(0.0, -0.5, 1.0),
        },
        ServerCommand::RaycastCancel,
    ];
    for command in &commands {
        let parsed = ServerCommand::parse(command.name(), &command.params()).unwrap();
        assert_eq!(&parsed, command);
    }
}

#[test]
fn commands_survive_the_wire() {
    let command = ClientCommand::SetObjectTransform {
        object: "door".into(),
        pos: Some(Vec3::new(1.0, 2.0, 3.0)),
        rot: None,
        scale: None,
        duration: Some(1.0),
    };
    let mut parser = Parser::new();
    parser.push(&command.encode().unwrap());
    let Frame { name, params } = parser.pull().unwrap();
    assert_eq!(ClientCommand::parse(&name, &params).unwrap(), command);
}

#[test]
fn optional_parameters_absent_on_empty_token() {
    let command =
        ClientCommand::parse("set-banner", &strings(&["", ""])).unwrap();
    assert_eq!(command, ClientCommand::SetBanner { text: None, duration: None });

    let command = ClientCommand::parse("set-banner", &strings(&["hi", "2"])).unwrap();
    assert_eq!(
        command,
        ClientCommand::SetBanner { text: Some("hi".into()), duration: Some(2.0) }
    );
}

#[test]
fn tuple_list_alignment() {
    // Zero trailing tokens: an empty list.
    let command = ClientCommand::parse("add-triangle-list", &strings(&["geo", ""])).unwrap();
    assert_eq!(
        command,
        ClientCommand::AddTriangleList { geom: "geo".into(), tag: None, triangles: vec![] }
    );

    // A non-multiple-of-four payload is an arity error.
    assert_eq!(
        ClientCommand::parse(
            "add-triangle-list",
            &strings(&["geo", "", "#ffffff", "(0 0 0)", "(1 0 0)"]),
        ),
        Err(CommandError::TupleMisaligned)
    );
}

#[test]
fn type_failures_never_build_a_command() {
    assert_eq!(
        ClientCommand::parse("set-background-color", &strings(&["red"])),
        Err(CommandError::Parse(ParseError::InvalidColor))
    );
    assert_eq!(
        ClientCommand::parse("enable-free-look", &strings(&["yes"])),
        Err(CommandError::Parse(ParseError::InvalidBool))
    );
    assert_eq!(ClientCommand::parse("warp", &[]), Err(CommandError::UnknownCommand));
}
