//! Server-to-client command set.

use crate::{
    codec,
    command::{Args, optional_float, optional_param},
    error::{CodecError, CommandError},
    value::{
        Anchor, Bytes16, Bytes32, Color, Euler, Identifier, ReparentMode, SessionToken,
        SizeMode, TrackMode, UserId, Uri, Vec2, Vec3, parse_bool, parse_float, parse_int,
    },
};

/// A triangle in an `add-triangle-list` payload: face color plus three
/// corners.
pub type Triangle = (Color, Vec3, Vec3, Vec3);

/// A command received by the client: everything the server may do to the
/// scene, the UI, and the session.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientCommand {
    /// Chat line attributed to a user.
    Chat {
        /// Originating user.
        user: UserId,
        /// Message text.
        message: String,
    },

    /// Ask the user to identify themselves.
    RequestUser {
        /// Prompt shown to the user; may be empty.
        prompt: String,
    },

    /// Challenge a user to prove a key.
    RequestAuthentication {
        /// User being challenged.
        user: UserId,
        /// Challenge nonce to sign.
        nonce: Bytes16,
    },

    /// The presented user was accepted.
    AcceptUser {
        /// Accepted user.
        user: UserId,
    },

    /// The presented user was rejected.
    RejectUser {
        /// Rejected user.
        user: UserId,
        /// Human-readable reason; may be empty.
        reason: String,
    },

    /// Grant a resumable session token.
    AnnounceSession {
        /// Token for later `resume-session`.
        token: SessionToken,
        /// Validity in seconds, if bounded.
        lifetime: Option<u64>,
    },

    /// Invalidate a previously announced session token.
    RevokeSession {
        /// Token being revoked.
        token: SessionToken,
    },

    /// Open a free-text input prompt.
    RequestInput {
        /// Prompt label.
        prompt: String,
        /// Pre-filled text, if any.
        default: Option<String>,
    },

    /// Dismiss the input prompt.
    CancelInput,

    /// Show or clear the banner line.
    SetBanner {
        /// Banner text; absent clears the banner.
        text: Option<String>,
        /// Seconds to keep it visible.
        duration: Option<f64>,
    },

    /// Register a selectable intent.
    CreateIntent {
        /// Intent identifier.
        intent: Identifier,
        /// Label shown to the user.
        label: String,
    },

    /// Remove a registered intent.
    DestroyIntent {
        /// Intent identifier.
        intent: Identifier,
    },

    /// Ask the client to start reporting raycasts.
    RaycastRequest,

    /// Stop an in-flight raycast request.
    RaycastCancel,

    /// Create an empty geometry container.
    CreateGeometry {
        /// Geometry name.
        geom: String,
    },

    /// Destroy a geometry and everything in it.
    DestroyGeometry {
        /// Geometry name.
        geom: String,
    },

    /// Append independent triangles to a geometry.
    AddTriangleList {
        /// Target geometry.
        geom: String,
        /// Optional tag for later selective removal.
        tag: Option<Identifier>,
        /// Colored triangles.
        triangles: Vec<Triangle>,
    },

    /// Append a triangle strip to a geometry.
    AddTriangleStrip {
        /// Target geometry.
        geom: String,
        /// Optional tag for later selective removal.
        tag: Option<Identifier>,
        /// Strip color.
        color: Color,
        /// First corner.
        p0: Vec3,
        /// Second corner.
        p1: Vec3,
        /// Third corner.
        p2: Vec3,
        /// Continuation vertices.
        positions: Vec<Vec3>,
    },

    /// Append a triangle fan to a geometry.
    AddTriangleFan {
        /// Target geometry.
        geom: String,
        /// Optional tag for later selective removal.
        tag: Option<Identifier>,
        /// Fan color.
        color: Color,
        /// Fan center.
        p0: Vec3,
        /// First rim vertex.
        p1: Vec3,
        /// Second rim vertex.
        p2: Vec3,
        /// Continuation rim vertices.
        positions: Vec<Vec3>,
    },

    /// Remove all triangles carrying a tag.
    RemoveTriangles {
        /// Target geometry.
        geom: String,
        /// Tag whose triangles are removed.
        tag: String,
    },

    /// Create a text quad.
    CreateTextGeometry {
        /// Geometry name.
        geom: String,
        /// Quad size in world units.
        size: Vec2,
        /// Font resource.
        uri: Uri,
        /// Expected SHA-256 of the resource.
        sha256: Bytes32,
        /// Initial text.
        text: String,
        /// Quad anchor, defaulting per client.
        anchor: Option<Anchor>,
    },

    /// Create an image quad.
    CreateSpriteGeometry {
        /// Geometry name.
        geom: String,
        /// Quad size in world units.
        size: Vec2,
        /// Image resource.
        uri: Uri,
        /// Expected SHA-256 of the resource.
        sha256: Bytes32,
        /// How the image fits the quad.
        size_mode: Option<SizeMode>,
        /// Quad anchor, defaulting per client.
        anchor: Option<Anchor>,
    },

    /// Update a property of a text geometry.
    SetTextProperty {
        /// Target geometry.
        geom: String,
        /// Property name.
        property: String,
        /// New value; may be empty.
        value: String,
    },

    /// Create a scene object.
    CreateObject {
        /// Object name.
        object: String,
        /// Geometry to attach, if any.
        geom: Option<Identifier>,
    },

    /// Destroy a scene object and its children.
    DestroyObject {
        /// Object name.
        object: String,
    },

    /// Move an object under a new parent.
    ReparentObject {
        /// New parent object.
        parent: Identifier,
        /// Object being moved.
        child: String,
        /// Whether world or local transform is preserved.
        transform: Option<ReparentMode>,
    },

    /// Swap the geometry attached to an object.
    SetObjectGeometry {
        /// Target object.
        object: String,
        /// New geometry; absent detaches.
        geom: Option<Identifier>,
    },

    /// Update a property of an object.
    SetObjectProperty {
        /// Target object.
        object: String,
        /// Property name.
        property: String,
        /// New value; may be empty.
        value: String,
    },

    /// Animate position/rotation/scale of an object.
    SetObjectTransform {
        /// Target object.
        object: String,
        /// New position, if changed.
        pos: Option<Vec3>,
        /// New rotation, if changed.
        rot: Option<Euler>,
        /// New scale, if changed.
        scale: Option<Vec3>,
        /// Animation duration in seconds.
        duration: Option<f64>,
    },

    /// Make an object follow another.
    TrackObject {
        /// Tracking object.
        object: String,
        /// Tracked target; absent stops tracking.
        target: Option<Identifier>,
        /// Tracking behavior.
        mode: Option<TrackMode>,
        /// Blend duration in seconds.
        duration: Option<f64>,
    },

    /// Enable or disable free camera look.
    EnableFreeLook {
        /// Whether free look is on.
        enabled: bool,
    },

    /// Set the sky color.
    SetBackgroundColor {
        /// New background color.
        color: Color,
    },
}

impl ClientCommand {
    /// Bind a received frame to a typed command.
    ///
    /// # Errors
    ///
    /// [`CommandError::UnknownCommand`] for a name outside this set;
    /// otherwise the first value parse failure, left to right.
    pub fn parse(name: &str, args: &[String]) -> Result<Self, CommandError> {
        let mut args = Args::new(args);
        match name {
            "chat" => Ok(Self::Chat {
                user: args.required(str::parse)?,
                message: args.string()?,
            }),
            "request-user" => Ok(Self::RequestUser { prompt: args.zstring() }),
            "request-authentication" => Ok(Self::RequestAuthentication {
                user: args.required(str::parse)?,
                nonce: args.required(str::parse)?,
            }),
            "accept-user" => Ok(Self::AcceptUser { user: args.required(str::parse)? }),
            "reject-user" => Ok(Self::RejectUser {
                user: args.required(str::parse)?,
                reason: args.zstring(),
            }),
            "announce-session" => Ok(Self::AnnounceSession {
                token: args.required(str::parse)?,
                lifetime: args.optional(parse_int)?,
            }),
            "revoke-session" => Ok(Self::RevokeSession { token: args.required(str::parse)? }),
            "request-input" => Ok(Self::RequestInput {
                prompt: args.string()?,
                default: args.optional_string(),
            }),
            "cancel-input" => Ok(Self::CancelInput),
            "set-banner" => Ok(Self::SetBanner {
                text: args.optional_string(),
                duration: args.optional(parse_float)?,
            }),
            "create-intent" => Ok(Self::CreateIntent {
                intent: args.required(str::parse)?,
                label: args.string()?,
            }),
            "destroy-intent" => {
                Ok(Self::DestroyIntent { intent: args.required(str::parse)? })
            }
            "raycast-request" => Ok(Self::RaycastRequest),
            "raycast-cancel" => Ok(Self::RaycastCancel),
            "create-geometry" => Ok(Self::CreateGeometry { geom: args.string()? }),
            "destroy-geometry" => Ok(Self::DestroyGeometry { geom: args.string()? }),
            "add-triangle-list" => Ok(Self::AddTriangleList {
                geom: args.string()?,
                tag: args.optional(str::parse)?,
                triangles: parse_triangles(&mut args)?,
            }),
            "add-triangle-strip" => {
                let (geom, tag, color, p0, p1, p2, positions) = parse_strip(&mut args)?;
                Ok(Self::AddTriangleStrip { geom, tag, color, p0, p1, p2, positions })
            }
            "add-triangle-fan" => {
                let (geom, tag, color, p0, p1, p2, positions) = parse_strip(&mut args)?;
                Ok(Self::AddTriangleFan { geom, tag, color, p0, p1, p2, positions })
            }
            "remove-triangles" => Ok(Self::RemoveTriangles {
                geom: args.string()?,
                tag: args.string()?,
            }),
            "create-text-geometry" => Ok(Self::CreateTextGeometry {
                geom: args.string()?,
                size: args.required(str::parse)?,
                uri: args.required(str::parse)?,
                sha256: args.required(str::parse)?,
                text: args.string()?,
                anchor: args.optional(str::parse)?,
            }),
            "create-sprite-geometry" => Ok(Self::CreateSpriteGeometry {
                geom: args.string()?,
                size: args.required(str::parse)?,
                uri: args.required(str::parse)?,
                sha256: args.required(str::parse)?,
                size_mode: args.optional(str::parse)?,
                anchor: args.optional(str::parse)?,
            }),
            "set-text-property" => Ok(Self::SetTextProperty {
                geom: args.string()?,
                property: args.string()?,
                value: args.zstring(),
            }),
            "create-object" => Ok(Self::CreateObject {
                object: args.string()?,
                geom: args.optional(str::parse)?,
            }),
            "destroy-object" => Ok(Self::DestroyObject { object: args.string()? }),
            "reparent-object" => Ok(Self::ReparentObject {
                parent: args.required(str::parse)?,
                child: args.string()?,
                transform: args.optional(str::parse)?,
            }),
            "set-object-geometry" => Ok(Self::SetObjectGeometry {
                object: args.string()?,
                geom: args.optional(str::parse)?,
            }),
            "set-object-property" => Ok(Self::SetObjectProperty {
                object: args.string()?,
                property: args.string()?,
                value: args.zstring(),
            }),
            "set-object-transform" => Ok(Self::SetObjectTransform {
                object: args.string()?,
                pos: args.optional(str::parse)?,
                rot: args.optional(str::parse)?,
                scale: args.optional(str::parse)?,
                duration: args.optional(parse_float)?,
            }),
            "track-object" => Ok(Self::TrackObject {
                object: args.string()?,
                target: args.optional(str::parse)?,
                mode: args.optional(str::parse)?,
                duration: args.optional(parse_float)?,
            }),
            "enable-free-look" => {
                Ok(Self::EnableFreeLook { enabled: args.required(parse_bool)? })
            }
            "set-background-color" => {
                Ok(Self::SetBackgroundColor { color: args.required(str::parse)? })
            }
            _ => Err(CommandError::UnknownCommand),
        }
    }

    /// The wire name of this command.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Chat { .. } => "chat",
            Self::RequestUser { .. } => "request-user",
            Self::RequestAuthentication { .. } => "request-authentication",
            Self::AcceptUser { .. } => "accept-user",
            Self::RejectUser { .. } => "reject-user",
            Self::AnnounceSession { .. } => "announce-session",
            Self::RevokeSession { .. } => "revoke-session",
            Self::RequestInput { .. } => "request-input",
            Self::CancelInput => "cancel-input",
            Self::SetBanner { .. } => "set-banner",
            Self::CreateIntent { .. } => "create-intent",
            Self::DestroyIntent { .. } => "destroy-intent",
            Self::RaycastRequest => "raycast-request",
            Self::RaycastCancel => "raycast-cancel",
            Self::CreateGeometry { .. } => "create-geometry",
            Self::DestroyGeometry { .. } => "destroy-geometry",
            Self::AddTriangleList { .. } => "add-triangle-list",
            Self::AddTriangleStrip { .. } => "add-triangle-strip",
            Self::AddTriangleFan { .. } => "add-triangle-fan",
            Self::RemoveTriangles { .. } => "remove-triangles",
            Self::CreateTextGeometry { .. } => "create-text-geometry",
            Self::CreateSpriteGeometry { .. } => "create-sprite-geometry",
            Self::SetTextProperty { .. } => "set-text-property",
            Self::CreateObject { .. } => "create-object",
            Self::DestroyObject { .. } => "destroy-object",
            Self::ReparentObject { .. } => "reparent-object",
            Self::SetObjectGeometry { .. } => "set-object-geometry",
            Self::SetObjectProperty { .. } => "set-object-property",
            Self::SetObjectTransform { .. } => "set-object-transform",
            Self::TrackObject { .. } => "track-object",
            Self::EnableFreeLook { .. } => "enable-free-look",
            Self::SetBackgroundColor { .. } => "set-background-color",
        }
    }

    /// Canonical wire parameters, in declaration order.
    #[must_use]
    pub fn params(&self) -> Vec<String> {
        match self {
            Self::Chat { user, message } => vec![user.to_string(), message.clone()],
            Self::RequestUser { prompt } => vec![prompt.clone()],
            Self::RequestAuthentication { user, nonce } => {
                vec![user.to_string(), nonce.to_string()]
            }
            Self::AcceptUser { user } => vec![user.to_string()],
            Self::RejectUser { user, reason } => vec![user.to_string(), reason.clone()],
            Self::AnnounceSession { token, lifetime } => {
                vec![token.to_string(), optional_param(lifetime.as_ref())]
            }
            Self::RevokeSession { token } => vec![token.to_string()],
            Self::RequestInput { prompt, default } => {
                vec![prompt.clone(), optional_param(default.as_ref())]
            }
            Self::CancelInput | Self::RaycastRequest | Self::RaycastCancel => vec![],
            Self::SetBanner { text, duration } => {
                vec![optional_param(text.as_ref()), optional_float(*duration)]
            }
            Self::CreateIntent { intent, label } => {
                vec![intent.to_string(), label.clone()]
            }
            Self::DestroyIntent { intent } => vec![intent.to_string()],
            Self::CreateGeometry { geom } | Self::DestroyGeometry { geom } => {
                vec![geom.clone()]
            }
            Self::AddTriangleList { geom, tag, triangles } => {
                let mut params = vec![geom.clone(), optional_param(tag.as_ref())];
                for (color, p0, p1, p2) in triangles {
                    params.push(color.to_string());
                    params.push(p0.to_string());
                    params.push(p1.to_string());
                    params.push(p2.to_string());
                }
                params
            }
            Self::AddTriangleStrip { geom, tag, color, p0, p1, p2, positions }
            | Self::AddTriangleFan { geom, tag, color, p0, p1, p2, positions } => {
                let mut params = vec![
                    geom.clone(),
                    optional_param(tag.as_ref()),
                    color.to_string(),
                    p0.to_string(),
                    p1.to_string(),
                    p2.to_string(),
                ];
                params.extend(positions.iter().map(ToString::to_string));
                params
            }
            Self::RemoveTriangles { geom, tag } => vec![geom.clone(), tag.clone()],
            Self::CreateTextGeometry { geom, size, uri, sha256, text, anchor } => vec![
                geom.clone(),
                size.to_string(),
                uri.to_string(),
                sha256.to_string(),
                text.clone(),
                optional_param(anchor.as_ref()),
            ],
            Self::CreateSpriteGeometry { geom, size, uri, sha256, size_mode, anchor } => {
                vec![
                    geom.clone(),
                    size.to_string(),
                    uri.to_string(),
                    sha256.to_string(),
                    optional_param(size_mode.as_ref()),
                    optional_param(anchor.as_ref()),
                ]
            }
            Self::SetTextProperty { geom, property, value } => {
                vec![geom.clone(), property.clone(), value.clone()]
            }
            Self::CreateObject { object, geom }
            | Self::SetObjectGeometry { object, geom } => {
                vec![object.clone(), optional_param(geom.as_ref())]
            }
            Self::DestroyObject { object } => vec![object.clone()],
            Self::ReparentObject { parent, child, transform } => vec![
                parent.to_string(),
                child.clone(),
                optional_param(transform.as_ref()),
            ],
            Self::SetObjectProperty { object, property, value } => {
                vec![object.clone(), property.clone(), value.clone()]
            }
            Self::SetObjectTransform { object, pos, rot, scale, duration } => vec![
                object.clone(),
                optional_param(pos.as_ref()),
                optional_param(rot.as_ref()),
                optional_param(scale.as_ref()),
                optional_float(*duration),
            ],
            Self::TrackObject { object, target, mode, duration } => vec![
                object.clone(),
                optional_param(target.as_ref()),
                optional_param(mode.as_ref()),
                optional_float(*duration),
            ],
            Self::EnableFreeLook { enabled } => vec![enabled.to_string()],
            Self::SetBackgroundColor { color } => vec![color.to_string()],
        }
    }

    /// Encode this command as one wire frame.
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        codec::encode(self.name(), &self.params())
    }
}

fn parse_triangles(args: &mut Args<'_>) -> Result<Vec<Triangle>, CommandError> {
    let rest = args.rest();
    if rest.len() % 4 != 0 {
        return Err(CommandError::TupleMisaligned);
    }
    let mut triangles = Vec::with_capacity(rest.len() / 4);
    for chunk in rest.chunks_exact(4) {
        triangles.push((
            chunk[0].parse::<Color>()?,
            chunk[1].parse::<Vec3>()?,
            chunk[2].parse::<Vec3>()?,
            chunk[3].parse::<Vec3>()?,
        ));
    }
    Ok(triangles)
}

type StripFields =
    (String, Option<Identifier>, Color, Vec3, Vec3, Vec3, Vec<Vec3>);

fn parse_strip(args: &mut Args<'_>) -> Result<StripFields, CommandError> {
    Ok((
        args.string()?,
        args.optional(str::parse)?,
        args.required(str::parse)?,
        args.required(str::parse)?,
        args.required(str::parse)?,
        args.required(str::parse)?,
        args.list(str::parse)?,
    ))
}
