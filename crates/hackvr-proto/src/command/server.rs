//! Client-to-server command set.

use crate::{
    codec,
    command::Args,
    error::{CodecError, CommandError},
    value::{Bytes64, Identifier, SessionToken, TapKind, UserId, Vec3},
};

/// A command received by the server: user input and interactions reported
/// by the client.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerCommand {
    /// Chat line typed by the user.
    Chat {
        /// Message text.
        message: String,
    },

    /// Present a user identity.
    SetUser {
        /// Claimed user.
        user: UserId,
    },

    /// Answer an authentication challenge.
    Authenticate {
        /// User answering the challenge.
        user: UserId,
        /// Signature over the nonce.
        signature: Bytes64,
    },

    /// Resume a previously announced session.
    ResumeSession {
        /// Token from `announce-session`.
        token: SessionToken,
    },

    /// Answer an input prompt.
    SendInput {
        /// Entered text; may be empty.
        text: String,
    },

    /// Report a tap on an object.
    TapObject {
        /// Tapped object.
        object: Identifier,
        /// Which action tapped it.
        kind: TapKind,
        /// Tag of the tapped triangle group.
        tag: Identifier,
    },

    /// Send free text at an object.
    TellObject {
        /// Addressed object.
        object: Identifier,
        /// Message text; may be empty.
        text: String,
    },

    /// Trigger a registered intent.
    Intent {
        /// Triggered intent.
        intent: Identifier,
        /// View direction at trigger time.
        view_dir: Vec3,
    },

    /// Report a raycast result.
    Raycast {
        /// Ray origin.
        origin: Vec3,
        /// Ray direction.
        direction: Vec3,
    },

    /// The user aborted the raycast.
    RaycastCancel,
}

impl ServerCommand {
    /// Bind a received frame to a typed command.
    ///
    /// # Errors
    ///
    /// [`CommandError::UnknownCommand`] for a name outside this set;
    /// otherwise the first value parse failure, left to right.
    pub fn parse(name: &str, args: &[String]) -> Result<Self, CommandError> {
        let mut args = Args::new(args);
        match name {
            "chat" => Ok(Self::Chat { message: args.string()? }),
            "set-user" => Ok(Self::SetUser { user: args.required(str::parse)? }),
            "authenticate" => Ok(Self::Authenticate {
                user: args.required(str::parse)?,
                signature: args.required(str::parse)?,
            }),
            "resume-session" => {
                Ok(Self::ResumeSession { token: args.required(str::parse)? })
            }
            "send-input" => Ok(Self::SendInput { text: args.zstring() }),
            "tap-object" => Ok(Self::TapObject {
                object: args.required(str::parse)?,
                kind: args.required(str::parse)?,
                tag: args.required(str::parse)?,
            }),
            "tell-object" => Ok(Self::TellObject {
                object: args.required(str::parse)?,
                text: args.zstring(),
            }),
            "intent" => Ok(Self::Intent {
                intent: args.required(str::parse)?,
                view_dir: args.required(str::parse)?,
            }),
            "raycast" => Ok(Self::Raycast {
                origin: args.required(str::parse)?,
                direction: args.required(str::parse)?,
            }),
            "raycast-cancel" => Ok(Self::RaycastCancel),
            _ => Err(CommandError::UnknownCommand),
        }
    }

    /// The wire name of this command.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Chat { .. } => "chat",
            Self::SetUser { .. } => "set-user",
            Self::Authenticate { .. } => "authenticate",
            Self::ResumeSession { .. } => "resume-session",
            Self::SendInput { .. } => "send-input",
            Self::TapObject { .. } => "tap-object",
            Self::TellObject { .. } => "tell-object",
            Self::Intent { .. } => "intent",
            Self::Raycast { .. } => "raycast",
            Self::RaycastCancel => "raycast-cancel",
        }
    }

    /// Canonical wire parameters, in declaration order.
    #[must_use]
    pub fn params(&self) -> Vec<String> {
        match self {
            Self::Chat { message } => vec![message.clone()],
            Self::SetUser { user } => vec![user.to_string()],
            Self::Authenticate { user, signature } => {
                vec![user.to_string(), signature.to_string()]
            }
            Self::ResumeSession { token } => vec![token.to_string()],
            Self::SendInput { text } => vec![text.clone()],
            Self::TapObject { object, kind, tag } => {
                vec![object.to_string(), kind.to_string(), tag.to_string()]
            }
            Self::TellObject { object, text } => vec![object.to_string(), text.clone()],
            Self::Intent { intent, view_dir } => {
                vec![intent.to_string(), view_dir.to_string()]
            }
            Self::Raycast { origin, direction } => {
                vec![origin.to_string(), direction.to_string()]
            }
            Self::RaycastCancel => vec![],
        }
    }

    /// Encode this command as one wire frame.
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        codec::encode(self.name(), &self.params())
    }
}
