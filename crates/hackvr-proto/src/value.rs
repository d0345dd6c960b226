//! Typed values of the HackVR wire grammar.
//!
//! Every on-wire scalar has a deterministic text form: parsing is a total,
//! pure function from a parameter token, and serialization (`Display`)
//! produces the canonical text. Round trips hold modulo the defined
//! normalizations: colors and byte strings lowercase, floats trim trailing
//! zeros, session tokens drop base64 padding.
//!
//! The grammar deliberately rejects everything the renderer would have to
//! guess about: exponential floats, leading zeros in ints, padded base64,
//! relative URIs.

use std::{fmt, str::FromStr};

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};

use crate::error::ParseError;

/// Parse a wire integer: `0` or `[1-9][0-9]*`, no sign, no leading zeros.
pub fn parse_int(value: &str) -> Result<u64, ParseError> {
    if !is_int_text(value) {
        return Err(ParseError::InvalidInt);
    }
    value.parse().map_err(|_| ParseError::InvalidInt)
}

/// Parse a wire float: `-?[0-9]+(\.[0-9]+)?`. No exponent, no `+`, no
/// bare `.`.
pub fn parse_float(value: &str) -> Result<f64, ParseError> {
    if !is_float_text(value) {
        return Err(ParseError::InvalidFloat);
    }
    value.parse().map_err(|_| ParseError::InvalidFloat)
}

/// Parse a wire bool: the literals `true` and `false` only.
pub fn parse_bool(value: &str) -> Result<bool, ParseError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ParseError::InvalidBool),
    }
}

/// Canonical float serialization: the shortest plain-decimal form that
/// parses back to the same value (`1.0` → `1`, `-0.0` → `0`), with no
/// trailing zeros or dot.
///
/// Plain decimal is authoritative because the wire grammar rejects
/// exponential form; float `Display` never produces one.
pub fn format_float(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    format!("{value}")
}

fn is_int_text(value: &str) -> bool {
    match value.as_bytes() {
        [] => false,
        [b'0'] => true,
        [b'1'..=b'9', rest @ ..] => rest.iter().all(u8::is_ascii_digit),
        _ => false,
    }
}

fn is_float_text(value: &str) -> bool {
    let body = value.strip_prefix('-').unwrap_or(value);
    let (int_part, frac_part) = match body.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (body, None),
    };
    let digits = |text: &str| !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit());
    digits(int_part) && frac_part.is_none_or(digits)
}

/// 2D vector, wire form `( x y )` with optional inner whitespace.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vec2 {
    /// Horizontal component.
    pub x: f64,
    /// Vertical component.
    pub y: f64,
}

impl Vec2 {
    /// Construct from components.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl FromStr for Vec2 {
    type Err = ParseError;

    fn from_str(value: &str) -> Result<Self, ParseError> {
        let [x, y] = vector_components(value)?;
        Ok(Self { x, y })
    }
}

impl fmt::Display for Vec2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} {})", format_float(self.x), format_float(self.y))
    }
}

/// 3D vector, wire form `( x y z )`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vec3 {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
    /// Z component.
    pub z: f64,
}

impl Vec3 {
    /// Construct from components.
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

impl FromStr for Vec3 {
    type Err = ParseError;

    fn from_str(value: &str) -> Result<Self, ParseError> {
        let [x, y, z] = vector_components(value)?;
        Ok(Self { x, y, z })
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({} {} {})",
            format_float(self.x),
            format_float(self.y),
            format_float(self.z)
        )
    }
}

/// Euler rotation in degrees. Same wire grammar as [`Vec3`], carrying
/// pan/tilt/roll semantics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Euler {
    /// Rotation around the vertical axis.
    pub pan: f64,
    /// Rotation around the horizontal axis.
    pub tilt: f64,
    /// Rotation around the view axis.
    pub roll: f64,
}

impl Euler {
    /// Construct from components.
    #[must_use]
    pub const fn new(pan: f64, tilt: f64, roll: f64) -> Self {
        Self { pan, tilt, roll }
    }
}

impl FromStr for Euler {
    type Err = ParseError;

    fn from_str(value: &str) -> Result<Self, ParseError> {
        let [pan, tilt, roll] = vector_components(value)?;
        Ok(Self { pan, tilt, roll })
    }
}

impl fmt::Display for Euler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({} {} {})",
            format_float(self.pan),
            format_float(self.tilt),
            format_float(self.roll)
        )
    }
}

fn vector_components<const N: usize>(value: &str) -> Result<[f64; N], ParseError> {
    let inner = value
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
        .ok_or(ParseError::InvalidVector)?;
    let mut components = [0.0; N];
    let mut count = 0;
    for part in inner.split_whitespace() {
        if count == N || !is_float_text(part) {
            return Err(ParseError::InvalidVector);
        }
        components[count] = parse_float(part).map_err(|_| ParseError::InvalidVector)?;
        count += 1;
    }
    if count == N { Ok(components) } else { Err(ParseError::InvalidVector) }
}

/// RGB color, wire form `#rrggbb`. Parses either case, serializes
/// lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color(pub [u8; 3]);

impl FromStr for Color {
    type Err = ParseError;

    fn from_str(value: &str) -> Result<Self, ParseError> {
        let digits = value.strip_prefix('#').ok_or(ParseError::InvalidColor)?;
        if digits.len() != 6 {
            return Err(ParseError::InvalidColor);
        }
        let mut rgb = [0u8; 3];
        hex::decode_to_slice(digits, &mut rgb).map_err(|_| ParseError::InvalidColor)?;
        Ok(Self(rgb))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", hex::encode(self.0))
    }
}

macro_rules! fixed_bytes {
    ($(#[$meta:meta])* $name:ident, $len:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(pub [u8; $len]);

        impl FromStr for $name {
            type Err = ParseError;

            fn from_str(value: &str) -> Result<Self, ParseError> {
                if value.len() != $len * 2 {
                    return Err(ParseError::InvalidBytes);
                }
                let mut bytes = [0u8; $len];
                hex::decode_to_slice(value, &mut bytes).map_err(|_| ParseError::InvalidBytes)?;
                Ok(Self(bytes))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&hex::encode(self.0))
            }
        }
    };
}

fixed_bytes!(
    /// 16 bytes as 32 hex digits. Authentication nonces.
    Bytes16,
    16
);
fixed_bytes!(
    /// 32 bytes as 64 hex digits. Content hashes.
    Bytes32,
    32
);
fixed_bytes!(
    /// 64 bytes as 128 hex digits. Signatures.
    Bytes64,
    64
);

/// Absolute URI. The text is stored as received; validation requires a
/// scheme and rejects whitespace and control characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Uri(String);

impl Uri {
    /// The URI text as received.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Uri {
    type Err = ParseError;

    fn from_str(value: &str) -> Result<Self, ParseError> {
        if value.is_empty()
            || value.chars().any(|ch| ch.is_control() || ch.is_whitespace())
        {
            return Err(ParseError::InvalidUri);
        }
        if url::Url::parse(value).is_err() {
            return Err(ParseError::InvalidUri);
        }
        Ok(Self(value.to_string()))
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// User identity as presented by the peer. Non-empty, no LF, no
/// surrounding whitespace, shorter than 128 characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserId(String);

impl UserId {
    /// The user id text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for UserId {
    type Err = ParseError;

    fn from_str(value: &str) -> Result<Self, ParseError> {
        if value.is_empty() {
            return Err(ParseError::EmptyString);
        }
        if value.contains('\n') {
            return Err(ParseError::UserIdLineFeed);
        }
        if value != value.trim() {
            return Err(ParseError::UserIdWhitespace);
        }
        if value.chars().count() >= 128 {
            return Err(ParseError::UserIdTooLong);
        }
        Ok(Self(value.to_string()))
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Segmented identifier: `[A-Za-z0-9_]+` parts joined by `-`, optionally
/// `$`-prefixed for reserved names. Used for object, geometry, intent, and
/// tag positions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier(String);

impl Identifier {
    /// The identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is a reserved `$` identifier.
    #[must_use]
    pub fn is_reserved(&self) -> bool {
        self.0.starts_with('$')
    }
}

impl FromStr for Identifier {
    type Err = ParseError;

    fn from_str(value: &str) -> Result<Self, ParseError> {
        let body = value.strip_prefix('$').unwrap_or(value);
        let segment_ok = |segment: &str| {
            !segment.is_empty()
                && segment.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
        };
        if body.is_empty() || !body.split('-').all(segment_ok) {
            return Err(ParseError::InvalidIdentifier);
        }
        Ok(Self(value.to_string()))
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

macro_rules! wire_enum {
    ($(#[$meta:meta])* $name:ident { $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            /// The wire form of this variant.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl FromStr for $name {
            type Err = ParseError;

            fn from_str(value: &str) -> Result<Self, ParseError> {
                match value {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(ParseError::InvalidEnum),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

wire_enum!(
    /// Which pointer action tapped an object.
    TapKind {
        /// Main action (e.g. trigger).
        Primary => "primary",
        /// Alternate action (e.g. grip).
        Secondary => "secondary",
    }
);

wire_enum!(
    /// How sprite content is fitted into its quad.
    SizeMode {
        /// Fill both axes, ignoring aspect ratio.
        Stretch => "stretch",
        /// Fill the quad, cropping overflow.
        Cover => "cover",
        /// Fit entirely inside the quad.
        Contain => "contain",
        /// Keep the requested width, derive height.
        FixedWidth => "fixed-width",
        /// Keep the requested height, derive width.
        FixedHeight => "fixed-height",
    }
);

wire_enum!(
    /// Camera tracking behavior.
    TrackMode {
        /// Follow in a plane.
        Plane => "plane",
        /// Keep the target in focus.
        Focus => "focus",
    }
);

wire_enum!(
    /// Coordinate interpretation when reparenting.
    ReparentMode {
        /// Keep the child's world transform.
        World => "world",
        /// Keep the child's local transform.
        Local => "local",
    }
);

wire_enum!(
    /// 3x3 anchor grid for text and sprite geometry.
    Anchor {
        /// Top edge, left side.
        TopLeft => "top-left",
        /// Top edge, centered.
        TopCenter => "top-center",
        /// Top edge, right side.
        TopRight => "top-right",
        /// Vertically centered, left side.
        CenterLeft => "center-left",
        /// Fully centered.
        CenterCenter => "center-center",
        /// Vertically centered, right side.
        CenterRight => "center-right",
        /// Bottom edge, left side.
        BottomLeft => "bottom-left",
        /// Bottom edge, centered.
        BottomCenter => "bottom-center",
        /// Bottom edge, right side.
        BottomRight => "bottom-right",
    }
);

/// Protocol version, wire form `v[1-9][0-9]*`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version(pub u32);

impl Version {
    /// The only version this implementation speaks.
    pub const V1: Version = Version(1);
}

impl FromStr for Version {
    type Err = ParseError;

    fn from_str(value: &str) -> Result<Self, ParseError> {
        let digits = value.strip_prefix('v').ok_or(ParseError::InvalidVersion)?;
        if digits == "0" || !is_int_text(digits) {
            return Err(ParseError::InvalidVersion);
        }
        let number = digits.parse().map_err(|_| ParseError::InvalidVersion)?;
        Ok(Self(number))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Opaque 32-byte session token, wire form 43 characters of unpadded
/// base64url.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionToken(pub [u8; 32]);

impl SessionToken {
    /// The raw token bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl FromStr for SessionToken {
    type Err = ParseError;

    fn from_str(value: &str) -> Result<Self, ParseError> {
        if value.len() != 43 {
            return Err(ParseError::SessionTokenLength);
        }
        if !value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        {
            return Err(ParseError::SessionTokenCharacters);
        }
        let decoded = URL_SAFE_NO_PAD
            .decode(value)
            .map_err(|_| ParseError::SessionTokenBytes)?;
        let bytes: [u8; 32] =
            decoded.try_into().map_err(|_| ParseError::SessionTokenBytes)?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&URL_SAFE_NO_PAD.encode(self.0))
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Tokens are credentials; keep them out of logs.
        write!(f, "SessionToken(..)")
    }
}
