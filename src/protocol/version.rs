//! Stream version negotiation and the optional-field gates it drives.

use std::fmt;

/// NatNet stream version (major, minor, build, revision).
///
/// Reported by the server in its ping response. Until then the client
/// assumes [`StreamVersion::DEFAULT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StreamVersion {
    /// Major version
    pub major: u8,
    /// Minor version
    pub minor: u8,
    /// Build number
    pub build: u8,
    /// Revision number
    pub revision: u8,
}

impl StreamVersion {
    /// Version assumed before the server has reported one
    pub const DEFAULT: Self = Self::new(3, 0, 0, 0);

    /// Create a version
    #[must_use]
    pub const fn new(major: u8, minor: u8, build: u8, revision: u8) -> Self {
        Self {
            major,
            minor,
            build,
            revision,
        }
    }

    /// Create from the four wire bytes
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 4]) -> Self {
        Self::new(bytes[0], bytes[1], bytes[2], bytes[3])
    }

    /// Wire bytes
    #[must_use]
    pub const fn to_bytes(self) -> [u8; 4] {
        [self.major, self.minor, self.build, self.revision]
    }

    /// A zero major version means the server did not say.
    #[must_use]
    pub const fn is_unknown(self) -> bool {
        self.major == 0
    }

    /// Classify which optional fields this version carries.
    ///
    /// Unknown versions are treated as the newest layout.
    #[must_use]
    pub fn features(self) -> Features {
        if self.is_unknown() {
            return Features::ALL;
        }
        let at_least = |major: u8, minor: u8| {
            self.major > major || (self.major == major && self.minor >= minor)
        };
        Features {
            marker_details: at_least(2, 0),
            rigid_body_names: at_least(2, 0),
            skeletons: at_least(2, 1),
            labeled_markers: at_least(2, 3),
            tracking_flags: at_least(2, 6),
            double_timestamp: at_least(2, 7),
            force_plates: at_least(2, 9),
        }
    }
}

impl Default for StreamVersion {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for StreamVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.build, self.revision
        )
    }
}

/// Optional wire fields present for a given [`StreamVersion`].
///
/// Computed once per packet and consulted by every record decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct Features {
    /// Rigid bodies carry marker ids, marker sizes and a mean error (2.0+)
    pub marker_details: bool,
    /// Rigid body descriptions start with a name (2.0+)
    pub rigid_body_names: bool,
    /// Frames carry skeletons (2.1+)
    pub skeletons: bool,
    /// Frames carry labeled markers (2.3+)
    pub labeled_markers: bool,
    /// Rigid bodies and labeled markers carry a parameter bitfield (2.6+)
    pub tracking_flags: bool,
    /// Frame timestamp is a double (2.7+)
    pub double_timestamp: bool,
    /// Frames carry force plate samples (2.9+)
    pub force_plates: bool,
}

impl Features {
    /// Every optional field present
    pub const ALL: Self = Self {
        marker_details: true,
        rigid_body_names: true,
        skeletons: true,
        labeled_markers: true,
        tracking_flags: true,
        double_timestamp: true,
        force_plates: true,
    };
}

impl From<StreamVersion> for Features {
    fn from(version: StreamVersion) -> Self {
        version.features()
    }
}
