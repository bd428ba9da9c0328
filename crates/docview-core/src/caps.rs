#![forbid(unsafe_code)]

//! Client capability descriptor.
//!
//! Determined once when a session starts and injected into every component
//! that branches on it. Nothing in the engine re-probes the environment
//! mid-session.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Capability flags forwarded to the classification backend.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ClientFlags: u8 {
        /// Remote editing of linked files is allowed.
        const REMOTE = 1 << 0;
        /// Editing links may open in place.
        const ALLOW_EDIT = 1 << 1;
        /// Linked files open in the user's preferred application.
        const PREFERRED_APP = 1 << 2;
        /// Document is shown read-only.
        const READ_ONLY = 1 << 3;
    }
}

/// Primary pointing device class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerKind {
    /// Mouse or trackpad; native scrollbars may draw arrow buttons.
    #[default]
    Fine,
    /// Touch screen; overlay scrollbars without arrows.
    Touch,
}

impl PointerKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fine => "fine",
            Self::Touch => "touch",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "fine" | "mouse" | "pointer" => Some(Self::Fine),
            "touch" | "coarse" => Some(Self::Touch),
            _ => None,
        }
    }
}

/// Everything the engine needs to know about the client environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub pointer: PointerKind,
    pub flags: ClientFlags,
}

impl Capabilities {
    #[must_use]
    pub const fn new(pointer: PointerKind, flags: ClientFlags) -> Self {
        Self { pointer, flags }
    }

    #[must_use]
    pub const fn is_touch(&self) -> bool {
        matches!(self.pointer, PointerKind::Touch)
    }

    #[must_use]
    pub const fn remote(&self) -> bool {
        self.flags.contains(ClientFlags::REMOTE)
    }

    #[must_use]
    pub const fn allow_edit(&self) -> bool {
        self.flags.contains(ClientFlags::ALLOW_EDIT)
    }

    #[must_use]
    pub const fn use_preferred_app(&self) -> bool {
        self.flags.contains(ClientFlags::PREFERRED_APP)
    }

    #[must_use]
    pub const fn read_only(&self) -> bool {
        self.flags.contains(ClientFlags::READ_ONLY)
    }
}
