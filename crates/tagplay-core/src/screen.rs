//! The single screen a session shows at any moment.

use serde::Serialize;

/// Derived view of a [`Session`](crate::Session).
///
/// Variants are listed in rendering priority: a session that is loading shows
/// `Loading` even if it also carries an error, and so on down the list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Screen {
    Loading,
    Error {
        message: String,
    },
    Authorizing,
    Idle,
    Active {
        hours_remaining: u32,
        video_visible: bool,
    },
    Ended,
}

/// The one primary action a screen offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Affordance {
    StartRental,
    Play,
    RentAgain,
}

impl Affordance {
    pub const fn label(self) -> &'static str {
        match self {
            Self::StartRental => "Start Rental",
            Self::Play => "Play",
            Self::RentAgain => "Rent Again",
        }
    }
}

impl Screen {
    /// The primary action, if any.
    ///
    /// Play is offered only before the video is mounted; once it is, the
    /// playback surface's close control is the only thing on screen.
    pub const fn affordance(&self) -> Option<Affordance> {
        match self {
            Self::Idle => Some(Affordance::StartRental),
            Self::Active {
                video_visible: false,
                ..
            } => Some(Affordance::Play),
            Self::Ended => Some(Affordance::RentAgain),
            Self::Loading | Self::Error { .. } | Self::Authorizing | Self::Active { .. } => None,
        }
    }

    pub const fn is_video_visible(&self) -> bool {
        matches!(
            self,
            Self::Active {
                video_visible: true,
                ..
            }
        )
    }

    /// Short lowercase name used in logs and headless output.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Error { .. } => "error",
            Self::Authorizing => "authorizing",
            Self::Idle => "idle",
            Self::Active { .. } => "active",
            Self::Ended => "ended",
        }
    }
}

impl std::fmt::Display for Screen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Loading => f.write_str("Loading..."),
            Self::Error { message } => write!(f, "Error: {message}"),
            Self::Authorizing => f.write_str("Authorizing..."),
            Self::Idle => f.write_str("Ready to rent"),
            Self::Active {
                hours_remaining,
                video_visible,
            } => {
                write!(f, "{hours_remaining} Hours Remaining")?;
                if *video_visible {
                    f.write_str(" (playing)")?;
                }
                Ok(())
            }
            Self::Ended => f.write_str("Rental ended"),
        }
    }
}
