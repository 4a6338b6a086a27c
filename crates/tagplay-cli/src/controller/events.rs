//! Inputs to the session controller.

use tagplay_core::Affordance;
use tagplay_core::wire::{RegistrationResponse, StartRentalResponse};

use crate::backend::BackendError;
use crate::player::PlayerExit;

/// Something the viewer asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    StartRental,
    Play,
    CloseVideo,
    RentAgain,
    /// Throw the session away and authorize from scratch.
    Reload,
}

impl From<Affordance> for UserAction {
    fn from(affordance: Affordance) -> Self {
        match affordance {
            Affordance::StartRental => Self::StartRental,
            Affordance::Play => Self::Play,
            Affordance::RentAgain => Self::RentAgain,
        }
    }
}

/// Asynchronous completions delivered back to the controller.
///
/// Every event carries the view it was issued for; timer and player events
/// also carry the generation of the resource that produced them.
#[derive(Debug)]
pub enum ControllerEvent {
    Registered {
        view: u64,
        outcome: Result<RegistrationResponse, BackendError>,
    },
    RentalStarted {
        view: u64,
        outcome: Result<StartRentalResponse, BackendError>,
    },
    Tick {
        view: u64,
        generation: u64,
    },
    PlayerExited {
        view: u64,
        generation: u64,
        exit: PlayerExit,
    },
}

impl ControllerEvent {
    pub const fn view(&self) -> u64 {
        match self {
            Self::Registered { view, .. }
            | Self::RentalStarted { view, .. }
            | Self::Tick { view, .. }
            | Self::PlayerExited { view, .. } => *view,
        }
    }
}
