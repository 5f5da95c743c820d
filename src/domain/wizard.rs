use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AcquisitionMethod {
    Manual,
    Csv,
}

/// The three-step flow as a tagged union: a step past the first cannot
/// exist without a chosen method, so the step/method invariants hold by
/// construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardState {
    ChooseMethod,
    CollectRecipients { method: AcquisitionMethod },
    Compose { method: AcquisitionMethod },
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum TransitionError {
    #[error("a recipient acquisition method has already been chosen")]
    MethodAlreadyChosen,
    #[error("cannot advance: the recipient list is empty")]
    NoRecipients,
    #[error("operation is not legal at step {0}")]
    WrongStep(u8),
}

impl WizardState {
    pub fn new() -> Self {
        Self::ChooseMethod
    }

    pub fn step(&self) -> u8 {
        match self {
            Self::ChooseMethod => 1,
            Self::CollectRecipients { .. } => 2,
            Self::Compose { .. } => 3,
        }
    }

    pub fn method(&self) -> Option<AcquisitionMethod> {
        match self {
            Self::ChooseMethod => None,
            Self::CollectRecipients { method } | Self::Compose { method } => Some(*method),
        }
    }

    pub fn select_method(&mut self, method: AcquisitionMethod) -> Result<(), TransitionError> {
        match self {
            Self::ChooseMethod => {
                *self = Self::CollectRecipients { method };
                Ok(())
            }
            _ => Err(TransitionError::MethodAlreadyChosen),
        }
    }

    /// Steps back one screen. A no-op at the first step.
    pub fn back(&mut self) {
        *self = match *self {
            Self::ChooseMethod => Self::ChooseMethod,
            Self::CollectRecipients { .. } => Self::ChooseMethod,
            Self::Compose { method } => Self::CollectRecipients { method },
        };
    }

    /// Legal only while collecting, and only with a non-empty recipient
    /// list. The caller passes the guard in; the store itself lives one
    /// level up.
    pub fn advance(&mut self, has_recipients: bool) -> Result<(), TransitionError> {
        match *self {
            Self::CollectRecipients { method } => {
                if !has_recipients {
                    return Err(TransitionError::NoRecipients);
                }
                *self = Self::Compose { method };
                Ok(())
            }
            _ => Err(TransitionError::WrongStep(self.step())),
        }
    }

    /// The reset transition after a successful send. The machine is
    /// reusable for the next campaign.
    pub fn submit_succeeded(&mut self) -> Result<(), TransitionError> {
        match self {
            Self::Compose { .. } => {
                *self = Self::ChooseMethod;
                Ok(())
            }
            _ => Err(TransitionError::WrongStep(self.step())),
        }
    }
}

impl Default for WizardState {
    fn default() -> Self {
        Self::new()
    }
}
