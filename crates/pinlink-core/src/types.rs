use crate::{Result, error::Error};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Physical connector position on the board header (always positive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct PinId(u16);

impl PinId {
    /// Create a new pin identifier with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidPin` if the number is zero.
    pub fn new(pin: u16) -> Result<Self> {
        if pin == 0 {
            return Err(Error::InvalidPin("pin numbers start at 1, got 0".to_string()));
        }
        Ok(PinId(pin))
    }

    /// Get the raw pin number.
    #[must_use]
    pub fn as_u16(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for PinId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for PinId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let pin: u16 = s
            .trim()
            .parse()
            .map_err(|_| Error::InvalidPin(format!("not a pin number: {s:?}")))?;
        PinId::new(pin)
    }
}

impl TryFrom<u16> for PinId {
    type Error = Error;

    fn try_from(value: u16) -> Result<Self> {
        PinId::new(value)
    }
}

impl From<PinId> for u16 {
    fn from(pin: PinId) -> Self {
        pin.0
    }
}

/// Ordered, duplicate-free set of pins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinSet(BTreeSet<PinId>);

impl PinSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from raw pin numbers, rejecting zero.
    pub fn from_numbers<I: IntoIterator<Item = u16>>(numbers: I) -> Result<Self> {
        numbers.into_iter().map(PinId::new).collect()
    }

    pub fn insert(&mut self, pin: PinId) -> bool {
        self.0.insert(pin)
    }

    pub fn contains(&self, pin: PinId) -> bool {
        self.0.contains(&pin)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Pins in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = PinId> + '_ {
        self.0.iter().copied()
    }

    /// Intersect the configured pins with the pins the agent reports.
    ///
    /// Configured pins the agent does not know are returned separately so the
    /// caller can report them. Dropping them is not an error.
    ///
    /// # Examples
    ///
    /// ```
    /// use pinlink_core::PinSet;
    ///
    /// let configured = PinSet::from_numbers([3, 5, 7, 99]).unwrap();
    /// let available = PinSet::from_numbers([3, 5, 7, 8, 10]).unwrap();
    ///
    /// let outcome = configured.reconcile(&available);
    /// assert_eq!(outcome.retained, PinSet::from_numbers([3, 5, 7]).unwrap());
    /// assert_eq!(outcome.dropped.len(), 1);
    /// ```
    pub fn reconcile(&self, available: &PinSet) -> Reconciliation {
        let (retained, dropped): (BTreeSet<PinId>, BTreeSet<PinId>) =
            self.0.iter().partition(|pin| available.0.contains(pin));
        Reconciliation {
            retained: PinSet(retained),
            dropped: dropped.into_iter().collect(),
        }
    }
}

impl FromIterator<PinId> for PinSet {
    fn from_iter<T: IntoIterator<Item = PinId>>(iter: T) -> Self {
        PinSet(iter.into_iter().collect())
    }
}

impl fmt::Display for PinSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let items: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "{{{}}}", items.join(", "))
    }
}

/// Outcome of intersecting configured pins with agent-reported pins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// Pins present both in configuration and on the agent.
    pub retained: PinSet,

    /// Configured pins the agent did not report, in ascending order.
    pub dropped: Vec<PinId>,
}

/// Lifecycle state of a device as seen by the supervisory framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceState {
    /// Connected and reconciled; pin I/O is permitted.
    On,

    /// Switched off by an explicit command.
    Off,

    /// Transport failure, or initialization never succeeded.
    Fault,
}

impl DeviceState {
    /// Whether pin reads, writes and commands other than init may run.
    pub fn permits_io(&self) -> bool {
        matches!(self, DeviceState::On)
    }

    /// Check if a transition outside re-initialization is valid.
    ///
    /// Only a running device can be switched off or fault. Coming back to
    /// `ON` is never a plain transition: it takes a full re-initialization.
    ///
    /// # Examples
    ///
    /// ```
    /// use pinlink_core::DeviceState;
    ///
    /// assert!(DeviceState::On.can_transition_to(&DeviceState::Fault));
    /// assert!(!DeviceState::Off.can_transition_to(&DeviceState::On));
    /// ```
    pub fn can_transition_to(&self, target: &DeviceState) -> bool {
        matches!(
            (self, target),
            (DeviceState::On, DeviceState::Off | DeviceState::Fault)
        )
    }
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DeviceState::On => write!(f, "ON"),
            DeviceState::Off => write!(f, "OFF"),
            DeviceState::Fault => write!(f, "FAULT"),
        }
    }
}

/// Last values read from a pin. Never authoritative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinState {
    /// `Some(true)` when the pin was last seen configured as an output.
    pub output_mode: Option<bool>,

    /// Last logic level read from the pin.
    pub voltage: Option<bool>,
}
