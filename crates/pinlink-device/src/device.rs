//! The device gate.
//!
//! [`PinDevice`] owns the [`PinClient`] and the [`StateMachine`] and is the
//! only writer of the device state. Every read, write and command passes
//! the gate first: outside `ON` it fails with
//! `Error::NotAllowedInCurrentState` before any name is resolved or any
//! byte is sent. `Init` is the one command that runs in every state.
//!
//! A `ConnectionFault` coming back from the client moves the device to
//! `FAULT`. Request-validation failures (`OutputNotConfigured`,
//! `UnknownPin`, `UnknownAttribute`, `InvalidReply`) are returned to the
//! caller and leave the state alone.

use std::collections::VecDeque;

use pinlink_core::{DeviceState, Error, PinId, PinSet, PinState, Result};
use pinlink_network::Transport;
use tracing::{debug, error, info, warn};

use crate::attributes::{AttrRequest, AttributeKind, AttributeTable, DeviceCommand, PinAttribute};
use crate::client::PinClient;
use crate::config::DeviceConfig;
use crate::state_machine::{StateMachine, StateTransition, status_for};

/// A remote pin board as seen by the supervisory framework.
#[derive(Debug)]
pub struct PinDevice<T> {
    config: DeviceConfig,

    /// Candidate pins from the configuration.
    configured: PinSet,

    client: PinClient<T>,
    machine: StateMachine,
    attributes: AttributeTable,
}

impl<T: Transport> PinDevice<T> {
    /// Validate `config` and run the first initialization.
    ///
    /// An unreachable agent does not fail construction: the device comes up
    /// in `FAULT` with the connect error as its status.
    ///
    /// # Errors
    /// Returns `Error::Config` if the configuration is invalid.
    pub async fn new(config: DeviceConfig, transport: T) -> Result<Self> {
        let configured = config.validate()?;
        let mut device = Self {
            config,
            configured,
            client: PinClient::new(transport),
            machine: StateMachine::new(),
            attributes: AttributeTable::default(),
        };
        device.init().await;
        Ok(device)
    }

    /// Reconnect to the agent and reconcile the pin set.
    ///
    /// Always releases the current connection first. Ends in `ON` when the
    /// agent answered the pin list, otherwise in `FAULT` with the failure
    /// as status: "Unable to connect to agent at ..." when the connect
    /// failed, "Initialization failed against ..." when the pin list could
    /// not be read. Never fails.
    pub async fn init(&mut self) -> DeviceState {
        self.client.disconnect().await;

        let peer = format!("{}:{}", self.config.host, self.config.port);
        let outcome = match self.client.connect(&self.config.host, self.config.port).await {
            Err(e) => Err(format!("Unable to connect to agent at {peer}: {e}")),
            Ok(()) => self
                .reconcile()
                .await
                .map_err(|e| format!("Initialization failed against {peer}: {e}")),
        };

        match outcome {
            Ok(()) => {
                self.machine.restart(DeviceState::On, status_for(DeviceState::On));
            }
            Err(reason) => {
                error!("{}", reason);
                self.client.disconnect().await;
                self.client.set_pins(PinSet::new());
                self.attributes = AttributeTable::default();
                self.machine.restart(DeviceState::Fault, reason);
            }
        }
        self.state()
    }

    /// Read the agent's pin list and rebuild the pin set and attribute table.
    async fn reconcile(&mut self) -> Result<()> {
        let available = self.client.list_available_pins().await?;

        let outcome = self.configured.reconcile(&available);
        for pin in &outcome.dropped {
            warn!(pin = %pin, "Configured pin is not available on the agent, dropping it");
        }
        info!(
            pins = %outcome.retained,
            dropped = outcome.dropped.len(),
            "Pin set reconciled"
        );

        self.attributes = AttributeTable::build(&outcome.retained);
        self.client.set_pins(outcome.retained);
        Ok(())
    }

    /// Release the connection. The device keeps its state.
    pub async fn shutdown(&mut self) {
        self.client.disconnect().await;
        debug!(state = %self.state(), "Device shut down");
    }

    fn gate(&self, operation: impl FnOnce() -> String) -> Result<()> {
        let state = self.state();
        if state.permits_io() {
            Ok(())
        } else {
            let error = Error::not_allowed(operation(), state);
            debug!("{}", error);
            Err(error)
        }
    }

    /// Move to `FAULT` if `result` carries a connection fault.
    async fn escalate<V>(&mut self, result: Result<V>) -> Result<V> {
        if let Err(e) = &result
            && e.is_connection_fault()
        {
            error!("Connection fault, device goes to FAULT: {}", e);
            self.client.disconnect().await;
            if let Err(transition_error) =
                self.machine.transition_to(DeviceState::Fault, e.to_string())
            {
                warn!("{}", transition_error);
            }
        }
        result
    }

    async fn read(&mut self, attribute: PinAttribute) -> Result<bool> {
        let result = attribute.read(&mut self.client).await;
        self.escalate(result).await
    }

    async fn write(&mut self, attribute: PinAttribute, value: bool) -> Result<()> {
        let result = attribute.write(&mut self.client, value).await;
        self.escalate(result).await.map(|_| ())
    }

    // Framework boundary

    /// Read a boolean attribute by name, e.g. `pin3_voltage`.
    pub async fn read_attribute(&mut self, name: &str) -> Result<bool> {
        self.gate(|| format!("{} of attribute {name}", AttrRequest::Read))?;
        let attribute = self.attributes.resolve(name)?;
        self.read(attribute).await
    }

    /// Write a boolean attribute by name, e.g. `pin3_output`.
    pub async fn write_attribute(&mut self, name: &str, value: bool) -> Result<()> {
        self.gate(|| format!("{} of attribute {name}", AttrRequest::Write))?;
        let attribute = self.attributes.resolve(name)?;
        self.write(attribute, value).await
    }

    /// The gate as the framework polls it before touching an attribute.
    ///
    /// Reads and writes are allowed in exactly the same states.
    pub fn is_attribute_allowed(&self, name: &str, request: AttrRequest) -> bool {
        let allowed = self.state().permits_io();
        debug!(attribute = name, %request, allowed, "Attribute gate polled");
        allowed
    }

    pub fn is_command_allowed(&self, command: DeviceCommand) -> bool {
        !command.requires_on() || self.state().permits_io()
    }

    pub async fn execute(&mut self, command: DeviceCommand) -> Result<()> {
        match command {
            DeviceCommand::TurnOff => self.turn_off().await,
            DeviceCommand::ResetAll => self.reset_all().await,
            DeviceCommand::Init => {
                self.init().await;
                Ok(())
            }
        }
    }

    /// Names of every attribute of the reconciled pins.
    pub fn attribute_names(&self) -> Vec<String> {
        self.attributes.names().map(str::to_string).collect()
    }

    // Typed operations

    pub async fn read_output(&mut self, pin: PinId) -> Result<bool> {
        let attribute = PinAttribute::new(pin, AttributeKind::OutputMode);
        self.gate(|| format!("{} of attribute {}", AttrRequest::Read, attribute.name()))?;
        self.read(attribute).await
    }

    pub async fn write_output(&mut self, pin: PinId, value: bool) -> Result<()> {
        let attribute = PinAttribute::new(pin, AttributeKind::OutputMode);
        self.gate(|| format!("{} of attribute {}", AttrRequest::Write, attribute.name()))?;
        self.write(attribute, value).await
    }

    pub async fn read_voltage(&mut self, pin: PinId) -> Result<bool> {
        let attribute = PinAttribute::new(pin, AttributeKind::Voltage);
        self.gate(|| format!("{} of attribute {}", AttrRequest::Read, attribute.name()))?;
        self.read(attribute).await
    }

    /// Drive `pin` high or low. The pin must currently be an output.
    pub async fn write_voltage(&mut self, pin: PinId, value: bool) -> Result<()> {
        let attribute = PinAttribute::new(pin, AttributeKind::Voltage);
        self.gate(|| format!("{} of attribute {}", AttrRequest::Write, attribute.name()))?;
        self.write(attribute, value).await
    }

    /// Send `ALL OFF;` and move to `OFF` whatever the agent acknowledged.
    pub async fn turn_off(&mut self) -> Result<()> {
        self.gate(|| format!("Command {}", DeviceCommand::TurnOff))?;

        match self.client.turn_off().await {
            Ok(true) => {}
            Ok(false) => debug!("Agent acknowledged turn-off with false"),
            Err(e) if e.is_connection_fault() => return self.escalate(Err(e)).await,
            Err(e) => warn!("Unreadable turn-off acknowledgement: {}", e),
        }

        self.machine
            .transition_to(DeviceState::Off, status_for(DeviceState::Off))?;
        Ok(())
    }

    /// Send `ALL RESET;`. The device state does not change.
    pub async fn reset_all(&mut self) -> Result<()> {
        self.gate(|| format!("Command {}", DeviceCommand::ResetAll))?;

        let result = self.client.reset_all().await;
        if !self.escalate(result).await? {
            debug!("Agent acknowledged reset with false");
        }
        Ok(())
    }

    // Accessors

    pub fn state(&self) -> DeviceState {
        self.machine.current_state()
    }

    pub fn status(&self) -> &str {
        self.machine.status()
    }

    /// The reconciled pin set; empty unless the last init succeeded.
    pub fn pins(&self) -> &PinSet {
        self.client.pins()
    }

    /// Candidate pins from the configuration.
    pub fn configured_pins(&self) -> &PinSet {
        &self.configured
    }

    pub fn cached_state(&self, pin: PinId) -> Option<PinState> {
        self.client.cached_state(pin)
    }

    pub fn history(&self) -> &VecDeque<StateTransition> {
        self.machine.history()
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn client(&self) -> &PinClient<T> {
        &self.client
    }
}
