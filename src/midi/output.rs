//! `midir`-backed MIDI output ports.
//!
//! The router drives two ports: one for notes and program changes, one for
//! transport control changes.  Ports are looked up by (substring) name; a
//! failed open lists what is actually available so a misconfigured port name
//! is diagnosable from the error alone.

use midir::{MidiOutput, MidiOutputConnection};

use super::{MidiError, MidiMessage, MidiSink};

// ---------------------------------------------------------------------------
// MidirSink
// ---------------------------------------------------------------------------

/// One open `midir` output connection.
pub struct MidirSink {
    conn: MidiOutputConnection,
    port_name: String,
}

impl MidirSink {
    /// Open the first output port whose name contains `port_name`.
    pub fn open(client_name: &str, port_name: &str) -> Result<Self, MidiError> {
        let out = MidiOutput::new(client_name).map_err(|e| MidiError::Init(e.to_string()))?;

        let ports = out.ports();
        let names: Vec<String> = ports
            .iter()
            .map(|p| out.port_name(p).unwrap_or_else(|_| "<unnamed>".into()))
            .collect();

        let index = names
            .iter()
            .position(|n| n.contains(port_name))
            .ok_or_else(|| MidiError::PortNotFound {
                name: port_name.to_string(),
                available: if names.is_empty() {
                    "<none>".to_string()
                } else {
                    names.join(", ")
                },
            })?;

        let conn = out
            .connect(&ports[index], client_name)
            .map_err(|e| MidiError::Connect(port_name.to_string(), e.to_string()))?;

        log::info!("midi: opened output '{}'", names[index]);
        Ok(Self {
            conn,
            port_name: names[index].clone(),
        })
    }

    /// Name of the connected port.
    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}

impl MidiSink for MidirSink {
    fn send(&mut self, msg: MidiMessage) -> Result<(), MidiError> {
        let (bytes, len) = msg.to_bytes();
        self.conn
            .send(&bytes[..len])
            .map_err(|e| MidiError::Send(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// MidiOutputs
// ---------------------------------------------------------------------------

/// The pair of sinks the router owns.
pub struct MidiOutputs {
    pub musical: Box<dyn MidiSink>,
    pub control: Box<dyn MidiSink>,
}

impl MidiOutputs {
    pub fn new(musical: Box<dyn MidiSink>, control: Box<dyn MidiSink>) -> Self {
        Self { musical, control }
    }
}

/// Open both configured output ports.
pub fn open_outputs(musical_port: &str, control_port: &str) -> Result<MidiOutputs, MidiError> {
    let musical = MidirSink::open("theremidi", musical_port)?;
    let control = MidirSink::open("theremidi", control_port)?;
    Ok(MidiOutputs::new(Box::new(musical), Box::new(control)))
}
