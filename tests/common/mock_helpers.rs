//! Mock construction helpers

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use faderlink::actions::{ActionTrigger, ButtonMap, ButtonMapping, KeyChord, KeyInput};
use faderlink::error::{BridgeError, Result};
use faderlink::serial::{LinkOpener, SerialLink};
use faderlink::{ConnectionParameters, FrameProcessor, NoiseReductionLevel, SerialConnection};
use std::io::{self, ErrorKind, Read};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// In-memory serial link; bytes arrive through a channel, and dropping the
/// feeding side looks like the device being unplugged
pub struct ScriptedLink {
    rx: Receiver<Vec<u8>>,
    pending: Vec<u8>,
    released: Arc<AtomicUsize>,
}

impl Read for ScriptedLink {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        if self.pending.is_empty() {
            match self.rx.recv_timeout(Duration::from_millis(5)) {
                Ok(bytes) => self.pending = bytes,
                Err(RecvTimeoutError::Timeout) => return Err(ErrorKind::TimedOut.into()),
                Err(RecvTimeoutError::Disconnected) => return Ok(0),
            }
        }
        let n = out.len().min(self.pending.len());
        out[..n].copy_from_slice(&self.pending[..n]);
        self.pending.drain(..n);
        Ok(n)
    }
}

impl Drop for ScriptedLink {
    fn drop(&mut self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// Link opener that records every open and lets tests write to the newest link
#[derive(Default)]
pub struct ScriptedOpener {
    feeds: Mutex<Vec<Sender<Vec<u8>>>>,
    opened: Mutex<Vec<ConnectionParameters>>,
    released: Arc<AtomicUsize>,
    refuse: Mutex<bool>,
}

impl ScriptedOpener {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Write bytes to the most recently opened link
    pub fn feed(&self, bytes: &str) {
        let feeds = self.feeds.lock().unwrap();
        feeds
            .last()
            .expect("no link opened")
            .send(bytes.as_bytes().to_vec())
            .expect("link closed");
    }

    /// End the stream of every open link
    pub fn unplug(&self) {
        self.feeds.lock().unwrap().clear();
    }

    /// Make subsequent opens fail
    pub fn refuse_opens(&self, refuse: bool) {
        *self.refuse.lock().unwrap() = refuse;
    }

    pub fn opened(&self) -> Vec<ConnectionParameters> {
        self.opened.lock().unwrap().clone()
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

impl LinkOpener for ScriptedOpener {
    fn open(&self, params: &ConnectionParameters) -> Result<Box<dyn SerialLink>> {
        if *self.refuse.lock().unwrap() {
            return Err(BridgeError::Io(io::Error::new(
                ErrorKind::NotFound,
                format!("{} not present", params.port),
            )));
        }
        self.opened.lock().unwrap().push(params.clone());
        let (tx, rx) = bounded(64);
        self.feeds.lock().unwrap().push(tx);
        Ok(Box::new(ScriptedLink {
            rx,
            pending: Vec::new(),
            released: self.released.clone(),
        }))
    }
}

/// Key input that records every chord it is asked to press
#[derive(Default)]
pub struct RecordingKeyInput {
    pub chords: Mutex<Vec<KeyChord>>,
}

impl RecordingKeyInput {
    pub fn pressed(&self) -> Vec<KeyChord> {
        self.chords.lock().unwrap().clone()
    }
}

impl KeyInput for RecordingKeyInput {
    fn press(&self, chord: &KeyChord) -> Result<()> {
        self.chords.lock().unwrap().push(chord.clone());
        Ok(())
    }
}

/// A connection wired to a scripted opener and a recording key input
pub struct TestBridge {
    pub opener: Arc<ScriptedOpener>,
    pub keys: Arc<RecordingKeyInput>,
    pub connection: Arc<SerialConnection>,
}

pub fn create_test_bridge(mapping: ButtonMapping) -> TestBridge {
    let opener = ScriptedOpener::new();
    let keys = Arc::new(RecordingKeyInput::default());
    let trigger = ActionTrigger::new(ButtonMap::new(mapping), keys.clone());
    let processor = Arc::new(FrameProcessor::new(
        trigger,
        false,
        NoiseReductionLevel::Default,
    ));
    let connection = Arc::new(SerialConnection::new(
        ConnectionParameters::new("TEST0", 9600),
        opener.clone(),
        processor,
    ));

    TestBridge {
        opener,
        keys,
        connection,
    }
}
