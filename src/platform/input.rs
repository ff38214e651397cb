//! Input commands
//!
//! Commands may come from any thread; they are only applied between ticks,
//! so a move never lands halfway through a vehicle update.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use crate::sim::Step;

/// Something the player (or a driver) asked for
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Start,
    Move(Step),
    Pause,
    Resume,
    Menu,
    Resize { width: f32, height: f32 },
    Quit,
}

/// Cloneable sender side
#[derive(Debug, Clone)]
pub struct InputHandle {
    tx: Sender<Command>,
}

impl InputHandle {
    /// Returns false once the queue has been dropped
    pub fn send(&self, command: Command) -> bool {
        self.tx.send(command).is_ok()
    }
}

/// Receiving side, drained by the runner
#[derive(Debug)]
pub struct InputQueue {
    rx: Receiver<Command>,
    tx: Sender<Command>,
}

impl InputQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { rx, tx }
    }

    pub fn handle(&self) -> InputHandle {
        InputHandle {
            tx: self.tx.clone(),
        }
    }

    /// Everything queued so far, in arrival order
    pub fn drain(&self) -> Vec<Command> {
        let mut commands = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(command) => commands.push(command),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        commands
    }
}

impl Default for InputQueue {
    fn default() -> Self {
        Self::new()
    }
}
