//! Interactive console driving the host commands
//!
//! Reads one command per line from stdin. Go-to walks run in the
//! background, so a new command cancels a walk still in progress.

use anyhow::Result;
use brickstep_core::{Animator, Navigator, NavigatorEvent};
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use crate::config::Config;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown command '{0}' (type 'help' for a list)")]
    Unknown(String),
    #[error("Missing argument: usage is '{0}'")]
    MissingArgument(&'static str),
}

/// A console command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show the next step
    Next,
    /// Go back one step
    Previous,
    /// Go to the configured step
    GoToDefault,
    /// Go to the given step id
    GoTo(String),
    /// Fire an external trigger from the trigger table
    Trigger(String),
    /// Hide everything and enable stepping
    Clear,
    /// Show the whole model again
    Reset,
    Current,
    Steps,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        let name = words.next().unwrap_or_default().to_lowercase();
        let arg = words.next().map(str::to_string);

        let command = match name.as_str() {
            "f" | "next" => Command::Next,
            "r" | "prev" => Command::Previous,
            "x" => Command::GoToDefault,
            "g" | "goto" => Command::GoTo(arg.ok_or(CommandError::MissingArgument("goto <step>"))?),
            "t" | "trigger" => {
                Command::Trigger(arg.ok_or(CommandError::MissingArgument("trigger <id>"))?)
            }
            "c" | "clear" => Command::Clear,
            "reset" => Command::Reset,
            "current" => Command::Current,
            "steps" => Command::Steps,
            "h" | "help" | "?" => Command::Help,
            "q" | "quit" | "exit" => Command::Quit,
            _ => return Err(CommandError::Unknown(s.trim().to_string())),
        };
        Ok(command)
    }
}

/// Whether the console keeps reading commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Console state: the navigator plus host-level settings
pub struct Console<A> {
    navigator: Navigator<A>,
    go_to_step: String,
    triggers: HashMap<String, String>,
    /// Stepping is only allowed once the model has been cleared
    ready: bool,
}

impl<A: Animator + Send + 'static> Console<A> {
    pub fn new(navigator: Navigator<A>, config: &Config) -> Self {
        Self {
            navigator,
            go_to_step: config.stepper.go_to_step.clone(),
            triggers: config.trigger_table(),
            ready: false,
        }
    }

    pub fn navigator(&self) -> &Navigator<A> {
        &self.navigator
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Execute a single command
    pub async fn execute(&mut self, command: Command) -> Result<Flow> {
        let needs_ready = matches!(
            command,
            Command::Next
                | Command::Previous
                | Command::GoToDefault
                | Command::GoTo(_)
                | Command::Trigger(_)
        );
        if needs_ready && !self.ready {
            warn!("Stepping is disabled until the model is cleared");
            println!("Clear the model first ('c')");
            return Ok(Flow::Continue);
        }

        match command {
            Command::Next => {
                if !self.navigator.step_forward().await {
                    println!("Already at the last step");
                }
                self.print_current().await;
            }
            Command::Previous => {
                if !self.navigator.step_backward().await {
                    println!("Already at the first step");
                }
                self.print_current().await;
            }
            Command::GoToDefault => {
                let target = self.go_to_step.clone();
                self.go_to(&target).await;
            }
            Command::GoTo(target) => self.go_to(&target).await,
            Command::Trigger(id) => match self.triggers.get(&id).cloned() {
                Some(target) => {
                    info!(trigger = %id, step = %target, "Trigger fired");
                    self.go_to(&target).await;
                }
                None => {
                    warn!(trigger = %id, "Unknown trigger");
                    println!("No step is mapped to trigger '{}'", id);
                }
            },
            Command::Clear => {
                self.navigator.reset(true).await?;
                self.ready = true;
                println!("Model cleared, ready to step");
            }
            Command::Reset => {
                self.navigator.reset(false).await?;
                self.ready = false;
                println!("Model reset, showing all parts");
            }
            Command::Current => self.print_current().await,
            Command::Steps => {
                let labels = self.navigator.instructions().lock().await.labels();
                println!("{} steps: {}", labels.len(), labels.join(", "));
            }
            Command::Help => print_help(),
            Command::Quit => {
                self.navigator.cancel().await;
                return Ok(Flow::Quit);
            }
        }

        Ok(Flow::Continue)
    }

    async fn go_to(&self, target: &str) {
        // The outcome is reported through navigator events
        if let Err(e) = self.navigator.go_to_step(target).await {
            println!("Invalid step '{}': {}", target, e);
        }
    }

    async fn print_current(&self) {
        match self.navigator.current_step_label().await {
            Some(label) => println!("Step {}", label),
            None => println!("No current step"),
        }
    }
}

fn print_help() {
    println!("Commands:");
    println!("  f, next          show the next step");
    println!("  r, prev          go back one step");
    println!("  x                go to the configured step");
    println!("  goto <step>      go to a step, e.g. 'goto 2.6'");
    println!("  trigger <id>     go to the step mapped to a trigger");
    println!("  c, clear         hide everything and start stepping");
    println!("  reset            show the whole model");
    println!("  current          print the current step");
    println!("  steps            list all steps");
    println!("  q, quit          exit");
}

fn print_event(event: NavigatorEvent) {
    match event {
        NavigatorEvent::Started { target } => println!("Going to step {}", target),
        NavigatorEvent::Moved { step, .. } => match step {
            Some(step) => println!("  step {}", step),
            None => println!("  (between steps)"),
        },
        NavigatorEvent::Finished(outcome) => println!("Go-to {}", outcome),
    }
}

/// Read commands from stdin until `quit` or end of input
pub async fn run<A: Animator + Send + 'static>(navigator: Navigator<A>, config: &Config) -> Result<()> {
    // Print go-to progress as it happens
    let mut rx = navigator.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => print_event(event),
                Err(RecvError::Lagged(missed)) => warn!(missed, "Dropped navigation events"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let mut console = Console::new(navigator, config);
    print_help();
    if !console.is_ready() {
        println!("Clear the model with 'c' to start stepping");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match line.parse::<Command>() {
            Ok(command) => {
                if console.execute(command).await? == Flow::Quit {
                    break;
                }
            }
            Err(e) => println!("{}", e),
        }
    }

    console.navigator().cancel().await;
    info!("Console closed");
    Ok(())
}
