//! Shared test harness: a scripted dialplan executor
//!
//! Builds a small in-memory dialplan out of `PlanApp` steps, implements
//! `DialplanExec` over it, and performs the host-side `${var}` substitution
//! so scenarios read like real extension entries.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};

use dialstack_runtime::{
    Channel, Dialstack, DialplanExec, DialplanLocation, EventPublisher, ReturnDisposition,
    StepOutcome, VarSetEvent,
};
use tokio::sync::mpsc::Receiver;

/// One scripted dialplan application
pub enum PlanApp {
    Gosub(&'static str),
    GosubIf(&'static str),
    Return(&'static str),
    StackPop,
    /// Host `Set(name,value)`
    SetVar(&'static str, &'static str),
    /// Host `Set(LOCAL(name),value)`
    SetLocal(&'static str, &'static str),
    NoOp,
}

type Location = (String, String, u32);

pub struct TestDialplan {
    pub runtime: Dialstack,
    program: HashMap<Location, PlanApp>,
    labels: HashMap<(String, String, String), u32>,
    locations: HashSet<Location>,
}

impl TestDialplan {
    pub fn new() -> Self {
        Self {
            runtime: Dialstack::new(),
            program: HashMap::new(),
            labels: HashMap::new(),
            locations: HashSet::new(),
        }
    }

    pub fn with_events(capacity: usize) -> (Self, Receiver<VarSetEvent>) {
        let (events, rx) = EventPublisher::new(capacity);
        let mut plan = Self::new();
        plan.runtime = Dialstack::with_events(events);
        (plan, rx)
    }

    /// Script an application at a location
    pub fn add(&mut self, context: &str, extension: &str, priority: u32, app: PlanApp) {
        let key = (context.to_string(), extension.to_string(), priority);
        self.locations.insert(key.clone());
        self.program.insert(key, app);
    }

    /// Declare a location that exists but runs nothing
    pub fn add_location(&mut self, context: &str, extension: &str, priority: u32) {
        self.locations
            .insert((context.to_string(), extension.to_string(), priority));
    }

    pub fn add_label(&mut self, context: &str, extension: &str, label: &str, priority: u32) {
        self.labels.insert(
            (
                context.to_string(),
                extension.to_string(),
                label.to_string(),
            ),
            priority,
        );
    }

    /// Step until the pbx detaches; panics if the plan never finishes
    pub fn run(&self, chan: &Channel) {
        for _ in 0..1000 {
            if self.step(chan) == StepOutcome::Detached {
                return;
            }
        }
        panic!("scripted dialplan did not finish");
    }

    fn run_app(&self, chan: &Channel, app: &PlanApp) -> Result<ReturnDisposition, ()> {
        match app {
            PlanApp::Gosub(data) => self
                .runtime
                .gosub(self, chan, &subst(chan, data))
                .map(|()| ReturnDisposition::Continue)
                .map_err(|_| ()),
            PlanApp::GosubIf(data) => self
                .runtime
                .gosub_if(self, chan, &subst(chan, data))
                .map(|()| ReturnDisposition::Continue)
                .map_err(|_| ()),
            PlanApp::Return(value) => self
                .runtime
                .return_from(chan, &subst(chan, value))
                .map_err(|_| ()),
            PlanApp::StackPop => {
                self.runtime.stack_pop(chan);
                Ok(ReturnDisposition::Continue)
            }
            PlanApp::SetVar(name, value) => {
                chan.set_var(name, &subst(chan, value));
                Ok(ReturnDisposition::Continue)
            }
            PlanApp::SetLocal(name, value) => self
                .runtime
                .local_write(chan, name, &subst(chan, value))
                .map(|()| ReturnDisposition::Continue)
                .map_err(|_| ()),
            PlanApp::NoOp => Ok(ReturnDisposition::Continue),
        }
    }
}

impl DialplanExec for TestDialplan {
    fn exists(
        &self,
        _chan: &Channel,
        context: &str,
        extension: &str,
        priority: u32,
        _caller_id: Option<&str>,
    ) -> bool {
        self.locations
            .contains(&(context.to_string(), extension.to_string(), priority))
    }

    fn find_label(
        &self,
        _chan: &Channel,
        context: &str,
        extension: &str,
        label: &str,
    ) -> Option<u32> {
        self.labels
            .get(&(
                context.to_string(),
                extension.to_string(),
                label.to_string(),
            ))
            .copied()
    }

    fn step(&self, chan: &Channel) -> StepOutcome {
        let loc = chan.location();
        let key = (loc.context.clone(), loc.extension.clone(), loc.priority);
        let Some(app) = self.program.get(&key) else {
            return StepOutcome::Detached;
        };
        match self.run_app(chan, app) {
            Err(()) | Ok(ReturnDisposition::StopAgi) => StepOutcome::Detached,
            Ok(ReturnDisposition::Continue) => {
                // an application that did not jump falls through to the
                // next priority
                if chan.location() == loc {
                    chan.set_location(DialplanLocation {
                        priority: loc.priority + 1,
                        ..loc
                    });
                }
                StepOutcome::Continue
            }
        }
    }
}

/// Host-side `${var}` substitution over the channel variable store
pub fn subst(chan: &Channel, input: &str) -> String {
    let mut out = String::new();
    let mut rest = input;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                out.push_str(&chan.read_var(&after[..end]).unwrap_or_default());
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// A channel mid-pbx at the given location
pub fn channel_at(context: &str, extension: &str, priority: u32) -> Channel {
    let chan = Channel::new(
        "Test/1-00000001",
        "1700000000.1",
        DialplanLocation::new(context, extension, priority),
    );
    chan.set_pbx_attached(true);
    chan
}

/// A channel with no pbx attached, as the AGI bridge sees it
pub fn agi_channel_at(context: &str, extension: &str, priority: u32) -> Channel {
    Channel::new(
        "Test/1-00000001",
        "1700000000.1",
        DialplanLocation::new(context, extension, priority),
    )
}

pub fn loc(context: &str, extension: &str, priority: u32) -> DialplanLocation {
    DialplanLocation::new(context, extension, priority)
}
