//! Extension lifecycle: activation wires the reporter to host events,
//! deactivation unwires it and releases the status item.

use tracing::{debug, info};

use crate::config::NAMESPACE;
use crate::error::MatchbarResult;
use crate::events::{EventBus, EventKind, HostEvent, SubscriptionId};
use crate::reporter::{MatchReporter, TargetSelection};
use crate::status::StatusLabel;

pub struct Extension {
    reporter: MatchReporter,
    bus: EventBus<MatchReporter>,
    subscriptions: Vec<SubscriptionId>,
    active: bool,
}

impl Extension {
    /// Subscribe the reporter's handlers and run the activation evaluation.
    pub fn activate(reporter: MatchReporter) -> Self {
        let mut bus = EventBus::new();
        let subscriptions = vec![
            bus.subscribe(
                EventKind::Activated,
                Box::new(|reporter: &mut MatchReporter, _: &HostEvent| {
                    reporter.evaluate();
                }),
            ),
            bus.subscribe(
                EventKind::ConfigurationChanged,
                Box::new(|reporter: &mut MatchReporter, event: &HostEvent| {
                    if event.affects_namespace() {
                        reporter.evaluate();
                    }
                }),
            ),
            bus.subscribe(
                EventKind::DocumentSaved,
                Box::new(|reporter: &mut MatchReporter, event: &HostEvent| {
                    if let HostEvent::DocumentSaved { path } = event {
                        if reporter.is_watched(path) {
                            reporter.evaluate();
                        } else {
                            debug!(path = %path.display(), "ignoring save of unwatched document");
                        }
                    }
                }),
            ),
        ];

        let mut extension = Self {
            reporter,
            bus,
            subscriptions,
            active: true,
        };
        extension.handle(&HostEvent::Activated);
        info!("matchbar activated");
        extension
    }

    /// Deliver a host event. `Deactivated` tears the extension down.
    ///
    /// Saving the settings file itself is delivered as a configuration change
    /// of the `matchbar` namespace.
    pub fn handle(&mut self, event: &HostEvent) {
        if !self.active {
            return;
        }
        match event {
            HostEvent::Deactivated => self.deactivate(),
            HostEvent::DocumentSaved { path } if self.reporter.is_settings_file(path) => {
                debug!(path = %path.display(), "settings file saved");
                let changed = HostEvent::ConfigurationChanged {
                    sections: vec![NAMESPACE.to_string()],
                };
                self.bus.dispatch(&mut self.reporter, &changed);
            }
            _ => {
                self.bus.dispatch(&mut self.reporter, event);
            }
        }
    }

    /// Unsubscribe every handler and dispose the status item. Idempotent.
    pub fn deactivate(&mut self) {
        if !self.active {
            return;
        }
        for id in self.subscriptions.drain(..) {
            self.bus.unsubscribe(id);
        }
        self.reporter.dispose();
        self.active = false;
        info!("matchbar deactivated");
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_pattern(&mut self, pattern: Option<&str>) -> MatchbarResult<bool> {
        self.reporter.set_pattern(pattern)
    }

    pub fn set_target_file(&mut self, selection: &TargetSelection) -> MatchbarResult<String> {
        self.reporter.set_target_file(selection)
    }

    /// Current label, if the status item is still alive.
    pub fn label(&self) -> Option<&StatusLabel> {
        self.reporter.status().label()
    }

    pub fn reporter(&self) -> &MatchReporter {
        &self.reporter
    }

    pub fn reporter_mut(&mut self) -> &mut MatchReporter {
        &mut self.reporter
    }

    /// Number of live subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.bus.len()
    }
}

impl Drop for Extension {
    fn drop(&mut self) {
        self.deactivate();
    }
}
