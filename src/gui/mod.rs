//! GUI module using the Slint framework
//!
//! A single window: a save path field with a Browse button, a Repair button
//! and a scrolling log. Repairs run on a worker thread; progress lines come
//! back over a channel that a UI timer drains.

mod settings;
pub use settings::Settings;

slint::slint! {
    import { Button, LineEdit, ScrollView } from "std-widgets.slint";

    export component RepairWindow inherits Window {
        title: "Save File Repair Tool";
        preferred-width: 600px;
        preferred-height: 400px;
        background: #1e1e2e;

        in-out property <string> save_path;
        in-out property <string> log_text;
        in-out property <bool> busy: false;

        callback browse();
        callback repair();

        VerticalLayout {
            padding: 10px;
            spacing: 10px;

            HorizontalLayout {
                spacing: 5px;

                LineEdit {
                    horizontal-stretch: 1;
                    text <=> root.save_path;
                    placeholder-text: "Select a save .zip file";
                    enabled: !root.busy;
                }

                Button {
                    text: "Browse";
                    enabled: !root.busy;
                    clicked => { root.browse(); }
                }
            }

            HorizontalLayout {
                alignment: center;

                Button {
                    text: root.busy ? "Repairing..." : "Repair Save";
                    primary: true;
                    enabled: !root.busy;
                    clicked => { root.repair(); }
                }
            }

            // Scrollable log area
            Rectangle {
                vertical-stretch: 1;
                background: #181825;
                border-radius: 4px;

                VerticalLayout {
                    padding: 8px;

                    ScrollView {
                        viewport-width: self.width;
                        viewport-height: log-text-content.preferred-height;

                        log-text-content := Text {
                            text: root.log_text;
                            font-size: 11px;
                            font-family: "monospace";
                            color: #a6adc8;
                            wrap: word-wrap;
                            width: parent.viewport-width;
                            horizontal-alignment: left;
                            vertical-alignment: top;
                        }
                    }
                }
            }
        }
    }
}

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::time::Duration;

use tracing::{error, warn};

use crate::repair::{self, validate_selection, LogSink, PathSupplier};

/// Messages sent from the repair worker thread to the window
#[derive(Debug)]
enum RepairEvent {
    /// Progress line to append to the log
    Log(String),
    /// Repair finished: output path, or the message for the error dialog
    Finished(Result<PathBuf, String>),
}

/// Forwards pipeline progress to the UI thread
struct ChannelSink {
    tx: Sender<RepairEvent>,
}

impl LogSink for ChannelSink {
    fn log(&mut self, message: &str) {
        self.tx.send(RepairEvent::Log(message.to_string())).ok();
    }
}

impl PathSupplier for RepairWindow {
    fn selected_path(&self) -> Option<PathBuf> {
        self.get_save_path().to_string().selected_path()
    }
}

/// State shared by the window callbacks
struct AppState {
    settings: Settings,
    busy: bool,
}

/// Owns the window, its state and the worker channel
pub struct RepairApp {
    window: RepairWindow,
    state: Rc<RefCell<AppState>>,
    sender: Sender<RepairEvent>,
    // Must stay alive for the log to keep updating
    timer: slint::Timer,
}

impl RepairApp {
    pub fn new() -> Result<Self, slint::PlatformError> {
        let window = RepairWindow::new()?;
        let state = Rc::new(RefCell::new(AppState {
            settings: Settings::load(),
            busy: false,
        }));
        let (sender, receiver) = channel();

        let app = Self {
            window,
            state,
            sender,
            timer: slint::Timer::default(),
        };
        app.connect_browse();
        app.connect_repair();
        app.start_polling(receiver);
        Ok(app)
    }

    pub fn run(&self) -> Result<(), slint::PlatformError> {
        self.window.run()
    }

    /// Browse button: pick a .zip with the native file dialog
    fn connect_browse(&self) {
        let window_weak = self.window.as_weak();
        let state = Rc::clone(&self.state);
        self.window.on_browse(move || {
            let Some(window) = window_weak.upgrade() else {
                return;
            };

            let mut dialog = rfd::FileDialog::new().add_filter("ZIP Files", &["zip"]);
            let last_directory = state.borrow().settings.last_directory.clone();
            if !last_directory.is_empty() {
                dialog = dialog.set_directory(&last_directory);
            }

            if let Some(path) = dialog.pick_file() {
                window.set_save_path(path.display().to_string().into());
            }
        });
    }

    /// Repair button: validate the selection and start a worker
    fn connect_repair(&self) {
        let window_weak = self.window.as_weak();
        let state = Rc::clone(&self.state);
        let sender = self.sender.clone();
        self.window.on_repair(move || {
            let Some(window) = window_weak.upgrade() else {
                return;
            };
            if state.borrow().busy {
                return;
            }

            let path = match validate_selection(&window) {
                Ok(path) => path,
                Err(e) => {
                    show_error(&e.user_message());
                    return;
                }
            };

            let config = {
                let mut state = state.borrow_mut();
                state.settings.remember_selection(&path);
                if let Err(e) = state.settings.save() {
                    warn!("Failed to save settings: {:#}", e);
                }
                state.busy = true;
                state.settings.repair_config()
            };
            window.set_busy(true);
            window.set_log_text("".into());

            let sender = sender.clone();
            std::thread::spawn(move || {
                let mut sink = ChannelSink { tx: sender.clone() };
                let result = repair::repair_save(&path, &config, &mut sink)
                    .map(|outcome| outcome.output_path)
                    .map_err(|e| {
                        error!("Repair of {} failed: {}", path.display(), e);
                        e.user_message()
                    });
                sender.send(RepairEvent::Finished(result)).ok();
            });
        });
    }

    /// Drain worker events into the window every 100ms
    fn start_polling(&self, events: Receiver<RepairEvent>) {
        let window_weak = self.window.as_weak();
        let state = Rc::clone(&self.state);
        self.timer.start(
            slint::TimerMode::Repeated,
            Duration::from_millis(100),
            move || {
                let Some(window) = window_weak.upgrade() else {
                    return;
                };

                while let Ok(event) = events.try_recv() {
                    match event {
                        RepairEvent::Log(line) => append_log(&window, &line),
                        RepairEvent::Finished(result) => {
                            state.borrow_mut().busy = false;
                            window.set_busy(false);
                            if let Err(message) = result {
                                append_log(&window, &message);
                                show_error(&message);
                            }
                        }
                    }
                }
            },
        );
    }
}

/// Append a line to the log area
fn append_log(window: &RepairWindow, line: &str) {
    let current = window.get_log_text();
    let new_text = if current.is_empty() {
        line.to_string()
    } else {
        format!("{}\n{}", current, line)
    };
    window.set_log_text(new_text.into());
}

/// Show a modal error dialog
fn show_error(message: &str) {
    rfd::MessageDialog::new()
        .set_level(rfd::MessageLevel::Error)
        .set_title("Error")
        .set_description(message)
        .set_buttons(rfd::MessageButtons::Ok)
        .show();
}

/// Initialize and run the repair window
pub fn run() -> Result<(), slint::PlatformError> {
    let app = RepairApp::new()?;
    app.run()
}
