//! # claw-shell
//!
//! Interactive inspection shell for a fleet of nodes.
//!
//! The shell reads lines, expands `$VAR` references, and dispatches the
//! first word to a handler from the active mode's command table. Global
//! mode knows fleet-wide commands; node mode adds commands that act on the
//! node selected with `change-node`.
//!
//! # Architecture
//!
//! All fleet state lives in the registry service from `claw-registry`. The
//! shell never touches it directly: every query goes through the blocking
//! [`client::QueryClient`], one request and one reply at a time.
//!
//! ```text
//! ┌───────────┐   ┌─────────────┐  Request / Reply  ┌──────────────────┐
//! │ LineEditor├──►│    Shell    │◄─────────────────►│ RegistryService  │
//! └───────────┘   │ (ModeStack) │   (blocking)      └──────────────────┘
//!                 └─────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod editor;
pub mod error;
pub mod mailbox;
pub mod mode;
pub mod output;
pub mod samples;
pub mod shell;
pub mod variables;

pub use cli::{Cli, Format};
pub use client::{QueryClient, RegistryTransport, Transport};
pub use config::ShellConfig;
pub use editor::{LineEditor, RustylineEditor, ScriptedEditor};
pub use error::ShellError;
pub use output::OutputFormat;
pub use shell::{CommandResult, Shell};

#[cfg(test)]
pub(crate) mod testing {
    //! In-process fixtures for unit tests.

    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};

    use claw_probe::ProbeEvent;
    use claw_registry::{DEFAULT_INBOX_CAPACITY, RegistryService, Reply, Request};

    use crate::client::{QueryClient, Transport};
    use crate::error::ShellError;
    use crate::output::{BarStyle, OutputFormat};
    use crate::shell::Shell;
    use crate::Format;

    /// Transport that drives a registry service inline, without a runtime.
    pub struct LocalTransport {
        service: RegistryService,
        shut_down: bool,
    }

    impl LocalTransport {
        pub fn new() -> Self {
            let (service, _handle) = RegistryService::new(DEFAULT_INBOX_CAPACITY);
            Self {
                service,
                shut_down: false,
            }
        }
    }

    impl Transport for LocalTransport {
        fn call(&mut self, request: Request) -> Result<Reply, ShellError> {
            Ok(self.service.handle(request))
        }

        fn push(&mut self, event: ProbeEvent) -> Result<(), ShellError> {
            self.service.ingest(event);
            Ok(())
        }

        fn shutdown(&mut self) -> Result<(), ShellError> {
            self.shut_down = true;
            Ok(())
        }
    }

    /// Output sink that tests can read back while the shell owns a clone.
    #[derive(Clone, Default)]
    pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        pub fn contents(&self) -> String {
            let buf = self.0.lock().expect("buffer lock");
            String::from_utf8_lossy(&buf).into_owned()
        }

        /// Return the contents and clear the buffer.
        pub fn take(&self) -> String {
            let mut buf = self.0.lock().expect("buffer lock");
            let text = String::from_utf8_lossy(&buf).into_owned();
            buf.clear();
            text
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, data: &[u8]) -> io::Result<usize> {
            self.0.lock().expect("buffer lock").extend_from_slice(data);
            Ok(data.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// A table-format shell on an empty in-process registry.
    pub fn local_shell() -> (Shell, SharedBuffer) {
        let client = QueryClient::connect(Box::new(LocalTransport::new()), "localhost:4242")
            .expect("handshake");
        let out = SharedBuffer::default();
        let output = OutputFormat::new(Format::Table, BarStyle::default());
        (Shell::new(client, output, Box::new(out.clone())), out)
    }
}
