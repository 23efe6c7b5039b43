use anyhow::Result;
use crossbeam_channel::Sender;
use lsp_server::{Connection, Message, Notification, Response};
use std::ops::ControlFlow;
use tracing_subscriber::EnvFilter;
use ttcn3_lsp::{Dispatcher, LspConnection};

// Implement LspConnection for the sending half of lsp_server::Connection
struct ConnectionWrapper(Sender<Message>);

impl LspConnection for ConnectionWrapper {
    fn send_response(&self, response: Response) -> Result<()> {
        self.0.send(Message::Response(response))?;
        Ok(())
    }

    fn send_notification(&self, notification: Notification) -> Result<()> {
        self.0.send(Message::Notification(notification))?;
        Ok(())
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_writer(std::io::stderr) // LSP uses stdout for protocol, log to stderr
        .init();

    let (connection, io_threads) = Connection::stdio();
    let pool = rayon::ThreadPoolBuilder::new()
        .thread_name(|i| format!("ttcn3-lsp-worker-{}", i))
        .build()?;

    let mut dispatcher = Dispatcher::new(ConnectionWrapper(connection.sender.clone()), pool);
    // A client that goes away without `exit` ends the session abnormally.
    let mut code = 1;
    for message in &connection.receiver {
        if let ControlFlow::Break(exit_code) = dispatcher.handle(message)? {
            code = exit_code;
            break;
        }
    }

    drop(dispatcher);
    drop(connection);
    io_threads.join()?;
    tracing::info!(code, "server stopped");
    std::process::exit(code);
}
