//! The coordination loop.
//!
//! One task owns [`App`] and calls [`update`] strictly sequentially; every
//! command it returns is spawned as its own task that resolves to at most
//! one message back into the shared inbox. All waiting happens in those
//! command tasks; the loop itself only ever blocks on the inbox.

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::command::Command;
use crate::message::Message;
use crate::state::App;
use crate::update::update;

/// Messages handled per wakeup before yielding back to the scheduler.
const MAX_DRAIN: usize = 256;

pub const INBOX_CAPACITY: usize = 1024;

/// The loop's inbox. The embedding keeps the sender for its own producers
/// (the terminal key reader, at minimum) and hands both ends to [`run`].
pub fn inbox() -> (mpsc::Sender<Message>, mpsc::Receiver<Message>) {
    mpsc::channel(INBOX_CAPACITY)
}

/// Drive the loop until quit. Returns the final state so the embedding can
/// inspect it after shutdown.
pub async fn run(mut app: App, tx: mpsc::Sender<Message>, mut rx: mpsc::Receiver<Message>) -> App {
    let bootstrap = app.bootstrap();
    debug!("bootstrap: {} commands", bootstrap.len());
    for command in bootstrap {
        spawn(command, &tx);
    }

    while !app.should_quit {
        let Some(message) = rx.recv().await else {
            break;
        };
        dispatch(&mut app, message, &tx);

        // Burst absorption: drain whatever queued up behind the wakeup,
        // bounded so a chatty producer cannot starve the scheduler.
        let mut drained = 0;
        while drained < MAX_DRAIN && !app.should_quit {
            match rx.try_recv() {
                Ok(message) => {
                    drained += 1;
                    dispatch(&mut app, message, &tx);
                }
                Err(_) => break,
            }
        }
    }

    info!("coordination loop stopped");
    app
}

fn dispatch(app: &mut App, message: Message, tx: &mpsc::Sender<Message>) {
    for command in update(app, message) {
        spawn(command, tx);
    }
}

fn spawn(command: Command, tx: &mpsc::Sender<Message>) {
    let tx = tx.clone();
    tokio::spawn(async move {
        if let Some(message) = command.run().await {
            let _ = tx.send(message).await;
        }
    });
}
