
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::Level;

use duet_server::{
    Collaborators, InMemoryDirectory, LifecycleController, Lobby, LobbyCommand,
    SessionIdAllocator,
};

use crate::utils::{MockSignalingOutput, test_email};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Names every test lobby's directory knows as verified students.
pub const VERIFIED_NAMES: &[&str] = &["Ada", "Bob", "Cy", "Dee", "Eve"];

pub struct TestLobby {
    pub cmd_tx: mpsc::Sender<LobbyCommand>,
    pub signaling: MockSignalingOutput,
    pub directory: Arc<InMemoryDirectory>,
    pub task: JoinHandle<()>,
}

pub fn create_test_lobby() -> TestLobby {
    create_test_lobby_with(Collaborators::in_memory)
}

/// Like [`create_test_lobby`], with collaborators built around the test
/// directory.
pub fn create_test_lobby_with(
    collaborators: impl FnOnce(Arc<InMemoryDirectory>) -> Collaborators,
) -> TestLobby {
    let directory = Arc::new(InMemoryDirectory::new());
    for name in VERIFIED_NAMES {
        directory.add_verified(&test_email(name), name);
    }

    let (cmd_tx, cmd_rx) = mpsc::channel::<LobbyCommand>(100);
    let signaling = MockSignalingOutput::new();

    let lobby = Lobby::new(
        LifecycleController::new(SessionIdAllocator::new()),
        cmd_rx,
        collaborators(directory.clone()),
        Arc::new(signaling.clone()),
    );

    let task = tokio::spawn(async move {
        lobby.run().await;
    });

    TestLobby {
        cmd_tx,
        signaling,
        directory,
        task,
    }
}
