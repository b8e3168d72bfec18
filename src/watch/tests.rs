use std::fs;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio::time::timeout;

use super::{WatchActor, WatchError};
use crate::mirror::Mirror;
use crate::reload::ChangeEvent;

const WAIT: Duration = Duration::from_secs(2);

struct Fixture {
    source: TempDir,
    mirror: Arc<Mirror>,
    reload_rx: mpsc::Receiver<ChangeEvent>,
    cancel_tx: mpsc::Sender<()>,
    handle: tokio::task::JoinHandle<Result<(), WatchError>>,
}

fn spawn_watch(prepare: impl FnOnce(&std::path::Path)) -> Fixture {
    let source = TempDir::new().unwrap();
    prepare(source.path());

    let mirror = Arc::new(Mirror::new(source.path()).unwrap());
    let (reload_tx, reload_rx) = mpsc::channel(1);
    let actor = WatchActor::new(Arc::clone(&mirror), reload_tx).unwrap();

    let (cancel_tx, cancel_rx) = mpsc::channel(1);
    let handle = tokio::spawn(actor.run(cancel_rx));

    Fixture {
        source,
        mirror,
        reload_rx,
        cancel_tx,
        handle,
    }
}

/// Cancel the loop and wait for it to stop, draining any duplicate events
/// the platform watcher may still deliver for the same write.
async fn finish(fx: Fixture) {
    let Fixture {
        source: _source,
        mirror: _,
        mut reload_rx,
        cancel_tx,
        handle,
    } = fx;

    cancel_tx.send(()).await.unwrap();
    let drain = tokio::spawn(async move { while reload_rx.recv().await.is_some() {} });

    let result = timeout(WAIT, handle)
        .await
        .expect("watch loop did not stop on cancellation")
        .unwrap();
    assert!(result.is_ok());
    drain.abort();
}

#[tokio::test]
async fn test_write_produces_change_event() {
    let mut fx = spawn_watch(|root| {
        fs::write(root.join("page.html"), "<html><head></head></html>").unwrap();
    });

    // let the event loop settle before mutating the tree
    tokio::time::sleep(Duration::from_millis(50)).await;
    fs::write(fx.source.path().join("page.html"), "changed!").unwrap();

    let event = timeout(WAIT, fx.reload_rx.recv())
        .await
        .expect("no change event within bounded wait")
        .unwrap();
    assert_eq!(event.path(), "/page.html");

    // the single affected file was re-mirrored
    let mirrored = fs::read_to_string(fx.mirror.mirror_root().join("page.html")).unwrap();
    assert_eq!(mirrored, "changed!");

    finish(fx).await;
}

#[tokio::test]
async fn test_nested_write_has_nested_path() {
    let mut fx = spawn_watch(|root| {
        fs::create_dir_all(root.join("nested")).unwrap();
        fs::write(root.join("nested/deep.txt"), "v1").unwrap();
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    fs::write(fx.source.path().join("nested/deep.txt"), "v2").unwrap();

    let event = timeout(WAIT, fx.reload_rx.recv())
        .await
        .expect("no change event within bounded wait")
        .unwrap();
    assert_eq!(event.path(), "/nested/deep.txt");

    finish(fx).await;
}

#[tokio::test]
async fn test_cancellation_stops_cleanly() {
    let fx = spawn_watch(|_| {});
    finish(fx).await;
}

#[tokio::test]
async fn test_loop_survives_until_cancelled() {
    let fx = spawn_watch(|root| {
        fs::write(root.join("a.txt"), "a").unwrap();
    });

    // no activity, loop keeps running
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!fx.handle.is_finished());

    finish(fx).await;
}
