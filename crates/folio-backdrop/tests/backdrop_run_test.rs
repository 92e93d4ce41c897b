use folio_backdrop::{Backdrop, Surface};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn small() -> Backdrop {
    Backdrop::new(24, 16, 0.7).unwrap().with_noise_seed(5).unwrap()
}

#[tokio::test]
async fn test_run_stops_on_cancel() {
    let mut backdrop = small();
    let token = CancellationToken::new();
    let (_tx, rx) = tokio::sync::mpsc::unbounded_channel();

    let stopper = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(400)).await;
        stopper.cancel();
    });

    let started = std::time::Instant::now();
    let mut times = Vec::new();
    let frames = backdrop
        .run(token, rx, |_, time_ms| times.push(time_ms))
        .await
        .unwrap();

    assert!(!backdrop.is_running());
    assert_eq!(frames as usize, times.len());
    assert!(frames >= 1);

    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
    assert!(frames as f64 <= elapsed_ms / (1000.0 / 30.0) + 1.0);
    assert!(times.windows(2).all(|w| w[1] > w[0]));
}

#[tokio::test]
async fn test_resize_during_run_is_debounced() {
    let mut backdrop = small();
    let token = CancellationToken::new();
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();

    let stopper = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        tx.send((30, 20)).unwrap();
        tx.send((40, 25)).unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;
        stopper.cancel();
    });

    let mut sizes = Vec::new();
    backdrop
        .run(token, rx, |surface: &Surface, _| {
            sizes.push((surface.width(), surface.height()))
        })
        .await
        .unwrap();

    assert_eq!(backdrop.size(), (40, 25));
    assert_eq!(backdrop.noise().width(), 40);
    assert_eq!(backdrop.noise().height(), 25);
    // The intermediate size of the burst is never drawn.
    assert!(!sizes.contains(&(30, 20)));
    assert_eq!(sizes.first(), Some(&(24, 16)));
    assert_eq!(sizes.last(), Some(&(40, 25)));
}

#[tokio::test]
async fn test_snapshot_writes_ppm() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("frame.ppm");

    let mut backdrop = small();
    backdrop.render(2500.0).unwrap();
    backdrop
        .surface()
        .write_ppm(std::fs::File::create(&path).unwrap())
        .unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert!(bytes.starts_with(b"P6\n24 16\n255\n"));
    assert_eq!(bytes.len(), b"P6\n24 16\n255\n".len() + 24 * 16 * 3);
}
