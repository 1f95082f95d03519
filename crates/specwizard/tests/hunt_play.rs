//! Treasure hunt played against a step store on disk.

use rand::rngs::StdRng;
use rand::SeedableRng;

use specwizard::hunt::{HuntEvent, HuntMode, HuntSession, HuntStore, LineScanSource};

fn create_store(dir: &tempfile::TempDir) -> HuntStore {
    let store = HuntStore::open(dir.path().join("hunt.db")).unwrap();
    for code in ["1", "2", "3", "4", "10"] {
        store.add_step(code, format!("picture {code}").as_bytes()).unwrap();
    }
    store
}

#[tokio::test]
async fn test_random_hunt_ends_at_treasure() {
    let dir = tempfile::tempdir().unwrap();
    let store = create_store(&dir);
    assert_eq!(store.sequence().unwrap(), vec!["1", "2", "3", "4", "10"]);

    let mut session = HuntSession::new(&store).unwrap();
    session
        .start(HuntMode::Random, &mut StdRng::seed_from_u64(2024))
        .unwrap();

    let order = session.game().play_order().to_vec();
    assert_eq!(order.last().map(String::as_str), Some("10"));

    // scan every clue in play order, one per line
    let input = order[..order.len() - 1].join("\n");
    let mut source = LineScanSource::new(input.as_bytes());
    let mut last = None;
    let complete = session
        .run(&mut source, |event| last = Some(event.clone()))
        .await
        .unwrap();

    assert!(complete);
    assert_eq!(
        last,
        Some(HuntEvent::Treasure {
            code: "10".to_string(),
            image: Some(b"picture 10".to_vec()),
        })
    );
}

#[tokio::test]
async fn test_steps_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let store = create_store(&dir);
        assert!(store.remove_step("3").unwrap());
    }

    let store = HuntStore::open(dir.path().join("hunt.db")).unwrap();
    assert_eq!(store.count().unwrap(), 4);
    assert_eq!(store.image_for("2").unwrap(), Some(b"picture 2".to_vec()));
}
