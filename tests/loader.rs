use std::{
    path::{
        Path,
        PathBuf,
    },
    time::Duration,
};

use bevy::{
    asset::LoadState,
    prelude::*,
};

use bevy_splat_ingest::{
    LoadProgress,
    SplatAsset,
    SplatIngestPlugin,
    SplatLoaderSettings,
    splat::RECORD_FIELDS,
};

use _harness::neutral_record;



struct AssetDir(PathBuf);

impl AssetDir {
    fn new(name: &str) -> Self {
        let root = std::env::temp_dir().join(format!("bevy_splat_ingest_{name}_{}", std::process::id()));
        std::fs::create_dir_all(&root).unwrap();
        Self(root)
    }

    fn write(&self, file: &str, bytes: &[u8]) {
        std::fs::write(self.0.join(file), bytes).unwrap();
    }
}

impl Drop for AssetDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}


fn loader_app(root: &Path) -> App {
    let mut app = App::new();
    app.add_plugins((
        MinimalPlugins,
        AssetPlugin {
            file_path: root.to_string_lossy().to_string(),
            ..default()
        },
        SplatIngestPlugin,
    ));
    app
}

fn wait_for_load(app: &mut App, handle: &Handle<SplatAsset>) -> LoadState {
    for _ in 0..1000 {
        app.update();

        let state = app.world().resource::<AssetServer>().load_state(handle);
        if matches!(state, LoadState::Loaded | LoadState::Failed(_)) {
            return state;
        }

        std::thread::sleep(Duration::from_millis(5));
    }

    panic!("asset did not finish loading");
}

/// positions along x in reverse order, so reordering is observable
fn reversed_records() -> Vec<u8> {
    [
        neutral_record([10.0, 0.0, 0.0]),
        neutral_record([5.0, 0.0, 0.0]),
        neutral_record([0.0, 0.0, 0.0]),
    ]
    .concat()
}


#[test]
fn loads_splat_assets_through_the_plugin() {
    let assets = AssetDir::new("plugin");
    assets.write("scene.splat", &reversed_records());

    let mut app = loader_app(&assets.0);
    let handle: Handle<SplatAsset> = app.world().resource::<AssetServer>().load("scene.splat");

    assert!(matches!(wait_for_load(&mut app, &handle), LoadState::Loaded));

    let splats = app.world().resource::<Assets<SplatAsset>>();
    let splat = splats.get(&handle).unwrap();

    assert_eq!(splat.len(), 3);
    assert_eq!(splat.name, "scene.splat");
    assert_eq!(splat.table().field_names().collect::<Vec<_>>(), RECORD_FIELDS);
    assert_eq!(splat.table().f32("x"), Some([0.0, 5.0, 10.0].as_slice()));

    let state = app
        .world()
        .resource::<LoadProgress>()
        .snapshot("scene.splat")
        .unwrap();
    assert!(!state.active);
    assert_eq!(state.percentage, 100.0);
    assert_eq!(state.text, "Complete");
}

#[test]
fn animation_frame_settings_keep_source_order() {
    let assets = AssetDir::new("frame");
    assets.write("frame.splat", &reversed_records());

    let mut app = loader_app(&assets.0);
    let handle = app
        .world()
        .resource::<AssetServer>()
        .load_with_settings::<SplatAsset, SplatLoaderSettings>(
            "frame.splat",
            |settings: &mut SplatLoaderSettings| {
                settings.animation_frame = true;
                settings.chunk_size = 16;
            },
        );

    assert!(matches!(wait_for_load(&mut app, &handle), LoadState::Loaded));

    let splats = app.world().resource::<Assets<SplatAsset>>();
    let splat = splats.get(&handle).unwrap();
    assert_eq!(splat.table().f32("x"), Some([10.0, 5.0, 0.0].as_slice()));
}

#[test]
fn malformed_records_fail_and_end_progress() {
    let assets = AssetDir::new("malformed");
    assets.write("broken.splat", &[0u8; 33]);

    let mut app = loader_app(&assets.0);
    let handle: Handle<SplatAsset> = app.world().resource::<AssetServer>().load("broken.splat");

    match wait_for_load(&mut app, &handle) {
        LoadState::Failed(err) => assert!(err.to_string().contains("33"), "{err}"),
        other => panic!("unexpected load state: {other:?}"),
    }

    let state = app
        .world()
        .resource::<LoadProgress>()
        .snapshot("broken.splat")
        .unwrap();
    assert!(!state.active);
    assert_eq!(state.text, "Processing");
}

#[test]
fn unrecognized_files_fail_without_progress() {
    let assets = AssetDir::new("unrecognized");
    assets.write("scene.bin", &reversed_records());

    let mut app = loader_app(&assets.0);
    let handle: Handle<SplatAsset> = app.world().resource::<AssetServer>().load("scene.bin");

    assert!(matches!(wait_for_load(&mut app, &handle), LoadState::Failed(_)));
    assert!(app.world().resource::<LoadProgress>().snapshot("scene.bin").is_none());
}
