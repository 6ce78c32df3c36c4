// headless splat loader, paths are relative to the `assets` directory
// cargo run --bin splat_inspect -- --input-file scene.splat

use bevy::{
    prelude::*,
    asset::LoadState,
    log::LogPlugin,
};
use bevy_args::BevyArgsPlugin;

use bevy_splat_ingest::{
    SplatAsset,
    SplatIngestPlugin,
    SplatLoaderSettings,
    utils::SplatIngestConfig,
};


#[derive(Resource)]
struct InputSplat(Handle<SplatAsset>);


fn load_input(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    config: Res<SplatIngestConfig>,
    mut exit: EventWriter<AppExit>,
) {
    if config.input_file.is_empty() {
        error!("no input file given, use --input-file <path>");
        exit.write(AppExit::error());
        return;
    }

    info!("loading {}", config.input_file);

    let settings = config.loader_settings();
    let handle = asset_server.load_with_settings::<SplatAsset, SplatLoaderSettings>(
        config.input_file.clone(),
        move |s: &mut SplatLoaderSettings| *s = settings.clone(),
    );

    commands.insert_resource(InputSplat(handle));
}

fn report_loaded(
    input: Option<Res<InputSplat>>,
    asset_server: Res<AssetServer>,
    splats: Res<Assets<SplatAsset>>,
    config: Res<SplatIngestConfig>,
    mut exit: EventWriter<AppExit>,
) {
    let Some(input) = input else {
        return;
    };

    match asset_server.get_load_state(&input.0) {
        Some(LoadState::Loaded) => {
            let Some(splat) = splats.get(&input.0) else {
                return;
            };

            info!("loaded {} splats from {}", splat.len(), splat.name);

            if config.summary {
                match serde_json::to_string_pretty(&splat.table().summary()) {
                    Ok(summary) => println!("{summary}"),
                    Err(err) => warn!("failed to serialize summary: {err}"),
                }
            }

            exit.write(AppExit::Success);
        },
        Some(LoadState::Failed(err)) => {
            error!("failed to load {}: {err}", config.input_file);
            exit.write(AppExit::error());
        },
        _ => {},
    }
}


fn inspect_app() {
    let mut app = App::new();

    #[cfg(feature = "web_asset")]
    app.add_plugins(bevy_web_asset::WebAssetPlugin::default());

    app.add_plugins((
        MinimalPlugins,
        AssetPlugin::default(),
        LogPlugin::default(),
    ));
    app.add_plugins(BevyArgsPlugin::<SplatIngestConfig>::default());

    app.add_plugins(SplatIngestPlugin);
    app.add_systems(Startup, load_input);
    app.add_systems(Update, report_loaded);

    app.run();
}

pub fn main() {
    inspect_app();
}
