use anyhow::{Context, Result};
use clap::Parser;
use crossbeam::channel::unbounded;

use frame_compositor::cli::Cli;
use frame_compositor::config::FrameSettings;
use frame_compositor::demo::{DemoActivity, DemoPostProcess, DemoScene};
use frame_compositor::graphics::export::{BmpWriter, SaveBitmapMode};
use frame_compositor::graphics::scene::{DrawContext, Scene};
use frame_compositor::graphics::viewport::SplitLayout;
use frame_compositor::graphics::{FrameManager, HeadlessDriver};
use frame_compositor::logging::{self, LogLevel};
use frame_compositor::server::FrameServer;
use frame_compositor::time::MonotonicClock;

fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::log_init(cli.log_lines, LogLevel::from_i32(cli.verbosity));
    log::info!("Frame compositor demo starting...");

    let settings = match &cli.settings {
        Some(path) if path.exists() => FrameSettings::load(path)?,
        _ => FrameSettings::default(),
    };
    let settings = cli.merge_into_settings(settings)?;

    let mut driver = HeadlessDriver::default();
    let mut frames = FrameManager::create(&mut driver, settings, MonotonicClock::shared())
        .context("Failed to create the frame compositor")?;
    if let Some(path) = &cli.settings {
        frames.set_settings_path(path);
    }

    let players = cli.player_count();
    let layout = SplitLayout::for_players(players);
    frames.reset_split_screens(layout.h_split, layout.v_split)?;

    let mut scene = DemoScene::new(frames.res_x() * 2, frames.res_y())?;
    let mut post = DemoPostProcess::new(scene.width())?;
    let activity = DemoActivity { humans: players };

    let mut server = None;
    let (client_tx, client_rx) = unbounded();
    if cli.networked {
        frames.set_multiplayer_mode(true);
        let notifications = frames.subscribe_network_frames();
        server = Some(FrameServer::spawn(
            frames.network_exchange(),
            notifications,
            frames.screen_count(),
            client_tx,
        )?);
    } else {
        drop(client_tx);
    }

    let mut received = 0;
    for frame in 0..cli.frames {
        scene.tick();
        post.track(scene.actors());
        if frame == 0 {
            for screen in 0..frames.screen_count() {
                frames.set_screen_text(&format!("Player {}", screen + 1), screen, 0, 2000, false);
            }
        }

        let mut ctx = DrawContext::new(&mut scene, &mut post, Some(&activity));
        frames.draw(&mut ctx)?;
        frames.flip_frame_buffers(&mut driver)?;
        received += client_rx.try_iter().count();
    }
    log::info!("Rendered {} frame(s) at {}", cli.frames, frames.resolution());

    let writer = BmpWriter;
    if let Some(base) = &cli.dump {
        frames.save_bitmap(SaveBitmapMode::ScreenDump, base, None, &driver, None, &writer)?;
    }
    if let Some(base) = &cli.world_dump {
        let mut ctx = DrawContext::new(&mut scene, &mut post, Some(&activity));
        frames.save_bitmap(SaveBitmapMode::WorldDump, base, None, &driver, Some(&mut ctx), &writer)?;
    }

    if let Some(path) = &cli.settings {
        frames.settings().save(path)?;
    }

    if let Some(server) = server {
        let stats = server.shutdown()?;
        received += client_rx.try_iter().count();
        log::info!(
            "Frame server sent {} client frame(s) for {} publish(es), {} received",
            stats.snapshots_sent,
            stats.frames_served,
            received
        );
    }

    Ok(())
}
