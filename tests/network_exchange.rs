//! Network frame handoff integration tests: consumers reading while the
//! producer publishes, and the frame server fed by the compositor.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam::channel::unbounded;

use frame_compositor::config::FrameSettings;
use frame_compositor::graphics::driver::HeadlessDriver;
use frame_compositor::graphics::geometry::Vector;
use frame_compositor::graphics::network::NetworkFramePipeline;
use frame_compositor::graphics::scene::DrawContext;
use frame_compositor::graphics::FrameManager;
use frame_compositor::demo::{DemoPostProcess, DemoScene};
use frame_compositor::server::FrameServer;
use frame_compositor::time::ManualClock;

fn color_for(frame: u64) -> u32 {
    (frame % 200) as u32 + 1
}

#[test]
fn consumer_never_sees_a_torn_frame() {
    let mut pipeline = NetworkFramePipeline::new();
    pipeline.resize_viewport(0, 64, 32).unwrap();
    pipeline.resize_viewport(1, 16, 16).unwrap();
    let exchange = pipeline.exchange();
    let done = Arc::new(AtomicBool::new(false));

    let reader = {
        let exchange = Arc::clone(&exchange);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let mut checked = 0u64;
            while !done.load(Ordering::Acquire) {
                let torn = exchange.with_ready_frame(0, |frame| {
                    if frame.frame_number == 0 {
                        return None;
                    }
                    let expected = color_for(frame.frame_number);
                    let uniform = frame.scene.data().iter().all(|&b| b as u32 == expected)
                        && frame.gui.data().iter().all(|&b| b as u32 == expected + 1)
                        && frame.target_pos == Vector::new(frame.frame_number as f32, 0.0);
                    Some(!uniform)
                });
                if let Some(Some(torn)) = torn {
                    assert!(!torn, "consumer saw a partially published frame");
                    checked += 1;
                }
            }
            checked
        })
    };

    for frame in 1..=300u64 {
        pipeline.begin_frame().unwrap();
        for viewport in 0..2 {
            pipeline
                .record_view(viewport, Vector::new(frame as f32, 0.0), &[])
                .unwrap();
            let mut targets = pipeline.staging_targets(viewport).unwrap();
            targets.scene.clear(color_for(frame));
            targets.gui_mut().clear(color_for(frame) + 1);
        }
        assert_eq!(pipeline.prepare_frame_for_network().unwrap(), frame);
    }
    done.store(true, Ordering::Release);
    reader.join().unwrap();

    let last = exchange.snapshot(1).unwrap();
    assert_eq!(last.frame_number, 300);
    assert_eq!(last.scene.get_pixel(15, 15), Some(color_for(300)));
}

#[test]
fn frame_server_relays_compositor_frames() {
    let mut driver = HeadlessDriver::default();
    let settings = FrameSettings {
        resolution_x: 320,
        resolution_y: 160,
        palette_file: String::new(),
        ..FrameSettings::default()
    };
    let mut frames = FrameManager::create(&mut driver, settings, ManualClock::new().shared()).unwrap();
    frames.reset_split_screens(true, false).unwrap();
    frames.set_multiplayer_mode(true);
    frames.create_new_network_player_back_buffer(0, 320, 80).unwrap();
    frames.create_new_network_player_back_buffer(1, 320, 80).unwrap();

    let (tx, rx) = unbounded();
    let server = FrameServer::spawn(
        frames.network_exchange(),
        frames.subscribe_network_frames(),
        frames.screen_count(),
        tx,
    )
    .unwrap();
    assert!(server.is_running());

    let mut scene = DemoScene::new(640, 160).unwrap();
    let mut post = DemoPostProcess::new(640).unwrap();
    for _ in 0..3 {
        scene.tick();
        post.track(scene.actors());
        frames.draw(&mut DrawContext::new(&mut scene, &mut post, None)).unwrap();
    }

    let mut latest = [0u64; 2];
    while latest != [3, 3] {
        let client = rx
            .recv_timeout(Duration::from_secs(5))
            .expect("frame server stalled");
        assert_eq!(client.scene.dimensions(), (320, 80));
        latest[client.viewport] = latest[client.viewport].max(client.frame_number);
    }

    let stats = server.shutdown().unwrap();
    // The last notification may still be queued when the stop arrives
    assert!(stats.frames_served >= 1);
    assert!(stats.frames_served + stats.frames_skipped <= 3);
    assert!(stats.snapshots_sent >= 2);
}
