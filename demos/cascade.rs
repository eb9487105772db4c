use std::time::Duration;

use calloop::EventLoop;
use calloop::timer::{TimeoutAction, Timer};
use unfurl::animation::OffsetAnimation;
use unfurl::prelude::*;

/// Compositor that just logs what it would animate
struct LogCompositor;

impl Compositor for LogCompositor {
    fn supports_offset_animation(&self) -> bool {
        true
    }

    fn start_offset_animation(&mut self, element: ElementId, animation: &OffsetAnimation) {
        log::info!(
            "animate {element}: {} -> {} over {:?}",
            animation.from,
            animation.to,
            animation.duration
        );
    }
}

fn main() -> unfurl::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();

    // Folder with a header row, a nested group and a hidden details group
    let mut tree = Tree::new();
    let folder = tree.container();
    let header = tree.leaf();
    let group = tree.container();
    let details = tree.container();
    tree.append_child(folder, header);
    tree.append_child(folder, group);
    for _ in 0..3 {
        let tile = tree.leaf();
        tree.append_child(group, tile);
    }
    tree.append_child(folder, details);
    let secret = tree.leaf();
    tree.append_child(details, secret);
    tree.set_visibility(details, Visibility::Collapsed);
    tree.set_visibility(folder, Visibility::Collapsed);

    let mut event_loop = EventLoop::try_new()?;
    let handle = event_loop.handle();
    let signal = event_loop.get_signal();
    let mut stage = Stage::new(handle.clone(), tree, LogCompositor, StageConfig::default());

    // Never laid out yet: the cascade waits for the layout below
    stage.show(folder, Duration::from_millis(250))?;

    let mut script = 0;
    handle
        .insert_source(
            Timer::from_duration(Duration::from_millis(16)),
            move |_, _, stage| {
                script += 1;
                let step = match script {
                    1 => stage.complete_layout(folder, 120.0),
                    2 => stage.hide(folder, None),
                    3 => stage.show(folder, Duration::from_millis(150)),
                    _ => {
                        signal.stop();
                        return TimeoutAction::Drop;
                    }
                };
                if let Err(err) = step {
                    log::error!("demo step {script} failed: {err}");
                }
                TimeoutAction::ToDuration(Duration::from_millis(500))
            },
        )
        .map_err(|e| e.error)?;

    event_loop.run(None, &mut stage, |_| {})?;
    log::info!("done, folder state {:?}", stage.state(folder));
    Ok(())
}
