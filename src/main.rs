use std::{
    fs,
    sync::{Arc, Mutex},
    thread,
    time::Duration,
};

use anyhow::{Context as _, Result};
use apple_ii_hw::{
    display::{DisplayConfig, GREEN_PHOSPHOR},
    gui::Gui,
    hex,
    memory::io::soft_switches::AccessPolicy,
    savestate::SaveState,
    Emulator,
};
use clap::Parser;
use log::info;
use winit::event_loop::{EventLoop, EventLoopClosed};

/// View an Apple IIe memory dump the way the video hardware would show it.
#[derive(Parser)]
#[command()]
struct Args {
    /// Main RAM image, loaded at $0000. Not needed with --restore.
    #[arg(required_unless_present = "restore")]
    main_ram: Option<String>,

    /// Aux RAM image, loaded at $0000.
    #[arg(long)]
    aux: Option<String>,

    /// Soft switch address to write to, e.g. c050. Can be passed multiple
    /// times; applied in order.
    #[arg(long)]
    switch: Vec<String>,

    /// Text to type into the keyboard queue.
    #[arg(long)]
    key: Option<String>,

    /// Monochrome monitor.
    #[arg(long)]
    mono: bool,

    /// Monochrome phosphor color, RRGGBB.
    #[arg(long)]
    phosphor: Option<String>,

    /// Write a save state here after setting up.
    #[arg(long)]
    save: Option<String>,

    /// Start from a save state instead of RAM images.
    #[arg(long, conflicts_with_all = ["main_ram", "aux"])]
    restore: Option<String>,

    /// Print the text screen and exit instead of opening a window.
    #[arg(long)]
    no_window: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let phosphor = match &args.phosphor {
        Some(s) => hex::decode_rgb(s)?,
        None => GREEN_PHOSPHOR,
    };
    let config = DisplayConfig {
        color: !args.mono,
        phosphor,
    };
    let mut emu = Emulator::new(None, AccessPolicy::DEFAULT, config);

    if let Some(path) = &args.restore {
        SaveState::load(path)?.restore(&mut emu)?;
        info!("restored {path}");
    }
    for (path, aux) in [(&args.main_ram, false), (&args.aux, true)] {
        if let Some(path) = path {
            let bytes = fs::read(path).with_context(|| format!("reading {path}"))?;
            emu.load(0, &bytes, aux)?;
        }
    }

    for s in &args.switch {
        let addr = hex::decode_u16(s)?;
        emu.write(addr, 0, 0);
    }
    if let Some(keys) = &args.key {
        for c in keys.bytes() {
            emu.key_down(if c == b'\n' { 0x0d } else { c });
        }
    }

    if let Some(path) = &args.save {
        SaveState::capture(&emu).save(path)?;
    }

    if args.no_window {
        let screen = emu.render();
        if let Some(text) = &screen.text {
            print!("{text}");
        }
        if let Some(graphics) = &screen.graphics {
            println!("{graphics:?}");
        }
        return Ok(());
    }

    let emu = Arc::new(Mutex::new(emu));

    // Re-draw the screen at 60 Hz. This isn't the "right" way to do it, but
    // it's probably fine for now. See the winit docs for more ideas.
    let event_loop = EventLoop::new()?;
    let event_tx = event_loop.create_proxy();
    thread::spawn(move || loop {
        thread::sleep(Duration::from_secs_f64(1. / 60.));
        match event_tx.send_event(()) {
            Ok(()) => (),
            Err(EventLoopClosed(())) => return,
        }
    });

    let mut gui = Gui::new(emu);
    event_loop.run_app(&mut gui)?;

    Ok(())
}
