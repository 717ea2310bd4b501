use std::{env, error::Error, fs, path::PathBuf, sync::Arc};

use parking_lot::Mutex;
use poser::chunk::ChunkFile;
use poser::env::WindowPrefs;
use poser::host::FrameBufferHost;
use poser::quantizer::Quantizer;
use poser::regs::lcd::{BOARD, BOARD_BACKLIGHT, BOARD_LED_GREEN, LCKCON, LCKCON_LCDON};
use poser::regs::{AccessSize, Device, LCD_REGS_BASE, RAM_BASE};
use poser::screen::Screen;
use poser::session::SessionFile;
use poser::skin::{decode_image, outline, Skin, SkinInfo};
use poser::window::{HostWindow, Window};

const DEMO_RAM_SIZE: usize = 0x10000;
/// Row bytes of the power-on 160x160 1-bpp panel.
const DEMO_ROW_BYTES: u32 = 20;
const DEMO_LINES: u32 = 160;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let mut args = env::args().skip(1);
    let Some(command) = args.next() else {
        print_usage();
        return Ok(());
    };
    let rest: Vec<String> = args.collect();

    match command.as_str() {
        "skin" => run_skin(&rest),
        "demo" => run_demo(&rest),
        "chunks" => run_chunks(&rest),
        "quantize" => run_quantize(&rest),
        "--help" | "-h" | "help" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            print_usage();
            Ok(())
        }
    }
}

/// Flags shared by the subcommands. Unknown flags are reported by the caller.
#[derive(Default)]
struct Options {
    skinfo: Option<PathBuf>,
    image: Option<PathBuf>,
    session: Option<PathBuf>,
    out: Option<PathBuf>,
    scale: Option<i32>,
    frames: Option<usize>,
    colors: Option<usize>,
    bits: Option<u32>,
    positional: Vec<String>,
}

fn parse_options(args: &[String]) -> Result<Options, String> {
    let mut opts = Options::default();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let mut value = || {
            iter.next()
                .cloned()
                .ok_or_else(|| format!("{arg} requires a value"))
        };
        match arg.as_str() {
            "--skinfo" => opts.skinfo = Some(PathBuf::from(value()?)),
            "--image" => opts.image = Some(PathBuf::from(value()?)),
            "--session" => opts.session = Some(PathBuf::from(value()?)),
            "--out" => opts.out = Some(PathBuf::from(value()?)),
            "--scale" => {
                let raw = value()?;
                match raw.parse::<i32>() {
                    Ok(scale @ (1 | 2)) => opts.scale = Some(scale),
                    _ => return Err(format!("invalid --scale value: {raw} (expected 1 or 2)")),
                }
            }
            "--frames" => {
                let raw = value()?;
                opts.frames =
                    Some(raw.parse().map_err(|_| format!("invalid --frames value: {raw}"))?);
            }
            "--colors" => {
                let raw = value()?;
                opts.colors =
                    Some(raw.parse().map_err(|_| format!("invalid --colors value: {raw}"))?);
            }
            "--bits" => {
                let raw = value()?;
                match raw.parse::<u32>() {
                    Ok(bits @ 1..=8) => opts.bits = Some(bits),
                    _ => return Err(format!("invalid --bits value: {raw} (expected 1..=8)")),
                }
            }
            flag if flag.starts_with("--") => return Err(format!("Unknown argument: {flag}")),
            _ => opts.positional.push(arg.clone()),
        }
    }
    Ok(opts)
}

fn options_or_usage(args: &[String]) -> Option<Options> {
    match parse_options(args) {
        Ok(opts) => Some(opts),
        Err(message) => {
            eprintln!("{message}");
            print_usage();
            None
        }
    }
}

fn run_skin(args: &[String]) -> Result<(), Box<dyn Error>> {
    let Some(opts) = options_or_usage(args) else {
        return Ok(());
    };
    let Some(out) = opts.out else {
        eprintln!("skin requires --out <file.png>");
        return Ok(());
    };
    let scale = opts.scale.unwrap_or(1);

    let (info, dir) = match &opts.skinfo {
        Some(path) => {
            let info = SkinInfo::parse(&fs::read_to_string(path)?)?;
            (info, path.parent().map(PathBuf::from))
        }
        None => (SkinInfo::generic(), None),
    };
    let skin = Skin::new(info, scale);
    let image = match &opts.image {
        Some(path) => decode_image(&fs::read(path)?)?,
        None => skin.load_image(dir.as_deref())?,
    };

    let region = outline(&image)?;
    let bounds = region.bounds();
    println!(
        "skin \"{}\" at {scale}x: {}x{} image, outline {} rect(s) within ({}, {}, {}, {})",
        skin.info().name,
        image.size().x,
        image.size().y,
        region.get_rects().len(),
        bounds.left,
        bounds.top,
        bounds.right,
        bounds.bottom,
    );
    for (kind, rect) in skin.elements() {
        println!(
            "  {:<16} ({}, {}, {}, {})",
            kind.name(),
            rect.left,
            rect.top,
            rect.right,
            rect.bottom
        );
    }

    let mut host = FrameBufferHost::new();
    host.window_reset(image.size());
    host.paint_case(&image);
    host.save_png(&out)?;
    Ok(())
}

fn run_demo(args: &[String]) -> Result<(), Box<dyn Error>> {
    let Some(opts) = options_or_usage(args) else {
        return Ok(());
    };
    let Some(out) = opts.out else {
        eprintln!("demo requires --out <file.png>");
        return Ok(());
    };
    let frames = opts.frames.unwrap_or(1).max(1);
    let mut prefs = WindowPrefs::from_env();
    if let Some(scale) = opts.scale {
        prefs.scale = scale;
    }

    let screen = Arc::new(Screen::new());
    let device = Arc::new(Mutex::new(Device::new(DEMO_RAM_SIZE, screen.clone())?));
    let mut window = Window::new(
        FrameBufferHost::new(),
        device.clone(),
        screen,
        SkinInfo::generic(),
        prefs,
    )?;

    {
        let mut device = device.lock();
        device.write(LCD_REGS_BASE + LCKCON, AccessSize::Byte, LCKCON_LCDON as u32)?;
        device.write(
            LCD_REGS_BASE + BOARD,
            AccessSize::Byte,
            (BOARD_BACKLIGHT | BOARD_LED_GREEN) as u32,
        )?;
    }
    window.handle_idle()?;

    let mut painted = 0usize;
    for frame in 0..frames as u32 {
        {
            let mut device = device.lock();
            // Diagonal stripes, shifted one pixel per frame.
            for line in 0..DEMO_LINES {
                let pattern = 0x8080_8080u32.rotate_right((line + frame) % 8);
                for word in 0..DEMO_ROW_BYTES / 4 {
                    let addr = RAM_BASE + line * DEMO_ROW_BYTES + word * 4;
                    device.write(addr, AccessSize::Long, pattern)?;
                }
            }
        }
        window.handle_idle()?;
        let updates = window.host_mut().take_updates();
        log::debug!("frame {frame}: {} update(s)", updates.len());
        painted += updates.len();
    }
    println!("painted {painted} update(s) over {frames} frame(s)");

    window.host().save_png(&out)?;

    if let Some(path) = opts.session {
        let file = fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;
        let mut session = SessionFile::new(ChunkFile::new(file));
        session.write_device("PalmIIIc")?;
        let device = device.lock();
        device.save(&mut session)?;
        if let Some(ram) = device.ram() {
            session.write_ram_image(ram.bytes())?;
        }
        session.finish()?.flush()?;
        println!("saved session to {}", path.display());
    }
    Ok(())
}

fn run_chunks(args: &[String]) -> Result<(), Box<dyn Error>> {
    let Some(opts) = options_or_usage(args) else {
        return Ok(());
    };
    let Some(path) = opts.positional.first() else {
        eprintln!("chunks requires a session file");
        return Ok(());
    };
    let file = fs::OpenOptions::new().read(true).open(path)?;
    let mut chunks = ChunkFile::new(file);
    for (tag, len) in chunks.list_chunks()? {
        println!("{tag}  {len:>8}");
    }
    Ok(())
}

fn run_quantize(args: &[String]) -> Result<(), Box<dyn Error>> {
    let Some(opts) = options_or_usage(args) else {
        return Ok(());
    };
    let Some(path) = opts.positional.first() else {
        eprintln!("quantize requires an image file");
        return Ok(());
    };
    let image = decode_image(&fs::read(path)?)?;
    let mut quantizer = Quantizer::new(opts.colors.unwrap_or(256).max(1), opts.bits.unwrap_or(6));
    quantizer.process_image(&image)?;
    let colors = quantizer.color_table();
    println!(
        "{} color(s) from {} pixel(s)",
        colors.len(),
        quantizer.pixel_count()
    );
    for (ii, rgb) in colors.iter().enumerate() {
        println!(
            "{ii:>3}: #{:02X}{:02X}{:02X}",
            rgb.red, rgb.green, rgb.blue
        );
    }
    Ok(())
}

fn print_usage() {
    eprintln!("Usage: poser <command> [options]");
    eprintln!("Commands:");
    eprintln!("  skin [--skinfo <file>] [--image <file>] [--scale <1|2>] --out <file.png>");
    eprintln!("      Load a skin (or the built-in one), print its layout and outline, write it as PNG");
    eprintln!("  demo [--scale <1|2>] [--frames <n>] [--session <file>] --out <file.png>");
    eprintln!("      Drive the paint pipeline from synthetic LCD writes and write the window as PNG");
    eprintln!("  chunks <session file>");
    eprintln!("      List the tag and length of every chunk");
    eprintln!("  quantize <image> [--colors <n>] [--bits <1..8>]");
    eprintln!("      Print an adaptive palette for an image");
    eprintln!();
    eprintln!(
        "Window preferences also come from POSER_SCALE, POSER_DIM_INACTIVE, \
         POSER_SHOW_DEBUG_MODE, POSER_SHOW_GREMLIN_MODE, POSER_FORCE_WHOLE_LCD and POSER_LCD_COLORS."
    );
}
