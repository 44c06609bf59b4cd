mod config;
mod utils;
mod app;

use std::env::var;
use dotenv::dotenv;
use log::{debug, info, warn};
use picboard_gpio::keypad::{GpioKeypad, Keypad};
use picboard_gpio::lcd::hd44780::driver::{GpioHD44780Driver, HD44780Driver};
use picboard_gpio::policy::ErrorPolicy;
use picboard_gpio::sim::SimBoard;
use crate::app::App;
use crate::config::Config;
use crate::utils::key_position;

/// Environment variable holding the simulated key presses, like `12+3=`.
const KEYS_VAR: &str = "PICBOARD_KEYS";

fn main() -> eyre::Result<()> {
    // Initialize environment and logger
    if let Err(e) = dotenv() {
        eprintln!("No .env loaded: {}", e);
    }
    pretty_env_logger::init();

    info!("PicBoard starting...");

    debug!("Trying to load config...");
    let config = match Config::try_load()? {
        Some(config) => {
            info!("Config loaded.");
            config
        }
        None => {
            info!("Config not found. Using default");
            let config = Config::default();
            config.save()?;
            info!("Default config saved.");
            config
        }
    };

    let bus = config.lcd_bus()?;
    let descriptor = config.keypad_descriptor()?;
    let keys = config.keypad.layout.keys();
    let policy = ErrorPolicy::from(config.policy);

    info!("LCD @ {:?}", bus);
    info!("Keypad @ {:?}, {:?} layout", descriptor, config.keypad.layout);

    let board = SimBoard::new().with_lcd(&bus).with_keypad(&descriptor);

    debug!("Initializing LCD driver...");
    let mut lcd = GpioHD44780Driver::new(&board, &board, &bus).with_policy(policy);
    lcd.init()?;
    lcd.print("PicBoard")?;
    const LAST_LINE: &str = concat!("v.", env!("CARGO_PKG_VERSION"));
    lcd.send_string_at(2, 1, LAST_LINE.as_bytes())?;
    debug!("{:?} initialized.", lcd);

    debug!("Initializing keypad driver...");
    let keypad = GpioKeypad::new(&board, &board, &descriptor, keys).with_policy(policy);
    keypad.initialize()?;
    debug!("{:?} initialized.", keypad);

    info!("PicBoard initialized.");

    let mut app = App::new(&mut lcd, &keypad);
    app.update()?;

    let input = var(KEYS_VAR).unwrap_or_default();
    for key in input.chars() {
        let Some((row, column)) = key_position(keys, key) else {
            warn!("No key labeled {:?}, skipping", key);
            continue;
        };
        board.press_key(row, column);
        app.update()?;
        board.release_key(row, column);
        app.update()?;
    }
    info!("Final state: {:?}", app.state());

    if let Some(sim) = board.lcd() {
        for row in 1..=4 {
            info!("|{}|", sim.row_text(row, app::DISPLAY_WIDTH as u8));
        }
    }
    info!("Simulated time: {} ms", board.clock().now_us() / 1000);

    Ok(())
}
