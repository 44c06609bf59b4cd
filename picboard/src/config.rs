use std::env::var_os;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use eyre::{eyre, WrapErr};
use picboard_gpio::keypad::{KeyMap, KeypadDescriptor, CALCULATOR_KEYS, PHONE_KEYS};
use picboard_gpio::lcd::hd44780::driver::HD44780Bus;
use picboard_gpio::policy::ErrorPolicy;
use picboard_gpio::PinRef;
use serde::{Deserialize, Serialize};
use crate::utils::{parse_pin_bus, parse_pin_list};

/// Environment variable naming the config file.
pub const CONFIG_PATH_VAR: &str = "PICBOARD_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "picboard.json";

#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
pub struct Config {
    pub lcd: LcdConfig,
    pub keypad: KeypadConfig,
    #[serde(default)]
    pub policy: PolicyConfig,
}

/// Wiring of the display. Pins are written like `RC0`, the data lines from D0 (or D4) up.
#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
pub struct LcdConfig {
    pub rs: String,
    pub en: String,
    /// Either 4 or 8 pins, which selects the bus width.
    pub data: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
pub struct KeypadConfig {
    pub rows: String,
    pub columns: String,
    #[serde(default)]
    pub layout: KeyLayout,
}

#[derive(Serialize, Deserialize, Debug, Default, Copy, Clone, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum KeyLayout {
    #[default]
    Calculator,
    Phone,
}

#[derive(Serialize, Deserialize, Debug, Default, Copy, Clone, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum PolicyConfig {
    #[default]
    Permissive,
    Strict,
}

impl From<PolicyConfig> for ErrorPolicy {
    fn from(value: PolicyConfig) -> Self {
        match value {
            PolicyConfig::Permissive => ErrorPolicy::Permissive,
            PolicyConfig::Strict => ErrorPolicy::Strict,
        }
    }
}

impl KeyLayout {
    pub fn keys(self) -> &'static KeyMap {
        match self {
            KeyLayout::Calculator => &CALCULATOR_KEYS,
            KeyLayout::Phone => &PHONE_KEYS,
        }
    }
}

impl Config {
    fn path() -> PathBuf {
        var_os(CONFIG_PATH_VAR)
            .unwrap_or_else(|| OsString::from(DEFAULT_CONFIG_PATH))
            .into()
    }

    /// Loads the config from the file named by [CONFIG_PATH_VAR].
    ///
    /// Returns `Ok(None)` only if the file does not exist.
    pub fn try_load() -> eyre::Result<Option<Self>> {
        Self::load_from(&Self::path())
    }

    fn load_from(config_path: &Path) -> eyre::Result<Option<Self>> {
        if !config_path.exists() {
            return Ok(None);
        }
        let file = std::fs::File::open(config_path)
            .wrap_err_with(|| format!("Opening config {} failed", config_path.display()))?;
        let reader = std::io::BufReader::new(file);
        let config = serde_json::from_reader(reader)
            .wrap_err_with(|| format!("Parsing config {} failed", config_path.display()))?;
        Ok(Some(config))
    }

    pub fn save(&self) -> std::io::Result<()> {
        self.save_to(&Self::path())
    }

    fn save_to(&self, config_path: &Path) -> std::io::Result<()> {
        let file = std::fs::File::create(config_path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Builds the display bus descriptor, choosing the width from the number of data pins.
    pub fn lcd_bus(&self) -> eyre::Result<HD44780Bus> {
        let rs = self.lcd.rs.parse::<PinRef>()?;
        let en = self.lcd.en.parse::<PinRef>()?;
        let data = parse_pin_list(&self.lcd.data)?;
        let bus = match data.len() {
            4 => HD44780Bus::new_4bit(rs, en, [data[0], data[1], data[2], data[3]])?,
            8 => HD44780Bus::new_8bit(rs, en, std::array::from_fn(|i| data[i]))?,
            n => return Err(eyre!("Expected 4 or 8 LCD data pins, got {}", n)),
        };
        Ok(bus)
    }

    pub fn keypad_descriptor(&self) -> eyre::Result<KeypadDescriptor> {
        let rows = parse_pin_bus(&self.keypad.rows)?;
        let columns = parse_pin_bus(&self.keypad.columns)?;
        Ok(KeypadDescriptor::new(rows, columns)?)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            lcd: LcdConfig {
                rs: "RC0".to_string(),
                en: "RC1".to_string(),
                data: "RC2, RC3, RC4, RC5".to_string(),
            },
            keypad: KeypadConfig {
                rows: "RB0, RB1, RB2, RB3".to_string(),
                columns: "RB4, RB5, RB6, RB7".to_string(),
                layout: KeyLayout::Calculator,
            },
            policy: PolicyConfig::Permissive,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use picboard_gpio::Port;

    #[test]
    fn default_config_builds_descriptors() {
        let config = Config::default();
        let bus = config.lcd_bus().unwrap();
        assert!(bus.is_4bit());
        assert_eq!(bus.rs(), PinRef::new(Port::C, 0));
        let descriptor = config.keypad_descriptor().unwrap();
        assert_eq!(descriptor.columns()[3], PinRef::new(Port::B, 7));
        assert_eq!(config.keypad.layout.keys(), &CALCULATOR_KEYS);
    }

    #[test]
    fn parses_json() {
        let config: Config = serde_json::from_str(
            r#"{
                "lcd": { "rs": "RE0", "en": "RE1", "data": "D0 D1 D2 D3 D4 D5 D6 D7" },
                "keypad": { "rows": "B0,B1,B2,B3", "columns": "B4,B5,B6,B7", "layout": "phone" },
                "policy": "strict"
            }"#,
        )
        .unwrap();
        assert!(config.lcd_bus().unwrap().is_8bit());
        assert_eq!(config.keypad.layout, KeyLayout::Phone);
        assert_eq!(ErrorPolicy::from(config.policy), ErrorPolicy::Strict);

        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(serde_json::from_str::<Config>(&json).unwrap(), config);
    }

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("picboard-{}-{}.json", name, std::process::id()))
    }

    #[test]
    fn missing_file_loads_as_none() {
        let path = scratch_path("missing");
        let _ = std::fs::remove_file(&path);
        assert!(Config::load_from(&path).unwrap().is_none());
    }

    #[test]
    fn saved_config_loads_back() {
        let path = scratch_path("saved");
        let mut config = Config::default();
        config.policy = PolicyConfig::Strict;
        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), Some(config));
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn malformed_file_is_reported_and_kept() {
        let path = scratch_path("malformed");
        let contents = r#"{"lcd":{"rs":"RE0","en":"RE1","data":"D0 D1 D2 D3"},"keypad":{"rows":"B0,B1,B2,B3","columns":"B4,B5,B6,B7",}}"#;
        std::fs::write(&path, contents).unwrap();

        assert!(Config::load_from(&path).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), contents);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn rejects_bad_wiring() {
        let mut config = Config::default();
        config.lcd.data = "RC2, RC3, RC4".to_string();
        assert!(config.lcd_bus().is_err());

        let mut config = Config::default();
        config.lcd.en = "RC2".to_string();
        assert!(config.lcd_bus().is_err());

        let mut config = Config::default();
        config.keypad.columns = "RB3, RB5, RB6, RB7".to_string();
        assert!(config.keypad_descriptor().is_err());
    }
}
