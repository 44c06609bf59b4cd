use picboard_gpio::keypad::KeyMap;
use picboard_gpio::PinRef;

/// Parses a list of pin names separated by commas, spaces or semicolons, like `"RD4, RD5"`.
pub fn parse_pin_list(pin_str: &str) -> eyre::Result<Vec<PinRef>> {
    pin_str
        .split([',', ' ', ';'])
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<PinRef>().map_err(|e| eyre::eyre!("Invalid pin {:?}: {}", s, e)))
        .collect()
}

/// Parses a pin list of exactly `N` pins. See [parse_pin_list].
pub fn parse_pin_bus<const N: usize>(pin_str: &str) -> eyre::Result<[PinRef; N]> {
    parse_pin_list(pin_str)?
        .try_into()
        .map_err(|pins: Vec<PinRef>| eyre::eyre!("Expected {} pins, got {}", N, pins.len()))
}

/// Finds the (row, column) of the key labeled `key`.
pub fn key_position(keys: &KeyMap, key: char) -> Option<(usize, usize)> {
    let key = u8::try_from(key).ok()?;
    keys.iter().enumerate().find_map(|(row, labels)| {
        labels
            .iter()
            .position(|&label| label == key)
            .map(|column| (row, column))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use picboard_gpio::keypad::{CALCULATOR_KEYS, PHONE_KEYS};
    use picboard_gpio::Port;

    #[test]
    fn parses_pin_buses() {
        let pins: [PinRef; 4] = parse_pin_bus("RD4, RD5;D6 d7").unwrap();
        assert_eq!(pins, std::array::from_fn(|i| PinRef::new(Port::D, i as u8 + 4)));

        assert!(parse_pin_bus::<4>("RD4, RD5").is_err());
        assert!(parse_pin_bus::<2>("RD4, RD9").is_err());
        assert!(parse_pin_list("RF1").is_err());
        assert_eq!(parse_pin_list("").unwrap(), vec![]);
    }

    #[test]
    fn finds_keys() {
        assert_eq!(key_position(&CALCULATOR_KEYS, '7'), Some((0, 0)));
        assert_eq!(key_position(&CALCULATOR_KEYS, '+'), Some((3, 3)));
        assert_eq!(key_position(&PHONE_KEYS, 'D'), Some((3, 3)));
        assert_eq!(key_position(&PHONE_KEYS, '+'), None);
        assert_eq!(key_position(&PHONE_KEYS, 'é'), None);
    }
}
