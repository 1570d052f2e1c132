#![no_main]

use libfuzzer_sys::fuzz_target;
use vsx_core::{ParseConfig, UnterminatedTablePolicy, VsxInventory};
use vsx_parser::parse_with_config;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };

    let config = ParseConfig {
        unterminated_table: UnterminatedTablePolicy::Warn,
        ..ParseConfig::default()
    };
    let Ok(parsed) = parse_with_config(input, &config) else {
        return;
    };

    let encoded = serde_json::to_string(&parsed.inventory).expect("inventory serializes");
    let decoded: VsxInventory = serde_json::from_str(&encoded).expect("inventory deserializes");
    assert_eq!(decoded, parsed.inventory);
});
