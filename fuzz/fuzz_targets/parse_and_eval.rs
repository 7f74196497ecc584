#![no_main]

use libfuzzer_sys::fuzz_target;
use rollwright::Roller;

fuzz_target!(|data: &[u8]| {
    let expr = std::string::String::from_utf8_lossy(data);
    let mut roller = Roller::default();
    let _ = roller.roll(expr.as_ref());
});
