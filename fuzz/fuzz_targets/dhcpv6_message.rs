#![no_main]
use libfuzzer_sys::fuzz_target;
use tdhcp::wire::{Dhcpv6MessageType, Dhcpv6Repr};

fuzz_target!(|data: &[u8]| {
    let types: Vec<_> = (1..=13).map(Dhcpv6MessageType::from).collect();
    if let Some(repr) = Dhcpv6Repr::decode(data, &types, None) {
        // Anything that decodes must encode again, and the result must
        // decode to the same tree once unknown options are gone.
        if let Ok(bytes) = repr.encode(None) {
            let again = Dhcpv6Repr::decode(&bytes, &types, Some(repr.transaction_id))
                .expect("re-encoded message does not decode");
            assert_eq!(again.encode(None).ok(), Some(bytes));
        }
    }
});
