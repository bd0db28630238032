#![no_main]
use libfuzzer_sys::fuzz_target;
use storage_codec::{
    db::MemoryStorage,
    primitives::{
        B256,
        U256,
    },
    test_utils::{
        storage_getter_layout,
        CONTRACT_ADDRESS,
    },
    store::ContractStorage,
};

/// Variables whose lookups depend on what is stored.
const VARIABLES: [&str; 5] = [
    "_string",
    "_bytes",
    "_uint16Array",
    "_simpleStructArray",
    "_nestedStruct",
];

fuzz_target!(|data: &[u8]| {
    if data.len() < 33 {
        return;
    }
    let variable = VARIABLES[usize::from(data[0]) % VARIABLES.len()];

    // Fill the variable's base slots with fuzzer data, including lengths far beyond the limit.
    let storage = MemoryStorage::new();
    for (i, chunk) in data[1..].chunks(32).take(4).enumerate() {
        let mut value = B256::ZERO;
        value.0[32 - chunk.len()..].copy_from_slice(chunk);
        storage.insert(CONTRACT_ADDRESS, B256::from(U256::from(1 + i)), value);
        storage.insert(CONTRACT_ADDRESS, B256::from(U256::from(19 + i)), value);
        storage.insert(CONTRACT_ADDRESS, B256::from(U256::from(23 + i)), value);
        if i == 0 {
            storage.insert(CONTRACT_ADDRESS, B256::from(U256::from(5)), value);
        }
    }

    let storage = ContractStorage::new(storage_getter_layout(), storage, CONTRACT_ADDRESS);
    // Arbitrary storage may fail to decode, but must never panic.
    let _ = futures::executor::block_on(storage.get_variable(variable, &[]));
});
